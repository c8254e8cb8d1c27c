use anyhow::Result;
use paperfind_core::{dispatch, extract, PaperRecord};
use paperfind_llm::LlmResponse;

use crate::logging;
use crate::prompt::SYSTEM_PROMPT;

/// What one model turn amounted to after running the tool-call pipeline
/// over the raw reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// No call shape in the reply; treat it as plain conversation.
    Conversational,
    /// The call validated and ran; matches are in dataset order.
    Results(Vec<PaperRecord>),
    /// Malformed or invalid call. The reason is suitable for relaying back
    /// to the model as corrective feedback.
    Rejected(String),
}

/// Sends one user query to the model and interprets the reply. Returns the
/// raw assistant text alongside the outcome so callers can echo and replay
/// it (the `evaluate` feature needs both).
pub fn run_turn(
    invoke: &impl Fn(Option<&str>, &str) -> Result<LlmResponse>,
    papers: &[PaperRecord],
    user: &str,
) -> Result<(String, TurnOutcome)> {
    let response = invoke(Some(SYSTEM_PROMPT), user)?;
    logging::verbose(format!(
        "model replied with {} tokens",
        response.total_tokens()
    ));
    let outcome = interpret(&response.content, papers);
    Ok((response.content, outcome))
}

/// The core boundary: raw model text in, structured outcome out. Extraction
/// and validation failures become `Rejected`, never a hard error; the caller
/// decides whether to re-prompt.
pub fn interpret(assistant_text: &str, papers: &[PaperRecord]) -> TurnOutcome {
    match extract(assistant_text) {
        Ok(Some(request)) => match dispatch(&request, papers) {
            Ok(results) => TurnOutcome::Results(results),
            Err(err) => TurnOutcome::Rejected(err.to_string()),
        },
        Ok(None) => TurnOutcome::Conversational,
        Err(err) => TurnOutcome::Rejected(err.to_string()),
    }
}

pub fn render_results(results: &[PaperRecord]) -> String {
    if results.is_empty() {
        return "No papers matched your query.".to_string();
    }
    results
        .iter()
        .map(|paper| {
            format!(
                "- {} ({}, {} citations)",
                paper.title, paper.year, paper.citations
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn render_outcome(assistant_text: &str, outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Conversational => assistant_text.to_string(),
        TurnOutcome::Results(results) => render_results(results),
        TurnOutcome::Rejected(reason) => format!("Tool call rejected: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperfind_core::load;
    use paperfind_llm::LlmResponse;

    fn stub(content: &str) -> impl Fn(Option<&str>, &str) -> Result<LlmResponse> + '_ {
        move |_, _| {
            Ok(LlmResponse {
                content: content.to_string(),
                prompt_tokens: 10,
                completion_tokens: 5,
            })
        }
    }

    #[test]
    fn valid_call_produces_results() {
        let papers = load().unwrap();
        let reply = "paper_search_tool(topic='AI', comparator='after', year=2015, min_citations=100)";
        let (text, outcome) = run_turn(&stub(reply), &papers, "ai papers").unwrap();
        assert_eq!(text, reply);
        match outcome {
            TurnOutcome::Results(results) => {
                assert_eq!(results.len(), 2);
                assert_eq!(results[0].title, "Adaptive Meta-Learning Networks");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn plain_reply_stays_conversational() {
        let papers = load().unwrap();
        let outcome = interpret("I think the answer is 42.", &papers);
        assert_eq!(outcome, TurnOutcome::Conversational);
    }

    #[test]
    fn invalid_comparator_is_rejected_with_a_reason() {
        let papers = load().unwrap();
        let outcome = interpret(
            "paper_search_tool(comparator='between', year=2019)",
            &papers,
        );
        match outcome {
            TurnOutcome::Rejected(reason) => assert!(reason.contains("comparator")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn malformed_call_is_rejected_not_dropped() {
        let papers = load().unwrap();
        let outcome = interpret("paper_search_tool(topic='AI", &papers);
        assert!(matches!(outcome, TurnOutcome::Rejected(_)));
    }

    #[test]
    fn empty_result_renders_the_no_match_line() {
        assert_eq!(render_results(&[]), "No papers matched your query.");
    }

    #[test]
    fn results_render_one_line_per_paper() {
        let papers = load().unwrap();
        let rendered = render_results(&papers[..2]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "- Adaptive Meta-Learning Networks (2020, 340 citations)"
        );
    }
}
