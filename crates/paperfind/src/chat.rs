use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use paperfind_core::{load, PaperRecord};
use paperfind_llm::{LlmClient, LlmRequest, LlmResponse};
use tokio::runtime::Runtime;

use crate::config::PaperfindConfig;
use crate::logging;
use crate::turn::{self, TurnOutcome};

/// Everything one agent run needs: the dataset, the model client, and the
/// runtime its calls block on.
struct ModelSession {
    client: LlmClient,
    runtime: Runtime,
}

impl ModelSession {
    fn new(config: &PaperfindConfig) -> Result<Self> {
        Ok(Self {
            client: LlmClient::new(config.provider, config.model.clone())?,
            runtime: Runtime::new().context("failed to start tokio runtime")?,
        })
    }

    fn invoke(&self, system: Option<&str>, user: &str) -> Result<LlmResponse> {
        self.runtime.block_on(self.client.chat(&LlmRequest {
            system: system.map(|s| s.to_string()),
            user: user.to_string(),
        }))
    }
}

fn start_session() -> Result<(PaperfindConfig, Vec<PaperRecord>, ModelSession)> {
    let config = PaperfindConfig::from_env()?;
    let papers = load()?;
    let session = ModelSession::new(&config)?;
    Ok((config, papers, session))
}

pub fn run_chat() -> Result<()> {
    let (config, papers, session) = start_session()?;
    let invoke = |system: Option<&str>, user: &str| session.invoke(system, user);
    logging::stage(
        "chat",
        format!(
            "using provider {} model {}",
            config.provider.as_str(),
            config.model
        ),
    );
    println!("Research Paper Agent (type 'exit' to quit)\n");

    let mut last_assistant_call: Option<String> = None;
    let mut last_tool_result: Option<String> = None;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("You: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let user_query = line?;
        let trimmed = user_query.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
            println!("Goodbye!");
            break;
        }
        if trimmed.to_lowercase().starts_with("evaluate") {
            match (&last_assistant_call, &last_tool_result) {
                (Some(call), Some(result)) => {
                    let response = invoke(None, &evaluation_prompt(call, result))?;
                    println!("\nEvaluation:\n{}\n", response.content);
                }
                _ => println!("\nNo previous task to evaluate.\n"),
            }
            continue;
        }

        let (assistant_text, outcome) = turn::run_turn(&invoke, &papers, trimmed)?;
        println!("\nAssistant: {assistant_text}");
        let rendered = turn::render_outcome(&assistant_text, &outcome);
        if let Some(feedback) = tool_feedback_line(&outcome, &rendered) {
            println!("{feedback}");
        }
        last_assistant_call = Some(assistant_text);
        last_tool_result = Some(rendered);
        println!();
        throttle(config.throttle_ms);
    }
    Ok(())
}

pub fn run_ask(query: &str) -> Result<()> {
    let (_config, papers, session) = start_session()?;
    let invoke = |system: Option<&str>, user: &str| session.invoke(system, user);
    let (assistant_text, outcome) = turn::run_turn(&invoke, &papers, query)?;
    logging::verbose(format!("assistant replied: {assistant_text}"));
    println!("{}", turn::render_outcome(&assistant_text, &outcome));
    Ok(())
}

/// The tool ran only for `Results`; a rejection is corrective feedback and
/// must not claim execution. Conversational replies get no extra line.
fn tool_feedback_line(outcome: &TurnOutcome, rendered: &str) -> Option<String> {
    match outcome {
        TurnOutcome::Conversational => None,
        TurnOutcome::Results(_) => Some(format!("Tool executed: {rendered}")),
        TurnOutcome::Rejected(_) => Some(rendered.to_string()),
    }
}

fn evaluation_prompt(call: &str, result: &str) -> String {
    format!(
        "Evaluate how well you performed on the previous task.\n\n\
         Assistant Tool Call: {call}\n\
         Tool Result: {result}\n\n\
         Discuss correctness, tool usage, and give a score from 1 to 10."
    )
}

fn throttle(delay_ms: u64) {
    if delay_ms > 0 {
        thread::sleep(Duration::from_millis(delay_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperfind_llm::LlmProvider;

    #[test]
    fn evaluation_prompt_replays_call_and_result() {
        let prompt = evaluation_prompt(
            "paper_search_tool(comparator='in', year=2019)",
            "No papers matched your query.",
        );
        assert!(prompt.contains("Assistant Tool Call: paper_search_tool"));
        assert!(prompt.contains("Tool Result: No papers matched"));
        assert!(prompt.contains("score from 1 to 10"));
    }

    #[test]
    fn rejected_calls_are_not_reported_as_executed() {
        let outcome = TurnOutcome::Rejected("invalid comparator".to_string());
        let rendered = turn::render_outcome("", &outcome);
        let feedback = tool_feedback_line(&outcome, &rendered).unwrap();
        assert!(!feedback.contains("Tool executed"));
        assert!(feedback.contains("invalid comparator"));
    }

    #[test]
    fn results_are_prefixed_and_conversation_gets_no_line() {
        let results = TurnOutcome::Results(Vec::new());
        let rendered = turn::render_outcome("", &results);
        let feedback = tool_feedback_line(&results, &rendered).unwrap();
        assert_eq!(feedback, "Tool executed: No papers matched your query.");

        assert!(tool_feedback_line(&TurnOutcome::Conversational, "hi").is_none());
    }

    #[test]
    fn local_session_answers_without_network() {
        let config = PaperfindConfig {
            provider: LlmProvider::Local,
            model: "local".to_string(),
            throttle_ms: 0,
        };
        let session = ModelSession::new(&config).unwrap();
        let response = session
            .invoke(None, "papers on AI after 2015 with 100 citations")
            .unwrap();
        assert!(response.content.starts_with("paper_search_tool("));
    }
}
