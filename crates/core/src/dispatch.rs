use crate::dataset::PaperRecord;
use crate::error::{AgentError, Result};
use crate::extract::ToolCallRequest;
use crate::query::{search, Comparator, SearchQuery};

/// The one sanctioned tool identifier. Calls to anything else never reach
/// the filter engine.
pub const TOOL_NAME: &str = "paper_search_tool";

/// `citations` is the original tool signature's name for the floor; both
/// spellings are accepted, supplying both counts as a duplicate.
const MIN_CITATIONS_ALIAS: &str = "citations";
const KNOWN_ARGUMENTS: &[&str] = &["topic", "comparator", "year", "min_citations", "citations"];

/// Validates an extracted call and runs the query. Validation rules apply
/// in order and the first failure wins; the filter engine is never invoked
/// for a rejected call. No retries happen here.
pub fn dispatch(request: &ToolCallRequest, papers: &[PaperRecord]) -> Result<Vec<PaperRecord>> {
    let query = validate(request)?;
    Ok(search(papers, &query))
}

fn validate(request: &ToolCallRequest) -> Result<SearchQuery> {
    if request.tool_name != TOOL_NAME {
        return Err(AgentError::Validation(format!(
            "unknown tool {:?}, only {TOOL_NAME:?} is registered",
            request.tool_name
        )));
    }
    let mut seen: Vec<&str> = Vec::new();
    for (name, _) in &request.arguments {
        let canonical = canonical_name(name);
        if seen.contains(&canonical) {
            return Err(AgentError::Validation(format!(
                "duplicate argument {name:?}"
            )));
        }
        seen.push(canonical);
    }
    let comparator_raw = argument(request, "comparator")
        .ok_or_else(|| AgentError::Validation("missing required argument comparator".to_string()))?;
    let year_raw = argument(request, "year")
        .ok_or_else(|| AgentError::Validation("missing required argument year".to_string()))?;
    let comparator = Comparator::from_str(comparator_raw).ok_or_else(|| {
        AgentError::Validation(format!(
            "invalid comparator {comparator_raw:?}, expected one of before, after, in"
        ))
    })?;
    let year: i32 = year_raw
        .parse()
        .map_err(|_| AgentError::Validation(format!("invalid year {year_raw:?}")))?;
    let min_citations = match argument(request, "min_citations") {
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            AgentError::Validation(format!(
                "invalid min_citations {raw:?}, expected a non-negative integer"
            ))
        })?,
        None => 0,
    };
    for (name, _) in &request.arguments {
        if !KNOWN_ARGUMENTS.contains(&name.as_str()) {
            return Err(AgentError::Validation(format!("unknown argument {name:?}")));
        }
    }
    let topic = argument(request, "topic")
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string);
    Ok(SearchQuery {
        topic,
        comparator,
        year,
        min_citations,
    })
}

fn canonical_name(name: &str) -> &str {
    if name == MIN_CITATIONS_ALIAS {
        "min_citations"
    } else {
        name
    }
}

fn argument<'a>(request: &'a ToolCallRequest, wanted: &str) -> Option<&'a str> {
    request
        .arguments
        .iter()
        .find(|(name, _)| canonical_name(name) == wanted)
        .map(|(_, value)| value.as_str())
}
