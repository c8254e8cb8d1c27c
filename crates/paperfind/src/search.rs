use anyhow::{anyhow, Result};
use paperfind_core::{load, search, Comparator, SearchQuery};

use crate::logging;
use crate::turn;

/// Direct dataset query, no model in the loop. Shares the validation
/// vocabulary with the tool schema so both surfaces reject the same inputs.
pub fn run(
    topic: Option<String>,
    comparator: String,
    year: i32,
    min_citations: u32,
    json: bool,
) -> Result<()> {
    let comparator = Comparator::from_str(&comparator)
        .ok_or_else(|| anyhow!("invalid comparator {comparator:?}, expected one of before, after, in"))?;
    let papers = load()?;
    let query = SearchQuery {
        topic: topic.filter(|t| !t.trim().is_empty()),
        comparator,
        year,
        min_citations,
    };
    logging::verbose(format!("running direct query {query:?}"));
    let results = search(&papers, &query);
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("{}", turn::render_results(&results));
    }
    Ok(())
}
