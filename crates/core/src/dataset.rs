use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

const PAPERS_JSON: &str = include_str!("papers.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub topic: String,
    pub year: i32,
    pub citations: u32,
}

/// Loads the embedded paper dataset. Read once at startup; the returned
/// records are never mutated afterwards.
pub fn load() -> Result<Vec<PaperRecord>> {
    parse_records(PAPERS_JSON)
}

fn parse_records(raw: &str) -> Result<Vec<PaperRecord>> {
    let records: Vec<PaperRecord> =
        serde_json::from_str(raw).map_err(|err| AgentError::DataIntegrity(err.to_string()))?;
    if records.is_empty() {
        return Err(AgentError::DataIntegrity("dataset is empty".to_string()));
    }
    for (idx, record) in records.iter().enumerate() {
        if record.title.trim().is_empty() {
            return Err(AgentError::DataIntegrity(format!(
                "record {idx} has an empty title"
            )));
        }
        if record.topic.trim().is_empty() {
            return Err(AgentError::DataIntegrity(format!(
                "record {idx} ({}) has an empty topic",
                record.title
            )));
        }
    }
    Ok(records)
}
