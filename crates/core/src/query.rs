use serde::{Deserialize, Serialize};

use crate::dataset::PaperRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Before,
    After,
    In,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Before => "before",
            Comparator::After => "after",
            Comparator::In => "in",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "before" => Some(Comparator::Before),
            "after" => Some(Comparator::After),
            "in" => Some(Comparator::In),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// `None` matches any topic.
    pub topic: Option<String>,
    pub comparator: Comparator,
    pub year: i32,
    pub min_citations: u32,
}

/// Applies all query predicates conjunctively. Matches keep the dataset
/// order; no re-sorting or ranking happens here.
pub fn search(papers: &[PaperRecord], query: &SearchQuery) -> Vec<PaperRecord> {
    papers
        .iter()
        .filter(|paper| matches(paper, query))
        .cloned()
        .collect()
}

fn matches(paper: &PaperRecord, query: &SearchQuery) -> bool {
    if let Some(topic) = &query.topic {
        // Exact comparison, case-insensitive. Substring matching would make
        // "AI" match "AIr quality" and is deliberately not supported.
        if !paper.topic.eq_ignore_ascii_case(topic) {
            return false;
        }
    }
    let year_ok = match query.comparator {
        Comparator::Before => paper.year < query.year,
        Comparator::After => paper.year > query.year,
        Comparator::In => paper.year == query.year,
    };
    year_ok && paper.citations >= query.min_citations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, topic: &str, year: i32, citations: u32) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            topic: topic.to_string(),
            year,
            citations,
        }
    }

    #[test]
    fn comparator_parses_case_insensitively() {
        assert_eq!(Comparator::from_str("Before"), Some(Comparator::Before));
        assert_eq!(Comparator::from_str("AFTER"), Some(Comparator::After));
        assert_eq!(Comparator::from_str("in"), Some(Comparator::In));
        assert_eq!(Comparator::from_str("between"), None);
    }

    #[test]
    fn topic_match_is_exact_not_substring() {
        let papers = vec![record("A", "Machine Learning", 2020, 10)];
        let query = SearchQuery {
            topic: Some("Machine".to_string()),
            comparator: Comparator::In,
            year: 2020,
            min_citations: 0,
        };
        assert!(search(&papers, &query).is_empty());

        let query = SearchQuery {
            topic: Some("machine learning".to_string()),
            ..query
        };
        assert_eq!(search(&papers, &query).len(), 1);
    }

    #[test]
    fn citation_floor_is_inclusive() {
        let papers = vec![record("A", "AI", 2020, 100)];
        let base = SearchQuery {
            topic: None,
            comparator: Comparator::In,
            year: 2020,
            min_citations: 100,
        };
        assert_eq!(search(&papers, &base).len(), 1);

        let stricter = SearchQuery {
            min_citations: 101,
            ..base
        };
        assert!(search(&papers, &stricter).is_empty());
    }
}
