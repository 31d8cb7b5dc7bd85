//! Search options, candidates, and result types.

use serde::{Deserialize, Serialize};

use super::MedicineRecord;

/// Coarse match score: query equals the matched field.
pub const SCORE_EQUAL: u8 = 100;
/// Coarse match score: matched field starts with the query.
pub const SCORE_PREFIX: u8 = 90;
/// Coarse match score: matched field contains the query.
pub const SCORE_CONTAINS: u8 = 80;
/// Coarse match score: weak/containment-only association.
pub const SCORE_WEAK: u8 = 70;

/// Options controlling a single resolution or a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOptions {
    /// Minimum similarity a winner must reach to be returned (0.0 - 1.0).
    pub min_similarity: f64,
    /// Per-variant row limit for the fuzzy and composition queries (1 - 100).
    pub max_results: usize,
    /// Run the exact strategy first and short-circuit on a hit.
    pub prefer_exact_match: bool,
    /// Maximum number of items accepted by a batch call.
    pub max_batch_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_similarity: 0.7,
            max_results: 5,
            prefer_exact_match: true,
            max_batch_size: 100,
        }
    }
}

impl SearchOptions {
    /// Validate option ranges. Returns a caller-facing reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(format!(
                "min_similarity must be between 0.0 and 1.0, got {}",
                self.min_similarity
            ));
        }
        if !(1..=100).contains(&self.max_results) {
            return Err(format!(
                "max_results must be between 1 and 100, got {}",
                self.max_results
            ));
        }
        if self.max_batch_size == 0 {
            return Err("max_batch_size must be at least 1".into());
        }
        Ok(())
    }
}

/// Which search path produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    Fuzzy,
    Composition,
}

/// How the winning record was matched, as reported to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchType {
    #[serde(rename = "exact")]
    Exact,
    #[serde(rename = "fuzzy")]
    Fuzzy,
    #[serde(rename = "exact-composition")]
    ExactComposition,
}

/// An ephemeral scored search hit, discarded once the winner is picked.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The catalog record
    pub record: MedicineRecord,
    /// True similarity between the matched term and the record (0.0 - 1.0)
    pub similarity: f64,
    /// Coarse strategy score (100/90/80/70), the primary sort key
    pub match_score: u8,
    /// The name variant (or salt base) that produced this hit
    pub matched_term: String,
    /// Originating strategy
    pub strategy: MatchStrategy,
}

/// Outcome of a single-name resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Whether a record cleared the similarity threshold
    pub success: bool,
    /// The winning record, when successful
    pub medicine: Option<MedicineRecord>,
    /// Similarity of the winner (0.0 when no match)
    pub confidence: f64,
    /// How the winner was matched, when successful
    pub match_type: Option<MatchType>,
    /// Echo of the trimmed query
    pub search_term: String,
    /// Human-readable reason when unsuccessful
    pub message: Option<String>,
}

impl SearchResult {
    /// A successful result carrying the winning record.
    pub fn found(
        medicine: MedicineRecord,
        confidence: f64,
        match_type: MatchType,
        search_term: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            medicine: Some(medicine),
            confidence,
            match_type: Some(match_type),
            search_term: search_term.into(),
            message: None,
        }
    }

    /// A terminal no-match (or per-item failure) result.
    pub fn not_found(search_term: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            medicine: None,
            confidence: 0.0,
            match_type: None,
            search_term: search_term.into(),
            message: Some(message.into()),
        }
    }
}

/// One entry in a batch request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchQuery {
    /// Free-text medicine name (required, >= 2 chars after trim)
    pub name: String,
    /// Optional composition/salt string for the fallback strategy
    pub salt: Option<String>,
}

impl BatchQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            salt: None,
        }
    }

    pub fn with_salt(name: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            salt: Some(salt.into()),
        }
    }
}

/// Per-item batch outcome, preserving input order and the original input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutcome {
    /// Position of the item in the request
    pub index: usize,
    /// The original input, echoed for caller-side correlation
    pub input: BatchQuery,
    /// Resolution result for this item
    pub result: SearchResult,
    /// Wall-clock time spent resolving this item
    pub execution_time_ms: u64,
}

/// Aggregate counts over a batch, for caller-facing reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub resolved: usize,
    pub success_rate: f64,
}

impl BatchSummary {
    /// Compute counts and success rate from a batch's outcomes.
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        let total = outcomes.len();
        let resolved = outcomes.iter().filter(|o| o.result.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            resolved as f64 / total as f64
        };
        Self {
            total,
            resolved,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SearchOptions::default();
        assert_eq!(opts.min_similarity, 0.7);
        assert_eq!(opts.max_results, 5);
        assert!(opts.prefer_exact_match);
        assert_eq!(opts.max_batch_size, 100);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        let mut opts = SearchOptions {
            min_similarity: 1.5,
            ..Default::default()
        };
        assert!(opts.validate().is_err());

        opts.min_similarity = 0.7;
        opts.max_results = 0;
        assert!(opts.validate().is_err());

        opts.max_results = 101;
        assert!(opts.validate().is_err());

        opts.max_results = 100;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_match_type_serialization() {
        assert_eq!(
            serde_json::to_string(&MatchType::Exact).unwrap(),
            r#""exact""#
        );
        assert_eq!(
            serde_json::to_string(&MatchType::Fuzzy).unwrap(),
            r#""fuzzy""#
        );
        assert_eq!(
            serde_json::to_string(&MatchType::ExactComposition).unwrap(),
            r#""exact-composition""#
        );
    }

    #[test]
    fn test_not_found_shape() {
        let result = SearchResult::not_found("Paracetamol", "no matching medicine found");
        assert!(!result.success);
        assert!(result.medicine.is_none());
        assert_eq!(result.confidence, 0.0);
        assert!(result.match_type.is_none());
        assert_eq!(result.search_term, "Paracetamol");
    }

    #[test]
    fn test_batch_summary() {
        let ok = BatchOutcome {
            index: 0,
            input: BatchQuery::new("a"),
            result: SearchResult::found(
                crate::models::MedicineRecord::new(1, "X".into()),
                1.0,
                MatchType::Exact,
                "x",
            ),
            execution_time_ms: 1,
        };
        let bad = BatchOutcome {
            index: 1,
            input: BatchQuery::new("b"),
            result: SearchResult::not_found("b", "no match"),
            execution_time_ms: 1,
        };

        let summary = BatchSummary::from_outcomes(&[ok, bad]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.resolved, 1);
        assert!((summary.success_rate - 0.5).abs() < f64::EPSILON);

        let empty = BatchSummary::from_outcomes(&[]);
        assert_eq!(empty.success_rate, 0.0);
    }
}
