//! Fuzzy medicine-name resolver.
//!
//! Pipeline: variant generation → exact lookup → fuzzy substring lookup →
//! composition (salt) fallback → arbitration against the similarity threshold.

mod dosage;
mod normalizer;
mod similarity;

pub use dosage::{extract_dose, ExtractedDose};
pub use normalizer::Normalizer;
pub use similarity::{similarity, trigram_similarity};

use std::cmp::Ordering;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::db::Database;
use crate::models::{
    BatchOutcome, BatchQuery, Candidate, MatchStrategy, MatchType, MedicineRecord, SearchOptions,
    SearchResult, SCORE_CONTAINS, SCORE_EQUAL, SCORE_PREFIX, SCORE_WEAK,
};

/// Minimum usable query length after trimming.
const MIN_QUERY_LEN: usize = 2;

/// Resolver errors. A no-match is a normal `SearchResult`, not an error.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Reference store unavailable while resolving: {term}")]
    Store { term: String },
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Running tally of store queries within one resolution: a partial failure
/// degrades to fewer candidates, a total failure becomes a store error.
#[derive(Default)]
struct QueryTally {
    attempted: usize,
    failed: usize,
}

impl QueryTally {
    fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }
}

/// Multi-strategy resolver mapping free-text names to catalog records.
pub struct Resolver<'a> {
    db: &'a Database,
    normalizer: Normalizer,
}

impl<'a> Resolver<'a> {
    /// Create a new resolver over a reference store.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            normalizer: Normalizer::new(),
        }
    }

    /// Get the normalizer for direct access.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Resolve one raw name (plus optional salt string) to the best catalog
    /// record, or a no-match result when nothing clears the threshold.
    pub fn resolve(
        &self,
        raw_name: &str,
        salt: Option<&str>,
        options: &SearchOptions,
    ) -> ResolverResult<SearchResult> {
        options.validate().map_err(ResolverError::InvalidInput)?;

        let term = raw_name.trim();
        if term.chars().count() < MIN_QUERY_LEN {
            return Err(ResolverError::InvalidInput(format!(
                "medicine name must be at least {MIN_QUERY_LEN} characters, got {:?}",
                term
            )));
        }

        let variants = self.normalizer.generate_variations(term);
        let mut tally = QueryTally::default();

        if options.prefer_exact_match {
            if let Some(record) = self.exact_strategy(&variants, &mut tally) {
                debug!(term, id = record.id, "exact match");
                return Ok(SearchResult::found(record, 1.0, MatchType::Exact, term));
            }
        }

        let mut candidates = self.fuzzy_strategy(&variants, options.max_results, &mut tally);

        if candidates.is_empty() {
            if let Some(salt) = salt.map(str::trim).filter(|s| !s.is_empty()) {
                candidates = self.composition_strategy(salt, options.max_results, &mut tally);
            }
        }

        if candidates.is_empty() {
            if tally.all_failed() {
                return Err(ResolverError::Store {
                    term: term.to_string(),
                });
            }
            return Ok(SearchResult::not_found(term, "no matching medicine found"));
        }

        // Stable sort: equal keys keep first-found order.
        candidates.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then_with(|| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| popularity_desc(&a.record, &b.record))
        });
        let winner = candidates.swap_remove(0);

        if winner.similarity < options.min_similarity {
            debug!(
                term,
                similarity = winner.similarity,
                threshold = options.min_similarity,
                "best candidate below threshold"
            );
            return Ok(SearchResult::not_found(
                term,
                format!(
                    "best candidate '{}' scored {:.2}, below threshold {:.2}",
                    winner.record.brand_name, winner.similarity, options.min_similarity
                ),
            ));
        }

        let match_type = if winner.strategy == MatchStrategy::Composition
            && winner.match_score == SCORE_EQUAL
        {
            MatchType::ExactComposition
        } else {
            MatchType::Fuzzy
        };
        debug!(term, id = winner.record.id, ?match_type, "resolved");

        Ok(SearchResult::found(
            winner.record,
            winner.similarity,
            match_type,
            term,
        ))
    }

    /// Resolve a list of items strictly in input order; one item failing
    /// (validation, no match, store trouble) never affects its siblings.
    pub fn resolve_batch(
        &self,
        items: &[BatchQuery],
        options: &SearchOptions,
    ) -> ResolverResult<Vec<BatchOutcome>> {
        options.validate().map_err(ResolverError::InvalidInput)?;
        if items.len() > options.max_batch_size {
            return Err(ResolverError::InvalidInput(format!(
                "batch of {} items exceeds the cap of {}",
                items.len(),
                options.max_batch_size
            )));
        }

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let started = Instant::now();
            let result = match self.resolve(&item.name, item.salt.as_deref(), options) {
                Ok(result) => result,
                Err(e) => SearchResult::not_found(item.name.trim(), e.to_string()),
            };
            outcomes.push(BatchOutcome {
                index,
                input: item.clone(),
                result,
                execution_time_ms: started.elapsed().as_millis() as u64,
            });
        }
        Ok(outcomes)
    }

    /// Exact strategy: first variant with a case-insensitive brand equality
    /// hit wins outright.
    fn exact_strategy(&self, variants: &[String], tally: &mut QueryTally) -> Option<MedicineRecord> {
        for variant in variants {
            tally.attempted += 1;
            match self.db.find_exact_brand(variant) {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(e) => {
                    tally.failed += 1;
                    warn!(term = variant.as_str(), strategy = "exact", error = %e, "store query failed");
                }
            }
        }
        None
    }

    /// Fuzzy strategy: pool substring and trigram-neighbor hits across all
    /// variants, each with a coarse score and a true similarity.
    fn fuzzy_strategy(
        &self,
        variants: &[String],
        limit: usize,
        tally: &mut QueryTally,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for variant in variants {
            tally.attempted += 1;
            match self.db.find_brand_fuzzy(variant, limit) {
                Ok(records) => {
                    for record in records {
                        let match_score = coarse_score(variant, &record.brand_name);
                        let sim = similarity(variant, &record.brand_name);
                        candidates.push(Candidate {
                            record,
                            similarity: sim,
                            match_score,
                            matched_term: variant.clone(),
                            strategy: MatchStrategy::Fuzzy,
                        });
                    }
                }
                Err(e) => {
                    tally.failed += 1;
                    warn!(term = variant.as_str(), strategy = "fuzzy", error = %e, "store query failed");
                }
            }
        }
        candidates
    }

    /// Composition strategy: trigram match on salt names, upgraded to an
    /// exact-composition score when strength and unit line up, with a plain
    /// containment fallback.
    fn composition_strategy(
        &self,
        salt: &str,
        limit: usize,
        tally: &mut QueryTally,
    ) -> Vec<Candidate> {
        let dose = extract_dose(salt);
        let base = dose
            .as_ref()
            .map(|d| d.base_name.as_str())
            .unwrap_or(salt)
            .trim();
        if base.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();

        tally.attempted += 1;
        match self.db.find_by_composition(base, limit) {
            Ok(rows) => {
                for (record, _comp_sim) in rows {
                    let (slot_similarity, dose_on_slot) =
                        best_slot_match(&record, base, dose.as_ref());
                    let match_score = if dose_on_slot {
                        SCORE_EQUAL
                    } else {
                        SCORE_CONTAINS
                    };
                    candidates.push(Candidate {
                        record,
                        similarity: slot_similarity,
                        match_score,
                        matched_term: base.to_string(),
                        strategy: MatchStrategy::Composition,
                    });
                }
            }
            Err(e) => {
                tally.failed += 1;
                warn!(term = base, strategy = "composition", error = %e, "store query failed");
            }
        }

        if candidates.is_empty() {
            tally.attempted += 1;
            match self.db.find_composition_containing(base, limit) {
                Ok(records) => {
                    for record in records {
                        let (slot_similarity, _) = best_slot_match(&record, base, None);
                        candidates.push(Candidate {
                            record,
                            similarity: slot_similarity,
                            match_score: SCORE_WEAK,
                            matched_term: base.to_string(),
                            strategy: MatchStrategy::Composition,
                        });
                    }
                }
                Err(e) => {
                    tally.failed += 1;
                    warn!(term = base, strategy = "composition-containment", error = %e, "store query failed");
                }
            }
        }

        candidates
    }
}

/// Coarse strategy score for a substring hit.
fn coarse_score(variant: &str, brand_name: &str) -> u8 {
    let v = variant.to_lowercase();
    let b = brand_name.to_lowercase();
    if b == v {
        SCORE_EQUAL
    } else if b.starts_with(&v) {
        SCORE_PREFIX
    } else if b.contains(&v) {
        SCORE_CONTAINS
    } else {
        SCORE_WEAK
    }
}

/// Best name similarity between a salt base and the record's populated
/// composition slots, paired with whether that same slot carries the
/// extracted strength and unit. A dose found on a different slot than the
/// one the name matched does not count.
fn best_slot_match(
    record: &MedicineRecord,
    base: &str,
    dose: Option<&ExtractedDose>,
) -> (f64, bool) {
    let mut best_sim = 0.0;
    let mut dose_on_best = false;
    for comp in record.active_compositions() {
        let sim = similarity(base, &comp.name);
        if sim > best_sim {
            best_sim = sim;
            dose_on_best = dose
                .map(|d| comp.matches_strength_unit(&d.strength, &d.unit))
                .unwrap_or(false);
        }
    }
    (best_sim, dose_on_best)
}

/// Popularity descending, nulls last.
fn popularity_desc(a: &MedicineRecord, b: &MedicineRecord) -> Ordering {
    match (a.popularity, b.popularity) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
