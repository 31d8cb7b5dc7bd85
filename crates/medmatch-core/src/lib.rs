//! Medmatch Core Library
//!
//! Multi-strategy fuzzy resolver mapping free-text (often OCR-damaged)
//! medicine names to canonical catalog records.
//!
//! # Architecture
//!
//! ```text
//! raw name (+ optional salt)
//!        │
//!        ▼
//!  Variant generation ── dose strip / form-suffix strip / OCR confusions
//!        │
//!        ▼
//!  ┌─ Exact lookup ──────── brand equality, short-circuits on hit
//!  ├─ Fuzzy lookup ──────── substring + trigram neighbors, coarse-scored
//!  └─ Composition lookup ── salt trigram match, only when fuzzy is empty
//!        │
//!        ▼
//!  Arbitration ── stable sort (match score, similarity, popularity),
//!                 similarity threshold gate, single best match
//! ```
//!
//! Resolution runs synchronously inside the caller's request; there is no
//! background state. A no-match is a normal [`models::SearchResult`], not an
//! error. Batch mode applies the same pipeline per item, strictly in input
//! order, without letting one item's failure abort its siblings.
//!
//! # Modules
//!
//! - [`db`]: SQLite reference store with a registered trigram comparison
//! - [`models`]: domain types (MedicineRecord, SearchOptions, results)
//! - [`resolver`]: variant generation, scoring, strategies, arbitration

pub mod db;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use db::Database;
pub use models::{
    BatchOutcome, BatchQuery, BatchSummary, Composition, MatchType, MedicineRecord, SearchOptions,
    SearchResult,
};
pub use resolver::{extract_dose, similarity, ExtractedDose, Normalizer, Resolver, ResolverError};
