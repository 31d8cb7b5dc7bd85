//! Domain models for the medicine catalog and search results.

mod medicine;
mod search;

pub use medicine::*;
pub use search::*;
