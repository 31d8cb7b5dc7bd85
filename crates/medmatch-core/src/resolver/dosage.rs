//! Dosage token extraction.
//!
//! Splits a raw name like "Paracetamol 500mg" into a base name and a
//! strength/unit pair so the normalizer can search on the bare name.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches an integer or decimal immediately followed by a known unit.
/// Longest units first so "mcg" is not read as "mc" + "g".
static DOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(mcg|mg|gm|ml|iu|g|l|%)").expect("dose pattern is valid")
});

/// A dosage token parsed out of a raw name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedDose {
    /// Input with the dose token removed and whitespace collapsed
    pub base_name: String,
    /// Numeric strength as written (e.g., "500", "2.5")
    pub strength: String,
    /// Unit, lowercased (mg, gm, ml, mcg, g, l, iu, %)
    pub unit: String,
    /// The matched token verbatim
    pub raw_token: String,
}

/// Extract the first dose token from `name`, if any.
pub fn extract_dose(name: &str) -> Option<ExtractedDose> {
    for caps in DOSE_RE.captures_iter(name) {
        let full = caps.get(0).expect("capture 0 always present");
        // Reject partial-word hits like the "5l" inside "5lots": the unit must
        // end the token.
        if name[full.end()..]
            .chars()
            .next()
            .map(|c| c.is_ascii_alphanumeric())
            .unwrap_or(false)
        {
            continue;
        }

        let mut base_name = String::with_capacity(name.len());
        base_name.push_str(&name[..full.start()]);
        base_name.push(' ');
        base_name.push_str(&name[full.end()..]);
        let base_name = base_name.split_whitespace().collect::<Vec<_>>().join(" ");

        return Some(ExtractedDose {
            base_name,
            strength: caps[1].to_string(),
            unit: caps[2].to_lowercase(),
            raw_token: full.as_str().to_string(),
        });
    }
    None
}
