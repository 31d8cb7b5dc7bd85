//! Query-name variation generator.
//!
//! Turns one raw (often OCR-derived) medicine name into a small, deduplicated
//! set of search variants: case folds, dose-stripped base names, form-suffix
//! strips, and bounded OCR-confusion substitutions.

use super::dosage::extract_dose;

/// Minimum length for a variant to be searchable.
const MIN_VARIANT_LEN: usize = 2;

/// How many of the earliest-collected variants receive OCR substitutions.
/// A bounded heuristic: full permutation would blow up the variant count.
const OCR_BASE_VARIANT_LIMIT: usize = 3;

/// Characters OCR commonly confuses. Each class contributes one
/// replace-with-digit and one replace-with-letter form per variant.
struct ConfusionClass {
    members: &'static [char],
    digit: char,
    letter: char,
}

const OCR_CLASSES: &[ConfusionClass] = &[
    ConfusionClass {
        members: &['o', '0'],
        digit: '0',
        letter: 'o',
    },
    ConfusionClass {
        members: &['i', '1', 'l'],
        digit: '1',
        letter: 'i',
    },
    ConfusionClass {
        members: &['s', '5'],
        digit: '5',
        letter: 's',
    },
];

/// Pharmaceutical-form and release-marker suffixes stripped from the tail.
const FORM_SUFFIXES: &[&str] = &[
    "tablet",
    "tab",
    "capsule",
    "cap",
    "syrup",
    "suspension",
    "solution",
    "injection",
    "inj",
    "cream",
    "ointment",
    "gel",
    "drops",
    "powder",
    "granules",
    "mr",
    "sr",
    "xr",
    "er",
    "cr",
    "la",
    "xl",
    "ds",
];

/// Generator of search variants for a raw medicine name.
pub struct Normalizer {
    form_suffixes: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a normalizer with the default suffix table.
    pub fn new() -> Self {
        Self {
            form_suffixes: FORM_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Register an additional form suffix to strip.
    pub fn add_form_suffix(&mut self, suffix: &str) {
        self.form_suffixes.push(suffix.to_lowercase());
    }

    /// Generate deduplicated search variants, in insertion order.
    pub fn generate_variations(&self, raw_name: &str) -> Vec<String> {
        let mut variants: Vec<String> = Vec::new();
        let trimmed = raw_name.trim();

        push_unique(&mut variants, trimmed.to_string());
        push_unique(&mut variants, trimmed.to_lowercase());

        if let Some(dose) = extract_dose(trimmed) {
            if dose.base_name != trimmed {
                push_unique(&mut variants, dose.base_name.clone());
                push_unique(&mut variants, dose.base_name.to_lowercase());
            }
        }

        for variant in variants.clone() {
            if let Some(stripped) = self.strip_form_suffix(&variant) {
                push_unique(&mut variants, stripped);
            }
        }

        let ocr_bases: Vec<String> = variants
            .iter()
            .take(OCR_BASE_VARIANT_LIMIT)
            .cloned()
            .collect();
        for base in &ocr_bases {
            for class in OCR_CLASSES {
                if let Some(digit_form) = substitute(base, class.members, class.digit) {
                    push_unique(&mut variants, digit_form);
                }
                if let Some(letter_form) = substitute(base, class.members, class.letter) {
                    push_unique(&mut variants, letter_form);
                }
            }
        }

        variants.retain(|v| v.chars().count() >= MIN_VARIANT_LEN);
        variants
    }

    /// Strip known trailing form words, repeatedly ("Dolo 650 Tablet DS").
    /// Returns the stripped name if it differs from the input.
    fn strip_form_suffix(&self, name: &str) -> Option<String> {
        let mut words: Vec<&str> = name.split_whitespace().collect();
        let mut stripped = false;
        while let Some(last) = words.last() {
            let lowered = last.to_lowercase();
            if words.len() > 1 && self.form_suffixes.iter().any(|s| *s == lowered) {
                words.pop();
                stripped = true;
            } else {
                break;
            }
        }
        if stripped {
            Some(words.join(" "))
        } else {
            None
        }
    }
}

fn push_unique(variants: &mut Vec<String>, candidate: String) {
    if !variants.contains(&candidate) {
        variants.push(candidate);
    }
}

/// Replace every member of a confusion class with `replacement`,
/// case-insensitively. Returns None when nothing changed.
fn substitute(base: &str, members: &[char], replacement: char) -> Option<String> {
    let mut changed = false;
    let result: String = base
        .chars()
        .map(|c| {
            if members.contains(&c.to_ascii_lowercase()) && c.to_ascii_lowercase() != replacement {
                changed = true;
                replacement
            } else {
                c
            }
        })
        .collect();
    if changed {
        Some(result)
    } else {
        None
    }
}
