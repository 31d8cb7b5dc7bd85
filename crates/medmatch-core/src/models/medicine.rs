//! Medicine catalog models.

use serde::{Deserialize, Serialize};

/// Number of composition slots per catalog record.
pub const COMPOSITION_SLOTS: usize = 5;

/// A single medicine in the reference catalog.
///
/// Composition slots are sparse: any slot may be empty, and slot order
/// reflects storage position only, not clinical significance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineRecord {
    /// Catalog primary key
    pub id: i64,
    /// Brand name as listed in the catalog
    pub brand_name: String,
    /// Up to 5 sparse composition (salt) slots
    pub compositions: [Option<Composition>; COMPOSITION_SLOTS],
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Retail price
    pub price: Option<f64>,
    /// Package size (e.g., "10 tablets", "60mL bottle")
    pub pack_size: Option<String>,
    /// Pharmaceutical form (tablet, syrup, injection, ...)
    pub medicine_type: Option<String>,
    /// Popularity weight used as a ranking tie-break
    pub popularity: Option<f64>,
    /// Whether the record is active in the catalog
    pub is_active: bool,
    /// Soft-delete flag set when the record is withdrawn
    pub is_deactivated: bool,
}

/// One composition (salt) entry: name plus optional strength and unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Composition {
    /// Salt/ingredient name (e.g., "Paracetamol")
    pub name: String,
    /// Strength as the catalog's numeric string (e.g., "500")
    pub strength: Option<String>,
    /// Strength unit (e.g., "mg")
    pub unit: Option<String>,
}

impl MedicineRecord {
    /// Create a new record with required fields.
    pub fn new(id: i64, brand_name: String) -> Self {
        Self {
            id,
            brand_name,
            compositions: Default::default(),
            manufacturer: None,
            price: None,
            pack_size: None,
            medicine_type: None,
            popularity: None,
            is_active: true,
            is_deactivated: false,
        }
    }

    /// Iterate over the populated composition slots.
    pub fn active_compositions(&self) -> impl Iterator<Item = &Composition> {
        self.compositions.iter().filter_map(|c| c.as_ref())
    }

    /// Whether this record may be returned by any search strategy.
    pub fn is_available(&self) -> bool {
        self.is_active && !self.is_deactivated
    }
}

impl Composition {
    /// Check whether this slot carries the given strength and unit.
    ///
    /// Strength comparisons tolerate "500" vs "500.0"; units compare
    /// case-insensitively. A slot with no stored strength or unit never
    /// matches a dose.
    pub fn matches_strength_unit(&self, strength: &str, unit: &str) -> bool {
        let strength_matches = self
            .strength
            .as_deref()
            .map(|s| strengths_equal(s, strength))
            .unwrap_or(false);
        let unit_matches = self
            .unit
            .as_deref()
            .map(|u| u.eq_ignore_ascii_case(unit.trim()))
            .unwrap_or(false);
        strength_matches && unit_matches
    }
}

/// Compare two catalog strength strings, tolerating "500" vs "500.0".
fn strengths_equal(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => (x - y).abs() < f64::EPSILON,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, strength: Option<&str>, unit: Option<&str>) -> Composition {
        Composition {
            name: name.into(),
            strength: strength.map(String::from),
            unit: unit.map(String::from),
        }
    }

    #[test]
    fn test_active_compositions_skips_empty_slots() {
        let mut rec = MedicineRecord::new(1, "Test".into());
        rec.compositions[2] = Some(Composition {
            name: "Paracetamol".into(),
            strength: Some("500".into()),
            unit: Some("mg".into()),
        });

        let names: Vec<&str> = rec.active_compositions().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Paracetamol"]);
    }

    #[test]
    fn test_is_available() {
        let mut rec = MedicineRecord::new(1, "Test".into());
        assert!(rec.is_available());

        rec.is_deactivated = true;
        assert!(!rec.is_available());

        rec.is_deactivated = false;
        rec.is_active = false;
        assert!(!rec.is_available());
    }

    #[test]
    fn test_composition_strength_match() {
        let comp = slot("Paracetamol", Some("500"), Some("mg"));

        assert!(comp.matches_strength_unit("500", "mg"));
        assert!(comp.matches_strength_unit("500", "MG"));
        assert!(comp.matches_strength_unit("500.0", "mg"));
        assert!(!comp.matches_strength_unit("250", "mg"));
        assert!(!comp.matches_strength_unit("500", "ml"));
    }

    #[test]
    fn test_composition_without_strength_never_matches_dose() {
        let comp = slot("Paracetamol", None, None);
        assert!(!comp.matches_strength_unit("500", "mg"));
    }
}
