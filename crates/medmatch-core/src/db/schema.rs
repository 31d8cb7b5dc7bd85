//! SQLite schema definition.

/// Complete reference-catalog schema.
///
/// Composition slots are flattened into columns so the composition strategy
/// can score each slot in SQL via the registered `trigram_sim` function.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS medicines (
    id INTEGER PRIMARY KEY,
    brand_name TEXT NOT NULL,
    comp1_name TEXT, comp1_strength TEXT, comp1_unit TEXT,
    comp2_name TEXT, comp2_strength TEXT, comp2_unit TEXT,
    comp3_name TEXT, comp3_strength TEXT, comp3_unit TEXT,
    comp4_name TEXT, comp4_strength TEXT, comp4_unit TEXT,
    comp5_name TEXT, comp5_strength TEXT, comp5_unit TEXT,
    manufacturer TEXT,
    price REAL,
    pack_size TEXT,
    medicine_type TEXT,
    popularity REAL,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_deactivated INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_medicines_brand
    ON medicines(brand_name COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_medicines_availability
    ON medicines(is_active, is_deactivated);
"#;
