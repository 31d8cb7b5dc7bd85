//! Medicine catalog queries.
//!
//! All user-controlled values are bound as parameters; search terms are never
//! spliced into SQL text. Every search query filters out soft-deleted rows.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Composition, MedicineRecord, COMPOSITION_SLOTS};

/// Minimum trigram similarity for a brand name to enter the fuzzy pool
/// without a substring hit (pg_trgm's default threshold).
const FUZZY_TRIGRAM_FLOOR: f64 = 0.3;

/// Column list shared by every SELECT, in `read_record` order.
const MEDICINE_COLUMNS: &str = "id, brand_name, \
    comp1_name, comp1_strength, comp1_unit, \
    comp2_name, comp2_strength, comp2_unit, \
    comp3_name, comp3_strength, comp3_unit, \
    comp4_name, comp4_strength, comp4_unit, \
    comp5_name, comp5_strength, comp5_unit, \
    manufacturer, price, pack_size, medicine_type, popularity, \
    is_active, is_deactivated";

impl Database {
    /// Insert or update a catalog record (ingest and test seeding only;
    /// the resolver itself never writes).
    pub fn upsert_medicine(&self, m: &MedicineRecord) -> DbResult<()> {
        let slot = |i: usize| m.compositions[i].as_ref();
        self.conn().execute(
            r#"
            INSERT INTO medicines (
                id, brand_name,
                comp1_name, comp1_strength, comp1_unit,
                comp2_name, comp2_strength, comp2_unit,
                comp3_name, comp3_strength, comp3_unit,
                comp4_name, comp4_strength, comp4_unit,
                comp5_name, comp5_strength, comp5_unit,
                manufacturer, price, pack_size, medicine_type, popularity,
                is_active, is_deactivated, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                      datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                brand_name = excluded.brand_name,
                comp1_name = excluded.comp1_name,
                comp1_strength = excluded.comp1_strength,
                comp1_unit = excluded.comp1_unit,
                comp2_name = excluded.comp2_name,
                comp2_strength = excluded.comp2_strength,
                comp2_unit = excluded.comp2_unit,
                comp3_name = excluded.comp3_name,
                comp3_strength = excluded.comp3_strength,
                comp3_unit = excluded.comp3_unit,
                comp4_name = excluded.comp4_name,
                comp4_strength = excluded.comp4_strength,
                comp4_unit = excluded.comp4_unit,
                comp5_name = excluded.comp5_name,
                comp5_strength = excluded.comp5_strength,
                comp5_unit = excluded.comp5_unit,
                manufacturer = excluded.manufacturer,
                price = excluded.price,
                pack_size = excluded.pack_size,
                medicine_type = excluded.medicine_type,
                popularity = excluded.popularity,
                is_active = excluded.is_active,
                is_deactivated = excluded.is_deactivated,
                updated_at = datetime('now')
            "#,
            params![
                m.id,
                m.brand_name,
                slot(0).map(|c| c.name.as_str()),
                slot(0).and_then(|c| c.strength.as_deref()),
                slot(0).and_then(|c| c.unit.as_deref()),
                slot(1).map(|c| c.name.as_str()),
                slot(1).and_then(|c| c.strength.as_deref()),
                slot(1).and_then(|c| c.unit.as_deref()),
                slot(2).map(|c| c.name.as_str()),
                slot(2).and_then(|c| c.strength.as_deref()),
                slot(2).and_then(|c| c.unit.as_deref()),
                slot(3).map(|c| c.name.as_str()),
                slot(3).and_then(|c| c.strength.as_deref()),
                slot(3).and_then(|c| c.unit.as_deref()),
                slot(4).map(|c| c.name.as_str()),
                slot(4).and_then(|c| c.strength.as_deref()),
                slot(4).and_then(|c| c.unit.as_deref()),
                m.manufacturer,
                m.price,
                m.pack_size,
                m.medicine_type,
                m.popularity,
                m.is_active,
                m.is_deactivated,
            ],
        )?;
        Ok(())
    }

    /// Fetch a record by id, bypassing all fuzzy logic.
    pub fn get_medicine(&self, id: i64) -> DbResult<Option<MedicineRecord>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1");
        let record = self
            .conn()
            .query_row(&sql, [id], read_record)
            .optional()?;
        Ok(record)
    }

    /// Case-insensitive exact brand-name lookup; ties broken by popularity,
    /// descending, nulls last.
    pub fn find_exact_brand(&self, name: &str) -> DbResult<Option<MedicineRecord>> {
        let sql = format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines \
             WHERE brand_name = ?1 COLLATE NOCASE \
               AND is_active = 1 AND is_deactivated = 0 \
             ORDER BY popularity IS NULL, popularity DESC \
             LIMIT 1"
        );
        let record = self
            .conn()
            .query_row(&sql, [name], read_record)
            .optional()?;
        Ok(record)
    }

    /// Brand names containing `term` as a case-insensitive substring, plus
    /// trigram-similar names so single-character OCR damage still surfaces
    /// candidates (those rows score as weak matches downstream).
    pub fn find_brand_fuzzy(&self, term: &str, limit: usize) -> DbResult<Vec<MedicineRecord>> {
        let sql = format!(
            "SELECT {MEDICINE_COLUMNS}, trigram_sim(brand_name, ?2) AS brand_sim \
             FROM medicines \
             WHERE (brand_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                 OR trigram_sim(brand_name, ?2) >= ?3) \
               AND is_active = 1 AND is_deactivated = 0 \
             ORDER BY brand_sim DESC, popularity IS NULL, popularity DESC \
             LIMIT ?4"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![escape_like(term), term, FUZZY_TRIGRAM_FLOOR, limit as i64],
            read_record,
        )?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }

    /// Records ranked by the best trigram similarity between `term` and any
    /// composition slot. Rows with zero similarity are dropped.
    pub fn find_by_composition(
        &self,
        term: &str,
        limit: usize,
    ) -> DbResult<Vec<(MedicineRecord, f64)>> {
        let sql = format!(
            "SELECT {MEDICINE_COLUMNS}, \
                    MAX(trigram_sim(comp1_name, ?1), trigram_sim(comp2_name, ?1), \
                        trigram_sim(comp3_name, ?1), trigram_sim(comp4_name, ?1), \
                        trigram_sim(comp5_name, ?1)) AS comp_sim \
             FROM medicines \
             WHERE is_active = 1 AND is_deactivated = 0 \
             ORDER BY comp_sim DESC \
             LIMIT ?2"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![term, limit as i64], |row| {
            let record = read_record(row)?;
            let comp_sim: f64 = row.get(24)?;
            Ok((record, comp_sim))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (record, comp_sim) = row?;
            if comp_sim > 0.0 {
                out.push((record, comp_sim));
            }
        }
        Ok(out)
    }

    /// Containment fallback over composition names, for salts too garbled
    /// for trigram overlap.
    pub fn find_composition_containing(
        &self,
        term: &str,
        limit: usize,
    ) -> DbResult<Vec<MedicineRecord>> {
        let sql = format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines \
             WHERE (comp1_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                 OR comp2_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                 OR comp3_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                 OR comp4_name LIKE '%' || ?1 || '%' ESCAPE '\\' \
                 OR comp5_name LIKE '%' || ?1 || '%' ESCAPE '\\') \
               AND is_active = 1 AND is_deactivated = 0 \
             ORDER BY popularity IS NULL, popularity DESC \
             LIMIT ?2"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![escape_like(term), limit as i64], read_record)?;
        rows.map(|r| r.map_err(Into::into)).collect()
    }

    /// Soft-delete a record so no strategy can return it.
    pub fn deactivate_medicine(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn().execute(
            "UPDATE medicines SET is_deactivated = 1, updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Map a row in `MEDICINE_COLUMNS` order to a record.
fn read_record(row: &Row<'_>) -> rusqlite::Result<MedicineRecord> {
    let mut compositions: [Option<Composition>; COMPOSITION_SLOTS] = Default::default();
    for (i, slot) in compositions.iter_mut().enumerate() {
        let base = 2 + i * 3;
        let name: Option<String> = row.get(base)?;
        if let Some(name) = name {
            *slot = Some(Composition {
                name,
                strength: row.get(base + 1)?,
                unit: row.get(base + 2)?,
            });
        }
    }

    Ok(MedicineRecord {
        id: row.get(0)?,
        brand_name: row.get(1)?,
        compositions,
        manufacturer: row.get(17)?,
        price: row.get(18)?,
        pack_size: row.get(19)?,
        medicine_type: row.get(20)?,
        popularity: row.get(21)?,
        is_active: row.get(22)?,
        is_deactivated: row.get(23)?,
    })
}

/// Escape LIKE wildcards in a user term (paired with `ESCAPE '\'`).
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();

        let mut m1 = MedicineRecord::new(1, "Paracetamol".into());
        m1.compositions[0] = Some(Composition {
            name: "Paracetamol".into(),
            strength: Some("500".into()),
            unit: Some("mg".into()),
        });
        m1.manufacturer = Some("Acme Pharma".into());
        m1.popularity = Some(90.0);
        db.upsert_medicine(&m1).unwrap();

        let mut m2 = MedicineRecord::new(2, "Paracip 650".into());
        m2.compositions[0] = Some(Composition {
            name: "Paracetamol".into(),
            strength: Some("650".into()),
            unit: Some("mg".into()),
        });
        m2.popularity = Some(40.0);
        db.upsert_medicine(&m2).unwrap();

        let mut m3 = MedicineRecord::new(3, "Metform".into());
        m3.compositions[0] = Some(Composition {
            name: "Metformin Hydrochloride".into(),
            strength: Some("500".into()),
            unit: Some("mg".into()),
        });
        db.upsert_medicine(&m3).unwrap();

        db
    }

    #[test]
    fn test_upsert_and_get() {
        let db = seeded_db();

        let rec = db.get_medicine(1).unwrap().unwrap();
        assert_eq!(rec.brand_name, "Paracetamol");
        assert_eq!(rec.manufacturer.as_deref(), Some("Acme Pharma"));
        let comp = rec.compositions[0].as_ref().unwrap();
        assert_eq!(comp.name, "Paracetamol");
        assert_eq!(comp.strength.as_deref(), Some("500"));
        assert!(rec.compositions[1].is_none());
    }

    #[test]
    fn test_upsert_updates() {
        let db = seeded_db();

        let mut rec = db.get_medicine(1).unwrap().unwrap();
        rec.brand_name = "Paracetamol Plus".into();
        db.upsert_medicine(&rec).unwrap();

        let updated = db.get_medicine(1).unwrap().unwrap();
        assert_eq!(updated.brand_name, "Paracetamol Plus");
    }

    #[test]
    fn test_exact_brand_case_insensitive() {
        let db = seeded_db();

        let rec = db.find_exact_brand("PARACETAMOL").unwrap().unwrap();
        assert_eq!(rec.id, 1);

        assert!(db.find_exact_brand("Paraceta").unwrap().is_none());
    }

    #[test]
    fn test_exact_brand_popularity_tiebreak() {
        let db = Database::open_in_memory().unwrap();

        let mut a = MedicineRecord::new(10, "Dolo".into());
        a.popularity = None;
        db.upsert_medicine(&a).unwrap();

        let mut b = MedicineRecord::new(11, "Dolo".into());
        b.popularity = Some(5.0);
        db.upsert_medicine(&b).unwrap();

        let rec = db.find_exact_brand("dolo").unwrap().unwrap();
        assert_eq!(rec.id, 11, "popular record wins, null popularity last");
    }

    #[test]
    fn test_brand_fuzzy_substring() {
        let db = seeded_db();

        let rows = db.find_brand_fuzzy("para", 10).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
        assert!(!ids.contains(&3));

        let rows = db.find_brand_fuzzy("para", 1).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_brand_fuzzy_admits_trigram_neighbors() {
        let db = seeded_db();

        // Dropped letter: not a substring, close enough in trigram space
        let rows = db.find_brand_fuzzy("Paracetmol", 10).unwrap();
        assert!(rows.iter().any(|r| r.id == 1));
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let db = seeded_db();

        // '%' from a garbled query must not match everything
        let rows = db.find_brand_fuzzy("%", 10).unwrap();
        assert!(rows.is_empty());

        let rows = db.find_brand_fuzzy("p_ra", 10).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_find_by_composition() {
        let db = seeded_db();

        let rows = db.find_by_composition("Paracetamol", 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, 1.0);

        let rows = db.find_by_composition("Metformin", 10).unwrap();
        assert_eq!(rows[0].0.id, 3);
        assert!(rows[0].1 > 0.3);
    }

    #[test]
    fn test_composition_containing() {
        let db = seeded_db();

        let rows = db.find_composition_containing("metformin", 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);
    }

    #[test]
    fn test_deactivated_never_returned() {
        let db = seeded_db();
        db.deactivate_medicine(1).unwrap();

        assert!(db.find_exact_brand("Paracetamol").unwrap().map(|r| r.id) != Some(1));
        assert!(db
            .find_brand_fuzzy("Paracetamol", 10)
            .unwrap()
            .iter()
            .all(|r| r.id != 1));
        assert!(db
            .find_by_composition("Paracetamol", 10)
            .unwrap()
            .iter()
            .all(|(r, _)| r.id != 1));

        // Direct id lookup still works (soft delete, not erasure)
        let rec = db.get_medicine(1).unwrap().unwrap();
        assert!(rec.is_deactivated);
    }
}
