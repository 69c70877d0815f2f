//! JSON "sheet" store.
//!
//! The ledger file mirrors a spreadsheet tab: a header row of column names
//! and one loosely-typed object per bet. Rows are parsed into `BetRecord`
//! here, so malformed cells never reach the engine:
//!
//! - numeric cells accept numbers or numeric text; anything else reads as 0
//! - blank outcome cells read as Pending; unknown labels reject the row
//! - a Pending row always reads with zero profit
//! - rows without an id get a fresh one, written back immediately
//!
//! Money and odds are written as decimal strings so they round-trip exactly.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::LedgerStore;
use crate::types::{BetId, BetRecord, Outcome, StoreError};

/// Canonical column set written to every ledger file.
pub const COLUMNS: [&str; 13] = [
    "id",
    "match_date",
    "league",
    "home_team",
    "away_team",
    "market",
    "site_probability",
    "reference_odd",
    "bookmaker",
    "staked_odd",
    "stake",
    "outcome",
    "profit_loss",
];

/// Date layouts accepted in the `match_date` column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Default, Serialize, Deserialize)]
struct SheetDocument {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
}

impl SheetDocument {
    fn from_records(records: &[BetRecord]) -> Self {
        Self {
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(to_row).collect(),
        }
    }
}

/// Ledger stored as a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open a ledger file, creating it with the canonical columns if it is
    /// missing or empty. Rows lacking an id are assigned one and written
    /// back so later lookups see stable ids.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self { path: path.into() };

        if store.is_blank()? {
            store.save(&[])?;
            info!(path = %store.path.display(), "Initialised empty ledger");
            return Ok(store);
        }

        let (records, assigned) = store.read()?;
        if assigned > 0 {
            store.save(&records)?;
            info!(
                path = %store.path.display(),
                assigned,
                "Assigned ids to legacy ledger rows"
            );
        }
        Ok(store)
    }

    fn is_blank(&self) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(true);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(contents.trim().is_empty())
    }

    /// Parse the file into typed records, returning how many rows needed a
    /// freshly assigned id.
    fn read(&self) -> Result<(Vec<BetRecord>, usize), StoreError> {
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok((Vec::new(), 0));
        }
        let doc: SheetDocument = serde_json::from_str(&contents)?;

        let missing: Vec<&str> = COLUMNS
            .iter()
            .copied()
            .filter(|c| !doc.columns.iter().any(|have| have.as_str() == *c))
            .collect();
        if !missing.is_empty() && !doc.rows.is_empty() {
            warn!(path = %self.path.display(), ?missing, "Ledger is missing columns");
        }

        let mut records = Vec::with_capacity(doc.rows.len());
        let mut seen = HashSet::new();
        let mut assigned = 0;
        for (index, row) in doc.rows.iter().enumerate() {
            let (record, fresh_id) = parse_row(index, row)?;
            if !seen.insert(record.id) {
                return Err(StoreError::MalformedRow {
                    row: index,
                    reason: format!("duplicate id {}", record.id),
                });
            }
            if fresh_id {
                assigned += 1;
            }
            records.push(record);
        }
        Ok((records, assigned))
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Vec<BetRecord>, StoreError> {
        let (records, assigned) = self.read()?;
        if assigned > 0 {
            // Rows added by hand since `open`; their ids must survive reloads.
            self.write(&records)?;
            info!(
                path = %self.path.display(),
                assigned,
                "Assigned ids to new ledger rows"
            );
        }
        debug!(path = %self.path.display(), rows = records.len(), "Ledger loaded");
        Ok(records)
    }

    fn save(&mut self, records: &[BetRecord]) -> Result<(), StoreError> {
        self.write(records)
    }
}

impl JsonFileStore {
    fn write(&self, records: &[BetRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&SheetDocument::from_records(records))?;

        // Write then rename, so a failed write leaves the old ledger intact.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), rows = records.len(), "Ledger saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn to_row(r: &BetRecord) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id".into(), Value::String(r.id.to_string()));
    row.insert("match_date".into(), Value::String(r.match_date.format("%Y-%m-%d").to_string()));
    row.insert("league".into(), Value::String(r.league.clone()));
    row.insert("home_team".into(), Value::String(r.home_team.clone()));
    row.insert("away_team".into(), Value::String(r.away_team.clone()));
    row.insert("market".into(), Value::String(r.market.clone()));
    row.insert("site_probability".into(), Value::String(r.site_probability.to_string()));
    row.insert("reference_odd".into(), Value::String(r.reference_odd.to_string()));
    row.insert("bookmaker".into(), Value::String(r.bookmaker.clone()));
    row.insert("staked_odd".into(), Value::String(r.staked_odd.to_string()));
    row.insert("stake".into(), Value::String(r.stake.to_string()));
    row.insert("outcome".into(), Value::String(r.outcome.to_string()));
    row.insert("profit_loss".into(), Value::String(r.profit_loss.to_string()));
    row
}

/// Parse one sheet row. The flag is true when the row had no id.
fn parse_row(index: usize, row: &Map<String, Value>) -> Result<(BetRecord, bool), StoreError> {
    let (id, fresh_id) = match row.get("id").map(cell_text) {
        Some(raw) if !raw.is_empty() => {
            let id = BetId::from_str(&raw).map_err(|e| StoreError::MalformedRow {
                row: index,
                reason: format!("invalid id {raw:?}: {e}"),
            })?;
            (id, false)
        }
        _ => (BetId::new(), true),
    };

    let match_date = parse_date(row.get("match_date")).ok_or_else(|| StoreError::MalformedRow {
        row: index,
        reason: format!("unreadable match_date {:?}", row.get("match_date")),
    })?;

    let outcome = parse_outcome(index, row.get("outcome"))?;
    let mut profit_loss = coerce_decimal(index, "profit_loss", row.get("profit_loss"));
    if !outcome.is_settled() && !profit_loss.is_zero() {
        warn!(row = index, %profit_loss, "Pending row carried a profit; reading as 0");
        profit_loss = Decimal::ZERO;
    }

    let record = BetRecord {
        id,
        match_date,
        league: text(row, "league"),
        home_team: text(row, "home_team"),
        away_team: text(row, "away_team"),
        market: text(row, "market"),
        site_probability: coerce_decimal(index, "site_probability", row.get("site_probability")),
        reference_odd: coerce_decimal(index, "reference_odd", row.get("reference_odd")),
        bookmaker: text(row, "bookmaker"),
        staked_odd: coerce_decimal(index, "staked_odd", row.get("staked_odd")),
        stake: coerce_decimal(index, "stake", row.get("stake")),
        outcome,
        profit_loss,
    };
    Ok((record, fresh_id))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text(row: &Map<String, Value>, column: &str) -> String {
    row.get(column).map(cell_text).unwrap_or_default()
}

/// Read a numeric cell, coercing anything unreadable to zero.
fn coerce_decimal(index: usize, column: &str, value: Option<&Value>) -> Decimal {
    let raw = match value {
        None | Some(Value::Null) => return Decimal::ZERO,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Decimal::ZERO,
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };

    match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
        Ok(d) => d,
        Err(_) => {
            warn!(row = index, column, value = %raw, "Non-numeric cell; reading as 0");
            Decimal::ZERO
        }
    }
}

fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    let raw = cell_text(value?);
    // Timestamps such as "2026-03-14 00:00:00" keep only their date part.
    let day = raw.split(['T', ' ']).next().unwrap_or_default();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// A blank cell is a fresh Pending bet. Any other unrecognised label (e.g.
/// "Void") rejects the row rather than being rewritten as Pending.
fn parse_outcome(index: usize, value: Option<&Value>) -> Result<Outcome, StoreError> {
    let raw = value.map(cell_text).unwrap_or_default();
    if raw.is_empty() {
        return Ok(Outcome::Pending);
    }
    raw.parse().map_err(|_| StoreError::MalformedRow {
        row: index,
        reason: format!("unknown outcome {raw:?}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::Path;

    fn temp_path() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("stakebook_test_ledger_{}.json", uuid::Uuid::new_v4()));
        p
    }

    fn write_raw(path: &Path, json: &str) {
        std::fs::write(path, json).unwrap();
    }

    #[test]
    fn test_open_initialises_columns() {
        let path = temp_path();
        let store = JsonFileStore::open(&path).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let columns: Vec<&str> = raw["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c.as_str().unwrap())
            .collect();
        assert_eq!(columns, COLUMNS.to_vec());
        assert!(store.load().unwrap().is_empty());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_initialises_blank_file() {
        let path = temp_path();
        write_raw(&path, "  \n");
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.load().unwrap().is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_and_load_preserves_fields() {
        let path = temp_path();
        let mut store = JsonFileStore::open(&path).unwrap();

        let mut settled = BetRecord::sample();
        settled.stake = dec!(33.33);
        settled.staked_odd = dec!(1.87);
        settled.outcome = Outcome::Won;
        settled.profit_loss = dec!(28.9971);
        let pending = BetRecord::sample();

        store.save(&[settled.clone(), pending.clone()]).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, vec![settled, pending]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_malformed_numbers_coerce_to_zero() {
        let path = temp_path();
        write_raw(
            &path,
            r#"{
                "columns": [],
                "rows": [{
                    "id": "6f1c1c1e-9a43-4d8e-8f86-0d6f4cbd4a10",
                    "match_date": "2026-03-01",
                    "stake": "fifty",
                    "staked_odd": 1.9,
                    "outcome": "Lost",
                    "profit_loss": ""
                }]
            }"#,
        );
        let store = JsonFileStore::open(&path).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].stake, Decimal::ZERO);
        assert_eq!(loaded[0].staked_odd, dec!(1.9));
        assert_eq!(loaded[0].profit_loss, Decimal::ZERO);
        assert_eq!(loaded[0].outcome, Outcome::Lost);
        assert_eq!(loaded[0].league, "");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_legacy_sheet_is_migrated() {
        let path = temp_path();
        write_raw(
            &path,
            r#"{
                "columns": ["data_jogo"],
                "rows": [
                    {"match_date": "2026-02-10 00:00:00", "stake": 50, "staked_odd": 2,
                     "outcome": "Green", "profit_loss": 50},
                    {"match_date": "11/02/2026", "stake": "30", "staked_odd": "1.8",
                     "outcome": "Pendente", "profit_loss": 12}
                ]
            }"#,
        );

        let store = JsonFileStore::open(&path).unwrap();
        let first = store.load().unwrap();
        let second = store.load().unwrap();

        // Ids assigned on open are persisted, so reloads agree.
        assert_eq!(first, second);
        assert_eq!(first[0].outcome, Outcome::Won);
        assert_eq!(first[0].match_date, NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
        assert_eq!(first[1].outcome, Outcome::Pending);
        assert_eq!(first[1].match_date, NaiveDate::from_ymd_opt(2026, 2, 11).unwrap());
        assert_eq!(first[1].stake, dec!(30));
        assert_eq!(first[1].profit_loss, Decimal::ZERO);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_outcome_is_malformed_row() {
        let path = temp_path();
        let raw = r#"{"columns": [], "rows": [
                {"id": "0b8f2f5a-2d9b-4b47-9d55-4b2f7f4b0c11", "match_date": "2026-01-05",
                 "outcome": "Void", "stake": 10, "profit_loss": -10}
            ]}"#;
        write_raw(&path, raw);

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { row: 0, .. }));
        assert!(err.to_string().contains("Void"));
        // The original row is left as it was.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_blank_outcome_reads_as_pending() {
        let path = temp_path();
        write_raw(
            &path,
            r#"{"columns": [], "rows": [
                {"id": "0b8f2f5a-2d9b-4b47-9d55-4b2f7f4b0c11", "match_date": "2026-01-05",
                 "outcome": "", "stake": 10}
            ]}"#,
        );
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.load().unwrap()[0].outcome, Outcome::Pending);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_rows_added_after_open_keep_their_ids() {
        let path = temp_path();
        let mut store = JsonFileStore::open(&path).unwrap();
        store.save(&[BetRecord::sample()]).unwrap();

        // A row typed into the sheet by hand, without an id.
        let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        doc["rows"].as_array_mut().unwrap().push(serde_json::json!({
            "match_date": "2026-03-20",
            "home_team": "Sport",
            "away_team": "Náutico",
            "stake": "25",
            "staked_odd": "2.1"
        }));
        write_raw(&path, &doc.to_string());

        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].id, second[1].id);
        assert_eq!(first, second);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unreadable_date_is_malformed_row() {
        let path = temp_path();
        write_raw(
            &path,
            r#"{"columns": [], "rows": [
                {"id": "0b8f2f5a-2d9b-4b47-9d55-4b2f7f4b0c11", "match_date": "someday"}
            ]}"#,
        );
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { row: 0, .. }));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let path = temp_path();
        write_raw(
            &path,
            r#"{"columns": [], "rows": [
                {"id": "0b8f2f5a-2d9b-4b47-9d55-4b2f7f4b0c11", "match_date": "2026-01-05"},
                {"id": "0b8f2f5a-2d9b-4b47-9d55-4b2f7f4b0c11", "match_date": "2026-01-06"}
            ]}"#,
        );
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { row: 1, .. }));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let path = temp_path();
        write_raw(&path, "{ not json");
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_after_open_is_io_error() {
        let path = temp_path();
        let store = JsonFileStore::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let path = temp_path();
        let mut store = JsonFileStore::open(&path).unwrap();
        store.save(&[BetRecord::sample()]).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_coerce_decimal_variants() {
        assert_eq!(coerce_decimal(0, "stake", Some(&Value::from(12.5))), dec!(12.5));
        assert_eq!(coerce_decimal(0, "stake", Some(&Value::from(" 7 "))), dec!(7));
        assert_eq!(coerce_decimal(0, "stake", Some(&Value::from("1e2"))), dec!(100));
        assert_eq!(coerce_decimal(0, "stake", Some(&Value::Bool(true))), Decimal::ZERO);
        assert_eq!(coerce_decimal(0, "stake", None), Decimal::ZERO);
    }
}
