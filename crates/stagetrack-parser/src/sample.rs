//! Built-in synthetic dataset
//!
//! Used when real ingestion is unavailable so downstream layout always has
//! valid input. Three projects across two org units.

use chrono::NaiveDate;

use stagetrack_core::RawStageRecord;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// The synthetic sample records
pub fn sample_records() -> Vec<RawStageRecord> {
    vec![
        RawStageRecord::new("Residencial Alfa", "DM")
            .org_unit("UGB1")
            .planned(ymd(2024, 2, 1), ymd(2024, 2, 28))
            .actual(ymd(2024, 2, 5), ymd(2024, 3, 2))
            .completion(100.0),
        RawStageRecord::new("Residencial Alfa", "DOC")
            .org_unit("UGB1")
            .planned(ymd(2024, 3, 1), ymd(2024, 4, 10))
            .actual(ymd(2024, 3, 3), ymd(2024, 4, 15))
            .completion(100.0),
        RawStageRecord::new("Residencial Alfa", "ENG")
            .org_unit("UGB1")
            .planned(ymd(2024, 4, 15), ymd(2024, 5, 30))
            .completion(40.0),
        RawStageRecord::new("Condomínio Beta", "DM")
            .org_unit("UGB2")
            .planned(ymd(2024, 3, 20), ymd(2024, 4, 28))
            .actual(ymd(2024, 3, 25), ymd(2024, 5, 5))
            .completion(100.0),
        RawStageRecord::new("Condomínio Beta", "DOC")
            .org_unit("UGB2")
            .planned(ymd(2024, 5, 1), ymd(2024, 6, 15))
            .started(ymd(2024, 5, 5))
            .completion(85.0),
        RawStageRecord::new("Projeto Gama", "DM")
            .org_unit("UGB1")
            .planned(ymd(2024, 1, 10), ymd(2024, 1, 31))
            .actual(ymd(2024, 1, 12), ymd(2024, 2, 1))
            .completion(100.0),
    ]
}
