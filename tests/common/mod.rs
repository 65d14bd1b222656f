#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use taskplan::Database;
use tempfile::TempDir;

/// A store in its own temporary directory; the directory lives as long as the value
pub struct TestStore {
    pub dir: TempDir,
    pub db: Database,
}

pub fn open_store() -> TestStore {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db = Database::open(dir.path().join("taskmanager.db")).expect("open store");
    TestStore { dir, db }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).expect("valid time")
}
