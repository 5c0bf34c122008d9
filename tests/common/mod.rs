#![allow(dead_code)]

pub mod mocks;

use std::cell::RefCell;

use library_batch::{
    core::step::{Progress, RecordFailure, StepListener},
    item::store::SqliteStore,
};
use uuid::Uuid;

pub const BOOK_HEADER: &str = "title,author,isbn,category,publication_year,publisher";

/// Remembers every event of a run.
#[derive(Default)]
pub struct Recorder {
    pub progress: RefCell<Vec<Progress>>,
    pub failures: RefCell<Vec<RecordFailure>>,
}

impl Recorder {
    pub fn percents(&self) -> Vec<u8> {
        self.progress.borrow().iter().map(|p| p.percent).collect()
    }
}

impl StepListener for Recorder {
    fn on_progress(&self, progress: Progress) {
        self.progress.borrow_mut().push(progress);
    }

    fn on_failure(&self, failure: &RecordFailure) {
        self.failures.borrow_mut().push(failure.clone());
    }
}

pub fn signed_in_store() -> SqliteStore {
    SqliteStore::in_memory()
        .unwrap()
        .with_user(Some(Uuid::new_v4()))
}

pub fn book_csv(rows: &[&str]) -> String {
    let mut csv = BOOK_HEADER.to_string();
    for row in rows {
        csv.push('\n');
        csv.push_str(row);
    }
    csv
}
