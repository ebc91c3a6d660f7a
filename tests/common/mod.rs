//! Shared test doubles: scripted storage and a recording notifier.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use parkwell::{
    BookingNotice, Error, NotificationEvent, Notifier, Result, Row, SqlValue, Storage,
    TransactionHandle, VisitType,
};
use std::collections::VecDeque;

/// Scripted mutation outcome
pub enum MutationScript {
    Succeed,
    Reject,
    Fault,
}

#[derive(Default)]
struct Script {
    issued: Vec<String>,
    selects: VecDeque<Vec<Row>>,
    mutations: VecDeque<MutationScript>,
    begun: usize,
    committed: usize,
    rolled_back: usize,
}

/// Storage double that records every statement and plays back canned
/// select results and mutation outcomes in order.
#[derive(Default)]
pub struct ScriptedStorage {
    script: Mutex<Script>,
}

impl ScriptedStorage {
    pub fn script_select(&self, rows: Vec<Row>) {
        self.script.lock().selects.push_back(rows);
    }

    pub fn script_mutation(&self, outcome: MutationScript) {
        self.script.lock().mutations.push_back(outcome);
    }

    pub fn issued(&self) -> Vec<String> {
        self.script.lock().issued.clone()
    }

    /// (begun, committed, rolled_back)
    pub fn counts(&self) -> (usize, usize, usize) {
        let s = self.script.lock();
        (s.begun, s.committed, s.rolled_back)
    }
}

impl Storage for ScriptedStorage {
    fn execute_select(&self, sql: &str) -> Result<Vec<Row>> {
        let mut script = self.script.lock();
        script.issued.push(sql.to_string());
        Ok(script.selects.pop_front().unwrap_or_default())
    }

    fn execute_mutation(&self, sql: &str) -> Result<bool> {
        let mut script = self.script.lock();
        script.issued.push(sql.to_string());
        match script.mutations.pop_front() {
            None | Some(MutationScript::Succeed) => Ok(true),
            Some(MutationScript::Reject) => Ok(false),
            Some(MutationScript::Fault) => Err(Error::StorageFault("scripted fault".into())),
        }
    }

    fn begin_exclusive(&self) -> Result<TransactionHandle> {
        let mut script = self.script.lock();
        script.begun += 1;
        Ok(TransactionHandle(script.begun as u64))
    }

    fn commit(&self, _txn: TransactionHandle) -> Result<()> {
        self.script.lock().committed += 1;
        Ok(())
    }

    fn rollback(&self, _txn: TransactionHandle) -> Result<()> {
        self.script.lock().rolled_back += 1;
        Ok(())
    }
}

/// Notifier double that records every invocation
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(NotificationEvent, BookingNotice)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &NotificationEvent, notice: &BookingNotice) -> Result<()> {
        self.sent.lock().push((event.clone(), notice.clone()));
        Ok(())
    }
}

/// A "Yellow Hills" parks-table row
pub fn yellow_hills_row() -> Row {
    vec![
        SqlValue::Int(7),
        SqlValue::Text("Yellow Hills".into()),
        SqlValue::Text("Alberton".into()),
        SqlValue::Text("North".into()),
        SqlValue::Text("Sam Ortiz".into()),
        SqlValue::Text("sam@example.com".into()),
        SqlValue::Int(500),
        SqlValue::Int(40),
        SqlValue::Int(180),
        SqlValue::Int(112),
    ]
}

/// A booking row for Yellow Hills with the given slot and entry timestamp
pub fn booking_row(
    id: i64,
    date: NaiveDate,
    time: NaiveTime,
    entry_at: Option<NaiveDateTime>,
) -> Row {
    vec![
        SqlValue::Int(id),
        SqlValue::Date(date),
        SqlValue::Time(time),
        SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        SqlValue::Text(VisitType::Individual.as_str().into()),
        SqlValue::Int(2),
        SqlValue::Text("Ana Ruiz".into()),
        SqlValue::Text("ana@example.com".into()),
        SqlValue::Text("555-0101".into()),
        SqlValue::Float(16.0),
        SqlValue::Bool(true),
        SqlValue::Bool(true),
        entry_at.map(SqlValue::DateTime).unwrap_or(SqlValue::Null),
        SqlValue::Null,
        SqlValue::Bool(false),
        SqlValue::Int(0),
        SqlValue::Int(7),
    ]
}

/// Install the test log subscriber (once per process)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
