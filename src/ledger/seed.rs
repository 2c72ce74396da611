use chrono::NaiveDate;

use crate::ledger::engine::NO_REASON;
use crate::model::employee::EmployeeRecord;
use crate::model::leave_request::{LeaveRecord, LeaveStatus, LeaveType};

/// Demo employees loaded by the binary and most tests.
pub fn demo_employees() -> Vec<EmployeeRecord> {
    let alice = EmployeeRecord::new("E001", "Alice Smith", "alice@company.com", "pass123")
        .with_balance(LeaveType::Annual, 14)
        .with_balance(LeaveType::Sick, 7)
        .with_balance(LeaveType::Personal, 3);
    let first = LeaveRecord {
        request_id: alice.next_request_id(),
        leave_type: LeaveType::Annual,
        start_date: date(2025, 2, 10),
        end_date: date(2025, 2, 14),
        days: 5,
        reason: NO_REASON.to_string(),
        status: LeaveStatus::Approved,
        charged: true,
    };
    let alice = alice.with_record(first);

    let bob = EmployeeRecord::new("E002", "Bob Johnson", "bob@company.com", "pass456")
        .with_balance(LeaveType::Annual, 20)
        .with_balance(LeaveType::Sick, 10)
        .with_balance(LeaveType::Personal, 3);

    vec![alice, bob]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
