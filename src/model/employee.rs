use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::leave_request::{LeaveRecord, LeaveType};

/// An employee as held by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: String,
    pub name: String,
    pub email: String,

    /// Plain credential, compared by equality.
    #[serde(skip_serializing)]
    pub secret: String,

    /// Only balance-bearing types have an entry.
    pub balances: BTreeMap<LeaveType, u32>,

    /// Submission order.
    pub history: Vec<LeaveRecord>,
}

impl EmployeeRecord {
    pub fn new(id: &str, name: &str, email: &str, secret: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            secret: secret.to_string(),
            balances: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn with_balance(mut self, leave_type: LeaveType, days: u32) -> Self {
        if leave_type.is_balance_bearing() {
            self.balances.insert(leave_type, days);
        }
        self
    }

    pub fn with_record(mut self, record: LeaveRecord) -> Self {
        self.history.push(record);
        self
    }

    /// Next request id in this employee's sequence.
    pub fn next_request_id(&self) -> String {
        format!("REQ{}", self.history.len() + 1)
    }
}
