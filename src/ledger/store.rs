use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::LeaveError;
use crate::model::employee::EmployeeRecord;

/// In-memory employee ledger.
///
/// The set of employees is fixed at construction, so the outer map is never
/// written after `new` and needs no lock. Each record sits behind its own
/// mutex: a mutation of one employee holds that employee's lock for the
/// whole read-compare-write-append sequence and never blocks another
/// employee.
pub struct LedgerStore {
    records: HashMap<String, Mutex<EmployeeRecord>>,
}

impl LedgerStore {
    pub fn new(records: impl IntoIterator<Item = EmployeeRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| (r.id.clone(), Mutex::new(r)))
            .collect();
        Self { records }
    }

    fn guard(&self, employee_id: &str) -> Result<MutexGuard<'_, EmployeeRecord>, LeaveError> {
        let slot = self
            .records
            .get(employee_id)
            .ok_or_else(|| LeaveError::EmployeeNotFound(employee_id.to_string()))?;
        // mutations validate before they write, so a poisoned record is whole
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn contains(&self, employee_id: &str) -> bool {
        self.records.contains_key(employee_id)
    }

    /// Snapshot of one record.
    pub fn lookup(&self, employee_id: &str) -> Result<EmployeeRecord, LeaveError> {
        self.guard(employee_id).map(|r| r.clone())
    }

    /// `false` for unknown ids as well as wrong secrets.
    pub fn credentials_valid(&self, employee_id: &str, secret: &str) -> bool {
        self.guard(employee_id)
            .map(|r| r.secret == secret)
            .unwrap_or(false)
    }

    pub fn record_name(&self, employee_id: &str) -> Option<String> {
        self.guard(employee_id).ok().map(|r| r.name.clone())
    }

    /// Runs `f` with shared access to one record while holding its lock.
    pub fn with_record<R>(
        &self,
        employee_id: &str,
        f: impl FnOnce(&EmployeeRecord) -> R,
    ) -> Result<R, LeaveError> {
        let record = self.guard(employee_id)?;
        Ok(f(&record))
    }

    /// Exclusive section for one employee. Only the transaction engine
    /// mutates records.
    pub(crate) fn with_record_mut<R>(
        &self,
        employee_id: &str,
        f: impl FnOnce(&mut EmployeeRecord) -> R,
    ) -> Result<R, LeaveError> {
        let mut record = self.guard(employee_id)?;
        Ok(f(&mut record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::seed::demo_employees;

    #[test]
    fn credentials_are_checked_by_equality() {
        let store = LedgerStore::new(demo_employees());
        assert!(store.credentials_valid("E001", "pass123"));
        assert!(!store.credentials_valid("E001", "pass456"));
        assert!(!store.credentials_valid("E404", "pass123"));
    }

    #[test]
    fn lookup_and_name_of_unknown_employee() {
        let store = LedgerStore::new(demo_employees());
        assert_eq!(store.record_name("E002").as_deref(), Some("Bob Johnson"));
        assert_eq!(store.record_name("nobody"), None);
        assert!(matches!(
            store.lookup("nobody"),
            Err(LeaveError::EmployeeNotFound(id)) if id == "nobody"
        ));
    }

    #[test]
    fn lookup_returns_a_snapshot() {
        let store = LedgerStore::new(demo_employees());
        let mut snapshot = store.lookup("E001").unwrap();
        snapshot.history.clear();
        assert_eq!(store.lookup("E001").unwrap().history.len(), 1);
    }
}
