pub mod engine;
pub mod seed;
pub mod store;

pub use engine::LeaveEngine;
pub use store::LedgerStore;
