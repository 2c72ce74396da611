pub mod conversation;
pub mod employee;
pub mod leave_request;
