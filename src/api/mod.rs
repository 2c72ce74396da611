pub mod chat;
pub mod leave_request;
