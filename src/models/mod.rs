//! Data models for the lending server

pub mod equipment;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use equipment::{Equipment, InventoryEntry};
pub use request::{BorrowRequest, RequestDetails, RequestStatus, ReturnItem};
pub use user::{User, UserClaims, UserShort};
