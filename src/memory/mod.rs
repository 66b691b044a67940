pub mod prompt;
pub mod service;
pub mod types;

pub use service::{ChatResponse, Confirmation, MemoryService, ServiceError};
