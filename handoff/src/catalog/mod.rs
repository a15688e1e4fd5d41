//! Product creation on top of the runners and the transactional coordinator.

pub mod request;
pub mod response;
pub mod service;
pub mod types;
