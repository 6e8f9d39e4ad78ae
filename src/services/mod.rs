//! Business logic services layer

pub mod session_service;

pub use session_service::SessionService;
