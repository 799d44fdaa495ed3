//! # Web API Request Handlers
//!
//! Handlers only translate between HTTP and the core types; no fetch or
//! breaker logic lives here.

pub mod anime;
pub mod circuit;
pub mod health;
