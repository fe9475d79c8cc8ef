//! Core business logic for snapfeed.

pub mod services;

pub use services::*;
