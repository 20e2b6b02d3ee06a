//! Core business logic for pictogram.

pub mod services;

pub use services::*;
