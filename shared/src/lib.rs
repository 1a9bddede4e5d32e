//! Shared types and domain logic for the CropGuard farm monitoring platform
//!
//! This crate contains the models shared between the backend and the browser
//! (via WASM), together with the pure parts of the system: the advisory
//! engine, detection classification, market trend aggregation and the scan
//! state machine.

pub mod advisory;
pub mod detection;
pub mod market;
pub mod models;
pub mod scan;
pub mod types;
pub mod validation;

pub use advisory::*;
pub use detection::*;
pub use market::*;
pub use models::*;
pub use scan::*;
pub use types::*;
pub use validation::*;
