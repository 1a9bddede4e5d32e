//! HTTP handlers

pub mod advisory;
pub mod alert;
pub mod auth;
pub mod farm;
pub mod health;
pub mod market;
pub mod report;
pub mod scan;
pub mod sensor;
pub mod weather;

pub use advisory::*;
pub use alert::*;
pub use auth::*;
pub use farm::*;
pub use health::*;
pub use market::*;
pub use report::*;
pub use scan::*;
pub use sensor::*;
pub use weather::*;
