//! Domain models for the CropGuard platform

mod advisory;
mod alert;
mod farm;
mod market;
mod pest;
mod sensor;
mod weather;

pub use advisory::*;
pub use alert::*;
pub use farm::*;
pub use market::*;
pub use pest::*;
pub use sensor::*;
pub use weather::*;
