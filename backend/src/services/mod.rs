//! Business logic services for the CropGuard platform

pub mod advisory;
pub mod alert;
pub mod auth;
pub mod farm;
pub mod market;
pub mod report;
pub mod scan;
pub mod sensor;
pub mod weather;

pub use advisory::AdvisoryService;
pub use alert::AlertService;
pub use auth::AuthService;
pub use farm::FarmService;
pub use market::MarketService;
pub use report::ReportService;
pub use scan::{PgScanRepository, ScanPipeline, UploadedFile};
pub use sensor::SensorService;
pub use weather::WeatherService;
