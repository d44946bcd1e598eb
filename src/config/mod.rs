pub mod settings;

pub use settings::{DatabaseConfig, DatabaseTarget, Settings};
