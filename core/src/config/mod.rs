mod load;
mod types;

pub use load::{apply_overrides, data_dir, load, load_default, load_from};
pub use types::{AppConfig, HealthConfig, HttpConfig, LoggingConfig, StoreConfig};
