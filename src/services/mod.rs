//! Adapters and file handling used by the HTTP layer

pub mod removal;
pub mod retention;
pub mod store;
pub mod weather;

pub use removal::BackgroundRemover;
pub use retention::{spawn_sweeper, sweep_expired};
pub use store::{
    extension_of, is_valid_output_name, output_filename, sanitize_filename, FileStore,
    Reservation, StagedFiles, OUTPUT_PREFIX, OUTPUT_SUFFIX,
};
pub use weather::{OpenWeatherMapClient, WeatherError, WeatherProvider};
