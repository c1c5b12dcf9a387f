mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, ExtractionSettings, LoggingSettings, SessionSettings, Settings,
};
