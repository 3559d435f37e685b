//! Eventspeak turns free-form sentences like "Lunch with John in
//! Cupertino on Thursday from 11-1:30pm" into structured calendar
//! fields: start/end date, start/end time, title, and location.

pub mod app;
pub mod calendar;
pub mod config;
pub mod numbers;
pub mod parser;
pub mod tagger;
pub mod token;

use env_logger::Env;

// Re-export commonly used types
pub use config::Config;
pub use parser::{parse, parse_now, ParsedEvent};

pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
