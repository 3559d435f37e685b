//! Interactive terminal front end.

use anyhow::Result;
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::calendar;
use crate::config::Config;
use crate::parser::{self, ParsedEvent};

pub struct Application {
    config: Config,
}

impl Application {
    pub fn new() -> Result<Self> {
        Ok(Self { config: Config::load()? })
    }

    /// Read sentences until EOF, parsing each into event fields.
    pub fn run(&self) -> Result<()> {
        info!("Starting Eventspeak terminal");

        let mut rl = DefaultEditor::new()?;
        println!("Welcome to Eventspeak! Describe an event, for example:");
        println!("  Lunch with John in Cupertino on Thursday from 11-1:30pm");

        loop {
            match rl.readline(">> ") {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "exit" || line == "quit" {
                        break;
                    }
                    self.handle_sentence(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Parse one sentence and print the result.
    pub fn handle_sentence(&self, line: &str) {
        let event = parser::parse_now(line);
        print_event(&event);
        if self.config.output.show_link {
            let minutes = self.config.event.default_duration_minutes.unwrap_or(30);
            match calendar::event_url(&event, minutes) {
                Ok(url) => println!("link:     {}", url),
                Err(err) => debug!("no calendar link: {}", err),
            }
        }
    }
}

fn show<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

pub fn print_event(event: &ParsedEvent) {
    println!("title:    {}", show(&event.title));
    println!("location: {}", show(&event.location));
    println!("start:    {} {}", show(&event.start_date), show(&event.start_time));
    println!("end:      {} {}", show(&event.end_date), show(&event.end_time));
}
