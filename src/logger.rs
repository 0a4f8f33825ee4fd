//! Level-gated logging with a configurable line template.
//!
//! The template comes from `LOG_FORMAT` and supports `{time}`, `{name}`,
//! `{level}` and `{message}` placeholders. Error and critical lines go to
//! stderr, everything else to stdout.

use std::net::SocketAddr;

use chrono::Local;

use crate::config::{LogLevel, Settings};

#[derive(Debug, Clone)]
pub struct AppLogger {
    level: LogLevel,
    format: String,
    name: String,
}

impl AppLogger {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            level: settings.log_level,
            format: settings.log_format.clone(),
            name: settings.app_name.clone(),
        }
    }

    pub fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }

    fn should_emit(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if !self.should_emit(level) {
            return;
        }
        let line = self.render(level, message);
        if level >= LogLevel::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn render(&self, level: LogLevel, message: &str) -> String {
        self.format
            .replace("{time}", &Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .replace("{name}", &self.name)
            .replace("{level}", level.as_str())
            .replace("{message}", message)
    }
}

pub fn log_server_start(settings: &Settings, addr: &SocketAddr) {
    println!("======================================");
    println!("{} v{}", settings.app_name, settings.app_version);
    println!("Profile: {}", settings.env.as_str());
    println!("Listening on: http://{addr}");
    println!("Debug mode: {}", settings.debug);
    println!("======================================\n");
}
