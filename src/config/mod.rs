//! Configuration module for driftnet
//!
//! Handles loading, parsing, and validating TOML configuration files. Every
//! section is optional; `Config::default()` yields a working engine, so a
//! config file only needs to name the knobs it changes.
//!
//! # Example
//!
//! ```no_run
//! use driftnet::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("driftnet.toml")).unwrap();
//! println!("stealth probability: {}", config.fetch.stealth_probability);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    BypassConfig, Config, FetchConfig, DEFAULT_ARCHIVE_MIRRORS, DEFAULT_FALLBACK_PROXIES,
    DEFAULT_PAYWALL_INDICATORS, DEFAULT_USER_AGENTS,
};
pub use validation::validate;
