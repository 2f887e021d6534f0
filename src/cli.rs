//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigOverrides, LogFormat};

/// Serves the greeting page and reports whether Redis is reachable.
#[derive(Debug, Parser)]
#[command(name = "greeter", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, env = "GREETER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server listen address [default: 0.0.0.0:5000]
    #[arg(long, env = "GREETER_BINDING")]
    pub binding: Option<String>,

    /// Redis address, not required to be reachable [default: redis:6379]
    #[arg(long, env = "GREETER_REDIS")]
    pub redis: Option<String>,

    /// Directory with index.html, style.css and background.jpg [default: ./static]
    #[arg(long, env = "GREETER_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Log output format: pretty or json.
    #[arg(long, env = "GREETER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.binding.clone(),
            cache_address: self.redis.clone(),
            static_dir: self.static_dir.clone(),
            log_format: self.log_format,
        }
    }
}
