//! Runner settings

use clap::{Args, Parser, Subcommand};
use resizer_invoker::InvokerConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "resizer")]
#[command(about = "Serverless adapter for the external image resizer", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the Lambda runtime loop (default)
    Serve,
    /// Resize a single key and print the base64 result to stdout
    Invoke(InvokeArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InvokeArgs {
    /// Object key to resize
    #[arg(long)]
    pub key: String,

    #[arg(long)]
    pub max_width: Option<u32>,

    #[arg(long)]
    pub max_height: Option<u32>,

    /// Output format (jpeg or png)
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path to the resizer executable
    #[arg(long, global = true, default_value = resizer_invoker::invoker::DEFAULT_BINARY, env = "RESIZER_BINARY")]
    pub binary: PathBuf,

    /// Seconds the resizer may run before it is killed
    #[arg(long, global = true, default_value = "30", env = "RESIZER_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Largest output accepted from the resizer, in bytes
    #[arg(long, global = true, default_value = "33554432", env = "RESIZER_MAX_OUTPUT_BYTES")]
    pub max_output_bytes: usize,

    /// Pass --verbose to the resizer
    #[arg(long, global = true, env = "RESIZER_VERBOSE")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RESIZER_LOG_LEVEL")]
    pub log_level: String,
}

impl Settings {
    pub fn invoker_config(&self) -> InvokerConfig {
        InvokerConfig {
            binary: self.binary.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_output_bytes: self.max_output_bytes,
            verbose: self.verbose,
        }
    }

    /// Default tracing filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> String {
        format!("resizer={0},resizer_invoker={0}", self.log_level)
    }
}
