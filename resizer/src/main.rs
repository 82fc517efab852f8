//! Resizer - serverless adapter for the external image resizer
//!
//! Receives resize events, runs the resizer executable and returns the
//! resulting image base64-encoded.

mod config;
mod lambda;

use clap::Parser;
use config::{Cli, Command, InvokeArgs};
use resizer_invoker::{handle, DelegateEnv, Invoker, ResizeError, ResizeEvent};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the image in invoke mode
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.settings.log_filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let invoker = Invoker::new(cli.settings.invoker_config());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => lambda::serve(invoker)
            .await
            .map_err(|e| anyhow::anyhow!(e)),
        Command::Invoke(args) => invoke_once(args, &invoker).await,
    }
}

async fn invoke_once(args: InvokeArgs, invoker: &Invoker) -> anyhow::Result<()> {
    let event = ResizeEvent {
        key: args.key,
        max_width: args.max_width,
        max_height: args.max_height,
        format: args.format,
    };
    let env = DelegateEnv::from_process_env()?;

    match handle(event, &env, invoker).await {
        Ok(encoded) => {
            println!("{encoded}");
            Ok(())
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "Resize failed");
            std::process::exit(exit_code_for(&e))
        }
    }
}

/// Process exit code for a failed one-shot resize.
///
/// Mirrors the resizer's own code when it has one.
fn exit_code_for(err: &ResizeError) -> i32 {
    err.exit_code().unwrap_or(1)
}
