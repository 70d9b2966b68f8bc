//! deskprov CLI entry point.

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use clap::Parser;
use deskprov::cli::{Cli, CommandDispatcher, CommandResult};
use deskprov::ui::{NonInteractiveUI, OutputMode, UserInterface};
use deskprov::workflow::{ExecutionSummary, ExitStatus};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr; stdout is reserved for the running log and the
/// final line.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("deskprov=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deskprov=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn failed(entry: String) -> CommandResult {
    let mut summary = ExecutionSummary::new();
    summary.fail(ExitStatus::Failure, entry);
    CommandResult::from_summary(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("deskprov starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = NonInteractiveUI::new(output_mode);
    let dispatcher = CommandDispatcher::new(cli.config.clone());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(&cli, &mut ui)));
    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            ui.error(&format!("Error: {}", e));
            failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!("Internal error: {}", message);
            failed(format!("internal error: {}", message))
        }
    };

    if let Some(summary) = &result.summary {
        println!("{}", summary.final_line());
    }
    ExitCode::from(result.exit_code)
}
