//! orgdesk binary entry point.

use std::process::ExitCode;

use orgdesk::cli::{self, Cli};
use orgdesk::ui::output;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `orgdesk=debug`.
const LOG_ENV: &str = "ORGDESK_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr. `--debug` raises the default from `warn` to `debug`;
/// `ORGDESK_LOG` wins over both.
fn init_tracing(debug: bool) {
    let default = if debug { "orgdesk=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
