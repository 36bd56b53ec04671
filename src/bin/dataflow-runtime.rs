//! Standalone runner: resolve a pipeline by name from the registry and run
//! it until `SIGINT`/`SIGTERM`.
//!
//! Parses a source, a sink and an operator list off the command line,
//! installs a signal handler that raises the shared stop flag, and runs the
//! resulting [`dataflow_rt::daemon::ControllerDaemon`] to completion.

use std::process::ExitCode;

use clap::Parser;

use dataflow_rt::daemon::ControllerDaemon;
use dataflow_rt::registry;
use dataflow_rt::StopSignal;

#[derive(Parser)]
#[command(name = "dataflow-runtime", about = "Run a registered pipeline to completion")]
struct Cli {
    /// Name of a registered source.
    #[arg(long)]
    source: String,

    /// Name of a registered sink.
    #[arg(long)]
    sink: String,

    /// Names of registered operators, applied in the given order. Unknown
    /// names are dropped with a warning rather than failing the run.
    #[arg(long, value_delimiter = ',')]
    operators: Vec<String>,

    /// Log level (`error`, `warn`, `info`, `debug`, `trace`). Falls back to
    /// `DATAFLOW_RT_LOGGING_LEVEL`, then `info`.
    #[arg(long)]
    logging: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .logging
        .or_else(|| std::env::var("DATAFLOW_RT_LOGGING_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::new().parse_filters(&level).init();

    registry::init_defaults();

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || stop.set()) {
            log::warn!("failed to install signal handler: {e}");
        }
    }

    let daemon = ControllerDaemon::new(cli.source, cli.sink, cli.operators);
    match daemon.run(&stop) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
