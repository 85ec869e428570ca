//! clusterperf binary: run a drive, object or disk-metrics test and show
//! the streamed results on the dashboard or as one JSON document.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use clusterperf::bench::RunCoordinator;
use clusterperf::cli::Cli;
use clusterperf::config::Settings;
use clusterperf::{client, error, logging, PerfError};

fn fail(err: &PerfError) -> ExitCode {
    eprintln!("{}", error::user_friendly_message(err));
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => return fail(&e),
    };

    if let Err(e) = logging::init(cli.output_mode(&settings), cli.verbose) {
        eprintln!("{}", e);
    }

    let request = match cli.into_request(&settings) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "invalid request");
            return fail(&e);
        }
    };

    let cluster = match client::connect(&request.target, &settings) {
        Ok(cluster) => Arc::new(cluster),
        Err(e) => return fail(&e),
    };

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping run");
            on_signal.cancel();
        }
    });

    let coordinator = RunCoordinator::new(cluster).with_shutdown(shutdown);
    match coordinator.run(&request).await {
        Ok(report) => {
            tracing::info!(
                accepted = report.accepted,
                failed = report.error.is_some(),
                "run finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) if error::is_display_fatal(&e) => {
            tracing::error!(error = %e, "display failed");
            fail(&e)
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            if error::exit_code(&e) == 0 {
                ExitCode::SUCCESS
            } else {
                fail(&e)
            }
        }
    }
}
