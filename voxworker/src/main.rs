#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::process::ExitCode;

use args::Args;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tts::Job;
use voxworker_config::Config;
use voxworker_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = load_config(&args)?;

    let _telemetry_guard = voxworker_telemetry::init(config.telemetry.as_ref(), &args.log_level)?;

    if let Some(raw) = &args.test_input {
        return run_once(&config, raw).await;
    }

    tracing::info!(
        config_path = %args.config.display(),
        model_url = %config.model.base_url,
        "starting voxworker"
    );

    let server = Server::new(&config)?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("voxworker stopped");
    Ok(ExitCode::SUCCESS)
}

/// Load the config file and apply command line overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(&args.config)?;

    if let Some(listen) = args.listen {
        config.server.listen_address = listen;
    }

    if let Some(model_url) = &args.model_url {
        config.model.base_url = model_url.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run a single job through the pipeline and print its outcome as JSON
async fn run_once(config: &Config, raw: &str) -> anyhow::Result<ExitCode> {
    let job: Job = serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("invalid --test-input job: {e}"))?;
    let handler = tts::build_handler(config)?;

    tracing::info!(job_id = job.id.as_deref().unwrap_or("-"), "running single job");

    let (output, code) = match handler.handle(&job.input).await {
        Ok(response) => (serde_json::to_string_pretty(&response)?, ExitCode::SUCCESS),
        Err(e) => (serde_json::to_string_pretty(&e.to_body())?, ExitCode::FAILURE),
    };

    println!("{output}");
    Ok(code)
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
