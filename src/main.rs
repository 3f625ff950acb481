use clap::Parser; // for cli
use deep_novelist::config::{Args, Command};
use deep_novelist::models::GenerationJob;
use deep_novelist::sink::NovelSink;
use deep_novelist::state::AppState;
use deep_novelist::{check, router, worker};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// this is main async function with tokio
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,deep_novelist=debug")),
        )
        .init();

    // parse cli arguments
    let args = Args::parse();

    let result = match &args.command {
        Some(Command::Check { ip, model, prompt }) => {
            check::run_check(ip.as_deref(), model.as_deref(), prompt).await
        }
        None => serve(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, kind = e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: Args) -> deep_novelist::error::Result<()> {
    let (job_tx, job_rx) = mpsc::channel::<GenerationJob>(100);

    // creating shared state
    let state = Arc::new(AppState::new(
        Some(args.ollama_host.clone()),
        NovelSink::new(&args.output),
        Duration::from_secs(args.cache_ttl),
        job_tx,
    ));

    // spawn the background worker
    tokio::spawn(worker::generation_worker(job_rx, state.clone()));

    let app = router(state.clone());

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Deep Novelist running on http://{}", addr);
    info!(
        "Default Ollama server: {}",
        deep_novelist::ollama::server_url(Some(&args.ollama_host))
    );
    info!("Output file: {}", state.sink.path().display());
    info!("Model cache TTL: {} seconds", args.cache_ttl);

    axum::serve(listener, app).await?;
    Ok(())
}
