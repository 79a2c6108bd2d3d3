use clap::Parser;
use ocrflow::{Application, Config, telemetry};

/// Resolves once the instance is asked to stop. The platform sends SIGTERM before
/// scaling an instance down; Ctrl+C covers local runs.
async fn stop_requested() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, finishing in-flight invocations"),
                    result = tokio::signal::ctrl_c() => interrupted(result).await,
                }
                return;
            }
            Err(e) => tracing::warn!("Cannot listen for SIGTERM, only Ctrl+C stops the server: {}", e),
        }
    }

    interrupted(tokio::signal::ctrl_c().await).await;
}

async fn interrupted(result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::info!("Interrupted, finishing in-flight invocations"),
        Err(e) => {
            // Without a signal handler the server runs until killed
            tracing::warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before building the Google API client
    ocrflow::install_crypto_provider();

    let args = ocrflow::config::Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!("{:?}", args);

    Application::new(config)?.serve(stop_requested()).await
}
