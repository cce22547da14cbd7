mod boot;
mod cli;
mod logging;

use dovbo_common::DovboError;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), DovboError> {
    let args = cli::parse();

    let config = tracing::subscriber::with_default(
        logging::bootstrap(args.log_level.as_deref()),
        || dovbo_config::resolve_config(&args.profile, args.config.as_deref()),
    )?;
    if args.print_config {
        println!("{}", dovbo_config::config_to_json(&config));
        dovbo_config::validate(&config)?;
        return Ok(());
    }
    dovbo_config::validate(&config)?;

    logging::init(&config.logging, args.log_level.as_deref());
    tracing::info!(
        profile = %args.profile,
        "dovbobot v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    tracing::debug!(config = %dovbo_config::config_to_json(&config), "loaded config");

    let poller = boot::build(&config)?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("received Ctrl-C, shutting down");
        signal.cancel();
    });

    poller.run(shutdown).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
