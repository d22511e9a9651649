use std::process::ExitCode;

use clap::Parser;
use coinclock_server::logging::init_logging;
use coinclock_server::{run, Cli, ServerError};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "coinclock exited with an error");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn serve() -> Result<(), ServerError> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let listener = TcpListener::bind(cli.listen).await?;
    run(&cli, listener, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to listen for ctrl-c; shutting down");
    }
}
