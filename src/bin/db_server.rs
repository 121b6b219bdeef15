use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ringdb::{
    server::Server,
    telemetry::{self, initialize_subscriber, TracingOutput},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Tracing {
    Stdout,
    Json,
    Otlp,
}

#[derive(Debug, Parser)]
#[command(name = "ringdb-server")]
#[command(about = "ringdb-server tcp server", long_about = None)]
struct Cli {
    #[arg(long)]
    config_path: PathBuf,
    #[arg(short, long, value_enum, default_value = "stdout")]
    tracing: Tracing,
    /// collector endpoint used with `--tracing otlp`
    #[arg(long, default_value = "http://localhost:4317")]
    otlp_endpoint: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let output = match args.tracing {
        Tracing::Stdout => TracingOutput::Stdout,
        Tracing::Json => TracingOutput::Json,
        Tracing::Otlp => TracingOutput::Otlp(args.otlp_endpoint),
    };
    initialize_subscriber(output)?;

    let mut server = Server::from_config(args.config_path).await?;
    server.run(tokio::signal::ctrl_c()).await?;

    telemetry::shutdown();
    Ok(())
}
