use clap::Parser;
use std::path::PathBuf;

use courier::config::Config;
use courier::server;

#[derive(Debug, Parser)]
#[command(name = "courier", about = "Minimal HTTP/1.1 server")]
struct Args {
    /// Directory to serve files from
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:4221
    #[arg(long)]
    listen: Option<String>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log each request at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(directory) = args.directory {
        cfg.files.directory = directory;
    }
    if let Some(listen) = args.listen {
        cfg.server.listen_addr = listen;
    }

    tokio::select! {
        res = server::listener::run(&cfg) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
