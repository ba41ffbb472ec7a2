//! WatFS server: exports a local directory tree over the WatFS protocol.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use watfs::config::ServerConfig;
use watfs::export::Export;

#[derive(Debug, Parser)]
#[command(name = "watfs_server", about = "Serve a directory tree to WatFS clients")]
struct Args {
    /// Directory to export.
    rootdir: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:50051.
    addr: Option<String>,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accepted and ignored, reserved for future options.
    #[arg(short = 'a', hide = true)]
    _opt_a: bool,
    #[arg(short = 'b', hide = true)]
    _opt_b: bool,
    #[arg(short = 'c', hide = true)]
    _opt_c: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match &args.config {
        Some(path) => match ServerConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "failed to load configuration");
                return ExitCode::from(1);
            }
        },
        None => ServerConfig::default(),
    };

    let Some(root) = args.rootdir.or(config.root) else {
        eprintln!("usage: watfs_server <rootdir> <addr:port>");
        return ExitCode::from(1);
    };
    let listen = args.addr.unwrap_or(config.listen);

    let export = match Export::new(root) {
        Ok(export) => export,
        Err(err) => {
            tracing::error!(%err, "cannot open export root");
            return ExitCode::from(1);
        }
    };

    let listener = match TcpListener::bind(&listen).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%listen, %err, "cannot bind listen address");
            return ExitCode::from(1);
        }
    };

    tracing::info!(
        %listen,
        root = %export.root_path().display(),
        verf = export.verifier(),
        "WatFS server listening"
    );

    if let Err(err) = watfs::serve(listener, Arc::new(export)).await {
        tracing::error!(%err, "server terminated");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
