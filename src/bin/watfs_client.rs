//! WatFS client: builds the per-mount context the VFS bridge drives.
//!
//! The bridge-facing callbacks live on [`watfs::vfs::MountOps`]; this
//! binary initialises the mount (connects, seeds the verifier) and parks
//! until it is told to unmount.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use watfs::client::Mount;
use watfs::config::ClientConfig;
use watfs::vfs::MountOps;

#[derive(Debug, Parser)]
#[command(name = "watfs_client", about = "Mount a WatFS server")]
struct Args {
    /// Where the filesystem will be mounted.
    mountpoint: PathBuf,

    /// Run the callback loop single-threaded (passed through to the
    /// VFS bridge).
    #[arg(short = 's')]
    single_threaded: bool,

    /// Enable debug logging.
    #[arg(short = 'd')]
    debug: bool,

    /// WatFS server address.
    #[arg(long)]
    server: Option<String>,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
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

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => match ClientConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "failed to load configuration");
                return ExitCode::from(1);
            }
        },
        None => ClientConfig::default(),
    };
    if let Some(server) = args.server {
        config.server = server;
    }

    let mount = match Mount::init(config.clone()).await {
        Ok(mount) => mount,
        Err(err) => {
            tracing::error!(server = %config.server, %err, "mount initialisation failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        mountpoint = %args.mountpoint.display(),
        server = %config.server,
        verf = mount.client().last_verifier().await,
        single_threaded = args.single_threaded,
        "WatFS mount context ready"
    );

    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to wait for interrupt");
        return ExitCode::FAILURE;
    }

    // one final commit so nothing buffered is lost on unmount
    mount.release("/").await;
    tracing::info!("unmounted");
    ExitCode::SUCCESS
}
