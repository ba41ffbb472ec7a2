use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinHandle;

use watfs::client::Mount;
use watfs::config::ClientConfig;
use watfs::export::Export;

/// Mode bits for a plain file created through mknod.
pub const FILE_MODE: u32 = libc::S_IFREG as u32 | 0o644;

pub struct Fixture {
    pub tempdir: TempDir,
    pub addr: String,
    pub mount: Mount,
    server: JoinHandle<io::Result<()>>,
    verf: u64,
}

impl Fixture {
    pub async fn new() -> Self {
        let tempdir = tempfile::tempdir().expect("create temp dir");
        let listener = bind("127.0.0.1:0").await;
        let addr = listener.local_addr().expect("local addr").to_string();

        let verf = 0x7761_7466;
        let export =
            Export::with_verifier(tempdir.path().to_path_buf(), verf).expect("open export");
        let server = tokio::spawn(watfs::serve(listener, Arc::new(export)));

        let mount = Mount::init(config(&addr)).await.expect("mount init");
        Self { tempdir, addr, mount, server, verf }
    }

    /// Simulates a server crash and restart on the same address: the new
    /// instance serves the same directory under a fresh verifier.
    pub async fn restart_server(&mut self) {
        self.stop_server().await;
        let listener = bind(&self.addr).await;
        self.verf += 1;
        let export = Export::with_verifier(self.tempdir.path().to_path_buf(), self.verf)
            .expect("reopen export");
        self.server = tokio::spawn(watfs::serve(listener, Arc::new(export)));
    }

    pub async fn stop_server(&mut self) {
        self.server.abort();
        let _ = (&mut self.server).await;
    }

    pub fn current_verf(&self) -> u64 {
        self.verf
    }

    /// Host path of a client path, for direct assertions on the backing
    /// directory.
    pub fn host_path(&self, path: &str) -> PathBuf {
        self.tempdir.path().join(path.trim_start_matches('/'))
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn config(addr: &str) -> ClientConfig {
    ClientConfig {
        server: addr.to_owned(),
        deadline_secs: 5,
        retry_limit: 5,
        backoff_start_ms: 10,
        backoff_cap_ms: 50,
    }
}

async fn bind(addr: &str) -> TcpListener {
    let socket = TcpSocket::new_v4().expect("create socket");
    socket.set_reuseaddr(true).expect("set reuseaddr");
    socket.bind(addr.parse().expect("parse addr")).expect("bind");
    socket.listen(64).expect("listen")
}

/// A deterministic byte pattern: byte N is `N mod 256`.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}
