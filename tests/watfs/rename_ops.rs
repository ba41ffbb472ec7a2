use super::common::{Fixture, FILE_MODE};
use watfs::vfs::{MountOps, WatError};

#[tokio::test]
async fn rename_moves_across_directories() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mkdir("/a", 0o755).await.expect("mkdir /a");
    mount.mkdir("/b", 0o755).await.expect("mkdir /b");
    mount.mknod("/a/f", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/a/f", b"contents", 0).await.expect("write succeeds");

    mount.rename("/a/f", "/b/f").await.expect("rename succeeds");

    assert_eq!(mount.getattr("/a/f").await, Err(WatError::Os(libc::ENOENT)));
    assert_eq!(mount.getattr("/b/f").await.expect("getattr dest").size, 8);
    assert_eq!(mount.read("/b/f", 0, 8).await.expect("read dest"), b"contents");
}

#[tokio::test]
async fn rename_replaces_an_existing_destination() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/old", FILE_MODE, 0).await.expect("mknod old");
    mount.mknod("/new", FILE_MODE, 0).await.expect("mknod new");
    mount.write("/old", b"kept", 0).await.expect("write old");
    mount.write("/new", b"gone", 0).await.expect("write new");

    mount.rename("/old", "/new").await.expect("rename succeeds");
    assert_eq!(mount.read("/new", 0, 4).await.expect("read"), b"kept");
}

#[tokio::test]
async fn rename_of_a_missing_source_reports_enoent() {
    let fixture = Fixture::new().await;

    assert_eq!(
        fixture.mount.rename("/ghost", "/anywhere").await,
        Err(WatError::Os(libc::ENOENT))
    );
}
