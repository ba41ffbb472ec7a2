use super::common::{Fixture, FILE_MODE};
use watfs::export::metadata_to_attr;
use watfs::vfs::{FileTime, MountOps, WatError};

#[tokio::test]
async fn getattr_matches_a_direct_host_stat() {
    let fixture = Fixture::new().await;

    std::fs::write(fixture.host_path("/probe"), b"attribute probe").expect("write fixture");

    let attr = fixture.mount.getattr("/probe").await.expect("getattr succeeds");
    let meta = std::fs::symlink_metadata(fixture.host_path("/probe")).expect("stat host file");

    assert_eq!(attr, metadata_to_attr(&meta));
}

#[tokio::test]
async fn utimens_round_trips_exact_times() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/t", FILE_MODE, 0).await.expect("mknod succeeds");

    let atime = FileTime { seconds: 1_700_000_000, nanos: 0 };
    let mtime = FileTime { seconds: 1_700_000_001, nanos: 0 };
    mount.utimens("/t", atime, mtime).await.expect("utimens succeeds");

    let attr = mount.getattr("/t").await.expect("getattr succeeds");
    assert_eq!(attr.atime, atime);
    assert_eq!(attr.mtime, mtime);
}

#[tokio::test]
async fn truncate_shrinks_and_extends() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/t", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/t", b"0123456789", 0).await.expect("write succeeds");

    mount.truncate("/t", 4).await.expect("shrink succeeds");
    assert_eq!(mount.getattr("/t").await.expect("getattr").size, 4);
    assert_eq!(mount.read("/t", 0, 10).await.expect("read"), b"0123");

    mount.truncate("/t", 8).await.expect("extend succeeds");
    assert_eq!(mount.getattr("/t").await.expect("getattr").size, 8);
    assert_eq!(mount.read("/t", 0, 10).await.expect("read"), b"0123\0\0\0\0");
}

#[tokio::test]
async fn errnos_pass_through_unchanged() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    assert_eq!(mount.getattr("/nope").await, Err(WatError::Os(libc::ENOENT)));
    assert_eq!(mount.open("/nope").await, Err(WatError::Os(libc::ENOENT)));

    mount.mknod("/file", FILE_MODE, 0).await.expect("mknod succeeds");
    assert_eq!(mount.getattr("/file/below").await, Err(WatError::Os(libc::ENOTDIR)));
    assert_eq!(mount.unlink("/dir-missing/f").await, Err(WatError::Os(libc::ENOENT)));

    mount.mkdir("/dir", 0o755).await.expect("mkdir succeeds");
    assert_eq!(mount.unlink("/dir").await, Err(WatError::Os(libc::EISDIR)));
}

#[tokio::test]
async fn paths_escaping_the_root_are_rejected() {
    let fixture = Fixture::new().await;

    assert_eq!(fixture.mount.getattr("/../etc/passwd").await, Err(WatError::Os(libc::EACCES)));
    assert_eq!(fixture.mount.unlink("/a/../../b").await, Err(WatError::Os(libc::EACCES)));
}

#[tokio::test]
async fn open_and_opendir_surface_existing_objects() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mkdir("/d", 0o755).await.expect("mkdir succeeds");
    mount.mknod("/d/f", FILE_MODE, 0).await.expect("mknod succeeds");

    mount.opendir("/d").await.expect("opendir succeeds");
    mount.open("/d/f").await.expect("open succeeds");
}
