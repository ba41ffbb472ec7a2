use super::common::{pattern, Fixture, FILE_MODE};
use watfs::vfs::{FileType, MountOps, WatError};
use watfs::wire::MSG;

#[tokio::test]
async fn create_write_read_unlink() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/a", FILE_MODE, 0).await.expect("mknod succeeds");
    assert_eq!(mount.getattr("/a").await.expect("getattr after create").size, 0);

    assert_eq!(mount.write("/a", b"hello", 0).await.expect("write succeeds"), 5);
    assert_eq!(mount.getattr("/a").await.expect("getattr after write").size, 5);
    assert_eq!(mount.read("/a", 0, 5).await.expect("read succeeds"), b"hello");

    mount.unlink("/a").await.expect("unlink succeeds");
    assert_eq!(mount.getattr("/a").await, Err(WatError::Os(libc::ENOENT)));
}

#[tokio::test]
async fn large_write_spans_multiple_chunks() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    let payload = pattern(20000);
    assert!(payload.len() > 2 * MSG);

    mount.mknod("/big", FILE_MODE, 0).await.expect("mknod succeeds");
    assert_eq!(mount.write("/big", &payload, 0).await.expect("write succeeds"), 20000);

    let on_disk = std::fs::read(fixture.host_path("/big")).expect("read backing file");
    assert_eq!(on_disk.len(), 20000);
    assert_eq!(on_disk, payload);

    assert_eq!(mount.read("/big", 0, 20000).await.expect("read back"), payload);
}

#[tokio::test]
async fn overwrite_at_offset() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/f", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/f", b"abcdef", 0).await.expect("first write");
    mount.write("/f", b"XY", 2).await.expect("second write");

    assert_eq!(mount.read("/f", 0, 6).await.expect("read"), b"abXYef");
}

#[tokio::test]
async fn read_past_eof_is_short() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/short", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/short", b"12345", 0).await.expect("write");

    assert_eq!(mount.read("/short", 0, 100).await.expect("read"), b"12345");
    assert_eq!(mount.read("/short", 3, 100).await.expect("offset read"), b"45");
    assert!(mount.read("/short", 5, 100).await.expect("read at eof").is_empty());
}

#[tokio::test]
async fn mknod_with_fifo_mode_creates_a_fifo() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/queue", libc::S_IFIFO as u32 | 0o644, 0).await.expect("mkfifo succeeds");
    assert_eq!(mount.getattr("/queue").await.expect("getattr").file_type, FileType::Fifo);
}

#[tokio::test]
async fn write_to_missing_file_reports_enoent() {
    let fixture = Fixture::new().await;

    // the server opens without O_CREAT; only mknod creates files
    assert_eq!(
        fixture.mount.write("/missing", b"data", 0).await,
        Err(WatError::Os(libc::ENOENT))
    );
}

#[tokio::test]
async fn flush_clears_the_write_cache() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/c", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/c", b"payload", 0).await.expect("write");
    assert_eq!(mount.client().cached_write_count().await, 1);

    mount.flush("/c").await;
    assert_eq!(mount.client().cached_write_count().await, 0);
}
