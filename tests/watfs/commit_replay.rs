use super::common::{pattern, Fixture, FILE_MODE};
use watfs::vfs::MountOps;

#[tokio::test]
async fn verifier_is_stable_while_the_server_lives() {
    let fixture = Fixture::new().await;

    let first = fixture.mount.client().null(0).await.expect("first null");
    let second = fixture.mount.client().null(0).await.expect("second null");
    assert_eq!(first, second);
    assert_eq!(first, fixture.current_verf());
}

#[tokio::test]
async fn flush_is_cheap_when_the_verifier_held() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/f", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/f", b"steady", 0).await.expect("write succeeds");

    mount.flush("/f").await;

    assert_eq!(mount.client().cached_write_count().await, 0);
    assert_eq!(mount.client().last_verifier().await, fixture.current_verf());
}

#[tokio::test]
async fn flush_replays_buffered_writes_after_a_server_restart() {
    let mut fixture = Fixture::new().await;

    fixture.mount.mknod("/r", FILE_MODE, 0).await.expect("mknod succeeds");
    let payload = pattern(4096);
    assert_eq!(fixture.mount.write("/r", &payload, 0).await.expect("write succeeds"), 4096);

    fixture.restart_server().await;
    // wipe the backing file so only a real replay can restore it
    std::fs::write(fixture.host_path("/r"), b"").expect("wipe backing file");

    fixture.mount.flush("/r").await;

    assert_eq!(fixture.mount.client().cached_write_count().await, 0);
    assert_eq!(fixture.mount.client().last_verifier().await, fixture.current_verf());
    assert_eq!(fixture.mount.read("/r", 0, 4096).await.expect("read back"), payload);
}

#[tokio::test]
async fn release_also_triggers_the_commit_path() {
    let mut fixture = Fixture::new().await;

    fixture.mount.mknod("/rel", FILE_MODE, 0).await.expect("mknod succeeds");
    fixture.mount.write("/rel", b"held back", 0).await.expect("write succeeds");

    fixture.restart_server().await;
    std::fs::write(fixture.host_path("/rel"), b"").expect("wipe backing file");

    fixture.mount.release("/rel").await;

    assert_eq!(fixture.mount.read("/rel", 0, 9).await.expect("read back"), b"held back");
}

#[tokio::test]
async fn flush_absorbs_an_unreachable_server() {
    let mut fixture = Fixture::new().await;

    fixture.mount.mknod("/f", FILE_MODE, 0).await.expect("mknod succeeds");
    fixture.mount.write("/f", b"pending", 0).await.expect("write succeeds");

    fixture.stop_server().await;

    // must not panic or surface an error; the cache stays for a later commit
    fixture.mount.flush("/f").await;
    assert_eq!(fixture.mount.client().cached_write_count().await, 1);

    fixture.restart_server().await;
    fixture.mount.flush("/f").await;
    assert_eq!(fixture.mount.client().cached_write_count().await, 0);
}

#[tokio::test]
async fn writes_issued_between_commits_accumulate_in_order() {
    let mut fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mknod("/log", FILE_MODE, 0).await.expect("mknod succeeds");
    mount.write("/log", b"aaaa", 0).await.expect("first write");
    mount.write("/log", b"bb", 1).await.expect("second write");
    assert_eq!(mount.client().cached_write_count().await, 2);

    fixture.restart_server().await;
    std::fs::write(fixture.host_path("/log"), b"").expect("wipe backing file");

    fixture.mount.flush("/log").await;

    // replay preserves submission order: "aaaa" then "bb" at offset 1
    assert_eq!(fixture.mount.read("/log", 0, 4).await.expect("read back"), b"abba");
}
