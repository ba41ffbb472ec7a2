use std::collections::BTreeMap;
use std::os::unix::fs::MetadataExt;

use super::common::{Fixture, FILE_MODE};
use watfs::vfs::{FileType, MountOps, WatError};

#[tokio::test]
async fn listing_includes_dot_entries_with_correct_attributes() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mkdir("/d", 0o755).await.expect("mkdir succeeds");
    for name in ["x", "y", "z"] {
        mount.mknod(&format!("/d/{name}"), FILE_MODE, 0).await.expect("mknod succeeds");
    }

    let listing: BTreeMap<_, _> = mount
        .readdir("/d")
        .await
        .expect("readdir succeeds")
        .into_iter()
        .map(|(entry, attr)| (entry.name.clone(), (entry, attr)))
        .collect();

    let names: Vec<_> = listing.keys().cloned().collect();
    assert_eq!(names, [".", "..", "x", "y", "z"]);

    let dir_meta = std::fs::metadata(fixture.host_path("/d")).expect("stat dir");
    let (dot, dot_attr) = &listing["."];
    assert_eq!(dot.file_type, FileType::Directory);
    assert_eq!(dot.fileid, dir_meta.ino());
    assert_eq!(dot_attr.fileid, dir_meta.ino());

    for name in ["x", "y", "z"] {
        let meta = std::fs::metadata(fixture.host_path(&format!("/d/{name}"))).expect("stat file");
        let (entry, attr) = &listing[name];
        assert_eq!(entry.file_type, FileType::Regular);
        assert_eq!(entry.fileid, meta.ino());
        assert_eq!(attr.size, 0);
        assert_eq!(attr.fileid, meta.ino());
    }
}

#[tokio::test]
async fn root_listing_clamps_dotdot_to_the_export() {
    let fixture = Fixture::new().await;

    let entries = fixture.mount.readdir("/").await.expect("readdir succeeds");
    let root_meta = std::fs::metadata(fixture.tempdir.path()).expect("stat root");

    let dot = entries.iter().find(|(entry, _)| entry.name == ".").expect("dot entry");
    let dotdot = entries.iter().find(|(entry, _)| entry.name == "..").expect("dotdot entry");
    assert_eq!(dot.0.fileid, root_meta.ino());
    assert_eq!(dotdot.0.fileid, root_meta.ino());
}

#[tokio::test]
async fn mkdir_honors_the_requested_mode() {
    let fixture = Fixture::new().await;

    fixture.mount.mkdir("/locked", 0o700).await.expect("mkdir succeeds");
    let meta = std::fs::metadata(fixture.host_path("/locked")).expect("stat dir");
    assert_eq!(meta.mode() & 0o777, 0o700);
}

#[tokio::test]
async fn mkdir_over_existing_reports_eexist() {
    let fixture = Fixture::new().await;

    fixture.mount.mkdir("/dup", 0o755).await.expect("first mkdir");
    assert_eq!(fixture.mount.mkdir("/dup", 0o755).await, Err(WatError::Os(libc::EEXIST)));
}

#[tokio::test]
async fn rmdir_refuses_non_empty_directories() {
    let fixture = Fixture::new().await;
    let mount = &fixture.mount;

    mount.mkdir("/full", 0o755).await.expect("mkdir succeeds");
    mount.mknod("/full/inner", FILE_MODE, 0).await.expect("mknod succeeds");

    assert_eq!(mount.rmdir("/full").await, Err(WatError::Os(libc::ENOTEMPTY)));

    mount.unlink("/full/inner").await.expect("unlink succeeds");
    mount.rmdir("/full").await.expect("rmdir succeeds");
    assert_eq!(mount.getattr("/full").await, Err(WatError::Os(libc::ENOENT)));
}

#[tokio::test]
async fn readdir_of_a_file_reports_enotdir() {
    let fixture = Fixture::new().await;

    fixture.mount.mknod("/plain", FILE_MODE, 0).await.expect("mknod succeeds");
    assert_eq!(fixture.mount.readdir("/plain").await, Err(WatError::Os(libc::ENOTDIR)));
}
