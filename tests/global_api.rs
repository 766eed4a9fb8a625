//! The process-wide single-mount surface. Everything lives in one test
//! function because the mount slot is global to the process.

use flatfs::api;
use flatfs::prelude::*;
use tempfile::TempDir;

#[test]
fn single_mount_lifecycle_and_codes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("disk.img");
    let path = path.to_str().unwrap();

    // nothing mounted yet: operations refuse with the "other" codes
    assert_eq!(api::create("a"), -3);
    assert_eq!(api::delete("a"), -2);
    assert_eq!(api::write("a", b"x"), -3);
    let mut buf = [0u8; 4];
    assert_eq!(api::read("a", &mut buf), -3);
    let mut names = Vec::new();
    assert_eq!(api::list(&mut names, MAX_FILES), -1);
    assert_eq!(api::free_block_count(), -1);

    // format, then mount
    assert_eq!(api::format(path), 0);
    assert_eq!(api::mount(path), 0);
    assert_eq!(
        api::free_block_count(),
        (MAX_BLOCKS - RESERVED_BLOCKS) as i32
    );

    // re-format and re-mount are refused while mounted
    assert_eq!(api::format(path), -1);
    assert_eq!(api::mount(path), -1);

    // create / duplicate / list
    assert_eq!(api::create("a"), 0);
    assert_eq!(api::create("a"), -1);
    assert_eq!(api::list(&mut names, MAX_FILES), 1);
    assert_eq!(names, vec!["a".to_string()]);

    // write / read round trip and the missing-file codes
    assert_eq!(api::write("missing", b"x"), -1);
    assert_eq!(api::write("a", b"hi"), 0);
    let mut buf = [0u8; 8];
    assert_eq!(api::read("a", &mut buf), 2);
    assert_eq!(&buf[..2], b"hi");
    assert_eq!(api::read("missing", &mut buf), -1);

    // oversized payloads hit the no-space code
    let too_big = vec![0u8; MAX_FILE_SIZE + 1];
    assert_eq!(api::write("a", &too_big), -2);

    // invalid names are the "other" code
    assert_eq!(api::create(""), -3);
    let long = "x".repeat(MAX_FILENAME + 1);
    assert_eq!(api::create(&long), -3);

    // delete codes
    assert_eq!(api::delete("missing"), -1);
    assert_eq!(api::delete("a"), 0);
    assert_eq!(api::delete("a"), -1);

    // unmount closes the gate again; a second unmount is a no-op
    api::unmount();
    api::unmount();
    assert_eq!(api::create("a"), -3);
    assert_eq!(api::free_block_count(), -1);

    // the image stays mountable afterwards
    assert_eq!(api::mount(path), 0);
    api::unmount();
}
