use dupefind::duplicates::{DuplicateFinder, FinderConfig, LinkPolicy};
use dupefind::scanner::IdentityTracker;
use std::fs;
use tempfile::tempdir;

fn collapse() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_link_policy(LinkPolicy::Collapse))
}

#[test]
fn test_hardlinks_reported_by_default() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");
    fs::write(&original, b"identical content").unwrap();
    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups[0].files, vec![hardlink, original]);
    assert_eq!(summary.aliases_skipped, 0);
}

#[test]
fn test_hardlinks_collapsed() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");
    fs::write(&original, b"identical content").unwrap();
    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let (report, summary) = collapse().find_duplicates(dir.path()).unwrap();

    if IdentityTracker::is_supported() {
        assert!(report.is_empty());
        assert_eq!(summary.aliases_skipped, 1);
    } else {
        assert_eq!(report.len(), 1);
        assert_eq!(summary.aliases_skipped, 0);
    }
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_collapse_keeps_real_copies() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("a.txt");
    let copy = dir.path().join("b.txt");
    let hardlink = dir.path().join("c.txt");
    fs::write(&original, b"content").unwrap();
    fs::write(&copy, b"content").unwrap();
    if fs::hard_link(&original, &hardlink).is_err() {
        return;
    }

    let (report, _) = collapse().find_duplicates(dir.path()).unwrap();

    assert_eq!(report.len(), 1);
    if IdentityTracker::is_supported() {
        assert_eq!(report.groups[0].files, vec![original, copy]);
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_to_file_is_passed_through() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target.txt");
    let link = dir.path().join("link.txt");
    fs::write(&target, b"linked content").unwrap();
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let (report, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.groups[0].files, vec![link, target]);

    let (report, summary) = collapse().find_duplicates(dir.path()).unwrap();
    assert!(report.is_empty());
    assert_eq!(summary.aliases_skipped, 1);
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_is_an_access_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"x").unwrap();
    fs::write(dir.path().join("b.txt"), b"x").unwrap();
    let dangling = dir.path().join("dangling");
    std::os::unix::fs::symlink(dir.path().join("missing"), &dangling).unwrap();

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.len(), 1);
    assert!(report.complete);
    assert_eq!(summary.access_errors(), 1);
    assert_eq!(summary.key_errors[0].path(), dangling.as_path());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_needs_follow() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    fs::write(real.join("file.txt"), b"content").unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("alias")).unwrap();

    let (report, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(report.is_empty());

    let following = DuplicateFinder::new(FinderConfig::default().with_walker_config(
        dupefind::scanner::WalkerConfig::new(true, false),
    ));
    let (report, _) = following.find_duplicates(dir.path()).unwrap();
    assert_eq!(report.len(), 1);

    let following_collapsed = DuplicateFinder::new(
        FinderConfig::default()
            .with_walker_config(dupefind::scanner::WalkerConfig::new(true, false))
            .with_link_policy(LinkPolicy::Collapse),
    );
    let (report, summary) = following_collapsed.find_duplicates(dir.path()).unwrap();
    assert!(report.is_empty());
    assert_eq!(summary.aliases_skipped, 1);
}
