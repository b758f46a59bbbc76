use dupefind::duplicates::{
    ContentKey, DuplicateFinder, FinderConfig, FinderError, KeyFunction, SizeKey,
};
use dupefind::scanner::{Digest, KeyError, ScanError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_missing_files_are_recorded_not_fatal() {
    let finder = DuplicateFinder::with_defaults();
    let (report, summary) = finder
        .find_duplicates_from_paths(vec![
            PathBuf::from("nonexistent_1.txt"),
            PathBuf::from("nonexistent_2.txt"),
        ])
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.key_errors.len(), 2);
    for err in &summary.key_errors {
        assert!(matches!(err, KeyError::Access { .. }), "got {err:?}");
    }
}

#[test]
fn test_strict_mode_still_tolerates_unreadable_files() {
    let finder = DuplicateFinder::new(FinderConfig::default().with_strict(true));
    let (report, summary) = finder
        .find_duplicates_from_paths(vec![PathBuf::from("nonexistent.txt")])
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(summary.error_count(), 1);
}

/// Simulates a file that becomes unreadable between the two passes.
struct FailsFor<'a> {
    path: &'a Path,
}

impl KeyFunction for FailsFor<'_> {
    type Key = Digest;

    fn name(&self) -> &'static str {
        "content"
    }

    fn key(&self, path: &Path) -> Result<Digest, KeyError> {
        if path == self.path {
            return Err(KeyError::read(
                path,
                io::Error::new(io::ErrorKind::UnexpectedEof, "length changed during read"),
            ));
        }
        ContentKey::default().key(path)
    }
}

#[test]
fn test_unreadable_member_excluded_from_group() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("A");
    let b = dir.path().join("B");
    let c = dir.path().join("C");
    for path in [&a, &b, &c] {
        fs::write(path, b"identical bytes").unwrap();
    }

    let paths = vec![Ok(a.clone()), Ok(b.clone()), Ok(c.clone())];
    let (report, summary) = DuplicateFinder::with_defaults()
        .run_with(paths, &SizeKey, &FailsFor { path: &c })
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups[0].files, vec![a, b]);
    assert!(report.group_of(&c).is_none());
    assert_eq!(summary.read_errors(), 1);
    assert_eq!(summary.hashed_files, 2);
}

#[test]
fn test_pair_with_one_unreadable_member_disappears() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"pair").unwrap();
    fs::write(&b, b"pair").unwrap();

    let (report, summary) = DuplicateFinder::with_defaults()
        .run_with(vec![Ok(a), Ok(b.clone())], &SizeKey, &FailsFor { path: &b })
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.key_errors[0].path(), b.as_path());
}

#[test]
fn test_enumeration_errors_mark_report_incomplete() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"pair").unwrap();
    fs::write(&b, b"pair").unwrap();

    let source = vec![
        Ok(a),
        Err(ScanError::Io {
            path: dir.path().join("loop"),
            source: io::Error::other("File system loop found"),
        }),
        Ok(b),
    ];
    let (report, summary) = DuplicateFinder::with_defaults().run(source).unwrap();

    assert_eq!(report.len(), 1);
    assert!(!report.complete);
    assert_eq!(summary.walk_errors.len(), 1);
    assert_eq!(summary.error_count(), 1);
}

#[test]
fn test_strict_mode_aborts_on_enumeration_error() {
    let dir = tempdir().unwrap();
    let source = vec![Err(ScanError::NotFound(dir.path().join("vanished")))];

    let finder = DuplicateFinder::new(FinderConfig::default().with_strict(true));
    match finder.run(source) {
        Err(FinderError::Enumeration(ScanError::NotFound(path))) => {
            assert!(path.ends_with("vanished"));
        }
        other => panic!("Expected enumeration error, got: {:?}", other.map(|_| ())),
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_on_disk() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), b"dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still read the directory.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("Skipping: directory permissions are not enforced for this user");
        return;
    }

    let lenient = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    let strict = DuplicateFinder::new(FinderConfig::default().with_strict(true))
        .find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (report, summary) = lenient.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert!(!report.complete);
    assert!(matches!(
        summary.walk_errors[0],
        ScanError::PermissionDenied(_)
    ));

    assert!(matches!(strict, Err(FinderError::Enumeration(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_on_disk() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();
    let c = dir.path().join("c");
    fs::write(&c, b"same").unwrap();
    fs::set_permissions(&c, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::File::open(&c).is_ok() {
        eprintln!("Skipping: file permissions are not enforced for this user");
        return;
    }

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    fs::set_permissions(&c, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.len(), 1);
    assert!(report.group_of(&c).is_none());
    assert_eq!(summary.access_errors(), 1);
}
