use dupefind::duplicates::{DuplicateFinder, FinderConfig};
use dupefind::scanner::{HashAlgorithm, Walker, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn relative(dir: &TempDir, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            f.strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_hello_world_tree() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "b/b.txt", b"hello");
    write(dir.path(), "c.txt", b"world");

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(relative(&dir, &report.groups[0].files), vec!["a.txt", "b/b.txt"]);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.error_count(), 0);
}

#[test]
fn test_same_result_for_both_algorithms() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one/x.bin", &[1u8; 3000]);
    write(dir.path(), "two/x.bin", &[1u8; 3000]);
    write(dir.path(), "two/y.bin", &[2u8; 3000]);
    write(dir.path(), "three.bin", &[1u8; 3000]);

    let mut results = Vec::new();
    for algorithm in [HashAlgorithm::Blake3, HashAlgorithm::Sha256] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(algorithm));
        let (report, _) = finder.find_duplicates(dir.path()).unwrap();
        assert_eq!(report.algorithm, algorithm);
        results.push(
            report
                .iter()
                .map(|g| relative(&dir, &g.files))
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(
        results[0],
        vec![vec!["one/x.bin", "three.bin", "two/x.bin"]]
    );
}

#[test]
fn test_block_size_does_not_change_groups() {
    let dir = tempdir().unwrap();
    let big: Vec<u8> = (0..100_000u32).map(|i| (i % 253) as u8).collect();
    write(dir.path(), "a", &big);
    write(dir.path(), "b", &big);
    let mut almost = big.clone();
    almost[99_999] ^= 1;
    write(dir.path(), "c", &almost);

    for block_size in [512, 4096, 8192, 1 << 20] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_block_size(block_size));
        let (report, summary) = finder.find_duplicates(dir.path()).unwrap();
        assert_eq!(report.len(), 1, "block size {block_size}");
        assert_eq!(relative(&dir, &report.groups[0].files), vec!["a", "b"]);
        assert_eq!(summary.bytes_hashed, 300_000);
    }
}

#[test]
fn test_several_groups_of_several_sizes() {
    let dir = tempdir().unwrap();
    write(dir.path(), "d1/photo.jpg", b"JPEGDATA-1");
    write(dir.path(), "d2/photo copy.jpg", b"JPEGDATA-1");
    write(dir.path(), "d2/other.jpg", b"JPEGDATA-2");
    write(dir.path(), "notes.txt", b"some notes");
    write(dir.path(), "notes-backup.txt", b"some notes");
    write(dir.path(), "notes-old.txt", b"some notes");
    write(dir.path(), "unique.txt", b"only one of these");

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(
        relative(&dir, &report.groups[0].files),
        vec!["d1/photo.jpg", "d2/photo copy.jpg"]
    );
    assert_eq!(
        relative(&dir, &report.groups[1].files),
        vec!["notes-backup.txt", "notes-old.txt", "notes.txt"]
    );
    assert_eq!(summary.duplicate_files, 3);
    assert_eq!(summary.reclaimable_space, 10 + 2 * 10);
    assert_eq!(summary.eliminated_by_size, 1);
}

#[test]
fn test_skip_hidden() {
    let dir = tempdir().unwrap();
    write(dir.path(), "visible.txt", b"same");
    write(dir.path(), ".hidden.txt", b"same");
    write(dir.path(), ".git/objects/blob", b"same");

    let (report, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(report.groups[0].len(), 3);

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_walker_config(WalkerConfig::new(false, true)),
    );
    let (report, summary) = finder.find_duplicates(dir.path()).unwrap();
    assert!(report.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_walker_feeds_finder_directly() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x", b"12345");
    write(dir.path(), "y", b"12345");

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    let (report, _) = DuplicateFinder::with_defaults().run(walker.walk()).unwrap();
    assert_eq!(report.len(), 1);
}

#[test]
fn test_deep_tree() {
    let dir = tempdir().unwrap();
    let mut nested = PathBuf::new();
    for level in 0..30 {
        nested.push(format!("level{level}"));
    }
    write(dir.path(), &nested.join("deep.txt").to_string_lossy(), b"deep");
    write(dir.path(), "shallow.txt", b"deep");

    let (report, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}
