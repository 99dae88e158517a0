use dupsift::duplicates::{DuplicateFinder, FinderConfig};
use dupsift::scanner::{DiscoveredFile, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_identical_files_grouped_and_same_size_different_excluded() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.bin", b"0123456789abcdef");
    let b = write(dir.path(), "nested/b.bin", b"0123456789abcdef");
    let c = write(dir.path(), "c.bin", b"0123456789ABCDEF");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
    assert!(!groups[0].files.contains(&c));
    assert_eq!(groups[0].size, 16);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 16);
}

#[test]
fn test_differing_edge_bytes_never_hashed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"Xsame middle partY");
    write(dir.path(), "b", b"Zsame middle partY");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_bytes, 2);
    assert_eq!(summary.hashed_files, 0);
}

#[test]
fn test_differing_fingerprints_never_hashed() {
    let dir = tempdir().unwrap();
    // Same edges, differing content inside the head slice
    let mut left = vec![b'a'; 200];
    let mut right = vec![b'a'; 200];
    left[5] = b'x';
    right[5] = b'y';
    write(dir.path(), "left", &left);
    write(dir.path(), "right", &right);

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_bytes, 0);
    assert_eq!(summary.eliminated_by_fingerprint, 2);
    assert_eq!(summary.hashed_files, 0);
}

#[test]
fn test_middle_difference_caught_by_checksum() {
    let dir = tempdir().unwrap();
    // Slices are 10% of the size, so byte 500 is only read by the checksum
    let mut left = vec![b'q'; 1000];
    let mut right = vec![b'q'; 1000];
    left[500] = 1;
    right[500] = 2;
    write(dir.path(), "left", &left);
    write(dir.path(), "right", &right);

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.hashed_files, 2);
}

#[test]
fn test_empty_files_are_ignored() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_repeated_scans_are_identical() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(dir.path(), &format!("set1/{i}.txt"), b"first set content");
        write(dir.path(), &format!("set2/{i}.dat"), b"second");
    }
    write(dir.path(), "lonely", b"nothing like it");

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    let (second, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_groups_sorted_largest_first() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small1", b"ab");
    write(dir.path(), "small2", b"ab");
    write(dir.path(), "big1", &[7u8; 4096]);
    write(dir.path(), "big2", &[7u8; 4096]);

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].size, 4096);
    assert_eq!(groups[1].size, 2);
}

#[test]
fn test_single_worker_matches_pool() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path(), &format!("{i}"), format!("content {}", i % 4).as_bytes());
    }

    let single = DuplicateFinder::new(FinderConfig::default().with_threads(1));
    let pooled = DuplicateFinder::new(FinderConfig::default().with_threads(8));

    let (a, _) = single.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    let (b, _) = pooled.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(a.len(), 4);
    assert_eq!(a, b);
}

#[test]
fn test_file_pattern_limits_candidates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.jpg", b"picture");
    write(dir.path(), "b.jpg", b"picture");
    write(dir.path(), "c.txt", b"picture");

    let walker_config = WalkerConfig {
        file_pattern: Some(r"\.jpg$".to_string()),
        ..Default::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker_config));
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert!(groups[0]
        .files
        .iter()
        .all(|p| p.extension().is_some_and(|e| e == "jpg")));
}

#[test]
fn test_max_depth_stops_descent() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top", b"same bytes");
    write(dir.path(), "one/deeper", b"same bytes");

    let walker_config = WalkerConfig {
        max_depth: Some(1),
        ..Default::default()
    };
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker_config));
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(summary.total_files, 1);
    assert!(groups.is_empty());
}

#[test]
fn test_find_duplicates_from_files() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"listed");
    let b = write(dir.path(), "b", b"listed");

    let files = vec![
        DiscoveredFile::new(a.clone(), 6),
        DiscoveredFile::new(b.clone(), 6),
        DiscoveredFile::new(dir.path().join("zero"), 0),
    ];
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
}

#[test]
fn test_file_removed_before_hashing_is_not_grouped() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"vanishing");
    let b = write(dir.path(), "b", b"vanishing");
    let gone = dir.path().join("gone");

    let files = vec![
        DiscoveredFile::new(a, 9),
        DiscoveredFile::new(b, 9),
        DiscoveredFile::new(gone.clone(), 9),
    ];
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(!groups[0].files.contains(&gone));
}
