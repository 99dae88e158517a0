use dupsift::duplicates::{DuplicateFinder, FinderError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();

    let f1 = dir1.path().join("file1.txt");
    let f2 = dir2.path().join("file2.txt");
    fs::write(&f1, "duplicate content").unwrap();
    fs::write(&f2, "duplicate content").unwrap();
    fs::write(dir2.path().join("other.txt"), "something else entirely").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.path_doubles, 0);
    assert_eq!(groups.len(), 1);
    assert!(groups[0].files.contains(&f1));
    assert!(groups[0].files.contains(&f2));
}

#[test]
fn test_root_order_does_not_change_groups() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    for (i, dir) in [&dir1, &dir2].iter().enumerate() {
        fs::write(dir.path().join(format!("x{i}")), "xxxx").unwrap();
        fs::write(dir.path().join(format!("y{i}")), "yyyyyy").unwrap();
    }

    let finder = DuplicateFinder::with_defaults();
    let forward = vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()];
    let backward = vec![dir2.path().to_path_buf(), dir1.path().to_path_buf()];

    let (a, _) = finder.find_duplicates(&forward).unwrap();
    let (b, _) = finder.find_duplicates(&backward).unwrap();

    assert_eq!(a.len(), 2);
    assert_eq!(a, b);
}

#[test]
fn test_missing_second_root_fails_before_scanning() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let result =
        DuplicateFinder::with_defaults().find_duplicates(&[dir.path().to_path_buf(), missing]);
    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_no_roots_is_an_error() {
    let result = DuplicateFinder::with_defaults().find_duplicates(&[]);
    assert!(matches!(result, Err(FinderError::NoRoots)));
}
