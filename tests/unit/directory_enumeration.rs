use epubconv::source::{find_source_files, SOURCE_EXTENSION};
use std::fs::{self, File};
use std::io::Write;
use tempfile::TempDir;

#[test]
fn test_find_pdf_files_nonrecursive() {
    let td = TempDir::new().unwrap();
    let mut fa = File::create(td.path().join("a.pdf")).unwrap();
    write!(fa, "%PDF-1.4").unwrap();
    File::create(td.path().join("b.epub")).unwrap();

    let sub = td.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    File::create(sub.join("c.pdf")).unwrap();

    let listing = find_source_files(td.path(), SOURCE_EXTENSION).unwrap();
    assert_eq!(listing.sources, vec!["a.pdf".to_string()]);
    assert!(listing.entries.contains(&"b.epub".to_string()));
    assert!(listing.entries.contains(&"sub".to_string()));
}

#[test]
fn test_only_non_pdf_files_yield_empty_listing() {
    let td = TempDir::new().unwrap();
    for name in ["notes.txt", "book.epub", "scan.PDF", "pdf"] {
        File::create(td.path().join(name)).unwrap();
    }

    let listing = find_source_files(td.path(), SOURCE_EXTENSION).unwrap();
    assert!(listing.is_empty());
    assert_eq!(listing.entries.len(), 4);
}

#[test]
fn test_unreadable_target_fails() {
    let td = TempDir::new().unwrap();
    let missing = td.path().join("does-not-exist");
    assert!(find_source_files(&missing, SOURCE_EXTENSION).is_err());
}

#[test]
fn test_directory_named_like_pdf_is_skipped() {
    let td = TempDir::new().unwrap();
    fs::create_dir(td.path().join("folder.pdf")).unwrap();
    File::create(td.path().join("real.pdf")).unwrap();

    let listing = find_source_files(td.path(), SOURCE_EXTENSION).unwrap();
    assert_eq!(listing.sources, vec!["real.pdf".to_string()]);
    assert!(listing.entries.contains(&"folder.pdf".to_string()));
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_followed() {
    use std::os::unix::fs::symlink;

    let td = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    File::create(elsewhere.path().join("linked.pdf")).unwrap();
    fs::create_dir(elsewhere.path().join("dir.pdf")).unwrap();

    symlink(elsewhere.path().join("linked.pdf"), td.path().join("linked.pdf")).unwrap();
    symlink(elsewhere.path().join("dir.pdf"), td.path().join("dir.pdf")).unwrap();

    let listing = find_source_files(td.path(), SOURCE_EXTENSION).unwrap();
    assert_eq!(listing.sources, vec!["linked.pdf".to_string()]);
}
