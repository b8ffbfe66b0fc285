use std::fs;
use std::path::PathBuf;

use simdupe::scanner::{
    extract_records, ExtractConfig, ExtractionError, Manifest, ManifestError, MediaKind,
};
use tempfile::tempdir;

use super::common::write_manifest;

#[test]
fn test_manifest_from_file() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "hashes.csv",
        &[
            "/p/A.JPG,,8f373714acfcf4d0,",
            "/p/clip.MKV,,8f373714acfcf4d0,",
            "/p/notes.txt,,8f373714acfcf4d0,",
        ],
    );

    let manifest = Manifest::from_path(&path).unwrap();
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.skipped(), 1);
    assert_eq!(manifest.entries()[0].kind, MediaKind::Image);
    assert_eq!(manifest.entries()[1].kind, MediaKind::Video);
}

#[test]
fn test_manifest_path_only_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("paths.csv");
    fs::write(&path, "path\n/p/a.png\n/p/b.mp4\n").unwrap();

    let (entries, extractor) = Manifest::from_path(&path).unwrap().into_extractor();
    let (records, stats) = extract_records(entries, &extractor, &ExtractConfig::default());

    // Listed but never hashed: both fail, neither reaches grouping
    assert!(records.is_empty());
    assert_eq!(stats.failed, 2);
    assert!(matches!(stats.errors[0], ExtractionError::Failed { .. }));
}

#[test]
fn test_manifest_missing_file() {
    let dir = tempdir().unwrap();
    let err = Manifest::from_path(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, ManifestError::Open { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn test_manifest_unknown_kind_is_error() {
    let err = Manifest::from_reader("path,kind\n/p/a.png,audio\n".as_bytes()).unwrap_err();
    assert!(matches!(err, ManifestError::Row(_)));
}

#[test]
fn test_merge_later_manifest_wins() {
    let dir = tempdir().unwrap();
    let first = write_manifest(dir.path(), "one.csv", &["/p/a.png,image,,timeout"]);
    let second = write_manifest(dir.path(), "two.csv", &["/p/a.png,image,ffff,"]);

    let mut manifest = Manifest::from_path(&first).unwrap();
    manifest.merge(Manifest::from_path(&second).unwrap());
    assert_eq!(manifest.len(), 1);

    let (entries, extractor) = manifest.into_extractor();
    let (records, stats) = extract_records(entries, &extractor, &ExtractConfig::default());
    assert_eq!(stats.failed, 0);
    assert_eq!(records[0].path, PathBuf::from("/p/a.png"));
    assert_eq!(records[0].fingerprint.to_hex(), "ffff");
}

#[test]
fn test_disabled_kinds_never_extracted() {
    let dir = tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "hashes.csv",
        &["/p/a.png,,00ff,", "/p/b.mp4,,00ff,", "/p/c.mp4,,,broken"],
    );
    let (entries, extractor) = Manifest::from_path(&path).unwrap().into_extractor();
    let config = ExtractConfig::default().with_videos(false);
    let (records, stats) = extract_records(entries, &extractor, &config);

    assert_eq!(records.len(), 1);
    assert_eq!(stats.disabled, 2);
    assert_eq!(stats.failed, 0);
}
