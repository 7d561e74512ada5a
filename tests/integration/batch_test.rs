//! Integration tests for batch conversion through the library API

#[path = "../common/mod.rs"]
mod common;

use assert_matches::assert_matches;
use common::{list_dir, write_pdf, FakeConverter};
use epubconv::conversion::{BatchOutcome, BatchScheduler, ConversionJob};
use epubconv::progress::ProgressReporter;
use epubconv::{ConversionConfig, ConversionError, DirectoryPair, EpubConverter, FailurePolicy, Stage};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn engine(
    target: &Path,
    output: Option<&Path>,
    config: ConversionConfig,
    converter: Arc<FakeConverter>,
) -> EpubConverter {
    let dirs = DirectoryPair::resolve(target, None, output);
    EpubConverter::with_converter(dirs, config.with_progress(false), converter).unwrap()
}

#[tokio::test]
async fn test_in_place_conversion_keeps_source() {
    let dir = tempdir().unwrap();
    write_pdf(dir.path(), "sample.pdf");

    let converter = Arc::new(FakeConverter::new(Duration::ZERO));
    let outcome = engine(dir.path(), None, ConversionConfig::default(), converter)
        .convert()
        .await
        .unwrap();

    let report = outcome.report().unwrap();
    assert!(report.is_success());
    assert_eq!(list_dir(dir.path()), vec!["sample.epub", "sample.pdf"]);
}

#[tokio::test]
async fn test_separate_output_directory_is_created() {
    let dir = tempdir().unwrap();
    write_pdf(dir.path(), "sample.pdf");
    let out = dir.path().join("out");

    let converter = Arc::new(FakeConverter::new(Duration::ZERO));
    engine(dir.path(), Some(&out), ConversionConfig::default(), converter)
        .convert()
        .await
        .unwrap();

    assert_eq!(list_dir(&out), vec!["sample.epub"]);
    assert_eq!(list_dir(dir.path()), vec!["out", "sample.pdf"]);
}

#[tokio::test]
async fn test_empty_target_reports_no_input_files() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"not a pdf").unwrap();
    let out = dir.path().join("out");

    let converter = Arc::new(FakeConverter::new(Duration::ZERO));
    let outcome = engine(dir.path(), Some(&out), ConversionConfig::default(), converter.clone())
        .convert()
        .await
        .unwrap();

    assert_matches!(outcome, BatchOutcome::NoInputFiles { .. });
    assert!(!out.exists());
    assert!(converter.started().is_empty());
}

#[tokio::test]
async fn test_unsafe_names_leave_no_intermediate_files() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("epubs");
    let names = ["My Book.pdf", "Ünïcode Title.pdf", "a_b.pdf", "A B.pdf", "it's (2).pdf"];
    for name in names {
        write_pdf(dir.path(), name);
    }

    let converter = Arc::new(FakeConverter::new(Duration::from_millis(5)));
    let outcome = engine(dir.path(), Some(&out), ConversionConfig::default().with_concurrency(3), converter.clone())
        .convert()
        .await
        .unwrap();

    assert_eq!(outcome.report().unwrap().converted.len(), names.len());
    assert_eq!(
        list_dir(&out),
        vec!["A B.epub", "My Book.epub", "a_b.epub", "it's (2).epub", "Ünïcode Title.epub"]
    );

    let mut expected_sources: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected_sources.push("epubs".to_string());
    expected_sources.sort();
    assert_eq!(list_dir(dir.path()), expected_sources);

    // the converter only ever saw sanitized, distinct names
    let mut seen = converter.started();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), names.len());
    assert!(seen.iter().all(|n| n == &epubconv::sanitize(n)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_limit() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write_pdf(dir.path(), &format!("doc{i}.pdf"));
    }

    let converter = Arc::new(FakeConverter::new(Duration::from_millis(30)));
    let outcome = engine(
        dir.path(),
        None,
        ConversionConfig::default().with_concurrency(3),
        converter.clone(),
    )
    .convert()
    .await
    .unwrap();

    assert_eq!(outcome.report().unwrap().converted.len(), 10);
    assert_eq!(converter.max_active(), 3);
}

#[tokio::test]
async fn test_fail_fast_drops_pending_jobs() {
    let dir = tempdir().unwrap();
    let jobs: Vec<ConversionJob> = (0..6)
        .map(|i| {
            let name = format!("Doc {i}.pdf");
            write_pdf(dir.path(), &name);
            ConversionJob::new(
                name,
                format!("doc_{i}.pdf"),
                dir.path(),
                dir.path(),
                "epub",
            )
        })
        .collect();

    let converter = Arc::new(FakeConverter::new(Duration::from_millis(100)).failing_on("doc_1.pdf"));
    let err = BatchScheduler::new(2, FailurePolicy::FailFast)
        .run(converter.clone(), jobs, &ProgressReporter::hidden(6))
        .await
        .unwrap_err();

    match err {
        ConversionError::Job(job) => {
            assert_eq!(job.file_name, "Doc 1.pdf");
            assert_eq!(job.stage, Stage::Conversion);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // only the first window ever started
    let mut started = converter.started();
    started.sort();
    assert_eq!(started, vec!["doc_0.pdf", "doc_1.pdf"]);

    // every source kept its original name, the in-flight job finished cleanly
    let listing = list_dir(dir.path());
    assert!(listing.iter().all(|n| !n.starts_with("doc_")));
    assert!(listing.contains(&"Doc 1.pdf".to_string()));
    assert!(listing.contains(&"Doc 0.epub".to_string()));
    assert!(!listing.contains(&"Doc 2.epub".to_string()));
}

#[tokio::test]
async fn test_continue_on_error_collects_failures() {
    let dir = tempdir().unwrap();
    for name in ["good.pdf", "Bad One.pdf", "other.pdf"] {
        write_pdf(dir.path(), name);
    }

    let converter = Arc::new(FakeConverter::new(Duration::from_millis(5)).failing_on("bad_one.pdf"));
    let config = ConversionConfig::default()
        .with_concurrency(1)
        .with_failure_policy(FailurePolicy::ContinueOnError);
    let outcome = engine(dir.path(), None, config, converter).convert().await.unwrap();

    let report = outcome.report().unwrap();
    assert!(!report.is_success());
    assert_eq!(report.total, 3);
    assert_eq!(report.converted.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "Bad One.pdf");

    assert_eq!(
        list_dir(dir.path()),
        vec!["Bad One.pdf", "good.epub", "good.pdf", "other.epub", "other.pdf"]
    );
}

#[tokio::test]
async fn test_independent_batches_in_one_process() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write_pdf(first.path(), "one.pdf");
    write_pdf(second.path(), "two.pdf");
    write_pdf(second.path(), "three.pdf");

    let converter = Arc::new(FakeConverter::new(Duration::from_millis(10)));
    let a = engine(first.path(), None, ConversionConfig::default(), converter.clone());
    let b = engine(second.path(), None, ConversionConfig::default(), converter);

    let (ra, rb) = tokio::join!(a.convert(), b.convert());
    assert_eq!(ra.unwrap().report().unwrap().total, 1);
    assert_eq!(rb.unwrap().report().unwrap().total, 2);
}

#[tokio::test]
async fn test_convert_directory_with_nothing_to_do() {
    let dir = tempdir().unwrap();
    let outcome = epubconv::convert_directory(Some(dir.path()), None).await.unwrap();
    assert_matches!(outcome, BatchOutcome::NoInputFiles { .. });
}

// needs a case-sensitive filesystem
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_in_place_conversion_keeps_unrelated_epub() {
    let dir = tempdir().unwrap();
    write_pdf(dir.path(), "Notes.pdf");
    std::fs::write(dir.path().join("notes.epub"), b"keep me").unwrap();

    let converter = Arc::new(FakeConverter::new(Duration::ZERO));
    let outcome = engine(dir.path(), None, ConversionConfig::default(), converter)
        .convert()
        .await
        .unwrap();

    assert!(outcome.report().unwrap().is_success());
    assert_eq!(
        list_dir(dir.path()),
        vec!["Notes.epub", "Notes.pdf", "notes.epub"]
    );
    assert_eq!(std::fs::read(dir.path().join("notes.epub")).unwrap(), b"keep me");
}

#[tokio::test]
async fn test_separate_output_keeps_unrelated_epub() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    std::fs::write(out.join("my_book.epub"), b"keep me").unwrap();
    write_pdf(dir.path(), "My Book.pdf");

    let converter = Arc::new(FakeConverter::new(Duration::ZERO));
    engine(dir.path(), Some(&out), ConversionConfig::default(), converter)
        .convert()
        .await
        .unwrap();

    assert_eq!(list_dir(&out), vec!["My Book.epub", "my_book.epub"]);
    assert_eq!(std::fs::read(out.join("my_book.epub")).unwrap(), b"keep me");
    assert_eq!(list_dir(dir.path()), vec!["My Book.pdf", "out"]);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_non_utf8_source_is_reported() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(OsStr::from_bytes(b"caf\xe9.pdf")), b"%PDF").unwrap();
    write_pdf(dir.path(), "ok.pdf");

    let converter = Arc::new(FakeConverter::new(Duration::ZERO));
    let outcome = engine(dir.path(), None, ConversionConfig::default(), converter)
        .convert()
        .await
        .unwrap();

    let report = outcome.report().unwrap();
    assert!(!report.is_success());
    assert_eq!(report.total, 2);
    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.skipped, vec!["caf\u{FFFD}.pdf".to_string()]);
}
