//! Literal end-to-end scenarios S1-S6 from spec §8.

use intake_router::config::Config;
use intake_router::events::ChannelSink;
use intake_router::models::{IntakeFile, InputExt, RoutingDecision};
use intake_router::ocr::backend::test_support::MockOcrBackend;
use intake_router::ocr::Rasterizer;
use intake_router::parser;
use intake_router::pipeline::Pipeline;
use intake_router::router::route;

fn config_in(root: &std::path::Path) -> Config {
    let config = Config {
        root: root.to_path_buf(),
        ..Config::default()
    };
    config.ensure_directories().unwrap();
    config
}

/// S1 — Full index, PDF. The parser+router chain from already-recognized
/// OCR text, isolated from PDF rasterization (exercised separately by the
/// OCR driver's own tests).
#[test]
fn s1_full_index_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let text = "SURNAME: SMITH\nFirst Name: JOHN\nOther Names: K\nAccount Number: 34007802837";
    let fields = parser::parse(text);

    let source = config.intake_path().join("scan.pdf");
    std::fs::write(&source, b"%PDF-1.4").unwrap();
    let outcome = route(&config, &source, InputExt::Pdf, &fields).unwrap();

    assert_eq!(outcome.decision, RoutingDecision::Full);
    assert_eq!(
        outcome.destination.file_name().unwrap().to_str().unwrap(),
        "SMITH JOHN K_34007802837.pdf"
    );
}

/// S2 — Partial, name only, image. Runs the real pipeline end to end: image
/// decode, mocked OCR, parse, route, and event emission.
#[test]
fn s2_partial_name_only_image() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let backend = MockOcrBackend::constant("surname (individual): DOE");
    let rasterizer = Rasterizer::new(None);
    let (sink, mut rx) = ChannelSink::new();
    let pipeline = Pipeline::new(&config, &backend, &rasterizer, &sink);

    let path = config.intake_path().join("scan.png");
    std::fs::write(&path, sample_png()).unwrap();
    let intake = IntakeFile::from_path(&path).unwrap();

    let outcome = pipeline.process_one(&intake);

    assert_eq!(outcome.decision, RoutingDecision::Partial);
    assert_eq!(outcome.destination.file_name().unwrap().to_str().unwrap(), "DOE.pdf");
    assert!(outcome.destination.exists());

    let event = rx.try_recv().unwrap();
    assert_eq!(event.status, "partially_indexed");
    assert!(event.extracted_account.is_none());
}

/// S3 — Failed, no extraction.
#[test]
fn s3_failed_no_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let fields = parser::parse("lorem ipsum");

    let source = config.intake_path().join("scan0042.pdf");
    std::fs::write(&source, b"%PDF-1.4").unwrap();
    let outcome = route(&config, &source, InputExt::Pdf, &fields).unwrap();

    assert_eq!(outcome.decision, RoutingDecision::Failed);
    assert_eq!(
        outcome.destination.file_name().unwrap().to_str().unwrap(),
        "scan0042.pdf"
    );
}

/// S4 — Boxed account. The hybrid extractor's label-anchored step appends
/// a synthetic `account_number: <value>` line once the boxed-field reader
/// recovers the digits (§4.5 Step C); this test exercises the
/// parser+router's handling of that synthesized line, independent of the
/// pixel-level contour detection covered by `hybrid::boxed`'s own tests.
#[test]
fn s4_boxed_account_recovered_via_synthetic_line() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let corpus = "lorem ipsum noise\naccount_number: 34007802837";
    let fields = parser::parse(corpus);

    let source = config.intake_path().join("scan.pdf");
    std::fs::write(&source, b"%PDF-1.4").unwrap();
    let outcome = route(&config, &source, InputExt::Pdf, &fields).unwrap();

    assert!(outcome
        .destination
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .contains("_34007802837.pdf"));
}

/// S5 — Collision: two files whose extraction both yields `DOE_1` land in
/// the same bucket without overwriting each other.
#[test]
fn s5_collision_resolves_with_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let fields = parser::parse("surname (individual): DOE_1");

    let first_source = config.intake_path().join("a.pdf");
    std::fs::write(&first_source, b"%PDF-1.4").unwrap();
    let first = route(&config, &first_source, InputExt::Pdf, &fields).unwrap();

    let second_source = config.intake_path().join("b.pdf");
    std::fs::write(&second_source, b"%PDF-1.4").unwrap();
    let second = route(&config, &second_source, InputExt::Pdf, &fields).unwrap();

    assert_ne!(first.destination, second.destination);
    assert!(first.destination.exists());
    assert!(second.destination.exists());
    assert_eq!(first.destination.parent(), second.destination.parent());
}

/// S6 — Corporate entity.
#[test]
fn s6_corporate_entity() {
    let fields = parser::parse("Name of Account Holder (corporate entities): ACME TRADING LTD");

    assert_eq!(fields.name().as_deref(), Some("ACME TRADING LTD"));
    assert!(fields.is_corporate);
    assert!(fields.first_name.is_none());
    assert!(fields.other_names.is_none());
}

fn sample_png() -> Vec<u8> {
    let img = image::GrayImage::from_pixel(4, 4, image::Luma([128]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
