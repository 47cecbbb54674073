use std::fs;
use std::path::Path;

use image::{Rgb, Rgba, RgbaImage};
use tempfile::TempDir;

use framekit::batch::{FrameBatch, FrameStatus, PNG_ONLY};
use framekit::errors::FramekitError;
use framekit::mocks::{FailingRemover, MockRemover};

fn write_png(dir: &Path, name: &str, color: Rgba<u8>) {
    RgbaImage::from_pixel(8, 8, color)
        .save(dir.join(name))
        .unwrap();
}

#[test]
fn test_mixed_batch_reports_every_frame_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = TempDir::new()?;
    let source = workspace.path().join("raw");
    let dest = workspace.path().join("cutout");
    fs::create_dir_all(&source)?;

    write_png(&source, "a.png", Rgba([0, 255, 0, 255]));
    fs::write(source.join("b_corrupt.png"), b"not an image")?;
    write_png(&source, "c.webp", Rgba([0, 0, 255, 255]));
    image::RgbImage::from_pixel(8, 8, Rgb([9, 9, 9])).save(source.join("d.jpg"))?;
    fs::write(source.join("notes.txt"), b"ignored")?;

    let report = FrameBatch::new(MockRemover::new(), &source, &dest).run()?;

    assert_eq!(report.total(), 4);
    assert_eq!(report.written(), 3);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 0);

    // outcomes follow the sorted enumeration order, not completion order
    let sources: Vec<&str> = report
        .outcomes()
        .iter()
        .map(|outcome| outcome.source.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(sources, vec!["a.png", "b_corrupt.png", "c.webp", "d.jpg"]);

    for name in ["a.png", "c.png", "d.png"] {
        assert!(dest.join(name).is_file(), "missing output {name}");
    }
    assert!(!dest.join("b_corrupt.png").exists());

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.ends_with("b_corrupt.png"));
    assert!(
        failures[0].1.contains("decode"),
        "unexpected reason: {}",
        failures[0].1
    );
    Ok(())
}

#[test]
fn test_existing_outputs_are_left_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = TempDir::new()?;
    let source = workspace.path().join("raw");
    let dest = workspace.path().join("cutout");
    fs::create_dir_all(&source)?;
    write_png(&source, "a.png", Rgba([0, 255, 0, 255]));
    write_png(&source, "b.png", Rgba([0, 0, 255, 255]));

    let batch = FrameBatch::new(MockRemover::new(), &source, &dest);
    let first = batch.run()?;
    assert_eq!(first.written(), 2);

    fs::write(dest.join("a.png"), b"sentinel")?;

    let second = batch.run()?;
    assert_eq!(second.skipped(), 2);
    assert_eq!(second.written(), 0);
    assert_eq!(fs::read(dest.join("a.png"))?, b"sentinel");
    Ok(())
}

#[test]
fn test_colliding_stems_keep_the_first_source() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = TempDir::new()?;
    let source = workspace.path().join("raw");
    let dest = workspace.path().join("cutout");
    fs::create_dir_all(&source)?;

    // hero.bmp sorts before hero.png; both map to cutout/hero.png
    image::RgbImage::from_pixel(8, 8, Rgb([200, 30, 30])).save(source.join("hero.bmp"))?;
    write_png(&source, "hero.png", Rgba([0, 255, 0, 255]));

    let report = FrameBatch::new(MockRemover::new(), &source, &dest).run()?;

    assert_eq!(report.total(), 2);
    assert_eq!(report.written(), 1);
    assert_eq!(report.skipped(), 1);

    let outcomes = report.outcomes();
    assert!(outcomes[0].source.ends_with("hero.bmp"));
    assert_eq!(outcomes[0].status, FrameStatus::Written(dest.join("hero.png")));
    assert!(outcomes[1].source.ends_with("hero.png"));
    assert_eq!(outcomes[1].status, FrameStatus::Skipped(dest.join("hero.png")));

    let written = image::open(dest.join("hero.png"))?.to_rgba8();
    assert_eq!(*written.get_pixel(4, 4), Rgba([200, 30, 30, 255]));
    assert_eq!(fs::read_dir(&dest)?.count(), 1);
    Ok(())
}

#[test]
fn test_total_failure_still_produces_a_report() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = TempDir::new()?;
    let source = workspace.path().join("raw");
    let dest = workspace.path().join("cutout");
    fs::create_dir_all(&source)?;
    write_png(&source, "a.png", Rgba([0, 255, 0, 255]));
    write_png(&source, "b.png", Rgba([0, 0, 255, 255]));

    let report = FrameBatch::new(FailingRemover::new(), &source, &dest).run()?;

    assert_eq!(report.total(), 2);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.written(), 0);
    for (_, reason) in report.failures() {
        assert!(reason.contains("refuses every frame"));
    }
    assert!(dest.is_dir());
    assert_eq!(fs::read_dir(&dest)?.count(), 0);
    Ok(())
}

#[test]
fn test_missing_source_aborts_before_any_output() {
    let workspace = TempDir::new().unwrap();
    let dest = workspace.path().join("cutout");

    let error = FrameBatch::new(MockRemover::new(), workspace.path().join("nowhere"), &dest)
        .run()
        .unwrap_err();

    assert!(matches!(error, FramekitError::MissingSourceDir { .. }));
    assert!(!dest.exists());
}

#[test]
fn test_frameless_source_aborts_before_any_output() {
    let workspace = TempDir::new().unwrap();
    let source = workspace.path().join("raw");
    let dest = workspace.path().join("cutout");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("notes.txt"), b"no frames here").unwrap();

    let error = FrameBatch::new(MockRemover::new(), &source, &dest)
        .run()
        .unwrap_err();

    assert!(matches!(error, FramekitError::NoFrames { .. }));
    assert!(!dest.exists());
}

#[test]
fn test_png_only_stage_ignores_other_formats() -> Result<(), Box<dyn std::error::Error>> {
    let workspace = TempDir::new()?;
    let source = workspace.path().join("outlined");
    let dest = workspace.path().join("package_input");
    fs::create_dir_all(&source)?;
    write_png(&source, "a.png", Rgba([0, 255, 0, 255]));
    image::RgbImage::from_pixel(8, 8, Rgb([9, 9, 9])).save(source.join("b.jpg"))?;

    let report = FrameBatch::new(MockRemover::new(), &source, &dest)
        .with_extensions(PNG_ONLY)
        .run()?;

    assert_eq!(report.total(), 1);
    assert!(dest.join("a.png").is_file());
    assert!(!dest.join("b.png").exists());
    Ok(())
}
