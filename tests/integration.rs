use std::path::Path;

use difference_matting::{
    extract_alpha, find_pairs, AlphaCombine, Error, MatteEngine, MatteOptions,
};
use image::{DynamicImage, Rgb, RgbImage, Rgba};

/// Composite a subject with per-pixel opacity over a flat background.
fn render(subject: &[(u32, u32, [u8; 3], f32)], size: u32, bg: u8) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, Rgb([bg, bg, bg]));
    for &(x, y, colour, alpha) in subject {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = colour.map(|s| (alpha * f32::from(s) + (1.0 - alpha) * f32::from(bg)).round() as u8);
        img.put_pixel(x, y, Rgb(px));
    }
    img
}

fn subject() -> Vec<(u32, u32, [u8; 3], f32)> {
    vec![
        (2, 2, [50, 80, 120], 1.0),
        (3, 2, [100, 100, 100], 0.5),
        (4, 2, [220, 30, 60], 0.75),
    ]
}

#[test]
fn recovers_composited_subject() {
    let white = render(&subject(), 8, 255);
    let black = render(&subject(), 8, 0);
    let out = extract_alpha(&white, &black, AlphaCombine::Mean, 0.01).unwrap();

    assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    assert_eq!(*out.get_pixel(2, 2), Rgba([50, 80, 120, 255]));

    let half = out.get_pixel(3, 2);
    assert!((127..=128).contains(&half[3]));
    assert!((99..=101).contains(&half[0]));

    let three_quarters = out.get_pixel(4, 2);
    assert!((190..=192).contains(&three_quarters[3]));
    assert!((218..=222).contains(&three_quarters[0]));
}

#[test]
fn engine_accepts_rgba_inputs() {
    let white = DynamicImage::ImageRgb8(render(&subject(), 8, 255)).to_rgba8();
    let black = DynamicImage::ImageRgb8(render(&subject(), 8, 0)).to_rgba8();

    let engine = MatteEngine::default();
    let out = engine
        .matte(
            &DynamicImage::ImageRgba8(white),
            &DynamicImage::ImageRgba8(black),
        )
        .unwrap();
    assert_eq!(*out.get_pixel(2, 2), Rgba([50, 80, 120, 255]));
}

#[test]
fn mismatched_dimensions_fail_without_output() {
    let engine = MatteEngine::default();
    let white = RgbImage::new(8, 8);
    let black = RgbImage::new(8, 9);
    let err = engine.matte_rgb(&white, &black).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn matte_bytes_is_deterministic() {
    let mut white_png = Vec::new();
    let mut black_png = Vec::new();
    render(&subject(), 8, 255)
        .write_to(&mut std::io::Cursor::new(&mut white_png), image::ImageFormat::Png)
        .unwrap();
    render(&subject(), 8, 0)
        .write_to(&mut std::io::Cursor::new(&mut black_png), image::ImageFormat::Png)
        .unwrap();

    let engine = MatteEngine::new(MatteOptions {
        verify_backgrounds: true,
        ..MatteOptions::default()
    });
    let first = engine.matte_bytes(&white_png, &black_png).unwrap();
    let second = engine.matte_bytes(&white_png, &black_png).unwrap();
    assert_eq!(first, second);

    let decoded = image::load_from_memory(&first).unwrap().to_rgba8();
    assert_eq!(*decoded.get_pixel(2, 2), Rgba([50, 80, 120, 255]));
}

#[test]
fn process_pair_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let white_path = dir.path().join("cat_white.png");
    let black_path = dir.path().join("cat_black.png");
    render(&subject(), 8, 255).save(&white_path).unwrap();
    render(&subject(), 8, 0).save(&black_path).unwrap();

    let output = dir.path().join("nested").join("cat.png");
    let result = MatteEngine::default().process_pair(&white_path, &black_path, &output);

    assert!(result.success, "{}", result.message);
    assert_eq!(result.output.as_deref(), Some(output.as_path()));
    assert!(result.transparent_fraction > 0.9);

    let saved = image::open(&output).unwrap().to_rgba8();
    assert_eq!(saved.get_pixel(0, 0)[3], 0);
}

#[test]
fn process_pair_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = MatteEngine::default().process_pair(
        &dir.path().join("missing_white.png"),
        &dir.path().join("missing_black.png"),
        &dir.path().join("out.png"),
    );
    assert!(!result.success);
    assert!(result.message.contains("missing_white.png"));
}

#[test]
fn process_pair_names_file_failing_background_check() {
    let dir = tempfile::tempdir().unwrap();
    let white_path = dir.path().join("dog_white.png");
    let black_path = dir.path().join("dog_black.png");
    render(&subject(), 8, 255).save(&white_path).unwrap();
    render(&subject(), 8, 128).save(&black_path).unwrap();

    let engine = MatteEngine::new(MatteOptions {
        verify_backgrounds: true,
        ..MatteOptions::default()
    });
    let result = engine.process_pair(&white_path, &black_path, &dir.path().join("dog.png"));
    assert!(!result.success);
    assert!(result.message.contains("dog_black.png"), "{}", result.message);
    assert!(!dir.path().join("dog.png").exists());
}

#[test]
fn directory_pairs_and_orphans() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let save = |name: &str, bg: u8| {
        render(&subject(), 8, bg)
            .save(input.path().join(name))
            .unwrap();
    };
    save("a_white.png", 255);
    save("a_black.png", 0);
    save("b_white.png", 255);
    save("b_black.bmp", 0);
    save("c_white.png", 255);
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let pairs = find_pairs(input.path()).unwrap();
    let stems: Vec<_> = pairs.iter().map(|p| p.stem.as_str()).collect();
    assert_eq!(stems, ["a", "b", "c"]);
    assert!(pairs[2].black.is_none());

    let results = MatteEngine::default().process_directory(input.path(), output.path());
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.success).count(), 2);
    assert!(output.path().join("a_transparent.png").exists());
    assert!(output.path().join("b_transparent.png").exists());

    let orphan = results
        .iter()
        .find(|r| r.path.ends_with(Path::new("c_white.png")))
        .unwrap();
    assert!(!orphan.success);
}

#[test]
fn directory_read_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let results = MatteEngine::default()
        .process_directory(&dir.path().join("absent"), &dir.path().join("out"));
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
}

#[test]
fn directory_rejects_ambiguous_stems() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let save = |name: &str, bg: u8| {
        render(&subject(), 8, bg)
            .save(input.path().join(name))
            .unwrap();
    };
    save("a_white.png", 255);
    save("a_white.bmp", 255);
    save("a_black.png", 0);
    save("b_white.png", 255);
    save("b_black.png", 0);
    save("b_black.bmp", 0);
    save("c_white.png", 255);
    save("c_black.png", 0);

    let pairs = find_pairs(input.path()).unwrap();
    assert_eq!(pairs.len(), 3);
    // Name order: .bmp sorts before .png.
    assert!(pairs[0].white.ends_with("a_white.bmp"));
    assert_eq!(pairs[0].conflicts.len(), 1);
    assert!(pairs[0].conflicts[0].ends_with("a_white.png"));
    assert_eq!(pairs[1].black.as_deref(), Some(input.path().join("b_black.bmp").as_path()));
    assert!(pairs[1].conflicts[0].ends_with("b_black.png"));
    assert!(pairs[2].conflicts.is_empty());

    let results = MatteEngine::default().process_directory(input.path(), output.path());
    assert_eq!(results.len(), 3);
    let successes: Vec<_> = results.iter().filter(|r| r.success).collect();
    assert_eq!(successes.len(), 1);
    assert!(successes[0].path.ends_with("c_white.png"));

    let ambiguous = results.iter().find(|r| r.path.ends_with("a_white.bmp")).unwrap();
    assert!(ambiguous.message.contains("a_white.png"), "{}", ambiguous.message);

    let written = std::fs::read_dir(output.path()).unwrap().count();
    assert_eq!(written, 1);
    assert!(!output.path().join("a_transparent.png").exists());
    assert!(!output.path().join("b_transparent.png").exists());
}
