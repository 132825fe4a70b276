use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use grabcut_rs::input::{Command, Event, PointerEvent};
use grabcut_rs::mocks::{MockSegmenter, ScriptedFrontend};
use grabcut_rs::{Annotator, Config, GrabCut, InitMode, Label, Rect, Summary};

fn drag(from: (u32, u32), to: (u32, u32)) -> Vec<Vec<Event>> {
    vec![
        vec![Event::Pointer(PointerEvent::Down { x: from.0, y: from.1 })],
        vec![Event::Pointer(PointerEvent::Move { x: to.0, y: to.1 })],
        vec![Event::Pointer(PointerEvent::Up { x: to.0, y: to.1 })],
    ]
}

fn key(command: Command) -> Vec<Event> {
    vec![Event::Key(command)]
}

fn write_image(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]))
        .save(path)
        .unwrap();
}

fn config(input: &Path, results: &Path) -> Config {
    let mut config = Config::for_folder(input);
    config.results_dir = results.to_path_buf();
    config
}

#[test]
fn test_saves_one_file_per_image_with_source_name() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("a.png"), 20, 20);
    write_image(&input.join("b.png"), 16, 12);

    let mut first = drag((2, 2), (12, 12));
    first.push(key(Command::Segment));
    first.push(key(Command::Save));
    let mut frontend = ScriptedFrontend::new()
        .with_session(first)
        .with_session(vec![key(Command::Save)]);

    let mut annotator = Annotator::new(MockSegmenter::new(), config(&input, &results));
    let summary = annotator.process_directory(&mut frontend).unwrap();

    assert_eq!(
        summary,
        Summary {
            saved: 2,
            skipped: 0,
            abandoned: 0,
            stopped_early: false
        }
    );
    let mut saved: Vec<_> = fs::read_dir(&results)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    saved.sort();
    assert_eq!(saved, vec!["a.png", "b.png"]);

    // the first cut-out keeps the rectangle, the second was saved blank
    let a = image::open(results.join("a.png")).unwrap().into_rgb8();
    assert_eq!(a.get_pixel(5, 5), &Rgb([5, 5, 200]));
    assert_eq!(a.get_pixel(15, 15), &Rgb([0, 0, 0]));
    let b = image::open(results.join("b.png")).unwrap().into_rgb8();
    assert_eq!(b.dimensions(), (16, 12));
    assert!(b.pixels().all(|p| *p == Rgb([0, 0, 0])));

    assert_eq!(
        annotator.segmenter().calls,
        vec![(Rect::new(2, 2, 10, 10), InitMode::InitWithRect)]
    );
}

#[test]
fn test_non_image_entries_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(input.join("subdir")).unwrap();
    fs::write(input.join(".hidden"), b"junk").unwrap();
    fs::write(input.join("broken.png"), b"not really a png").unwrap();
    fs::write(input.join("readme.txt"), b"hello").unwrap();
    write_image(&input.join("z.png"), 8, 8);

    let mut frontend = ScriptedFrontend::new().with_session(vec![key(Command::Save)]);
    let mut annotator = Annotator::new(MockSegmenter::new(), config(&input, &results));
    let summary = annotator.process_directory(&mut frontend).unwrap();

    assert_eq!(summary.skipped, 4);
    assert_eq!(summary.saved, 1);
    assert_eq!(frontend.opened, vec![("z.png".to_string(), 8, 8)]);
    assert!(results.join("z.png").is_file());
}

#[test]
fn test_images_with_wrong_or_missing_extension_are_annotated() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    let png = temp_dir.path().join("source.png");
    write_image(&png, 12, 9);
    fs::copy(&png, input.join("noext")).unwrap();
    fs::copy(&png, input.join("photo.jpg")).unwrap();

    let mut frontend = ScriptedFrontend::new()
        .with_session(vec![key(Command::Save)])
        .with_session(vec![key(Command::Save)]);
    let mut annotator = Annotator::new(MockSegmenter::new(), config(&input, &results));
    let summary = annotator.process_directory(&mut frontend).unwrap();

    assert_eq!(summary.saved, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        frontend.opened,
        vec![
            ("noext".to_string(), 12, 9),
            ("photo.jpg".to_string(), 12, 9)
        ]
    );
    assert!(results.join("noext").is_file());
    assert!(results.join("photo.jpg").is_file());
}

#[test]
fn test_escape_moves_on_without_saving() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("a.png"), 10, 10);
    write_image(&input.join("b.png"), 10, 10);

    let mut frontend = ScriptedFrontend::new()
        .with_session(vec![key(Command::Skip)])
        .with_session(vec![key(Command::Save)]);
    let mut annotator = Annotator::new(MockSegmenter::new(), config(&input, &results));
    let summary = annotator.process_directory(&mut frontend).unwrap();

    assert_eq!(summary.abandoned, 1);
    assert_eq!(summary.saved, 1);
    assert!(!results.join("a.png").exists());
    assert!(results.join("b.png").is_file());
}

#[test]
fn test_closing_window_stops_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("a.png"), 10, 10);
    write_image(&input.join("b.png"), 10, 10);

    let mut frontend = ScriptedFrontend::new().with_session(vec![vec![Event::Closed]]);
    let mut annotator = Annotator::new(MockSegmenter::new(), config(&input, &results));
    let summary = annotator.process_directory(&mut frontend).unwrap();

    assert!(summary.stopped_early);
    assert_eq!(frontend.opened.len(), 1);
    assert!(!results.exists());
}

#[test]
fn test_each_image_starts_from_a_fresh_session() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("a.png"), 10, 10);
    write_image(&input.join("b.png"), 10, 10);

    let mut first = drag((1, 1), (8, 8));
    first.push(key(Command::Skip));
    // no rectangle in the second session, so 'n' must not reach the segmenter
    let second = vec![key(Command::Segment), key(Command::Save)];
    let mut frontend = ScriptedFrontend::new().with_session(first).with_session(second);
    let mut annotator = Annotator::new(MockSegmenter::new(), config(&input, &results));
    annotator.process_directory(&mut frontend).unwrap();

    assert!(annotator.segmenter().calls.is_empty());
}

#[test]
fn test_resize_applies_before_annotation() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("wide.png"), 40, 10);

    let mut config = config(&input, &results);
    config.width = Some(20);
    config.height = Some(15);
    let mut frontend = ScriptedFrontend::new().with_session(vec![key(Command::Save)]);
    let mut annotator = Annotator::new(MockSegmenter::new(), config);
    annotator.process_directory(&mut frontend).unwrap();

    assert_eq!(frontend.opened, vec![("wide.png".to_string(), 20, 15)]);
    let saved = image::open(results.join("wide.png")).unwrap();
    assert_eq!((saved.width(), saved.height()), (20, 15));
}

#[test]
fn test_missing_input_folder_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut frontend = ScriptedFrontend::new();
    let mut annotator = Annotator::new(
        MockSegmenter::new(),
        config(&temp_dir.path().join("nope"), temp_dir.path()),
    );
    assert!(annotator.process_directory(&mut frontend).is_err());
}

#[test]
fn test_grabcut_end_to_end_with_touch_up() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    let results = temp_dir.path().join("results");
    fs::create_dir_all(&input).unwrap();
    // dark square on a bright field
    RgbImage::from_fn(32, 32, |x, y| {
        if (10..22).contains(&x) && (10..22).contains(&y) {
            Rgb([20, 30, 40])
        } else {
            Rgb([230, 220, 210])
        }
    })
    .save(input.join("square.png"))
    .unwrap();

    let mut script = drag((4, 4), (28, 28));
    script.push(key(Command::Segment));
    script.push(key(Command::SelectLabel(Label::Background)));
    script.push(vec![Event::Pointer(PointerEvent::Down { x: 6, y: 6 })]);
    script.push(vec![Event::Pointer(PointerEvent::Up { x: 6, y: 6 })]);
    script.push(key(Command::Segment));
    script.push(key(Command::Save));

    let mut frontend = ScriptedFrontend::new().with_session(script);
    let mut annotator = Annotator::new(GrabCut::new(2), config(&input, &results));
    let summary = annotator.process_directory(&mut frontend).unwrap();
    assert_eq!(summary.saved, 1);

    let out = image::open(results.join("square.png")).unwrap().into_rgb8();
    assert_eq!(out.get_pixel(16, 16), &Rgb([20, 30, 40]));
    assert_eq!(out.get_pixel(6, 6), &Rgb([0, 0, 0]));
    assert_eq!(out.get_pixel(1, 1), &Rgb([0, 0, 0]));
    assert_eq!(out.get_pixel(25, 25), &Rgb([0, 0, 0]));
}
