//! Source analysis tests: pulldown detection, VFR detection and the
//! standard/aspect helpers.

use num_rational::Rational64;

use mpgg::{
    ColorRange, PictureFlags, Project, SourceSummary,
    analysis::{
        is_variable_frame_rate, pixel_aspect_ratio, pulldown_cycle, pulldown_pattern, standard,
        storage_aspect_ratio,
    },
};

fn load(path: &str) -> Project {
    Project::load(path).expect("Failed to load fixture")
}

// ── Pulldown ─────────────────────────────────────────────────────

#[test]
fn detects_two_three_pulldown() {
    let project = load("tests/fixtures/pulldown.d2v");
    assert_eq!(pulldown_cycle(&project.pictures), Some(5));
    assert_eq!(pulldown_pattern(5), "2:3");
}

#[test]
fn pulldown_patterns() {
    assert_eq!(pulldown_pattern(4), "2:2");
    assert_eq!(pulldown_pattern(3), "3");
    assert_eq!(pulldown_pattern(7), "2:2:3");
}

#[test]
fn no_pulldown_without_repeated_fields() {
    let project = load("tests/fixtures/interlaced.d2v");
    assert_eq!(pulldown_cycle(&project.pictures), None);
}

#[test]
fn single_repeat_per_section_does_not_vote() {
    let pictures = vec![
        PictureFlags::new(true, true, true),
        PictureFlags::new(true, false, false),
        PictureFlags::new(false, true, false),
        PictureFlags::new(true, true, true),
    ];
    assert_eq!(pulldown_cycle(&pictures), None);
}

// ── VFR ──────────────────────────────────────────────────────────

#[test]
fn variable_frame_rate_detection() {
    assert!(is_variable_frame_rate(&load("tests/fixtures/mixed.d2v").pictures));
    assert!(!is_variable_frame_rate(&load("tests/fixtures/pulldown.d2v").pictures));
    assert!(!is_variable_frame_rate(&load("tests/fixtures/interlaced.d2v").pictures));
}

// ── Standards and aspect ratios ──────────────────────────────────

#[test]
fn standards_by_frame_rate() {
    assert_eq!(standard(Rational64::new(30000, 1001)), "NTSC");
    assert_eq!(standard(Rational64::new(24000, 1001)), "NTSC (FILM)");
    assert_eq!(standard(Rational64::from_integer(25)), "PAL");
    assert_eq!(standard(Rational64::new(50, 1)), "PALi");
    assert_eq!(standard(Rational64::new(48, 2)), "FILM");
    assert_eq!(standard(Rational64::from_integer(15)), "?");
}

#[test]
fn aspect_ratios() {
    assert_eq!(storage_aspect_ratio(720, 480), "3:2");
    assert_eq!(storage_aspect_ratio(720, 576), "5:4");
    assert_eq!(pixel_aspect_ratio(720, 480, 4, 3), "8:9");
    assert_eq!(pixel_aspect_ratio(720, 480, 16, 9), "32:27");
    assert_eq!(pixel_aspect_ratio(720, 576, 16, 9), "64:45");
}

// ── Summary ──────────────────────────────────────────────────────

#[test]
fn summary_of_mixed_source() {
    let summary = SourceSummary::from_project(&load("tests/fixtures/mixed.d2v"));

    assert_eq!(summary.total_frames, 16);
    assert_eq!(summary.progressive_frames, 12);
    assert_eq!(summary.interlaced_frames, 4);
    assert_eq!(summary.pulldown, Some(5));
    assert!(summary.variable_frame_rate);
    assert_eq!(summary.standard, "NTSC");
    assert_eq!(summary.storage_aspect_ratio, "3:2");
    assert_eq!(summary.pixel_aspect_ratio, "32:27");
    assert_eq!(summary.color_range, ColorRange::Limited);
    assert!((summary.progressive_percentage() - 75.0).abs() < 1e-9);
}

#[test]
fn summary_display() {
    let text = SourceSummary::from_project(&load("tests/fixtures/pulldown.d2v")).to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Progressive: 100.00% (8) w/ Pulldown 2:3 (Cycle: 5)");
    assert_eq!(lines[1], "Interlaced:  00.00% (0)");
    assert_eq!(lines[2], "VFR? false  DAR: 16:9  SAR: 3:2  PAR: 32:27");
    assert_eq!(lines[3], "NTSC @ 30000/1001 fps, limited range");
}

#[test]
fn summary_with_unreadable_aspect_ratio() {
    let mut project = load("tests/fixtures/interlaced.d2v");
    project.settings.aspect_ratio = "anamorphic".to_string();
    let summary = SourceSummary::from_project(&project);
    assert_eq!(summary.pixel_aspect_ratio, "?");
    assert!(summary.to_string().contains("No Pulldown"));
}
