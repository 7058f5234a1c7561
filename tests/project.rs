//! Project parsing and frame metadata loading tests.
//!
//! Fixture projects live in `tests/fixtures/`; malformed projects are built
//! inline.

use num_rational::Rational64;

use mpgg::{
    MemoryHost, MpggError, PictureFlags, PictureType, Project, ScanType, Session, SessionOptions,
    loader::load_plan,
};

const HEADER: &str = "DGIndexProjectFile16\n1\nVTS_01_1.VOB\n\n";
const SETTINGS: &str = "MPEG_Type=2\nAspect_Ratio=4:3\nPicture_Size=720x480\nFrame_Rate=25000 (25/1)\n\n";

fn load_message(result: Result<impl std::fmt::Debug, MpggError>) -> String {
    match result {
        Err(error @ MpggError::Load { .. }) => error.to_string(),
        other => panic!("expected a load error, got {other:?}"),
    }
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parse_pulldown_fixture() {
    let project = Project::load("tests/fixtures/pulldown.d2v").expect("Failed to load fixture");

    assert_eq!(project.version, "16");
    assert_eq!(project.videos.len(), 1);
    assert!(project.videos[0].ends_with("tests/fixtures/VTS_01_1.VOB"));
    assert_eq!(project.settings.mpeg_type, 2);
    assert_eq!(project.settings.aspect_ratio, "16:9");
    assert_eq!((project.settings.width, project.settings.height), (720, 480));
    assert_eq!(project.settings.frame_rate, Rational64::new(30000, 1001));
    assert_eq!(project.settings.raw.get("Stream_Type").map(String::as_str), Some("1"));
    assert_eq!(project.pictures.len(), 8);
}

#[test]
fn flag_bytes_decode() {
    let project = Project::load("tests/fixtures/pulldown.d2v").expect("Failed to load fixture");
    let first = project.pictures[0];
    assert!(first.progressive_frame && first.tff && first.rff);
    assert_eq!(first.picture_type, PictureType::I);
    assert_eq!(first.field_count(), 3);

    let second = project.pictures[1];
    assert!(second.progressive_frame && !second.tff && !second.rff);
    assert_eq!(second.picture_type, PictureType::B);
    assert_eq!(second.field_count(), 2);

    let interlaced = PictureFlags::from_byte(0x31, 2, 7);
    assert!(!interlaced.progressive_frame && !interlaced.tff && interlaced.rff);
    assert_eq!((interlaced.vob, interlaced.cell), (2, 7));
}

#[test]
fn data_stops_at_end_marker() {
    let text = format!("{HEADER}{SETTINGS}7 1 0 2048 0 1 1 12 32 ff 32 32\n7 1 0 4096 0 1 1 12\n");
    let project = Project::parse("inline.d2v", &text).expect("Failed to parse");
    assert_eq!(project.pictures.len(), 2);
    assert_eq!(project.settings.frame_rate, Rational64::from_integer(25));
}

#[test]
fn frame_rate_without_ratio_is_thousandths() {
    let settings = SETTINGS.replace("25000 (25/1)", "23976");
    let text = format!("{HEADER}{settings}7 1 0 2048 0 1 1 52 ff\n");
    let project = Project::parse("inline.d2v", &text).expect("Failed to parse");
    assert_eq!(project.settings.frame_rate, Rational64::new(23976, 1000));
}

#[test]
fn parse_rejects_foreign_file() {
    let message = load_message(Project::parse("movie.txt", "hello\n"));
    assert!(message.contains("line 1"), "{message}");
    assert!(message.contains("not a DGIndex project"), "{message}");
}

#[test]
fn parse_rejects_missing_setting() {
    let settings = SETTINGS.replace("Frame_Rate=25000 (25/1)\n", "");
    let text = format!("{HEADER}{settings}7 1 0 2048 0 1 1 52 ff\n");
    let message = load_message(Project::parse("inline.d2v", &text));
    assert!(message.contains("missing setting Frame_Rate"), "{message}");
}

#[test]
fn parse_rejects_bad_flag_byte() {
    let text = format!("{HEADER}{SETTINGS}7 1 0 2048 0 1 1 52 zz\n");
    let message = load_message(Project::parse("inline.d2v", &text));
    assert!(message.contains("line 10"), "{message}");
    assert!(message.contains("invalid flag byte"), "{message}");
}

#[test]
fn parse_rejects_short_data_line() {
    let text = format!("{HEADER}{SETTINGS}7 1 0 2048\n");
    let message = load_message(Project::parse("inline.d2v", &text));
    assert!(message.contains("expected at least 8 columns"), "{message}");
}

#[test]
fn parse_rejects_oversized_video_count() {
    let text = "DGIndexProjectFile16\n18446744073709551615\na.m2v\n";
    let message = load_message(Project::parse("huge.d2v", text));
    assert!(message.contains("line 2"), "{message}");
    assert!(message.contains("video file list is truncated"), "{message}");
}

#[test]
fn parse_rejects_implausible_frame_rates() {
    for rate in ["1 (1/9223372036854775807)", "25000 (-25/1)", "25000 (25/0)", "0", "-23976"] {
        let settings = SETTINGS.replace("25000 (25/1)", rate);
        let text = format!("{HEADER}{settings}7 1 0 2048 0 1 1 52 ff\n");
        let message = load_message(Project::parse("inline.d2v", &text));
        assert!(message.contains("invalid Frame_Rate"), "{rate}: {message}");
    }
}

#[test]
fn load_missing_file() {
    let message = load_message(Project::load("tests/fixtures/does_not_exist.d2v"));
    assert!(message.contains("does_not_exist.d2v"), "{message}");
}

// ── Loader ───────────────────────────────────────────────────────

#[test]
fn loader_builds_one_record_per_picture() {
    let project = Project::load("tests/fixtures/mixed.d2v").expect("Failed to load fixture");
    let plan = load_plan(&project, 16).expect("Failed to build plan");
    let field = Rational64::new(1001, 60000);

    assert_eq!(plan.len(), 16);
    assert_eq!(plan.source_count(), 16);
    assert_eq!(plan.records()[0].scan, ScanType::Progressive);
    assert_eq!(plan.records()[0].duration, field * 3);
    assert_eq!(plan.records()[1].duration, field * 2);
    assert_eq!(plan.records()[8].scan, ScanType::Interlaced);
    assert_eq!(plan.records()[8].duration, field * 3);
    assert_eq!(plan.records()[15].scan, ScanType::Progressive);
    // 20 pulldown fields, 10 interlaced fields, 8 progressive fields.
    assert_eq!(plan.total_duration(), field * 38);
}

#[test]
fn loader_rejects_frame_count_mismatch() {
    let project = Project::load("tests/fixtures/interlaced.d2v").expect("Failed to load fixture");
    let message = load_message(load_plan(&project, 9));
    assert!(message.contains("indexes 10 pictures"), "{message}");
    assert!(message.contains("source clip has 9 frames"), "{message}");
}

#[test]
fn loader_rejects_empty_project() {
    let project = Project::from_pictures("empty.d2v", Rational64::new(30000, 1001), Vec::new());
    let message = load_message(load_plan(&project, 0));
    assert!(message.contains("empty.d2v"), "{message}");
    assert!(message.contains("does not index any pictures"), "{message}");
}

#[test]
fn loader_rejects_zero_frame_rate() {
    let project = Project::from_pictures(
        "zero.d2v",
        Rational64::from_integer(0),
        vec![PictureFlags::new(true, true, false)],
    );
    let message = load_message(load_plan(&project, 1));
    assert!(message.contains("invalid frame rate"), "{message}");
}

#[test]
fn loader_rejects_implausible_frame_rate() {
    let project = Project::from_pictures(
        "tiny.d2v",
        Rational64::new(1, i64::MAX),
        vec![PictureFlags::new(true, true, true), PictureFlags::new(false, true, false)],
    );
    let message = load_message(load_plan(&project, 2));
    assert!(message.contains("invalid frame rate"), "{message}");

    let result = Session::from_project(MemoryHost::new(), project, SessionOptions::new());
    assert!(matches!(result, Err(MpggError::Load { .. })), "{result:?}");
}
