//! Indexer and demuxer tests.
//!
//! These never run DGIndex or mkvextract; they point the tools at paths that
//! do not exist and check that existing projects are picked up instead.

use std::{fs, path::Path};

use mpgg::{
    Demuxer, DgIndex, Indexer, MemoryHost, MkvExtract, MpggError, Session, SessionOptions,
    indexer::{index_with_options, is_container, is_project, project_path},
};

const MISSING_TOOL: &str = "/nonexistent/bin/tool";

fn fixture_text(name: &str) -> String {
    fs::read_to_string(Path::new("tests/fixtures").join(name)).expect("Failed to read fixture")
}

#[test]
fn recognises_extensions() {
    assert!(is_project(Path::new("VTS_01_1.VOB.d2v")));
    assert!(is_project(Path::new("movie.D2V")));
    assert!(!is_project(Path::new("movie.vob")));
    assert!(is_container(Path::new("movie.mkv")));
    assert!(is_container(Path::new("movie.MK3D")));
    assert!(!is_container(Path::new("movie.m2v")));
    assert!(!is_container(Path::new("movie")));
    assert_eq!(project_path(Path::new("dvd/VTS_01_1.VOB")), Path::new("dvd/VTS_01_1.VOB.d2v"));
}

#[test]
fn project_input_is_loaded_directly() {
    let project = DgIndex::new(MISSING_TOOL)
        .index(Path::new("tests/fixtures/interlaced.d2v"))
        .expect("Failed to load project");
    assert_eq!(project.pictures.len(), 10);
}

#[test]
fn existing_project_is_reused() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("VTS_01_1.VOB");
    fs::write(&input, b"\x00\x00\x01\xba").expect("Failed to write input");
    fs::write(project_path(&input), fixture_text("mixed.d2v")).expect("Failed to write project");

    let project = DgIndex::new(MISSING_TOOL).index(&input).expect("Failed to index");
    assert_eq!(project.pictures.len(), 16);
    assert_eq!(project.videos, vec![temporary_directory.path().join("VTS_01_1.VOB")]);
}

#[test]
fn reindex_runs_the_tool() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("VTS_01_1.VOB");
    fs::write(&input, b"\x00\x00\x01\xba").expect("Failed to write input");
    fs::write(project_path(&input), fixture_text("mixed.d2v")).expect("Failed to write project");

    let result = DgIndex::new(MISSING_TOOL).with_reuse(false).index(&input);
    match result {
        Err(MpggError::Load { path, reason }) => {
            assert_eq!(path, input);
            assert!(reason.contains("could not run"), "{reason}");
        }
        other => panic!("expected a load error, got {other:?}"),
    }
}

#[test]
fn missing_input_is_load_error() {
    let result = DgIndex::new(MISSING_TOOL).index(Path::new("no/such/VTS_01_1.VOB"));
    assert!(matches!(result, Err(MpggError::Load { .. })), "{result:?}");
}

#[test]
fn missing_demuxer_is_demux_error() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("movie.mkv");
    fs::write(&input, b"\x1a\x45\xdf\xa3").expect("Failed to write input");

    let result = MkvExtract::new(MISSING_TOOL).with_track(1).demux(&input);
    match result {
        Err(error @ MpggError::Demux { .. }) => {
            assert!(error.to_string().contains("movie.mkv"), "{error}");
        }
        other => panic!("expected a demux error, got {other:?}"),
    }
    assert_eq!(MkvExtract::output_path(&input), temporary_directory.path().join("movie.m2v"));
}

#[test]
fn containers_go_through_the_demuxer() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("movie.mkv");
    fs::write(&input, b"\x1a\x45\xdf\xa3").expect("Failed to write input");

    let options = SessionOptions::new().with_mkvextract_path(MISSING_TOOL);
    let result = index_with_options(&input, &options);
    assert!(matches!(result, Err(MpggError::Demux { .. })), "{result:?}");
}

#[test]
fn session_open_uses_configured_tools() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let input = temporary_directory.path().join("VTS_01_1.VOB");
    fs::write(&input, b"\x00\x00\x01\xba").expect("Failed to write input");

    let options = SessionOptions::new().with_dgindex_path(MISSING_TOOL);
    let result = Session::open(MemoryHost::new(), &input, options.clone());
    assert!(matches!(result, Err(MpggError::Load { .. })), "{result:?}");

    fs::write(project_path(&input), fixture_text("interlaced.d2v")).expect("Failed to write project");
    let session = Session::open(MemoryHost::new(), &input, options).expect("Failed to open session");
    assert_eq!(session.plan().len(), 10);
}
