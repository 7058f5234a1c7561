//! SessionOptions builder tests.

use mpgg::SessionOptions;

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn options_defaults() {
    let options = SessionOptions::new();
    let debug = format!("{options:?}");
    assert!(debug.contains("SessionOptions"));
    assert!(debug.contains("verbose: false"));
    assert!(debug.contains("auto_floor: true"));
    assert!(debug.contains("recovery_required: false"));
    assert!(debug.contains(r#"dgindex: "DGIndex""#));
    assert!(debug.contains(r#"mkvextract: "mkvextract""#));
    assert!(debug.contains("reuse_index: true"));
    assert!(!options.verbose());
}

#[test]
fn default_matches_new() {
    assert_eq!(
        format!("{:?}", SessionOptions::default()),
        format!("{:?}", SessionOptions::new())
    );
}

// ── Builder ──────────────────────────────────────────────────────

#[test]
fn options_builder_chain() {
    let options = SessionOptions::new()
        .with_verbose(true)
        .with_auto_floor(false)
        .with_recovery_required(true)
        .with_dgindex_path("/opt/dgindex/DGIndex")
        .with_mkvextract_path("/usr/local/bin/mkvextract")
        .with_reuse_index(false);
    let debug = format!("{options:?}");

    assert!(options.verbose());
    assert!(debug.contains("auto_floor: false"));
    assert!(debug.contains("recovery_required: true"));
    assert!(debug.contains(r#"dgindex: "/opt/dgindex/DGIndex""#));
    assert!(debug.contains(r#"mkvextract: "/usr/local/bin/mkvextract""#));
    assert!(debug.contains("reuse_index: false"));
}

#[test]
fn later_settings_win() {
    let options = SessionOptions::new().with_verbose(true).with_verbose(false);
    assert!(!options.verbose());
}
