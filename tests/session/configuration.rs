//! `quiver.toml` driving session behaviour

use crate::common::*;
use quiver::{FloatErrorPolicy, CONFIG_FILE_NAME};

#[test]
fn test_config_file_drives_csv_delimiter() {
    init_tracing();
    let dir = TestDir::new();
    let config_path = dir.path(CONFIG_FILE_NAME);
    std::fs::write(&config_path, "[csv]\ndelimiter = \";\"\n").unwrap();

    let config = SessionConfig::from_file(&config_path).unwrap();
    let mut s = Session::with_config(config).unwrap();
    s.set("e", e());
    s.to_csv(dir.path("out")).unwrap();

    let text = std::fs::read_to_string(dir.path("out").join("e.csv")).unwrap();
    assert!(text.lines().next().unwrap().contains(';'));

    let reloaded = {
        let mut t = Session::with_config(s.config().clone()).unwrap();
        t.load(dir.path("out")).unwrap();
        t
    };
    assert!(reloaded.equals(&s));
}

#[test]
fn test_skip_invalid_sources_from_config() {
    let dir = TestDir::new();
    session_ef().to_csv(dir.path("out")).unwrap();
    std::fs::write(dir.path("out").join("zz.csv"), "").unwrap();

    assert!(Session::open(dir.path("out")).is_err());

    let config: SessionConfig = toml::from_str("skip_invalid_sources = true").unwrap();
    let mut s = Session::with_config(config).unwrap();
    s.load(dir.path("out")).unwrap();
    assert_eq!(s.keys().collect::<Vec<_>>(), vec!["e", "f"]);
}

#[test]
fn test_ignore_policy_still_defers_to_handler() {
    init_tracing();
    let config = SessionConfig {
        float_errors: FloatErrorPolicy::Ignore,
        ..SessionConfig::default()
    };
    let mut s = Session::with_config(config).unwrap();
    s.set("g", g());

    // ignored: nothing to observe beyond the result itself
    let out = &s / 0.0;
    assert!(out.get_array("g").unwrap().values()[0].is_infinite());

    let (handler, seen) = recording_handler();
    s.set_float_error_handler(handler);
    let _ = &s / 0.0;
    assert_eq!(seen.lock().unwrap().len(), 1);

    s.clear_float_error_handler();
    let _ = &s / 0.0;
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_derived_sessions_inherit_handler_and_config() {
    let (handler, seen) = recording_handler();
    let mut config = SessionConfig::default();
    config.bundle.compression_level = 19;
    let mut s = Session::with_config(config).unwrap();
    s.set("g", g());
    s.set("n", 1i64);
    s.set_float_error_handler(handler);

    let arrays = s.filter(Some("g"), None).unwrap();
    assert_eq!(arrays.config().bundle.compression_level, 19);
    let _ = &arrays / 0.0;
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TestDir::new();
    let path = dir.path(CONFIG_FILE_NAME);
    std::fs::write(&path, "[csv]\ndelimiter = \"ab\"\n").unwrap();
    assert!(matches!(SessionConfig::from_file(&path), Err(Error::Config(_))));

    SessionConfig::write_default_if_missing(&dir.path("fresh.toml")).unwrap();
    assert_eq!(
        SessionConfig::from_file(&dir.path("fresh.toml")).unwrap(),
        SessionConfig::default()
    );
}

#[test]
fn test_open_reads_config_next_to_source() {
    init_tracing();
    let dir = TestDir::new();
    let out = dir.path("out");
    let config: SessionConfig = toml::from_str("[csv]\ndelimiter = \";\"\n").unwrap();
    let mut s = Session::with_config(config).unwrap();
    s.set("e", e());
    s.to_csv(&out).unwrap();
    std::fs::write(out.join("zz.csv"), "").unwrap();

    // without a config file the empty zz.csv fails the whole load
    assert!(Session::open(&out).is_err());

    std::fs::write(
        out.join(CONFIG_FILE_NAME),
        "skip_invalid_sources = true\n[csv]\ndelimiter = \";\"\n",
    )
    .unwrap();
    let loaded = Session::open(&out).unwrap();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["e"]);
    assert!(loaded.get_array("e").unwrap().equals(&e(), false));
    assert!(loaded.config().skip_invalid_sources);
}
