//! Round trips through the bundle, binary and csv engines

use crate::common::*;

fn arrays_only(s: &Session) -> Session {
    s.filter(None, Some(ValueKind::Array)).unwrap()
}

#[test]
fn test_bundle_round_trip_preserves_order_and_titles() {
    init_tracing();
    let dir = TestDir::new();
    let s = mixed_session();
    s.save(dir.path("data.h5")).unwrap();

    let loaded = Session::open(dir.path("data.h5")).unwrap();
    assert_same_session(&loaded, &arrays_only(&s));
    assert_eq!(loaded.get_array("g").unwrap().title(), "quarterly g");
    assert_eq!(loaded.get_array("e").unwrap().dtype(), Dtype::Int);
}

#[test]
fn test_binary_round_trip() {
    let dir = TestDir::new();
    let s = mixed_session();
    s.to_binary(dir.path("data.pkl")).unwrap();

    let loaded = Session::open(dir.path("data.pkl")).unwrap();
    assert_same_session(&loaded, &arrays_only(&s));
}

#[test]
fn test_csv_round_trip_is_alphabetical() {
    let dir = TestDir::new();
    let s = mixed_session();
    s.to_csv(dir.path("csv")).unwrap();

    let loaded = Session::open(dir.path("csv")).unwrap();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["e", "f", "g"]);
    assert!(loaded.equals(&arrays_only(&s)));
}

#[test]
fn test_csv_glob_source() {
    let dir = TestDir::new();
    session_ef().to_csv(dir.path("csv")).unwrap();
    Session::from_pairs([("g", g())]).save_with(
        dir.path("csv"),
        &SaveOptions::new().engine("csv").overwrite(false),
    )
    .unwrap();

    let pattern = dir.path("csv").join("[ef].csv");
    let loaded = Session::open(&pattern).unwrap();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["e", "f"]);
}

#[test]
fn test_update_in_place_keeps_existing_entries() {
    let dir = TestDir::new();
    let path = dir.path("data.bundle");
    session_ef().save(&path).unwrap();

    let replacement = g();
    Session::from_pairs([("f", replacement.clone()), ("new", replacement.clone())])
        .save_with(&path, &SaveOptions::new().overwrite(false))
        .unwrap();

    let loaded = Session::open(&path).unwrap();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["e", "f", "new"]);
    assert!(loaded.get_array("f").unwrap().equals(&replacement, true));

    // overwrite replaces the whole file
    session_ef().save(&path).unwrap();
    assert_eq!(Session::open(&path).unwrap().len(), 2);
}

#[test]
fn test_load_selected_names_into_existing_session() {
    let dir = TestDir::new();
    let path = dir.path("data.h5");
    mixed_session().save(&path).unwrap();

    let mut s = Session::from_pairs([("keep", 1i64)]);
    s.load_with(Some(path.as_path()), &LoadOptions::new().names(["f", "g"]))
        .unwrap();
    assert_eq!(s.keys().collect::<Vec<_>>(), vec!["keep", "g", "f"]);

    let err = s
        .load_with(Some(path.as_path()), &LoadOptions::new().names(["absent"]))
        .unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));

    s.load_with(
        Some(path.as_path()),
        &LoadOptions::new().names(["absent", "e"]).skip_invalid(true),
    )
    .unwrap();
    assert!(s.contains("e"));
}

#[test]
fn test_engine_override_ignores_extension() {
    let dir = TestDir::new();
    let path = dir.path("data.dat");
    session_ef()
        .save_with(&path, &SaveOptions::new().engine("binary"))
        .unwrap();

    let mut s = Session::new();
    s.load_with(Some(path.as_path()), &LoadOptions::new().engine("binary"))
        .unwrap();
    assert_same_session(&s, &session_ef());

    // without an override the extension is unknown
    assert!(matches!(
        Session::open(&path),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_corrupt_file_reports_engine() {
    let dir = TestDir::new();
    let path = dir.path("data.pkl");
    std::fs::write(&path, b"QVRB garbage").unwrap();
    match Session::open(&path) {
        Err(Error::Persistence { engine, .. }) => assert_eq!(engine, "binary"),
        other => panic!("expected persistence error, got {:?}", other),
    }
}

#[test]
fn test_only_arrays_are_written() {
    let dir = TestDir::new();
    let mut s = Session::new();
    s.set("note", "text");
    s.set("n", 1i64);
    s.save(dir.path("empty.h5")).unwrap();
    assert!(Session::open(dir.path("empty.h5")).unwrap().is_empty());
}

#[test]
fn test_csv_save_keeps_unrelated_files() {
    let dir = TestDir::new();
    let out = dir.path("data");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("notes.csv"), "a,b\n").unwrap();

    Session::from_pairs([("e", e())]).save(&out).unwrap();
    assert!(out.join("notes.csv").exists());
    assert!(out.join("e.csv").exists());

    session_ef().to_csv(&out).unwrap();
    assert_eq!(std::fs::read_to_string(out.join("notes.csv")).unwrap(), "a,b\n");
}

#[test]
fn test_csv_entry_names_cannot_leave_directory() {
    let dir = TestDir::new();
    let out = dir.path("nested").join("data");
    let mut s = session_ef();
    s.set("../../escaped", e());

    match s.save(&out) {
        Err(Error::Persistence { engine, .. }) => assert_eq!(engine, "csv"),
        other => panic!("expected persistence error, got {:?}", other),
    }
    assert!(!dir.path("escaped.csv").exists());
    assert!(!out.join("e.csv").exists());
}

#[test]
fn test_excel_round_trip() {
    init_tracing();
    let dir = TestDir::new();
    let s = mixed_session();
    s.to_excel(dir.path("data.xlsx")).unwrap();

    let loaded = Session::open(dir.path("data.xlsx")).unwrap();
    assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["e", "g", "f"]);
    assert!(loaded.equals(&arrays_only(&s)));
    assert_eq!(loaded.get_array("e").unwrap().dtype(), Dtype::Int);

    // update in place keeps the other sheets
    Session::from_pairs([("e", f())])
        .save_with(dir.path("data.xlsx"), &SaveOptions::new().overwrite(false))
        .unwrap();
    let updated = Session::open(dir.path("data.xlsx")).unwrap();
    assert_eq!(updated.keys().collect::<Vec<_>>(), vec!["e", "g", "f"]);
    assert!(updated.get_array("e").unwrap().equals(&f(), false));
}
