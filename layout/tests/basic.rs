use layout::{DashboardRecord, DockArea, Geometry, LayoutSnapshot, WidgetRecord};

fn widget(id: &str, area: DockArea) -> WidgetRecord {
    WidgetRecord {
        module_name: id.to_string(),
        base_module: None,
        dock_name: format!("dock_{id}"),
        title: id.to_string(),
        area,
        floating: false,
        visible: true,
        geometry: Some(Geometry::new(10, 20, 300, 200)),
    }
}

fn sample() -> LayoutSnapshot {
    let mut main = DashboardRecord::new("Main");
    main.set_docking_state(&[0x0a, 0x0b]);
    main.widgets.push(widget("clock", DockArea::Left));
    main.widgets.push(widget("custom_list_groceries", DockArea::Right));
    let mut snapshot = LayoutSnapshot {
        dashboards: vec![main, DashboardRecord::new("Empty")],
        window_geometry: String::new(),
    };
    snapshot.set_window_geometry(b"geom");
    snapshot
}

#[test]
fn document_uses_the_persisted_field_names() {
    let snapshot = sample();
    let value: serde_json::Value =
        serde_json::from_slice(&snapshot.to_json_bytes().unwrap()).unwrap();

    let first = &value["dashboards"][0];
    assert_eq!(first["title"], "Main");
    assert_eq!(first["state"], "0a0b");
    assert_eq!(first["widgets"][0]["module_name"], "clock");
    assert_eq!(first["widgets"][0]["area"], 1);
    assert_eq!(first["widgets"][0]["geometry"]["width"], 300);
    assert!(first["widgets"][0].get("base_module").is_none());
    assert_eq!(value["window_geometry"], "67656f6d");
}

#[test]
fn save_and_load_snapshot_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("layout.json");
    let snapshot = sample();

    snapshot.save_to_file(&path).unwrap();
    let loaded = LayoutSnapshot::load_from_file(&path).unwrap();

    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.widget_count(), 2);
    assert_eq!(loaded.dashboards[0].docking_state_bytes().unwrap(), vec![0x0a, 0x0b]);
}

#[test]
fn lenient_decode_skips_malformed_entries() {
    let doc = br#"{
        "dashboards": [
            {"title": "A", "state": "", "widgets": [
                {"module_name": "clock", "area": 2},
                {"area": "left"},
                {"module_name": "web_view_docs", "geometry": {"x": 1, "y": 2, "width": 3, "height": 4}}
            ]},
            42,
            {"title": 7}
        ]
    }"#;

    let decoded = LayoutSnapshot::decode_lenient(doc).unwrap();
    let snapshot = decoded.snapshot;
    assert_eq!(snapshot.dashboards.len(), 1);
    let ids: Vec<_> = snapshot.dashboards[0]
        .widgets
        .iter()
        .map(|w| w.widget_id().to_string())
        .collect();
    assert_eq!(ids, vec!["clock", "web_view_docs"]);
    assert!(snapshot.dashboards[0].widgets[0].visible);
    assert_eq!(decoded.warnings.len(), 3);
}

#[test]
fn lenient_decode_accepts_bare_dashboard_list() {
    let doc = br#"[{"title": "Legacy", "state": "ff", "widgets": []}]"#;
    let snapshot = LayoutSnapshot::decode_lenient(doc).unwrap().snapshot;
    assert_eq!(snapshot.dashboards[0].title, "Legacy");
    assert_eq!(snapshot.dashboards[0].docking_state_bytes().unwrap(), vec![0xff]);
}

#[test]
fn lenient_decode_rejects_non_documents() {
    assert!(LayoutSnapshot::decode_lenient(b"not json").is_err());
    assert!(LayoutSnapshot::decode_lenient(b"\"text\"").is_err());
    assert!(LayoutSnapshot::decode_lenient(br#"{"dashboards": 3}"#).is_err());
}

#[test]
fn bad_hex_is_reported_per_dashboard() {
    let mut record = DashboardRecord::new("Broken");
    record.docking_state = "xyz".to_string();
    assert!(record.docking_state_bytes().is_err());
}
