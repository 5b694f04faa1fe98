use app_widgets::calculator::{AngleMode, CalculatorWidget};
use app_widgets::clock::ClockWidget;
use app_widgets::custom_list::CustomListWidget;
use app_widgets::markdown_viewer::MarkdownViewerWidget;
use app_widgets::rest_api_table::RestApiTableWidget;
use app_widgets::tree_list::TreeListWidget;
use app_widgets::weather_forecast::WeatherForecastWidget;
use app_widgets::{register_plugins, FetchStatus};
use dash_widget::ingest::{FileFetcher, IngestEvent, IngestHandle, IngestPayload, IngestPool};
use dash_widget::store::{KeyValueStore, MemoryStore};
use dash_widget::{Widget, WidgetConfig, WidgetContext};
use std::sync::Arc;
use std::time::Duration;

fn context(store: &Arc<MemoryStore>) -> WidgetContext {
    WidgetContext {
        store: Arc::clone(store) as Arc<dyn KeyValueStore>,
        ingest: IngestHandle::disconnected(),
    }
}

#[test]
fn bundled_plugins_register_in_menu_order() {
    let names: Vec<String> = register_plugins()
        .iter()
        .map(|p| p.canonical_module_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "clock",
            "markdown_viewer",
            "rest_api_table",
            "custom_list",
            "web_view",
            "weather_forecast",
            "stock_market",
            "code_viewer",
            "wysiwyg_editor",
            "calculator",
            "scientific_calculator",
            "tree_list",
        ]
    );
    let multi: Vec<String> = register_plugins()
        .iter()
        .filter(|p| p.supports_multiple)
        .map(|p| p.canonical_module_name())
        .collect();
    assert_eq!(
        multi,
        vec!["custom_list", "web_view", "code_viewer", "wysiwyg_editor", "tree_list"]
    );
}

#[test]
fn clock_state_survives_save_and_restore() {
    let store = Arc::new(MemoryStore::new());
    let mut clock = ClockWidget::new(context(&store), WidgetConfig::new("clock", "Clock")).unwrap();
    assert!(clock.add_timezone("Europe/Berlin"));
    assert!(!clock.add_timezone("UTC"));
    clock.set_24h(false);
    clock.save_state().unwrap();

    let mut fresh = ClockWidget::new(context(&store), WidgetConfig::new("clock", "Clock")).unwrap();
    let saved = fresh.base().load_state::<serde_json::Value>().unwrap().unwrap();
    fresh.restore_state("clock", saved).unwrap();
    assert_eq!(fresh.state(), clock.state());
}

#[test]
fn clock_rejects_state_of_the_wrong_shape() {
    let store = Arc::new(MemoryStore::new());
    let mut clock = ClockWidget::new(context(&store), WidgetConfig::new("clock", "Clock")).unwrap();
    let err = clock.restore_state("clock", serde_json::json!([1, 2, 3]));
    assert!(err.is_err());
}

#[test]
fn basic_calculator_ignores_angle_mode() {
    let store = Arc::new(MemoryStore::new());
    let mut basic =
        CalculatorWidget::basic(context(&store), WidgetConfig::new("calculator", "Calc")).unwrap();
    basic.set_angle_mode(AngleMode::Radians);
    assert_eq!(basic.state().angle_mode, AngleMode::Degrees);

    let mut scientific = CalculatorWidget::scientific(
        context(&store),
        WidgetConfig::new("scientific_calculator", "Sci"),
    )
    .unwrap();
    scientific.set_angle_mode(AngleMode::Radians);
    scientific.memory_add(2.5);
    scientific.record("sin(0)", 0.0);
    scientific.save_state().unwrap();

    let saved = scientific
        .base()
        .load_state::<serde_json::Value>()
        .unwrap()
        .unwrap();
    basic.restore_state("calculator", saved).unwrap();
    assert_eq!(basic.state().memory, 2.5);
    assert_eq!(basic.state().angle_mode, AngleMode::Degrees);
}

#[test]
fn custom_list_rows_are_written_through() {
    let store = Arc::new(MemoryStore::new());
    let config = WidgetConfig::new("custom_list_groceries", "Groceries");
    let mut list = CustomListWidget::new(context(&store), config.clone()).unwrap();
    list.set_columns(vec!["Item".into(), "Qty".into()]).unwrap();
    list.add_item(vec!["Milk".into()]).unwrap();

    let reopened = CustomListWidget::new(context(&store), config).unwrap();
    assert_eq!(reopened.columns(), ["Item", "Qty"]);
    assert_eq!(reopened.items(), [vec!["Milk".to_string(), String::new()]]);
}

#[test]
fn tree_list_restore_rejects_dangling_parents() {
    let store = Arc::new(MemoryStore::new());
    let mut tree =
        TreeListWidget::new(context(&store), WidgetConfig::new("tree_list", "Tree")).unwrap();
    let root = tree.add("root", None).unwrap();
    let child = tree.add("child", Some(root)).unwrap();
    tree.add("grandchild", Some(child)).unwrap();
    assert!(tree.add("orphan", Some(99)).is_err());
    assert_eq!(tree.remove(child), 2);

    let bad = serde_json::json!({"nodes": [{"id": 1, "text": "a", "parent": 7}]});
    assert!(tree.restore_state("tree_list", bad).is_err());
    assert_eq!(tree.state().nodes.len(), 1);
}

#[test]
fn refresh_without_pool_marks_the_fetch_failed() {
    let store = Arc::new(MemoryStore::new());
    let mut weather = WeatherForecastWidget::new(
        context(&store),
        WidgetConfig::new("weather_forecast", "Weather"),
    )
    .unwrap();
    assert!(weather.refresh().is_err());
    assert!(matches!(weather.status(), FetchStatus::Failed(_)));
}

#[test]
fn weather_ingest_parses_days() {
    let store = Arc::new(MemoryStore::new());
    let mut weather = WeatherForecastWidget::new(
        context(&store),
        WidgetConfig::new("weather_forecast", "Weather"),
    )
    .unwrap();
    weather.on_ingest(&IngestEvent {
        target: "weather_forecast".into(),
        source_id: "forecast".into(),
        result: Ok(IngestPayload::Json(serde_json::json!({
            "days": [{"date": "2024-01-01", "summary": "Sunny", "high": 5.0, "low": -1.0}]
        }))),
    });
    assert_eq!(weather.forecast().len(), 1);
    assert_eq!(weather.status(), &FetchStatus::Ready);
}

#[test]
fn rest_table_flattens_objects() {
    let store = Arc::new(MemoryStore::new());
    let mut table = RestApiTableWidget::new(
        context(&store),
        WidgetConfig::new("rest_api_table", "API"),
    )
    .unwrap();
    table.on_ingest(&IngestEvent {
        target: "rest_api_table".into(),
        source_id: "rows".into(),
        result: Ok(IngestPayload::Json(serde_json::json!([
            {"name": "a", "n": 1},
            {"name": "b", "extra": null}
        ]))),
    });
    assert_eq!(table.headers(), ["n", "name", "extra"]);
    assert_eq!(table.rows()[0], vec!["1", "a", ""]);
    assert_eq!(table.rows()[1], vec!["", "b", ""]);
}

#[test]
fn markdown_viewer_loads_through_the_pool() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "# Title\ntext\n## Section\n").expect("write markdown");

    let pool = IngestPool::new(Arc::new(FileFetcher), 1);
    let store = Arc::new(MemoryStore::new());
    let context = WidgetContext {
        store: store as Arc<dyn KeyValueStore>,
        ingest: pool.handle(),
    };
    let mut viewer =
        MarkdownViewerWidget::new(context, WidgetConfig::new("markdown_viewer", "Notes")).unwrap();
    viewer.open(&path).unwrap();

    let event = pool
        .recv_timeout(Duration::from_secs(5))
        .expect("ingest event");
    assert_eq!(event.target, "markdown_viewer");
    viewer.on_ingest(&event);
    assert_eq!(viewer.headings(), vec!["Title", "Section"]);
    assert_eq!(viewer.last_file(), Some(path.as_path()));
    pool.shutdown();
}
