use crate::{accept_event, FetchStatus};
use dash_widget::ingest::{IngestEvent, IngestPayload, IngestSource};
use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use serde_json::Value;

const URL_KEY: &str = "url";
const SOURCE_ID: &str = "rows";

/// Flattens a JSON array of objects into a header row plus string cells.
pub struct RestApiTableWidget {
    base: WidgetBase,
    url: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    status: FetchStatus,
}

impl RestApiTableWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let url = match base.store().get_json::<String>(URL_KEY)? {
            Some(url) => url,
            None => base.preset_str(URL_KEY).unwrap_or_default().to_string(),
        };
        Ok(Self {
            base,
            url,
            headers: Vec::new(),
            rows: Vec::new(),
            status: FetchStatus::Idle,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn set_url(&mut self, url: &str) -> Result<(), WidgetError> {
        self.url = url.trim().to_string();
        self.base.store().set_json(URL_KEY, &self.url)?;
        Ok(())
    }

    fn load_rows(&mut self, value: &Value) {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => match map.get("data").or_else(|| map.get("items")) {
                Some(Value::Array(items)) => items.as_slice(),
                _ => std::slice::from_ref(value),
            },
            _ => {
                self.status = FetchStatus::Failed("response is not a table".to_string());
                return;
            }
        };

        let mut headers: Vec<String> = Vec::new();
        for item in items {
            if let Value::Object(map) = item {
                for key in map.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
        }
        self.rows = items
            .iter()
            .filter_map(Value::as_object)
            .map(|map| {
                headers
                    .iter()
                    .map(|key| match map.get(key) {
                        Some(Value::String(text)) => text.clone(),
                        Some(Value::Null) | None => String::new(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        self.headers = headers;
        self.status = FetchStatus::Ready;
    }
}

impl Widget for RestApiTableWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.with_refresh()
    }

    fn refresh(&mut self) -> Result<(), WidgetError> {
        if self.url.is_empty() {
            return Ok(());
        }
        self.status = FetchStatus::Loading;
        let source = IngestSource::Url {
            url: self.url.clone(),
            selector: None,
        };
        self.base.request(SOURCE_ID, source)
    }

    fn on_ingest(&mut self, event: &IngestEvent) {
        let Some(payload) = accept_event(event, SOURCE_ID, &mut self.status) else {
            return;
        };
        match payload {
            IngestPayload::Json(value) => self.load_rows(value),
            IngestPayload::Text(_) => {
                self.status = FetchStatus::Failed("expected a JSON response".to_string());
            }
        }
    }

    fn summary(&self) -> String {
        format!(
            "{} row(s) from {} ({})",
            self.rows.len(),
            if self.url.is_empty() { "-" } else { self.url.as_str() },
            self.status.label()
        )
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("REST API Table", factory(RestApiTableWidget::new))
        .module_name("rest_api_table")
        .description("Tabulate a JSON endpoint")
}
