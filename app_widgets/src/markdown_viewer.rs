use crate::{accept_event, FetchStatus};
use dash_widget::ingest::{IngestEvent, IngestPayload, IngestSource};
use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use std::path::{Path, PathBuf};

const LAST_FILE_KEY: &str = "last_file";
const SOURCE_ID: &str = "document";

pub struct MarkdownViewerWidget {
    base: WidgetBase,
    last_file: Option<PathBuf>,
    text: String,
    status: FetchStatus,
}

impl MarkdownViewerWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let last_file = base.store().get_json::<PathBuf>(LAST_FILE_KEY)?;
        Ok(Self {
            base,
            last_file,
            text: String::new(),
            status: FetchStatus::Idle,
        })
    }

    pub fn last_file(&self) -> Option<&Path> {
        self.last_file.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Remembers `path` and queues it for loading.
    pub fn open(&mut self, path: &Path) -> Result<(), WidgetError> {
        self.last_file = Some(path.to_path_buf());
        self.base.store().set_json(LAST_FILE_KEY, path)?;
        self.refresh()
    }

    /// Headings of the loaded document, one per `#` line.
    pub fn headings(&self) -> Vec<&str> {
        self.text
            .lines()
            .filter(|line| line.starts_with('#'))
            .map(|line| line.trim_start_matches('#').trim())
            .collect()
    }
}

impl Widget for MarkdownViewerWidget {
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
        let Some(path) = self.last_file.clone() else {
            return Ok(());
        };
        self.status = FetchStatus::Loading;
        self.base.request(SOURCE_ID, IngestSource::File { path })
    }

    fn on_ingest(&mut self, event: &IngestEvent) {
        let Some(payload) = accept_event(event, SOURCE_ID, &mut self.status) else {
            return;
        };
        self.text = match payload {
            IngestPayload::Text(text) => text.clone(),
            IngestPayload::Json(value) => value.to_string(),
        };
        self.status = FetchStatus::Ready;
    }

    fn summary(&self) -> String {
        match &self.last_file {
            Some(path) => format!("{} ({})", path.display(), self.status.label()),
            None => "no document".to_string(),
        }
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Markdown Viewer", factory(MarkdownViewerWidget::new))
        .description("Render a local markdown file")
}
