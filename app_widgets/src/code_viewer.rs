use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};

const CONTENT_KEY: &str = "content";
const LANGUAGE_KEY: &str = "language";

pub struct CodeViewerWidget {
    base: WidgetBase,
    content: String,
    language: String,
}

impl CodeViewerWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let mut widget = Self {
            language: base.preset_str(LANGUAGE_KEY).unwrap_or("text").to_string(),
            content: String::new(),
            base,
        };
        widget.reload()?;
        Ok(widget)
    }

    fn reload(&mut self) -> Result<(), WidgetError> {
        if let Some(content) = self.base.store().get_json::<String>(CONTENT_KEY)? {
            self.content = content;
        }
        if let Some(language) = self.base.store().get_json::<String>(LANGUAGE_KEY)? {
            self.language = language;
        }
        Ok(())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_content(&mut self, content: &str, language: &str) -> Result<(), WidgetError> {
        self.content = content.to_string();
        self.language = language.to_string();
        self.base.store().set_json(CONTENT_KEY, &self.content)?;
        self.base.store().set_json(LANGUAGE_KEY, &self.language)?;
        Ok(())
    }
}

impl Widget for CodeViewerWidget {
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
        self.reload()
    }

    fn summary(&self) -> String {
        format!("{} line(s) of {}", self.content.lines().count(), self.language)
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Code Viewer", factory(CodeViewerWidget::new))
        .description("Syntax-highlighted snippet viewer")
        .multiple()
}
