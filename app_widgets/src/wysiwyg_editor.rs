use dash_widget::{
    factory, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext, WidgetError,
};

const CONTENT_KEY: &str = "content";

/// Rich text note kept as HTML.
pub struct WysiwygEditorWidget {
    base: WidgetBase,
    html: String,
}

impl WysiwygEditorWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let html = base
            .store()
            .get_json::<String>(CONTENT_KEY)?
            .unwrap_or_default();
        Ok(Self { base, html })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set_html(&mut self, html: &str) -> Result<(), WidgetError> {
        self.html = html.to_string();
        self.base.store().set_json(CONTENT_KEY, &self.html)?;
        Ok(())
    }

    /// Text content with markup stripped.
    pub fn plain_text(&self) -> String {
        let mut text = String::with_capacity(self.html.len());
        let mut in_tag = false;
        for ch in self.html.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => text.push(ch),
                _ => {}
            }
        }
        text
    }
}

impl Widget for WysiwygEditorWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn summary(&self) -> String {
        format!("{} character(s)", self.plain_text().chars().count())
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("WYSIWYG Editor", factory(WysiwygEditorWidget::new))
        .module_name("wysiwyg_editor")
        .description("Rich text notes")
        .multiple()
}
