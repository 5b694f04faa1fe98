use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};

const URL_KEY: &str = "url";
const DEFAULT_URL: &str = "about:blank";

pub struct WebViewWidget {
    base: WidgetBase,
    url: String,
    reloads: u32,
}

impl WebViewWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let url = match base.store().get_json::<String>(URL_KEY)? {
            Some(url) => url,
            None => base.preset_str(URL_KEY).unwrap_or(DEFAULT_URL).to_string(),
        };
        Ok(Self {
            base,
            url,
            reloads: 0,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    pub fn navigate(&mut self, url: &str) -> Result<(), WidgetError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(WidgetError::InvalidState("empty url".to_string()));
        }
        self.url = url.to_string();
        self.base.store().set_json(URL_KEY, &self.url)?;
        Ok(())
    }
}

impl Widget for WebViewWidget {
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
        self.reloads += 1;
        log::debug!("{} reloading {}", self.base.id(), self.url);
        Ok(())
    }

    fn summary(&self) -> String {
        self.url.clone()
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Web View", factory(WebViewWidget::new))
        .description("Embedded web page")
        .multiple()
}
