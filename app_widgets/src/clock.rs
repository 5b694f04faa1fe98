use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    pub timezones: Vec<String>,
    #[serde(default = "default_24h")]
    pub use_24h: bool,
}

fn default_24h() -> bool {
    true
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            timezones: vec!["UTC".to_string()],
            use_24h: true,
        }
    }
}

pub struct ClockWidget {
    base: WidgetBase,
    state: ClockState,
}

impl ClockWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let mut state = ClockState::default();
        if let Some(zones) = base.preset().get("timezones").and_then(Value::as_array) {
            let zones: Vec<String> = zones
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if !zones.is_empty() {
                state.timezones = zones;
            }
        }
        Ok(Self { base, state })
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn add_timezone(&mut self, zone: &str) -> bool {
        let zone = zone.trim();
        if zone.is_empty() || self.state.timezones.iter().any(|z| z == zone) {
            return false;
        }
        self.state.timezones.push(zone.to_string());
        true
    }

    pub fn remove_timezone(&mut self, zone: &str) -> bool {
        let before = self.state.timezones.len();
        self.state.timezones.retain(|z| z != zone);
        before != self.state.timezones.len()
    }

    pub fn set_24h(&mut self, use_24h: bool) {
        self.state.use_24h = use_24h;
    }
}

impl Widget for ClockWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PERSISTENT
    }

    fn save_state(&mut self) -> Result<(), WidgetError> {
        self.base.write_state(&self.state)
    }

    fn restore_state(&mut self, _id: &str, state: Value) -> Result<(), WidgetError> {
        self.state =
            serde_json::from_value(state).map_err(|e| WidgetError::InvalidState(e.to_string()))?;
        Ok(())
    }

    fn summary(&self) -> String {
        let format = if self.state.use_24h { "24h" } else { "12h" };
        format!("{} [{format}]", self.state.timezones.join(", "))
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Clock", factory(ClockWidget::new))
        .description("Display time in multiple time zones")
}
