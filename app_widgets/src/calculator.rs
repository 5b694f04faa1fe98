use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleMode {
    #[default]
    Degrees,
    Radians,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculatorState {
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub angle_mode: AngleMode,
}

/// Basic and scientific calculators share one model; only the scientific
/// variant honours the angle mode.
pub struct CalculatorWidget {
    base: WidgetBase,
    scientific: bool,
    state: CalculatorState,
}

impl CalculatorWidget {
    pub fn basic(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        Ok(Self {
            base: WidgetBase::new(context, config),
            scientific: false,
            state: CalculatorState::default(),
        })
    }

    pub fn scientific(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        Ok(Self {
            base: WidgetBase::new(context, config),
            scientific: true,
            state: CalculatorState::default(),
        })
    }

    pub fn is_scientific(&self) -> bool {
        self.scientific
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn record(&mut self, expression: &str, result: f64) {
        self.state.history.push(format!("{expression} = {result}"));
        if self.state.history.len() > HISTORY_LIMIT {
            let excess = self.state.history.len() - HISTORY_LIMIT;
            self.state.history.drain(..excess);
        }
    }

    pub fn memory_add(&mut self, value: f64) {
        self.state.memory += value;
    }

    pub fn memory_clear(&mut self) {
        self.state.memory = 0.0;
    }

    pub fn set_angle_mode(&mut self, mode: AngleMode) {
        if self.scientific {
            self.state.angle_mode = mode;
        }
    }
}

impl Widget for CalculatorWidget {
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
        let mut state: CalculatorState =
            serde_json::from_value(state).map_err(|e| WidgetError::InvalidState(e.to_string()))?;
        if !self.scientific {
            state.angle_mode = AngleMode::default();
        }
        self.state = state;
        Ok(())
    }

    fn summary(&self) -> String {
        let last = self.state.history.last().map(String::as_str).unwrap_or("-");
        format!("M={} last: {last}", self.state.memory)
    }
}

/// The calculator family, registered through one call.
pub fn register_plugins() -> Vec<PluginRegistration> {
    vec![
        PluginRegistration::new("Calculator", factory(CalculatorWidget::basic))
            .module_name("calculator")
            .description("Basic calculator widget"),
        PluginRegistration::new("Scientific Calculator", factory(CalculatorWidget::scientific))
            .description("Scientific calculator with trigonometric functions"),
    ]
}
