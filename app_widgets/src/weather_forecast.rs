use crate::{accept_event, FetchStatus};
use dash_widget::ingest::{IngestEvent, IngestPayload, IngestSource};
use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const LOCATION_KEY: &str = "location";
const FORECAST_KEY: &str = "forecast";
const SOURCE_ID: &str = "forecast";
const DEFAULT_LOCATION: &str = "London";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub summary: String,
    pub high: f64,
    pub low: f64,
}

pub struct WeatherForecastWidget {
    base: WidgetBase,
    location: String,
    forecast: Vec<ForecastDay>,
    status: FetchStatus,
}

impl WeatherForecastWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let location = match base.store().get_json::<String>(LOCATION_KEY)? {
            Some(location) => location,
            None => base
                .preset_str(LOCATION_KEY)
                .unwrap_or(DEFAULT_LOCATION)
                .to_string(),
        };
        let forecast = base
            .store()
            .get_json::<Vec<ForecastDay>>(FORECAST_KEY)?
            .unwrap_or_default();
        Ok(Self {
            base,
            location,
            forecast,
            status: FetchStatus::Idle,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn forecast(&self) -> &[ForecastDay] {
        &self.forecast
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn set_location(&mut self, location: &str) -> Result<(), WidgetError> {
        self.location = location.trim().to_string();
        self.base.store().set_json(LOCATION_KEY, &self.location)?;
        Ok(())
    }

    fn forecast_url(&self) -> String {
        format!(
            "https://wttr.in/{}?format=j1",
            self.location.replace(' ', "+")
        )
    }
}

fn parse_days(value: &Value) -> Vec<ForecastDay> {
    let days = value
        .get("weather")
        .or_else(|| value.get("days"))
        .and_then(Value::as_array);
    days.map(|days| {
        days.iter()
            .filter_map(|day| serde_json::from_value::<ForecastDay>(day.clone()).ok())
            .collect()
    })
    .unwrap_or_default()
}

impl Widget for WeatherForecastWidget {
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
        let source = IngestSource::Url {
            url: self.forecast_url(),
            selector: None,
        };
        self.status = FetchStatus::Loading;
        if let Err(err) = self.base.request(SOURCE_ID, source) {
            self.status = FetchStatus::Failed(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    fn on_ingest(&mut self, event: &IngestEvent) {
        let Some(payload) = accept_event(event, SOURCE_ID, &mut self.status) else {
            return;
        };
        match payload {
            IngestPayload::Json(value) => {
                self.forecast = parse_days(value);
                self.status = FetchStatus::Ready;
                if let Err(err) = self.base.store().set_json(FORECAST_KEY, &self.forecast) {
                    log::warn!("{}: could not cache forecast: {err}", self.base.id());
                }
            }
            IngestPayload::Text(_) => {
                self.status = FetchStatus::Failed("expected a JSON forecast".to_string());
            }
        }
    }

    fn summary(&self) -> String {
        format!(
            "{}: {} day(s), {}",
            self.location,
            self.forecast.len(),
            self.status.label()
        )
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Weather Forecast", factory(WeatherForecastWidget::new))
        .description("Multi-day forecast for one location")
}
