use crate::{accept_event, FetchStatus};
use dash_widget::ingest::{IngestEvent, IngestPayload, IngestSource};
use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use serde_json::Value;
use std::collections::BTreeMap;

const SYMBOLS_KEY: &str = "symbols";
const SOURCE_PREFIX: &str = "quote:";
const DEFAULT_SYMBOLS: &str = "AAPL,MSFT";

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub change: f64,
}

pub struct StockMarketWidget {
    base: WidgetBase,
    symbols: Vec<String>,
    quotes: BTreeMap<String, Quote>,
    status: FetchStatus,
}

pub fn parse_symbols(text: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in text.split(',') {
        let symbol = symbol.trim().to_ascii_uppercase();
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

impl StockMarketWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let stored = base.store().get_json::<String>(SYMBOLS_KEY)?;
        let text = stored
            .as_deref()
            .or_else(|| base.preset_str(SYMBOLS_KEY))
            .unwrap_or(DEFAULT_SYMBOLS)
            .to_string();
        Ok(Self {
            base,
            symbols: parse_symbols(&text),
            quotes: BTreeMap::new(),
            status: FetchStatus::Idle,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn set_symbols(&mut self, text: &str) -> Result<(), WidgetError> {
        self.symbols = parse_symbols(text);
        self.quotes.retain(|symbol, _| self.symbols.contains(symbol));
        self.base
            .store()
            .set_json(SYMBOLS_KEY, &self.symbols.join(","))?;
        Ok(())
    }
}

impl Widget for StockMarketWidget {
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
        self.status = FetchStatus::Loading;
        for symbol in &self.symbols {
            let source = IngestSource::Url {
                url: format!("https://query1.finance.yahoo.com/v8/finance/chart/{symbol}"),
                selector: None,
            };
            if let Err(err) = self.base.request(&format!("{SOURCE_PREFIX}{symbol}"), source) {
                self.status = FetchStatus::Failed(err.to_string());
                return Err(err);
            }
        }
        Ok(())
    }

    fn on_ingest(&mut self, event: &IngestEvent) {
        let Some(symbol) = event.source_id.strip_prefix(SOURCE_PREFIX) else {
            return;
        };
        let symbol = symbol.to_string();
        let Some(payload) = accept_event(event, &event.source_id, &mut self.status) else {
            return;
        };
        let IngestPayload::Json(value) = payload else {
            self.status = FetchStatus::Failed(format!("{symbol}: expected JSON"));
            return;
        };
        let price = value.get("price").and_then(Value::as_f64);
        let change = value.get("change").and_then(Value::as_f64).unwrap_or(0.0);
        match price {
            Some(price) => {
                self.quotes.insert(symbol, Quote { price, change });
                self.status = FetchStatus::Ready;
            }
            None => self.status = FetchStatus::Failed(format!("{symbol}: no price")),
        }
    }

    fn summary(&self) -> String {
        let quotes: Vec<String> = self
            .symbols
            .iter()
            .map(|symbol| match self.quotes.get(symbol) {
                Some(quote) => format!("{symbol} {:.2} ({:+.2})", quote.price, quote.change),
                None => format!("{symbol} -"),
            })
            .collect();
        quotes.join(", ")
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Stock Market", factory(StockMarketWidget::new))
        .description("Watch list of stock quotes")
}
