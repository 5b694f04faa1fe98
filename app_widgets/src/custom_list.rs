use dash_widget::{
    factory, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext, WidgetError,
};

const COLUMNS_KEY: &str = "columns";
const ITEMS_KEY: &str = "items";

/// User-defined table. Rows are written through on every edit, so the widget
/// needs no save hook.
pub struct CustomListWidget {
    base: WidgetBase,
    columns: Vec<String>,
    items: Vec<Vec<String>>,
}

impl CustomListWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        let base = WidgetBase::new(context, config);
        let columns = match base.store().get_json::<Vec<String>>(COLUMNS_KEY)? {
            Some(columns) if !columns.is_empty() => columns,
            _ => vec!["Item".to_string()],
        };
        let items = base
            .store()
            .get_json::<Vec<Vec<String>>>(ITEMS_KEY)?
            .unwrap_or_default();
        Ok(Self {
            base,
            columns,
            items,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn items(&self) -> &[Vec<String>] {
        &self.items
    }

    pub fn set_columns(&mut self, columns: Vec<String>) -> Result<(), WidgetError> {
        if columns.is_empty() {
            return Err(WidgetError::InvalidState(
                "a list needs at least one column".to_string(),
            ));
        }
        let width = columns.len();
        for row in &mut self.items {
            row.resize(width, String::new());
        }
        self.columns = columns;
        self.base.store().set_json(COLUMNS_KEY, &self.columns)?;
        self.base.store().set_json(ITEMS_KEY, &self.items)?;
        Ok(())
    }

    pub fn add_item(&mut self, mut row: Vec<String>) -> Result<(), WidgetError> {
        row.resize(self.columns.len(), String::new());
        self.items.push(row);
        self.base.store().set_json(ITEMS_KEY, &self.items)?;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<bool, WidgetError> {
        if index >= self.items.len() {
            return Ok(false);
        }
        self.items.remove(index);
        self.base.store().set_json(ITEMS_KEY, &self.items)?;
        Ok(true)
    }
}

impl Widget for CustomListWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn summary(&self) -> String {
        format!("{} row(s) x {} column(s)", self.items.len(), self.columns.len())
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Custom List", factory(CustomListWidget::new))
        .description("Editable table with user-defined columns")
        .multiple()
}
