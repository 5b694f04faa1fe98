use crate::plugin::PluginDescriptor;
use std::collections::HashSet;

/// Lower-cases `title` and turns each whitespace character into `_`.
pub fn sanitize(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Hands out widget instance ids for one session.
///
/// Ids are unique among live widgets; ids retired by a delete are not handed
/// to another widget until [`WidgetInstanceNamer::clear`].
#[derive(Debug, Default)]
pub struct WidgetInstanceNamer {
    live: HashSet<String>,
    retired: HashSet<String>,
}

impl WidgetInstanceNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id a new widget of `descriptor` would get for `title`, before
    /// collision handling.
    pub fn candidate(descriptor: &PluginDescriptor, title: Option<&str>) -> String {
        let module = descriptor.module_name.as_str();
        if !descriptor.supports_multiple {
            return module.to_string();
        }
        match title.map(sanitize) {
            Some(suffix) if !suffix.is_empty() => format!("{module}_{suffix}"),
            _ => module.to_string(),
        }
    }

    pub fn allocate(&mut self, descriptor: &PluginDescriptor, title: Option<&str>) -> String {
        let candidate = Self::candidate(descriptor, title);
        self.reserve(candidate, &descriptor.module_name)
    }

    /// Reserves a persisted id, suffixing it when already taken.
    pub fn claim(&mut self, widget_id: &str, module_name: &str) -> String {
        let id = self.reserve(widget_id.to_string(), module_name);
        if id != widget_id {
            log::warn!("widget id '{widget_id}' already in use, restored as '{id}'");
        }
        id
    }

    /// Id `current` would move to when retitled, without reserving it.
    /// Single-instance kinds keep their id.
    pub fn preview_rename(&self, descriptor: &PluginDescriptor, current: &str, title: &str) -> String {
        if !descriptor.supports_multiple {
            return current.to_string();
        }
        let candidate = Self::candidate(descriptor, Some(title));
        if candidate == current {
            return current.to_string();
        }
        self.next_free(candidate, &descriptor.module_name)
    }

    /// Moves `current` to its renamed id; the old id is retired when it
    /// changes.
    pub fn rename(&mut self, descriptor: &PluginDescriptor, current: &str, title: &str) -> String {
        let id = self.preview_rename(descriptor, current, title);
        if id != current {
            self.release(current);
            self.live.insert(id.clone());
        }
        id
    }

    pub fn release(&mut self, widget_id: &str) {
        if self.live.remove(widget_id) {
            self.retired.insert(widget_id.to_string());
        }
    }

    pub fn is_live(&self, widget_id: &str) -> bool {
        self.live.contains(widget_id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Starts a new session: forgets live and retired ids.
    pub fn clear(&mut self) {
        self.live.clear();
        self.retired.clear();
    }

    fn is_taken(&self, id: &str) -> bool {
        self.live.contains(id) || self.retired.contains(id)
    }

    fn next_free(&self, candidate: String, module_name: &str) -> String {
        if !self.is_taken(&candidate) {
            return candidate;
        }
        (1u32..)
            .map(|n| format!("{module_name}_{n}"))
            .find(|id| !self.is_taken(id))
            .unwrap_or(candidate)
    }

    fn reserve(&mut self, candidate: String, module_name: &str) -> String {
        let id = self.next_free(candidate, module_name);
        self.live.insert(id.clone());
        id
    }
}
