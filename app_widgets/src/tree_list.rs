use dash_widget::{
    factory, Capabilities, PluginRegistration, Widget, WidgetBase, WidgetConfig, WidgetContext,
    WidgetError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub parent: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
}

impl TreeState {
    fn next_id(&self) -> u64 {
        self.nodes.iter().map(|n| n.id).max().map_or(1, |max| max + 1)
    }

    fn contains(&self, id: u64) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Every node whose ancestor chain reaches a missing parent or loops is
    /// rejected.
    fn validate(&self) -> Result<(), String> {
        for node in &self.nodes {
            let mut seen = vec![node.id];
            let mut current = node.parent;
            while let Some(parent) = current {
                if seen.contains(&parent) {
                    return Err(format!("node {} is part of a cycle", node.id));
                }
                let Some(next) = self.nodes.iter().find(|n| n.id == parent) else {
                    return Err(format!("node {} has unknown parent {parent}", node.id));
                };
                seen.push(parent);
                current = next.parent;
            }
        }
        Ok(())
    }
}

pub struct TreeListWidget {
    base: WidgetBase,
    state: TreeState,
}

impl TreeListWidget {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Result<Self, WidgetError> {
        Ok(Self {
            base: WidgetBase::new(context, config),
            state: TreeState::default(),
        })
    }

    pub fn state(&self) -> &TreeState {
        &self.state
    }

    pub fn add(&mut self, text: &str, parent: Option<u64>) -> Result<u64, WidgetError> {
        if let Some(parent) = parent {
            if !self.state.contains(parent) {
                return Err(WidgetError::InvalidState(format!("unknown parent {parent}")));
            }
        }
        let id = self.state.next_id();
        self.state.nodes.push(TreeNode {
            id,
            text: text.to_string(),
            parent,
        });
        Ok(id)
    }

    /// Removes `id` and its whole subtree; returns the number of nodes dropped.
    pub fn remove(&mut self, id: u64) -> usize {
        let mut doomed = vec![id];
        let mut index = 0;
        while index < doomed.len() {
            let current = doomed[index];
            doomed.extend(
                self.state
                    .nodes
                    .iter()
                    .filter(|n| n.parent == Some(current))
                    .map(|n| n.id),
            );
            index += 1;
        }
        let before = self.state.nodes.len();
        self.state.nodes.retain(|n| !doomed.contains(&n.id));
        before - self.state.nodes.len()
    }

    pub fn children(&self, parent: Option<u64>) -> Vec<&TreeNode> {
        self.state
            .nodes
            .iter()
            .filter(|n| n.parent == parent)
            .collect()
    }
}

impl Widget for TreeListWidget {
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
        let state: TreeState =
            serde_json::from_value(state).map_err(|e| WidgetError::InvalidState(e.to_string()))?;
        state.validate().map_err(WidgetError::InvalidState)?;
        self.state = state;
        Ok(())
    }

    fn summary(&self) -> String {
        format!(
            "{} node(s), {} root(s)",
            self.state.nodes.len(),
            self.children(None).len()
        )
    }
}

pub fn register_plugin() -> PluginRegistration {
    PluginRegistration::new("Tree List", factory(TreeListWidget::new))
        .module_name("tree_list")
        .title("Tree List")
        .description("Hierarchical outline")
        .multiple()
}
