//! Toggle button handles.

use parking_lot::Mutex;
use std::sync::Arc;

/// Visual state of a layer toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    /// Layer can be added (`+`)
    #[default]
    Add,
    /// Layer is loaded and can be removed (`-`)
    Remove,
}

impl ToggleState {
    pub fn label(&self) -> &'static str {
        match self {
            ToggleState::Add => "+",
            ToggleState::Remove => "-",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ToggleState::Add => "layer-toggle-button add",
            ToggleState::Remove => "layer-toggle-button remove",
        }
    }
}

/// Shared handle to a button in the file tree.
///
/// The file tree owns the button; the registry keeps a clone so that
/// eviction can reset it. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct ToggleButton {
    id: String,
    state: Arc<Mutex<ToggleState>>,
}

impl ToggleButton {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(ToggleState::Add)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ToggleState {
        *self.state.lock()
    }

    pub fn set_state(&self, state: ToggleState) {
        *self.state.lock() = state;
    }

    /// Back to the addable state.
    pub fn reset(&self) {
        self.set_state(ToggleState::Add);
    }

    /// True when both handles refer to the same button.
    pub fn same_as(&self, other: &ToggleButton) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let button = ToggleButton::new("btn-1");
        let held = button.clone();
        held.set_state(ToggleState::Remove);
        assert_eq!(button.state(), ToggleState::Remove);
        assert!(button.same_as(&held));

        button.reset();
        assert_eq!(held.state().label(), "+");
        assert_eq!(held.state().class_name(), "layer-toggle-button add");
    }

    #[test]
    fn test_distinct_buttons() {
        assert!(!ToggleButton::new("a").same_as(&ToggleButton::new("a")));
    }
}
