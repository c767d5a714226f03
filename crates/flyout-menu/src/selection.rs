#![forbid(unsafe_code)]

//! Checkbox and radio state.
//!
//! The store is seeded from the declarations in a [`MenuTree`] and owned by
//! the controller for as long as the tree lives. It only knows about nodes
//! that exist in that tree; unknown ids are ignored.

use ahash::AHashMap;

use crate::tree::{MenuTree, NodeId, NodeKind, RadioGroupId};

#[derive(Debug, Clone)]
struct RadioState {
    members: Vec<NodeId>,
    selected: Option<NodeId>,
}

/// Checked state of checkbox items and selection of radio groups.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    checked: AHashMap<NodeId, bool>,
    disabled: AHashMap<NodeId, bool>,
    groups: AHashMap<RadioGroupId, RadioState>,
    membership: AHashMap<NodeId, RadioGroupId>,
}

impl SelectionStore {
    /// Seed the store from the tree's declared initial values.
    #[must_use]
    pub fn from_tree(tree: &MenuTree) -> Self {
        let mut store = Self::default();
        for node in tree.nodes() {
            match node.kind() {
                NodeKind::CheckboxItem => {
                    store.checked.insert(node.id(), node.initially_checked());
                    store.disabled.insert(node.id(), node.is_disabled());
                }
                NodeKind::RadioItem => {
                    store.disabled.insert(node.id(), node.is_disabled());
                }
                _ => {}
            }
        }
        for group in tree.radio_groups() {
            for &member in &group.members {
                store.membership.insert(member, group.id.clone());
            }
            store.groups.insert(
                group.id.clone(),
                RadioState {
                    members: group.members.clone(),
                    selected: group.selected,
                },
            );
        }
        store
    }

    /// Set a checkbox. Returns `true` if the state changed.
    pub fn set_checked(&mut self, node: NodeId, value: bool) -> bool {
        match self.checked.get_mut(&node) {
            Some(state) if *state != value => {
                *state = value;
                true
            }
            _ => false,
        }
    }

    /// Flip a checkbox. Returns the new state, or `None` for unknown ids.
    pub fn toggle_checked(&mut self, node: NodeId) -> Option<bool> {
        let state = self.checked.get_mut(&node)?;
        *state = !*state;
        Some(*state)
    }

    /// Select `node` within `group`, clearing the previous selection.
    ///
    /// Returns `true` if the selection changed. Disabled items and ids that
    /// are not members of `group` leave the group untouched.
    pub fn select_radio(&mut self, group: &RadioGroupId, node: NodeId) -> bool {
        if self.disabled.get(&node).copied().unwrap_or(false) {
            return false;
        }
        let Some(state) = self.groups.get_mut(group) else {
            return false;
        };
        if !state.members.contains(&node) || state.selected == Some(node) {
            return false;
        }
        state.selected = Some(node);
        true
    }

    /// Whether a checkbox is checked. Unknown ids read as unchecked.
    #[must_use]
    pub fn is_checked(&self, node: NodeId) -> bool {
        self.checked.get(&node).copied().unwrap_or(false)
    }

    /// The selected member of a radio group.
    #[must_use]
    pub fn selected_radio(&self, group: &RadioGroupId) -> Option<NodeId> {
        self.groups.get(group).and_then(|state| state.selected)
    }

    /// The radio group a radio item belongs to.
    #[must_use]
    pub fn radio_group_of(&self, node: NodeId) -> Option<&RadioGroupId> {
        self.membership.get(&node)
    }

    /// Whether a radio item is the selected member of its group.
    #[must_use]
    pub fn is_radio_selected(&self, node: NodeId) -> bool {
        self.radio_group_of(node)
            .and_then(|group| self.selected_radio(group))
            == Some(node)
    }
}
