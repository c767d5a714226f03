#![forbid(unsafe_code)]

//! Declarative menu content.
//!
//! A [`MenuTree`] is built once from [`NodeDecl`]s and never mutated by the
//! engine. Nodes are stored in an arena in declaration (pre-order) order, so
//! "tree order" everywhere in the crate is simply arena order.
//!
//! # Levels
//!
//! Every node belongs to exactly one [`LevelId`]: the root level, or the
//! submenu opened by a [`NodeKind::SubmenuTrigger`]. Groups are transparent
//! containers: their children belong to the same level as the group itself.
//!
//! # Invariants
//!
//! 1. Node ids are unique.
//! 2. Every radio item is a descendant of exactly one radio group, and radio
//!    groups do not nest.
//! 3. Only submenu triggers and groups have children.

use std::fmt;

use ahash::{AHashMap, AHashSet};

use crate::error::TreeError;

/// Stable identifier of a menu node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Creates a new [`NodeId`].
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a radio group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RadioGroupId(String);

impl RadioGroupId {
    /// Creates a group id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The group name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RadioGroupId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for RadioGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A plain command.
    Item,
    /// An item carrying an independent on/off state.
    CheckboxItem,
    /// An item that is one exclusive choice of its radio group.
    RadioItem,
    /// An item that opens a nested level.
    SubmenuTrigger,
    /// Non-interactive heading text.
    Label,
    /// Visual divider.
    Separator,
    /// Transparent container; a named group is a radio group.
    Group,
}

impl NodeKind {
    /// Whether navigation can land on this kind of node.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(
            self,
            Self::Item | Self::CheckboxItem | Self::RadioItem | Self::SubmenuTrigger
        )
    }

    const fn accepts_children(self) -> bool {
        matches!(self, Self::SubmenuTrigger | Self::Group)
    }
}

/// Identifies one floating surface: the root menu or one submenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelId {
    /// The top-level menu opened by the external trigger.
    Root,
    /// The submenu opened by the given trigger node.
    Submenu(NodeId),
}

/// One declared node, before validation.
///
/// ```
/// use flyout_menu::tree::{MenuTree, NodeDecl};
///
/// let tree = MenuTree::build(vec![
///     NodeDecl::item(1, "Profile"),
///     NodeDecl::checkbox(2, "Status bar").checked(true),
///     NodeDecl::separator(3),
///     NodeDecl::radio_group(4, "panel", vec![
///         NodeDecl::radio(5, "Top"),
///         NodeDecl::radio(6, "Bottom"),
///     ])
///     .with_selected(5),
///     NodeDecl::submenu(7, "More", vec![NodeDecl::item(8, "Invite")]),
/// ])
/// .unwrap();
/// assert_eq!(tree.len(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct NodeDecl {
    id: NodeId,
    kind: NodeKind,
    label: String,
    text_value: Option<String>,
    disabled: bool,
    close_on_select: Option<bool>,
    checked: bool,
    radio_name: Option<String>,
    selected: Option<NodeId>,
    children: Vec<NodeDecl>,
}

impl NodeDecl {
    fn new(id: impl Into<NodeId>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            text_value: None,
            disabled: false,
            close_on_select: None,
            checked: false,
            radio_name: None,
            selected: None,
            children: Vec::new(),
        }
    }

    /// A plain command item.
    pub fn item(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Item, label)
    }

    /// A checkbox item, unchecked unless [`checked`](Self::checked) is set.
    pub fn checkbox(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, NodeKind::CheckboxItem, label)
    }

    /// A radio item; must be placed inside a [`radio_group`](Self::radio_group).
    pub fn radio(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::new(id, NodeKind::RadioItem, label)
    }

    /// A submenu trigger whose children form the nested level.
    pub fn submenu(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        children: impl IntoIterator<Item = NodeDecl>,
    ) -> Self {
        let mut decl = Self::new(id, NodeKind::SubmenuTrigger, label);
        decl.children = children.into_iter().collect();
        decl
    }

    /// A non-interactive label.
    pub fn label(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Label, text)
    }

    /// A separator.
    pub fn separator(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeKind::Separator, "")
    }

    /// A transparent group.
    pub fn group(id: impl Into<NodeId>, children: impl IntoIterator<Item = NodeDecl>) -> Self {
        let mut decl = Self::new(id, NodeKind::Group, "");
        decl.children = children.into_iter().collect();
        decl
    }

    /// A named radio group.
    pub fn radio_group(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        children: impl IntoIterator<Item = NodeDecl>,
    ) -> Self {
        let mut decl = Self::group(id, children);
        decl.radio_name = Some(name.into());
        decl
    }

    /// Disable the node: navigation skips it and it cannot be activated.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Text used for type-ahead matching instead of the label.
    #[must_use]
    pub fn text_value(mut self, text: impl Into<String>) -> Self {
        self.text_value = Some(text.into());
        self
    }

    /// Keep the menu open after this item is activated.
    #[must_use]
    pub fn keep_open(self) -> Self {
        self.close_on_select(false)
    }

    /// Override the configured close-on-select behaviour for this item.
    #[must_use]
    pub fn close_on_select(mut self, close: bool) -> Self {
        self.close_on_select = Some(close);
        self
    }

    /// Initial checkbox state.
    #[must_use]
    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Initial selection of a radio group.
    #[must_use]
    pub fn with_selected(mut self, id: impl Into<NodeId>) -> Self {
        self.selected = Some(id.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: NodeDecl) -> Self {
        self.children.push(child);
        self
    }
}

/// A validated node.
#[derive(Debug, Clone)]
pub struct MenuNode {
    id: NodeId,
    kind: NodeKind,
    label: String,
    text_value: Option<String>,
    disabled: bool,
    close_on_select: Option<bool>,
    checked: bool,
    radio_group: Option<RadioGroupId>,
    children: Vec<usize>,
}

impl MenuNode {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Text matched by type-ahead: the explicit text value, else the label.
    #[must_use]
    pub fn text_value(&self) -> &str {
        self.text_value.as_deref().unwrap_or(&self.label)
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Interactive and enabled.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.kind.is_interactive() && !self.disabled
    }

    /// Per-item close-on-select override, if any.
    #[must_use]
    pub fn close_on_select(&self) -> Option<bool> {
        self.close_on_select
    }

    /// Declared initial checkbox state.
    #[must_use]
    pub fn initially_checked(&self) -> bool {
        self.checked
    }

    /// The radio group this node belongs to (radio items) or names (radio groups).
    #[must_use]
    pub fn radio_group(&self) -> Option<&RadioGroupId> {
        self.radio_group.as_ref()
    }
}

/// A radio group as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioGroupDecl {
    pub id: RadioGroupId,
    pub members: Vec<NodeId>,
    pub selected: Option<NodeId>,
}

/// The validated, immutable menu hierarchy.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
    index: AHashMap<NodeId, usize>,
    roots: Vec<usize>,
    radio_groups: Vec<RadioGroupDecl>,
    levels: AHashMap<LevelId, Vec<usize>>,
    node_levels: Vec<LevelId>,
}

impl MenuTree {
    /// Build a tree, failing on the first malformed node.
    pub fn build(decls: impl IntoIterator<Item = NodeDecl>) -> Result<Self, TreeError> {
        let (tree, errors) = Self::build_lenient(decls);
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(tree),
        }
    }

    /// Build a tree, dropping every malformed subtree.
    ///
    /// Returns the surviving tree together with one error per dropped subtree.
    pub fn build_lenient(decls: impl IntoIterator<Item = NodeDecl>) -> (Self, Vec<TreeError>) {
        let mut builder = Builder::default();
        let roots: Vec<usize> = decls
            .into_iter()
            .filter_map(|decl| builder.insert(decl, None))
            .collect();

        #[cfg(feature = "tracing")]
        for err in &builder.errors {
            tracing::warn!(message = "menu.tree.rejected", error = %err);
        }

        let mut tree = Self {
            nodes: builder.nodes,
            index: builder.index,
            roots,
            radio_groups: builder.radio_groups,
            levels: AHashMap::new(),
            node_levels: Vec::new(),
        };
        tree.index_levels();
        (tree, builder.errors)
    }

    fn index_levels(&mut self) {
        let mut node_levels = vec![LevelId::Root; self.nodes.len()];
        let mut levels = AHashMap::new();

        let mut pending = vec![(LevelId::Root, self.roots.clone())];
        while let Some((level, children)) = pending.pop() {
            let mut entries = Vec::new();
            let mut stack: Vec<usize> = children.into_iter().rev().collect();
            while let Some(idx) = stack.pop() {
                node_levels[idx] = level;
                let node = &self.nodes[idx];
                match node.kind {
                    NodeKind::Group => stack.extend(node.children.iter().rev().copied()),
                    NodeKind::SubmenuTrigger => {
                        entries.push(idx);
                        pending.push((LevelId::Submenu(node.id), node.children.clone()));
                    }
                    _ => entries.push(idx),
                }
            }
            levels.insert(level, entries);
        }

        self.levels = levels;
        self.node_levels = node_levels;
    }

    /// Number of nodes (groups included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&MenuNode> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// All nodes in tree order.
    pub fn nodes(&self) -> impl Iterator<Item = &MenuNode> {
        self.nodes.iter()
    }

    /// Declared radio groups in tree order.
    #[must_use]
    pub fn radio_groups(&self) -> &[RadioGroupDecl] {
        &self.radio_groups
    }

    /// The level a node is displayed in.
    #[must_use]
    pub fn level_of(&self, id: NodeId) -> Option<LevelId> {
        self.index.get(&id).map(|&idx| self.node_levels[idx])
    }

    /// Nodes displayed in `level`, in tree order, groups flattened away.
    pub fn level_entries(&self, level: LevelId) -> impl Iterator<Item = &MenuNode> {
        self.levels
            .get(&level)
            .into_iter()
            .flatten()
            .map(|&idx| &self.nodes[idx])
    }

    /// Ids of the enabled interactive nodes of `level`, in tree order.
    #[must_use]
    pub fn navigable(&self, level: LevelId) -> Vec<NodeId> {
        self.level_entries(level)
            .filter(|node| node.is_navigable())
            .map(MenuNode::id)
            .collect()
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<MenuNode>,
    index: AHashMap<NodeId, usize>,
    radio_groups: Vec<RadioGroupDecl>,
    group_names: AHashSet<RadioGroupId>,
    errors: Vec<TreeError>,
}

impl Builder {
    /// Insert a subtree, rolling it back entirely if it fails validation.
    fn insert(
        &mut self,
        decl: NodeDecl,
        radio: Option<&RadioGroupId>,
    ) -> Option<usize> {
        let mark = self.nodes.len();
        let groups_mark = self.radio_groups.len();
        match self.try_insert(decl, radio) {
            Ok(idx) => Some(idx),
            Err(err) => {
                self.rollback(mark, groups_mark);
                self.errors.push(err);
                None
            }
        }
    }

    fn try_insert(
        &mut self,
        decl: NodeDecl,
        radio: Option<&RadioGroupId>,
    ) -> Result<usize, TreeError> {
        let NodeDecl {
            id,
            kind,
            label,
            text_value,
            disabled,
            close_on_select,
            checked,
            radio_name,
            selected,
            children,
        } = decl;

        if self.index.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        if !children.is_empty() && !kind.accepts_children() {
            return Err(TreeError::ChildrenOnLeaf { id, kind });
        }

        let own_group = match (kind, radio_name) {
            (NodeKind::Group, Some(name)) => {
                if name.is_empty() {
                    return Err(TreeError::EmptyRadioGroupName(id));
                }
                if let Some(outer) = radio {
                    return Err(TreeError::NestedRadioGroup {
                        inner: name,
                        outer: outer.as_str().to_owned(),
                    });
                }
                let group = RadioGroupId::new(name);
                if self.group_names.contains(&group) {
                    return Err(TreeError::DuplicateRadioGroup(group.0));
                }
                Some(group)
            }
            _ => None,
        };

        let radio_group = match kind {
            NodeKind::RadioItem => match radio {
                Some(group) => Some(group.clone()),
                None => return Err(TreeError::RadioOutsideGroup(id)),
            },
            _ => own_group.clone(),
        };

        let idx = self.nodes.len();
        self.nodes.push(MenuNode {
            id,
            kind,
            label,
            text_value,
            disabled,
            close_on_select,
            checked,
            radio_group,
            children: Vec::new(),
        });
        self.index.insert(id, idx);

        let group_slot = own_group.as_ref().map(|group| {
            self.group_names.insert(group.clone());
            self.radio_groups.push(RadioGroupDecl {
                id: group.clone(),
                members: Vec::new(),
                selected: None,
            });
            self.radio_groups.len() - 1
        });

        // A submenu starts a fresh scope: radio groups do not reach into it.
        let child_radio = match kind {
            NodeKind::SubmenuTrigger => None,
            _ => own_group.as_ref().or(radio),
        };
        let child_radio = child_radio.cloned();
        let mut child_indices = Vec::with_capacity(children.len());
        for child in children {
            if let Some(child_idx) = self.insert(child, child_radio.as_ref()) {
                child_indices.push(child_idx);
            }
        }
        self.nodes[idx].children = child_indices;

        if let Some(slot) = group_slot {
            let members: Vec<NodeId> = self.nodes[idx..]
                .iter()
                .filter(|n| n.kind == NodeKind::RadioItem && n.radio_group == own_group)
                .map(|n| n.id)
                .collect();
            if let Some(sel) = selected
                && !members.contains(&sel)
            {
                return Err(TreeError::SelectionNotInGroup {
                    group: self.radio_groups[slot].id.as_str().to_owned(),
                    selected: sel,
                });
            }
            let decl = &mut self.radio_groups[slot];
            decl.members = members;
            decl.selected = selected;
        }

        Ok(idx)
    }

    fn rollback(&mut self, mark: usize, groups_mark: usize) {
        for node in self.nodes.drain(mark..) {
            self.index.remove(&node.id);
        }
        for group in self.radio_groups.drain(groups_mark..) {
            self.group_names.remove(&group.id);
        }
    }
}
