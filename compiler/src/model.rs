// model.rs — Arena-backed model graph
//
// The model graph is a heterogeneous, possibly cyclic object graph: every
// node has an optional classifier (another node), an optional origin
// location, and an ordered list of named properties pointing at one or many
// child nodes. All references are `NodeId` indices into one arena.
//
// Preconditions: none.
// Postconditions: property declaration order is preserved exactly as added.
// Failure modes: none; ids always come from the arena that is indexed.
// Side effects: none.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{IdAllocator, NodeId};

// ── Origin location ─────────────────────────────────────────────────────────

/// Source file and line/column span a node was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInformation {
    pub source: String,
    #[serde(default)]
    pub start_line: u32,
    #[serde(default)]
    pub start_column: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub end_column: u32,
}

impl SourceInformation {
    /// Location covering a single line range of `source`.
    pub fn new(source: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            source: source.into(),
            start_line,
            start_column: 1,
            end_line,
            end_column: 1,
        }
    }
}

impl fmt::Display for SourceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.source, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

// ── Nodes ───────────────────────────────────────────────────────────────────

/// Value of a named property: a single child or an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    One(NodeId),
    Many(Vec<NodeId>),
}

impl PropertyValue {
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            PropertyValue::One(id) => std::slice::from_ref(id),
            PropertyValue::Many(ids) => ids,
        }
    }
}

/// A node in the model graph.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub classifier: Option<NodeId>,
    pub source: Option<SourceInformation>,
    properties: Vec<(String, PropertyValue)>,
}

impl ModelNode {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every child reachable through a property edge, in declaration order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.properties
            .iter()
            .flat_map(|(_, value)| value.as_slice().iter().copied())
    }
}

// ── Graph ───────────────────────────────────────────────────────────────────

/// The model repository: an arena of nodes plus the ordered top-level roots.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    nodes: Vec<ModelNode>,
    ids: IdAllocator,
    roots: Vec<NodeId>,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: Option<String>, source: Option<SourceInformation>) -> NodeId {
        let id = self.ids.alloc_node();
        self.nodes.push(ModelNode {
            id,
            name,
            classifier: None,
            source,
            properties: Vec::new(),
        });
        id
    }

    pub fn set_classifier(&mut self, node: NodeId, classifier: NodeId) {
        self.nodes[node.index()].classifier = Some(classifier);
    }

    pub fn set_source(&mut self, node: NodeId, source: SourceInformation) {
        self.nodes[node.index()].source = Some(source);
    }

    /// Set a to-one property, replacing any previous value.
    pub fn set_to_one(&mut self, node: NodeId, property: &str, target: NodeId) {
        self.set_property(node, property, PropertyValue::One(target));
    }

    /// Set a to-many property, replacing any previous value.
    pub fn set_to_many(&mut self, node: NodeId, property: &str, targets: Vec<NodeId>) {
        self.set_property(node, property, PropertyValue::Many(targets));
    }

    /// Append to a to-many property, creating it on first use.
    pub fn add_to_many(&mut self, node: NodeId, property: &str, target: NodeId) {
        let props = &mut self.nodes[node.index()].properties;
        match props.iter_mut().find(|(key, _)| key == property) {
            Some((_, PropertyValue::Many(ids))) => ids.push(target),
            Some((_, slot)) => {
                let mut ids = slot.as_slice().to_vec();
                ids.push(target);
                *slot = PropertyValue::Many(ids);
            }
            None => props.push((property.to_string(), PropertyValue::Many(vec![target]))),
        }
    }

    fn set_property(&mut self, node: NodeId, property: &str, value: PropertyValue) {
        let props = &mut self.nodes[node.index()].properties;
        match props.iter_mut().find(|(key, _)| key == property) {
            Some((_, slot)) => *slot = value,
            None => props.push((property.to_string(), value)),
        }
    }

    pub fn add_root(&mut self, node: NodeId) {
        if !self.roots.contains(&node) {
            self.roots.push(node);
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &ModelNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(id.index())
    }

    /// Raw (unresolved) to-one lookup. A to-many property yields its first element.
    pub fn to_one(&self, node: NodeId, property: &str) -> Option<NodeId> {
        self.node(node)
            .property(property)
            .and_then(|value| value.as_slice().first().copied())
    }

    /// Raw (unresolved) to-many lookup. Missing properties yield an empty slice.
    pub fn to_many(&self, node: NodeId, property: &str) -> &[NodeId] {
        self.node(node)
            .property(property)
            .map(PropertyValue::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelNode> {
        self.nodes.iter()
    }
}
