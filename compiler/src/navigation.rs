// navigation.rs — Model graph navigation helpers
//
// Read-only queries over a `ModelGraph`: element paths, stub resolution,
// resolved property access, instance-of checks against the generalization
// lattice, and function signatures.
//
// Preconditions: the metamodel classifiers referenced by `m3::paths` exist in
//                the graph (see `bootstrap`); missing ones make the matching
//                predicates return false.
// Postconditions: none (queries only).
// Failure modes: `function_signature` reports malformed function types.
// Side effects: none.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::id::NodeId;
use crate::m3::{paths, props, ROOT_PACKAGE};
use crate::model::ModelGraph;

/// Stub chains longer than this are treated as unresolved.
const MAX_STUB_DEPTH: usize = 16;

// ── Element paths ───────────────────────────────────────────────────────────

/// Package-qualified path of `node` (`model::Person`), with the `Root`
/// package omitted. `None` for unnamed nodes or cyclic package chains.
pub fn element_path(graph: &ModelGraph, node: NodeId) -> Option<String> {
    let mut segments = Vec::new();
    let mut seen = HashSet::new();
    let mut current = node;
    loop {
        if !seen.insert(current) {
            return None;
        }
        let name = graph.node(current).name.as_deref()?;
        match graph.to_one(current, props::PACKAGE) {
            Some(parent) => {
                segments.push(name);
                current = parent;
            }
            None => {
                if segments.is_empty() || name != ROOT_PACKAGE {
                    segments.push(name);
                }
                break;
            }
        }
    }
    segments.reverse();
    Some(segments.join("::"))
}

// ── Function signatures ─────────────────────────────────────────────────────

/// Parameter and return types (as GenericType nodes) of a function-like node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSignature {
    pub parameter_types: Vec<NodeId>,
    pub return_type: Option<NodeId>,
}

/// A function-like node whose signature cannot be read. These indicate an
/// invalid graph from upstream and abort the current build step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("{node} ({name}) has no function type")]
    MissingFunctionType { node: NodeId, name: String },
    #[error("function type of {node} ({name}) has no return type")]
    MissingReturnType { node: NodeId, name: String },
}

// ── Navigator ───────────────────────────────────────────────────────────────

/// Path-indexed view of a model graph.
///
/// Built once per analysis; indexes every packaged element by its element
/// path so metamodel lookups are id comparisons afterwards.
pub struct Navigator<'g> {
    graph: &'g ModelGraph,
    by_path: HashMap<String, NodeId>,
    stubs: Vec<(NodeId, &'static str)>,
}

impl<'g> Navigator<'g> {
    pub fn new(graph: &'g ModelGraph) -> Self {
        let mut by_path = HashMap::new();
        for node in graph.iter() {
            let packaged = graph.to_one(node.id, props::PACKAGE).is_some()
                || node.name.as_deref() == Some(ROOT_PACKAGE);
            if !packaged {
                continue;
            }
            if let Some(path) = element_path(graph, node.id) {
                by_path.entry(path).or_insert(node.id);
            }
        }

        let stubs = [
            (paths::IMPORT_STUB, props::RESOLVED_NODE),
            (paths::PROPERTY_STUB, props::RESOLVED_PROPERTY),
            (paths::ENUM_STUB, props::RESOLVED_ENUM),
        ]
        .into_iter()
        .filter_map(|(path, prop)| by_path.get(path).map(|&id| (id, prop)))
        .collect();

        Navigator {
            graph,
            by_path,
            stubs,
        }
    }

    pub fn graph(&self) -> &'g ModelGraph {
        self.graph
    }

    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn element_path(&self, node: NodeId) -> Option<String> {
        element_path(self.graph, node)
    }

    /// Follow import/property/enum stubs to the node they stand for.
    /// Returns `None` when a stub is unresolved.
    pub fn resolve(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        for _ in 0..MAX_STUB_DEPTH {
            let classifier = match self.graph.node(current).classifier {
                Some(c) => c,
                None => return Some(current),
            };
            match self.stubs.iter().find(|(stub, _)| *stub == classifier) {
                Some((_, prop)) => current = self.graph.to_one(current, prop)?,
                None => return Some(current),
            }
        }
        None
    }

    pub fn to_one_resolved(&self, node: NodeId, property: &str) -> Option<NodeId> {
        self.graph
            .to_one(node, property)
            .and_then(|target| self.resolve(target))
    }

    pub fn to_many_resolved(&self, node: NodeId, property: &str) -> Vec<NodeId> {
        self.graph
            .to_many(node, property)
            .iter()
            .filter_map(|&target| self.resolve(target))
            .collect()
    }

    /// Resolved classifier of `node`.
    pub fn classifier(&self, node: NodeId) -> Option<NodeId> {
        self.graph
            .node(node)
            .classifier
            .and_then(|c| self.resolve(c))
    }

    pub fn classifier_path(&self, node: NodeId) -> Option<String> {
        self.classifier(node).and_then(|c| self.element_path(c))
    }

    /// Raw types of the direct generalizations of `ty`.
    pub fn supertypes(&self, ty: NodeId) -> Vec<NodeId> {
        self.to_many_resolved(ty, props::GENERALIZATIONS)
            .into_iter()
            .filter_map(|g| self.to_one_resolved(g, props::GENERAL))
            .filter_map(|generic| self.to_one_resolved(generic, props::RAW_TYPE))
            .collect()
    }

    /// True if `ty` is `target` or (transitively) generalizes to it.
    pub fn is_subtype(&self, ty: NodeId, target: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![ty];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.supertypes(current));
            }
        }
        false
    }

    /// True if the classifier of `node` is the type at `type_path` or one
    /// of its subtypes.
    pub fn instance_of(&self, node: NodeId, type_path: &str) -> bool {
        match (self.classifier(node), self.lookup(type_path)) {
            (Some(classifier), Some(target)) => self.is_subtype(classifier, target),
            _ => false,
        }
    }

    pub fn is_packageable_element(&self, node: NodeId) -> bool {
        self.instance_of(node, paths::PACKAGEABLE_ELEMENT)
    }

    /// Parameter and return types of a function, lambda, or property.
    ///
    /// Simple properties without a function type use their own generic type
    /// as the return type; everything else must carry a complete function type.
    pub fn function_signature(&self, node: NodeId) -> Result<FunctionSignature, SignatureError> {
        let function_type = match self.to_one_resolved(node, props::FUNCTION_TYPE) {
            Some(ft) => ft,
            None if self.instance_of(node, paths::PROPERTY) => {
                return Ok(FunctionSignature {
                    parameter_types: Vec::new(),
                    return_type: self.to_one_resolved(node, props::GENERIC_TYPE),
                });
            }
            None => {
                return Err(SignatureError::MissingFunctionType {
                    node,
                    name: self.display_name(node),
                })
            }
        };

        let return_type = self
            .to_one_resolved(function_type, props::RETURN_TYPE)
            .ok_or_else(|| SignatureError::MissingReturnType {
                node,
                name: self.display_name(node),
            })?;

        let parameter_types = self
            .to_many_resolved(function_type, props::PARAMETERS)
            .into_iter()
            .filter_map(|param| self.to_one_resolved(param, props::GENERIC_TYPE))
            .collect();

        Ok(FunctionSignature {
            parameter_types,
            return_type: Some(return_type),
        })
    }

    /// Element path, bare name, or `<anonymous>`; for messages only.
    pub fn display_name(&self, node: NodeId) -> String {
        self.element_path(node)
            .unwrap_or_else(|| "<anonymous>".to_string())
    }
}
