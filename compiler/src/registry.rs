// registry.rs — Classifier registry
//
// Maps classifier element paths to the two sets the serializer and the
// dependency builder care about: stub classifiers (unresolved placeholders
// never distributed) and primitive types (scalars with no further graph
// structure, never dependency targets). Paths are resolved against a
// concrete graph once per run into `ClassifierSets` of node ids.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::m3::paths;
use crate::navigation::Navigator;

// ── Registry ────────────────────────────────────────────────────────────────

/// Classifier paths considered stubs and primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRegistry {
    pub stub_classifiers: BTreeSet<String>,
    pub primitive_types: BTreeSet<String>,
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        ClassifierRegistry {
            stub_classifiers: [paths::IMPORT_STUB, paths::PROPERTY_STUB, paths::ENUM_STUB]
                .into_iter()
                .map(str::to_string)
                .collect(),
            primitive_types: paths::PRIMITIVES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ClassifierRegistry {
    pub fn is_stub_path(&self, path: &str) -> bool {
        self.stub_classifiers.contains(path)
    }

    pub fn is_primitive_path(&self, path: &str) -> bool {
        self.primitive_types.contains(path)
    }

    /// Canonical compact JSON (sorted sets, no whitespace), used for
    /// fingerprinting. Stable independent of the order paths were added.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Resolve the registered paths against a graph. Paths with no node in
    /// the graph are skipped.
    pub fn resolve(&self, nav: &Navigator<'_>) -> ClassifierSets {
        let lookup = |set: &BTreeSet<String>| -> HashSet<NodeId> {
            set.iter().filter_map(|path| nav.lookup(path)).collect()
        };
        let sets = ClassifierSets {
            stubs: lookup(&self.stub_classifiers),
            primitives: lookup(&self.primitive_types),
        };
        tracing::debug!(
            stubs = sets.stubs.len(),
            primitives = sets.primitives.len(),
            "resolved classifier registry"
        );
        sets
    }
}

// ── Resolved sets ───────────────────────────────────────────────────────────

/// Stub and primitive classifiers of one graph, as node ids.
#[derive(Debug, Clone, Default)]
pub struct ClassifierSets {
    pub stubs: HashSet<NodeId>,
    pub primitives: HashSet<NodeId>,
}

impl ClassifierSets {
    pub fn is_stub(&self, classifier: NodeId) -> bool {
        self.stubs.contains(&classifier)
    }

    pub fn is_primitive(&self, classifier: NodeId) -> bool {
        self.primitives.contains(&classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ModelBuilder;

    #[test]
    fn defaults_cover_stubs_and_primitives() {
        let reg = ClassifierRegistry::default();
        assert!(reg.is_stub_path(paths::IMPORT_STUB));
        assert!(reg.is_primitive_path("String"));
        assert!(!reg.is_primitive_path(paths::CLASS));
    }

    #[test]
    fn resolve_finds_bootstrap_nodes() {
        let b = ModelBuilder::new();
        let string = b.primitive("String");
        let stub = b.core(paths::IMPORT_STUB).unwrap();
        let graph = b.finish();
        let nav = Navigator::new(&graph);
        let sets = ClassifierRegistry::default().resolve(&nav);
        assert!(sets.is_primitive(string));
        assert!(sets.is_stub(stub));
        assert_eq!(sets.primitives.len(), paths::PRIMITIVES.len());
    }

    #[test]
    fn unknown_paths_are_skipped() {
        let mut reg = ClassifierRegistry::default();
        reg.primitive_types.insert("nowhere::Thing".into());
        let graph = ModelBuilder::new().finish();
        let nav = Navigator::new(&graph);
        let sets = reg.resolve(&nav);
        assert_eq!(sets.primitives.len(), paths::PRIMITIVES.len());
    }

    #[test]
    fn canonical_json_is_order_independent() {
        let mut a = ClassifierRegistry::default();
        a.primitive_types.insert("x::A".into());
        a.primitive_types.insert("x::B".into());
        let mut b = ClassifierRegistry::default();
        b.primitive_types.insert("x::B".into());
        b.primitive_types.insert("x::A".into());
        assert_eq!(a.canonical_json(), b.canonical_json());
        assert!(!a.canonical_json().contains(' '));
    }
}
