// depgraph.rs — Artifact dependency graph construction
//
// Walks type, function and closure nodes of a model graph and records, for
// every generated artifact, the set of artifacts it must be compiled with.
// Mutually coupled artifacts get edges in both directions so they land in one
// strongly connected component of the result.
//
// Preconditions: stubs are resolved (or resolvable through `Navigator`);
//                every function-like node carries a complete function type.
// Postconditions: the edge set depends only on the input node set, never on
//                 the order nodes are supplied in. No self-edges.
// Failure modes: `DependencyError::Signature` for a function, qualified
//                property or closure whose function type (or return type) is
//                missing. Unresolved or ineligible types are skipped.
// Side effects: none.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::id::NodeId;
use crate::m3::{paths, props};
use crate::naming::{ArtifactKind, ArtifactName, NamingScheme};
use crate::navigation::{Navigator, SignatureError};
use crate::registry::ClassifierSets;
use crate::walk::{GraphWalk, WalkVerdict};

// ── Dependency graph ────────────────────────────────────────────────────────

/// Directed graph over artifact names: `a → b` means `a` requires `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    edges: BTreeMap<ArtifactName, BTreeSet<ArtifactName>>,
    files: BTreeSet<ArtifactName>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` a node of the graph, with no edges if it is new.
    pub fn add_artifact(&mut self, name: &ArtifactName) {
        if !self.edges.contains_key(name) {
            self.edges.insert(name.clone(), BTreeSet::new());
        }
    }

    /// Record a file artifact. File artifacts are co-partitioned with the
    /// common runtime once the graph is complete.
    pub fn add_file_artifact(&mut self, name: &ArtifactName) {
        self.add_artifact(name);
        self.files.insert(name.clone());
    }

    /// Add `from → to`. Self-edges are ignored.
    pub fn add_edge(&mut self, from: &ArtifactName, to: &ArtifactName) {
        if from == to {
            return;
        }
        self.edges
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
    }

    pub fn add_mutual(&mut self, a: &ArtifactName, b: &ArtifactName) {
        self.add_edge(a, b);
        self.add_edge(b, a);
    }

    fn extend(&mut self, from: &ArtifactName, deps: &BTreeSet<ArtifactName>) {
        self.add_artifact(from);
        for dep in deps {
            self.add_edge(from, dep);
        }
    }

    pub fn requires(&self, from: &ArtifactName, to: &ArtifactName) -> bool {
        self.edges.get(from).is_some_and(|deps| deps.contains(to))
    }

    pub fn is_mutual(&self, a: &ArtifactName, b: &ArtifactName) -> bool {
        self.requires(a, b) && self.requires(b, a)
    }

    pub fn dependencies(&self, name: &ArtifactName) -> Option<&BTreeSet<ArtifactName>> {
        self.edges.get(name)
    }

    /// Artifacts that appear as edge sources (or were added explicitly).
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactName> {
        self.edges.keys()
    }

    /// Every artifact name mentioned anywhere in the graph, sorted.
    pub fn all_artifacts(&self) -> BTreeSet<&ArtifactName> {
        self.edges
            .iter()
            .flat_map(|(from, deps)| std::iter::once(from).chain(deps.iter()))
            .collect()
    }

    pub fn file_artifacts(&self) -> &BTreeSet<ArtifactName> {
        &self.files
    }

    pub fn edges(&self) -> &BTreeMap<ArtifactName, BTreeSet<ArtifactName>> {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

// ── Builder ─────────────────────────────────────────────────────────────────

/// Metamodel classifiers the builder dispatches on, resolved once.
struct Kinds {
    ty: Option<NodeId>,
    function_type: Option<NodeId>,
    unit: Option<NodeId>,
    measure: Option<NodeId>,
    package: Option<NodeId>,
    concrete_function: Option<NodeId>,
    lambda: Option<NodeId>,
    instance_value: Option<NodeId>,
    function_expression: Option<NodeId>,
    key_expression: Option<NodeId>,
}

/// Per-body visited set shared by expression and generic-type recursion.
type Visited = HashSet<NodeId>;

pub struct DependencyGraphBuilder<'a, 'g> {
    nav: &'a Navigator<'g>,
    naming: &'a NamingScheme,
    classifiers: &'a ClassifierSets,
    kinds: Kinds,
}

impl<'a, 'g> DependencyGraphBuilder<'a, 'g> {
    pub fn new(
        nav: &'a Navigator<'g>,
        naming: &'a NamingScheme,
        classifiers: &'a ClassifierSets,
    ) -> Self {
        let kinds = Kinds {
            ty: nav.lookup(paths::TYPE),
            function_type: nav.lookup(paths::FUNCTION_TYPE),
            unit: nav.lookup(paths::UNIT),
            measure: nav.lookup(paths::MEASURE),
            package: nav.lookup(paths::PACKAGE),
            concrete_function: nav.lookup(paths::CONCRETE_FUNCTION_DEFINITION),
            lambda: nav.lookup(paths::LAMBDA_FUNCTION),
            instance_value: nav.lookup(paths::INSTANCE_VALUE),
            function_expression: nav.lookup(paths::FUNCTION_EXPRESSION),
            key_expression: nav.lookup(paths::KEY_EXPRESSION),
        };
        DependencyGraphBuilder {
            nav,
            naming,
            classifiers,
            kinds,
        }
    }

    /// Build the dependency graph of every type, function and closure
    /// reachable from the repository roots.
    pub fn build_for_repository(&self) -> Result<DependencyGraph, DependencyError> {
        let graph = self.nav.graph();
        let nodes: Vec<NodeId> = GraphWalk::from_repository(graph, |node| {
            match self.nav.classifier(node) {
                Some(c) if self.classifiers.is_primitive(c) => WalkVerdict::RejectAndStop,
                _ if self.is_buildable(node) => WalkVerdict::AcceptAndContinue,
                _ => WalkVerdict::RejectAndContinue,
            }
        })
        .collect();
        tracing::debug!(candidates = nodes.len(), "collected dependency candidates");
        self.build(nodes)
    }

    /// Build the dependency graph for the given type and function nodes.
    /// Other nodes are ignored.
    pub fn build<I>(&self, nodes: I) -> Result<DependencyGraph, DependencyError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut out = DependencyGraph::new();
        for node in nodes {
            if self.is(node, self.kinds.ty) {
                self.add_type(node, &mut out)?;
            } else if self.is(node, self.kinds.concrete_function) || self.is(node, self.kinds.lambda) {
                self.add_function(node, &mut out)?;
            }
        }
        self.link_runtime(&mut out);
        tracing::debug!(
            artifacts = out.len(),
            edges = out.edge_count(),
            files = out.file_artifacts().len(),
            "built dependency graph"
        );
        Ok(out)
    }

    fn is_buildable(&self, node: NodeId) -> bool {
        self.is(node, self.kinds.ty)
            || self.is(node, self.kinds.concrete_function)
            || self.is(node, self.kinds.lambda)
    }

    fn is(&self, node: NodeId, kind: Option<NodeId>) -> bool {
        match (self.nav.classifier(node), kind) {
            (Some(classifier), Some(kind)) => self.nav.is_subtype(classifier, kind),
            _ => false,
        }
    }

    /// A raw type gets artifacts of its own only if it is a named type that
    /// is not a function type or a primitive, and is packaged (or a unit or
    /// measure).
    fn is_eligible(&self, raw: NodeId) -> bool {
        let Some(classifier) = self.nav.classifier(raw) else {
            return false;
        };
        if self.classifiers.is_primitive(classifier) || self.classifiers.primitives.contains(&raw) {
            return false;
        }
        self.is(raw, self.kinds.ty)
            && !self.is(raw, self.kinds.function_type)
            && (self.nav.is_packageable_element(raw)
                || self.is(raw, self.kinds.unit)
                || self.is(raw, self.kinds.measure))
    }

    fn artifact(&self, raw: NodeId, kind: ArtifactKind) -> Option<ArtifactName> {
        let path = self.nav.element_path(raw)?;
        Some(self.naming.type_artifact(&path, kind))
    }

    fn file_artifact(&self, node: NodeId) -> Option<ArtifactName> {
        let source = self.nav.graph().node(node).source.as_ref()?;
        Some(self.naming.file_artifact(&source.source))
    }

    // ── Types ───────────────────────────────────────────────────────────

    fn add_type(&self, ty: NodeId, out: &mut DependencyGraph) -> Result<(), DependencyError> {
        if !self.is_eligible(ty) {
            tracing::trace!(node = %ty, "skipping ineligible type");
            return Ok(());
        }
        let Some(path) = self.nav.element_path(ty) else {
            return Ok(());
        };
        let names = self.naming.type_artifacts(&path);
        for kind in ArtifactKind::ALL {
            let from = &names[kind as usize];
            out.add_artifact(from);
            for &required in kind.requires() {
                out.add_edge(from, &names[required as usize]);
            }
        }
        let interface = &names[ArtifactKind::Interface as usize];
        let implementation = &names[ArtifactKind::Impl as usize];

        let mut impl_deps = BTreeSet::new();
        let mut interface_deps = BTreeSet::new();

        for generalization in self.nav.to_many_resolved(ty, props::GENERALIZATIONS) {
            let Some(general) = self.nav.to_one_resolved(generalization, props::GENERAL) else {
                continue;
            };
            self.generic_type_deps(general, &mut impl_deps, &mut Visited::new());
            if let Some(raw) = self.nav.to_one_resolved(general, props::RAW_TYPE) {
                self.push_type(raw, ArtifactKind::Interface, &mut interface_deps);
            }
        }

        if let Some(file) = self.file_artifact(ty) {
            out.add_file_artifact(&file);
            impl_deps.insert(file);
        }

        for property in self.nav.to_many_resolved(ty, props::PROPERTIES) {
            match self.nav.function_signature(property) {
                Ok(signature) => {
                    let types = signature
                        .return_type
                        .into_iter()
                        .chain(signature.parameter_types);
                    for generic in types {
                        self.generic_type_deps(generic, &mut impl_deps, &mut Visited::new());
                        self.interface_deps(generic, &mut interface_deps, &mut Visited::new());
                    }
                }
                Err(err) => tracing::trace!(node = %property, %err, "property without signature"),
            }
        }

        for property in self.nav.to_many_resolved(ty, props::QUALIFIED_PROPERTIES) {
            self.signature_deps(property, &mut impl_deps)?;
            self.expression_sequence_deps(property, &mut impl_deps, &mut Visited::new(), out)?;
        }

        for constraint in self.nav.to_many_resolved(ty, props::CONSTRAINTS) {
            if let Some(predicate) = self.nav.to_one_resolved(constraint, props::FUNCTION_DEFINITION) {
                self.expression_sequence_deps(predicate, &mut impl_deps, &mut Visited::new(), out)?;
            }
        }

        if self.is(ty, self.kinds.unit) {
            if let Some(measure) = self.nav.to_one_resolved(ty, props::MEASURE) {
                if self.is_eligible(measure) {
                    self.push_type(measure, ArtifactKind::Impl, &mut impl_deps);
                    self.push_type(measure, ArtifactKind::Interface, &mut interface_deps);
                }
            }
        }

        out.extend(implementation, &impl_deps);
        out.extend(interface, &interface_deps);
        Ok(())
    }

    fn push_type(&self, raw: NodeId, kind: ArtifactKind, deps: &mut BTreeSet<ArtifactName>) {
        if self.is_eligible(raw) {
            if let Some(name) = self.artifact(raw, kind) {
                deps.insert(name);
            }
        }
    }

    /// Implementation artifacts of every eligible raw type in the
    /// type-argument tree of `generic`.
    fn generic_type_deps(
        &self,
        generic: NodeId,
        deps: &mut BTreeSet<ArtifactName>,
        visited: &mut Visited,
    ) {
        if !visited.insert(generic) {
            return;
        }
        if let Some(raw) = self.nav.to_one_resolved(generic, props::RAW_TYPE) {
            self.push_type(raw, ArtifactKind::Impl, deps);
        }
        for argument in self.nav.to_many_resolved(generic, props::TYPE_ARGUMENTS) {
            self.generic_type_deps(argument, deps, visited);
        }
    }

    /// Interface artifacts of every eligible raw type in the type-argument
    /// tree of `generic`.
    fn interface_deps(&self, generic: NodeId, deps: &mut BTreeSet<ArtifactName>, visited: &mut Visited) {
        if !visited.insert(generic) {
            return;
        }
        if let Some(raw) = self.nav.to_one_resolved(generic, props::RAW_TYPE) {
            self.push_type(raw, ArtifactKind::Interface, deps);
        }
        for argument in self.nav.to_many_resolved(generic, props::TYPE_ARGUMENTS) {
            self.interface_deps(argument, deps, visited);
        }
    }

    // ── Functions and closures ──────────────────────────────────────────

    fn add_function(&self, function: NodeId, out: &mut DependencyGraph) -> Result<(), DependencyError> {
        let Some(file) = self.file_artifact(function) else {
            tracing::trace!(node = %function, "function without origin has no file artifact");
            return Ok(());
        };
        out.add_file_artifact(&file);
        let mut deps = BTreeSet::new();
        let mut visited = Visited::new();
        self.signature_deps(function, &mut deps)?;
        self.expression_sequence_deps(function, &mut deps, &mut visited, out)?;
        out.extend(&file, &deps);
        Ok(())
    }

    fn signature_deps(&self, function: NodeId, deps: &mut BTreeSet<ArtifactName>) -> Result<(), DependencyError> {
        let signature = self.nav.function_signature(function)?;
        let types = signature
            .return_type
            .into_iter()
            .chain(signature.parameter_types);
        for generic in types {
            self.generic_type_deps(generic, deps, &mut Visited::new());
        }
        Ok(())
    }

    fn expression_sequence_deps(
        &self,
        owner: NodeId,
        deps: &mut BTreeSet<ArtifactName>,
        visited: &mut Visited,
        out: &mut DependencyGraph,
    ) -> Result<(), DependencyError> {
        for expression in self.nav.to_many_resolved(owner, props::EXPRESSION_SEQUENCE) {
            self.expression_deps(expression, deps, visited, out)?;
        }
        Ok(())
    }

    fn expression_deps(
        &self,
        expression: NodeId,
        deps: &mut BTreeSet<ArtifactName>,
        visited: &mut Visited,
        out: &mut DependencyGraph,
    ) -> Result<(), DependencyError> {
        if !visited.insert(expression) {
            return Ok(());
        }
        if let Some(generic) = self.nav.to_one_resolved(expression, props::GENERIC_TYPE) {
            self.generic_type_deps(generic, deps, visited);
        }

        if self.is(expression, self.kinds.instance_value) {
            for value in self.nav.to_many_resolved(expression, props::VALUES) {
                if self.is_eligible(value) {
                    self.push_type(value, ArtifactKind::Impl, deps);
                } else if self.is(value, self.kinds.package) {
                    continue;
                } else if self.is(value, self.kinds.lambda) {
                    self.closure_deps(value, deps, visited, out)?;
                } else if self.is(value, self.kinds.key_expression) {
                    if let Some(inner) = self.nav.to_one_resolved(value, props::EXPRESSION) {
                        self.expression_deps(inner, deps, visited, out)?;
                    }
                }
            }
        } else if self.is(expression, self.kinds.function_expression) {
            if let Some(func) = self.nav.to_one_resolved(expression, props::FUNC) {
                if self.is(func, self.kinds.concrete_function) {
                    if let Some(file) = self.file_artifact(func) {
                        deps.insert(file);
                    }
                }
            }
            for argument in self.nav.to_many_resolved(expression, props::PARAMETERS_VALUES) {
                self.expression_deps(argument, deps, visited, out)?;
            }
        }
        Ok(())
    }

    /// A closure embedded in a literal. With an origin it accumulates into
    /// its own file artifact, and the enclosing artifact inherits everything
    /// the closure needs. Without one its needs go straight to the enclosing
    /// artifact.
    ///
    /// A sourced closure is walked with its own visited set so nodes already
    /// seen by the enclosing body still reach the closure's file. Closures
    /// on the current walk path are carried into that set and never re-entered.
    fn closure_deps(
        &self,
        closure: NodeId,
        deps: &mut BTreeSet<ArtifactName>,
        visited: &mut Visited,
        out: &mut DependencyGraph,
    ) -> Result<(), DependencyError> {
        if !visited.insert(closure) {
            return Ok(());
        }
        match self.file_artifact(closure) {
            Some(file) => {
                out.add_file_artifact(&file);
                let mut own = BTreeSet::new();
                let mut inner: Visited = visited
                    .iter()
                    .copied()
                    .filter(|&n| self.is(n, self.kinds.lambda))
                    .collect();
                self.signature_deps(closure, &mut own)?;
                self.expression_sequence_deps(closure, &mut own, &mut inner, out)?;
                out.extend(&file, &own);
                own.remove(&file);
                deps.extend(own);
            }
            None => {
                self.signature_deps(closure, deps)?;
                self.expression_sequence_deps(closure, deps, visited, out)?;
            }
        }
        Ok(())
    }

    // ── Runtime artifacts ───────────────────────────────────────────────

    fn link_runtime(&self, out: &mut DependencyGraph) {
        let core = self.naming.common_runtime();
        out.add_artifact(core);
        let files: Vec<ArtifactName> = out.file_artifacts().iter().cloned().collect();
        for file in &files {
            out.add_mutual(file, core);
        }

        let lambda = self.naming.lambda_runtime();
        out.add_artifact(lambda);
        out.add_mutual(lambda, core);

        let enum_support = self.naming.enum_support();
        out.add_artifact(enum_support);
        out.add_edge(enum_support, self.naming.enum_base());
        out.add_mutual(enum_support, core);
    }
}
