// bootstrap.rs — Core metamodel and model construction helpers
//
// `ModelBuilder::new()` seeds an arena with the `Root` package, the core
// metamodel classifiers (Class, Type, FunctionType, InstanceValue, ...) with
// their generalization lattice, and the primitive types. The remaining
// methods build user elements the way a front-end would: packaged elements,
// generic types, properties, functions, lambdas and expression trees.
//
// Preconditions: none.
// Postconditions: every node created through the builder has a classifier.
// Failure modes: none.
// Side effects: none.

use std::collections::HashMap;

use crate::id::NodeId;
use crate::m3::{paths, props, ROOT_PACKAGE};
use crate::model::{ModelGraph, SourceInformation};

/// Generalization lattice of the core metamodel: (type, direct supertypes).
const LATTICE: &[(&str, &[&str])] = &[
    (paths::ANY, &[]),
    (paths::MODEL_ELEMENT, &[paths::ANY]),
    (paths::PACKAGEABLE_ELEMENT, &[paths::MODEL_ELEMENT]),
    (paths::PACKAGE, &[paths::PACKAGEABLE_ELEMENT]),
    (paths::TYPE, &[paths::ANY]),
    (paths::CLASS, &[paths::TYPE, paths::PACKAGEABLE_ELEMENT]),
    (paths::DATA_TYPE, &[paths::TYPE]),
    (paths::PRIMITIVE_TYPE, &[paths::DATA_TYPE, paths::PACKAGEABLE_ELEMENT]),
    (paths::ENUMERATION, &[paths::DATA_TYPE, paths::PACKAGEABLE_ELEMENT]),
    (paths::ENUM, &[paths::ANY]),
    (paths::UNIT, &[paths::DATA_TYPE]),
    (paths::MEASURE, &[paths::DATA_TYPE, paths::PACKAGEABLE_ELEMENT]),
    (paths::FUNCTION_TYPE, &[paths::TYPE]),
    (paths::GENERIC_TYPE, &[paths::ANY]),
    (paths::GENERALIZATION, &[paths::ANY]),
    (paths::FUNCTION, &[paths::ANY]),
    (paths::FUNCTION_DEFINITION, &[paths::FUNCTION]),
    (
        paths::CONCRETE_FUNCTION_DEFINITION,
        &[paths::FUNCTION_DEFINITION, paths::PACKAGEABLE_ELEMENT],
    ),
    (paths::LAMBDA_FUNCTION, &[paths::FUNCTION_DEFINITION]),
    (paths::NATIVE_FUNCTION, &[paths::FUNCTION, paths::PACKAGEABLE_ELEMENT]),
    (paths::ABSTRACT_PROPERTY, &[paths::FUNCTION]),
    (paths::PROPERTY, &[paths::ABSTRACT_PROPERTY]),
    (paths::QUALIFIED_PROPERTY, &[paths::ABSTRACT_PROPERTY]),
    (paths::CONSTRAINT, &[paths::ANY]),
    (paths::VALUE_SPECIFICATION, &[paths::ANY]),
    (paths::INSTANCE_VALUE, &[paths::VALUE_SPECIFICATION]),
    (paths::FUNCTION_EXPRESSION, &[paths::VALUE_SPECIFICATION]),
    (paths::SIMPLE_FUNCTION_EXPRESSION, &[paths::FUNCTION_EXPRESSION]),
    (paths::VARIABLE_EXPRESSION, &[paths::VALUE_SPECIFICATION]),
    (paths::KEY_EXPRESSION, &[paths::ANY]),
    (paths::IMPORT_STUB, &[paths::ANY]),
    (paths::PROPERTY_STUB, &[paths::ANY]),
    (paths::ENUM_STUB, &[paths::ANY]),
];

/// Builds a model graph on top of the bootstrapped core metamodel.
pub struct ModelBuilder {
    graph: ModelGraph,
    root: NodeId,
    packages: HashMap<String, NodeId>,
    core: HashMap<&'static str, NodeId>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        let mut graph = ModelGraph::new();
        let root = graph.add_node(Some(ROOT_PACKAGE.to_string()), None);
        graph.add_root(root);

        let mut builder = ModelBuilder {
            graph,
            root,
            packages: HashMap::new(),
            core: HashMap::new(),
        };
        builder.packages.insert(String::new(), root);

        for (path, _) in LATTICE {
            let id = builder.packaged_node(path);
            builder.core.insert(*path, id);
        }
        for name in paths::PRIMITIVES {
            let id = builder.packaged_node(name);
            builder.core.insert(*name, id);
        }

        let class = builder.core[paths::CLASS];
        let package = builder.core[paths::PACKAGE];
        let primitive = builder.core[paths::PRIMITIVE_TYPE];
        let created: Vec<NodeId> = builder.packages.values().copied().collect();
        for id in created {
            builder.graph.set_classifier(id, package);
        }
        for (path, supertypes) in LATTICE {
            let id = builder.core[path];
            builder.graph.set_classifier(id, class);
            for supertype in supertypes.iter() {
                let general = builder.core[supertype];
                builder.extends(id, general);
            }
        }
        for name in paths::PRIMITIVES {
            let id = builder.core[name];
            builder.graph.set_classifier(id, primitive);
        }
        for narrow in ["Integer", "Float", "Decimal"] {
            let (id, number) = (builder.core[narrow], builder.core["Number"]);
            builder.extends(id, number);
        }
        builder
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ModelGraph {
        &mut self.graph
    }

    pub fn finish(self) -> ModelGraph {
        self.graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// A core metamodel classifier or primitive type by path.
    pub fn core(&self, path: &str) -> Option<NodeId> {
        self.core.get(path).copied()
    }

    /// A primitive type (`String`, `Integer`, ...).
    ///
    /// # Panics
    ///
    /// If `name` is not one of the bootstrapped primitives. Use [`core`]
    /// for a fallible lookup.
    ///
    /// [`core`]: ModelBuilder::core
    pub fn primitive(&self, name: &str) -> NodeId {
        match self.core(name) {
            Some(id) => id,
            None => panic!("`{name}` is not a bootstrapped primitive type"),
        }
    }

    // ── Packages and packaged elements ──────────────────────────────────

    /// The package at `path`, creating missing packages along the way.
    pub fn package(&mut self, path: &str) -> NodeId {
        let path = path.strip_prefix("Root::").unwrap_or(path);
        if path == ROOT_PACKAGE {
            return self.root;
        }
        if let Some(&id) = self.packages.get(path) {
            return id;
        }
        let (parent_path, name) = split_path(path);
        let parent = self.package(parent_path);
        let id = self.graph.add_node(Some(name.to_string()), None);
        if let Some(&package) = self.core.get(paths::PACKAGE) {
            self.graph.set_classifier(id, package);
        }
        self.attach(parent, id);
        self.packages.insert(path.to_string(), id);
        id
    }

    fn packaged_node(&mut self, path: &str) -> NodeId {
        let (parent_path, name) = split_path(path);
        let parent = self.package(parent_path);
        let id = self.graph.add_node(Some(name.to_string()), None);
        self.attach(parent, id);
        id
    }

    /// Place an existing node in the package at `package_path`.
    pub fn place(&mut self, node: NodeId, package_path: &str) {
        let package = self.package(package_path);
        self.attach(package, node);
    }

    fn attach(&mut self, package: NodeId, child: NodeId) {
        self.graph.set_to_one(child, props::PACKAGE, package);
        self.graph.add_to_many(package, props::CHILDREN, child);
    }

    /// A packaged element classified by the core classifier at `classifier_path`.
    /// Panics if no such core classifier was bootstrapped.
    pub fn element(&mut self, path: &str, classifier_path: &str) -> NodeId {
        let id = self.packaged_node(path);
        let classifier = self.core[classifier_path];
        self.graph.set_classifier(id, classifier);
        id
    }

    /// A node classified by `classifier`, not attached to any package.
    pub fn instance(&mut self, classifier: NodeId, name: Option<&str>) -> NodeId {
        let id = self.graph.add_node(name.map(str::to_string), None);
        self.graph.set_classifier(id, classifier);
        id
    }

    fn core_instance(&mut self, classifier_path: &str, name: Option<&str>) -> NodeId {
        let classifier = self.core[classifier_path];
        self.instance(classifier, name)
    }

    // ── Types ───────────────────────────────────────────────────────────

    pub fn class(&mut self, path: &str) -> NodeId {
        self.element(path, paths::CLASS)
    }

    pub fn enumeration(&mut self, path: &str, values: &[&str]) -> NodeId {
        let id = self.element(path, paths::ENUMERATION);
        let base = self.core[paths::ENUM];
        self.extends(id, base);
        for value in values {
            let v = self.instance(id, Some(value));
            self.graph.add_to_many(id, props::VALUES, v);
        }
        id
    }

    pub fn measure(&mut self, path: &str) -> NodeId {
        self.element(path, paths::MEASURE)
    }

    /// A unit of `measure`, named `<Measure>~<unit>` in the measure's package.
    pub fn unit(&mut self, measure: NodeId, name: &str) -> NodeId {
        let measure_name = self.graph.node(measure).name.clone().unwrap_or_default();
        let package = self.graph.to_one(measure, props::PACKAGE).unwrap_or(self.root);
        let id = self.core_instance(paths::UNIT, Some(&format!("{measure_name}~{name}")));
        self.attach(package, id);
        self.graph.set_to_one(id, props::MEASURE, measure);
        if self.graph.to_one(measure, props::CANONICAL_UNIT).is_none() {
            self.graph.set_to_one(measure, props::CANONICAL_UNIT, id);
        }
        id
    }

    /// A GenericType over `raw` with the given type-argument GenericTypes.
    pub fn generic(&mut self, raw: NodeId, type_args: &[NodeId]) -> NodeId {
        let id = self.core_instance(paths::GENERIC_TYPE, None);
        self.graph.set_to_one(id, props::RAW_TYPE, raw);
        if !type_args.is_empty() {
            self.graph
                .set_to_many(id, props::TYPE_ARGUMENTS, type_args.to_vec());
        }
        id
    }

    /// Add a generalization of `ty` to the GenericType `general`.
    pub fn generalize(&mut self, ty: NodeId, general: NodeId) -> NodeId {
        let id = self.core_instance(paths::GENERALIZATION, None);
        self.graph.set_to_one(id, props::GENERAL, general);
        self.graph.add_to_many(ty, props::GENERALIZATIONS, id);
        id
    }

    /// Shorthand for `generalize(ty, generic(supertype, []))`.
    pub fn extends(&mut self, ty: NodeId, supertype: NodeId) -> NodeId {
        let general = self.generic(supertype, &[]);
        self.generalize(ty, general)
    }

    pub fn property(&mut self, owner: NodeId, name: &str, generic: NodeId) -> NodeId {
        let id = self.core_instance(paths::PROPERTY, Some(name));
        self.graph.set_to_one(id, props::GENERIC_TYPE, generic);
        self.graph.add_to_many(owner, props::PROPERTIES, id);
        id
    }

    pub fn qualified_property(
        &mut self,
        owner: NodeId,
        name: &str,
        function_type: NodeId,
        body: &[NodeId],
    ) -> NodeId {
        let id = self.core_instance(paths::QUALIFIED_PROPERTY, Some(name));
        self.graph.set_to_one(id, props::FUNCTION_TYPE, function_type);
        self.graph
            .set_to_many(id, props::EXPRESSION_SEQUENCE, body.to_vec());
        self.graph.add_to_many(owner, props::QUALIFIED_PROPERTIES, id);
        id
    }

    /// A constraint whose predicate is an anonymous lambda over `body`.
    pub fn constraint(&mut self, owner: NodeId, name: &str, body: &[NodeId]) -> NodeId {
        let boolean = self.primitive("Boolean");
        let returns = self.generic(boolean, &[]);
        let function_type = self.function_type(&[], Some(returns));
        let predicate = self.lambda(Some(function_type), body, None);
        let id = self.core_instance(paths::CONSTRAINT, Some(name));
        self.graph
            .set_to_one(id, props::FUNCTION_DEFINITION, predicate);
        self.graph.add_to_many(owner, props::CONSTRAINTS, id);
        id
    }

    // ── Functions ───────────────────────────────────────────────────────

    pub fn function_type(&mut self, params: &[(&str, NodeId)], return_type: Option<NodeId>) -> NodeId {
        let id = self.core_instance(paths::FUNCTION_TYPE, None);
        let params: Vec<NodeId> = params
            .iter()
            .map(|(name, generic)| self.variable(name, Some(*generic)))
            .collect();
        if !params.is_empty() {
            self.graph.set_to_many(id, props::PARAMETERS, params);
        }
        if let Some(ret) = return_type {
            self.graph.set_to_one(id, props::RETURN_TYPE, ret);
        }
        id
    }

    pub fn function(
        &mut self,
        path: &str,
        function_type: NodeId,
        body: &[NodeId],
        source: SourceInformation,
    ) -> NodeId {
        let id = self.bare_function(path);
        self.graph.set_source(id, source);
        self.graph.set_to_one(id, props::FUNCTION_TYPE, function_type);
        self.graph
            .set_to_many(id, props::EXPRESSION_SEQUENCE, body.to_vec());
        id
    }

    /// A concrete function definition with no signature and no body.
    pub fn bare_function(&mut self, path: &str) -> NodeId {
        self.element(path, paths::CONCRETE_FUNCTION_DEFINITION)
    }

    pub fn native_function(&mut self, path: &str) -> NodeId {
        self.element(path, paths::NATIVE_FUNCTION)
    }

    pub fn lambda(
        &mut self,
        function_type: Option<NodeId>,
        body: &[NodeId],
        source: Option<SourceInformation>,
    ) -> NodeId {
        let id = self.core_instance(paths::LAMBDA_FUNCTION, None);
        if let Some(source) = source {
            self.graph.set_source(id, source);
        }
        if let Some(ft) = function_type {
            self.graph.set_to_one(id, props::FUNCTION_TYPE, ft);
        }
        self.graph
            .set_to_many(id, props::EXPRESSION_SEQUENCE, body.to_vec());
        id
    }

    // ── Expressions ─────────────────────────────────────────────────────

    pub fn variable(&mut self, name: &str, generic: Option<NodeId>) -> NodeId {
        let id = self.core_instance(paths::VARIABLE_EXPRESSION, Some(name));
        if let Some(generic) = generic {
            self.graph.set_to_one(id, props::GENERIC_TYPE, generic);
        }
        id
    }

    pub fn literal(&mut self, values: &[NodeId], generic: Option<NodeId>) -> NodeId {
        let id = self.core_instance(paths::INSTANCE_VALUE, None);
        if let Some(generic) = generic {
            self.graph.set_to_one(id, props::GENERIC_TYPE, generic);
        }
        self.graph.set_to_many(id, props::VALUES, values.to_vec());
        id
    }

    /// A primitive value node: named by its text, classified by the primitive type.
    pub fn primitive_value(&mut self, type_name: &str, text: &str) -> NodeId {
        let primitive = self.primitive(type_name);
        self.instance(primitive, Some(text))
    }

    pub fn call(&mut self, func: NodeId, args: &[NodeId], generic: Option<NodeId>) -> NodeId {
        let id = self.core_instance(paths::SIMPLE_FUNCTION_EXPRESSION, None);
        self.graph.set_to_one(id, props::FUNC, func);
        if !args.is_empty() {
            self.graph
                .set_to_many(id, props::PARAMETERS_VALUES, args.to_vec());
        }
        if let Some(generic) = generic {
            self.graph.set_to_one(id, props::GENERIC_TYPE, generic);
        }
        id
    }

    pub fn key_expression(&mut self, key: &str, expression: NodeId) -> NodeId {
        let key = self.primitive_value("String", key);
        let id = self.core_instance(paths::KEY_EXPRESSION, None);
        self.graph.set_to_one(id, props::KEY, key);
        self.graph.set_to_one(id, props::EXPRESSION, expression);
        id
    }

    /// An import stub standing in for `target`; `None` leaves it unresolved.
    pub fn import_stub(&mut self, target: Option<NodeId>) -> NodeId {
        let id = self.core_instance(paths::IMPORT_STUB, None);
        if let Some(target) = target {
            self.graph.set_to_one(id, props::RESOLVED_NODE, target);
        }
        id
    }
}

fn split_path(path: &str) -> (&str, &str) {
    match path.rfind("::") {
        Some(pos) => (&path[..pos], &path[pos + 2..]),
        None => ("", path),
    }
}
