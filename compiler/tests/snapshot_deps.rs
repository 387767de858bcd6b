// Snapshot tests: lock the artifact dependency graph of small models to
// detect unintended changes in naming or edge derivation.
//
// Uses the library API (ModelBuilder → DependencyGraphBuilder) and snapshots
// one `from -> to` line per edge, root package stripped.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use mgc::bootstrap::ModelBuilder;
use mgc::depgraph::{DependencyGraph, DependencyGraphBuilder};
use mgc::id::NodeId;
use mgc::model::ModelGraph;
use mgc::naming::NamingScheme;
use mgc::navigation::Navigator;
use mgc::registry::ClassifierRegistry;

fn build(graph: &ModelGraph, nodes: &[NodeId]) -> DependencyGraph {
    let nav = Navigator::new(graph);
    let naming = NamingScheme::default();
    let sets = ClassifierRegistry::default().resolve(&nav);
    DependencyGraphBuilder::new(&nav, &naming, &sets)
        .build(nodes.iter().copied())
        .unwrap()
}

fn render(deps: &DependencyGraph) -> String {
    let strip = |name: &str| name.strip_prefix("generated.").unwrap_or(name).to_string();
    let mut lines = Vec::new();
    for (from, targets) in deps.edges() {
        if targets.is_empty() {
            lines.push(strip(from.as_str()));
        }
        for to in targets {
            lines.push(format!("{} -> {}", strip(from.as_str()), strip(to.as_str())));
        }
    }
    lines.join("\n")
}

#[test]
fn snapshot_person_with_supertype() {
    let mut b = ModelBuilder::new();
    let named = b.class("model::Named");
    let person = b.class("model::Person");
    b.extends(person, named);
    let string = b.primitive("String");
    let string_g = b.generic(string, &[]);
    b.property(person, "name", string_g);
    let graph = b.finish();

    let deps = build(&graph, &[named, person]);
    insta::assert_snapshot!(render(&deps), @r"
    CoreGen -> PureCompiledLambda
    CoreGen -> PureEnum_LazyImpl
    PureCompiledLambda -> CoreGen
    PureEnum_LazyImpl -> CoreGen
    PureEnum_LazyImpl -> Root_meta_pure_metamodel_type_Enum_LazyImpl
    Root_model_Named
    Root_model_Named_CompImpl -> Root_model_Named
    Root_model_Named_CompImpl -> Root_model_Named_Impl
    Root_model_Named_CompImpl -> Root_model_Named_LazyImpl
    Root_model_Named_Impl -> Root_model_Named
    Root_model_Named_Impl -> Root_model_Named_CompImpl
    Root_model_Named_Impl -> Root_model_Named_LazyImpl
    Root_model_Named_LazyImpl -> Root_model_Named
    Root_model_Named_LazyImpl -> Root_model_Named_CompImpl
    Root_model_Named_LazyImpl -> Root_model_Named_Impl
    Root_model_Person -> Root_model_Named
    Root_model_Person_CompImpl -> Root_model_Person
    Root_model_Person_CompImpl -> Root_model_Person_Impl
    Root_model_Person_CompImpl -> Root_model_Person_LazyImpl
    Root_model_Person_Impl -> Root_model_Named_Impl
    Root_model_Person_Impl -> Root_model_Person
    Root_model_Person_Impl -> Root_model_Person_CompImpl
    Root_model_Person_Impl -> Root_model_Person_LazyImpl
    Root_model_Person_LazyImpl -> Root_model_Person
    Root_model_Person_LazyImpl -> Root_model_Person_CompImpl
    Root_model_Person_LazyImpl -> Root_model_Person_Impl
    ");
}

#[test]
fn snapshot_measure_and_unit() {
    let mut b = ModelBuilder::new();
    let mass = b.measure("units::Mass");
    let kilogram = b.unit(mass, "Kilogram");
    let graph = b.finish();

    let deps = build(&graph, &[kilogram]);
    insta::assert_snapshot!(render(&deps), @r"
    CoreGen -> PureCompiledLambda
    CoreGen -> PureEnum_LazyImpl
    PureCompiledLambda -> CoreGen
    PureEnum_LazyImpl -> CoreGen
    PureEnum_LazyImpl -> Root_meta_pure_metamodel_type_Enum_LazyImpl
    Root_units_Mass$7e$Kilogram -> Root_units_Mass
    Root_units_Mass$7e$Kilogram_CompImpl -> Root_units_Mass$7e$Kilogram
    Root_units_Mass$7e$Kilogram_CompImpl -> Root_units_Mass$7e$Kilogram_Impl
    Root_units_Mass$7e$Kilogram_CompImpl -> Root_units_Mass$7e$Kilogram_LazyImpl
    Root_units_Mass$7e$Kilogram_Impl -> Root_units_Mass$7e$Kilogram
    Root_units_Mass$7e$Kilogram_Impl -> Root_units_Mass$7e$Kilogram_CompImpl
    Root_units_Mass$7e$Kilogram_Impl -> Root_units_Mass$7e$Kilogram_LazyImpl
    Root_units_Mass$7e$Kilogram_Impl -> Root_units_Mass_Impl
    Root_units_Mass$7e$Kilogram_LazyImpl -> Root_units_Mass$7e$Kilogram
    Root_units_Mass$7e$Kilogram_LazyImpl -> Root_units_Mass$7e$Kilogram_CompImpl
    Root_units_Mass$7e$Kilogram_LazyImpl -> Root_units_Mass$7e$Kilogram_Impl
    ");
}
