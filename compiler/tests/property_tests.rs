// Property-based tests for backend invariants.
//
// Random class models (classes, supertype links, properties over classes and
// primitives) are checked for:
// 1. Dependency graph: order independence, closed implementation triangles,
//    interfaces depending only on interfaces, no self-edges
// 2. Partitions: every artifact in exactly one partition, dependencies first
// 3. Traversal and serialization: each node visited once, repair idempotent
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use std::collections::HashSet;

use mgc::bootstrap::ModelBuilder;
use mgc::depgraph::{DependencyGraph, DependencyGraphBuilder};
use mgc::id::NodeId;
use mgc::model::ModelGraph;
use mgc::naming::{ArtifactKind, NamingScheme};
use mgc::navigation::Navigator;
use mgc::partition::PartitionPlan;
use mgc::registry::ClassifierRegistry;
use mgc::serialize::{collect_repository, repair_buckets, PathClassifierIds, RepairOverrides};
use mgc::walk::{GraphWalk, WalkVerdict};
use proptest::prelude::*;

// ── Model generator ─────────────────────────────────────────────────────────

const PRIMITIVES: [&str; 3] = ["String", "Integer", "Boolean"];

#[derive(Debug, Clone)]
struct ModelShape {
    classes: usize,
    supertypes: Vec<(usize, usize)>,
    /// (owner, target); targets past the class count name a primitive.
    properties: Vec<(usize, usize)>,
}

fn arb_shape() -> impl Strategy<Value = ModelShape> {
    (1usize..8).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..n * 2),
            prop::collection::vec((0..n, 0..n + PRIMITIVES.len()), 0..n * 3),
        )
            .prop_map(|(classes, supertypes, properties)| ModelShape {
                classes,
                supertypes,
                properties,
            })
    })
}

fn class_path(i: usize) -> String {
    format!("gen::C{i}")
}

fn build_model(shape: &ModelShape) -> (ModelGraph, Vec<NodeId>) {
    let mut b = ModelBuilder::new();
    let classes: Vec<NodeId> = (0..shape.classes).map(|i| b.class(&class_path(i))).collect();
    for &(sub, sup) in &shape.supertypes {
        b.extends(classes[sub], classes[sup]);
    }
    for (k, &(owner, target)) in shape.properties.iter().enumerate() {
        let raw = match classes.get(target) {
            Some(&class) => class,
            None => b.primitive(PRIMITIVES[target - shape.classes]),
        };
        let generic = b.generic(raw, &[]);
        b.property(classes[owner], &format!("p{k}"), generic);
    }
    (b.finish(), classes)
}

fn dependencies(graph: &ModelGraph, nodes: impl IntoIterator<Item = NodeId>) -> DependencyGraph {
    let nav = Navigator::new(graph);
    let naming = NamingScheme::default();
    let sets = ClassifierRegistry::default().resolve(&nav);
    DependencyGraphBuilder::new(&nav, &naming, &sets)
        .build(nodes)
        .unwrap()
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dependency_graph_is_order_independent(shape in arb_shape()) {
        let (graph, classes) = build_model(&shape);
        let forward = dependencies(&graph, classes.iter().copied());
        let backward = dependencies(&graph, classes.iter().rev().copied());
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn implementation_triangle_is_closed(shape in arb_shape()) {
        let (graph, classes) = build_model(&shape);
        let deps = dependencies(&graph, classes.iter().copied());
        let naming = NamingScheme::default();
        for i in 0..shape.classes {
            let names = naming.type_artifacts(&class_path(i));
            for kind in ArtifactKind::ALL {
                for &required in kind.requires() {
                    prop_assert!(deps.requires(&names[kind as usize], &names[required as usize]));
                }
            }
        }
    }

    #[test]
    fn implementation_requires_property_types(shape in arb_shape()) {
        let (graph, classes) = build_model(&shape);
        let deps = dependencies(&graph, classes.iter().copied());
        let naming = NamingScheme::default();
        for &(owner, target) in &shape.properties {
            if target >= shape.classes || target == owner {
                continue;
            }
            let owner_impl = naming.type_artifact(&class_path(owner), ArtifactKind::Impl);
            let target_impl = naming.type_artifact(&class_path(target), ArtifactKind::Impl);
            prop_assert!(deps.requires(&owner_impl, &target_impl));
        }
    }

    #[test]
    fn interfaces_depend_only_on_interfaces(shape in arb_shape()) {
        let (graph, classes) = build_model(&shape);
        let deps = dependencies(&graph, classes.iter().copied());
        let naming = NamingScheme::default();
        for i in 0..shape.classes {
            let interface = naming.type_artifact(&class_path(i), ArtifactKind::Interface);
            for target in deps.dependencies(&interface).into_iter().flatten() {
                let name = target.as_str();
                prop_assert!(
                    !name.ends_with("_Impl") && !name.ends_with("_LazyImpl") && !name.ends_with("_CompImpl"),
                    "{} requires {}", interface, target
                );
            }
        }
    }

    #[test]
    fn no_self_edges(shape in arb_shape()) {
        let (graph, classes) = build_model(&shape);
        let deps = dependencies(&graph, classes.iter().copied());
        for (from, targets) in deps.edges() {
            prop_assert!(!targets.contains(from));
        }
    }

    #[test]
    fn partitions_cover_graph_dependencies_first(shape in arb_shape()) {
        let (graph, classes) = build_model(&shape);
        let deps = dependencies(&graph, classes.iter().copied());
        let plan = PartitionPlan::from_graph(&deps);
        let members: usize = plan.partitions().iter().map(Vec::len).sum();
        prop_assert_eq!(members, deps.all_artifacts().len());
        for (from, targets) in deps.edges() {
            let from_partition = plan.partition_of(from).unwrap();
            for to in targets {
                prop_assert!(plan.partition_of(to).unwrap() <= from_partition);
            }
        }
    }

    #[test]
    fn walk_visits_each_node_once(shape in arb_shape()) {
        let (graph, _) = build_model(&shape);
        let mut seen = HashSet::new();
        for node in GraphWalk::from_repository(&graph, |_| WalkVerdict::AcceptAndContinue) {
            prop_assert!(seen.insert(node), "{} emitted twice", node);
        }
    }

    #[test]
    fn repair_is_idempotent(shape in arb_shape(), forced in prop::collection::vec(0usize..8, 0..4)) {
        let (graph, classes) = build_model(&shape);
        let nav = Navigator::new(&graph);
        let sets = ClassifierRegistry::default().resolve(&nav);
        let collector = collect_repository(&nav, &sets, PathClassifierIds, None).unwrap();
        let mut buckets = collector.buckets().clone();
        let mut overrides = RepairOverrides::new();
        for i in forced {
            if let Some(&class) = classes.get(i) {
                overrides.force(class, format!("forced{i}"));
            }
        }
        repair_buckets(&mut buckets, &nav, &PathClassifierIds, &overrides).unwrap();
        let snapshot = buckets.clone();
        let again = repair_buckets(&mut buckets, &nav, &PathClassifierIds, &overrides).unwrap();
        prop_assert!(again.is_clean());
        prop_assert_eq!(buckets, snapshot);
    }
}
