// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the backend's passes (model loading is outside the runner),
// their dependency edges, and the artifacts they produce. Used by the
// pipeline runner to compute minimal pass subsets for each --emit target.

use std::collections::HashSet;
use std::fmt;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each backend pass. Model loading happens before the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    ResolveClassifiers,
    BuildDependencies,
    Partition,
    Collect,
    Repair,
}

/// Machine-readable artifact identifiers. Each maps to a concrete type
/// in the compilation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Classifiers,  // ClassifierSets
    Dependencies, // DependencyGraph
    Partitions,   // PartitionPlan
    Collected,    // Buckets (pre-repair)
    Buckets,      // FinalizedBuckets + RepairReport
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a backend pass.
pub struct PassDescriptor {
    /// Human-readable name for logs and errors.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// Pre/post conditions (documentation only).
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::ResolveClassifiers => PassDescriptor {
            name: "resolve_classifiers",
            inputs: &[],
            outputs: &[ArtifactId::Classifiers],
            invariants: "registered stub and primitive paths mapped to node ids",
        },
        PassId::BuildDependencies => PassDescriptor {
            name: "build_dependencies",
            inputs: &[PassId::ResolveClassifiers],
            outputs: &[ArtifactId::Dependencies],
            invariants: "implementation triangle closed for every type, no self-edges",
        },
        PassId::Partition => PassDescriptor {
            name: "partition",
            inputs: &[PassId::BuildDependencies],
            outputs: &[ArtifactId::Partitions],
            invariants: "every artifact in exactly one partition, dependencies first",
        },
        PassId::Collect => PassDescriptor {
            name: "collect",
            inputs: &[PassId::ResolveClassifiers],
            outputs: &[ArtifactId::Collected],
            invariants: "no stub-classified node, no primitive subtree",
        },
        PassId::Repair => PassDescriptor {
            name: "repair",
            inputs: &[PassId::Collect],
            outputs: &[ArtifactId::Buckets],
            invariants: "every node in the bucket of its effective key, no empty bucket",
        },
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(descriptor(*self).name)
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 5] = [
    PassId::ResolveClassifiers,
    PassId::BuildDependencies,
    PassId::Partition,
    PassId::Collect,
    PassId::Repair,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
