// partition.rs — Compilation partitions from the dependency graph
//
// Groups artifacts into compilation units: the strongly connected components
// of the dependency graph. Components come out dependencies-first, so a
// partition only ever requires partitions listed before it.
//
// Postconditions: every artifact named in the graph belongs to exactly one
//                 partition; members are sorted by name.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::depgraph::DependencyGraph;
use crate::naming::ArtifactName;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PartitionPlan {
    partitions: Vec<Vec<ArtifactName>>,
    #[serde(skip)]
    index: HashMap<ArtifactName, usize>,
}

impl PartitionPlan {
    pub fn from_graph(deps: &DependencyGraph) -> Self {
        let mut graph: DiGraph<ArtifactName, ()> = DiGraph::new();
        let mut nodes: HashMap<&ArtifactName, NodeIndex> = HashMap::new();
        for name in deps.all_artifacts() {
            nodes.insert(name, graph.add_node(name.clone()));
        }
        for (from, targets) in deps.edges() {
            for to in targets {
                graph.add_edge(nodes[from], nodes[to], ());
            }
        }

        let mut partitions = Vec::new();
        let mut index = HashMap::new();
        for component in tarjan_scc(&graph) {
            let mut members: Vec<ArtifactName> =
                component.into_iter().map(|ix| graph[ix].clone()).collect();
            members.sort();
            for member in &members {
                index.insert(member.clone(), partitions.len());
            }
            partitions.push(members);
        }

        tracing::debug!(
            artifacts = index.len(),
            partitions = partitions.len(),
            "partitioned dependency graph"
        );
        PartitionPlan { partitions, index }
    }

    pub fn partitions(&self) -> &[Vec<ArtifactName>] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn partition_of(&self, name: &ArtifactName) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn members(&self, partition: usize) -> Option<&[ArtifactName]> {
        self.partitions.get(partition).map(Vec::as_slice)
    }

    pub fn same_partition(&self, a: &ArtifactName, b: &ArtifactName) -> bool {
        match (self.partition_of(a), self.partition_of(b)) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        }
    }
}
