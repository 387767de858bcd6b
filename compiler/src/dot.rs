// dot.rs — Graphviz DOT output for artifact dependency graphs
//
// Renders a DependencyGraph with its partition plan: every partition with
// more than one artifact becomes a cluster, mutual edges are drawn once with
// arrowheads at both ends.
//
// Preconditions: `plan` was computed from `deps`.
// Postconditions: returns a valid DOT string; identical inputs give
//                 byte-identical output.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::depgraph::DependencyGraph;
use crate::naming::{ArtifactName, NamingScheme};
use crate::partition::PartitionPlan;

/// Emit the dependency graph as a Graphviz DOT string.
pub fn emit_dot(deps: &DependencyGraph, plan: &PartitionPlan, naming: &NamingScheme) -> String {
    let mut buf = String::new();
    // Writing into a String cannot fail.
    let _ = write_dot(&mut buf, deps, plan, naming);
    buf
}

fn write_dot(
    buf: &mut String,
    deps: &DependencyGraph,
    plan: &PartitionPlan,
    naming: &NamingScheme,
) -> std::fmt::Result {
    writeln!(buf, "digraph artifacts {{")?;
    writeln!(buf, "    rankdir=LR;")?;
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10, shape=box];")?;
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];")?;

    // Sorted, so node ids are stable across runs
    let ids: BTreeMap<&ArtifactName, usize> = deps
        .all_artifacts()
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    let prefix = format!("{}.", naming.root_package());

    for (index, members) in plan.partitions().iter().enumerate() {
        let clustered = members.len() > 1;
        let indent = if clustered { "        " } else { "    " };
        writeln!(buf)?;
        if clustered {
            writeln!(buf, "    subgraph cluster_p{index} {{")?;
            writeln!(buf, "        label=\"partition {index}\";")?;
            writeln!(buf, "        style=rounded;")?;
            writeln!(buf, "        color=gray50;")?;
        }
        for member in members {
            let Some(id) = ids.get(member) else {
                continue;
            };
            let label = member.as_str().strip_prefix(&prefix).unwrap_or(member.as_str());
            let shape = if deps.file_artifacts().contains(member) {
                ", shape=note"
            } else {
                ""
            };
            writeln!(buf, "{indent}a{id} [label=\"{}\"{shape}];", escape(label))?;
        }
        if clustered {
            writeln!(buf, "    }}")?;
        }
    }

    writeln!(buf)?;
    for (from, targets) in deps.edges() {
        for to in targets {
            let (Some(a), Some(b)) = (ids.get(from), ids.get(to)) else {
                continue;
            };
            if deps.requires(to, from) {
                // Mutual pair: draw once, from the smaller name
                if from < to {
                    writeln!(buf, "    a{a} -> a{b} [dir=both, color=blue];")?;
                }
            } else {
                writeln!(buf, "    a{a} -> a{b};")?;
            }
        }
    }

    writeln!(buf, "}}")?;
    Ok(())
}

/// Escape a label for use inside a double-quoted DOT string.
fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
