// loader.rs — JSON model documents
//
// Reads a model graph from a JSON document layered on the bootstrap
// metamodel:
//
//   { "nodes": [ { "id": "person", "name": "Person", "package": "model",
//                  "classifier": "meta::pure::metamodel::type::Class",
//                  "source": { "source": "/model/person.pure", "start_line": 1 },
//                  "properties": [ ["properties", ["person.name"]] ] } ],
//     "roots": ["person"] }
//
// A reference is a document-local id, or failing that an element path
// (`String`, `model::Person`, `meta::pure::metamodel::type::Class`).
// Properties are `[name, ref]` or `[name, [ref, ...]]` pairs so declaration
// order survives parsing.
//
// Preconditions: none.
// Postconditions: every document node exists in the graph; packaged nodes
//                 are children of their package.
// Failure modes: malformed JSON, duplicate ids, unnamed packaged nodes,
//                references that match neither an id nor an element path.
// Side effects: `load_model_file` reads the file system.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::bootstrap::ModelBuilder;
use crate::id::NodeId;
use crate::model::{ModelGraph, SourceInformation};
use crate::navigation::Navigator;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed model document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node id '{0}'")]
    DuplicateId(String),
    #[error("node '{0}' has a package but no name")]
    UnnamedElement(String),
    #[error("node '{node}': unknown reference '{reference}'")]
    UnknownReference { node: String, reference: String },
}

// ── Document shape ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelDocument {
    nodes: Vec<NodeDocument>,
    #[serde(default)]
    roots: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDocument {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    classifier: Option<String>,
    #[serde(default)]
    source: Option<SourceInformation>,
    #[serde(default)]
    properties: Vec<(String, References)>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum References {
    One(String),
    Many(Vec<String>),
}

// ── Loading ─────────────────────────────────────────────────────────────────

pub fn load_model_file(path: &Path) -> Result<ModelGraph, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_model(&text)
}

pub fn load_model(json: &str) -> Result<ModelGraph, LoadError> {
    let doc: ModelDocument = serde_json::from_str(json)?;
    let mut builder = ModelBuilder::new();

    let mut local: HashMap<&str, NodeId> = HashMap::new();
    for node in &doc.nodes {
        if local.contains_key(node.id.as_str()) {
            return Err(LoadError::DuplicateId(node.id.clone()));
        }
        let id = builder
            .graph_mut()
            .add_node(node.name.clone(), node.source.clone());
        if let Some(package) = &node.package {
            if node.name.is_none() {
                return Err(LoadError::UnnamedElement(node.id.clone()));
            }
            builder.place(id, package);
        }
        local.insert(node.id.as_str(), id);
    }

    // Resolve every reference against the complete graph before wiring.
    let resolved = {
        let nav = Navigator::new(builder.graph());
        let resolve = |owner: &str, reference: &str| -> Result<NodeId, LoadError> {
            local
                .get(reference)
                .copied()
                .or_else(|| nav.lookup(reference))
                .ok_or_else(|| LoadError::UnknownReference {
                    node: owner.to_string(),
                    reference: reference.to_string(),
                })
        };

        let mut wiring = Vec::with_capacity(doc.nodes.len());
        for node in &doc.nodes {
            let classifier = node
                .classifier
                .as_deref()
                .map(|c| resolve(&node.id, c))
                .transpose()?;
            let mut properties = Vec::with_capacity(node.properties.len());
            for (name, refs) in &node.properties {
                let value = match refs {
                    References::One(r) => Wired::One(resolve(&node.id, r)?),
                    References::Many(rs) => Wired::Many(
                        rs.iter()
                            .map(|r| resolve(&node.id, r))
                            .collect::<Result<_, _>>()?,
                    ),
                };
                properties.push((name.as_str(), value));
            }
            wiring.push((local[node.id.as_str()], classifier, properties));
        }
        let roots = doc
            .roots
            .iter()
            .map(|r| resolve("roots", r))
            .collect::<Result<Vec<_>, _>>()?;
        (wiring, roots)
    };

    let (wiring, roots) = resolved;
    let graph = builder.graph_mut();
    for (id, classifier, properties) in wiring {
        if let Some(classifier) = classifier {
            graph.set_classifier(id, classifier);
        }
        for (name, value) in properties {
            match value {
                Wired::One(target) => graph.set_to_one(id, name, target),
                Wired::Many(targets) => graph.set_to_many(id, name, targets),
            }
        }
    }
    for root in roots {
        graph.add_root(root);
    }

    tracing::debug!(
        document_nodes = doc.nodes.len(),
        total_nodes = builder.graph().len(),
        "loaded model document"
    );
    Ok(builder.finish())
}

enum Wired {
    One(NodeId),
    Many(Vec<NodeId>),
}
