// serialize.rs — Classifier bucketing for binary distribution
//
// Walks the whole model repository, drops stub-classified nodes, prunes
// primitive values, and groups the remaining nodes into buckets keyed by
// classifier id. A repair pass then moves every node whose classifier id no
// longer matches its bucket, applying caller-supplied overrides first.
//
// The collector moves through three states, each a distinct type:
// `SerializationCollector` (collecting) → `RepairedCollection` →
// `FinalizedBuckets` (read-only, handed to a `DistributionSink`).
//
// Preconditions: the graph is not mutated during collection or repair.
// Postconditions: after repair every node sits in the bucket of its
//                 effective key; repair is idempotent; no bucket is empty.
// Failure modes: a node with no derivable classifier id
//                (`SerializeError::UnresolvedClassifier`); cancellation.
// Side effects: sinks write to their writer.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::id::NodeId;
use crate::navigation::Navigator;
use crate::registry::ClassifierSets;
use crate::walk::{CancelToken, GraphWalk, WalkVerdict};

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("{node} ({name}) has no resolvable classifier id")]
    UnresolvedClassifier { node: NodeId, name: String },
    #[error("serialization walk cancelled after {collected} nodes")]
    Cancelled { collected: usize },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Classifier ids ──────────────────────────────────────────────────────────

/// Derives the bucket key of a node.
pub trait ClassifierIdResolver {
    fn classifier_id(&self, nav: &Navigator<'_>, node: NodeId) -> Option<String>;
}

/// Element path of the node's resolved classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathClassifierIds;

impl ClassifierIdResolver for PathClassifierIds {
    fn classifier_id(&self, nav: &Navigator<'_>, node: NodeId) -> Option<String> {
        nav.classifier_path(node)
    }
}

/// Buckets in key order; nodes within a bucket in insertion order.
pub type Buckets = BTreeMap<String, Vec<NodeId>>;

/// Explicit bucket assignments that take precedence over computed ids.
#[derive(Debug, Clone, Default)]
pub struct RepairOverrides {
    targets: HashMap<NodeId, String>,
}

impl RepairOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force(&mut self, node: NodeId, key: impl Into<String>) -> &mut Self {
        self.targets.insert(node, key.into());
        self
    }

    pub fn get(&self, node: NodeId) -> Option<&str> {
        self.targets.get(&node).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// What one repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Nodes moved because their computed id changed.
    pub moved: usize,
    /// Nodes moved because of an override.
    pub forced: usize,
    pub dropped_buckets: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.moved == 0 && self.forced == 0 && self.dropped_buckets == 0
    }
}

/// Move every node whose effective key differs from its bucket into the
/// bucket of its effective key, then drop empty buckets. Moved nodes are
/// appended to their new bucket in the order they were found.
pub fn repair_buckets<R: ClassifierIdResolver>(
    buckets: &mut Buckets,
    nav: &Navigator<'_>,
    resolver: &R,
    overrides: &RepairOverrides,
) -> Result<RepairReport, SerializeError> {
    let mut report = RepairReport::default();
    let mut pending: Vec<(String, NodeId)> = Vec::new();

    for (key, nodes) in buckets.iter_mut() {
        let mut kept = Vec::with_capacity(nodes.len());
        for &node in nodes.iter() {
            let (target, forced) = match overrides.get(node) {
                Some(target) => (target.to_string(), true),
                None => {
                    let id = resolver.classifier_id(nav, node).ok_or_else(|| {
                        SerializeError::UnresolvedClassifier {
                            node,
                            name: nav.display_name(node),
                        }
                    })?;
                    (id, false)
                }
            };
            if target == *key {
                kept.push(node);
            } else {
                if forced {
                    report.forced += 1;
                } else {
                    report.moved += 1;
                }
                tracing::trace!(%node, from = %key, to = %target, forced, "moving node");
                pending.push((target, node));
            }
        }
        *nodes = kept;
    }

    for (target, node) in pending {
        buckets.entry(target).or_default().push(node);
    }

    let before = buckets.len();
    buckets.retain(|_, nodes| !nodes.is_empty());
    report.dropped_buckets = before - buckets.len();

    tracing::debug!(
        moved = report.moved,
        forced = report.forced,
        dropped = report.dropped_buckets,
        "repaired serialization buckets"
    );
    Ok(report)
}

// ── Collecting ──────────────────────────────────────────────────────────────

pub struct SerializationCollector<'a, 'g, R> {
    nav: &'a Navigator<'g>,
    resolver: R,
    buckets: Buckets,
    collected: usize,
}

impl<'a, 'g, R: ClassifierIdResolver> SerializationCollector<'a, 'g, R> {
    pub fn new(nav: &'a Navigator<'g>, resolver: R) -> Self {
        SerializationCollector {
            nav,
            resolver,
            buckets: Buckets::new(),
            collected: 0,
        }
    }

    /// Append `node` to the bucket of its computed classifier id.
    pub fn collect(&mut self, node: NodeId) -> Result<(), SerializeError> {
        let key = self
            .resolver
            .classifier_id(self.nav, node)
            .ok_or_else(|| SerializeError::UnresolvedClassifier {
                node,
                name: self.nav.display_name(node),
            })?;
        self.collect_into(key, node);
        Ok(())
    }

    /// Append `node` under an explicit key (e.g. a placement carried over
    /// from an earlier run). The repair pass corrects it if it is wrong.
    pub fn collect_into(&mut self, key: impl Into<String>, node: NodeId) {
        self.buckets.entry(key.into()).or_default().push(node);
        self.collected += 1;
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn repair(
        mut self,
        overrides: &RepairOverrides,
    ) -> Result<RepairedCollection, SerializeError> {
        let report = repair_buckets(&mut self.buckets, self.nav, &self.resolver, overrides)?;
        Ok(RepairedCollection {
            buckets: self.buckets,
            report,
        })
    }
}

/// Walk the repository and collect every distributable node.
///
/// Stub-classified nodes are skipped but their children are still visited;
/// nodes classified by a primitive type are skipped together with their
/// subtree.
pub fn collect_repository<'a, 'g, R: ClassifierIdResolver>(
    nav: &'a Navigator<'g>,
    classifiers: &ClassifierSets,
    resolver: R,
    cancel: Option<CancelToken>,
) -> Result<SerializationCollector<'a, 'g, R>, SerializeError> {
    let graph = nav.graph();
    let mut collector = SerializationCollector::new(nav, resolver);
    let mut walk = GraphWalk::from_repository(graph, |node| match graph.node(node).classifier {
        Some(c) if classifiers.is_stub(c) => WalkVerdict::RejectAndContinue,
        Some(c) if classifiers.is_primitive(c) => WalkVerdict::RejectAndStop,
        _ => WalkVerdict::AcceptAndContinue,
    });
    if let Some(token) = cancel {
        walk = walk.with_cancel(token);
    }
    for node in walk.by_ref() {
        collector.collect(node)?;
    }
    if walk.was_cancelled() {
        return Err(SerializeError::Cancelled {
            collected: collector.collected(),
        });
    }
    tracing::debug!(
        nodes = collector.collected(),
        buckets = collector.buckets().len(),
        "collected repository for serialization"
    );
    Ok(collector)
}

// ── Repaired and finalized ──────────────────────────────────────────────────

pub struct RepairedCollection {
    buckets: Buckets,
    report: RepairReport,
}

impl RepairedCollection {
    pub fn report(&self) -> &RepairReport {
        &self.report
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn finalize(self) -> FinalizedBuckets {
        FinalizedBuckets {
            buckets: self.buckets,
        }
    }
}

/// Read-only buckets ready for the distribution writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedBuckets {
    buckets: Buckets,
}

impl FinalizedBuckets {
    pub fn get(&self, classifier_id: &str) -> Option<&[NodeId]> {
        self.buckets.get(classifier_id).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.buckets.values().any(|nodes| nodes.contains(&node))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Hand every bucket to `sink` in key order, then finish it.
    pub fn write_to<S: DistributionSink + ?Sized>(&self, sink: &mut S) -> Result<(), SinkError> {
        for (key, nodes) in self.iter() {
            sink.write_bucket(key, nodes)?;
        }
        sink.finish()
    }
}

// ── Sinks ───────────────────────────────────────────────────────────────────

/// Consumer of finalized buckets (the binary distribution writer).
pub trait DistributionSink {
    fn write_bucket(&mut self, classifier_id: &str, nodes: &[NodeId]) -> Result<(), SinkError>;

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub classifier_id: String,
    pub count: usize,
    pub nodes: Vec<u32>,
}

/// Writes a JSON manifest of bucket keys and their nodes.
pub struct ManifestSink<W: Write> {
    writer: W,
    entries: Vec<ManifestEntry>,
}

impl<W: Write> ManifestSink<W> {
    pub fn new(writer: W) -> Self {
        ManifestSink {
            writer,
            entries: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DistributionSink for ManifestSink<W> {
    fn write_bucket(&mut self, classifier_id: &str, nodes: &[NodeId]) -> Result<(), SinkError> {
        self.entries.push(ManifestEntry {
            classifier_id: classifier_id.to_string(),
            count: nodes.len(),
            nodes: nodes.iter().map(|n| n.0).collect(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        serde_json::to_writer_pretty(&mut self.writer, &self.entries)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
