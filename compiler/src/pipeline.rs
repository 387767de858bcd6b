// pipeline.rs — Compilation state and pass orchestration
//
// Holds the loaded model and every pass artifact in a borrow-split struct
// (model inputs vs. produced artifacts) and runs the minimal set of passes
// for a given terminal PassId.
//
// Preconditions: the model graph and build config are set before calling
//                run_pipeline.
// Postconditions: artifacts for all required passes are populated, or an
//                 error names the failing pass.
// Failure modes: malformed function types (build_dependencies), nodes with
//                no classifier id or cancellation (collect, repair).
// Side effects: per-pass tracing spans and timing events.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::BuildConfig;
use crate::depgraph::{DependencyError, DependencyGraph, DependencyGraphBuilder};
use crate::model::ModelGraph;
use crate::naming::NamingScheme;
use crate::navigation::Navigator;
use crate::partition::PartitionPlan;
use crate::pass::{required_passes, ArtifactId, PassId};
use crate::registry::{ClassifierRegistry, ClassifierSets};
use crate::serialize::{
    collect_repository, Buckets, FinalizedBuckets, PathClassifierIds, RepairOverrides,
    RepairReport, SerializationCollector, SerializeError,
};
use crate::walk::CancelToken;

// ── Artifact storage ───────────────────────────────────────────────────────

/// Inputs every pass reads; never written by the runner.
pub struct ModelInputs {
    pub graph: ModelGraph,
    pub config: BuildConfig,
    pub naming: NamingScheme,
}

/// Outputs of the passes that have run.
#[derive(Default)]
pub struct Artifacts {
    pub classifiers: Option<ClassifierSets>,
    pub dependencies: Option<DependencyGraph>,
    pub partitions: Option<PartitionPlan>,
    pub collected: Option<Buckets>,
    pub buckets: Option<FinalizedBuckets>,
    pub repair_report: Option<RepairReport>,
}

/// Provenance metadata for hermetic builds and cache-key use.
///
/// `model_hash`: SHA-256 of the raw model document text.
/// `registry_fingerprint`: SHA-256 of `ClassifierRegistry::canonical_json()`.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub model_hash: [u8; 32],
    pub registry_fingerprint: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the model hash (64 characters).
    pub fn model_hash_hex(&self) -> String {
        bytes_to_hex(&self.model_hash)
    }

    /// Hex string of the registry fingerprint (64 characters).
    pub fn registry_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.registry_fingerprint)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        let value = serde_json::json!({
            "model_hash": self.model_hash_hex(),
            "registry_fingerprint": self.registry_fingerprint_hex(),
            "manifest_schema_version": 1,
            "compiler_version": self.compiler_version,
        });
        format!("{value:#}\n")
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

fn sha256(text: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

/// Compute provenance from the model document text and classifier registry.
pub fn compute_provenance(model_text: &str, registry: &ClassifierRegistry) -> Provenance {
    Provenance {
        model_hash: sha256(model_text),
        registry_fingerprint: sha256(&registry.canonical_json()),
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

/// Holds the model, its configuration and all pass artifacts.
pub struct CompilationState {
    pub model: ModelInputs,
    pub artifacts: Artifacts,
    pub cancel: Option<CancelToken>,
    pub provenance: Option<Provenance>,
}

impl CompilationState {
    pub fn new(graph: ModelGraph, config: BuildConfig) -> Self {
        let naming = NamingScheme::from_config(&config);
        Self {
            model: ModelInputs {
                graph,
                config,
                naming,
            },
            artifacts: Artifacts::default(),
            cancel: None,
            provenance: None,
        }
    }
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution failed in `failing_pass`.
#[derive(Debug, Error)]
#[error("{failing_pass} failed: {cause}")]
pub struct PipelineError {
    pub failing_pass: PassId,
    #[source]
    pub cause: PassFailure,
}

#[derive(Debug, Error)]
pub enum PassFailure {
    #[error(transparent)]
    Dependencies(#[from] DependencyError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error("required input {0:?} was not produced")]
    MissingInput(ArtifactId),
}

fn fail(pass: PassId, cause: impl Into<PassFailure>) -> PipelineError {
    PipelineError {
        failing_pass: pass,
        cause: cause.into(),
    }
}

fn missing(pass: PassId, artifact: ArtifactId) -> PipelineError {
    fail(pass, PassFailure::MissingInput(artifact))
}

fn finish_pass(pass_id: PassId, elapsed: Duration) {
    tracing::debug!(
        pass = %pass_id,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "pass complete"
    );
}

/// Resolve configured bucket overrides (element path → key) to node ids.
/// Paths that name no element are skipped with a warning.
fn repair_overrides(nav: &Navigator<'_>, config: &BuildConfig) -> RepairOverrides {
    let mut overrides = RepairOverrides::new();
    for (path, key) in &config.bucket_overrides {
        match nav.lookup(path) {
            Some(node) => {
                overrides.force(node, key.clone());
            }
            None => tracing::warn!(%path, "bucket override names no element"),
        }
    }
    overrides
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
///
/// Preconditions: `state.model` is populated.
/// Postconditions: artifacts for all passes in `required_passes(terminal)` are
///   populated.
/// Failure modes: the first failing pass aborts the run.
/// Side effects: one `pass` tracing span per executed pass.
pub fn run_pipeline(state: &mut CompilationState, terminal: PassId) -> Result<(), PipelineError> {
    let passes = required_passes(terminal);
    let model = &state.model;
    let artifacts = &mut state.artifacts;
    let nav = Navigator::new(&model.graph);
    let mut collector: Option<SerializationCollector<'_, '_, PathClassifierIds>> = None;

    for &pass_id in &passes {
        let span = tracing::info_span!("pass", name = %pass_id);
        let _enter = span.enter();
        let t = Instant::now();

        match pass_id {
            PassId::ResolveClassifiers => {
                artifacts.classifiers = Some(model.config.classifiers.resolve(&nav));
            }
            PassId::BuildDependencies => {
                let classifiers = artifacts
                    .classifiers
                    .as_ref()
                    .ok_or_else(|| missing(pass_id, ArtifactId::Classifiers))?;
                let builder = DependencyGraphBuilder::new(&nav, &model.naming, classifiers);
                let deps = builder
                    .build_for_repository()
                    .map_err(|e| fail(pass_id, e))?;
                artifacts.dependencies = Some(deps);
            }
            PassId::Partition => {
                let deps = artifacts
                    .dependencies
                    .as_ref()
                    .ok_or_else(|| missing(pass_id, ArtifactId::Dependencies))?;
                artifacts.partitions = Some(PartitionPlan::from_graph(deps));
            }
            PassId::Collect => {
                let classifiers = artifacts
                    .classifiers
                    .as_ref()
                    .ok_or_else(|| missing(pass_id, ArtifactId::Classifiers))?;
                let collected =
                    collect_repository(&nav, classifiers, PathClassifierIds, state.cancel.clone())
                        .map_err(|e| fail(pass_id, e))?;
                artifacts.collected = Some(collected.buckets().clone());
                collector = Some(collected);
            }
            PassId::Repair => {
                let collected = collector
                    .take()
                    .ok_or_else(|| missing(pass_id, ArtifactId::Collected))?;
                let overrides = repair_overrides(&nav, &model.config);
                let repaired = collected
                    .repair(&overrides)
                    .map_err(|e| fail(pass_id, e))?;
                artifacts.repair_report = Some(repaired.report().clone());
                artifacts.buckets = Some(repaired.finalize());
            }
        }

        finish_pass(pass_id, t.elapsed());
    }
    Ok(())
}
