// naming.rs — Artifact naming scheme
//
// Pure functions from element paths and origin files to the names of the
// generated artifacts. A type yields four artifacts (one per `ArtifactKind`);
// a function or closure yields the file artifact of its origin source.
//
// Names are `{root}.Root_{path}{suffix}` for types and `{root}.File_{source}`
// for files. Path segments are joined with `_`, and any character of a
// segment outside `[A-Za-z0-9]` is written as `$<hex>$`, so `_` only ever
// separates segments. A trailing segment spelled like a kind suffix has its
// first character escaped as well. Together this makes the scheme injective
// over (element path, kind) and over source paths. Source paths are
// repository-relative, so a leading `/` is dropped before naming and
// `/model/x.pure` and `model/x.pure` denote the same source file.
//
// Preconditions: element paths are unique per node.
// Postconditions: identical inputs produce identical names.
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::BuildConfig;

// ── Artifact kinds ──────────────────────────────────────────────────────────

/// The four artifacts generated per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    Interface,
    Impl,
    LazyImpl,
    CompImpl,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Interface,
        ArtifactKind::Impl,
        ArtifactKind::LazyImpl,
        ArtifactKind::CompImpl,
    ];

    /// Name suffix appended to the escaped element path.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Interface => "",
            ArtifactKind::Impl => "_Impl",
            ArtifactKind::LazyImpl => "_LazyImpl",
            ArtifactKind::CompImpl => "_CompImpl",
        }
    }

    /// Kinds of the same type this kind always requires.
    ///
    /// The three implementation kinds require each other, which puts them in
    /// one strongly connected component of the dependency graph.
    pub fn requires(self) -> &'static [ArtifactKind] {
        match self {
            ArtifactKind::Interface => &[],
            ArtifactKind::Impl => &[
                ArtifactKind::Interface,
                ArtifactKind::LazyImpl,
                ArtifactKind::CompImpl,
            ],
            ArtifactKind::LazyImpl => &[
                ArtifactKind::Interface,
                ArtifactKind::Impl,
                ArtifactKind::CompImpl,
            ],
            ArtifactKind::CompImpl => &[
                ArtifactKind::Interface,
                ArtifactKind::Impl,
                ArtifactKind::LazyImpl,
            ],
        }
    }

    pub fn is_implementation(self) -> bool {
        self != ArtifactKind::Interface
    }
}

// ── Artifact names ──────────────────────────────────────────────────────────

/// Fully qualified name of one generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(name: impl Into<String>) -> Self {
        ArtifactName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Scheme ──────────────────────────────────────────────────────────────────

const TYPE_PREFIX: &str = "Root_";
const FILE_PREFIX: &str = "File_";

/// Naming scheme bound to one build configuration.
#[derive(Debug, Clone)]
pub struct NamingScheme {
    root: String,
    common_runtime: ArtifactName,
    lambda_runtime: ArtifactName,
    enum_support: ArtifactName,
    enum_base: ArtifactName,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

impl NamingScheme {
    pub fn from_config(config: &BuildConfig) -> Self {
        let root = config.root_package.clone();
        let qualify = |name: &str| ArtifactName(format!("{root}.{name}"));
        let common_runtime = qualify(&config.common_runtime);
        let lambda_runtime = qualify(&config.lambda_runtime);
        let enum_support = qualify(&config.enum_support);
        let mut scheme = NamingScheme {
            root: root.clone(),
            common_runtime,
            lambda_runtime,
            enum_support,
            enum_base: ArtifactName(String::new()),
        };
        scheme.enum_base = scheme.type_artifact(&config.enum_base_type, ArtifactKind::LazyImpl);
        scheme
    }

    pub fn root_package(&self) -> &str {
        &self.root
    }

    /// Artifact of kind `kind` for the type at `element_path`.
    pub fn type_artifact(&self, element_path: &str, kind: ArtifactKind) -> ArtifactName {
        let mut name = format!("{}.{TYPE_PREFIX}", self.root);
        let segments: Vec<&str> = element_path.split("::").collect();
        push_segments(&mut name, &segments);
        name.push_str(kind.suffix());
        ArtifactName(name)
    }

    /// All four artifacts of a type, in `ArtifactKind::ALL` order.
    pub fn type_artifacts(&self, element_path: &str) -> [ArtifactName; 4] {
        ArtifactKind::ALL.map(|kind| self.type_artifact(element_path, kind))
    }

    /// File artifact for functions and closures defined in `source`.
    /// File artifact for an origin source. A leading `/` is not part of the
    /// name: `/a/b.pure` and `a/b.pure` are the same file.
    pub fn file_artifact(&self, source: &str) -> ArtifactName {
        let mut name = format!("{}.{FILE_PREFIX}", self.root);
        let trimmed = source.strip_prefix('/').unwrap_or(source);
        let segments: Vec<&str> = trimmed.split('/').collect();
        push_segments(&mut name, &segments);
        ArtifactName(name)
    }

    pub fn common_runtime(&self) -> &ArtifactName {
        &self.common_runtime
    }

    pub fn lambda_runtime(&self) -> &ArtifactName {
        &self.lambda_runtime
    }

    pub fn enum_support(&self) -> &ArtifactName {
        &self.enum_support
    }

    /// `LazyImpl` artifact of the platform enum base type.
    pub fn enum_base(&self) -> &ArtifactName {
        &self.enum_base
    }
}

fn push_segments(out: &mut String, segments: &[&str]) {
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('_');
        }
        let shadows_suffix = i == last && is_suffix_word(segment);
        for (j, ch) in segment.chars().enumerate() {
            if ch.is_ascii_alphanumeric() && !(shadows_suffix && j == 0) {
                out.push(ch);
            } else {
                let _ = write!(out, "${:x}$", ch as u32);
            }
        }
    }
}

fn is_suffix_word(segment: &str) -> bool {
    ArtifactKind::ALL
        .iter()
        .any(|kind| kind.suffix().strip_prefix('_') == Some(segment))
}
