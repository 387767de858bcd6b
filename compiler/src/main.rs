use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use mgc::config::BuildConfig;
use mgc::pass::PassId;
use mgc::pipeline::{compute_provenance, run_pipeline, CompilationState};
use mgc::serialize::ManifestSink;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// Artifact dependency edges as JSON
    Deps,
    /// Compilation partitions as JSON
    Partitions,
    /// Serialization bucket manifest as JSON
    Buckets,
    /// Dependency graph with partitions as Graphviz DOT
    Dot,
    /// Model hash, registry fingerprint and compiler version
    BuildInfo,
}

impl EmitStage {
    fn terminal_pass(self) -> Option<PassId> {
        match self {
            EmitStage::Deps => Some(PassId::BuildDependencies),
            EmitStage::Partitions | EmitStage::Dot => Some(PassId::Partition),
            EmitStage::Buckets => Some(PassId::Repair),
            EmitStage::BuildInfo => None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "mgc",
    version,
    about = "Model Graph Compiler — artifact dependency graphs, compilation partitions and serialization buckets"
)]
struct Cli {
    /// Input model document (.json)
    model: PathBuf,

    /// Build configuration file (.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Partitions)]
    emit: EmitStage,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print pass timing and debug events
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mgc=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn fail(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("mgc: error: {}", message);
    std::process::exit(code);
}

fn write_output(path: Option<&Path>, text: &str) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, text),
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(text.as_bytes())?;
            out.flush()
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(text) => text + "\n",
        Err(e) => fail(1, e),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!(model = %cli.model.display(), emit = ?cli.emit, "starting");

    // ── Load configuration and model ──
    let config = match &cli.config {
        Some(path) => BuildConfig::load(path).unwrap_or_else(|e| fail(2, e)),
        None => BuildConfig::default(),
    };
    let text = std::fs::read_to_string(&cli.model)
        .unwrap_or_else(|e| fail(2, format_args!("{}: {}", cli.model.display(), e)));
    let graph = mgc::loader::load_model(&text).unwrap_or_else(|e| fail(2, e));

    tracing::debug!(nodes = graph.len(), "model loaded");

    let provenance = compute_provenance(&text, &config.classifiers);
    let mut state = CompilationState::new(graph, config);
    state.provenance = Some(provenance);

    if let Some(terminal) = cli.emit.terminal_pass() {
        if let Err(e) = run_pipeline(&mut state, terminal) {
            fail(1, e);
        }
    }

    // ── Emit ──
    let artifacts = &state.artifacts;
    let output = match cli.emit {
        EmitStage::Deps => artifacts.dependencies.as_ref().map(to_json),
        EmitStage::Partitions => artifacts.partitions.as_ref().map(to_json),
        EmitStage::Dot => match (&artifacts.dependencies, &artifacts.partitions) {
            (Some(deps), Some(plan)) => Some(mgc::dot::emit_dot(deps, plan, &state.model.naming)),
            _ => None,
        },
        EmitStage::Buckets => artifacts.buckets.as_ref().map(|buckets| {
            let mut sink = ManifestSink::new(Vec::new());
            if let Err(e) = buckets.write_to(&mut sink) {
                fail(1, e);
            }
            String::from_utf8_lossy(&sink.into_inner()).into_owned()
        }),
        EmitStage::BuildInfo => state.provenance.as_ref().map(|p| p.to_json()),
    };
    let Some(output) = output else {
        fail(1, format_args!("{:?} output was not produced", cli.emit));
    };

    if let Err(e) = write_output(cli.output.as_deref(), &output) {
        let target = cli
            .output
            .as_deref()
            .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
        fail(2, format_args!("{}: {}", target, e));
    }
}
