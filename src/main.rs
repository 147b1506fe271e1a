//! scene-kg CLI: ontology-backed scene-graph instantiation.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use scene_kg::config::EngineConfig;
use scene_kg::engine::Engine;
use scene_kg::export::{InfoExport, PreviewExport, SceneReportExport};
use scene_kg::hierarchy::AncestryMode;
use scene_kg::store::GraphFormat;

#[derive(Parser)]
#[command(name = "scene-kg", version, about = "Ontology-backed scene-graph engine")]
struct Cli {
    /// TOML config file. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ontology to load before processing.
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    /// Format of the ontology file (rdfxml, turtle, ntriples).
    #[arg(long, global = true)]
    ontology_format: Option<GraphFormat>,

    /// Where to write the updated graph after each scene.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Format of the output file (rdfxml, turtle, ntriples).
    #[arg(long, global = true)]
    format: Option<GraphFormat>,

    /// Data directory for a persistent store.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Scene namespace IRI.
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Follow rdfs:subClassOf transitively when matching rules.
    #[arg(long, global = true)]
    transitive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a scene description into the graph.
    Process {
        /// Scene description file, one statement per line ("-" for stdin).
        #[arg(long)]
        scene: PathBuf,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show which classes and relations a scene would add.
    Preview {
        /// Scene description file ("-" for stdin).
        #[arg(long)]
        scene: PathBuf,

        /// Print the preview as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List classes and relations known to the ontology.
    Vocab {
        /// Print the vocabulary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show engine info and statistics.
    Info {
        /// Print the info as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write the loaded graph to a file, converting formats.
    Export {
        /// Destination file.
        #[arg(long)]
        to: PathBuf,

        /// Destination format; guessed from the extension when omitted.
        #[arg(long = "as")]
        as_format: Option<GraphFormat>,
    },

    /// Write the effective configuration as TOML.
    InitConfig {
        /// Destination file.
        #[arg(long, default_value = "scene-kg.toml")]
        path: PathBuf,
    },
}

impl Cli {
    /// Build the engine config: file (if any), then flag overrides.
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match self.config {
            Some(ref path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(ref ontology) = self.ontology {
            config.ontology = Some(ontology.clone());
        }
        if self.ontology_format.is_some() {
            config.ontology_format = self.ontology_format;
        }
        if let Some(ref output) = self.output {
            config.output = Some(output.clone());
        }
        if self.format.is_some() {
            config.output_format = self.format;
        }
        if let Some(ref dir) = self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(ref namespace) = self.namespace {
            config.namespace = namespace.clone();
        }
        if self.transitive {
            config.ancestry = AncestryMode::Transitive;
        }
        Ok(config)
    }
}

fn read_scene(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).into_diagnostic()?;
        return Ok(text);
    }
    std::fs::read_to_string(path).into_diagnostic()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.engine_config()?;

    match cli.command {
        Commands::Process { ref scene, json } => {
            let text = read_scene(scene)?;
            let mut engine = Engine::new(config)?;
            let report = engine.assemble(&text)?;
            if json {
                print_json(&SceneReportExport::from(&report))?;
            } else {
                println!("{}\n", report.preview);
                println!("{report}");
                if let Some(ref output) = engine.config().output {
                    println!("Graph written to {}", output.display());
                }
            }
        }

        Commands::Preview { ref scene, json } => {
            let text = read_scene(scene)?;
            let engine = Engine::new(config)?;
            let preview = engine.preview(&text)?;
            if json {
                print_json(&PreviewExport::from(&preview))?;
            } else {
                println!("{preview}");
            }
        }

        Commands::Vocab { json } => {
            let engine = Engine::new(config)?;
            let vocabulary = engine.vocabulary()?;
            if json {
                print_json(&vocabulary)?;
            } else {
                println!("{vocabulary}");
            }
        }

        Commands::Info { json } => {
            let engine = Engine::new(config)?;
            let info = engine.info()?;
            if json {
                print_json(&InfoExport::from(&info))?;
            } else {
                print!("{info}");
            }
        }

        Commands::Export { ref to, as_format } => {
            let engine = Engine::new(config)?;
            let format = as_format
                .or_else(|| GraphFormat::from_path(to))
                .unwrap_or_default();
            engine.export_to(to, format)?;
            println!("Exported graph to {} ({format})", to.display());
        }

        Commands::InitConfig { ref path } => {
            config.validate()?;
            config.save(path)?;
            println!("Wrote config to {}", path.display());
        }
    }

    Ok(())
}
