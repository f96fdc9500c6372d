//! wrap interface compiler CLI
//!
//! Main entry point for the `wrapc` command.

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wrapidl::{DependencyGraph, Diagnostics, Module, Pipeline, SourceFile, WrapConfig};

#[derive(Parser)]
#[command(name = "wrapc")]
#[command(author = "Demetrios Chiuratto Agourakis, Dionisio Chiuratto Agourakis")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parse, resolve and classify wrap interface files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to `wrap.toml` beside the input)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an interface file and report diagnostics
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Report diagnostics as JSON records
        #[arg(long)]
        json: bool,

        /// Print an intermediate form
        #[arg(long, value_enum)]
        emit: Option<EmitType>,

        /// Print the class dependency graph and generation order
        #[arg(long)]
        deps: bool,
    },

    /// Print one class of an interface file as JSON
    Lookup {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Fully-qualified class name, e.g. `gtsam::Pose2`
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Show information about the front-end
    Info,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum EmitType {
    /// Abstract Syntax Tree (JSON)
    Ast,
    /// Classified module tree (JSON)
    Tree,
    /// Canonical interface text
    Idl,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Check {
            input,
            json,
            emit,
            deps,
        } => check(&input, cli.config.as_deref(), json, emit, deps),
        Commands::Lookup { input, name } => lookup(&input, cli.config.as_deref(), &name),
        Commands::Info => info(),
    }
}

fn load(input: &Path, config: Option<&Path>) -> Result<(SourceFile, WrapConfig)> {
    let content = std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file {}: {}", input.display(), e))?;
    let config_path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| WrapConfig::default_path_for(input));
    let config = WrapConfig::load(&config_path).into_diagnostic()?;
    tracing::info!(file = %input.display(), config = %config_path.display(), "loaded");
    Ok((SourceFile::new(input.to_string_lossy(), content), config))
}

fn report(diagnostics: Diagnostics, json: bool) -> miette::Report {
    if !json {
        return miette::Report::new(diagnostics);
    }
    match serde_json::to_string_pretty(&diagnostics.records()) {
        Ok(records) => {
            println!("{records}");
            miette::miette!("{diagnostics}")
        }
        Err(e) => miette::miette!("Failed to serialize diagnostics: {}", e),
    }
}

fn check(
    input: &Path,
    config: Option<&Path>,
    json: bool,
    emit: Option<EmitType>,
    show_deps: bool,
) -> Result<()> {
    let (source, config) = load(input, config)?;
    let mut pipeline = Pipeline::new(source, &config);

    if emit == Some(EmitType::Ast) {
        let ast = pipeline.parse().map_err(|d| report(d, json))?;
        let out = serde_json::to_string_pretty(&ast)
            .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
        println!("{out}");
        return Ok(());
    }

    let module = pipeline.run().map_err(|d| report(d, json))?;

    match emit {
        Some(EmitType::Tree) => {
            let out = serde_json::to_string_pretty(&module)
                .map_err(|e| miette::miette!("Failed to serialize module: {}", e))?;
            println!("{out}");
        }
        Some(EmitType::Idl) => print!("{module}"),
        Some(EmitType::Ast) | None => summary(input, &module),
    }

    if show_deps {
        print_deps(&module);
    }
    Ok(())
}

fn summary(input: &Path, module: &Module) {
    let classes = module.classes();
    let stubs = classes.iter().filter(|c| c.forward_only).count();
    let members: usize = classes.iter().map(|c| c.members.len()).sum();
    println!(
        "{}: {} classes, {} forward declarations, {} members",
        input.display(),
        classes.len() - stubs,
        stubs,
        members
    );
}

fn print_deps(module: &Module) {
    let graph = DependencyGraph::build(module);
    println!("=== Dependencies ===");
    for class in module.classes().into_iter().filter(|c| !c.forward_only) {
        let name = class.qualified_name();
        let deps = graph.dependencies_of(&name);
        if deps.is_empty() {
            println!("  {name}");
        } else {
            println!("  {name} -> {}", deps.join(", "));
        }
    }
    println!("=== Generation order ===");
    for (i, group) in graph.generation_order().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, group.join(" + "));
    }
}

fn lookup(input: &Path, config: Option<&Path>, name: &str) -> Result<()> {
    let (source, config) = load(input, config)?;
    let module = Pipeline::new(source, &config)
        .run()
        .map_err(miette::Report::new)?;
    let class = wrapidl::lookup(&module, name)
        .ok_or_else(|| miette::miette!("No class `{}` in {}", name, input.display()))?;
    let out = serde_json::to_string_pretty(class)
        .map_err(|e| miette::miette!("Failed to serialize class: {}", e))?;
    println!("{out}");
    Ok(())
}

fn info() -> Result<()> {
    println!("wrap interface front-end");
    println!("Version: {}", wrapidl::VERSION);
    println!();
    println!("Primitive types: string bool size_t int double char void");
    println!("Eigen types:     Matrix Vector");
    println!("Class types:     X, const X&, boost::shared_ptr<X>, X* (returns transfer ownership)");
    println!();
    println!("Settings ({}):", wrapidl::config::CONFIG_FILE_NAME);
    println!("  [parser] one_declaration_per_line");
    println!("  [check]  reject_ambiguous_constructors");
    Ok(())
}
