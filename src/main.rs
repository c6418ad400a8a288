// hppuml: C++ headers to PlantUML class diagrams

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hppuml::inputs::expand_inputs;
use hppuml::{analyze, render, BuildOptions, RenderOptions, SourceText};

#[derive(Parser)]
#[command(name = "hppuml")]
#[command(about = "Build a PlantUML class diagram from C++ headers", long_about = None)]
struct Cli {
    /// Header file or glob pattern (`include/**/*.hpp`); repeat for several
    #[arg(short, long = "input", required = true)]
    inputs: Vec<String>,

    /// Write the diagram here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Draw dependencies from method parameter types
    #[arg(short, long)]
    dependencies: bool,

    /// Warn about member types that name no declared entity
    #[arg(long)]
    unresolved: bool,

    /// Omit fields and methods from the diagram
    #[arg(long)]
    no_members: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")?;

    let paths = expand_inputs(&cli.inputs).context("failed to expand input files")?;
    if paths.is_empty() {
        bail!("no input files matched {}", cli.inputs.join(", "));
    }

    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        sources.push(SourceText::new(path.display().to_string(), text));
    }

    let options = BuildOptions {
        dependencies: cli.dependencies,
        report_unresolved_types: cli.unresolved,
    };
    let analysis = analyze(&sources, &options).context("failed to build entity model")?;

    if !analysis.report.is_empty() {
        eprintln!("{}", analysis.report);
    }

    let diagram = render(
        &analysis.model,
        &RenderOptions {
            members: !cli.no_members,
            ..RenderOptions::default()
        },
    );

    match &cli.output {
        Some(path) => {
            fs::write(path, &diagram)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), entities = analysis.model.len(), "wrote diagram");
        }
        None => print!("{}", diagram),
    }

    Ok(())
}
