use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use bridgemeta_common::{CONFIG_FILENAME, GeneratorConfig, Version};
use bridgemeta_core::{FinalizedGraph, PipelineReport, ResolutionContext, TranslationUnit, build_graph};

use crate::cli::common::OutputFormat;
use crate::cli::run_cli_sync;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(
        value_name = "UNIT",
        help = "Translation unit to process (.json, or .yaml/.yml)"
    )]
    pub unit: PathBuf,
    #[arg(
        long = "config",
        value_name = "FILE",
        help = "Configuration file. Defaults to bridgemeta.toml next to the unit, if present"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "output",
        short = 'o',
        value_name = "FILE",
        help = "Where to write the graph dump. Defaults to <UNIT>.meta.<format> next to the unit"
    )]
    pub output: Option<PathBuf>,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,
    #[arg(
        long = "target-version",
        value_name = "VERSION",
        help = "Deployment target, overriding the configuration"
    )]
    pub target_version: Option<String>,
    #[arg(
        long = "toolchain-version",
        value_name = "VERSION",
        help = "Toolchain version, overriding the configuration"
    )]
    pub toolchain_version: Option<String>,
    #[arg(
        long = "report",
        value_name = "FILE",
        help = "Also write the pipeline report as JSON"
    )]
    pub report: Option<PathBuf>,
}

pub fn run(args: GenerateArgs) -> i32 {
    run_cli_sync(|| run_inner(&args).map(|_| ()))
}

/// Run the pipeline and return the path of the written dump.
fn run_inner(args: &GenerateArgs) -> Result<PathBuf, String> {
    let start = Instant::now();
    let config = resolve_config(args)?;
    let ctx = ResolutionContext::from_config(&config)
        .map_err(|e| format!("Failed to prepare configuration: {e}"))?;

    let unit = TranslationUnit::load(&args.unit)?;
    debug!(
        unit = %args.unit.display(),
        decls = unit.decls.len(),
        types = unit.types.len(),
        "Loaded translation unit."
    );

    let (graph, report) = build_graph(&unit, &ctx);
    graph.verify_unique_names()?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.unit, args.format));
    let rendered = render(&graph, args.format)?;
    fs::write(&output, rendered)
        .map_err(|e| format!("Failed to write {}: {e}", output.display()))?;

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {e}"))?;
        fs::write(report_path, json)
            .map_err(|e| format!("Failed to write {}: {e}", report_path.display()))?;
    }

    info!(
        output = %output.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Wrote metadata graph."
    );
    print_summary(&graph, &report, &output);
    Ok(output)
}

/// Explicit `--config`, else `bridgemeta.toml` beside the unit, else defaults;
/// command-line versions override the file.
fn resolve_config(args: &GenerateArgs) -> Result<GeneratorConfig, String> {
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let candidate = args
                .unit
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(CONFIG_FILENAME);
            candidate.is_file().then_some(candidate)
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration.");
            GeneratorConfig::load(path).map_err(|e| format!("Failed to load configuration: {e}"))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(version) = &args.target_version {
        config.target_version = parse_version("--target-version", version)?;
    }
    if let Some(version) = &args.toolchain_version {
        config.toolchain_version = parse_version("--toolchain-version", version)?;
    }
    Ok(config)
}

fn parse_version(flag: &str, value: &str) -> Result<Version, String> {
    value
        .parse::<Version>()
        .map_err(|e| format!("Invalid {flag}: {e}"))
}

fn default_output_path(unit: &Path, format: OutputFormat) -> PathBuf {
    let stem = unit
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unit");
    unit.with_file_name(format!("{stem}.meta.{}", format.extension()))
}

fn render(graph: &FinalizedGraph, format: OutputFormat) -> Result<String, String> {
    let dump = graph.dump();
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(&dump).map_err(|e| format!("Failed to serialize graph: {e}"))
        }
        OutputFormat::Json => serde_json::to_string_pretty(&dump)
            .map_err(|e| format!("Failed to serialize graph: {e}")),
    }
}

fn print_summary(graph: &FinalizedGraph, report: &PipelineReport, output: &Path) {
    let entities: usize = graph.modules.values().map(Vec::len).sum();
    println!(
        "Built {entities} entities in {} modules ({} skipped, {} failed, {} excluded, {} renamed)",
        graph.modules.len(),
        report.skipped,
        report.failed,
        report.excluded,
        report.renamed
    );
    for (module, ids) in &graph.modules {
        println!("  {module}: {}", ids.len());
    }
    for failure in &report.errors {
        println!("  failed {} ({}): {}", failure.decl, failure.module, failure.chain.join(" <- "));
    }
    if !report.method_collisions.is_empty() {
        println!(
            "  {} method name collisions left for the emitter",
            report.method_collisions.len()
        );
    }
    println!("Wrote {}", output.display());
}
