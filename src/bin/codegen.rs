//! Swagger Codegen CLI
//!
//! Resolves a local Swagger 2.0 document and writes the IR (and optionally
//! the template view data) as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use swagger_codegen::config::OutputFormat;
use swagger_codegen::{Generator, GeneratorConfig, SwaggerDocument};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-codegen")]
#[command(about = "Resolve Swagger 2.0 documents into a client codegen IR")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a document and write ir.json
    Generate {
        /// Swagger 2.0 JSON document (overrides [source] document)
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Output directory (overrides [output] dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only resolve paths containing one of these
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Skip paths containing any of these
        #[arg(short = 'x', long = "exclude")]
        exclude_paths: Vec<String>,

        /// Prefix prepended to every operation path
        #[arg(short, long)]
        base_url: Option<String>,

        /// Also write view.json for template engines
        #[arg(long)]
        view: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Exit non-zero if any warning was recorded
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Print the effective configuration, or write it to a file
    Config {
        /// Write to this file instead of printing
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Command::Generate {
            document,
            output,
            paths,
            exclude_paths,
            base_url,
            view,
            compact,
            deny_warnings,
        } => {
            if let Some(document) = document {
                config.source.document = Some(document);
            }
            if let Some(output) = output {
                config.output.dir = output;
            }
            if !paths.is_empty() {
                config.codegen.filter.paths = paths;
            }
            if !exclude_paths.is_empty() {
                config.codegen.filter.exclude_paths = exclude_paths;
            }
            if base_url.is_some() {
                config.codegen.naming.base_url = base_url;
            }
            config.output.view |= view;
            if compact {
                config.output.format = OutputFormat::Compact;
            }
            generate(&config, deny_warnings)
        }
        Command::Config { save } => {
            match save {
                Some(path) => {
                    config.save(&path)?;
                    println!("✅ Configuration written to {}", path.display());
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }
    }
}

fn generate(config: &GeneratorConfig, deny_warnings: bool) -> anyhow::Result<()> {
    let Some(source) = &config.source.document else {
        bail!("no source document: pass --document or set [source] document");
    };

    println!("📄 Swagger Codegen");
    println!("  Document: {}", source.display());

    let document = SwaggerDocument::from_path(source)
        .with_context(|| format!("failed to load {}", source.display()))?;
    let ir = Generator::new(&config.codegen).generate(&document);

    let out_dir = config.output_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let ir_path = out_dir.join("ir.json");
    fs::write(&ir_path, config.output.format.to_json(&ir)?)?;
    println!("  IR: {}", ir_path.display());

    if config.output.view {
        let view = ir.view(config.codegen.model_namespace.as_deref());
        let view_path = out_dir.join("view.json");
        fs::write(&view_path, config.output.format.to_json(&view)?)?;
        println!("  View: {}", view_path.display());
    }

    println!();
    println!(
        "✅ {} apis, {} operations, {} models",
        ir.apis.len(),
        ir.operations.len(),
        ir.models.len()
    );

    if !ir.diagnostics.is_empty() {
        println!();
        print!("{}", ir.diagnostics);
    }

    if deny_warnings && ir.diagnostics.warning_count() > 0 {
        bail!("{} warning(s) recorded", ir.diagnostics.warning_count());
    }

    Ok(())
}
