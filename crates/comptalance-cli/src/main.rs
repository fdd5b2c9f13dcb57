//! Comptalance CLI - merge balance N and N-1 into an accounting template

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use comptalance::prelude::*;
use comptalance::{load_workbook_file, TemplateDescriptor};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "comptalance")]
#[command(
    author,
    version,
    about = "Integrate balance N and N-1 workbooks into an accounting template"
)]
struct Cli {
    #[command(flatten)]
    locations: Locations,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where templates live; defaults to models.json, models_excel/ and
/// models_images/ in the current directory
#[derive(Args)]
struct Locations {
    /// Base directory the other locations are resolved against
    #[arg(long, env = "COMPTALANCE_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Template registry (JSON)
    #[arg(long, env = "COMPTALANCE_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Directory holding the template workbooks
    #[arg(long, env = "COMPTALANCE_TEMPLATES_DIR", global = true)]
    templates_dir: Option<PathBuf>,

    /// Directory holding the template preview images
    #[arg(long, env = "COMPTALANCE_IMAGES_DIR", global = true)]
    images_dir: Option<PathBuf>,
}

impl Locations {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(registry) = &self.registry {
            settings.registry_file = registry.clone();
        }
        if let Some(dir) = &self.templates_dir {
            settings.templates_dir = dir.clone();
        }
        if let Some(dir) = &self.images_dir {
            settings.images_dir = dir.clone();
        }
        match &self.root {
            Some(root) => settings.rooted_at(root),
            None => settings,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the available templates
    #[command(alias = "list")]
    Templates,

    /// Show a template: its sheets and preview images
    Show {
        /// Template name (case-insensitive)
        name: String,
    },

    /// Merge both balances into a template and write the result
    Merge {
        /// Template name (case-insensitive; the first template when unknown)
        #[arg(short, long)]
        template: String,

        /// Balance N workbook
        #[arg(long)]
        balance_n: PathBuf,

        /// Balance N-1 workbook
        #[arg(long)]
        balance_n1: PathBuf,

        /// Output file (default: comptabilite_complete_<timestamp>.xlsx)
        #[arg(short, long, conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for the generated file name (default: current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Show information about a workbook
    Info {
        /// Input .xlsx file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = cli.locations.settings();
    tracing::debug!(?settings, "resolved locations");

    match cli.command {
        Commands::Templates => list_templates(&settings),
        Commands::Show { name } => show_template(&settings, &name),
        Commands::Merge {
            template,
            balance_n,
            balance_n1,
            output,
            output_dir,
        } => merge(
            &settings,
            &template,
            &balance_n,
            &balance_n1,
            output.as_deref(),
            output_dir.as_deref(),
        ),
        Commands::Info { input } => show_info(&input),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // installs the log -> tracing bridge for the library crates as well
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(settings: &Settings) -> Result<TemplateRegistry> {
    let registry = TemplateRegistry::load_all(&settings.registry_file);
    if registry.is_empty() {
        bail!(
            "No templates found in '{}'",
            settings.registry_file.display()
        );
    }
    Ok(registry)
}

/// Resolve `name` the way the registry does, saying so when it falls back
fn find_template<'a>(
    registry: &'a TemplateRegistry,
    name: &str,
) -> Result<(usize, &'a TemplateDescriptor)> {
    let index = registry.index_of(name);
    let template = registry
        .get(index)
        .with_context(|| format!("Template index {} not found", index))?;
    if template.name.to_lowercase() != name.to_lowercase() {
        eprintln!(
            "Warning: no template named '{}', using '{}'",
            name, template.name
        );
    }
    Ok((index, template))
}

fn list_templates(settings: &Settings) -> Result<()> {
    let registry = load_registry(settings)?;

    for (i, template) in registry.templates().iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}",
            i,
            template.name,
            template.file_path,
            template.description.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

fn show_template(settings: &Settings, name: &str) -> Result<()> {
    let registry = load_registry(settings)?;
    let (index, template) = find_template(&registry, name)?;

    println!("Template: {}", template.name);
    if let Some(description) = &template.description {
        println!("Description: {}", description);
    }

    if let Some(path) = registry.template_path(index, settings) {
        println!("File: {}", path.display());
        match load_workbook_file(&path) {
            Ok(workbook) => {
                for (i, sheet_name) in workbook.sheet_names().iter().enumerate() {
                    println!("  Sheet {}: \"{}\"", i, sheet_name);
                }
            }
            Err(e) => eprintln!("Warning: {}", e),
        }
    }

    let images = registry.image_paths(index, settings);
    if !images.is_empty() {
        println!("Images:");
        for image in images {
            let marker = if image.exists { "" } else { " (missing)" };
            println!("  {}{}", image.path.display(), marker);
        }
    }

    Ok(())
}

fn merge(
    settings: &Settings,
    template_name: &str,
    balance_n: &Path,
    balance_n1: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let registry = load_registry(settings)?;
    let (index, template) = find_template(&registry, template_name)?;
    let template_path = registry
        .template_path(index, settings)
        .with_context(|| format!("Template index {} not found", index))?;

    let mut session = MergeSession::new();
    session
        .load_file(Slot::Template, &template_path)
        .with_context(|| format!("Failed to load template '{}'", template.name))?;
    session
        .load_file(Slot::BalanceN, balance_n)
        .with_context(|| format!("Failed to load balance N '{}'", balance_n.display()))?;
    session
        .load_file(Slot::BalanceN1, balance_n1)
        .with_context(|| format!("Failed to load balance N-1 '{}'", balance_n1.display()))?;

    let report = session
        .integrate()
        .context("Failed to integrate the balances")?;
    tracing::info!(?report, "balances integrated");

    let download = session
        .download()
        .context("The merge produced no output")?;

    let written = match output {
        Some(path) => {
            std::fs::write(path, &download.bytes)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            path.to_path_buf()
        }
        None => {
            let dir = output_dir.unwrap_or_else(|| Path::new("."));
            download
                .save_in(dir)
                .with_context(|| format!("Failed to write into '{}'", dir.display()))?
        }
    };

    eprintln!(
        "Added {} to '{}' -> '{}'",
        report.placed.join(" and "),
        template.name,
        written.display()
    );
    if report.skipped_attributes > 0 {
        eprintln!(
            "Warning: {} formatting attributes could not be copied",
            report.skipped_attributes
        );
    }

    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = load_workbook_file(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        let active = if i == workbook.active_sheet() {
            " (active)"
        } else {
            ""
        };

        println!();
        println!("  Sheet {}: \"{}\"{}", i, sheet.name(), active);
        match sheet.used_range() {
            Some(range) => println!("    Used range: {}", range),
            None => println!("    Used range: empty"),
        }
        println!("    Merged ranges: {}", sheet.merged_regions().len());

        let records = sheet.layout().present_records();
        if records.is_empty() {
            println!("    Layout: none");
        } else {
            println!("    Layout: {}", records.join(", "));
        }
    }

    Ok(())
}
