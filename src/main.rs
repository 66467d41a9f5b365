use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dataverse_uploader::dataverse::dataset_page_url;
use dataverse_uploader::upload::UploadStatus;
use dataverse_uploader::utils::inventory_scan::{scan_inventory, DEFAULT_PATTERN};
use dataverse_uploader::{
    build_datafile_metadata, ApiHandle, Config, DataverseClient, FileProcessor, Table,
    UploadOptions, UploadOutcome,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Build datafile metadata and direct-upload datafiles to Dataverse", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataverse installation, e.g. https://dataverse.harvard.edu
    #[arg(long, global = true)]
    server_url: Option<String>,

    #[arg(long, global = true, env = "DATAVERSE_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TemplateArgs {
    /// Description template applied to every datafile
    #[arg(long, conflicts_with = "template_file")]
    template: Option<String>,

    /// Read the description template from a file
    #[arg(long)]
    template_file: Option<PathBuf>,
}

#[derive(Args)]
struct TargetArgs {
    /// Directory holding the datafiles
    #[arg(long)]
    data_dir: PathBuf,

    /// Persistent identifier of the dataset, e.g. doi:10.7910/DVN/XXXXXX
    #[arg(long)]
    dataset_pid: String,

    /// Open the dataset page in a browser after a successful finalize
    #[arg(long)]
    open: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a data directory and write an inventory CSV
    Inventory {
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,
        #[arg(long)]
        output: PathBuf,
    },
    /// Add descriptions to an inventory CSV
    Metadata {
        #[arg(long)]
        inventory: PathBuf,
        #[command(flatten)]
        template: TemplateArgs,
        #[arg(long)]
        output: PathBuf,
    },
    /// Upload the datafiles listed in a metadata CSV and finalize them
    Upload {
        #[arg(long)]
        metadata: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Build metadata from an inventory and upload in one go
    Run {
        #[arg(long)]
        inventory: PathBuf,
        #[command(flatten)]
        template: TemplateArgs,
        #[command(flatten)]
        target: TargetArgs,
        /// Also write the generated metadata CSV here
        #[arg(long)]
        metadata_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Inventory {
            data_dir,
            pattern,
            output,
        } => {
            let inventory = scan_inventory(data_dir, pattern)?;
            write_table(&inventory, output)?;
            println!("{} datafile(s) written to {}", inventory.len(), output.display());
        }
        Commands::Metadata {
            inventory,
            template,
            output,
        } => {
            let metadata = build_metadata(inventory, template)?;
            write_table(&metadata, output)?;
            println!("Metadata for {} datafile(s) written to {}", metadata.len(), output.display());
        }
        Commands::Upload { metadata, target } => {
            let metadata = Table::from_csv_path(metadata)
                .with_context(|| format!("Failed to read metadata {}", metadata.display()))?;
            upload(&cli, &config, target, &metadata)?;
        }
        Commands::Run {
            inventory,
            template,
            target,
            metadata_out,
        } => {
            let metadata = build_metadata(inventory, template)?;
            if let Some(path) = metadata_out {
                write_table(&metadata, path)?;
            }
            upload(&cli, &config, target, &metadata)?;
        }
    }

    Ok(())
}

fn read_template(args: &TemplateArgs) -> Result<String> {
    match (&args.template, &args.template_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => Ok(fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?
            .trim_end()
            .to_string()),
        (None, None) => bail!("Either --template or --template-file is required"),
    }
}

fn build_metadata(inventory: &Path, template: &TemplateArgs) -> Result<Table> {
    let template = read_template(template)?;
    let inventory = Table::from_csv_path(inventory)
        .with_context(|| format!("Failed to read inventory {}", inventory.display()))?;
    let metadata = build_datafile_metadata(&inventory, &template)?;
    if metadata.is_empty() {
        warn!("Inventory or template is empty, no metadata produced");
    }
    Ok(metadata)
}

fn write_table(table: &Table, path: &Path) -> Result<()> {
    table
        .to_csv_path(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn upload(cli: &Cli, config: &Config, target: &TargetArgs, metadata: &Table) -> Result<()> {
    let server_url = cli
        .server_url
        .clone()
        .or_else(|| config.dataverse.server_url.clone())
        .context("No Dataverse URL given (use --server-url or dataverse.server_url)")?;
    let api = cli
        .api_token
        .clone()
        .or_else(|| config.dataverse.api_token.clone())
        .map(ApiHandle::new);
    if api.is_none() {
        bail!("No API token given (use --api-token, DATAVERSE_API_TOKEN or dataverse.api_token)");
    }

    let client = DataverseClient::new().context("Failed to create HTTP client")?;
    let processor = FileProcessor::new(client, UploadOptions::from(&config.upload));
    let outcome = processor.process_files(
        api.as_ref(),
        &server_url,
        &target.dataset_pid,
        &target.data_dir,
        metadata,
    );
    conclude(&outcome, &server_url, target, &mut io::stdout().lock())
}

/// Print the per-file report and turn the outcome into the exit status.
/// A rejected call prints nothing.
fn conclude(
    outcome: &UploadOutcome,
    server_url: &str,
    target: &TargetArgs,
    out: &mut impl Write,
) -> Result<()> {
    if *outcome == UploadOutcome::rejected() {
        bail!("Upload rejected: metadata is empty or the dataset target is incomplete");
    }
    report(outcome, out)?;

    if outcome.finalize_succeeded && target.open {
        let page = dataset_page_url(server_url, &target.dataset_pid);
        info!("Opening {}", page);
        if let Err(e) = open::that(&page) {
            warn!("Failed to open browser: {}", e);
        }
    }

    if !outcome.success {
        bail!("{} datafile(s) failed to upload", outcome.errors.len());
    }
    if !outcome.finalize_succeeded {
        bail!("Finalize failed for {}", target.dataset_pid);
    }
    Ok(())
}

fn report(outcome: &UploadOutcome, out: &mut impl Write) -> io::Result<()> {
    for file in &outcome.file_statuses {
        match &file.status {
            UploadStatus::Success => writeln!(out, "✅ {}", file.name)?,
            UploadStatus::Failed(reason) => writeln!(out, "❌ {}: {}", file.name, reason)?,
        }
    }
    for error in &outcome.errors {
        writeln!(out, "{}", error)?;
    }
    writeln!(
        out,
        "Uploaded: {} | Failed: {} | Finalized: {}",
        outcome.file_statuses.len().saturating_sub(outcome.errors.len()),
        outcome.errors.len(),
        if outcome.finalize_succeeded { "yes" } else { "no" }
    )
}
