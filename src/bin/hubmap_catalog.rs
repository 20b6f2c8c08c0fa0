use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use hubmap_catalog::catalog::{BatchSummary, Catalog, CatalogOptions, ProgressSink};
use hubmap_catalog::config::{ConfigLoader, ResolvedConfig};
use hubmap_catalog::discovery::discover_urls;
use hubmap_catalog::domain::{DatasetUuid, extract_dataset_uuid};
use hubmap_catalog::error::CatalogError;
use hubmap_catalog::input::read_input_csv;
use hubmap_catalog::output::{BarProgress, JsonOutput, OutputMode};
use hubmap_catalog::probe::ExistenceProber;
use hubmap_catalog::registry::HubmapHttpClient;
use hubmap_catalog::schema::SchemaPreset;

#[derive(Parser)]
#[command(name = "hubmap-catalog")]
#[command(about = "Discover HuBMAP derived files and build a dataset catalogue")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Build a catalogue table from a CSV of dataset uuids")]
    Build(BuildArgs),
    #[command(about = "Discover file URLs for one dataset")]
    Discover(DiscoverArgs),
    #[command(about = "Extract the dataset uuid from a HuBMAP portal URL")]
    ExtractId(ExtractIdArgs),
}

#[derive(Args, Clone)]
struct SchemaArgs {
    #[arg(long)]
    schema: Option<SchemaPreset>,

    /// File name to probe; repeatable. Defaults to every name the schema accepts.
    #[arg(long = "file-type")]
    file_types: Vec<String>,
}

#[derive(Args)]
struct BuildArgs {
    #[arg(long)]
    input: Utf8PathBuf,

    /// `.json` writes JSON, anything else CSV. Prints JSON to stdout when omitted.
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    #[command(flatten)]
    schema: SchemaArgs,
}

#[derive(Args)]
struct DiscoverArgs {
    /// Dataset uuid or portal URL.
    dataset: String,

    #[command(flatten)]
    schema: SchemaArgs,
}

#[derive(Args)]
struct ExtractIdArgs {
    url: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::InvalidDatasetUrl(_)
        | CatalogError::InvalidUuid(_)
        | CatalogError::ConfigRead(_)
        | CatalogError::ConfigParse(_)
        | CatalogError::InvalidConfig(_)
        | CatalogError::InputRead(_) => 2,
        CatalogError::RegistryHttp(_)
        | CatalogError::RegistryStatus { .. }
        | CatalogError::InvalidRegistryResponse(_)
        | CatalogError::ProbeHttp(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::ExtractId(args) => {
            let uuid = extract_dataset_uuid(&args.url)?;
            println!("{uuid}");
            Ok(())
        }
        Commands::Discover(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            run_discover(args, &config)
        }
        Commands::Build(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            run_build(args, &config, output_mode)
        }
    }
}

fn catalog_options(args: SchemaArgs, config: &ResolvedConfig) -> CatalogOptions {
    let preset = args.schema.unwrap_or(config.schema);
    tracing::debug!("Using schema preset {preset}");
    let schema = preset.schema();
    if args.file_types.is_empty() {
        return CatalogOptions::from_schema(schema);
    }
    CatalogOptions {
        file_types: args.file_types,
        schema,
    }
}

fn run_discover(args: DiscoverArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let uuid = DatasetUuid::from_str_or_url(&args.dataset)?;
    let options = catalog_options(args.schema, config);
    let client = HubmapHttpClient::new(config)?;
    let prober = ExistenceProber::new(config.probe_policy);

    match discover_urls(
        &client,
        &prober,
        &uuid,
        options.file_types.as_slice(),
        &options.schema,
    )? {
        Some(urls) => JsonOutput::print_json(&urls).into_diagnostic(),
        None => {
            eprintln!("No usable files for uuid {uuid}.");
            Ok(())
        }
    }
}

fn run_build(
    args: BuildArgs,
    config: &ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let worklist = read_input_csv(&args.input)?;
    let options = catalog_options(args.schema, config);
    let client = HubmapHttpClient::new(config)?;
    let catalog = Catalog::new(client, ExistenceProber::new(config.probe_policy), options);

    let sink: Box<dyn ProgressSink> = match output_mode {
        OutputMode::Interactive => Box::new(BarProgress::new()),
        OutputMode::NonInteractive => Box::new(JsonOutput),
    };
    let (table, summary) = catalog.build_worklist(&worklist, sink.as_ref());
    if table.is_empty() {
        tracing::warn!("No dataset in {} produced a catalogue row.", args.input);
    }

    match &args.output {
        Some(path) => {
            table.write_to_path(path)?;
            print_build_summary(&summary, Some(path));
        }
        None => {
            table.write_json(std::io::stdout())?;
            println!();
            print_build_summary(&summary, None);
        }
    }
    Ok(())
}

fn print_build_summary(summary: &BatchSummary, output: Option<&Utf8PathBuf>) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    eprintln!(
        "{green}catalogued {} of {} datasets{reset}",
        summary.added, summary.total
    );
    if summary.no_files > 0 {
        eprintln!("{yellow}no usable files: {}{reset}", summary.no_files);
    }
    if summary.duplicates > 0 {
        eprintln!("{yellow}duplicate uuids skipped: {}{reset}", summary.duplicates);
    }
    if summary.failed > 0 {
        eprintln!("{red}errors: {}{reset}", summary.failed);
    }
    if let Some(path) = output {
        eprintln!("written to {path}");
    }
}
