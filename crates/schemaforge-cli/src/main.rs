//! schemaforge CLI - dependency-ordered DDL

use schemaforge_cli::cli;
use schemaforge_cli::config::{CliConfig, Properties};
#[cfg(feature = "database")]
use schemaforge_cli::database;
use schemaforge_cli::input;
use schemaforge_cli::output;
use schemaforge_cli::plan::{self, ApplyReport, Plan};

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use schemaforge_core::{DdlError, ExecutorConfig, RepositoryDescriptor, SchemaModel, VendorScripts};
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Args, OutputFormat};

/// Plan errors, or statements that failed.
const EXIT_FAILURE: u8 = 1;
/// Configuration error (e.g. unreadable input or an invalid script mapping).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("schemaforge: error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn init_logging(args: &Args) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

/// Failures of the schema itself or of the database exit with
/// [`EXIT_FAILURE`]; bad input and configuration with [`EXIT_CONFIG_ERROR`].
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DdlError>() {
        None
        | Some(DdlError::ScriptValidation(_))
        | Some(DdlError::ScriptIo { .. })
        | Some(DdlError::ScriptParse { .. }) => EXIT_CONFIG_ERROR,
        Some(_) => EXIT_FAILURE,
    }
}

fn run(args: Args) -> Result<bool> {
    if args.print_schema {
        let schema = schemars::schema_for!(RepositoryDescriptor);
        write_output(&args.output, &output::format_json(&schema, args.compact))?;
        return Ok(false);
    }

    let config = CliConfig::load(args.config.as_deref())?;
    let properties = Properties::parse(&args.properties)?;
    let database = config.resolve_database(&args);
    let executor = config.executor_config(&args, database);
    let type_names = config.type_names(database);

    let vendor_scripts =
        VendorScripts::from_config(&config.scripts, &config.base_dir, |name| {
            properties.lookup(name)
        })?;

    let sources = input::read_input(&args.files)?;
    let inputs = input::load_inputs(&sources, args.input, database)?;
    let existing = existing_tables(&args)?;

    let mut plan = plan::build_plan(inputs, existing, database, &type_names)?;
    plan.scripts = vendor_scripts.scripts_for(database);

    let applied = apply(&args, &plan, &executor)?;

    let colored = args.output.is_none() && io::stdout().is_terminal();
    let output_str = match args.format {
        OutputFormat::Text => output::format_text(&plan, applied.as_ref(), colored),
        OutputFormat::Json => output::format_json(
            &output::Report {
                plan: &plan,
                applied: applied.as_ref(),
            },
            args.compact,
        ),
        OutputFormat::Sql => output::format_sql(&plan, &executor, args.drop_existing),
    };
    write_output(&args.output, &output_str)?;

    Ok(plan.has_errors() || applied.as_ref().is_some_and(ApplyReport::has_failures))
}

#[cfg(feature = "database")]
fn existing_tables(args: &Args) -> Result<SchemaModel> {
    match args.url.as_deref() {
        Some(url) if args.include_existing => {
            let tables = database::fetch_existing_tables(url)
                .context("Failed to introspect existing tables")?;
            Ok(SchemaModel::from_existing(tables))
        }
        _ => Ok(SchemaModel::new()),
    }
}

#[cfg(not(feature = "database"))]
fn existing_tables(_args: &Args) -> Result<SchemaModel> {
    Ok(SchemaModel::new())
}

#[cfg(feature = "database")]
fn apply(args: &Args, plan: &Plan, executor: &ExecutorConfig) -> Result<Option<ApplyReport>> {
    let Some(url) = args.url.as_deref().filter(|_| args.apply) else {
        return Ok(None);
    };

    let scripts = plan
        .scripts
        .as_ref()
        .map(|set| set.load())
        .transpose()?;
    let data_source =
        database::SqlxDataSource::new(url).context("Failed to prepare database connection")?;
    let options = plan::ApplyOptions {
        executor: executor.clone(),
        drop_existing: args.drop_existing,
        tolerate_script_errors: args.tolerate_script_errors,
    };

    let report = plan::apply_plan(plan, scripts.as_ref(), &data_source, &options)?;
    Ok(Some(report))
}

#[cfg(not(feature = "database"))]
fn apply(_args: &Args, _plan: &Plan, _executor: &ExecutorConfig) -> Result<Option<ApplyReport>> {
    Ok(None)
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
