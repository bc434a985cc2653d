use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use formflow_spec::{
    AnswerSnapshot, ApplicationId, FormSchema, SectionOrdinals, ValidationOptions, WizardState,
    build_review, infer_resume_point, resolve, resolve_all, validate_document, validate_section,
};
use serde::Serialize;
use time::Date;
use time::macros::format_description;
use tracing::warn;

use crate::config::{EngineConfig, StoreConfig};
use crate::logging::init_tracing;
use crate::session::FormSession;

#[derive(Parser, Debug)]
#[command(
    name = "formflow",
    about = "Conditional multi-step form engine",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Engine configuration (TOML); defaults to $FORMFLOW_CONFIG
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `formflow=debug`
    #[arg(long = "log", value_name = "FILTER", global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate application ids
    NewId(NewIdArgs),
    /// Create a draft application and remember it as the current form
    New(SchemaArgs),
    /// Validate answers against a form schema
    Validate(ValidateArgs),
    /// Print the visible fields of one or every step
    Resolve(ResolveArgs),
    /// Show the step an application reopens at
    Resume(ResumeArgs),
    /// Print the read-only review of an application
    Review(ReviewArgs),
    /// Print the JSON Schema of form definitions
    Schema,
}

#[derive(Args, Debug)]
struct NewIdArgs {
    #[arg(long, default_value_t = 1)]
    count: usize,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(long, value_name = "form.json")]
    schema: PathBuf,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(long, value_name = "form.json")]
    schema: PathBuf,
    #[arg(long, value_name = "answers.json")]
    answers: PathBuf,
    /// Only validate this step
    #[arg(long)]
    step: Option<usize>,
    /// Reference date for date rules (YYYY-MM-DD); defaults to today
    #[arg(long, value_name = "DATE")]
    today: Option<String>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[arg(long, value_name = "form.json")]
    schema: PathBuf,
    #[arg(long, value_name = "answers.json")]
    answers: PathBuf,
    #[arg(long)]
    step: Option<usize>,
}

#[derive(Args, Debug)]
struct ResumeArgs {
    #[arg(long, value_name = "form.json")]
    schema: PathBuf,
    /// Stored application; defaults to the current form pointer
    #[arg(long, conflicts_with = "answers")]
    id: Option<String>,
    /// Infer from a local answers file instead of the store
    #[arg(long, value_name = "answers.json")]
    answers: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    #[arg(long, value_name = "form.json")]
    schema: PathBuf,
    #[arg(long, conflicts_with = "answers", required_unless_present = "answers")]
    id: Option<String>,
    #[arg(long, value_name = "answers.json")]
    answers: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ResumeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<ApplicationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<formflow_spec::ApplicationStatus>,
    step: usize,
    section: String,
    completed: Vec<usize>,
}

pub async fn main() -> Result<()> {
    run(Cli::parse()).await
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    init_tracing(cli.log.as_deref().or(config.log_filter.as_deref()));

    match cli.command {
        Commands::NewId(args) => {
            for _ in 0..args.count {
                println!("{}", ApplicationId::generate());
            }
            Ok(())
        }
        Commands::New(args) => new_application(&config, &args.schema).await,
        Commands::Validate(args) => validate(args),
        Commands::Resolve(args) => {
            let schema = load_schema(&args.schema)?;
            let snapshot = load_answers(&args.answers)?;
            match args.step {
                Some(step) => {
                    let section = resolve(&schema, &snapshot, step)
                        .ok_or_else(|| anyhow!("step {step} is out of range"))?;
                    print_json(&section)
                }
                None => print_json(&resolve_all(&schema, &snapshot)),
            }
        }
        Commands::Resume(args) => resume(&config, args).await,
        Commands::Review(args) => {
            let schema = load_schema(&args.schema)?;
            let snapshot = match (&args.answers, &args.id) {
                (Some(path), _) => load_answers(path)?,
                (None, Some(raw)) => {
                    let id = ApplicationId::parse(raw)?;
                    config.orchestrator().load(&id).await?.snapshot
                }
                (None, None) => bail!("either --id or --answers is required"),
            };
            print_json(&build_review(&schema, &snapshot))
        }
        Commands::Schema => print_json(&schemars::schema_for!(FormSchema)),
    }
}

async fn new_application(config: &EngineConfig, schema_path: &Path) -> Result<()> {
    let schema = load_schema(schema_path)?;
    let options = ValidationOptions::default();
    let session = FormSession::start(schema, config.orchestrator(), options).await?;
    if config.store == StoreConfig::Memory {
        warn!(
            application_id = %session.id(),
            "memory store is not persistent; current form pointer left unchanged"
        );
    } else if let Some(pointer) = config.pointer() {
        pointer
            .store(session.id())
            .await
            .with_context(|| format!("failed to write {}", pointer.path().display()))?;
    }
    println!("{}", session.id());
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let snapshot = load_answers(&args.answers)?;
    let options = match &args.today {
        Some(raw) => ValidationOptions::at(parse_day(raw)?),
        None => ValidationOptions::default(),
    };
    let result = match args.step {
        Some(step) if step >= schema.step_count() => bail!("step {step} is out of range"),
        Some(step) => validate_section(&schema, &snapshot, step, &options),
        None => validate_document(&schema, &snapshot, &options),
    };
    print_json(&result)?;
    if !result.valid {
        bail!(
            "{} error(s), {} missing required field(s)",
            result.errors.len(),
            result.missing_required.len()
        );
    }
    Ok(())
}

async fn resume(config: &EngineConfig, args: ResumeArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    if let Some(path) = &args.answers {
        let snapshot = load_answers(path)?;
        let step = infer_resume_point(&snapshot, &SectionOrdinals::from_schema(&schema));
        let state = WizardState::resume(step, schema.step_count());
        return print_json(&report(&schema, None, None, &state));
    }

    let id = match &args.id {
        Some(raw) => ApplicationId::parse(raw)?,
        None => {
            let pointer = config
                .pointer()
                .ok_or_else(|| anyhow!("no current form pointer location available"))?;
            pointer
                .load()
                .await?
                .ok_or_else(|| anyhow!("no application in progress; pass --id"))?
        }
    };
    let options = ValidationOptions::default();
    let session = FormSession::open(schema.clone(), config.orchestrator(), &id, options).await?;
    print_json(&report(
        &schema,
        Some(session.id().clone()),
        Some(session.status()),
        session.state(),
    ))
}

fn report(
    schema: &FormSchema,
    id: Option<ApplicationId>,
    status: Option<formflow_spec::ApplicationStatus>,
    state: &WizardState,
) -> ResumeReport {
    ResumeReport {
        id,
        status,
        step: state.current_step(),
        section: schema
            .section(state.current_step())
            .map(|section| section.id.clone())
            .unwrap_or_default(),
        completed: state.completed().iter().copied().collect(),
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_schema(path: &Path) -> Result<Arc<FormSchema>> {
    let raw = read_file(path)?;
    let schema = FormSchema::from_json(&raw)
        .with_context(|| format!("invalid form schema {}", path.display()))?;
    Ok(Arc::new(schema))
}

fn load_answers(path: &Path) -> Result<AnswerSnapshot> {
    let raw = read_file(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid answers JSON {}", path.display()))?;
    if !value.is_object() {
        bail!("answers in {} must be a JSON object", path.display());
    }
    Ok(AnswerSnapshot::from(value))
}

fn parse_day(raw: &str) -> Result<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
