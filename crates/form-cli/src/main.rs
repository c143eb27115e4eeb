use std::convert::Infallible;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use form_engine::{
    FormSchema, FormStore, SubmitOutcome, Submission, Values, build_summary, default_values,
    dependency_graph, lint, render_json, render_text,
};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Declarative form engine CLI",
    long_about = "Inspects form schemas, validates value files against them and runs the submit pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print fields, defaults, condition dependencies and schema diagnostics.
    Inspect {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Exit with an error when any diagnostic is reported.
        #[arg(long)]
        strict: bool,
    },
    /// Validate every visible field of a value file.
    Validate {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// JSON object with field values.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        /// Summary output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run the submit pipeline and print the submitted values.
    Submit {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON object with initial values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Also print the submission as JSON.
        #[arg(long)]
        answers_json: bool,
    },
    /// Print the JSON Schema describing the form schema format.
    JsonSchema,
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { schema, strict } => run_inspect(&schema, strict),
        Command::Validate {
            schema,
            values,
            format,
        } => run_validate(&schema, &values, format),
        Command::Submit {
            schema,
            values,
            answers_json,
        } => run_submit(&schema, values.as_deref(), answers_json),
        Command::JsonSchema => run_json_schema(),
    }
}

/// Logs go to stderr; `FORM_ENGINE_LOG` takes an env-filter directive.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("FORM_ENGINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_values(path: &Path) -> CliResult<Values> {
    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(format!("{} must contain a JSON object", path.display()).into()),
    }
}

fn run_inspect(schema_path: &Path, strict: bool) -> CliResult<()> {
    let schema = FormSchema::from_path(schema_path)?;
    println!("Form: {} ({})", schema.title, schema.id);
    if let Some(subtitle) = &schema.subtitle {
        println!("Subtitle: {}", subtitle);
    }

    println!("Fields:");
    for field in &schema.fields {
        let mut entry = format!(" - {} ({}) [{}]", field.id, field.label, field.kind.as_str());
        if field.visible_when.is_some() {
            entry.push_str(" conditional");
        }
        println!("{}", entry);
    }

    let defaults = default_values(&schema);
    if !defaults.is_empty() {
        println!("Defaults:");
        for (id, value) in &defaults {
            println!("  {} = {}", id, value);
        }
    }

    let graph = dependency_graph(&schema);
    if !graph.is_empty() {
        println!("Dependencies:");
        for (id, dependents) in &graph {
            let names: Vec<&str> = dependents.iter().map(String::as_str).collect();
            println!("  {} -> {}", id, names.join(", "));
        }
    }

    let diagnostics = lint(&schema);
    if diagnostics.is_empty() {
        println!("No diagnostics.");
        return Ok(());
    }
    println!("Diagnostics:");
    for diagnostic in &diagnostics {
        println!("  {}", diagnostic);
    }
    if strict {
        Err(format!("{} diagnostic(s) reported", diagnostics.len()).into())
    } else {
        Ok(())
    }
}

fn run_validate(schema_path: &Path, values_path: &Path, format: OutputFormat) -> CliResult<()> {
    let schema = FormSchema::from_path(schema_path)?;
    let values = load_values(values_path)?;
    let store = FormStore::new(schema, Some(values));

    store.set_touched_multiple(store.meta().visible_fields);
    let valid = store.validate_all_fields();
    debug!(valid, "validation finished");

    let summary = build_summary(&store);
    match format {
        OutputFormat::Text => println!("{}", render_text(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&render_json(&summary))?),
    }

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_submit(schema_path: &Path, values_path: Option<&Path>, answers_json: bool) -> CliResult<()> {
    let schema = FormSchema::from_path(schema_path)?;
    let values = values_path.map(load_values).transpose()?;
    let store = FormStore::new(schema, values);

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let outcome = runtime.block_on(
        store.handle_submit(|submission| async move { Ok::<_, Infallible>(submission) }),
    )?;

    match outcome {
        SubmitOutcome::Submitted(submission) => show_submission(&submission, answers_json),
        SubmitOutcome::Invalid(errors) => {
            eprintln!("Form is invalid:");
            for (id, message) in &errors {
                eprintln!("  {} - {}", id, message);
            }
            Err("validation failed".into())
        }
    }
}

fn show_submission(submission: &Submission, answers_json: bool) -> CliResult<()> {
    println!("Submitted ✅");
    let bytes = submission.to_cbor()?;
    println!("Values (CBOR hex): {}", encode_hex(&bytes));
    if answers_json {
        println!("{}", submission.to_json_pretty()?);
    }
    Ok(())
}

fn run_json_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(FormSchema);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{:02x}", byte);
        out
    })
}
