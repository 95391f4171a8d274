use crate::ui::types::choices::{
    DumpFormat, EvaluatorChoice, FieldKind, FieldSpec, LearnerChoice, PrequentialParams,
    StreamChoice, TaskChoice, UIChoice, specs_for_kind,
};
use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use strum::{EnumMessage, IntoEnumIterator};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Prequential runner for drift-adaptive Hoeffding trees"
)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a prequential evaluation
    Run(RunArgs),
    /// List the parameters of a component
    Describe(DescribeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Component {
    Learner,
    Stream,
    Evaluator,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    pub component: Component,

    /// Component kind (e.g. abrupt-drift); omit to list the kinds
    pub kind: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Stream to consume (e.g. abrupt-drift, arff-file)
    #[arg(long, value_name = "STREAM")]
    pub stream: String,

    /// Learner to train
    #[arg(long, default_value = "adaptive-hoeffding-tree", value_name = "LEARNER")]
    pub learner: String,

    /// Evaluator to record metrics
    #[arg(long, default_value = "basic-classification", value_name = "EVALUATOR")]
    pub evaluator: String,

    /// Stop after this many instances (omit for unlimited)
    #[arg(long, value_name = "N")]
    pub max_instances: Option<u64>,

    /// Stop after this many CPU seconds (omit for unlimited)
    #[arg(long, value_name = "SECONDS")]
    pub max_seconds: Option<u64>,

    /// Emit metrics every N instances
    #[arg(
        long,
        default_value_t = 100_000,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub sample_frequency: u64,

    /// Accrue RAM-hours every N instances
    #[arg(
        long,
        default_value_t = 100_000,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub mem_check_frequency: u64,

    /// File to dump evaluation snapshots after completion
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub dump_file: Option<PathBuf>,

    /// Format for the dump file (csv, tsv, json)
    #[arg(long, default_value = "csv", value_name = "FORMAT")]
    pub dump_format: DumpFormat,

    /// Override learner parameters (key=value, nested keys with dots)
    #[arg(long = "learner-param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub learner_params: Vec<KeyValue>,

    /// Override stream parameters (key=value, nested keys with dots)
    #[arg(long = "stream-param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub stream_params: Vec<KeyValue>,

    /// Override evaluator parameters (key=value, nested keys with dots)
    #[arg(long = "evaluator-param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub evaluator_params: Vec<KeyValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    key: String,
    value: Value,
}

impl RunArgs {
    pub fn into_task_choice(self) -> Result<TaskChoice> {
        let learner = build_choice::<LearnerChoice>(&self.learner, &self.learner_params)
            .with_context(|| format!("invalid learner '{}'", self.learner))?;
        let stream = build_choice::<StreamChoice>(&self.stream, &self.stream_params)
            .with_context(|| format!("invalid stream '{}'", self.stream))?;
        let evaluator = build_choice::<EvaluatorChoice>(&self.evaluator, &self.evaluator_params)
            .with_context(|| format!("invalid evaluator '{}'", self.evaluator))?;

        Ok(TaskChoice::EvaluatePrequential(PrequentialParams {
            learner,
            stream,
            evaluator,
            max_instances: self.max_instances,
            max_seconds: self.max_seconds,
            sample_frequency: self.sample_frequency,
            mem_check_frequency: self.mem_check_frequency,
            dump_file: self.dump_file,
            dump_format: self.dump_format,
        }))
    }
}

impl DescribeArgs {
    pub fn render(&self) -> Result<String> {
        match self.component {
            Component::Learner => describe::<LearnerChoice>(self.kind.as_deref()),
            Component::Stream => describe::<StreamChoice>(self.kind.as_deref()),
            Component::Evaluator => describe::<EvaluatorChoice>(self.kind.as_deref()),
        }
    }
}

fn describe<C>(kind_input: Option<&str>) -> Result<String>
where
    C: UIChoice,
    C::Kind: FromStr,
{
    let mut out = String::new();
    let Some(kind_input) = kind_input else {
        for kind in C::Kind::iter() {
            writeln!(out, "{kind:<28} {}", kind.get_detailed_message().unwrap_or(""))?;
        }
        return Ok(out);
    };

    let kind = parse_kind::<C::Kind>(kind_input)?;
    writeln!(out, "{kind}: {}", kind.get_detailed_message().unwrap_or(""))?;
    let specs = specs_for_kind(&C::schema(), &kind.to_string(), &C::default_params(kind))?;
    for spec in &specs {
        writeln!(out, "  {}", render_field(spec))?;
    }
    Ok(out)
}

fn render_field(spec: &FieldSpec) -> String {
    let kind = match spec.kind {
        FieldKind::String => "string".to_string(),
        FieldKind::Integer => "integer".to_string(),
        FieldKind::Number => "number".to_string(),
        FieldKind::Boolean => "bool".to_string(),
        FieldKind::Choice => spec.allowed.join("|"),
    };
    let mut line = format!("{:<36} {kind}", spec.name);
    match (spec.min, spec.max) {
        (Some(min), Some(max)) => line.push_str(&format!(" [{min}, {max}]")),
        (Some(min), None) => line.push_str(&format!(" [>= {min}]")),
        (None, Some(max)) => line.push_str(&format!(" [<= {max}]")),
        (None, None) => {}
    }
    if let Some(default) = spec.default.as_ref().filter(|d| !d.is_null()) {
        line.push_str(&format!(" (default {default})"));
    }
    if let Some(description) = &spec.description {
        line.push_str(&format!("  {description}"));
    }
    line
}

fn build_choice<C>(kind_input: &str, overrides: &[KeyValue]) -> Result<C>
where
    C: UIChoice,
    C::Kind: FromStr,
{
    let kind = parse_kind::<C::Kind>(kind_input)?;
    let mut params = C::default_params(kind);
    for kv in overrides {
        set_path(&mut params, &kv.key, kv.value.clone())
            .with_context(|| format!("failed to set '{}'", kv.key))?;
    }
    C::from_parts(kind, params)
}

/// Accepts kebab-case, snake_case and CamelCase spellings of a kind.
fn parse_kind<T: FromStr>(raw: &str) -> Result<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty kind");
    }
    let mut kebab = String::new();
    let mut previous_lower = false;
    for ch in raw.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            kebab.push('-');
            previous_lower = false;
        } else if ch.is_uppercase() {
            if previous_lower {
                kebab.push('-');
            }
            kebab.extend(ch.to_lowercase());
            previous_lower = false;
        } else {
            kebab.push(ch);
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    [raw.to_string(), raw.to_lowercase(), kebab]
        .iter()
        .find_map(|candidate| candidate.parse::<T>().ok())
        .ok_or_else(|| anyhow!("unknown kind '{raw}'"))
}

/// Sets `a.b.c` inside `target`, creating intermediate objects.
fn set_path(target: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        bail!("empty key is not allowed");
    };

    let mut current = target;
    for segment in parents {
        current = as_object(current)?
            .entry(segment.to_string())
            .or_insert(Value::Null);
    }
    as_object(current)?.insert(last.to_string(), new_value);
    Ok(())
}

fn as_object(value: &mut Value) -> Result<&mut Map<String, Value>> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("cannot set a nested field on {other}"),
    }
}

/// Values are read as JSON when they parse, as plain strings otherwise.
fn parse_key_value(raw: &str) -> Result<KeyValue, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| "expected KEY=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("key cannot be empty".to_string());
    }
    let value = value.trim();
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok(KeyValue {
        key: key.to_string(),
        value,
    })
}
