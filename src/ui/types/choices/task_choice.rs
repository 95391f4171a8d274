use crate::evaluation::CurveFormat;
use crate::tasks::PrequentialLimits;
use crate::ui::types::choices::{EvaluatorChoice, LearnerChoice, StreamChoice, UIChoice};
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumMessage, EnumString, IntoStaticStr};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive, serialize_all = "kebab-case")]
pub enum DumpFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl From<DumpFormat> for CurveFormat {
    fn from(value: DumpFormat) -> Self {
        match value {
            DumpFormat::Csv => CurveFormat::Csv,
            DumpFormat::Tsv => CurveFormat::Tsv,
            DumpFormat::Json => CurveFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrequentialParams {
    #[schemars(skip)]
    pub learner: LearnerChoice,
    #[schemars(skip)]
    pub stream: StreamChoice,
    #[schemars(skip)]
    pub evaluator: EvaluatorChoice,

    #[serde(default)]
    #[schemars(
        title = "Max Instances",
        description = "Stop after this many instances (None = unlimited)"
    )]
    pub max_instances: Option<u64>,

    #[serde(default)]
    #[schemars(
        title = "Max Seconds",
        description = "Stop after this many CPU seconds (None = unlimited)"
    )]
    pub max_seconds: Option<u64>,

    #[schemars(
        title = "Sample Frequency",
        description = "Emit metrics every N instances",
        range(min = 1)
    )]
    pub sample_frequency: u64,

    #[schemars(
        title = "Memory Check Frequency",
        description = "Check memory every N instances",
        range(min = 1)
    )]
    pub mem_check_frequency: u64,

    #[serde(default)]
    #[schemars(
        with = "Option<String>",
        title = "Dump File",
        description = "If set, write all snapshots at the end to this file"
    )]
    pub dump_file: Option<PathBuf>,

    #[serde(default)]
    #[schemars(title = "Dump Format", description = "csv / tsv / json")]
    pub dump_format: DumpFormat,
}

impl PrequentialParams {
    pub fn limits(&self) -> PrequentialLimits {
        PrequentialLimits {
            max_instances: self.max_instances,
            max_seconds: self.max_seconds,
            sample_frequency: self.sample_frequency,
            mem_check_frequency: self.mem_check_frequency,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, EnumDiscriminants)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
#[strum_discriminants(name(TaskKind))]
#[strum_discriminants(derive(EnumIter, EnumString, Display, IntoStaticStr, EnumMessage))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum TaskChoice {
    #[strum_discriminants(strum(
        message = "Evaluate Prequential",
        detailed_message = "Interleave test-then-train with periodic reporting."
    ))]
    EvaluatePrequential(PrequentialParams),
}

impl UIChoice for TaskChoice {
    type Kind = TaskKind;

    fn schema() -> Schema {
        schema_for!(TaskChoice)
    }

    /// Sampling values only; the nested choices are supplied by the caller.
    fn default_params(kind: Self::Kind) -> Value {
        match kind {
            TaskKind::EvaluatePrequential => json!({
                "max_instances": null,
                "max_seconds": null,
                "sample_frequency": 100_000,
                "mem_check_frequency": 100_000,
                "dump_file": null,
                "dump_format": "csv"
            }),
        }
    }
}
