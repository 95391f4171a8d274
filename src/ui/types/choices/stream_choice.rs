use crate::streams::{AbruptDriftParams, GradualDriftParams};
use crate::ui::types::choices::UIChoice;
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumMessage, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct ArffParameters {
    #[schemars(
        with = "String",
        title = "ARFF Path",
        description = "Path to .arff file",
        extend("format" = "path", "x-extensions" = ["arff"])
    )]
    pub path: PathBuf,

    #[serde(default)]
    #[schemars(
        title = "Class Index",
        description = "Zero-based index of the class column (empty = last attribute)"
    )]
    pub class_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, EnumDiscriminants)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
#[strum_discriminants(name(StreamKind))]
#[strum_discriminants(derive(EnumIter, EnumString, Display, IntoStaticStr, EnumMessage))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum StreamChoice {
    #[strum_discriminants(strum(
        message = "ARFF File",
        detailed_message = "A stream read from an ARFF file."
    ))]
    ArffFile(ArffParameters),

    #[strum_discriminants(strum(
        message = "Abrupt Drift Generator",
        detailed_message = "Categorical concept that switches abruptly after a burn-in."
    ))]
    AbruptDrift(AbruptDriftParams),

    #[strum_discriminants(strum(
        message = "Gradual Drift Generator",
        detailed_message = "Categorical concept that blends into a second one over a drift window."
    ))]
    GradualDrift(GradualDriftParams),
}

impl UIChoice for StreamChoice {
    type Kind = StreamKind;

    fn schema() -> Schema {
        schema_for!(StreamChoice)
    }

    fn default_params(kind: Self::Kind) -> Value {
        let params = match kind {
            StreamKind::ArffFile => serde_json::to_value(ArffParameters::default()),
            StreamKind::AbruptDrift => serde_json::to_value(AbruptDriftParams::default()),
            StreamKind::GradualDrift => serde_json::to_value(GradualDriftParams::default()),
        };
        params.unwrap_or_default()
    }
}
