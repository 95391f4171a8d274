mod evaluator_choice;
mod learner_choice;
mod schema;
mod stream_choice;
mod task_choice;

pub use evaluator_choice::{EvaluatorChoice, EvaluatorKind};
pub use learner_choice::{LearnerChoice, LearnerKind};
pub use schema::{FieldKind, FieldSpec, specs_for_kind};
pub use stream_choice::{ArffParameters, StreamChoice, StreamKind};
pub use task_choice::{DumpFormat, PrequentialParams, TaskChoice, TaskKind};

use anyhow::{Context, Result};
use schemars::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt::Display;
use strum::{EnumMessage, IntoEnumIterator};

/// A component picked by kind plus a JSON parameter object, serialized as
/// `{"type": <kind>, "params": {...}}`.
pub trait UIChoice: Sized + Serialize + DeserializeOwned {
    type Kind: Copy + Display + IntoEnumIterator + EnumMessage;

    fn schema() -> Schema;

    fn default_params(kind: Self::Kind) -> Value;

    fn from_parts(kind: Self::Kind, params: Value) -> Result<Self> {
        serde_json::from_value(json!({ "type": kind.to_string(), "params": params }))
            .with_context(|| format!("invalid parameters for '{kind}'"))
    }
}
