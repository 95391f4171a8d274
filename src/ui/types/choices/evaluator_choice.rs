use crate::evaluation::EvaluatorFlags;
use crate::ui::types::choices::UIChoice;
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumMessage, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, EnumDiscriminants)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
#[strum_discriminants(name(EvaluatorKind))]
#[strum_discriminants(derive(EnumIter, EnumString, Display, IntoStaticStr, EnumMessage))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum EvaluatorChoice {
    #[strum_discriminants(strum(
        message = "Basic Classification",
        detailed_message = "Accuracy, kappa and precision/recall over the whole stream."
    ))]
    BasicClassification(EvaluatorFlags),
}

impl UIChoice for EvaluatorChoice {
    type Kind = EvaluatorKind;

    fn schema() -> Schema {
        schema_for!(EvaluatorChoice)
    }

    fn default_params(kind: Self::Kind) -> Value {
        match kind {
            EvaluatorKind::BasicClassification => {
                serde_json::to_value(EvaluatorFlags::default()).unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_override() {
        let choice = EvaluatorChoice::from_parts(
            EvaluatorKind::BasicClassification,
            json!({ "per_class": true }),
        )
        .unwrap();
        let EvaluatorChoice::BasicClassification(flags) = choice;
        assert!(flags.per_class);
        assert!(flags.precision_recall);
    }
}
