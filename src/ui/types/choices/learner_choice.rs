use crate::classifiers::hoeffding_tree::TreeOptions;
use crate::ui::types::choices::UIChoice;
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumDiscriminants, EnumIter, EnumMessage, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, EnumDiscriminants)]
#[serde(tag = "type", content = "params", rename_all = "kebab-case")]
#[strum_discriminants(name(LearnerKind))]
#[strum_discriminants(derive(EnumIter, EnumString, Display, IntoStaticStr, EnumMessage))]
#[strum_discriminants(strum(serialize_all = "kebab-case"))]
pub enum LearnerChoice {
    #[strum_discriminants(strum(
        message = "Adaptive Hoeffding Tree",
        detailed_message = "Hoeffding tree with windowed forgetting and alternate subtrees."
    ))]
    AdaptiveHoeffdingTree(TreeOptions),
}

impl UIChoice for LearnerChoice {
    type Kind = LearnerKind;

    fn schema() -> Schema {
        schema_for!(LearnerChoice)
    }

    fn default_params(kind: Self::Kind) -> Value {
        match kind {
            LearnerKind::AdaptiveHoeffdingTree => {
                serde_json::to_value(TreeOptions::default()).unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::hoeffding_tree::PromotionStrategy;
    use serde_json::json;

    #[test]
    fn defaults_round_trip_through_from_parts() {
        let params = LearnerChoice::default_params(LearnerKind::AdaptiveHoeffdingTree);
        let LearnerChoice::AdaptiveHoeffdingTree(options) =
            LearnerChoice::from_parts(LearnerKind::AdaptiveHoeffdingTree, params).unwrap();
        assert_eq!(options, TreeOptions::default());
    }

    #[test]
    fn partial_params_fill_in_defaults() {
        let choice = LearnerChoice::from_parts(
            LearnerKind::AdaptiveHoeffdingTree,
            json!({
                "grace_period": 50,
                "promotion": { "type": "error-bound", "params": { "min_width": 30 } }
            }),
        )
        .unwrap();
        let LearnerChoice::AdaptiveHoeffdingTree(options) = choice;
        assert_eq!(options.grace_period, 50);
        assert_eq!(options.window_size, TreeOptions::default().window_size);
        let PromotionStrategy::ErrorBound(p) = options.promotion else {
            panic!("expected error-bound promotion");
        };
        assert_eq!(p.min_width, 30);
        assert_eq!(p.confidence, 0.05);
    }

    #[test]
    fn kind_parses_from_kebab_case() {
        assert_eq!(
            "adaptive-hoeffding-tree".parse::<LearnerKind>().unwrap(),
            LearnerKind::AdaptiveHoeffdingTree
        );
    }
}
