use crate::classifiers::hoeffding_tree::adaptive_hoeffding_tree::AdaptiveHoeffdingTree;
use crate::classifiers::hoeffding_tree::nodes::{Node, NodeRef};
use crate::classifiers::hoeffding_tree::options::ErrorBoundParams;
use crate::core::estimators::adwin::Adwin;

/// Error rate and width of an estimator, once it is wide enough to compare.
fn estimate(estimator: Option<&Adwin>, min_width: u64) -> Option<(f64, f64)> {
    let estimator = estimator?;
    let width = estimator.width() as f64;
    if width <= min_width as f64 {
        return None;
    }
    Some((estimator.estimated_error_rate(), width))
}

/// Half-width of the confidence interval on the difference of two error rates.
pub(crate) fn error_difference_bound(
    mainline_error: f64,
    mainline_width: f64,
    alternate_width: f64,
    confidence: f64,
) -> f64 {
    let inverse_widths = 1.0 / alternate_width + 1.0 / mainline_width;
    (2.0 * mainline_error * (1.0 - mainline_error) * (2.0 / confidence).ln() * inverse_widths)
        .sqrt()
}

impl AdaptiveHoeffdingTree {
    /// Compares the error estimate of the subtree at `split_ref` with each of
    /// its alternates. Prunes the alternates that are confidently worse and
    /// returns the root that replaced the node when one was confidently better.
    pub(crate) fn check_error_bound(
        &mut self,
        split_ref: NodeRef,
        params: ErrorBoundParams,
    ) -> Option<NodeRef> {
        let node = self.arena.get(split_ref)?;
        let (mainline_error, mainline_width) =
            estimate(node.error_estimator.as_ref(), params.min_width)?;
        let roots: Vec<NodeRef> = node.as_split()?.alternates.iter().map(|a| a.root).collect();

        let mut to_prune = Vec::new();
        for root in roots {
            let Some((alternate_error, alternate_width)) = self
                .arena
                .get(root)
                .and_then(|alt| estimate(alt.error_estimator.as_ref(), params.min_width))
            else {
                continue;
            };
            let bound = error_difference_bound(
                mainline_error,
                mainline_width,
                alternate_width,
                params.confidence,
            );
            if bound < mainline_error - alternate_error {
                self.promote_alternate(split_ref, root);
                return Some(root);
            }
            if bound < alternate_error - mainline_error {
                to_prune.push(root);
            }
        }

        for root in to_prune {
            self.prune_alternate(split_ref, root);
        }
        None
    }
}
