use crate::classifiers::attribute_class_observers::AttributeClassObserver;
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;

/// Naive-Bayes votes from a leaf's class distribution and its observers.
///
/// Observers are indexed by model attribute. Missing values and attributes
/// without an observer are skipped, so with no observers the votes are the
/// class priors.
pub fn do_naive_bayes_prediction(
    header: &InstanceHeader,
    instance: &dyn Instance,
    observed_class_distribution: &[f64],
    attribute_observers: &[Option<Box<dyn AttributeClassObserver>>],
) -> Vec<f64> {
    let mut votes = vec![0.0; observed_class_distribution.len()];
    let observed_class_sum: f64 = observed_class_distribution.iter().copied().sum();
    if observed_class_sum <= 0.0 {
        return votes;
    }

    for (class_index, vote) in votes.iter_mut().enumerate() {
        let mut score = observed_class_distribution[class_index] / observed_class_sum;

        for (att_index, observer) in attribute_observers.iter().enumerate() {
            let Some(obs) = observer else {
                continue;
            };
            let inst_att_index = header.model_to_instance_index(att_index);

            if instance.is_missing_at_index(inst_att_index).unwrap_or(true) {
                continue;
            }
            let Some(x) = instance.value_at_index(inst_att_index) else {
                continue;
            };

            score *= obs
                .likelihood(x, class_index)
                .unwrap_or(0.0);
        }
        *vote = score;
    }
    votes
}
