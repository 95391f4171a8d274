//! Whole-tree runs checking the properties every learning step must keep.

use crate::classifiers::hoeffding_tree::leaf_prediction_option::LeafPredictionOption;
use crate::classifiers::hoeffding_tree::{
    AdaptiveHoeffdingTree, ErrorBoundParams, PromotionStrategy, TreeOptions, TrialWindowParams,
};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::{DenseInstance, Instance};
use crate::streams::{AbruptDriftParams, GradualDriftGenerator, GradualDriftParams, Stream};
use crate::testing::{RecordedEvent, RecordingEvents, labeled, nominal_header, numeric_header};
use crate::utils::math::max_index;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

/// Nominal stream whose class table is redrawn every `period` instances.
fn drifting_nominal(seed: u64, n: usize, period: usize) -> (Arc<InstanceHeader>, Vec<DenseInstance>) {
    let header = nominal_header(&[3, 3, 2], 3);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table: Vec<usize> = (0..9).map(|_| rng.random_range(0..3)).collect();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        if i > 0 && i % period == 0 {
            table = (0..9).map(|_| rng.random_range(0..3)).collect();
        }
        let x0 = rng.random_range(0..3);
        let x1 = rng.random_range(0..3);
        let x2 = rng.random_range(0..2);
        let class = table[x0 * 3 + x1];
        out.push(labeled(&header, &[x0 as f64, x1 as f64, x2 as f64], class));
    }
    (header, out)
}

/// Runs `instances` through `tree`, checking structure and id rules after
/// every step.
fn train_checked(tree: &mut AdaptiveHoeffdingTree, instances: &[DenseInstance]) {
    let mut ids_ever_seen: HashSet<u64> = HashSet::new();
    let mut newest = None;
    for (i, instance) in instances.iter().enumerate() {
        tree.train(instance).unwrap();
        if let Err(e) = tree.validate_structure() {
            panic!("instance {i}: {e}");
        }
        let mut fresh: Vec<u64> = tree
            .nodes()
            .map(|(_, n)| n.id())
            .filter(|id| !ids_ever_seen.contains(id))
            .collect();
        fresh.sort_unstable();
        for id in fresh {
            assert!(newest.is_none_or(|n| id > n), "id {id} reused at instance {i}");
            assert!(id < tree.arena.next_id());
            ids_ever_seen.insert(id);
            newest = Some(id);
        }
    }
}

fn stress_options(promotion: PromotionStrategy) -> TreeOptions {
    TreeOptions {
        grace_period: 20,
        window_size: 300,
        re_evaluation_period: 100,
        allow_alternates_of_alternates: true,
        remove_poor_attributes: true,
        leaf_prediction: LeafPredictionOption::MajorityClass,
        promotion,
        ..TreeOptions::default()
    }
}

#[test]
fn trial_window_runs_stay_well_formed() {
    let (_, stream) = drifting_nominal(11, 3_000, 500);
    let mut tree = AdaptiveHoeffdingTree::new(stress_options(PromotionStrategy::TrialWindow(
        TrialWindowParams {
            test_phase_frequency: 60,
            test_phase_length: 20,
            prune_tolerance: 0.01,
        },
    )))
    .unwrap();
    train_checked(&mut tree, &stream);

    let stats = tree.stats();
    assert!(stats.splits > 0);
    assert!(stats.alternates_spawned > 0);
    assert!(stats.test_instances_consumed > 0);
    assert_eq!(stats.instances_seen, stream.len() as u64);
    assert_eq!(stats.instances_forgotten + tree.window_len() as u64, stats.instances_seen);
    assert_alternates_accounted_for(&tree);
}

/// Every alternate ever spawned was promoted, pruned, or is still attached.
fn assert_alternates_accounted_for(tree: &AdaptiveHoeffdingTree) {
    let live: usize = tree
        .nodes()
        .filter_map(|(_, n)| n.as_split())
        .map(|s| s.alternates().len())
        .sum();
    let stats = tree.stats();
    assert_eq!(
        stats.alternates_spawned,
        stats.alternates_promoted + stats.alternates_pruned + live as u64
    );
}

#[test]
fn error_bound_runs_stay_well_formed() {
    let (_, stream) = drifting_nominal(5, 3_000, 500);
    let mut tree = AdaptiveHoeffdingTree::new(stress_options(PromotionStrategy::ErrorBound(
        ErrorBoundParams {
            min_width: 30,
            confidence: 0.05,
        },
    )))
    .unwrap();
    train_checked(&mut tree, &stream);

    assert!(tree.stats().splits > 0);
    assert_eq!(tree.stats().test_instances_consumed, 0);
    assert_eq!(tree.stats().instances_seen, stream.len() as u64);
    assert_alternates_accounted_for(&tree);
}

#[test]
fn gradual_drift_runs_stay_well_formed() {
    let mut generator = GradualDriftGenerator::new(GradualDriftParams {
        drift: AbruptDriftParams {
            attributes: 3,
            values_per_attribute: 3,
            burn_in: 1_000,
            max_instances: Some(3_000),
            seed: 3,
            ..AbruptDriftParams::default()
        },
        drift_duration: 1_000,
    })
    .unwrap();
    let header = generator.shared_header();
    let stream: Vec<DenseInstance> = std::iter::from_fn(|| generator.next_instance())
        .map(|i| DenseInstance::new(Arc::clone(&header), i.to_vec(), i.weight()))
        .collect();
    assert_eq!(stream.len(), 3_000);

    let mut tree = AdaptiveHoeffdingTree::new(stress_options(PromotionStrategy::ErrorBound(
        ErrorBoundParams::default(),
    )))
    .unwrap();
    train_checked(&mut tree, &stream);

    assert_eq!(tree.stats().instances_seen, stream.len() as u64);
    assert_alternates_accounted_for(&tree);
}

#[test]
fn numeric_runs_stay_well_formed() {
    let header = numeric_header(2, 2);
    let mut rng = StdRng::seed_from_u64(3);
    let stream: Vec<DenseInstance> = (0..2_000)
        .map(|i| {
            let x0: f64 = rng.random_range(0.0..1.0);
            let x1: f64 = rng.random_range(0.0..1.0);
            let threshold = if i < 1_000 { 0.3 } else { 0.7 };
            labeled(&header, &[x0, x1], usize::from(x0 > threshold))
        })
        .collect();
    let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
        grace_period: 50,
        window_size: 400,
        leaf_prediction: LeafPredictionOption::NaiveBayes,
        ..TreeOptions::default()
    })
    .unwrap();
    train_checked(&mut tree, &stream);
    assert!(tree.stats().splits > 0);
}

#[test]
fn window_holds_the_most_recent_instances_in_order() {
    let header = nominal_header(&[2], 2);
    let recorder = RecordingEvents::default();
    let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
        window_size: 10,
        leaf_prediction: LeafPredictionOption::MajorityClass,
        ..TreeOptions::default()
    })
    .unwrap()
    .with_events(Box::new(recorder.clone()));

    for i in 0..17 {
        tree.train(&labeled(&header, &[(i % 2) as f64], i % 2)).unwrap();
    }

    assert_eq!(tree.stats().instances_forgotten, 7);
    let forgotten: Vec<u64> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            RecordedEvent::Forget(seen_at) => Some(seen_at),
            _ => None,
        })
        .collect();
    assert_eq!(forgotten, (0..7).collect::<Vec<_>>());
    let retained: Vec<u64> = tree.window_entries().map(|e| e.seen_at()).collect();
    assert_eq!(retained, (7..17).collect::<Vec<_>>());
    let root = tree.node(tree.root().unwrap()).unwrap();
    assert_eq!(root.observed_class_distribution(), &[5.0, 5.0]);
}

#[test]
fn prediction_never_reads_alternates() {
    let header = nominal_header(&[2, 2], 2);
    let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
        grace_period: 4,
        leaf_prediction: LeafPredictionOption::MajorityClass,
        ..TreeOptions::default()
    })
    .unwrap();
    let cycle = [([0.0, 0.0], 0), ([0.0, 1.0], 0), ([1.0, 0.0], 1), ([1.0, 1.0], 1)];
    for (x, c) in cycle.iter().cycle().take(12) {
        tree.train(&labeled(&header, x, *c)).unwrap();
    }
    let root = tree.root().unwrap();
    let alt = tree.spawn_alternate(root, None).unwrap();
    tree.arena.get_mut(alt).unwrap().observed_class_distribution = vec![0.0, 100.0];

    for (x, c) in cycle {
        let instance = labeled(&header, &x, c);
        let leaf = tree.filter_instance_to_leaf(root, &instance).get_node().unwrap();
        let leaf = tree.node(leaf).unwrap();
        assert!(!leaf.is_alternate());
        assert_eq!(tree.predict(&instance), leaf.observed_class_distribution());
        assert_ne!(tree.predict(&instance), vec![0.0, 100.0]);
    }
}

#[test]
fn missing_value_stops_at_the_split() {
    let header = nominal_header(&[2, 2], 2);
    let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
        grace_period: 4,
        leaf_prediction: LeafPredictionOption::MajorityClass,
        ..TreeOptions::default()
    })
    .unwrap();
    let cycle = [([0.0, 0.0], 0), ([0.0, 1.0], 0), ([1.0, 0.0], 1), ([1.0, 1.0], 1)];
    for (x, c) in cycle.iter().cycle().take(12) {
        tree.train(&labeled(&header, x, *c)).unwrap();
    }
    let nodes = tree.node_count();

    let missing = labeled(&header, &[f64::NAN, 0.0], 1);
    assert_eq!(tree.predict(&missing), vec![6.0, 6.0]);
    tree.train(&missing).unwrap();
    assert_eq!(tree.node_count(), nodes);
    let root = tree.node(tree.root().unwrap()).unwrap();
    assert_eq!(root.observed_class_distribution(), &[6.0, 7.0]);
}

#[test]
fn concurrent_predictions_agree() {
    let (_, stream) = drifting_nominal(21, 1_500, 10_000);
    let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
        grace_period: 30,
        ..TreeOptions::default()
    })
    .unwrap();
    for instance in &stream {
        tree.train(instance).unwrap();
    }
    let expected: Vec<Vec<f64>> = stream.iter().map(|i| tree.predict(i)).collect();

    let tree = &tree;
    thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| stream.iter().map(|i| tree.predict(i)).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

/// P: the class equals x0. Q: the class is the opposite of x0. x1 is noise.
fn regime(header: &Arc<InstanceHeader>, rng: &mut StdRng, swapped: bool) -> DenseInstance {
    let x0 = rng.random_range(0..2);
    let x1 = rng.random_range(0..2);
    let class = if swapped { 1 - x0 } else { x0 };
    labeled(header, &[x0 as f64, x1 as f64], class)
}

fn accuracy(tree: &AdaptiveHoeffdingTree, instances: &[DenseInstance]) -> f64 {
    let correct = instances
        .iter()
        .filter(|i| max_index(&tree.predict(*i)) == i.class_value().map(|c| c as usize))
        .count();
    correct as f64 / instances.len() as f64
}

#[test]
fn alternate_replaces_the_subtree_after_a_concept_switch() {
    let header = nominal_header(&[2, 2], 2);
    let recorder = RecordingEvents::default();
    let mut tree = AdaptiveHoeffdingTree::new(TreeOptions {
        grace_period: 50,
        window_size: 0,
        leaf_prediction: LeafPredictionOption::MajorityClass,
        promotion: PromotionStrategy::TrialWindow(TrialWindowParams {
            test_phase_frequency: 100,
            test_phase_length: 50,
            prune_tolerance: 0.01,
        }),
        ..TreeOptions::default()
    })
    .unwrap()
    .with_events(Box::new(recorder.clone()));
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..1_000 {
        tree.train(&regime(&header, &mut rng, false)).unwrap();
    }
    let root = tree.node(tree.root().unwrap()).unwrap();
    assert_eq!(root.as_split().unwrap().split_attribute(), Some(0));
    assert_eq!(tree.stats().alternates_spawned, 0);

    let held_out: Vec<DenseInstance> = (0..200).map(|_| regime(&header, &mut rng, true)).collect();
    let before = accuracy(&tree, &held_out);

    let mut promoted_after = None;
    for i in 0..1_000 {
        tree.train(&regime(&header, &mut rng, true)).unwrap();
        if promoted_after.is_none() && tree.stats().alternates_promoted > 0 {
            promoted_after = Some(i + 1);
        }
    }
    tree.validate_structure().unwrap();

    assert!(tree.stats().drift_detections > 0);
    assert!(tree.stats().alternates_spawned > 0);
    let events = recorder.events();
    assert!(events.iter().any(|e| matches!(e, RecordedEvent::AlternateSpawned { .. })));
    assert!(events.iter().any(|e| matches!(e, RecordedEvent::TestPhaseStarted(_))));
    assert!(promoted_after.is_some(), "no alternate was promoted");

    let after = accuracy(&tree, &held_out);
    assert!(before < 0.2, "accuracy before the switch was {before}");
    assert!(after > before + 0.5, "accuracy went from {before} to {after}");
}
