use crate::classifiers::bayes::do_naive_bayes_prediction;
use crate::classifiers::hoeffding_tree::events::{NoopTreeEvents, TreeEvents};
use crate::classifiers::hoeffding_tree::leaf_prediction_option::LeafPredictionOption;
use crate::classifiers::hoeffding_tree::nodes::{FoundNode, Node, NodeArena, NodeKind, NodeRef};
use crate::classifiers::hoeffding_tree::options::{OptionsError, TreeOptions};
use crate::classifiers::hoeffding_tree::split_criteria::SplitCriterion;
use crate::classifiers::hoeffding_tree::stats::TreeStats;
use crate::classifiers::hoeffding_tree::window::{SlidingWindow, WindowEntry};
use crate::classifiers::{Classifier, ClassifierError};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use crate::evaluation::Measurement;
use crate::utils::math::max_index;
use crate::utils::memory::{MemoryMeter, MemorySized};
use std::mem::size_of;
use std::sync::Arc;

/// Hoeffding tree that forgets a sliding window of instances and replaces
/// subtrees that stop fitting the stream with alternates grown beside them.
pub struct AdaptiveHoeffdingTree {
    pub(super) options: TreeOptions,
    pub(super) header: Option<Arc<InstanceHeader>>,
    pub(super) split_criterion: Box<dyn SplitCriterion>,
    pub(super) arena: NodeArena,
    pub(super) root: Option<NodeRef>,
    pub(super) window: SlidingWindow,
    pub(super) stats: TreeStats,
    pub(super) events: Box<dyn TreeEvents>,
    pub(super) growth_allowed: bool,
    pub(super) training_weight_seen_by_model: f64,
    pub(super) active_leaf_byte_size_estimate: f64,
    pub(super) inactive_leaf_byte_size_estimate: f64,
    pub(super) byte_size_estimate_overhead_fraction: f64,
}

/// Per-instance state threaded through a learning walk.
pub(super) struct LearnContext<'a> {
    pub instance: &'a dyn Instance,
    pub header: Arc<InstanceHeader>,
    pub class: usize,
    pub weight: f64,
    pub seq: u64,
    pub max_visited_id: u64,
    /// Ids of testing nodes that scored the instance instead of learning it.
    pub frozen: Vec<u64>,
}

impl Default for AdaptiveHoeffdingTree {
    fn default() -> Self {
        Self::build(TreeOptions::default())
    }
}

impl AdaptiveHoeffdingTree {
    pub fn new(options: TreeOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: TreeOptions) -> Self {
        Self {
            split_criterion: options.new_split_criterion(),
            window: SlidingWindow::new(options.window_size),
            options,
            header: None,
            arena: NodeArena::new(),
            root: None,
            stats: TreeStats::default(),
            events: Box::new(NoopTreeEvents),
            growth_allowed: true,
            training_weight_seen_by_model: 0.0,
            active_leaf_byte_size_estimate: 0.0,
            inactive_leaf_byte_size_estimate: 0.0,
            byte_size_estimate_overhead_fraction: 1.0,
        }
    }

    pub fn with_events(mut self, events: Box<dyn TreeEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.arena.get(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.arena.iter()
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Remembered instances, oldest first.
    pub fn window_entries(&self) -> impl Iterator<Item = &WindowEntry> {
        self.window.iter()
    }

    pub fn growth_allowed(&self) -> bool {
        self.growth_allowed
    }

    pub fn training_weight_seen_by_model(&self) -> f64 {
        self.training_weight_seen_by_model
    }

    /// Depth of the mainline tree; a single leaf has depth 1.
    pub fn measure_tree_depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut depth = 0;
        let mut stack = vec![(root, 1)];
        while let Some((node, level)) = stack.pop() {
            depth = depth.max(level);
            if let Some(split) = self.arena.get(node).and_then(Node::as_split) {
                stack.extend(split.children().iter().flatten().map(|c| (*c, level + 1)));
            }
        }
        depth
    }

    pub fn compute_hoeffding_bound(range: f64, confidence: f64, n: f64) -> f64 {
        let confidence = if confidence == 0.0 { 1e-7 } else { confidence };
        (range * range * (1.0 / confidence).ln() / (2.0 * n)).sqrt()
    }

    pub(super) fn num_classes(&self) -> usize {
        self.header
            .as_ref()
            .map(|h| h.number_of_classes())
            .unwrap_or(0)
    }

    /// Sorts `instance` from `start` down the children links only.
    pub fn filter_instance_to_leaf(&self, start: NodeRef, instance: &dyn Instance) -> FoundNode {
        let mut current = start;
        let mut parent = None;
        let mut parent_branch = None;
        loop {
            let Some(node) = self.arena.get(current) else {
                return FoundNode::new(None, parent, parent_branch);
            };
            let NodeKind::Split(split) = &node.kind else {
                return FoundNode::new(Some(current), parent, parent_branch);
            };
            let Some(branch) = split.split_test.branch_for_instance(instance) else {
                return FoundNode::new(None, Some(current), None);
            };
            match split.child(branch) {
                Some(child) => {
                    parent = Some(current);
                    parent_branch = Some(branch);
                    current = child;
                }
                None => return FoundNode::new(None, Some(current), Some(branch)),
            }
        }
    }

    /// Votes of the subtree rooted at `start`; falls back to the deepest
    /// node reached when the instance cannot be sorted to a leaf.
    pub(super) fn subtree_votes(&self, start: NodeRef, instance: &dyn Instance) -> Vec<f64> {
        let found = self.filter_instance_to_leaf(start, instance);
        found
            .get_node()
            .or(found.get_parent())
            .and_then(|n| self.arena.get(n))
            .map(|node| self.node_votes(node, instance))
            .unwrap_or_default()
    }

    pub(super) fn subtree_predicts(
        &self,
        start: NodeRef,
        instance: &dyn Instance,
        class: usize,
    ) -> bool {
        max_index(&self.subtree_votes(start, instance)) == Some(class)
    }

    pub(super) fn node_votes(&self, node: &Node, instance: &dyn Instance) -> Vec<f64> {
        let dist = &node.observed_class_distribution;
        let NodeKind::Leaf(leaf) = &node.kind else {
            return dist.clone();
        };
        let use_nb = match self.options.leaf_prediction {
            LeafPredictionOption::MajorityClass => false,
            LeafPredictionOption::NaiveBayes => {
                node.total_weight_seen() >= self.options.nb_threshold as f64
            }
            LeafPredictionOption::AdaptiveNaiveBayes => {
                leaf.mc_correct_weight <= leaf.nb_correct_weight
            }
        };
        match (&self.header, use_nb && node.has_observers()) {
            (Some(header), true) => {
                do_naive_bayes_prediction(header, instance, dist, &node.attribute_observers)
            }
            _ => dist.clone(),
        }
    }

    pub fn predict(&self, instance: &dyn Instance) -> Vec<f64> {
        match self.root {
            Some(root) => self.subtree_votes(root, instance),
            None => vec![0.0; instance.number_of_classes()],
        }
    }

    pub fn train(&mut self, instance: &dyn Instance) -> Result<(), ClassifierError> {
        let (class, weight) = self.validate_instance(instance)?;
        if weight == 0.0 {
            return Ok(());
        }
        let header = match &self.header {
            Some(header) => Arc::clone(header),
            None => {
                let header = Arc::new(instance.header().clone());
                self.header = Some(Arc::clone(&header));
                header
            }
        };

        let root = match self.root {
            Some(root) => root,
            None => {
                let num_classes = header.number_of_classes();
                let root = self
                    .arena
                    .allocate(|id| Node::new_leaf(id, vec![], num_classes, false, None));
                if let Some(node) = self.arena.get(root) {
                    self.stats.mainline.add(node);
                }
                self.root = Some(root);
                root
            }
        };

        if let Some(evicted) = self.window.evict_if_full() {
            self.forget(&evicted);
        }

        let seq = self.stats.instances_seen;
        let mut ctx = LearnContext {
            instance,
            header,
            class,
            weight,
            seq,
            max_visited_id: 0,
            frozen: Vec::new(),
        };
        self.learn_node(root, &mut ctx);

        self.window.push(
            WindowEntry::new(instance.clone_box(), ctx.max_visited_id, seq)
                .with_frozen(ctx.frozen),
        );
        self.stats.instances_seen += 1;
        self.training_weight_seen_by_model += weight;

        if self.stats.instances_seen % self.options.memory_estimate_period == 0 {
            self.estimate_model_byte_sizes();
        }
        Ok(())
    }

    fn validate_instance(&self, instance: &dyn Instance) -> Result<(usize, f64), ClassifierError> {
        let schema = self.header.as_deref().unwrap_or(instance.header());
        let expected = schema.number_of_attributes();
        let found = instance.number_of_attributes();
        if found != expected {
            return Err(ClassifierError::InvalidInstance { expected, found });
        }
        let class_index = schema.class_index();
        for index in (0..found).filter(|i| *i != class_index) {
            let Some(values) = schema
                .attribute_at_index(index)
                .and_then(|attribute| attribute.cardinality())
            else {
                continue;
            };
            let Some(value) = instance.value_at_index(index) else {
                continue;
            };
            if !value.is_nan() && !is_index_below(value, values) {
                return Err(ClassifierError::InvalidValue {
                    attribute: index,
                    value,
                });
            }
        }

        let class = instance
            .class_value()
            .filter(|c| !c.is_nan())
            .ok_or(ClassifierError::MissingClassValue)?;
        if class < 0.0 || class.fract() != 0.0 {
            return Err(ClassifierError::InvalidValue {
                attribute: class_index,
                value: class,
            });
        }
        let classes = schema.number_of_classes();
        if class as usize >= classes {
            return Err(ClassifierError::UnknownClass {
                class: class as usize,
                classes,
            });
        }
        let weight = instance.weight();
        if weight.is_nan() || weight < 0.0 {
            return Err(ClassifierError::NegativeWeight(weight));
        }
        Ok((class as usize, weight))
    }
}

/// Whether `value` is a whole number in `0..len`.
fn is_index_below(value: f64, len: usize) -> bool {
    value >= 0.0 && value.fract() == 0.0 && value < len as f64
}

impl Classifier for AdaptiveHoeffdingTree {
    fn get_votes_for_instance(&self, instance: &dyn Instance) -> Vec<f64> {
        self.predict(instance)
    }

    fn set_model_context(&mut self, header: Arc<InstanceHeader>) {
        self.header = Some(header);
    }

    fn train_on_instance(&mut self, instance: &dyn Instance) -> Result<(), ClassifierError> {
        self.train(instance)
    }

    fn calc_memory_size(&self) -> usize {
        MemoryMeter::measure_root(self)
    }

    fn model_measurements(&self) -> Vec<Measurement> {
        let s = &self.stats;
        vec![
            Measurement::new("tree_size_nodes", s.mainline.total() as f64),
            Measurement::new(
                "tree_size_leaves",
                (s.mainline.active_leaves + s.mainline.inactive_leaves) as f64,
            ),
            Measurement::new("active_leaves", s.mainline.active_leaves as f64),
            Measurement::new("tree_depth", self.measure_tree_depth() as f64),
            Measurement::new("alternate_nodes", s.alternates.total() as f64),
            Measurement::new("alternates_spawned", s.alternates_spawned as f64),
            Measurement::new("alternates_promoted", s.alternates_promoted as f64),
            Measurement::new("alternates_pruned", s.alternates_pruned as f64),
            Measurement::new("drift_detections", s.drift_detections as f64),
            Measurement::new("instances_forgotten", s.instances_forgotten as f64),
        ]
    }
}

impl MemorySized for AdaptiveHoeffdingTree {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, meter: &mut MemoryMeter) -> usize {
        let mut total = 0;
        total += meter.measure_field(&self.arena);
        total += meter.measure_field(&self.header);
        total += meter.measure_field(&self.split_criterion);
        total
    }
}
