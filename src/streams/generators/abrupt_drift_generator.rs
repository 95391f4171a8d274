use crate::core::attributes::{AttributeRef, NominalAttribute};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::{DenseInstance, Instance};
use crate::streams::stream::Stream;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::{Error, ErrorKind};
use std::sync::Arc;

fn default_attributes() -> usize {
    2
}

fn default_values() -> usize {
    2
}

fn default_classes() -> usize {
    2
}

fn default_burn_in() -> u64 {
    10_000
}

fn default_conditional_drift() -> f64 {
    0.5
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AbruptDriftParams {
    #[serde(default = "default_attributes")]
    #[schemars(
        title = "Attributes",
        description = "Number of nominal attributes x1..xn",
        range(min = 1, max = 10)
    )]
    pub attributes: usize,

    #[serde(default = "default_values")]
    #[schemars(
        title = "Values per Attribute",
        description = "Cardinality of every attribute",
        range(min = 2, max = 10)
    )]
    pub values_per_attribute: usize,

    #[serde(default = "default_classes")]
    #[schemars(title = "Classes", description = "Number of classes", range(min = 2))]
    pub classes: usize,

    #[serde(default = "default_burn_in")]
    #[schemars(
        title = "Burn-in",
        description = "Instances generated from the first concept before the drift"
    )]
    pub burn_in: u64,

    #[serde(default = "default_conditional_drift")]
    #[schemars(
        title = "Conditional Drift",
        description = "Fraction of attribute tuples whose class changes at the drift (0.0–1.0)",
        range(min = 0.0, max = 1.0)
    )]
    pub conditional_drift: f64,

    #[serde(default)]
    #[schemars(
        title = "Drift Priors",
        description = "Redraw the attribute value distributions at the drift"
    )]
    pub drift_priors: bool,

    #[serde(default)]
    #[schemars(
        title = "Uniform Priors",
        description = "Draw attribute values uniformly instead of from random weights"
    )]
    pub uniform_priors: bool,

    #[serde(default)]
    #[schemars(
        title = "Max Instances",
        description = "Upper bound on instances; empty = infinite"
    )]
    pub max_instances: Option<u64>,

    #[serde(default = "default_seed")]
    #[schemars(title = "Seed", description = "PRNG seed")]
    pub seed: u64,
}

impl Default for AbruptDriftParams {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
            values_per_attribute: default_values(),
            classes: default_classes(),
            burn_in: default_burn_in(),
            conditional_drift: default_conditional_drift(),
            drift_priors: false,
            uniform_priors: false,
            max_instances: None,
            seed: default_seed(),
        }
    }
}

/// One concept: per-attribute value distributions and a class for every
/// attribute-value tuple.
#[derive(Debug, Clone, PartialEq)]
struct Concept {
    priors: Vec<Vec<f64>>,
    classes: Vec<usize>,
}

/// Categorical stream whose concept switches once, abruptly, after
/// `burn_in` instances. A fraction of the tuples is relabeled and the priors
/// may be redrawn.
#[derive(Debug)]
pub struct AbruptDriftGenerator {
    params: AbruptDriftParams,
    header: Arc<InstanceHeader>,
    before: Concept,
    after: Concept,
    rng: StdRng,
    generated: u64,
}

impl AbruptDriftGenerator {
    pub fn new(params: AbruptDriftParams) -> Result<Self, Error> {
        Self::with_relation(params, "abrupt-drift")
    }

    pub(super) fn with_relation(params: AbruptDriftParams, relation: &str) -> Result<Self, Error> {
        if !(1..=10).contains(&params.attributes) {
            return Err(invalid_input("attributes must be within 1..=10"));
        }
        if !(2..=10).contains(&params.values_per_attribute) {
            return Err(invalid_input("values_per_attribute must be within 2..=10"));
        }
        if params.classes < 2 {
            return Err(invalid_input("at least two classes are needed"));
        }
        if !(0.0..=1.0).contains(&params.conditional_drift) {
            return Err(invalid_input("conditional_drift must be within [0, 1]"));
        }

        let header = Arc::new(build_header(&params, relation));
        let mut concept_rng = StdRng::seed_from_u64(params.seed);
        let before = Concept {
            priors: draw_priors(&params, &mut concept_rng),
            classes: (0..tuple_count(&params))
                .map(|_| concept_rng.random_range(0..params.classes))
                .collect(),
        };
        let after = drift_concept(&params, &before, &mut concept_rng);

        Ok(Self {
            rng: StdRng::seed_from_u64(params.seed.wrapping_add(1)),
            params,
            header,
            before,
            after,
            generated: 0,
        })
    }

    pub fn shared_header(&self) -> Arc<InstanceHeader> {
        Arc::clone(&self.header)
    }

    /// Whether the next instance comes from the post-drift concept.
    pub fn drifted(&self) -> bool {
        self.generated >= self.params.burn_in
    }

    /// Class of an attribute-value tuple under the first or the second concept.
    pub fn class_of(&self, values: &[usize], after_drift: bool) -> Option<usize> {
        let concept = if after_drift { &self.after } else { &self.before };
        concept.classes.get(tuple_index(values, self.params.values_per_attribute)).copied()
    }

    pub(super) fn params(&self) -> &AbruptDriftParams {
        &self.params
    }

    pub(super) fn generated(&self) -> u64 {
        self.generated
    }

    /// Draws one instance from the chosen concept, ignoring `max_instances`.
    pub(super) fn generate(&mut self, after_drift: bool) -> Option<Box<dyn Instance>> {
        let priors = if after_drift {
            self.after.priors.clone()
        } else {
            self.before.priors.clone()
        };
        let tuple: Vec<usize> = priors.iter().map(|p| self.sample_value(p)).collect();
        let class = self.class_of(&tuple, after_drift)?;

        let mut values: Vec<f64> = tuple.iter().map(|&v| v as f64).collect();
        values.push(class as f64);
        self.generated += 1;
        Some(Box::new(DenseInstance::new(
            Arc::clone(&self.header),
            values,
            1.0,
        )))
    }

    fn sample_value(&mut self, priors: &[f64]) -> usize {
        let draw: f64 = self.rng.random();
        let mut cumulative = 0.0;
        for (value, p) in priors.iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                return value;
            }
        }
        priors.len() - 1
    }
}

fn invalid_input(message: &str) -> Error {
    Error::new(ErrorKind::InvalidInput, message.to_string())
}

fn build_header(params: &AbruptDriftParams, relation: &str) -> InstanceHeader {
    let labels: Vec<String> = (1..=params.values_per_attribute)
        .map(|v| format!("v{v}"))
        .collect();
    let mut attributes: Vec<AttributeRef> = (1..=params.attributes)
        .map(|i| Arc::new(NominalAttribute::from_labels(format!("x{i}"), labels.clone())) as AttributeRef)
        .collect();
    let classes = (1..=params.classes).map(|c| format!("class{c}")).collect();
    attributes.push(Arc::new(NominalAttribute::from_labels("class", classes)));
    InstanceHeader::new(relation.into(), attributes, params.attributes)
}

fn tuple_count(params: &AbruptDriftParams) -> usize {
    params.values_per_attribute.pow(params.attributes as u32)
}

/// Row-major index of a tuple, first attribute most significant.
fn tuple_index(values: &[usize], values_per_attribute: usize) -> usize {
    values
        .iter()
        .fold(0, |index, &v| index * values_per_attribute + v)
}

/// Exponential(1) weights normalized per attribute, which is a flat
/// Dirichlet draw.
fn draw_priors(params: &AbruptDriftParams, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let v = params.values_per_attribute;
    (0..params.attributes)
        .map(|_| {
            if params.uniform_priors {
                return vec![1.0 / v as f64; v];
            }
            let weights: Vec<f64> = (0..v)
                .map(|_| -(1.0 - rng.random::<f64>()).ln())
                .collect();
            let total: f64 = weights.iter().sum();
            weights.iter().map(|w| w / total).collect()
        })
        .collect()
}

fn drift_concept(params: &AbruptDriftParams, before: &Concept, rng: &mut StdRng) -> Concept {
    let tuples = before.classes.len();
    let changed = (params.conditional_drift * tuples as f64).round() as usize;
    let mut classes = before.classes.clone();
    for tuple in sample(rng, tuples, changed.min(tuples)).into_iter() {
        let old = classes[tuple];
        // Draw among the other classes only.
        let shifted = rng.random_range(1..params.classes);
        classes[tuple] = (old + shifted) % params.classes;
    }
    let priors = if params.drift_priors {
        draw_priors(params, rng)
    } else {
        before.priors.clone()
    };
    Concept { priors, classes }
}

impl Stream for AbruptDriftGenerator {
    fn header(&self) -> &InstanceHeader {
        &self.header
    }

    fn has_more_instances(&self) -> bool {
        self.params.max_instances.is_none_or(|max| self.generated < max)
    }

    fn next_instance(&mut self) -> Option<Box<dyn Instance>> {
        if !self.has_more_instances() {
            return None;
        }
        let after_drift = self.drifted();
        self.generate(after_drift)
    }

    fn restart(&mut self) -> Result<(), Error> {
        self.rng = StdRng::seed_from_u64(self.params.seed.wrapping_add(1));
        self.generated = 0;
        Ok(())
    }
}
