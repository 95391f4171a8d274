use super::abrupt_drift_generator::{AbruptDriftGenerator, AbruptDriftParams};
use crate::core::instance_header::InstanceHeader;
use crate::core::instances::Instance;
use crate::streams::stream::Stream;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Error;
use std::sync::Arc;

fn default_drift_duration() -> u64 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GradualDriftParams {
    #[serde(default)]
    #[schemars(title = "Concepts", description = "The two concepts and their burn-in")]
    pub drift: AbruptDriftParams,

    #[serde(default = "default_drift_duration")]
    #[schemars(
        title = "Drift Duration",
        description = "Instances over which the second concept takes over after the burn-in"
    )]
    pub drift_duration: u64,
}

impl Default for GradualDriftParams {
    fn default() -> Self {
        Self {
            drift: AbruptDriftParams::default(),
            drift_duration: default_drift_duration(),
        }
    }
}

/// Same two concepts as [`AbruptDriftGenerator`], but after the burn-in each
/// instance comes from the second concept with a probability that rises
/// linearly from 0 to 1 over `drift_duration` instances.
#[derive(Debug)]
pub struct GradualDriftGenerator {
    inner: AbruptDriftGenerator,
    drift_duration: u64,
    mix: StdRng,
}

impl GradualDriftGenerator {
    pub fn new(params: GradualDriftParams) -> Result<Self, Error> {
        let seed = params.drift.seed;
        Ok(Self {
            inner: AbruptDriftGenerator::with_relation(params.drift, "gradual-drift")?,
            drift_duration: params.drift_duration,
            mix: mix_rng(seed),
        })
    }

    pub fn shared_header(&self) -> Arc<InstanceHeader> {
        self.inner.shared_header()
    }

    /// Probability that the next instance comes from the second concept.
    pub fn drift_probability(&self) -> f64 {
        let burn_in = self.inner.params().burn_in;
        let generated = self.inner.generated();
        if generated < burn_in {
            return 0.0;
        }
        let into_drift = generated - burn_in;
        if into_drift >= self.drift_duration {
            return 1.0;
        }
        into_drift as f64 / self.drift_duration as f64
    }

    /// Class of an attribute-value tuple under the first or the second concept.
    pub fn class_of(&self, values: &[usize], after_drift: bool) -> Option<usize> {
        self.inner.class_of(values, after_drift)
    }
}

fn mix_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(2))
}

impl Stream for GradualDriftGenerator {
    fn header(&self) -> &InstanceHeader {
        self.inner.header()
    }

    fn has_more_instances(&self) -> bool {
        self.inner.has_more_instances()
    }

    fn next_instance(&mut self) -> Option<Box<dyn Instance>> {
        if !self.has_more_instances() {
            return None;
        }
        let p = self.drift_probability();
        let after_drift = if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.mix.random::<f64>() < p
        };
        self.inner.generate(after_drift)
    }

    fn restart(&mut self) -> Result<(), Error> {
        self.mix = mix_rng(self.inner.params().seed);
        self.inner.restart()
    }
}
