use crate::utils::math::normal_probability;
use crate::utils::memory::MemorySized;
use std::f64::consts::PI;

/// Weighted running mean and variance (Welford), reversible so that a
/// forgotten value can be taken back out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GaussianEstimator {
    weight: f64,
    mean: f64,
    m2: f64,
}

impl GaussianEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` with `weight`; a negative weight removes it again.
    /// Non-finite input is ignored.
    pub fn update(&mut self, value: f64, weight: f64) {
        if !value.is_finite() || !weight.is_finite() || weight == 0.0 {
            return;
        }
        if weight < 0.0 {
            self.remove(value, -weight);
            return;
        }
        if self.weight <= 0.0 {
            *self = Self {
                weight,
                mean: value,
                m2: 0.0,
            };
            return;
        }
        let total = self.weight + weight;
        let delta = value - self.mean;
        let mean = self.mean + weight * delta / total;
        self.m2 += weight * delta * (value - mean);
        self.mean = mean;
        self.weight = total;
    }

    /// Takes back `weight` of `value`. Removing all remaining weight resets
    /// the estimator.
    pub fn remove(&mut self, value: f64, weight: f64) {
        if !value.is_finite() || weight.is_nan() || weight <= 0.0 {
            return;
        }
        let total = self.weight - weight;
        if total <= 0.0 {
            *self = Self::default();
            return;
        }
        let mean = (self.weight * self.mean - weight * value) / total;
        self.m2 = (self.m2 - weight * (value - mean) * (value - self.mean)).max(0.0);
        self.mean = mean;
        self.weight = total;
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; zero until more than one unit of weight is seen.
    pub fn variance(&self) -> f64 {
        if self.weight > 1.0 {
            self.m2 / (self.weight - 1.0)
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Normal density at `value`. With zero spread the estimator is a point
    /// mass: 1 at the mean and 0 elsewhere.
    pub fn density(&self, value: f64) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let sd = self.std_dev();
        if sd == 0.0 {
            return if value == self.mean { 1.0 } else { 0.0 };
        }
        let z = (value - self.mean) / sd;
        (-0.5 * z * z).exp() / (sd * (2.0 * PI).sqrt())
    }

    /// Estimated weight below, at, and above `value`.
    pub fn weight_around(&self, value: f64) -> [f64; 3] {
        let at = self.density(value) * self.weight;
        let sd = self.std_dev();
        let below = if sd > 0.0 {
            normal_probability((value - self.mean) / sd) * self.weight - at
        } else if value > self.mean {
            self.weight - at
        } else {
            0.0
        };
        let above = (self.weight - at - below).max(0.0);
        [below, at, above]
    }
}

impl MemorySized for GaussianEstimator {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_estimator_has_no_density() {
        let g = GaussianEstimator::new();
        assert_eq!(g.weight(), 0.0);
        assert_eq!(g.variance(), 0.0);
        assert_eq!(g.density(0.0), 0.0);
    }

    #[test]
    fn weighted_moments() {
        let mut g = GaussianEstimator::new();
        for x in [-1.0, 0.0, 1.0] {
            g.update(x, 1.0);
        }
        assert!(close(g.mean(), 0.0));
        assert!(close(g.variance(), 1.0));
        assert!(close(g.density(0.0), 1.0 / (2.0 * PI).sqrt()));

        let mut w = GaussianEstimator::new();
        w.update(0.0, 1.0);
        w.update(3.0, 2.0);
        assert!(close(w.mean(), 2.0));
        assert!(close(w.weight(), 3.0));
    }

    #[test]
    fn point_mass_until_spread_appears() {
        let mut g = GaussianEstimator::new();
        g.update(10.0, 3.0);
        assert_eq!(g.std_dev(), 0.0);
        assert_eq!(g.density(10.0), 1.0);
        assert_eq!(g.density(10.000_001), 0.0);
        assert_eq!(g.weight_around(11.0), [3.0, 0.0, 0.0]);
        assert_eq!(g.weight_around(9.0), [0.0, 0.0, 3.0]);
    }

    #[test]
    fn negative_weight_takes_a_value_back_out() {
        let mut g = GaussianEstimator::new();
        g.update(1.0, 1.0);
        g.update(4.0, 2.0);
        let before = g.clone();

        g.update(10.0, 1.5);
        g.update(10.0, -1.5);
        assert!(close(g.weight(), before.weight()));
        assert!(close(g.mean(), before.mean()));
        assert!(close(g.variance(), before.variance()));
    }

    #[test]
    fn removing_all_weight_resets() {
        let mut g = GaussianEstimator::new();
        g.update(3.0, 1.0);
        g.remove(3.0, 1.0);
        assert_eq!(g, GaussianEstimator::default());
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let mut g = GaussianEstimator::new();
        g.update(f64::NAN, 1.0);
        g.update(f64::INFINITY, 1.0);
        g.update(1.0, f64::NAN);
        g.remove(1.0, f64::NAN);
        assert_eq!(g, GaussianEstimator::default());
    }

    #[test]
    fn weight_around_splits_the_mass() {
        let mut g = GaussianEstimator::new();
        for x in [0.0, 1.0, 2.0, 3.0, 4.0] {
            g.update(x, 1.0);
        }
        let [below, at, above] = g.weight_around(2.0);
        assert!(close(below + at + above, 5.0));
        assert!(close(below + at, above));
        assert!(below > 0.0 && above > 0.0);
    }
}
