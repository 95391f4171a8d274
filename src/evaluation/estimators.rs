/// Running weighted mean of observed values.
pub trait Estimator: Default {
    fn add(&mut self, value: f64, weight: f64);

    /// `NaN` until something with positive weight was added.
    fn estimation(&self) -> f64;

    fn total_weight(&self) -> f64;
}

#[derive(Debug, Clone, Default)]
pub struct BasicEstimator {
    weighted_sum: f64,
    weight: f64,
}

impl Estimator for BasicEstimator {
    fn add(&mut self, value: f64, weight: f64) {
        self.weighted_sum += value * weight;
        self.weight += weight;
    }

    fn estimation(&self) -> f64 {
        if self.weight > 0.0 {
            self.weighted_sum / self.weight
        } else {
            f64::NAN
        }
    }

    fn total_weight(&self) -> f64 {
        self.weight
    }
}
