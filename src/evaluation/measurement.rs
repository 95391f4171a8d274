use serde::Serialize;

/// A named scalar reported by an evaluator or a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
}

impl Measurement {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Looks a measurement up by name.
pub fn find_measurement(measurements: &[Measurement], name: &str) -> Option<f64> {
    measurements.iter().find(|m| m.name == name).map(|m| m.value)
}
