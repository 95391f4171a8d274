use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Evaluation state at one point of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub instances_seen: u64,
    pub accuracy: f64,
    pub kappa: f64,
    pub ram_hours: f64,
    pub seconds: f64,
    pub extras: BTreeMap<String, f64>,
}

/// Extras shown first, in this order; the rest follow alphabetically.
const LEADING_EXTRAS: &[&str] = &["precision", "recall", "f1"];

pub(crate) fn format_metric(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else {
        format!("{v:.6}")
    }
}

impl Snapshot {
    /// Extras in display order.
    pub fn ordered_extras(&self) -> impl Iterator<Item = (&str, f64)> {
        let leading = LEADING_EXTRAS
            .iter()
            .filter_map(|key| self.extras.get_key_value(*key));
        let rest = self
            .extras
            .iter()
            .filter(|(k, _)| !LEADING_EXTRAS.contains(&k.as_str()));
        leading.chain(rest).map(|(k, v)| (k.as_str(), *v))
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "seen={} acc={} kappa={} ram_h={:e} t={:.3}s",
            self.instances_seen,
            format_metric(self.accuracy),
            format_metric(self.kappa),
            self.ram_hours,
            self.seconds
        )?;
        for (key, value) in self.ordered_extras() {
            write!(f, " {key}={}", format_metric(value))?;
        }
        Ok(())
    }
}
