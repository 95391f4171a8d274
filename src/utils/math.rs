use libm::erf;

/// Standard normal cumulative distribution at `z`.
pub fn normal_probability(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Shannon entropy (base 2) of a weight distribution. Non-positive entries
/// contribute nothing.
pub fn entropy(distribution: &[f64]) -> f64 {
    let total: f64 = distribution.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut h = 0.0;
    for &w in distribution {
        if w > 0.0 {
            let p = w / total;
            h -= p * p.log2();
        }
    }
    h
}

/// Index of the largest entry; ties resolve to the lowest index.
pub fn max_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
