use crate::utils::memory::{MemoryMeter, MemorySized};
use std::collections::VecDeque;

const MAX_BUCKETS: usize = 5;
const CLOCK: u64 = 32;
const MIN_WINDOW_LENGTH_TO_TEST: u64 = 10;
const MIN_SUB_WINDOW_LENGTH: u64 = 5;

pub const DEFAULT_DELTA: f64 = 0.002;

#[derive(Clone, Copy, Debug)]
struct Bucket {
    total: f64,
    variance: f64,
}

/// Adaptive windowing change detector (ADWIN).
///
/// The window is kept as rows of exponential histograms: row `i` holds up to
/// `MAX_BUCKETS` buckets that summarize `2^i` observations each, oldest at the
/// front. Every `CLOCK` observations all cut points are checked and the
/// oldest buckets are dropped while the two sub-window means differ by more
/// than the bound for `delta`.
#[derive(Clone, Debug)]
pub struct Adwin {
    delta: f64,
    rows: Vec<VecDeque<Bucket>>,
    width: u64,
    total: f64,
    variance: f64,
    time: u64,
    detections: u64,
}

impl Default for Adwin {
    fn default() -> Self {
        Self::new(DEFAULT_DELTA)
    }
}

impl Adwin {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            rows: Vec::new(),
            width: 0,
            total: 0.0,
            variance: 0.0,
            time: 0,
            detections: 0,
        }
    }

    /// Feeds a correctness signal (0 when correct, 1 on error) and reports a change.
    pub fn observe(&mut self, correct: bool) -> bool {
        self.add(if correct { 0.0 } else { 1.0 })
    }

    pub fn add(&mut self, value: f64) -> bool {
        self.insert_element(value);
        self.time += 1;

        let mut changed = false;
        if self.time % CLOCK == 0 && self.width > MIN_WINDOW_LENGTH_TO_TEST {
            while self.try_cut() {
                changed = true;
                if self.width == 0 {
                    break;
                }
            }
        }
        if changed {
            self.detections += 1;
        }
        changed
    }

    pub fn estimated_error_rate(&self) -> f64 {
        if self.width > 0 {
            self.total / self.width as f64
        } else {
            0.0
        }
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn variance(&self) -> f64 {
        if self.width > 0 {
            self.variance / self.width as f64
        } else {
            0.0
        }
    }

    pub fn detections(&self) -> u64 {
        self.detections
    }

    pub fn number_of_buckets(&self) -> usize {
        self.rows.iter().map(VecDeque::len).sum()
    }

    fn insert_element(&mut self, value: f64) {
        self.width += 1;
        if self.rows.is_empty() {
            self.rows.push(VecDeque::with_capacity(MAX_BUCKETS + 1));
        }
        self.rows[0].push_back(Bucket {
            total: value,
            variance: 0.0,
        });

        if self.width > 1 {
            let previous = (self.width - 1) as f64;
            let diff = value - self.total / previous;
            self.variance += previous * diff * diff / self.width as f64;
        }
        self.total += value;
        self.compress_buckets();
    }

    fn compress_buckets(&mut self) {
        let mut row = 0;
        while row < self.rows.len() && self.rows[row].len() > MAX_BUCKETS {
            let bucket_size = (1u64 << row) as f64;
            let (Some(first), Some(second)) = (self.rows[row].pop_front(), self.rows[row].pop_front())
            else {
                break;
            };
            let diff = first.total / bucket_size - second.total / bucket_size;
            let merged = Bucket {
                total: first.total + second.total,
                variance: first.variance
                    + second.variance
                    + bucket_size * bucket_size * diff * diff / (2.0 * bucket_size),
            };
            if row + 1 == self.rows.len() {
                self.rows.push(VecDeque::with_capacity(MAX_BUCKETS + 1));
            }
            self.rows[row + 1].push_back(merged);
            row += 1;
        }
    }

    /// Scans cut points from the oldest bucket forward; drops the oldest
    /// bucket and returns `true` on the first significant one.
    fn try_cut(&mut self) -> bool {
        let mut n0 = 0u64;
        let mut n1 = self.width;
        let mut u0 = 0.0;
        let mut u1 = self.total;

        for row in (0..self.rows.len()).rev() {
            let bucket_size = 1u64 << row;
            let len = self.rows[row].len();
            for k in 0..len {
                if row == 0 && k + 1 == len {
                    return false;
                }
                let bucket_total = self.rows[row][k].total;
                n0 += bucket_size;
                n1 -= bucket_size;
                u0 += bucket_total;
                u1 -= bucket_total;

                if n0 > MIN_SUB_WINDOW_LENGTH + 1
                    && n1 > MIN_SUB_WINDOW_LENGTH + 1
                    && self.is_cut(n0, n1, u0, u1)
                {
                    self.delete_oldest_bucket();
                    return true;
                }
            }
        }
        false
    }

    fn is_cut(&self, n0: u64, n1: u64, u0: f64, u1: f64) -> bool {
        let n = self.width as f64;
        let diff = (u0 / n0 as f64 - u1 / n1 as f64).abs();
        let v = self.variance();
        let dd = (2.0 * n.ln() / self.delta).ln();
        let m = 1.0 / (n0 - MIN_SUB_WINDOW_LENGTH + 1) as f64
            + 1.0 / (n1 - MIN_SUB_WINDOW_LENGTH + 1) as f64;
        let epsilon = (2.0 * m * v * dd).sqrt() + 2.0 / 3.0 * dd * m;
        diff > epsilon
    }

    fn delete_oldest_bucket(&mut self) {
        let Some(last_row) = self.rows.len().checked_sub(1) else {
            return;
        };
        let Some(bucket) = self.rows[last_row].pop_front() else {
            return;
        };
        let n1 = (1u64 << last_row) as f64;
        self.width -= 1u64 << last_row;
        self.total -= bucket.total;

        if self.width == 0 {
            self.total = 0.0;
            self.variance = 0.0;
        } else {
            let w = self.width as f64;
            let u1 = bucket.total / n1;
            let diff = u1 - self.total / w;
            self.variance -= bucket.variance + n1 * w * diff * diff / (n1 + w);
            if self.variance < 0.0 {
                self.variance = 0.0;
            }
        }

        if self.rows[last_row].is_empty() {
            self.rows.pop();
        }
    }
}

impl MemorySized for Adwin {
    fn inline_size(&self) -> usize {
        size_of::<Self>()
    }

    fn extra_heap_size(&self, _meter: &mut MemoryMeter) -> usize {
        self.rows.capacity() * size_of::<VecDeque<Bucket>>()
            + self
                .rows
                .iter()
                .map(|row| row.capacity() * size_of::<Bucket>())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let adwin = Adwin::default();
        assert_eq!(adwin.width(), 0);
        assert_eq!(adwin.estimated_error_rate(), 0.0);
        assert_eq!(adwin.variance(), 0.0);
    }

    #[test]
    fn stable_stream_keeps_growing() {
        let mut adwin = Adwin::default();
        for _ in 0..2000 {
            assert!(!adwin.observe(true));
        }
        assert_eq!(adwin.width(), 2000);
        assert_eq!(adwin.estimated_error_rate(), 0.0);
        assert_eq!(adwin.detections(), 0);
    }

    #[test]
    fn buckets_stay_logarithmic() {
        let mut adwin = Adwin::default();
        for _ in 0..5000 {
            adwin.add(1.0);
        }
        assert!(adwin.number_of_buckets() <= MAX_BUCKETS * adwin.rows.len());
        assert!(adwin.rows.len() <= 14);
        assert_eq!(adwin.width(), 5000);
        assert!((adwin.total() - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn variance_tracks_bernoulli_spread() {
        let mut adwin = Adwin::default();
        for i in 0..1000 {
            adwin.add((i % 2) as f64);
        }
        assert!((adwin.variance() - 0.25).abs() < 0.01);
        assert!((adwin.estimated_error_rate() - 0.5).abs() < 0.01);
    }

    #[test]
    fn abrupt_increase_is_detected_and_window_shrinks() {
        let mut adwin = Adwin::default();
        for _ in 0..1000 {
            adwin.observe(true);
        }

        let mut detected_after = None;
        for i in 0..300 {
            if adwin.observe(false) {
                detected_after = Some(i);
                break;
            }
        }

        let steps = detected_after.expect("change should be detected");
        assert!(steps < 200, "detected after {steps} errors");
        assert!(adwin.width() < 1000);
        assert!(adwin.estimated_error_rate() > 0.05);
    }

    #[test]
    fn checks_only_on_clock_ticks() {
        let mut adwin = Adwin::default();
        for _ in 0..(CLOCK - 1) {
            assert!(!adwin.observe(false));
        }
        assert_eq!(adwin.width(), CLOCK - 1);
    }
}
