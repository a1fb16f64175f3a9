//! Seeded synthetic datasets for offline training.
//!
//! Risk rows follow `[health_factor, collateral_ratio, debt_ratio, apy]`;
//! APY rows are the trailing `TREND_WINDOW` values of a noisy linear series.

use crate::domain::ml::TREND_WINDOW;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const APY_FLOOR: f64 = 0.5;
const APY_CEILING: f64 = 20.0;
const APY_DRIFTS: [f64; 3] = [-0.1, 0.0, 0.1];

pub struct SyntheticDataGenerator {
    rng: StdRng,
}

impl SyntheticDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn noise(&mut self, std_dev: f64) -> f64 {
        Normal::new(0.0, std_dev)
            .map(|normal| normal.sample(&mut self.rng))
            .unwrap_or(0.0)
    }

    /// Risk label: falls with health factor, rises with leverage, plus noise.
    pub fn risk_dataset(&mut self, n_samples: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut x = Vec::with_capacity(n_samples);
        let mut y = Vec::with_capacity(n_samples);

        for _ in 0..n_samples {
            let health_factor = self.rng.random_range(0.8..3.0);
            let collateral_ratio = self.rng.random_range(0.3..0.95);
            let debt_ratio = 1.0 - collateral_ratio;
            let apy = self.rng.random_range(2.0..15.0);

            let risk = 1.0 - (health_factor - 0.8) / 2.2 + debt_ratio * 0.3 + self.noise(0.1);

            x.push(vec![health_factor, collateral_ratio, debt_ratio, apy]);
            y.push(risk.clamp(0.0, 1.0));
        }

        (x, y)
    }

    /// One row per generated series: its last window, labelled with the next value.
    pub fn apy_dataset(
        &mut self,
        n_sequences: usize,
        sequence_length: usize,
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        let sequence_length = sequence_length.max(TREND_WINDOW);
        let mut x = Vec::with_capacity(n_sequences);
        let mut y = Vec::with_capacity(n_sequences);

        for _ in 0..n_sequences {
            let base_apy = self.rng.random_range(3.0..12.0);
            let drift = APY_DRIFTS[self.rng.random_range(0..APY_DRIFTS.len())];

            let sequence: Vec<f64> = (0..sequence_length)
                .map(|t| {
                    (base_apy + t as f64 * drift + self.noise(0.5)).clamp(APY_FLOOR, APY_CEILING)
                })
                .collect();

            let window = sequence[sequence_length - TREND_WINDOW..].to_vec();
            let last = window[TREND_WINDOW - 1];
            let next = last + drift + self.noise(0.3);

            x.push(window);
            y.push(next);
        }

        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_dataset_shape_and_ranges() {
        let (x, y) = SyntheticDataGenerator::new(42).risk_dataset(200);
        assert_eq!(x.len(), 200);
        assert_eq!(y.len(), 200);

        for (row, label) in x.iter().zip(&y) {
            assert_eq!(row.len(), 4);
            assert!((0.8..3.0).contains(&row[0]));
            assert!(((row[1] + row[2]) - 1.0).abs() < 1e-12);
            assert!((2.0..15.0).contains(&row[3]));
            assert!((0.0..=1.0).contains(label));
        }
    }

    #[test]
    fn test_apy_dataset_shape() {
        let (x, y) = SyntheticDataGenerator::new(42).apy_dataset(50, 30);
        assert_eq!(x.len(), 50);
        assert_eq!(y.len(), 50);
        for row in &x {
            assert_eq!(row.len(), TREND_WINDOW);
            assert!(row.iter().all(|v| (APY_FLOOR..=APY_CEILING).contains(v)));
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = SyntheticDataGenerator::new(9).risk_dataset(20);
        let b = SyntheticDataGenerator::new(9).risk_dataset(20);
        assert_eq!(a, b);
    }
}
