//! Round generator: picks the pair of numbers shown for one round.

use rand::Rng;

use crate::config::GameConfig;
use crate::model::RoundNumbers;

/// Uniform source of floats in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapts any `rand` generator to [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}

impl RngSource<rand::rngs::StdRng> {
    /// Entropy-seeded generator (browser crypto on wasm32).
    pub fn from_entropy() -> Self {
        use rand::SeedableRng;
        RngSource(rand::rngs::StdRng::from_entropy())
    }
}

/// Draw an integer uniformly from `0..=max`.
fn draw(rng: &mut impl RandomSource, max: u16) -> u16 {
    let span = f64::from(max) + 1.0;
    // A misbehaving source returning 1.0 must not escape the range.
    ((rng.next_unit() * span).floor() as u16).min(max)
}

/// Numbers for round `round_index` (1-based).
///
/// Every `equal_round_period`-th round shows the same number twice; all other
/// rounds redraw `right` until it differs from `left`.
pub fn generate(round_index: u32, rng: &mut impl RandomSource, config: &GameConfig) -> RoundNumbers {
    let max = config.max_number;
    if round_index % config.equal_round_period == 0 {
        let n = draw(rng, max);
        return RoundNumbers::new(n, n);
    }
    let left = draw(rng, max);
    let mut right = draw(rng, max);
    while right == left {
        right = draw(rng, max);
    }
    RoundNumbers::new(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Replays a fixed list of unit floats, cycling.
    struct Script {
        values: Vec<f64>,
        pos: usize,
    }

    impl RandomSource for Script {
        fn next_unit(&mut self) -> f64 {
            let v = self.values[self.pos % self.values.len()];
            self.pos += 1;
            v
        }
    }

    fn script(values: &[f64]) -> Script {
        Script { values: values.to_vec(), pos: 0 }
    }

    #[test]
    fn test_equal_round_uses_one_draw() {
        let mut rng = script(&[0.447, 0.9]);
        let numbers = generate(10, &mut rng, &GameConfig::default());
        assert_eq!(numbers, RoundNumbers::new(447, 447));
        assert_eq!(rng.pos, 1);
    }

    #[test]
    fn test_collision_is_redrawn() {
        // left = 500, right collides twice before landing on 12.
        let mut rng = script(&[0.5, 0.5, 0.5, 0.012]);
        let numbers = generate(3, &mut rng, &GameConfig::default());
        assert_eq!(numbers, RoundNumbers::new(500, 12));
        assert_eq!(rng.pos, 4);
    }

    #[test]
    fn test_draw_stays_in_range_at_bounds() {
        let mut rng = script(&[0.0]);
        assert_eq!(draw(&mut rng, 1000), 0);
        let mut rng = script(&[0.999_999_999]);
        assert_eq!(draw(&mut rng, 1000), 1000);
        let mut rng = script(&[1.0]);
        assert_eq!(draw(&mut rng, 1000), 1000);
    }

    #[test]
    fn test_non_equal_rounds_never_collide() {
        let mut rng = RngSource(rand::rngs::StdRng::seed_from_u64(7));
        let config = GameConfig::default();
        for _ in 0..10_000 {
            let numbers = generate(7, &mut rng, &config);
            assert_ne!(numbers.left, numbers.right);
            assert!(numbers.left <= 1000 && numbers.right <= 1000);
        }
    }
}
