//! Spawn-time horizontal placement: keep a new token clear of the tokens still near the top.

use crate::EngineConfig;
use crate::virus::{GameRng, Virus};
use rand::Rng;

/// Random x inside the safe margin: `[edge_margin, width - virus_size - edge_margin)`.
/// Fields narrower than one token plus both margins collapse to the left margin.
pub fn random_x(width: f64, config: &EngineConfig, rng: &mut GameRng) -> f64 {
    let span = width - config.virus_size - config.edge_margin * 2.0;
    if span <= 0.0 {
        return config.edge_margin;
    }
    rng.gen_range(0.0..span) + config.edge_margin
}

fn clear_of(x: f64, near_top: &[f64], min_distance: f64) -> bool {
    near_top.iter().all(|&other| (other - x).abs() >= min_distance)
}

/// Pick an x for a new token.
///
/// Tries `placement_attempts` random candidates at `min_separation`, then `relaxed_attempts`
/// at `relaxed_separation`, then gives up and returns a random x (overlap allowed). Spawning
/// never stalls. An empty board keeps the caller's candidate.
pub fn place(
    candidate: f64,
    existing: &[Virus],
    width: f64,
    config: &EngineConfig,
    rng: &mut GameRng,
) -> f64 {
    if existing.is_empty() {
        return candidate;
    }
    let near_top: Vec<f64> = existing
        .iter()
        .filter(|v| v.y < config.near_top_y)
        .map(|v| v.x)
        .collect();

    let passes = [
        (config.min_separation, config.placement_attempts),
        (config.relaxed_separation, config.relaxed_attempts),
    ];
    for (min_distance, attempts) in passes {
        for _ in 0..attempts {
            let x = random_x(width, config, rng);
            if clear_of(x, &near_top, min_distance) {
                return x;
            }
        }
    }
    log::debug!(
        "placement exhausted against {} near-top tokens, allowing overlap",
        near_top.len()
    );
    random_x(width, config, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virus::VirusId;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn at(id: u64, x: f64, y: f64) -> Virus {
        Virus::new(VirusId(id), 5, x, y, 0.01)
    }

    #[test]
    fn empty_board_keeps_candidate() {
        let config = EngineConfig::default();
        let mut rng = GameRng::seed_from_u64(1);
        assert_eq!(place(123.4, &[], 640.0, &config, &mut rng), 123.4);
    }

    #[test]
    fn random_x_stays_inside_margin() {
        let config = EngineConfig::default();
        let mut rng = GameRng::seed_from_u64(2);
        for _ in 0..1000 {
            let x = random_x(640.0, &config, &mut rng);
            assert!(x >= config.edge_margin);
            assert!(x < 640.0 - config.virus_size - config.edge_margin);
        }
    }

    #[test]
    fn narrow_field_collapses_to_margin() {
        let config = EngineConfig::default();
        let mut rng = GameRng::seed_from_u64(2);
        assert_eq!(random_x(50.0, &config, &mut rng), config.edge_margin);
    }

    #[test]
    fn tokens_below_band_are_ignored() {
        let config = EngineConfig::default();
        let mut rng = GameRng::seed_from_u64(4);
        // A wall of tokens low on the field must not constrain placement at all.
        let low: Vec<Virus> = (0..20).map(|i| at(i, i as f64 * 30.0, 400.0)).collect();
        for _ in 0..50 {
            let x = place(0.0, &low, 640.0, &config, &mut rng);
            assert!(x >= config.edge_margin);
        }
    }

    #[test]
    fn crowded_top_still_returns_a_position() {
        let config = EngineConfig::default();
        let mut rng = GameRng::seed_from_u64(9);
        let crowded: Vec<Virus> = (0..30).map(|i| at(i, i as f64 * 20.0, 0.0)).collect();
        let x = place(0.0, &crowded, 640.0, &config, &mut rng);
        assert!(x >= config.edge_margin && x < 640.0);
    }

    proptest! {
        #[test]
        fn few_near_top_tokens_are_kept_apart(
            seed in any::<u64>(),
            xs in proptest::collection::vec(24.0f64..928.0, 1..4),
        ) {
            let config = EngineConfig::default();
            let mut rng = GameRng::seed_from_u64(seed);
            let existing: Vec<Virus> = xs
                .iter()
                .enumerate()
                .map(|(i, &x)| at(i as u64, x, 10.0))
                .collect();
            let x = place(0.0, &existing, 1000.0, &config, &mut rng);
            for v in &existing {
                prop_assert!((v.x - x).abs() >= config.min_separation);
            }
        }
    }
}
