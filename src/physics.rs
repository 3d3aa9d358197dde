//! Fall stepper: advance tokens by elapsed time, de-overlap neighbours, report bottom crossings.

use crate::EngineConfig;
use crate::virus::{Virus, VirusId};

/// Left bound for a nudged token.
const NUDGE_MIN_X: f64 = 30.0;
/// Right slack for a nudged token (token size plus a margin).
const NUDGE_RIGHT_SLACK: f64 = 78.0;
/// Extra push beyond the overlap when nudging.
const NUDGE_PAD: f64 = 10.0;

/// Playfield dimensions in units, supplied by the viewport measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
        }
    }
}

/// Session-wide motion modifiers derived from the active timed effects.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Modifiers {
    pub frozen: bool,
    /// Time damping factor while slowed.
    pub slow: Option<f64>,
    /// Fall speed multiplier while boosted.
    pub boost: Option<f64>,
}

impl Modifiers {
    /// Elapsed time as seen by the tokens.
    pub fn effective_delta(&self, elapsed_ms: f64) -> f64 {
        if self.frozen {
            return 0.0;
        }
        elapsed_ms * self.slow.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepOutcome {
    /// Tokens still on the field, in board order.
    pub viruses: Vec<Virus>,
    /// One entry per token that reached the bottom this step.
    pub reached_bottom: Vec<VirusId>,
}

/// Advance every token by `speed × effective delta`, resolve horizontal overlaps between tokens
/// at similar heights, then remove the ones whose lower edge reached the field height.
pub fn step(
    viruses: &[Virus],
    elapsed_ms: f64,
    modifiers: Modifiers,
    field: Field,
    config: &EngineConfig,
) -> StepOutcome {
    if modifiers.frozen {
        return StepOutcome {
            viruses: viruses.to_vec(),
            reached_bottom: Vec::new(),
        };
    }

    let delta = modifiers.effective_delta(elapsed_ms);
    let boost = modifiers.boost.unwrap_or(1.0);
    let mut moved: Vec<Virus> = viruses
        .iter()
        .map(|v| Virus {
            y: v.y + v.speed * boost * delta,
            ..v.clone()
        })
        .collect();

    separate(&mut moved, field.width, config);

    let (reached, kept): (Vec<Virus>, Vec<Virus>) = moved
        .into_iter()
        .partition(|v| v.bottom(config.virus_size) >= field.height);

    StepOutcome {
        viruses: kept,
        reached_bottom: reached.into_iter().map(|v| v.id).collect(),
    }
}

/// Continuous de-overlap: for each close pair, push the later-spawned token sideways.
fn separate(viruses: &mut [Virus], width: f64, config: &EngineConfig) {
    let hi = width - NUDGE_RIGHT_SLACK;
    for i in 0..viruses.len() {
        for j in (i + 1)..viruses.len() {
            if (viruses[i].y - viruses[j].y).abs() >= config.nudge_band {
                continue;
            }
            let dx = (viruses[i].x - viruses[j].x).abs();
            if dx >= config.nudge_distance {
                continue;
            }
            let (mover, other) = if viruses[j].id > viruses[i].id { (j, i) } else { (i, j) };
            let direction = if viruses[mover].x < viruses[other].x { -1.0 } else { 1.0 };
            let shifted = viruses[mover].x + direction * (config.nudge_distance - dx + NUDGE_PAD);
            viruses[mover].x = shifted.min(hi).max(NUDGE_MIN_X);
        }
    }
}
