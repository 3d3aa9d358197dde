//! Special-token effects and their timers.
//!
//! Timed effects only record an absolute expiry. Nothing here schedules anything: the driver
//! polls [`expired`] and dispatches the matching `Clear*` action when the time comes.

use crate::game::{Action, GameState, Millis};
use crate::physics::Modifiers;
use crate::virus::{GameRng, SuperKind, Virus, VirusId, random_value};
use rand::seq::SliceRandom;

/// A timed effect that scales something (time or speed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    pub until: Millis,
    pub factor: f64,
}

/// Tokens that ignore input until `until`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ghosted {
    pub until: Millis,
    pub ids: Vec<VirusId>,
}

/// Independent timed effect states. `None` means inactive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveEffects {
    pub slow: Option<Scaled>,
    pub speed_boost: Option<Scaled>,
    pub freeze_until: Option<Millis>,
    pub disturb_until: Option<Millis>,
    pub magnet_until: Option<Millis>,
    pub ghost: Option<Ghosted>,
}

impl ActiveEffects {
    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            frozen: self.freeze_until.is_some(),
            slow: self.slow.map(|s| s.factor),
            boost: self.speed_boost.map(|s| s.factor),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_until.is_some()
    }

    pub fn is_slowed(&self) -> bool {
        self.slow.is_some()
    }

    pub fn is_speed_boosted(&self) -> bool {
        self.speed_boost.is_some()
    }

    pub fn is_disturbed(&self) -> bool {
        self.disturb_until.is_some()
    }

    pub fn is_magnet_animating(&self) -> bool {
        self.magnet_until.is_some()
    }

    /// True when `id` is currently untouchable.
    pub fn is_ghost(&self, id: VirusId) -> bool {
        self.ghost.as_ref().is_some_and(|g| g.ids.contains(&id))
    }
}

/// Apply the effect of the special token that triggered a match. The token itself has already
/// left the board with the rest of the matched set.
pub fn resolve(state: &mut GameState, trigger: &Virus, rng: &mut GameRng) {
    let Some(kind) = trigger.special else {
        return;
    };
    let config = state.config.clone();
    let duration = config.effect_duration_ms;
    log::debug!("{} triggered {}", trigger.id, kind.name());
    match kind {
        SuperKind::SpeedBoost => speed_boost(state, duration, config.boost_factor),
        SuperKind::AreaClear => {
            explode(state, trigger.id, rng);
        }
        SuperKind::Slow => slow(state, duration, config.slow_factor),
        SuperKind::Lift => lift(state, config.lift_offset, config.magnet_animation_ms),
        SuperKind::Ghost => {
            let ids: Vec<VirusId> = state.viruses.iter().map(|v| v.id).collect();
            let chosen: Vec<VirusId> = ids
                .choose_multiple(rng, config.ghost_victims)
                .copied()
                .collect();
            ghost(state, &chosen, duration);
        }
        SuperKind::Split => split(state, trigger, rng),
        SuperKind::TimeFreeze => freeze(state, duration),
        SuperKind::Heal => heal(state, config.heal_amount),
        SuperKind::ClearAll => clear_all(state),
        SuperKind::Disturb => disturb(state, duration),
    }
}

pub fn speed_boost(state: &mut GameState, duration: Millis, factor: f64) {
    state.effects.speed_boost = Some(Scaled {
        until: state.now.saturating_add(duration),
        factor,
    });
}

pub fn slow(state: &mut GameState, duration: Millis, factor: f64) {
    state.effects.slow = Some(Scaled {
        until: state.now.saturating_add(duration),
        factor,
    });
}

pub fn freeze(state: &mut GameState, duration: Millis) {
    state.effects.freeze_until = Some(state.now.saturating_add(duration));
}

pub fn disturb(state: &mut GameState, duration: Millis) {
    state.effects.disturb_until = Some(state.now.saturating_add(duration));
}

/// Remove `trigger` (if still on the board) and up to `explode_victims` random others.
/// Scores `explode_points` per removed token, the trigger included. Returns the victim count.
pub fn explode(state: &mut GameState, trigger: VirusId, rng: &mut GameRng) -> usize {
    state.remove_tokens(&[trigger]);
    let ids: Vec<VirusId> = state.viruses.iter().map(|v| v.id).collect();
    let victims: Vec<VirusId> = ids
        .choose_multiple(rng, state.config.explode_victims)
        .copied()
        .collect();
    state.remove_tokens(&victims);
    let removed = victims.len() as u64 + 1;
    state.score = state
        .score
        .saturating_add(state.config.explode_points.saturating_mul(removed));
    victims.len()
}

/// Shift every token up by `offset`, never above the spawn line, and start the animation window.
pub fn lift(state: &mut GameState, offset: f64, duration: Millis) {
    let top = state.config.spawn_y;
    for v in &mut state.viruses {
        v.y = (v.y - offset).max(top);
    }
    state.effects.magnet_until = Some(state.now.saturating_add(duration));
}

/// Mark the given on-board tokens untouchable. Ids not on the board are dropped; an empty
/// result leaves the effect state alone.
pub fn ghost(state: &mut GameState, ids: &[VirusId], duration: Millis) {
    let ids: Vec<VirusId> = ids
        .iter()
        .copied()
        .filter(|id| state.viruses.iter().any(|v| v.id == *id))
        .collect();
    if ids.is_empty() {
        return;
    }
    state.selection.retain(|s| !ids.contains(s));
    for v in state.viruses.iter_mut().filter(|v| ids.contains(&v.id)) {
        v.selected = false;
    }
    state.effects.ghost = Some(Ghosted {
        until: state.now.saturating_add(duration),
        ids,
    });
}

/// Two ordinary tokens appear beside `origin` with fresh values and a fraction of its speed.
pub fn split(state: &mut GameState, origin: &Virus, rng: &mut GameRng) {
    let config = &state.config;
    let lo = config.edge_margin;
    let hi = state.field.width - config.virus_size - config.edge_margin;
    let speed = origin.speed * config.split_speed;
    let offsets = [-config.split_offset, config.split_offset];
    for dx in offsets {
        let id = state.alloc_id();
        let x = (origin.x + dx).min(hi).max(lo);
        let child = Virus::new(id, random_value(rng), x, origin.y, speed);
        state.viruses.push(child);
    }
}

/// Lower pollution by `amount`, floored at zero.
pub fn heal(state: &mut GameState, amount: u32) {
    state.pollution = state.pollution.saturating_sub(amount);
}

pub fn clear_all(state: &mut GameState) {
    state.viruses.clear();
    state.selection.clear();
}

/// `Clear*` actions for every timed effect whose expiry is at or before `now`.
pub fn expired(state: &GameState, now: Millis) -> Vec<Action> {
    let fx = &state.effects;
    let mut out = Vec::new();
    if fx.slow.is_some_and(|s| s.until <= now) {
        out.push(Action::ClearSlow);
    }
    if fx.speed_boost.is_some_and(|s| s.until <= now) {
        out.push(Action::ClearSpeedBoost);
    }
    if fx.freeze_until.is_some_and(|t| t <= now) {
        out.push(Action::ClearFreeze);
    }
    if fx.disturb_until.is_some_and(|t| t <= now) {
        out.push(Action::ClearDisturb);
    }
    if fx.magnet_until.is_some_and(|t| t <= now) {
        out.push(Action::ClearMagnet);
    }
    if fx.ghost.as_ref().is_some_and(|g| g.until <= now) {
        out.push(Action::ClearGhost);
    }
    out
}
