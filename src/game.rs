//! Session state: the board, round progression, pollution, scoring and timed effects.
//!
//! All mutation goes through [`reduce`] (or [`GameState::apply`]). Every action is total:
//! references to tokens that are gone are no-ops, and once the game is over only
//! [`Action::ResetGame`], [`Action::SetHighScore`] and [`Action::Resize`] are accepted.

use crate::EngineConfig;
use crate::effects::{self, ActiveEffects};
use crate::matching::{self, SelectOutcome};
use crate::physics::{self, Field};
use crate::placement;
use crate::virus::{self, GameRng, Virus, VirusId};

/// Session time in milliseconds, as reported by the driver.
pub type Millis = u64;

/// Everything the driver (or a test) can ask the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartGame,
    /// Viewport measurement in playfield units.
    Resize { width: f64, height: f64 },
    /// Advance the board by `elapsed` ms; `now` is the session clock.
    Tick { now: Millis, elapsed: Millis },
    /// Create one token at the spawn line, placed clear of the near-top tokens.
    Spawn,
    SelectToken(VirusId),
    DeselectToken(VirusId),
    ClearSelection,
    AddToken(Virus),
    RemoveToken(VirusId),
    ReplaceTokens(Vec<Virus>),
    AddScore(u64),
    RoundComplete,
    StartNextRound,
    TokenReachedBottom,
    GameOver,
    Pause,
    Resume,
    ResetCombo,
    SetHighScore(u64),
    ResetGame,
    Explode(VirusId),
    Slow { duration: Millis, factor: f64 },
    FreezeTime { duration: Millis },
    Heal { amount: u32 },
    Split(VirusId),
    ClearAll,
    Disturb { duration: Millis },
    SpeedBoost { duration: Millis, factor: f64 },
    MagnetLift { offset: f64, duration: Millis },
    GhostTransparency { ids: Vec<VirusId>, duration: Millis },
    ClearSlow,
    ClearFreeze,
    ClearDisturb,
    ClearSpeedBoost,
    ClearMagnet,
    ClearGhost,
}

/// Facts reported to the persistence side once the game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub score: u64,
    pub round: u32,
    pub pollution: u32,
}

/// Spawn quota for `round` (1-based): `base_quota × quota_growth^(round - 1)`, rounded.
pub fn spawn_quota(round: u32, config: &EngineConfig) -> u32 {
    let exp = i32::try_from(round.saturating_sub(1)).unwrap_or(i32::MAX);
    (f64::from(config.base_quota) * config.quota_growth.powi(exp)).round() as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub config: EngineConfig,
    pub field: Field,
    /// Last session time seen through [`Action::Tick`].
    pub now: Millis,
    pub viruses: Vec<Virus>,
    /// Selected token ids, in selection order.
    pub selection: Vec<VirusId>,
    pub next_id: u64,
    pub score: u64,
    pub high_score: u64,
    pub round: u32,
    /// Baseline fall speed (units/ms) for tokens spawned this round.
    pub fall_speed: f64,
    pub spawn_quota: u32,
    pub spawned: u32,
    pub pollution: u32,
    pub combo: u32,
    pub started: bool,
    pub paused: bool,
    pub game_over: bool,
    pub round_complete: bool,
    pub effects: ActiveEffects,
}

impl GameState {
    pub fn new(config: EngineConfig) -> Self {
        let spawn_quota = spawn_quota(1, &config);
        let fall_speed = config.base_fall_speed;
        Self {
            config,
            field: Field::default(),
            now: 0,
            viruses: Vec::new(),
            selection: Vec::new(),
            next_id: 0,
            score: 0,
            high_score: 0,
            round: 1,
            fall_speed,
            spawn_quota,
            spawned: 0,
            pollution: 0,
            combo: 0,
            started: false,
            paused: false,
            game_over: false,
            round_complete: false,
            effects: ActiveEffects::default(),
        }
    }

    /// Started and not paused, complete or over: the only state in which the board moves.
    pub fn is_running(&self) -> bool {
        self.started && !self.paused && !self.game_over && !self.round_complete
    }

    /// The derived round-complete transition the driver polls for.
    pub fn should_complete_round(&self) -> bool {
        self.spawned >= self.spawn_quota && !self.game_over && !self.paused && !self.round_complete
    }

    pub fn final_report(&self) -> Option<SessionReport> {
        self.game_over.then_some(SessionReport {
            score: self.score,
            round: self.round,
            pollution: self.pollution,
        })
    }

    pub fn selection_sum(&self) -> u32 {
        matching::selection_sum(&self.viruses, &self.selection)
    }

    pub fn virus(&self, id: VirusId) -> Option<&Virus> {
        self.viruses.iter().find(|v| v.id == id)
    }

    pub fn alloc_id(&mut self) -> VirusId {
        let id = VirusId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Drop tokens from the board and from the selection.
    pub fn remove_tokens(&mut self, ids: &[VirusId]) {
        self.viruses.retain(|v| !ids.contains(&v.id));
        self.selection.retain(|s| !ids.contains(s));
    }

    pub fn apply(&mut self, action: Action, rng: &mut GameRng) {
        if self.game_over
            && !matches!(
                action,
                Action::ResetGame | Action::SetHighScore(_) | Action::Resize { .. }
            )
        {
            return;
        }

        match action {
            Action::StartGame => self.started = true,
            Action::Resize { width, height } => self.field = Field { width, height },
            Action::Tick { now, elapsed } => self.tick(now, elapsed),
            Action::Spawn => self.spawn(rng),
            Action::SelectToken(id) => self.select(id, rng),
            Action::DeselectToken(id) => {
                matching::deselect(&mut self.viruses, &mut self.selection, id);
            }
            Action::ClearSelection => {
                matching::clear_selection(&mut self.viruses, &mut self.selection);
            }
            Action::AddToken(virus) => self.add_token(virus),
            Action::RemoveToken(id) => self.remove_tokens(&[id]),
            Action::ReplaceTokens(viruses) => self.replace_tokens(viruses),
            Action::AddScore(points) => self.score = self.score.saturating_add(points),
            Action::RoundComplete => {
                log::info!("round {} complete, score {}", self.round, self.score);
                self.round_complete = true;
                self.paused = true;
            }
            Action::StartNextRound => self.start_next_round(),
            Action::TokenReachedBottom => self.pollute(1),
            Action::GameOver => self.end_game(),
            Action::Pause => self.paused = true,
            Action::Resume => {
                if !self.round_complete {
                    self.paused = false;
                }
            }
            Action::ResetCombo => self.combo = 0,
            Action::SetHighScore(value) => self.high_score = self.high_score.max(value),
            Action::ResetGame => *self = Self::new(self.config.clone()),
            Action::Explode(id) => {
                if self.virus(id).is_some() {
                    effects::explode(self, id, rng);
                }
            }
            Action::Slow { duration, factor } => effects::slow(self, duration, factor),
            Action::FreezeTime { duration } => effects::freeze(self, duration),
            Action::Heal { amount } => effects::heal(self, amount),
            Action::Split(id) => {
                if let Some(origin) = self.virus(id).cloned() {
                    self.remove_tokens(&[id]);
                    effects::split(self, &origin, rng);
                }
            }
            Action::ClearAll => effects::clear_all(self),
            Action::Disturb { duration } => effects::disturb(self, duration),
            Action::SpeedBoost { duration, factor } => effects::speed_boost(self, duration, factor),
            Action::MagnetLift { offset, duration } => effects::lift(self, offset, duration),
            Action::GhostTransparency { ids, duration } => effects::ghost(self, &ids, duration),
            Action::ClearSlow => self.effects.slow = None,
            Action::ClearFreeze => self.effects.freeze_until = None,
            Action::ClearDisturb => self.effects.disturb_until = None,
            Action::ClearSpeedBoost => self.effects.speed_boost = None,
            Action::ClearMagnet => self.effects.magnet_until = None,
            Action::ClearGhost => self.effects.ghost = None,
        }
    }

    fn tick(&mut self, now: Millis, elapsed: Millis) {
        self.now = self.now.max(now);
        if !self.is_running() {
            return;
        }
        let outcome = physics::step(
            &self.viruses,
            elapsed as f64,
            self.effects.modifiers(),
            self.field,
            &self.config,
        );
        self.viruses = outcome.viruses;
        if !outcome.reached_bottom.is_empty() {
            self.selection.retain(|s| !outcome.reached_bottom.contains(s));
            self.pollute(outcome.reached_bottom.len() as u32);
        }
    }

    fn spawn(&mut self, rng: &mut GameRng) {
        if !self.is_running() || self.spawned >= self.spawn_quota {
            return;
        }
        let width = self.field.width;
        let candidate = placement::random_x(width, &self.config, rng);
        let x = placement::place(candidate, &self.viruses, width, &self.config, rng);
        let id = self.alloc_id();
        let virus = virus::spawn_virus(id, x, self.fall_speed, &self.config, rng);
        log::debug!(
            "spawn {} value {} at x {:.1}{}",
            virus.id,
            virus.value,
            virus.x,
            virus.special.map(|k| format!(" ({})", k.name())).unwrap_or_default()
        );
        self.add_token(virus);
    }

    fn add_token(&mut self, mut virus: Virus) {
        if self.virus(virus.id).is_some() {
            return;
        }
        self.next_id = self.next_id.max(virus.id.0.saturating_add(1));
        virus.selected = false;
        self.viruses.push(virus);
        self.spawned = self.spawned.saturating_add(1);
    }

    fn replace_tokens(&mut self, viruses: Vec<Virus>) {
        self.viruses = viruses;
        let on_board: Vec<VirusId> = self.viruses.iter().map(|v| v.id).collect();
        self.selection.retain(|s| on_board.contains(s));
        self.selection.dedup();
        for v in &mut self.viruses {
            v.selected = self.selection.contains(&v.id);
        }
        if let Some(max) = on_board.iter().map(|id| id.0).max() {
            self.next_id = self.next_id.max(max.saturating_add(1));
        }
    }

    fn select(&mut self, id: VirusId, rng: &mut GameRng) {
        if self.effects.is_ghost(id) {
            return;
        }
        let outcome = matching::select(
            &mut self.viruses,
            &mut self.selection,
            id,
            self.combo,
            &self.config,
        );
        match outcome {
            SelectOutcome::Ignored => {}
            SelectOutcome::Pending { .. } => self.combo = 0,
            SelectOutcome::Matched(matched) => {
                log::debug!(
                    "match of {} tokens for {} points at combo {}",
                    matched.removed.len(),
                    matched.points,
                    self.combo
                );
                self.score = self.score.saturating_add(matched.points);
                self.combo = self.combo.saturating_add(1);
                if let Some(trigger) = matched.trigger {
                    effects::resolve(self, &trigger, rng);
                }
            }
        }
    }

    fn start_next_round(&mut self) {
        self.round = self.round.saturating_add(1);
        self.spawned = 0;
        self.spawn_quota = spawn_quota(self.round, &self.config);
        self.pollution = 0;
        self.fall_speed *= self.config.speed_growth;
        self.round_complete = false;
        self.paused = false;
        self.combo = 0;
        matching::clear_selection(&mut self.viruses, &mut self.selection);
        log::info!(
            "round {} starts: quota {}, fall speed {:.4}",
            self.round,
            self.spawn_quota,
            self.fall_speed
        );
    }

    /// One increment per token that reached the river, saturating at the maximum.
    fn pollute(&mut self, count: u32) {
        let max = self.config.max_pollution;
        self.pollution = self.pollution.saturating_add(count).min(max);
        if self.pollution >= max {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        if !self.game_over {
            log::info!("game over: score {} in round {}", self.score, self.round);
        }
        self.game_over = true;
        self.paused = true;
        self.high_score = self.high_score.max(self.score);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// The transition function: consume a state and an action, return the next state.
pub fn reduce(state: GameState, action: Action, rng: &mut GameRng) -> GameState {
    let mut next = state;
    next.apply(action, rng);
    next
}
