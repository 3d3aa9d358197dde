//! Sound cues, derived by comparing consecutive snapshots of the game state.

use crate::game::GameState;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Tokens were destroyed.
    Match,
    /// Pollution went up.
    Drop,
    /// The disturbance obstruction switched on.
    Disturb,
}

/// Cues implied by the change from `before` to `after`. A reset is not a match.
pub fn cues(before: &GameState, after: &GameState) -> Vec<Cue> {
    let mut out = Vec::new();
    let reset = after.round < before.round || (before.started && !after.started);
    if reset {
        return out;
    }
    let dropped = after.pollution > before.pollution;
    let shrank = after.viruses.len() < before.viruses.len();
    if shrank && !dropped && after.round == before.round {
        out.push(Cue::Match);
    }
    if dropped {
        out.push(Cue::Drop);
    }
    if after.effects.is_disturbed() && !before.effects.is_disturbed() {
        out.push(Cue::Disturb);
    }
    out
}

pub trait CuePlayer {
    fn play(&mut self, cue: Cue);
}

/// Rings the terminal bell; distinct cues ring a different number of times.
pub struct Bell<W: Write> {
    out: W,
}

impl<W: Write> Bell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> CuePlayer for Bell<W> {
    fn play(&mut self, cue: Cue) {
        let rings = match cue {
            Cue::Match => 1,
            Cue::Drop => 2,
            Cue::Disturb => 3,
        };
        let bells = "\x07".repeat(rings);
        if let Err(e) = self.out.write_all(bells.as_bytes()).and_then(|()| self.out.flush()) {
            log::debug!("bell failed: {e}");
        }
    }
}

pub struct Silent;

impl CuePlayer for Silent {
    fn play(&mut self, _cue: Cue) {}
}
