//! Falling tokens: identity, value, position and the catalog of special kinds.

use crate::EngineConfig;
use rand::Rng;
use std::fmt;

/// Every random choice the engine makes is drawn from an injected instance of this.
pub type GameRng = rand::rngs::StdRng;

/// Per-session token id, assigned monotonically. Displayed as `virus-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirusId(pub u64);

impl fmt::Display for VirusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "virus-{}", self.0)
    }
}

/// Special ("super") token kinds. Each one fires its effect when it is part of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuperKind {
    SpeedBoost,
    AreaClear,
    Slow,
    Lift,
    Ghost,
    Split,
    TimeFreeze,
    Heal,
    ClearAll,
    Disturb,
}

impl SuperKind {
    pub const ALL: [Self; 10] = [
        Self::SpeedBoost,
        Self::AreaClear,
        Self::Slow,
        Self::Lift,
        Self::Ghost,
        Self::Split,
        Self::TimeFreeze,
        Self::Heal,
        Self::ClearAll,
        Self::Disturb,
    ];

    /// 1..=10, higher is rarer.
    pub fn rarity(self) -> u32 {
        match self {
            Self::SpeedBoost => 3,
            Self::AreaClear => 5,
            Self::Slow => 6,
            Self::Lift => 4,
            Self::Ghost => 7,
            Self::Split => 8,
            Self::TimeFreeze => 9,
            Self::Heal => 6,
            Self::ClearAll => 10,
            Self::Disturb => 8,
        }
    }

    /// Spawn weight: rarity 10 weighs 1, rarity 1 weighs 10.
    pub fn weight(self) -> u32 {
        11 - self.rarity()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SpeedBoost => "Turbo",
            Self::AreaClear => "Bomb",
            Self::Slow => "Ice",
            Self::Lift => "Magnet",
            Self::Ghost => "Ghost",
            Self::Split => "Split",
            Self::TimeFreeze => "Time",
            Self::Heal => "Heal",
            Self::ClearAll => "Clear",
            Self::Disturb => "Jammer",
        }
    }

    /// Single-cell marker drawn next to the value.
    pub fn glyph(self) -> char {
        match self {
            Self::SpeedBoost => '»',
            Self::AreaClear => '*',
            Self::Slow => '~',
            Self::Lift => '^',
            Self::Ghost => '?',
            Self::Split => '%',
            Self::TimeFreeze => '#',
            Self::Heal => '+',
            Self::ClearAll => '!',
            Self::Disturb => 'x',
        }
    }

    /// Weighted choice over all kinds. Always returns one of them.
    pub fn choose(rng: &mut GameRng) -> Self {
        let total: u32 = Self::ALL.iter().map(|k| k.weight()).sum();
        let mut roll = rng.gen_range(0..total);
        for kind in Self::ALL {
            let w = kind.weight();
            if roll < w {
                return kind;
            }
            roll -= w;
        }
        Self::ALL[Self::ALL.len() - 1]
    }
}

/// A falling numbered token.
#[derive(Debug, Clone, PartialEq)]
pub struct Virus {
    pub id: VirusId,
    /// 1..=9; fixed for the token's lifetime.
    pub value: u8,
    pub x: f64,
    pub y: f64,
    /// Units per millisecond.
    pub speed: f64,
    pub selected: bool,
    pub special: Option<SuperKind>,
}

impl Virus {
    pub fn new(id: VirusId, value: u8, x: f64, y: f64, speed: f64) -> Self {
        Self {
            id,
            value,
            x,
            y,
            speed,
            selected: false,
            special: None,
        }
    }

    pub fn with_special(mut self, kind: SuperKind) -> Self {
        self.special = Some(kind);
        self
    }

    pub fn is_special(&self) -> bool {
        self.special.is_some()
    }

    /// Palette slot 0..9 derived from the value.
    pub fn color_index(&self) -> u8 {
        self.value.saturating_sub(1) % 9
    }

    /// Lower edge of the token.
    pub fn bottom(&self, size: f64) -> f64 {
        self.y + size
    }
}

pub fn random_value(rng: &mut GameRng) -> u8 {
    rng.gen_range(1..=9)
}

/// Build a fresh token at the spawn line. Rolls the special chance and, on success, the kind.
pub fn spawn_virus(
    id: VirusId,
    x: f64,
    speed: f64,
    config: &EngineConfig,
    rng: &mut GameRng,
) -> Virus {
    let value = random_value(rng);
    let virus = Virus::new(id, value, x, config.spawn_y, speed);
    if rng.gen_bool(config.special_chance.clamp(0.0, 1.0)) {
        virus.with_special(SuperKind::choose(rng))
    } else {
        virus
    }
}
