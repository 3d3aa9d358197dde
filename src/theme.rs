//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.
//! Also owns the per-value virus colours and the river's pollution tint.

use crate::virus::SuperKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Token colours indexed by `value - 1`.
const VIRUS_COLORS: [Color; 9] = [
    rgb(0xDC2626),
    rgb(0x16A34A),
    rgb(0x2563EB),
    rgb(0xEA580C),
    rgb(0x7C3AED),
    rgb(0xCA8A04),
    rgb(0xDB2777),
    rgb(0x0891B2),
    rgb(0x6B7280),
];

const HIGH_CONTRAST: [Color; 9] = [
    rgb(0xFF0000),
    rgb(0x00FF00),
    rgb(0x0088FF),
    rgb(0xFF8800),
    rgb(0xFF00FF),
    rgb(0xFFFF00),
    rgb(0xFF66CC),
    rgb(0x00FFFF),
    rgb(0xFFFFFF),
];

/// Tol bright/vibrant mix; no red-green pair carries meaning on its own.
const COLORBLIND: [Color; 9] = [
    rgb(0x0077BB),
    rgb(0xEE7733),
    rgb(0x009988),
    rgb(0xCC3311),
    rgb(0xEE3377),
    rgb(0xBBBB00),
    rgb(0x33BBEE),
    rgb(0xAA3377),
    rgb(0xBBBBBB),
];

const CLEAN_RIVER: (u8, u8, u8) = (0x4A, 0x90, 0xE2);
const POISONED_RIVER: (u8, u8, u8) = (0x22, 0x8B, 0x22);

/// One Dark UI colours plus the token palette.
#[derive(Debug, Clone)]
pub struct Theme {
    pub virus: [Color; 9],
    /// Playfield background.
    pub bg: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, round).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text and ghosted tokens.
    pub inactive_fg: Color,
    /// Selection outline.
    pub selected: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark UI colours, exact hex values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            virus: VIRUS_COLORS,
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
            selected: rgb(0xFFFFFF),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Swap the token colours for high-contrast or colorblind variants.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.virus = HIGH_CONTRAST;
                self.selected = rgb(0xFFFF00);
            }
            crate::Palette::Colorblind => self.virus = COLORBLIND,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let base = Self::onedark_default();
        Self {
            virus: base.virus,
            bg: get("meter_bg").unwrap_or(base.bg),
            div_line: get("div_line").unwrap_or(base.div_line),
            main_fg: get("main_fg").unwrap_or(base.main_fg),
            title: get("title").unwrap_or(base.title),
            inactive_fg: get("inactive_fg").unwrap_or(base.inactive_fg),
            selected: get("selected_fg").unwrap_or(base.selected),
        }
    }

    /// Colour for a token with the given palette index (`value - 1`).
    #[inline]
    pub fn virus_color(&self, index: u8) -> Color {
        self.virus[(index as usize) % 9]
    }

    /// River tint: clean blue at zero pollution, green at the limit.
    pub fn river_color(&self, pollution: u32, max: u32) -> Color {
        let t = if max == 0 {
            1.0
        } else {
            (f64::from(pollution) / f64::from(max)).clamp(0.0, 1.0)
        };
        let lerp = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Color::Rgb(
            lerp(CLEAN_RIVER.0, POISONED_RIVER.0),
            lerp(CLEAN_RIVER.1, POISONED_RIVER.1),
            lerp(CLEAN_RIVER.2, POISONED_RIVER.2),
        )
    }
}

/// Accent for a special kind: outline and glyph colour.
pub fn special_color(kind: SuperKind) -> Color {
    match kind {
        SuperKind::SpeedBoost => rgb(0xFFD700),
        SuperKind::AreaClear => rgb(0xFF4500),
        SuperKind::Slow => rgb(0x00BFFF),
        SuperKind::Lift => rgb(0x8B4513),
        SuperKind::Ghost => rgb(0xDDA0DD),
        SuperKind::Split => rgb(0xFF69B4),
        SuperKind::TimeFreeze => rgb(0x9370DB),
        SuperKind::Heal => rgb(0x32CD32),
        SuperKind::ClearAll => rgb(0xFFFFFF),
        SuperKind::Disturb => rgb(0xFF0000),
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
