//! Layout and drawing: title, playfield with tokens and river, sidebar, overlays.

use crate::game::{GameState, Millis};
use crate::highscores::{RankedScore, SessionRecord};
use crate::physics::Field;
use crate::theme::{Theme, special_color};
use crate::virus::{Virus, VirusId};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Playfield units covered by one terminal column / row. A 48-unit token is 6×3 cells.
pub const UNITS_PER_COLUMN: f64 = 8.0;
pub const UNITS_PER_ROW: f64 = 16.0;

const TOKEN_COLS: i32 = 6;
const TOKEN_ROWS: i32 = 3;
const SIDEBAR_WIDTH: u16 = 26;
const RIVER_ROWS: u16 = 2;
/// One leg of the disturbance shimmer.
const DISTURB_FADE_MS: u32 = 350;

/// What the renderer needs besides the engine state.
pub struct View<'a> {
    pub state: &'a GameState,
    pub theme: &'a Theme,
    pub player: &'a str,
    pub no_animation: bool,
    /// Best sessions of all players, shown once the game is over.
    pub scoreboard: &'a [RankedScore],
    /// The player's latest games, newest first.
    pub history: &'a [SessionRecord],
}

fn split_main(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Board rect (inside the border, above the river) for a frame area; matches `draw`.
pub fn playfield_inner(area: Rect) -> Rect {
    let (outer, _) = split_main(area);
    let inner = Block::default().borders(Borders::ALL).inner(outer);
    Rect {
        height: inner.height.saturating_sub(RIVER_ROWS),
        ..inner
    }
}

/// Field size in units for a board rect.
pub fn field_for(board: Rect) -> Field {
    Field {
        width: f64::from(board.width) * UNITS_PER_COLUMN,
        height: f64::from(board.height) * UNITS_PER_ROW,
    }
}

fn token_origin(v: &Virus, board: Rect) -> (i32, i32) {
    let col = (v.x / UNITS_PER_COLUMN).floor() as i32 + i32::from(board.x);
    let row = (v.y / UNITS_PER_ROW).floor() as i32 + i32::from(board.y);
    (col, row)
}

/// Topmost token drawn under a terminal cell.
pub fn token_at(viruses: &[Virus], board: Rect, column: u16, row: u16) -> Option<VirusId> {
    if !board.contains(Position::new(column, row)) {
        return None;
    }
    let (c, r) = (i32::from(column), i32::from(row));
    viruses
        .iter()
        .rev()
        .find(|v| {
            let (x0, y0) = token_origin(v, board);
            (x0..x0 + TOKEN_COLS).contains(&c) && (y0..y0 + TOKEN_ROWS).contains(&r)
        })
        .map(|v| v.id)
}

/// Draw the current screen. While the disturbance is active and animations are on, the
/// obstruction band shimmers via a TachyonFX effect kept in `disturb_effect`.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    area: Rect,
    disturb_effect: &mut Option<Effect>,
    disturb_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let state = view.state;
    let (playfield_area, sidebar_area) = split_main(area);
    let board = draw_playfield(frame, view, playfield_area);
    draw_sidebar(frame, view, sidebar_area);

    if state.effects.is_disturbed() {
        let band = disturb_band(board);
        draw_obstruction(frame, view.theme, band);
        if !view.no_animation {
            apply_disturb_effect(
                frame,
                view.theme,
                band,
                disturb_effect,
                disturb_process_time,
                now,
            );
        }
    }

    if !state.started {
        draw_title(frame, view, area);
    } else if state.game_over {
        draw_game_over(frame, view, area);
    } else if state.round_complete {
        draw_round_complete(frame, view, area);
    } else if state.paused {
        draw_pause_overlay(frame, view.theme, area);
    }
}

fn draw_playfield(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let state = view.state;
    let theme = view.theme;
    let mut title = format!(" Virustap  | Round {} ", state.round);
    if state.effects.is_frozen() {
        title.push_str("| frozen ");
    }
    if state.effects.is_slowed() {
        title.push_str("| slow ");
    }
    if state.effects.is_speed_boosted() {
        title.push_str("| turbo ");
    }
    if state.effects.is_magnet_animating() {
        title.push_str("| lift ");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board = Rect {
        height: inner.height.saturating_sub(RIVER_ROWS),
        ..inner
    };
    let buf = frame.buffer_mut();
    for y in inner.y..inner.y + inner.height {
        for x in inner.x..inner.x + inner.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }

    let river = theme.river_color(state.pollution, state.config.max_pollution);
    for y in board.y + board.height..inner.y + inner.height {
        for x in inner.x..inner.x + inner.width {
            let wave = if (x + y) % 4 == 0 { "≈" } else { "~" };
            buf[(x, y)]
                .set_symbol(wave)
                .set_style(Style::default().fg(Color::White).bg(river));
        }
    }

    for v in &state.viruses {
        draw_token(frame, theme, board, v, state.effects.is_ghost(v.id));
    }
    board
}

fn token_symbol(v: &Virus, dx: i32, dy: i32) -> char {
    let sel = v.selected;
    match (dx, dy) {
        (2, 1) => char::from(b'0' + v.value.min(9)),
        (3, 1) => v.special.map_or(' ', |k| k.glyph()),
        (0, 0) if sel => '┌',
        (5, 0) if sel => '┐',
        (0, 2) if sel => '└',
        (5, 2) if sel => '┘',
        (_, 0 | 2) if sel => '─',
        (0 | 5, 1) if sel => '│',
        _ => ' ',
    }
}

fn draw_token(frame: &mut Frame, theme: &Theme, board: Rect, v: &Virus, ghost: bool) {
    let (x0, y0) = token_origin(v, board);
    let fill = if ghost {
        theme.inactive_fg
    } else {
        theme.virus_color(v.color_index())
    };
    let outline = v.special.map_or(theme.selected, special_color);
    let buf = frame.buffer_mut();
    for dy in 0..TOKEN_ROWS {
        for dx in 0..TOKEN_COLS {
            let (cx, cy) = (x0 + dx, y0 + dy);
            let (Ok(cx), Ok(cy)) = (u16::try_from(cx), u16::try_from(cy)) else {
                continue;
            };
            if !board.contains(Position::new(cx, cy)) {
                continue;
            }
            let symbol = token_symbol(v, dx, dy);
            let mut style = Style::default().bg(fill);
            style = match (dx, dy) {
                (2, 1) => style.fg(Color::White).add_modifier(Modifier::BOLD),
                (3, 1) => style.fg(outline).add_modifier(Modifier::BOLD),
                _ if v.selected => style.fg(theme.selected).add_modifier(Modifier::BOLD),
                _ => style.fg(outline),
            };
            if ghost {
                style = style.add_modifier(Modifier::DIM);
            }
            buf[(cx, cy)].set_char(symbol).set_style(style);
        }
    }
}

/// Middle third of the board, where the obstruction sits.
fn disturb_band(board: Rect) -> Rect {
    let h = (board.height / 3).max(1).min(board.height);
    Rect {
        x: board.x,
        y: board.y + (board.height - h) / 2,
        width: board.width,
        height: h,
    }
}

fn hatched(pos: Position) -> bool {
    (pos.x + pos.y * 2) % 3 != 0
}

fn draw_obstruction(frame: &mut Frame, theme: &Theme, band: Rect) {
    let colour = special_color(crate::virus::SuperKind::Disturb);
    let buf = frame.buffer_mut();
    for y in band.y..band.y + band.height {
        for x in band.x..band.x + band.width {
            if hatched(Position::new(x, y)) {
                buf[(x, y)]
                    .set_symbol("▓")
                    .set_style(Style::default().fg(colour).bg(theme.bg));
            }
        }
    }
}

/// Create or advance the disturbance shimmer (TachyonFX fade to and from the background).
fn apply_disturb_effect(
    frame: &mut Frame,
    theme: &Theme,
    band: Rect,
    effect: &mut Option<Effect>,
    process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *process_time = Some(now);

    if effect.is_none() {
        let filter = CellFilter::PositionFn(ref_count(|pos: Position| hatched(pos)));
        let bg = theme.bg;
        let fade = fx::fade_to(bg, bg, (DISTURB_FADE_MS, Interpolation::SineInOut));
        *effect = Some(
            fx::repeating(fx::ping_pong(fade))
                .with_filter(filter)
                .with_area(band),
        );
    }
    if let Some(effect) = effect {
        frame.render_effect(effect, band, TfxDuration::from_millis(delta_ms));
    }
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn remaining(until: Millis, now: Millis) -> String {
    format!("{:.1}s", until.saturating_sub(now) as f64 / 1000.0)
}

fn active_effects(state: &GameState) -> Vec<(&'static str, Millis)> {
    let fx = &state.effects;
    let mut out = Vec::new();
    if let Some(s) = fx.speed_boost {
        out.push(("Turbo", s.until));
    }
    if let Some(s) = fx.slow {
        out.push(("Slow", s.until));
    }
    if let Some(t) = fx.freeze_until {
        out.push(("Freeze", t));
    }
    if let Some(t) = fx.disturb_until {
        out.push(("Disturb", t));
    }
    if let Some(t) = fx.magnet_until {
        out.push(("Lift", t));
    }
    if let Some(g) = &fx.ghost {
        out.push(("Ghost", g.until));
    }
    out
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let state = view.state;
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats
            Constraint::Length(4), // Pollution
            Constraint::Length(4), // Combo + selection
            Constraint::Min(3),    // Effects
        ])
        .split(area);

    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };

    let stats_block = sidebar_block(theme);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stats = vec![
        stat("Player: ", view.player.to_string()),
        stat("Score: ", state.score.to_string()),
        stat("Best: ", state.high_score.max(state.score).to_string()),
        stat("Round: ", state.round.to_string()),
        stat(
            "Viruses: ",
            format!("{}/{}", state.spawned, state.spawn_quota),
        ),
        stat("On board: ", state.viruses.len().to_string()),
    ];
    Paragraph::new(Text::from(stats)).render(stats_inner, frame.buffer_mut());

    let river_block = sidebar_block(theme);
    let river_inner = river_block.inner(chunks[1]);
    river_block.render(chunks[1], frame.buffer_mut());
    let river_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(river_inner);
    Paragraph::new(Line::from(Span::styled("River", title_style)))
        .render(river_layout[0], frame.buffer_mut());
    let max = state.config.max_pollution.max(1);
    let ratio = (f64::from(state.pollution) / f64::from(max)).min(1.0);
    Gauge::default()
        .ratio(ratio)
        .label(format!("{}/{}", state.pollution, max))
        .gauge_style(Style::default().fg(theme.river_color(state.pollution, max)))
        .render(river_layout[1], frame.buffer_mut());

    let combo_block = sidebar_block(theme);
    let combo_inner = combo_block.inner(chunks[2]);
    combo_block.render(chunks[2], frame.buffer_mut());
    let combo_label = if state.combo > 0 {
        format!("x{}", state.combo)
    } else {
        "-".to_string()
    };
    let sum = state.selection_sum();
    let sum_style = if sum > 20 {
        Style::default().fg(Color::Red)
    } else {
        fg_style
    };
    let combo_lines = vec![
        stat("Combo: ", combo_label),
        Line::from(vec![
            Span::styled("Sum: ", title_style),
            Span::styled(sum.to_string(), sum_style),
        ]),
    ];
    Paragraph::new(Text::from(combo_lines)).render(combo_inner, frame.buffer_mut());

    let effects_block = sidebar_block(theme).title(Span::styled(" Effects ", title_style));
    let effects_inner = effects_block.inner(chunks[3]);
    effects_block.render(chunks[3], frame.buffer_mut());
    let lines: Vec<Line> = active_effects(state)
        .into_iter()
        .map(|(name, until)| stat("", format!("{name:<8}{}", remaining(until, state.now))))
        .collect();
    Paragraph::new(Text::from(lines)).render(effects_inner, frame.buffer_mut());
}

fn popup(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_box(frame: &mut Frame, theme: &Theme, rect: Rect, lines: Vec<Line>) {
    Clear.render(rect, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(rect, frame.buffer_mut());
}

fn draw_title(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                " Virus",
                Style::default()
                    .fg(theme.virus_color(0))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "tap ",
                Style::default().fg(theme.main_fg).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("Click viruses that add up to 10 or 20.", fg)),
        Line::from(Span::styled("Keep them out of the river.", fg)),
        Line::from(""),
        Line::from(Span::styled(
            format!("Best for {}: {}", view.player, view.state.high_score),
            Style::default().fg(theme.title),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Enter  Start    Q  Quit ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
    ];
    draw_box(frame, theme, popup(area, 44, 11), lines);
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P  Resume    Q  Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    draw_box(frame, theme, popup(area, 28, 6), lines);
}

fn draw_round_complete(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Round {} complete ", state.round),
            Style::default().fg(Color::Black).bg(Color::Green),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Score: {}", state.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " N  Next round    Q  Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    draw_box(frame, theme, popup(area, 32, 8), lines);
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("The river is poisoned.", fg)),
        Line::from(""),
    ];
    if let Some(report) = state.final_report() {
        lines.push(Line::from(Span::styled(format!("Score: {}", report.score), fg)));
        lines.push(Line::from(Span::styled(format!("Round: {}", report.round), fg)));
        lines.push(Line::from(Span::styled(
            format!("Pollution: {}/{}", report.pollution, state.config.max_pollution),
            fg,
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Best: {}", state.high_score),
        Style::default().fg(theme.title),
    )));
    if state.score > 0 && state.score >= state.high_score {
        lines.push(Line::from(Span::styled(
            "New high score!",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )));
    }
    let board_rows = scoreboard_lines(view);
    let extra = u16::try_from(board_rows.len()).unwrap_or(u16::MAX);
    lines.extend(board_rows);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" R  Restart    Q  Quit ", fg)));
    draw_box(frame, theme, popup(area, 44, 13u16.saturating_add(extra)), lines);
}

/// Clip `s` to `width` chars and pad it to that width.
fn fit(s: &str, width: usize) -> String {
    let clipped: String = s.chars().take(width).collect();
    format!("{clipped:<width$}")
}

/// Ranked table and recent games for the game-over box. Empty when nothing is recorded.
fn scoreboard_lines(view: &View) -> Vec<Line<'static>> {
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = Vec::new();
    if !view.scoreboard.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Top scores",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )));
        for (rank, row) in view.scoreboard.iter().enumerate() {
            let style = if row.name == view.player {
                Style::default().fg(theme.selected)
            } else {
                fg
            };
            let text = format!(
                "{:>2}. {} {} {:>7} r{:<2}",
                rank + 1,
                fit(&row.name, 12),
                fit(&row.organization, 12),
                row.score,
                row.round
            );
            lines.push(Line::from(Span::styled(text, style)));
        }
    }
    if !view.history.is_empty() {
        let recent: Vec<String> = view.history.iter().map(|s| s.score.to_string()).collect();
        lines.push(Line::from(Span::styled(
            format!("Your last games: {}", recent.join(", ")),
            Style::default().fg(theme.inactive_fg),
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn area() -> Rect {
        Rect::new(0, 0, 100, 40)
    }

    #[test]
    fn board_sits_inside_border_above_river() {
        let board = playfield_inner(area());
        assert_eq!(board, Rect::new(1, 1, 100 - SIDEBAR_WIDTH - 2, 38 - RIVER_ROWS));
        let field = field_for(board);
        assert_eq!(field.width, f64::from(board.width) * 8.0);
        assert_eq!(field.height, f64::from(board.height) * 16.0);
    }

    #[test]
    fn tap_hits_the_token_box() {
        let board = playfield_inner(area());
        let v = Virus::new(VirusId(3), 5, 80.0, 32.0, 0.01);
        // x 80 → column 10, y 32 → row 2, relative to the board origin
        let hit = token_at(&[v.clone()], board, board.x + 10, board.y + 2);
        assert_eq!(hit, Some(VirusId(3)));
        assert_eq!(token_at(&[v.clone()], board, board.x + 15, board.y + 4), Some(VirusId(3)));
        assert_eq!(token_at(&[v.clone()], board, board.x + 16, board.y + 2), None);
        assert_eq!(token_at(&[v], board, board.x + 9, board.y + 2), None);
    }

    #[test]
    fn tap_prefers_the_token_drawn_last() {
        let board = playfield_inner(area());
        let under = Virus::new(VirusId(1), 5, 80.0, 32.0, 0.01);
        let over = Virus::new(VirusId(2), 4, 96.0, 32.0, 0.01);
        assert_eq!(
            token_at(&[under, over], board, board.x + 13, board.y + 3),
            Some(VirusId(2))
        );
    }

    #[test]
    fn tokens_above_the_board_cannot_be_tapped_outside_it() {
        let board = playfield_inner(area());
        let v = Virus::new(VirusId(1), 5, 80.0, -50.0, 0.01);
        assert_eq!(token_at(&[v], board, board.x + 10, 0), None);
    }

    #[test]
    fn selected_token_has_a_frame() {
        let mut v = Virus::new(VirusId(1), 7, 0.0, 0.0, 0.01);
        assert_eq!(token_symbol(&v, 0, 0), ' ');
        assert_eq!(token_symbol(&v, 2, 1), '7');
        v.selected = true;
        assert_eq!(token_symbol(&v, 0, 0), '┌');
        assert_eq!(token_symbol(&v, 5, 1), '│');
    }

    #[test]
    fn draws_every_screen_without_panicking() {
        let theme = Theme::default();
        let mut state = GameState::new(EngineConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let mut effect = None;
        let mut process_time = None;
        state.viruses.push(Virus::new(VirusId(0), 5, 400.0, -40.0, 0.01));
        state.viruses.push(Virus::new(VirusId(1), 9, 10_000.0, 100.0, 0.01));
        for step in 0..4 {
            match step {
                1 => state.started = true,
                2 => {
                    state.effects.disturb_until = Some(1_000);
                    state.round_complete = true;
                    state.paused = true;
                }
                3 => state.game_over = true,
                _ => {}
            }
            let view = View {
                state: &state,
                theme: &theme,
                player: "ada",
                no_animation: false,
                scoreboard: &[],
                history: &[],
            };
            terminal
                .draw(|f| draw(f, &view, f.area(), &mut effect, &mut process_time, Instant::now()))
                .unwrap();
        }
        assert!(effect.is_some());
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn game_over_shows_the_ranked_scoreboard() {
        let theme = Theme::default();
        let mut state = GameState::new(EngineConfig::default());
        state.started = true;
        state.game_over = true;
        state.paused = true;
        let scoreboard = vec![
            RankedScore {
                name: "bob".into(),
                organization: "Babbage Ltd".into(),
                score: 640,
                round: 5,
            },
            RankedScore {
                name: "ada".into(),
                organization: "Analytical".into(),
                score: 210,
                round: 2,
            },
        ];
        let history = vec![SessionRecord {
            user_id: 1,
            score: 210,
            round: 2,
            pollution_count: 5,
        }];
        let view = View {
            state: &state,
            theme: &theme,
            player: "ada",
            no_animation: true,
            scoreboard: &scoreboard,
            history: &history,
        };
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|f| draw(f, &view, f.area(), &mut None, &mut None, Instant::now()))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Top scores"));
        assert!(text.contains(" 1. bob          Babbage Ltd      640 r5"));
        assert!(text.contains(" 2. ada"));
        assert!(text.contains("Your last games: 210"));
    }

    #[test]
    fn fit_clips_and_pads() {
        assert_eq!(fit("ada", 5), "ada  ");
        assert_eq!(fit("Analytical Engines", 5), "Analy");
    }
}
