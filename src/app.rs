//! App: terminal init and the single cooperative loop (draw, input, tick, spawn, timers).

use crate::audio::{self, Bell, CuePlayer, Silent};
use crate::effects;
use crate::game::{self, Action, GameState, Millis};
use crate::highscores::{self, FileStore, RankedScore, RecordStore, SessionRecord, UserRecord};
use crate::input::{Intent, key_to_intent, mouse_to_intent};
use crate::theme::Theme;
use crate::ui;
use crate::virus::GameRng;
use crate::{Args, EngineConfig, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Longest step handed to the physics in one frame; a stalled terminal must not teleport tokens.
const MAX_STEP_MS: Millis = 100;
/// Rows shown on the game-over scoreboard and in the player's recent games.
const SCOREBOARD_ROWS: usize = 5;
const HISTORY_ROWS: usize = 5;

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    rng: GameRng,
    store: Box<dyn RecordStore>,
    user: Option<UserRecord>,
    scoreboard: Vec<RankedScore>,
    history: Vec<SessionRecord>,
    cues: Box<dyn CuePlayer>,
    session_start: Instant,
    last_tick: Millis,
    /// Running time accumulated towards the next spawn.
    spawn_timer: Millis,
    /// Board rect of the last layout, for mapping clicks.
    board: Rect,
    disturb_effect: Option<Effect>,
    disturb_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, engine: EngineConfig, theme: Theme) -> Result<Self> {
        let dir = args.data_dir.clone().unwrap_or_else(highscores::default_dir);
        let store = FileStore::new(dir);
        log::info!("player records in {}", store.dir().display());
        let store = Box::new(store);
        let cues: Box<dyn CuePlayer> = if config.mute {
            Box::new(Silent)
        } else {
            Box::new(Bell::new(std::io::stdout()))
        };
        Ok(Self::with_parts(args, config, engine, theme, store, cues))
    }

    fn with_parts(
        args: Args,
        config: GameConfig,
        engine: EngineConfig,
        theme: Theme,
        mut store: Box<dyn RecordStore>,
        cues: Box<dyn CuePlayer>,
    ) -> Self {
        let rng = match args.seed {
            Some(seed) => GameRng::seed_from_u64(seed),
            None => GameRng::from_entropy(),
        };
        let user = match store.find_or_create(&args.name, &args.organization) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("player record unavailable, scores will not be saved: {e}");
                None
            }
        };
        let mut app = Self {
            args,
            config,
            theme,
            state: GameState::new(engine),
            rng,
            store,
            user,
            scoreboard: Vec::new(),
            history: Vec::new(),
            cues,
            session_start: Instant::now(),
            last_tick: 0,
            spawn_timer: 0,
            board: Rect::default(),
            disturb_effect: None,
            disturb_process_time: None,
        };
        if let Some(best) = app.user.as_ref().map(|u| u.high_score) {
            app.dispatch(Action::SetHighScore(best));
        }
        app
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = game::reduce(state, action, &mut self.rng);
    }

    fn now_ms(&self) -> Millis {
        self.session_start.elapsed().as_millis() as Millis
    }

    /// Re-measure the board and tell the engine when the field changed.
    fn sync_field(&mut self, area: Rect) {
        self.board = ui::playfield_inner(area);
        let field = ui::field_for(self.board);
        if self.state.field != field {
            self.dispatch(Action::Resize {
                width: field.width,
                height: field.height,
            });
        }
    }

    /// Returns true when the player asked to quit.
    fn handle_intent(&mut self, intent: Intent) -> bool {
        let state = &self.state;
        match intent {
            Intent::Quit => return true,
            Intent::Start if !state.started => {
                self.spawn_timer = 0;
                self.dispatch(Action::StartGame);
            }
            Intent::TogglePause if state.started && !state.game_over && !state.round_complete => {
                let action = if state.paused {
                    Action::Resume
                } else {
                    Action::Pause
                };
                self.dispatch(action);
            }
            Intent::NextRound if state.round_complete && !state.game_over => {
                self.spawn_timer = 0;
                self.dispatch(Action::StartNextRound);
            }
            Intent::ClearSelection => self.dispatch(Action::ClearSelection),
            Intent::Restart if state.game_over => self.restart(),
            Intent::Tap { column, row } if state.is_running() => {
                if let Some(id) = ui::token_at(&state.viruses, self.board, column, row) {
                    let action = if state.selection.contains(&id) {
                        Action::DeselectToken(id)
                    } else {
                        Action::SelectToken(id)
                    };
                    self.dispatch(action);
                }
            }
            _ => {}
        }
        false
    }

    /// Fresh game with the best score and the field size carried over.
    fn restart(&mut self) {
        let best = self
            .user
            .as_ref()
            .map_or(0, |u| u.high_score)
            .max(self.state.high_score);
        let field = self.state.field;
        self.dispatch(Action::ResetGame);
        self.dispatch(Action::SetHighScore(best));
        self.dispatch(Action::Resize {
            width: field.width,
            height: field.height,
        });
        self.spawn_timer = 0;
        self.disturb_effect = None;
        self.disturb_process_time = None;
        self.dispatch(Action::StartGame);
    }

    /// Move the session clock to `now`: tick the board and, while it runs, fire the spawn
    /// interval, expired effects and the round-complete transition.
    fn advance_to(&mut self, now: Millis) {
        let elapsed = now.saturating_sub(self.last_tick).min(MAX_STEP_MS);
        self.last_tick = now;
        let running = self.state.is_running();
        self.dispatch(Action::Tick { now, elapsed });
        if !running || !self.state.is_running() {
            return;
        }

        self.spawn_timer += elapsed;
        if self.spawn_timer >= self.config.spawn_interval_ms {
            self.spawn_timer -= self.config.spawn_interval_ms;
            self.dispatch(Action::Spawn);
        }
        for action in effects::expired(&self.state, now) {
            self.dispatch(action);
        }
        if self.state.should_complete_round() {
            self.dispatch(Action::RoundComplete);
        }
    }

    /// Sounds and persistence implied by what changed since `before`.
    fn finish_frame(&mut self, before: &GameState) {
        for cue in audio::cues(before, &self.state) {
            self.cues.play(cue);
        }
        if self.state.game_over && !before.game_over {
            self.record_session();
            self.refresh_scoreboard();
        }
        if !self.state.effects.is_disturbed() {
            self.disturb_effect = None;
            self.disturb_process_time = None;
        }
    }

    fn record_session(&mut self) {
        let Some(report) = self.state.final_report() else {
            return;
        };
        let Some(user) = self.user.as_mut() else {
            return;
        };
        match self.store.update_high_score(user.id, report.score) {
            Ok(best) => user.high_score = best,
            Err(e) => log::warn!("could not save high score: {e}"),
        }
        let session = SessionRecord {
            user_id: user.id,
            score: report.score,
            round: report.round,
            pollution_count: report.pollution,
        };
        if let Err(e) = self.store.append_session(&session) {
            log::warn!("could not append session: {e}");
        }
    }

    fn refresh_scoreboard(&mut self) {
        match self.store.top_sessions(SCOREBOARD_ROWS) {
            Ok(rows) => self.scoreboard = rows,
            Err(e) => log::warn!("could not load scoreboard: {e}"),
        }
        let Some(user) = self.user.as_ref() else {
            return;
        };
        match self.store.user_history(user.id, HISTORY_ROWS) {
            Ok(history) => self.history = history,
            Err(e) => log::warn!("could not load game history: {e}"),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_budget = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        loop {
            let frame_start = Instant::now();
            let before = self.state.clone();

            let (cols, rows) = crossterm::terminal::size()?;
            self.sync_field(Rect::new(0, 0, cols, rows));

            let view = ui::View {
                state: &self.state,
                theme: &self.theme,
                player: &self.args.name,
                no_animation: self.config.no_animation,
                scoreboard: &self.scoreboard,
                history: &self.history,
            };
            terminal.draw(|f| {
                ui::draw(
                    f,
                    &view,
                    f.area(),
                    &mut self.disturb_effect,
                    &mut self.disturb_process_time,
                    frame_start,
                );
            })?;

            let timeout = frame_budget.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let intent = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => key_to_intent(key),
                        Event::Mouse(mouse) => mouse_to_intent(mouse),
                        _ => Intent::None,
                    };
                    if self.handle_intent(intent) {
                        return Ok(());
                    }
                }
            }

            let now = self.now_ms();
            self.advance_to(now);
            self.finish_frame(&before);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Cue;
    use crate::highscores::{StoreError, history_of, rank_sessions};
    use crate::virus::{Virus, VirusId};
    use clap::Parser;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct MemoryStore {
        users: Vec<UserRecord>,
        sessions: Rc<RefCell<Vec<SessionRecord>>>,
    }

    impl RecordStore for MemoryStore {
        fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
            Ok(self.users.iter().find(|u| u.name == name).cloned())
        }

        fn create_user(
            &mut self,
            name: &str,
            organization: &str,
        ) -> Result<UserRecord, StoreError> {
            let user = UserRecord {
                id: self.users.len() as u64 + 1,
                name: name.to_string(),
                organization: organization.to_string(),
                high_score: 0,
            };
            self.users.push(user.clone());
            Ok(user)
        }

        fn update_high_score(&mut self, user_id: u64, score: u64) -> Result<u64, StoreError> {
            let user = self.users.iter_mut().find(|u| u.id == user_id);
            Ok(user.map_or(score, |u| {
                u.high_score = u.high_score.max(score);
                u.high_score
            }))
        }

        fn append_session(&mut self, session: &SessionRecord) -> Result<(), StoreError> {
            self.sessions.borrow_mut().push(session.clone());
            Ok(())
        }

        fn top_sessions(&self, limit: usize) -> Result<Vec<RankedScore>, StoreError> {
            Ok(rank_sessions(&self.users, &self.sessions.borrow(), limit))
        }

        fn user_history(
            &self,
            user_id: u64,
            limit: usize,
        ) -> Result<Vec<SessionRecord>, StoreError> {
            Ok(history_of(&self.sessions.borrow(), user_id, limit))
        }
    }

    struct Recorder(Rc<RefCell<Vec<Cue>>>);

    impl CuePlayer for Recorder {
        fn play(&mut self, cue: Cue) {
            self.0.borrow_mut().push(cue);
        }
    }

    struct Harness {
        app: App,
        sessions: Rc<RefCell<Vec<SessionRecord>>>,
        cues: Rc<RefCell<Vec<Cue>>>,
    }

    fn harness(best: u64) -> Harness {
        let args = Args::parse_from(["virustap", "--seed", "7", "--name", "ada", "--mute"]);
        let config = GameConfig {
            spawn_interval_ms: 1500,
            frame_rate: 30.0,
            no_animation: true,
            mute: true,
        };
        let sessions = Rc::new(RefCell::new(Vec::new()));
        let cues = Rc::new(RefCell::new(Vec::new()));
        let store = MemoryStore {
            users: vec![UserRecord {
                id: 1,
                name: "ada".into(),
                organization: String::new(),
                high_score: best,
            }],
            sessions: Rc::clone(&sessions),
        };
        let mut app = App::with_parts(
            args,
            config,
            EngineConfig::default(),
            Theme::default(),
            Box::new(store),
            Box::new(Recorder(Rc::clone(&cues))),
        );
        app.sync_field(Rect::new(0, 0, 100, 40));
        Harness {
            app,
            sessions,
            cues,
        }
    }

    #[test]
    fn stored_best_is_injected_at_start() {
        let h = harness(420);
        assert_eq!(h.app.state.high_score, 420);
        assert_eq!(h.app.state.field, ui::field_for(ui::playfield_inner(Rect::new(0, 0, 100, 40))));
    }

    #[test]
    fn spawns_follow_the_interval_only_while_running() {
        let mut h = harness(0);
        let mut now = 0;
        for _ in 0..40 {
            now += 50;
            h.app.advance_to(now);
        }
        assert!(h.app.state.viruses.is_empty(), "nothing spawns before start");

        h.app.handle_intent(Intent::Start);
        for _ in 0..31 {
            now += 50;
            h.app.advance_to(now);
        }
        assert_eq!(h.app.state.spawned, 1);

        h.app.handle_intent(Intent::TogglePause);
        for _ in 0..60 {
            now += 50;
            h.app.advance_to(now);
        }
        assert_eq!(h.app.state.spawned, 1);
    }

    #[test]
    fn taps_toggle_selection() {
        let mut h = harness(0);
        h.app.handle_intent(Intent::Start);
        h.app
            .dispatch(Action::AddToken(Virus::new(VirusId(0), 3, 80.0, 32.0, 0.0)));
        let board = h.app.board;
        let tap = Intent::Tap {
            column: board.x + 11,
            row: board.y + 3,
        };
        h.app.handle_intent(tap);
        assert_eq!(h.app.state.selection, vec![VirusId(0)]);
        h.app.handle_intent(tap);
        assert!(h.app.state.selection.is_empty());
    }

    #[test]
    fn game_over_is_recorded_once_and_restart_keeps_best() {
        let mut h = harness(100);
        h.app.handle_intent(Intent::Start);
        h.app.dispatch(Action::AddScore(250));
        let before = h.app.state.clone();
        for _ in 0..5 {
            h.app.dispatch(Action::TokenReachedBottom);
        }
        h.app.finish_frame(&before);
        let again = h.app.state.clone();
        h.app.finish_frame(&again);

        let sessions = h.sessions.borrow();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].score, 250);
        assert_eq!(sessions[0].pollution_count, 5);
        drop(sessions);
        assert_eq!(h.app.user.as_ref().map(|u| u.high_score), Some(250));
        assert!(h.cues.borrow().contains(&Cue::Drop));

        let field = h.app.state.field;
        h.app.handle_intent(Intent::Restart);
        assert!(!h.app.state.game_over);
        assert!(h.app.state.started);
        assert_eq!(h.app.state.score, 0);
        assert_eq!(h.app.state.high_score, 250);
        assert_eq!(h.app.state.field, field);
    }

    #[test]
    fn game_over_loads_scoreboard_and_history() {
        let mut h = harness(0);
        h.sessions.borrow_mut().push(SessionRecord {
            user_id: 1,
            score: 500,
            round: 4,
            pollution_count: 5,
        });
        assert!(h.app.scoreboard.is_empty());

        h.app.handle_intent(Intent::Start);
        h.app.dispatch(Action::AddScore(90));
        let before = h.app.state.clone();
        h.app.dispatch(Action::GameOver);
        h.app.finish_frame(&before);

        let scores: Vec<u64> = h.app.scoreboard.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![500, 90]);
        assert!(h.app.scoreboard.iter().all(|r| r.name == "ada"));
        let recent: Vec<u64> = h.app.history.iter().map(|s| s.score).collect();
        assert_eq!(recent, vec![90, 500]);
    }

    #[test]
    fn completed_round_waits_for_next_round_key() {
        let mut h = harness(0);
        h.app.handle_intent(Intent::Start);
        h.app.state.spawned = h.app.state.spawn_quota;
        h.app.advance_to(16);
        assert!(h.app.state.round_complete);
        h.app.handle_intent(Intent::TogglePause);
        assert!(h.app.state.paused);
        h.app.handle_intent(Intent::NextRound);
        assert_eq!(h.app.state.round, 2);
        assert!(h.app.state.is_running());
    }

    #[test]
    fn quit_is_reported() {
        let mut h = harness(0);
        assert!(h.app.handle_intent(Intent::Quit));
        assert!(!h.app.handle_intent(Intent::None));
    }
}
