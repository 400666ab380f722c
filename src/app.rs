//! App: terminal init, main loop, key and mouse handling, save on exit.

use crate::game::{GameEvent, GameState, Phase};
use crate::input::{Action, Dir, Pointer, key_to_action, mouse_to_pointer};
use crate::save::{load_game, save_game, save_path};
use crate::theme::Theme;
use crate::ui::{View, cell_at};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, warn};

/// Redraw / poll interval, about 60 FPS.
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Shown by the game-over panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverInfo {
    pub final_score: u32,
    pub best_score: u32,
    pub new_best: bool,
}

pub struct App {
    args: Args,
    theme: Theme,
    state: GameState,
    screen: Screen,
    /// Board cell under the keyboard cursor.
    cursor: usize,
    /// Keyboard stroke in progress: cursor moves extend it.
    grabbing: bool,
    /// Cell where the left button went down.
    pointer_origin: Option<usize>,
    hint_visible: bool,
    game_over: Option<GameOverInfo>,
    /// Cells fading out after a clear.
    clearing: Vec<usize>,
    /// TachyonFX fade effect for cleared cells (created when the animation starts).
    clear_effect: Option<Effect>,
    /// Last time we processed the clear effect (for delta).
    clear_effect_process_time: Option<Instant>,
    save_path: Option<PathBuf>,
    /// Terminal area of the last frame, for mapping mouse positions to cells.
    last_area: Rect,
}

impl App {
    /// Load the save (unless `--no-save`) and set up the session.
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Self {
        let save_path = (!args.no_save).then(|| args.save_file.clone().unwrap_or_else(save_path));
        let data = save_path.as_deref().and_then(|p| match load_game(p) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %p.display(), error = %e, "could not read save");
                None
            }
        });
        let state = GameState::resume(&config, data.as_ref());
        let mut app = Self {
            args,
            theme,
            state,
            screen: Screen::Playing,
            cursor: 0,
            grabbing: false,
            pointer_origin: None,
            hint_visible: false,
            game_over: None,
            clearing: Vec::new(),
            clear_effect: None,
            clear_effect_process_time: None,
            save_path,
            last_area: Rect::default(),
        };
        app.process_events();
        app
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
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        self.save();
        result
    }

    fn save(&mut self) {
        let Some(path) = self.save_path.clone() else {
            return;
        };
        // An ended game is not worth resuming; keep only the record.
        if self.state.is_game_over() {
            self.state.restart_session();
        }
        match save_game(&path, &self.state.to_player_data()) {
            Ok(()) => info!(path = %path.display(), "game saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "could not write save"),
        }
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let view = View {
                cursor: self.cursor,
                hint_visible: self.hint_visible,
                game_over: self.game_over,
                clearing: &self.clearing,
                no_animation: self.args.no_animation,
            };
            let mut area = self.last_area;
            terminal.draw(|f| {
                area = f.area();
                crate::ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    &view,
                    &mut self.clear_effect,
                    &mut self.clear_effect_process_time,
                    now,
                );
            })?;
            self.last_area = area;

            if self.clear_effect.as_ref().is_some_and(Effect::done) {
                self.clearing.clear();
                self.clear_effect = None;
                self.clear_effect_process_time = None;
            }

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                let quit = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_action(key_to_action(key))
                    }
                    Event::Mouse(ev) => {
                        if let Some(p) = mouse_to_pointer(ev) {
                            self.handle_pointer(p);
                        }
                        false
                    }
                    _ => false,
                };
                self.process_events();
                if quit {
                    return Ok(());
                }
            }
        }
    }

    /// Apply a key action. Returns true when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        if action == Action::Quit {
            return true;
        }
        match self.screen {
            Screen::GameOver => {
                if action == Action::Restart {
                    self.restart();
                }
            }
            Screen::Playing => match action {
                Action::Move(dir) => {
                    self.move_cursor(dir);
                    if self.grabbing {
                        self.state.activate_cell(self.cursor);
                        self.grabbing = self.state.phase() == Phase::Placing;
                    }
                }
                Action::Grab => self.grab(),
                Action::Cancel => {
                    self.state.release_placement();
                    self.grabbing = false;
                }
                Action::Hammer => {
                    let on = self.state.apply_hammer();
                    self.grabbing = false;
                    debug!(on, "hammer toggled");
                }
                Action::Hint => self.hint_visible = !self.hint_visible,
                Action::Skip => {
                    self.state.apply_skip();
                    self.grabbing = false;
                }
                Action::Restart => self.restart(),
                Action::Quit | Action::None => {}
            },
        }
        false
    }

    /// Space / Enter: hammer strike, start a stroke, or let go of the current one.
    fn grab(&mut self) {
        if self.state.hammer_active() {
            self.state.release_at(self.cursor);
        } else if self.grabbing {
            // A release over a fixed cell is ignored and the stroke stays open.
            self.state.release_at(self.cursor);
            self.grabbing = self.state.phase() == Phase::Placing;
        } else {
            self.state.activate_cell(self.cursor);
            self.grabbing = self.state.phase() == Phase::Placing;
        }
    }

    fn move_cursor(&mut self, dir: Dir) {
        let grid = self.state.grid();
        let (row, col) = grid.row_col(self.cursor);
        let (row, col) = match dir {
            Dir::Up => (row.saturating_sub(1), col),
            Dir::Down => ((row + 1).min(grid.rows() - 1), col),
            Dir::Left => (row, col.saturating_sub(1)),
            Dir::Right => (row, (col + 1).min(grid.columns() - 1)),
        };
        if let Some(i) = grid.index_of(row, col) {
            self.cursor = i;
        }
    }

    fn handle_pointer(&mut self, pointer: Pointer) {
        if self.screen != Screen::Playing {
            return;
        }
        let (Pointer::Down(c, r) | Pointer::Enter(c, r) | Pointer::Up(c, r)) = pointer;
        let cell = cell_at(self.last_area, self.state.grid(), c, r);
        match pointer {
            Pointer::Down(..) => {
                self.pointer_origin = cell;
                if let Some(i) = cell {
                    self.cursor = i;
                    if !self.state.hammer_active() {
                        self.state.activate_cell(i);
                    }
                }
            }
            Pointer::Enter(..) => {
                if let Some(i) = cell {
                    self.cursor = i;
                    if self.state.phase() == Phase::Placing {
                        self.state.activate_cell(i);
                    }
                }
            }
            Pointer::Up(..) => {
                if let Some(i) = self.pointer_origin.take() {
                    self.state.release_at(i);
                }
            }
        }
        self.grabbing = false;
    }

    fn restart(&mut self) {
        self.state.restart_session();
        self.screen = Screen::Playing;
        self.game_over = None;
        self.grabbing = false;
        self.pointer_origin = None;
        self.clearing.clear();
        self.clear_effect = None;
        self.clear_effect_process_time = None;
    }

    /// React to what the engine queued.
    fn process_events(&mut self) {
        for ev in self.state.drain_events() {
            match ev {
                GameEvent::ScoreChanged(score) => debug!(score, "score"),
                GameEvent::CellsCleared(cells) => {
                    if !self.args.no_animation {
                        self.clearing.extend(cells);
                        // Restart the fade so it covers every cleared cell.
                        self.clear_effect = None;
                        self.clear_effect_process_time = None;
                    }
                }
                GameEvent::SequenceAdvanced => self.hint_visible = false,
                GameEvent::GameOver {
                    final_score,
                    best_score,
                    new_best,
                } => {
                    self.screen = Screen::GameOver;
                    self.grabbing = false;
                    self.game_over = Some(GameOverInfo {
                        final_score,
                        best_score,
                        new_best,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(extra: &[&str]) -> App {
        let args = Args::try_parse_from(
            ["cubelinetui", "--no-save", "--no-animation", "--seed", "5"]
                .into_iter()
                .chain(extra.iter().copied()),
        )
        .unwrap();
        let theme = Theme::default();
        let config = GameConfig::from_args(&args, &theme);
        App::new(args, config, theme)
    }

    #[test]
    fn cursor_stays_on_board() {
        let mut app = app(&[]);
        app.handle_action(Action::Move(Dir::Up));
        app.handle_action(Action::Move(Dir::Left));
        assert_eq!(app.cursor, 0);
        for _ in 0..10 {
            app.handle_action(Action::Move(Dir::Right));
            app.handle_action(Action::Move(Dir::Down));
        }
        assert_eq!(app.cursor, 24);
    }

    #[test]
    fn keyboard_stroke_places_whole_sequence() {
        // No group of four can clear, so every placed block stays.
        let mut app = app(&["--min-match", "5"]);
        let len = app.state.current().len();
        app.handle_action(Action::Grab);
        for _ in 1..len {
            app.handle_action(Action::Move(Dir::Right));
        }
        app.process_events();
        assert_eq!(app.state.grid().fixed_count(), len);
        assert!(!app.grabbing);
        assert_eq!(app.state.phase(), Phase::Idle);
    }

    #[test]
    fn cancel_clears_stroke() {
        let mut app = app(&[]);
        while app.state.current().len() < 2 {
            app.handle_action(Action::Skip);
        }
        app.handle_action(Action::Grab);
        assert!(app.grabbing);
        app.handle_action(Action::Cancel);
        assert!(!app.grabbing);
        assert_eq!(app.state.grid().active_count(), 0);
        assert_eq!(app.state.phase(), Phase::Idle);
    }

    #[test]
    fn letting_go_over_a_fixed_cell_keeps_the_stroke() {
        let mut app = app(&[]);
        app.state = {
            // cell 1 fixed; a three-block stroke starts at 0 and goes down
            let mut data = app.state.to_player_data();
            data.current_sequence_length = 3;
            data.current_sequence_colors = vec!["#E06C75FF".into(); 3];
            data.next_sequence_length = 1;
            data.next_sequence_colors = vec!["#61AFEFFF".into()];
            data.fixed_cell_indices = vec![1];
            data.fixed_cell_colors = vec!["#98C379FF".into()];
            let args = Args::try_parse_from(["cubelinetui", "--seed", "5"]).unwrap();
            let config = GameConfig::from_args(&args, &Theme::default());
            GameState::from_player_data(&config, &data).unwrap()
        };
        app.handle_action(Action::Grab);
        assert!(app.grabbing);
        app.cursor = 1;
        app.handle_action(Action::Grab);
        assert_eq!(app.state.phase(), Phase::Placing);
        assert!(app.grabbing);
        app.cursor = 0;
        app.handle_action(Action::Move(Dir::Down));
        assert_eq!(app.state.placing(), &[0, 5]);
    }

    #[test]
    fn hint_toggles_and_hides_on_advance() {
        let mut app = app(&[]);
        app.handle_action(Action::Hint);
        assert!(app.hint_visible);
        app.handle_action(Action::Skip);
        app.process_events();
        assert!(!app.hint_visible);
    }

    #[test]
    fn quit_and_game_over_restart() {
        let mut app = app(&["--columns", "1", "--rows", "1"]);
        assert!(app.handle_action(Action::Quit));
        // One cell: the first placement fills the board.
        while app.screen == Screen::Playing {
            app.handle_action(Action::Grab);
            app.process_events();
            if app.screen == Screen::Playing {
                app.handle_action(Action::Skip);
                app.process_events();
            }
        }
        assert!(app.game_over.is_some());
        app.handle_action(Action::Grab);
        assert_eq!(app.screen, Screen::GameOver);
        app.handle_action(Action::Restart);
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.game_over.is_none());
    }
}
