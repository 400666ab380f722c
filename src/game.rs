//! Game state: board, current/next sequences, placement, matching, power-ups, score.

use crate::GameConfig;
use crate::grid::Grid;
use crate::region::{match_regions, sequence_fits};
use crate::save::{PlayerData, SaveError};
use crate::sequence::{Sequence, SequenceGenerator};
use tracing::{debug, info, warn};

/// Where the session is in the place → resolve cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Current sequence untouched; waiting for the first cell.
    Idle,
    /// Some, but not all, blocks of the current sequence are on the board.
    Placing,
    /// Fixing the placed cells, clearing matches and rotating sequences.
    Resolving,
    /// No empty region can take the current sequence. Only a restart leaves this state.
    GameOver,
}

/// Things the front end reacts to. Queued by the engine, drained with [`GameState::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged(u32),
    CellsCleared(Vec<usize>),
    /// `next` became `current` and a new `next` was drawn.
    SequenceAdvanced,
    /// `best_score` is the record before this game; `new_best` when it was beaten.
    GameOver {
        final_score: u32,
        best_score: u32,
        new_best: bool,
    },
}

#[derive(Debug)]
pub struct GameState {
    grid: Grid,
    current: Sequence,
    next: Sequence,
    generator: SequenceGenerator,
    min_match: usize,
    points_per_cell: u32,
    score: u32,
    best_score: u32,
    phase: Phase,
    hammer_active: bool,
    /// Cells of the placement in progress, in activation order.
    placing: Vec<usize>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh session: empty board, two new sequences.
    pub fn new(config: &GameConfig) -> Self {
        let mut state = Self::empty(config);
        state.start_session();
        state
    }

    fn empty(config: &GameConfig) -> Self {
        Self {
            grid: Grid::new(config.columns, config.rows),
            current: Sequence::default(),
            next: Sequence::default(),
            generator: SequenceGenerator::new(
                config.palette.clone(),
                config.one_or_four_chance,
                config.seed,
            ),
            min_match: config.min_match,
            points_per_cell: config.points_per_cell,
            score: 0,
            best_score: 0,
            phase: Phase::Idle,
            hammer_active: false,
            placing: Vec::with_capacity(crate::sequence::MAX_SEQUENCE_LEN),
            events: Vec::new(),
        }
    }

    /// Rebuild a session from a save.
    ///
    /// A save without fixed cells starts a fresh board but keeps the best score. The
    /// feasibility check runs once after loading, since the game may have been closed on a
    /// board that no longer fits the current sequence.
    pub fn from_player_data(config: &GameConfig, data: &PlayerData) -> Result<Self, SaveError> {
        let snap = data.decode(config.columns * config.rows)?;
        let mut state = Self::empty(config);
        state.best_score = snap.best_score;
        if snap.fixed.is_empty() {
            state.start_session();
            return Ok(state);
        }
        for (index, color) in snap.fixed {
            state
                .grid
                .fix(index, color)
                .map_err(|e| SaveError::Corrupt(e.to_string()))?;
        }
        state.score = snap.current_score;
        state.current = snap.current;
        state.next = snap.next;
        info!(
            score = state.score,
            fixed = state.grid.fixed_count(),
            "session restored"
        );
        state.check_feasibility();
        Ok(state)
    }

    /// Restore from an optional save, starting fresh when there is none or it is corrupt.
    pub fn resume(config: &GameConfig, data: Option<&PlayerData>) -> Self {
        let Some(data) = data else {
            return Self::new(config);
        };
        match Self::from_player_data(config, data) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "discarding save, starting a new game");
                let mut state = Self::new(config);
                state.best_score = data.best_score.trim().parse().unwrap_or(0);
                state
            }
        }
    }

    pub fn to_player_data(&self) -> PlayerData {
        let fixed = self.grid.fixed_indices();
        PlayerData {
            best_score: self.best_score.to_string(),
            current_score: self.score.to_string(),
            current_sequence_length: self.current.len(),
            next_sequence_length: self.next.len(),
            current_sequence_colors: self.current.colors().map(|c| c.to_string()).collect(),
            next_sequence_colors: self.next.colors().map(|c| c.to_string()).collect(),
            fixed_cell_colors: fixed
                .iter()
                .map(|&i| self.grid.cells()[i].color.to_string())
                .collect(),
            fixed_cell_indices: fixed,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current(&self) -> &Sequence {
        &self.current
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn hammer_active(&self) -> bool {
        self.hammer_active
    }

    /// Cells placed so far in the current stroke.
    pub fn placing(&self) -> &[usize] {
        &self.placing
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn start_session(&mut self) {
        self.grid.reset_all();
        self.current = Sequence::default();
        self.next = Sequence::default();
        self.placing.clear();
        self.hammer_active = false;
        self.score = 0;
        self.phase = Phase::Idle;
        self.events.push(GameEvent::ScoreChanged(0));
        self.generate_next_sequences(2);
        info!(
            columns = self.grid.columns(),
            rows = self.grid.rows(),
            "new session"
        );
    }

    pub fn restart_session(&mut self) {
        self.start_session();
    }

    /// Put a block of the current sequence on `index`.
    ///
    /// Legal when the cell is empty and it is either the first block (hammer off) or adjacent
    /// to the previous one. Placing the last block commits the stroke. Returns whether the
    /// cell was taken; illegal attempts change nothing. An index off the board is a caller
    /// bug: it asserts in debug builds and is logged and ignored in release builds.
    pub fn activate_cell(&mut self, index: usize) -> bool {
        if !matches!(self.phase, Phase::Idle | Phase::Placing) {
            return false;
        }
        let cell = match self.grid.cell(index) {
            Ok(c) => c,
            Err(e) => {
                debug_assert!(index < self.grid.len(), "{e}");
                warn!(error = %e, "activation ignored");
                return false;
            }
        };
        if !cell.is_empty() {
            return false;
        }
        let placed = self.placing.len();
        let Some(color) = self.current.color_at(placed) else {
            return false;
        };
        match self.placing.last() {
            None if self.hammer_active => return false,
            Some(&last) if !self.grid.are_adjacent(last, index) => return false,
            _ => {}
        }

        if let Ok(cell) = self.grid.cell_mut(index) {
            cell.color = color;
            cell.is_active = true;
        }
        self.placing.push(index);
        self.phase = Phase::Placing;

        if self.placing.len() == self.current.len() {
            self.resolve();
        }
        true
    }

    /// Abandon an unfinished stroke: every placed cell goes back to empty.
    pub fn release_placement(&mut self) {
        if self.phase != Phase::Placing {
            return;
        }
        debug!(cells = ?self.placing, "placement cancelled");
        for &i in &self.placing {
            let _ = self.grid.reset(i);
        }
        self.placing.clear();
        self.phase = Phase::Idle;
    }

    /// Pointer released on `index`: a hammer strike on a marked fixed cell, otherwise the
    /// end of a stroke. Off-board indices are treated as in [`Self::activate_cell`].
    pub fn release_at(&mut self, index: usize) {
        if self.phase == Phase::GameOver {
            return;
        }
        let cell = match self.grid.cell(index) {
            Ok(c) => *c,
            Err(e) => {
                debug_assert!(index < self.grid.len(), "{e}");
                warn!(error = %e, "release ignored");
                return;
            }
        };
        if cell.is_fixed {
            if cell.is_under_modifier && self.hammer_active {
                let _ = self.grid.reset(index);
                self.hide_hammer();
                debug!(index, "hammer strike");
            }
            return;
        }
        self.release_placement();
    }

    fn resolve(&mut self) {
        self.phase = Phase::Resolving;
        for &i in &self.placing {
            if let Ok(cell) = self.grid.cell_mut(i) {
                cell.is_active = false;
                cell.is_fixed = true;
            }
        }
        debug!(cells = ?self.placing, "placement committed");
        self.placing.clear();
        self.clear_matches();
        self.generate_next_sequences(1);
    }

    /// Empty every same-colour region of at least `min_match` fixed cells and score it.
    /// Returns the cleared cells; a second call without new placements returns nothing.
    pub fn clear_matches(&mut self) -> Vec<usize> {
        let regions = match_regions(&self.grid, self.min_match);
        if regions.is_empty() {
            return Vec::new();
        }
        let mut cleared = Vec::new();
        for region in regions {
            let points = u32::try_from(region.len())
                .unwrap_or(u32::MAX)
                .saturating_mul(self.points_per_cell);
            self.score = self.score.saturating_add(points);
            for &i in &region {
                let _ = self.grid.reset(i);
            }
            cleared.extend(region);
        }
        debug!(cells = ?cleared, score = self.score, "cells cleared");
        self.events.push(GameEvent::CellsCleared(cleared.clone()));
        self.events.push(GameEvent::ScoreChanged(self.score));
        cleared
    }

    /// Promote `next` to `current` and draw fresh sequences.
    ///
    /// With `count >= 2` the first new sequence becomes `current` and the last becomes
    /// `next`; with 1 only `next` is drawn. Ends with the feasibility check.
    pub fn generate_next_sequences(&mut self, count: usize) {
        if !self.next.is_empty() {
            self.current = std::mem::take(&mut self.next);
        }
        for i in 0..count {
            let seq = self.generator.next_sequence();
            if count > 1 && i == 0 {
                self.current = seq;
            } else {
                self.next = seq;
            }
        }
        debug!(
            current = self.current.len(),
            next = self.next.len(),
            "sequences advanced"
        );
        self.events.push(GameEvent::SequenceAdvanced);
        self.check_feasibility();
    }

    fn check_feasibility(&mut self) {
        if sequence_fits(&self.grid, self.current.len()) {
            self.phase = Phase::Idle;
        } else {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        self.phase = Phase::GameOver;
        self.hide_hammer();
        let best_score = self.best_score;
        let new_best = self.score > best_score;
        if new_best {
            self.best_score = self.score;
        }
        info!(score = self.score, best = best_score, new_best, "game over");
        self.events.push(GameEvent::GameOver {
            final_score: self.score,
            best_score,
            new_best,
        });
    }

    /// Toggle the hammer. It only switches on while some cell is fixed; while on, every fixed
    /// cell is marked and a release on one of them empties it. Returns the new state.
    pub fn apply_hammer(&mut self) -> bool {
        if self.phase == Phase::GameOver {
            return false;
        }
        if self.hammer_active {
            self.hide_hammer();
            return false;
        }
        if self.grid.fixed_count() == 0 {
            return false;
        }
        self.release_placement();
        self.hammer_active = true;
        for i in self.grid.fixed_indices() {
            if let Ok(cell) = self.grid.cell_mut(i) {
                cell.is_under_modifier = true;
            }
        }
        true
    }

    fn hide_hammer(&mut self) {
        self.hammer_active = false;
        for i in 0..self.grid.len() {
            if let Ok(cell) = self.grid.cell_mut(i) {
                cell.is_under_modifier = false;
            }
        }
    }

    /// Peek at the upcoming sequence.
    pub fn apply_hint(&self) -> &Sequence {
        &self.next
    }

    /// Throw away the current sequence without placing it.
    pub fn apply_skip(&mut self) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.release_placement();
        debug!("sequence skipped");
        self.generate_next_sequences(1);
    }
}
