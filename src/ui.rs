//! Layout and drawing: board, sequences, hint, score, power-ups, game over.

use crate::app::GameOverInfo;
use crate::game::GameState;
use crate::grid::{Cell, Grid};
use crate::sequence::Sequence;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per board cell, including a one-column / one-row gap after each tile.
const CELL_W: u16 = 6;
const CELL_H: u16 = 3;
const SIDEBAR_WIDTH: u16 = 26;
/// Fade of cleared cells (TachyonFX).
const CLEAR_FADE_MS: u32 = 350;
/// Sequence preview tile width.
const BLOCK_W: u16 = 4;

/// Board size in terminal cells, border included.
fn board_outer_size(grid: &Grid) -> (u16, u16) {
    let cols = u16::try_from(grid.columns()).unwrap_or(u16::MAX);
    let rows = u16::try_from(grid.rows()).unwrap_or(u16::MAX);
    (
        cols.saturating_mul(CELL_W).saturating_add(3),
        rows.saturating_mul(CELL_H).saturating_add(3),
    )
}

/// Board (outer, with border) and sidebar rects, centred in `area`.
fn layout(area: Rect, grid: &Grid) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size(grid);
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);
    let total_h = bh.max(22);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(total_h) / 2;
    let board = Rect {
        x,
        y,
        width: bw.min(area.width),
        height: bh.min(area.height),
    };
    let sidebar = Rect {
        x: x.saturating_add(bw),
        y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(bw)),
        height: total_h.min(area.height),
    };
    (board, sidebar)
}

/// Inner board area (inside the border) where tiles start, clipped to `area`.
fn board_inner(area: Rect, grid: &Grid) -> Rect {
    let (board, _) = layout(area, grid);
    Rect {
        x: board.x + 1,
        y: board.y + 1,
        width: board.width.saturating_sub(2),
        height: board.height.saturating_sub(2),
    }
}

/// Tile rect of board cell `index` (without the gap).
fn tile_rect(inner: Rect, grid: &Grid, index: usize) -> Rect {
    let (r, c) = grid.row_col(index);
    let (r, c) = (r as u16, c as u16);
    Rect {
        x: inner.x + 1 + c * CELL_W,
        y: inner.y + 1 + r * CELL_H,
        width: CELL_W - 1,
        height: CELL_H - 1,
    }
}

/// Board cell under terminal position (col, row), if any. Gaps between tiles map to nothing.
pub fn cell_at(area: Rect, grid: &Grid, col: u16, row: u16) -> Option<usize> {
    let inner = board_inner(area, grid);
    let dx = col.checked_sub(inner.x + 1)?;
    let dy = row.checked_sub(inner.y + 1)?;
    if dx % CELL_W == CELL_W - 1 || dy % CELL_H == CELL_H - 1 {
        return None;
    }
    grid.index_of(usize::from(dy / CELL_H), usize::from(dx / CELL_W))
}

/// Everything the app wants drawn this frame besides the engine state.
pub struct View<'a> {
    pub cursor: usize,
    pub hint_visible: bool,
    pub game_over: Option<GameOverInfo>,
    pub clearing: &'a [usize],
    pub no_animation: bool,
}

/// Draw the board and sidebar, the clear fade while `view.clearing` is non-empty, and the
/// game-over panel on top when the session has ended.
pub fn draw(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    view: &View,
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    let (board, sidebar) = layout(area, state.grid());
    draw_board(frame.buffer_mut(), state, theme, view, board);
    draw_sidebar(frame.buffer_mut(), state, theme, view, sidebar);

    if !view.clearing.is_empty() && !view.no_animation {
        apply_clear_effect(
            frame,
            state.grid(),
            theme,
            area,
            view.clearing,
            clear_effect,
            clear_process_time,
            now,
        );
    }
    if let Some(info) = view.game_over {
        draw_game_over(frame.buffer_mut(), theme, info, board);
    }
}

fn fill(buf: &mut Buffer, r: Rect, symbol: &str, style: Style) {
    let clip = r.intersection(buf.area);
    for y in clip.y..clip.y + clip.height {
        for x in clip.x..clip.x + clip.width {
            buf[(x, y)].set_symbol(symbol).set_style(style);
        }
    }
}

fn tile_style(cell: &Cell, theme: &Theme) -> Style {
    if cell.is_empty() {
        Style::default().bg(theme.div_line)
    } else {
        Style::default().bg(Color::from(cell.color))
    }
}

fn draw_board(buf: &mut Buffer, state: &GameState, theme: &Theme, view: &View, outer: Rect) {
    let title = if state.hammer_active() {
        " Hammer: pick a cell "
    } else {
        " Cubeline "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(outer);
    fill(buf, inner, " ", Style::default().bg(theme.bg));
    block.render(outer, buf);

    let grid = state.grid();
    let clearing: HashSet<usize> = view.clearing.iter().copied().collect();
    let last_placed = state.placing().last().copied();

    for (i, cell) in grid.cells().iter().enumerate() {
        let r = tile_rect(inner, grid, i);
        let style = if clearing.contains(&i) {
            Style::default().bg(Color::White)
        } else {
            tile_style(cell, theme)
        };
        fill(buf, r, " ", style);

        let mid = Rect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: 1,
        };
        let marker = if cell.is_under_modifier {
            Some(" ╳ ")
        } else if cell.is_active && Some(i) == last_placed {
            Some(" ● ")
        } else if cell.is_active {
            Some(" • ")
        } else {
            None
        };
        if let Some(m) = marker {
            let x = mid.x + (mid.width.saturating_sub(3)) / 2;
            if x + 3 <= buf.area.right() && mid.y < buf.area.bottom() {
                buf.set_string(x, mid.y, m, style.fg(Color::Black));
            }
        }
    }

    if !state.is_game_over() && view.cursor < grid.len() {
        let r = tile_rect(inner, grid, view.cursor);
        let bottom = r.y + r.height - 1;
        let cursor_style = Style::default()
            .fg(theme.title)
            .add_modifier(Modifier::BOLD);
        if r.x + r.width <= buf.area.right() && bottom < buf.area.bottom() {
            buf[(r.x, bottom)]
                .set_symbol("▕")
                .set_style(cursor_style);
            buf[(r.x + r.width - 1, bottom)]
                .set_symbol("▏")
                .set_style(cursor_style);
            buf.set_string(r.x + 1, bottom, "▁▁▁", cursor_style);
        }
    }
}

/// Draw a sequence as a row of tiles; the first block gets a caret underneath.
fn draw_sequence(buf: &mut Buffer, seq: &Sequence, placed: usize, area: Rect, theme: &Theme) {
    for (i, block) in seq.blocks().iter().enumerate() {
        let x = area.x + (i as u16) * (BLOCK_W + 1);
        if x + BLOCK_W > area.x + area.width {
            break;
        }
        let color = Color::from(block.color);
        let symbol = if i < placed { "░" } else { "█" };
        fill(
            buf,
            Rect {
                x,
                y: area.y,
                width: BLOCK_W,
                height: 1,
            },
            symbol,
            Style::default().fg(color).bg(theme.bg),
        );
        if block.is_first && area.height > 1 {
            buf.set_string(
                x,
                area.y + 1,
                " ▲  ",
                Style::default().fg(theme.main_fg).bg(theme.bg),
            );
        }
    }
}

fn boxed(buf: &mut Buffer, area: Rect, title: &str, theme: &Theme) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(theme.title),
        ));
    let inner = block.inner(area);
    block.render(area, buf);
    inner
}

fn draw_sidebar(buf: &mut Buffer, state: &GameState, theme: &Theme, view: &View, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let title = Style::default().fg(theme.title);
    let dim = Style::default().fg(theme.inactive_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Now
            Constraint::Length(4), // Next (hint)
            Constraint::Length(4), // Score
            Constraint::Length(7), // Power-ups
            Constraint::Fill(1),
        ])
        .split(area);

    let now_inner = boxed(buf, chunks[0], "Now", theme);
    draw_sequence(buf, state.current(), state.grid().active_count(), now_inner, theme);

    let next_inner = boxed(buf, chunks[1], "Next", theme);
    if view.hint_visible {
        draw_sequence(buf, state.apply_hint(), 0, next_inner, theme);
    } else {
        Paragraph::new(Line::from(Span::styled("n: peek", dim))).render(next_inner, buf);
    }

    let score_inner = boxed(buf, chunks[2], "Score", theme);
    let score_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title),
            Span::styled(state.score().to_string(), fg),
        ]),
        Line::from(vec![
            Span::styled("Best:  ", title),
            Span::styled(state.best_score().max(state.score()).to_string(), fg),
        ]),
    ];
    Paragraph::new(score_lines).render(score_inner, buf);

    let power_inner = boxed(buf, chunks[3], "Power-ups", theme);
    let hammer_style = if state.hammer_active() {
        Style::default()
            .fg(Color::Black)
            .bg(theme.title)
            .add_modifier(Modifier::BOLD)
    } else {
        fg
    };
    let power_lines = vec![
        Line::from(Span::styled("x  Hammer", hammer_style)),
        Line::from(Span::styled("n  Hint", fg)),
        Line::from(Span::styled("s  Skip", fg)),
        Line::from(""),
        Line::from(Span::styled("r restart  q quit", dim)),
    ];
    Paragraph::new(power_lines).render(power_inner, buf);
}

/// Build set of buffer (x, y) positions covered by clearing tiles.
fn clearing_buffer_positions(inner: Rect, grid: &Grid, cells: &[usize]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &i in cells {
        if i >= grid.len() {
            continue;
        }
        let r = tile_rect(inner, grid, i);
        for x in r.x..r.x + r.width {
            for y in r.y..r.y + r.height {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or advance the fade of cleared tiles to the board background.
#[allow(clippy::too_many_arguments)]
fn apply_clear_effect(
    frame: &mut Frame,
    grid: &Grid,
    theme: &Theme,
    area: Rect,
    cells: &[usize],
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let inner = board_inner(area, grid);
    let delta = clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *clear_process_time = Some(now);

    if clear_effect.is_none() {
        let set = clearing_buffer_positions(inner, grid, cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            set.contains(&(pos.x, pos.y))
        }));
        let bg = theme.div_line;
        let effect = fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_game_over(buf: &mut Buffer, theme: &Theme, info: GameOverInfo, board: Rect) {
    let w = 26u16.min(buf.area.width);
    let h = 9u16.min(buf.area.height);
    let popup = Rect {
        x: board.x + board.width.saturating_sub(w) / 2,
        y: board.y + board.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    }
    .intersection(buf.area);
    fill(buf, popup, " ", Style::default().bg(theme.bg));

    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", info.final_score), fg)),
        Line::from(Span::styled(
            format!(" Best: {} ", info.best_score.max(info.final_score)),
            fg,
        )),
    ];
    if info.new_best {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(" r restart    q quit ", fg)));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, buf);
}
