//! Terminal UI rendering with ratatui

use expertris::board::{BOARD_WIDTH, EMPTY_CELL};
use expertris::game::{ActiveView, Warning};
use expertris::score::PlayOrigin;
use expertris::settings::Settings;
use expertris::tetromino::TetrominoType;
use expertris::{GameEvent, SessionState, Snapshot};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const BLOCK: &str = "██";
const GHOST: &str = "░░";
const EMPTY: &str = "  ";

/// Total width needed: pending+reserve(14) + board(22) + queue/stats(22) = 58
const GAME_WIDTH: u16 = 58;
/// Total height needed: board(20) + 2 borders + 3 for the message bar
const GAME_HEIGHT: u16 = 25;
/// Rows drawn per piece in the side boxes
const MINI_HEIGHT: u16 = 2;

fn piece_color(kind: TetrominoType) -> Color {
    let (r, g, b) = kind.rgb();
    Color::Rgb(r, g, b)
}

/// Render the entire game UI
pub fn render_game(frame: &mut Frame, snapshot: &Snapshot, settings: &Settings, message: Option<&str>) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(22), Constraint::Length(3)])
        .split(game_area);

    // pending + reserve | board | queue + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14),
            Constraint::Length(22), // Board (10*2 + 2 for borders)
            Constraint::Length(22),
        ])
        .split(rows[0]);

    let left_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),  // Next up
            Constraint::Length(11), // Reserve, 3 slots
            Constraint::Min(3),     // Awards
        ])
        .split(main_layout[0]);

    render_pending(frame, left_layout[0], snapshot);
    render_reserve(frame, left_layout[1], &snapshot.reserve);
    render_awards(frame, left_layout[2], snapshot);

    render_board(frame, main_layout[1], snapshot, settings);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12), // Queue, 5 slots
            Constraint::Min(10),    // Stats
        ])
        .split(main_layout[2]);

    render_queue(frame, right_layout[0], &snapshot.queue);
    render_stats(frame, right_layout[1], snapshot);

    render_message_bar(frame, rows[1], snapshot, message);

    match snapshot.state {
        SessionState::Ready => render_overlay(frame, area, "EXPERTRIS", "Press Enter to start"),
        SessionState::Paused => render_overlay(frame, area, "PAUSED", "Press P to resume"),
        SessionState::Over => {
            let subtitle = format!("Score {}  Enter to retry", snapshot.score);
            render_overlay(frame, area, "GAME OVER", &subtitle);
        }
        SessionState::Playing => {}
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn side_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
}

/// The piece that spawns next, tagged with where it came from
fn render_pending(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let block = side_block(" NEXT UP ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(pending) = snapshot.pending else {
        return;
    };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(MINI_HEIGHT), Constraint::Length(1)])
        .split(inner);
    render_mini_piece(frame, parts[0], pending.kind);

    let (label, color) = match pending.origin {
        PlayOrigin::Queue => ("queue", Color::DarkGray),
        PlayOrigin::Reserve => ("reserve", Color::Magenta),
    };
    frame.render_widget(
        Paragraph::new(Line::styled(label, Style::default().fg(color))).alignment(Alignment::Center),
        parts[1],
    );
}

/// Reserve stack, top first
fn render_reserve(frame: &mut Frame, area: Rect, reserve: &[TetrominoType]) {
    let block = side_block(" RESERVE ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    render_piece_column(frame, inner, reserve);
}

/// Queue, front first
fn render_queue(frame: &mut Frame, area: Rect, queue: &[TetrominoType]) {
    let block = side_block(" QUEUE ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    render_piece_column(frame, inner, queue);
}

fn render_piece_column(frame: &mut Frame, area: Rect, pieces: &[TetrominoType]) {
    let slots = (area.height / MINI_HEIGHT) as usize;
    let count = pieces.len().min(slots);
    if count == 0 {
        return;
    }

    let piece_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(MINI_HEIGHT); count])
        .split(area);

    for (i, &kind) in pieces.iter().take(count).enumerate() {
        render_mini_piece(frame, piece_areas[i], kind);
    }
}

/// Render a small piece preview in its spawn orientation
fn render_mini_piece(frame: &mut Frame, area: Rect, kind: TetrominoType) {
    if area.height < 1 || area.width < 4 {
        return;
    }

    let shape = kind.shape();
    let style = Style::default().fg(piece_color(kind));
    let lines: Vec<Line> = (0..MINI_HEIGHT as usize)
        .map(|row| {
            let spans: Vec<Span> = (0..shape.width())
                .map(|col| {
                    if shape.is_filled(row, col) {
                        Span::styled(BLOCK, style)
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

/// Whether the active piece (at row `y`) covers a board cell
fn covers(piece: &ActiveView, y: i32, row: usize, col: usize) -> bool {
    let (dr, dc) = (row as i32 - y, col as i32 - piece.x);
    dr >= 0 && dc >= 0 && piece.shape.is_filled(dr as usize, dc as usize)
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, snapshot: &Snapshot, settings: &Settings) {
    let show_ghost = settings.gameplay.show_ghost;
    let title = format!(" {} ", settings.gameplay.rules.mode.name());
    let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let active = snapshot.active.as_ref();
    let lines: Vec<Line> = snapshot
        .board
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let spans: Vec<Span> = (0..BOARD_WIDTH)
                .map(|col| {
                    if let Some(piece) = active.filter(|p| covers(p, p.y, row, col)) {
                        return Span::styled(BLOCK, Style::default().fg(piece_color(piece.kind)));
                    }
                    if cells[col] != EMPTY_CELL {
                        return match TetrominoType::from_cell_id(cells[col]) {
                            Some(kind) => Span::styled(BLOCK, Style::default().fg(piece_color(kind))),
                            None => Span::styled(BLOCK, Style::default().fg(Color::Gray)),
                        };
                    }
                    match active.filter(|p| show_ghost && covers(p, p.ghost_y, row, col)) {
                        Some(piece) => Span::styled(GHOST, Style::default().fg(piece_color(piece.kind)).dim()),
                        None => Span::raw(EMPTY),
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<9}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color).bold()),
    ])
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        stat_line("SCORE", snapshot.score.to_string(), Color::Yellow),
        stat_line("LEVEL", snapshot.level.to_string(), Color::Cyan),
        stat_line("LINES", snapshot.lines.to_string(), Color::Green),
        stat_line("COMBO", format!("x{}", snapshot.combo), Color::Magenta),
        stat_line("EFFIC.", format!("{}%", snapshot.efficiency), Color::Cyan),
        stat_line("EXPERT", snapshot.expert_points.to_string(), Color::Yellow),
        stat_line("PLAYS", snapshot.total_plays.to_string(), Color::White),
        stat_line("SPEED", format!("{}ms", snapshot.interval_ms), Color::White),
        stat_line("BEST", snapshot.personal_best.to_string(), Color::Red),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Unlocked achievements, newest last
fn render_awards(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let block = side_block(" AWARDS ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = snapshot
        .achievements
        .iter()
        .rev()
        .take(inner.height as usize)
        .map(|a| Line::styled(a.name(), Style::default().fg(Color::Yellow)))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Latest feedback message, or the expert hint when there is none
fn render_message_bar(frame: &mut Frame, area: Rect, snapshot: &Snapshot, message: Option<&str>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match message {
        Some(text) => Line::styled(text.to_string(), Style::default().fg(Color::Magenta).bold()),
        None => Line::styled(snapshot.hint.message(), Style::default().fg(Color::Gray).italic()),
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), inner);
}

/// Render an overlay (for start/pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 30u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Short feedback text for the message bar
pub fn describe_event(event: &GameEvent) -> Option<String> {
    let text = match event {
        GameEvent::LinesCleared(1) => "Single!".to_string(),
        GameEvent::LinesCleared(2) => "Double!".to_string(),
        GameEvent::LinesCleared(3) => "Triple!".to_string(),
        GameEvent::LinesCleared(n) => format!("TETRIS! ({} lines)", n),
        GameEvent::LevelUp(level) => format!("Level {}!", level),
        GameEvent::Combo(n) if *n >= 2 => format!("Combo x{}", n),
        GameEvent::NewRecord(score) => format!("New record: {}", score),
        GameEvent::AchievementUnlocked(a) => format!("{}: {}", a.name(), a.description()),
        GameEvent::Warning(Warning::ReserveFull) => "Reserve is full".to_string(),
        GameEvent::Warning(Warning::QueueFull) => "Queue is full".to_string(),
        GameEvent::QueueOptimized { moved } => format!("Queue optimized, {} moved", moved),
        GameEvent::Stats(report) => format!(
            "{} plays ({} queue / {} reserve), {}% efficient, {} reserved",
            report.total_plays,
            report.queue_plays,
            report.reserve_plays,
            report.efficiency,
            report.reserved_count
        ),
        GameEvent::Suggestion(p) => format!(
            "Try {} {:?} at column {}{}",
            p.kind.name(),
            p.rotation,
            p.x,
            if p.lines > 0 { format!(", clears {}", p.lines) } else { String::new() }
        ),
        GameEvent::GameOver(score) => format!("Game over with {} points", score),
        _ => return None,
    };
    Some(text)
}
