//! Terminal UI rendering with ratatui

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tetrion::board::{BOARD_HEIGHT, BOARD_WIDTH, Cell};
use tetrion::highscores::HighScores;
use tetrion::session::GameSession;
use tetrion::tetromino::{PieceType, Rotation};

const BLOCK: &str = "██";
const GHOST: &str = "░░";
const EMPTY: &str = "  ";

/// Total width needed: hold(12) + board(22) + next/stats(18) = 52
const GAME_WIDTH: u16 = 52;
/// Board(20) + 2 for borders
const GAME_HEIGHT: u16 = 22;

/// Convert a piece's RGB color into a terminal color
fn piece_color(piece_type: PieceType) -> Color {
    let (r, g, b) = piece_type.color();
    Color::Rgb(r, g, b)
}

/// Render the title screen: starting level and the high score table
pub fn render_title(frame: &mut Frame, starting_level: u32, scores: &HighScores) {
    let area = center_rect(frame.area(), 44, 20);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(10)])
        .split(area);

    let title = Paragraph::new(vec![
        Line::raw(""),
        Line::styled("T E T R I O N", Style::default().fg(Color::Cyan).bold()),
        Line::styled("a falling-block puzzle", Style::default().fg(Color::DarkGray)),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, layout[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(layout[1]);
    frame.render_widget(block, layout[1]);

    let mut lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled("Starting level: ", Style::default().fg(Color::White)),
            Span::styled(format!("< {starting_level} >"), Style::default().fg(Color::Cyan).bold()),
        ]),
        Line::raw(""),
    ];
    lines.extend(high_score_lines(scores));
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "←→ Level  Enter Start  Q Quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Lines listing the high score table
fn high_score_lines(scores: &HighScores) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled("HIGH SCORES", Style::default().fg(Color::Yellow).bold())];
    if scores.is_empty() {
        lines.push(Line::styled("no scores yet", Style::default().fg(Color::DarkGray)));
    }
    for (rank, entry) in scores.entries().iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{}. {:<5} ", rank + 1, entry.name), Style::default().fg(Color::White)),
            Span::styled(format!("{:>7} ", entry.score), Style::default().fg(Color::Yellow)),
            Span::styled(entry.date.clone(), Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines
}

/// Render the entire game UI
pub fn render_game(frame: &mut Frame, session: &GameSession, show_ghost: bool, message: Option<&str>) {
    let area = frame.area();

    // Center the game area
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // Create main layout: hold | board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12), // Hold box
            Constraint::Length(22), // Board (10*2 + 2 for borders)
            Constraint::Length(18), // Next queue + stats
        ])
        .split(game_area);

    render_hold(frame, main_layout[0], session.held(), session.hold_used());
    render_board(frame, main_layout[1], session, show_ghost);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11), // Next queue
            Constraint::Min(6),     // Stats
        ])
        .split(main_layout[2]);

    let next: Vec<_> = session.next_pieces().collect();
    render_next_queue(frame, right_layout[0], &next);
    render_stats(frame, right_layout[1], session, message);
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

/// Render the hold piece box, dimmed once hold has been used
fn render_hold(frame: &mut Frame, area: Rect, hold: Option<PieceType>, used: bool) {
    let block = Block::default()
        .title(" HOLD ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(piece_type) = hold {
        render_mini_piece(frame, inner, piece_type, used);
    }
}

/// Render the next piece queue
fn render_next_queue(frame: &mut Frame, area: Rect, queue: &[PieceType]) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if queue.is_empty() {
        return;
    }

    let piece_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); queue.len()])
        .split(inner);

    for (piece_area, &piece_type) in piece_areas.iter().zip(queue) {
        render_mini_piece(frame, *piece_area, piece_type, false);
    }
}

/// Render a small piece preview (for hold and next queue)
fn render_mini_piece(frame: &mut Frame, area: Rect, piece_type: PieceType, dim: bool) {
    if area.height < 1 || area.width < 4 {
        return;
    }

    let shape = piece_type.shape(Rotation::Spawn);
    let mut style = Style::default().fg(piece_color(piece_type));
    if dim {
        style = style.dim();
    }

    let lines: Vec<Line> = (0..shape.height)
        .map(|y| {
            let spans: Vec<Span> = (0..shape.width)
                .map(|x| {
                    if shape.is_filled(x, y) {
                        Span::styled(BLOCK, style)
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Render the game board with the current piece and its ghost
fn render_board(frame: &mut Frame, area: Rect, session: &GameSession, show_ghost: bool) {
    let title = format!(" LEVEL {} ", session.level());
    let block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let current = session.current();
    let current_cells = current.cells();
    let ghost_cells = show_ghost.then(|| session.ghost().cells());
    let color = piece_color(current.piece_type);

    let mut lines: Vec<Line> = Vec::with_capacity(BOARD_HEIGHT);
    for (y, row) in session.board().rows().enumerate() {
        let y = y as i32;
        let spans: Vec<Span> = (0..BOARD_WIDTH as i32)
            .zip(row.iter())
            .map(|(x, cell)| {
                if current_cells.contains(&(x, y)) {
                    Span::styled(BLOCK, Style::default().fg(color))
                } else if let Cell::Filled(piece_type) = cell {
                    Span::styled(BLOCK, Style::default().fg(piece_color(*piece_type)))
                } else if ghost_cells.is_some_and(|ghost| ghost.contains(&(x, y))) {
                    Span::styled(GHOST, Style::default().fg(color).dim())
                } else {
                    Span::raw(EMPTY)
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, session: &GameSession, message: Option<&str>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let score = session.score();
    let label = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));

    let mut lines = vec![
        label("SCORE"),
        Line::from(Span::styled(
            format!("{}", score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        label("LINES"),
        Line::from(Span::styled(format!("{}", score.lines), Style::default().fg(Color::Green))),
    ];

    if score.combo > 1 {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("COMBO x{}", score.combo),
            Style::default().fg(Color::Cyan),
        )));
    }

    if let Some(message) = message {
        lines.push(Line::raw(""));
        lines.push(Line::styled(message.to_string(), Style::default().fg(Color::Magenta).bold()));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for pause/game over)
pub fn render_overlay(frame: &mut Frame, title: &str, subtitle: &str) {
    let popup_area = center_rect(frame.area(), 28, 5);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle.to_string(), Style::default().fg(Color::Gray)),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

/// Render the name prompt shown when a score makes the table
pub fn render_name_entry(frame: &mut Frame, points: u64, name: &str) {
    let popup_area = center_rect(frame.area(), 32, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" NEW HIGH SCORE ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(format!("{points}"), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Color::White)),
            Span::styled(name.to_string(), Style::default().fg(Color::Green).bold()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ]),
        Line::raw(""),
        Line::styled("Enter Save  Esc Skip", Style::default().fg(Color::DarkGray)),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

/// Render the game over screen with the table
pub fn render_game_over(frame: &mut Frame, points: u64, scores: &HighScores) {
    let popup_area = center_rect(frame.area(), 40, 14);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" GAME OVER ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines = vec![
        Line::styled(format!("Final score: {points}"), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
    ];
    lines.extend(high_score_lines(scores));
    lines.push(Line::raw(""));
    lines.push(Line::styled("Enter Play again  Esc Menu", Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
