//! Terminal rendering.
//!
//! One stateless `draw` call per frame: the awareness banner on top, then
//! either the scrollback or the active game grid, then the input line. Colors
//! come straight from the console's line hints; the frame border picks up the
//! god-mode gold or the privileged accent.

use crate::games::GameView;
use crate::output::{Banner, TextColor};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const RED: Color = Color::Rgb(0xb1, 0x12, 0x12);
const GOLD: Color = Color::Rgb(0xff, 0xaa, 0x00);
const WHITE: Color = Color::Rgb(0xf5, 0xf5, 0xf5);
const ACCENT: Color = Color::Rgb(0x00, 0xff, 0xaa);

/// Everything one frame needs, copied out of the shared state.
pub struct UiState<'a> {
    pub banner: &'a Banner,
    pub lines: &'a [(String, TextColor)],
    pub input: &'a str,
    pub input_valid: bool,
    pub game: Option<&'a GameView>,
    pub gold_frame: bool,
    pub accent_frame: bool,
}

fn color_of(color: TextColor) -> Color {
    match color {
        TextColor::Default => Color::Reset,
        TextColor::Red => RED,
        TextColor::Gold => GOLD,
        TextColor::White => WHITE,
        TextColor::Grey => Color::DarkGray,
        TextColor::Accent => ACCENT,
    }
}

pub fn draw(frame: &mut Frame, ui: &UiState) {
    let border_color = if ui.gold_frame {
        GOLD
    } else if ui.accent_frame {
        ACCENT
    } else {
        Color::DarkGray
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = outer.inner(frame.area());
    frame.render_widget(outer, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    draw_banner(frame, chunks[0], ui.banner);
    match ui.game {
        Some(game) => draw_game(frame, chunks[1], game),
        None => draw_scrollback(frame, chunks[1], ui.lines),
    }
    draw_input(frame, chunks[2], ui.input, ui.input_valid);
}

fn draw_banner(frame: &mut Frame, area: Rect, banner: &Banner) {
    let style = Style::default()
        .fg(color_of(banner.color))
        .add_modifier(Modifier::ITALIC);
    let paragraph = Paragraph::new(banner.display().to_string())
        .style(style)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn draw_scrollback(frame: &mut Frame, area: Rect, lines: &[(String, TextColor)]) {
    // tail-fit: always show the newest lines
    let visible = area.height as usize;
    let skip = lines.len().saturating_sub(visible);
    let text: Vec<Line> = lines[skip..]
        .iter()
        .map(|(text, color)| {
            Line::from(Span::styled(
                text.clone(),
                Style::default().fg(color_of(*color)),
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_game(frame: &mut Frame, area: Rect, game: &GameView) {
    let mut text: Vec<Line> = Vec::with_capacity(game.rows.len() + 2);
    text.push(Line::from(Span::styled(
        game.title.clone(),
        Style::default().fg(GOLD),
    )));
    for row in &game.rows {
        text.push(Line::from(row.clone()));
    }
    text.push(Line::from(Span::styled(
        game.status.clone(),
        Style::default().fg(Color::DarkGray),
    )));
    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame, area: Rect, input: &str, valid: bool) {
    let input_color = if valid { RED } else { WHITE };
    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::DarkGray)),
        Span::styled(input.to_string(), Style::default().fg(input_color)),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + 2 + UnicodeWidthStr::width(input) as u16;
    frame.set_cursor_position(Position::new(cursor_x.min(area.right()), area.y));
}
