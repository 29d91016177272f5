//! Terminal rendition of the vignette.
//!
//! Draws the same [`SceneModel`] the window paints, as a single text track,
//! and feeds mouse clicks and keys into the controller.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, info};

use crate::config::SceneConfig;
use crate::controller::Controller;
use crate::math::track_fraction;
use crate::scene::{Element, Rgb, SceneModel, StrikeCue};

const MIN_COLS: u16 = 40;
const MIN_ROWS: u16 = 12;
const BUTTON_LABEL: &str = "[ OK ]";

/// Cell rectangle, inclusive of `left`/`top`, exclusive of `right`/`bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

impl CellRect {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.left && column < self.right && row >= self.top && row < self.bottom
    }

    pub fn width(&self) -> u16 {
        self.right - self.left
    }
}

/// Where everything goes on a terminal of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleLayout {
    pub cols: u16,
    pub rows: u16,
    pub track_row: u16,
    pub track_left: u16,
    pub track_right: u16,
    pub popup: CellRect,
    pub button: CellRect,
}

impl ConsoleLayout {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(MIN_COLS);
        let rows = rows.max(MIN_ROWS);

        let popup_width = (cols * 3 / 4).max(MIN_COLS - 4);
        let popup_height = (rows / 2).max(8);
        let popup = CellRect {
            left: (cols - popup_width) / 2,
            top: (rows - popup_height) / 2,
            right: (cols - popup_width) / 2 + popup_width,
            bottom: (rows - popup_height) / 2 + popup_height,
        };
        let label = BUTTON_LABEL.len() as u16;
        let button_left = popup.left + (popup_width - label) / 2;
        let button = CellRect {
            left: button_left,
            top: popup.bottom - 2,
            right: button_left + label,
            bottom: popup.bottom - 1,
        };

        ConsoleLayout {
            cols,
            rows,
            track_row: rows / 2 + 1,
            track_left: 4,
            track_right: cols - 4,
            popup,
            button,
        }
    }

    /// Column of the chisel tip for world position `x`.
    pub fn column_for(&self, x: f64, start: f64, target: f64) -> u16 {
        let span = f64::from(self.track_right - self.track_left);
        self.track_left + (track_fraction(x, start, target) * span).round() as u16
    }
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Restores the terminal however the loop exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter(stdout: &mut Stdout) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(
            stdout,
            ResetColor,
            cursor::Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

enum Input {
    Strike,
    Dismiss,
    Click(u16, u16),
    Resize(u16, u16),
    Quit,
}

fn translate(event: Event) -> Option<Input> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Input::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Input::Quit)
            }
            KeyCode::Char(' ') => Some(Input::Strike),
            KeyCode::Enter => Some(Input::Dismiss),
            _ => None,
        },
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            Some(Input::Click(mouse.column, mouse.row))
        }
        Event::Resize(cols, rows) => Some(Input::Resize(cols, rows)),
        _ => None,
    }
}

/// Terminal size, preferring what the tty reports.
fn terminal_size() -> io::Result<(u16, u16)> {
    match termsize::get() {
        Some(size) => Ok((size.cols, size.rows)),
        None => terminal::size(),
    }
}

/// Runs the vignette in the terminal until the user quits.
pub fn run(config: &SceneConfig, mut controller: Controller, bell: bool) -> io::Result<()> {
    let mut stdout = io::stdout();
    let (cols, rows) = terminal_size()?;
    let mut layout = ConsoleLayout::new(cols, rows);
    let mut scene = SceneModel::new();
    let mut cue = StrikeCue::new();
    controller.start(&mut scene);

    let guard = TerminalGuard::enter(&mut stdout)?;
    info!(cols, rows, "console frontend started");

    let interval = config.timing.frame_interval();
    let mut last_frame = Instant::now();
    let mut next_frame = last_frame;
    let mut rung = cue.plays();

    loop {
        let now = Instant::now();
        if now >= next_frame {
            controller.advance_time(now - last_frame, &mut scene);
            cue.advance(now - last_frame);
            controller.tick(&mut scene);
            last_frame = now;
            next_frame = now + interval;

            if bell && cue.plays() != rung {
                queue!(stdout, Print('\u{7}'))?;
            }
            rung = cue.plays();
            render(&mut stdout, &layout, config, &controller, &scene, &cue)?;
        }

        let timeout = next_frame.saturating_duration_since(Instant::now());
        if !event::poll(timeout.max(Duration::from_millis(1)))? {
            continue;
        }
        match translate(event::read()?) {
            Some(Input::Quit) => break,
            Some(Input::Strike) => {
                controller.on_activate(&mut scene, &mut cue);
            }
            Some(Input::Dismiss) => {
                controller.dismiss_popup(&mut scene);
            }
            Some(Input::Click(column, row)) => {
                if scene.is_visible(Element::PopupButton) && layout.button.contains(column, row)
                {
                    controller.dismiss_popup(&mut scene);
                } else {
                    controller.on_activate(&mut scene, &mut cue);
                }
            }
            Some(Input::Resize(cols, rows)) => {
                debug!(cols, rows, "terminal resized");
                layout = ConsoleLayout::new(cols, rows);
                queue!(stdout, terminal::Clear(ClearType::All))?;
            }
            None => {}
        }
    }

    controller.teardown();
    drop(guard);
    info!("console frontend stopped");
    Ok(())
}

fn to_color(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb { r, g, b }
}

fn render(
    stdout: &mut Stdout,
    layout: &ConsoleLayout,
    config: &SceneConfig,
    controller: &Controller,
    scene: &SceneModel,
    cue: &StrikeCue,
) -> io::Result<()> {
    let chisel = &config.chisel;
    queue!(
        stdout,
        terminal::BeginSynchronizedUpdate,
        terminal::Clear(ClearType::All),
        cursor::MoveTo(2, 1),
        SetForegroundColor(Color::White),
        Print(&config.scene.title),
        cursor::MoveTo(2, 2),
        SetForegroundColor(Color::DarkGrey),
        Print(format!(
            "strike {}/{}",
            controller.current_step(),
            controller.total_steps()
        )),
    )?;

    if scene.is_visible(Element::GuideLine) {
        let color = scene
            .color(Element::GuideLine)
            .map(to_color)
            .unwrap_or(Color::White);
        let span = usize::from(layout.track_right - layout.track_left) + 1;
        queue!(
            stdout,
            cursor::MoveTo(layout.track_left, layout.track_row + 1),
            SetForegroundColor(color),
            Print("\u{2500}".repeat(span)),
        )?;
    }

    if scene.is_visible(Element::Chisel) {
        let x = scene.x(Element::Chisel).unwrap_or(chisel.start_x);
        let tip = layout.column_for(x, chisel.start_x, chisel.target_x);
        let glyph = "\u{2588}\u{2588}\u{2550}\u{2550}\u{25b6}";
        let left = tip.saturating_sub(glyph.chars().count() as u16 - 1);
        queue!(
            stdout,
            cursor::MoveTo(left, layout.track_row),
            SetForegroundColor(Color::Grey),
            Print(glyph),
        )?;
        if cue.intensity() > 0.0 && left > 0 {
            queue!(
                stdout,
                cursor::MoveTo(left - 1, layout.track_row),
                SetForegroundColor(Color::Yellow),
                Print('*'),
            )?;
        }
    }

    if scene.is_visible(Element::CompletionMark) {
        queue!(
            stdout,
            cursor::MoveTo(layout.cols.saturating_sub(10), 1),
            SetForegroundColor(Color::Green),
            Print("\u{2714} done"),
        )?;
    }

    if scene.is_visible(Element::PopupPlane) {
        render_popup(stdout, layout, scene)?;
    }

    queue!(
        stdout,
        cursor::MoveTo(2, layout.rows - 1),
        SetForegroundColor(Color::DarkGrey),
        Print("click/space: strike   enter: close popup   q: quit"),
        ResetColor,
        terminal::EndSynchronizedUpdate,
    )?;
    stdout.flush()
}

fn render_popup(stdout: &mut Stdout, layout: &ConsoleLayout, scene: &SceneModel) -> io::Result<()> {
    let popup = layout.popup;
    let inner = usize::from(popup.width() - 2);

    queue!(stdout, SetForegroundColor(Color::White))?;
    for row in popup.top..popup.bottom {
        let line = if row == popup.top {
            format!("\u{250c}{}\u{2510}", "\u{2500}".repeat(inner))
        } else if row == popup.bottom - 1 {
            format!("\u{2514}{}\u{2518}", "\u{2500}".repeat(inner))
        } else {
            format!("\u{2502}{}\u{2502}", " ".repeat(inner))
        };
        queue!(stdout, cursor::MoveTo(popup.left, row), Print(line))?;
    }

    let text_width = inner.saturating_sub(2);
    let mut row = popup.top + 1;
    let title = wrap(scene.text(Element::PopupTitle), text_width);
    let body = wrap(scene.text(Element::PopupBody), text_width);
    queue!(stdout, SetForegroundColor(Color::Yellow))?;
    for line in &title {
        if row >= layout.button.top - 1 {
            break;
        }
        queue!(stdout, cursor::MoveTo(popup.left + 2, row), Print(line))?;
        row += 1;
    }
    row += 1;
    queue!(stdout, SetForegroundColor(Color::White))?;
    for line in &body {
        if row >= layout.button.top - 1 {
            break;
        }
        queue!(stdout, cursor::MoveTo(popup.left + 2, row), Print(line))?;
        row += 1;
    }

    if scene.is_visible(Element::PopupButton) {
        queue!(
            stdout,
            cursor::MoveTo(layout.button.left, layout.button.top),
            SetForegroundColor(Color::Cyan),
            Print(BUTTON_LABEL),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_clamped_to_minimum() {
        let layout = ConsoleLayout::new(10, 3);
        assert_eq!(layout.cols, MIN_COLS);
        assert_eq!(layout.rows, MIN_ROWS);
        assert!(layout.popup.right <= layout.cols);
        assert!(layout.popup.bottom <= layout.rows);
    }

    #[test]
    fn button_sits_inside_popup() {
        let layout = ConsoleLayout::new(120, 40);
        let (popup, button) = (layout.popup, layout.button);
        assert!(button.left >= popup.left && button.right <= popup.right);
        assert!(button.top > popup.top && button.bottom < popup.bottom);
        assert_eq!(button.width() as usize, BUTTON_LABEL.len());
        assert!(button.contains(button.left, button.top));
        assert!(!button.contains(button.right, button.top));
    }

    #[test]
    fn track_columns_span_the_track() {
        let layout = ConsoleLayout::new(80, 24);
        assert_eq!(layout.column_for(-33.0, -33.0, -9.0), layout.track_left);
        assert_eq!(layout.column_for(-9.0, -33.0, -9.0), layout.track_right);
        let middle = layout.column_for(-21.0, -33.0, -9.0);
        assert!(middle > layout.track_left && middle < layout.track_right);
    }

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(
            wrap("strike the chisel with the hammer", 12),
            vec!["strike the", "chisel with", "the hammer"]
        );
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }
}
