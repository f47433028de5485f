use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

type Backend = CrosstermBackend<Stdout>;

/// Raw mode plus the alternate screen for as long as the guard lives.
/// Dropping it puts the user's shell back the way it was.
struct TerminalSession {
    terminal: Terminal<Backend>,
}

impl TerminalSession {
    fn start() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err).context("failed to enter alternate screen");
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("failed to create terminal backend")?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = restore_terminal(Some(&mut self.terminal)) {
            warn!("event=terminal_restore status=error error={err:#}");
        }
    }
}

/// Take over the terminal and process input until the user quits.
pub fn run_app(app: &mut App) -> Result<()> {
    install_panic_hook();
    let mut session = TerminalSession::start()?;
    event_loop(&mut session.terminal, app)
}

fn event_loop(terminal: &mut Terminal<Backend>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(POLL_INTERVAL).context("event polling failed")? {
            continue;
        }
        let Event::Key(key) = event::read().context("failed to read event")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if is_interrupt(&key) {
            debug!("event=interrupt status=ok");
            return Ok(());
        }
        if app.handle_key(key.code)? {
            return Ok(());
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// A panic inside the draw loop would otherwise leave the shell in raw mode
/// with the message hidden on the alternate screen.
fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal(None);
        previous(info);
    }));
}

fn restore_terminal(terminal: Option<&mut Terminal<Backend>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    match terminal {
        Some(terminal) => {
            execute!(terminal.backend_mut(), LeaveAlternateScreen)
                .context("failed to leave alternate screen")?;
            terminal
                .show_cursor()
                .context("failed to restore cursor visibility")
        }
        None => execute!(io::stdout(), LeaveAlternateScreen)
            .context("failed to leave alternate screen"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ctrl_c_interrupts() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(is_interrupt(&ctrl_c));
        assert!(!is_interrupt(&plain_c));
        assert!(!is_interrupt(&ctrl_q));
    }
}
