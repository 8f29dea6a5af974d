//! Terminal setup and the event loop.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::app::DashboardApp;

pub type DashboardTerminal = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Raw mode plus the alternate screen. Dropping the guard (including while
/// unwinding from a panic) puts the terminal back.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    /// Initialize terminal for the dashboard
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self { active: true };
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Ok(guard)
    }

    /// Restore terminal to normal state. Every step is attempted; the first
    /// failure is reported. A second call is a no-op.
    pub fn restore(&mut self) -> io::Result<()> {
        if !std::mem::replace(&mut self.active, false) {
            return Ok(());
        }
        let raw = disable_raw_mode();
        let mut stdout = io::stdout();
        let screen = execute!(stdout, LeaveAlternateScreen, Show);
        raw.and(screen)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

pub fn run_event_loop(terminal: &mut DashboardTerminal, app: &mut DashboardApp) -> io::Result<()> {
    let mut last_tick = Instant::now();

    while app.running {
        terminal.draw(|f| app.render(f))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

/// Take over the terminal until the user quits. Blocking.
pub fn run(mut app: DashboardApp) -> io::Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let result = Terminal::new(CrosstermBackend::new(io::stdout()))
        .and_then(|mut terminal| run_event_loop(&mut terminal, &mut app));

    // Restore terminal regardless of result
    let restored = guard.restore();
    keep_first_error(result, restored)
}

/// The loop's own error wins over a failure to restore the terminal.
fn keep_first_error(result: io::Result<()>, restored: io::Result<()>) -> io::Result<()> {
    result.and(restored)
}
