//! Interactive terminal wizard
//!
//! One task drives the screen: it selects over terminal input, completions
//! coming back from the [`AnalysisRuntime`] and a redraw tick.

mod app;
mod draw;
mod theme;

use app::App;
use theme::Theme;

use crate::analysis::AnalysisService;
use crate::runtime::AnalysisRuntime;
use crate::view::ViewEvent;
use crossterm::event::{Event, EventStream};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK_RATE: Duration = Duration::from_millis(100);

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run<S: AnalysisService + 'static>(
    service: Arc<S>,
    start_path: &str,
    export_dir: PathBuf,
) -> io::Result<()> {
    let theme = Theme::quantum();
    let (event_tx, mut event_rx) = mpsc::channel::<ViewEvent>(16);
    let mut runtime = AnalysisRuntime::new(service, event_tx);
    let mut app = App::new(start_path, export_dir);
    tracing::info!(step = app.step().slug(), "Starting wizard");

    let mut terminal = setup_terminal()?;
    let outcome = event_loop(&mut terminal, &mut app, &mut runtime, &mut event_rx, &theme).await;
    tracing::info!(in_flight = runtime.in_flight(), "Stopping wizard");
    runtime.abort_all();
    restore_terminal(&mut terminal)?;

    if let Err(e) = &outcome {
        tracing::error!(error = %e, "Wizard stopped on terminal error");
    }
    outcome
}

async fn event_loop<S: AnalysisService + 'static>(
    terminal: &mut Tui,
    app: &mut App,
    runtime: &mut AnalysisRuntime<S>,
    event_rx: &mut mpsc::Receiver<ViewEvent>,
    theme: &Theme,
) -> io::Result<()> {
    let mut input = EventStream::new();
    let mut ticker = tokio::time::interval(TICK_RATE);

    while !app.should_quit() {
        terminal.draw(|f| draw::draw(f, app, theme))?;

        let effects = tokio::select! {
            next = input.next() => match next {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => Vec::new(),
                Some(Err(e)) => return Err(e),
                None => break,
            },
            Some(event) = event_rx.recv() => {
                if let Some(request_id) = event.completion_id() {
                    runtime.settle(request_id);
                }
                app.handle_view_event(event)
            }
            _ = ticker.tick() => {
                app.tick();
                Vec::new()
            }
        };

        for effect in effects {
            runtime.execute(effect);
        }
    }
    Ok(())
}

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()
}
