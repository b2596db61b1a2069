//! Interactive wizard model
//!
//! `App` owns the navigator, the mounted step's view state and its page
//! model. Keys become [`Effect`]s for the runtime; nothing here touches the
//! network.

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::ballot::{TwoBits, VoteOption, VOTE_OPTIONS};
use crate::navigation::{Navigator, Step, WizardState};
use crate::view::{transition, Effect, RequestId, ViewEvent, ViewState};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use uuid::Uuid;

/// Ticks between entanglement diagram stages
const REVEAL_EVERY: u64 = 5;
pub const REVEAL_STAGES: u64 = 4;

/// Page model of the mounted step, reset on every mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Welcome,
    EntangledKey {
        ticks: u64,
    },
    Voting {
        cursor: usize,
        /// The option last submitted
        cast: Option<VoteOption>,
    },
    Transmission {
        carried: Option<WizardState>,
    },
    QuantumApp {
        message: TwoBits,
        include_eve: bool,
    },
}

impl Page {
    fn mount(step: Step, carried: Option<WizardState>) -> Self {
        match step {
            Step::Welcome => Page::Welcome,
            Step::EntangledKey => Page::EntangledKey { ticks: 0 },
            Step::Voting => Page::Voting {
                cursor: 0,
                cast: None,
            },
            Step::Transmission => Page::Transmission { carried },
            Step::QuantumApp => Page::QuantumApp {
                message: TwoBits::Zero,
                include_eve: false,
            },
        }
    }

    /// How much of the entanglement diagram is visible
    pub fn reveal_stage(&self) -> u64 {
        match self {
            Page::EntangledKey { ticks } => (ticks / REVEAL_EVERY).min(REVEAL_STAGES),
            _ => REVEAL_STAGES,
        }
    }
}

pub struct App {
    navigator: Navigator,
    view: ViewState,
    page: Page,
    /// Address prompt input while open
    prompt: Option<String>,
    status: Option<String>,
    export_dir: PathBuf,
    completed_at: Option<DateTime<Local>>,
    ticks: u64,
    quit: bool,
}

impl App {
    pub fn new(start_path: &str, export_dir: PathBuf) -> Self {
        let (mut navigator, route) = Navigator::at_path(start_path);
        let carried = navigator.read_state();
        let page = Page::mount(navigator.current(), carried);
        Self {
            navigator,
            view: ViewState::Idle,
            page,
            prompt: None,
            status: route
                .redirected
                .then(|| format!("No page at {start_path}; showing the welcome step")),
            export_dir,
            completed_at: None,
            ticks: 0,
            quit: false,
        }
    }

    // ========================================================================
    // Accessors for drawing
    // ========================================================================

    pub fn step(&self) -> Step {
        self.navigator.current()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Local>> {
        self.completed_at
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn can_go_back(&self) -> bool {
        self.navigator.can_go_back()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if let Page::EntangledKey { ticks } = &mut self.page {
            *ticks = ticks.saturating_add(1);
        }
    }

    /// Feed a completion from the runtime into the mounted view
    pub fn handle_view_event(&mut self, event: ViewEvent) -> Vec<Effect> {
        let applies = event.completion_id().is_some()
            && event.completion_id() == self.view.pending_request_id();
        let effects = self.apply(event);
        if applies && self.view.result().is_some() {
            self.completed_at = Some(Local::now());
        }
        effects
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return Vec::new();
        }
        if self.prompt.is_some() {
            return self.prompt_key(key.code);
        }

        match key.code {
            KeyCode::Esc => return self.back(),
            KeyCode::Char(':') => {
                self.prompt = Some(String::new());
                return Vec::new();
            }
            KeyCode::Char('x') => {
                self.export_images();
                return Vec::new();
            }
            KeyCode::Char('d') => return self.apply(ViewEvent::Dismiss),
            _ => {}
        }

        match self.page {
            Page::Welcome => match key.code {
                KeyCode::Enter => self.go_to(Step::EntangledKey, None),
                KeyCode::Char('q') => self.go_to(Step::QuantumApp, None),
                _ => Vec::new(),
            },
            Page::EntangledKey { .. } => match key.code {
                KeyCode::Enter => self.go_to(Step::Voting, None),
                _ => Vec::new(),
            },
            Page::Voting { cursor, cast } => self.voting_key(key.code, cursor, cast),
            Page::Transmission { carried } => self.transmission_key(key.code, carried),
            Page::QuantumApp {
                message,
                include_eve,
            } => self.quantum_app_key(key.code, message, include_eve),
        }
    }

    /// Address-bar entry; unknown paths land on the welcome step
    pub fn open(&mut self, path: &str) -> Vec<Effect> {
        let (route, effects) = self.navigate(|nav| nav.open(path));
        if route.redirected {
            self.status = Some(format!("No page at {path}; showing the welcome step"));
        }
        effects
    }

    fn prompt_key(&mut self, code: KeyCode) -> Vec<Effect> {
        match code {
            KeyCode::Esc => {
                self.prompt = None;
                Vec::new()
            }
            KeyCode::Enter => {
                let path = self.prompt.take().unwrap_or_default();
                self.open(path.trim())
            }
            KeyCode::Backspace => {
                if let Some(input) = &mut self.prompt {
                    input.pop();
                }
                Vec::new()
            }
            KeyCode::Char(c) => {
                if let Some(input) = &mut self.prompt {
                    input.push(c);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn voting_key(
        &mut self,
        code: KeyCode,
        cursor: usize,
        cast: Option<VoteOption>,
    ) -> Vec<Effect> {
        if self.view.result().is_some() {
            return match code {
                KeyCode::Enter => self.go_to(Step::Welcome, None),
                KeyCode::Char('t') => {
                    self.go_to(Step::Transmission, cast.map(WizardState::with_vote))
                }
                _ => Vec::new(),
            };
        }

        let highlighted = VOTE_OPTIONS.get(cursor).copied();
        match code {
            KeyCode::Up | KeyCode::Char('k') if !self.view.is_submitting() => {
                let cursor = cursor.checked_sub(1).unwrap_or(VOTE_OPTIONS.len() - 1);
                self.page = Page::Voting { cursor, cast };
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') if !self.view.is_submitting() => {
                let cursor = (cursor + 1) % VOTE_OPTIONS.len();
                self.page = Page::Voting { cursor, cast };
                Vec::new()
            }
            KeyCode::Enter => {
                if !self.view.is_submitting() {
                    self.page = Page::Voting {
                        cursor,
                        cast: highlighted,
                    };
                }
                self.submit(highlighted.map(|vote| AnalysisRequest::new(vote.sends, false)))
            }
            KeyCode::Char('t') => {
                self.go_to(Step::Transmission, highlighted.map(WizardState::with_vote))
            }
            _ => Vec::new(),
        }
    }

    fn transmission_key(&mut self, code: KeyCode, carried: Option<WizardState>) -> Vec<Effect> {
        let channel = |include_eve: bool| {
            carried.map(|state| AnalysisRequest::new(state.vote.sends, include_eve))
        };
        match code {
            KeyCode::Char('s') => self.submit(channel(false)),
            KeyCode::Char('i') => self.submit(channel(true)),
            KeyCode::Enter if self.view.result().is_some() => self.go_to(Step::Welcome, None),
            KeyCode::Char('v') if carried.is_none() => self.go_to(Step::Voting, None),
            _ => Vec::new(),
        }
    }

    fn quantum_app_key(&mut self, code: KeyCode, message: TwoBits, include_eve: bool) -> Vec<Effect> {
        if self.view.is_submitting() && code != KeyCode::Enter {
            return Vec::new();
        }
        match code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.page = Page::QuantumApp {
                    message: message.prev(),
                    include_eve,
                };
                Vec::new()
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.page = Page::QuantumApp {
                    message: message.next(),
                    include_eve,
                };
                Vec::new()
            }
            KeyCode::Char('e') => {
                self.page = Page::QuantumApp {
                    message,
                    include_eve: !include_eve,
                };
                Vec::new()
            }
            KeyCode::Enter => self.submit(Some(AnalysisRequest::new(message, include_eve))),
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // View and navigation plumbing
    // ========================================================================

    fn submit(&mut self, request: Option<AnalysisRequest>) -> Vec<Effect> {
        self.status = None;
        self.apply(ViewEvent::Submit {
            request_id: Uuid::new_v4(),
            request,
        })
    }

    fn apply(&mut self, event: ViewEvent) -> Vec<Effect> {
        match transition(&self.view, event) {
            Ok(result) => {
                self.view = result.new_state;
                result.effects
            }
            Err(e) => {
                tracing::debug!(step = self.step().slug(), error = %e, "View event rejected");
                self.status = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn go_to(&mut self, to: Step, state: Option<WizardState>) -> Vec<Effect> {
        self.navigate(|nav| nav.go_to(to, state)).1
    }

    fn back(&mut self) -> Vec<Effect> {
        if !self.navigator.can_go_back() {
            return Vec::new();
        }
        self.navigate(Navigator::back).1
    }

    /// Leave the mounted view, move, then mount whatever step is current
    fn navigate<T>(&mut self, nav: impl FnOnce(&mut Navigator) -> T) -> (T, Vec<Effect>) {
        let effects = self.apply(ViewEvent::Leave);
        let outcome = nav(&mut self.navigator);

        let carried = self.navigator.read_state();
        let step = self.navigator.current();
        tracing::info!(step = step.slug(), carried = carried.is_some(), "Mounted step");
        self.page = Page::mount(step, carried);
        self.status = None;
        self.completed_at = None;
        (outcome, effects)
    }

    fn export_images(&mut self) {
        let ViewState::Succeeded {
            request_id, result, ..
        } = &self.view
        else {
            self.status = Some("Nothing to export yet".to_string());
            return;
        };

        let prefix = export_prefix(self.step(), *request_id);
        self.status = Some(match export(result, &self.export_dir, &prefix) {
            Ok(count) => format!("Exported {count} images to {}", self.export_dir.display()),
            Err(e) => format!("Error: {e}"),
        });
    }
}

/// `<step>-<short request id>`
pub fn export_prefix(step: Step, request_id: RequestId) -> String {
    let id: String = request_id.simple().to_string().chars().take(8).collect();
    format!("{}-{id}", step.slug())
}

fn export(
    result: &AnalysisResult,
    dir: &std::path::Path,
    prefix: &str,
) -> Result<usize, std::io::Error> {
    let paths = result.export(dir, prefix).inspect_err(|e| {
        tracing::warn!(dir = %dir.display(), error = %e, "Image export failed");
    })?;
    for path in &paths {
        tracing::info!(path = %path.display(), "Exported image");
    }
    Ok(paths.len())
}
