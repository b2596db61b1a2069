//! Navigation controller
//!
//! Maps the named steps of the ballot flow onto paths and performs
//! immediate view swaps. Cross-step data travels only through the
//! [`StateCarrier`], addressed to the step a transition mounts.

pub mod carrier;

pub use carrier::{StateCarrier, WizardState};

/// A screen in the ballot flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Welcome,
    EntangledKey,
    Voting,
    Transmission,
    QuantumApp,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Welcome,
        Step::EntangledKey,
        Step::Voting,
        Step::Transmission,
        Step::QuantumApp,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Step::Welcome => "/",
            Step::EntangledKey => "/entangled-key",
            Step::Voting => "/voting-app",
            Step::Transmission => "/transmission-app",
            Step::QuantumApp => "/quantum-app",
        }
    }

    /// Short slug for logs and file names
    pub fn slug(self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::EntangledKey => "entangled-key",
            Step::Voting => "voting",
            Step::Transmission => "transmission",
            Step::QuantumApp => "quantum-app",
        }
    }
}

/// Outcome of resolving a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub step: Step,
    /// The path matched nothing and fell back to the welcome step
    pub redirected: bool,
}

impl Route {
    /// Resolve a path; unknown paths redirect to [`Step::Welcome`]
    pub fn resolve(path: &str) -> Self {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        match Step::ALL.iter().find(|step| step.path() == normalized) {
            Some(step) => Route {
                step: *step,
                redirected: false,
            },
            None => Route {
                step: Step::Welcome,
                redirected: true,
            },
        }
    }
}

/// Owns the current step, back history and the state carrier
#[derive(Debug)]
pub struct Navigator {
    current: Step,
    history: Vec<Step>,
    carrier: StateCarrier,
}

impl Navigator {
    pub fn new(start: Step) -> Self {
        Self {
            current: start,
            history: Vec::new(),
            carrier: StateCarrier::default(),
        }
    }

    /// Start at whatever `path` resolves to
    pub fn at_path(path: &str) -> (Self, Route) {
        let route = Route::resolve(path);
        if route.redirected {
            tracing::info!(path = %path, "Unknown start path, redirecting to welcome");
        }
        (Self::new(route.step), route)
    }

    pub fn current(&self) -> Step {
        self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Swap to `to` immediately, handing `state` to that step only
    pub fn go_to(&mut self, to: Step, state: Option<WizardState>) {
        tracing::debug!(
            from = self.current.slug(),
            to = to.slug(),
            carried = state.is_some(),
            "Navigating"
        );
        self.history.push(self.current);
        self.current = to;
        self.carrier.attach_state(to, state);
    }

    /// Address-bar entry: resolve `path` and go there without state
    pub fn open(&mut self, path: &str) -> Route {
        let route = Route::resolve(path);
        if route.redirected {
            tracing::info!(path = %path, "Unknown path, redirecting to welcome");
        }
        self.go_to(route.step, None);
        route
    }

    /// Pop one step of history; returns false when there is none
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                tracing::debug!(from = self.current.slug(), to = previous.slug(), "Navigating back");
                self.current = previous;
                self.carrier.attach_state(previous, None);
                true
            }
            None => false,
        }
    }

    /// State carried into the current step by the transition that mounted it
    pub fn read_state(&mut self) -> Option<WizardState> {
        self.carrier.read_state(self.current)
    }
}
