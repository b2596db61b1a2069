//! Screen rendering
//!
//! Draw functions only read the [`App`]; images are shown as metadata since a
//! terminal cannot display them.

use super::app::{App, Page, REVEAL_STAGES};
use super::theme::Theme;
use crate::analysis::{AnalysisResult, ChannelReport, Counts, EncodedImage, Verdict};
use crate::ballot::{vote_option_for, TwoBits, VoteOption, VOTE_OPTIONS};
use crate::navigation::Step;
use crate::view::{FailureKind, ViewState};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const BAR_WIDTH: u64 = 30;

pub fn draw(f: &mut Frame<'_>, app: &App, theme: &Theme) {
    let area = f.area();
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border)
        .title(Line::from(vec![
            Span::styled(" Quantum Ballot ", theme.title),
            Span::styled(format!("· {} ", step_title(app.step())), theme.subtitle),
        ]));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let body = match app.page() {
        Page::Welcome => welcome(theme),
        Page::EntangledKey { .. } => entangled_key(app.page().reveal_stage(), theme),
        Page::Voting { cursor, cast } => voting(app, *cursor, cast.map(|v| v.title), theme),
        Page::Transmission { carried } => {
            transmission(app, carried.map(|state| state.vote), theme)
        }
        Page::QuantumApp {
            message,
            include_eve,
        } => quantum_app(app, message.as_str(), *include_eve, theme),
    };
    f.render_widget(
        Paragraph::new(Text::from(body)).wrap(Wrap { trim: false }),
        padded(rows[0]),
    );

    f.render_widget(Paragraph::new(status_line(app, theme)), rows[1]);
    f.render_widget(
        Paragraph::new(hints(&global_hints(app), theme)).alignment(Alignment::Right),
        rows[2],
    );
}

fn step_title(step: Step) -> &'static str {
    match step {
        Step::Welcome => "Welcome",
        Step::EntangledKey => "Step 1: The Entangled Key",
        Step::Voting => "Step 2: Cast Your Vote",
        Step::Transmission => "Step 3: Transmission",
        Step::QuantumApp => "Superdense Coding Simulator",
    }
}

fn padded(area: Rect) -> Rect {
    area.inner(ratatui::layout::Margin {
        vertical: 1,
        horizontal: 2,
    })
}

// ============================================================================
// Steps
// ============================================================================

fn welcome(theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::styled("QUANTUM BALLOT", theme.title),
        Line::styled("Secure voting powered by superdense coding", theme.subtitle),
        Line::default(),
        Line::styled(
            "Your vote travels as two classical bits packed into a single qubit. \
             That qubit is one half of an entangled pair shared with the central \
             server, so anyone who intercepts it disturbs the pair and shows up \
             as errors in the count.",
            theme.text,
        ),
        Line::default(),
        hints(&[("Enter", "Begin"), ("q", "Open the simulator")], theme),
    ]
}

fn entangled_key(stage: u64, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if stage >= 1 {
        lines.push(Line::styled(
            format!("  {:<20}{:>36}", "Central Server", "Your Seat"),
            theme.subtitle,
        ));
        lines.push(Line::styled(
            format!("  {:<20}{:>36}", "[ q0 ]", "[ q1 ]"),
            theme.accent,
        ));
    }
    if stage >= 2 {
        lines.push(Line::styled(
            "       ●━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━●",
            theme.accent,
        ));
    }
    if stage >= 3 {
        lines.push(Line::styled(
            "                     ENTANGLED PAIR",
            theme.title,
        ));
        lines.push(Line::styled(
            "                 Quantum Entanglement ✨",
            theme.muted,
        ));
    }
    if stage >= REVEAL_STAGES {
        lines.push(Line::default());
        lines.push(Line::styled(
            "Before voting opens, the server prepares an entangled pair and sends \
             one qubit to your seat. Acting on your half changes the state of the \
             whole pair, which is what lets a single qubit carry two bits.",
            theme.text,
        ));
        lines.push(Line::default());
        lines.push(hints(&[("Enter", "Proceed to voting")], theme));
    }
    lines
}

fn voting(app: &App, cursor: usize, cast: Option<&'static str>, theme: &Theme) -> Vec<Line<'static>> {
    if let Some(result) = app.view().result() {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Vote cast: ", theme.text),
                Span::styled(cast.unwrap_or("?"), theme.success),
            ]),
            Line::default(),
        ];
        lines.extend(counts_lines("Decoded by the server", &result.secure.counts, theme));
        lines.push(image_line("Histogram", &result.secure.histogram_img, theme));
        lines.extend(completed_line(app, theme));
        lines.push(Line::default());
        lines.push(hints(
            &[("Enter", "Back to welcome"), ("t", "Continue to transmission")],
            theme,
        ));
        return lines;
    }

    let mut lines = vec![
        Line::styled("Select your vote:", theme.text),
        Line::default(),
    ];
    for (i, option) in VOTE_OPTIONS.iter().enumerate() {
        let (marker, style) = if i == cursor {
            ("▶ ", theme.selected)
        } else {
            ("  ", theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<10}", option.title), style),
            Span::styled(format!("  sends {}  ", option.sends), theme.accent),
            Span::styled(option.gate, theme.muted),
        ]));
    }
    lines.push(Line::default());
    lines.extend(progress_or_error(app, "Casting vote...", theme));
    lines.push(hints(
        &[("↑/↓", "Choose"), ("Enter", "Cast vote"), ("t", "Skip to transmission")],
        theme,
    ));
    lines
}

fn transmission(
    app: &App,
    vote: Option<VoteOption>,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = vec![match vote {
        Some(vote) => Line::from(vec![
            Span::styled("Your vote: ", theme.text),
            Span::styled(vote.title, theme.success),
            Span::styled(format!(" (sends {})", vote.sends), theme.muted),
        ]),
        None => Line::styled("No vote was carried into this step", theme.muted),
    }];
    lines.push(Line::default());

    match app.view() {
        ViewState::Succeeded {
            request, result, ..
        } => {
            lines.extend(channel_lines(
                "Secure Channel",
                &result.secure,
                request.message,
                theme,
            ));
            if let Some(eve) = &result.eve {
                lines.push(Line::default());
                lines.extend(channel_lines(
                    "Intercepted Channel",
                    eve,
                    request.message,
                    theme,
                ));
            }
            lines.extend(completed_line(app, theme));
            lines.push(Line::default());
            lines.push(hints(
                &[("Enter", "Start New Vote"), ("s/i", "Transmit again")],
                theme,
            ));
        }
        ViewState::Failed { failure } if failure.kind == FailureKind::PreconditionMissing => {
            lines.extend(progress_or_error(app, "", theme));
            lines.push(hints(&[("v", "Go to voting")], theme));
        }
        _ => {
            lines.push(Line::styled("Choose a transmission channel:", theme.text));
            lines.push(Line::default());
            lines.extend(progress_or_error(app, "Simulating transmission...", theme));
            lines.push(hints(
                &[("s", "Secure Channel"), ("i", "Intercepted Channel")],
                theme,
            ));
        }
    }
    lines
}

fn quantum_app(app: &App, message: &str, include_eve: bool, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Message:       ", theme.text),
            Span::styled(format!("◀ {message} ▶"), theme.accent),
        ]),
        Line::from(vec![
            Span::styled("Eavesdropper:  ", theme.text),
            if include_eve {
                Span::styled("on", theme.danger)
            } else {
                Span::styled("off", theme.muted)
            },
        ]),
        Line::default(),
        hints(
            &[("←/→", "Message"), ("e", "Toggle eavesdropper"), ("Enter", "Run")],
            theme,
        ),
        Line::default(),
    ];

    match app.view().result() {
        Some(result) => lines.extend(result_lines(result, theme)),
        None => lines.extend(progress_or_error(app, "Running simulation...", theme)),
    }
    lines.extend(completed_line(app, theme));
    lines
}

// ============================================================================
// Pieces
// ============================================================================

fn result_lines(result: &AnalysisResult, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Message sent: ", theme.text),
            Span::styled(result.message.as_str(), theme.success),
        ]),
        image_line("Bloch sphere", &result.bloch_sphere_img, theme),
        Line::default(),
        Line::styled("Without eavesdropper", theme.subtitle),
        image_line("Circuit", &result.secure.circuit_img, theme),
        image_line("Histogram", &result.secure.histogram_img, theme),
    ];
    lines.extend(counts_lines("Decoded", &result.secure.counts, theme));

    if let Some(eve) = &result.eve {
        lines.push(Line::default());
        lines.push(Line::styled("With eavesdropper", theme.subtitle));
        lines.push(image_line("Circuit", &eve.circuit_img, theme));
        lines.push(image_line("Histogram", &eve.histogram_img, theme));
        lines.extend(counts_lines("Decoded", &eve.counts, theme));
    }

    if let Some(statevector) = &result.statevector {
        lines.push(Line::default());
        lines.push(Line::styled("Statevector", theme.subtitle));
        for (basis, amplitude) in statevector {
            lines.push(Line::styled(format!("  |{basis}⟩  {amplitude}"), theme.text));
        }
    }

    if let Some(density) = &result.density_matrix {
        lines.push(Line::default());
        lines.push(Line::styled("Density matrix (no eavesdropper)", theme.subtitle));
        lines.extend(matrix_lines(&density.no_eve, theme));
        if let Some(with_eve) = &density.with_eve {
            lines.push(Line::styled("Density matrix (with eavesdropper)", theme.subtitle));
            lines.extend(matrix_lines(with_eve, theme));
        }
    }
    lines
}

fn channel_lines(
    name: &'static str,
    channel: &ChannelReport,
    expected: TwoBits,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let verdict = channel.verdict(expected);
    let verdict_style = match verdict {
        Verdict::Registered => theme.success,
        Verdict::ErrorDetected => theme.danger,
    };
    let mut lines = vec![Line::styled(name, theme.subtitle)];
    lines.extend(counts_lines("Decoded", &channel.counts, theme));
    lines.push(image_line("Histogram", &channel.histogram_img, theme));
    lines.push(Line::from(vec![
        Span::styled("  Verdict: ", theme.text),
        Span::styled(verdict.label(), verdict_style),
    ]));
    lines
}

fn counts_lines(label: &'static str, counts: &Counts, theme: &Theme) -> Vec<Line<'static>> {
    let decoded = counts.decoded();
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("  {label}: "), theme.text),
        Span::styled(decoded.as_str(), theme.accent),
        Span::styled(
            vote_option_for(decoded)
                .map(|option| format!(" ({})", option.title))
                .unwrap_or_default(),
            theme.muted,
        ),
    ])];
    if !counts.shots().is_empty() {
        lines.push(Line::styled(
            format!("    {} shots", counts.total_shots()),
            theme.muted,
        ));
    }

    let max = counts.shots().values().copied().max().unwrap_or(0);
    for (bits, shots) in counts.shots() {
        let bar = "█".repeat(bar_width(*shots, max));
        let style = if *bits == decoded {
            theme.accent
        } else {
            theme.muted
        };
        lines.push(Line::from(vec![
            Span::styled(format!("    {bits} "), theme.text),
            Span::styled(bar, style),
            Span::styled(format!(" {shots}"), theme.muted),
        ]));
    }
    lines
}

/// Bar length scaled against the largest count, computed wide so huge counts cannot overflow
fn bar_width(shots: u64, max: u64) -> usize {
    if max == 0 {
        return 0;
    }
    let width = u128::from(shots) * u128::from(BAR_WIDTH) / u128::from(max);
    usize::try_from(width).unwrap_or(0)
}

fn image_line(label: &'static str, image: &EncodedImage, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), theme.text),
        Span::styled(image.describe(), theme.muted),
    ])
}

fn matrix_lines(rows: &[Vec<f64>], theme: &Theme) -> Vec<Line<'static>> {
    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>7.3}")).collect();
            Line::styled(format!("  [{} ]", cells.join("")), theme.text)
        })
        .collect()
}

fn completed_line(app: &App, theme: &Theme) -> Option<Line<'static>> {
    app.completed_at().map(|at| {
        Line::styled(
            format!("Completed at {}", at.format("%H:%M:%S")),
            theme.muted,
        )
    })
}

/// Loading text while submitting, the inline error after a failure
fn progress_or_error(app: &App, loading: &str, theme: &Theme) -> Vec<Line<'static>> {
    match app.view() {
        ViewState::Submitting { .. } => {
            let frame = usize::try_from(app.ticks() % SPINNER.len() as u64).unwrap_or(0);
            vec![
                Line::styled(format!("{} {loading}", SPINNER[frame]), theme.accent),
                Line::default(),
            ]
        }
        ViewState::Failed { failure } => vec![
            Line::styled(failure.kind.heading(), theme.danger),
            Line::styled(format!("Error: {}", failure.message), theme.danger),
            Line::default(),
        ],
        ViewState::Idle | ViewState::Succeeded { .. } => Vec::new(),
    }
}

fn status_line(app: &App, theme: &Theme) -> Line<'static> {
    if let Some(input) = app.prompt() {
        return Line::from(vec![
            Span::styled(":", theme.key),
            Span::styled(format!("{input}█"), theme.text),
        ]);
    }
    match app.status() {
        Some(status) if status.starts_with("Error") => Line::styled(status.to_string(), theme.danger),
        Some(status) => Line::styled(status.to_string(), theme.muted),
        None => Line::default(),
    }
}

fn global_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    let mut keys = Vec::new();
    if app.can_go_back() {
        keys.push(("Esc", "Back"));
    }
    keys.push((":", "Go to path"));
    if app.view().result().is_some() {
        keys.push(("x", "Export images"));
    }
    if matches!(
        app.view(),
        ViewState::Succeeded { .. } | ViewState::Failed { .. }
    ) {
        keys.push(("d", "Dismiss"));
    }
    keys.push(("Ctrl-C", "Quit"));
    keys
}

fn hints(keys: &[(&'static str, &'static str)], theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, action)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!("[{key}]"), theme.key));
        spans.push(Span::styled(format!(" {action}"), theme.muted));
    }
    Line::from(spans)
}
