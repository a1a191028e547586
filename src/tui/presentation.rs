use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use meetgrid::{
    app::{AppState, Mode, SaveStatus},
    engine::Verdict,
    storage::store::AvailabilityStore,
    sync::{PlanSession, PlanView},
    ui::grid_view::GridGeometry,
};
use crate::tui::{grid, help};

/// Draws the whole screen and returns where the grid landed.
pub fn ui<S: AvailabilityStore>(f: &mut Frame, app: &AppState, session: &PlanSession<S>) -> Option<GridGeometry> {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(70),
            Constraint::Percentage(30),
        ])
        .split(main_chunks[1]);

    let plan_title = session
        .view()
        .map(|view| view.plan.title.as_str())
        .filter(|title| !title.is_empty())
        .unwrap_or("Untitled plan");
    let title = Paragraph::new(format!("meetgrid - {} - {:?} Mode", plan_title, app.mode))
        .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, main_chunks[0]);

    let geometry = match session.view() {
        Some(_) => grid::render(f, app, session, content_chunks[0]),
        None => {
            let waiting = Paragraph::new("Proposal not loaded. Press 'r' to retry.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Availability "));
            f.render_widget(waiting, content_chunks[0]);
            None
        }
    };

    render_sidebar(f, app, session, content_chunks[1]);
    render_status(f, app, session, main_chunks[2]);

    if app.show_help {
        help::render(f, app);
    }

    geometry
}

fn render_sidebar<S: AvailabilityStore>(f: &mut Frame, app: &AppState, session: &PlanSession<S>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Plan ");
    let Some(view) = session.view() else {
        f.render_widget(block, area);
        return;
    };

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(app.theme.help_section).add_modifier(Modifier::BOLD)))
    };

    let mut lines = vec![
        section("Proposal"),
        Line::from(format_proposal(view)),
        Line::from(format!(
            "Window: {} - {}",
            view.plan.window.start().format("%b %d"),
            view.plan.window.end().format("%b %d")
        )),
        Line::from(""),
        section("Attendance"),
        Line::from(format!(
            "Participants: {} / {}",
            view.feasibility.participant_count, view.plan.proposal.quorum_max
        )),
        Line::from(format!("Minimum: {}", view.feasibility.quorum_min)),
        Line::from(format!("Free for the whole proposal: {}", view.feasibility.compatible_count)),
        Line::from(verdict_span(view, app)),
        Line::from(""),
        section("You"),
        Line::from(format!(
            "{} [{}] ({}){}",
            session.participant().display_name,
            session.participant().role.label(),
            if session.is_member() { "joined" } else { "not joined, :join" },
            if session.is_dirty() { " *" } else { "" }
        )),
        Line::from(format!("Selected hours: {}", session.selected_count())),
        Line::from(""),
        section("At cursor"),
    ];

    match view.grid.slot(app.cursor) {
        Some(slot) => {
            let (day, hour) = view.grid.codec().day_hour(slot);
            lines.push(Line::from(format!("{} {:02}:00", day.format("%a %b %d"), hour)));
            match view.occupancy.lookup(&slot) {
                Some(occupancy) if occupancy.count > 0 => {
                    lines.extend(occupancy.names.iter().map(|name| Line::from(format!("  • {}", name))));
                }
                _ => lines.push(Line::from("  nobody yet")),
            }
        }
        None => lines.push(Line::from("  -")),
    }

    let sidebar = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(sidebar, area);
}

fn format_proposal(view: &PlanView) -> String {
    let codec = view.grid.codec();
    let start = view.plan.proposal.start().with_timezone(&codec.offset());
    let end = view.plan.proposal.end().with_timezone(&codec.offset());
    if start.date_naive() == end.date_naive() {
        format!("{} {}-{}", start.format("%a %b %d"), start.format("%H:%M"), end.format("%H:%M"))
    } else {
        format!("{} - {}", start.format("%a %d %H:%M"), end.format("%a %d %H:%M"))
    }
}

fn verdict_span<'a>(view: &PlanView, app: &AppState) -> Span<'a> {
    let color = match view.feasibility.verdict {
        Verdict::Feasible => app.theme.success,
        Verdict::RosterBelowQuorum | Verdict::QuorumNotMet => app.theme.error,
    };
    Span::styled(
        view.feasibility.verdict.describe().to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn render_status<S: AvailabilityStore>(f: &mut Frame, app: &AppState, session: &PlanSession<S>, area: Rect) {
    let status_text = if matches!(app.mode, Mode::Command) {
        app.command_buffer.to_string()
    } else {
        let mut text = format!(
            "Selected: {} | {} | Press 'q' to quit, '?' for help",
            session.selected_count(),
            app.save_status.label()
        );
        if let Some(message) = &app.message {
            text = format!("{} | {}", message, text);
        }
        text
    };

    let status_color = match (&app.mode, &app.save_status) {
        (Mode::Command, _) => app.theme.command_mode,
        (_, SaveStatus::Error(_)) => app.theme.error,
        _ => app.theme.status_bar,
    };

    let status = Paragraph::new(status_text)
        .style(Style::default().fg(status_color))
        .alignment(if matches!(app.mode, Mode::Command) { Alignment::Left } else { Alignment::Center })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}
