use std::io;
use std::time::Duration;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event as TermEvent, KeyCode, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
};
use meetgrid::{
    app::{AppState, Mode, SaveStatus},
    engine::PointerEvent,
    input::{command_mode, normal_mode, pointer, Action},
    storage::store::AvailabilityStore,
    sync::{PlanSession, RefreshOutcome, SessionError, Subscription},
    ui::{grid_view::GridGeometry, theme::Theme},
};
use crate::tui::presentation::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run_tui<S: AvailabilityStore>(
    mut session: PlanSession<S>,
    subscription: Subscription,
    theme: Theme,
) -> Result<(), io::Error> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = AppState::new().with_theme(theme);
    if session.view().is_none() {
        app.message = Some("Proposal not found".to_string());
    }

    let res = run_app(&mut terminal, &mut app, &mut session, subscription).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    if session.is_dirty() {
        tracing::warn!("Quit with unsaved availability for {}", session.proposal_id());
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend, S: AvailabilityStore>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    session: &mut PlanSession<S>,
    mut subscription: Subscription,
) -> io::Result<()> {
    let mut geometry: Option<GridGeometry> = None;

    loop {
        let (days, hours) = grid_size(session);
        app.clamp_to(days, hours);
        if let Some(geometry) = &geometry {
            app.scroll_to_cursor(geometry.visible_rows());
        }

        terminal.draw(|f| geometry = ui(f, app, session))?;

        if let Err(e) = session.poll_store().await {
            tracing::warn!("Polling for changes failed: {}", e);
        }
        while let Some(notice) = subscription.try_next() {
            match session.handle_notice(&notice).await {
                Ok(Some(RefreshOutcome::ProposalGone)) => {
                    app.message = Some("Proposal no longer exists".to_string());
                }
                Ok(_) => {}
                Err(e) => report_error(app, "Refresh failed", &e),
            }
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        let action = match event::read()? {
            TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                if app.show_help {
                    handle_help_keys(key.code, app);
                    Action::None
                } else {
                    match app.mode {
                        Mode::Normal => {
                            app.message = None;
                            normal_mode::handle_key(key.code, app, days, hours, session.selection().is_dragging())
                        }
                        Mode::Command => handle_command_mode(key.code, app, session),
                    }
                }
            }
            TermEvent::Mouse(mouse) => match &geometry {
                Some(geometry) => pointer::handle_mouse(mouse, geometry),
                None => Action::None,
            },
            TermEvent::FocusLost => pointer::handle_focus_lost(),
            _ => Action::None,
        };

        if apply_action(action, app, session, terminal).await? {
            return Ok(());
        }
    }
}

fn grid_size<S: AvailabilityStore>(session: &PlanSession<S>) -> (usize, usize) {
    session
        .view()
        .map(|view| (view.grid.day_count(), view.grid.hour_count()))
        .unwrap_or((0, 0))
}

/// Returns true when the loop should exit.
async fn apply_action<B: ratatui::backend::Backend, S: AvailabilityStore>(
    action: Action,
    app: &mut AppState,
    session: &mut PlanSession<S>,
    terminal: &mut Terminal<B>,
) -> io::Result<bool> {
    match action {
        Action::None => {}
        Action::Quit => {
            if session.is_dirty() {
                app.message = Some("Unsaved changes (:w to save, :q! to discard)".to_string());
            } else {
                return Ok(true);
            }
        }
        Action::ForceQuit => return Ok(true),
        Action::Pointer(event) => {
            if let PointerEvent::Press(cell) | PointerEvent::Move(cell) = event {
                let (days, hours) = grid_size(session);
                app.set_cursor(cell, days, hours);
            }
            if let Err(e) = session.handle_pointer(event) {
                report_error(app, "Selection failed", &e);
            }
        }
        Action::ToggleDay(day) => match session.toggle_day(day) {
            Ok(Some(direction)) => tracing::debug!("Toggled day {} ({:?})", day, direction),
            Ok(None) => app.message = Some(format!("No day column {}", day + 1)),
            Err(e) => report_error(app, "Toggle failed", &e),
        },
        Action::ToggleHour(hour) => match session.toggle_hour(hour) {
            Ok(Some(direction)) => tracing::debug!("Toggled hour row {} ({:?})", hour, direction),
            Ok(None) => app.message = Some("That hour is not on the grid".to_string()),
            Err(e) => report_error(app, "Toggle failed", &e),
        },
        Action::Save | Action::SaveAndQuit => {
            app.save_status = SaveStatus::Saving;
            terminal.draw(|f| {
                ui(f, app, session);
            })?;

            match session.save().await {
                Ok(_) => {
                    app.save_status = SaveStatus::Saved;
                    if matches!(action, Action::SaveAndQuit) {
                        return Ok(true);
                    }
                }
                Err(e) => {
                    tracing::error!("Save failed: {}", e);
                    app.save_status = SaveStatus::Error(e.to_string());
                }
            }
            return Ok(false);
        }
        Action::Refresh => match session.refresh().await {
            Ok(RefreshOutcome::Loaded) => app.message = Some("Reloaded".to_string()),
            Ok(RefreshOutcome::ProposalGone) => app.message = Some("Proposal no longer exists".to_string()),
            Err(e) => report_error(app, "Refresh failed", &e),
        },
        Action::Join => match session.join().await {
            Ok(_) => app.message = Some("Joined".to_string()),
            Err(e) => report_error(app, "Join failed", &e),
        },
        Action::Leave => match session.leave().await {
            Ok(_) => app.message = Some("Left the proposal".to_string()),
            Err(e) => report_error(app, "Leave failed", &e),
        },
    }

    update_save_status(app, session);
    Ok(false)
}

fn update_save_status<S: AvailabilityStore>(app: &mut AppState, session: &PlanSession<S>) {
    app.save_status = match (&app.save_status, session.is_dirty()) {
        (SaveStatus::Error(message), true) => SaveStatus::Error(message.clone()),
        (_, true) => SaveStatus::Unsaved,
        (_, false) => SaveStatus::Saved,
    };
}

fn report_error(app: &mut AppState, context: &str, error: &SessionError) {
    tracing::error!("{}: {}", context, error);
    app.message = Some(format!("{}: {}", context, error));
}

fn handle_help_keys(code: KeyCode, app: &mut AppState) {
    match code {
        KeyCode::Char('j') => {
            app.help_scroll = app.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') => {
            app.help_scroll = app.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.show_help = false;
            app.help_scroll = 0;
        }
        _ => {}
    }
}

fn handle_command_mode<S: AvailabilityStore>(code: KeyCode, app: &mut AppState, session: &PlanSession<S>) -> Action {
    match code {
        KeyCode::Enter => {
            let command = command_mode::parse_command(&app.command_buffer);
            app.command_buffer.clear();
            app.mode = Mode::Normal;
            command_to_action(command, app, session)
        }
        KeyCode::Esc => {
            app.command_buffer.clear();
            app.mode = Mode::Normal;
            Action::None
        }
        KeyCode::Backspace => {
            app.command_buffer.pop();
            if app.command_buffer.is_empty() {
                app.mode = Mode::Normal;
            }
            Action::None
        }
        KeyCode::Char(c) => {
            app.command_buffer.push(c);
            Action::None
        }
        _ => Action::None,
    }
}

fn command_to_action<S: AvailabilityStore>(
    command: command_mode::Command,
    app: &mut AppState,
    session: &PlanSession<S>,
) -> Action {
    use command_mode::Command;

    match command {
        Command::Quit => Action::Quit,
        Command::ForceQuit => Action::ForceQuit,
        Command::Write => Action::Save,
        Command::WriteQuit => Action::SaveAndQuit,
        Command::Refresh => Action::Refresh,
        Command::Join => Action::Join,
        Command::Leave => Action::Leave,
        Command::Day(day) => Action::ToggleDay(day - 1),
        Command::Hour(hour) => {
            let row = session
                .view()
                .and_then(|view| view.grid.hours().iter().position(|h| *h == hour));
            match row {
                Some(row) => Action::ToggleHour(row),
                None => {
                    app.message = Some(format!("{:02}:00 is not on the grid", hour));
                    Action::None
                }
            }
        }
        Command::Theme(name) => {
            app.theme = Theme::get_by_name(&name);
            Action::None
        }
        Command::Help => {
            app.show_help = !app.show_help;
            Action::None
        }
        Command::Error(message) => {
            app.message = Some(message);
            Action::None
        }
    }
}
