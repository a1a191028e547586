use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use meetgrid::{
    app::AppState,
    engine::{ToggleDirection, HeatLevel},
    storage::store::AvailabilityStore,
    sync::PlanSession,
    ui::grid_view::{self, CellView, GridGeometry, HOUR_LABEL_WIDTH},
    ui::theme::Theme,
};

pub fn render<S: AvailabilityStore>(
    f: &mut Frame,
    app: &AppState,
    session: &PlanSession<S>,
    area: Rect,
) -> Option<GridGeometry> {
    let block = Block::default().borders(Borders::ALL).title(" Availability ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let view = session.view()?;
    let geometry = GridGeometry::compute(
        inner,
        view.grid.day_count(),
        view.grid.hour_count(),
        app.cursor,
        app.hour_offset,
    );
    let layout = grid_view::calculate_layout(view, session.selection(), session.local(), app, &geometry);
    let width = geometry.column_width as usize;

    let mut lines = Vec::with_capacity(layout.rows.len() + 1);

    let mut header_spans = vec![Span::raw(" ".repeat(HOUR_LABEL_WIDTH as usize))];
    for day in &layout.days {
        let mut style = Style::default().fg(app.theme.day_header);
        if day.fully_selected {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        header_spans.push(Span::styled(format!("{:^width$}", day.label, width = width), style));
    }
    lines.push(Line::from(header_spans));

    for row in &layout.rows {
        let mut label_style = Style::default().fg(app.theme.hour_label);
        if row.fully_selected {
            label_style = label_style.add_modifier(Modifier::BOLD);
        }
        let mut spans = vec![Span::styled(
            format!("{:<w$}", row.label, w = HOUR_LABEL_WIDTH as usize),
            label_style,
        )];

        for cell in &row.cells {
            spans.push(Span::styled(
                format!("{:^width$}", cell_text(cell), width = width),
                cell_style(cell, &app.theme),
            ));
        }
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines), inner);
    Some(geometry)
}

fn cell_text(cell: &CellView) -> String {
    match (cell.selected, cell.count) {
        (true, 0) => "✓".to_string(),
        (true, count) => format!("✓{}", count),
        (false, 0) => "·".to_string(),
        (false, count) => count.to_string(),
    }
}

fn cell_style(cell: &CellView, theme: &Theme) -> Style {
    let mut style = Style::default();

    if let Some(bg) = theme.heat_color(cell.intensity) {
        style = style.bg(bg);
    }
    if cell.heat == HeatLevel::All {
        style = style.add_modifier(Modifier::BOLD);
    }
    if cell.selected {
        style = style.fg(theme.selected);
    }
    match cell.preview {
        Some(ToggleDirection::Add) => style = style.bg(theme.preview_add),
        Some(ToggleDirection::Remove) => style = style.bg(theme.preview_remove),
        None => {}
    }
    if cell.in_proposal {
        style = style.add_modifier(Modifier::UNDERLINED).fg(theme.proposal_marker);
    }
    if cell.is_cursor {
        style = style.bg(theme.cursor_bg).fg(theme.cursor_fg);
    }
    style
}
