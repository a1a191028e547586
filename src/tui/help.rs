use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use meetgrid::app::AppState;

pub fn render(f: &mut Frame, app: &AppState) {
    let area = f.size();
    let help_width = 60.min(area.width);
    let help_height = 23.min(area.height);
    let x = (area.width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = ratatui::layout::Rect {
        x,
        y,
        width: help_width,
        height: help_height,
    };

    f.render_widget(Clear, help_area);

    let section = |title: &'static str| Line::from(vec![Span::styled(title, Style::default().fg(app.theme.help_section))]);

    let help_text = vec![
        Line::from(vec![Span::styled("meetgrid Help", Style::default().fg(app.theme.help_title).add_modifier(Modifier::BOLD))]),
        Line::from(""),
        section("Moving:"),
        Line::from("  h/j/k/l  - Previous day / next hour / previous hour / next day"),
        Line::from("  arrows   - Same as h/j/k/l"),
        Line::from("  g/G      - First/last hour"),
        Line::from("  0/$      - First/last day"),
        Line::from(""),
        section("Selecting:"),
        Line::from("  space    - Start a drag at the cursor, again to finish"),
        Line::from("  enter    - Finish the current drag"),
        Line::from("  D        - Toggle the whole day under the cursor"),
        Line::from("  H        - Toggle the whole hour under the cursor"),
        Line::from("  mouse    - Drag over cells; click a header to toggle it"),
        Line::from(""),
        section("Saving:"),
        Line::from("  w        - Save your availability"),
        Line::from("  r        - Reload everyone's availability"),
        Line::from(""),
        section("Commands:"),
        Line::from("  :w       - Save"),
        Line::from("  :q / :q! - Quit / quit discarding unsaved changes"),
        Line::from("  :wq      - Save and quit"),
        Line::from("  :e       - Reload"),
        Line::from("  :join    - Join this proposal"),
        Line::from("  :leave   - Leave this proposal"),
        Line::from("  :day N   - Toggle the Nth day column"),
        Line::from("  :hour H  - Toggle clock hour H on every day"),
        Line::from("  :theme   - Change theme (:theme gruvbox)"),
        Line::from("  :help    - Show this help"),
        Line::from(""),
    ];

    let visible_lines = help_height.saturating_sub(3) as usize;
    let total_lines = help_text.len();
    let max_scroll = total_lines.saturating_sub(visible_lines);
    let scroll = app.help_scroll.min(max_scroll);

    let scrolled_text: Vec<Line> = help_text
        .into_iter()
        .skip(scroll)
        .take(visible_lines)
        .collect();

    let help_paragraph = Paragraph::new(scrolled_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!(" Help (j/k to scroll, q to close) [{}/{}] ", scroll + 1, total_lines))
            .style(Style::default().bg(Color::Black)))
        .alignment(Alignment::Left);

    f.render_widget(help_paragraph, help_area);
}
