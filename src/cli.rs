use std::{
    env,
    io::{self, Write},
    path::PathBuf,
    process::{Command, Stdio},
};

use meetgrid::{
    engine::GridCell,
    storage::store::AvailabilityStore,
    sync::{PlanSession, PlanView, RefreshOutcome},
    ui::theme::Theme,
};

pub const USAGE: &str = "Usage: meetgrid [--proposal ID] [--as PARTICIPANT] [--db PATH] [--config PATH] \
     [--summary] [--sample] [--discard ID]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub proposal: Option<String>,
    pub participant: Option<String>,
    pub summary: bool,
    pub sample: bool,
    /// Proposal to delete from the store, together with its roster and slots.
    pub discard: Option<String>,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{} requires a value", flag));
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--db" => parsed.db = Some(PathBuf::from(value("--db")?)),
            "--proposal" => parsed.proposal = Some(value("--proposal")?),
            "--as" => parsed.participant = Some(value("--as")?),
            "--summary" => parsed.summary = true,
            "--sample" => parsed.sample = true,
            "--discard" => parsed.discard = Some(value("--discard")?),
            "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    Ok(parsed)
}

pub async fn run_summary_mode<S: AvailabilityStore>(mut session: PlanSession<S>) -> Result<(), io::Error> {
    let outcome = session
        .refresh()
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;

    match (outcome, session.view()) {
        (RefreshOutcome::Loaded, Some(view)) => display_with_pager(&format_summary_text(view)),
        _ => {
            eprintln!("Proposal {} not found", session.proposal_id());
            Ok(())
        }
    }
}

pub fn format_summary_text(view: &PlanView) -> String {
    let mut lines = Vec::new();
    let title = if view.plan.title.is_empty() { "Untitled plan" } else { view.plan.title.as_str() };
    let offset = view.grid.codec().offset();
    let start = view.plan.proposal.start().with_timezone(&offset);
    let end = view.plan.proposal.end().with_timezone(&offset);

    lines.push(title.to_string());
    lines.push(format!(
        "Proposal: {} - {}",
        start.format("%a %b %d %H:%M"),
        end.format("%a %b %d %H:%M")
    ));
    lines.push(format!(
        "Participants: {} / {} (minimum {})",
        view.feasibility.participant_count, view.plan.proposal.quorum_max, view.feasibility.quorum_min
    ));
    lines.push(format!(
        "{} ({} free for the whole proposal)",
        view.feasibility.verdict.describe(),
        view.feasibility.compatible_count
    ));
    lines.push(String::new());

    let mut header = "      ".to_string();
    for day in view.grid.days() {
        header.push_str(&format!(" {:<6}", day.format("%a%d").to_string()));
    }
    lines.push(header.trim_end().to_string());

    for (hour_index, hour) in view.grid.hours().iter().enumerate() {
        let mut row = format!("{:02}:00 ", hour);
        for day_index in 0..view.grid.day_count() {
            let cell = GridCell::new(day_index, hour_index);
            let glyph = Theme::heat_glyph(view.occupancy.heat(cell));
            row.push_str(&format!(" {}{:<5}", glyph, view.occupancy.count(cell)));
        }
        lines.push(row.trim_end().to_string());
    }

    lines.join("\n")
}

fn display_with_pager(text: &str) -> Result<(), io::Error> {
    let pager_value = env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    page_through(&pager_value, text)
}

/// Pipes `text` into `pager` (a command line), printing it directly when no
/// pager can be started. A pager that exits early is not an error.
fn page_through(pager: &str, text: &str) -> Result<(), io::Error> {
    let mut parts = pager.split_whitespace();
    let Some(cmd) = parts.next() else {
        print!("{text}");
        return Ok(());
    };

    let mut child = match Command::new(cmd).args(parts).stdin(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::debug!("Pager {} unavailable: {}", cmd, e);
            print!("{text}");
            return Ok(());
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(text.as_bytes()) {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
    }

    let status = child.wait()?;
    if !status.success() {
        tracing::warn!("Pager {} exited with {}", cmd, status);
    }
    Ok(())
}
