use chrono::NaiveDate;

use crate::plan::{Plan, Proposal, SlotCodec, TimeSlot, ValidationError, VotingWindow};

const HOURS_PER_DAY: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub day: usize,
    pub hour: usize,
}

impl GridCell {
    pub fn new(day: usize, hour: usize) -> Self {
        Self { day, hour }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HourAxis {
    #[default]
    Full,
    /// Single-day windows only show the hours the proposal covers.
    NarrowSingleDay,
}

/// Days x hours matrix for one voting window.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    codec: SlotCodec,
    days: Vec<NaiveDate>,
    hours: Vec<u32>,
}

impl Grid {
    pub fn generate(
        window: &VotingWindow,
        proposal: Option<&Proposal>,
        codec: SlotCodec,
        axis: HourAxis,
    ) -> Self {
        let days = window.days();
        let hours = match (axis, proposal) {
            (HourAxis::NarrowSingleDay, Some(proposal)) if window.is_single_day() => {
                narrowed_hours(window, proposal, &codec).unwrap_or_else(full_hours)
            }
            _ => full_hours(),
        };

        tracing::debug!(
            "Generated grid {} - {} with {} days x {} hours",
            window.start(),
            window.end(),
            days.len(),
            hours.len()
        );

        Self { codec, days, hours }
    }

    pub fn for_plan(plan: &Plan, codec: SlotCodec, axis: HourAxis) -> Self {
        Self::generate(&plan.window, Some(&plan.proposal), codec, axis)
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate, codec: SlotCodec) -> Result<Self, ValidationError> {
        let window = VotingWindow::new(start, end)?;
        Ok(Self::generate(&window, None, codec, HourAxis::Full))
    }

    pub fn codec(&self) -> &SlotCodec {
        &self.codec
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn hour_count(&self) -> usize {
        self.hours.len()
    }

    pub fn cell_count(&self) -> usize {
        self.days.len() * self.hours.len()
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        cell.day < self.days.len() && cell.hour < self.hours.len()
    }

    pub fn slot(&self, cell: GridCell) -> Option<TimeSlot> {
        let day = self.days.get(cell.day)?;
        let hour = self.hours.get(cell.hour)?;
        Some(self.codec.slot_id(*day, *hour))
    }

    pub fn cell_of(&self, slot: TimeSlot) -> Option<GridCell> {
        let (day, hour) = self.codec.day_hour(slot);
        let day = self.days.binary_search(&day).ok()?;
        let hour = self.hours.binary_search(&hour).ok()?;
        Some(GridCell { day, hour })
    }

    /// Row-major: every hour of the first day, then the next day.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.days.len())
            .flat_map(move |day| (0..self.hours.len()).map(move |hour| GridCell { day, hour }))
    }

    pub fn day_slots(&self, day: usize) -> Vec<TimeSlot> {
        (0..self.hours.len())
            .filter_map(|hour| self.slot(GridCell { day, hour }))
            .collect()
    }

    pub fn hour_slots(&self, hour: usize) -> Vec<TimeSlot> {
        (0..self.days.len())
            .filter_map(|day| self.slot(GridCell { day, hour }))
            .collect()
    }
}

fn full_hours() -> Vec<u32> {
    (0..HOURS_PER_DAY).collect()
}

fn narrowed_hours(window: &VotingWindow, proposal: &Proposal, codec: &SlotCodec) -> Option<Vec<u32>> {
    let covered: Vec<(NaiveDate, u32)> = proposal
        .needed_slots(codec)
        .into_iter()
        .map(|slot| codec.day_hour(slot))
        .collect();

    if covered.iter().any(|(day, _)| *day != window.start()) {
        tracing::debug!("Proposal leaves the single voting day; keeping the full hour axis");
        return None;
    }

    let first = covered.first()?.1;
    let last = covered.last()?.1;
    Some((first..=last).collect())
}
