use ratatui::layout::Rect;
use std::ops::Range;

use crate::app::AppState;
use crate::engine::occupancy::intensity;
use crate::engine::selection::{is_day_selected, is_hour_selected};
use crate::engine::{AvailabilitySet, GridCell, HeatLevel, SelectionController, ToggleDirection};
use crate::sync::PlanView;

pub const HOUR_LABEL_WIDTH: u16 = 7;
pub const HEADER_ROWS: u16 = 1;
const MIN_COLUMN_WIDTH: u16 = 5;
const MAX_COLUMN_WIDTH: u16 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridHit {
    Cell(GridCell),
    DayHeader(usize),
    HourLabel(usize),
}

/// Where the grid sits on screen, for drawing and for mouse hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub area: Rect,
    pub column_width: u16,
    pub first_day: usize,
    pub day_count: usize,
    pub first_hour: usize,
    pub hour_count: usize,
}

impl GridGeometry {
    /// Days page sideways so the cursor column is always visible; hours
    /// scroll from `hour_offset`.
    pub fn compute(area: Rect, days: usize, hours: usize, cursor: GridCell, hour_offset: usize) -> Self {
        let usable = area.width.saturating_sub(HOUR_LABEL_WIDTH);
        let fitting = (usable / MIN_COLUMN_WIDTH).max(1) as usize;
        let shown_days = days.min(fitting).max(1);
        let column_width = (usable / shown_days as u16).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);

        let first_day = (cursor.day / shown_days) * shown_days;
        let day_count = shown_days.min(days.saturating_sub(first_day));

        let rows = area.height.saturating_sub(HEADER_ROWS) as usize;
        let first_hour = hour_offset.min(hours.saturating_sub(1));
        let hour_count = rows.min(hours.saturating_sub(first_hour));

        Self { area, column_width, first_day, day_count, first_hour, hour_count }
    }

    pub fn visible_days(&self) -> Range<usize> {
        self.first_day..self.first_day + self.day_count
    }

    pub fn visible_hours(&self) -> Range<usize> {
        self.first_hour..self.first_hour + self.hour_count
    }

    pub fn visible_rows(&self) -> usize {
        self.area.height.saturating_sub(HEADER_ROWS) as usize
    }

    pub fn hit_test(&self, column: u16, row: u16) -> Option<GridHit> {
        let area = self.area;
        if column < area.x || row < area.y || column >= area.x + area.width || row >= area.y + area.height {
            return None;
        }
        let dx = column - area.x;
        let dy = row - area.y;

        let day = if dx >= HOUR_LABEL_WIDTH {
            let index = ((dx - HOUR_LABEL_WIDTH) / self.column_width) as usize;
            (index < self.day_count).then_some(self.first_day + index)
        } else {
            None
        };
        let hour = if dy >= HEADER_ROWS {
            let index = (dy - HEADER_ROWS) as usize;
            (index < self.hour_count).then_some(self.first_hour + index)
        } else {
            None
        };

        match (day, hour) {
            (Some(day), Some(hour)) => Some(GridHit::Cell(GridCell::new(day, hour))),
            (Some(day), None) => Some(GridHit::DayHeader(day)),
            (None, Some(hour)) if dx < HOUR_LABEL_WIDTH => Some(GridHit::HourLabel(hour)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub days: Vec<DayHeader>,
    pub rows: Vec<HourRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayHeader {
    pub day: usize,
    pub label: String,
    pub peak: usize,
    pub fully_selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourRow {
    pub hour: usize,
    pub label: String,
    pub peak: usize,
    pub fully_selected: bool,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub cell: GridCell,
    pub count: usize,
    pub heat: HeatLevel,
    pub intensity: f32,
    pub selected: bool,
    pub preview: Option<ToggleDirection>,
    pub is_cursor: bool,
    pub in_proposal: bool,
}

pub fn calculate_layout(
    view: &PlanView,
    selection: &SelectionController,
    local: &AvailabilitySet,
    app: &AppState,
    geometry: &GridGeometry,
) -> GridLayout {
    let grid = &view.grid;
    let total = view.occupancy.participant_count();
    let preview = selection.preview();

    let days = geometry
        .visible_days()
        .filter_map(|day| {
            let date = grid.days().get(day)?;
            Some(DayHeader {
                day,
                label: date.format("%a %d").to_string(),
                peak: view.occupancy.day_peak(day),
                fully_selected: is_day_selected(grid, local, day),
            })
        })
        .collect();

    let rows = geometry
        .visible_hours()
        .filter_map(|hour| {
            let label = format!("{:02}:00", grid.hours().get(hour)?);
            let cells = geometry
                .visible_days()
                .filter_map(|day| {
                    let cell = GridCell::new(day, hour);
                    let slot = grid.slot(cell)?;
                    let count = view.occupancy.count(cell);
                    Some(CellView {
                        cell,
                        count,
                        heat: view.occupancy.heat(cell),
                        intensity: intensity(count, total),
                        selected: selection.is_effectively_selected(cell, grid, local),
                        preview: preview.filter(|(span, _)| span.contains(cell)).map(|(_, direction)| direction),
                        is_cursor: cell == app.cursor,
                        in_proposal: view.feasibility.needed_slots.contains(&slot),
                    })
                })
                .collect();

            Some(HourRow {
                hour,
                label,
                peak: view.occupancy.hour_peak(hour),
                fully_selected: is_hour_selected(grid, local, hour),
                cells,
            })
        })
        .collect();

    GridLayout { days, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::feasibility;
    use crate::engine::{Grid, HourAxis, OccupancyMap, Participation, PointerEvent};
    use crate::plan::{Participant, Plan, ProposalId, ProposalRecord, Role, SlotCodec};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn rect(width: u16, height: u16) -> Rect {
        Rect { x: 1, y: 1, width, height }
    }

    fn plan_view(participations: Vec<Participation>) -> PlanView {
        let record = ProposalRecord {
            id: ProposalId::new("p1"),
            title: "Dinner".to_string(),
            voting_window_start: NaiveDate::from_ymd_opt(2025, 1, 13),
            voting_window_end: NaiveDate::from_ymd_opt(2025, 1, 15),
            proposal_start: Utc.with_ymd_and_hms(2025, 1, 14, 18, 0, 0).unwrap(),
            proposal_end: Some(Utc.with_ymd_and_hms(2025, 1, 14, 20, 0, 0).unwrap()),
            quorum_min: 1,
            quorum_max: 4,
        };
        let codec = SlotCodec::utc();
        let plan = Plan::from_record(&record, &codec, 4).unwrap();
        let grid = Grid::for_plan(&plan, codec, HourAxis::Full);
        let occupancy = OccupancyMap::compute(&grid, &participations);
        let feasibility = feasibility::check(&plan.proposal, &codec, &participations);
        PlanView { plan, grid, participations, occupancy, feasibility }
    }

    #[test]
    fn geometry_fits_all_days_when_wide_enough() {
        let geometry = GridGeometry::compute(rect(80, 30), 3, 24, GridCell::new(0, 0), 0);

        assert_eq!(geometry.visible_days(), 0..3);
        assert_eq!(geometry.column_width, 9);
        assert_eq!(geometry.visible_hours(), 0..24);
    }

    #[test]
    fn narrow_area_pages_days_around_cursor() {
        let geometry = GridGeometry::compute(rect(7 + 5 * 4, 10), 10, 24, GridCell::new(6, 0), 0);

        assert_eq!(geometry.visible_days(), 4..8);
        assert_eq!(geometry.visible_rows(), 9);
    }

    #[test]
    fn short_area_shows_hours_from_offset() {
        let geometry = GridGeometry::compute(rect(80, 9), 3, 24, GridCell::new(0, 0), 18);

        assert_eq!(geometry.visible_hours(), 18..24);
    }

    #[test]
    fn hit_test_resolves_cells_headers_and_labels() {
        let geometry = GridGeometry::compute(rect(80, 30), 3, 24, GridCell::new(0, 0), 0);

        assert_eq!(geometry.hit_test(1 + 7, 1 + 1), Some(GridHit::Cell(GridCell::new(0, 0))));
        assert_eq!(geometry.hit_test(1 + 7 + 9 * 2 + 3, 1 + 1 + 18), Some(GridHit::Cell(GridCell::new(2, 18))));
        assert_eq!(geometry.hit_test(1 + 7 + 9, 1), Some(GridHit::DayHeader(1)));
        assert_eq!(geometry.hit_test(2, 1 + 1 + 9), Some(GridHit::HourLabel(9)));
        assert_eq!(geometry.hit_test(2, 1), None);
        assert_eq!(geometry.hit_test(0, 0), None);
    }

    #[test]
    fn hit_test_past_last_column_is_nothing() {
        let geometry = GridGeometry::compute(rect(80, 30), 3, 24, GridCell::new(0, 0), 0);

        assert_eq!(geometry.hit_test(1 + 7 + 9 * 3 + 1, 5), None);
    }

    #[test]
    fn layout_marks_proposal_cursor_and_counts() {
        let codec = SlotCodec::utc();
        let ana_slot = codec.slot_id(NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(), 18);
        let view = plan_view(vec![Participation::new(
            Participant::new("ana", "Ana", Role::Attendee),
            vec![ana_slot].into(),
        )]);
        let mut app = AppState::new();
        app.cursor = GridCell::new(1, 18);
        let geometry = GridGeometry::compute(rect(80, 30), 3, 24, app.cursor, 0);

        let layout = calculate_layout(&view, &SelectionController::new(), &AvailabilitySet::new(), &app, &geometry);

        let cell = &layout.rows[18].cells[1];
        assert!(cell.is_cursor);
        assert!(cell.in_proposal);
        assert_eq!(cell.count, 1);
        assert_eq!(cell.heat, HeatLevel::All);
        assert!(!layout.rows[20].cells[1].in_proposal);
        assert_eq!(layout.days[1].label, "Tue 14");
        assert_eq!(layout.days[1].peak, 1);
        assert_eq!(layout.rows[18].label, "18:00");
    }

    #[test]
    fn layout_shows_drag_preview_without_touching_set() {
        let view = plan_view(vec![]);
        let app = AppState::new();
        let geometry = GridGeometry::compute(rect(80, 30), 3, 24, app.cursor, 0);
        let mut selection = SelectionController::new();
        let mut local = AvailabilitySet::new();
        selection.handle(PointerEvent::Press(GridCell::new(0, 1)), &view.grid, &mut local);
        selection.handle(PointerEvent::Move(GridCell::new(1, 2)), &view.grid, &mut local);

        let layout = calculate_layout(&view, &selection, &local, &app, &geometry);

        assert_eq!(layout.rows[2].cells[1].preview, Some(ToggleDirection::Add));
        assert!(layout.rows[2].cells[1].selected);
        assert_eq!(layout.rows[3].cells[1].preview, None);
        assert!(local.is_empty());
    }
}
