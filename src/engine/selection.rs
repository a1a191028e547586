use crate::engine::availability::AvailabilitySet;
use crate::engine::grid::{Grid, GridCell};
use crate::plan::TimeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDirection {
    Add,
    Remove,
}

impl ToggleDirection {
    fn opposite_of(selected: bool) -> Self {
        if selected {
            ToggleDirection::Remove
        } else {
            ToggleDirection::Add
        }
    }

    fn apply(self, set: &mut AvailabilitySet, slots: &[TimeSlot]) -> usize {
        match self {
            ToggleDirection::Add => set.add_all(slots),
            ToggleDirection::Remove => set.remove_all(slots),
        }
    }
}

/// Rectangle of cells between two corners, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub first_day: usize,
    pub last_day: usize,
    pub first_hour: usize,
    pub last_hour: usize,
}

impl CellSpan {
    pub fn between(a: GridCell, b: GridCell) -> Self {
        Self {
            first_day: a.day.min(b.day),
            last_day: a.day.max(b.day),
            first_hour: a.hour.min(b.hour),
            last_hour: a.hour.max(b.hour),
        }
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        (self.first_day..=self.last_day).contains(&cell.day)
            && (self.first_hour..=self.last_hour).contains(&cell.hour)
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (self.first_day..=self.last_day).flat_map(move |day| {
            (self.first_hour..=self.last_hour).map(move |hour| GridCell { day, hour })
        })
    }

    pub fn cell_count(&self) -> usize {
        (self.last_day - self.first_day + 1) * (self.last_hour - self.first_hour + 1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: GridCell,
        end: GridCell,
        direction: ToggleDirection,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(GridCell),
    Move(GridCell),
    /// Button released anywhere, inside the grid or not.
    Release,
    /// Focus left the surface; resolves a pending drag like a release.
    Blur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub span: CellSpan,
    pub direction: ToggleDirection,
    pub changed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Ignored,
    Started {
        anchor: GridCell,
        direction: ToggleDirection,
        flushed: Option<Commit>,
    },
    Previewing(CellSpan),
    Committed(Commit),
}

/// Turns pointer events into rectangular toggles over the local set.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: DragState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn handle(&mut self, event: PointerEvent, grid: &Grid, set: &mut AvailabilitySet) -> SelectionOutcome {
        match event {
            PointerEvent::Press(cell) => {
                let Some(slot) = grid.slot(cell) else {
                    return SelectionOutcome::Ignored;
                };
                // A press without an observed release still resolves the old drag first.
                let flushed = self.commit(grid, set);
                let direction = ToggleDirection::opposite_of(set.contains(&slot));
                self.state = DragState::Dragging { anchor: cell, end: cell, direction };
                tracing::debug!("Drag started at {:?} ({:?})", cell, direction);
                SelectionOutcome::Started { anchor: cell, direction, flushed }
            }
            PointerEvent::Move(cell) => match &mut self.state {
                DragState::Dragging { anchor, end, .. } if grid.contains(cell) => {
                    *end = cell;
                    SelectionOutcome::Previewing(CellSpan::between(*anchor, cell))
                }
                _ => SelectionOutcome::Ignored,
            },
            PointerEvent::Release | PointerEvent::Blur => match self.commit(grid, set) {
                Some(commit) => SelectionOutcome::Committed(commit),
                None => SelectionOutcome::Ignored,
            },
        }
    }

    pub fn preview(&self) -> Option<(CellSpan, ToggleDirection)> {
        match self.state {
            DragState::Dragging { anchor, end, direction } => Some((CellSpan::between(anchor, end), direction)),
            DragState::Idle => None,
        }
    }

    /// What a cell should look like right now, with any live drag applied.
    pub fn is_effectively_selected(&self, cell: GridCell, grid: &Grid, set: &AvailabilitySet) -> bool {
        match self.preview() {
            Some((span, direction)) if span.contains(cell) => direction == ToggleDirection::Add,
            _ => grid.slot(cell).is_some_and(|slot| set.contains(&slot)),
        }
    }

    fn commit(&mut self, grid: &Grid, set: &mut AvailabilitySet) -> Option<Commit> {
        let DragState::Dragging { anchor, end, direction } = std::mem::take(&mut self.state) else {
            return None;
        };

        let span = CellSpan::between(anchor, end);
        let slots: Vec<TimeSlot> = span.cells().filter_map(|cell| grid.slot(cell)).collect();
        let changed = direction.apply(set, &slots);

        tracing::debug!("Committed {:?} over {} cells, {} changed", direction, span.cell_count(), changed);
        Some(Commit { span, direction, changed })
    }
}

/// Clears the day if every hour is already selected, otherwise fills it.
pub fn toggle_day(grid: &Grid, set: &mut AvailabilitySet, day: usize) -> Option<ToggleDirection> {
    if day >= grid.day_count() {
        return None;
    }
    Some(toggle_all(set, &grid.day_slots(day)))
}

/// Clears the hour across all days if fully selected, otherwise fills it.
pub fn toggle_hour(grid: &Grid, set: &mut AvailabilitySet, hour: usize) -> Option<ToggleDirection> {
    if hour >= grid.hour_count() {
        return None;
    }
    Some(toggle_all(set, &grid.hour_slots(hour)))
}

pub fn is_day_selected(grid: &Grid, set: &AvailabilitySet, day: usize) -> bool {
    let slots = grid.day_slots(day);
    !slots.is_empty() && set.contains_all(&slots)
}

pub fn is_hour_selected(grid: &Grid, set: &AvailabilitySet, hour: usize) -> bool {
    let slots = grid.hour_slots(hour);
    !slots.is_empty() && set.contains_all(&slots)
}

fn toggle_all(set: &mut AvailabilitySet, slots: &[TimeSlot]) -> ToggleDirection {
    let direction = if !slots.is_empty() && set.contains_all(slots) {
        ToggleDirection::Remove
    } else {
        ToggleDirection::Add
    };
    direction.apply(set, slots);
    direction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Proposal, SlotCodec, VotingWindow};
    use crate::engine::grid::HourAxis;
    use chrono::{NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn grid() -> Grid {
        Grid::from_dates(date(13), date(15), SlotCodec::utc()).unwrap()
    }

    fn cell(day: usize, hour: usize) -> GridCell {
        GridCell::new(day, hour)
    }

    fn drag(controller: &mut SelectionController, grid: &Grid, set: &mut AvailabilitySet, path: &[GridCell]) {
        controller.handle(PointerEvent::Press(path[0]), grid, set);
        for step in &path[1..] {
            controller.handle(PointerEvent::Move(*step), grid, set);
        }
    }

    #[test]
    fn press_on_unselected_cell_starts_add_drag() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        let outcome = controller.handle(PointerEvent::Press(cell(0, 9)), &grid, &mut set);

        assert_eq!(
            outcome,
            SelectionOutcome::Started { anchor: cell(0, 9), direction: ToggleDirection::Add, flushed: None }
        );
        assert!(controller.is_dragging());
    }

    #[test]
    fn preview_does_not_mutate_set() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(0, 9), cell(2, 11)]);

        assert!(set.is_empty());
        assert!(controller.is_effectively_selected(cell(1, 10), &grid, &set));
        assert!(!controller.is_effectively_selected(cell(1, 12), &grid, &set));
    }

    #[test]
    fn release_commits_full_rectangle() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(2, 11), cell(0, 9)]);
        let outcome = controller.handle(PointerEvent::Release, &grid, &mut set);

        let SelectionOutcome::Committed(commit) = outcome else {
            panic!("expected a commit, got {:?}", outcome);
        };
        assert_eq!(commit.changed, 9);
        assert_eq!(set.len(), 9);
        assert_eq!(controller.state(), DragState::Idle);
    }

    #[test]
    fn drag_from_selected_anchor_removes_span() {
        let grid = grid();
        let mut set: AvailabilitySet = grid.day_slots(1).into();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(1, 9), cell(1, 12)]);
        controller.handle(PointerEvent::Release, &grid, &mut set);

        assert_eq!(set.len(), 20);
        assert!(!set.contains(&grid.slot(cell(1, 10)).unwrap()));
    }

    #[test]
    fn remove_drag_over_unselected_cells_leaves_them_unselected() {
        let grid = grid();
        let mut set: AvailabilitySet = vec![grid.slot(cell(0, 9)).unwrap()].into();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(0, 9), cell(1, 10)]);
        controller.handle(PointerEvent::Release, &grid, &mut set);

        assert!(set.is_empty());
    }

    #[test]
    fn blur_commits_like_release() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(0, 0), cell(0, 1)]);
        let outcome = controller.handle(PointerEvent::Blur, &grid, &mut set);

        assert!(matches!(outcome, SelectionOutcome::Committed(_)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn moves_outside_grid_keep_last_end_cell() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(0, 0), cell(0, 2), cell(7, 30)]);
        controller.handle(PointerEvent::Release, &grid, &mut set);

        assert_eq!(set.len(), 3);
    }

    #[test]
    fn release_and_move_while_idle_are_ignored() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        assert_eq!(controller.handle(PointerEvent::Release, &grid, &mut set), SelectionOutcome::Ignored);
        assert_eq!(controller.handle(PointerEvent::Move(cell(0, 0)), &grid, &mut set), SelectionOutcome::Ignored);
        assert!(set.is_empty());
    }

    #[test]
    fn press_outside_grid_is_ignored() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        let outcome = controller.handle(PointerEvent::Press(cell(3, 0)), &grid, &mut set);

        assert_eq!(outcome, SelectionOutcome::Ignored);
        assert!(!controller.is_dragging());
    }

    #[test]
    fn press_during_drag_flushes_pending_selection() {
        let grid = grid();
        let mut set = AvailabilitySet::new();
        let mut controller = SelectionController::new();

        drag(&mut controller, &grid, &mut set, &[cell(0, 0), cell(0, 1)]);
        let outcome = controller.handle(PointerEvent::Press(cell(0, 1)), &grid, &mut set);

        let SelectionOutcome::Started { direction, flushed, .. } = outcome else {
            panic!("expected a new drag, got {:?}", outcome);
        };
        assert_eq!(flushed.map(|c| c.changed), Some(2));
        assert_eq!(direction, ToggleDirection::Remove);
    }

    #[test]
    fn toggle_day_fills_then_clears() {
        let grid = grid();
        let mut set: AvailabilitySet = vec![grid.slot(cell(1, 3)).unwrap()].into();

        assert_eq!(toggle_day(&grid, &mut set, 1), Some(ToggleDirection::Add));
        assert!(is_day_selected(&grid, &set, 1));
        assert_eq!(set.len(), 24);

        assert_eq!(toggle_day(&grid, &mut set, 1), Some(ToggleDirection::Remove));
        assert!(set.is_empty());
    }

    #[test]
    fn toggle_out_of_range_does_nothing() {
        let grid = grid();
        let mut set = AvailabilitySet::new();

        assert_eq!(toggle_day(&grid, &mut set, 3), None);
        assert_eq!(toggle_hour(&grid, &mut set, 24), None);
        assert!(set.is_empty());
    }

    #[test]
    fn toggle_whole_hour_on_single_day_proposal_selects_every_day() {
        let window = VotingWindow::new(date(13), date(15)).unwrap();
        let proposal = Proposal::new(
            Utc.with_ymd_and_hms(2025, 1, 14, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 14, 9, 30, 0).unwrap(),
            1,
            5,
        )
        .unwrap();
        let grid = Grid::generate(&window, Some(&proposal), SlotCodec::utc(), HourAxis::Full);
        let mut set = AvailabilitySet::new();

        toggle_hour(&grid, &mut set, 9);

        assert_eq!(set.to_vec(), grid.hour_slots(9));
        assert!(is_hour_selected(&grid, &set, 9));
        assert!(set.contains_all(&proposal.needed_slots(grid.codec())));
    }

    proptest! {
        #[test]
        fn commit_depends_only_on_anchor_and_last_cell(
            anchor in (0usize..3, 0usize..24),
            path in proptest::collection::vec((0usize..3, 0usize..24), 0..12),
            last in (0usize..3, 0usize..24),
            preselected in proptest::collection::vec((0usize..3, 0usize..24), 0..20),
        ) {
            let grid = grid();
            let mut set: AvailabilitySet = preselected
                .iter()
                .filter_map(|(d, h)| grid.slot(cell(*d, *h)))
                .collect();
            let anchor = cell(anchor.0, anchor.1);
            let last = cell(last.0, last.1);
            let anchor_was_selected = set.contains(&grid.slot(anchor).unwrap());
            let mut controller = SelectionController::new();

            controller.handle(PointerEvent::Press(anchor), &grid, &mut set);
            for (d, h) in &path {
                controller.handle(PointerEvent::Move(cell(*d, *h)), &grid, &mut set);
            }
            controller.handle(PointerEvent::Move(last), &grid, &mut set);
            controller.handle(PointerEvent::Release, &grid, &mut set);

            for span_cell in CellSpan::between(anchor, last).cells() {
                let slot = grid.slot(span_cell).unwrap();
                prop_assert_eq!(set.contains(&slot), !anchor_was_selected);
            }
        }
    }
}
