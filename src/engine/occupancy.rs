use std::collections::HashMap;

use crate::engine::availability::Participation;
use crate::engine::grid::{Grid, GridCell};
use crate::plan::TimeSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatLevel {
    None,
    Few,
    Half,
    Majority,
    All,
}

impl HeatLevel {
    pub fn classify(count: usize, total: usize) -> Self {
        let total = total.max(1);
        if count == 0 {
            return HeatLevel::None;
        }
        if count >= total {
            return HeatLevel::All;
        }
        let ratio = count as f32 / total as f32;
        if ratio < 0.4 {
            HeatLevel::Few
        } else if ratio < 0.7 {
            HeatLevel::Half
        } else {
            HeatLevel::Majority
        }
    }
}

/// Shading strength in `[0.05, 0.90]` for any non-zero count.
pub fn intensity(count: usize, total: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let ratio = (count as f32 / total.max(1) as f32).min(1.0);
    0.05 + ratio * 0.85
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotOccupancy {
    pub count: usize,
    pub names: Vec<String>,
}

/// Coverage counts for every cell of a grid, recomputed from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyMap {
    hour_count: usize,
    cells: Vec<SlotOccupancy>,
    index: HashMap<TimeSlot, usize>,
    day_peaks: Vec<usize>,
    hour_peaks: Vec<usize>,
    participant_count: usize,
}

impl OccupancyMap {
    pub fn compute(grid: &Grid, participations: &[Participation]) -> Self {
        let hour_count = grid.hour_count();
        let mut cells = Vec::with_capacity(grid.cell_count());
        let mut index = HashMap::with_capacity(grid.cell_count());
        let mut day_peaks = vec![0; grid.day_count()];
        let mut hour_peaks = vec![0; hour_count];

        for cell in grid.cells() {
            let Some(slot) = grid.slot(cell) else { continue };

            let names: Vec<String> = participations
                .iter()
                .filter(|p| p.availability.contains(&slot))
                .map(|p| p.participant.display_name.clone())
                .collect();
            let count = names.len();

            day_peaks[cell.day] = day_peaks[cell.day].max(count);
            hour_peaks[cell.hour] = hour_peaks[cell.hour].max(count);
            index.insert(slot, cells.len());
            cells.push(SlotOccupancy { count, names });
        }

        tracing::debug!(
            "Recomputed occupancy over {} cells for {} participants",
            cells.len(),
            participations.len()
        );

        Self {
            hour_count,
            cells,
            index,
            day_peaks,
            hour_peaks,
            participant_count: participations.len(),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    pub fn cell(&self, cell: GridCell) -> Option<&SlotOccupancy> {
        if cell.hour >= self.hour_count {
            return None;
        }
        self.cells.get(cell.day * self.hour_count + cell.hour)
    }

    pub fn count(&self, cell: GridCell) -> usize {
        self.cell(cell).map(|occupancy| occupancy.count).unwrap_or(0)
    }

    pub fn lookup(&self, slot: &TimeSlot) -> Option<&SlotOccupancy> {
        self.index.get(slot).and_then(|i| self.cells.get(*i))
    }

    pub fn day_peak(&self, day: usize) -> usize {
        self.day_peaks.get(day).copied().unwrap_or(0)
    }

    pub fn hour_peak(&self, hour: usize) -> usize {
        self.hour_peaks.get(hour).copied().unwrap_or(0)
    }

    pub fn heat(&self, cell: GridCell) -> HeatLevel {
        HeatLevel::classify(self.count(cell), self.participant_count)
    }
}
