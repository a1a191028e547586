pub mod availability;
pub mod feasibility;
pub mod grid;
pub mod occupancy;
pub mod selection;

pub use availability::{AvailabilitySet, Participation};
pub use feasibility::{FeasibilityResult, Verdict};
pub use grid::{Grid, GridCell, HourAxis};
pub use occupancy::{HeatLevel, OccupancyMap, SlotOccupancy};
pub use selection::{CellSpan, DragState, PointerEvent, SelectionController, SelectionOutcome, ToggleDirection};
