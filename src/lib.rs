pub mod plan;
pub mod engine;
pub mod input;
pub mod ui;
pub mod sync;
pub mod storage;
pub mod app;

pub use plan::{Participant, ParticipantId, Plan, ProposalId, ProposalRecord, SlotCodec, TimeSlot};
pub use engine::{AvailabilitySet, FeasibilityResult, Grid, GridCell, OccupancyMap, SelectionController};
pub use app::{AppState, Mode, SaveStatus};
