pub mod slot;
pub mod proposal;
pub mod participant;

pub use slot::{SlotCodec, SlotError, TimeSlot};
pub use proposal::{Plan, Proposal, ProposalId, ProposalRecord, ValidationError, VotingWindow};
pub use participant::{Participant, ParticipantId, Role, resolve_display_name};
