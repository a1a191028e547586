use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::plan::slot::{SlotCodec, TimeSlot};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Voting window ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("Proposal ends ({end}) before it starts ({start})")]
    InvalidProposal { start: DateTime<Utc>, end: DateTime<Utc> },
    #[error("Proposal {start} - {end} lies outside the voting window")]
    ProposalOutsideWindow { start: DateTime<Utc>, end: DateTime<Utc> },
    #[error("Minimum attendance {min} exceeds capacity {max}")]
    InvalidQuorum { min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive span of calendar days on which availability can be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl VotingWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take_while(|day| *day <= self.end).collect()
    }

    pub fn day_count(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }
}

/// The organizer's suggested `[start, end)` interval plus attendance bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    pub quorum_min: u32,
    pub quorum_max: u32,
}

impl Proposal {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        quorum_min: u32,
        quorum_max: u32,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidProposal { start, end });
        }
        if quorum_min > quorum_max {
            return Err(ValidationError::InvalidQuorum { min: quorum_min, max: quorum_max });
        }
        Ok(Self { start, end, quorum_min, quorum_max })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn needed_slots(&self, codec: &SlotCodec) -> Vec<TimeSlot> {
        codec.slots_covering(self.start, self.end)
    }
}

/// Proposal as read from the meeting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    pub id: ProposalId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub voting_window_start: Option<NaiveDate>,
    #[serde(default)]
    pub voting_window_end: Option<NaiveDate>,
    pub proposal_start: DateTime<Utc>,
    #[serde(default)]
    pub proposal_end: Option<DateTime<Utc>>,
    pub quorum_min: u32,
    pub quorum_max: u32,
}

/// A validated proposal together with the window it is voted in.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: ProposalId,
    pub title: String,
    pub window: VotingWindow,
    pub proposal: Proposal,
}

impl Plan {
    pub fn from_record(
        record: &ProposalRecord,
        codec: &SlotCodec,
        default_proposal_hours: u32,
    ) -> Result<Self, ValidationError> {
        let start = record.proposal_start;
        let end = record
            .proposal_end
            .unwrap_or_else(|| start + Duration::hours(i64::from(default_proposal_hours)));
        let proposal = Proposal::new(start, end, record.quorum_min, record.quorum_max)?;

        // Bounds only: the covering list can be huge for a malformed end.
        let first_day = codec.day_hour(codec.floor(start)).0;
        let last_day = codec.day_hour(codec.last_covering(start, end)).0;

        let window = VotingWindow::new(
            record.voting_window_start.unwrap_or(first_day),
            record.voting_window_end.unwrap_or(last_day),
        )?;

        if !window.contains(first_day) || !window.contains(last_day) {
            return Err(ValidationError::ProposalOutsideWindow { start, end });
        }

        Ok(Self {
            id: record.id.clone(),
            title: record.title.clone(),
            window,
            proposal,
        })
    }
}
