use thiserror::Error;

use crate::engine::feasibility::{self, FeasibilityResult};
use crate::engine::selection::{self, SelectionOutcome};
use crate::engine::{
    AvailabilitySet, Grid, GridCell, HourAxis, OccupancyMap, Participation, PointerEvent, SelectionController,
    ToggleDirection,
};
use crate::plan::{Participant, Plan, ProposalId, SlotCodec, SlotError, ValidationError};
use crate::storage::config::Config;
use crate::storage::store::{AvailabilityStore, SaveRequest, StoreError};
use crate::sync::notify::ChangeNotice;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid proposal: {0}")]
    Validation(#[from] ValidationError),
    #[error("No proposal loaded yet")]
    NotLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded,
    /// The proposal no longer exists; whatever was shown stays as it was.
    ProposalGone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub codec: SlotCodec,
    pub axis: HourAxis,
    pub default_proposal_hours: u32,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Result<Self, SlotError> {
        Ok(Self {
            codec: config.codec()?,
            axis: config.hour_axis(),
            default_proposal_hours: config.grid.default_proposal_hours,
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            codec: SlotCodec::utc(),
            axis: HourAxis::Full,
            default_proposal_hours: 4,
        }
    }
}

/// Everything derived from one fetch: recomputed whole, never patched.
#[derive(Debug, Clone)]
pub struct PlanView {
    pub plan: Plan,
    pub grid: Grid,
    pub participations: Vec<Participation>,
    pub occupancy: OccupancyMap,
    pub feasibility: FeasibilityResult,
}

/// One participant's editing session on one proposal.
pub struct PlanSession<S: AvailabilityStore> {
    store: S,
    proposal_id: ProposalId,
    me: Participant,
    settings: SessionSettings,
    view: Option<PlanView>,
    local: AvailabilitySet,
    selection: SelectionController,
    is_member: bool,
    dirty: bool,
}

impl<S: AvailabilityStore> PlanSession<S> {
    pub fn new(store: S, proposal_id: ProposalId, me: Participant, settings: SessionSettings) -> Self {
        Self {
            store,
            proposal_id,
            me,
            settings,
            view: None,
            local: AvailabilitySet::new(),
            selection: SelectionController::new(),
            is_member: false,
            dirty: false,
        }
    }

    pub fn proposal_id(&self) -> &ProposalId {
        &self.proposal_id
    }

    pub fn participant(&self) -> &Participant {
        &self.me
    }

    pub fn view(&self) -> Option<&PlanView> {
        self.view.as_ref()
    }

    pub fn local(&self) -> &AvailabilitySet {
        &self.local
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selected_count(&self) -> usize {
        self.local.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_member(&self) -> bool {
        self.is_member
    }

    pub fn is_effectively_selected(&self, cell: GridCell) -> bool {
        self.view
            .as_ref()
            .is_some_and(|view| self.selection.is_effectively_selected(cell, &view.grid, &self.local))
    }

    /// Full re-fetch. Unsaved local edits survive; everyone else's rows are replaced.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, SessionError> {
        let Some(record) = self.store.fetch_proposal(&self.proposal_id).await? else {
            tracing::warn!("Proposal {} is gone; keeping the current view", self.proposal_id);
            return Ok(RefreshOutcome::ProposalGone);
        };

        let plan = Plan::from_record(&record, &self.settings.codec, self.settings.default_proposal_hours)?;
        let roster = self.store.fetch_roster(&self.proposal_id).await?;
        let mut availability = self.store.fetch_availability(&self.proposal_id).await?;

        self.is_member = roster.iter().any(|p| p.participant_id == self.me.participant_id);
        if !self.dirty {
            self.local = availability
                .remove(&self.me.participant_id)
                .map(AvailabilitySet::from)
                .unwrap_or_default();
        }

        let participations: Vec<Participation> = roster
            .into_iter()
            .map(|participant| {
                let set = if participant.participant_id == self.me.participant_id {
                    self.local.clone()
                } else {
                    availability
                        .remove(&participant.participant_id)
                        .map(AvailabilitySet::from)
                        .unwrap_or_default()
                };
                Participation::new(participant, set)
            })
            .collect();

        let grid = Grid::for_plan(&plan, self.settings.codec, self.settings.axis);
        let occupancy = OccupancyMap::compute(&grid, &participations);
        let feasibility = feasibility::check(&plan.proposal, grid.codec(), &participations);
        self.view = Some(PlanView { plan, grid, participations, occupancy, feasibility });

        tracing::info!(
            "Loaded {} with {} participants ({} local slots{})",
            self.proposal_id,
            self.view.as_ref().map_or(0, |v| v.participations.len()),
            self.local.len(),
            if self.dirty { ", unsaved" } else { "" }
        );
        Ok(RefreshOutcome::Loaded)
    }

    /// Notices for other proposals are ignored, and so are notices for our
    /// own writes: `save`, `join` and `leave` refresh already.
    pub async fn handle_notice(&mut self, notice: &ChangeNotice) -> Result<Option<RefreshOutcome>, SessionError> {
        if notice.proposal_id != self.proposal_id {
            return Ok(None);
        }
        if notice.origin.as_ref() == Some(&self.me.participant_id) {
            tracing::debug!("Skipping notice for own write on {}", self.proposal_id);
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    /// Asks the store to announce writes made elsewhere; they arrive as notices.
    pub async fn poll_store(&self) -> Result<usize, SessionError> {
        Ok(self.store.poll_changes().await?)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<SelectionOutcome, SessionError> {
        let view = self.view.as_ref().ok_or(SessionError::NotLoaded)?;
        let outcome = self.selection.handle(event, &view.grid, &mut self.local);

        let changed = match outcome {
            SelectionOutcome::Committed(commit) => commit.changed,
            SelectionOutcome::Started { flushed: Some(commit), .. } => commit.changed,
            _ => 0,
        };
        if changed > 0 {
            self.mark_edited();
        }
        Ok(outcome)
    }

    pub fn toggle_day(&mut self, day: usize) -> Result<Option<ToggleDirection>, SessionError> {
        let view = self.view.as_ref().ok_or(SessionError::NotLoaded)?;
        let direction = selection::toggle_day(&view.grid, &mut self.local, day);
        if direction.is_some() {
            self.mark_edited();
        }
        Ok(direction)
    }

    pub fn toggle_hour(&mut self, hour: usize) -> Result<Option<ToggleDirection>, SessionError> {
        let view = self.view.as_ref().ok_or(SessionError::NotLoaded)?;
        let direction = selection::toggle_hour(&view.grid, &mut self.local, hour);
        if direction.is_some() {
            self.mark_edited();
        }
        Ok(direction)
    }

    /// Replaces the persisted set with the local one. On failure the local
    /// set and the dirty flag are kept so the save can be retried.
    pub async fn save(&mut self) -> Result<RefreshOutcome, SessionError> {
        if self.selection.is_dragging() {
            self.handle_pointer(PointerEvent::Release)?;
        }

        let request = SaveRequest {
            participant_id: self.me.participant_id.clone(),
            proposal_id: self.proposal_id.clone(),
            slots: self.local.to_vec(),
        };
        if let Err(e) = self.store.save_availability(request).await {
            tracing::error!("Saving availability for {} failed: {}", self.me.participant_id, e);
            return Err(e.into());
        }

        self.dirty = false;
        self.refresh().await
    }

    pub async fn join(&mut self) -> Result<RefreshOutcome, SessionError> {
        self.store.join(&self.proposal_id, &self.me).await?;
        self.refresh().await
    }

    pub async fn leave(&mut self) -> Result<RefreshOutcome, SessionError> {
        self.store.leave(&self.proposal_id, &self.me.participant_id).await?;
        self.local = AvailabilitySet::new();
        self.selection = SelectionController::new();
        self.dirty = false;
        self.refresh().await
    }

    fn mark_edited(&mut self) {
        self.dirty = true;
        self.recompute();
    }

    /// The local row counts with its unsaved edits so heat and feasibility
    /// show what a save would produce.
    fn recompute(&mut self) {
        let Some(view) = self.view.as_mut() else { return };

        for participation in view.participations.iter_mut() {
            if participation.participant.participant_id == self.me.participant_id {
                participation.availability = self.local.clone();
            }
        }
        view.occupancy = OccupancyMap::compute(&view.grid, &view.participations);
        view.feasibility = feasibility::check(&view.plan.proposal, view.grid.codec(), &view.participations);
    }
}
