use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::plan::{ParticipantId, ProposalId};

const DEFAULT_CAPACITY: usize = 64;

/// Opaque "something changed" signal for one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub proposal_id: ProposalId,
    /// Participant whose write caused the change, when known. `None` for
    /// writes seen on the shared database and for lagged subscribers.
    pub origin: Option<ParticipantId>,
}

/// In-process fan-out of change notices to every open session.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeNotice>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers were reached.
    pub fn publish(&self, proposal_id: &ProposalId) -> usize {
        self.publish_from(proposal_id, None)
    }

    pub fn publish_from(&self, proposal_id: &ProposalId, origin: Option<&ParticipantId>) -> usize {
        let notice = ChangeNotice {
            proposal_id: proposal_id.clone(),
            origin: origin.cloned(),
        };
        match self.sender.send(notice) {
            Ok(reached) => reached,
            Err(_) => {
                tracing::debug!("No subscribers for change on {}", proposal_id);
                0
            }
        }
    }

    pub fn subscribe(&self, proposal_id: ProposalId) -> Subscription {
        Subscription {
            proposal_id,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receives notices for a single proposal. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    proposal_id: ProposalId,
    receiver: broadcast::Receiver<ChangeNotice>,
}

impl Subscription {
    pub fn proposal_id(&self) -> &ProposalId {
        &self.proposal_id
    }

    /// Waits for the next notice for this proposal. `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(notice) if notice.proposal_id == self.proposal_id => return Some(notice),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Some(self.lagged(skipped)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant for polling from the terminal loop.
    pub fn try_next(&mut self) -> Option<ChangeNotice> {
        loop {
            match self.receiver.try_recv() {
                Ok(notice) if notice.proposal_id == self.proposal_id => return Some(notice),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => return Some(self.lagged(skipped)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    fn lagged(&self, skipped: u64) -> ChangeNotice {
        tracing::warn!("Subscription for {} lagged by {} notices", self.proposal_id, skipped);
        ChangeNotice { proposal_id: self.proposal_id.clone(), origin: None }
    }
}
