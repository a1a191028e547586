use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::plan::{Participant, ParticipantId, ProposalId, ProposalRecord, TimeSlot};
use crate::sync::notify::ChangeFeed;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Failed to prepare database location: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{participant} is not taking part in proposal {proposal}")]
    NotParticipating { participant: ParticipantId, proposal: ProposalId },
    #[error("Database connection is unavailable")]
    ConnectionPoisoned,
}

/// Replace-the-whole-set write for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub participant_id: ParticipantId,
    pub proposal_id: ProposalId,
    pub slots: Vec<TimeSlot>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn fetch_proposal(&self, proposal_id: &ProposalId) -> Result<Option<ProposalRecord>, StoreError>;

    /// Roster in join order.
    async fn fetch_roster(&self, proposal_id: &ProposalId) -> Result<Vec<Participant>, StoreError>;

    async fn fetch_availability(
        &self,
        proposal_id: &ProposalId,
    ) -> Result<HashMap<ParticipantId, Vec<TimeSlot>>, StoreError>;

    async fn save_availability(&self, request: SaveRequest) -> Result<(), StoreError>;

    /// Adds the participant to the roster with an empty set. Joining twice keeps the existing set.
    async fn join(&self, proposal_id: &ProposalId, participant: &Participant) -> Result<(), StoreError>;

    async fn leave(&self, proposal_id: &ProposalId, participant_id: &ParticipantId) -> Result<(), StoreError>;

    /// Publishes notices for proposals written by someone else since the
    /// last poll. Returns how many proposals were announced.
    async fn poll_changes(&self) -> Result<usize, StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    feed: Option<ChangeFeed>,
    /// Last `PRAGMA data_version` seen; it moves only on other connections' commits.
    data_version: AtomicI64,
    /// Proposals read through this handle.
    watched: Mutex<BTreeSet<ProposalId>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            feed: None,
            data_version: AtomicI64::new(0),
            watched: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::new(Connection::open(path)?);
        store.initialize()?;
        tracing::info!("Opened availability store at {}", path.display());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self::new(Connection::open_in_memory()?);
        store.initialize()?;
        Ok(store)
    }

    /// Successful saves publish a notice on `feed`.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::ConnectionPoisoned)
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS proposals (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS participants (
                proposal_id TEXT NOT NULL,
                participant_id TEXT NOT NULL,
                data TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (proposal_id, participant_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS participations (
                proposal_id TEXT NOT NULL,
                participant_id TEXT NOT NULL,
                slots TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (proposal_id, participant_id)
            )",
            [],
        )?;

        let version = Self::read_data_version(&conn)?;
        self.data_version.store(version, Ordering::SeqCst);

        Ok(())
    }

    fn read_data_version(conn: &Connection) -> Result<i64, StoreError> {
        Ok(conn.query_row("PRAGMA data_version", [], |row| row.get(0))?)
    }

    fn watch(&self, proposal_id: &ProposalId) -> Result<(), StoreError> {
        self.watched
            .lock()
            .map_err(|_| StoreError::ConnectionPoisoned)?
            .insert(proposal_id.clone());
        Ok(())
    }

    pub fn store_proposal(&self, record: &ProposalRecord) -> Result<(), StoreError> {
        let data = serde_json::to_string(record)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO proposals (id, data, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![record.id.as_str(), &data, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Most recently created first.
    pub fn list_proposals(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT data FROM proposals ORDER BY created_at DESC, rowid DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for data in rows {
            records.push(serde_json::from_str(&data?)?);
        }
        Ok(records)
    }

    /// Drops the proposal together with its roster and every availability row.
    pub fn discard_proposal(&self, proposal_id: &ProposalId) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM participations WHERE proposal_id = ?1", [proposal_id.as_str()])?;
        tx.execute("DELETE FROM participants WHERE proposal_id = ?1", [proposal_id.as_str()])?;
        tx.execute("DELETE FROM proposals WHERE id = ?1", [proposal_id.as_str()])?;
        tx.commit()?;
        drop(conn);

        tracing::info!("Discarded proposal {}", proposal_id);
        self.notify(proposal_id, None);
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> bool {
        let Ok(conn) = self.conn() else { return false };
        let result: rusqlite::Result<i32> = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        );
        result.unwrap_or(0) > 0
    }

    fn notify(&self, proposal_id: &ProposalId, origin: Option<&ParticipantId>) {
        if let Some(feed) = &self.feed {
            feed.publish_from(proposal_id, origin);
        }
    }
}

#[async_trait]
impl AvailabilityStore for SqliteStore {
    async fn fetch_proposal(&self, proposal_id: &ProposalId) -> Result<Option<ProposalRecord>, StoreError> {
        self.watch(proposal_id)?;
        let conn = self.conn()?;
        let data: Option<String> = conn
            .query_row("SELECT data FROM proposals WHERE id = ?1", [proposal_id.as_str()], |row| row.get(0))
            .optional()?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn fetch_roster(&self, proposal_id: &ProposalId) -> Result<Vec<Participant>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT data FROM participants WHERE proposal_id = ?1 ORDER BY joined_at, rowid",
        )?;
        let rows = stmt.query_map([proposal_id.as_str()], |row| row.get::<_, String>(0))?;

        let mut roster = Vec::new();
        for data in rows {
            roster.push(serde_json::from_str(&data?)?);
        }
        Ok(roster)
    }

    async fn fetch_availability(
        &self,
        proposal_id: &ProposalId,
    ) -> Result<HashMap<ParticipantId, Vec<TimeSlot>>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT participant_id, slots FROM participations WHERE proposal_id = ?1")?;
        let rows = stmt.query_map([proposal_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut availability = HashMap::new();
        for row in rows {
            let (participant_id, slots) = row?;
            let slots: Vec<TimeSlot> = serde_json::from_str(&slots)?;
            availability.insert(ParticipantId::new(participant_id), slots);
        }
        Ok(availability)
    }

    async fn save_availability(&self, request: SaveRequest) -> Result<(), StoreError> {
        let slots = serde_json::to_string(&request.slots)?;
        let updated = self.conn()?.execute(
            "UPDATE participations SET slots = ?1, updated_at = ?2
             WHERE proposal_id = ?3 AND participant_id = ?4",
            rusqlite::params![
                &slots,
                Utc::now().to_rfc3339(),
                request.proposal_id.as_str(),
                request.participant_id.as_str(),
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotParticipating {
                participant: request.participant_id,
                proposal: request.proposal_id,
            });
        }

        tracing::info!(
            "Saved {} slots for {} on {}",
            request.slots.len(),
            request.participant_id,
            request.proposal_id
        );
        self.notify(&request.proposal_id, Some(&request.participant_id));
        Ok(())
    }

    async fn join(&self, proposal_id: &ProposalId, participant: &Participant) -> Result<(), StoreError> {
        let data = serde_json::to_string(participant)?;
        let now = Utc::now().to_rfc3339();
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO participants (proposal_id, participant_id, data, joined_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (proposal_id, participant_id) DO UPDATE SET data = excluded.data",
                rusqlite::params![proposal_id.as_str(), participant.participant_id.as_str(), &data, &now],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO participations (proposal_id, participant_id, slots, updated_at)
                 VALUES (?1, ?2, '[]', ?3)",
                rusqlite::params![proposal_id.as_str(), participant.participant_id.as_str(), &now],
            )?;
            tx.commit()?;
        }

        tracing::info!("{} joined {}", participant.participant_id, proposal_id);
        self.notify(proposal_id, Some(&participant.participant_id));
        Ok(())
    }

    async fn leave(&self, proposal_id: &ProposalId, participant_id: &ParticipantId) -> Result<(), StoreError> {
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM participations WHERE proposal_id = ?1 AND participant_id = ?2",
                [proposal_id.as_str(), participant_id.as_str()],
            )?;
            tx.execute(
                "DELETE FROM participants WHERE proposal_id = ?1 AND participant_id = ?2",
                [proposal_id.as_str(), participant_id.as_str()],
            )?;
            tx.commit()?;
        }

        tracing::info!("{} left {}", participant_id, proposal_id);
        self.notify(proposal_id, Some(participant_id));
        Ok(())
    }

    async fn poll_changes(&self) -> Result<usize, StoreError> {
        let version = Self::read_data_version(&*self.conn()?)?;
        if self.data_version.swap(version, Ordering::SeqCst) == version {
            return Ok(0);
        }

        let watched: Vec<ProposalId> = self
            .watched
            .lock()
            .map_err(|_| StoreError::ConnectionPoisoned)?
            .iter()
            .cloned()
            .collect();
        for proposal_id in &watched {
            self.notify(proposal_id, None);
        }
        tracing::debug!("Shared database changed; announced {} proposals", watched.len());
        Ok(watched.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Role, SlotCodec};
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn slot(day: u32, hour: u32) -> TimeSlot {
        SlotCodec::utc().slot_id(NaiveDate::from_ymd_opt(2025, 1, day).unwrap(), hour)
    }

    fn record(id: &str) -> ProposalRecord {
        ProposalRecord {
            id: ProposalId::new(id),
            title: "Dinner".to_string(),
            voting_window_start: NaiveDate::from_ymd_opt(2025, 1, 13),
            voting_window_end: NaiveDate::from_ymd_opt(2025, 1, 15),
            proposal_start: Utc.with_ymd_and_hms(2025, 1, 14, 18, 0, 0).unwrap(),
            proposal_end: Some(Utc.with_ymd_and_hms(2025, 1, 14, 20, 0, 0).unwrap()),
            quorum_min: 2,
            quorum_max: 8,
        }
    }

    fn create_test_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.store_proposal(&record("p1")).unwrap();
        store
    }

    fn save(participant: &str, slots: Vec<TimeSlot>) -> SaveRequest {
        SaveRequest {
            participant_id: ParticipantId::new(participant),
            proposal_id: ProposalId::new("p1"),
            slots,
        }
    }

    #[test]
    fn creates_database_schema() {
        let store = SqliteStore::in_memory().unwrap();

        assert!(store.table_exists("proposals"));
        assert!(store.table_exists("participants"));
        assert!(store.table_exists("participations"));
    }

    #[tokio::test]
    async fn fetches_stored_proposal() {
        let store = create_test_store();

        let loaded = store.fetch_proposal(&ProposalId::new("p1")).await.unwrap();

        assert_eq!(loaded, Some(record("p1")));
    }

    #[tokio::test]
    async fn missing_proposal_is_none() {
        let store = create_test_store();

        let loaded = store.fetch_proposal(&ProposalId::new("nope")).await.unwrap();

        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn join_creates_empty_set_in_roster_order() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");

        store.join(&pid, &Participant::new("ana", "Ana", Role::Organizer)).await.unwrap();
        store.join(&pid, &Participant::new("ben", "Ben", Role::Attendee)).await.unwrap();

        let roster = store.fetch_roster(&pid).await.unwrap();
        let names: Vec<&str> = roster.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Ben"]);
        assert_eq!(roster[0].role, Role::Organizer);

        let availability = store.fetch_availability(&pid).await.unwrap();
        assert_eq!(availability.get(&ParticipantId::new("ana")), Some(&vec![]));
    }

    #[tokio::test]
    async fn save_replaces_whole_set() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");
        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();

        store.save_availability(save("ana", vec![slot(14, 18), slot(14, 19)])).await.unwrap();
        store.save_availability(save("ana", vec![slot(15, 9)])).await.unwrap();

        let availability = store.fetch_availability(&pid).await.unwrap();
        assert_eq!(availability[&ParticipantId::new("ana")], vec![slot(15, 9)]);
    }

    #[tokio::test]
    async fn saving_same_set_twice_is_idempotent() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");
        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();

        store.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();
        let first = store.fetch_availability(&pid).await.unwrap();
        store.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();
        let second = store.fetch_availability(&pid).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rejoining_keeps_existing_slots() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");
        let ana = Participant::new("ana", "Ana", Role::Attendee);
        store.join(&pid, &ana).await.unwrap();
        store.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();

        store.join(&pid, &ana).await.unwrap();

        let availability = store.fetch_availability(&pid).await.unwrap();
        assert_eq!(availability[&ParticipantId::new("ana")], vec![slot(14, 18)]);
        assert_eq!(store.fetch_roster(&pid).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saving_without_joining_is_rejected() {
        let store = create_test_store();

        let result = store.save_availability(save("ghost", vec![slot(14, 18)])).await;

        assert!(matches!(result, Err(StoreError::NotParticipating { .. })));
    }

    #[tokio::test]
    async fn leave_removes_roster_entry_and_slots() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");
        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();
        store.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();

        store.leave(&pid, &ParticipantId::new("ana")).await.unwrap();

        assert!(store.fetch_roster(&pid).await.unwrap().is_empty());
        assert!(store.fetch_availability(&pid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn discarding_proposal_removes_everything() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");
        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();

        store.discard_proposal(&pid).unwrap();

        assert_eq!(store.fetch_proposal(&pid).await.unwrap(), None);
        assert!(store.fetch_roster(&pid).await.unwrap().is_empty());
        assert!(store.list_proposals().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_legacy_zone_less_slot_ids() {
        let store = create_test_store();
        let pid = ProposalId::new("p1");
        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE participations SET slots = ?1 WHERE participant_id = 'ana'",
                [r#"["2025-01-14T18:00:00"]"#],
            )
            .unwrap();

        let availability = store.fetch_availability(&pid).await.unwrap();

        assert_eq!(availability[&ParticipantId::new("ana")], vec![slot(14, 18)]);
    }

    #[tokio::test]
    async fn successful_save_publishes_change() {
        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(ProposalId::new("p1"));
        let store = create_test_store().with_feed(feed);
        let pid = ProposalId::new("p1");
        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();
        subscription.try_next();

        store.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();

        assert!(subscription.try_next().is_some());
    }

    #[tokio::test]
    async fn failed_save_publishes_nothing() {
        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(ProposalId::new("p1"));
        let store = create_test_store().with_feed(feed);

        let _ = store.save_availability(save("ghost", vec![])).await;

        assert_eq!(subscription.try_next(), None);
    }

    #[tokio::test]
    async fn own_writes_carry_the_writer_as_origin() {
        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(ProposalId::new("p1"));
        let store = create_test_store().with_feed(feed);
        let pid = ProposalId::new("p1");

        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();

        let notice = subscription.try_next().unwrap();
        assert_eq!(notice.origin, Some(ParticipantId::new("ana")));
    }

    #[tokio::test]
    async fn writes_from_another_handle_are_announced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.db");
        let writer = SqliteStore::open(&path).unwrap();
        writer.store_proposal(&record("p1")).unwrap();

        let feed = ChangeFeed::default();
        let mut subscription = feed.subscribe(ProposalId::new("p1"));
        let reader = SqliteStore::open(&path).unwrap().with_feed(feed);
        let pid = ProposalId::new("p1");
        reader.fetch_proposal(&pid).await.unwrap();
        assert_eq!(reader.poll_changes().await.unwrap(), 0);

        writer.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();
        writer.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();

        assert_eq!(reader.poll_changes().await.unwrap(), 1);
        let notice = subscription.try_next().unwrap();
        assert_eq!(notice.origin, None);
        assert_eq!(subscription.try_next(), None);
        assert_eq!(reader.poll_changes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn own_commits_do_not_count_as_external() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("solo.db")).unwrap();
        store.store_proposal(&record("p1")).unwrap();
        let pid = ProposalId::new("p1");
        store.fetch_proposal(&pid).await.unwrap();

        store.join(&pid, &Participant::new("ana", "Ana", Role::Attendee)).await.unwrap();
        store.save_availability(save("ana", vec![slot(14, 18)])).await.unwrap();

        assert_eq!(store.poll_changes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unwatched_proposals_are_not_announced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.db");
        let writer = SqliteStore::open(&path).unwrap();
        let reader = SqliteStore::open(&path).unwrap();

        writer.store_proposal(&record("p1")).unwrap();

        assert_eq!(reader.poll_changes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("meetgrid.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.store_proposal(&record("p1")).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();

        assert_eq!(reopened.list_proposals().unwrap(), vec![record("p1")]);
    }
}
