use chrono::{Duration, Utc};
use uuid::Uuid;
use meetgrid::{
    plan::{Participant, ProposalId, ProposalRecord, Role, SlotCodec},
    storage::store::{AvailabilityStore, SaveRequest, SqliteStore, StoreError},
};

/// (id, name, role, [(day offset, first hour, last hour)])
type SampleGuest = (&'static str, &'static str, Role, &'static [(i64, u32, u32)]);

const SAMPLE_GUESTS: [SampleGuest; 4] = [
    ("sample-lucia", "Lucía", Role::Photographer, &[(1, 18, 22), (2, 19, 21)]),
    ("sample-marco", "Marco", Role::Treasurer, &[(1, 19, 20), (3, 12, 15)]),
    ("sample-ines", "Inés", Role::Attendee, &[(1, 17, 19), (2, 18, 23)]),
    ("sample-tom", "Tom", Role::Guest, &[]),
];

/// Stores a demo proposal for tomorrow evening with a handful of guests and
/// returns its id. The local participant joins as organizer with no slots.
pub async fn seed_sample_plan(
    store: &SqliteStore,
    me: &Participant,
    codec: &SlotCodec,
) -> Result<ProposalId, StoreError> {
    let today = codec.day_of(Utc::now());
    let start = codec.slot_id(today + Duration::days(1), 19).start();

    let record = ProposalRecord {
        id: ProposalId::new(Uuid::new_v4().to_string()),
        title: "Sample dinner".to_string(),
        voting_window_start: Some(today),
        voting_window_end: Some(today + Duration::days(4)),
        proposal_start: start,
        proposal_end: Some(start + Duration::hours(2)),
        quorum_min: 3,
        quorum_max: 8,
    };
    store.store_proposal(&record)?;

    let organizer = Participant { role: Role::Organizer, ..me.clone() };
    store.join(&record.id, &organizer).await?;

    for (id, name, role, ranges) in SAMPLE_GUESTS {
        let guest = Participant::new(id, name, role);
        store.join(&record.id, &guest).await?;

        let slots = ranges
            .iter()
            .flat_map(|(offset, first, last)| {
                let day = today + Duration::days(*offset);
                (*first..=*last).map(move |hour| codec.slot_id(day, hour))
            })
            .collect();
        store
            .save_availability(SaveRequest {
                participant_id: guest.participant_id,
                proposal_id: record.id.clone(),
                slots,
            })
            .await?;
    }

    tracing::info!("Seeded sample proposal {}", record.id);
    Ok(record.id)
}
