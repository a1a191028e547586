use crate::engine::availability::Participation;
use crate::plan::{ParticipantId, Proposal, SlotCodec, TimeSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Feasible,
    /// Fewer people on the roster than the quorum, so nobody's slots matter.
    RosterBelowQuorum,
    QuorumNotMet,
}

impl Verdict {
    pub fn describe(&self) -> &'static str {
        match self {
            Verdict::Feasible => "Feasible",
            Verdict::RosterBelowQuorum => "Not enough participants",
            Verdict::QuorumNotMet => "Quorum not met",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityResult {
    pub feasible: bool,
    pub verdict: Verdict,
    pub compatible_count: usize,
    pub compatible: Vec<ParticipantId>,
    pub needed_slots: Vec<TimeSlot>,
    pub participant_count: usize,
    pub quorum_min: u32,
}

pub fn check(proposal: &Proposal, codec: &SlotCodec, participations: &[Participation]) -> FeasibilityResult {
    let needed_slots = proposal.needed_slots(codec);
    let quorum = proposal.quorum_min as usize;

    let compatible: Vec<ParticipantId> = participations
        .iter()
        .filter(|p| p.availability.contains_all(&needed_slots))
        .map(|p| p.participant.participant_id.clone())
        .collect();
    let compatible_count = compatible.len();

    let verdict = if participations.len() < quorum {
        Verdict::RosterBelowQuorum
    } else if compatible_count >= quorum {
        Verdict::Feasible
    } else {
        Verdict::QuorumNotMet
    };

    tracing::debug!(
        "Feasibility over {} slots: {}/{} compatible, quorum {} -> {:?}",
        needed_slots.len(),
        compatible_count,
        participations.len(),
        quorum,
        verdict
    );

    FeasibilityResult {
        feasible: verdict == Verdict::Feasible,
        verdict,
        compatible_count,
        compatible,
        needed_slots,
        participant_count: participations.len(),
        quorum_min: proposal.quorum_min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::availability::AvailabilitySet;
    use crate::plan::{Participant, Role};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, hour, minute, 0).unwrap()
    }

    fn slot(day: u32, hour: u32) -> TimeSlot {
        SlotCodec::utc().slot_id(NaiveDate::from_ymd_opt(2025, 1, day).unwrap(), hour)
    }

    fn participation(id: &str, slots: Vec<TimeSlot>) -> Participation {
        Participation::new(Participant::new(id, id, Role::Attendee), AvailabilitySet::from(slots))
    }

    fn tuesday_evening(quorum_min: u32) -> Proposal {
        Proposal::new(at(14, 18, 0), at(14, 20, 0), quorum_min, 10).unwrap()
    }

    fn roster() -> Vec<Participation> {
        vec![
            participation("a", vec![slot(14, 18), slot(14, 19)]),
            participation("b", vec![slot(14, 18), slot(14, 19)]),
            participation("c", vec![slot(14, 18)]),
        ]
    }

    #[test]
    fn two_fully_free_participants_meet_quorum_of_two() {
        let result = check(&tuesday_evening(2), &SlotCodec::utc(), &roster());

        assert!(result.feasible);
        assert_eq!(result.compatible_count, 2);
        assert_eq!(result.compatible, vec![ParticipantId::new("a"), ParticipantId::new("b")]);
        assert_eq!(result.needed_slots, vec![slot(14, 18), slot(14, 19)]);
    }

    #[test]
    fn quorum_of_three_is_not_met() {
        let result = check(&tuesday_evening(3), &SlotCodec::utc(), &roster());

        assert!(!result.feasible);
        assert_eq!(result.verdict, Verdict::QuorumNotMet);
        assert_eq!(result.compatible_count, 2);
    }

    #[test]
    fn small_roster_fails_before_looking_at_slots_but_still_counts() {
        let result = check(&tuesday_evening(4), &SlotCodec::utc(), &roster());

        assert_eq!(result.verdict, Verdict::RosterBelowQuorum);
        assert_eq!(result.compatible_count, 2);
        assert_eq!(result.participant_count, 3);
    }

    #[test]
    fn empty_availability_is_never_compatible() {
        let mut participations = roster();
        participations.push(participation("d", vec![]));

        let result = check(&tuesday_evening(1), &SlotCodec::utc(), &participations);

        assert!(!result.compatible.contains(&ParticipantId::new("d")));
    }

    #[test]
    fn zero_length_proposal_needs_its_starting_slot() {
        let proposal = Proposal::new(at(14, 19, 15), at(14, 19, 15), 1, 5).unwrap();

        let result = check(&proposal, &SlotCodec::utc(), &roster());

        assert_eq!(result.needed_slots, vec![slot(14, 19)]);
        assert_eq!(result.compatible_count, 2);
    }

    #[test]
    fn quorum_of_zero_is_trivially_feasible() {
        let proposal = Proposal::new(at(14, 18, 0), at(14, 20, 0), 0, 5).unwrap();

        let result = check(&proposal, &SlotCodec::utc(), &[]);

        assert!(result.feasible);
    }

    proptest! {
        #[test]
        fn extra_coverage_never_lowers_compatible_count(
            hours in proptest::collection::vec(proptest::collection::vec(15u32..23, 0..6), 1..6),
            extra_owner in 0usize..6,
            extra_hour in 15u32..23,
        ) {
            let proposal = tuesday_evening(1);
            let mut participations: Vec<Participation> = hours
                .iter()
                .enumerate()
                .map(|(i, hs)| participation(&i.to_string(), hs.iter().map(|h| slot(14, *h)).collect()))
                .collect();

            let before = check(&proposal, &SlotCodec::utc(), &participations).compatible_count;
            let owner = extra_owner % participations.len();
            participations[owner].availability.insert(slot(14, extra_hour));
            let after_add = check(&proposal, &SlotCodec::utc(), &participations).compatible_count;
            prop_assert!(after_add >= before);

            participations[owner].availability.remove(&slot(14, extra_hour));
            let after_remove = check(&proposal, &SlotCodec::utc(), &participations).compatible_count;
            prop_assert!(after_remove <= after_add);
        }
    }
}
