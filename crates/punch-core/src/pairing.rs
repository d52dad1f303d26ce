//! Grouping and positional pairing of punches.
//!
//! # Algorithm Summary
//!
//! 1. Partition punches by `(person, date, period)`, classifying each punch's
//!    time of day under the run's [`PeriodPolicy`]
//! 2. Within a group, sort entries and exits independently by time (stable,
//!    so equal times keep input order)
//! 3. Pair `entries[i]` with `exits[i]` for every index up to the longer list
//! 4. Flag every pair after the first as a duplicate
//!
//! Pairing is strictly positional. Two early entries and one late exit pair
//! the *first* entry with the exit; downstream duplicate detection relies on
//! that indexing, so nearest-neighbour matching is deliberately not used.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::period::{Period, PeriodPolicy};
use crate::punch::PunchEvent;
use crate::record::ReconciledRecord;
use crate::types::{Direction, PersonName};

/// Composite grouping key.
///
/// Ordering is person, then date, then period in reporting order, which is
/// also the order records are emitted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub person: PersonName,
    pub date: NaiveDate,
    pub period: Period,
}

impl GroupKey {
    pub fn of(event: &PunchEvent, policy: PeriodPolicy) -> Self {
        Self {
            person: event.person().clone(),
            date: event.date(),
            period: policy.classify(event.time()),
        }
    }
}

/// Punches collected under one key, in input order.
#[derive(Debug, Default)]
struct Group<'a> {
    entries: Vec<&'a PunchEvent>,
    exits: Vec<&'a PunchEvent>,
}

fn group_events(events: &[PunchEvent], policy: PeriodPolicy) -> BTreeMap<GroupKey, Group<'_>> {
    let mut groups: BTreeMap<GroupKey, Group<'_>> = BTreeMap::new();
    for event in events {
        let group = groups.entry(GroupKey::of(event, policy)).or_default();
        match event.direction() {
            Direction::Entry => group.entries.push(event),
            Direction::Exit => group.exits.push(event),
        }
    }
    groups
}

fn pair_group(key: &GroupKey, group: Group<'_>) -> Vec<ReconciledRecord> {
    let Group {
        mut entries,
        mut exits,
    } = group;
    entries.sort_by_key(|event| event.time());
    exits.sort_by_key(|event| event.time());

    let count = entries.len().max(exits.len());
    (0..count)
        .map(|i| {
            let entry = entries.get(i).copied();
            let exit = exits.get(i).copied();
            let source_labels: BTreeSet<_> = entry
                .into_iter()
                .chain(exit)
                .map(|event| event.source().clone())
                .collect();

            ReconciledRecord {
                person: key.person.clone(),
                date: key.date,
                period: key.period,
                pair_index: i,
                entry_time: entry.map(PunchEvent::time),
                exit_time: exit.map(PunchEvent::time),
                entry_device: entry.and_then(PunchEvent::device),
                exit_device: exit.and_then(PunchEvent::device),
                is_duplicate: i > 0,
                observation: None,
                source_labels,
            }
        })
        .collect()
}

/// Pairs entries with exits for one logical source.
///
/// Total over well-formed events: every punch ends up in exactly one record,
/// and each group yields `max(entries, exits)` records.
pub fn pair_events(events: &[PunchEvent], policy: PeriodPolicy) -> Vec<ReconciledRecord> {
    let groups: Vec<_> = group_events(events, policy).into_iter().collect();
    tracing::debug!(
        events = events.len(),
        groups = groups.len(),
        %policy,
        "pairing punches"
    );

    let paired: Vec<Vec<ReconciledRecord>> = groups
        .into_par_iter()
        .map(|(key, group)| pair_group(&key, group))
        .collect();

    paired.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveTime;

    use super::*;
    use crate::types::{DeviceId, SourceLabel};

    fn punch(person: &str, time: &str, direction: Direction) -> PunchEvent {
        punch_on(person, "2024-03-05", time, direction, None)
    }

    fn punch_on(
        person: &str,
        date: &str,
        time: &str,
        direction: Direction,
        device: Option<i64>,
    ) -> PunchEvent {
        PunchEvent::new(
            PersonName::new(person).unwrap(),
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
            direction,
            device.map(|d| DeviceId::new(d).unwrap()),
            SourceLabel::new("catraca1.xlsx").unwrap(),
        )
    }

    fn t(s: &str) -> Option<NaiveTime> {
        Some(NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap())
    }

    #[test]
    fn single_pair_is_canonical() {
        let events = vec![
            punch("Ana", "08:01:00", Direction::Entry),
            punch("Ana", "08:15:00", Direction::Exit),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.period, Period::Breakfast);
        assert_eq!(rec.duration_minutes(), Some(14));
        assert!(!rec.is_duplicate);
        assert_eq!(rec.observation, None);
    }

    #[test]
    fn extra_entry_becomes_duplicate_without_exit() {
        let events = vec![
            punch("Bruno", "08:05:00", Direction::Entry),
            punch("Bruno", "08:10:00", Direction::Exit),
            punch("Bruno", "08:00:00", Direction::Entry),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry_time, t("08:00:00"));
        assert_eq!(records[0].exit_time, t("08:10:00"));
        assert_eq!(records[0].duration_minutes(), Some(10));
        assert!(!records[0].is_duplicate);

        assert_eq!(records[1].pair_index, 1);
        assert_eq!(records[1].entry_time, t("08:05:00"));
        assert_eq!(records[1].exit_time, None);
        assert_eq!(records[1].duration_minutes(), None);
        assert!(records[1].is_duplicate);
    }

    #[test]
    fn pairing_is_positional_not_nearest() {
        let events = vec![
            punch("Caio", "07:00:00", Direction::Entry),
            punch("Caio", "09:55:00", Direction::Entry),
            punch("Caio", "10:00:00", Direction::Exit),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);

        assert_eq!(records[0].entry_time, t("07:00:00"));
        assert_eq!(records[0].duration_minutes(), Some(180));
        assert_eq!(records[1].entry_time, t("09:55:00"));
        assert_eq!(records[1].exit_time, None);
    }

    #[test]
    fn record_count_matches_larger_side_per_group() {
        let events = vec![
            punch("Ana", "07:00:00", Direction::Entry),
            punch("Ana", "07:30:00", Direction::Exit),
            punch("Ana", "07:40:00", Direction::Exit),
            punch("Ana", "07:50:00", Direction::Exit),
            punch("Ana", "12:00:00", Direction::Entry),
            punch("Ana", "12:05:00", Direction::Entry),
            punch("Ana", "19:00:00", Direction::Exit),
            punch("Bruno", "12:00:00", Direction::Entry),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);

        let mut per_group: HashMap<(String, Period), Vec<&ReconciledRecord>> = HashMap::new();
        for rec in &records {
            per_group
                .entry((rec.person.to_string(), rec.period))
                .or_default()
                .push(rec);
        }
        assert_eq!(per_group[&("Ana".to_string(), Period::Breakfast)].len(), 3);
        assert_eq!(per_group[&("Ana".to_string(), Period::Lunch)].len(), 2);
        assert_eq!(per_group[&("Ana".to_string(), Period::Dinner)].len(), 1);
        assert_eq!(per_group[&("Bruno".to_string(), Period::Lunch)].len(), 1);

        for group in per_group.values() {
            for (i, rec) in group.iter().enumerate() {
                assert_eq!(rec.pair_index, i);
                assert_eq!(rec.is_duplicate, i > 0);
            }
        }
        assert_eq!(records.len(), 7);
    }

    #[test]
    fn every_punch_lands_in_one_record() {
        let events = vec![
            punch("Ana", "12:00:00", Direction::Entry),
            punch("Ana", "12:01:00", Direction::Entry),
            punch("Ana", "12:30:00", Direction::Exit),
            punch("Ana", "12:31:00", Direction::Exit),
            punch("Ana", "12:32:00", Direction::Exit),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);

        let entries = records.iter().filter(|r| r.entry_time.is_some()).count();
        let exits = records.iter().filter(|r| r.exit_time.is_some()).count();
        assert_eq!(entries, 2);
        assert_eq!(exits, 3);
    }

    #[test]
    fn policy_changes_grouping() {
        let events = vec![
            punch("Ana", "13:30:00", Direction::Entry),
            punch("Ana", "15:00:00", Direction::Exit),
        ];

        let single = pair_events(&events, PeriodPolicy::SingleDevice);
        assert_eq!(single.len(), 2);
        assert_eq!(single[0].period, Period::Lunch);
        assert_eq!(single[1].period, Period::Other);

        let consolidated = pair_events(&events, PeriodPolicy::Consolidated);
        assert_eq!(consolidated.len(), 1);
        assert_eq!(consolidated[0].duration_minutes(), Some(90));
    }

    #[test]
    fn separator_characters_do_not_merge_groups() {
        let events = vec![
            punch_on("Ana", "2024-03-06", "08:00:00", Direction::Entry, None),
            punch_on("Ana|2024-03-05|outro", "2024-03-06", "08:00:00", Direction::Exit, None),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.is_duplicate));
    }

    #[test]
    fn dates_split_groups() {
        let events = vec![
            punch_on("Ana", "2024-03-05", "08:00:00", Direction::Entry, None),
            punch_on("Ana", "2024-03-06", "08:00:00", Direction::Entry, None),
        ];
        let records = pair_events(&events, PeriodPolicy::SingleDevice);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.is_duplicate));
    }

    #[test]
    fn output_independent_of_input_order() {
        let events = vec![
            punch("Bruno", "12:10:00", Direction::Exit),
            punch("Ana", "08:00:00", Direction::Entry),
            punch("Bruno", "12:00:00", Direction::Entry),
            punch("Ana", "08:20:00", Direction::Exit),
            punch("Ana", "08:05:00", Direction::Entry),
            punch("Ana", "18:30:00", Direction::Entry),
        ];
        let expected = pair_events(&events, PeriodPolicy::Consolidated);

        let mut reversed = events.clone();
        reversed.reverse();
        assert_eq!(pair_events(&reversed, PeriodPolicy::Consolidated), expected);

        let mut rotated = events;
        rotated.rotate_left(2);
        assert_eq!(pair_events(&rotated, PeriodPolicy::Consolidated), expected);
    }

    #[test]
    fn devices_ride_along() {
        let events = vec![
            punch_on("Ana", "2024-03-05", "12:00:00", Direction::Entry, Some(1)),
            punch_on("Ana", "2024-03-05", "12:30:00", Direction::Exit, Some(2)),
        ];
        let records = pair_events(&events, PeriodPolicy::Consolidated);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_device.map(DeviceId::get), Some(1));
        assert_eq!(records[0].exit_device.map(DeviceId::get), Some(2));
    }

    #[test]
    fn equal_times_keep_input_order() {
        let events = vec![
            punch_on("Ana", "2024-03-05", "12:00:00", Direction::Entry, Some(2)),
            punch_on("Ana", "2024-03-05", "12:00:00", Direction::Entry, Some(1)),
            punch_on("Ana", "2024-03-05", "12:30:00", Direction::Exit, Some(2)),
        ];
        let records = pair_events(&events, PeriodPolicy::Consolidated);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry_device.map(DeviceId::get), Some(2));
        assert_eq!(records[0].exit_device.map(DeviceId::get), Some(2));
        assert_eq!(records[1].entry_device.map(DeviceId::get), Some(1));
        assert!(records[1].is_duplicate);

        let mut swapped = events;
        swapped.swap(0, 1);
        let records = pair_events(&swapped, PeriodPolicy::Consolidated);
        assert_eq!(records[0].entry_device.map(DeviceId::get), Some(1));
        assert_eq!(records[1].entry_device.map(DeviceId::get), Some(2));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(pair_events(&[], PeriodPolicy::SingleDevice).is_empty());
    }
}
