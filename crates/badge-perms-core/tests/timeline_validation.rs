// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]

use badge_dry_tests::{ids, ranges, split_manager_timeline, RecordBuilder};
use badge_perms_core::metadata::{
    metadata_diff, validate_badge_metadata_update, BadgeMetadata, MetadataChange,
};
use badge_perms_core::permissions::{validate_timed_update, TimedUpdatePermission};
use badge_perms_core::{
    compile_first_match, diff_timelines, validate_timeline_update, Axis, EngineError, Limits,
    Region, TimeLocks, Timeline, TimelineItem,
};

fn timed(start: u64, end: u64, locks: TimeLocks) -> TimedUpdatePermission {
    TimedUpdatePermission {
        timeline_times: ids(start, end),
        locks,
    }
}

#[test]
fn split_timeline_differs_on_second_half() {
    let (old, new) = split_manager_timeline();
    assert_eq!(diff_timelines(&old, &new), ids(51, 100));
}

#[test]
fn identical_timelines_pass_even_when_everything_is_frozen() {
    let (old, _) = split_manager_timeline();
    let frozen = [timed(1, u64::MAX, TimeLocks::forbidden(ids(1, u64::MAX)))];
    assert!(validate_timed_update(&old, &old.clone(), &frozen, 500, &Limits::default()).is_ok());
}

#[test]
fn change_inside_a_frozen_window_is_rejected() {
    let (old, new) = split_manager_timeline();
    let perms = [
        timed(1, 50, TimeLocks::none()),
        timed(51, 100, TimeLocks::forbidden(ids(1, 1000))),
    ];
    let err = validate_timed_update(&old, &new, &perms, 500, &Limits::default()).unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden {
            record: 1,
            region: Region::new().with(Axis::TimelineTimes, ids(51, 100)),
            now: 500,
        }
    );
    // Once the lock window has passed the same change goes through.
    assert!(validate_timed_update(&old, &new, &perms, 1001, &Limits::default()).is_ok());
}

#[test]
fn locks_on_unchanged_times_do_not_matter() {
    let (old, new) = split_manager_timeline();
    let perms = [timed(1, 50, TimeLocks::forbidden(ids(1, 1000)))];
    assert!(validate_timed_update(&old, &new, &perms, 500, &Limits::default()).is_ok());
}

#[test]
fn validator_accepts_any_compiled_collection() {
    let old = Timeline::new(vec![TimelineItem::new(ids(1, 10), 1u32)]).unwrap();
    let new = Timeline::new(vec![TimelineItem::new(ids(1, 10), 2u32)]).unwrap();
    let compiled = compile_first_match(
        &[RecordBuilder::with_value("lock")
            .range(Axis::TimelineTimes, 5, 5)
            .forbidden(1, 10)
            .build()],
        &Limits::default(),
    )
    .unwrap();
    assert_eq!(
        validate_timeline_update(&old, &new, &compiled, 3),
        Err(EngineError::Forbidden {
            record: 0,
            region: Region::new().with(Axis::TimelineTimes, ids(5, 5)),
            now: 3,
        })
    );
}

fn metadata(items: Vec<(u64, u64, Vec<BadgeMetadata>)>) -> Timeline<Vec<BadgeMetadata>> {
    Timeline::new(
        items
            .into_iter()
            .map(|(s, e, list)| TimelineItem::new(ids(s, e), list))
            .collect(),
    )
    .unwrap()
}

#[test]
fn metadata_diff_names_time_and_badge_windows() {
    let old = metadata(vec![(
        1,
        100,
        vec![
            BadgeMetadata::new("ipfs://a", ids(1, 10)),
            BadgeMetadata::new("ipfs://b", ids(11, 20)),
        ],
    )]);
    let new = metadata(vec![
        (
            1,
            50,
            vec![
                BadgeMetadata::new("ipfs://a", ids(1, 10)),
                BadgeMetadata::new("ipfs://b", ids(11, 20)),
            ],
        ),
        (
            51,
            100,
            vec![
                BadgeMetadata::new("ipfs://a", ids(1, 10)),
                BadgeMetadata::new("ipfs://c", ids(15, 20)),
                BadgeMetadata::new("ipfs://b", ids(11, 20)),
            ],
        ),
    ]);
    assert_eq!(
        metadata_diff(&old, &new),
        vec![MetadataChange {
            times: ids(51, 100),
            badge_ids: ids(15, 20),
        }]
    );
}

#[test]
fn metadata_update_checks_badge_scoped_locks() {
    let old = metadata(vec![(1, 100, vec![BadgeMetadata::new("ipfs://a", ids(1, 20))])]);
    let new = metadata(vec![(
        1,
        100,
        vec![
            BadgeMetadata::new("ipfs://new", ids(18, 25)),
            BadgeMetadata::new("ipfs://a", ids(1, 20)),
        ],
    )]);
    let locks = compile_first_match(
        &[RecordBuilder::new()
            .all_values(Axis::TimelineTimes)
            .range(Axis::BadgeIds, 1, 19)
            .forbidden(1, 1000)
            .build()],
        &Limits::default(),
    )
    .unwrap();

    let err = validate_badge_metadata_update(&old, &new, &locks, 10).unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden {
            record: 0,
            region: Region::new()
                .with(Axis::TimelineTimes, ids(1, 100))
                .with(Axis::BadgeIds, ids(18, 19)),
            now: 10,
        }
    );

    // Moving only the unlocked badges is fine.
    let unlocked = metadata(vec![(
        1,
        100,
        vec![
            BadgeMetadata::new("ipfs://a", ids(1, 20)),
            BadgeMetadata::new("ipfs://new", ids(21, 25)),
        ],
    )]);
    assert!(validate_badge_metadata_update(&old, &unlocked, &locks, 10).is_ok());
    assert_eq!(
        metadata_diff(&old, &unlocked)[0].badge_ids,
        ranges(&[(21, 25)])
    );
}
