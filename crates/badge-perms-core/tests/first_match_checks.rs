// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]

use badge_dry_tests::{ids, overlapping_badge_rules, RecordBuilder};
use badge_perms_core::{
    check_point, check_region, compile_first_match, Axis, CompiledPermissions, Decision,
    EngineError, Limits, PermissionRecord, Point, Region, Violation,
};

fn compile<V: Clone>(records: &[PermissionRecord<V>]) -> CompiledPermissions<V> {
    compile_first_match(records, &Limits::default()).unwrap()
}

fn badge(id: u64) -> Point {
    Point::new().with_value(Axis::BadgeIds, id)
}

#[test]
fn earlier_rule_decides_shared_badges() {
    let compiled = compile(&overlapping_badge_rules());
    assert_eq!(check_point(&compiled, &badge(7), 150).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &badge(12), 150).unwrap(), Decision::Permitted);
    assert_eq!(check_point(&compiled, &badge(3), 150).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &badge(16), 150).unwrap(), Decision::Unconstrained);
    // Outside the lock window nothing is locked.
    assert_eq!(check_point(&compiled, &badge(7), 201).unwrap(), Decision::Unconstrained);
}

#[test]
fn lock_windows_are_inclusive_at_both_ends() {
    let compiled = compile(&overlapping_badge_rules());
    assert_eq!(check_point(&compiled, &badge(7), 99).unwrap(), Decision::Unconstrained);
    assert_eq!(check_point(&compiled, &badge(7), 100).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &badge(7), 200).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &badge(10), 150).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &badge(11), 150).unwrap(), Decision::Permitted);
}

#[test]
fn compilation_is_deterministic() {
    let records = overlapping_badge_rules();
    let a = compile(&records);
    let b = compile(&records);
    assert_eq!(a, b);
}

#[test]
fn swapping_rule_order_changes_only_the_shared_badges() {
    let mut records = overlapping_badge_rules();
    records.reverse();
    let compiled = compile(&records);
    assert_eq!(check_point(&compiled, &badge(7), 150).unwrap(), Decision::Permitted);
    assert_eq!(check_point(&compiled, &badge(3), 150).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &badge(12), 150).unwrap(), Decision::Permitted);
}

#[test]
fn fragments_keep_payload_and_source() {
    let compiled = compile(&overlapping_badge_rules());
    let got: Vec<(String, &str, usize)> = compiled
        .iter()
        .map(|f| (f.region().to_string(), *f.record().value(), f.source()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("{badgeIds: [1,10]}".to_owned(), "freeze-early", 0),
            ("{badgeIds: [11,15]}".to_owned(), "open-late", 1),
        ]
    );
}

#[test]
fn uncompiled_overlap_is_reported() {
    let raw: Vec<_> = overlapping_badge_rules()
        .into_iter()
        .enumerate()
        .map(|(i, r)| badge_perms_core::Fragment::new(r, i))
        .collect();
    let uncompiled = CompiledPermissions::assume_disjoint(raw);
    assert_eq!(
        check_point(&uncompiled, &badge(7), 150),
        Err(EngineError::UnresolvedOverlap { first: 0, second: 1 })
    );
}

#[test]
fn region_query_reports_first_forbidden_part() {
    let compiled = compile(&overlapping_badge_rules());
    let query = Region::new().with(Axis::BadgeIds, ids(8, 12));
    let verdict = check_region(&compiled, &query, 150).unwrap();
    assert_eq!(verdict.decision, Decision::Forbidden);
    assert_eq!(
        verdict.violation,
        Some(Violation {
            record: 0,
            region: Region::new().with(Axis::BadgeIds, ids(8, 10)),
        })
    );

    let permitted = Region::new().with(Axis::BadgeIds, ids(11, 15));
    assert_eq!(
        check_region(&compiled, &permitted, 150).unwrap().decision,
        Decision::Permitted
    );
    // Partly outside every rule: not fully permitted.
    let spill = Region::new().with(Axis::BadgeIds, ids(11, 16));
    assert_eq!(
        check_region(&compiled, &spill, 150).unwrap().decision,
        Decision::Unconstrained
    );
}

#[test]
fn omitted_query_axes_match_everything() {
    let compiled = compile(&[RecordBuilder::new()
        .range(Axis::BadgeIds, 1, 10)
        .range(Axis::OwnershipTimes, 1, 50)
        .forbidden(1, 1000)
        .build()]);
    let query = Region::new().with(Axis::BadgeIds, ids(5, 5));
    assert_eq!(
        check_region(&compiled, &query, 10).unwrap().decision,
        Decision::Forbidden
    );
    let foreign = Region::new().with(Axis::TransferTimes, ids(1, 1));
    assert_eq!(
        check_region(&compiled, &foreign, 10),
        Err(EngineError::SchemaMismatch {
            axis: Axis::TransferTimes
        })
    );
}

#[test]
fn list_axes_compile_first_match() {
    let compiled = compile(&[
        RecordBuilder::new()
            .only(Axis::ToList, ["alice"])
            .forbidden(1, 100)
            .build(),
        RecordBuilder::new()
            .all_except(Axis::ToList, ["mallory"])
            .permitted(1, 100)
            .build(),
    ]);
    let to = |who: &str| Point::new().with_member(Axis::ToList, who);
    assert_eq!(check_point(&compiled, &to("alice"), 50).unwrap(), Decision::Forbidden);
    assert_eq!(check_point(&compiled, &to("bob"), 50).unwrap(), Decision::Permitted);
    assert_eq!(check_point(&compiled, &to("mallory"), 50).unwrap(), Decision::Unconstrained);
}

#[test]
fn mixed_schemas_are_rejected() {
    let records = vec![
        RecordBuilder::new().range(Axis::BadgeIds, 1, 10).build(),
        RecordBuilder::new().range(Axis::OwnershipTimes, 1, 10).build(),
    ];
    assert!(matches!(
        compile_first_match(&records, &Limits::default()),
        Err(EngineError::SchemaMismatch { .. })
    ));
}

#[test]
fn compilation_respects_fragment_cap() {
    // A 2-D hole punched in a larger box explodes into several pieces.
    let records = vec![
        RecordBuilder::new()
            .range(Axis::BadgeIds, 5, 6)
            .range(Axis::OwnershipTimes, 5, 6)
            .build(),
        RecordBuilder::new()
            .range(Axis::BadgeIds, 1, 10)
            .range(Axis::OwnershipTimes, 1, 10)
            .build(),
    ];
    let compiled = compile(&records);
    assert_eq!(compiled.len(), 1 + 3);

    let tight = Limits {
        max_fragments: 2,
        ..Limits::default()
    };
    assert_eq!(
        compile_first_match(&records, &tight),
        Err(EngineError::IterationLimitExceeded {
            context: "first-match compilation",
            limit: 2
        })
    );
}

fn hypercube(start: u64, end: u64) -> PermissionRecord<()> {
    [
        Axis::TimelineTimes,
        Axis::BadgeIds,
        Axis::OwnershipTimes,
        Axis::TransferTimes,
    ]
    .into_iter()
    .fold(RecordBuilder::new(), |b, axis| b.range(axis, start, end))
    .build()
}

#[test]
fn fragment_cap_bounds_work_on_masked_records() {
    // Staggered 4-D boxes, then one box covering them all.
    let mut records: Vec<_> = (0..5).map(|k| hypercube(10 * k + 1, 10 * k + 30)).collect();
    records.push(hypercube(1, 100));
    let emitted = compile(&records).len();

    // The last record ends up fully masked, but only after its explosion
    // against the staggered boxes has grown.
    records.push(hypercube(1, 100));
    assert_eq!(compile(&records).len(), emitted);

    let exact = Limits {
        max_fragments: emitted,
        ..Limits::default()
    };
    assert_eq!(
        compile_first_match(&records, &exact),
        Err(EngineError::IterationLimitExceeded {
            context: "first-match compilation",
            limit: emitted
        })
    );
}
