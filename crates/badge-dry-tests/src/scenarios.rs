// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned collections shared by integration tests.

use badge_perms_core::{Axis, PermissionRecord, Timeline, TimelineItem};

use crate::records::{ids, RecordBuilder};

/// Two overlapping badge rules.
///
/// Rule 0 covers badges `[1,10]` and is forbidden during `[100,200]`;
/// rule 1 covers badges `[5,15]` and is permitted during `[100,200]`.
/// After first-match compilation badge 7 follows rule 0 and badge 12
/// follows rule 1.
pub fn overlapping_badge_rules() -> Vec<PermissionRecord<&'static str>> {
    vec![
        RecordBuilder::with_value("freeze-early")
            .range(Axis::BadgeIds, 1, 10)
            .forbidden(100, 200)
            .build(),
        RecordBuilder::with_value("open-late")
            .range(Axis::BadgeIds, 5, 15)
            .permitted(100, 200)
            .build(),
    ]
}

/// Manager timeline `A` on `[1,50]` and `B` on `[51,100]`, plus the same
/// timeline with `A` extended over `[1,100]`.
///
/// The two differ exactly on `[51,100]`.
#[allow(clippy::expect_used)]
pub fn split_manager_timeline() -> (Timeline<String>, Timeline<String>) {
    let old = Timeline::new(vec![
        TimelineItem::new(ids(1, 50), "A".to_owned()),
        TimelineItem::new(ids(51, 100), "B".to_owned()),
    ])
    .expect("fixture timeline is disjoint");
    let new = Timeline::new(vec![TimelineItem::new(ids(1, 100), "A".to_owned())])
        .expect("fixture timeline is disjoint");
    (old, new)
}
