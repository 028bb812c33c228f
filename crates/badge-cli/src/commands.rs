// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subcommand implementations.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use badge_app_core::settings::UnconstrainedPolicy;
use badge_perms_core::metadata::{
    metadata_diff as diff_metadata, validate_badge_metadata_update, BadgeMetadata,
};
use badge_perms_core::{
    check_point, check_region, compile_first_match, diff_timelines, validate_permission_update,
    validate_timeline_update, Limits, PermissionRecord, Point, Region, Timeline,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::output::{self, CheckReport, DiffReport, MetadataDiffReport};
use crate::Format;

/// Records carry arbitrary JSON payloads.
type Records = Vec<PermissionRecord<Value>>;

/// Per-invocation engine configuration.
pub struct Context {
    pub limits: Limits,
    pub policy: UnconstrainedPolicy,
    pub format: Format,
}

#[derive(Deserialize)]
struct Scenario {
    records: Records,
    now: u64,
    #[serde(default)]
    point: Option<Point>,
    #[serde(default)]
    region: Option<Region>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

pub fn check(ctx: &Context, path: &Path) -> Result<()> {
    let scenario: Scenario = read_json(path)?;
    let compiled = compile_first_match(&scenario.records, &ctx.limits)
        .context("compile scenario records")?;

    let report = match (&scenario.point, &scenario.region) {
        (Some(point), None) => {
            let decision = check_point(&compiled, point, scenario.now).context("point query")?;
            CheckReport {
                decision,
                allowed: ctx.policy.allows(decision),
                violation: None,
            }
        }
        (None, Some(region)) => {
            let verdict = check_region(&compiled, region, scenario.now).context("region query")?;
            CheckReport {
                decision: verdict.decision,
                allowed: ctx.policy.allows(verdict.decision),
                violation: verdict.violation,
            }
        }
        _ => bail!(
            "{}: scenario needs exactly one of `point` or `region`",
            path.display()
        ),
    };
    output::check(ctx.format, &report)
}

pub fn compile(ctx: &Context, path: &Path) -> Result<()> {
    let records: Records = read_json(path)?;
    let compiled = compile_first_match(&records, &ctx.limits).context("compile records")?;
    info!(
        records = records.len(),
        fragments = compiled.len(),
        "compiled"
    );
    output::compiled(ctx.format, &compiled)
}

pub fn diff(ctx: &Context, old: &Path, new: &Path, permissions: &Path, now: u64) -> Result<()> {
    let old: Timeline<Value> = read_json(old)?;
    let new: Timeline<Value> = read_json(new)?;
    let records: Records = read_json(permissions)?;
    let compiled = compile_first_match(&records, &ctx.limits).context("compile permissions")?;

    let changed = diff_timelines(&old, &new);
    output::diff(ctx.format, &DiffReport { changed: &changed })?;
    validate_timeline_update(&old, &new, &compiled, now).context("timeline update rejected")
}

pub fn metadata_diff(
    ctx: &Context,
    old: &Path,
    new: &Path,
    permissions: &Path,
    now: u64,
) -> Result<()> {
    let old: Timeline<Vec<BadgeMetadata>> = read_json(old)?;
    let new: Timeline<Vec<BadgeMetadata>> = read_json(new)?;
    let records: Records = read_json(permissions)?;
    let compiled = compile_first_match(&records, &ctx.limits).context("compile permissions")?;

    let changes = diff_metadata(&old, &new);
    output::metadata_diff(ctx.format, &MetadataDiffReport { changes: &changes })?;
    validate_badge_metadata_update(&old, &new, &compiled, now)
        .context("badge metadata update rejected")
}

pub fn validate_update(ctx: &Context, old: &Path, new: &Path) -> Result<()> {
    let old: Records = read_json(old)?;
    let new: Records = read_json(new)?;
    validate_permission_update(&old, &new, &ctx.limits).context("permission update rejected")?;
    output::accepted(ctx.format)
}
