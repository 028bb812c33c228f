// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text and JSON rendering for command results.

use std::io::{self, Write};

use anyhow::Result;
use badge_perms_core::metadata::MetadataChange;
use badge_perms_core::{CompiledPermissions, Decision, IntervalSet, Violation};
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use serde_json::Value;

use crate::Format;

#[derive(Serialize)]
pub struct CheckReport {
    pub decision: Decision,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

#[derive(Serialize)]
pub struct DiffReport<'a> {
    pub changed: &'a IntervalSet,
}

#[derive(Serialize)]
pub struct MetadataDiffReport<'a> {
    pub changes: &'a [MetadataChange],
}

fn json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn check(format: Format, report: &CheckReport) -> Result<()> {
    if format == Format::Json {
        return json(report);
    }
    let mut out = io::stdout().lock();
    writeln!(out, "decision: {}", report.decision)?;
    writeln!(out, "allowed: {}", report.allowed)?;
    if let Some(v) = &report.violation {
        writeln!(out, "violation: record {} over {}", v.record, v.region)?;
    }
    Ok(())
}

pub fn compiled(format: Format, compiled: &CompiledPermissions<Value>) -> Result<()> {
    if format == Format::Json {
        return json(compiled);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "#",
        "source",
        "region",
        "permitted",
        "forbidden",
        "value",
    ]);
    for (i, fragment) in compiled.iter().enumerate() {
        let record = fragment.record();
        table.add_row(vec![
            i.to_string(),
            fragment.source().to_string(),
            fragment.region().to_string(),
            record.locks().permitted_times().to_string(),
            record.locks().forbidden_times().to_string(),
            record.value().to_string(),
        ]);
    }
    let mut out = io::stdout().lock();
    writeln!(out, "{table}")?;
    Ok(())
}

pub fn diff(format: Format, report: &DiffReport<'_>) -> Result<()> {
    if format == Format::Json {
        return json(report);
    }
    writeln!(io::stdout().lock(), "changed: {}", report.changed)?;
    Ok(())
}

pub fn metadata_diff(format: Format, report: &MetadataDiffReport<'_>) -> Result<()> {
    if format == Format::Json {
        return json(report);
    }
    let mut out = io::stdout().lock();
    if report.changes.is_empty() {
        writeln!(out, "no metadata changes")?;
    }
    for change in report.changes {
        writeln!(out, "times {} badges {}", change.times, change.badge_ids)?;
    }
    Ok(())
}

pub fn accepted(format: Format) -> Result<()> {
    if format == Format::Json {
        return json(&serde_json::json!({ "accepted": true }));
    }
    writeln!(io::stdout().lock(), "accepted")?;
    Ok(())
}
