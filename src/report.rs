// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Plain-text rendering of a diagnosis. Every function is pure; relative ages
//! are computed against the `now` passed in.

use crate::diagnose::pod::PodDiagnosis;
use crate::types::workload::{Verdict, WorkloadKind, WorkloadRef};
use crate::utils::duration::since;
use crate::utils::status::ApiTimestamp;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1 as corev1;
use std::fmt::Write as _;

const EVENT_HEADER: [&str; 5] = ["Reason", "Age", "From", "Object", "Message"];
const EVENT_UNDERLINE: [&str; 5] = ["------", "----", "----", "------", "-------"];
const CELL_PADDING: usize = 2;

const CONTAINER_PATH_PREFIXES: [&str; 2] = ["spec.containers{", "spec.initContainers{"];

fn readiness_word(kind: WorkloadKind) -> &'static str {
    match kind {
        WorkloadKind::Deployment => "available",
        WorkloadKind::StatefulSet | WorkloadKind::DaemonSet => "ready",
    }
}

/// Header line of the report. A negative verdict is followed by a blank line
/// separating it from the pod blocks.
pub fn render_verdict(target: &WorkloadRef, verdict: &Verdict) -> String {
    let word = readiness_word(target.kind);
    if verdict.ready {
        format!("{} {} is {}\n", target.kind, target, word)
    } else {
        format!(
            "{} {} is not {} ({}/{})\n\n",
            target.kind, target, word, verdict.current, verdict.desired
        )
    }
}

/// One line per not-ready container, `None` when the kubelet has not reported
/// any state for it yet.
pub fn format_container_status(pod: &str, cs: &corev1::ContainerStatus) -> Option<String> {
    let state = cs.state.as_ref()?;
    if let Some(waiting) = &state.waiting {
        return Some(format!(
            "[{}] Pod/{}/{}: {} (restarted x{})",
            waiting.reason.as_deref().unwrap_or_default(),
            pod,
            cs.name,
            waiting.message.as_deref().unwrap_or_default(),
            cs.restart_count
        ));
    }
    if let Some(terminated) = &state.terminated {
        return Some(format!(
            "[{}] Pod/{}/{}: {} (exit-code {})",
            terminated.reason.as_deref().unwrap_or_default(),
            pod,
            cs.name,
            terminated.message.as_deref().unwrap_or_default(),
            terminated.exit_code
        ));
    }
    state.running.as_ref().map(|_| {
        format!(
            "[Running] Pod/{}/{}: not ready (restarted x{})",
            pod, cs.name, cs.restart_count
        )
    })
}

/// Renders a pod block: failing conditions with their containers, then log
/// tails, then the warning-event table. Empty when the pod has nothing to
/// report.
pub fn render_pod(diagnosis: &PodDiagnosis, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let pod = &diagnosis.pod_name;

    if !diagnosis.failing_conditions.is_empty() {
        for cond in &diagnosis.failing_conditions {
            let _ = writeln!(out, "[{}] Pod/{}: {}", cond.type_, pod, cond.message);
            for cs in &cond.containers {
                if let Some(line) = format_container_status(pod, cs) {
                    let _ = writeln!(out, "  {line}");
                }
            }
        }
        for log in &diagnosis.logs {
            let _ = write!(out, "\nContainer \"{}\" Log:\n{}", log.container, log);
        }
    }

    if !diagnosis.warning_events.is_empty() {
        out.push('\n');
        out.push_str(&render_events(&diagnosis.warning_events, now));
    }

    out
}

pub fn render_events(events: &[corev1::Event], now: DateTime<Utc>) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(events.len() + 2);
    for fixed in [EVENT_HEADER, EVENT_UNDERLINE] {
        rows.push(fixed.iter().map(|c| (*c).to_owned()).collect());
    }
    rows.extend(events.iter().map(|ev| {
        vec![
            ev.reason.clone().unwrap_or_default(),
            format_age(ev, now),
            format_event_source(ev),
            format_involved_object(&ev.involved_object),
            ev.message.as_deref().unwrap_or_default().trim().to_owned(),
        ]
    }));

    tabulate(&rows)
}

/// Left-aligns cells into columns. Every column but the last is padded to
/// its widest cell plus two spaces.
fn tabulate(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                out.push_str(cell);
            } else {
                let _ = write!(out, "{:<width$}", cell, width = widths[i] + CELL_PADDING);
            }
        }
        out.push('\n');
    }
    out
}

fn first_seen(ev: &corev1::Event) -> Option<DateTime<Utc>> {
    ev.first_timestamp
        .as_ref()
        .and_then(ApiTimestamp::to_utc)
        .or_else(|| ev.event_time.as_ref().and_then(ApiTimestamp::to_utc))
}

fn last_seen(ev: &corev1::Event) -> Option<DateTime<Utc>> {
    ev.last_timestamp
        .as_ref()
        .and_then(ApiTimestamp::to_utc)
        .or_else(|| ev.event_time.as_ref().and_then(ApiTimestamp::to_utc))
}

/// `5m`, or `5m (x3 over 12m)` for an event the server aggregated.
pub fn format_age(ev: &corev1::Event, now: DateTime<Utc>) -> String {
    let count = ev.count.unwrap_or(0);
    if count > 1 {
        format!(
            "{} (x{} over {})",
            since(last_seen(ev), now),
            count,
            since(first_seen(ev), now)
        )
    } else {
        since(first_seen(ev), now)
    }
}

pub fn format_involved_object(object: &corev1::ObjectReference) -> String {
    let mut parts = vec![
        object.kind.as_deref().unwrap_or_default(),
        object.name.as_deref().unwrap_or_default(),
    ];
    if let Some(path) = object.field_path.as_deref().filter(|p| !p.is_empty()) {
        let path = CONTAINER_PATH_PREFIXES
            .iter()
            .find_map(|prefix| path.strip_prefix(*prefix))
            .unwrap_or(path);
        parts.push(path.strip_suffix('}').unwrap_or(path));
    }
    parts.join("/")
}

pub fn format_event_source(ev: &corev1::Event) -> String {
    let source = ev.source.as_ref();
    let component = source
        .and_then(|s| s.component.as_deref())
        .filter(|c| !c.is_empty())
        .or(ev.reporting_component.as_deref())
        .unwrap_or_default();

    match source.and_then(|s| s.host.as_deref()).filter(|h| !h.is_empty()) {
        Some(host) => format!("{component}, {host}"),
        None => component.to_owned(),
    }
}
