// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pure helpers over Kubernetes status objects shared by every workload kind.

use crate::error::{Error, UnsupportedSelectorOperatorSnafu};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use snafu::OptionExt;

pub const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";
pub const CONTROLLER_REVISION_HASH_LABEL: &str = "controller-revision-hash";
pub const POD_TEMPLATE_GENERATION_LABEL: &str = "pod-template-generation";

pub const CONDITION_TRUE: &str = "True";
pub const EVENT_TYPE_WARNING: &str = "Warning";

pub fn is_status_true(status: &str) -> bool {
    status == CONDITION_TRUE
}

fn has_id(id: Option<&String>) -> bool {
    id.is_some_and(|id| !id.is_empty())
}

pub fn not_ready_containers(statuses: &[corev1::ContainerStatus]) -> Vec<corev1::ContainerStatus> {
    statuses.iter().filter(|cs| !cs.ready).cloned().collect()
}

/// Whether the current or the last instance of the container ever held a
/// container ID, i.e. the runtime started it at least once.
pub fn is_container_started(cs: &corev1::ContainerStatus) -> bool {
    let terminated_with_id = |state: Option<&corev1::ContainerState>| {
        state
            .and_then(|s| s.terminated.as_ref())
            .is_some_and(|t| has_id(t.container_id.as_ref()))
    };

    (cs.ready && has_id(cs.container_id.as_ref()))
        || terminated_with_id(cs.state.as_ref())
        || terminated_with_id(cs.last_state.as_ref())
}

pub fn is_warning(event: &corev1::Event) -> bool {
    event.type_.as_deref() == Some(EVENT_TYPE_WARNING)
}

pub fn filter_warning_events(events: Vec<corev1::Event>) -> Vec<corev1::Event> {
    events.into_iter().filter(is_warning).collect()
}

/// Renders a `LabelSelector` as selector requirements, match labels first in
/// key order followed by the match expressions. An operator outside the four
/// the API defines is rejected rather than dropped.
pub fn selector_requirements(selector: &metav1::LabelSelector) -> Result<Vec<String>, Error> {
    let mut requirements: Vec<String> = selector
        .match_labels
        .iter()
        .flatten()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();

    for expr in selector.match_expressions.iter().flatten() {
        let values = expr.values.as_deref().unwrap_or_default().join(",");
        let requirement = match expr.operator.as_str() {
            "In" => Some(format!("{} in ({})", expr.key, values)),
            "NotIn" => Some(format!("{} notin ({})", expr.key, values)),
            "Exists" => Some(expr.key.clone()),
            "DoesNotExist" => Some(format!("!{}", expr.key)),
            _ => None,
        }
        .context(UnsupportedSelectorOperatorSnafu {
            operator: &expr.operator,
        })?;
        requirements.push(requirement);
    }

    Ok(requirements)
}

pub fn join_selector<I, S>(requirements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    requirements
        .into_iter()
        .filter(|r| !r.as_ref().is_empty())
        .map(|r| r.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// API timestamps (`Time`, `MicroTime`) as chrono instants. `None` outside the
/// range chrono represents in nanoseconds.
pub trait ApiTimestamp {
    fn to_utc(&self) -> Option<DateTime<Utc>>;
}

impl ApiTimestamp for metav1::Time {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0.as_nanosecond())
            .ok()
            .map(DateTime::from_timestamp_nanos)
    }
}

impl ApiTimestamp for metav1::MicroTime {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0.as_nanosecond())
            .ok()
            .map(DateTime::from_timestamp_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container(value: serde_json::Value) -> corev1::ContainerStatus {
        serde_json::from_value(value).expect("valid ContainerStatus")
    }

    #[test]
    fn test_started_when_ready_with_id() {
        let cs = container(json!({
            "name": "app", "image": "app:1", "imageID": "", "ready": true, "restartCount": 0,
            "containerID": "containerd://abc",
            "state": {"running": {}}
        }));
        assert!(is_container_started(&cs));
    }

    #[test]
    fn test_started_when_terminated_with_id() {
        let cs = container(json!({
            "name": "app", "image": "app:1", "imageID": "", "ready": false, "restartCount": 0,
            "state": {"terminated": {"exitCode": 1, "containerID": "containerd://abc"}}
        }));
        assert!(is_container_started(&cs));
    }

    #[test]
    fn test_started_when_last_state_terminated_with_id() {
        let cs = container(json!({
            "name": "app", "image": "app:1", "imageID": "", "ready": false, "restartCount": 4,
            "state": {"waiting": {"reason": "CrashLoopBackOff"}},
            "lastState": {"terminated": {"exitCode": 2, "containerID": "containerd://abc"}}
        }));
        assert!(is_container_started(&cs));
    }

    #[test]
    fn test_not_started_when_waiting_without_id() {
        let cs = container(json!({
            "name": "app", "image": "app:1", "imageID": "", "ready": false, "restartCount": 0,
            "state": {"waiting": {"reason": "ImagePullBackOff"}}
        }));
        assert!(!is_container_started(&cs));

        // running with an id but not ready does not count either
        let cs = container(json!({
            "name": "app", "image": "app:1", "imageID": "", "ready": false, "restartCount": 0,
            "containerID": "containerd://abc",
            "state": {"running": {}}
        }));
        assert!(!is_container_started(&cs));
    }

    #[test]
    fn test_not_ready_containers_keeps_order() {
        let statuses = vec![
            container(json!({"name": "a", "image": "", "imageID": "", "ready": false, "restartCount": 0})),
            container(json!({"name": "b", "image": "", "imageID": "", "ready": true, "restartCount": 0})),
            container(json!({"name": "c", "image": "", "imageID": "", "ready": false, "restartCount": 0})),
        ];
        let names: Vec<_> = not_ready_containers(&statuses)
            .into_iter()
            .map(|cs| cs.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_filter_warning_events_preserves_order() {
        let events: Vec<corev1::Event> = serde_json::from_value(json!([
            {"apiVersion": "v1", "kind": "Event", "metadata": {"name": "e1"}, "involvedObject": {}, "type": "Warning", "reason": "BackOff"},
            {"apiVersion": "v1", "kind": "Event", "metadata": {"name": "e2"}, "involvedObject": {}, "type": "Normal", "reason": "Pulled"},
            {"apiVersion": "v1", "kind": "Event", "metadata": {"name": "e3"}, "involvedObject": {}, "type": "Warning", "reason": "Unhealthy"}
        ]))
        .expect("valid events");

        let reasons: Vec<_> = filter_warning_events(events)
            .into_iter()
            .filter_map(|e| e.reason)
            .collect();
        assert_eq!(reasons, vec!["BackOff", "Unhealthy"]);
    }

    #[test]
    fn test_selector_requirements() {
        let selector: metav1::LabelSelector = serde_json::from_value(json!({
            "matchLabels": {"tier": "web", "app": "shop"},
            "matchExpressions": [
                {"key": "env", "operator": "In", "values": ["prod", "stage"]},
                {"key": "canary", "operator": "DoesNotExist"}
            ]
        }))
        .expect("valid selector");

        assert_eq!(
            join_selector(selector_requirements(&selector).expect("known operators")),
            "app=shop,tier=web,env in (prod,stage),!canary"
        );
    }

    #[test]
    fn test_selector_requirements_rejects_unknown_operator() {
        let selector: metav1::LabelSelector = serde_json::from_value(json!({
            "matchLabels": {"app": "shop"},
            "matchExpressions": [{"key": "env", "operator": "Matches", "values": ["prod"]}]
        }))
        .expect("valid selector");

        let err = selector_requirements(&selector).expect_err("unknown operator");
        assert_eq!(
            err.to_string(),
            "unsupported label selector operator \"Matches\""
        );
    }

    #[test]
    fn test_to_utc() {
        let time: metav1::Time =
            serde_json::from_value(json!("2026-10-16T09:30:00Z")).expect("valid time");
        let parsed = time.to_utc().expect("converts");
        assert_eq!(parsed.to_rfc3339(), "2026-10-16T09:30:00+00:00");

        let micro: metav1::MicroTime =
            serde_json::from_value(json!("2026-10-16T09:30:00.250000Z")).expect("valid time");
        let parsed = micro.to_utc().expect("converts");
        assert_eq!(parsed.timestamp_subsec_micros(), 250_000);
        assert_eq!(parsed.timestamp(), time.to_utc().expect("converts").timestamp());
    }
}
