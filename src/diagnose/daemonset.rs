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

use crate::client::ClusterClient;
use crate::context::Context;
use crate::error::{EmptyStatusFieldSnafu, Error, NoNamespaceSnafu};
use crate::types::workload::Verdict;
use crate::utils::status::{POD_TEMPLATE_GENERATION_LABEL, join_selector, selector_requirements};
use k8s_openapi::api::apps::v1;
use k8s_openapi::api::core::v1 as corev1;
use kube::ResourceExt;
use snafu::OptionExt;

pub fn evaluate(ds: &v1::DaemonSet) -> Verdict {
    let (current, desired) = ds
        .status
        .as_ref()
        .map(|s| (s.number_ready, s.desired_number_scheduled))
        .unwrap_or_default();

    Verdict {
        ready: current == desired,
        current,
        desired,
    }
}

/// Selector for the pods stamped with the observed template generation.
pub fn pod_selector(ds: &v1::DaemonSet) -> Result<String, Error> {
    let generation = ds
        .status
        .as_ref()
        .and_then(|s| s.observed_generation)
        .filter(|g| *g != 0)
        .context(EmptyStatusFieldSnafu {
            field: "observedGeneration",
        })?;

    let requirements = ds
        .spec
        .as_ref()
        .map(|s| selector_requirements(&s.selector))
        .transpose()?
        .unwrap_or_default();

    Ok(join_selector(requirements.into_iter().chain([format!(
        "{POD_TEMPLATE_GENERATION_LABEL}={generation}"
    )])))
}

pub async fn locate<C: ClusterClient>(
    ctx: &Context<C>,
    ds: &v1::DaemonSet,
) -> Result<Vec<corev1::Pod>, Error> {
    let ns = ds.namespace().context(NoNamespaceSnafu)?;
    let selector = pod_selector(ds)?;
    ctx.client.list_pods(&ns, &selector).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{FakeClient, daemon_set};

    #[test]
    fn test_ready_when_number_ready_matches_desired() {
        assert!(evaluate(&daemon_set("kube-system", "agent", 4, 4, 2)).ready);

        let verdict = evaluate(&daemon_set("kube-system", "agent", 3, 4, 2));
        assert!(!verdict.ready);
        assert_eq!((verdict.current, verdict.desired), (3, 4));
    }

    #[test]
    fn test_pod_selector_requires_observed_generation() {
        let ds = daemon_set("kube-system", "agent", 3, 4, 0);
        let err = pod_selector(&ds).expect_err("generation is zero");
        assert_eq!(err.to_string(), ".status.observedGeneration is empty");
    }

    #[tokio::test]
    async fn test_unknown_selector_operator_stops_before_listing() {
        let ctx = Context::new(FakeClient::default());
        let mut ds = daemon_set("kube-system", "agent", 3, 4, 7);
        if let Some(spec) = ds.spec.as_mut() {
            spec.selector.match_expressions = Some(vec![
                k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement {
                    key: "tier".to_owned(),
                    operator: "Matches".to_owned(),
                    values: Some(vec!["edge".to_owned()]),
                },
            ]);
        }

        let err = locate(&ctx, &ds).await.expect_err("unknown operator");
        assert!(matches!(err, Error::UnsupportedSelectorOperator { .. }));
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_locate_combines_match_labels_and_generation() {
        let ctx = Context::new(FakeClient::default());
        let ds = daemon_set("kube-system", "agent", 3, 4, 7);

        locate(&ctx, &ds).await.expect("locate succeeds");
        assert_eq!(
            ctx.client.calls(),
            vec!["list_pods kube-system app=agent,pod-template-generation=7".to_owned()]
        );
    }
}
