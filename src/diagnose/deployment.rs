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
use crate::error::{Error, MissingPodTemplateHashSnafu, NoNamespaceSnafu, ReplicaSetNotFoundSnafu};
use crate::types::workload::Verdict;
use crate::utils::status::{
    POD_TEMPLATE_HASH_LABEL, is_status_true, join_selector, selector_requirements,
};
use k8s_openapi::api::apps::v1;
use k8s_openapi::api::core::v1 as corev1;
use kube::ResourceExt;
use snafu::OptionExt;
use tracing::debug;

const CONDITION_AVAILABLE: &str = "Available";

/// A Deployment is ready once its `Available` condition is `True`; a missing
/// condition counts as not available.
pub fn evaluate(deploy: &v1::Deployment) -> Verdict {
    let status = deploy.status.as_ref();
    let ready = status
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conds| conds.iter().find(|c| c.type_ == CONDITION_AVAILABLE))
        .is_some_and(|c| is_status_true(&c.status));

    Verdict {
        ready,
        current: status.and_then(|s| s.available_replicas).unwrap_or(0),
        desired: status.and_then(|s| s.replicas).unwrap_or(0),
    }
}

fn observed_generation(rs: &v1::ReplicaSet) -> i64 {
    rs.status
        .as_ref()
        .and_then(|s| s.observed_generation)
        .unwrap_or(0)
}

/// Picks the ReplicaSet with the highest observed generation. On equal
/// generations the earliest listed one wins.
pub fn latest_replica_set(replica_sets: &[v1::ReplicaSet]) -> Option<&v1::ReplicaSet> {
    replica_sets.iter().fold(None, |latest, rs| match latest {
        Some(l) if observed_generation(l) >= observed_generation(rs) => Some(l),
        _ => Some(rs),
    })
}

/// Pods of the newest ReplicaSet, selected by its `pod-template-hash`.
pub async fn locate<C: ClusterClient>(
    ctx: &Context<C>,
    deploy: &v1::Deployment,
) -> Result<Vec<corev1::Pod>, Error> {
    let ns = deploy.namespace().context(NoNamespaceSnafu)?;
    let requirements = deploy
        .spec
        .as_ref()
        .map(|s| selector_requirements(&s.selector))
        .transpose()?
        .unwrap_or_default();

    let replica_sets = ctx
        .client
        .list_replica_sets(&ns, &join_selector(&requirements))
        .await?;
    let latest = latest_replica_set(&replica_sets).context(ReplicaSetNotFoundSnafu)?;
    let hash = latest
        .labels()
        .get(POD_TEMPLATE_HASH_LABEL)
        .context(MissingPodTemplateHashSnafu {
            name: latest.name_any(),
        })?;

    debug!(
        "deployment {}: latest ReplicaSet is {} (observedGeneration {}, {} candidates)",
        deploy.name_any(),
        latest.name_any(),
        observed_generation(latest),
        replica_sets.len()
    );

    let selector = join_selector(
        requirements
            .iter()
            .cloned()
            .chain([format!("{POD_TEMPLATE_HASH_LABEL}={hash}")]),
    );
    ctx.client.list_pods(&ns, &selector).await
}
