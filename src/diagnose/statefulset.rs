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
use crate::utils::status::CONTROLLER_REVISION_HASH_LABEL;
use k8s_openapi::api::apps::v1;
use k8s_openapi::api::core::v1 as corev1;
use kube::ResourceExt;
use snafu::OptionExt;
use tracing::debug;

pub fn evaluate(sts: &v1::StatefulSet) -> Verdict {
    let (current, desired) = sts
        .status
        .as_ref()
        .map(|s| (s.ready_replicas.unwrap_or(0), s.replicas))
        .unwrap_or_default();

    Verdict {
        ready: current == desired,
        current,
        desired,
    }
}

fn non_empty(revision: Option<&String>) -> Option<&str> {
    revision.map(String::as_str).filter(|r| !r.is_empty())
}

/// The revision whose pods are diagnosed. `currentRevision` must be reported;
/// during a rollout `updateRevision` takes precedence since the pods failing
/// to come up belong to it.
pub fn target_revision(sts: &v1::StatefulSet) -> Result<&str, Error> {
    let status = sts.status.as_ref();
    let current = non_empty(status.and_then(|s| s.current_revision.as_ref())).context(
        EmptyStatusFieldSnafu {
            field: "currentRevision",
        },
    )?;

    Ok(non_empty(status.and_then(|s| s.update_revision.as_ref())).unwrap_or(current))
}

pub async fn locate<C: ClusterClient>(
    ctx: &Context<C>,
    sts: &v1::StatefulSet,
) -> Result<Vec<corev1::Pod>, Error> {
    let ns = sts.namespace().context(NoNamespaceSnafu)?;
    let revision = target_revision(sts)?;
    debug!("statefulset {}: diagnosing revision {}", sts.name_any(), revision);

    ctx.client
        .list_pods(&ns, &format!("{CONTROLLER_REVISION_HASH_LABEL}={revision}"))
        .await
}
