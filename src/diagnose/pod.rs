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
use crate::diagnose::event::warning_events;
use crate::diagnose::log::{self, ContainerLog};
use crate::error::{Error, NoNamespaceSnafu};
use crate::utils::status::{is_container_started, is_status_true, not_ready_containers};
use k8s_openapi::api::core::v1 as corev1;
use kube::ResourceExt;
use snafu::OptionExt;
use tracing::debug;

pub const POD_READY: &str = "Ready";
pub const POD_SCHEDULED: &str = "PodScheduled";
pub const POD_INITIALIZED: &str = "Initialized";
pub const CONTAINERS_READY: &str = "ContainersReady";

/// A pod condition that is not `True`, with the containers it blames.
#[derive(Clone, Debug)]
pub struct FailingCondition {
    pub type_: String,
    pub message: String,
    pub containers: Vec<corev1::ContainerStatus>,
}

#[derive(Clone, Debug)]
pub struct PodDiagnosis {
    pub pod_name: String,
    pub failing_conditions: Vec<FailingCondition>,
    pub logs: Vec<ContainerLog>,
    pub warning_events: Vec<corev1::Event>,
}

impl PodDiagnosis {
    pub fn not_ready_containers(&self) -> impl Iterator<Item = &corev1::ContainerStatus> {
        self.failing_conditions
            .iter()
            .flat_map(|c| c.containers.iter())
    }

    pub fn is_healthy(&self) -> bool {
        self.failing_conditions.is_empty() && self.warning_events.is_empty()
    }
}

/// Classifies the pod's conditions in the order the kubelet reported them.
/// `Ready` is only the aggregate of the others and never reported on its own.
pub fn failing_conditions(pod: &corev1::Pod) -> Vec<FailingCondition> {
    let Some(status) = pod.status.as_ref() else {
        return Vec::new();
    };

    status
        .conditions
        .iter()
        .flatten()
        .filter(|cond| cond.type_ != POD_READY && !is_status_true(&cond.status))
        .map(|cond| {
            let containers = match cond.type_.as_str() {
                POD_INITIALIZED => {
                    not_ready_containers(status.init_container_statuses.as_deref().unwrap_or_default())
                }
                CONTAINERS_READY => {
                    not_ready_containers(status.container_statuses.as_deref().unwrap_or_default())
                }
                _ => Vec::new(),
            };
            FailingCondition {
                type_: cond.type_.clone(),
                message: cond.message.clone().unwrap_or_default(),
                containers,
            }
        })
        .collect()
}

pub async fn diagnose<C: ClusterClient>(
    ctx: &Context<C>,
    pod: &corev1::Pod,
) -> Result<PodDiagnosis, Error> {
    let pod_name = pod.name_any();
    let ns = pod.namespace().context(NoNamespaceSnafu)?;
    let mut diagnosis = PodDiagnosis {
        pod_name,
        failing_conditions: failing_conditions(pod),
        logs: Vec::new(),
        warning_events: Vec::new(),
    };

    let mut logs = Vec::new();
    for cs in diagnosis.not_ready_containers() {
        if !is_container_started(cs) {
            debug!("skip log of {}/{}: never started", diagnosis.pod_name, cs.name);
            continue;
        }
        logs.push(log::fetch(ctx, &ns, &diagnosis.pod_name, &cs.name).await?);
    }
    diagnosis.logs = logs;
    diagnosis.warning_events = warning_events(ctx, pod).await?;

    Ok(diagnosis)
}
