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

use crate::error::{Error, NoNamespaceSnafu};
use k8s_openapi::api::apps::v1;
use kube::ResourceExt;
use snafu::OptionExt;
use std::fmt;
use strum::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum WorkloadKind {
    #[strum(serialize = "Deployment")]
    Deployment,

    #[strum(serialize = "StatefulSet")]
    StatefulSet,

    #[strum(serialize = "DaemonSet")]
    DaemonSet,
}

/// The workload a diagnosis run targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkloadRef {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

impl WorkloadRef {
    pub fn new(kind: WorkloadKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Read-only snapshot of the fetched workload object.
#[derive(Clone, Debug)]
pub enum Workload {
    Deployment(v1::Deployment),
    StatefulSet(v1::StatefulSet),
    DaemonSet(v1::DaemonSet),
}

impl Workload {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Workload::Deployment(_) => WorkloadKind::Deployment,
            Workload::StatefulSet(_) => WorkloadKind::StatefulSet,
            Workload::DaemonSet(_) => WorkloadKind::DaemonSet,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Workload::Deployment(d) => d.name_any(),
            Workload::StatefulSet(s) => s.name_any(),
            Workload::DaemonSet(d) => d.name_any(),
        }
    }

    pub fn namespace(&self) -> Result<String, Error> {
        match self {
            Workload::Deployment(d) => d.namespace(),
            Workload::StatefulSet(s) => s.namespace(),
            Workload::DaemonSet(d) => d.namespace(),
        }
        .context(NoNamespaceSnafu)
    }
}

/// Readiness judgement made from the workload status alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub ready: bool,
    /// available (Deployment) or ready (StatefulSet, DaemonSet) replicas
    pub current: i32,
    pub desired: i32,
}
