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

use crate::types::workload::WorkloadKind;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Kubernetes API error: {}", source))]
    Kube { source: kube::Error },

    #[snafu(display("{} \"{}/{}\" not found", kind, namespace, name))]
    NotFound {
        kind: WorkloadKind,
        namespace: String,
        name: String,
    },

    #[snafu(display("object has no namespace associated"))]
    NoNamespace,

    #[snafu(display("not found ReplicaSet"))]
    ReplicaSetNotFound,

    #[snafu(display("ReplicaSet {} does not have pod-template-hash", name))]
    MissingPodTemplateHash { name: String },

    #[snafu(display(".status.{} is empty", field))]
    EmptyStatusField { field: &'static str },

    #[snafu(display("read log of container {}/{}: {}", pod, container, source))]
    ReadLog {
        pod: String,
        container: String,
        source: std::io::Error,
    },

    #[snafu(display("write report: {}", source))]
    Write { source: std::io::Error },

    #[snafu(display("load kubeconfig: {}", source))]
    Kubeconfig {
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("infer cluster config: {}", source))]
    InferConfig {
        source: kube::config::InferConfigError,
    },

    #[snafu(display("unsupported label selector operator \"{}\"", operator))]
    UnsupportedSelectorOperator { operator: String },

    #[snafu(display("diagnosis interrupted"))]
    Cancelled,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Errors raised because the workload has not reported enough status to
    /// pick its current pods.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::NoNamespace
                | Error::ReplicaSetNotFound
                | Error::MissingPodTemplateHash { .. }
                | Error::EmptyStatusField { .. }
        )
    }
}
