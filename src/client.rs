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

use crate::error::{Error, KubeSnafu, NotFoundSnafu};
use crate::types::workload::{Workload, WorkloadKind, WorkloadRef};
use futures::AsyncBufRead;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1;
use k8s_openapi::api::core::v1 as corev1;
use kube::api::{ListParams, LogParams};
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use snafu::OptionExt;
use snafu::futures::TryFutureExt;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Byte stream of a container log.
pub type LogStream = Pin<Box<dyn AsyncBufRead + Send>>;

/// The cluster reads a diagnosis needs. Nothing here mutates the cluster.
pub trait ClusterClient {
    fn get_workload(
        &self,
        target: &WorkloadRef,
    ) -> impl Future<Output = Result<Workload, Error>> + Send;

    fn list_replica_sets(
        &self,
        namespace: &str,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<v1::ReplicaSet>, Error>> + Send;

    fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<corev1::Pod>, Error>> + Send;

    /// Events whose involved object is `object`, in server order.
    fn search_events(
        &self,
        object: &corev1::ObjectReference,
    ) -> impl Future<Output = Result<Vec<corev1::Event>, Error>> + Send;

    fn stream_container_log(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> impl Future<Output = Result<LogStream, Error>> + Send;
}

/// `ClusterClient` backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    async fn get<T>(&self, target: &WorkloadRef) -> Result<T, Error>
    where
        T: Clone + DeserializeOwned + Debug + Resource<Scope = NamespaceResourceScope>,
        <T as Resource>::DynamicType: Default,
    {
        let api: Api<T> = Api::namespaced(self.client.clone(), &target.namespace);
        api.get_opt(&target.name)
            .context(KubeSnafu)
            .await?
            .context(NotFoundSnafu {
                kind: target.kind,
                namespace: &target.namespace,
                name: &target.name,
            })
    }

    async fn list<T>(&self, namespace: &str, selector: &str) -> Result<Vec<T>, Error>
    where
        T: Clone + DeserializeOwned + Debug + Resource<Scope = NamespaceResourceScope>,
        <T as Resource>::DynamicType: Default,
    {
        let api: Api<T> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(selector))
            .context(KubeSnafu)
            .await?;
        Ok(list.items)
    }
}

impl ClusterClient for KubeClient {
    async fn get_workload(&self, target: &WorkloadRef) -> Result<Workload, Error> {
        debug!("get {} {}", target.kind, target);
        Ok(match target.kind {
            WorkloadKind::Deployment => Workload::Deployment(self.get(target).await?),
            WorkloadKind::StatefulSet => Workload::StatefulSet(self.get(target).await?),
            WorkloadKind::DaemonSet => Workload::DaemonSet(self.get(target).await?),
        })
    }

    async fn list_replica_sets(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<v1::ReplicaSet>, Error> {
        self.list(namespace, selector).await
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> Result<Vec<corev1::Pod>, Error> {
        self.list(namespace, selector).await
    }

    async fn search_events(
        &self,
        object: &corev1::ObjectReference,
    ) -> Result<Vec<corev1::Event>, Error> {
        let namespace = object.namespace.as_deref().unwrap_or_default();
        let mut fields = vec![
            format!(
                "involvedObject.name={}",
                object.name.as_deref().unwrap_or_default()
            ),
            format!("involvedObject.namespace={namespace}"),
        ];
        if let Some(kind) = &object.kind {
            fields.push(format!("involvedObject.kind={kind}"));
        }
        if let Some(uid) = &object.uid {
            fields.push(format!("involvedObject.uid={uid}"));
        }

        let api: Api<corev1::Event> = Api::namespaced(self.client.clone(), namespace);
        let events = api
            .list(&ListParams::default().fields(&fields.join(",")))
            .context(KubeSnafu)
            .await?;
        Ok(events.items)
    }

    async fn stream_container_log(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<LogStream, Error> {
        let api: Api<corev1::Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_owned()),
            tail_lines: Some(tail_lines),
            ..Default::default()
        };
        let stream = api.log_stream(pod, &params).context(KubeSnafu).await?;
        Ok(Box::pin(stream))
    }
}
