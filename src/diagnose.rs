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
use crate::error::{Error, WriteSnafu};
use crate::report;
use crate::types::workload::{Verdict, Workload, WorkloadRef};
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt, stream};
use k8s_openapi::api::core::v1 as corev1;
use snafu::ResultExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

pub mod daemonset;
pub mod deployment;
pub mod event;
pub mod log;
pub mod pod;
pub mod statefulset;

/// Fetches the workload and judges its readiness from status alone.
pub async fn evaluate<C: ClusterClient>(
    ctx: &Context<C>,
    target: &WorkloadRef,
) -> Result<(Verdict, Workload), Error> {
    let workload = ctx.guard(ctx.client.get_workload(target)).await?;
    let verdict = match &workload {
        Workload::Deployment(d) => deployment::evaluate(d),
        Workload::StatefulSet(s) => statefulset::evaluate(s),
        Workload::DaemonSet(d) => daemonset::evaluate(d),
    };
    debug!("{} {}: {:?}", target.kind, target, verdict);
    Ok((verdict, workload))
}

/// Child pods of the workload's current generation, in listing order.
pub async fn locate<C: ClusterClient>(
    ctx: &Context<C>,
    workload: &Workload,
) -> Result<Vec<corev1::Pod>, Error> {
    let pods = match workload {
        Workload::Deployment(d) => ctx.guard(deployment::locate(ctx, d)).await?,
        Workload::StatefulSet(s) => ctx.guard(statefulset::locate(ctx, s)).await?,
        Workload::DaemonSet(d) => ctx.guard(daemonset::locate(ctx, d)).await?,
    };
    info!(
        "{} {}/{}: {} pods to diagnose",
        workload.kind(),
        workload.namespace()?,
        workload.name(),
        pods.len()
    );
    Ok(pods)
}

async fn write_out<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), Error> {
    out.write_all(text.as_bytes()).await.context(WriteSnafu)?;
    out.flush().await.context(WriteSnafu)
}

/// Diagnoses `target` and writes the report to `out`.
///
/// The verdict is written before any pod is looked at, so an error raised while
/// locating or diagnosing pods surfaces after the header. Pods are diagnosed
/// with at most `concurrency` in flight and reported in listing order; pods with
/// nothing to report are left out and the remaining blocks are separated by a
/// blank line.
pub async fn run<C, W>(
    ctx: &Context<C>,
    target: &WorkloadRef,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<Verdict, Error>
where
    C: ClusterClient,
    W: AsyncWrite + Unpin,
{
    let (verdict, workload) = evaluate(ctx, target).await?;
    write_out(out, &report::render_verdict(target, &verdict)).await?;
    if verdict.ready {
        return Ok(verdict);
    }

    let pods = locate(ctx, &workload).await?;
    let mut diagnoses = std::pin::pin!(
        stream::iter(&pods)
            .map(|p| ctx.guard(pod::diagnose(ctx, p)))
            .buffered(ctx.concurrency)
    );

    let mut reported = 0;
    while let Some(diagnosis) = diagnoses.try_next().await? {
        if diagnosis.is_healthy() {
            debug!("pod {} has nothing to report", diagnosis.pod_name);
            continue;
        }
        if reported > 0 {
            write_out(out, "\n").await?;
        }
        write_out(out, &report::render_pod(&diagnosis, now)).await?;
        reported += 1;
    }

    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{
        FakeClient, deployment, event, fixed_now, pod, replica_set, stateful_set,
    };
    use crate::types::workload::WorkloadKind;
    use serde_json::json;
    use std::time::Duration;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
spec:
  replicas: 3
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
status:
  replicas: 3
  availableReplicas: 2
  conditions:
    - type: Progressing
      status: "True"
    - type: Available
      status: "False"
      message: Deployment does not have minimum availability.
"#;

    const REPLICA_SET: &str = r#"
apiVersion: apps/v1
kind: ReplicaSet
metadata:
  name: web-7f9
  namespace: prod
  labels:
    app: web
    pod-template-hash: 7f9
spec:
  selector:
    matchLabels:
      app: web
      pod-template-hash: 7f9
status:
  replicas: 3
  observedGeneration: 5
"#;

    const CRASHING_POD: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: web-7f9-x2k9p
  namespace: prod
  uid: 0b6f1f7e-crash
  labels:
    app: web
    pod-template-hash: "7f9"
status:
  phase: Running
  conditions:
    - type: Initialized
      status: "True"
    - type: Ready
      status: "False"
      message: "containers with unready status: [app]"
    - type: ContainersReady
      status: "False"
      message: "containers with unready status: [app]"
    - type: PodScheduled
      status: "True"
  containerStatuses:
    - name: app
      image: web:1.4
      imageID: ""
      ready: false
      restartCount: 4
      state:
        waiting:
          reason: CrashLoopBackOff
          message: back-off 5m0s restarting failed container
      lastState:
        terminated:
          exitCode: 1
          reason: Error
          containerID: containerd://0f3a
"#;

    const HEALTHY_POD: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: POD_NAME
  namespace: prod
  uid: POD_NAME-uid
  labels:
    app: web
    pod-template-hash: "7f9"
status:
  phase: Running
  conditions:
    - type: Initialized
      status: "True"
    - type: Ready
      status: "True"
    - type: ContainersReady
      status: "True"
    - type: PodScheduled
      status: "True"
  containerStatuses:
    - name: app
      image: web:1.4
      imageID: ""
      ready: true
      restartCount: 0
      containerID: containerd://77aa
      state:
        running: {}
"#;

    const EXPECTED_REPORT: &str = "\
Deployment prod/web is not available (2/3)

[ContainersReady] Pod/web-7f9-x2k9p: containers with unready status: [app]
  [CrashLoopBackOff] Pod/web-7f9-x2k9p/app: back-off 5m0s restarting failed container (restarted x4)

Container \"app\" Log:
panic: missing DATABASE_URL

Reason   Age               From             Object                 Message
------   ----              ----             ------                 -------
BackOff  5m (x4 over 10m)  kubelet, node-1  Pod/web-7f9-x2k9p/app  Back-off restarting failed container
";

    fn from_yaml<T: serde::de::DeserializeOwned>(manifest: &str) -> T {
        serde_yaml_ng::from_str(manifest).expect("valid manifest")
    }

    fn healthy_pod(name: &str) -> corev1::Pod {
        from_yaml(&HEALTHY_POD.replace("POD_NAME", name))
    }

    fn crash_looping_web() -> FakeClient {
        FakeClient::default()
            .with_workload(Workload::Deployment(from_yaml(DEPLOYMENT)))
            .with_replica_set(from_yaml(REPLICA_SET))
            .with_pod(healthy_pod("web-7f9-7ffq2"))
            .with_pod(from_yaml(CRASHING_POD))
            .with_pod(healthy_pod("web-7f9-m4n8d"))
            .with_log("prod", "web-7f9-x2k9p", "app", "panic: missing DATABASE_URL\n")
            .with_event(event("prod", "web-7f9-x2k9p", "Warning", "BackOff", 4))
            .with_event(event("prod", "web-7f9-x2k9p", "Normal", "Pulled", 4))
    }

    async fn render(ctx: &Context<FakeClient>, target: &WorkloadRef) -> (Result<Verdict, Error>, String) {
        let mut out = Vec::new();
        let res = run(ctx, target, fixed_now(), &mut out).await;
        (res, String::from_utf8(out).expect("utf-8 report"))
    }

    #[tokio::test]
    async fn test_available_deployment_makes_no_further_calls() {
        let client = FakeClient::default()
            .with_workload(Workload::Deployment(deployment("prod", "web", Some("True"), 3, 3)))
            .with_replica_set(replica_set("prod", "web-a", Some("a"), 1));
        let ctx = Context::new(client);
        let target = WorkloadRef::new(WorkloadKind::Deployment, "prod", "web");

        let (res, text) = render(&ctx, &target).await;

        assert!(res.expect("diagnosis").ready);
        assert_eq!(text, "Deployment prod/web is available\n");
        assert_eq!(
            ctx.client.calls(),
            vec!["get_workload Deployment prod/web".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_crash_looping_deployment_report() {
        let ctx = Context::new(crash_looping_web());
        let target = WorkloadRef::new(WorkloadKind::Deployment, "prod", "web");

        let (res, text) = render(&ctx, &target).await;

        let verdict = res.expect("diagnosis");
        assert!(!verdict.ready);
        assert_eq!((verdict.current, verdict.desired), (2, 3));
        assert_eq!(text, EXPECTED_REPORT);

        assert!(text.starts_with("Deployment prod/web is not available (2/3)\n"));
        assert!(text.contains("(restarted x4)"));
        assert!(text.contains("Container \"app\" Log:\npanic: missing DATABASE_URL\n"));
        let event_rows: Vec<_> = text.lines().skip_while(|l| !l.starts_with("Reason")).skip(2).collect();
        assert_eq!(event_rows.len(), 1);
        assert!(event_rows[0].starts_with("BackOff"));
        assert!(!text.contains("web-7f9-7ffq2"));
        assert!(!text.contains("web-7f9-m4n8d"));

        let calls = ctx.client.calls();
        assert!(calls.contains(&"list_replica_sets prod app=web".to_owned()));
        assert!(calls.contains(&"list_pods prod app=web,pod-template-hash=7f9".to_owned()));
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("stream_container_log")).collect::<Vec<_>>(),
            vec!["stream_container_log prod web-7f9-x2k9p app 15"]
        );
    }

    #[tokio::test]
    async fn test_report_is_reproducible() {
        let ctx = Context::new(crash_looping_web()).with_concurrency(1);
        let target = WorkloadRef::new(WorkloadKind::Deployment, "prod", "web");

        let (_, first) = render(&ctx, &target).await;
        let (_, second) = render(&ctx, &target).await;
        assert_eq!(first, second);
    }

    fn unschedulable_db(name: &str, message: &str) -> corev1::Pod {
        let mut p = pod(
            "prod",
            name,
            json!({"conditions": [{"type": "PodScheduled", "status": "False", "message": message}]}),
        );
        p.metadata.labels = Some(
            [("app".to_owned(), "db".to_owned()), ("controller-revision-hash".to_owned(), "db-1".to_owned())]
                .into(),
        );
        p
    }

    fn unschedulable_db_cluster() -> FakeClient {
        FakeClient::default()
            .with_workload(Workload::StatefulSet(stateful_set("prod", "db", 0, 3, "db-1", "db-1")))
            .with_pod(unschedulable_db("db-0", "first"))
            .with_pod(unschedulable_db("db-1", "second"))
            .with_pod(unschedulable_db("db-2", "third"))
    }

    const UNSCHEDULABLE_DB_REPORT: &str = "StatefulSet prod/db is not ready (0/3)\n\n\
         [PodScheduled] Pod/db-0: first\n\
         \n\
         [PodScheduled] Pod/db-1: second\n\
         \n\
         [PodScheduled] Pod/db-2: third\n";

    #[tokio::test]
    async fn test_pod_blocks_follow_listing_order() {
        let ctx = Context::new(unschedulable_db_cluster()).with_concurrency(3);
        let target = WorkloadRef::new(WorkloadKind::StatefulSet, "prod", "db");

        let (res, text) = render(&ctx, &target).await;

        res.expect("diagnosis");
        assert_eq!(text, UNSCHEDULABLE_DB_REPORT);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_listing_order() {
        let client = unschedulable_db_cluster()
            .with_delay("db-0", Duration::from_millis(120))
            .with_delay("db-1", Duration::from_millis(60));
        let ctx = Context::new(client).with_concurrency(3);
        let target = WorkloadRef::new(WorkloadKind::StatefulSet, "prod", "db");

        let (res, text) = render(&ctx, &target).await;

        res.expect("diagnosis");
        assert_eq!(ctx.client.completed(), vec!["db-2", "db-1", "db-0"]);
        assert_eq!(text, UNSCHEDULABLE_DB_REPORT);
    }

    #[tokio::test]
    async fn test_cancel_while_pods_in_flight() {
        let client = unschedulable_db_cluster().with_delay("db-0", Duration::from_secs(30));
        let ctx = Context::new(client).with_concurrency(3);
        let target = WorkloadRef::new(WorkloadKind::StatefulSet, "prod", "db");

        let cancel = ctx.cancellation();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let (res, text) = tokio::time::timeout(Duration::from_secs(5), render(&ctx, &target))
            .await
            .expect("cancellation ends the run");

        assert!(matches!(res, Err(Error::Cancelled)));
        assert_eq!(text, "StatefulSet prod/db is not ready (0/3)\n\n");
        assert!(ctx.client.calls().contains(&"search_events prod db-0".to_owned()));
        assert!(!ctx.client.completed().contains(&"db-0".to_owned()));
    }

    #[tokio::test]
    async fn test_precondition_error_follows_header() {
        let client = FakeClient::default()
            .with_workload(Workload::StatefulSet(stateful_set("prod", "db", 1, 3, "", "")));
        let ctx = Context::new(client);
        let target = WorkloadRef::new(WorkloadKind::StatefulSet, "prod", "db");

        let (res, text) = render(&ctx, &target).await;

        let err = res.expect_err("no current revision");
        assert!(err.is_precondition());
        assert_eq!(text, "StatefulSet prod/db is not ready (1/3)\n\n");
    }

    #[tokio::test]
    async fn test_missing_workload_prints_nothing() {
        let ctx = Context::new(FakeClient::default());
        let target = WorkloadRef::new(WorkloadKind::DaemonSet, "kube-system", "agent");

        let (res, text) = render(&ctx, &target).await;

        let err = res.expect_err("not found");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "DaemonSet \"kube-system/agent\" not found");
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_any_call() {
        let ctx = Context::new(crash_looping_web());
        ctx.cancellation().cancel();
        let target = WorkloadRef::new(WorkloadKind::Deployment, "prod", "web");

        let (res, text) = render(&ctx, &target).await;

        assert!(matches!(res, Err(Error::Cancelled)));
        assert!(text.is_empty());
        assert!(ctx.client.calls().is_empty());
    }
}
