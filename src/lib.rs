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

use crate::client::KubeClient;
use crate::config::{ClusterOptions, DiagnoseOptions};
use crate::context::Context;
use crate::error::Error;
use crate::types::workload::{Verdict, WorkloadKind, WorkloadRef};
use chrono::Utc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

pub mod client;
pub mod config;
pub mod context;
pub mod diagnose;
pub mod error;
pub mod report;
pub mod types;
pub mod utils;


const DEFAULT_LOG_FILTER: &str = "warn";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_target(true)
        .init();
}

/// Diagnoses one workload against the configured cluster and writes the
/// report to stdout. Ctrl-C aborts the run.
pub async fn run(
    kind: WorkloadKind,
    name: &str,
    cluster: &ClusterOptions,
    options: &DiagnoseOptions,
) -> Result<Verdict, Error> {
    init_tracing();

    let (client, namespace) = cluster.connect().await?;
    let ctx = Context::new(KubeClient::new(client))
        .with_tail_lines(options.tail)
        .with_concurrency(options.concurrency);

    let cancel = ctx.cancellation();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel.cancel(),
            Err(e) => warn!("failed to listen for ctrl-c: {}", e),
        }
    });

    let target = WorkloadRef::new(kind, namespace, name);
    info!("diagnosing {} {}", kind, target);

    let mut stdout = tokio::io::stdout();
    diagnose::run(&ctx, &target, Utc::now(), &mut stdout)
        .await
        .inspect_err(|e| {
            if e.is_not_found() {
                debug!("{} {} does not exist in the cluster", kind, target);
            } else if e.is_precondition() {
                warn!("{} {} has not been reconciled yet: {}", kind, target, e);
            }
        })
}
