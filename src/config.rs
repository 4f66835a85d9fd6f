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

use crate::context::{DEFAULT_CONCURRENCY, DEFAULT_TAIL_LINES};
use crate::error::{Error, InferConfigSnafu, KubeSnafu, KubeconfigSnafu};
use clap::Args;
use clap::builder::RangedU64ValueParser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use snafu::ResultExt;
use std::path::PathBuf;
use tracing::debug;

/// Which cluster to talk to and where to look for the workload.
#[derive(Args, Clone, Debug, Default)]
pub struct ClusterOptions {
    /// Namespace of the workload. Defaults to the namespace of the current context.
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct DiagnoseOptions {
    /// Lines of log to show per not-ready container
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TAIL_LINES,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub tail: i64,

    /// Pods diagnosed at the same time
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub concurrency: usize,
}

impl Default for DiagnoseOptions {
    fn default() -> Self {
        Self {
            tail: DEFAULT_TAIL_LINES,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ClusterOptions {
    fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        }
    }

    /// Builds the client config from an already parsed kubeconfig.
    pub async fn resolve(&self, kubeconfig: Kubeconfig) -> Result<Config, Error> {
        Config::from_custom_kubeconfig(kubeconfig, &self.kubeconfig_options())
            .await
            .context(KubeconfigSnafu)
    }

    /// An explicit `--kubeconfig` wins, then `--context` against the default
    /// kubeconfig, then the usual inference (`KUBECONFIG`, `~/.kube/config`,
    /// in-cluster service account).
    pub async fn load(&self) -> Result<Config, Error> {
        if let Some(path) = &self.kubeconfig {
            debug!("loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).context(KubeconfigSnafu)?;
            return self.resolve(kubeconfig).await;
        }
        if self.context.is_some() {
            return Config::from_kubeconfig(&self.kubeconfig_options())
                .await
                .context(KubeconfigSnafu);
        }
        Config::infer().await.context(InferConfigSnafu)
    }

    pub fn namespace(&self, config: &Config) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| config.default_namespace.clone())
    }

    /// Connects to the cluster and resolves the target namespace.
    pub async fn connect(&self) -> Result<(Client, String), Error> {
        let config = self.load().await?;
        let namespace = self.namespace(&config);
        debug!("connecting to {} (namespace {namespace})", config.cluster_url);
        let client = Client::try_from(config).context(KubeSnafu)?;
        Ok((client, namespace))
    }
}
