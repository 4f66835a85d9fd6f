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

use clap::{Parser, Subcommand};
use kubectl_diagnose::config::{ClusterOptions, DiagnoseOptions};
use kubectl_diagnose::run;
use kubectl_diagnose::types::workload::WorkloadKind;
use shadow_rs::shadow;
use std::process::ExitCode;

shadow!(build);

#[derive(Parser)]
#[command(name = "kubectl-diagnose")]
#[command(about = "Explain why a workload is not ready", long_about = None)]
#[command(version, long_version = build::CLAP_LONG_VERSION)]
struct Cli {
    #[command(flatten)]
    cluster: ClusterOptions,

    #[command(flatten)]
    options: DiagnoseOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose a Deployment
    #[command(visible_aliases = ["deploy", "dp"])]
    Deployment { name: String },

    /// Diagnose a StatefulSet
    #[command(name = "statefulset", visible_alias = "sts")]
    StatefulSet { name: String },

    /// Diagnose a DaemonSet
    #[command(name = "daemonset", visible_alias = "ds")]
    DaemonSet { name: String },
}

impl Commands {
    fn target(self) -> (WorkloadKind, String) {
        match self {
            Commands::Deployment { name } => (WorkloadKind::Deployment, name),
            Commands::StatefulSet { name } => (WorkloadKind::StatefulSet, name),
            Commands::DaemonSet { name } => (WorkloadKind::DaemonSet, name),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (kind, name) = cli.command.target();

    match run(kind, &name, &cli.cluster, &cli.options).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
