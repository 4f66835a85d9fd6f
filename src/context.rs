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
use crate::error::{CancelledSnafu, Error};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub const DEFAULT_TAIL_LINES: i64 = 15;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Everything a diagnosis run shares: the cluster handle, tuning knobs and the
/// cancellation signal.
pub struct Context<C> {
    pub(crate) client: C,
    pub(crate) tail_lines: i64,
    pub(crate) concurrency: usize,
    pub(crate) cancel: CancellationToken,
}

impl<C: ClusterClient> Context<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            tail_lines: DEFAULT_TAIL_LINES,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_tail_lines(mut self, tail_lines: i64) -> Self {
        self.tail_lines = tail_lines.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// A handle that aborts every in-flight and future cluster call of this
    /// context once cancelled.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs `fut` unless the context gets cancelled first.
    pub(crate) async fn guard<T, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!("diagnosis cancelled");
                CancelledSnafu.fail()
            }
            res = fut => res,
        }
    }
}
