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
use crate::error::{Error, ReadLogSnafu};
use futures::AsyncBufReadExt;
use snafu::ResultExt;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

const NO_OUTPUT: &str = "<none>";

/// Tail of one container's log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerLog {
    pub container: String,
    pub lines: Vec<String>,
}

impl ContainerLog {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for ContainerLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{NO_OUTPUT}");
        }
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// One log line without its terminator. Bytes that are not UTF-8 are replaced
/// rather than failing the read.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

pub async fn fetch<C: ClusterClient>(
    ctx: &Context<C>,
    namespace: &str,
    pod: &str,
    container: &str,
) -> Result<ContainerLog, Error> {
    let mut stream = ctx
        .client
        .stream_container_log(namespace, pod, container, ctx.tail_lines)
        .await?;

    let tail = usize::try_from(ctx.tail_lines).unwrap_or(usize::MAX).max(1);
    let mut lines = VecDeque::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = stream
            .read_until(b'\n', &mut buf)
            .await
            .context(ReadLogSnafu { pod, container })?;
        if read == 0 {
            break;
        }
        if lines.len() == tail {
            lines.pop_front();
        }
        lines.push_back(decode_line(&buf));
    }
    debug!("fetched {} log lines of {pod}/{container}", lines.len());

    Ok(ContainerLog {
        container: container.to_owned(),
        lines: lines.into(),
    })
}
