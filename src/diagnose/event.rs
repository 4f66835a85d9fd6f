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
use crate::error::Error;
use crate::utils::status::filter_warning_events;
use k8s_openapi::api::core::v1 as corev1;
use kube::Resource;

/// Warning events recorded against `object`, in the order the API returned
/// them.
pub async fn warning_events<C, K>(ctx: &Context<C>, object: &K) -> Result<Vec<corev1::Event>, Error>
where
    C: ClusterClient,
    K: Resource<DynamicType = ()>,
{
    let reference = object.object_ref(&());
    let events = ctx.client.search_events(&reference).await?;
    Ok(filter_warning_events(events))
}
