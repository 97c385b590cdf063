// This file is part of the terraform-provider-stackrox project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
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

//! In-memory StackRox used by the resource tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::StatusCode;
use tf_provider::Diagnostics;

use super::models::{AuthProvider, Cluster, Group, GroupBatchUpdate, ImageIntegration, Notifier, Policy};
use super::{ApiError, ApiHandle, ClientConfig, Result, StackroxApi};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub config: Option<ClientConfig>,
    /// Names of the calls received, in order
    pub calls: Vec<&'static str>,
    pub fail_with: Option<StatusCode>,
    pub auto_upgrade: Option<bool>,
    pub image_integrations: BTreeMap<String, ImageIntegration>,
    pub clusters: BTreeMap<String, Cluster>,
    pub auth_providers: BTreeMap<String, AuthProvider>,
    pub groups: Vec<Group>,
    pub policies: BTreeMap<String, Policy>,
    pub notifiers: BTreeMap<String, Notifier>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

pub(crate) async fn fake_handle() -> (ApiHandle<FakeApi>, Arc<FakeApi>) {
    let handle = ApiHandle::configured(FakeApi::default());
    let api = handle
        .get(&mut Diagnostics::default())
        .await
        .expect("handle is configured");
    (handle, api)
}

fn status(status: StatusCode) -> ApiError {
    ApiError::Status {
        status,
        body: format!("{{\"error\":\"{status}\"}}"),
    }
}

fn not_found() -> ApiError {
    status(StatusCode::NOT_FOUND)
}

impl FakeApi {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state poisoned")
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make every following call fail with `status`
    pub fn fail_with(&self, status: StatusCode) {
        self.state().fail_with = Some(status);
    }

    fn call(&self, name: &'static str) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.calls.push(name);
        match state.fail_with {
            Some(code) => Err(status(code)),
            None => Ok(state),
        }
    }
}

impl FakeState {
    fn new_id(&mut self) -> String {
        self.next_id += 1;
        format!("fake-{:08}", self.next_id)
    }
}

#[async_trait]
impl StackroxApi for FakeApi {
    fn connect(config: ClientConfig) -> Result<Self> {
        let api = FakeApi::default();
        api.state().config = Some(config);
        Ok(api)
    }

    async fn update_sensor_upgrade_config(&self, enable_auto_upgrade: bool) -> Result<()> {
        let mut state = self.call("update_sensor_upgrade_config")?;
        state.auto_upgrade = Some(enable_auto_upgrade);
        Ok(())
    }

    async fn get_image_integration(&self, id: &str) -> Result<ImageIntegration> {
        let state = self.call("get_image_integration")?;
        let mut integration = state.image_integrations.get(id).cloned().ok_or_else(not_found)?;
        if let Some(docker) = &mut integration.docker {
            docker.password.clear();
        }
        Ok(integration)
    }

    async fn list_image_integrations(&self, name: Option<&str>) -> Result<Vec<ImageIntegration>> {
        let state = self.call("list_image_integrations")?;
        Ok(state
            .image_integrations
            .values()
            .filter(|integration| name.map_or(true, |name| integration.name == name))
            .cloned()
            .map(|mut integration| {
                if let Some(docker) = &mut integration.docker {
                    docker.password.clear();
                }
                integration
            })
            .collect())
    }

    async fn post_image_integration(
        &self,
        integration: &ImageIntegration,
    ) -> Result<ImageIntegration> {
        let mut state = self.call("post_image_integration")?;
        let mut integration = integration.clone();
        integration.id = state.new_id();
        state
            .image_integrations
            .insert(integration.id.clone(), integration.clone());
        Ok(integration)
    }

    async fn delete_image_integration(&self, id: &str) -> Result<()> {
        let mut state = self.call("delete_image_integration")?;
        state
            .image_integrations
            .remove(id)
            .map(drop)
            .ok_or_else(not_found)
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster> {
        let state = self.call("get_cluster")?;
        state.clusters.get(id).cloned().ok_or_else(not_found)
    }

    async fn put_cluster(&self, id: &str, cluster: &Cluster) -> Result<Cluster> {
        let mut state = self.call("put_cluster")?;
        let mut cluster = cluster.clone();
        cluster.id = id.to_owned();
        state.clusters.insert(id.to_owned(), cluster.clone());
        Ok(cluster)
    }

    async fn delete_cluster(&self, id: &str) -> Result<()> {
        let mut state = self.call("delete_cluster")?;
        // StackRox reports unknown clusters as an internal error
        state
            .clusters
            .remove(id)
            .map(drop)
            .ok_or_else(|| status(StatusCode::INTERNAL_SERVER_ERROR))
    }

    async fn get_auth_provider(&self, id: &str) -> Result<AuthProvider> {
        let state = self.call("get_auth_provider")?;
        state.auth_providers.get(id).cloned().ok_or_else(not_found)
    }

    async fn post_auth_provider(&self, provider: &AuthProvider) -> Result<AuthProvider> {
        let mut state = self.call("post_auth_provider")?;
        let mut provider = provider.clone();
        provider.id = state.new_id();
        state
            .auth_providers
            .insert(provider.id.clone(), provider.clone());
        Ok(provider)
    }

    async fn put_auth_provider(&self, id: &str, provider: &AuthProvider) -> Result<AuthProvider> {
        let mut state = self.call("put_auth_provider")?;
        let stored = state.auth_providers.get_mut(id).ok_or_else(not_found)?;
        *stored = AuthProvider {
            id: id.to_owned(),
            ..provider.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_auth_provider(&self, id: &str) -> Result<()> {
        let mut state = self.call("delete_auth_provider")?;
        state.auth_providers.remove(id).ok_or_else(not_found)?;
        state.groups.retain(|group| group.props.auth_provider_id != id);
        Ok(())
    }

    async fn find_groups(&self, auth_provider_id: &str) -> Result<Vec<Group>> {
        let state = self.call("find_groups")?;
        Ok(state
            .groups
            .iter()
            .filter(|group| group.props.auth_provider_id == auth_provider_id)
            .cloned()
            .collect())
    }

    async fn batch_update_groups(&self, update: &GroupBatchUpdate) -> Result<()> {
        let mut state = self.call("batch_update_groups")?;
        state
            .groups
            .retain(|group| !update.previous_groups.contains(group));
        for group in &update.required_groups {
            if !state.groups.contains(group) {
                state.groups.push(group.clone());
            }
        }
        Ok(())
    }

    async fn get_policy(&self, id: &str) -> Result<Policy> {
        let state = self.call("get_policy")?;
        state.policies.get(id).cloned().ok_or_else(not_found)
    }

    async fn post_policy(&self, policy: &Policy) -> Result<Policy> {
        let mut state = self.call("post_policy")?;
        let mut policy = policy.clone();
        policy.id = state.new_id();
        state.policies.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    async fn put_policy(&self, id: &str, policy: &Policy) -> Result<()> {
        let mut state = self.call("put_policy")?;
        let stored = state.policies.get_mut(id).ok_or_else(not_found)?;
        *stored = Policy {
            id: id.to_owned(),
            ..policy.clone()
        };
        Ok(())
    }

    async fn delete_policy(&self, id: &str) -> Result<()> {
        let mut state = self.call("delete_policy")?;
        state.policies.remove(id).map(drop).ok_or_else(not_found)
    }

    async fn get_notifier(&self, id: &str) -> Result<Notifier> {
        let state = self.call("get_notifier")?;
        let mut notifier = state.notifiers.get(id).cloned().ok_or_else(not_found)?;
        if let Some(splunk) = &mut notifier.splunk {
            splunk.http_token.clear();
        }
        Ok(notifier)
    }

    async fn post_notifier(&self, notifier: &Notifier) -> Result<Notifier> {
        let mut state = self.call("post_notifier")?;
        let mut notifier = notifier.clone();
        notifier.id = state.new_id();
        state.notifiers.insert(notifier.id.clone(), notifier.clone());
        Ok(notifier)
    }

    async fn put_notifier(&self, id: &str, notifier: &Notifier) -> Result<()> {
        let mut state = self.call("put_notifier")?;
        let stored = state.notifiers.get_mut(id).ok_or_else(not_found)?;
        *stored = Notifier {
            id: id.to_owned(),
            ..notifier.clone()
        };
        Ok(())
    }

    async fn delete_notifier(&self, id: &str) -> Result<()> {
        let mut state = self.call("delete_notifier")?;
        state.notifiers.remove(id).ok_or_else(not_found)?;
        for policy in state.policies.values_mut() {
            policy.notifiers.retain(|notifier| notifier != id);
        }
        Ok(())
    }
}
