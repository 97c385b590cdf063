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

use async_trait::async_trait;
use tracing::{debug, warn};

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::client::models::GroupBatchUpdate;
use crate::client::{ApiHandle, StackroxApi};
use crate::utils::{api_error, string, WithNormalize, WithSchema};

use super::state::OktaState;

#[derive(Debug)]
pub struct OktaAuthProviderResource<A> {
    pub(super) api: ApiHandle<A>,
}

impl<A: StackroxApi> OktaAuthProviderResource<A> {
    pub fn new(api: ApiHandle<A>) -> Self {
        Self { api }
    }

    /// Fetch the auth provider with its groups, null if it no longer exists
    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &A,
        prior: &OktaState<'a>,
    ) -> Option<Value<OktaState<'a>>> {
        let id = prior.id.as_str();
        debug!(id, "reading okta auth provider");
        let provider = match api.get_auth_provider(id).await {
            Ok(provider) => provider,
            Err(err) if err.is_not_found() => {
                warn!(id, "okta auth provider not found, removing it from state");
                return Some(Value::Null);
            }
            Err(err) => {
                api_error(diags, "Failed to read okta auth provider", &err);
                return None;
            }
        };
        match api.find_groups(id).await {
            Ok(groups) => Some(Value::Value(OktaState::from_remote(provider, groups, prior))),
            Err(err) => {
                api_error(diags, "Failed to read okta auth provider groups", &err);
                None
            }
        }
    }

    async fn write_groups(
        &self,
        diags: &mut Diagnostics,
        api: &A,
        update: GroupBatchUpdate,
    ) -> Option<()> {
        debug!(
            removed = update.previous_groups.len(),
            required = update.required_groups.len(),
            "updating okta auth provider groups"
        );
        match api.batch_update_groups(&update).await {
            Ok(()) => Some(()),
            Err(err) => {
                api_error(diags, "Failed to update okta auth provider groups", &err);
                None
            }
        }
    }
}

#[async_trait]
impl<A: StackroxApi> Resource for OktaAuthProviderResource<A> {
    type State<'a> = Value<OktaState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(OktaState::schema())
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(prior) = &state else {
            return Some((state, private_state));
        };
        let api = self.api.get(diags).await?;
        let state = self.refresh(diags, &api, prior).await?;
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            state.normalize(diags);
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            state.normalize(diags);
        }
        Some((state, prior_private_state, Vec::new()))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut planned) = planned_state else {
            diags.root_error_short("Cannot create an okta auth provider from a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;

        debug!(name = planned.name.as_str(), "creating okta auth provider");
        let provider = match api.post_auth_provider(&planned.to_auth_provider()).await {
            Ok(provider) => provider,
            Err(err) => {
                api_error(diags, "Failed to create okta auth provider", &err);
                return None;
            }
        };
        planned.id = string(provider.id.clone());

        let update = GroupBatchUpdate {
            previous_groups: Vec::new(),
            required_groups: planned.to_groups(&provider.id),
        };
        self.write_groups(diags, &api, update).await?;

        match self.refresh(diags, &api, &planned).await? {
            Value::Null => {
                diags.root_error_short("Okta auth provider disappeared right after its creation");
                None
            }
            state => Some((state, private_state)),
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(planned) = &planned_state else {
            diags.root_error_short("Cannot update an okta auth provider to a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;
        let id = planned.id.as_str();

        let (entity_changed, groups_changed) = match &prior_state {
            Value::Value(prior) => (prior.has_entity_changes(planned), prior.group != planned.group),
            _ => (true, true),
        };

        if entity_changed {
            debug!(id, "updating okta auth provider");
            let mut provider = planned.to_auth_provider();
            provider.id = id.to_owned();
            if let Err(err) = api.put_auth_provider(id, &provider).await {
                api_error(diags, "Failed to update okta auth provider", &err);
                return None;
            }
        }

        if groups_changed {
            let previous_groups = match api.find_groups(id).await {
                Ok(groups) => groups,
                Err(err) => {
                    api_error(diags, "Failed to read okta auth provider groups", &err);
                    return None;
                }
            };
            let update = GroupBatchUpdate {
                previous_groups,
                required_groups: planned.to_groups(id),
            };
            self.write_groups(diags, &api, update).await?;
        }

        let state = self.refresh(diags, &api, planned).await?;
        Some((state, private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(state) = &state else {
            return Some(());
        };
        let api = self.api.get(diags).await?;
        let id = state.id.as_str();

        debug!(id, "deleting okta auth provider");
        match api.delete_auth_provider(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => {
                debug!(id, "okta auth provider already deleted");
                Some(())
            }
            Err(err) => {
                api_error(diags, "Failed to delete okta auth provider", &err);
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let api = self.api.get(diags).await?;
        let prior = OktaState {
            id: string(id.clone()),
            ..Default::default()
        };
        match self.refresh(diags, &api, &prior).await? {
            Value::Value(state) => Some((Value::Value(state), Default::default())),
            _ => {
                diags.root_error_short(format!("Okta auth provider `{id}` does not exist"));
                None
            }
        }
    }
}
