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

use crate::client::models::Policy;
use crate::client::{ApiHandle, StackroxApi};
use crate::utils::{api_error, string, unexpected_value, WithNormalize, WithSchema, WithValidate};

use super::state::PolicyState;

#[derive(Debug)]
pub struct PolicyResource<A> {
    pub(super) api: ApiHandle<A>,
}

impl<A: StackroxApi> PolicyResource<A> {
    pub fn new(api: ApiHandle<A>) -> Self {
        Self { api }
    }

    fn payload(diags: &mut Diagnostics, planned: &PolicyState<'_>) -> Option<Policy> {
        match planned.to_policy() {
            Ok(policy) => Some(policy),
            Err(err) => {
                diags.root_error("Invalid policy", err.to_string());
                None
            }
        }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &A,
        prior: &PolicyState<'a>,
    ) -> Option<Value<PolicyState<'a>>> {
        let id = prior.id.as_str();
        debug!(id, "reading policy");
        match api.get_policy(id).await {
            Ok(policy) => match PolicyState::from_policy(policy, prior) {
                Ok(state) => Some(Value::Value(state)),
                Err(err) => {
                    unexpected_value(diags, &err);
                    None
                }
            },
            Err(err) if err.is_not_found() => {
                warn!(id, "policy not found, removing it from state");
                Some(Value::Null)
            }
            Err(err) => {
                api_error(diags, "Failed to read policy", &err);
                None
            }
        }
    }
}

#[async_trait]
impl<A: StackroxApi> Resource for PolicyResource<A> {
    type State<'a> = Value<PolicyState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(PolicyState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.validate(diags);
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
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
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            if let Value::Value(config) = &config_state {
                state.reset_unconfigured(config);
            }
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
            diags.root_error_short("Cannot create a policy from a null plan");
            return None;
        };
        let policy = Self::payload(diags, &planned)?;
        let api = self.api.get(diags).await?;

        debug!(name = policy.name.as_str(), "creating policy");
        let policy = match api.post_policy(&policy).await {
            Ok(policy) => policy,
            Err(err) => {
                api_error(diags, "Failed to create policy", &err);
                return None;
            }
        };
        planned.id = string(policy.id);

        match self.refresh(diags, &api, &planned).await? {
            Value::Null => {
                diags.root_error_short("Policy disappeared right after its creation");
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
            diags.root_error_short("Cannot update a policy to a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;

        let changed = match &prior_state {
            Value::Value(prior) => prior.has_changes(planned),
            _ => true,
        };
        if changed {
            let id = planned.id.as_str();
            let mut policy = Self::payload(diags, planned)?;
            policy.id = id.to_owned();

            debug!(id, "updating policy");
            if let Err(err) = api.put_policy(id, &policy).await {
                api_error(diags, "Failed to update policy", &err);
                return None;
            }
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

        debug!(id, "deleting policy");
        match api.delete_policy(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => {
                debug!(id, "policy already deleted");
                Some(())
            }
            Err(err) => {
                api_error(diags, "Failed to delete policy", &err);
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
        match api.get_policy(&id).await {
            Ok(policy) => match PolicyState::from_policy(policy, &Default::default()) {
                Ok(state) => Some((Value::Value(state), Default::default())),
                Err(err) => {
                    unexpected_value(diags, &err);
                    None
                }
            },
            Err(err) => {
                api_error(diags, &format!("Failed to import policy `{id}`"), &err);
                None
            }
        }
    }
}
