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
use reqwest::StatusCode;
use tracing::{debug, warn};

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::client::{ApiHandle, StackroxApi};
use crate::utils::{api_error, unexpected_value, WithNormalize, WithSchema, WithValidate};

use super::state::ClusterState;

#[derive(Debug)]
pub struct KubernetesClusterResource<A> {
    pub(super) api: ApiHandle<A>,
}

impl<A: StackroxApi> KubernetesClusterResource<A> {
    pub fn new(api: ApiHandle<A>) -> Self {
        Self { api }
    }

    /// Fetch the cluster and project it onto the local state, null if it no longer exists
    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &A,
        id: &str,
    ) -> Option<Value<ClusterState<'a>>> {
        debug!(id, "reading kubernetes cluster");
        match api.get_cluster(id).await {
            Ok(cluster) => match ClusterState::from_cluster(cluster) {
                Ok(state) => Some(Value::Value(state)),
                Err(err) => {
                    unexpected_value(diags, &err);
                    None
                }
            },
            Err(err) if err.is_not_found() => {
                warn!(id, "kubernetes cluster not found, removing it from state");
                Some(Value::Null)
            }
            Err(err) => {
                api_error(diags, "Failed to read kubernetes cluster", &err);
                None
            }
        }
    }

    async fn apply<'a>(
        &self,
        diags: &mut Diagnostics,
        planned: &ClusterState<'a>,
    ) -> Option<Value<ClusterState<'a>>> {
        let api = self.api.get(diags).await?;
        let cluster = match planned.to_cluster() {
            Ok(cluster) => cluster,
            Err(err) => {
                diags.error(
                    "Invalid `collection_method`",
                    err.to_string(),
                    AttributePath::new("collection_method"),
                );
                return None;
            }
        };

        debug!(id = %cluster.id, "writing kubernetes cluster");
        if let Err(err) = api.put_cluster(&cluster.id, &cluster).await {
            api_error(diags, "Failed to write kubernetes cluster", &err);
            return None;
        }

        match self.refresh(diags, &api, &cluster.id).await? {
            Value::Null => {
                diags.root_error_short("Kubernetes cluster disappeared right after being written");
                None
            }
            state => Some(state),
        }
    }
}

#[async_trait]
impl<A: StackroxApi> Resource for KubernetesClusterResource<A> {
    type State<'a> = Value<ClusterState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ClusterState::schema())
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
        let state = self.refresh(diags, &api, prior.cluster_id.as_str()).await?;
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
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = proposed_state;
        let mut trigger_replace = Vec::new();
        if let (Value::Value(prior), Value::Value(state)) = (&prior_state, &mut state) {
            if let Value::Value(config) = &config_state {
                state.reset_unconfigured(config);
            }
            state.normalize(diags);
            if prior.cluster_id != state.cluster_id {
                trigger_replace.push(AttributePath::new("cluster_id"));
            }
        }
        Some((state, prior_private_state, trigger_replace))
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
        let Value::Value(planned) = &planned_state else {
            diags.root_error_short("Cannot create a kubernetes cluster from a null plan");
            return None;
        };
        let state = self.apply(diags, planned).await?;
        Some((state, private_state))
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
            diags.root_error_short("Cannot update a kubernetes cluster to a null plan");
            return None;
        };

        let changed = match &prior_state {
            Value::Value(prior) => prior.has_changes(planned),
            _ => true,
        };
        let state = if changed {
            self.apply(diags, planned).await?
        } else {
            let api = self.api.get(diags).await?;
            self.refresh(diags, &api, planned.cluster_id.as_str()).await?
        };
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

        debug!(id, "deleting kubernetes cluster");
        match api.delete_cluster(id).await {
            Ok(()) => Some(()),
            // StackRox answers unknown cluster ids with an internal error
            Err(err)
                if err.is_not_found()
                    || err.status() == Some(StatusCode::INTERNAL_SERVER_ERROR) =>
            {
                debug!(id, %err, "kubernetes cluster already deleted");
                Some(())
            }
            Err(err) => {
                api_error(diags, "Failed to delete kubernetes cluster", &err);
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
        match api.get_cluster(&id).await {
            Ok(cluster) => match ClusterState::from_cluster(cluster) {
                Ok(state) => Some((Value::Value(state), Default::default())),
                Err(err) => {
                    unexpected_value(diags, &err);
                    None
                }
            },
            Err(err) => {
                api_error(diags, &format!("Failed to import kubernetes cluster `{id}`"), &err);
                None
            }
        }
    }
}
