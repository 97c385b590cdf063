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

use crate::client::{ApiHandle, StackroxApi};
use crate::utils::{api_error, string, WithSchema};

use super::state::RegistryState;

#[derive(Debug)]
pub struct GenericImageRegistryResource<A> {
    pub(super) api: ApiHandle<A>,
}

impl<A: StackroxApi> GenericImageRegistryResource<A> {
    pub fn new(api: ApiHandle<A>) -> Self {
        Self { api }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &A,
        prior: &RegistryState<'a>,
    ) -> Option<Value<RegistryState<'a>>> {
        let id = prior.id.as_str();
        debug!(id, "reading image registry");
        match api.get_image_integration(id).await {
            Ok(integration) => Some(Value::Value(RegistryState::from_integration(
                integration,
                prior,
            ))),
            Err(err) if err.is_not_found() => {
                warn!(id, "image registry not found, removing it from state");
                Some(Value::Null)
            }
            Err(err) => {
                api_error(diags, "Failed to read image registry", &err);
                None
            }
        }
    }
}

#[async_trait]
impl<A: StackroxApi> Resource for GenericImageRegistryResource<A> {
    type State<'a> = Value<RegistryState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RegistryState::schema())
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
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            state.id = Value::Unknown;
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let trigger_replace = match (&prior_state, &proposed_state) {
            (Value::Value(prior), Value::Value(proposed)) => prior.replaced_attributes(proposed),
            _ => Vec::new(),
        };
        Some((proposed_state, prior_private_state, trigger_replace))
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
            diags.root_error_short("Cannot create an image registry from a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;

        debug!(name = planned.name.as_str(), "creating image registry");
        let integration = match api.post_image_integration(&planned.to_integration()).await {
            Ok(integration) => integration,
            Err(err) => {
                api_error(diags, "Failed to create image registry", &err);
                return None;
            }
        };
        planned.id = string(integration.id);

        match self.refresh(diags, &api, &planned).await? {
            Value::Null => {
                diags.root_error_short("Image registry disappeared right after its creation");
                None
            }
            state => Some((state, private_state)),
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // Every tracked field forces a replacement, only the password is left to store
        let Value::Value(planned) = &planned_state else {
            diags.root_error_short("Cannot update an image registry to a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;
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

        debug!(id, "deleting image registry");
        match api.delete_image_integration(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => {
                debug!(id, "image registry already deleted");
                Some(())
            }
            Err(err) => {
                api_error(diags, "Failed to delete image registry", &err);
                None
            }
        }
    }

    /// Import by name
    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let api = self.api.get(diags).await?;
        let mut integrations = match api.list_image_integrations(Some(&id)).await {
            Ok(integrations) => integrations,
            Err(err) => {
                api_error(diags, &format!("Failed to import image registry `{id}`"), &err);
                return None;
            }
        };

        match integrations.pop() {
            Some(integration) if integrations.is_empty() => Some((
                Value::Value(RegistryState::from_integration(
                    integration,
                    &Default::default(),
                )),
                Default::default(),
            )),
            last => {
                let count = integrations.len() + usize::from(last.is_some());
                diags.root_error(
                    format!("Failed to import image registry `{id}`"),
                    format!("invalid number of integrations: {count}"),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{fake_handle, FakeApi};

    fn config() -> RegistryState<'static> {
        RegistryState {
            name: string("registry"),
            endpoint: string("registry.example.com"),
            username: string("alice"),
            password: string("bob"),
            ..Default::default()
        }
    }

    async fn create(
        resource: &GenericImageRegistryResource<FakeApi>,
        config: RegistryState<'static>,
    ) -> RegistryState<'static> {
        let mut diags = Diagnostics::default();
        let (planned, private) = resource
            .plan_create(
                &mut diags,
                Value::Value(config.clone()),
                Value::Value(config.clone()),
                Value::Null,
            )
            .await
            .unwrap();
        let (state, _) = resource
            .create(&mut diags, planned, Value::Value(config), private, Value::Null)
            .await
            .unwrap();
        match state {
            Value::Value(state) => state,
            _ => panic!("created registry has no state"),
        }
    }

    #[tokio::test]
    async fn create_then_read_converges() {
        let (handle, api) = fake_handle().await;
        let resource = GenericImageRegistryResource::new(handle);
        let state = create(&resource, config()).await;

        assert!(!state.id.as_str().is_empty());
        assert_eq!(RegistryState { id: Value::Null, ..state.clone() }, config());

        let stored = api.state().image_integrations[state.id.as_str()].clone();
        assert_eq!(stored.kind, "docker");
        assert_eq!(stored.categories, ["REGISTRY"]);
        assert!(stored.skip_test_integration);

        let mut diags = Diagnostics::default();
        let (read, _) = resource
            .read(&mut diags, Value::Value(state.clone()), Value::Null, Value::Null)
            .await
            .unwrap();
        assert_eq!(read, Value::Value(state));
    }

    #[tokio::test]
    async fn update_only_reads() {
        let (handle, api) = fake_handle().await;
        let resource = GenericImageRegistryResource::new(handle);
        let state = create(&resource, config()).await;
        api.clear_calls();

        let planned = RegistryState {
            password: string("carol"),
            ..state.clone()
        };
        let mut diags = Diagnostics::default();
        let (updated, _) = resource
            .update(
                &mut diags,
                Value::Value(state),
                Value::Value(planned.clone()),
                Value::Null,
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();
        assert_eq!(updated, Value::Value(planned));
        assert_eq!(api.calls(), ["get_image_integration"]);
    }

    #[tokio::test]
    async fn import_by_name_needs_exactly_one_match() {
        let (handle, _api) = fake_handle().await;
        let resource = GenericImageRegistryResource::new(handle);
        let state = create(&resource, config()).await;

        let mut diags = Diagnostics::default();
        let (imported, _) = resource
            .import(&mut diags, "registry".to_owned())
            .await
            .unwrap();
        assert_eq!(
            imported,
            Value::Value(RegistryState {
                password: Value::Null,
                ..state
            })
        );

        assert!(resource.import(&mut diags, "unknown".to_owned()).await.is_none());
        assert_eq!(diags.errors.len(), 1);

        create(&resource, config()).await;
        let mut diags = Diagnostics::default();
        assert!(resource.import(&mut diags, "registry".to_owned()).await.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let (handle, _api) = fake_handle().await;
        let resource = GenericImageRegistryResource::new(handle);
        let state = create(&resource, config()).await;

        for _ in 0..2 {
            let mut diags = Diagnostics::default();
            let destroyed = resource
                .destroy(&mut diags, Value::Value(state.clone()), Value::Null, Value::Null)
                .await;
            assert_eq!(destroyed, Some(()));
            assert!(diags.errors.is_empty());
        }
    }
}
