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

use crate::client::models::Notifier;
use crate::client::{ApiHandle, StackroxApi};
use crate::utils::{api_error, string, WithNormalize, WithSchema};

use super::state::SplunkState;

#[derive(Debug)]
pub struct SplunkIntegrationResource<A> {
    pub(super) api: ApiHandle<A>,
}

impl<A: StackroxApi> SplunkIntegrationResource<A> {
    pub fn new(api: ApiHandle<A>) -> Self {
        Self { api }
    }

    fn project<'a>(
        diags: &mut Diagnostics,
        notifier: Notifier,
        prior: &SplunkState<'a>,
    ) -> Option<SplunkState<'a>> {
        match SplunkState::from_notifier(notifier, prior) {
            Ok(state) => Some(state),
            Err(err) => {
                diags.error(
                    "Invalid `truncate` returned by StackRox",
                    err.to_string(),
                    AttributePath::new("truncate"),
                );
                None
            }
        }
    }

    async fn refresh<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &A,
        prior: &SplunkState<'a>,
    ) -> Option<Value<SplunkState<'a>>> {
        let id = prior.id.as_str();
        debug!(id, "reading splunk integration");
        match api.get_notifier(id).await {
            Ok(notifier) => Some(Value::Value(Self::project(diags, notifier, prior)?)),
            Err(err) if err.is_not_found() => {
                warn!(id, "splunk integration not found, removing it from state");
                Some(Value::Null)
            }
            Err(err) => {
                api_error(diags, "Failed to read splunk integration", &err);
                None
            }
        }
    }
}

#[async_trait]
impl<A: StackroxApi> Resource for SplunkIntegrationResource<A> {
    type State<'a> = Value<SplunkState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SplunkState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(SplunkState {
            truncate: Value::Value(truncate),
            ..
        }) = &config
        {
            if *truncate <= 0 {
                diags.error_short("`truncate` must be positive", AttributePath::new("truncate"));
                return None;
            }
        }
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
            diags.root_error_short("Cannot create a splunk integration from a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;

        debug!(name = planned.name.as_str(), "creating splunk integration");
        let notifier = match api.post_notifier(&planned.to_notifier()).await {
            Ok(notifier) => notifier,
            Err(err) => {
                api_error(diags, "Failed to create splunk integration", &err);
                return None;
            }
        };
        planned.id = string(notifier.id);

        match self.refresh(diags, &api, &planned).await? {
            Value::Null => {
                diags.root_error_short("Splunk integration disappeared right after its creation");
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
            diags.root_error_short("Cannot update a splunk integration to a null plan");
            return None;
        };
        let api = self.api.get(diags).await?;

        let changed = match &prior_state {
            Value::Value(prior) => prior.has_changes(planned),
            _ => true,
        };
        if changed {
            let id = planned.id.as_str();
            debug!(id, "updating splunk integration");
            let mut notifier = planned.to_notifier();
            notifier.id = id.to_owned();
            if let Err(err) = api.put_notifier(id, &notifier).await {
                api_error(diags, "Failed to update splunk integration", &err);
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

        debug!(id, "deleting splunk integration");
        match api.delete_notifier(id).await {
            Ok(()) => Some(()),
            Err(err) if err.is_not_found() => {
                debug!(id, "splunk integration already deleted");
                Some(())
            }
            Err(err) => {
                api_error(diags, "Failed to delete splunk integration", &err);
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
        match api.get_notifier(&id).await {
            Ok(notifier) => {
                let state = Self::project(diags, notifier, &Default::default())?;
                Some((Value::Value(state), Default::default()))
            }
            Err(err) => {
                api_error(diags, &format!("Failed to import splunk integration `{id}`"), &err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};

    use super::*;
    use crate::client::fake::{fake_handle, FakeApi};
    use crate::notifier::state::DEFAULT_TRUNCATE;

    fn config() -> SplunkState<'static> {
        SplunkState {
            name: string("splunk"),
            hec_endpoint: string("https://hec.example.com"),
            hec_token: string("token"),
            ui_endpoint: string("https://central.example.com"),
            ..Default::default()
        }
    }

    async fn create(
        resource: &SplunkIntegrationResource<FakeApi>,
        config: SplunkState<'static>,
    ) -> SplunkState<'static> {
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
            _ => panic!("created splunk integration has no state"),
        }
    }

    #[tokio::test]
    async fn create_then_read_converges() {
        let (handle, _api) = fake_handle().await;
        let resource = SplunkIntegrationResource::new(handle);
        let state = create(&resource, config()).await;

        assert_eq!(state.hec_token, string("token"));
        assert_eq!(state.truncate, Value::Value(10000));
        assert_eq!(state.audit_logging_enabled, Value::Value(false));
        assert_eq!(state.name, config().name);

        let mut diags = Diagnostics::default();
        let (read, _) = resource
            .read(&mut diags, Value::Value(state.clone()), Value::Null, Value::Null)
            .await
            .unwrap();
        assert_eq!(read, Value::Value(state));
    }

    #[tokio::test]
    async fn removed_truncate_goes_back_to_default() {
        let (handle, _api) = fake_handle().await;
        let resource = SplunkIntegrationResource::new(handle);
        let state = create(
            &resource,
            SplunkState {
                truncate: Value::Value(500),
                audit_logging_enabled: Value::Value(true),
                ..config()
            },
        )
        .await;
        assert_eq!(state.truncate, Value::Value(500));

        let mut diags = Diagnostics::default();
        let (planned, _, replace) = resource
            .plan_update(
                &mut diags,
                Value::Value(state.clone()),
                Value::Value(state),
                Value::Value(config()),
                Value::Null,
                Value::Null,
            )
            .await
            .unwrap();
        assert!(replace.is_empty());
        let Value::Value(planned) = planned else {
            panic!("planned splunk integration has no state");
        };
        assert_eq!(planned.truncate, Value::Value(DEFAULT_TRUNCATE));
        assert_eq!(planned.audit_logging_enabled, Value::Value(false));
    }

    #[tokio::test]
    async fn update_sends_changed_fields() {
        let (handle, api) = fake_handle().await;
        let resource = SplunkIntegrationResource::new(handle);
        let state = create(&resource, config()).await;
        api.clear_calls();

        let planned = SplunkState {
            truncate: Value::Value(500),
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
        assert_eq!(api.calls(), ["put_notifier", "get_notifier"]);
    }

    #[tokio::test]
    async fn destroy_unknown_id_succeeds() {
        let (handle, _api) = fake_handle().await;
        let resource = SplunkIntegrationResource::new(handle);
        let id: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();

        let mut diags = Diagnostics::default();
        let state = SplunkState {
            id: string(id),
            ..config()
        };
        let destroyed = resource
            .destroy(&mut diags, Value::Value(state), Value::Null, Value::Null)
            .await;
        assert_eq!(destroyed, Some(()));
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn import_leaves_the_token_unset() {
        let (handle, _api) = fake_handle().await;
        let resource = SplunkIntegrationResource::new(handle);
        let state = create(&resource, config()).await;

        let mut diags = Diagnostics::default();
        let (imported, _) = resource
            .import(&mut diags, state.id.as_str().to_owned())
            .await
            .unwrap();
        assert_eq!(
            imported,
            Value::Value(SplunkState {
                hec_token: Value::Null,
                ..state
            })
        );
    }

    #[tokio::test]
    async fn validate_rejects_negative_truncate() {
        let (handle, _api) = fake_handle().await;
        let resource = SplunkIntegrationResource::new(handle);

        let mut diags = Diagnostics::default();
        let config = SplunkState {
            truncate: Value::Value(-1),
            ..config()
        };
        assert!(Resource::validate(&resource, &mut diags, Value::Value(config))
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
