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

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

use tf_provider::DynamicDataSource;
use tf_provider::DynamicResource;
use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueEmpty, ValueString};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::{map, AttributePath, Diagnostics, Provider};

use crate::auth_provider::OktaAuthProviderResource;
use crate::client::{ApiHandle, ClientConfig, HttpClient, StackroxApi, ADMIN_USERNAME};
use crate::cluster::KubernetesClusterResource;
use crate::notifier::SplunkIntegrationResource;
use crate::policy::PolicyResource;
use crate::registry::GenericImageRegistryResource;
use crate::utils::{api_error, attribute, attributes};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    pub endpoint: ValueString<'a>,
    pub admin_password: ValueString<'a>,
}

#[derive(Debug)]
pub struct StackroxProvider<A = HttpClient> {
    api: ApiHandle<A>,
}

impl<A> Default for StackroxProvider<A> {
    fn default() -> Self {
        Self {
            api: ApiHandle::default(),
        }
    }
}

#[async_trait]
impl<A: StackroxApi> Provider for StackroxProvider<A> {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        use AttributeConstraint::Required;
        Some(Schema {
            version: 1,
            block: Block {
                attributes: attributes([
                    (
                        "endpoint",
                        attribute(
                            AttributeType::String,
                            Required,
                            false,
                            "URL of the StackRox central API, for instance `https://central.example.com`",
                        ),
                    ),
                    (
                        "admin_password",
                        attribute(AttributeType::String, Required, true, "Password of the `admin` user"),
                    ),
                ]),
                description: Description::plain("stackrox"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        if let Value::Value(endpoint) = &config.endpoint {
            if let Err(err) = Url::parse(endpoint) {
                diags.error(
                    "Invalid `endpoint`",
                    format!("`{endpoint}` is not an absolute URL: {err}"),
                    AttributePath::new("endpoint"),
                );
            }
        }
        if let Value::Value(password) = &config.admin_password {
            if password.is_empty() {
                diags.error_short("`admin_password` must not be empty", AttributePath::new("admin_password"));
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let (Value::Value(endpoint), Value::Value(password)) = (&config.endpoint, &config.admin_password)
        else {
            diags.root_error_short("`endpoint` and `admin_password` must be known to configure the provider");
            return None;
        };

        let api = match A::connect(ClientConfig {
            endpoint: endpoint.to_string(),
            username: ADMIN_USERNAME.to_owned(),
            password: password.to_string(),
        }) {
            Ok(api) => api,
            Err(err) => {
                diags.error(
                    "Failed to build the StackRox client",
                    err.to_string(),
                    AttributePath::new("endpoint"),
                );
                return None;
            }
        };

        if let Err(err) = api.update_sensor_upgrade_config(false).await {
            api_error(diags, "Failed to disable sensor auto-upgrade", &err);
            return None;
        }

        info!(%endpoint, %terraform_version, "stackrox provider configured");
        self.api.set(api).await;
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "stackrox_generic_image_registry" => GenericImageRegistryResource::new(self.api.clone()),
            "stackrox_kubernetes_cluster"     => KubernetesClusterResource::new(self.api.clone()),
            "stackrox_okta_auth_provider"     => OktaAuthProviderResource::new(self.api.clone()),
            "stackrox_policy"                 => PolicyResource::new(self.api.clone()),
            "stackrox_splunk_integration"     => SplunkIntegrationResource::new(self.api.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(HashMap::new())
    }
}
