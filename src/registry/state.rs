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

use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description};
use tf_provider::value::{Value, ValueString};
use tf_provider::schema::Schema;
use tf_provider::AttributePath;

use crate::client::models::{DockerConfig, ImageIntegration};
use crate::utils::{attribute, attributes, optional_string, string, WithSchema};

pub(super) const INTEGRATION_TYPE: &str = "docker";
pub(super) const REGISTRY_CATEGORY: &str = "REGISTRY";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub endpoint: ValueString<'a>,
    pub username: ValueString<'a>,
    /// Never returned by the API
    pub password: ValueString<'a>,
}

impl<'a> RegistryState<'a> {
    pub fn to_integration(&self) -> ImageIntegration {
        ImageIntegration {
            id: String::new(),
            name: self.name.as_str().to_owned(),
            kind: INTEGRATION_TYPE.to_owned(),
            categories: vec![REGISTRY_CATEGORY.to_owned()],
            docker: Some(DockerConfig {
                endpoint: self.endpoint.as_str().to_owned(),
                username: self.username.as_str().to_owned(),
                password: self.password.as_str().to_owned(),
                insecure: false,
            }),
            skip_test_integration: true,
        }
    }

    /// Project a remote integration, keeping the password of `prior`
    pub fn from_integration(integration: ImageIntegration, prior: &Self) -> Self {
        let docker = integration.docker.unwrap_or_default();
        Self {
            id: string(integration.id),
            name: string(integration.name),
            endpoint: string(docker.endpoint),
            username: optional_string(docker.username, &prior.username),
            password: prior.password.clone(),
        }
    }

    /// Attributes that cannot be changed in place
    pub fn replaced_attributes(&self, proposed: &Self) -> Vec<AttributePath> {
        let mut replace = Vec::new();
        if self.name != proposed.name {
            replace.push(AttributePath::new("name"));
        }
        if self.endpoint != proposed.endpoint {
            replace.push(AttributePath::new("endpoint"));
        }
        if self.username != proposed.username {
            replace.push(AttributePath::new("username"));
        }
        replace
    }
}

impl<'a> WithSchema for RegistryState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, Required};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: attributes([
                    (
                        "id",
                        attribute(AttributeType::String, Computed, false, "Image integration id"),
                    ),
                    (
                        "name",
                        attribute(AttributeType::String, Required, false, "Name of the registry integration"),
                    ),
                    (
                        "endpoint",
                        attribute(AttributeType::String, Required, false, "Registry endpoint"),
                    ),
                    (
                        "username",
                        attribute(AttributeType::String, Optional, true, "Registry username"),
                    ),
                    (
                        "password",
                        attribute(AttributeType::String, Optional, true, "Registry password"),
                    ),
                ]),
                description: Description::plain("Generic docker image registry integration"),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_kept_from_prior_state() {
        let prior = RegistryState {
            name: string("registry"),
            endpoint: string("registry.example.com"),
            password: string("bob"),
            ..Default::default()
        };
        let remote = ImageIntegration {
            id: "42".into(),
            ..prior.to_integration()
        };
        assert_eq!(remote.docker.as_ref().unwrap().password, "bob");

        let state = RegistryState::from_integration(remote, &prior);
        assert_eq!(state.id, string("42"));
        assert_eq!(state.password, string("bob"));
        assert_eq!(state.username, Value::Null);
    }

    #[test]
    fn identity_changes_force_replacement() {
        let prior = RegistryState {
            name: string("registry"),
            endpoint: string("registry.example.com"),
            password: string("bob"),
            ..Default::default()
        };
        let proposed = RegistryState {
            endpoint: string("mirror.example.com"),
            password: string("alice"),
            ..prior.clone()
        };
        assert_eq!(
            prior.replaced_attributes(&proposed),
            vec![AttributePath::new("endpoint")]
        );
    }
}
