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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, NestedBlock};
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::schema::Schema;
use tf_provider::Diagnostics;

use crate::client::models::{AuthProvider, Group, GroupProperties};
use crate::utils::{attribute, attributes, optional_string, string, WithNormalize, WithSchema};

pub(super) const IDP_METADATA_URL: &str = "idp_metadata_url";
pub(super) const SP_ISSUER: &str = "sp_issuer";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OktaState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub ui_endpoint: ValueString<'a>,
    pub enabled: ValueBool,
    pub idp_metadata_url: ValueString<'a>,
    pub sp_issuer: ValueString<'a>,
    pub group: Value<Vec<Value<GroupState<'a>>>>,
}

/// Role granted to the users whose `key` attribute equals `value`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState<'a> {
    pub key: ValueString<'a>,
    pub value: ValueString<'a>,
    pub role: ValueString<'a>,
}

impl<'a> OktaState<'a> {
    pub fn to_auth_provider(&self) -> AuthProvider {
        AuthProvider {
            id: String::new(),
            name: self.name.as_str().to_owned(),
            kind: self.kind.as_str().to_owned(),
            ui_endpoint: self.ui_endpoint.as_str().to_owned(),
            enabled: self.enabled.unwrap_or_default(),
            config: BTreeMap::from([
                (IDP_METADATA_URL.to_owned(), self.idp_metadata_url.as_str().to_owned()),
                (SP_ISSUER.to_owned(), self.sp_issuer.as_str().to_owned()),
            ]),
        }
    }

    /// Desired group mappings, bound to the auth provider `id`
    pub fn to_groups(&self, id: &str) -> Vec<Group> {
        self.groups()
            .map(|group| Group {
                props: GroupProperties {
                    auth_provider_id: id.to_owned(),
                    key: group.key.as_str().to_owned(),
                    value: group.value.as_str().to_owned(),
                },
                role_name: group.role.as_str().to_owned(),
            })
            .collect()
    }

    fn groups(&self) -> impl Iterator<Item = &GroupState<'a>> {
        self.group
            .as_ref_option()
            .into_iter()
            .flatten()
            .filter_map(|group| group.as_ref_option())
    }

    /// Project a remote auth provider and its groups, keeping the null-ness of optional fields of `prior`
    pub fn from_remote(provider: AuthProvider, groups: Vec<Group>, prior: &OktaState<'_>) -> Self {
        let prior_groups: Vec<&GroupState<'_>> = prior.groups().collect();
        let mut config = provider.config;
        let mut config_value = |key: &str, prior: &ValueString<'_>| match config.remove(key) {
            Some(value) => string(value),
            None => prior.as_ref_option().map(|value| string(value.to_string())).unwrap_or_default(),
        };

        Self {
            id: string(provider.id),
            name: string(provider.name),
            kind: string(provider.kind),
            ui_endpoint: string(provider.ui_endpoint),
            enabled: Value::Value(provider.enabled),
            idp_metadata_url: config_value(IDP_METADATA_URL, &prior.idp_metadata_url),
            sp_issuer: config_value(SP_ISSUER, &prior.sp_issuer),
            group: Value::Value(
                groups
                    .into_iter()
                    .enumerate()
                    .map(|(i, group)| {
                        let prior = prior_groups.get(i).copied().cloned().unwrap_or_default();
                        Value::Value(GroupState {
                            key: optional_string(group.props.key, &prior.key),
                            value: optional_string(group.props.value, &prior.value),
                            role: string(group.role_name),
                        })
                    })
                    .collect(),
            ),
        }
    }

    /// Whether the auth provider entity itself differs, groups aside
    pub fn has_entity_changes(&self, other: &Self) -> bool {
        self.name != other.name
            || self.kind != other.kind
            || self.ui_endpoint != other.ui_endpoint
            || self.enabled != other.enabled
            || self.idp_metadata_url != other.idp_metadata_url
            || self.sp_issuer != other.sp_issuer
    }
}

impl<'a> WithSchema for OktaState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, Required};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: attributes([
                    ("id", attribute(AttributeType::String, Computed, false, "Auth provider id")),
                    (
                        "name",
                        attribute(AttributeType::String, Required, false, "Name of the auth provider"),
                    ),
                    (
                        "type",
                        attribute(AttributeType::String, Required, false, "Auth provider type, usually `saml`"),
                    ),
                    (
                        "ui_endpoint",
                        attribute(AttributeType::String, Required, false, "StackRox UI endpoint users log into"),
                    ),
                    (
                        "enabled",
                        attribute(AttributeType::Bool, Required, false, "Whether users may log in"),
                    ),
                    (
                        "idp_metadata_url",
                        attribute(AttributeType::String, Required, true, "Okta IdP metadata URL"),
                    ),
                    (
                        "sp_issuer",
                        attribute(AttributeType::String, Required, false, "SAML service provider issuer"),
                    ),
                ]),
                blocks: [(
                    "group".to_owned(),
                    NestedBlock::List(Block {
                        attributes: attributes([
                            (
                                "key",
                                attribute(AttributeType::String, Optional, false, "User attribute to match"),
                            ),
                            (
                                "value",
                                attribute(AttributeType::String, Optional, false, "Expected attribute value"),
                            ),
                            (
                                "role",
                                attribute(AttributeType::String, Required, false, "Role granted to matching users"),
                            ),
                        ]),
                        description: Description::plain("Role mapping of the auth provider users"),
                        ..Default::default()
                    }),
                )]
                .into(),
                description: Description::plain("Okta SAML auth provider"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithNormalize for OktaState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.group.is_null() {
            self.group = Value::Value(Vec::new());
        }
        if self.id.is_null() {
            self.id = Value::Unknown;
        }
    }
}
