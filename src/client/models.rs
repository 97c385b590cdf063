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

//! Wire models of the StackRox REST API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::DisplayJoinable;

/// A string that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} `{value}`, expected one of: {}", .expected.iter().join_with(", "))]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static [&'static str],
}

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident($kind:literal) { $($variant:ident => $text:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                        expected: &[$($text,)+],
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// How runtime data is collected on the nodes of a secured cluster.
    CollectionMethod("collection method") {
        NoCollection => "NO_COLLECTION",
        KernelModule => "KERNEL_MODULE",
        Ebpf => "EBPF",
    }
}

vocabulary! {
    Severity("severity") {
        Low => "LOW_SEVERITY",
        Medium => "MEDIUM_SEVERITY",
        High => "HIGH_SEVERITY",
        Critical => "CRITICAL_SEVERITY",
    }
}

vocabulary! {
    /// Stage of the deployment lifecycle a policy applies to.
    LifecycleStage("lifecycle stage") {
        Build => "BUILD",
        Deploy => "DEPLOY",
        Runtime => "RUNTIME",
    }
}

vocabulary! {
    Comparator("comparator") {
        Equals => "EQUALS",
        GreaterThan => "GREATER_THAN",
        GreaterThanOrEquals => "GREATER_THAN_OR_EQUALS",
        LessThan => "LESS_THAN",
        LessThanOrEquals => "LESS_THAN_OR_EQUALS",
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageIntegration {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,
    pub skip_test_integration: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub insecure: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageIntegrationList {
    pub integrations: Vec<ImageIntegration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub main_image: String,
    #[serde(default)]
    pub collector_image: String,
    #[serde(default)]
    pub central_api_endpoint: String,
    /// One of [`CollectionMethod`], checked when projected
    #[serde(default)]
    pub collection_method: String,
    #[serde(default)]
    pub runtime_support: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub cluster: Cluster,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthProvider {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ui_endpoint: String,
    pub enabled: bool,
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub props: GroupProperties,
    pub role_name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupProperties {
    pub auth_provider_id: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupList {
    pub groups: Vec<Group>,
}

/// Groups listed in `previous_groups` but absent from `required_groups` are removed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupBatchUpdate {
    pub previous_groups: Vec<Group>,
    pub required_groups: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    /// [`LifecycleStage`] values
    #[serde(default)]
    pub lifecycle_stages: Vec<String>,
    /// One of [`Severity`]
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub notifiers: Vec<String>,
    #[serde(default)]
    pub fields: PolicyFields,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvss: Option<NumericalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalPolicy {
    /// One of [`Comparator`]
    pub op: String,
    pub value: f32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notifier {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ui_endpoint: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splunk: Option<Splunk>,
}

/// Splunk HTTP event collector settings. `truncate` travels as a string.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Splunk {
    pub http_endpoint: String,
    pub http_token: String,
    pub insecure: bool,
    pub truncate: String,
    pub audit_logging_enabled: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorUpgradeConfig {
    pub enable_auto_upgrade: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorUpgradeConfigRequest {
    pub config: SensorUpgradeConfig,
}
