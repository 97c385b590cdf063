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
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{AttributePath, Diagnostics};
use uuid::{fmt::Hyphenated, Uuid};

use crate::client::models::{Cluster, CollectionMethod, UnknownVariant};
use crate::utils::{attribute, attributes, string, WithNormalize, WithSchema, WithValidate};

pub(super) const CLUSTER_TYPE: &str = "KUBERNETES_CLUSTER";
pub(super) const DEFAULT_MAIN_IMAGE: &str = "stackrox.io/main";
pub(super) const DEFAULT_COLLECTOR_IMAGE: &str = "collector.stackrox.io/collector";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
    pub central_api_endpoint: ValueString<'a>,
    pub collection_method: ValueString<'a>,
    pub runtime_support: ValueBool,
    pub main_image: ValueString<'a>,
    pub collector_image: ValueString<'a>,
}

impl<'a> ClusterState<'a> {
    pub fn to_cluster(&self) -> Result<Cluster, UnknownVariant> {
        Ok(Cluster {
            id: self.cluster_id.as_str().to_owned(),
            name: self.name.as_str().to_owned(),
            kind: CLUSTER_TYPE.to_owned(),
            main_image: self.main_image.as_str().to_owned(),
            collector_image: self.collector_image.as_str().to_owned(),
            central_api_endpoint: self.central_api_endpoint.as_str().to_owned(),
            collection_method: self
                .collection_method
                .as_str()
                .parse::<CollectionMethod>()?
                .as_str()
                .to_owned(),
            runtime_support: self.runtime_support.unwrap_or_default(),
        })
    }

    pub fn from_cluster(cluster: Cluster) -> Result<Self, UnknownVariant> {
        let collection_method = cluster.collection_method.parse::<CollectionMethod>()?;
        Ok(Self {
            id: string(cluster.id.clone()),
            name: string(cluster.name),
            cluster_id: string(cluster.id),
            central_api_endpoint: string(cluster.central_api_endpoint),
            collection_method: string(collection_method.as_str()),
            runtime_support: Value::Value(cluster.runtime_support),
            main_image: string(cluster.main_image),
            collector_image: string(cluster.collector_image),
        })
    }

    /// Drop the optional values absent from `config`, so that they fall back to their defaults
    pub fn reset_unconfigured(&mut self, config: &Self) {
        if config.main_image.is_null() {
            self.main_image = Value::Null;
        }
        if config.collector_image.is_null() {
            self.collector_image = Value::Null;
        }
    }

    /// Whether a field sent to the API differs between the two states
    pub fn has_changes(&self, other: &Self) -> bool {
        self.name != other.name
            || self.central_api_endpoint != other.central_api_endpoint
            || self.collection_method != other.collection_method
            || self.runtime_support != other.runtime_support
            || self.main_image != other.main_image
            || self.collector_image != other.collector_image
    }
}

impl<'a> WithSchema for ClusterState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: attributes([
                    ("id", attribute(AttributeType::String, Computed, false, "Cluster id, same as `cluster_id`")),
                    ("name", attribute(AttributeType::String, Required, false, "Name of the cluster")),
                    (
                        "cluster_id",
                        attribute(AttributeType::String, Required, false, "UUID of the cluster, changing it recreates the cluster"),
                    ),
                    (
                        "central_api_endpoint",
                        attribute(AttributeType::String, Required, false, "Central API endpoint the sensor connects to"),
                    ),
                    (
                        "collection_method",
                        attribute(
                            AttributeType::String,
                            Required,
                            false,
                            "Runtime collection method: `NO_COLLECTION`, `KERNEL_MODULE` or `EBPF`",
                        ),
                    ),
                    (
                        "runtime_support",
                        attribute(AttributeType::Bool, Required, false, "Enable runtime data collection"),
                    ),
                    (
                        "main_image",
                        attribute(AttributeType::String, OptionalComputed, false, "Sensor image repository"),
                    ),
                    (
                        "collector_image",
                        attribute(AttributeType::String, OptionalComputed, false, "Collector image repository"),
                    ),
                ]),
                description: Description::plain("StackRox secured kubernetes cluster"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for ClusterState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        if let Value::Value(cluster_id) = &self.cluster_id {
            let parsed = Uuid::try_parse(cluster_id).map_err(|err| err.to_string());
            let parsed = parsed.and_then(|uuid| match cluster_id.len() {
                Hyphenated::LENGTH => Ok(uuid),
                _ => Err("expected the hyphenated form xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx".to_owned()),
            });
            if let Err(err) = parsed {
                diags.error("`cluster_id` is not a UUID", err, AttributePath::new("cluster_id"));
            }
        }
        if let Value::Value(method) = &self.collection_method {
            if let Err(err) = method.parse::<CollectionMethod>() {
                diags.error(
                    "Invalid `collection_method`",
                    err.to_string(),
                    AttributePath::new("collection_method"),
                );
            }
        }
    }
}

impl<'a> WithNormalize for ClusterState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.main_image.is_null() {
            self.main_image = string(DEFAULT_MAIN_IMAGE);
        }
        if self.collector_image.is_null() {
            self.collector_image = string(DEFAULT_COLLECTOR_IMAGE);
        }
        self.id = self.cluster_id.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClusterState<'static> {
        ClusterState {
            name: string("prod"),
            cluster_id: string("0b7a1e94-34a5-4e5b-9e84-2c1c8c6a0f1d"),
            central_api_endpoint: string("central.stackrox:443"),
            collection_method: string("EBPF"),
            runtime_support: Value::Value(true),
            ..Default::default()
        }
    }

    #[test]
    fn validate_accepts_known_values() {
        let mut diags = Diagnostics::default();
        config().validate(&mut diags);
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn validate_rejects_bad_uuid_and_method() {
        let mut diags = Diagnostics::default();
        ClusterState {
            cluster_id: string("not-a-uuid"),
            collection_method: string("ebpf"),
            ..config()
        }
        .validate(&mut diags);
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn validate_skips_unknown_values() {
        let mut diags = Diagnostics::default();
        ClusterState {
            cluster_id: Value::Unknown,
            collection_method: Value::Unknown,
            ..config()
        }
        .validate(&mut diags);
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn normalize_fills_default_images() {
        let mut state = config();
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.main_image, string(DEFAULT_MAIN_IMAGE));
        assert_eq!(state.collector_image, string(DEFAULT_COLLECTOR_IMAGE));
        assert_eq!(state.id, state.cluster_id);

        let cluster = state.to_cluster().unwrap();
        assert_eq!(cluster.kind, CLUSTER_TYPE);
        assert_eq!(cluster.collection_method, "EBPF");
        assert_eq!(ClusterState::from_cluster(cluster).unwrap(), state);
    }

    #[test]
    fn validate_requires_hyphenated_uuid() {
        for cluster_id in [
            "0b7a1e9434a54e5b9e842c1c8c6a0f1d",
            "{0b7a1e94-34a5-4e5b-9e84-2c1c8c6a0f1d}",
            "urn:uuid:0b7a1e94-34a5-4e5b-9e84-2c1c8c6a0f1d",
        ] {
            let mut diags = Diagnostics::default();
            ClusterState {
                cluster_id: string(cluster_id),
                ..config()
            }
            .validate(&mut diags);
            assert_eq!(diags.errors.len(), 1, "{cluster_id}");
        }

        let mut diags = Diagnostics::default();
        ClusterState {
            cluster_id: string("0B7A1E94-34A5-4E5B-9E84-2C1C8C6A0F1D"),
            ..config()
        }
        .validate(&mut diags);
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn unconfigured_images_fall_back_to_defaults() {
        let mut planned = ClusterState {
            main_image: string("registry.example.com/main"),
            collector_image: string("registry.example.com/collector"),
            ..config()
        };
        let config = ClusterState {
            collector_image: string("registry.example.com/collector"),
            ..config()
        };
        planned.reset_unconfigured(&config);
        planned.normalize(&mut Diagnostics::default());
        assert_eq!(planned.main_image, string(DEFAULT_MAIN_IMAGE));
        assert_eq!(planned.collector_image, string("registry.example.com/collector"));
    }

    #[test]
    fn unknown_collection_method_is_named() {
        let mut cluster = config().to_cluster().unwrap();
        cluster.collection_method = "CORE_BPF".into();
        let err = ClusterState::from_cluster(cluster).unwrap_err();
        assert_eq!(err.value, "CORE_BPF");
        assert_eq!(err.kind, "collection method");
    }
}
