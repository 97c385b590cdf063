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

use std::num::ParseIntError;

use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description};
use tf_provider::value::{Value, ValueBool, ValueNumber, ValueString};
use tf_provider::schema::Schema;
use tf_provider::Diagnostics;

use crate::client::models::{Notifier, Splunk};
use crate::utils::{attribute, attributes, string, WithNormalize, WithSchema};

pub(super) const NOTIFIER_TYPE: &str = "splunk";
pub(super) const DEFAULT_TRUNCATE: i64 = 10000;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplunkState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub hec_endpoint: ValueString<'a>,
    /// Never returned by the API
    pub hec_token: ValueString<'a>,
    pub truncate: ValueNumber,
    pub ui_endpoint: ValueString<'a>,
    pub audit_logging_enabled: ValueBool,
}

impl<'a> SplunkState<'a> {
    pub fn to_notifier(&self) -> Notifier {
        Notifier {
            id: String::new(),
            name: self.name.as_str().to_owned(),
            kind: NOTIFIER_TYPE.to_owned(),
            ui_endpoint: self.ui_endpoint.as_str().to_owned(),
            enabled: true,
            splunk: Some(Splunk {
                http_endpoint: self.hec_endpoint.as_str().to_owned(),
                http_token: self.hec_token.as_str().to_owned(),
                insecure: false,
                truncate: self.truncate.unwrap_or(DEFAULT_TRUNCATE).to_string(),
                audit_logging_enabled: self.audit_logging_enabled.unwrap_or_default(),
            }),
        }
    }

    /// Project a remote notifier, keeping the token of `prior`
    pub fn from_notifier(notifier: Notifier, prior: &Self) -> Result<Self, ParseIntError> {
        let splunk = notifier.splunk.unwrap_or_default();
        Ok(Self {
            id: string(notifier.id),
            name: string(notifier.name),
            hec_endpoint: string(splunk.http_endpoint),
            hec_token: prior.hec_token.clone(),
            truncate: Value::Value(splunk.truncate.parse()?),
            ui_endpoint: string(notifier.ui_endpoint),
            audit_logging_enabled: Value::Value(splunk.audit_logging_enabled),
        })
    }

    /// Unset the defaulted values that `config` leaves out
    pub fn reset_unconfigured(&mut self, config: &Self) {
        if config.truncate.is_null() {
            self.truncate = Value::Null;
        }
        if config.audit_logging_enabled.is_null() {
            self.audit_logging_enabled = Value::Null;
        }
    }

    pub fn has_changes(&self, other: &Self) -> bool {
        self.name != other.name
            || self.hec_endpoint != other.hec_endpoint
            || self.hec_token != other.hec_token
            || self.truncate != other.truncate
            || self.ui_endpoint != other.ui_endpoint
            || self.audit_logging_enabled != other.audit_logging_enabled
    }
}

impl<'a> WithSchema for SplunkState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: attributes([
                    (
                        "id",
                        attribute(AttributeType::String, Computed, false, "Notifier id"),
                    ),
                    (
                        "name",
                        attribute(AttributeType::String, Required, false, "Name of the notifier"),
                    ),
                    (
                        "hec_endpoint",
                        attribute(AttributeType::String, Required, false, "Splunk HTTP event collector endpoint"),
                    ),
                    (
                        "hec_token",
                        attribute(AttributeType::String, Required, true, "Splunk HTTP event collector token"),
                    ),
                    (
                        "truncate",
                        attribute(
                            AttributeType::Number,
                            OptionalComputed,
                            false,
                            "Maximum size of an event, 10000 by default",
                        ),
                    ),
                    (
                        "ui_endpoint",
                        attribute(AttributeType::String, Required, false, "StackRox UI endpoint linked in events"),
                    ),
                    (
                        "audit_logging_enabled",
                        attribute(
                            AttributeType::Bool,
                            OptionalComputed,
                            false,
                            "Forward audit logs, disabled by default",
                        ),
                    ),
                ]),
                description: Description::plain("Splunk notifier integration"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithNormalize for SplunkState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.truncate.is_null() {
            self.truncate = Value::Value(DEFAULT_TRUNCATE);
        }
        if self.audit_logging_enabled.is_null() {
            self.audit_logging_enabled = Value::Value(false);
        }
        if self.id.is_null() {
            self.id = Value::Unknown;
        }
    }
}
