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

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, NestedBlock};
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::schema::Schema;
use tf_provider::{AttributePath, Diagnostics};

use crate::client::models::{LifecycleStage, Policy, PolicyFields, Severity, UnknownVariant};
use crate::utils::{
    attribute, attributes, optional_set, optional_string, set_strings, string, WithNormalize,
    WithSchema, WithValidate,
};

use super::criteria::{format_tristate, parse_tristate, CriteriaError, Cvss};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Vocabulary(#[from] UnknownVariant),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub rationale: ValueString<'a>,
    pub remediation: ValueString<'a>,
    pub disabled: ValueBool,
    pub categories: Value<BTreeSet<ValueString<'a>>>,
    pub lifecycle_stages: Value<BTreeSet<ValueString<'a>>>,
    pub severity: ValueString<'a>,
    pub notifiers: Value<BTreeSet<ValueString<'a>>>,
    pub policy_criteria: Value<CriteriaState<'a>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaState<'a> {
    pub cvss: ValueString<'a>,
    pub privileged: ValueString<'a>,
}

impl<'a> CriteriaState<'a> {
    fn to_fields(&self) -> Result<PolicyFields, CriteriaError> {
        let cvss = match self.cvss.as_str() {
            "" => None,
            cvss => Some(cvss.parse::<Cvss>()?.into()),
        };
        Ok(PolicyFields {
            cvss,
            privileged: parse_tristate(self.privileged.as_str())?,
        })
    }

    fn from_fields(fields: PolicyFields, prior: &CriteriaState<'_>) -> Result<Self, UnknownVariant> {
        let cvss = fields.cvss.map(Cvss::try_from).transpose()?;
        // Keep the configured spelling when it denotes the same criterion
        let cvss = match (cvss, prior.cvss.as_ref_option()) {
            (Some(cvss), Some(text)) if text.parse::<Cvss>().ok() == Some(cvss) => {
                string(text.to_string())
            }
            (cvss, _) => optional_string(
                cvss.map(|cvss| cvss.to_string()).unwrap_or_default(),
                &prior.cvss,
            ),
        };
        let privileged = match (fields.privileged, prior.privileged.as_ref_option()) {
            (privileged, Some(text)) if parse_tristate(text).ok() == Some(privileged) => {
                string(text.to_string())
            }
            (privileged, _) => optional_string(format_tristate(privileged), &prior.privileged),
        };
        Ok(Self { cvss, privileged })
    }
}

impl<'a> PolicyState<'a> {
    pub fn to_policy(&self) -> Result<Policy, PolicyError> {
        let lifecycle_stages = set_strings(&self.lifecycle_stages)
            .iter()
            .map(|stage| stage.parse().map(|stage: LifecycleStage| stage.as_str().to_owned()))
            .collect::<Result<_, _>>()?;
        let fields = match &self.policy_criteria {
            Value::Value(criteria) => criteria.to_fields()?,
            _ => PolicyFields::default(),
        };

        Ok(Policy {
            id: String::new(),
            name: self.name.as_str().to_owned(),
            description: self.description.as_str().to_owned(),
            rationale: self.rationale.as_str().to_owned(),
            remediation: self.remediation.as_str().to_owned(),
            disabled: self.disabled.unwrap_or_default(),
            categories: set_strings(&self.categories),
            lifecycle_stages,
            severity: self.severity.as_str().parse::<Severity>()?.as_str().to_owned(),
            notifiers: set_strings(&self.notifiers),
            fields,
        })
    }

    /// Project a remote policy, keeping the null-ness of optional fields of `prior`
    pub fn from_policy(policy: Policy, prior: &PolicyState<'_>) -> Result<Self, UnknownVariant> {
        let prior_criteria = prior.policy_criteria.as_ref_option().cloned().unwrap_or_default();
        let severity = policy.severity.parse::<Severity>()?;
        let lifecycle_stages = policy
            .lifecycle_stages
            .iter()
            .map(|stage| stage.parse().map(|stage: LifecycleStage| string(stage.as_str())))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            id: string(policy.id),
            name: string(policy.name),
            description: string(policy.description),
            rationale: string(policy.rationale),
            remediation: string(policy.remediation),
            disabled: Value::Value(policy.disabled),
            categories: Value::Value(policy.categories.into_iter().map(string).collect()),
            lifecycle_stages: Value::Value(lifecycle_stages),
            severity: string(severity.as_str()),
            notifiers: optional_set(policy.notifiers, &prior.notifiers),
            policy_criteria: Value::Value(CriteriaState::from_fields(
                policy.fields,
                &prior_criteria,
            )?),
        })
    }

    /// Unset the defaulted values that `config` leaves out
    pub fn reset_unconfigured(&mut self, config: &Self) {
        if config.disabled.is_null() {
            self.disabled = Value::Null;
        }
    }

    pub fn has_changes(&self, other: &Self) -> bool {
        self.name != other.name
            || self.description != other.description
            || self.rationale != other.rationale
            || self.remediation != other.remediation
            || self.disabled != other.disabled
            || self.categories != other.categories
            || self.lifecycle_stages != other.lifecycle_stages
            || self.severity != other.severity
            || self.notifiers != other.notifiers
            || self.policy_criteria != other.policy_criteria
    }
}

impl<'a> WithSchema for PolicyState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        let strings = || AttributeType::Set(Box::new(AttributeType::String));
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: attributes([
                    ("id", attribute(AttributeType::String, Computed, false, "Policy id")),
                    ("name", attribute(AttributeType::String, Required, false, "Name of the policy")),
                    (
                        "description",
                        attribute(AttributeType::String, Required, false, "What the policy detects"),
                    ),
                    (
                        "rationale",
                        attribute(AttributeType::String, Required, false, "Why the policy matters"),
                    ),
                    (
                        "remediation",
                        attribute(AttributeType::String, Required, false, "How to fix a violation"),
                    ),
                    (
                        "disabled",
                        attribute(
                            AttributeType::Bool,
                            OptionalComputed,
                            false,
                            "Whether the policy is disabled, false by default",
                        ),
                    ),
                    ("categories", attribute(strings(), Required, false, "Policy categories")),
                    (
                        "lifecycle_stages",
                        attribute(
                            strings(),
                            Required,
                            false,
                            "Lifecycle stages the policy applies to: BUILD, DEPLOY or RUNTIME",
                        ),
                    ),
                    (
                        "severity",
                        attribute(
                            AttributeType::String,
                            Required,
                            false,
                            "One of LOW_SEVERITY, MEDIUM_SEVERITY, HIGH_SEVERITY or CRITICAL_SEVERITY",
                        ),
                    ),
                    (
                        "notifiers",
                        attribute(strings(), Optional, false, "Ids of the notifiers alerted on violation"),
                    ),
                ]),
                blocks: [(
                    "policy_criteria".to_owned(),
                    NestedBlock::Single(Block {
                        attributes: attributes([
                            (
                                "cvss",
                                attribute(
                                    AttributeType::String,
                                    Optional,
                                    false,
                                    "CVSS condition written `<op> <score>`, for instance `>= 7`",
                                ),
                            ),
                            (
                                "privileged",
                                attribute(
                                    AttributeType::String,
                                    Optional,
                                    false,
                                    "Match privileged containers: `true`, `false` or unset",
                                ),
                            ),
                        ]),
                        description: Description::plain("Conditions triggering the policy"),
                        ..Default::default()
                    }),
                )]
                .into(),
                description: Description::plain("StackRox security policy"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithValidate for PolicyState<'a> {
    fn validate(&self, diags: &mut Diagnostics) {
        if let Value::Value(severity) = &self.severity {
            if let Err(err) = severity.parse::<Severity>() {
                diags.error("Invalid `severity`", err.to_string(), AttributePath::new("severity"));
            }
        }
        if let Value::Value(stages) = &self.lifecycle_stages {
            for stage in stages.iter().filter_map(|stage| stage.as_ref_option()) {
                if let Err(err) = stage.parse::<LifecycleStage>() {
                    diags.error(
                        "Invalid `lifecycle_stages`",
                        err.to_string(),
                        AttributePath::new("lifecycle_stages"),
                    );
                }
            }
        }
        match &self.policy_criteria {
            Value::Value(criteria) => {
                if let Some(cvss) = criteria.cvss.as_ref_option().filter(|cvss| !cvss.is_empty()) {
                    if let Err(err) = cvss.parse::<Cvss>() {
                        diags.error(
                            "Invalid `cvss`",
                            err.to_string(),
                            AttributePath::new("policy_criteria").attribute("cvss"),
                        );
                    }
                }
                if let Value::Value(privileged) = &criteria.privileged {
                    if let Err(err) = parse_tristate(privileged) {
                        diags.error(
                            "Invalid `privileged`",
                            err.to_string(),
                            AttributePath::new("policy_criteria").attribute("privileged"),
                        );
                    }
                }
            }
            Value::Null => diags.error_short(
                "A `policy_criteria` block is required",
                AttributePath::new("policy_criteria"),
            ),
            Value::Unknown => (),
        }
    }
}

impl<'a> WithNormalize for PolicyState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.disabled.is_null() {
            self.disabled = Value::Value(false);
        }
        if self.id.is_null() {
            self.id = Value::Unknown;
        }
    }
}
