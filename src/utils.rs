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

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueString};
use tf_provider::schema::Schema;
use tf_provider::Diagnostics;

use crate::client::models::UnknownVariant;
use crate::client::ApiError;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) trait WithValidate {
    /// Report configuration errors that can be detected before any API call
    fn validate(&self, diags: &mut Diagnostics);
}

pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    sensitive: bool,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        sensitive,
        deprecated: false,
    }
}

pub(crate) fn attributes<const N: usize>(
    attributes: [(&str, Attribute); N],
) -> HashMap<String, Attribute> {
    attributes
        .into_iter()
        .map(|(name, attribute)| (name.to_owned(), attribute))
        .collect()
}

pub(crate) fn api_error(diags: &mut Diagnostics, summary: &str, err: &ApiError) {
    diags.root_error(summary.to_owned(), err.to_string());
}

/// Report a value returned by StackRox that the provider cannot represent
pub(crate) fn unexpected_value(diags: &mut Diagnostics, err: &UnknownVariant) {
    diags.root_error(format!("Unexpected {} returned by StackRox", err.kind), err.to_string());
}

pub(crate) fn string<'a>(value: impl Into<String>) -> ValueString<'a> {
    Value::Value(Cow::Owned(value.into()))
}

/// Remote value of an optional string attribute.
///
/// The API answers with an empty string for unset fields; keep them null
/// when they were null locally.
pub(crate) fn optional_string<'a>(remote: String, prior: &ValueString<'_>) -> ValueString<'a> {
    if remote.is_empty() && prior.is_null() {
        Value::Null
    } else {
        string(remote)
    }
}

/// Remote value of an optional set of strings, null when empty and null locally.
pub(crate) fn optional_set<'a>(
    remote: impl IntoIterator<Item = String>,
    prior: &Value<BTreeSet<ValueString<'_>>>,
) -> Value<BTreeSet<ValueString<'a>>> {
    let set: BTreeSet<_> = remote.into_iter().map(string).collect();
    if set.is_empty() && prior.is_null() {
        Value::Null
    } else {
        Value::Value(set)
    }
}

/// Known strings of a set attribute, skipping unknown and null elements
pub(crate) fn set_strings(set: &Value<BTreeSet<ValueString<'_>>>) -> Vec<String> {
    set.as_ref_option()
        .into_iter()
        .flatten()
        .filter_map(|value| value.as_ref_option())
        .map(|value| value.to_string())
        .collect()
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_values_stay_null() {
        assert_eq!(optional_string(String::new(), &Value::Null), Value::Null);
        assert_eq!(
            optional_string(String::new(), &string("")),
            string("")
        );
        assert_eq!(optional_string("alice".into(), &Value::Null), string("alice"));

        assert_eq!(optional_set(Vec::new(), &Value::Null), Value::Null);
        assert_eq!(
            optional_set(Vec::new(), &Value::Value(BTreeSet::new())),
            Value::Value(BTreeSet::new())
        );
    }

    #[test]
    fn join_with_separator() {
        assert_eq!(["a", "b", "c"].iter().join_with(", ").to_string(), "a, b, c");
        assert_eq!(std::iter::empty::<u8>().join_with(", ").to_string(), "");
    }
}
