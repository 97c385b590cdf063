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

//! Policy criteria as written in configuration.
//!
//! A CVSS criterion is written `"<op> <score>"`, for instance `">= 7"`, and
//! `privileged` is a boolean that may be left unset.

use std::fmt::Display;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::client::models::{Comparator, NumericalPolicy, UnknownVariant};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("invalid comparator `{0}`, expected one of: =, >, >=, <, <=")]
    Comparator(String),
    #[error("expected `<op> <score>`, got `{0}`")]
    Format(String),
    #[error("invalid score `{value}`: {source}")]
    Score {
        value: String,
        source: ParseIntError,
    },
    #[error("invalid boolean `{0}`, expected `true` or `false`")]
    Bool(String),
}

pub fn comparator_symbol(op: Comparator) -> &'static str {
    match op {
        Comparator::Equals => "=",
        Comparator::GreaterThan => ">",
        Comparator::GreaterThanOrEquals => ">=",
        Comparator::LessThan => "<",
        Comparator::LessThanOrEquals => "<=",
    }
}

pub fn comparator_from_symbol(symbol: &str) -> Result<Comparator, CriteriaError> {
    match symbol {
        "=" => Ok(Comparator::Equals),
        ">" => Ok(Comparator::GreaterThan),
        ">=" => Ok(Comparator::GreaterThanOrEquals),
        "<" => Ok(Comparator::LessThan),
        "<=" => Ok(Comparator::LessThanOrEquals),
        _ => Err(CriteriaError::Comparator(symbol.to_owned())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cvss {
    pub op: Comparator,
    pub score: i32,
}

impl FromStr for Cvss {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let (Some(op), Some(score), None) = (words.next(), words.next(), words.next()) else {
            return Err(CriteriaError::Format(s.to_owned()));
        };
        Ok(Cvss {
            op: comparator_from_symbol(op)?,
            score: score.parse().map_err(|source| CriteriaError::Score {
                value: score.to_owned(),
                source,
            })?,
        })
    }
}

impl Display for Cvss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", comparator_symbol(self.op), self.score)
    }
}

impl From<Cvss> for NumericalPolicy {
    fn from(cvss: Cvss) -> Self {
        NumericalPolicy {
            op: cvss.op.as_str().to_owned(),
            value: cvss.score as f32,
        }
    }
}

/// Scores are integers, so a fractional remote score is truncated toward zero
impl TryFrom<NumericalPolicy> for Cvss {
    type Error = UnknownVariant;

    fn try_from(policy: NumericalPolicy) -> Result<Self, Self::Error> {
        let op = policy.op.parse::<Comparator>()?;
        if policy.value.fract() != 0.0 {
            warn!(
                value = policy.value,
                score = policy.value.trunc(),
                "fractional cvss score truncated"
            );
        }
        Ok(Cvss {
            op,
            score: policy.value as i32,
        })
    }
}

/// Parse an optional boolean, the empty string meaning unset
pub fn parse_tristate(s: &str) -> Result<Option<bool>, CriteriaError> {
    match s {
        "" => Ok(None),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Some(true)),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Some(false)),
        _ => Err(CriteriaError::Bool(s.to_owned())),
    }
}

pub fn format_tristate(value: Option<bool>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cvss_round_trip() {
        for (text, op) in [
            ("= 5", Comparator::Equals),
            ("> 0", Comparator::GreaterThan),
            (">= 3", Comparator::GreaterThanOrEquals),
            ("< 10", Comparator::LessThan),
            ("<= 7", Comparator::LessThanOrEquals),
        ] {
            let cvss: Cvss = text.parse().unwrap();
            assert_eq!(cvss.op, op);

            let back = Cvss::try_from(NumericalPolicy::from(cvss)).unwrap();
            assert_eq!(back, cvss);
            assert_eq!(back.to_string(), text);
        }
    }

    #[test]
    fn fractional_score_is_truncated() {
        let policy = NumericalPolicy {
            op: "GREATER_THAN_OR_EQUALS".to_owned(),
            value: 7.5,
        };
        let cvss = Cvss::try_from(policy).unwrap();
        assert_eq!(cvss.score, 7);
        assert_eq!(cvss.to_string(), ">= 7");
    }

    #[test]
    fn unknown_remote_comparator() {
        let policy = NumericalPolicy {
            op: "BETWEEN".to_owned(),
            value: 5.0,
        };
        let err = Cvss::try_from(policy).unwrap_err();
        assert!(err.to_string().contains("`BETWEEN`"));
    }

    #[test]
    fn cvss_parse_errors() {
        assert_eq!(
            ">=3".parse::<Cvss>(),
            Err(CriteriaError::Format(">=3".to_owned()))
        );
        assert_eq!(
            "=> 3".parse::<Cvss>(),
            Err(CriteriaError::Comparator("=>".to_owned()))
        );
        assert!(matches!(
            ">= high".parse::<Cvss>(),
            Err(CriteriaError::Score { .. })
        ));
        assert!(matches!(
            ">= 3 4".parse::<Cvss>(),
            Err(CriteriaError::Format(_))
        ));
    }

    #[test]
    fn cvss_accepts_extra_spaces() {
        let cvss: Cvss = "  >=   3 ".parse().unwrap();
        assert_eq!(cvss.to_string(), ">= 3");
    }

    #[test]
    fn tristate() {
        assert_eq!(parse_tristate(""), Ok(None));
        assert_eq!(parse_tristate("true"), Ok(Some(true)));
        assert_eq!(parse_tristate("0"), Ok(Some(false)));
        assert!(parse_tristate("yes").is_err());
        assert_eq!(format_tristate(None), "");
        assert_eq!(format_tristate(Some(false)), "false");
    }
}
