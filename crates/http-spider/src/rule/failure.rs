use std::fmt;

use regex::bytes::Regex;

use crate::error::RuleError;
use crate::http::Response;

/// Name a rule carries until a step assigns it one.
pub const DEFAULT_RULE_NAME: &str = "default_failure_rule_name";

/// Kind of check a [`FailureRule`] performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleType {
    /// Triggers when the pattern is found anywhere in the response body.
    Regex,
    /// Unrecognised type. Kept so that evaluation can report it.
    Undefined(String),
}

impl RuleType {
    pub fn parse(value: &str) -> Self {
        match value {
            "regex" => RuleType::Regex,
            other => RuleType::Undefined(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuleType::Regex => "regex",
            RuleType::Undefined(other) => other,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate over a response that aborts a run when it holds.
#[derive(Debug, Clone)]
pub struct FailureRule {
    name: String,
    rule_type: RuleType,
    parameters: String,
    pattern: Option<Regex>,
}

impl FailureRule {
    /// Builds a rule from its textual type and parameters.
    ///
    /// `regex` parameters are compiled here, so a bad pattern is reported
    /// before any request goes out. Unknown types are accepted and only
    /// fail once evaluated.
    pub fn new(rule_type: &str, parameters: impl Into<String>) -> Result<Self, RuleError> {
        let rule_type = RuleType::parse(rule_type);
        let parameters = parameters.into();

        let pattern = match rule_type {
            RuleType::Regex => Some(Regex::new(&parameters).map_err(|source| {
                RuleError::InvalidPattern {
                    pattern: parameters.clone(),
                    source,
                }
            })?),
            RuleType::Undefined(_) => None,
        };

        Ok(Self {
            name: DEFAULT_RULE_NAME.to_string(),
            rule_type,
            parameters,
            pattern,
        })
    }

    pub fn regex(pattern: impl Into<String>) -> Result<Self, RuleError> {
        Self::new("regex", pattern)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule_type(&self) -> &RuleType {
        &self.rule_type
    }

    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// True when the rule's condition holds for `body`.
    pub fn matches(&self, body: &[u8]) -> Result<bool, RuleError> {
        match (&self.rule_type, &self.pattern) {
            (RuleType::Regex, Some(pattern)) => Ok(pattern.is_match(body)),
            (RuleType::Regex, None) => Ok(false),
            (RuleType::Undefined(other), _) => Err(RuleError::UndefinedType(other.clone())),
        }
    }

    /// Checks a response; a triggered rule returns an error named after the rule.
    pub fn evaluate(&self, response: &Response) -> Result<(), RuleError> {
        if self.matches(response.body())? {
            return Err(RuleError::Triggered {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}
