mod failure;

pub use failure::{FailureRule, RuleType, DEFAULT_RULE_NAME};
