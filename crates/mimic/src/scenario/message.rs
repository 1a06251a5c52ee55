//! Asynchronous message patterns.

use crate::error::ContractError;
use crate::pattern::Pattern;
use crate::resolver::Resolver;
use crate::result::{FailureReason, MatchResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A message published on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncMessage {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    pub value: Value,
}

/// `message <channel> [<key-pattern>] <value-pattern>`
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePattern {
    pub channel: String,
    pub key: Option<Pattern>,
    pub value: Pattern,
}

impl MessagePattern {
    pub fn matches(&self, message: &AsyncMessage, resolver: &Resolver) -> MatchResult {
        if message.channel != self.channel {
            return MatchResult::failure(format!(
                "expected channel {}, got {}",
                self.channel, message.channel
            ))
            .with_reason(FailureReason::MessageMismatch);
        }
        let key = match (&self.key, &message.key) {
            (Some(pattern), Some(key)) => resolver.matches_body(pattern, key),
            (Some(pattern), None) => resolver.matches_pattern(pattern, &Value::Null),
            (None, _) => MatchResult::Success,
        };
        key.breadcrumb("key")
            .and_then(|| resolver.matches_body(&self.value, &message.value).breadcrumb("value"))
            .with_reason(FailureReason::MessageMismatch)
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<AsyncMessage, ContractError> {
        let key = match &self.key {
            Some(pattern) => Some(pattern.generate(resolver)?).filter(|key| !key.is_empty()),
            None => None,
        };
        Ok(AsyncMessage {
            channel: self.channel.clone(),
            key,
            value: self.value.generate(resolver)?,
        })
    }
}
