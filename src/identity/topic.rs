use std::fmt;

use serde::{Deserialize, Serialize};

/// A named, typed channel. The message type is an opaque tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicDefinition {
    name: String,
    message_type: String,
}

impl TopicDefinition {
    pub fn new(name: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_type: message_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }
}

impl fmt::Display for TopicDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicDefinition<{}, {}>", self.name, self.message_type)
    }
}
