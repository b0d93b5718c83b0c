use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Identifies one running node and the address of its slave service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdentifier {
    name: String,
    uri: Url,
}

impl NodeIdentifier {
    pub fn new(name: impl Into<String>, uri: Url) -> Self {
        Self {
            name: name.into(),
            uri,
        }
    }

    /// Build an identifier from a name and a textual URI.
    pub fn parse(name: impl Into<String>, uri: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(name, Url::parse(uri)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Callback address of the node's slave service.
    pub fn uri(&self) -> &Url {
        &self.uri
    }
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlaveIdentifier<{}, {}>", self.name, self.uri)
    }
}
