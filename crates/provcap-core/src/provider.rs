use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Cloud provider a source or instance type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Aws,
    Azure,
    Gcp,
}

impl ProviderType {
    pub const ALL: [Self; 3] = [Self::Aws, Self::Azure, Self::Gcp];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }

    /// Name of the provider in the Sources service `source_type` vocabulary.
    pub const fn sources_provider_name(self) -> &'static str {
        match self {
            Self::Aws => "amazon",
            Self::Azure => "azure",
            Self::Gcp => "google",
        }
    }
}

impl Display for ProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aws" | "amazon" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "gcp" | "google" => Ok(Self::Gcp),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}
