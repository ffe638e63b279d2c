use serde::Serialize;

use crate::error::{CapabilityError, ErrorKind};
use crate::provider::ProviderType;
use crate::sources::models::AuthenticationRecord;

pub const AWS_AUTH_TYPE: &str = "provisioning-arn";
pub const AZURE_AUTH_TYPE: &str = "provisioning_lighthouse_subscription_id";
pub const GCP_AUTH_TYPE: &str = "provisioning_project_id";

/// Provisioning credentials resolved for one source.
///
/// `payload` holds the provider specific value: the role ARN for AWS, the
/// subscription id for Azure and the project id for GCP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authentication {
    provider: ProviderType,
    payload: String,
    source_application_id: String,
}

impl Authentication {
    pub fn new(
        provider: ProviderType,
        payload: impl Into<String>,
        source_application_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            payload: payload.into(),
            source_application_id: source_application_id.into(),
        }
    }

    /// Derives credentials from a raw record; unknown auth types are rejected.
    pub fn from_record(record: AuthenticationRecord) -> Result<Self, CapabilityError> {
        let provider = provider_for_auth_type(&record.authtype).ok_or_else(|| {
            CapabilityError::new(
                ErrorKind::UnknownAuthenticationType,
                "derive authentication",
                format!("unknown authentication type '{}'", record.authtype),
            )
        })?;

        Ok(Self::new(provider, record.username, record.resource_id))
    }

    pub const fn provider(&self) -> ProviderType {
        self.provider
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn source_application_id(&self) -> &str {
        &self.source_application_id
    }

    pub fn is(&self, provider: ProviderType) -> bool {
        self.provider == provider
    }

    /// Fails with `UnknownAuthenticationType` unless issued for `provider`.
    pub fn must_be(&self, provider: ProviderType) -> Result<(), CapabilityError> {
        if self.is(provider) {
            return Ok(());
        }
        Err(CapabilityError::new(
            ErrorKind::UnknownAuthenticationType,
            "check authentication type",
            format!("expected {provider} authentication, got {}", self.provider),
        ))
    }
}

fn provider_for_auth_type(auth_type: &str) -> Option<ProviderType> {
    match auth_type {
        AWS_AUTH_TYPE => Some(ProviderType::Aws),
        AZURE_AUTH_TYPE => Some(ProviderType::Azure),
        GCP_AUTH_TYPE => Some(ProviderType::Gcp),
        _ => None,
    }
}
