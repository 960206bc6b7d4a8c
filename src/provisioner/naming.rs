use super::ProvisionRequest;

/// Derives Git host identifiers from a request.
///
/// Delete requests rely on these being deterministic: they locate what provision
/// created by deriving the same names again. No character validation happens here,
/// illegal names are rejected by the Git host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub username_prefix: String,
    pub project_prefix: String,
    pub token_prefix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            username_prefix: "user-".to_string(),
            project_prefix: String::new(),
            token_prefix: "repository-".to_string(),
        }
    }
}

impl Naming {
    #[must_use]
    pub fn username(&self, request: &ProvisionRequest) -> String {
        format!("{}{}", self.username_prefix, request.namespace)
    }

    #[must_use]
    pub fn project_name(&self, request: &ProvisionRequest) -> String {
        format!("{}{}", self.project_prefix, request.project)
    }

    #[must_use]
    pub fn access_token_name(&self, request: &ProvisionRequest) -> String {
        format!("{}{}", self.token_prefix, request.project)
    }
}
