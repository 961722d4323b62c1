use thiserror::Error;

/// Roles an account needs to enumerate an organization's projects.
pub const REQUIRED_ROLES: [&str; 3] = [
    "roles/asset.viewer",
    "roles/cloudasset.viewer",
    "roles/resourcemanager.organizationViewer",
];

/// Conditions that end a scan. Per-project and per-extension failures never show up here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no active gcloud account found, run 'gcloud auth login' first")]
    NoActiveAccount,

    #[error("error checking authentication: {0}")]
    AuthCheck(String),

    #[error("listing projects failed: {0}")]
    ProjectEnumeration(String),

    #[error("no projects found in organization {0}")]
    NoProjects(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScanError {
    /// Whether the user should be told which roles are needed to list projects.
    pub fn needs_role_hint(&self) -> bool {
        matches!(
            self,
            ScanError::ProjectEnumeration(_) | ScanError::NoProjects(_)
        )
    }
}
