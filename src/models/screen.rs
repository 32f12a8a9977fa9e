use serde::Serialize;

use super::{Partner, SubType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    BackendUrl,
    BackendKey,
    MapsKey,
}

/// The one screen the front end should present right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    ConfigurationMissing { missing: Vec<Credential> },
    PublicProfile { profile: Box<Partner> },
    Loading,
    ConnectionError { message: String },
    PublicProfileNotFound { target: String },
    RoleSelection,
    SignIn { role: SubType },
    NeedsProfileSetup,
    Dashboard { profile: Box<Partner> },
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::ConfigurationMissing { .. } => "configuration_missing",
            Screen::PublicProfile { .. } => "public_profile",
            Screen::Loading => "loading",
            Screen::ConnectionError { .. } => "connection_error",
            Screen::PublicProfileNotFound { .. } => "public_profile_not_found",
            Screen::RoleSelection => "role_selection",
            Screen::SignIn { .. } => "sign_in",
            Screen::NeedsProfileSetup => "needs_profile_setup",
            Screen::Dashboard { .. } => "dashboard",
        }
    }

    pub fn is_auth_screen(&self) -> bool {
        matches!(self, Screen::RoleSelection | Screen::SignIn { .. })
    }
}
