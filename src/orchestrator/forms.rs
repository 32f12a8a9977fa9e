use serde::Deserialize;

use crate::errors::ValidationError;
use crate::models::partner::BIO_MAX_CHARS;
use crate::models::{normalize_prices, ProfilePatch};
use crate::services::storage::UploadFile;

pub const MIN_PASSWORD_LEN: usize = 6;

const IMAGE_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

#[derive(Debug, Clone, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Everything the profile form submits: field edits plus newly picked images.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub patch: ProfilePatch,
    pub terms_accepted: bool,
    pub avatar: Option<UploadFile>,
    pub header: Option<UploadFile>,
    pub id_card: Option<UploadFile>,
    pub gallery: Vec<UploadFile>,
}

impl ProfileDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.terms_accepted {
            return Err(ValidationError::TermsNotAccepted);
        }
        if let Some(name) = &self.patch.name {
            if name.trim().is_empty() {
                return Err(ValidationError::MissingField("name"));
            }
        }
        if let Some(bio) = &self.patch.bio {
            if bio.chars().count() > BIO_MAX_CHARS {
                return Err(ValidationError::BioTooLong(BIO_MAX_CHARS));
            }
        }
        let uploads = [&self.avatar, &self.header, &self.id_card]
            .into_iter()
            .flatten()
            .chain(self.gallery.iter());
        for file in uploads {
            if !IMAGE_CONTENT_TYPES.contains(&file.content_type.as_str()) {
                return Err(ValidationError::InvalidImage(format!(
                    "{} is not a PNG or JPEG image",
                    file.file_name
                )));
            }
        }
        Ok(())
    }

    /// The patch to write, with prices normalised to the standard durations.
    pub fn normalized_patch(&self) -> ProfilePatch {
        let mut patch = self.patch.clone();
        if let Some(prices) = &patch.prices {
            patch.prices = Some(normalize_prices(prices));
        }
        patch
    }

    pub fn has_uploads(&self) -> bool {
        self.avatar.is_some()
            || self.header.is_some()
            || self.id_card.is_some()
            || !self.gallery.is_empty()
    }
}
