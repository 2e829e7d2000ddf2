//! Registration, login and profile payloads.

use serde::Deserialize;
use ts_rs::TS;

use crate::error::{ValidationError, ValidationErrors};
use crate::types::ProfileKind;
use crate::validation::{validate_email, validate_max_len, validate_passwords, validate_username};

/// `POST /registration/` body.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub repeated_password: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A validated registration. The password is still plain text; hashing
/// happens in the server.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub kind: ProfileKind,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl NewAccount {
    pub fn validate(input: RegistrationInput) -> Result<NewAccount, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = validate_username(input.username.as_deref().unwrap_or_default())
            .map_err(|e| errors.push(e))
            .ok();
        let email = validate_email(input.email.as_deref().unwrap_or_default())
            .map_err(|e| errors.push(e))
            .ok();

        let password = input.password.unwrap_or_default();
        for err in validate_passwords(&password, input.repeated_password.as_deref().unwrap_or_default()) {
            errors.push(err);
        }

        let kind = match input.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                errors.push(ValidationError::required("type"));
                None
            }
            Some(raw) => raw.parse::<ProfileKind>().map_err(|e| errors.push(e)).ok(),
        };

        errors.into_result()?;

        match (username, email, kind) {
            (Some(username), Some(email), Some(kind)) => Ok(NewAccount {
                username,
                email,
                password,
                kind,
            }),
            _ => Err(ValidationErrors::from(ValidationError::required("type"))),
        }
    }
}

/// `POST /login/` body.
#[derive(Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginInput {
    /// Returns `(username, password)` when both are present.
    pub fn validate(self) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = self.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let password = self.password.filter(|p| !p.is_empty());

        if username.is_none() {
            errors.push(ValidationError::required("username"));
        }
        if password.is_none() {
            errors.push(ValidationError::required("password"));
        }

        match (username, password) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => Err(errors),
        }
    }
}

/// `PATCH /profile/{id}/` body. `type`, `username` and `created_at` are
/// read-only and ignored when sent.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct ProfilePatchInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub file: Option<String>,
    pub location: Option<String>,
    pub tel: Option<String>,
    pub description: Option<String>,
    pub working_hours: Option<String>,
}

/// Validated profile changes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub file: Option<String>,
    pub location: Option<String>,
    pub tel: Option<String>,
    pub description: Option<String>,
    pub working_hours: Option<String>,
}

impl ProfilePatch {
    pub fn validate(input: ProfilePatchInput) -> Result<ProfilePatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let mut text = |field: &str, value: Option<String>, max: usize| -> Option<String> {
            let value = value.map(|v| v.trim().to_string())?;
            errors.check(validate_max_len(field, &value, max));
            Some(value)
        };

        let first_name = text("first_name", input.first_name, 150);
        let last_name = text("last_name", input.last_name, 150);
        let file = text("file", input.file, 255);
        let location = text("location", input.location, 255);
        let tel = text("tel", input.tel, 50);
        let working_hours = text("working_hours", input.working_hours, 100);
        let description = input.description.map(|d| d.trim().to_string());

        let email = input
            .email
            .and_then(|e| validate_email(&e).map_err(|err| errors.push(err)).ok());

        errors.into_result()?;

        Ok(ProfilePatch {
            first_name,
            last_name,
            email,
            file,
            location,
            tel,
            description,
            working_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationInput {
        RegistrationInput {
            username: Some("exampleUsername".to_string()),
            email: Some("example@mail.de".to_string()),
            password: Some("examplePassword".to_string()),
            repeated_password: Some("examplePassword".to_string()),
            kind: Some("customer".to_string()),
        }
    }

    #[test]
    fn test_registration_valid() {
        let account = NewAccount::validate(registration()).unwrap();
        assert_eq!(account.kind, ProfileKind::Customer);
        assert_eq!(account.username, "exampleUsername");
    }

    #[test]
    fn test_registration_collects_field_errors() {
        let mut input = registration();
        input.email = Some("not-an-email".to_string());
        input.repeated_password = Some("different".to_string());
        input.kind = Some("admin".to_string());

        let errs = NewAccount::validate(input).unwrap_err();
        assert!(errs.has_field("email"));
        assert!(errs.has_field("repeated_password"));
        assert!(errs.has_field("type"));
        assert!(!errs.has_field("username"));
    }

    #[test]
    fn test_registration_type_is_wire_named() {
        let input: RegistrationInput =
            serde_json::from_str(r#"{"username":"a","type":"business"}"#).unwrap();
        assert_eq!(input.kind.as_deref(), Some("business"));
    }

    #[test]
    fn test_debug_hides_password() {
        let account = NewAccount::validate(registration()).unwrap();
        assert!(!format!("{account:?}").contains("examplePassword"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errs = LoginInput {
            username: Some(" ".to_string()),
            password: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_profile_patch_ignores_read_only_fields() {
        let input: ProfilePatchInput =
            serde_json::from_str(r#"{"type":"business","username":"x","location":" Berlin "}"#).unwrap();
        let patch = ProfilePatch::validate(input).unwrap();
        assert_eq!(patch.location.as_deref(), Some("Berlin"));
        assert_eq!(patch.first_name, None);
    }

    #[test]
    fn test_profile_patch_validates_lengths_and_email() {
        let input = ProfilePatchInput {
            tel: Some("1".repeat(51)),
            email: Some("broken".to_string()),
            ..Default::default()
        };
        let errs = ProfilePatch::validate(input).unwrap_err();
        assert!(errs.has_field("tel"));
        assert!(errs.has_field("email"));
    }
}
