//! Client-side form checks, run before anything is sent.
//!
//! Field keys match the wire names (`confirmPassword`, `newPassword`, ...)
//! so client and server rejections can be shown the same way.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{FieldErrors, ServiceError};
use crate::models::{TaskDraft, TaskPatch};

const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("EMAIL_REGEX is valid"))
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.insert("name".into(), "Name is required".into());
    } else if name.chars().count() < MIN_NAME_CHARS {
        errors.insert(
            "name".into(),
            format!("Name must be at least {} characters", MIN_NAME_CHARS),
        );
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !email_regex().is_match(email) {
        errors.insert("email".into(), "Email is invalid".into());
    }
}

fn check_new_password(errors: &mut FieldErrors, field: &str, password: &str) {
    let message = if password.is_empty() {
        "Password is required".to_string()
    } else if password.chars().count() < MIN_PASSWORD_CHARS {
        format!("Password must be at least {} characters", MIN_PASSWORD_CHARS)
    } else if !is_strong(password) {
        "Password must contain at least one uppercase letter, one lowercase letter, and one number"
            .to_string()
    } else {
        return;
    };
    errors.insert(field.into(), message);
}

fn check_confirmation(errors: &mut FieldErrors, password: &str, confirm: &str) {
    if confirm.is_empty() {
        errors.insert("confirmPassword".into(), "Please confirm your password".into());
    } else if password != confirm {
        errors.insert("confirmPassword".into(), "Passwords do not match".into());
    }
}

fn is_strong(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn validate_login(email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    }
    errors
}

pub fn validate_registration(name: &str, email: &str, password: &str, confirm: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, name);
    check_email(&mut errors, email);
    check_new_password(&mut errors, "password", password);
    check_confirmation(&mut errors, password, confirm);
    errors
}

pub fn validate_profile(name: &str, email: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, name);
    check_email(&mut errors, email);
    errors
}

pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if current.is_empty() {
        errors.insert("currentPassword".into(), "Current password is required".into());
    }
    check_new_password(&mut errors, "newPassword", new);
    check_confirmation(&mut errors, new, confirm);
    errors
}

pub fn validate_task_draft(draft: &TaskDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if draft.title.trim().is_empty() {
        errors.insert("title".into(), "Title is required".into());
    }
    errors
}

/// Only a title that is present is checked; absent fields stay as they are.
pub fn validate_task_patch(patch: &TaskPatch) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        errors.insert("title".into(), "Title is required".into());
    }
    errors
}

/// `Ok` when no field failed, otherwise a `Validation` error carrying them all.
pub fn ensure_valid(errors: FieldErrors) -> Result<(), ServiceError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::from_fields(errors))
    }
}
