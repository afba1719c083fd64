//! Account action form types
//!
//! Field names match the HTML forms that post them (`project-name`,
//! `report-summary`, ...). Missing fields deserialize as empty strings so
//! the validators can answer with a readable message.

use std::collections::HashMap;

use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::api::extractors::{is_valid_hash_id, is_valid_user_id};
use crate::api::types::{default_page, validate_page};
use crate::core::constants::{
    MAX_COMMENT_LENGTH, MAX_PROJECT_NAME_LENGTH, MAX_REPORT_FIELD_LENGTH, MAX_SEARCH_LENGTH,
    MAX_SUMMARY_LENGTH,
};

/// Require a non-blank value of at most `max` characters
fn required_text(value: &str, missing: &'static str, max: u64) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("required").with_message(missing.into()));
    }
    if trimmed.chars().count() as u64 > max {
        return Err(ValidationError::new("too_long")
            .with_message(format!("Must be at most {} characters", max).into()));
    }
    Ok(())
}

fn validate_project_name(value: &str) -> Result<(), ValidationError> {
    required_text(value, "No project name found", MAX_PROJECT_NAME_LENGTH)
}

fn validate_summary(value: &str) -> Result<(), ValidationError> {
    required_text(value, "No report summary found", MAX_SUMMARY_LENGTH)
}

fn validate_comment(value: &str) -> Result<(), ValidationError> {
    required_text(value, "No comment found", MAX_COMMENT_LENGTH)
}

fn validate_project_choice(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new("required").with_message("No project selected".into()));
    }
    if !is_valid_hash_id(value) {
        return Err(ValidationError::new("invalid").with_message("Invalid project id".into()));
    }
    Ok(())
}

fn validate_user_choice(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new("required").with_message("No user selected".into()));
    }
    if !is_valid_user_id(value) {
        return Err(ValidationError::new("invalid").with_message("Invalid user id".into()));
    }
    Ok(())
}

fn validate_developer_choice(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(
            ValidationError::new("required").with_message("No developer selected".into())
        );
    }
    validate_user_choice(value)
}

fn validate_reply_to(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if !value.is_empty() && !is_valid_hash_id(value) {
        return Err(ValidationError::new("invalid").with_message("Invalid reply-to id".into()));
    }
    Ok(())
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectForm {
    #[serde(rename = "project-name", default)]
    #[validate(custom(function = "validate_project_name"))]
    pub project_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SelectProjectForm {
    /// ID of the project picked from the search results
    #[serde(rename = "project-search", default)]
    #[validate(custom(function = "validate_project_choice"))]
    pub project_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddDeveloperForm {
    /// ID of the user picked from the search results
    #[serde(rename = "user-search", default)]
    #[validate(custom(function = "validate_user_choice"))]
    pub user_id: String,
}

/// Query params for project and user search
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SearchQuery {
    #[serde(default)]
    #[validate(length(max = MAX_SEARCH_LENGTH, message = "Search must be at most 100 characters"))]
    pub search: String,

    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReportBugForm {
    #[serde(rename = "report-summary", default)]
    #[validate(custom(function = "validate_summary"))]
    pub summary: String,

    #[serde(rename = "software-version", default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "Software version is too long"))]
    pub software_version: String,

    #[serde(default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "Device is too long"))]
    pub device: String,

    #[serde(default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "OS is too long"))]
    pub os: String,

    #[serde(rename = "expected-result", default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "Expected result is too long"))]
    pub expected_result: String,

    #[serde(rename = "actual-result", default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "Actual result is too long"))]
    pub actual_result: String,

    #[serde(default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "Steps are too long"))]
    pub steps: String,

    #[serde(default)]
    #[validate(length(max = MAX_REPORT_FIELD_LENGTH, message = "Details are too long"))]
    pub details: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignForm {
    #[serde(rename = "developer-select", default)]
    #[validate(custom(function = "validate_developer_choice"))]
    pub developer_id: String,
}

/// Tag forms post a single `{tag_type}-select` field
#[derive(Debug, Deserialize, Validate)]
pub struct TagForm {
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

impl TagForm {
    pub fn value(&self, tag_type: &str) -> Option<&str> {
        self.fields
            .get(&format!("{}-select", tag_type))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentForm {
    #[serde(rename = "user-comment", default)]
    #[validate(custom(function = "validate_comment"))]
    pub body: String,

    /// Comment being replied to, blank for a top-level comment
    #[serde(rename = "reply-to", default)]
    #[validate(custom(function = "validate_reply_to"))]
    pub reply_to: String,
}

impl CommentForm {
    pub fn reply_to(&self) -> Option<&str> {
        Some(self.reply_to.trim()).filter(|v| !v.is_empty())
    }
}

/// Checkbox form; browsers omit the field when unchecked
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct HelpWantedForm {
    #[serde(rename = "help-wanted", default)]
    pub help_wanted: Option<String>,
}

impl HelpWantedForm {
    pub fn enabled(&self) -> bool {
        self.help_wanted.as_deref() == Some("on")
    }
}

// ============================================================================
// Profile
// ============================================================================

/// An avatar file taken from the profile form
#[derive(Debug)]
pub struct AvatarUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Parsed multipart profile form
///
/// `None` means the field was not posted. An empty status clears it; an
/// empty name leaves the provider's name unchanged.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub status: Option<String>,
    pub avatar: Option<AvatarUpload>,
}
