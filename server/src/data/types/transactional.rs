//! Row types returned by the transactional repositories

use serde::{Deserialize, Serialize};

use super::enums::{Priority, ReportStatus, Severity};

// ============================================================================
// User types
// ============================================================================

/// Locally stored part of a user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    #[serde(skip)]
    pub avatar: Option<Vec<u8>>,
    pub avatar_mime: Option<String>,
    pub status: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Project types
// ============================================================================

/// Project row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// Report counts per status for one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub new: i64,
    pub pending: i64,
    pub fixed: i64,
}

impl ProjectStats {
    pub fn total(&self) -> i64 {
        self.new + self.pending + self.fixed
    }
}

// ============================================================================
// Report types
// ============================================================================

/// Bug report row with its derived upvote count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: String,
    pub project_id: String,
    pub reporter_id: String,
    pub summary: String,
    pub software_version: String,
    pub device: String,
    pub os: String,
    pub expected_result: String,
    pub actual_result: String,
    pub steps: String,
    pub details: String,
    pub priority: Priority,
    pub severity: Severity,
    pub status: ReportStatus,
    pub help_wanted: bool,
    pub created_at: i64,
    pub upvotes: i64,
}

/// Fields supplied when filing a report; triage state starts at the defaults
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub project_id: String,
    pub reporter_id: String,
    pub summary: String,
    pub software_version: String,
    pub device: String,
    pub os: String,
    pub expected_result: String,
    pub actual_result: String,
    pub steps: String,
    pub details: String,
}

/// Report assigned to a developer, with its project's name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedReportRow {
    pub report: ReportRow,
    pub project_name: String,
}

// ============================================================================
// Comment types
// ============================================================================

/// Comment row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub report_id: String,
    pub commenter_id: String,
    pub reply_to: Option<String>,
    pub body: String,
    pub created_at: i64,
}
