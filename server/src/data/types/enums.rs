//! Bug triage enums and query whitelists
//!
//! Every value that ends up in a SQL column name or ORDER BY clause is
//! produced by a `match` here, never from raw user input.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// TRIAGE STATE
// ============================================================================

/// Workflow status of a bug report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    New,
    Pending,
    Fixed,
}

impl ReportStatus {
    pub const ALL: [Self; 3] = [Self::New, Self::Pending, Self::Fixed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Pending => "pending",
            Self::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "pending" => Some(Self::Pending),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// Priority of a bug report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Severity of a bug report, 1 (cosmetic) through 5 (blocker)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i64", into = "i64")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<i64>().ok().and_then(Self::new)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<i64> for Severity {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("severity must be between 1 and 5, got {}", value))
    }
}

impl From<Severity> for i64 {
    fn from(s: Severity) -> Self {
        s.0 as i64
    }
}

/// A single triage tag change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugTag {
    Status(ReportStatus),
    Priority(Priority),
    Severity(Severity),
}

impl BugTag {
    /// Parse a `(tag_type, value)` pair, rejecting unknown tag types and values
    pub fn parse(tag_type: &str, value: &str) -> Option<Self> {
        match tag_type {
            "status" => ReportStatus::parse(value).map(Self::Status),
            "priority" => Priority::parse(value).map(Self::Priority),
            "severity" => Severity::parse(value).map(Self::Severity),
            _ => None,
        }
    }

    /// Column updated by this tag
    pub fn column(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Priority(_) => "priority",
            Self::Severity(_) => "severity",
        }
    }
}

// ============================================================================
// REPORT LISTING
// ============================================================================

/// Sort key for report listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportSort {
    #[default]
    Date,
    Upvotes,
    Priority,
    Severity,
    Status,
}

impl ReportSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Some(Self::Date),
            "upvotes" => Some(Self::Upvotes),
            "priority" => Some(Self::Priority),
            "severity" => Some(Self::Severity),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// SQL expression to order by
    pub fn sql_expr(&self) -> &'static str {
        match self {
            Self::Date => "r.created_at",
            Self::Upvotes => "upvote_count",
            Self::Priority => {
                "CASE r.priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 WHEN 'high' THEN 2 ELSE 3 END"
            }
            Self::Severity => "r.severity",
            Self::Status => {
                "CASE r.status WHEN 'new' THEN 0 WHEN 'pending' THEN 1 ELSE 2 END"
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Report listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFilter {
    #[default]
    All,
    Status(ReportStatus),
}

impl ReportFilter {
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        ReportStatus::parse(s).map(Self::Status)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Status(s) => s.as_str(),
        }
    }
}

/// Filter, sort key and direction for a report listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub filter: ReportFilter,
    pub sort: ReportSort,
    pub order: SortOrder,
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

/// Result of a developer leaving a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The user was not a developer of the project
    NotDeveloper,
    /// Membership removed; other developers remain
    Left,
    /// The user was the last developer, so the project was deleted
    Deleted,
}

/// Tables whose primary keys are random hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashTable {
    Projects,
    Reports,
    Comments,
}

impl HashTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Reports => "reports",
            Self::Comments => "comments",
        }
    }
}
