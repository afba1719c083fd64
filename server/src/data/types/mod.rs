//! Shared data types for the data layer

mod enums;
mod transactional;

pub use enums::{
    BugTag, HashTable, LeaveOutcome, Priority, ReportFilter, ReportQuery, ReportSort,
    ReportStatus, Severity, SortOrder,
};

pub use transactional::{
    AssignedReportRow, CommentRow, NewReport, ProjectRow, ProjectStats, ReportRow, UserRow,
};
