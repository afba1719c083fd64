//! SQLite repositories
//!
//! Types (UserRow, ProjectRow, etc.) should be imported from `crate::data::types`.

pub mod assignment;
pub mod comment;
pub mod development;
pub mod hash;
pub mod project;
pub mod report;
pub mod upvote;
pub mod user;

pub use assignment::{add_assignment, list_assignees, remove_assignment};
pub use comment::{add_comment, list_comments};
pub use development::{add_developer, is_developer, list_developers};
pub use hash::find_unique_hash;
pub use project::{
    create_project, get_project, leave_project, list_projects_for_user, project_stats,
    search_projects,
};
pub use report::{
    create_report, get_report, list_assigned_reports, list_reports, set_help_wanted, update_tag,
};
pub use upvote::{add_upvote, has_upvoted, remove_upvote};
pub use user::{add_user_if_none, delete_user, get_profile, get_profiles, set_avatar, set_status};
