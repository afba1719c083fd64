//! Session authentication and developer authorization

mod context;
mod extractors;
pub mod jwt;
mod manager;
pub mod middleware;

pub use context::{AuthContext, AuthService};
pub use extractors::{Auth, AuthRejection, ProjectDeveloper, ReportDeveloper};
pub use jwt::SessionClaims;
pub use manager::AuthManager;
pub use middleware::{AuthError, AuthState, require_auth};
