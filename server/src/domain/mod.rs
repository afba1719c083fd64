//! Domain logic
//!
//! - `profiles` - Combines identity provider users with locally stored profile data

pub mod profiles;

pub use profiles::{ProfileError, UserProfile};
