// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "BugTracker";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "bugtracker";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".bugtracker";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "bugtracker.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "BUGTRACKER_CONFIG";

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "BUGTRACKER_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

pub const ENV_HOST: &str = "BUGTRACKER_HOST";
pub const ENV_PORT: &str = "BUGTRACKER_PORT";

/// Externally visible base URL (used for login callbacks and origin checks)
pub const ENV_PUBLIC_URL: &str = "BUGTRACKER_PUBLIC_URL";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "BUGTRACKER_LOG";

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

// =============================================================================
// Environment Variables - Identity Provider
// =============================================================================

pub const ENV_IDENTITY_DOMAIN: &str = "BUGTRACKER_IDENTITY_DOMAIN";
pub const ENV_IDENTITY_CLIENT_ID: &str = "BUGTRACKER_IDENTITY_CLIENT_ID";
pub const ENV_IDENTITY_CLIENT_SECRET: &str = "BUGTRACKER_IDENTITY_CLIENT_SECRET";
pub const ENV_IDENTITY_AUDIENCE: &str = "BUGTRACKER_IDENTITY_AUDIENCE";

/// Timeout for a single identity provider request
pub const IDENTITY_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Management tokens are refreshed this many seconds before they expire
pub const IDENTITY_TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Upper bound for caching a management token when the provider omits `expires_in`
pub const IDENTITY_TOKEN_DEFAULT_TTL_SECS: u64 = 3600;

/// Maximum users returned by one user search
pub const IDENTITY_SEARCH_PER_PAGE: u32 = 20;

/// Scopes requested during interactive login
pub const IDENTITY_LOGIN_SCOPE: &str = "openid profile email";

// =============================================================================
// Environment Variables - Storage and Secrets
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "BUGTRACKER_DATA_DIR";

/// Hex-encoded session signing key (overrides the persisted key)
pub const ENV_SESSION_SECRET: &str = "BUGTRACKER_SESSION_SECRET";

/// Filename for the persisted secrets inside the data directory
pub const SECRETS_FILENAME: &str = "secrets.json";

// =============================================================================
// Authentication
// =============================================================================

/// Cookie name for session token
pub const SESSION_COOKIE_NAME: &str = "bugtracker_session";

/// Cookie holding the OAuth `state` value between login and callback
pub const LOGIN_STATE_COOKIE_NAME: &str = "bugtracker_login_state";

/// Lifetime of the login state cookie
pub const LOGIN_STATE_TTL_MINUTES: i64 = 10;

pub const ENV_SESSION_TTL_DAYS: &str = "BUGTRACKER_SESSION_TTL_DAYS";

/// Default session TTL in days
pub const DEFAULT_SESSION_TTL_DAYS: u32 = 30;

/// Auth method recorded in session claims for identity provider logins
pub const AUTH_METHOD_OAUTH: &str = "oauth";

// =============================================================================
// Uploads
// =============================================================================

pub const ENV_AVATAR_MAX_BYTES: &str = "BUGTRACKER_AVATAR_MAX_BYTES";

/// Default avatar size cap (64 KiB)
pub const DEFAULT_AVATAR_MAX_BYTES: usize = 64 * 1024;

/// Hard ceiling for the configurable avatar cap (16 MiB)
pub const AVATAR_MAX_BYTES_CEILING: usize = 16 * 1024 * 1024;

// =============================================================================
// Identifiers
// =============================================================================

/// Random bytes hashed to produce an entity ID
pub const HASH_RANDOM_BYTES: usize = 32;

/// Attempts made to find an unused ID before giving up
pub const HASH_MAX_ATTEMPTS: u32 = 16;

/// Maximum accepted length for IDs in request paths and forms
pub const MAX_ID_LENGTH: usize = 64;

/// Maximum accepted length for identity provider user IDs (`auth0|...`)
pub const MAX_USER_ID_LENGTH: usize = 128;

// =============================================================================
// Bug Reports
// =============================================================================

pub const MAX_PROJECT_NAME_LENGTH: u64 = 100;
pub const MAX_SUMMARY_LENGTH: u64 = 200;
pub const MAX_REPORT_FIELD_LENGTH: u64 = 10_000;
pub const MAX_COMMENT_LENGTH: u64 = 5_000;
pub const MAX_USERNAME_LENGTH: u64 = 64;
pub const MAX_STATUS_LENGTH: u64 = 64;

/// Search queries longer than this are rejected
pub const MAX_SEARCH_LENGTH: u64 = 100;

/// Page size for project searches
pub const SEARCH_PAGE_LIMIT: u32 = 20;

/// Project avatar generator
pub const PROJECT_AVATAR_BASE_URL: &str = "https://api.dicebear.com/6.x/shapes/svg";

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "bugtracker.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL auto-checkpoint threshold (pages, ~4MB at 1000)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// WAL checkpoint interval in seconds (5 minutes)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// HTTP
// =============================================================================

/// Default request body limit (1MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Headroom added on top of the avatar cap for the other multipart fields
pub const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Graceful shutdown timeout for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
