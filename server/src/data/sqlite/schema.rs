//! SQLite schema definitions

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Users (id issued by the identity provider; name/email live there)
-- =============================================================================
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    avatar BLOB,
    avatar_mime TEXT,
    status TEXT CHECK(status IS NULL OR length(status) <= 64),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- =============================================================================
-- 2. Projects
-- =============================================================================
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 100),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name COLLATE NOCASE);

-- =============================================================================
-- 3. Developments (project membership)
-- =============================================================================
CREATE TABLE IF NOT EXISTS developments (
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    developer_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (project_id, developer_id)
);

CREATE INDEX IF NOT EXISTS idx_developments_developer ON developments(developer_id);

-- =============================================================================
-- 4. Bug reports (reporter_id has no FK so reports outlive their reporter)
-- =============================================================================
CREATE TABLE IF NOT EXISTS reports (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    reporter_id TEXT NOT NULL,
    summary TEXT NOT NULL CHECK(length(summary) >= 1),
    software_version TEXT NOT NULL DEFAULT '',
    device TEXT NOT NULL DEFAULT '',
    os TEXT NOT NULL DEFAULT '',
    expected_result TEXT NOT NULL DEFAULT '',
    actual_result TEXT NOT NULL DEFAULT '',
    steps TEXT NOT NULL DEFAULT '',
    details TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL DEFAULT 'medium' CHECK(priority IN ('low', 'medium', 'high', 'critical')),
    severity INTEGER NOT NULL DEFAULT 3 CHECK(severity BETWEEN 1 AND 5),
    status TEXT NOT NULL DEFAULT 'new' CHECK(status IN ('new', 'pending', 'fixed')),
    help_wanted INTEGER NOT NULL DEFAULT 0 CHECK(help_wanted IN (0, 1)),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_project ON reports(project_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_reports_project_status ON reports(project_id, status);

-- =============================================================================
-- 5. Comments (append-only)
-- =============================================================================
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    commenter_id TEXT NOT NULL,
    reply_to TEXT REFERENCES comments(id) ON DELETE SET NULL,
    body TEXT NOT NULL CHECK(length(body) >= 1),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_report ON comments(report_id, created_at DESC);

-- =============================================================================
-- 6. Assignments
-- =============================================================================
CREATE TABLE IF NOT EXISTS assignments (
    report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    developer_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (report_id, developer_id)
);

CREATE INDEX IF NOT EXISTS idx_assignments_developer ON assignments(developer_id);

-- =============================================================================
-- 7. Upvotes (one per user per report)
-- =============================================================================
CREATE TABLE IF NOT EXISTS upvotes (
    report_id TEXT NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (report_id, user_id)
);
"#;
