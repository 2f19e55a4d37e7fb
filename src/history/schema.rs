pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS scan_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    url TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    high INTEGER NOT NULL DEFAULT 0,
    medium INTEGER NOT NULL DEFAULT 0,
    low INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_scan_history_timestamp ON scan_history(timestamp);
";
