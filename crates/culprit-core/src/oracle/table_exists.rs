use crate::oracle::Oracle;
use crate::timeline::CommitRecord;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};

const DB_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

/// Checks whether a named table exists in the service's SQLite database.
///
/// The database path is discovered as the first (lexicographically
/// smallest) `*.db`/`*.sqlite`/`*.sqlite3` file in `db_dir`. Any failure
/// along the way, including no database at all, reads as `false`.
pub struct TableExistsOracle {
    db_dir: PathBuf,
    table: String,
}

impl TableExistsOracle {
    pub fn new(db_dir: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            db_dir: db_dir.into(),
            table: table.into(),
        }
    }

    fn find_database(&self) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.db_dir).ok()?;
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| DB_EXTENSIONS.contains(&ext))
            })
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    fn table_exists(&self, db_path: &Path) -> rusqlite::Result<bool> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let found: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&self.table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl Oracle for TableExistsOracle {
    fn evaluate(&self, _commit: &CommitRecord) -> bool {
        let Some(db_path) = self.find_database() else {
            return false;
        };
        self.table_exists(&db_path).unwrap_or(false)
    }

    fn describe(&self) -> String {
        format!("table \"{}\" in {}", self.table, self.db_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_commit() -> CommitRecord {
        CommitRecord {
            hash: "a".repeat(40),
            index: 0,
            total: 1,
            timestamp: time::OffsetDateTime::UNIX_EPOCH,
            test_result: None,
        }
    }

    fn create_db(path: &Path, table: &str) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(&format!("CREATE TABLE {table} (id INTEGER PRIMARY KEY);"))
            .unwrap();
    }

    #[test]
    fn present_table_is_true() {
        let dir = tempfile::tempdir().unwrap();
        create_db(&dir.path().join("app.db"), "widgets");
        assert!(TableExistsOracle::new(dir.path(), "widgets").evaluate(&dummy_commit()));
    }

    #[test]
    fn absent_table_is_false() {
        let dir = tempfile::tempdir().unwrap();
        create_db(&dir.path().join("app.db"), "widgets");
        assert!(!TableExistsOracle::new(dir.path(), "gadgets").evaluate(&dummy_commit()));
    }

    #[test]
    fn no_database_is_false() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!TableExistsOracle::new(dir.path(), "widgets").evaluate(&dummy_commit()));
    }

    #[test]
    fn corrupt_database_is_false() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.db"), "this is not sqlite").unwrap();
        assert!(!TableExistsOracle::new(dir.path(), "widgets").evaluate(&dummy_commit()));
    }

    #[test]
    fn picks_first_database_by_name() {
        let dir = tempfile::tempdir().unwrap();
        create_db(&dir.path().join("a.db"), "widgets");
        create_db(&dir.path().join("b.db"), "gadgets");
        assert!(TableExistsOracle::new(dir.path(), "widgets").evaluate(&dummy_commit()));
        assert!(!TableExistsOracle::new(dir.path(), "gadgets").evaluate(&dummy_commit()));
    }
}
