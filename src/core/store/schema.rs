//! Database schema initialization

use super::{Store, StoreError, SCHEMA_VERSION};

impl Store {
    /// Create all tables and stamp the schema version
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS cycles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                created TEXT NOT NULL
            );

            -- AUTOINCREMENT keeps the row key monotonic across deletes; display
            -- ID allocation relies on it to find the latest insertion
            CREATE TABLE IF NOT EXISTS criteria (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES cycles(id) ON DELETE CASCADE,
                crit_id TEXT NOT NULL CHECK (trim(crit_id) <> ''),
                module TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                crit_type TEXT NOT NULL DEFAULT '',
                priority TEXT,
                owner TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Pending'
            );
            CREATE INDEX IF NOT EXISTS idx_criteria_cycle ON criteria(cycle_id);

            CREATE TABLE IF NOT EXISTS test_cases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES cycles(id) ON DELETE CASCADE,
                test_id TEXT NOT NULL CHECK (trim(test_id) <> ''),
                module TEXT NOT NULL DEFAULT '',
                title TEXT NOT NULL DEFAULT '',
                steps TEXT NOT NULL DEFAULT '',
                expected TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Pending',
                note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_test_cases_cycle ON test_cases(cycle_id);

            CREATE TABLE IF NOT EXISTS bugs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES cycles(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                application TEXT NOT NULL DEFAULT '',
                environment TEXT NOT NULL DEFAULT '',
                priority TEXT,
                module TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'New',
                external_tracker_id TEXT,
                integration_status TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bugs_cycle ON bugs(cycle_id);

            CREATE TABLE IF NOT EXISTS evidence (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES cycles(id) ON DELETE CASCADE,
                test_id TEXT NOT NULL,
                url TEXT NOT NULL,
                date TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_evidence_cycle ON evidence(cycle_id);
            "#,
        )?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_is_stamped() {
        let store = Store::open_in_memory().unwrap();
        let version: i64 = store
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("qa.db");
        {
            let store = Store::open_path(&path).unwrap();
            store
                .conn
                .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
                .unwrap();
        }
        let err = Store::open_path(&path).err().unwrap();
        assert!(matches!(err, StoreError::SchemaTooNew { .. }));
    }
}
