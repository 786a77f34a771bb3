//! Record queries and mutations
//!
//! Raw rows are read into `*Row` structs holding the native column values and
//! converted to domain types afterwards, outside the rusqlite row callback.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    format_date, non_blank, parse_column, parse_date, parse_optional_column, Store, StoreError,
};
use crate::core::entity::{priority_label, CycleId, UserId};
use crate::core::ids::{LatestDisplayId, RecordFamily};
use crate::entities::{Bug, Criterion, Cycle, Evidence, TestCase, User};

// ----------------------------------------------------------------------------
// Native row shapes
// ----------------------------------------------------------------------------

struct CycleRow {
    id: i64,
    user_id: i64,
    title: String,
    created: String,
}

impl CycleRow {
    const COLUMNS: &'static str = "id, user_id, title, created";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            created: row.get("created")?,
        })
    }

    fn into_domain(self) -> Result<Cycle, StoreError> {
        Ok(Cycle {
            id: CycleId(self.id),
            owner: UserId(self.user_id),
            created: parse_date("cycles", "created", &self.created)?,
            title: self.title,
        })
    }
}

struct CriterionRow {
    crit_id: String,
    module: String,
    description: String,
    crit_type: String,
    priority: Option<String>,
    owner: String,
    status: String,
}

impl CriterionRow {
    const COLUMNS: &'static str = "crit_id, module, description, crit_type, priority, owner, status";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            crit_id: row.get("crit_id")?,
            module: row.get("module")?,
            description: row.get("description")?,
            crit_type: row.get("crit_type")?,
            priority: row.get("priority")?,
            owner: row.get("owner")?,
            status: row.get("status")?,
        })
    }

    fn into_domain(self) -> Result<Criterion, StoreError> {
        Ok(Criterion {
            priority: parse_optional_column("criteria", "priority", self.priority.as_deref())?,
            status: parse_column("criteria", "status", &self.status)?,
            display_id: self.crit_id,
            module: self.module,
            description: self.description,
            criterion_type: self.crit_type,
            owner: self.owner,
        })
    }
}

struct TestCaseRow {
    test_id: String,
    module: String,
    title: String,
    steps: String,
    expected: String,
    status: String,
    note: Option<String>,
}

impl TestCaseRow {
    const COLUMNS: &'static str = "test_id, module, title, steps, expected, status, note";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            test_id: row.get("test_id")?,
            module: row.get("module")?,
            title: row.get("title")?,
            steps: row.get("steps")?,
            expected: row.get("expected")?,
            status: row.get("status")?,
            note: row.get("note")?,
        })
    }

    fn into_domain(self) -> Result<TestCase, StoreError> {
        Ok(TestCase {
            status: parse_column("test_cases", "status", &self.status)?,
            display_id: self.test_id,
            module: self.module,
            title: self.title,
            steps: self.steps,
            expected_result: self.expected,
            note: self.note,
        })
    }
}

struct BugRow {
    id: i64,
    title: String,
    description: String,
    application: String,
    environment: String,
    priority: Option<String>,
    module: String,
    status: String,
    external_tracker_id: Option<String>,
}

impl BugRow {
    const COLUMNS: &'static str = "id, title, description, application, environment, priority, module, status, external_tracker_id";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            application: row.get("application")?,
            environment: row.get("environment")?,
            priority: row.get("priority")?,
            module: row.get("module")?,
            status: row.get("status")?,
            external_tracker_id: row.get("external_tracker_id")?,
        })
    }

    // integration_status is never read back: it is derived from the tracker id
    fn into_domain(self) -> Result<Bug, StoreError> {
        Ok(Bug {
            priority: parse_optional_column("bugs", "priority", self.priority.as_deref())?,
            status: parse_column("bugs", "status", &self.status)?,
            id: self.id,
            title: self.title,
            description: self.description,
            application: self.application,
            environment: self.environment,
            module: self.module,
            external_tracker_id: self.external_tracker_id,
        })
    }
}

struct EvidenceRow {
    id: i64,
    cycle_id: i64,
    test_id: String,
    url: String,
    date: String,
}

impl EvidenceRow {
    const COLUMNS: &'static str = "id, cycle_id, test_id, url, date";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            cycle_id: row.get("cycle_id")?,
            test_id: row.get("test_id")?,
            url: row.get("url")?,
            date: row.get("date")?,
        })
    }

    fn into_domain(self) -> Result<Evidence, StoreError> {
        Ok(Evidence {
            date: parse_date("evidence", "date", &self.date)?,
            id: self.id,
            cycle_id: CycleId(self.cycle_id),
            test_case_id: self.test_id,
            url: self.url,
        })
    }
}

fn read_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get("id")?),
        name: row.get("name")?,
        email: row.get("email")?,
    })
}

// ----------------------------------------------------------------------------
// Insert helpers shared by single inserts and bulk replaces
// ----------------------------------------------------------------------------

fn insert_criterion_row(conn: &Connection, cycle: CycleId, crit: &Criterion) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO criteria (cycle_id, crit_id, module, description, crit_type, priority, owner, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            cycle.0,
            crit.display_id,
            crit.module,
            crit.description,
            crit.criterion_type,
            non_blank(Some(priority_label(crit.priority))),
            crit.owner,
            crit.status.as_str(),
        ],
    )?;
    Ok(())
}

fn insert_test_case_row(conn: &Connection, cycle: CycleId, tc: &TestCase) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO test_cases (cycle_id, test_id, module, title, steps, expected, status, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            cycle.0,
            tc.display_id,
            tc.module,
            tc.title,
            tc.steps,
            tc.expected_result,
            tc.status.as_str(),
            non_blank(tc.note.as_deref()),
        ],
    )?;
    Ok(())
}

fn collect<R, T>(
    rows: impl Iterator<Item = rusqlite::Result<R>>,
    into_domain: impl Fn(R) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(into_domain(row?)?);
    }
    Ok(out)
}

impl Store {
    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Register a user; e-mail addresses are unique
    pub fn add_user(&mut self, name: &str, email: &str) -> Result<User, StoreError> {
        if self.find_user_by_email(email)?.is_some() {
            return Err(StoreError::Duplicate {
                what: "user",
                key: email.to_string(),
            });
        }
        self.conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, email, "user added");
        Ok(User {
            id: UserId(id),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE email = ?1",
                params![email],
                read_user,
            )
            .optional()?)
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id.0],
                read_user,
            )
            .optional()?)
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id, name, email FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], read_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    // ------------------------------------------------------------------------
    // Cycles
    // ------------------------------------------------------------------------

    pub fn create_cycle(
        &mut self,
        owner: UserId,
        title: &str,
        created: NaiveDate,
    ) -> Result<Cycle, StoreError> {
        self.conn.execute(
            "INSERT INTO cycles (user_id, title, created) VALUES (?1, ?2, ?3)",
            params![owner.0, title, format_date(created)],
        )?;
        let id = CycleId(self.conn.last_insert_rowid());
        tracing::debug!(%id, title, "cycle created");
        Ok(Cycle {
            id,
            title: title.to_string(),
            owner,
            created,
        })
    }

    pub fn list_cycles(&self) -> Result<Vec<Cycle>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM cycles ORDER BY id", CycleRow::COLUMNS))?;
        let rows = stmt.query_map([], CycleRow::read)?;
        collect(rows, CycleRow::into_domain)
    }

    pub fn get_cycle(&self, id: CycleId) -> Result<Option<Cycle>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM cycles WHERE id = ?1", CycleRow::COLUMNS),
                params![id.0],
                CycleRow::read,
            )
            .optional()?
            .map(CycleRow::into_domain)
            .transpose()
    }

    /// Find a cycle by numeric ID or exact title
    pub fn find_cycle(&self, reference: &str) -> Result<Cycle, StoreError> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<i64>() {
            if let Some(cycle) = self.get_cycle(CycleId(id))? {
                return Ok(cycle);
            }
        }

        let mut matches: Vec<Cycle> = self
            .list_cycles()?
            .into_iter()
            .filter(|c| c.title == reference)
            .collect();

        match matches.len() {
            0 => Err(StoreError::NotFound {
                what: "cycle",
                key: reference.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(StoreError::Ambiguous {
                what: "cycle",
                key: reference.to_string(),
                count,
            }),
        }
    }

    /// Delete a cycle and, through the foreign keys, all of its records
    pub fn delete_cycle(&mut self, id: CycleId) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM cycles WHERE id = ?1", params![id.0])?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                what: "cycle",
                key: id.to_string(),
            });
        }
        tracing::debug!(%id, "cycle deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Acceptance criteria
    // ------------------------------------------------------------------------

    /// Criteria of a cycle in insertion order
    pub fn list_criteria(&self, cycle: CycleId) -> Result<Vec<Criterion>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM criteria WHERE cycle_id = ?1 ORDER BY id",
            CriterionRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![cycle.0], CriterionRow::read)?;
        collect(rows, CriterionRow::into_domain)
    }

    pub fn insert_criterion(&mut self, cycle: CycleId, crit: &Criterion) -> Result<(), StoreError> {
        insert_criterion_row(&self.conn, cycle, crit)
    }

    /// Update every field of the criterion with the same display ID
    pub fn update_criterion(&mut self, cycle: CycleId, crit: &Criterion) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE criteria SET module = ?3, description = ?4, crit_type = ?5, priority = ?6, owner = ?7, status = ?8
             WHERE cycle_id = ?1 AND crit_id = ?2",
            params![
                cycle.0,
                crit.display_id,
                crit.module,
                crit.description,
                crit.criterion_type,
                non_blank(Some(priority_label(crit.priority))),
                crit.owner,
                crit.status.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                what: "criterion",
                key: crit.display_id.clone(),
            });
        }
        Ok(())
    }

    /// Replace all criteria of a cycle atomically
    pub fn replace_criteria(&mut self, cycle: CycleId, criteria: &[Criterion]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM criteria WHERE cycle_id = ?1", params![cycle.0])?;
        for crit in criteria {
            insert_criterion_row(&tx, cycle, crit)?;
        }
        tx.commit()?;
        tracing::debug!(%cycle, count = criteria.len(), "criteria replaced");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Test cases
    // ------------------------------------------------------------------------

    /// Test cases of a cycle in insertion order
    pub fn list_test_cases(&self, cycle: CycleId) -> Result<Vec<TestCase>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM test_cases WHERE cycle_id = ?1 ORDER BY id",
            TestCaseRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![cycle.0], TestCaseRow::read)?;
        collect(rows, TestCaseRow::into_domain)
    }

    /// First test case with the given display ID
    pub fn get_test_case(&self, cycle: CycleId, display_id: &str) -> Result<Option<TestCase>, StoreError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM test_cases WHERE cycle_id = ?1 AND test_id = ?2 ORDER BY id LIMIT 1",
                    TestCaseRow::COLUMNS
                ),
                params![cycle.0, display_id],
                TestCaseRow::read,
            )
            .optional()?
            .map(TestCaseRow::into_domain)
            .transpose()
    }

    pub fn insert_test_case(&mut self, cycle: CycleId, tc: &TestCase) -> Result<(), StoreError> {
        insert_test_case_row(&self.conn, cycle, tc)
    }

    /// Update every field of the test case with the same display ID
    pub fn update_test_case(&mut self, cycle: CycleId, tc: &TestCase) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE test_cases SET module = ?3, title = ?4, steps = ?5, expected = ?6, status = ?7, note = ?8
             WHERE cycle_id = ?1 AND test_id = ?2",
            params![
                cycle.0,
                tc.display_id,
                tc.module,
                tc.title,
                tc.steps,
                tc.expected_result,
                tc.status.as_str(),
                non_blank(tc.note.as_deref()),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                what: "test case",
                key: tc.display_id.clone(),
            });
        }
        Ok(())
    }

    /// Replace all test cases of a cycle atomically
    pub fn replace_test_cases(&mut self, cycle: CycleId, cases: &[TestCase]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM test_cases WHERE cycle_id = ?1", params![cycle.0])?;
        for tc in cases {
            insert_test_case_row(&tx, cycle, tc)?;
        }
        tx.commit()?;
        tracing::debug!(%cycle, count = cases.len(), "test cases replaced");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Bugs
    // ------------------------------------------------------------------------

    pub fn list_bugs(&self, cycle: CycleId) -> Result<Vec<Bug>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bugs WHERE cycle_id = ?1 ORDER BY id",
            BugRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![cycle.0], BugRow::read)?;
        collect(rows, BugRow::into_domain)
    }

    pub fn get_bug(&self, cycle: CycleId, id: i64) -> Result<Option<Bug>, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM bugs WHERE cycle_id = ?1 AND id = ?2", BugRow::COLUMNS),
                params![cycle.0, id],
                BugRow::read,
            )
            .optional()?
            .map(BugRow::into_domain)
            .transpose()
    }

    /// Insert a bug; `bug.id` is ignored and the assigned one returned
    pub fn insert_bug(&mut self, cycle: CycleId, bug: &Bug) -> Result<Bug, StoreError> {
        self.conn.execute(
            "INSERT INTO bugs (cycle_id, title, description, application, environment, priority, module, status, external_tracker_id, integration_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                cycle.0,
                bug.title,
                bug.description,
                bug.application,
                bug.environment,
                non_blank(Some(priority_label(bug.priority))),
                bug.module,
                bug.status.as_str(),
                non_blank(bug.external_tracker_id.as_deref()),
                bug.integration_status().as_str(),
            ],
        )?;
        let mut saved = bug.clone();
        saved.id = self.conn.last_insert_rowid();
        saved.external_tracker_id =
            non_blank(bug.external_tracker_id.as_deref()).map(str::to_string);
        tracing::debug!(%cycle, id = saved.id, "bug inserted");
        Ok(saved)
    }

    /// Update a bug by ID, recomputing its integration status
    pub fn update_bug(&mut self, cycle: CycleId, bug: &Bug) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE bugs SET title = ?3, description = ?4, application = ?5, environment = ?6, priority = ?7,
                             module = ?8, status = ?9, external_tracker_id = ?10, integration_status = ?11
             WHERE cycle_id = ?1 AND id = ?2",
            params![
                cycle.0,
                bug.id,
                bug.title,
                bug.description,
                bug.application,
                bug.environment,
                non_blank(Some(priority_label(bug.priority))),
                bug.module,
                bug.status.as_str(),
                non_blank(bug.external_tracker_id.as_deref()),
                bug.integration_status().as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                what: "bug",
                key: bug.id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete_bug(&mut self, cycle: CycleId, id: i64) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM bugs WHERE cycle_id = ?1 AND id = ?2",
            params![cycle.0, id],
        )?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                what: "bug",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Evidence
    // ------------------------------------------------------------------------

    pub fn insert_evidence(
        &mut self,
        cycle: CycleId,
        test_case_id: &str,
        url: &str,
        date: NaiveDate,
    ) -> Result<Evidence, StoreError> {
        self.conn.execute(
            "INSERT INTO evidence (cycle_id, test_id, url, date) VALUES (?1, ?2, ?3, ?4)",
            params![cycle.0, test_case_id, url, format_date(date)],
        )?;
        Ok(Evidence {
            id: self.conn.last_insert_rowid(),
            cycle_id: cycle,
            test_case_id: test_case_id.to_string(),
            url: url.to_string(),
            date,
        })
    }

    /// Evidence of a cycle in upload order
    pub fn list_evidence(&self, cycle: CycleId) -> Result<Vec<Evidence>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM evidence WHERE cycle_id = ?1 ORDER BY id",
            EvidenceRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![cycle.0], EvidenceRow::read)?;
        collect(rows, EvidenceRow::into_domain)
    }
}

impl LatestDisplayId for Store {
    fn latest_display_id(
        &self,
        family: RecordFamily,
        cycle: CycleId,
    ) -> Result<Option<String>, StoreError> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE cycle_id = ?1 ORDER BY id DESC LIMIT 1",
            col = family.id_column(),
            table = family.table(),
        );
        Ok(self
            .conn
            .query_row(&sql, params![cycle.0], |row| row.get(0))
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{ExecStatus, Priority};
    use crate::core::ids::next_display_id;
    use crate::entities::{BugStatus, IntegrationStatus};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn store_with_cycle() -> (Store, CycleId) {
        let mut store = Store::open_in_memory().unwrap();
        let user = store.add_user("Ana", "ana@example.com").unwrap();
        let cycle = store.create_cycle(user.id, "Sprint 1", date()).unwrap();
        (store, cycle.id)
    }

    fn bug(title: &str, tracker: Option<&str>) -> Bug {
        Bug {
            id: 0,
            title: title.to_string(),
            description: String::new(),
            application: "portal".to_string(),
            environment: "staging".to_string(),
            priority: Some(Priority::High),
            module: "auth".to_string(),
            status: BugStatus::New,
            external_tracker_id: tracker.map(String::from),
        }
    }

    #[test]
    fn test_duplicate_user_email_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        store.add_user("Ana", "ana@example.com").unwrap();
        let err = store.add_user("Ana B", "ana@example.com").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[test]
    fn test_find_cycle_by_id_or_title() {
        let (mut store, id) = store_with_cycle();
        assert_eq!(store.find_cycle(&id.to_string()).unwrap().id, id);
        assert_eq!(store.find_cycle("Sprint 1").unwrap().id, id);
        assert!(matches!(
            store.find_cycle("Sprint 9"),
            Err(StoreError::NotFound { .. })
        ));

        let owner = store.get_cycle(id).unwrap().unwrap().owner;
        store.create_cycle(owner, "Sprint 1", date()).unwrap();
        assert!(matches!(
            store.find_cycle("Sprint 1"),
            Err(StoreError::Ambiguous { count: 2, .. })
        ));
    }

    #[test]
    fn test_latest_display_id_follows_insertion_order() {
        let (mut store, cycle) = store_with_cycle();
        assert_eq!(
            store.latest_display_id(RecordFamily::TestCases, cycle).unwrap(),
            None
        );

        store.insert_test_case(cycle, &TestCase::new("CT-005")).unwrap();
        store.insert_test_case(cycle, &TestCase::new("CT-002")).unwrap();
        assert_eq!(
            store.latest_display_id(RecordFamily::TestCases, cycle).unwrap(),
            Some("CT-002".to_string())
        );

        let alloc = next_display_id(&store, RecordFamily::TestCases, cycle).unwrap();
        assert_eq!(alloc.id, "CT-003");
    }

    #[test]
    fn test_allocation_after_bulk_replace() {
        let (mut store, cycle) = store_with_cycle();
        store.insert_criterion(cycle, &Criterion::new("CA-001")).unwrap();
        store.insert_criterion(cycle, &Criterion::new("CA-002")).unwrap();

        let rows = store.list_criteria(cycle).unwrap();
        store.replace_criteria(cycle, &rows).unwrap();

        let alloc = next_display_id(&store, RecordFamily::Criteria, cycle).unwrap();
        assert_eq!(alloc.id, "CA-003");
    }

    #[test]
    fn test_replace_is_atomic() {
        let (mut store, cycle) = store_with_cycle();
        store.insert_test_case(cycle, &TestCase::new("CT-001")).unwrap();
        store.insert_test_case(cycle, &TestCase::new("CT-002")).unwrap();

        // The blank display ID violates the CHECK constraint halfway through
        let replacement = vec![TestCase::new("CT-010"), TestCase::new("  ")];
        assert!(store.replace_test_cases(cycle, &replacement).is_err());

        let ids: Vec<String> = store
            .list_test_cases(cycle)
            .unwrap()
            .into_iter()
            .map(|tc| tc.display_id)
            .collect();
        assert_eq!(ids, vec!["CT-001", "CT-002"]);
    }

    #[test]
    fn test_replace_only_touches_one_cycle() {
        let (mut store, cycle) = store_with_cycle();
        let owner = store.get_cycle(cycle).unwrap().unwrap().owner;
        let other = store.create_cycle(owner, "Sprint 2", date()).unwrap().id;
        store.insert_criterion(other, &Criterion::new("CA-001")).unwrap();

        store.replace_criteria(cycle, &[Criterion::new("CA-001")]).unwrap();
        assert_eq!(store.list_criteria(other).unwrap().len(), 1);
        assert_eq!(store.list_criteria(cycle).unwrap().len(), 1);
    }

    #[test]
    fn test_criterion_round_trip_and_update() {
        let (mut store, cycle) = store_with_cycle();
        let mut crit = Criterion::new("CA-001");
        crit.description = "User can reset password".to_string();
        crit.priority = Some(Priority::Critical);
        store.insert_criterion(cycle, &crit).unwrap();

        crit.status = ExecStatus::Ok;
        crit.priority = None;
        store.update_criterion(cycle, &crit).unwrap();

        let stored = store.list_criteria(cycle).unwrap();
        assert_eq!(stored, vec![crit]);

        let missing = Criterion::new("CA-404");
        assert!(matches!(
            store.update_criterion(cycle, &missing),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_blank_note_stored_as_null() {
        let (mut store, cycle) = store_with_cycle();
        let mut tc = TestCase::new("CT-001");
        tc.note = Some("   ".to_string());
        store.insert_test_case(cycle, &tc).unwrap();

        let stored = store.get_test_case(cycle, "CT-001").unwrap().unwrap();
        assert_eq!(stored.note, None);
    }

    #[test]
    fn test_unknown_status_is_rejected_at_boundary() {
        let (store, cycle) = store_with_cycle();
        store
            .conn
            .execute(
                "INSERT INTO test_cases (cycle_id, test_id, status) VALUES (?1, 'CT-001', 'Finished')",
                params![cycle.0],
            )
            .unwrap();

        let err = store.list_test_cases(cycle).unwrap_err();
        match err {
            StoreError::InvalidField { table, column, value, .. } => {
                assert_eq!(table, "test_cases");
                assert_eq!(column, "status");
                assert_eq!(value, "Finished");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bug_integration_status_written_on_every_save() {
        let (mut store, cycle) = store_with_cycle();
        let mut saved = store.insert_bug(cycle, &bug("Crash on save", None)).unwrap();
        assert!(saved.id > 0);

        let column = |store: &Store, id: i64| -> String {
            store
                .conn
                .query_row(
                    "SELECT integration_status FROM bugs WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .unwrap()
        };
        assert_eq!(column(&store, saved.id), "Not Integrated");

        saved.external_tracker_id = Some("JIRA-1".to_string());
        store.update_bug(cycle, &saved).unwrap();
        assert_eq!(column(&store, saved.id), "Integrated");

        let loaded = store.get_bug(cycle, saved.id).unwrap().unwrap();
        assert_eq!(loaded.integration_status(), IntegrationStatus::Integrated);

        saved.external_tracker_id = Some(" ".to_string());
        store.update_bug(cycle, &saved).unwrap();
        assert_eq!(column(&store, saved.id), "Not Integrated");
        let loaded = store.get_bug(cycle, saved.id).unwrap().unwrap();
        assert_eq!(loaded.external_tracker_id, None);
    }

    #[test]
    fn test_inserted_bug_matches_stored_row() {
        let (mut store, cycle) = store_with_cycle();
        for tracker in [Some(" "), Some(""), Some("JIRA-7"), None] {
            let saved = store.insert_bug(cycle, &bug("Blank tracker", tracker)).unwrap();
            let loaded = store.get_bug(cycle, saved.id).unwrap().unwrap();
            assert_eq!(saved, loaded, "tracker {tracker:?}");
        }
    }

    #[test]
    fn test_delete_cycle_cascades() {
        let (mut store, cycle) = store_with_cycle();
        store.insert_test_case(cycle, &TestCase::new("CT-001")).unwrap();
        store.insert_bug(cycle, &bug("Typo", None)).unwrap();
        store
            .insert_evidence(cycle, "CT-001", "file:///tmp/x.png", date())
            .unwrap();

        store.delete_cycle(cycle).unwrap();
        assert!(store.list_test_cases(cycle).unwrap().is_empty());
        assert!(store.list_bugs(cycle).unwrap().is_empty());
        assert!(store.list_evidence(cycle).unwrap().is_empty());
        assert!(matches!(
            store.delete_cycle(cycle),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_evidence_round_trip() {
        let (mut store, cycle) = store_with_cycle();
        let ev = store
            .insert_evidence(cycle, "CT-002", "file:///tmp/shot.png", date())
            .unwrap();
        assert_eq!(store.list_evidence(cycle).unwrap(), vec![ev]);
    }
}
