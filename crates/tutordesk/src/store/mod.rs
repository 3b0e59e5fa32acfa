/// Record store for meeting, transaction, assignment, and availability data

mod types;

pub use types::{AssignmentRecord, MeetingRecord, StudentAvailability, TransactionRecord};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Mutex;
use thiserror::Error;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_store.sql");

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to encode record field: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Long-lived handle to the record store.
///
/// Constructed once at startup and injected into every caller; all writes
/// are single-item atomic, so no locking beyond the connection mutex is
/// needed.
pub struct RecordStore {
    db: Mutex<Connection>,
}

impl RecordStore {
    /// Opens (or creates) the store at `db_path` and applies the schema.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(db_path)?)
    }

    /// Opens a private in-memory store. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    // --- meetings ---

    /// Inserts a meeting record. Records are created once at scheduling
    /// time; a replay of the same provider id overwrites the prior row.
    pub fn put_meeting(&self, meeting: &MeetingRecord) -> Result<(), StoreError> {
        let participants = serde_json::to_string(&meeting.participants)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR REPLACE INTO meetings (
                meeting_id, title, description, start_time, duration_minutes,
                owner, participants, join_url, password, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                meeting.meeting_id,
                meeting.title,
                meeting.description,
                meeting.start_time,
                meeting.duration_minutes,
                meeting.owner,
                participants,
                meeting.join_url,
                meeting.password,
                meeting.is_active,
            ],
        )?;
        Ok(())
    }

    /// Fetches a single meeting by provider id.
    pub fn get_meeting(&self, meeting_id: &str) -> Result<Option<MeetingRecord>, StoreError> {
        let db = self.db.lock().unwrap();
        let meeting = db
            .query_row(
                &format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE meeting_id = ?"),
                [meeting_id],
                meeting_from_row,
            )
            .optional()?;
        Ok(meeting)
    }

    /// Returns every meeting record.
    pub fn scan_meetings(&self) -> Result<Vec<MeetingRecord>, StoreError> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!("SELECT {MEETING_COLUMNS} FROM meetings"))?;
        let meetings = stmt
            .query_map((), meeting_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(meetings)
    }

    /// Returns every meeting owned by `owner`.
    pub fn scan_meetings_by_owner(&self, owner: &str) -> Result<Vec<MeetingRecord>, StoreError> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare(&format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE owner = ?"))?;
        let meetings = stmt
            .query_map([owner], meeting_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(meetings)
    }

    /// Deletes a meeting record. Returns false if no such record existed.
    pub fn delete_meeting(&self, meeting_id: &str) -> Result<bool, StoreError> {
        let db = self.db.lock().unwrap();
        let affected = db.execute("DELETE FROM meetings WHERE meeting_id = ?", [meeting_id])?;
        Ok(affected > 0)
    }

    /// Reassigns ownership of a meeting. This is the only permitted mutation
    /// of a stored meeting record. Returns the updated record, or None if
    /// the meeting does not exist.
    pub fn reassign_owner(
        &self,
        meeting_id: &str,
        new_owner: &str,
    ) -> Result<Option<MeetingRecord>, StoreError> {
        {
            let db = self.db.lock().unwrap();
            let affected = db.execute(
                "UPDATE meetings SET owner = ?1 WHERE meeting_id = ?2",
                params![new_owner, meeting_id],
            )?;
            if affected == 0 {
                return Ok(None);
            }
        }
        self.get_meeting(meeting_id)
    }

    // --- transactions ---

    /// Appends a transaction record. Transactions are never updated or
    /// deleted.
    pub fn put_transaction(&self, tx: &TransactionRecord) -> Result<(), StoreError> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO transactions (transaction_id, student_id, amount, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![tx.transaction_id, tx.student_id, tx.amount, tx.created_at],
        )?;
        Ok(())
    }

    /// Returns all transactions recorded for a student.
    pub fn scan_transactions_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT transaction_id, student_id, amount, created_at
             FROM transactions WHERE student_id = ?",
        )?;
        let transactions = stmt
            .query_map([student_id], |row| {
                Ok(TransactionRecord {
                    transaction_id: row.get(0)?,
                    student_id: row.get(1)?,
                    amount: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(transactions)
    }

    // --- assignments ---

    /// Appends an assignment record.
    pub fn put_assignment(&self, assignment: &AssignmentRecord) -> Result<(), StoreError> {
        let questions = serde_json::to_string(&assignment.questions)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO assignments (assignment_id, teacher_id, questions, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                assignment.assignment_id,
                assignment.teacher_id,
                questions,
                assignment.created_at,
            ],
        )?;
        Ok(())
    }

    // --- student availability ---

    /// Upserts a student's availability flag and returns the stored row.
    pub fn set_student_availability(
        &self,
        student_id: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<StudentAvailability, StoreError> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO student_availability (student_id, status, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(student_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at",
            params![student_id, status, now],
        )?;
        let updated = db.query_row(
            "SELECT student_id, status, updated_at FROM student_availability WHERE student_id = ?",
            [student_id],
            |row| {
                Ok(StudentAvailability {
                    student_id: row.get(0)?,
                    status: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        )?;
        Ok(updated)
    }

    /// Counts students known to the availability collection.
    pub fn count_students(&self) -> Result<i64, StoreError> {
        let db = self.db.lock().unwrap();
        let count: i64 =
            db.query_row("SELECT COUNT(*) FROM student_availability", (), |row| row.get(0))?;
        Ok(count)
    }
}

const MEETING_COLUMNS: &str = "meeting_id, title, description, start_time, duration_minutes, \
     owner, participants, join_url, password, is_active";

/// Maps a meetings row, tolerating partially-written records: optional
/// text fields fall back to empty, a missing duration stays None so the
/// status engine can apply its default.
fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<MeetingRecord> {
    let participants: Option<String> = row.get(6)?;
    let participants = participants
        .map(|raw| serde_json::from_str(&raw).unwrap_or_default())
        .unwrap_or_default();

    Ok(MeetingRecord {
        meeting_id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        start_time: row.get(3)?,
        duration_minutes: row.get(4)?,
        owner: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        participants,
        join_url: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        password: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        is_active: row.get::<_, Option<bool>>(9)?.unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_meeting(id: &str, owner: &str) -> MeetingRecord {
        MeetingRecord {
            meeting_id: id.to_string(),
            title: "Algebra review".to_string(),
            description: "Weekly session".to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            duration_minutes: Some(45),
            owner: owner.to_string(),
            participants: vec!["s1".to_string(), "s2".to_string()],
            join_url: "https://meet.example/j/1".to_string(),
            password: "pw".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_meeting_roundtrip() {
        let store = RecordStore::open_in_memory().unwrap();
        let meeting = sample_meeting("m1", "t1");
        store.put_meeting(&meeting).unwrap();

        let fetched = store.get_meeting("m1").unwrap().unwrap();
        assert_eq!(fetched.title, "Algebra review");
        assert_eq!(fetched.start_time, meeting.start_time);
        assert_eq!(fetched.duration_minutes, Some(45));
        assert_eq!(fetched.participants, vec!["s1", "s2"]);
        assert!(fetched.is_active);
    }

    #[test]
    fn test_missing_duration_stays_none() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut meeting = sample_meeting("m1", "t1");
        meeting.duration_minutes = None;
        store.put_meeting(&meeting).unwrap();

        let fetched = store.get_meeting("m1").unwrap().unwrap();
        assert_eq!(fetched.duration_minutes, None);
    }

    #[test]
    fn test_scan_by_owner() {
        let store = RecordStore::open_in_memory().unwrap();
        store.put_meeting(&sample_meeting("m1", "alice")).unwrap();
        store.put_meeting(&sample_meeting("m2", "bob")).unwrap();
        store.put_meeting(&sample_meeting("m3", "alice")).unwrap();

        let alices = store.scan_meetings_by_owner("alice").unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|m| m.owner == "alice"));
        assert_eq!(store.scan_meetings().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_meeting() {
        let store = RecordStore::open_in_memory().unwrap();
        store.put_meeting(&sample_meeting("m1", "t1")).unwrap();

        assert!(store.delete_meeting("m1").unwrap());
        assert!(!store.delete_meeting("m1").unwrap());
        assert!(store.get_meeting("m1").unwrap().is_none());
    }

    #[test]
    fn test_reassign_owner() {
        let store = RecordStore::open_in_memory().unwrap();
        store.put_meeting(&sample_meeting("m1", "alice")).unwrap();

        let updated = store.reassign_owner("m1", "bob").unwrap().unwrap();
        assert_eq!(updated.owner, "bob");
        // Everything else is untouched.
        assert_eq!(updated.title, "Algebra review");

        assert!(store.reassign_owner("missing", "bob").unwrap().is_none());
    }

    #[test]
    fn test_transactions_scan_per_student() {
        let store = RecordStore::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (id, student) in [("tx1", "s1"), ("tx2", "s2"), ("tx3", "s1")] {
            store
                .put_transaction(&TransactionRecord {
                    transaction_id: id.to_string(),
                    student_id: student.to_string(),
                    amount: 5000,
                    created_at: now,
                })
                .unwrap();
        }

        let s1 = store.scan_transactions_for_student("s1").unwrap();
        assert_eq!(s1.len(), 2);
        assert!(s1.iter().all(|t| t.student_id == "s1"));
    }

    #[test]
    fn test_availability_upsert_returns_updated_row() {
        let store = RecordStore::open_in_memory().unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

        let first = store.set_student_availability("s1", "booked", t0).unwrap();
        assert_eq!(first.status, "booked");

        let second = store.set_student_availability("s1", "available", t1).unwrap();
        assert_eq!(second.status, "available");
        assert_eq!(second.updated_at, t1);

        assert_eq!(store.count_students().unwrap(), 1);
    }
}
