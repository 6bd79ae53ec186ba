#![allow(clippy::missing_errors_doc)]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use devquest_core::{format_rfc3339, now_utc, CompletionOutcome, ProgressRecord};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

const PROGRESS_MIGRATION_VERSION: i64 = 1;

/// Fixed slot key for the single persisted progress record.
pub const SLOT_KEY: &str = "devquest.progress";

const SCHEMA_PROGRESS_V1: &str = r"
CREATE TABLE IF NOT EXISTS progress_slots (
  slot_key TEXT PRIMARY KEY,
  snapshot_json TEXT NOT NULL,
  revision INTEGER NOT NULL CHECK (revision >= 1),
  updated_at TEXT NOT NULL
);
";

/// Where the in-memory record came from at open time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Fresh,
    Loaded,
    DiscardedMalformed,
}

impl SnapshotSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Loaded => "loaded",
            Self::DiscardedMalformed => "discarded_malformed",
        }
    }
}

/// Single-slot snapshot persistence. Every write replaces the whole
/// snapshot and bumps the revision by exactly one; readers of older
/// snapshots keep working because the JSON shape is frozen.
pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to configure sqlite pragmas")?;

        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                );",
            )
            .context("failed to ensure schema_migrations exists")?;

        self.conn
            .execute_batch(SCHEMA_PROGRESS_V1)
            .context("failed to apply progress schema")?;

        let now = format_rfc3339(now_utc()).map_err(|err| anyhow!(err.to_string()))?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
                params![PROGRESS_MIGRATION_VERSION, now],
            )
            .context("failed to register progress schema migration")?;

        Ok(())
    }

    /// Persists the full record under the fixed slot key in one
    /// statement. Returns the new revision.
    pub fn save_record(&mut self, record: &ProgressRecord) -> Result<i64> {
        let payload =
            serde_json::to_string(record).context("failed to serialize progress record")?;
        let now = format_rfc3339(now_utc()).map_err(|err| anyhow!(err.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO progress_slots(slot_key, snapshot_json, revision, updated_at)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(slot_key) DO UPDATE SET
                   snapshot_json = excluded.snapshot_json,
                   revision = progress_slots.revision + 1,
                   updated_at = excluded.updated_at",
                params![SLOT_KEY, payload, now],
            )
            .context("failed to persist progress snapshot")?;

        self.revision()
    }

    /// The raw persisted snapshot, if any. Parsing is left to the caller
    /// so a malformed snapshot can fall back to defaults instead of
    /// failing the load.
    pub fn load_snapshot(&self) -> Result<Option<String>> {
        let row = self
            .conn
            .query_row(
                "SELECT snapshot_json FROM progress_slots WHERE slot_key = ?1",
                params![SLOT_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("failed to read progress snapshot")?;

        Ok(row)
    }

    /// Current slot revision; 0 when nothing has been persisted yet.
    pub fn revision(&self) -> Result<i64> {
        let row = self
            .conn
            .query_row(
                "SELECT revision FROM progress_slots WHERE slot_key = ?1",
                params![SLOT_KEY],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("failed to read slot revision")?;

        Ok(row.unwrap_or(0))
    }

    /// Writes an arbitrary payload into the slot. Test seeding helper
    /// for exercising the malformed-snapshot fallback.
    pub fn write_raw_snapshot(&mut self, raw: &str) -> Result<()> {
        let now = format_rfc3339(now_utc()).map_err(|err| anyhow!(err.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO progress_slots(slot_key, snapshot_json, revision, updated_at)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(slot_key) DO UPDATE SET
                   snapshot_json = excluded.snapshot_json,
                   revision = progress_slots.revision + 1,
                   updated_at = excluded.updated_at",
                params![SLOT_KEY, raw, now],
            )
            .context("failed to write raw snapshot")?;
        Ok(())
    }
}

/// The owning component for the progress record. One long-lived instance
/// is handed to callers by reference; views observe state through
/// [`ProgressLedger::record`] (pull model) and every mutation issues a
/// single persist before the in-memory copy is updated, so the two never
/// diverge.
pub struct ProgressLedger {
    store: SqliteProgressStore,
    record: ProgressRecord,
    source: SnapshotSource,
}

impl ProgressLedger {
    /// Opens the database, runs migrations, and rehydrates the record.
    /// A missing slot starts from defaults; a malformed slot is
    /// discarded in favor of defaults and reported through
    /// [`ProgressLedger::snapshot_source`] rather than failing the load.
    pub fn open(path: &Path) -> Result<Self> {
        let store = SqliteProgressStore::open(path)?;
        store.migrate()?;
        Self::from_store(store)
    }

    pub fn from_store(store: SqliteProgressStore) -> Result<Self> {
        let (record, source) = match store.load_snapshot()? {
            None => (ProgressRecord::default(), SnapshotSource::Fresh),
            Some(raw) => match serde_json::from_str::<ProgressRecord>(&raw) {
                Ok(record) => (record, SnapshotSource::Loaded),
                Err(_) => (
                    ProgressRecord::default(),
                    SnapshotSource::DiscardedMalformed,
                ),
            },
        };

        Ok(Self {
            store,
            record,
            source,
        })
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub fn snapshot_source(&self) -> SnapshotSource {
        self.source
    }

    pub fn revision(&self) -> Result<i64> {
        self.store.revision()
    }

    /// Adds XP and persists. A zero amount still persists.
    pub fn grant_xp(&mut self, amount: u64) -> Result<()> {
        let mut next = self.record.clone();
        next.grant_xp(amount);
        self.persist(next)
    }

    /// Completes a lesson: the ID append and the XP grant land in one
    /// atomic persist.
    pub fn complete_lesson(&mut self, id: &str, xp_reward: u64) -> Result<CompletionOutcome> {
        let mut next = self.record.clone();
        let outcome = next.complete_lesson(id, xp_reward);
        if outcome.is_applied() {
            self.persist(next)?;
        }
        Ok(outcome)
    }

    pub fn complete_quiz(&mut self, id: &str, xp_reward: u64) -> Result<CompletionOutcome> {
        let mut next = self.record.clone();
        let outcome = next.complete_quiz(id, xp_reward);
        if outcome.is_applied() {
            self.persist(next)?;
        }
        Ok(outcome)
    }

    pub fn complete_stage(&mut self, id: &str, xp_reward: u64) -> Result<CompletionOutcome> {
        let mut next = self.record.clone();
        let outcome = next.complete_stage(id, xp_reward);
        if outcome.is_applied() {
            self.persist(next)?;
        }
        Ok(outcome)
    }

    pub fn award_badge(&mut self, label: &str) -> Result<CompletionOutcome> {
        let mut next = self.record.clone();
        let outcome = next.award_badge(label);
        if outcome.is_applied() {
            self.persist(next)?;
        }
        Ok(outcome)
    }

    /// Pretty-printed copy of the current record. Pure read; parsing it
    /// back yields a record equal to the in-memory one.
    pub fn export_snapshot(&self) -> Result<String> {
        Ok(self.record.to_pretty_json()?)
    }

    fn persist(&mut self, next: ProgressRecord) -> Result<()> {
        self.store.save_record(&next)?;
        self.record = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devquest_core::catalog;
    use proptest::prelude::*;
    use ulid::Ulid;

    fn must<T>(result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("test failure: {err}"),
        }
    }

    fn memory_ledger() -> ProgressLedger {
        must(ProgressLedger::open(Path::new(":memory:")))
    }

    fn temp_db_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("devquest-store-{}.sqlite3", Ulid::new()))
    }

    #[test]
    fn fresh_open_starts_from_defaults_without_persisting() {
        let ledger = memory_ledger();
        assert_eq!(ledger.snapshot_source(), SnapshotSource::Fresh);
        assert_eq!(ledger.record(), &ProgressRecord::default());
        assert_eq!(must(ledger.revision()), 0);
    }

    #[test]
    fn completion_persists_exactly_once() {
        let mut ledger = memory_ledger();
        let outcome = must(ledger.complete_lesson("html-basics", 50));
        assert!(outcome.is_applied());
        assert_eq!(must(ledger.revision()), 1);
        assert_eq!(ledger.record().xp, 50);
        assert_eq!(ledger.record().level, 1);

        // Repeat completion neither persists nor grants.
        let outcome = must(ledger.complete_lesson("html-basics", 75));
        assert_eq!(outcome, CompletionOutcome::AlreadyComplete);
        assert_eq!(must(ledger.revision()), 1);
        assert_eq!(ledger.record().xp, 50);
    }

    #[test]
    fn zero_xp_grant_still_persists() {
        let mut ledger = memory_ledger();
        must(ledger.grant_xp(0));
        assert_eq!(must(ledger.revision()), 1);
        must(ledger.grant_xp(60));
        assert_eq!(must(ledger.revision()), 2);
        assert_eq!(ledger.record().xp, 60);
    }

    #[test]
    fn lesson_then_grant_reaches_level_two() {
        let mut ledger = memory_ledger();
        must(ledger.complete_lesson("html-basics", 50));
        assert_eq!(ledger.record().xp, 50);
        assert_eq!(ledger.record().level, 1);
        assert_eq!(
            ledger.record().completed_lessons,
            vec!["html-basics".to_string()]
        );

        must(ledger.grant_xp(60));
        assert_eq!(ledger.record().xp, 110);
        assert_eq!(ledger.record().level, 2);
    }

    #[test]
    fn reopen_rehydrates_the_last_persisted_record() {
        let path = temp_db_path();

        {
            let mut ledger = must(ProgressLedger::open(&path));
            must(ledger.complete_lesson("html-basics", 50));
            must(ledger.complete_quiz(catalog::QUIZ_ID, 80));
            must(ledger.award_badge("early-bird"));
        }

        let reopened = must(ProgressLedger::open(&path));
        assert_eq!(reopened.snapshot_source(), SnapshotSource::Loaded);
        assert_eq!(reopened.record().xp, 130);
        assert_eq!(reopened.record().level, 2);
        assert_eq!(
            reopened.record().completed_quizzes,
            vec![catalog::QUIZ_ID.to_string()]
        );
        assert_eq!(reopened.record().badges, vec!["early-bird".to_string()]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_snapshot_falls_back_to_defaults() {
        let path = temp_db_path();

        {
            let mut store = must(SqliteProgressStore::open(&path));
            must(store.migrate());
            must(store.write_raw_snapshot("{not json"));
        }

        let mut ledger = must(ProgressLedger::open(&path));
        assert_eq!(
            ledger.snapshot_source(),
            SnapshotSource::DiscardedMalformed
        );
        assert_eq!(ledger.record(), &ProgressRecord::default());

        // The next mutation replaces the bad slot with a valid snapshot.
        must(ledger.grant_xp(10));
        let reopened = must(ProgressLedger::open(&path));
        assert_eq!(reopened.snapshot_source(), SnapshotSource::Loaded);
        assert_eq!(reopened.record().xp, 10);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn export_round_trips_to_an_equal_record() {
        let mut ledger = memory_ledger();
        must(ledger.complete_stage("stage1", 100));
        must(ledger.grant_xp(42));

        let exported = must(ledger.export_snapshot());
        let parsed: ProgressRecord = match serde_json::from_str(&exported) {
            Ok(value) => value,
            Err(err) => panic!("export did not round-trip: {err}"),
        };
        assert_eq!(&parsed, ledger.record());
    }

    #[test]
    fn persisted_snapshot_matches_the_in_memory_record() {
        let mut ledger = memory_ledger();
        must(ledger.complete_lesson("css-basics", 60));

        let raw = match must(ledger.store.load_snapshot()) {
            Some(value) => value,
            None => panic!("expected a persisted snapshot"),
        };
        let persisted: ProgressRecord = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => panic!("persisted snapshot is not valid JSON: {err}"),
        };
        assert_eq!(&persisted, ledger.record());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Grant(u64),
        Lesson(usize),
        Quiz(usize),
        Stage(usize),
        Badge(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..250).prop_map(Op::Grant),
            (0usize..catalog::lessons().len()).prop_map(Op::Lesson),
            (0usize..3).prop_map(Op::Quiz),
            (0usize..catalog::stages().len()).prop_map(Op::Stage),
            (0usize..3).prop_map(Op::Badge),
        ]
    }

    proptest! {
        #[test]
        fn any_mutation_sequence_keeps_the_ledger_consistent(
            ops in proptest::collection::vec(op_strategy(), 0..40)
        ) {
            let mut ledger = memory_ledger();

            for op in ops {
                match op {
                    Op::Grant(amount) => prop_assert!(ledger.grant_xp(amount).is_ok()),
                    Op::Lesson(index) => {
                        let id = catalog::lessons()[index].id;
                        let reward = catalog::lessons()[index].xp_reward;
                        prop_assert!(ledger.complete_lesson(id, reward).is_ok());
                    }
                    Op::Quiz(index) => {
                        let id = format!("quiz-{index}");
                        prop_assert!(ledger.complete_quiz(&id, 40).is_ok());
                    }
                    Op::Stage(index) => {
                        let id = catalog::stages()[index].id;
                        let reward = catalog::stages()[index].xp_reward;
                        prop_assert!(ledger.complete_stage(id, reward).is_ok());
                    }
                    Op::Badge(index) => {
                        let label = format!("badge-{index}");
                        prop_assert!(ledger.award_badge(&label).is_ok());
                    }
                }

                prop_assert_eq!(ledger.record().level, ledger.record().xp / 100 + 1);
                prop_assert!(ledger.record().validate().is_ok());
            }

            if must(ledger.revision()) > 0 {
                let raw = match must(ledger.store.load_snapshot()) {
                    Some(value) => value,
                    None => panic!("revision advanced without a snapshot"),
                };
                let persisted: ProgressRecord = match serde_json::from_str(&raw) {
                    Ok(value) => value,
                    Err(err) => panic!("persisted snapshot is not valid JSON: {err}"),
                };
                prop_assert_eq!(&persisted, ledger.record());
            }
        }
    }
}
