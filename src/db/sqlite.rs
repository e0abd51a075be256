use crate::db::models::{Habit, User};
use crate::db::schema::SQLITE_INIT;
use crate::error::RitualError;
use chrono::NaiveDate;
use sqlx::{Error as SqlxError, Pool, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

/// Result of a mark-done request. Marking an already-done day is a success
/// signal, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadyMarked,
}

/// Owner-scoped storage over the three habit tables.
///
/// Every habit/log method takes the owning user id and embeds it in the SQL
/// predicate. Ownership is enforced here, once, rather than at call sites.
#[derive(Clone)]
pub struct HabitStore {
    pool: SqlitePool,
}

impl HabitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), RitualError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- users ----

    /// Insert a new user row. The UNIQUE constraint on `username` is the
    /// authority on duplicates; a violation surfaces as `UsernameTaken`.
    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<i64, RitualError> {
        let res = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await;
        match res {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(SqlxError::Database(db)) if db.is_unique_violation() => {
                Err(RitualError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, RitualError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    // ---- habits ----

    pub async fn create_habit(&self, owner_id: i64, name: &str) -> Result<i64, RitualError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RitualError::EmptyHabitName);
        }
        let res = sqlx::query("INSERT INTO habits (user_id, name) VALUES (?, ?)")
            .bind(owner_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn habit_by_id(
        &self,
        owner_id: i64,
        habit_id: i64,
    ) -> Result<Option<Habit>, RitualError> {
        let habit = sqlx::query_as::<_, Habit>(
            "SELECT id, user_id, name FROM habits WHERE id = ? AND user_id = ?",
        )
        .bind(habit_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(habit)
    }

    pub async fn list_habits(&self, owner_id: i64) -> Result<Vec<Habit>, RitualError> {
        let habits = sqlx::query_as::<_, Habit>(
            "SELECT id, user_id, name FROM habits WHERE user_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(habits)
    }

    /// Rename an owned habit. The ownership check is the lookup predicate
    /// itself, so a habit owned by someone else is indistinguishable from a
    /// nonexistent one.
    pub async fn rename_habit(
        &self,
        owner_id: i64,
        habit_id: i64,
        new_name: &str,
    ) -> Result<(), RitualError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(RitualError::EmptyHabitName);
        }
        let res = sqlx::query("UPDATE habits SET name = ? WHERE id = ? AND user_id = ?")
            .bind(new_name)
            .bind(habit_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RitualError::HabitNotFound);
        }
        Ok(())
    }

    /// Delete an owned habit and all of its logs in one transaction.
    ///
    /// Deleting a non-owned or nonexistent habit is a no-op that still
    /// reports success; both deletes are scoped through the owner predicate
    /// so a forged id removes nothing.
    pub async fn delete_habit(&self, owner_id: i64, habit_id: i64) -> Result<(), RitualError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM habit_logs WHERE habit_id IN \
             (SELECT id FROM habits WHERE id = ? AND user_id = ?)",
        )
        .bind(habit_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
            .bind(habit_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ---- daily completion ----

    /// Mark an owned habit done for `date`. Idempotent: the UNIQUE
    /// constraint over `(habit_id, date)` absorbs a concurrent duplicate and
    /// the second caller observes `AlreadyMarked`.
    pub async fn mark_done(
        &self,
        owner_id: i64,
        habit_id: i64,
        date: NaiveDate,
    ) -> Result<MarkOutcome, RitualError> {
        let mut tx = self.pool.begin().await?;
        let owned: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM habits WHERE id = ? AND user_id = ?")
                .bind(habit_id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(RitualError::HabitNotFound);
        }
        let res = sqlx::query(
            "INSERT INTO habit_logs (habit_id, date) VALUES (?, ?) \
             ON CONFLICT(habit_id, date) DO NOTHING",
        )
        .bind(habit_id)
        .bind(date)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if res.rows_affected() == 0 {
            Ok(MarkOutcome::AlreadyMarked)
        } else {
            Ok(MarkOutcome::Marked)
        }
    }

    /// Whether a log row exists for an owned habit on `date`. A non-owned
    /// habit reads as not done.
    pub async fn today_status(
        &self,
        owner_id: i64,
        habit_id: i64,
        date: NaiveDate,
    ) -> Result<bool, RitualError> {
        let done: bool = sqlx::query_scalar(
            "SELECT EXISTS(\
             SELECT 1 FROM habit_logs l \
             JOIN habits h ON h.id = l.habit_id \
             WHERE l.habit_id = ? AND l.date = ? AND h.user_id = ?)",
        )
        .bind(habit_id)
        .bind(date)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(done)
    }

    /// All logged dates for an owned habit, most recent first.
    pub async fn history(
        &self,
        owner_id: i64,
        habit_id: i64,
    ) -> Result<Vec<NaiveDate>, RitualError> {
        if self.habit_by_id(owner_id, habit_id).await?.is_none() {
            return Err(RitualError::HabitNotFound);
        }
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT date FROM habit_logs WHERE habit_id = ? ORDER BY date DESC",
        )
        .bind(habit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn test_store() -> HabitStore {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .unwrap();
        let store = HabitStore::new(pool);
        store.init_schema().await.unwrap();
        store
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = test_store().await;
        store.insert_user("alice", "h1").await.unwrap();
        let err = store.insert_user("alice", "h2").await.unwrap_err();
        assert!(matches!(err, RitualError::UsernameTaken));
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = test_store().await;
        store.insert_user("alice", "h1").await.unwrap();
        store.insert_user("Alice", "h2").await.unwrap();
        assert!(store.user_by_username("alice").await.unwrap().is_some());
        assert!(store.user_by_username("ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_habit_rejects_blank_name() {
        let store = test_store().await;
        let uid = store.insert_user("alice", "h").await.unwrap();
        let err = store.create_habit(uid, "   ").await.unwrap_err();
        assert!(matches!(err, RitualError::EmptyHabitName));
        assert!(store.list_habits(uid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_habit_trims_name() {
        let store = test_store().await;
        let uid = store.insert_user("alice", "h").await.unwrap();
        let hid = store.create_habit(uid, "  Read  ").await.unwrap();
        let habit = store.habit_by_id(uid, hid).await.unwrap().unwrap();
        assert_eq!(habit.name, "Read");
    }

    #[tokio::test]
    async fn rename_is_scoped_to_owner() {
        let store = test_store().await;
        let alice = store.insert_user("alice", "h").await.unwrap();
        let bob = store.insert_user("bob", "h").await.unwrap();
        let hid = store.create_habit(alice, "Read").await.unwrap();

        let err = store.rename_habit(bob, hid, "x").await.unwrap_err();
        assert!(matches!(err, RitualError::HabitNotFound));

        let habit = store.habit_by_id(alice, hid).await.unwrap().unwrap();
        assert_eq!(habit.name, "Read");

        store.rename_habit(alice, hid, "Read more").await.unwrap();
        let habit = store.habit_by_id(alice, hid).await.unwrap().unwrap();
        assert_eq!(habit.name, "Read more");
    }

    #[tokio::test]
    async fn habits_are_invisible_across_users() {
        let store = test_store().await;
        let alice = store.insert_user("alice", "h").await.unwrap();
        let bob = store.insert_user("bob", "h").await.unwrap();
        let hid = store.create_habit(alice, "Read").await.unwrap();

        assert!(store.habit_by_id(bob, hid).await.unwrap().is_none());
        assert!(store.list_habits(bob).await.unwrap().is_empty());
        let err = store.history(bob, hid).await.unwrap_err();
        assert!(matches!(err, RitualError::HabitNotFound));
    }

    #[tokio::test]
    async fn mark_done_is_idempotent() {
        let store = test_store().await;
        let uid = store.insert_user("alice", "h").await.unwrap();
        let hid = store.create_habit(uid, "Read").await.unwrap();
        let d = date("2026-08-06");

        assert_eq!(store.mark_done(uid, hid, d).await.unwrap(), MarkOutcome::Marked);
        assert_eq!(
            store.mark_done(uid, hid, d).await.unwrap(),
            MarkOutcome::AlreadyMarked
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_logs")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(store.today_status(uid, hid, d).await.unwrap());
    }

    #[tokio::test]
    async fn mark_done_rejects_foreign_habit() {
        let store = test_store().await;
        let alice = store.insert_user("alice", "h").await.unwrap();
        let bob = store.insert_user("bob", "h").await.unwrap();
        let hid = store.create_habit(alice, "Read").await.unwrap();

        let err = store.mark_done(bob, hid, date("2026-08-06")).await.unwrap_err();
        assert!(matches!(err, RitualError::HabitNotFound));
        assert!(store.history(alice, hid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_descending_without_duplicates() {
        let store = test_store().await;
        let uid = store.insert_user("alice", "h").await.unwrap();
        let hid = store.create_habit(uid, "Read").await.unwrap();

        for d in ["2026-08-02", "2026-08-01", "2026-08-04", "2026-08-02"] {
            let _ = store.mark_done(uid, hid, date(d)).await.unwrap();
        }

        let dates = store.history(uid, hid).await.unwrap();
        assert_eq!(
            dates,
            vec![date("2026-08-04"), date("2026-08-02"), date("2026-08-01")]
        );
    }

    #[tokio::test]
    async fn delete_cascades_logs() {
        let store = test_store().await;
        let uid = store.insert_user("alice", "h").await.unwrap();
        let hid = store.create_habit(uid, "Read").await.unwrap();
        store.mark_done(uid, hid, date("2026-08-05")).await.unwrap();
        store.mark_done(uid, hid, date("2026-08-06")).await.unwrap();

        store.delete_habit(uid, hid).await.unwrap();

        assert!(store.habit_by_id(uid, hid).await.unwrap().is_none());
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM habit_logs")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn delete_of_foreign_habit_is_silent_noop() {
        let store = test_store().await;
        let alice = store.insert_user("alice", "h").await.unwrap();
        let bob = store.insert_user("bob", "h").await.unwrap();
        let hid = store.create_habit(alice, "Read").await.unwrap();

        store.delete_habit(bob, hid).await.unwrap();
        assert!(store.habit_by_id(alice, hid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn today_status_false_for_unmarked_day() {
        let store = test_store().await;
        let uid = store.insert_user("alice", "h").await.unwrap();
        let hid = store.create_habit(uid, "Read").await.unwrap();
        store.mark_done(uid, hid, date("2026-08-05")).await.unwrap();
        assert!(!store.today_status(uid, hid, date("2026-08-06")).await.unwrap());
    }
}
