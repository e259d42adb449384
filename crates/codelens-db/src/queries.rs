use crate::Database;
use crate::models::{ReviewRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension};

/// Outcome of inserting a user. Username collisions are reported before
/// email collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    Created(i64),
    UsernameTaken,
    EmailTaken,
}

/// Fields of a review row that the caller supplies; id and timestamp are
/// assigned by SQLite.
#[derive(Debug, Clone)]
pub struct NewReview<'a> {
    pub title: &'a str,
    pub code: &'a str,
    pub language: &'a str,
    pub review_result: &'a str,
    pub user_id: i64,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";
const REVIEW_COLUMNS: &str = "id, title, code, language, review_result, user_id, created_at";

impl Database {
    // -- Users --

    pub fn insert_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserInsert> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if let Some(taken) = classify_duplicate(&tx, username, email)? {
                return Ok(taken);
            }

            let inserted = tx.execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            );

            match inserted {
                Ok(_) => {
                    let id = tx.last_insert_rowid();
                    tx.commit()?;
                    Ok(UserInsert::Created(id))
                }
                Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                    // Another process on the same file got there first.
                    Ok(classify_duplicate(&tx, username, email)?.unwrap_or(UserInsert::UsernameTaken))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    // -- Code reviews --

    pub fn insert_review(&self, review: &NewReview<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO code_reviews (title, code, language, review_result, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    review.title,
                    review.code,
                    review.language,
                    review.review_result,
                    review.user_id
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Reviews owned by `user_id`, newest first. Rows sharing a timestamp
    /// come back in reverse insertion order.
    pub fn list_reviews_by_owner(&self, user_id: i64, limit: Option<u32>) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            // SQLite treats a negative LIMIT as "no limit".
            let limit = limit.map(i64::from).unwrap_or(-1);
            let sql = format!(
                "SELECT {REVIEW_COLUMNS} FROM code_reviews
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], map_review)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Fetch a review only if `user_id` owns it.
    pub fn get_review(&self, id: i64, user_id: i64) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {REVIEW_COLUMNS} FROM code_reviews WHERE id = ?1 AND user_id = ?2");
            let row = conn
                .query_row(&sql, rusqlite::params![id, user_id], map_review)
                .optional()?;
            Ok(row)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, user_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id) VALUES (?1, ?2)",
                rusqlite::params![id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn session_exists(&self, id: &str, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM sessions WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![id, user_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Returns whether a session was removed.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn classify_duplicate(conn: &Connection, username: &str, email: &str) -> Result<Option<UserInsert>> {
    if query_user(conn, "username", username)?.is_some() {
        return Ok(Some(UserInsert::UsernameTaken));
    }
    if query_user(conn, "email", email)?.is_some() {
        return Ok(Some(UserInsert::EmailTaken));
    }
    Ok(None)
}

/// `column` is always one of the fixed names used above, never user input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn map_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        title: row.get(1)?,
        code: row.get(2)?,
        language: row.get(3)?,
        review_result: row.get(4)?,
        user_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(db: &Database, name: &str) -> i64 {
        match db.insert_user(name, &format!("{name}@example.com"), "hash").unwrap() {
            UserInsert::Created(id) => id,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn review(db: &Database, owner: i64, title: &str) -> i64 {
        db.insert_review(&NewReview {
            title,
            code: "print('hi')",
            language: "python",
            review_result: "{}",
            user_id: owner,
        })
        .unwrap()
    }

    #[test]
    fn duplicate_username_is_reported_first() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "alice");

        let again = db.insert_user("alice", "alice@example.com", "hash").unwrap();
        assert_eq!(again, UserInsert::UsernameTaken);
    }

    #[test]
    fn duplicate_email_is_reported() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "alice");

        let again = db.insert_user("alicia", "alice@example.com", "hash").unwrap();
        assert_eq!(again, UserInsert::EmailTaken);
    }

    #[test]
    fn users_are_found_by_each_key() {
        let db = Database::open_in_memory().unwrap();
        let id = user(&db, "bob");

        assert_eq!(db.get_user_by_username("bob").unwrap().unwrap().id, id);
        assert_eq!(db.get_user_by_email("bob@example.com").unwrap().unwrap().id, id);
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn reviews_are_listed_newest_first_per_owner() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");

        let first = review(&db, alice, "first");
        review(&db, bob, "bob's");
        let second = review(&db, alice, "second");

        let ids: Vec<i64> = db
            .list_reviews_by_owner(alice, None)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second, first]);

        let limited = db.list_reviews_by_owner(alice, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second);
    }

    #[test]
    fn review_lookup_applies_owner_filter() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let id = review(&db, alice, "mine");

        assert!(db.get_review(id, alice).unwrap().is_some());
        assert!(db.get_review(id, bob).unwrap().is_none());
        assert!(db.get_review(id + 100, alice).unwrap().is_none());
    }

    #[test]
    fn sessions_are_scoped_to_user_and_deletable() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");

        db.create_session("s-1", alice).unwrap();
        assert!(db.session_exists("s-1", alice).unwrap());
        assert!(!db.session_exists("s-1", bob).unwrap());

        assert!(db.delete_session("s-1").unwrap());
        assert!(!db.session_exists("s-1", alice).unwrap());
        assert!(!db.delete_session("s-1").unwrap());
    }
}
