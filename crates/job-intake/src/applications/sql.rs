use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{AnyConnection, Connection};
use tracing::{debug, warn};

use super::domain::{ApplicationRecord, StoredApplication};
use super::repository::{ApplicationStore, PersistenceError};
use crate::config::DatabaseConfig;

const INSERT_APPLICATION: &str = r#"
    INSERT INTO job_applications (
        first_name, last_name, email, date_of_birth,
        education_degree, experience_years,
        current_organization, current_ctc,
        expected_ctc, notice_period,
        resume_payload, submitted_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SQLITE_LAST_ROW_ID: &str = "SELECT last_insert_rowid()";

/// `submitted_at` is bound as text so MySQL `DATETIME(6)` and SQLite columns read it alike.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// SQL-backed store over the `job_applications` table.
///
/// The backend (MySQL or SQLite) is chosen by the URL scheme. Each call opens its own
/// connection and closes it before returning; nothing is pooled.
pub struct SqlApplicationStore {
    url: String,
    sqlite: bool,
}

/// Outcome of a successful insert, read before the connection is closed.
struct Inserted {
    rows: u64,
    id: Option<i64>,
}

impl SqlApplicationStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        sqlx::any::install_default_drivers();
        Self {
            url: config.url.expose().to_string(),
            sqlite: config.backend().eq_ignore_ascii_case("sqlite"),
        }
    }

    async fn insert(
        &self,
        conn: &mut AnyConnection,
        record: &ApplicationRecord,
        submitted_at: DateTime<Utc>,
    ) -> Result<Inserted, sqlx::Error> {
        let result = sqlx::query(INSERT_APPLICATION)
            .bind(record.first_name.as_str())
            .bind(record.last_name.as_str())
            .bind(record.email.as_str())
            .bind(record.date_of_birth.format("%Y-%m-%d").to_string())
            .bind(record.education_degree.as_str())
            .bind(i64::from(record.experience_years))
            .bind(record.current_organization.as_deref())
            .bind(record.current_ctc.as_deref())
            .bind(record.expected_ctc.as_deref())
            .bind(record.notice_period.as_deref())
            .bind(record.resume_payload.as_bytes())
            .bind(submitted_at.format(TIMESTAMP_FORMAT).to_string())
            .execute(&mut *conn)
            .await?;

        let id = match result.last_insert_id() {
            Some(id) => Some(id),
            // The `Any` driver only forwards MySQL's insert id; SQLite is asked on the same
            // connection.
            None if self.sqlite => self.sqlite_row_id(conn).await,
            None => None,
        };

        Ok(Inserted {
            rows: result.rows_affected(),
            id,
        })
    }

    async fn sqlite_row_id(&self, conn: &mut AnyConnection) -> Option<i64> {
        match sqlx::query_as::<_, (i64,)>(SQLITE_LAST_ROW_ID)
            .fetch_one(conn)
            .await
        {
            Ok((id,)) => Some(id),
            Err(err) => {
                warn!(error = %describe(&err), "row stored but its id could not be read");
                None
            }
        }
    }
}

#[async_trait]
impl ApplicationStore for SqlApplicationStore {
    async fn persist(
        &self,
        record: &ApplicationRecord,
    ) -> Result<StoredApplication, PersistenceError> {
        let mut conn = AnyConnection::connect(&self.url)
            .await
            .map_err(|err| PersistenceError::Unavailable(describe(&err)))?;

        let submitted_at = Utc::now();
        let inserted = self.insert(&mut conn, record, submitted_at).await;

        // The connection is dropped on every path; an explicit close just lets the
        // server see a clean shutdown.
        if let Err(err) = conn.close().await {
            warn!(error = %describe(&err), "closing application store connection failed");
        }

        let inserted = inserted.map_err(classify)?;
        debug!(
            rows = inserted.rows,
            resume_bytes = record.resume_payload.len(),
            "application row inserted"
        );

        Ok(StoredApplication {
            id: inserted.id,
            submitted_at,
        })
    }
}

fn classify(err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::Database(db) => PersistenceError::Rejected(db.message().to_string()),
        other => PersistenceError::Unavailable(describe(&other)),
    }
}

/// Short description that never embeds the connection URL.
fn describe(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Configuration(_) => "invalid database configuration".to_string(),
        sqlx::Error::Io(io) => format!("io error: {io}"),
        sqlx::Error::Tls(_) => "tls negotiation failed".to_string(),
        sqlx::Error::Database(db) => db.message().to_string(),
        sqlx::Error::PoolTimedOut => "timed out waiting for a connection".to_string(),
        other => other.to_string(),
    }
}
