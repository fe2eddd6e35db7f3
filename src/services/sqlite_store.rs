//! SQLite persistence layer for members, signals, read receipts and the
//! audit trail.
//!
//! Timestamps are stored as epoch milliseconds. Prices are stored as the
//! exact text the admin entered; take profits and audit metadata are JSON.

use crate::types::{
    utc_now_ms, AuditLog, FeedSignal, NewAuditLog, RiskTag, Signal, SignalDirection, SignalRead,
    TakeProfitLevel, UpsertUser, User, UserRole,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const SIGNAL_COLUMNS: &str = "s.id, s.side, s.instrument, s.entry, s.stop_loss, s.take_profits_json,
     s.risk_tag, s.trading_view_link, s.notes, s.created_by, s.created_at, s.sent_at";

const USER_COLUMNS: &str = "id, whop_user_id, name, email, role, product_id, membership_id,
     active, created_at, updated_at";

/// SQLite store for all persistent application data.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing and ephemeral runs).
    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.lock();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                whop_user_id TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                email TEXT,
                role TEXT NOT NULL,
                product_id TEXT,
                membership_id TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS signals (
                id TEXT PRIMARY KEY,
                side TEXT NOT NULL,
                instrument TEXT NOT NULL,
                entry TEXT NOT NULL,
                stop_loss TEXT NOT NULL,
                take_profits_json TEXT NOT NULL DEFAULT '[]',
                risk_tag TEXT,
                trading_view_link TEXT,
                notes TEXT,
                created_by TEXT NOT NULL REFERENCES users(id),
                created_at INTEGER NOT NULL,
                sent_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_signals_created_at ON signals(created_at DESC);

            CREATE TABLE IF NOT EXISTS signal_reads (
                id TEXT PRIMARY KEY,
                signal_id TEXT NOT NULL REFERENCES signals(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                read_at INTEGER NOT NULL,
                UNIQUE(signal_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_signal_reads_user ON signal_reads(user_id);

            CREATE TABLE IF NOT EXISTS audit_logs (
                id TEXT PRIMARY KEY,
                action TEXT NOT NULL,
                user_id TEXT,
                resource_type TEXT,
                resource_id TEXT,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_logs_created_at ON audit_logs(created_at DESC);",
        )?;

        info!("SQLite schema initialized");
        Ok(())
    }

    // ========== User Methods ==========

    /// Get a user by internal id.
    pub fn get_user(&self, id: &str) -> Result<Option<User>, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            row_to_user,
        )
        .optional()
    }

    /// Get a user by platform identity.
    pub fn get_user_by_whop_id(&self, whop_user_id: &str) -> Result<Option<User>, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE whop_user_id = ?1", USER_COLUMNS),
            params![whop_user_id],
            row_to_user,
        )
        .optional()
    }

    /// Insert a member or refresh an existing one. Re-activates the membership.
    pub fn upsert_user(&self, data: UpsertUser) -> Result<User, rusqlite::Error> {
        let existing = self.get_user_by_whop_id(&data.whop_user_id)?;
        let now = utc_now_ms();

        let user = match existing {
            Some(mut user) => {
                user.name = data.name;
                user.email = data.email;
                user.role = data.role;
                user.product_id = data.product_id;
                user.membership_id = data.membership_id;
                user.active = true;
                user.updated_at = now;
                user
            }
            None => User::new(data),
        };

        let conn = self.lock();
        conn.execute(
            "INSERT INTO users (id, whop_user_id, name, email, role, product_id, membership_id,
                                active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(whop_user_id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                role = excluded.role,
                product_id = excluded.product_id,
                membership_id = excluded.membership_id,
                active = excluded.active,
                updated_at = excluded.updated_at",
            params![
                user.id,
                user.whop_user_id,
                user.name,
                user.email,
                user.role.as_str(),
                user.product_id,
                user.membership_id,
                user.active,
                user.created_at.timestamp_millis(),
                user.updated_at.timestamp_millis(),
            ],
        )?;

        debug!("Saved user {} ({})", user.whop_user_id, user.role.as_str());
        Ok(user)
    }

    /// Flip a membership on or off. Returns false when the user is unknown.
    pub fn set_membership_active(
        &self,
        whop_user_id: &str,
        active: bool,
    ) -> Result<bool, rusqlite::Error> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE users SET active = ?1, updated_at = ?2 WHERE whop_user_id = ?3",
            params![active, utc_now_ms().timestamp_millis(), whop_user_id],
        )?;
        Ok(changed > 0)
    }

    /// Active members with the subscriber role.
    pub fn active_subscribers(&self) -> Result<Vec<User>, rusqlite::Error> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE role = ?1 AND active = 1 ORDER BY created_at",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map(params![UserRole::Subscriber.as_str()], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    // ========== Signal Methods ==========

    /// Persist a new signal.
    pub fn insert_signal(&self, signal: &Signal) -> Result<(), rusqlite::Error> {
        let conn = self.lock();
        write_signal(&conn, signal)
    }

    /// Persist a signal and its audit entry in one transaction.
    pub fn publish_signal(
        &self,
        signal: &Signal,
        audit: NewAuditLog,
    ) -> Result<AuditLog, rusqlite::Error> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        write_signal(&tx, signal)?;
        let entry = write_audit_log(&tx, audit)?;
        tx.commit()?;
        Ok(entry)
    }

    /// Get a signal by id.
    pub fn get_signal(&self, id: &str) -> Result<Option<Signal>, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {} FROM signals s WHERE s.id = ?1", SIGNAL_COLUMNS),
            params![id],
            row_to_signal,
        )
        .optional()
    }

    /// Newest-first page of signals with read state for one viewer.
    pub fn list_signals(
        &self,
        viewer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedSignal>, rusqlite::Error> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {},
                    (SELECT COUNT(*) FROM signal_reads r WHERE r.signal_id = s.id),
                    EXISTS(SELECT 1 FROM signal_reads r WHERE r.signal_id = s.id AND r.user_id = ?3)
             FROM signals s
             ORDER BY s.created_at DESC, s.rowid DESC
             LIMIT ?1 OFFSET ?2",
            SIGNAL_COLUMNS
        ))?;

        let signals = stmt
            .query_map(params![limit, offset, viewer_id], |row| {
                Ok(FeedSignal {
                    signal: row_to_signal(row)?,
                    read_count: row.get(12)?,
                    is_read: row.get(13)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(signals)
    }

    /// Total number of posted signals.
    pub fn signal_count(&self) -> Result<i64, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row("SELECT COUNT(*) FROM signals", [], |row| row.get(0))
    }

    /// Stored take-profit lists of every signal, oldest first.
    pub fn all_take_profits(&self) -> Result<Vec<Vec<TakeProfitLevel>>, rusqlite::Error> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT take_profits_json FROM signals ORDER BY created_at")?;
        let lists = stmt
            .query_map([], |row| parse_json_column::<Vec<TakeProfitLevel>>(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    // ========== Read Receipt Methods ==========

    /// Record that a user read a signal. Repeated calls keep the first receipt.
    pub fn mark_signal_read(
        &self,
        signal_id: &str,
        user_id: &str,
    ) -> Result<SignalRead, rusqlite::Error> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO signal_reads (id, signal_id, user_id, read_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(signal_id, user_id) DO NOTHING",
            params![
                Uuid::new_v4().to_string(),
                signal_id,
                user_id,
                utc_now_ms().timestamp_millis(),
            ],
        )?;

        conn.query_row(
            "SELECT id, signal_id, user_id, read_at FROM signal_reads
             WHERE signal_id = ?1 AND user_id = ?2",
            params![signal_id, user_id],
            row_to_read,
        )
    }

    /// Receipts for one signal, most recent first.
    pub fn get_signal_reads(&self, signal_id: &str) -> Result<Vec<SignalRead>, rusqlite::Error> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, signal_id, user_id, read_at FROM signal_reads
             WHERE signal_id = ?1
             ORDER BY read_at DESC, rowid DESC",
        )?;
        let reads = stmt
            .query_map(params![signal_id], row_to_read)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reads)
    }

    /// Number of distinct signals a user has read.
    pub fn user_read_count(&self, user_id: &str) -> Result<i64, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM signal_reads WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
    }

    // ========== Audit Log Methods ==========

    /// Append an audit entry.
    pub fn insert_audit_log(&self, log: NewAuditLog) -> Result<AuditLog, rusqlite::Error> {
        let conn = self.lock();
        write_audit_log(&conn, log)
    }

    /// Most recent audit entries.
    pub fn get_audit_logs(&self, limit: i64) -> Result<Vec<AuditLog>, rusqlite::Error> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, action, user_id, resource_type, resource_id, metadata_json, created_at
             FROM audit_logs
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
        )?;
        let logs = stmt
            .query_map(params![limit], |row| {
                Ok(AuditLog {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    user_id: row.get(2)?,
                    resource_type: row.get(3)?,
                    resource_id: row.get(4)?,
                    metadata: parse_json_column(row, 5)?,
                    created_at: ms_to_datetime(row.get(6)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

fn write_signal(conn: &Connection, signal: &Signal) -> Result<(), rusqlite::Error> {
    let take_profits_json = serde_json::to_string(&signal.take_profits)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO signals (id, side, instrument, entry, stop_loss, take_profits_json,
                              risk_tag, trading_view_link, notes, created_by, created_at, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            signal.id,
            signal.side.as_str(),
            signal.instrument,
            signal.entry,
            signal.stop_loss,
            take_profits_json,
            signal.risk_tag.map(|t| t.as_str()),
            signal.trading_view_link,
            signal.notes,
            signal.created_by,
            signal.created_at.timestamp_millis(),
            signal.sent_at.map(|t| t.timestamp_millis()),
        ],
    )?;

    debug!("Inserted signal {} for {}", signal.id, signal.instrument);
    Ok(())
}

fn write_audit_log(conn: &Connection, log: NewAuditLog) -> Result<AuditLog, rusqlite::Error> {
    let entry = AuditLog {
        id: Uuid::new_v4().to_string(),
        action: log.action,
        user_id: log.user_id,
        resource_type: log.resource_type,
        resource_id: log.resource_id,
        metadata: log.metadata,
        created_at: utc_now_ms(),
    };
    let metadata_json = serde_json::to_string(&entry.metadata)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO audit_logs (id, action, user_id, resource_type, resource_id,
                                 metadata_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id,
            entry.action,
            entry.user_id,
            entry.resource_type,
            entry.resource_id,
            metadata_json,
            entry.created_at.timestamp_millis(),
        ],
    )?;

    debug!("Audit: {} {:?}", entry.action, entry.resource_id);
    Ok(entry)
}

fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> Result<T, rusqlite::Error> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_user(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        whop_user_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: UserRole::from_str(&row.get::<_, String>(4)?),
        product_id: row.get(5)?,
        membership_id: row.get(6)?,
        active: row.get(7)?,
        created_at: ms_to_datetime(row.get(8)?),
        updated_at: ms_to_datetime(row.get(9)?),
    })
}

fn row_to_signal(row: &Row<'_>) -> Result<Signal, rusqlite::Error> {
    let side: String = row.get(1)?;
    let side = SignalDirection::from_str(&side).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown signal side {:?}", side).into(),
        )
    })?;

    Ok(Signal {
        id: row.get(0)?,
        side,
        instrument: row.get(2)?,
        entry: row.get(3)?,
        stop_loss: row.get(4)?,
        take_profits: parse_json_column(row, 5)?,
        risk_tag: row
            .get::<_, Option<String>>(6)?
            .and_then(|t| RiskTag::from_str(&t)),
        trading_view_link: row.get(7)?,
        notes: row.get(8)?,
        created_by: row.get(9)?,
        created_at: ms_to_datetime(row.get(10)?),
        sent_at: row.get::<_, Option<i64>>(11)?.map(ms_to_datetime),
    })
}

fn row_to_read(row: &Row<'_>) -> Result<SignalRead, rusqlite::Error> {
    Ok(SignalRead {
        id: row.get(0)?,
        signal_id: row.get(1)?,
        user_id: row.get(2)?,
        read_at: ms_to_datetime(row.get(3)?),
    })
}
