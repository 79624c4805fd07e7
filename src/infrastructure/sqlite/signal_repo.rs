use crate::domain::entities::signal::Signal;
use crate::domain::error::DomainError;
use crate::domain::ports::signal_repository::*;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::direction::Direction;
use crate::domain::values::signal_state::SignalState;
use crate::domain::values::timestamp;
use rusqlite::{params, Connection};
use std::sync::Mutex;
use tracing::warn;

const SIGNAL_COLUMNS: &str = "id, symbol, signal_type, window_size, entry_point, stop_loss, take_profit, invalidated_price, state, close_kind, total_profit, initial_risk, breakeven, volume_confirmed, confidence, created_at, updated_at, created_ms, updated_ms";

pub struct SqliteSignalRepo {
    conn: Mutex<Connection>,
}

impl SqliteSignalRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn row_to_signal(row: &rusqlite::Row) -> Result<Signal, rusqlite::Error> {
        let id: String = row.get(0)?;
        let dir_str: String = row.get(2)?;
        let window: i64 = row.get(3)?;
        let state_str: String = row.get(8)?;
        let close_str: Option<String> = row.get(9)?;
        let confidence: i64 = row.get(14)?;
        let created_ms: i64 = row.get(17)?;
        let updated_ms: i64 = row.get(18)?;

        let direction = dir_str.parse::<Direction>().map_err(|e| {
            warn!(%id, "{e}");
            rusqlite::Error::InvalidColumnType(2, "signal_type".into(), rusqlite::types::Type::Text)
        })?;
        let state = state_str.parse::<SignalState>().map_err(|e| {
            warn!(%id, "{e}");
            rusqlite::Error::InvalidColumnType(8, "state".into(), rusqlite::types::Type::Text)
        })?;

        Ok(Signal {
            symbol: row.get(1)?,
            direction,
            window: usize::try_from(window).unwrap_or_default(),
            entry_point: row.get(4)?,
            stop_loss: row.get(5)?,
            take_profit: row.get(6)?,
            invalidated_price: row.get(7)?,
            state,
            close_kind: close_str.and_then(|s| s.parse().ok()),
            total_profit: row.get(10)?,
            initial_risk: row.get(11)?,
            breakeven: row.get(12)?,
            volume_confirmed: row.get(13)?,
            confidence: Confidence::new(confidence),
            created_at: created_ms,
            updated_at: updated_ms,
            id,
        })
    }

    fn query_signals(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<Signal>, DomainError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params, Self::row_to_signal)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut signals = Vec::new();
        for row in rows {
            match row {
                Ok(signal) => signals.push(signal),
                Err(e) => warn!("skipping unreadable signal row: {e}"),
            }
        }
        Ok(signals)
    }
}

fn calendar(ms: i64) -> Result<String, DomainError> {
    Ok(timestamp::to_eastern(ms)?.to_rfc3339())
}

impl SignalRepository for SqliteSignalRepo {
    fn create_signal(&self, signal: &Signal) -> Result<String, DomainError> {
        let created_at = calendar(signal.created_at)?;
        let updated_at = calendar(signal.updated_at)?;
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO trade_signals ({SIGNAL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"),
            params![
                signal.id,
                signal.symbol,
                signal.direction.to_string(),
                signal.window as i64,
                signal.entry_point,
                signal.stop_loss,
                signal.take_profit,
                signal.invalidated_price,
                signal.state.to_string(),
                signal.close_kind.map(|k| k.to_string()),
                signal.total_profit,
                signal.initial_risk,
                signal.breakeven,
                signal.volume_confirmed,
                signal.confidence.label(),
                created_at,
                updated_at,
                signal.created_at,
                signal.updated_at,
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to create signal: {e}")))?;
        Ok(signal.id.clone())
    }

    fn fetch_non_terminal_signals(&self) -> Result<Vec<Signal>, DomainError> {
        let conn = self.lock()?;
        Self::query_signals(
            &conn,
            &format!("SELECT {SIGNAL_COLUMNS} FROM trade_signals WHERE state != 'closed' ORDER BY created_ms"),
            &[],
        )
    }

    fn update_signal(&self, update: &SignalUpdate) -> Result<(), DomainError> {
        let updated_at = calendar(update.timestamp)?;
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE trade_signals
             SET total_profit = ?1, state = ?2, close_kind = ?3, updated_at = ?4, updated_ms = ?5,
                 entry_point = COALESCE(?6, entry_point), initial_risk = COALESCE(?7, initial_risk)
             WHERE id = ?8",
            params![
                update.total_profit,
                update.state.to_string(),
                update.close_kind.map(|k| k.to_string()),
                updated_at,
                update.timestamp,
                update.entry_point,
                update.initial_risk,
                update.id,
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to update signal: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Signal not found: {}", update.id)));
        }
        Ok(())
    }

    fn update_stop_loss(&self, id: &str, stop_loss: f64, timestamp: i64) -> Result<(), DomainError> {
        let updated_at = calendar(timestamp)?;
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE trade_signals SET stop_loss = ?1, breakeven = 1, updated_at = ?2, updated_ms = ?3 WHERE id = ?4",
            params![stop_loss, updated_at, timestamp, id],
        ).map_err(|e| DomainError::Database(format!("Failed to update stop loss: {e}")))?;
        if rows == 0 {
            return Err(DomainError::NotFound(format!("Signal not found: {id}")));
        }
        Ok(())
    }

    fn append_message(&self, text: &str) -> Result<(), DomainError> {
        let now = chrono::Utc::now().timestamp_millis();
        let created_at = calendar(now)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO signal_messages (message, created_at) VALUES (?1, ?2)",
            params![text, created_at],
        ).map_err(|e| DomainError::Database(format!("Failed to append message: {e}")))?;
        Ok(())
    }

    fn get_signal(&self, id: &str) -> Result<Option<Signal>, DomainError> {
        let conn = self.lock()?;
        let signals = Self::query_signals(
            &conn,
            &format!("SELECT {SIGNAL_COLUMNS} FROM trade_signals WHERE id = ?1"),
            &[&id],
        )?;
        Ok(signals.into_iter().next())
    }

    fn list_signals(&self, filter: &SignalFilter) -> Result<Vec<Signal>, DomainError> {
        let conn = self.lock()?;
        let mut sql = format!("SELECT {SIGNAL_COLUMNS} FROM trade_signals WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(state) = filter.state {
            sql.push_str(&format!(" AND state = ?{}", param_values.len() + 1));
            param_values.push(Box::new(state.to_string()));
        }
        if let Some(symbol) = &filter.symbol {
            sql.push_str(&format!(" AND symbol = ?{}", param_values.len() + 1));
            param_values.push(Box::new(symbol.clone()));
        }
        sql.push_str(" ORDER BY created_ms DESC, rowid DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        Self::query_signals(&conn, &sql, &params_refs)
    }

    fn list_messages(&self, limit: usize) -> Result<Vec<StoredMessage>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, message, created_at FROM signal_messages ORDER BY id DESC LIMIT ?1")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let messages = stmt
            .query_map(params![limit as i64], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(messages)
    }
}
