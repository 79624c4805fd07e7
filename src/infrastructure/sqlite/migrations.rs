use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS trade_signals (
            id TEXT PRIMARY KEY,
            symbol TEXT NOT NULL,
            signal_type TEXT NOT NULL,
            window_size INTEGER NOT NULL,
            entry_point REAL NOT NULL,
            stop_loss REAL NOT NULL,
            take_profit REAL NOT NULL,
            invalidated_price REAL NOT NULL,
            state TEXT NOT NULL DEFAULT 'pending',
            close_kind TEXT,
            total_profit REAL,
            initial_risk REAL,
            breakeven INTEGER NOT NULL DEFAULT 0,
            volume_confirmed INTEGER NOT NULL DEFAULT 0,
            confidence INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_ms INTEGER NOT NULL,
            updated_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS signal_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_signals_state ON trade_signals(state);
        CREATE INDEX IF NOT EXISTS idx_signals_symbol ON trade_signals(symbol);
        CREATE INDEX IF NOT EXISTS idx_signals_created ON trade_signals(created_ms);
        "
    ).map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
