use rusqlite::Connection;
use tokio_rusqlite::Connection as AsyncConnection;

/// Columns added to `availability` after the first release. Older
/// databases get them on migrate.
const AVAILABILITY_MIGRATIONS: [(&str, &str); 4] = [
    ("date", "ALTER TABLE availability ADD COLUMN date TEXT"),
    ("time", "ALTER TABLE availability ADD COLUMN time TEXT"),
    (
        "duration_minutes",
        "ALTER TABLE availability ADD COLUMN duration_minutes INTEGER",
    ),
    (
        "appointment_type",
        "ALTER TABLE availability ADD COLUMN appointment_type TEXT",
    ),
];

pub async fn async_db(db_path: &str) -> Result<AsyncConnection, tokio_rusqlite::Error> {
    let db = AsyncConnection::open(db_path).await?;
    db.call(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        Ok(())
    })
    .await?;
    Ok(db)
}

pub fn initialize_db(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r"
        BEGIN;

        CREATE TABLE IF NOT EXISTS availability (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            is_booked INTEGER NOT NULL DEFAULT 0,
            date TEXT,
            time TEXT,
            duration_minutes INTEGER,
            appointment_type TEXT
        );

        CREATE INDEX IF NOT EXISTS availability_start_idx
            ON availability (appointment_type, start_time);

        CREATE TABLE IF NOT EXISTS appointment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_email TEXT NOT NULL,
            appointment_type TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS appointment_student_idx
            ON appointment (student_email, start_time);

        COMMIT;
        ",
    )
}

pub fn migrate_db(conn: &Connection) -> Result<(), rusqlite::Error> {
    let existing = {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('availability')")?;
        stmt.query_map([], |row| row.get::<_, String>(0))?
            .filter_map(Result::ok)
            .collect::<Vec<_>>()
    };

    // Nothing to migrate until the table exists
    if existing.is_empty() {
        return initialize_db(conn);
    }

    for (column, statement) in AVAILABILITY_MIGRATIONS {
        if !existing.iter().any(|c| c == column) {
            tracing::info!("Adding availability.{} column", column);
            conn.execute(statement, [])?;
        }
    }

    initialize_db(conn)
}
