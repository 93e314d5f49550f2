use rusqlite::{Connection, Result};

/// Latest local schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the local photo database schema
///
/// Migrations are additive and applied in order, starting from the version
/// recorded in `PRAGMA user_version`.
pub fn init_photo_schema(conn: &Connection) -> Result<()> {
    // Cascades on AlbumPhoto depend on this
    conn.pragma_update(None, "foreign_keys", true)?;

    let mut current_version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    if current_version < 1 {
        create_photo_schema_v1(conn)?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_photo_date_taken ON Photo(date_taken DESC, id DESC)",
            [],
        )?;
        current_version = 2;
    }

    log::info!("Local photo schema migrated to version {}", current_version);
    conn.pragma_update(None, "user_version", current_version)?;

    Ok(())
}

/// Create photo schema version 1
fn create_photo_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS Photo (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            uri TEXT NOT NULL,
            date_taken TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS Album (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS AlbumPhoto (
            photo_id INTEGER NOT NULL,
            album_id INTEGER NOT NULL,
            PRIMARY KEY (photo_id, album_id),
            FOREIGN KEY (photo_id) REFERENCES Photo(id) ON DELETE CASCADE,
            FOREIGN KEY (album_id) REFERENCES Album(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_albumphoto_album ON AlbumPhoto(album_id);",
    )
}
