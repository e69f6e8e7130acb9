//! SQLite room store (rusqlite)
//!
//! Each room is one row holding its JSON snapshot. Every write runs in a
//! transaction under the store's lock and publishes only after commit.

use super::{RoomPatch, RoomStore, StoreError, Subscribers, Subscription, LOG_TARGET};
use crate::error::BingoError;
use crate::room::{JoinOutcome, Player, Room, RoomCode, RoomSettings};
use directories::ProjectDirs;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current schema version. Bump this when making schema changes.
/// Version history:
/// - v1: meta and rooms tables
const SCHEMA_VERSION: u32 = 1;

const DATABASE_FILE: &str = "bingo-hall.db";

/// Rooms persisted in a SQLite database.
pub struct SqliteRoomStore {
    conn: Mutex<Connection>,
    subscribers: Subscribers,
}

impl SqliteRoomStore {
    /// Open or create the database in the OS data directory.
    ///
    /// - Linux: `$XDG_DATA_HOME/bingo-hall/` or `~/.local/share/bingo-hall/`
    /// - macOS: `~/Library/Application Support/bingo-hall/`
    pub fn open() -> Result<Self, StoreError> {
        let data_dir = Self::data_dir()?;
        std::fs::create_dir_all(&data_dir).map_err(StoreError::CreateDirFailed)?;
        Self::open_at(data_dir.join(DATABASE_FILE))
    }

    /// Open or create the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::CreateDirFailed)?;
        }
        let conn = Connection::open(path)?;
        debug!(target: LOG_TARGET, path = %path.display(), "Opened room database");
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// OS-standard data directory for the room database.
    pub fn data_dir() -> Result<PathBuf, StoreError> {
        ProjectDirs::from("", "", "bingo-hall")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StoreError::NoDataDirectory)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            subscribers: Subscribers::new(),
        })
    }
}

impl RoomStore for SqliteRoomStore {
    fn create_room(
        &self,
        code: RoomCode,
        host: Player,
        settings: RoomSettings,
    ) -> Result<Room, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        if read_room(&tx, &code)?.is_some() {
            return Err(StoreError::AlreadyExists(code));
        }
        let room = Room::new(code, host, settings)?;
        let now = now_millis();
        tx.execute(
            "INSERT INTO rooms (code, snapshot, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![room.code().as_str(), serde_json::to_string(&room)?, now],
        )?;
        tx.commit()?;
        info!(target: LOG_TARGET, room = %room.code(), "Room created");
        Ok(room)
    }

    fn join_room(&self, code: &RoomCode, player: Player) -> Result<JoinOutcome, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut room = read_room(&tx, code)?.ok_or_else(|| StoreError::NotFound(code.clone()))?;
        let username = player.username().to_string();
        let outcome = room.admit(player)?;
        if outcome == JoinOutcome::Rejoined {
            return Ok(outcome);
        }
        write_room(&tx, &room)?;
        tx.commit()?;
        info!(target: LOG_TARGET, room = %code, player = %username, "Player joined");
        self.subscribers.publish(&room);
        Ok(outcome)
    }

    fn subscribe(&self, code: &RoomCode) -> Result<Subscription, StoreError> {
        let conn = self.conn.lock();
        let room = read_room(&conn, code)?.ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(self.subscribers.subscribe(&room))
    }

    fn patch_room(&self, code: &RoomCode, patch: RoomPatch) -> Result<Room, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let room = read_room(&tx, code)?.ok_or_else(|| StoreError::NotFound(code.clone()))?;
        let next = patch.apply(&room)?;
        write_room(&tx, &next)?;
        tx.commit()?;
        self.subscribers.publish(&next);
        Ok(next)
    }

    fn load_room(&self, code: &RoomCode) -> Result<Option<Room>, StoreError> {
        read_room(&self.conn.lock(), code)
    }
}

fn read_room(conn: &Connection, code: &RoomCode) -> Result<Option<Room>, StoreError> {
    let snapshot: Option<String> = conn
        .query_row(
            "SELECT snapshot FROM rooms WHERE code = ?1",
            params![code.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    let Some(snapshot) = snapshot else {
        return Ok(None);
    };
    let room: Room = serde_json::from_str(&snapshot)?;
    room.check_integrity().map_err(BingoError::from)?;
    Ok(Some(room))
}

fn write_room(conn: &Connection, room: &Room) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE rooms SET snapshot = ?2, updated_at = ?3 WHERE code = ?1",
        params![room.code().as_str(), serde_json::to_string(room)?, now_millis()],
    )?;
    Ok(())
}

fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    let current_version = schema_version(conn)?;
    if current_version == 0 {
        create_schema_v1(conn)?;
    } else if current_version > SCHEMA_VERSION {
        // Database is from a newer build
        return Err(StoreError::FutureSchemaVersion {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}

fn schema_version(conn: &Connection) -> Result<u32, StoreError> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
        [],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Ok(0);
    }
    let version: Option<u32> = conn
        .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| row.get(0))
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn create_schema_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            schema_version INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        -- One JSON snapshot per room, keyed by room code
        CREATE TABLE IF NOT EXISTS rooms (
            code TEXT PRIMARY KEY,
            snapshot TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    conn.execute(
        "INSERT INTO meta (schema_version, created_at) VALUES (?1, ?2)",
        params![SCHEMA_VERSION, now_millis()],
    )?;
    Ok(())
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
