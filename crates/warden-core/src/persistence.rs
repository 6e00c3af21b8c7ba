//! Best-effort snapshot persistence of notes and session history.
//!
//! The whole data set is rewritten on every change. The file layout is:
//!
//! ```json
//! {
//!   "playerNotes":    { "<uuid>": "note" },
//!   "sessionHistory": { "<uuid>": [ { "start": 1, "end": 2, "ip": "..." } ] }
//! }
//! ```
//!
//! Loading is lenient: an entry with a bad identity, a non-string note, or
//! a session without a numeric `start` is skipped on its own without
//! discarding the rest of the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use warden_types::{PlayerId, SessionRecord};

/// Errors raised while reading or writing the data file.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a JSON document.
    #[error("invalid JSON in data file: {source}")]
    Json {
        /// The underlying parse or encode error.
        #[from]
        source: serde_json::Error,
    },
}

/// The persisted subset of registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedData {
    /// Admin notes by player.
    pub notes: BTreeMap<PlayerId, String>,
    /// Session history by player, oldest first.
    pub sessions: BTreeMap<PlayerId, Vec<SessionRecord>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataFile<'a> {
    player_notes: BTreeMap<String, &'a str>,
    session_history: BTreeMap<String, &'a [SessionRecord]>,
}

/// A JSON data file on disk.
#[derive(Debug, Clone)]
pub struct DataStore {
    path: PathBuf,
}

impl DataStore {
    /// A store backed by the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the data file.
    ///
    /// A missing file yields empty data.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not
    /// valid JSON.
    pub fn load(&self) -> Result<PersistedData, PersistenceError> {
        if !self.path.exists() {
            return Ok(PersistedData::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| {
            PersistenceError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        let root: Value = serde_json::from_str(&contents)?;
        Ok(parse_data(&root))
    }

    /// Write the full data set, replacing the previous file.
    ///
    /// The content goes to a sibling temporary file first and is then
    /// renamed over the target.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or any filesystem step fails.
    pub fn save(&self, data: &PersistedData) -> Result<(), PersistenceError> {
        let file = DataFile {
            player_notes: data
                .notes
                .iter()
                .map(|(id, note)| (id.to_string(), note.as_str()))
                .collect(),
            session_history: data
                .sessions
                .iter()
                .map(|(id, list)| (id.to_string(), list.as_slice()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json).map_err(|source| PersistenceError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn parse_data(root: &Value) -> PersistedData {
    let mut data = PersistedData::default();

    if let Some(notes) = root.get("playerNotes").and_then(Value::as_object) {
        for (key, value) in notes {
            let Ok(id) = key.parse::<PlayerId>() else {
                tracing::warn!(key = %key, "Skipping note with invalid player id");
                continue;
            };
            match value.as_str().map(str::trim) {
                Some(note) if !note.is_empty() => {
                    data.notes.insert(id, note.to_owned());
                }
                _ => tracing::warn!(player = %id, "Skipping malformed note"),
            }
        }
    }

    if let Some(history) = root.get("sessionHistory").and_then(Value::as_object) {
        for (key, value) in history {
            let Ok(id) = key.parse::<PlayerId>() else {
                tracing::warn!(key = %key, "Skipping session history with invalid player id");
                continue;
            };
            let Some(entries) = value.as_array() else {
                tracing::warn!(player = %id, "Skipping non-array session history");
                continue;
            };
            let sessions: Vec<SessionRecord> = entries.iter().filter_map(parse_session).collect();
            if sessions.len() != entries.len() {
                tracing::warn!(
                    player = %id,
                    skipped = entries.len().saturating_sub(sessions.len()),
                    "Skipped malformed session entries"
                );
            }
            if !sessions.is_empty() {
                data.sessions.insert(id, sessions);
            }
        }
    }

    data
}

/// Decode one session object. `end` of 0 and an empty `ip` mean absent.
fn parse_session(value: &Value) -> Option<SessionRecord> {
    let start = value.get("start")?.as_i64()?;
    let end = value
        .get("end")
        .and_then(Value::as_i64)
        .filter(|end| *end > 0);
    let origin_address = value
        .get("ip")
        .and_then(Value::as_str)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned);
    Some(SessionRecord {
        start,
        end,
        origin_address,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> DataStore {
        DataStore::new(dir.path().join("warden_data.json"))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let data = store_in(&dir).load().unwrap();
        assert_eq!(data, PersistedData::default());
    }

    #[test]
    fn notes_and_sessions_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = PlayerId::from_name("Steve");

        let mut data = PersistedData::default();
        data.notes.insert(id, "griefed spawn".to_owned());
        data.sessions.insert(
            id,
            vec![
                SessionRecord {
                    start: 1_000,
                    end: Some(5_000),
                    origin_address: Some("10.0.0.7".to_owned()),
                },
                SessionRecord::open(6_000, None),
            ],
        );

        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), data);
    }

    #[test]
    fn saved_file_uses_external_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let id = PlayerId::from_name("Alex");
        let mut data = PersistedData::default();
        data.notes.insert(id, "ok".to_owned());
        data.sessions.insert(id, vec![SessionRecord::open(7, None)]);
        store.save(&data).unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["playerNotes"][id.to_string()], "ok");
        assert_eq!(
            raw["sessionHistory"][id.to_string()],
            serde_json::json!([{ "start": 7 }])
        );
    }

    #[test]
    fn malformed_entries_are_skipped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let good = PlayerId::from_name("Good");
        let raw = serde_json::json!({
            "playerNotes": {
                "not-a-uuid": "lost",
                good.to_string(): "kept",
            },
            "sessionHistory": {
                good.to_string(): [
                    { "start": 10, "end": 20, "ip": "" },
                    { "end": 30 },
                    { "start": 40, "end": 0 },
                ],
                "also-bad": [ { "start": 1 } ],
            }
        });
        std::fs::write(store.path(), raw.to_string()).unwrap();

        let data = store.load().unwrap();
        assert_eq!(data.notes.len(), 1);
        assert_eq!(data.notes.get(&good).unwrap(), "kept");

        let sessions = data.sessions.get(&good).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(
            sessions.first().unwrap(),
            &SessionRecord {
                start: 10,
                end: Some(20),
                origin_address: None,
            }
        );
        assert!(sessions.get(1).unwrap().is_open());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(PersistenceError::Json { .. })));
    }
}
