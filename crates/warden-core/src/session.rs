//! Per-player session history.
//!
//! Each player has an append-only list of [`SessionRecord`]s. Only the
//! last entry may be open, and only while the player is online.

use std::collections::{BTreeMap, HashMap};

use warden_types::{EpochMillis, PlayerId, SessionRecord};

/// Tracks session open/close for every player seen.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    history: HashMap<PlayerId, Vec<SessionRecord>>,
}

impl SessionTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted history.
    ///
    /// Nobody is online at startup, so any open entry left by an unclean
    /// shutdown is closed with zero duration (`end = start`).
    pub fn from_history(history: BTreeMap<PlayerId, Vec<SessionRecord>>) -> Self {
        let mut restored = HashMap::with_capacity(history.len());
        for (id, mut list) in history {
            for session in list.iter_mut().filter(|s| s.is_open()) {
                tracing::warn!(
                    player = %id,
                    start = session.start,
                    "Closing session left open by a previous run"
                );
                session.end = Some(session.start);
            }
            restored.insert(id, list);
        }
        Self { history: restored }
    }

    /// Open a new session at `now`.
    ///
    /// A session that is somehow still open is closed first with zero
    /// duration so that at most one entry is ever open.
    pub fn open(&mut self, id: PlayerId, now: EpochMillis, origin_address: Option<String>) {
        let list = self.history.entry(id).or_default();
        if let Some(stale) = list.last_mut().filter(|s| s.is_open()) {
            tracing::warn!(player = %id, "Join while a session was open; closing it");
            stale.end = Some(stale.start);
        }
        list.push(SessionRecord::open(now, origin_address));
    }

    /// Close the open session at `now` and return its duration in
    /// milliseconds. Returns `None` if no session was open.
    ///
    /// A clock that went backwards yields a duration of 0.
    pub fn close(&mut self, id: PlayerId, now: EpochMillis) -> Option<u64> {
        let session = self
            .history
            .get_mut(&id)?
            .last_mut()
            .filter(|s| s.is_open())?;
        session.end = Some(now);
        Some(u64::try_from(now.saturating_sub(session.start)).unwrap_or(0))
    }

    /// Whether the player has an open session.
    pub fn is_open(&self, id: PlayerId) -> bool {
        self.history
            .get(&id)
            .and_then(|list| list.last())
            .is_some_and(SessionRecord::is_open)
    }

    /// Full history for a player, oldest first.
    pub fn history(&self, id: PlayerId) -> &[SessionRecord] {
        self.history.get(&id).map_or(&[], Vec::as_slice)
    }

    /// The last `n` sessions, oldest first.
    pub fn recent(&self, id: PlayerId, n: usize) -> Vec<SessionRecord> {
        let list = self.history(id);
        let skip = list.len().saturating_sub(n);
        list.iter().skip(skip).cloned().collect()
    }

    /// A sorted copy of every player's history, for persistence.
    pub fn export(&self) -> BTreeMap<PlayerId, Vec<SessionRecord>> {
        self.history
            .iter()
            .map(|(id, list)| (*id, list.clone()))
            .collect()
    }
}
