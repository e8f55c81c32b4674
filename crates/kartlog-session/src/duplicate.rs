//! Detection of sessions that were already imported.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveTime};
use kartlog_core::{Error, KartlogConfig, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A session already known to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingSession {
    pub id: u64,
    pub track_name: String,
    pub session_date: NaiveDate,
    #[serde(default)]
    pub session_time: Option<NaiveTime>,
    #[serde(default)]
    pub session_number: Option<String>,
    /// SHA-256 of the uploaded file the session was imported from.
    #[serde(default)]
    pub content_hash: Option<String>,
}

/// Lookup of existing sessions. Implemented by whatever store holds them.
pub trait SessionIndex {
    /// Sessions at the given track (case-insensitive) on the given date.
    fn sessions_on(&self, track_name: &str, date: NaiveDate) -> Result<Vec<ExistingSession>>;

    /// The session imported from a file with this content hash, if any.
    fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<ExistingSession>>;
}

/// A [`SessionIndex`] over a list held in memory, e.g. an export of the
/// store's sessions table.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionIndex {
    sessions: Vec<ExistingSession>,
}

impl InMemorySessionIndex {
    pub fn new(sessions: Vec<ExistingSession>) -> Self {
        Self { sessions }
    }

    /// Load a JSON array of sessions.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("session list {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let sessions: Vec<ExistingSession> = serde_json::from_str(&content)?;
        debug!("Loaded {} existing sessions from {}", sessions.len(), path.display());
        Ok(Self::new(sessions))
    }

    pub fn push(&mut self, session: ExistingSession) {
        self.sessions.push(session);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionIndex for InMemorySessionIndex {
    fn sessions_on(&self, track_name: &str, date: NaiveDate) -> Result<Vec<ExistingSession>> {
        let track = track_name.trim().to_lowercase();
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.session_date == date && s.track_name.trim().to_lowercase() == track)
            .cloned()
            .collect())
    }

    fn find_by_content_hash(&self, content_hash: &str) -> Result<Option<ExistingSession>> {
        Ok(self
            .sessions
            .iter()
            .find(|s| s.content_hash.as_deref() == Some(content_hash))
            .cloned())
    }
}

/// Why an upload may duplicate an existing session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    /// The exact same file was imported before.
    SameFile,
    /// A session at the same track started within the window.
    CloseStartTime,
    /// Neither session has a usable start time, but they share track and date.
    SameDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateWarning {
    pub session_id: u64,
    pub track_name: String,
    pub session_date: NaiveDate,
    pub session_time: Option<NaiveTime>,
    pub reason: DuplicateReason,
    /// Absolute difference between the start times, when both are known.
    pub minutes_apart: Option<i64>,
}

impl DuplicateWarning {
    fn new(session: &ExistingSession, reason: DuplicateReason, minutes_apart: Option<i64>) -> Self {
        Self {
            session_id: session.id,
            track_name: session.track_name.clone(),
            session_date: session.session_date,
            session_time: session.session_time,
            reason,
            minutes_apart,
        }
    }

    pub fn message(&self) -> String {
        let when = match self.session_time {
            Some(t) => format!("{} {}", self.session_date, t.format("%H:%M")),
            None => self.session_date.to_string(),
        };
        match self.reason {
            DuplicateReason::SameFile => format!(
                "This file was already imported as session {} ({} on {})",
                self.session_id, self.track_name, when
            ),
            DuplicateReason::CloseStartTime => format!(
                "Session {} at {} on {} started {} minutes apart",
                self.session_id,
                self.track_name,
                when,
                self.minutes_apart.unwrap_or(0)
            ),
            DuplicateReason::SameDate => format!(
                "Session {} at {} is on the same date ({})",
                self.session_id, self.track_name, when
            ),
        }
    }
}

/// Flags uploads that likely repeat a session already in the index.
#[derive(Debug, Clone)]
pub struct DuplicateSessionChecker {
    window: Duration,
}

impl DuplicateSessionChecker {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_config(config: &KartlogConfig) -> Self {
        Self::new(config.duplicate_window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sessions at `track_name` on `date` starting within the window of
    /// `time`. Without a time, every session on that date is reported; a
    /// session stored without a time is reported too.
    pub fn check(
        &self,
        index: &dyn SessionIndex,
        track_name: &str,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<Vec<DuplicateWarning>> {
        let candidates = index.sessions_on(track_name, date)?;
        let warnings: Vec<DuplicateWarning> = candidates
            .iter()
            .filter_map(|existing| match (time, existing.session_time) {
                (Some(new), Some(old)) => {
                    let apart = (new - old).num_minutes().abs();
                    (apart <= self.window.num_minutes()).then(|| {
                        DuplicateWarning::new(existing, DuplicateReason::CloseStartTime, Some(apart))
                    })
                }
                _ => Some(DuplicateWarning::new(existing, DuplicateReason::SameDate, None)),
            })
            .collect();

        if !warnings.is_empty() {
            info!(
                "{} possible duplicate sessions at {} on {}",
                warnings.len(),
                track_name,
                date
            );
        }
        Ok(warnings)
    }

    /// The session previously imported from a byte-identical file.
    pub fn check_file(
        &self,
        index: &dyn SessionIndex,
        content_hash: &str,
    ) -> Result<Option<DuplicateWarning>> {
        Ok(index
            .find_by_content_hash(content_hash)?
            .map(|existing| DuplicateWarning::new(&existing, DuplicateReason::SameFile, None)))
    }

    /// Like [`check`](Self::check), plus a [`DuplicateReason::SameFile`]
    /// warning when the upload's content hash is already known. A session
    /// matched by hash is not reported twice.
    pub fn check_upload(
        &self,
        index: &dyn SessionIndex,
        content_hash: &str,
        track_name: &str,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<Vec<DuplicateWarning>> {
        let same_file = self.check_file(index, content_hash)?;
        let same_id = same_file.as_ref().map(|w| w.session_id);
        let mut warnings: Vec<DuplicateWarning> = same_file.into_iter().collect();
        warnings.extend(
            self.check(index, track_name, date, time)?
                .into_iter()
                .filter(|w| Some(w.session_id) != same_id),
        );
        Ok(warnings)
    }
}

impl Default for DuplicateSessionChecker {
    fn default() -> Self {
        Self::from_config(&KartlogConfig::default())
    }
}
