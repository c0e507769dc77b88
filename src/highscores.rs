//! Score service and leaderboard
//!
//! Final scores go to an external service once per run. The leaderboard is
//! each player's best score, descending, top 10. Service failures are logged
//! and degraded to an absent result; the simulation never sees them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of leaderboard rows
pub const MAX_LEADERBOARD_ENTRIES: usize = 10;

/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 32;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u64,
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Score storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Score data error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Score service unavailable: {0}")]
    Unavailable(String),
}

/// Remote or local score backend
pub trait ScoreService: Send + Sync {
    /// Record a score; returns the stored entry
    fn submit_score(&self, username: &str, score: u64) -> Result<LeaderboardEntry, ScoreError>;

    /// Best score per player, descending, capped
    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ScoreError>;
}

/// Check a submission before it reaches storage
pub fn validate_submission(username: &str, score: u64) -> Result<LeaderboardEntry, ScoreError> {
    let name = username.trim();
    if name.is_empty() {
        return Err(ScoreError::InvalidSubmission("empty username".into()));
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(ScoreError::InvalidSubmission(format!(
            "username longer than {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(LeaderboardEntry {
        username: name.to_string(),
        score,
    })
}

/// Reduce raw submissions to a leaderboard.
///
/// Keeps each player's best score, sorts descending (ties by name) and caps
/// at [`MAX_LEADERBOARD_ENTRIES`].
pub fn best_per_player<I>(entries: I) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = LeaderboardEntry>,
{
    let mut best: HashMap<String, u64> = HashMap::new();
    for entry in entries {
        let score = best.entry(entry.username).or_insert(entry.score);
        *score = (*score).max(entry.score);
    }

    let mut board: Vec<LeaderboardEntry> = best
        .into_iter()
        .map(|(username, score)| LeaderboardEntry { username, score })
        .collect();
    board.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.username.cmp(&b.username)));
    board.truncate(MAX_LEADERBOARD_ENTRIES);
    board
}

/// Submit, logging and swallowing any failure
pub fn submit_soft(service: &dyn ScoreService, username: &str, score: u64) -> Option<LeaderboardEntry> {
    match service.submit_score(username, score) {
        Ok(entry) => {
            log::info!("Score submitted: {} = {}", entry.username, entry.score);
            Some(entry)
        }
        Err(e) => {
            log::warn!("Score submission failed: {}", e);
            None
        }
    }
}

/// Fetch the leaderboard, empty on any failure
pub fn fetch_soft(service: &dyn ScoreService) -> Vec<LeaderboardEntry> {
    service.leaderboard().unwrap_or_else(|e| {
        log::warn!("Leaderboard fetch failed: {}", e);
        Vec::new()
    })
}

/// Process-local score store
#[derive(Debug, Default)]
pub struct InMemoryScoreService {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl InMemoryScoreService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreService for InMemoryScoreService {
    fn submit_score(&self, username: &str, score: u64) -> Result<LeaderboardEntry, ScoreError> {
        let entry = validate_submission(username, score)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ScoreError::Unavailable("score store lock poisoned".into()))?;
        entries.push(entry.clone());
        Ok(entry)
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ScoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ScoreError::Unavailable("score store lock poisoned".into()))?;
        Ok(best_per_player(entries.iter().cloned()))
    }
}

/// Every submission appended to a JSON file
#[derive(Debug)]
pub struct FileScoreService {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileScoreService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<LeaderboardEntry>, ScoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }
}

impl ScoreService for FileScoreService {
    fn submit_score(&self, username: &str, score: u64) -> Result<LeaderboardEntry, ScoreError> {
        let entry = validate_submission(username, score)?;
        let _lock = self
            .guard
            .lock()
            .map_err(|_| ScoreError::Unavailable("score file lock poisoned".into()))?;
        let mut entries = self.read_all()?;
        entries.push(entry.clone());
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(entry)
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ScoreError> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| ScoreError::Unavailable("score file lock poisoned".into()))?;
        Ok(best_per_player(self.read_all()?))
    }
}

/// Fire-and-forget submission followed by a leaderboard refresh.
///
/// The request runs on a background thread; the host polls for the result
/// once per frame and shows a loading placeholder until it arrives.
pub struct ScoreReporter {
    service: Arc<dyn ScoreService>,
    submitted: bool,
    pending: Option<Receiver<Vec<LeaderboardEntry>>>,
    leaderboard: Option<Vec<LeaderboardEntry>>,
}

impl ScoreReporter {
    pub fn new(service: Arc<dyn ScoreService>) -> Self {
        Self {
            service,
            submitted: false,
            pending: None,
            leaderboard: None,
        }
    }

    /// Whether this run's score has been sent
    pub fn has_submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Send the final score unless this run already did; returns whether a request started
    pub fn submit_once(&mut self, username: &str, score: u64) -> bool {
        if self.submitted {
            return false;
        }
        self.submitted = true;
        self.leaderboard = None;

        let service = Arc::clone(&self.service);
        let username = username.to_string();
        self.spawn(move || {
            submit_soft(service.as_ref(), &username, score);
            fetch_soft(service.as_ref())
        });
        true
    }

    /// Fetch the leaderboard without submitting
    pub fn refresh(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let service = Arc::clone(&self.service);
        self.spawn(move || fetch_soft(service.as_ref()));
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> Vec<LeaderboardEntry> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("score-reporter".into())
            .spawn(move || {
                // Receiver may be gone after a reset
                let _ = tx.send(job());
            });
        match spawned {
            Ok(_) => self.pending = Some(rx),
            Err(e) => {
                log::warn!("Could not start score request: {}", e);
                self.pending = None;
                self.leaderboard = Some(Vec::new());
            }
        }
    }

    /// Latest leaderboard, `None` while a request is in flight or none was made
    pub fn poll(&mut self) -> Option<&[LeaderboardEntry]> {
        if let Some(rx) = &self.pending {
            match rx.try_recv() {
                Ok(board) => self.finish(Some(board)),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.finish(None),
            }
        }
        self.leaderboard.as_deref()
    }

    /// Block up to `timeout` for the in-flight request
    pub fn wait(&mut self, timeout: Duration) -> Option<&[LeaderboardEntry]> {
        if let Some(rx) = &self.pending {
            match rx.recv_timeout(timeout) {
                Ok(board) => self.finish(Some(board)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.finish(None),
            }
        }
        self.leaderboard.as_deref()
    }

    fn finish(&mut self, board: Option<Vec<LeaderboardEntry>>) {
        self.pending = None;
        self.leaderboard = Some(board.unwrap_or_default());
    }

    /// Forget the previous run; an in-flight request is abandoned
    pub fn reset(&mut self) {
        self.submitted = false;
        self.pending = None;
        self.leaderboard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            username: name.into(),
            score,
        }
    }

    struct FailingService;

    impl ScoreService for FailingService {
        fn submit_score(&self, _username: &str, _score: u64) -> Result<LeaderboardEntry, ScoreError> {
            Err(ScoreError::Unavailable("offline".into()))
        }

        fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ScoreError> {
            Err(ScoreError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn test_best_per_player_dedups_and_sorts() {
        let board = best_per_player(vec![
            entry("ana", 100),
            entry("bo", 300),
            entry("ana", 250),
            entry("cy", 250),
            entry("bo", 10),
        ]);
        assert_eq!(board, vec![entry("bo", 300), entry("ana", 250), entry("cy", 250)]);
    }

    #[test]
    fn test_leaderboard_capped_at_ten() {
        let entries = (0..25).map(|i| entry(&format!("p{}", i), i));
        let board = best_per_player(entries);
        assert_eq!(board.len(), MAX_LEADERBOARD_ENTRIES);
        assert_eq!(board[0].score, 24);
        assert_eq!(board[9].score, 15);
    }

    #[test]
    fn test_validate_submission() {
        assert!(validate_submission("   ", 5).is_err());
        assert!(validate_submission(&"x".repeat(MAX_USERNAME_LEN + 1), 5).is_err());
        assert_eq!(validate_submission("  zed ", 5).unwrap(), entry("zed", 5));
    }

    #[test]
    fn test_in_memory_service() {
        let service = InMemoryScoreService::new();
        service.submit_score("ana", 10).unwrap();
        service.submit_score("ana", 40).unwrap();
        service.submit_score("bo", 20).unwrap();
        let board = service.leaderboard().unwrap();
        assert_eq!(board, vec![entry("ana", 40), entry("bo", 20)]);
    }

    #[test]
    fn test_file_service_persists() {
        let path = std::env::temp_dir().join(format!(
            "particle_universe_scores_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let service = FileScoreService::new(&path);
        assert!(service.leaderboard().unwrap().is_empty());
        service.submit_score("ana", 70).unwrap();
        service.submit_score("bo", 90).unwrap();

        let reopened = FileScoreService::new(&path);
        assert_eq!(reopened.leaderboard().unwrap(), vec![entry("bo", 90), entry("ana", 70)]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_soft_helpers_swallow_failures() {
        assert!(submit_soft(&FailingService, "ana", 1).is_none());
        assert!(fetch_soft(&FailingService).is_empty());
    }

    #[test]
    fn test_reporter_submits_once() {
        let service = Arc::new(InMemoryScoreService::new());
        let mut reporter = ScoreReporter::new(service.clone());
        assert!(reporter.submit_once("ana", 123));
        assert!(!reporter.submit_once("ana", 456));

        let board = reporter.wait(Duration::from_secs(5)).map(|b| b.to_vec());
        assert_eq!(board, Some(vec![entry("ana", 123)]));
        assert!(!reporter.is_pending());

        reporter.reset();
        assert!(reporter.poll().is_none());
        assert!(reporter.submit_once("ana", 456));
        reporter.wait(Duration::from_secs(5));
        assert_eq!(service.leaderboard().unwrap(), vec![entry("ana", 456)]);
    }

    #[test]
    fn test_reporter_degrades_on_failure() {
        let mut reporter = ScoreReporter::new(Arc::new(FailingService));
        reporter.submit_once("ana", 10);
        let board = reporter.wait(Duration::from_secs(5)).map(|b| b.len());
        assert_eq!(board, Some(0));
    }
}
