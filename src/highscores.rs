//! Player records and the session log, stored as JSON under the XDG config dir
//! (`~/.config/virustap` by default).

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const USERS_FILE: &str = "users.json";
const SESSIONS_FILE: &str = "sessions.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub organization: String,
    pub high_score: u64,
}

/// One finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: u64,
    pub score: u64,
    pub round: u32,
    pub pollution_count: u32,
}

/// A scoreboard row: one session joined with its player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedScore {
    pub name: String,
    pub organization: String,
    pub score: u64,
    pub round: u32,
}

/// Highest scores first; equal scores keep the order they were played in. Sessions of unknown
/// players are left out.
pub fn rank_sessions(
    users: &[UserRecord],
    sessions: &[SessionRecord],
    limit: usize,
) -> Vec<RankedScore> {
    let mut rows: Vec<RankedScore> = sessions
        .iter()
        .filter_map(|s| {
            let user = users.iter().find(|u| u.id == s.user_id)?;
            Some(RankedScore {
                name: user.name.clone(),
                organization: user.organization.clone(),
                score: s.score,
                round: s.round,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows.truncate(limit);
    rows
}

/// A player's sessions, most recent first.
pub fn history_of(sessions: &[SessionRecord], user_id: u64, limit: usize) -> Vec<SessionRecord> {
    sessions
        .iter()
        .rev()
        .filter(|s| s.user_id == user_id)
        .take(limit)
        .cloned()
        .collect()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("a player named {0:?} already exists")]
    DuplicateName(String),
}

pub trait RecordStore {
    fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError>;
    fn create_user(&mut self, name: &str, organization: &str) -> Result<UserRecord, StoreError>;
    /// Raises the stored high score; a lower `score` leaves it alone. Returns the stored value.
    fn update_high_score(&mut self, user_id: u64, score: u64) -> Result<u64, StoreError>;
    fn append_session(&mut self, session: &SessionRecord) -> Result<(), StoreError>;
    /// Best sessions across all players, see [`rank_sessions`].
    fn top_sessions(&self, limit: usize) -> Result<Vec<RankedScore>, StoreError>;
    fn user_history(&self, user_id: u64, limit: usize) -> Result<Vec<SessionRecord>, StoreError>;

    fn find_or_create(&mut self, name: &str, organization: &str) -> Result<UserRecord, StoreError> {
        match self.find_user(name)? {
            Some(user) => Ok(user),
            None => self.create_user(name, organization),
        }
    }
}

/// Default data directory (config dir / virustap).
pub fn default_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    base.join("virustap")
}

/// JSON files in one directory: `users.json` holds every player, `sessions.jsonl` is append-only.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    fn load_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        match fs::read(self.users_path()) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Every logged session in play order. A line that does not parse (a write cut short) is
    /// skipped.
    fn load_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let file = match fs::File::open(self.dir.join(SESSIONS_FILE)) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut sessions = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(session) => sessions.push(session),
                Err(e) => log::warn!("skipping malformed session line: {e}"),
            }
        }
        Ok(sessions)
    }

    fn save_users(&self, users: &[UserRecord]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(users)?;
        fs::write(self.users_path(), json)?;
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.load_users()?.into_iter().find(|u| u.name == name))
    }

    fn create_user(&mut self, name: &str, organization: &str) -> Result<UserRecord, StoreError> {
        let mut users = self.load_users()?;
        if users.iter().any(|u| u.name == name) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        let id = users.iter().map(|u| u.id).max().map_or(1, |max| max + 1);
        let user = UserRecord {
            id,
            name: name.to_string(),
            organization: organization.to_string(),
            high_score: 0,
        };
        users.push(user.clone());
        self.save_users(&users)?;
        log::info!("registered player {name} as #{id}");
        Ok(user)
    }

    fn update_high_score(&mut self, user_id: u64, score: u64) -> Result<u64, StoreError> {
        let mut users = self.load_users()?;
        let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(score);
        };
        if score <= user.high_score {
            return Ok(user.high_score);
        }
        user.high_score = score;
        self.save_users(&users)?;
        Ok(score)
    }

    fn append_session(&mut self, session: &SessionRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(SESSIONS_FILE))?;
        let line = serde_json::to_string(session)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    fn top_sessions(&self, limit: usize) -> Result<Vec<RankedScore>, StoreError> {
        Ok(rank_sessions(&self.load_users()?, &self.load_sessions()?, limit))
    }

    fn user_history(&self, user_id: u64, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(history_of(&self.load_sessions()?, user_id, limit))
    }
}
