use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dlmm_lp_domain::value_objects::BalanceSnapshot;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Append-only sink for agent actions and balance history.
#[async_trait]
pub trait ActionLog: Send + Sync {
    /// Appends a human-readable action line, stamped with the current time.
    async fn append(&self, message: &str) -> Result<()>;

    /// Records a structured total-usable-balance snapshot.
    async fn record_balance(&self, snapshot: &BalanceSnapshot) -> Result<()>;

    /// Returns the most recent snapshot recorded at or before `before`.
    async fn latest_balance_before(&self, before: DateTime<Utc>)
    -> Result<Option<BalanceSnapshot>>;
}

const ACTIONS_FILE: &str = "actions.log";
const BALANCES_FILE: &str = "balances.jsonl";

/// File-backed action log.
///
/// Writes `actions.log` (one timestamped line per action) and
/// `balances.jsonl` (one serialized [`BalanceSnapshot`] per line) under a
/// directory created on first use.
pub struct FileActionLog {
    dir: PathBuf,
    // Serializes appends so lines from one process never interleave.
    write_lock: Mutex<()>,
}

impl FileActionLog {
    /// Opens (creating if needed) a log directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the log files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn append_line(&self, file: &str, line: &str) -> Result<()> {
        let path = self.dir.join(file);
        let _guard = self.write_lock.lock().await;
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        handle.write_all(line.as_bytes()).await?;
        handle.write_all(b"\n").await?;
        handle.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ActionLog for FileActionLog {
    async fn append(&self, message: &str) -> Result<()> {
        let line = format!("[{}] {}", Utc::now().to_rfc3339(), message);
        self.append_line(ACTIONS_FILE, &line).await
    }

    async fn record_balance(&self, snapshot: &BalanceSnapshot) -> Result<()> {
        let line = serde_json::to_string(snapshot).context("failed to serialize snapshot")?;
        self.append_line(BALANCES_FILE, &line).await
    }

    async fn latest_balance_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<BalanceSnapshot>> {
        let path = self.dir.join(BALANCES_FILE);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };

        let mut latest: Option<BalanceSnapshot> = None;
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let snapshot: BalanceSnapshot = match serde_json::from_str(line) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "Skipping unreadable balance record");
                    continue;
                }
            };
            if snapshot.recorded_at <= before
                && latest
                    .as_ref()
                    .is_none_or(|current| snapshot.recorded_at >= current.recorded_at)
            {
                latest = Some(snapshot);
            }
        }

        debug!(found = latest.is_some(), "Looked up balance history");
        Ok(latest)
    }
}

/// In-memory action log.
#[derive(Default)]
pub struct MemoryActionLog {
    lines: RwLock<Vec<String>>,
    balances: RwLock<Vec<BalanceSnapshot>>,
}

impl MemoryActionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All action lines appended so far, oldest first.
    pub async fn lines(&self) -> Vec<String> {
        self.lines.read().await.clone()
    }

    /// All snapshots recorded so far, oldest first.
    pub async fn balances(&self) -> Vec<BalanceSnapshot> {
        self.balances.read().await.clone()
    }
}

#[async_trait]
impl ActionLog for MemoryActionLog {
    async fn append(&self, message: &str) -> Result<()> {
        self.lines.write().await.push(message.to_string());
        Ok(())
    }

    async fn record_balance(&self, snapshot: &BalanceSnapshot) -> Result<()> {
        self.balances.write().await.push(snapshot.clone());
        Ok(())
    }

    async fn latest_balance_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<BalanceSnapshot>> {
        Ok(self
            .balances
            .read()
            .await
            .iter()
            .filter(|s| s.recorded_at <= before)
            .max_by_key(|s| s.recorded_at)
            .cloned())
    }
}
