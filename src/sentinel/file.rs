//! Filesystem change source.
//!
//! # Responsibilities
//! - Scan the watched directory for control point files
//! - Subscribe to filesystem notifications and keep the index current
//! - Emit a complete model whenever the index observably changes
//!
//! # Design Decisions
//! - The index lives inside the event task; nothing else touches it
//! - Subscribe before the initial scan so no creation is missed
//! - Per-event failures go to the error stream, the loop keeps going
//! - The OS watch handle is owned by the event task and dropped on shutdown

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecursiveMode, Watcher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, mpsc};

use crate::config::FileSentinelConfig;
use crate::model::{Kind, Model};
use crate::sentinel::error::SentinelError;
use crate::sentinel::record::{FileIndex, FileRecord, Protocol};
use crate::sentinel::{ChangeSource, SourceStreams};

const SNAPSHOT_BUFFER: usize = 16;
const ERROR_BUFFER: usize = 64;

/// A filesystem change relevant to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsChange {
    /// File created or written.
    Upsert(PathBuf),
    /// File removed or moved away.
    Remove(PathBuf),
    /// File renamed without telling which side; resolved by checking the disk.
    Renamed(PathBuf),
}

impl FsChange {
    /// Translate a raw notification. Unrelated kinds yield nothing.
    pub fn from_event(event: Event) -> Vec<FsChange> {
        let mut paths = event.paths.into_iter();
        match event.kind {
            EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any) => paths.map(FsChange::Upsert).collect(),
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.map(FsChange::Remove).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.map(FsChange::Upsert).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut changes = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    changes.push(FsChange::Remove(from));
                }
                if let Some(to) = paths.next() {
                    changes.push(FsChange::Upsert(to));
                }
                changes
            }
            EventKind::Modify(ModifyKind::Name(_)) => paths.map(FsChange::Renamed).collect(),
            _ => Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FsChange::Upsert(p) | FsChange::Remove(p) | FsChange::Renamed(p) => p,
        }
    }
}

/// Watches a directory of control point files.
#[derive(Debug)]
pub struct FileSystemWatcher {
    root: PathBuf,
    accepted: Vec<Protocol>,
    recursive: bool,
    index: FileIndex,
}

impl FileSystemWatcher {
    /// Create a watcher over `root`, tracking files of the `accepted` protocols.
    pub fn new(root: impl Into<PathBuf>, accepted: Vec<Protocol>) -> Result<Self, SentinelError> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(SentinelError::InvalidConfig {
                reason: "file sentinel path is empty".to_string(),
            });
        }
        if accepted.is_empty() {
            return Err(SentinelError::InvalidConfig {
                reason: "file sentinel accepts no file extensions".to_string(),
            });
        }

        Ok(Self {
            root,
            accepted,
            recursive: false,
            index: FileIndex::new(),
        })
    }

    pub fn from_config(config: &FileSentinelConfig) -> Result<Self, SentinelError> {
        Ok(Self::new(config.dir.clone(), Protocol::ALL.to_vec())?.recursive(config.recursive))
    }

    /// Subscribe to sub-directories as well as the root.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Current complete model.
    pub fn snapshot(&self) -> Model {
        self.index.snapshot()
    }

    fn accepts(&self, path: &Path) -> Option<Protocol> {
        Protocol::from_path(path).filter(|p| self.accepted.contains(p))
    }

    /// Walk the root recursively and record every accepted file.
    ///
    /// Unreadable entries are returned, the walk carries on past them.
    pub async fn scan(&mut self) -> Vec<SentinelError> {
        let mut errors = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(source) => {
                    errors.push(SentinelError::Read { path: dir, source });
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(source) => {
                        errors.push(SentinelError::Read {
                            path: dir.clone(),
                            source,
                        });
                        break;
                    }
                };

                let path = entry.path();
                match entry.file_type().await {
                    Ok(ft) if ft.is_dir() => pending.push(path),
                    Ok(_) => {
                        let Some(protocol) = self.accepts(&path) else {
                            continue;
                        };
                        match load(&path, protocol).await {
                            Ok(Some(record)) => {
                                self.index.upsert(record);
                            }
                            Ok(None) => {}
                            Err(e) => errors.push(e),
                        }
                    }
                    Err(source) => errors.push(SentinelError::Read { path, source }),
                }
            }
        }

        if self.index.is_empty() {
            tracing::warn!(root = %self.root.display(), "No control point files found");
        }
        tracing::info!(
            root = %self.root.display(),
            tracked = self.index.len(),
            "Initial scan complete"
        );
        errors
    }

    /// Apply one change to the index.
    ///
    /// Returns the new complete model when the change is observable, `None`
    /// for no-ops (unaccepted extension, unchanged digest, untracked delete).
    pub async fn apply(&mut self, change: FsChange) -> Result<Option<Model>, SentinelError> {
        let Some(protocol) = self.accepts(change.path()) else {
            return Ok(None);
        };

        let changed = match change {
            FsChange::Upsert(path) => self.upsert(&path, protocol).await?,
            FsChange::Remove(path) => self.index.remove(&path),
            FsChange::Renamed(path) => match tokio::fs::metadata(&path).await {
                Ok(_) => self.upsert(&path, protocol).await?,
                Err(e) if e.kind() == ErrorKind::NotFound => self.index.remove(&path),
                Err(source) => return Err(SentinelError::Read { path, source }),
            },
        };

        Ok(changed.then(|| self.index.snapshot()))
    }

    async fn upsert(&mut self, path: &Path, protocol: Protocol) -> Result<bool, SentinelError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| SentinelError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if metadata.is_dir() {
            return Ok(false);
        }

        let Some(record) = load(path, protocol).await? else {
            return Ok(false);
        };
        let code = record.code.clone();
        let changed = self.index.upsert(record);
        if !changed {
            tracing::debug!(code = %code, "File content unchanged");
        }
        Ok(changed)
    }

    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        snapshots: mpsc::Sender<Model>,
        errors: mpsc::Sender<SentinelError>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        for e in self.scan().await {
            let _ = errors.send(e).await;
        }
        if snapshots.send(self.index.snapshot()).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(root = %self.root.display(), "File sentinel stopping");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    let event = match event {
                        Ok(event) => event,
                        Err(e) => {
                            let _ = errors.send(e.into()).await;
                            continue;
                        }
                    };

                    for change in FsChange::from_event(event) {
                        match self.apply(change).await {
                            Ok(Some(model)) => {
                                if snapshots.send(model).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                let _ = errors.send(e).await;
                            }
                        }
                    }
                }
            }
        }
    }
}

async fn load(path: &Path, protocol: Protocol) -> Result<Option<FileRecord>, SentinelError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| SentinelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(FileRecord::build(path, protocol, &contents))
}

impl ChangeSource for FileSystemWatcher {
    fn kind(&self) -> Kind {
        Kind::File
    }

    fn watch(
        self: Box<Self>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<SourceStreams, SentinelError> {
        let mut this = *self;
        this.root = this
            .root
            .canonicalize()
            .map_err(|e| SentinelError::PathWatchFailed {
                path: this.root.clone(),
                reason: e.to_string(),
            })?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| SentinelError::InitFailed {
            reason: e.to_string(),
        })?;

        let mode = if this.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&this.root, mode)
            .map_err(|e| SentinelError::PathWatchFailed {
                path: this.root.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(root = %this.root.display(), recursive = this.recursive, "File sentinel started");

        let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (error_tx, error_rx) = mpsc::channel(ERROR_BUFFER);

        tokio::spawn(async move {
            // Dropping the watcher releases the OS watch handle.
            let _watcher = watcher;
            this.run(event_rx, snapshot_tx, error_tx, shutdown).await;
        });

        Ok(SourceStreams {
            snapshots: snapshot_rx,
            errors: error_rx,
        })
    }
}
