//! Flat JSON document store: one directory per entity kind, one `<uuid>.json` per entity.

mod error;

pub use error::StoreError;

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Athlete, Division, Match, MatchHistory, Team, Tournament};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Athlete,
    Team,
    Tournament,
    Division,
    Match,
    MatchHistory,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Athlete,
        EntityKind::Team,
        EntityKind::Tournament,
        EntityKind::Division,
        EntityKind::Match,
        EntityKind::MatchHistory,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            EntityKind::Athlete => "athletes",
            EntityKind::Team => "teams",
            EntityKind::Tournament => "tournaments",
            EntityKind::Division => "divisions",
            EntityKind::Match => "matches",
            EntityKind::MatchHistory => "match_history",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Athlete => "Athlete",
            EntityKind::Team => "Team",
            EntityKind::Tournament => "Tournament",
            EntityKind::Division => "Division",
            EntityKind::Match => "Match",
            EntityKind::MatchHistory => "Match history",
        };
        write!(f, "{}", name)
    }
}

/// A document that can be persisted in the store.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;
}

impl Entity for Athlete {
    const KIND: EntityKind = EntityKind::Athlete;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Team {
    const KIND: EntityKind = EntityKind::Team;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Tournament {
    const KIND: EntityKind = EntityKind::Tournament;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Division {
    const KIND: EntityKind = EntityKind::Division;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Match {
    const KIND: EntityKind = EntityKind::Match;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for MatchHistory {
    const KIND: EntityKind = EntityKind::MatchHistory;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for kind in EntityKind::ALL {
            let dir = root.join(kind.dir_name());
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        log::debug!("Opened document store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: EntityKind, id: Uuid) -> PathBuf {
        self.root.join(kind.dir_name()).join(format!("{id}.json"))
    }

    /// Write the document, replacing any previous version atomically.
    pub fn save<T: Entity>(&self, entity: &T) -> Result<(), StoreError> {
        let path = self.path_for(T::KIND, entity.id());
        let tmp_path = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(io_err)?;
        serde_json::to_writer_pretty(&mut file, entity).map_err(|source| StoreError::Json {
            path: tmp_path.clone(),
            source,
        })?;
        file.write_all(b"\n").map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("Saved {} {}", T::KIND, entity.id());
        Ok(())
    }

    pub fn find<T: Entity>(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let path = self.path_for(T::KIND, id);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Json { path, source }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    pub fn load<T: Entity>(&self, id: Uuid) -> Result<T, StoreError> {
        self.find(id)?
            .ok_or(StoreError::NotFound { kind: T::KIND, id })
    }

    /// All documents of a kind. Files that fail to parse are logged and skipped.
    pub fn list<T: Entity>(&self) -> Result<Vec<T>, StoreError> {
        let dir = self.root.join(T::KIND.dir_name());
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("Skipping unreadable document {}: {}", path.display(), err);
                    continue;
                }
            };
            match serde_json::from_slice(&bytes) {
                Ok(doc) => out.push(doc),
                Err(err) => log::warn!("Skipping corrupt document {}: {}", path.display(), err),
            }
        }
        Ok(out)
    }

    /// Returns true if a document was removed.
    pub fn delete<T: Entity>(&self, id: Uuid) -> Result<bool, StoreError> {
        let path = self.path_for(T::KIND, id);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Deleted {} {}", T::KIND, id);
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}
