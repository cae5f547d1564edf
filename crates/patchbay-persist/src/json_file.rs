// ── JSON file backend ──
//
// One document per collection, so a corrupt equipment file never takes the
// connection data down with it. Saves go through a temp file and rename to
// avoid torn writes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use patchbay_core::persist::{LoadOutcome, PersistError, Persistence, StateSnapshot};
use patchbay_core::{Connection, Equipment};

const EQUIPMENT_FILE: &str = "equipment.json";
const CONNECTIONS_FILE: &str = "connections.json";

/// Stores the inventory as two JSON documents under one directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn equipment_path(&self) -> PathBuf {
        self.dir.join(EQUIPMENT_FILE)
    }

    fn connections_path(&self) -> PathBuf {
        self.dir.join(CONNECTIONS_FILE)
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<LoadOutcome, PersistError> {
        Ok(LoadOutcome {
            equipment: read_collection::<Equipment>(&self.equipment_path(), "equipment"),
            connections: read_collection::<Connection>(&self.connections_path(), "connections"),
        })
    }

    fn save(&self, state: &StateSnapshot) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).map_err(|err| PersistError::Io {
            reason: format!("creating {}: {err}", self.dir.display()),
        })?;

        write_collection(&self.equipment_path(), "equipment", &state.equipment)?;
        write_collection(&self.connections_path(), "connections", &state.connections)?;
        debug!(
            equipment = state.equipment.len(),
            connections = state.connections.len(),
            dir = %self.dir.display(),
            "inventory saved"
        );
        Ok(())
    }
}

/// Read one collection document. A missing file is an empty collection;
/// unreadable bytes are `Io`, undecodable JSON is `Parse`.
fn read_collection<T: serde::de::DeserializeOwned>(
    path: &Path,
    section: &str,
) -> Result<Vec<T>, PersistError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let text = fs::read_to_string(path).map_err(|err| PersistError::Io {
        reason: format!("reading {}: {err}", path.display()),
    })?;

    serde_json::from_str(&text).map_err(|err| PersistError::Parse {
        section: section.to_owned(),
        reason: err.to_string(),
    })
}

fn write_collection<T: serde::Serialize>(
    path: &Path,
    section: &str,
    values: &[T],
) -> Result<(), PersistError> {
    let text = serde_json::to_string_pretty(values).map_err(|err| PersistError::Parse {
        section: section.to_owned(),
        reason: err.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|err| PersistError::Io {
        reason: format!("writing {}: {err}", tmp.display()),
    })?;
    fs::rename(&tmp, path).map_err(|err| PersistError::Io {
        reason: format!("replacing {}: {err}", path.display()),
    })
}
