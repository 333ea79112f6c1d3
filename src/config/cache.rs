use std::env::current_exe;
use std::path::{Path, PathBuf};
use std::str;
use directories_next::ProjectDirs;
use log::{debug, info, warn};
use tokio::fs;
use serde_json;

use crate::config::types::DeviceRecord;
use crate::error::CacheError;

pub const PORTABLE_CACHE_FILE_NAME: &str = ".openwind_cache.json";

// a cache file next to the executable; only used if it already exists, which makes it easy to
// keep the bridge and its state together on removable media
fn get_portable_cache_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(path) => path.parent().map(|dir| dir.join(PORTABLE_CACHE_FILE_NAME)),
        Err(err) => {
            debug!("Failed to get current exe path: {:?}", err);
            None
        },
    }
}

// device.json in an os dependent standard directory, such as ~/.config/openwind-bridge on linux
fn get_local_cache_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "openwind-bridge").map(|dirs| {
        dirs.config_dir().join("device.json")
    })
}

pub fn get_cache_path() -> Result<PathBuf, CacheError> {
    if let Some(path) = get_portable_cache_path() {
        if path.is_file() {
            return Ok(path);
        }
    }

    match get_local_cache_path() {
        None => Err(CacheError::NoCachePath),
        Some(path) => Ok(path),
    }
}

async fn read_record(path: &Path) -> Result<DeviceRecord, CacheError> {
    let content = fs::read(path).await?;
    let content = str::from_utf8(&content)?;
    Ok(serde_json::from_str(content)?)
}

async fn write_record(path: &Path, record: &DeviceRecord) -> Result<(), CacheError> {
    if let Some(directory) = path.parent() {
        fs::create_dir_all(directory).await?;
    }

    let content = serde_json::to_string(record)?;
    fs::write(path, content.as_bytes()).await?;
    Ok(())
}

// every fault is logged and otherwise treated as "nothing cached"
#[derive(Debug, Clone)]
pub struct AddressCache {
    path: Option<PathBuf>,
}

impl AddressCache {
    pub fn new(path: PathBuf) -> Self {
        AddressCache { path: Some(path) }
    }

    pub fn disabled() -> Self {
        AddressCache { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn load(&self) -> Option<DeviceRecord> {
        let path = self.path.as_ref()?;

        match read_record(path).await {
            Ok(record) => {
                info!("Loaded cached device address: {}", record.address);
                Some(record)
            },
            Err(err) if err.is_file_not_found_error() => {
                debug!("No cache file at {}", path.to_string_lossy());
                None
            },
            Err(err) => {
                info!("Ignoring unreadable cache file {}: {}", path.to_string_lossy(), err);
                None
            },
        }
    }

    pub async fn save(&self, record: &DeviceRecord) {
        let Some(path) = self.path.as_ref() else {
            return;
        };

        match write_record(path, record).await {
            Ok(()) => debug!("Saved device {} to {}", record.address, path.to_string_lossy()),
            Err(err) => warn!("Failed to save cache file {}: {}", path.to_string_lossy(), err),
        }
    }
}
