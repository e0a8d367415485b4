use std::{
    fs,
    io,
    io::{Error, ErrorKind},
    path::{Path, PathBuf},
};

use comanda_common::Secret;
use comanda_engine::{
    payment_objects::PaymentMethod,
    traits::{SelectionStore, StorageError},
};
use dirs::home_dir;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything the client remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentMethod>,
}

/// Reads and writes [`LocalState`] in a TOML file that only the owner can read.
#[derive(Debug, Clone)]
pub struct ProfileManager {
    path: PathBuf,
}

impl ProfileManager {
    /// `~/.comanda/config.toml`
    pub fn new_default() -> io::Result<Self> {
        let home = home_dir().ok_or_else(|| Error::new(ErrorKind::NotFound, "Home directory not found"))?;
        Ok(Self::at(home.join(".comanda").join("config.toml")))
    }

    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_state(&self) -> io::Result<LocalState> {
        if !self.path.exists() {
            return Ok(LocalState::default());
        }
        let config_str = fs::read_to_string(&self.path)?;
        toml::from_str(&config_str).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))
    }

    pub fn write_state(&self, state: &LocalState) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
                set_permissions(dir, 0o700)?;
            }
        }
        let exists = self.path.exists();
        let config_str = toml::to_string(state).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        fs::write(&self.path, config_str)?;
        if !exists {
            info!("🪛️ Created {}", self.path.display());
            set_permissions(&self.path, 0o600)?;
        }
        Ok(())
    }

    fn update<F: FnOnce(&mut LocalState)>(&self, f: F) -> io::Result<()> {
        let mut state = self.read_state()?;
        f(&mut state);
        self.write_state(&state)
    }

    pub fn token(&self) -> io::Result<Option<Secret<String>>> {
        let state = self.read_state()?;
        Ok(state.token.filter(|t| !t.trim().is_empty()).map(Secret::new))
    }

    pub fn set_token(&self, token: &Secret<String>) -> io::Result<()> {
        debug!("🪛️ Saving session token {}", token.hint());
        self.update(|state| state.token = Some(token.reveal().clone()))
    }

    pub fn clear_token(&self) -> io::Result<()> {
        self.update(|state| state.token = None)
    }
}

fn set_permissions(path: &Path, perms: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(perms);
        fs::set_permissions(path, permissions)?;
    }
    #[cfg(not(unix))]
    let _ = (path, perms);
    Ok(())
}

impl SelectionStore for ProfileManager {
    fn load_selection(&self) -> Result<Option<PaymentMethod>, StorageError> {
        self.read_state().map(|s| s.payment).map_err(|e| StorageError::Read(e.to_string()))
    }

    fn save_selection(&self, selection: &PaymentMethod) -> Result<(), StorageError> {
        self.update(|state| state.payment = Some(selection.clone())).map_err(|e| StorageError::Write(e.to_string()))
    }

    fn clear_selection(&self) -> Result<(), StorageError> {
        self.update(|state| state.payment = None).map_err(|e| StorageError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use comanda_engine::{cart_types::CardId, payment_objects::StoredCard};

    use super::*;

    fn manager() -> (tempfile::TempDir, ProfileManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ProfileManager::at(dir.path().join("comanda").join("config.toml"));
        (dir, manager)
    }

    #[test]
    fn a_missing_file_is_an_empty_state() {
        let (_dir, manager) = manager();
        assert_eq!(manager.read_state().unwrap(), LocalState::default());
        assert_eq!(manager.load_selection().unwrap(), None);
        assert!(manager.token().unwrap().is_none());
    }

    #[test]
    fn selection_and_token_are_kept_side_by_side() {
        let (_dir, manager) = manager();
        let card = StoredCard {
            id: CardId(7),
            brand: "Visa".into(),
            last_four_digits: "4242".into(),
            alias: None,
            principal: true,
        };
        manager.set_token(&Secret::from("abc.def.ghi")).unwrap();
        manager.save_selection(&PaymentMethod::from(&card)).unwrap();
        assert_eq!(manager.token().unwrap().map(|t| t.reveal().clone()), Some("abc.def.ghi".to_string()));

        manager.save_selection(&PaymentMethod::cash()).unwrap();
        assert_eq!(manager.load_selection().unwrap(), Some(PaymentMethod::cash()));
        let raw = fs::read_to_string(manager.path()).unwrap();
        assert!(raw.contains("id = \"cash\""));
        assert!(raw.contains("type = \"efectivo\""));

        manager.clear_selection().unwrap();
        assert_eq!(manager.load_selection().unwrap(), None);
        assert!(manager.token().unwrap().is_some());
        manager.clear_token().unwrap();
        assert!(manager.token().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn the_state_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, manager) = manager();
        manager.save_selection(&PaymentMethod::cash()).unwrap();
        let mode = fs::metadata(manager.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let dir_mode = fs::metadata(manager.path().parent().unwrap()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn corrupt_files_are_read_errors() {
        let (_dir, manager) = manager();
        manager.write_state(&LocalState::default()).unwrap();
        fs::write(manager.path(), "payment = [").unwrap();
        assert!(matches!(manager.load_selection(), Err(StorageError::Read(_))));
    }
}
