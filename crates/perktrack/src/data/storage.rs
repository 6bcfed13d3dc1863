//! Data directory storage
//!
//! Directory structure:
//! ~/.perktrack/
//!   config.yaml          # Preferences (expiring-soon window, ...)
//!   cards.json           # The serialized card record array
//!   perktrack.log        # Rotating log file

use std::fs;
use std::path::{Path, PathBuf};

use perktrack_core::model::Card;
use perktrack_core::schema;

/// Preferences stored in config.yaml
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DataConfig {
    /// Window, in days, for "expiring soon" surfacing
    #[serde(default = "default_expiring_window")]
    pub expiring_window_days: i32,
}

fn default_expiring_window() -> i32 {
    30
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            expiring_window_days: default_expiring_window(),
        }
    }
}

/// Error types for storage operations
#[derive(Debug)]
pub enum StorageError {
    Io(String),
    Parse(String),
    Serialize(String),
    /// The candidate record set failed schema validation and was rejected
    /// atomically. Carries every path-qualified violation.
    Schema(Vec<String>),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "IO error: {}", msg),
            StorageError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StorageError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Schema(violations) => {
                write!(f, "Record validation failed: {}", violations.join("; "))
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Manages the data directory holding config and card records
pub struct DataDirectory {
    root: PathBuf,
}

impl DataDirectory {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the default data directory path (~/.perktrack/)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".perktrack")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    fn cards_path(&self) -> PathBuf {
        self.root.join("cards.json")
    }

    /// Initialize the data directory structure
    pub fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::Io(format!("Failed to create data directory: {}", e)))?;
        Ok(())
    }

    /// Load the config file, falling back to defaults if absent
    pub fn load_config(&self) -> Result<DataConfig, StorageError> {
        let config_path = self.config_path();
        if !config_path.exists() {
            return Ok(DataConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| StorageError::Io(format!("Failed to read config: {}", e)))?;

        serde_saphyr::from_str(&content)
            .map_err(|e| StorageError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn save_config(&self, config: &DataConfig) -> Result<(), StorageError> {
        let yaml = serde_saphyr::to_string(config)
            .map_err(|e| StorageError::Serialize(format!("Failed to serialize config: {}", e)))?;

        fs::write(self.config_path(), yaml)
            .map_err(|e| StorageError::Io(format!("Failed to write config: {}", e)))
    }

    /// Load the card records. Empty if no prior data. Records are
    /// untrusted until they pass schema validation; a failing set is
    /// rejected whole, never partially applied.
    pub fn load_cards(&self) -> Result<Vec<Card>, StorageError> {
        let cards_path = self.cards_path();
        if !cards_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&cards_path)
            .map_err(|e| StorageError::Io(format!("Failed to read cards: {}", e)))?;

        let mut value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| StorageError::Parse(format!("Failed to parse cards: {}", e)))?;

        schema::normalize_midnight_datetimes(&mut value);
        schema::validate_card_records(&value).map_err(StorageError::Schema)?;

        serde_json::from_value(value)
            .map_err(|e| StorageError::Parse(format!("Failed to decode cards: {}", e)))
    }

    /// Persist the card records atomically via write-then-rename, so an
    /// interrupted write never corrupts the previous file.
    pub fn save_cards(&self, cards: &[Card]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(cards)
            .map_err(|e| StorageError::Serialize(format!("Failed to serialize cards: {}", e)))?;

        atomic_write(&self.cards_path(), &json)
            .map_err(|e| StorageError::Io(format!("Failed to write cards: {}", e)))
    }
}

/// Write content to a file using the write-then-rename pattern. The
/// rename is atomic on POSIX systems.
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use perktrack_core::model::CardId;
    use tempfile::tempdir;

    #[test]
    fn test_load_cards_empty_when_missing() {
        let dir = tempdir().unwrap();
        let storage = DataDirectory::new(dir.path().to_path_buf());
        storage.init().unwrap();
        assert!(storage.load_cards().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = DataDirectory::new(dir.path().to_path_buf());
        storage.init().unwrap();

        let cards = vec![Card::new(CardId::from("card-1"), "Sapphire", date(2019, 6, 15))];
        storage.save_cards(&cards).unwrap();

        let loaded = storage.load_cards().unwrap();
        assert_eq!(loaded, cards);

        // Temp file from the atomic write must not linger
        assert!(!dir.path().join("cards.json.tmp").exists());
    }

    #[test]
    fn test_invalid_records_rejected_whole() {
        let dir = tempdir().unwrap();
        let storage = DataDirectory::new(dir.path().to_path_buf());
        storage.init().unwrap();

        fs::write(
            dir.path().join("cards.json"),
            r#"[{"id": "card-1", "name": "Sapphire"}]"#,
        )
        .unwrap();

        match storage.load_cards() {
            Err(StorageError::Schema(violations)) => {
                assert_eq!(violations, vec!["root[0].anniversaryDate is required"]);
            }
            other => panic!("expected schema rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_config_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let storage = DataDirectory::new(dir.path().to_path_buf());
        storage.init().unwrap();
        assert_eq!(storage.load_config().unwrap().expiring_window_days, 30);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = DataDirectory::new(dir.path().to_path_buf());
        storage.init().unwrap();

        let config = DataConfig {
            expiring_window_days: 14,
        };
        storage.save_config(&config).unwrap();
        assert_eq!(storage.load_config().unwrap().expiring_window_days, 14);
    }
}
