//! # State File
//!
//! The ledger persists as a pretty-printed JSON [`LedgerSnapshot`]. Writes
//! go to a sibling temp file first and are renamed into place, so a crash
//! mid-write never leaves a truncated state file. Loads re-validate every
//! ledger invariant.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use pact_ledger::{EscrowError, EscrowLedger, InMemoryBank, LedgerSnapshot};

/// The ledger type the CLI operates on.
pub type Ledger = EscrowLedger<InMemoryBank>;

/// Read and validate the ledger at `path`.
pub fn load(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        bail!(
            "no ledger at {} (run `pact deploy` first)",
            path.display()
        );
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot: LedgerSnapshot<InMemoryBank> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    EscrowLedger::from_snapshot(snapshot)
        .with_context(|| format!("ledger state in {} is inconsistent", path.display()))
}

/// Write the ledger to `path`, creating parent directories as needed.
pub fn save(path: &Path, ledger: &Ledger) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&ledger.snapshot())?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move state into {}", path.display()))?;
    tracing::debug!(path = %path.display(), "ledger saved");
    Ok(())
}

/// Load, apply `operation`, and save only if it succeeded.
pub fn update<T>(
    path: &Path,
    operation: impl FnOnce(&mut Ledger) -> Result<T, EscrowError>,
) -> Result<T> {
    let mut ledger = load(path)?;
    let value = operation(&mut ledger)?;
    save(path, &ledger)?;
    Ok(value)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_core::{Address, Amount};
    use pact_ledger::LedgerConfig;

    fn fresh() -> Ledger {
        LedgerConfig::default().build_ledger().unwrap()
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let mut ledger = fresh();
        ledger
            .mint(&Address::from_low_u64_be(1), Amount::from_wei(9))
            .unwrap();
        save(&path, &ledger).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.snapshot(), ledger.snapshot());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn load_missing_file_mentions_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("none.json")).unwrap_err();
        assert!(err.to_string().contains("pact deploy"));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        save(&path, &fresh()).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let seller = Address::from_low_u64_be(0xa1);
        let result = update(&path, |ledger| {
            ledger.create_order(&seller, "x", Amount::from_wei(1), Amount::from_wei(2))
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn temp_path_is_sibling() {
        let path = Path::new("/tmp/x/ledger.json");
        assert_eq!(temp_path(path), Path::new("/tmp/x/ledger.json.tmp"));
    }
}
