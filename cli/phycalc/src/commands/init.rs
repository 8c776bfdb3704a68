//! `phycalc init`: write a starter `phycalc.toml`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::{ProjectConfig, CONFIG_FILE};

pub fn run(dir: &Path, family: &str, revision: &str) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    phycalc_parts::load_part(family, revision)?;
    fs::write(&path, ProjectConfig::template(family, revision))
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Created {} for {family}-{revision}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), "reference", "B0").unwrap();
        let config = ProjectConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.part.revision.as_deref(), Some("B0"));
    }

    #[test]
    fn init_refuses_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let err = run(dir.path(), "reference", "A0").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_rejects_unknown_revision() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), "reference", "Z9").is_err());
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }
}
