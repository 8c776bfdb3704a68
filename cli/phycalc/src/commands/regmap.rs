//! `phycalc regmap`: show or validate register metadata.

use std::path::Path;

use anyhow::{Context, Result};
use phycalc_model::RegisterMap;
use phycalc_parts::load_part;

use super::Session;

pub fn run(session: &Session, file: Option<&Path>) -> Result<()> {
    let map = match file {
        Some(path) => RegisterMap::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => load_part(&session.family, &session.revision)?.register_map().as_ref().clone(),
    };
    print!("{}", table(&map));

    let warnings = match map.validate() {
        Ok(()) => Vec::new(),
        Err(issues) => issues,
    };
    println!();
    if warnings.is_empty() {
        println!("Status: VALID");
    } else {
        println!("Status: VALID with {} warning(s)", warnings.len());
        for issue in &warnings {
            println!("  {}: {}", issue.severity, issue.message);
        }
    }
    Ok(())
}

fn table(map: &RegisterMap) -> String {
    let mut text = format!("=== Register map: {} ({} fields) ===\n", map.part, map.len());
    let width = map.fields().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, info) in map.fields() {
        let hi = info.bit_offset + info.bit_width - 1;
        text.push_str(&format!(
            "  {key:<width$}  0x{:08X} [{hi:>2}:{:<2}]  reset 0x{:X}\n",
            info.address, info.bit_offset, info.reset
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_session;

    #[test]
    fn table_lists_fields() {
        let part = load_part("reference", "B0").unwrap();
        let text = table(part.register_map());
        assert!(text.starts_with("=== Register map: reference-B0"));
        assert!(text.contains("MODEM.DIGMIX.DIGMIXFREQ"));
    }

    #[test]
    fn invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.regmap.toml");
        std::fs::write(
            &path,
            r#"part = "bad"

[fields."A.B.C"]
address = 0x100
bit-offset = 30
bit-width = 4
"#,
        )
        .unwrap();
        let session = test_session(dir.path());
        let err = run(&session, Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("32-bit register"));
    }

    #[test]
    fn missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());
        assert!(run(&session, Some(&dir.path().join("none.toml"))).is_err());
    }
}
