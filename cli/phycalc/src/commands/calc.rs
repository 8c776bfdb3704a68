//! `phycalc calc`: calculate one PHY and export it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use phycalc_compose::parse_assignment;
use phycalc_export::{render, PhyExport, RenderOptions};

use super::Session;

pub fn run(
    session: &Session,
    phy: &str,
    assignments: &[String],
    format: Option<&str>,
    output: Option<&Path>,
    hide_do_not_care: bool,
) -> Result<()> {
    let mut inputs = IndexMap::new();
    for raw in assignments {
        let (name, value) = parse_assignment(raw)?;
        inputs.insert(name, value);
    }

    let calc = session
        .configurator()?
        .calculate_phy(phy, &inputs)
        .with_context(|| format!("calculating {phy}"))?;
    let export = PhyExport::from_model(&calc.model, &calc.phy)
        .with_context(|| format!("exporting {}", calc.phy.name))?;
    let options = RenderOptions {
        format: session.output_format(format)?,
        hide_do_not_care: hide_do_not_care || !session.config.output.show_do_not_care,
    };
    let text = render(&export, options)?;

    match output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "Wrote {} ({} fields, {} diagnostics) to {}",
                export.phy,
                export.fields.len(),
                export.diagnostics.len(),
                path.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_session;

    #[test]
    fn writes_json_export_with_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());
        let path = dir.path().join("out.json");
        run(
            &session,
            "PHY_Base_2FSK_100kbps",
            &["bitrate=50000".to_string()],
            Some("json"),
            Some(&path),
            true,
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"phy\": \"PHY_Base_2FSK_100kbps\""));
        assert!(content.contains("\"MODEM.TXBR.TXBRNUM\""));
        // hidden: DSSS is unused for FSK
        assert!(!content.contains("MODEM.DSSS0.DSSS0"));
    }

    #[test]
    fn malformed_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());
        let err = run(
            &session,
            "PHY_Base_2FSK_100kbps",
            &["bitrate".to_string()],
            None,
            Some(&dir.path().join("never.txt")),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bitrate"));
        assert!(!dir.path().join("never.txt").exists());
    }

    #[test]
    fn unknown_phy_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_session(dir.path());
        let err = run(&session, "PHY_Nope", &[], None, None, false).unwrap_err();
        assert!(format!("{err:#}").contains("calculating PHY_Nope"));
    }
}
