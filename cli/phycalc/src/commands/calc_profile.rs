//! `phycalc calc-profile`: calculate a profile with no PHY.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use phycalc_compose::parse_assignment;
use phycalc_export::{render, PhyExport, RenderOptions};

use super::Session;

pub fn run(
    session: &Session,
    profile: &str,
    assignments: &[String],
    format: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let mut inputs = IndexMap::new();
    for raw in assignments {
        let (name, value) = parse_assignment(raw)?;
        inputs.insert(name, value);
    }

    let calc = session
        .configurator()?
        .calculate_profile(profile, &inputs)
        .with_context(|| format!("calculating profile {profile}"))?;
    let export = PhyExport::from_profile(&calc.model, &calc.profile)
        .with_context(|| format!("exporting profile {}", calc.profile))?;
    let options = RenderOptions {
        format: session.output_format(format)?,
        hide_do_not_care: !session.config.output.show_do_not_care,
    };
    let text = render(&export, options)?;

    match output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote profile {} to {}", export.phy, path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
