//! `phycalc sweep`: calculate many PHYs in parallel.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use phycalc_export::{render, OutputFormat, PhyExport, RenderOptions};
use phycalc_parts::CalculatedPhy;

use super::Session;

pub fn run(session: &Session, group: Option<&str>, output_dir: Option<&Path>, format: Option<&str>) -> Result<()> {
    let configurator = session.configurator()?;
    let names = match group {
        Some(g) => configurator
            .phys_in_group(g)
            .into_iter()
            .filter(|name| configurator.supports_phy(name).unwrap_or(true))
            .collect(),
        None => configurator.sweepable_phys(),
    };
    if names.is_empty() {
        bail!("no PHYs to calculate in {}", configurator.part().part_name());
    }

    let options = RenderOptions {
        format: session.output_format(format)?,
        hide_do_not_care: !session.config.output.show_do_not_care,
    };
    let dir: Option<PathBuf> = output_dir
        .map(Path::to_path_buf)
        .or_else(|| session.config.output.dir.as_ref().map(|d| session.project_dir.join(d)));
    if let Some(dir) = &dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    println!("Sweeping {} PHYs of {}", names.len(), configurator.part().part_name());
    let results = configurator.sweep(&names);
    let mut failed = 0;
    for result in &results {
        let outcome = result
            .outcome
            .as_ref()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .and_then(|calc| write_export(calc, dir.as_deref(), options).map(|_| calc));
        match outcome {
            Ok(calc) => println!(
                "  ok      {:<40} {} passes, {} diagnostics",
                result.phy, calc.report.passes, calc.report.diagnostics
            ),
            Err(e) => {
                failed += 1;
                println!("  FAILED  {:<40} {e:#}", result.phy);
            }
        }
    }

    println!();
    println!("{} of {} PHYs calculated", results.len() - failed, results.len());
    if failed > 0 {
        bail!("{failed} PHY(s) failed");
    }
    Ok(())
}

fn write_export(calc: &CalculatedPhy, dir: Option<&Path>, options: RenderOptions) -> Result<()> {
    let export = PhyExport::from_model(&calc.model, &calc.phy)?;
    if let Some(dir) = dir {
        let path = dir.join(export_file_name(&export.phy, options.format));
        fs::write(&path, render(&export, options)?).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn export_file_name(phy: &str, format: OutputFormat) -> String {
    format!("{phy}.{}", format.extension())
}
