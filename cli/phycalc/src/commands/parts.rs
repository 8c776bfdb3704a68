//! `phycalc parts`: part families and revisions.

use anyhow::Result;
use phycalc_parts::{families, load_part, revisions};

pub fn list() -> Result<()> {
    println!("Part families:");
    println!();
    for family in families() {
        for revision in revisions(family)? {
            let part = load_part(family, revision)?;
            println!(
                "  {:<20} {} fields, {} calculators, {} PHYs",
                part.part_name(),
                part.register_map().len(),
                part.calculators().len(),
                part.phys().len(),
            );
        }
    }
    println!();
    println!("Select one with --family/--revision or [part] in phycalc.toml.");
    Ok(())
}
