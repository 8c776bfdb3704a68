//! `phycalc phys` and `phycalc describe`.

use anyhow::{bail, Result};
use phycalc_model::Phy;
use phycalc_parts::GroupKind;

use super::Session;

pub fn list(session: &Session, group: Option<&str>, kind: Option<GroupKind>) -> Result<()> {
    let configurator = session.configurator()?;
    let mut groups: Vec<&str> = match group {
        Some(g) if configurator.groups().contains(&g) => vec![g],
        Some(g) => bail!("no PHY group '{g}' in {}", configurator.part().part_name()),
        None => configurator.groups(),
    };
    if let Some(kind) = kind {
        let of_kind = configurator.groups_of_kind(kind);
        groups.retain(|g| of_kind.contains(g));
        if groups.is_empty() {
            bail!("no {kind} PHY groups in {}", configurator.part().part_name());
        }
    }

    println!("PHYs of {}:", configurator.part().part_name());
    for group in groups {
        println!();
        println!("  [{group}]");
        for name in configurator.phys_in_group(group) {
            let guid = configurator.part().find_phy(name).map(|r| r.guid()).unwrap_or_default();
            if configurator.supports_phy(name)? {
                println!("    {name:<40} {guid}");
            } else {
                println!("    {name:<40} {guid}  (not on this target)");
            }
        }
    }
    Ok(())
}

pub fn describe(session: &Session, phy: &str) -> Result<()> {
    let phy = session.configurator()?.describe(phy)?;
    print!("{}", describe_text(&phy));
    Ok(())
}

fn describe_text(phy: &Phy) -> String {
    let mut text = String::new();
    text.push_str(&format!("=== {} ===\n", phy.name));
    text.push_str(&format!("Readable name: {}\n", phy.readable_name));
    text.push_str(&format!("GUID:          {}\n", phy.guid));
    text.push_str(&format!("Group:         {}\n", phy.group));
    text.push_str(&format!("Profile:       {}\n", phy.profile));
    if let Some(target) = &phy.points_to {
        text.push_str(&format!("Points to:     {target}\n"));
    }
    if !phy.tags.is_empty() {
        text.push_str(&format!("Tags:          {}\n", phy.tags.join(", ")));
    }
    if !phy.description.is_empty() {
        text.push_str(&format!("\n{}\n", phy.description));
    }

    text.push_str(&format!("\n--- Inputs ({}) ---\n", phy.inputs.len()));
    for (name, value) in &phy.inputs {
        text.push_str(&format!("  {name} = {value}\n"));
    }
    if !phy.overrides.is_empty() {
        text.push_str(&format!("\n--- Overrides ({}) ---\n", phy.overrides.len()));
        for (name, value) in &phy.overrides {
            text.push_str(&format!("  {name} = {value}\n"));
        }
    }
    text
}
