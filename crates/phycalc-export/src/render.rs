//! Renderers for [`PhyExport`].

use std::fmt;
use std::str::FromStr;

use crate::error::{ExportError, Result};
use crate::export::{FieldOrigin, FieldValue, PhyExport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Toml,
    #[default]
    Text,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
            OutputFormat::Text => "text",
        }
    }

    /// File extension used when writing exports to a directory.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
            OutputFormat::Text => "txt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "toml" => Ok(OutputFormat::Toml),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub hide_do_not_care: bool,
}

/// Render an export in the requested format.
pub fn render(export: &PhyExport, options: RenderOptions) -> Result<String> {
    let filtered;
    let export = if options.hide_do_not_care {
        filtered = export.without_do_not_care();
        &filtered
    } else {
        export
    };
    match options.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(export)? + "\n"),
        OutputFormat::Toml => Ok(toml::to_string(export)?),
        OutputFormat::Text => Ok(export.to_string()),
    }
}

fn origin_name(origin: FieldOrigin) -> &'static str {
    match origin {
        FieldOrigin::Computed => "computed",
        FieldOrigin::Forced => "forced",
        FieldOrigin::Reset => "reset",
    }
}

impl fmt::Display for PhyExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ({}) ===", self.phy, self.part)?;
        if !self.guid.is_empty() {
            writeln!(f, "GUID: {}", self.guid)?;
        }
        if let Some(target) = &self.points_to {
            writeln!(f, "Points to: {target}")?;
        }

        writeln!(f)?;
        writeln!(f, "--- Register fields ({}) ---", self.fields.len())?;
        let width = self.fields.keys().map(String::len).max().unwrap_or(0);
        for (key, field) in &self.fields {
            let value = match field.value {
                FieldValue::Value(v) if field.hex => format!("0x{v:X}"),
                FieldValue::Value(v) => v.to_string(),
                FieldValue::DontCare => "-".to_string(),
            };
            let origin = if field.value.is_do_not_care() {
                "don't care"
            } else {
                origin_name(field.origin)
            };
            writeln!(f, "  {key:<width$}  {value:>12}  {origin}")?;
        }

        if !self.outputs.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Software outputs ---")?;
            for (name, value) in &self.outputs {
                writeln!(f, "  {name} = {value}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Register words ---")?;
        for word in &self.registers {
            writeln!(
                f,
                "  0x{:08X}: 0x{:08X}  care 0x{:08X}",
                word.address, word.value, word.care_mask
            )?;
        }

        if !self.diagnostics.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Diagnostics ({}) ---", self.diagnostics.len())?;
            for d in &self.diagnostics {
                writeln!(f, "  {d}")?;
            }
        }
        Ok(())
    }
}
