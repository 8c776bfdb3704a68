//! Export of calculated PHYs.
//!
//! [`PhyExport`] is built from a finished model: every register field of
//! the part as a value or `DontCare`, the software outputs, and the packed
//! register words firmware writes. [`render`] turns it into JSON, TOML or a
//! terminal-friendly text report.

pub mod error;
pub mod export;
pub mod render;

pub use error::{ExportError, Result};
pub use export::{
    export_fields, pack_registers, software_outputs, ExportedField, FieldOrigin, FieldValue, PhyExport,
    RegisterWord,
};
pub use render::{render, OutputFormat, RenderOptions};
