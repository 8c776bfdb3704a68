//! Variable and model registry for the phycalc radio configurator.
//!
//! A [`Model`] is the shared, typed variable pool that calculation units read
//! and write. It holds:
//! - **Variables:** named values with a semantic kind, a computed value, an
//!   optional forced override, a hardware default and a do-not-care flag
//! - **Enums:** append-only member tables referenced by enumerated variables
//! - **PHYs:** named radio configuration variants built by PHY routines
//! - **Register metadata:** an immutable table keyed by
//!   `PERIPHERAL.REGISTER.FIELD`, shared between models
//!
//! Everything is insertion-ordered so exports and debug dumps are stable.

pub mod diagnostics;
pub mod enums;
pub mod error;
pub mod model;
pub mod phy;
pub mod regmap;
pub mod value;
pub mod variable;

pub use diagnostics::{Diagnostic, Severity};
pub use enums::{EnumDef, EnumMember};
pub use error::ModelError;
pub use model::{Model, VariableHandle};
pub use phy::{phy_guid, Phy, PhyHandle, PRODUCTION_MARKER};
pub use regmap::{field_key_to_var_name, AccessMode, FieldInfo, RegisterMap, ValidationIssue};
pub use value::{Shape, Value, VarFormat, VarKind};
pub use variable::{VarRole, Variable, VariableSpec};
