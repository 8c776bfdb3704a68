//! PHY composition for phycalc.
//!
//! - [`BuildContext`] tracks which PHY is being built so nested PHY routines
//!   extend their caller's PHY instead of creating a new one
//! - [`Profile`] describes the inputs a PHY binds and the outputs it may
//!   override
//! - [`load_phy`] turns a PHY's bindings into forced model values before the
//!   engine runs

pub mod context;
pub mod error;
pub mod inputs;
pub mod profile;

pub use context::{BuildContext, Frame, PhyDef};
pub use error::ComposeError;
pub use inputs::{load_phy, load_profile, parse_assignment, parse_input_value};
pub use profile::{InputCategory, Profile, ProfileInput};
