//! Calculation execution engine for phycalc.
//!
//! Calculation units are plain functions over a [`CalcContext`]. They do not
//! declare what they read or write; the [`Engine`] probes each unit once to
//! discover its access set, orders units so producers run before consumers,
//! and refines that order from what real executions touch until it is
//! stable. Register fields are written through the [`write`] contract.

pub mod context;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod unit;
pub mod write;

pub use context::{Access, CalcContext};
pub use engine::{run, run_hooks, Engine, RunReport};
pub use error::{CalcError, EngineError};
pub use schedule::Schedule;
pub use unit::{CalcFn, CalcUnit};
pub use write::{decode_twos_complement, encode_negative, field_max, resolve_write, WriteOutcome, WritePolicy};
