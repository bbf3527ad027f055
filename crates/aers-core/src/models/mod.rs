//! Domain types for the adverse-event intake core.

mod draft;
mod patch;
mod report;
mod turn;

pub use draft::*;
pub use patch::*;
pub use report::*;
pub use turn::*;
