//! Shared data structures for well-log cleaning
//!
//! - `curve`: Curve samples, the missing sentinel, and the Well that owns them
//! - `layer`: Layer intervals, horizon picks and the project layer table
//! - `rules`: Prior bounds, statistical methods and per-curve rule sets
//! - `report`: Cleaning reports emitted by the layered outlier filter

mod curve;
mod layer;
mod report;
mod rules;

pub use curve::*;
pub use layer::*;
pub use report::*;
pub use rules::*;
