pub mod cell;
pub mod shoreline;

pub use cell::{Cell, SamplePoint};
pub use shoreline::{Corridor, SanitizedShoreline, Shoreline};
