pub mod buffer;
pub mod projection;
pub mod simplify;

pub use buffer::{BufferStyle, buffer_line, disk, union_all};
pub use projection::Projector;
pub use simplify::simplify_ring;

use geo::LineString;

/// Planar length of a line string in coordinate units
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| {
            let d = segment.delta();
            d.x.hypot(d.y)
        })
        .sum()
}
