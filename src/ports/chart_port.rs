//! Chart rendering port trait.

use crate::domain::chart::ChartSpec;
use crate::domain::error::PerfchartError;

/// Port for turning a resolved chart description into image bytes.
///
/// Each call must draw on its own surface; nothing may carry over from one
/// chart to the next.
pub trait ChartPort {
    fn render_png(&self, chart: &ChartSpec) -> Result<Vec<u8>, PerfchartError>;
}
