//! Single-flow-direction drainage over a raster.
//!
//! Every cell becomes a `FlowNode` that drains into its lowest strictly-lower
//! neighbour. Cells with nowhere lower to go are pits. Pits on the grid edge
//! let water leave the grid; interior pits are resolved into lakes:
//!   1. The basin grows from the pit by annexing its lowest frontier cell
//!      until it reaches a boundary pit.
//!   2. The highest annexed cell becomes the outlet and the basin below it is
//!      flooded to the outlet's level.
//!   3. Every lake cell is re-linked toward the outlet and the outlet spills
//!      out of the lake.
//!
//! After resolution every drop of rain reaches a boundary pit, so total
//! outflow equals total rainfall.

pub mod extract;
pub mod graph;
pub mod lake;
pub mod node;


pub use extract::{
    ElevationExtractor, Extractor, FlowExtractor, LakeDepthExtractor, RainfallExtractor,
};
pub use graph::DrainageGraph;
pub use lake::Lake;
pub use node::FlowNode;
