use super::graph::DrainageGraph;

/// Projection of one node's state to a reportable scalar.
pub trait Extractor {
    fn value(&self, graph: &DrainageGraph, index: usize) -> f64;
}

/// Total water passing through a node.
///
/// With a constant rain override every cell contributes that amount;
/// otherwise each cell contributes its recorded rainfall (0 if unset).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowExtractor {
    constant_rain: Option<f64>,
}

impl FlowExtractor {
    pub fn new(constant_rain: Option<f64>) -> Self {
        Self { constant_rain }
    }

    pub fn recorded() -> Self {
        Self::new(None)
    }

    pub fn constant(rain: f64) -> Self {
        Self::new(Some(rain))
    }
}

impl Extractor for FlowExtractor {
    fn value(&self, graph: &DrainageGraph, index: usize) -> f64 {
        graph.flow(index, self.constant_rain)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ElevationExtractor;

impl Extractor for ElevationExtractor {
    fn value(&self, graph: &DrainageGraph, index: usize) -> f64 {
        graph.node_at(index).elevation()
    }
}

/// Recorded rainfall; cells without any read as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RainfallExtractor;

impl Extractor for RainfallExtractor {
    fn value(&self, graph: &DrainageGraph, index: usize) -> f64 {
        graph.node_at(index).rainfall().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LakeDepthExtractor;

impl Extractor for LakeDepthExtractor {
    fn value(&self, graph: &DrainageGraph, index: usize) -> f64 {
        graph.node_at(index).lake_depth()
    }
}
