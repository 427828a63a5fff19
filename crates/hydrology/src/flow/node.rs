use std::fmt;

use crate::error::HydrologyError;

/// Runtime state of one grid cell in the drainage graph.
///
/// Links are arena indices into the owning `DrainageGraph`. The downstream
/// link and the upstream back-links are only ever changed together through
/// `DrainageGraph::set_downstream`.
#[derive(Debug, Clone)]
pub struct FlowNode {
    row: usize,
    col: usize,
    position: (f64, f64),
    elevation: f64,
    rainfall: Option<f64>,
    lake_depth: f64,
    downstream: Option<usize>,
    upstream: Vec<usize>,
}

impl FlowNode {
    pub fn new(row: usize, col: usize, position: (f64, f64), elevation: f64) -> Self {
        Self {
            row,
            col,
            position,
            elevation,
            rainfall: None,
            lake_depth: 0.0,
            downstream: None,
            upstream: Vec::new(),
        }
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn col(&self) -> usize {
        self.col
    }

    /// World `(x, y)` of the cell.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    #[inline]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Recorded rainfall in mm, if any has been assigned.
    #[inline]
    pub fn rainfall(&self) -> Option<f64> {
        self.rainfall
    }

    pub fn set_rainfall(&mut self, rainfall: f64) {
        self.rainfall = Some(rainfall);
    }

    /// Accumulated water depth from lake filling (0 outside lakes).
    #[inline]
    pub fn lake_depth(&self) -> f64 {
        self.lake_depth
    }

    #[inline]
    pub fn downstream(&self) -> Option<usize> {
        self.downstream
    }

    #[inline]
    pub fn upstream(&self) -> &[usize] {
        &self.upstream
    }

    #[inline]
    pub fn num_upstream(&self) -> usize {
        self.upstream.len()
    }

    /// A pit has nowhere to drain.
    #[inline]
    pub fn is_pit(&self) -> bool {
        self.downstream.is_none()
    }

    /// Euclidean distance between cell positions.
    pub fn distance(&self, other: &FlowNode) -> f64 {
        let dx = self.position.0 - other.position.0;
        let dy = self.position.1 - other.position.1;
        (dx * dx + dy * dy).sqrt()
    }

    /// Raise the node to `elevation`, adding the rise to its lake depth.
    pub fn fill(&mut self, elevation: f64) -> Result<(), HydrologyError> {
        if elevation < self.elevation {
            return Err(HydrologyError::FillBelowSurface {
                elevation: self.elevation,
                requested: elevation,
            });
        }
        self.lake_depth += elevation - self.elevation;
        self.elevation = elevation;
        Ok(())
    }

    pub(super) fn set_downstream_link(&mut self, downstream: Option<usize>) {
        self.downstream = downstream;
    }

    pub(super) fn add_upstream(&mut self, index: usize) {
        debug_assert!(!self.upstream.contains(&index));
        self.upstream.push(index);
    }

    pub(super) fn remove_upstream(&mut self, index: usize) {
        if let Some(pos) = self.upstream.iter().position(|&u| u == index) {
            self.upstream.remove(pos);
        }
    }
}

impl fmt::Display for FlowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FlowNode row={}, col={}, elevation={}, downstream=",
            self.row, self.col, self.elevation
        )?;
        match self.downstream {
            Some(index) => write!(f, "#{index}"),
            None => write!(f, "none"),
        }
    }
}
