use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use bevy::prelude::*;
use ordered_float::OrderedFloat;

use crate::error::HydrologyError;
use crate::raster::Raster;

use super::extract::{Extractor, FlowExtractor, RainfallExtractor};
use super::lake::Lake;
use super::node::FlowNode;

/// Neighbour scan order as (row offset, col offset). The first strictly
/// lowest neighbour in this order wins, so it decides routing on ties.
const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Single-flow-direction drainage network over a raster.
///
/// Owns one `FlowNode` per cell in a flat row-major arena. Every node drains
/// to at most one neighbour; pits drain nowhere. Pits on the grid boundary are
/// where water leaves the modelled area; interior pits are grown into lakes
/// by `calculate_lakes`.
#[derive(Resource, Debug, Clone)]
pub struct DrainageGraph {
    nodes: Vec<FlowNode>,
    rows: usize,
    cols: usize,
    origin: (f64, f64),
    cell_size: f64,
    lakes: Vec<Lake>,
    /// Cells that belong to an already resolved lake.
    claimed: Vec<bool>,
}

impl DrainageGraph {
    /// Wrap every cell of `raster` in a node and link it to its lowest
    /// strictly-lower neighbour.
    pub fn new(raster: &Raster) -> Self {
        let (rows, cols) = raster.shape();
        let (ox, oy) = raster.origin();
        let cell_size = raster.cell_size();

        let mut nodes = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let position = (
                    ox + col as f64 * cell_size,
                    oy + row as f64 * cell_size,
                );
                nodes.push(FlowNode::new(row, col, position, raster.get(row, col)));
            }
        }

        let mut graph = Self {
            nodes,
            rows,
            cols,
            origin: raster.origin(),
            cell_size,
            lakes: Vec::new(),
            claimed: vec![false; rows * cols],
        };
        graph.set_downstream_links();
        graph
    }

    fn set_downstream_links(&mut self) {
        for idx in 0..self.nodes.len() {
            if let Some(low) = self.lowest_neighbour(idx) {
                if self.nodes[low].elevation() < self.nodes[idx].elevation() {
                    self.set_downstream(idx, Some(low));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Grid queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn node(&self, row: usize, col: usize) -> &FlowNode {
        &self.nodes[self.index(row, col)]
    }

    #[inline]
    pub fn node_at(&self, index: usize) -> &FlowNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    /// Resolved lakes in the order they were grown.
    pub fn lakes(&self) -> &[Lake] {
        &self.lakes
    }

    #[inline]
    pub fn is_boundary(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        node.row() == 0
            || node.col() == 0
            || node.row() + 1 == self.rows
            || node.col() + 1 == self.cols
    }

    /// Returns up to 8 neighbours and the count of valid entries.
    /// Use `&result[..count]` to iterate over valid neighbours.
    pub fn neighbours(&self, index: usize) -> ([usize; 8], usize) {
        let row = (index / self.cols) as isize;
        let col = (index % self.cols) as isize;
        let mut result = [0; 8];
        let mut count = 0;
        for (dr, dc) in NEIGHBOUR_OFFSETS {
            let r = row + dr;
            let c = col + dc;
            if r >= 0 && c >= 0 && (r as usize) < self.rows && (c as usize) < self.cols {
                result[count] = r as usize * self.cols + c as usize;
                count += 1;
            }
        }
        (result, count)
    }

    /// Lowest neighbour in scan order, or `None` on a 1x1 grid.
    pub fn lowest_neighbour(&self, index: usize) -> Option<usize> {
        let (neighbours, count) = self.neighbours(index);
        let mut lowest: Option<usize> = None;
        for &n in &neighbours[..count] {
            if lowest.map_or(true, |l| self.nodes[n].elevation() < self.nodes[l].elevation()) {
                lowest = Some(n);
            }
        }
        lowest
    }

    /// All pits in row-major order.
    pub fn pits(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].is_pit())
            .collect()
    }

    /// Pits on the grid edge, where water leaves the grid.
    pub fn boundary_pits(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].is_pit() && self.is_boundary(i))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    /// Point `index` at `target` (or make it a pit), keeping the upstream
    /// back-links of the old and new targets in step.
    pub fn set_downstream(&mut self, index: usize, target: Option<usize>) {
        debug_assert_ne!(Some(index), target, "node cannot drain into itself");
        if let Some(old) = self.nodes[index].downstream() {
            self.nodes[old].remove_upstream(index);
        }
        if let Some(new) = target {
            self.nodes[new].add_upstream(index);
        }
        self.nodes[index].set_downstream_link(target);
    }

    /// First node found on a downstream cycle, if any.
    pub fn find_cycle(&self) -> Option<usize> {
        // 0 = unvisited, 1 = on the current walk, 2 = known to reach a pit
        let mut state = vec![0u8; self.nodes.len()];
        let mut walk = Vec::new();
        for start in 0..self.nodes.len() {
            let mut current = Some(start);
            while let Some(idx) = current {
                match state[idx] {
                    1 => return Some(idx),
                    2 => break,
                    _ => {
                        state[idx] = 1;
                        walk.push(idx);
                        current = self.nodes[idx].downstream();
                    }
                }
            }
            for idx in walk.drain(..) {
                state[idx] = 2;
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Rainfall and flow
    // -----------------------------------------------------------------------

    /// Assign per-cell rainfall. The grid must match the graph shape exactly.
    pub fn add_rainfall(&mut self, rainfall: &Raster) -> Result<(), HydrologyError> {
        if rainfall.shape() != self.shape() {
            return Err(HydrologyError::ShapeMismatch {
                expected: self.shape(),
                found: rainfall.shape(),
            });
        }
        for (node, &rain) in self.nodes.iter_mut().zip(rainfall.data()) {
            node.set_rainfall(rain);
        }
        Ok(())
    }

    /// Assign the same rainfall to every cell.
    pub fn add_constant_rainfall(&mut self, rain: f64) {
        for node in &mut self.nodes {
            node.set_rainfall(rain);
        }
    }

    fn own_contribution(&self, index: usize, constant_rain: Option<f64>) -> f64 {
        constant_rain
            .or(self.nodes[index].rainfall())
            .unwrap_or(0.0)
    }

    /// Water passing through `index`: its own contribution plus the flow of
    /// every upstream node.
    ///
    /// Walks the upstream tree with an explicit stack, summing children in
    /// the same order a recursive definition would.
    pub fn flow(&self, index: usize, constant_rain: Option<f64>) -> f64 {
        // (node, next upstream slot to visit, running total)
        let mut frames = vec![(index, 0usize, self.own_contribution(index, constant_rain))];
        let mut total = 0.0;
        while let Some(&(node, next, acc)) = frames.last() {
            if let Some(&up) = self.nodes[node].upstream().get(next) {
                if let Some(top) = frames.last_mut() {
                    top.1 += 1;
                }
                debug_assert!(frames.len() <= self.nodes.len(), "upstream cycle at {up}");
                frames.push((up, 0, self.own_contribution(up, constant_rain)));
            } else {
                frames.pop();
                match frames.last_mut() {
                    Some(parent) => parent.2 += acc,
                    None => total = acc,
                }
            }
        }
        total
    }

    /// Largest recorded-rainfall flow and the first node (row-major) reaching it.
    pub fn maximum_flow(&self) -> (f64, usize) {
        let extractor = FlowExtractor::recorded();
        let mut best = (f64::NEG_INFINITY, 0);
        for idx in 0..self.nodes.len() {
            let flow = extractor.value(self, idx);
            if flow > best.0 {
                best = (flow, idx);
            }
        }
        best
    }

    /// Sum of recorded rainfall over all cells.
    pub fn total_rainfall(&self) -> f64 {
        (0..self.nodes.len())
            .map(|idx| RainfallExtractor.value(self, idx))
            .sum()
    }

    /// Sum of recorded-rainfall flow leaving the grid through boundary pits.
    pub fn total_flow(&self) -> f64 {
        let extractor = FlowExtractor::recorded();
        self.boundary_pits()
            .into_iter()
            .map(|idx| extractor.value(self, idx))
            .sum()
    }

    /// Apply `extractor` to every cell, row-major.
    pub fn extract_values(&self, extractor: &impl Extractor) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| extractor.value(self, self.index(row, col)))
                    .collect()
            })
            .collect()
    }

    /// `extract_values` as a raster sharing the graph's georeference.
    pub fn extract_raster(&self, extractor: &impl Extractor) -> Result<Raster, HydrologyError> {
        let data = (0..self.nodes.len())
            .map(|idx| extractor.value(self, idx))
            .collect();
        Raster::new(self.rows, self.cols, data, self.origin, self.cell_size)
    }

    /// Every drainage link as (upstream position, downstream position).
    pub fn stream_edges(&self) -> Vec<((f64, f64), (f64, f64))> {
        self.nodes
            .iter()
            .filter_map(|node| {
                node.downstream()
                    .map(|down| (node.position(), self.nodes[down].position()))
            })
            .collect()
    }

    /// Number of cells carrying lake water.
    pub fn lake_cells(&self) -> usize {
        self.nodes.iter().filter(|n| n.lake_depth() > 0.0).count()
    }

    pub fn max_lake_depth(&self) -> f64 {
        self.nodes
            .iter()
            .map(FlowNode::lake_depth)
            .fold(0.0, f64::max)
    }

    // -----------------------------------------------------------------------
    // Lakes
    // -----------------------------------------------------------------------

    /// Grow a lake from every unclaimed interior pit in row-major order, then
    /// re-route drainage inside each lake toward its outlet. Pits swallowed by
    /// an earlier lake are skipped.
    ///
    /// Returns the number of lakes added by this call.
    pub fn calculate_lakes(&mut self) -> Result<usize, HydrologyError> {
        let start = self.lakes.len();
        for pit in self.pits() {
            if self.is_boundary(pit) || !self.nodes[pit].is_pit() || self.claimed[pit] {
                continue;
            }
            let lake = self.create_lake(pit)?;
            for &idx in lake.members() {
                self.claimed[idx] = true;
            }
            self.lakes.push(lake);
        }

        let lakes = std::mem::take(&mut self.lakes);
        for lake in &lakes[start..] {
            self.set_lake_downstream(lake);
        }
        // A lake whose outlet was flooded by a later lake is re-routed by that
        // lake, so only the last word on each outlet is checked.
        let checked = lakes[start..].iter().enumerate().try_for_each(|(i, lake)| {
            let superseded = lake.outlet().is_some_and(|outlet| {
                lakes[start + i + 1..].iter().any(|later| later.contains(outlet))
            });
            if superseded {
                Ok(())
            } else {
                self.check_lake_outlet(lake)
            }
        });
        self.lakes = lakes;
        checked?;

        if let Some(idx) = self.find_cycle() {
            let node = &self.nodes[idx];
            return Err(HydrologyError::DrainageCycle {
                row: node.row(),
                col: node.col(),
            });
        }

        let added = self.lakes.len() - start;
        info!(
            "Resolved {} lakes covering {} cells ({} boundary pits)",
            added,
            self.lake_cells(),
            self.boundary_pits().len()
        );
        Ok(added)
    }

    /// Grow one lake from the pit at `seed` and finalise it.
    ///
    /// Growth commits the lowest frontier cell until a boundary pit is
    /// committed. If the frontier runs dry first (the basin covers every
    /// reachable cell), the first boundary cell committed becomes the
    /// terminus instead.
    pub fn create_lake(&mut self, seed: usize) -> Result<Lake, HydrologyError> {
        if self.claimed[seed] {
            let node = &self.nodes[seed];
            return Err(HydrologyError::AlreadyClaimed {
                row: node.row(),
                col: node.col(),
            });
        }
        let mut lake = Lake::new(seed, &self.nodes)?;
        let (neighbours, count) = self.neighbours(seed);
        lake.add_neighbours(&neighbours[..count], &self.nodes);

        loop {
            let Some(lowest) = lake.commit_lowest() else {
                let terminus = lake
                    .members()
                    .iter()
                    .position(|&idx| self.is_boundary(idx))
                    .ok_or_else(|| {
                        let node = &self.nodes[seed];
                        HydrologyError::UnresolvedOutlet {
                            row: node.row(),
                            col: node.col(),
                        }
                    })?;
                let node = &self.nodes[seed];
                warn!(
                    "Basin at ({}, {}) never reaches a boundary pit; spilling at its first edge cell",
                    node.row(),
                    node.col()
                );
                lake.truncate_after(terminus);
                break;
            };
            let (neighbours, count) = self.neighbours(lowest);
            lake.add_neighbours(&neighbours[..count], &self.nodes);
            if self.nodes[lowest].is_pit() && self.is_boundary(lowest) {
                break;
            }
        }

        lake.finalise(&mut self.nodes)?;
        if let Some(outlet) = lake.outlet() {
            let node = &self.nodes[outlet];
            debug!(
                "Lake from ({}, {}): {} cells, outlet ({}, {}) at {:.3}",
                self.nodes[seed].row(),
                self.nodes[seed].col(),
                lake.len(),
                node.row(),
                node.col(),
                node.elevation()
            );
        }
        Ok(lake)
    }

    /// Re-link every lake member toward the outlet, growing outward through
    /// lake cells only, then point the outlet out of the lake.
    ///
    /// Cells are expanded in order of distance from the outlet; each newly
    /// reached member drains into the cell that reached it.
    pub fn set_lake_downstream(&mut self, lake: &Lake) {
        let Some(outlet) = lake.outlet() else {
            return;
        };

        let mut reached: HashSet<usize> = HashSet::from([outlet]);
        let mut to_check: BinaryHeap<Reverse<(OrderedFloat<f64>, u64, usize)>> = BinaryHeap::new();
        to_check.push(Reverse((OrderedFloat(0.0), 0, outlet)));
        let mut seq = 1;

        while let Some(Reverse((_, _, current))) = to_check.pop() {
            let (neighbours, count) = self.neighbours(current);
            for &n in &neighbours[..count] {
                if lake.contains(n) && reached.insert(n) {
                    self.set_downstream(n, Some(current));
                    let d = self.nodes[outlet].distance(&self.nodes[n]);
                    to_check.push(Reverse((OrderedFloat(d), seq, n)));
                    seq += 1;
                }
            }
        }

        let target = self.outlet_target(lake, outlet);
        self.set_downstream(outlet, target);
    }

    /// Where the outlet spills: its lowest non-member neighbour if strictly
    /// lower. Otherwise a boundary outlet stays an exit and an interior one
    /// may spill sideways onto an equal neighbour.
    fn outlet_target(&self, lake: &Lake, outlet: usize) -> Option<usize> {
        let level = self.nodes[outlet].elevation();
        let (neighbours, count) = self.neighbours(outlet);
        let mut lowest: Option<usize> = None;
        for &n in &neighbours[..count] {
            if lake.contains(n) {
                continue;
            }
            if lowest.map_or(true, |l| self.nodes[n].elevation() < self.nodes[l].elevation()) {
                lowest = Some(n);
            }
        }
        let lowest = lowest?;
        let spill = self.nodes[lowest].elevation();
        if spill < level || (spill == level && !self.is_boundary(outlet)) {
            Some(lowest)
        } else {
            None
        }
    }

    /// The outlet must drain out of the lake (or be a boundary exit), and the
    /// member committed just before it must drain.
    fn check_lake_outlet(&self, lake: &Lake) -> Result<(), HydrologyError> {
        let Some(outlet) = lake.outlet() else {
            return Ok(());
        };
        let unresolved = |idx: usize| {
            let node = &self.nodes[idx];
            HydrologyError::UnresolvedOutlet {
                row: node.row(),
                col: node.col(),
            }
        };
        if self.nodes[outlet].is_pit() && !self.is_boundary(outlet) {
            return Err(unresolved(outlet));
        }
        let members = lake.members();
        if members.len() >= 2 && self.nodes[members[members.len() - 2]].is_pit() {
            return Err(unresolved(members[members.len() - 2]));
        }
        Ok(())
    }
}
