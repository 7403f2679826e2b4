//! Containment tree over decomposed sub-paths.
//!
//! Nodes are inserted largest first. A node is nested under the deepest
//! existing node that contains it; even depths are material, odd depths are
//! voids cut through the material above them.

use crate::svg_path::PathData;
use signcut_core::geometry::{point_in_polygon, polygon_centroid};
use signcut_core::{BBox, Budget, Point, Result};
use tracing::warn;

/// Bounding-box slack for containment, in drawing units
pub const CONTAINMENT_EPS: f64 = 0.1;

/// Default cap on tree depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default cap on node count
pub const DEFAULT_MAX_NODES: usize = 20_000;

/// Material or void, from depth parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeRole {
    Solid,
    Hole,
}

impl ShapeRole {
    pub fn from_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            ShapeRole::Solid
        } else {
            ShapeRole::Hole
        }
    }
}

/// One decomposed sub-path
#[derive(Debug, Clone)]
pub struct ShapeNode {
    /// Unscaled path data
    pub path: PathData,
    /// Unscaled bounds
    pub bbox: BBox,
    /// Bounds after metric scaling
    pub scaled_bbox: BBox,
    /// Boundary samples in drawing units
    pub polygon: Vec<Point>,
    /// Bounding-box area
    pub area: f64,
    pub fill: String,
    pub depth: usize,
    pub children: Vec<usize>,
}

impl ShapeNode {
    pub fn role(&self) -> ShapeRole {
        ShapeRole::from_depth(self.depth)
    }

    /// Whether `other` lies inside this node.
    ///
    /// Bounds must nest, and then either the centroid of `other` or one of
    /// its first, middle or last samples must fall inside this polygon.
    pub fn contains(&self, other: &ShapeNode) -> bool {
        if !self.bbox.contains_bbox(&other.bbox, CONTAINMENT_EPS) {
            return false;
        }

        if let Some(c) = polygon_centroid(&other.polygon) {
            if point_in_polygon(c, &self.polygon) {
                return true;
            }
        }

        let n = other.polygon.len();
        if n == 0 {
            return false;
        }
        [0, n / 2, n - 1]
            .iter()
            .any(|&i| point_in_polygon(other.polygon[i], &self.polygon))
    }
}

/// Arena-backed containment forest
#[derive(Debug, Clone, Default)]
pub struct ShapeTree {
    nodes: Vec<ShapeNode>,
    roots: Vec<usize>,
    max_depth: usize,
    max_nodes: usize,
    warnings: Vec<String>,
}

impl ShapeTree {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES)
    }

    pub fn with_limits(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
            max_nodes,
            ..Default::default()
        }
    }

    /// Build from nodes already sorted by area, largest first.
    pub fn build(mut self, shapes: Vec<ShapeNode>, budget: &Budget) -> Result<Self> {
        let total = shapes.len();
        for (i, shape) in shapes.into_iter().enumerate() {
            if i >= self.max_nodes {
                let msg = format!(
                    "Shape limit of {} reached, {} smaller shapes ignored",
                    self.max_nodes,
                    total - i
                );
                warn!("{}", msg);
                self.warnings.push(msg);
                break;
            }
            budget.checkpoint()?;
            self.insert(shape);
        }
        Ok(self)
    }

    fn insert(&mut self, mut shape: ShapeNode) {
        let mut parent: Option<usize> = None;
        let mut depth = 0;

        loop {
            if depth >= self.max_depth {
                let msg = format!("Nesting depth limit of {} reached", self.max_depth);
                warn!("{}", msg);
                self.warnings.push(msg);
                break;
            }
            let level = match parent {
                Some(p) => &self.nodes[p].children,
                None => &self.roots,
            };
            let found = level
                .iter()
                .copied()
                .find(|&idx| self.nodes[idx].contains(&shape));
            match found {
                Some(idx) => {
                    parent = Some(idx);
                    depth += 1;
                }
                None => break,
            }
        }

        shape.depth = depth;
        let idx = self.nodes.len();
        self.nodes.push(shape);
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
    }

    pub fn nodes(&self) -> &[ShapeNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &ShapeNode {
        &self.nodes[idx]
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk yielding every solid node with its direct hole children.
    pub fn solids(&self) -> Vec<(usize, Vec<usize>)> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.role() == ShapeRole::Solid {
                out.push((idx, node.children.clone()));
                // Islands inside this solid's holes come after it.
                for &hole in node.children.iter().rev() {
                    for &island in self.nodes[hole].children.iter().rev() {
                        stack.push(island);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_node(x: f64, y: f64, s: f64) -> ShapeNode {
        let polygon = vec![
            Point::new(x, y),
            Point::new(x + s, y),
            Point::new(x + s, y + s),
            Point::new(x, y + s),
            Point::new(x, y),
        ];
        let bbox = BBox::new(x, y, s, s);
        ShapeNode {
            path: PathData::polygon(&polygon[..4], true),
            bbox,
            scaled_bbox: bbox,
            polygon,
            area: s * s,
            fill: "#000".into(),
            depth: 0,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_nested_depths() {
        let shapes = vec![
            square_node(0.0, 0.0, 100.0),
            square_node(10.0, 10.0, 60.0),
            square_node(20.0, 20.0, 20.0),
            square_node(80.0, 80.0, 10.0),
        ];
        let tree = ShapeTree::new().build(shapes, &Budget::unlimited()).unwrap();
        let depths: Vec<usize> = tree.nodes().iter().map(|n| n.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);
        assert_eq!(tree.roots(), &[0]);
        assert_eq!(tree.node(2).role(), ShapeRole::Solid);
    }

    #[test]
    fn test_disjoint_roots() {
        let shapes = vec![square_node(0.0, 0.0, 10.0), square_node(50.0, 0.0, 10.0)];
        let tree = ShapeTree::new().build(shapes, &Budget::unlimited()).unwrap();
        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.solids().len(), 2);
    }

    #[test]
    fn test_solids_include_islands() {
        let shapes = vec![
            square_node(0.0, 0.0, 100.0),
            square_node(10.0, 10.0, 60.0),
            square_node(20.0, 20.0, 20.0),
        ];
        let tree = ShapeTree::new().build(shapes, &Budget::unlimited()).unwrap();
        let solids = tree.solids();
        assert_eq!(solids.len(), 2);
        assert_eq!(solids[0], (0, vec![1]));
        assert_eq!(solids[1], (2, vec![]));
    }

    #[test]
    fn test_node_limit() {
        let shapes = vec![
            square_node(0.0, 0.0, 10.0),
            square_node(20.0, 0.0, 10.0),
            square_node(40.0, 0.0, 10.0),
        ];
        let tree = ShapeTree::with_limits(8, 2)
            .build(shapes, &Budget::unlimited())
            .unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.warnings().len(), 1);
    }

    #[test]
    fn test_budget_cancels_build() {
        let shapes = vec![square_node(0.0, 0.0, 10.0), square_node(20.0, 0.0, 10.0)];
        let budget = Budget::unlimited().with_max_steps(1);
        let err = ShapeTree::new().build(shapes, &budget).unwrap_err();
        assert!(err.is_cancelled());
    }
}
