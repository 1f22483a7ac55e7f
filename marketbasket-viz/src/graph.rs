// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Rule graphs
//!
//! Each rule becomes a node `R{i}` sitting between its items: every
//! antecedent item points at the rule node and the rule node points at every
//! consequent item. Items shared between rules are a single node.

use crate::edge::{EdgePath, EdgeStyle, Point};
use crate::error::{Result, VizError};
use marketbasket_core::{Metric, RuleTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Rule,
    Item,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
}

/// Directed edge between two node indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    /// Position of the originating rule in the table
    pub rule: usize,
    /// The table metric's value for that rule
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RuleGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<(NodeKind, String), usize>,
    edges: Vec<GraphEdge>,
    metric: Option<Metric>,
}

impl RuleGraph {
    /// Build the graph for the first `rules_to_show` rules of a table
    pub fn from_table(table: &RuleTable, rules_to_show: usize) -> Self {
        let mut graph = Self {
            metric: Some(table.metric),
            ..Self::default()
        };

        for (i, rule) in table.iter().take(rules_to_show).enumerate() {
            let weight = rule.metric(table.metric);
            let rule_node = graph.intern(NodeKind::Rule, format!("R{}", i));

            for item in rule.antecedent.iter() {
                let from = graph.intern(NodeKind::Item, item.to_string());
                graph.edges.push(GraphEdge {
                    from,
                    to: rule_node,
                    rule: i,
                    weight,
                });
            }
            for item in rule.consequent.iter() {
                let to = graph.intern(NodeKind::Item, item.to_string());
                graph.edges.push(GraphEdge {
                    from: rule_node,
                    to,
                    rule: i,
                    weight,
                });
            }
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Built rule graph"
        );
        graph
    }

    fn intern(&mut self, kind: NodeKind, id: String) -> usize {
        if let Some(&idx) = self.index.get(&(kind, id.clone())) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert((kind, id.clone()), idx);
        self.nodes.push(GraphNode { id, kind });
        idx
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Metric of the table the graph was built from
    pub fn metric(&self) -> Option<Metric> {
        self.metric
    }

    pub fn node_index(&self, kind: NodeKind, id: &str) -> Option<usize> {
        self.index.get(&(kind, id.to_string())).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lay the graph out, style it, and build the edge geometry
    pub fn render(
        &self,
        layout: &Layout,
        styler: &dyn NodeStyler,
        edge_style: &EdgeStyle,
    ) -> Result<GraphRender> {
        edge_style.validate()?;
        if layout.len() != self.nodes.len() {
            return Err(VizError::LayoutMismatch {
                expected: self.nodes.len(),
                got: layout.len(),
            });
        }

        let nodes = self
            .nodes
            .iter()
            .zip(layout.positions())
            .map(|(node, &position)| {
                let style = styler.style(node);
                RenderedNode {
                    id: node.id.clone(),
                    kind: node.kind,
                    position,
                    label_position: Point::new(position.x, position.y + style.label_offset),
                    style,
                }
            })
            .collect();

        let mut edges = EdgePath::new();
        let mut skipped_edges = 0;
        for edge in &self.edges {
            let start = layout.positions()[edge.from];
            let end = layout.positions()[edge.to];
            if start == end {
                tracing::warn!(
                    from = %self.nodes[edge.from].id,
                    to = %self.nodes[edge.to].id,
                    "Skipping edge between coincident nodes"
                );
                skipped_edges += 1;
                continue;
            }
            edges.push_edge(start, end, edge_style);
        }

        Ok(GraphRender {
            nodes,
            edges,
            skipped_edges,
        })
    }
}

// ===== Layouts =====

/// Node positions, indexed like [`RuleGraph::nodes`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    positions: Vec<Point>,
}

impl Layout {
    pub fn new(positions: Vec<Point>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn get(&self, node: usize) -> Option<Point> {
        self.positions.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Nodes evenly spaced on the unit circle
pub fn circular_layout(graph: &RuleGraph) -> Layout {
    let n = graph.nodes().len();
    if n == 1 {
        return Layout::new(vec![Point::default()]);
    }
    let positions = (0..n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            Point::new(theta.cos(), theta.sin())
        })
        .collect();
    Layout::new(positions)
}

/// Force-directed (Fruchterman-Reingold) layout, deterministic per seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringLayout {
    pub seed: u64,
    pub iterations: usize,
    /// Optimal node distance; `1/sqrt(n)` when unset
    pub k: Option<f64>,
    /// Half-width of the box the result is rescaled into
    pub scale: f64,
}

impl Default for SpringLayout {
    fn default() -> Self {
        Self {
            seed: 42,
            iterations: 50,
            k: None,
            scale: 1.0,
        }
    }
}

impl SpringLayout {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_k(mut self, k: f64) -> Self {
        self.k = Some(k);
        self
    }

    pub fn layout(&self, graph: &RuleGraph) -> Layout {
        let n = graph.nodes().len();
        if n == 0 {
            return Layout::default();
        }
        if n == 1 {
            return Layout::new(vec![Point::default()]);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut pos: Vec<(f64, f64)> = (0..n).map(|_| (rng.gen::<f64>(), rng.gen::<f64>())).collect();

        let k = self.k.unwrap_or_else(|| (1.0 / n as f64).sqrt());
        let initial_temperature = 0.1;
        let cooling = initial_temperature / (self.iterations as f64 + 1.0);
        let mut temperature = initial_temperature;

        for _ in 0..self.iterations {
            let mut disp = vec![(0.0f64, 0.0f64); n];

            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                    let dist = (dx * dx + dy * dy).sqrt().max(0.01);
                    let repulse = k * k / dist;
                    disp[i].0 += dx / dist * repulse;
                    disp[i].1 += dy / dist * repulse;
                }
            }

            // Attraction treats the graph as undirected
            for edge in graph.edges() {
                let (a, b) = (edge.from, edge.to);
                if a == b {
                    continue;
                }
                let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
                let dist = (dx * dx + dy * dy).sqrt().max(0.01);
                let attract = dist * dist / k;
                disp[a].0 -= dx / dist * attract;
                disp[a].1 -= dy / dist * attract;
                disp[b].0 += dx / dist * attract;
                disp[b].1 += dy / dist * attract;
            }

            for (p, d) in pos.iter_mut().zip(&disp) {
                let length = (d.0 * d.0 + d.1 * d.1).sqrt().max(0.01);
                let step = length.min(temperature);
                p.0 += d.0 / length * step;
                p.1 += d.1 / length * step;
            }
            temperature -= cooling;
        }

        Layout::new(rescale(&pos, self.scale))
    }
}

/// Center on the origin and scale so the farthest coordinate is `scale`
fn rescale(pos: &[(f64, f64)], scale: f64) -> Vec<Point> {
    let n = pos.len() as f64;
    let (mx, my) = pos
        .iter()
        .fold((0.0, 0.0), |acc, p| (acc.0 + p.0 / n, acc.1 + p.1 / n));
    let extent = pos
        .iter()
        .map(|p| (p.0 - mx).abs().max((p.1 - my).abs()))
        .fold(0.0f64, f64::max);
    let factor = if extent > 0.0 { scale / extent } else { 0.0 };
    pos.iter()
        .map(|p| Point::new((p.0 - mx) * factor, (p.1 - my) * factor))
        .collect()
}

// ===== Styling =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub color: String,
    pub size: f64,
    /// Vertical distance from the node to its label
    pub label_offset: f64,
}

/// Chooses how each node is drawn
pub trait NodeStyler {
    fn style(&self, node: &GraphNode) -> NodeStyle;
}

impl<F> NodeStyler for F
where
    F: Fn(&GraphNode) -> NodeStyle,
{
    fn style(&self, node: &GraphNode) -> NodeStyle {
        self(node)
    }
}

/// Colors nodes by kind: rules in one color, items in another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindStyler {
    pub rule_color: String,
    pub item_color: String,
    pub size: f64,
    pub label_offset: f64,
}

impl Default for KindStyler {
    fn default() -> Self {
        Self {
            rule_color: "yellow".to_string(),
            item_color: "green".to_string(),
            size: 20.0,
            label_offset: 0.07,
        }
    }
}

impl NodeStyler for KindStyler {
    fn style(&self, node: &GraphNode) -> NodeStyle {
        let color = match node.kind {
            NodeKind::Rule => &self.rule_color,
            NodeKind::Item => &self.item_color,
        };
        NodeStyle {
            color: color.clone(),
            size: self.size,
            label_offset: self.label_offset,
        }
    }
}

// ===== Render output =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Point,
    pub label_position: Point,
    pub style: NodeStyle,
}

/// Everything a plotting frontend needs to draw a rule graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRender {
    pub nodes: Vec<RenderedNode>,
    pub edges: EdgePath,
    /// Edges dropped because both endpoints share a position
    pub skipped_edges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketbasket_core::{run_demo, select, Rule, ItemSet};

    fn set(items: &[&str]) -> ItemSet {
        ItemSet::new(items.iter().copied())
    }

    fn table() -> RuleTable {
        let rules = vec![
            Rule::score(set(&["A"]), set(&["B"]), 0.5, 0.5, 0.75).unwrap(),
            Rule::score(set(&["A", "C"]), set(&["B"]), 0.25, 0.5, 0.75).unwrap(),
        ];
        select(&rules, Metric::Confidence, 0.0)
    }

    #[test]
    fn test_graph_structure() {
        let graph = RuleGraph::from_table(&table(), 10);

        // R0, R1 and items A, B, C
        assert_eq!(graph.nodes().len(), 5);
        assert_eq!(graph.edges().len(), 5);

        let r1 = graph.node_index(NodeKind::Rule, "R1").unwrap();
        let b = graph.node_index(NodeKind::Item, "B").unwrap();
        let incoming: Vec<_> = graph.edges().iter().filter(|e| e.to == r1).collect();
        assert_eq!(incoming.len(), 2);
        assert!(graph.edges().iter().any(|e| e.from == r1 && e.to == b));
        assert_eq!(graph.metric(), Some(Metric::Confidence));
    }

    #[test]
    fn test_rules_to_show_limits_graph() {
        let graph = RuleGraph::from_table(&table(), 1);
        assert_eq!(graph.nodes().len(), 3);
        assert!(graph.node_index(NodeKind::Rule, "R1").is_none());

        let empty = RuleGraph::from_table(&table(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_item_named_like_rule_is_separate_node() {
        let rules = vec![Rule::score(set(&["R0"]), set(&["X"]), 0.5, 0.5, 0.5).unwrap()];
        let graph = RuleGraph::from_table(&select(&rules, Metric::Lift, 0.0), 10);
        assert_eq!(graph.nodes().len(), 3);
        assert_ne!(
            graph.node_index(NodeKind::Rule, "R0"),
            graph.node_index(NodeKind::Item, "R0")
        );
    }

    #[test]
    fn test_circular_layout_on_unit_circle() {
        let graph = RuleGraph::from_table(&table(), 10);
        let layout = circular_layout(&graph);
        assert_eq!(layout.len(), 5);
        for p in layout.positions() {
            assert!(((p.x * p.x + p.y * p.y).sqrt() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spring_layout_is_deterministic_per_seed() {
        let graph = RuleGraph::from_table(&run_demo().unwrap().tables.lift, 10);
        let a = SpringLayout::default().with_seed(7).layout(&graph);
        let b = SpringLayout::default().with_seed(7).layout(&graph);
        let c = SpringLayout::default().with_seed(8).layout(&graph);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), graph.nodes().len());
        for p in a.positions() {
            assert!(p.x.abs() <= 1.0 + 1e-9 && p.y.abs() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_render_styles_and_edges() {
        let graph = RuleGraph::from_table(&table(), 10);
        let layout = circular_layout(&graph);
        let render = graph
            .render(&layout, &KindStyler::default(), &EdgeStyle::default())
            .unwrap();

        assert_eq!(render.nodes.len(), 5);
        assert_eq!(render.edges.strokes(), 5);
        assert_eq!(render.skipped_edges, 0);

        let rule = render.nodes.iter().find(|n| n.id == "R0").unwrap();
        assert_eq!(rule.style.color, "yellow");
        assert!((rule.label_position.y - rule.position.y - 0.07).abs() < 1e-12);
        let item = render.nodes.iter().find(|n| n.kind == NodeKind::Item).unwrap();
        assert_eq!(item.style.color, "green");
    }

    #[test]
    fn test_render_with_closure_styler() {
        let graph = RuleGraph::from_table(&table(), 1);
        let styler = |node: &GraphNode| NodeStyle {
            color: if node.id == "A" { "red".into() } else { "grey".into() },
            size: 10.0,
            label_offset: 0.0,
        };
        let render = graph
            .render(&circular_layout(&graph), &styler, &EdgeStyle::default())
            .unwrap();
        let a = render.nodes.iter().find(|n| n.id == "A").unwrap();
        assert_eq!(a.style.color, "red");
    }

    #[test]
    fn test_render_skips_coincident_nodes() {
        let graph = RuleGraph::from_table(&table(), 1);
        let layout = Layout::new(vec![Point::default(); graph.nodes().len()]);
        let render = graph
            .render(&layout, &KindStyler::default(), &EdgeStyle::default())
            .unwrap();
        assert!(render.edges.is_empty());
        assert_eq!(render.skipped_edges, 2);
    }

    #[test]
    fn test_render_rejects_mismatched_layout() {
        let graph = RuleGraph::from_table(&table(), 10);
        let err = graph
            .render(&Layout::default(), &KindStyler::default(), &EdgeStyle::default())
            .unwrap_err();
        assert!(matches!(err, VizError::LayoutMismatch { expected: 5, got: 0 }));
    }
}
