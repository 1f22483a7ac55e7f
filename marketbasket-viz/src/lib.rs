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

//! # Marketbasket Viz
//!
//! Plot-ready geometry for mined rule tables. Nothing here draws pixels:
//! the output is coordinates, path breaks and node styles that any plotting
//! frontend can consume.
//!
//! - [`edge`]: shortened line segments with optional arrowheads
//! - [`graph`]: rule graphs, layouts, node styling and rendering
//! - [`heatmap`]: antecedent x consequent metric grids

pub mod edge;
pub mod error;
pub mod graph;
pub mod heatmap;

pub use edge::{build_edge, ArrowPosition, EdgePath, EdgeStyle, Point, MARKER_SIZE_CONVERSION};
pub use error::{Result, VizError};
pub use graph::{
    circular_layout, GraphEdge, GraphNode, GraphRender, KindStyler, Layout, NodeKind, NodeStyle,
    NodeStyler, RenderedNode, RuleGraph, SpringLayout,
};
pub use heatmap::Heatmap;
