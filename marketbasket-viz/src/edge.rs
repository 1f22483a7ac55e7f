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

//! Edge geometry for directed rule graphs
//!
//! Every edge becomes a line segment that stops short of both node markers,
//! plus an optional two-stroke arrowhead. Segments are appended to flat x/y
//! sequences separated by `None`, so any number of edges plot as one path
//! without connecting lines between them.

use crate::error::{Result, VizError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Length units covered by one unit of marker size
pub const MARKER_SIZE_CONVERSION: f64 = 0.0565 / 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Where along the segment the arrowhead tip sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowPosition {
    #[serde(alias = "mid")]
    Middle,
    End,
}

impl FromStr for ArrowPosition {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "middle" | "mid" => Ok(ArrowPosition::Middle),
            "end" => Ok(ArrowPosition::End),
            other => Err(VizError::invalid_style(
                "arrow_position",
                format!("expected middle or end, got {}", other),
            )),
        }
    }
}

/// Drawing parameters for one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    /// Fraction of the node-to-node distance the segment covers
    #[serde(default = "default_length_fraction")]
    pub length_fraction: f64,

    /// None = no arrowhead
    #[serde(default)]
    pub arrow_position: Option<ArrowPosition>,

    #[serde(default = "default_arrow_length")]
    pub arrow_length: f64,

    /// Angle between each arrowhead stroke and the segment, in degrees
    #[serde(default = "default_arrow_angle")]
    pub arrow_angle: f64,

    /// Plot marker size of the nodes, used to pull line ends off the markers
    #[serde(default = "default_marker_diameter")]
    pub marker_diameter: f64,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            length_fraction: default_length_fraction(),
            arrow_position: None,
            arrow_length: default_arrow_length(),
            arrow_angle: default_arrow_angle(),
            marker_diameter: default_marker_diameter(),
        }
    }
}

impl EdgeStyle {
    pub fn with_arrow(mut self, position: ArrowPosition) -> Self {
        self.arrow_position = Some(position);
        self
    }

    pub fn with_marker_diameter(mut self, diameter: f64) -> Self {
        self.marker_diameter = diameter;
        self
    }

    pub fn with_length_fraction(mut self, fraction: f64) -> Self {
        self.length_fraction = fraction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("length_fraction", self.length_fraction),
            ("arrow_length", self.arrow_length),
            ("arrow_angle", self.arrow_angle),
            ("marker_diameter", self.marker_diameter),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(VizError::invalid_style(field, "must be finite"));
            }
        }
        if self.length_fraction < 0.0 || self.length_fraction > 1.0 {
            return Err(VizError::invalid_style("length_fraction", "must be within [0, 1]"));
        }
        if self.arrow_length < 0.0 || self.marker_diameter < 0.0 {
            return Err(VizError::invalid_style(
                "arrow_length/marker_diameter",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

fn default_length_fraction() -> f64 {
    1.0
}

fn default_arrow_length() -> f64 {
    0.025
}

fn default_arrow_angle() -> f64 {
    30.0
}

fn default_marker_diameter() -> f64 {
    20.0
}

/// Flat coordinate sequences with `None` path breaks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgePath {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
}

impl EdgePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of disconnected strokes in the path
    pub fn strokes(&self) -> usize {
        self.x.iter().filter(|v| v.is_none()).count()
    }

    /// Append one stroke followed by a path break
    pub fn push_segment(&mut self, from: Point, to: Point) {
        self.x.extend([Some(from.x), Some(to.x), None]);
        self.y.extend([Some(from.y), Some(to.y), None]);
    }

    /// Append the geometry for an edge from `start` to `end`
    pub fn push_edge(&mut self, start: Point, end: Point, style: &EdgeStyle) {
        let (x0, y0) = (start.x, start.y);
        let (x1, y1) = (end.x, end.y);

        // Pull both ends in by the marker size, expressed as a fraction of
        // this edge's length. Zero-length edges keep the requested fraction.
        let length = start.distance(&end);
        let mut length_fraction = style.length_fraction;
        if length > 0.0 {
            let marker = style.marker_diameter * MARKER_SIZE_CONVERSION;
            length_fraction = (length_fraction - marker / length).max(0.0);
        }

        let skip_x = (x1 - x0) * (1.0 - length_fraction);
        let skip_y = (y1 - y0) * (1.0 - length_fraction);
        let from = Point::new(x0 + skip_x / 2.0, y0 + skip_y / 2.0);
        let to = Point::new(x1 - skip_x / 2.0, y1 - skip_y / 2.0);
        self.push_segment(from, to);

        if let Some(position) = style.arrow_position {
            let tip = match position {
                ArrowPosition::End => to,
                ArrowPosition::Middle => Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0),
            };
            // Orientation follows start -> end, which survives a segment
            // shrunk down to a single point.
            self.push_arrowhead(tip, x1 - x0, y1 - y0, style);
        }
    }

    fn push_arrowhead(&mut self, tip: Point, dx: f64, dy: f64, style: &EdgeStyle) {
        // eta is the edge's angle from the y axis. A horizontal edge pins it
        // at 90 degrees and takes its direction from the x sign.
        let (eta, sign) = if dy != 0.0 {
            ((dx / dy).atan().to_degrees(), sign_or_positive(dy))
        } else {
            (90.0, sign_or_positive(dx))
        };

        for angle in [eta + style.arrow_angle, eta - style.arrow_angle] {
            let radians = angle.to_radians();
            let offset_x = style.arrow_length * radians.sin();
            let offset_y = style.arrow_length * radians.cos();
            self.push_segment(
                tip,
                Point::new(tip.x - sign * offset_x, tip.y - sign * offset_y),
            );
        }
    }
}

fn sign_or_positive(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Append the geometry for one edge to `path` and return it.
///
/// Pure with respect to everything but `path`, so independent edges can be
/// built concurrently into separate paths and concatenated.
pub fn build_edge(start: Point, end: Point, mut path: EdgePath, style: &EdgeStyle) -> EdgePath {
    path.push_edge(start, end, style);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn coords(path: &EdgePath) -> Vec<(Option<f64>, Option<f64>)> {
        path.x.iter().copied().zip(path.y.iter().copied()).collect()
    }

    #[test]
    fn test_full_length_without_marker_reproduces_endpoints() {
        let style = EdgeStyle::default().with_marker_diameter(0.0);
        let path = build_edge(
            Point::new(0.1, -0.4),
            Point::new(0.7, 0.3),
            EdgePath::new(),
            &style,
        );
        assert_eq!(
            coords(&path),
            vec![(Some(0.1), Some(-0.4)), (Some(0.7), Some(0.3)), (None, None)]
        );
    }

    #[test]
    fn test_marker_shortens_both_ends_equally() {
        let style = EdgeStyle::default();
        let path = build_edge(Point::new(0.0, 0.0), Point::new(1.0, 0.0), EdgePath::new(), &style);

        let x0 = path.x[0].unwrap();
        let x1 = path.x[1].unwrap();
        assert!((x0 - 0.02825).abs() < EPS);
        assert!((x1 - 0.97175).abs() < EPS);
        assert!((x0 - 0.0 - (1.0 - x1)).abs() < EPS);
    }

    #[test]
    fn test_length_fraction_shrinks_around_midpoint() {
        let style = EdgeStyle::default()
            .with_marker_diameter(0.0)
            .with_length_fraction(0.5);
        let path = build_edge(Point::new(0.0, 0.0), Point::new(0.0, 2.0), EdgePath::new(), &style);
        assert_eq!(path.y[0], Some(0.5));
        assert_eq!(path.y[1], Some(1.5));
    }

    #[test]
    fn test_zero_length_edge_is_finite() {
        let style = EdgeStyle::default().with_arrow(ArrowPosition::End);
        let p = Point::new(0.3, 0.3);
        let path = build_edge(p, p, EdgePath::new(), &style);

        assert_eq!(path.strokes(), 3);
        assert!(path.x.iter().flatten().all(|v| v.is_finite()));
        assert!(path.y.iter().flatten().all(|v| v.is_finite()));
        assert_eq!(path.x[0], Some(0.3));
    }

    #[test]
    fn test_arrowhead_points_back_along_edge() {
        let style = EdgeStyle::default()
            .with_marker_diameter(0.0)
            .with_arrow(ArrowPosition::End);

        // Up, down, left, right and two diagonals: both barbs must sit
        // behind the tip relative to the direction of travel.
        let ends = [(0.0, 1.0), (0.0, -1.0), (-1.0, 0.0), (1.0, 0.0), (1.0, 1.0), (-1.0, -1.0)];
        for (ex, ey) in ends {
            let path = build_edge(Point::new(0.0, 0.0), Point::new(ex, ey), EdgePath::new(), &style);
            assert_eq!(path.strokes(), 3);
            for barb in [3usize, 6] {
                assert_eq!(path.x[barb], Some(ex));
                assert_eq!(path.y[barb], Some(ey));
                let bx = path.x[barb + 1].unwrap() - ex;
                let by = path.y[barb + 1].unwrap() - ey;
                let along = bx * ex + by * ey;
                assert!(along < 0.0, "barb points forward for end ({ex}, {ey})");
                let len = (bx * bx + by * by).sqrt();
                assert!((len - 0.025).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_collapsed_segment_keeps_arrow_direction() {
        // The default marker correction is longer than these edges, so the
        // segment collapses to the midpoint.
        let style = EdgeStyle::default().with_arrow(ArrowPosition::End);

        for (ex, ey) in [(-0.01, 0.0), (0.0, -0.01), (0.01, 0.0), (0.0, 0.01)] {
            let path = build_edge(Point::new(0.0, 0.0), Point::new(ex, ey), EdgePath::new(), &style);
            let (tx, ty) = (ex / 2.0, ey / 2.0);
            assert_eq!(path.x[0], path.x[1]);
            assert_eq!(path.y[0], path.y[1]);

            for barb in [3usize, 6] {
                assert!((path.x[barb].unwrap() - tx).abs() < EPS);
                assert!((path.y[barb].unwrap() - ty).abs() < EPS);
                let bx = path.x[barb + 1].unwrap() - tx;
                let by = path.y[barb + 1].unwrap() - ty;
                assert!(bx * ex + by * ey < 0.0, "barb points forward for end ({ex}, {ey})");
            }
        }
    }

    #[test]
    fn test_middle_arrow_tip_is_midpoint() {
        let style = EdgeStyle::default()
            .with_marker_diameter(0.0)
            .with_arrow(ArrowPosition::Middle);
        let path = build_edge(Point::new(0.0, 0.0), Point::new(2.0, 4.0), EdgePath::new(), &style);
        assert_eq!(path.x[3], Some(1.0));
        assert_eq!(path.y[3], Some(2.0));
    }

    #[test]
    fn test_edges_concatenate() {
        let style = EdgeStyle::default();
        let path = build_edge(Point::new(0.0, 0.0), Point::new(1.0, 0.0), EdgePath::new(), &style);
        let path = build_edge(Point::new(0.0, 1.0), Point::new(1.0, 1.0), path, &style);
        assert_eq!(path.len(), 6);
        assert_eq!(path.strokes(), 2);
    }

    #[test]
    fn test_arrow_position_parsing() {
        assert_eq!("mid".parse::<ArrowPosition>().unwrap(), ArrowPosition::Middle);
        assert_eq!("End".parse::<ArrowPosition>().unwrap(), ArrowPosition::End);
        assert!("start".parse::<ArrowPosition>().is_err());
    }

    #[test]
    fn test_style_validation() {
        assert!(EdgeStyle::default().validate().is_ok());
        assert!(EdgeStyle::default().with_length_fraction(1.5).validate().is_err());
        assert!(EdgeStyle::default().with_marker_diameter(f64::NAN).validate().is_err());
    }
}
