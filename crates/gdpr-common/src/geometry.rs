//! Minimal planar geometry with WKT rendering.
//!
//! Extraction jobs record the requested bounding box as a geometry. Only
//! the shapes a bounding box can take are modelled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Geometry of an extraction bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", rename_all = "lowercase")]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Exterior ring first, then holes. Rings are closed.
    Polygon(Vec<Vec<Coordinate>>),
}

impl Geometry {
    /// Rectangular polygon covering an envelope, counter-clockwise from the
    /// lower-left corner.
    pub fn from_envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Geometry::Polygon(vec![vec![
            Coordinate::new(min_x, min_y),
            Coordinate::new(min_x, max_y),
            Coordinate::new(max_x, max_y),
            Coordinate::new(max_x, min_y),
            Coordinate::new(min_x, min_y),
        ]])
    }

    /// Well-known text rendering, e.g. `POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))`.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, coords: &[Coordinate]) -> fmt::Result {
    f.write_str("(")?;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str(")")
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(c) => write!(f, "POINT ({})", c),
            Geometry::LineString(coords) if coords.is_empty() => f.write_str("LINESTRING EMPTY"),
            Geometry::LineString(coords) => {
                f.write_str("LINESTRING ")?;
                write_sequence(f, coords)
            }
            Geometry::Polygon(rings) if rings.is_empty() => f.write_str("POLYGON EMPTY"),
            Geometry::Polygon(rings) => {
                f.write_str("POLYGON (")?;
                for (i, ring) in rings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_sequence(f, ring)?;
                }
                f.write_str(")")
            }
        }
    }
}
