// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry primitives shared by host entities and Base objects.
//!
//! The engine does not own a geometry kernel. These primitives only carry
//! coordinates far enough to apply placement transforms and unit scaling.

use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};

/// A geometry primitive in some length unit and coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Geometry {
    Point {
        location: Point3<f64>,
    },
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    Polyline {
        points: Vec<Point3<f64>>,
        closed: bool,
    },
    Mesh {
        vertices: Vec<Point3<f64>>,
        faces: Vec<[u32; 3]>,
    },
}

impl Geometry {
    /// Short type name, used for Base `speckle_type` suffixes and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::Line { .. } => "Line",
            Geometry::Polyline { .. } => "Polyline",
            Geometry::Mesh { .. } => "Mesh",
        }
    }

    /// True if the primitive carries no usable coordinates.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point { .. } | Geometry::Line { .. } => false,
            Geometry::Polyline { points, .. } => points.len() < 2,
            Geometry::Mesh { vertices, faces } => vertices.is_empty() || faces.is_empty(),
        }
    }

    /// Returns a copy with every coordinate mapped through `matrix`.
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Geometry {
        let tp = |p: &Point3<f64>| matrix.transform_point(p);
        match self {
            Geometry::Point { location } => Geometry::Point {
                location: tp(location),
            },
            Geometry::Line { start, end } => Geometry::Line {
                start: tp(start),
                end: tp(end),
            },
            Geometry::Polyline { points, closed } => Geometry::Polyline {
                points: points.iter().map(tp).collect(),
                closed: *closed,
            },
            Geometry::Mesh { vertices, faces } => Geometry::Mesh {
                vertices: vertices.iter().map(tp).collect(),
                faces: faces.clone(),
            },
        }
    }

    /// Scales coordinates in place, e.g. for a unit change.
    /// Only applies scaling if `factor != 1.0`.
    #[inline]
    pub fn scale(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }
        let s = |p: &mut Point3<f64>| p.coords *= factor;
        match self {
            Geometry::Point { location } => s(location),
            Geometry::Line { start, end } => {
                s(start);
                s(end);
            }
            Geometry::Polyline { points, .. } => points.iter_mut().for_each(s),
            Geometry::Mesh { vertices, .. } => vertices.iter_mut().for_each(s),
        }
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let points: Vec<&Point3<f64>> = match self {
            Geometry::Point { location } => vec![location],
            Geometry::Line { start, end } => vec![start, end],
            Geometry::Polyline { points, .. } => points.iter().collect(),
            Geometry::Mesh { vertices, .. } => vertices.iter().collect(),
        };
        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        (min, max)
    }
}
