// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion settings seen by converters.

use std::fmt;
use std::str::FromStr;

use nalgebra::Matrix4;
use rebake_core::{CrsOffsetRotation, LengthUnit};

/// Geometry fidelity requested for send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetailLevel {
    /// Bounding-box representations only.
    Low,
    #[default]
    Medium,
    High,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Low => "Low",
            DetailLevel::Medium => "Medium",
            DetailLevel::High => "High",
        }
    }
}

impl FromStr for DetailLevel {
    type Err = String;

    /// Accepts both the card values and the host's view detail names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" | "Coarse" => Ok(DetailLevel::Low),
            "Medium" => Ok(DetailLevel::Medium),
            "High" | "Fine" => Ok(DetailLevel::High),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin that sent coordinates are expressed relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferencePoint {
    #[default]
    InternalOrigin,
    ProjectBase,
    Survey,
}

impl ReferencePoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePoint::InternalOrigin => "InternalOrigin",
            ReferencePoint::ProjectBase => "ProjectBase",
            ReferencePoint::Survey => "Survey",
        }
    }
}

impl FromStr for ReferencePoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "InternalOrigin" | "Internal Origin (default)" => Ok(ReferencePoint::InternalOrigin),
            "ProjectBase" | "Project Base" => Ok(ReferencePoint::ProjectBase),
            "Survey" => Ok(ReferencePoint::Survey),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ReferencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved settings for one send operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToSpeckleSettings {
    pub detail_level: DetailLevel,
    /// Transform from the reference point to the internal origin, `None`
    /// for the internal origin itself.
    pub reference_point_transform: Option<Matrix4<f64>>,
    pub crs: CrsOffsetRotation,
}

impl ToSpeckleSettings {
    pub fn new(detail_level: DetailLevel, reference_point_transform: Option<Matrix4<f64>>) -> Self {
        Self {
            detail_level,
            reference_point_transform,
            crs: CrsOffsetRotation::default(),
        }
    }
}

/// Settings for one receive operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToHostSettings {
    /// Unit the host document expects coordinates in.
    pub host_units: LengthUnit,
}

impl Default for ToHostSettings {
    fn default() -> Self {
        Self {
            host_units: LengthUnit::Meters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_detail_levels() {
        assert_eq!("Low".parse::<DetailLevel>(), Ok(DetailLevel::Low));
        assert_eq!("Fine".parse::<DetailLevel>(), Ok(DetailLevel::High));
        assert_eq!("Ultra".parse::<DetailLevel>(), Err("Ultra".to_string()));
    }

    #[test]
    fn parse_reference_points() {
        assert_eq!(
            "Project Base".parse::<ReferencePoint>(),
            Ok(ReferencePoint::ProjectBase)
        );
        assert!("Nowhere".parse::<ReferencePoint>().is_err());
    }
}
