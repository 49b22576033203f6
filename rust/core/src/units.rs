// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length units and conversion factors
//!
//! Host documents report coordinates in their own display or internal unit.
//! Base objects record the unit they were written in, so every conversion
//! goes through a factor to base meters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Length unit of a document or a Base object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "cm")]
    Centimeters,
    #[default]
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "ft")]
    Feet,
    #[serde(rename = "yd")]
    Yards,
    #[serde(rename = "mi")]
    Miles,
}

impl LengthUnit {
    /// Multiplier to convert a length in this unit to base meters.
    #[inline]
    pub fn to_meters(&self) -> f64 {
        match self {
            LengthUnit::Millimeters => 1e-3, // Most common: millimeters
            LengthUnit::Centimeters => 1e-2,
            LengthUnit::Meters => 1.0,
            LengthUnit::Kilometers => 1e3,
            LengthUnit::Inches => 0.0254,
            LengthUnit::Feet => 0.3048, // Revit internal unit
            LengthUnit::Yards => 0.9144,
            LengthUnit::Miles => 1609.344,
        }
    }

    /// Multiplier to convert a length in this unit to `target`.
    #[inline]
    pub fn scale_to(&self, target: LengthUnit) -> f64 {
        if *self == target {
            1.0
        } else {
            self.to_meters() / target.to_meters()
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Millimeters => "mm",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Meters => "m",
            LengthUnit::Kilometers => "km",
            LengthUnit::Inches => "in",
            LengthUnit::Feet => "ft",
            LengthUnit::Yards => "yd",
            LengthUnit::Miles => "mi",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeters" | "millimetres" => Ok(LengthUnit::Millimeters),
            "cm" | "centimeters" | "centimetres" => Ok(LengthUnit::Centimeters),
            "m" | "meters" | "metres" => Ok(LengthUnit::Meters),
            "km" | "kilometers" | "kilometres" => Ok(LengthUnit::Kilometers),
            "in" | "inches" => Ok(LengthUnit::Inches),
            "ft" | "feet" => Ok(LengthUnit::Feet),
            "yd" | "yards" => Ok(LengthUnit::Yards),
            "mi" | "miles" => Ok(LengthUnit::Miles),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
