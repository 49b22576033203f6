// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor-neutral Base objects.
//!
//! A [`Base`] is what a host entity becomes on send and what a host entity
//! is rebuilt from on receive. `speckle_type` is the `:`-separated
//! inheritance chain of the object (most general first), e.g.
//! `Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall`.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Geometry;
use crate::units::LengthUnit;

/// A typed value stored in a dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DictValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<DictValue>),
}

impl DictValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DictValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DictValue::Double(d) => Some(*d),
            DictValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DictValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DictValue]> {
        match self {
            DictValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for DictValue {
    fn from(s: &str) -> Self {
        DictValue::String(s.to_string())
    }
}

impl From<String> for DictValue {
    fn from(s: String) -> Self {
        DictValue::String(s)
    }
}

impl From<f64> for DictValue {
    fn from(d: f64) -> Self {
        DictValue::Double(d)
    }
}

impl From<i64> for DictValue {
    fn from(i: i64) -> Self {
        DictValue::Int(i)
    }
}

/// A dictionary is a typed key-value map attached to an entity or Base.
pub type Dictionary = FxHashMap<String, DictValue>;

/// Root of every speckle type chain.
pub const BASE_TYPE: &str = "Base";

/// Vendor-neutral object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base {
    /// Content hash, filled by [`Base::finalize`].
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(rename = "speckle_type")]
    pub speckle_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<LengthUnit>,
    #[serde(default)]
    pub properties: Dictionary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_value: Vec<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Base>,
}

impl Base {
    pub fn new(speckle_type: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            application_id: None,
            speckle_type: speckle_type.into(),
            units: None,
            properties: Dictionary::default(),
            display_value: Vec::new(),
            elements: Vec::new(),
        }
    }

    pub fn with_application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = Some(id.into());
        self
    }

    pub fn with_units(mut self, units: LengthUnit) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<DictValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_display_value(mut self, geometry: Geometry) -> Self {
        self.display_value.push(geometry);
        self
    }

    pub fn with_element(mut self, element: Base) -> Self {
        self.elements.push(element);
        self
    }

    pub fn get(&self, key: &str) -> Option<&DictValue> {
        self.properties.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DictValue::as_str)
    }

    /// The most derived segment of the type chain (`RevitWall` for
    /// `Objects.BuiltElements.Wall:Objects.BuiltElements.Revit.RevitWall`),
    /// without its namespace.
    pub fn short_type(&self) -> &str {
        let last = self.speckle_type.rsplit(':').next().unwrap_or(&self.speckle_type);
        last.rsplit('.').next().unwrap_or(last)
    }

    /// `application_id` if set, else the content id.
    pub fn identity(&self) -> &str {
        self.application_id.as_deref().unwrap_or(&self.id)
    }

    /// Computes the content hash of the object (children included) and
    /// stores it in `id`. Returns the id.
    ///
    /// Hashes the `serde_json::Value` form, whose maps are key-sorted, so the
    /// id does not depend on dictionary insertion order.
    pub fn finalize(&mut self) -> Result<&str> {
        for child in &mut self.elements {
            child.finalize()?;
        }
        self.id.clear();
        let canonical = serde_json::to_value(&*self)?;
        let bytes = serde_json::to_vec(&canonical)?;
        let mut hasher = FxHasher::default();
        bytes.hash(&mut hasher);
        self.id = format!("{:016x}", hasher.finish());
        Ok(&self.id)
    }

    /// Depth-first iterator over this object and all nested elements.
    pub fn descendants(&self) -> Vec<&Base> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            out.extend(current.elements.iter());
            i += 1;
        }
        out
    }
}
