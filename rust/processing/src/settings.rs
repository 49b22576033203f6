// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model card settings and send settings management
//!
//! A [`SenderModelCard`] arrives from the UI with string-keyed settings.
//! [`CardSettings::parse`] turns them into strong types once; unknown values
//! fail here instead of at lookup time.
//!
//! [`ToSpeckleSettingsManager`] resolves the settings for a send and keeps a
//! per-card baseline of every setting that affects conversion. When one
//! changes, the objects of the card's current selection are evicted from the
//! conversion cache before the baseline is replaced.

use std::str::FromStr;

use nalgebra::Matrix4;
use rebake_core::{CrsOffsetRotation, HostDocument, NativeId};
use rebake_geometry::transform::{translation, translation_rotation_z};
use rebake_geometry::{DetailLevel, ReferencePoint, ToSpeckleSettings};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cache::ConversionCache;
use crate::error::ConfigurationError;
use crate::unpacker::ObjectUnpacker;

pub const DETAIL_LEVEL_SETTING: &str = "detailLevel";
pub const REFERENCE_POINT_SETTING: &str = "referencePoint";

/// One UI setting as stored on a model card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSetting {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: serde_json::Value,
    /// Allowed values, for selection settings.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl CardSetting {
    pub fn new(id: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            value: value.into(),
            allowed: None,
        }
    }
}

/// Which host objects a card sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFilter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub selected_object_ids: Vec<NativeId>,
}

/// Send configuration of one model, as persisted by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderModelCard {
    pub model_card_id: String,
    #[serde(default)]
    pub settings: Vec<CardSetting>,
    #[serde(default)]
    pub send_filter: SendFilter,
}

impl SenderModelCard {
    pub fn new(model_card_id: impl Into<String>) -> Self {
        Self {
            model_card_id: model_card_id.into(),
            settings: Vec::new(),
            send_filter: SendFilter::default(),
        }
    }

    pub fn with_setting(mut self, id: &str, value: impl Into<serde_json::Value>) -> Self {
        self.settings.retain(|s| s.id != id);
        self.settings.push(CardSetting::new(id, value));
        self
    }

    pub fn with_selection<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NativeId>,
    {
        self.send_filter.selected_object_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn setting(&self, id: &str) -> Option<&CardSetting> {
        self.settings.iter().find(|s| s.id == id)
    }
}

/// Typed settings of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSettings {
    pub detail_level: DetailLevel,
    pub reference_point: ReferencePoint,
}

impl CardSettings {
    pub fn parse(card: &SenderModelCard) -> Result<Self, ConfigurationError> {
        Ok(Self {
            detail_level: parse_setting(card, DETAIL_LEVEL_SETTING)?,
            reference_point: parse_setting(card, REFERENCE_POINT_SETTING)?,
        })
    }
}

fn parse_setting<T: FromStr>(card: &SenderModelCard, id: &str) -> Result<T, ConfigurationError> {
    let setting = card
        .setting(id)
        .ok_or_else(|| ConfigurationError::MissingSetting(id.to_string()))?;
    let value = setting
        .value
        .as_str()
        .ok_or_else(|| ConfigurationError::InvalidType {
            setting: id.to_string(),
            found: setting.value.to_string(),
        })?;
    value.parse().map_err(|_| ConfigurationError::UnknownValue {
        setting: id.to_string(),
        value: value.to_string(),
    })
}

/// Transform from the chosen reference point into document coordinates.
pub fn reference_point_transform(
    document: &HostDocument,
    reference_point: ReferencePoint,
) -> Result<Option<Matrix4<f64>>, ConfigurationError> {
    match reference_point {
        ReferencePoint::InternalOrigin => Ok(None),
        ReferencePoint::ProjectBase => {
            let point = document
                .project_base_point()
                .ok_or(ConfigurationError::MissingBasePoint("project"))?;
            Ok(Some(translation(&point.position)))
        }
        ReferencePoint::Survey => {
            let survey = document
                .survey_point()
                .ok_or(ConfigurationError::MissingBasePoint("survey"))?;
            // True north is registered on the project base point.
            let project = document
                .project_base_point()
                .ok_or(ConfigurationError::MissingBasePoint("project"))?;
            Ok(Some(translation_rotation_z(&survey.position, project.angle)))
        }
    }
}

/// Resolves send settings per card and invalidates the conversion cache
/// when a conversion-affecting setting changes.
#[derive(Debug, Default)]
pub struct ToSpeckleSettingsManager {
    detail_levels: FxHashMap<String, DetailLevel>,
    reference_points: FxHashMap<String, Option<Matrix4<f64>>>,
    crs_offsets: FxHashMap<String, CrsOffsetRotation>,
}

impl ToSpeckleSettingsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_to_speckle_settings(
        &mut self,
        card: &SenderModelCard,
        document: &HostDocument,
        unpacker: &ObjectUnpacker,
        cache: &mut dyn ConversionCache,
    ) -> Result<ToSpeckleSettings, ConfigurationError> {
        let parsed = CardSettings::parse(card)?;
        let transform = reference_point_transform(document, parsed.reference_point)?;
        let crs = document.crs().clone();
        let key = card.model_card_id.as_str();

        let mut changed = Vec::new();
        if self
            .detail_levels
            .get(key)
            .is_some_and(|previous| *previous != parsed.detail_level)
        {
            changed.push(DETAIL_LEVEL_SETTING);
        }
        if self
            .reference_points
            .get(key)
            .is_some_and(|previous| *previous != transform)
        {
            changed.push(REFERENCE_POINT_SETTING);
        }
        if self
            .crs_offsets
            .get(key)
            .is_some_and(|previous| *previous != crs)
        {
            changed.push("crsOffsetRotation");
        }

        // Evict before the baseline moves, or the next read sees no change.
        if !changed.is_empty() {
            let ids = unpacker.get_unpacked_ids(document, &card.send_filter.selected_object_ids);
            tracing::info!(
                model_card = key,
                settings = ?changed,
                objects = ids.len(),
                "conversion settings changed, evicting cached objects"
            );
            cache.evict_objects(&ids);
        }

        self.detail_levels
            .insert(key.to_string(), parsed.detail_level);
        self.reference_points.insert(key.to_string(), transform);
        self.crs_offsets.insert(key.to_string(), crs.clone());

        Ok(ToSpeckleSettings {
            detail_level: parsed.detail_level,
            reference_point_transform: transform,
            crs,
        })
    }

    /// Forgets the baseline of a removed card.
    pub fn remove_card(&mut self, model_card_id: &str) {
        self.detail_levels.remove(model_card_id);
        self.reference_points.remove(model_card_id);
        self.crs_offsets.remove(model_card_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use rebake_core::{Base, BasePoint, EntityData, HostEntity, Point3};

    use crate::cache::{Fingerprint, SendConversionCache};

    fn card(detail: &str, reference: &str) -> SenderModelCard {
        SenderModelCard::new("card1")
            .with_setting(DETAIL_LEVEL_SETTING, detail)
            .with_setting(REFERENCE_POINT_SETTING, reference)
    }

    #[test]
    fn parses_typed_settings() {
        let parsed = CardSettings::parse(&card("Fine", "Project Base")).unwrap();
        assert_eq!(parsed.detail_level, DetailLevel::High);
        assert_eq!(parsed.reference_point, ReferencePoint::ProjectBase);
    }

    #[test]
    fn unknown_value_is_configuration_error() {
        let err = CardSettings::parse(&card("Ultra", "Survey")).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownValue {
                setting: DETAIL_LEVEL_SETTING.into(),
                value: "Ultra".into()
            }
        );
    }

    #[test]
    fn missing_and_mistyped_settings_fail() {
        let missing = SenderModelCard::new("c").with_setting(DETAIL_LEVEL_SETTING, "Low");
        assert_eq!(
            CardSettings::parse(&missing).unwrap_err(),
            ConfigurationError::MissingSetting(REFERENCE_POINT_SETTING.into())
        );

        let mistyped = card("Low", "Survey").with_setting(DETAIL_LEVEL_SETTING, 3);
        assert!(matches!(
            CardSettings::parse(&mistyped),
            Err(ConfigurationError::InvalidType { .. })
        ));
    }

    #[test]
    fn card_deserializes_from_ui_json() {
        let json = r#"{
            "modelCardId": "card1",
            "settings": [
                { "id": "detailLevel", "title": "Detail Level", "value": "Low", "enum": ["Low", "Medium", "High"] },
                { "id": "referencePoint", "value": "Survey" }
            ],
            "sendFilter": { "name": "Selection", "selectedObjectIds": ["a", "b"] }
        }"#;
        let card: SenderModelCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.send_filter.selected_object_ids.len(), 2);
        let parsed = CardSettings::parse(&card).unwrap();
        assert_eq!(parsed.detail_level, DetailLevel::Low);
        assert_eq!(parsed.reference_point, ReferencePoint::Survey);
    }

    #[test]
    fn reference_points_resolve_against_base_points() {
        let mut doc = HostDocument::new("site");
        assert_eq!(
            reference_point_transform(&doc, ReferencePoint::InternalOrigin).unwrap(),
            None
        );
        assert_eq!(
            reference_point_transform(&doc, ReferencePoint::ProjectBase).unwrap_err(),
            ConfigurationError::MissingBasePoint("project")
        );

        doc.add_base_point(BasePoint::project(
            Point3::new(5.0, 0.0, 0.0),
            std::f64::consts::FRAC_PI_2,
        ));
        doc.add_base_point(BasePoint::survey(Point3::new(100.0, 200.0, 0.0)));

        let project = reference_point_transform(&doc, ReferencePoint::ProjectBase)
            .unwrap()
            .unwrap();
        assert_relative_eq!(project[(0, 3)], 5.0);

        let survey = reference_point_transform(&doc, ReferencePoint::Survey)
            .unwrap()
            .unwrap();
        let p = survey.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 201.0, epsilon = 1e-9);
    }

    #[test]
    fn removed_card_starts_a_new_baseline() {
        let mut doc = HostDocument::new("site");
        doc.insert(EntityData::new("a", HostEntity::Element)).unwrap();
        let unpacker = ObjectUnpacker::new();
        let low = card("Low", "InternalOrigin").with_selection(["a"]);
        let high = card("High", "InternalOrigin").with_selection(["a"]);
        let key = NativeId::from("a");
        let seeded = || {
            let mut cache = SendConversionCache::new();
            let fingerprint = Fingerprint::of(&ToSpeckleSettings::default());
            cache.put(key.clone(), fingerprint, Arc::new(Base::new("Base")));
            cache
        };

        let mut cache = seeded();
        let mut manager = ToSpeckleSettingsManager::new();
        manager.get_to_speckle_settings(&low, &doc, &unpacker, &mut cache).unwrap();
        manager.get_to_speckle_settings(&high, &doc, &unpacker, &mut cache).unwrap();
        assert!(!cache.contains_object(&key));

        let mut cache = seeded();
        let mut manager = ToSpeckleSettingsManager::new();
        manager.get_to_speckle_settings(&low, &doc, &unpacker, &mut cache).unwrap();
        manager.remove_card("card1");
        manager.get_to_speckle_settings(&high, &doc, &unpacker, &mut cache).unwrap();
        assert!(cache.contains_object(&key));
    }

    #[test]
    fn survey_needs_project_base_point_for_true_north() {
        let mut doc = HostDocument::new("site");
        doc.add_base_point(BasePoint::survey(Point3::new(100.0, 200.0, 0.0)));
        assert_eq!(
            reference_point_transform(&doc, ReferencePoint::Survey).unwrap_err(),
            ConfigurationError::MissingBasePoint("project")
        );
    }
}
