//! JSON bodies exchanged with the tiles backend.
//!
//! Read endpoints (all `GET`, keyed by schema and table):
//! - `/api/check-srid/{schema}/{table}` → [`SridCheck`]
//! - `/api/geometry-type/{schema}/{table}` → [`GeometryTypeResponse`]
//! - `/api/extent/{schema}/{table}` → [`ExtentResponse`]
//! - `/api/fields/{schema}/{table}` → [`FieldsBody`]
//!
//! Write endpoint: `POST /api/layer-state` with [`LayerStateReport`] → [`LayerStateAck`].

use foundation::{Extent, TileIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names of the two sub-layers every vector tile carries.
pub const FEATURES_SOURCE_LAYER: &str = "features";
pub const LABELS_SOURCE_LAYER: &str = "labels";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SridCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srid: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SridCheck {
    pub fn valid(srid: i32) -> Self {
        Self {
            valid: true,
            srid: Some(srid),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            srid: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryTypeResponse {
    #[serde(default)]
    pub geometry_type: Option<String>,
}

impl GeometryTypeResponse {
    pub fn new(geometry_type: impl Into<String>) -> Self {
        Self {
            geometry_type: Some(geometry_type.into()),
        }
    }
}

/// Bounds as sent by the server, before validation.
///
/// Sides are kept as raw JSON so a string or null side is reported as
/// malformed instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBounds {
    #[serde(default)]
    pub west: Value,
    #[serde(default)]
    pub south: Value,
    #[serde(default)]
    pub east: Value,
    #[serde(default)]
    pub north: Value,
}

impl RawBounds {
    /// `Some` only when all four sides are finite JSON numbers.
    pub fn to_extent(&self) -> Option<Extent> {
        let extent = Extent::new(
            self.west.as_f64()?,
            self.south.as_f64()?,
            self.east.as_f64()?,
            self.north.as_f64()?,
        );
        extent.is_finite().then_some(extent)
    }
}

impl From<Extent> for RawBounds {
    fn from(e: Extent) -> Self {
        Self {
            west: e.west.into(),
            south: e.south.into(),
            east: e.east.into(),
            north: e.north.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtentResponse {
    #[serde(default)]
    pub bounds: Option<RawBounds>,
}

impl ExtentResponse {
    pub fn new(extent: Extent) -> Self {
        Self {
            bounds: Some(extent.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(default)]
    pub name: String,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The fields endpoint answers with either a bare array or `{"fields": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldsBody {
    Bare(Vec<FieldInfo>),
    Wrapped {
        #[serde(default)]
        fields: Vec<FieldInfo>,
    },
}

impl FieldsBody {
    pub fn into_fields(self) -> Vec<FieldInfo> {
        match self {
            FieldsBody::Bare(fields) | FieldsBody::Wrapped { fields } => fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStateReport {
    pub schema_name: String,
    pub table: String,
    #[serde(flatten)]
    pub tile: TileIndex,
}

impl LayerStateReport {
    pub fn new(schema: impl Into<String>, table: impl Into<String>, tile: TileIndex) -> Self {
        Self {
            schema_name: schema.into(),
            table: table.into(),
            tile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckTile {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStateAck {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile: Option<AckTile>,
}

impl LayerStateAck {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tile: None,
        }
    }
}

/// Path of one vector tile relative to the API root, e.g. `/public/roads/3/4/2.pbf`.
pub fn tile_path(schema: &str, table: &str, tile: TileIndex) -> String {
    format!("/{schema}/{table}/{}/{}/{}.pbf", tile.z, tile.x, tile.y)
}

/// Replace the `{z}`, `{x}` and `{y}` placeholders of a tile URL template.
pub fn expand_tile_template(template: &str, tile: TileIndex) -> String {
    template
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fields_accepts_bare_array() {
        let body: FieldsBody =
            serde_json::from_value(json!([{"name": "population"}, {"name": "name"}])).unwrap();
        assert_eq!(
            body.into_fields(),
            vec![FieldInfo::new("population"), FieldInfo::new("name")]
        );
    }

    #[test]
    fn fields_accepts_wrapper_object() {
        let body: FieldsBody =
            serde_json::from_value(json!({"fields": [{"name": "id"}]})).unwrap();
        assert_eq!(body.into_fields(), vec![FieldInfo::new("id")]);
    }

    #[test]
    fn wrapper_without_fields_key_is_empty() {
        let body: FieldsBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.into_fields().is_empty());
    }

    #[test]
    fn srid_check_optional_parts() {
        let ok: SridCheck = serde_json::from_value(json!({"valid": true, "srid": 4326})).unwrap();
        assert_eq!(ok, SridCheck::valid(4326));

        let bad: SridCheck =
            serde_json::from_value(json!({"valid": false, "error": "Invalid SRID (0)."}))
                .unwrap();
        assert!(!bad.valid);
        assert_eq!(bad.error.as_deref(), Some("Invalid SRID (0)."));
    }

    #[test]
    fn geometry_type_uses_camel_case_key() {
        let r: GeometryTypeResponse =
            serde_json::from_value(json!({"geometryType": "MULTIPOLYGON"})).unwrap();
        assert_eq!(r.geometry_type.as_deref(), Some("MULTIPOLYGON"));

        let missing: GeometryTypeResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.geometry_type, None);
    }

    #[test]
    fn bounds_must_be_numeric() {
        let good: ExtentResponse = serde_json::from_value(
            json!({"bounds": {"west": -10, "south": 40, "east": 10, "north": 60}}),
        )
        .unwrap();
        assert_eq!(
            good.bounds.unwrap().to_extent(),
            Some(Extent::new(-10.0, 40.0, 10.0, 60.0))
        );

        let stringly: ExtentResponse = serde_json::from_value(
            json!({"bounds": {"west": "-10", "south": 40, "east": 10, "north": 60}}),
        )
        .unwrap();
        assert_eq!(stringly.bounds.unwrap().to_extent(), None);

        let partial: ExtentResponse =
            serde_json::from_value(json!({"bounds": {"west": 1, "south": 2}})).unwrap();
        assert_eq!(partial.bounds.unwrap().to_extent(), None);

        let absent: ExtentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(absent.bounds.is_none());
    }

    #[test]
    fn layer_state_report_is_flat() {
        let report = LayerStateReport::new("public", "cities", TileIndex::new(5, 16, 10));
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"schema_name": "public", "table": "cities", "z": 5, "x": 16, "y": 10})
        );
    }

    #[test]
    fn ack_tolerates_echoed_tile() {
        let ack: LayerStateAck = serde_json::from_value(json!({
            "schema": "public",
            "table": "cities",
            "tile": {"z": 1, "x": 0, "y": 1, "url": "/api/mvt/public/cities/1/0/1.pbf"},
            "message": "Layer state received and logged."
        }))
        .unwrap();
        assert_eq!(ack.message, "Layer state received and logged.");
        assert_eq!(ack.tile.map(|t| (t.z, t.x, t.y)), Some((1, 0, 1)));
    }

    #[test]
    fn tile_paths() {
        let t = TileIndex::new(3, 4, 2);
        assert_eq!(tile_path("public", "roads", t), "/public/roads/3/4/2.pbf");
        assert_eq!(
            expand_tile_template("http://h/api/mvt/s/t/{z}/{x}/{y}.pbf", t),
            "http://h/api/mvt/s/t/3/4/2.pbf"
        );
    }
}
