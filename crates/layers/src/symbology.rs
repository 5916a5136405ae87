use serde_json::{Map, Value, json};

use crate::layer::LayerType;

/// Geometry families that have a dedicated render style.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// Map a backend geometry type name onto a style family.
    ///
    /// Matching ignores case and strips the `ST_` and `MULTI` decorations, so
    /// `MULTIPOLYGON`, `ST_MultiPolygon` and `Polygon` all resolve to
    /// `Polygon`. Returns `None` for anything else (e.g. `GEOMETRYCOLLECTION`).
    pub fn from_geometry_type(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        let base = upper.strip_prefix("ST_").unwrap_or(&upper);
        let base = base.strip_prefix("MULTI").unwrap_or(base);
        match base {
            "POINT" => Some(GeometryKind::Point),
            "LINESTRING" => Some(GeometryKind::LineString),
            "POLYGON" => Some(GeometryKind::Polygon),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
        }
    }

    pub fn style(self) -> RenderStyle {
        match self {
            GeometryKind::Point => RenderStyle::new(
                self,
                LayerType::Circle,
                paint(json!({
                    "circle-radius": 3,
                    "circle-color": ACCENT,
                    "circle-opacity": 0.8,
                    "circle-stroke-width": 0.5,
                    "circle-stroke-color": ACCENT_DARK,
                })),
            ),
            GeometryKind::LineString => RenderStyle::new(
                self,
                LayerType::Line,
                paint(json!({
                    "line-color": ACCENT,
                    "line-width": 2,
                    "line-opacity": 0.8,
                })),
            ),
            GeometryKind::Polygon => RenderStyle::new(
                self,
                LayerType::Fill,
                paint(json!({
                    "fill-color": ACCENT,
                    "fill-opacity": 0.4,
                    "fill-outline-color": ACCENT_DARK,
                })),
            ),
        }
    }
}

const ACCENT: &str = "#007d7e";
const ACCENT_DARK: &str = "#005d5e";

fn paint(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

/// Layer type and paint properties for a table's feature layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub kind: GeometryKind,
    pub layer_type: LayerType,
    pub paint: Map<String, Value>,
}

impl RenderStyle {
    pub fn new(kind: GeometryKind, layer_type: LayerType, paint: Map<String, Value>) -> Self {
        Self {
            kind,
            layer_type,
            paint,
        }
    }

    /// Style for a backend geometry type name; unknown types get the polygon style.
    pub fn for_geometry_type(raw: &str) -> Self {
        GeometryKind::from_geometry_type(raw)
            .unwrap_or(GeometryKind::Polygon)
            .style()
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        GeometryKind::Polygon.style()
    }
}
