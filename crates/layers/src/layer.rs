//! Source and layer descriptions in the shape vector map surfaces accept
//! (`type`, `source-layer`, `paint`, `layout` keys).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Render primitive of a style layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Circle,
    Line,
    Fill,
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub tiles: Vec<String>,
    pub minzoom: u8,
    pub maxzoom: u8,
}

impl SourceSpec {
    pub fn vector(tile_url_template: impl Into<String>, minzoom: u8, maxzoom: u8) -> Self {
        Self {
            kind: "vector".to_string(),
            tiles: vec![tile_url_template.into()],
            minzoom,
            maxzoom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    #[serde(rename = "source-layer")]
    pub source_layer: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    #[serde(default)]
    pub paint: Map<String, Value>,
    #[serde(default)]
    pub layout: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        source_layer: impl Into<String>,
        layer_type: LayerType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_layer: source_layer.into(),
            layer_type,
            paint: Map::new(),
            layout: Map::new(),
        }
    }

    pub fn with_paint(mut self, paint: Map<String, Value>) -> Self {
        self.paint = paint;
        self
    }

    pub fn with_layout(mut self, layout: Map<String, Value>) -> Self {
        self.layout = layout;
        self
    }
}

/// Deterministic ids of everything installed for one table.
///
/// Derived only from schema and table, so a re-install after a basemap swap
/// lands on exactly the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableLayerIds {
    pub source: String,
    pub features: String,
    pub labels: String,
}

impl TableLayerIds {
    pub fn new(schema: &str, table: &str) -> Self {
        Self {
            source: format!("{schema}-{table}-source"),
            features: format!("{schema}-{table}-features-layer"),
            labels: format!("{schema}-{table}-labels-layer"),
        }
    }

    /// Layer ids in installation order.
    pub fn layers(&self) -> [&str; 2] {
        [self.features.as_str(), self.labels.as_str()]
    }
}
