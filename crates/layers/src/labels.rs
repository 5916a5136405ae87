use serde_json::{Map, Value, json};

use crate::layer::{LayerSpec, LayerType};

/// Typography of the label layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font: Vec<String>,
    pub font_size_px: f32,
    pub offset_em: [f32; 2],
    pub anchor: &'static str,
    pub color: &'static str,
    pub halo_color: &'static str,
    pub halo_width_px: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: vec![
                "Open Sans Regular".to_string(),
                "Arial Unicode MS Regular".to_string(),
            ],
            font_size_px: 12.0,
            offset_em: [0.0, 0.6],
            anchor: "top",
            color: "#333333",
            halo_color: "#fff",
            halo_width_px: 1.0,
        }
    }
}

/// `text-field` value: an attribute getter for `field`, or empty when no field is chosen.
pub fn text_field(field: Option<&str>) -> Value {
    match field {
        Some(name) => json!(["get", name]),
        None => json!(""),
    }
}

pub fn visibility(visible: bool) -> Value {
    json!(if visible { "visible" } else { "none" })
}

impl LabelStyle {
    pub fn layout(&self, field: Option<&str>) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("text-field".into(), text_field(field));
        m.insert("text-font".into(), json!(self.font));
        m.insert("text-size".into(), json!(self.font_size_px));
        m.insert("text-offset".into(), json!(self.offset_em));
        m.insert("text-anchor".into(), json!(self.anchor));
        m.insert("symbol-placement".into(), json!("point"));
        m.insert("visibility".into(), visibility(field.is_some()));
        m
    }

    pub fn paint(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("text-color".into(), json!(self.color));
        m.insert("text-halo-color".into(), json!(self.halo_color));
        m.insert("text-halo-width".into(), json!(self.halo_width_px));
        m
    }

    /// Symbol layer drawing `field` from the `labels` sub-layer of `source`.
    pub fn layer(
        &self,
        id: impl Into<String>,
        source: impl Into<String>,
        source_layer: impl Into<String>,
        field: Option<&str>,
    ) -> LayerSpec {
        LayerSpec::new(id, source, source_layer, LayerType::Symbol)
            .with_layout(self.layout(field))
            .with_paint(self.paint())
    }
}
