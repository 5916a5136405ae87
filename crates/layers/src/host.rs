//! Narrow capability surface of the map the viewer draws into.

use std::collections::BTreeMap;

use foundation::{Extent, ListenerId, LngLat};
use runtime::{EventBus, MapEvent, MapEventKind};
use serde_json::Value;

use crate::layer::{LayerSpec, SourceSpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("source already exists: {0}")]
    DuplicateSource(String),
    #[error("layer already exists: {0}")]
    DuplicateLayer(String),
    #[error("source not found: {0}")]
    MissingSource(String),
    #[error("layer not found: {0}")]
    MissingLayer(String),
    #[error("source {source_id} is still used by layer {layer_id}")]
    SourceInUse { source_id: String, layer_id: String },
}

/// Camera change applied without fitting, e.g. flattening pitch and bearing.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct CameraOptions {
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
    pub duration_ms: u32,
}

impl CameraOptions {
    /// Look straight down with north up, instantly.
    pub fn flat() -> Self {
        Self {
            pitch: Some(0.0),
            bearing: Some(0.0),
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct EdgePadding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl EdgePadding {
    pub fn uniform(px: f64) -> Self {
        Self {
            top: px,
            bottom: px,
            left: px,
            right: px,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FitBoundsOptions {
    pub padding: EdgePadding,
    pub duration_ms: u32,
    pub max_zoom: f64,
}

/// What the lifecycle needs from a vector map surface.
///
/// Like real map surfaces, adding an id that already exists and removing one
/// that does not are errors; callers check with `has_*` first.
pub trait TileLayerHost {
    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<(), HostError>;
    fn remove_source(&mut self, id: &str) -> Result<(), HostError>;
    fn has_source(&self, id: &str) -> bool;

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), HostError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), HostError>;
    fn has_layer(&self, id: &str) -> bool;

    fn set_layout_property(
        &mut self,
        layer_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), HostError>;
    fn layout_property(&self, layer_id: &str, name: &str) -> Option<Value>;

    fn ease_to(&mut self, camera: CameraOptions);
    fn fit_bounds(&mut self, bounds: Extent, options: FitBoundsOptions);
    fn zoom(&self) -> f64;
    fn center(&self) -> LngLat;

    fn subscribe(&mut self, kind: MapEventKind) -> ListenerId;
    /// Returns `false` if the token was not registered.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;
}

/// Camera commands received by [`InMemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCommand {
    EaseTo(CameraOptions),
    FitBounds(Extent, FitBoundsOptions),
}

/// Mutating calls received by [`InMemoryHost`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    AddSource(String),
    RemoveSource(String),
    AddLayer(String),
    RemoveLayer(String),
    SetLayout { layer: String, name: String },
}

/// Deterministic in-memory map surface.
///
/// Layers keep insertion order; sources are keyed in a `BTreeMap`.
#[derive(Debug)]
pub struct InMemoryHost {
    sources: BTreeMap<String, SourceSpec>,
    layers: Vec<LayerSpec>,
    center: LngLat,
    zoom: f64,
    events: EventBus,
    camera: Vec<CameraCommand>,
    ops: Vec<HostOp>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new(LngLat::new(0.0, 0.0), 2.0)
    }
}

impl InMemoryHost {
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            sources: BTreeMap::new(),
            layers: Vec::new(),
            center,
            zoom,
            events: EventBus::new(),
            camera: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Move the viewport and return the `MoveEnd` deliveries the move produces.
    pub fn move_to(&mut self, center: LngLat, zoom: f64) -> Vec<MapEvent> {
        self.center = center;
        self.zoom = zoom;
        self.events.emit(MapEventKind::MoveEnd)
    }

    /// Swap the basemap style: every source and layer is dropped, then
    /// `StyleLoad` fires.
    pub fn swap_style(&mut self) -> Vec<MapEvent> {
        self.sources.clear();
        self.layers.clear();
        self.events.emit(MapEventKind::StyleLoad)
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn camera_commands(&self) -> &[CameraCommand] {
        &self.camera
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn clear_log(&mut self) {
        self.ops.clear();
        self.camera.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.events.is_subscribed(id)
    }
}

impl TileLayerHost for InMemoryHost {
    fn add_source(&mut self, id: &str, spec: &SourceSpec) -> Result<(), HostError> {
        if self.sources.contains_key(id) {
            return Err(HostError::DuplicateSource(id.to_string()));
        }
        self.ops.push(HostOp::AddSource(id.to_string()));
        self.sources.insert(id.to_string(), spec.clone());
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), HostError> {
        if !self.sources.contains_key(id) {
            return Err(HostError::MissingSource(id.to_string()));
        }
        if let Some(layer) = self.layers.iter().find(|l| l.source == id) {
            return Err(HostError::SourceInUse {
                source_id: id.to_string(),
                layer_id: layer.id.clone(),
            });
        }
        self.ops.push(HostOp::RemoveSource(id.to_string()));
        self.sources.remove(id);
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, spec: &LayerSpec) -> Result<(), HostError> {
        if self.has_layer(&spec.id) {
            return Err(HostError::DuplicateLayer(spec.id.clone()));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(HostError::MissingSource(spec.source.clone()));
        }
        self.ops.push(HostOp::AddLayer(spec.id.clone()));
        self.layers.push(spec.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), HostError> {
        let Some(pos) = self.layers.iter().position(|l| l.id == id) else {
            return Err(HostError::MissingLayer(id.to_string()));
        };
        self.ops.push(HostOp::RemoveLayer(id.to_string()));
        self.layers.remove(pos);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn set_layout_property(
        &mut self,
        layer_id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), HostError> {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id == layer_id) else {
            return Err(HostError::MissingLayer(layer_id.to_string()));
        };
        layer.layout.insert(name.to_string(), value);
        self.ops.push(HostOp::SetLayout {
            layer: layer_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn layout_property(&self, layer_id: &str, name: &str) -> Option<Value> {
        self.layer(layer_id)?.layout.get(name).cloned()
    }

    fn ease_to(&mut self, camera: CameraOptions) {
        self.camera.push(CameraCommand::EaseTo(camera));
    }

    fn fit_bounds(&mut self, bounds: Extent, options: FitBoundsOptions) {
        self.camera.push(CameraCommand::FitBounds(bounds, options));
        self.center = bounds.center();
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn center(&self) -> LngLat {
        self.center
    }

    fn subscribe(&mut self, kind: MapEventKind) -> ListenerId {
        self.events.subscribe(kind)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }
}
