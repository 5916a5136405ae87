use tracing::debug;

use crate::host::{HostError, TileLayerHost};
use crate::layer::{LayerSpec, SourceSpec};

/// A table addressed by schema and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Viewer selection plus everything currently installed on the map.
///
/// Schema and table are a single `Option<TableRef>`: both set or both unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub current: Option<TableRef>,
    pub selected_field: Option<String>,
    pub active_layer_ids: Vec<String>,
    pub active_source_ids: Vec<String>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        *self == Session::default()
    }
}

/// Single source of truth for what the viewer has put on the map.
///
/// `install` and `uninstall` are idempotent per id: an id already present is
/// not added again and an absent one is not removed, so the surface never sees
/// a duplicate-id or missing-id call from here.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    session: Session,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current(&self) -> Option<&TableRef> {
        self.session.current.as_ref()
    }

    pub fn set_current(&mut self, table: Option<TableRef>) {
        self.session.current = table;
    }

    pub fn selected_field(&self) -> Option<&str> {
        self.session.selected_field.as_deref()
    }

    pub fn set_selected_field(&mut self, field: Option<String>) {
        self.session.selected_field = field;
    }

    pub fn active_layer_ids(&self) -> &[String] {
        &self.session.active_layer_ids
    }

    pub fn active_source_ids(&self) -> &[String] {
        &self.session.active_source_ids
    }

    pub fn is_tracking(&self) -> bool {
        !self.session.active_layer_ids.is_empty() || !self.session.active_source_ids.is_empty()
    }

    /// Add `source` and then each layer, skipping ids the host already has.
    pub fn install<H: TileLayerHost + ?Sized>(
        &mut self,
        host: &mut H,
        source_id: &str,
        source: &SourceSpec,
        layers: &[LayerSpec],
    ) -> Result<(), HostError> {
        if host.has_source(source_id) {
            debug!(source_id, "source already on map");
        } else {
            host.add_source(source_id, source)?;
        }
        track(&mut self.session.active_source_ids, source_id);

        for layer in layers {
            if host.has_layer(&layer.id) {
                debug!(layer_id = %layer.id, "layer already on map");
            } else {
                host.add_layer(layer)?;
            }
            track(&mut self.session.active_layer_ids, &layer.id);
        }
        Ok(())
    }

    /// Remove the given layers and then the source, each only if present.
    pub fn uninstall<H: TileLayerHost + ?Sized>(
        &mut self,
        host: &mut H,
        source_id: &str,
        layer_ids: &[&str],
    ) -> Result<(), HostError> {
        for id in layer_ids {
            if host.has_layer(id) {
                debug!(layer_id = id, "removing layer");
                host.remove_layer(id)?;
            }
            self.session.active_layer_ids.retain(|l| l != id);
        }
        if host.has_source(source_id) {
            debug!(source_id, "removing source");
            host.remove_source(source_id)?;
        }
        self.session.active_source_ids.retain(|s| s != source_id);
        Ok(())
    }

    /// Remove everything tracked: all layers first, then all sources.
    ///
    /// An id stays tracked until the host has actually dropped it, so after a
    /// failure the leftovers can be removed by a later call. Every id is
    /// attempted; the first error is returned.
    pub fn uninstall_all<H: TileLayerHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<(), HostError> {
        let mut first_err = None;
        self.session.active_layer_ids.retain(|id| {
            if !host.has_layer(id) {
                return false;
            }
            debug!(layer_id = %id, "removing layer");
            match host.remove_layer(id) {
                Ok(()) => false,
                Err(err) => {
                    first_err.get_or_insert(err);
                    true
                }
            }
        });
        self.session.active_source_ids.retain(|id| {
            if !host.has_source(id) {
                return false;
            }
            debug!(source_id = %id, "removing source");
            match host.remove_source(id) {
                Ok(()) => false,
                Err(err) => {
                    first_err.get_or_insert(err);
                    true
                }
            }
        });
        first_err.map_or(Ok(()), Err)
    }

    /// Drop the current table and field selection, keeping tracked ids.
    pub fn clear_selection(&mut self) {
        self.session.current = None;
        self.session.selected_field = None;
    }

    /// Forget all tracked ids and the selection. The map itself is untouched.
    pub fn reset(&mut self) {
        self.session = Session::default();
    }
}

fn track(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerRegistry, Session, TableRef};
    use crate::host::{HostError, InMemoryHost, TileLayerHost};
    use crate::layer::{LayerSpec, LayerType, SourceSpec};
    use pretty_assertions::assert_eq;

    fn specs() -> (SourceSpec, Vec<LayerSpec>) {
        (
            SourceSpec::vector("http://h/{z}/{x}/{y}.pbf", 0, 22),
            vec![
                LayerSpec::new("f", "s", "features", LayerType::Fill),
                LayerSpec::new("l", "s", "labels", LayerType::Symbol),
            ],
        )
    }

    #[test]
    fn install_tracks_in_order() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.install(&mut host, "s", &source, &layers).unwrap();
        assert_eq!(reg.active_source_ids(), ["s".to_string()]);
        assert_eq!(reg.active_layer_ids(), ["f".to_string(), "l".to_string()]);
        assert_eq!(host.layer_ids(), vec!["f", "l"]);
    }

    #[test]
    fn install_twice_is_a_no_op() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.install(&mut host, "s", &source, &layers).unwrap();
        let ops_after_first = host.ops().len();
        reg.install(&mut host, "s", &source, &layers).unwrap();
        assert_eq!(host.ops().len(), ops_after_first);
        assert_eq!(reg.active_layer_ids().len(), 2);
        assert_eq!(reg.active_source_ids().len(), 1);
    }

    #[test]
    fn uninstall_absent_ids_is_a_no_op() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        reg.uninstall(&mut host, "s", &["f", "l"]).unwrap();
        assert!(host.ops().is_empty());
    }

    #[test]
    fn uninstall_removes_layers_before_source() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.install(&mut host, "s", &source, &layers).unwrap();
        reg.uninstall(&mut host, "s", &["f", "l"]).unwrap();
        assert!(host.layer_ids().is_empty());
        assert!(!host.has_source("s"));
        assert!(!reg.is_tracking());
    }

    #[test]
    fn uninstall_all_tolerates_surface_already_cleared() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.install(&mut host, "s", &source, &layers).unwrap();
        host.swap_style();
        host.clear_log();
        reg.uninstall_all(&mut host).unwrap();
        assert!(host.ops().is_empty());
        assert!(!reg.is_tracking());
    }

    #[test]
    fn uninstall_all_keeps_what_the_host_refused() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.install(&mut host, "s", &source, &layers).unwrap();
        host.add_layer(&LayerSpec::new("foreign", "s", "features", LayerType::Line))
            .unwrap();

        let err = reg.uninstall_all(&mut host).unwrap_err();
        assert_eq!(
            err,
            HostError::SourceInUse {
                source_id: "s".into(),
                layer_id: "foreign".into()
            }
        );
        assert!(reg.active_layer_ids().is_empty());
        assert_eq!(reg.active_source_ids(), ["s".to_string()]);

        host.remove_layer("foreign").unwrap();
        reg.uninstall_all(&mut host).unwrap();
        assert!(!host.has_source("s"));
        assert!(!reg.is_tracking());
    }

    #[test]
    fn clear_selection_keeps_tracked_ids() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.set_current(Some(TableRef::new("public", "cities")));
        reg.set_selected_field(Some("name".into()));
        reg.install(&mut host, "s", &source, &layers).unwrap();
        reg.clear_selection();
        assert_eq!(reg.current(), None);
        assert_eq!(reg.selected_field(), None);
        assert_eq!(reg.active_source_ids().len(), 1);
    }

    #[test]
    fn reset_clears_session_without_touching_map() {
        let mut host = InMemoryHost::default();
        let mut reg = LayerRegistry::new();
        let (source, layers) = specs();
        reg.set_current(Some(TableRef::new("public", "cities")));
        reg.set_selected_field(Some("name".into()));
        reg.install(&mut host, "s", &source, &layers).unwrap();
        reg.reset();
        assert_eq!(reg.session(), &Session::default());
        assert!(reg.session().is_empty());
        assert_eq!(host.layer_ids(), vec!["f", "l"]);
    }

    #[test]
    fn table_ref_displays_qualified() {
        assert_eq!(TableRef::new("public", "cities").to_string(), "public.cities");
    }
}
