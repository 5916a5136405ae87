//! One table on the map at a time.
//!
//! [`LayerLifecycleManager`] owns the session, talks to the backend through a
//! [`MetadataGateway`] and mutates the map only through [`TileLayerHost`].
//! It is driven from a single task via `&mut self`; map events are forwarded
//! by the embedding loop through [`LayerLifecycleManager::handle_event`].

use std::sync::Arc;

use foundation::{Extent, ListenerId, TileIndex, to_tile_index};
use gateway::{
    FEATURES_SOURCE_LAYER, FieldInfo, LABELS_SOURCE_LAYER, LayerStateReport, MetadataGateway,
    expand_tile_template, tile_path,
};
use layers::labels::{LabelStyle, text_field, visibility};
use layers::symbology::{GeometryKind, RenderStyle};
use layers::{
    CameraOptions, HostError, LayerRegistry, LayerSpec, Session, SourceSpec, TableLayerIds,
    TableRef, TileLayerHost,
};
use runtime::{MapEvent, MapEventKind};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::basemap::{Basemap, BasemapSwitch, find_basemap};
use crate::config::ViewerConfig;
use crate::error::LifecycleError;
use crate::fields::{FieldOptions, FieldSelectionController};
use crate::resolution::{
    Resolution, resolve_extent, resolve_fields, resolve_geometry_type, resolve_srid,
};
use crate::ui::ViewerUi;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Loading,
    Active,
}

/// How each lookup of a successful `start` resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct StartReport {
    pub table: TableRef,
    pub ids: TableLayerIds,
    pub geometry_type: Resolution<String>,
    pub style: GeometryKind,
    pub fields: Resolution<Vec<FieldInfo>>,
    pub extent: Resolution<Extent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Active(StartReport),
    /// SRID validation failed; nothing was put on the map.
    Rejected { table: TableRef, reason: String },
}

impl StartOutcome {
    pub fn is_active(&self) -> bool {
        matches!(self, StartOutcome::Active(_))
    }
}

pub struct LayerLifecycleManager<H, U> {
    host: H,
    ui: U,
    gateway: Arc<dyn MetadataGateway>,
    config: ViewerConfig,
    registry: LayerRegistry,
    fields: FieldSelectionController,
    labels: LabelStyle,
    state: LifecycleState,
    move_listener: Option<ListenerId>,
    style_listener: ListenerId,
    basemap: &'static Basemap,
    pending_reports: Vec<JoinHandle<()>>,
}

impl<H: TileLayerHost, U: ViewerUi> LayerLifecycleManager<H, U> {
    /// Wire the manager to a map surface. Subscribes to style loads for the
    /// manager's whole lifetime.
    pub fn new(
        mut host: H,
        ui: U,
        gateway: Arc<dyn MetadataGateway>,
        config: ViewerConfig,
    ) -> Result<Self, LifecycleError> {
        let basemap = find_basemap(&config.basemap)
            .ok_or_else(|| LifecycleError::UnknownBasemap(config.basemap.clone()))?;
        let style_listener = host.subscribe(MapEventKind::StyleLoad);
        Ok(Self {
            host,
            ui,
            gateway,
            config,
            registry: LayerRegistry::new(),
            fields: FieldSelectionController::new(),
            labels: LabelStyle::default(),
            state: LifecycleState::Idle,
            move_listener: None,
            style_listener,
            basemap,
            pending_reports: Vec::new(),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        self.registry.session()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn active_basemap(&self) -> &'static Basemap {
        self.basemap
    }

    /// Ids of the table currently on the map.
    pub fn table_ids(&self) -> Option<TableLayerIds> {
        self.registry
            .current()
            .map(|t| TableLayerIds::new(&t.schema, &t.table))
    }

    /// Validate `schema.table` against the backend and put it on the map,
    /// replacing whatever table was shown before.
    pub async fn start(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<StartOutcome, LifecycleError> {
        if self.state != LifecycleState::Idle
            || self.registry.current().is_some()
            || self.registry.is_tracking()
        {
            self.stop()?;
        }

        let table_ref = TableRef::new(schema, table);
        info!(schema, table, "loading table");
        self.registry.set_current(Some(table_ref.clone()));
        self.state = LifecycleState::Loading;
        self.ui.set_loading(true);

        let gateway = Arc::clone(&self.gateway);
        let (srid, geometry, fields, extent) = futures_util::join!(
            gateway.check_srid(schema, table),
            gateway.geometry_type(schema, table),
            gateway.list_fields(schema, table),
            gateway.extent(schema, table),
        );

        let srid = resolve_srid(&table_ref, srid);
        if let Resolution::Failed(reason) = srid {
            error!(schema, table, %reason, "table rejected");
            self.ui.show_error(&reason);
            self.registry.set_current(None);
            self.state = LifecycleState::Idle;
            self.ui.set_loading(false);
            return Ok(StartOutcome::Rejected {
                table: table_ref,
                reason,
            });
        }
        if let Some(check) = srid.value() {
            debug!(schema, table, srid = ?check.srid, "srid accepted");
        }

        let geometry = resolve_geometry_type(&table_ref, geometry);
        if let Some(reason) = geometry.reason() {
            warn!(schema, table, %reason, "using default geometry type");
        }

        let fields = resolve_fields(&table_ref, fields);
        if let Some(reason) = fields.reason() {
            warn!(schema, table, %reason, "no label fields");
        }
        let options = self
            .fields
            .set_available_fields(fields.value().map(Vec::as_slice).unwrap_or_default());
        self.registry.set_selected_field(None);
        self.ui.show_fields(&options);

        let extent = resolve_extent(&table_ref, extent);
        match &extent {
            Resolution::Ok(bounds) | Resolution::Degraded(bounds, _) => {
                debug!(schema, table, ?bounds, "fitting viewport");
                self.host.ease_to(CameraOptions::flat());
                self.host.fit_bounds(*bounds, self.config.fit_options());
            }
            Resolution::Failed(reason) => {
                warn!(schema, table, %reason, "skipping viewport fit");
                self.ui.show_warning(reason);
            }
        }

        let style = RenderStyle::for_geometry_type(geometry.value().map_or("", String::as_str));
        let ids = match self.install_map_layer(&table_ref, &style) {
            Ok(ids) => ids,
            Err(err) => {
                error!(schema, table, error = %err, "failed to install layers");
                if let Err(stop_err) = self.stop() {
                    warn!(error = %stop_err, "teardown after failed install");
                }
                self.ui.set_loading(false);
                return Err(err.into());
            }
        };

        self.move_listener = Some(self.host.subscribe(MapEventKind::MoveEnd));
        self.state = LifecycleState::Active;
        self.report_status();
        self.ui.set_loading(false);
        info!(schema, table, style = style.kind.name(), "table active");

        Ok(StartOutcome::Active(StartReport {
            table: table_ref,
            ids,
            geometry_type: geometry,
            style: style.kind,
            fields,
            extent,
        }))
    }

    /// (Re)install the source, feature layer and label layer for `table`.
    ///
    /// Anything already on the map under the same ids is removed first, so a
    /// second call replaces rather than duplicates.
    pub fn install_map_layer(
        &mut self,
        table: &TableRef,
        style: &RenderStyle,
    ) -> Result<TableLayerIds, HostError> {
        let ids = TableLayerIds::new(&table.schema, &table.table);
        self.registry
            .uninstall(&mut self.host, &ids.source, &ids.layers())?;

        let source = SourceSpec::vector(
            self.gateway.tile_url_template(&table.schema, &table.table),
            self.config.source_min_zoom,
            self.config.source_max_zoom,
        );
        let features = LayerSpec::new(
            ids.features.as_str(),
            ids.source.as_str(),
            FEATURES_SOURCE_LAYER,
            style.layer_type,
        )
        .with_paint(style.paint.clone());
        let labels = self.labels.layer(
            ids.labels.as_str(),
            ids.source.as_str(),
            LABELS_SOURCE_LAYER,
            self.registry.selected_field(),
        );

        self.registry
            .install(&mut self.host, &ids.source, &source, &[features, labels])?;
        debug!(source = %ids.source, "installed table layers");
        Ok(ids)
    }

    /// Show the tile under the viewport center and tell the backend about it.
    ///
    /// The backend report runs on the ambient tokio runtime and is never
    /// awaited here; its failure is only logged.
    pub fn report_status(&mut self) {
        if self.state != LifecycleState::Active {
            return;
        }
        let Some(table) = self.registry.current().cloned() else {
            return;
        };

        let center = self.host.center();
        let zoom = self.host.zoom().floor().max(0.0) as u8;
        let tile = to_tile_index(center.lng, center.lat, zoom);
        let path = tile_path(&table.schema, &table.table, tile);
        self.ui.set_status(Some(path.as_str()));
        debug!(
            url = %expand_tile_template(
                &self.gateway.tile_url_template(&table.schema, &table.table),
                tile
            ),
            "center tile"
        );

        self.spawn_report(LayerStateReport::new(table.schema, table.table, tile));
    }

    fn spawn_report(&mut self, report: LayerStateReport) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; layer state not reported");
            return;
        };
        self.pending_reports.retain(|h| !h.is_finished());

        let gateway = Arc::clone(&self.gateway);
        let tile: TileIndex = report.tile;
        self.pending_reports.push(runtime.spawn(async move {
            match gateway.report_layer_state(report).await {
                Ok(ack) => debug!(message = %ack.message, %tile, "layer state acknowledged"),
                Err(err) => warn!(error = %err, %tile, "failed to report layer state"),
            }
        }));
    }

    /// Wait for every spawned layer-state report to finish.
    pub async fn settle(&mut self) {
        for handle in std::mem::take(&mut self.pending_reports) {
            if let Err(err) = handle.await {
                warn!(error = %err, "layer state report task failed");
            }
        }
    }

    /// Take the current table off the map and return to `Idle`.
    ///
    /// Safe to call at any time; when nothing is shown it makes no host calls.
    /// The manager always ends up `Idle`. If the host refuses a removal the
    /// error is returned and the refused ids stay tracked, so the next `stop`
    /// or `start` retries them.
    pub fn stop(&mut self) -> Result<(), LifecycleError> {
        if let Some(listener) = self.move_listener.take() {
            self.host.unsubscribe(listener);
        }
        if let Some(table) = self.registry.current() {
            info!(table = %table, "unloading table");
        }
        let removed = self.registry.uninstall_all(&mut self.host);
        match &removed {
            Ok(()) => self.registry.reset(),
            Err(err) => {
                warn!(
                    error = %err,
                    layers = ?self.registry.active_layer_ids(),
                    sources = ?self.registry.active_source_ids(),
                    "map objects left behind"
                );
                self.registry.clear_selection();
            }
        }
        self.fields.reset();
        if self.state != LifecycleState::Idle {
            self.ui.clear_fields();
            self.ui.set_status(None);
        }
        self.state = LifecycleState::Idle;
        removed.map_err(LifecycleError::from)
    }

    /// The basemap style was replaced and took our layers with it; put the
    /// current table back with the same ids.
    pub async fn on_basemap_changed(&mut self) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::Active {
            return Ok(());
        }
        let Some(table) = self.registry.current().cloned() else {
            return Ok(());
        };

        let geometry = resolve_geometry_type(
            &table,
            self.gateway
                .geometry_type(&table.schema, &table.table)
                .await,
        );
        if let Some(reason) = geometry.reason() {
            warn!(table = %table, %reason, "using default geometry type");
        }
        let style = RenderStyle::for_geometry_type(geometry.value().map_or("", String::as_str));
        if let Err(err) = self.install_map_layer(&table, &style) {
            error!(table = %table, error = %err, "failed to restore layers");
            if let Err(stop_err) = self.stop() {
                warn!(error = %stop_err, "teardown after failed restore");
            }
            return Err(err.into());
        }
        info!(table = %table, basemap = self.basemap.name, "layers restored after style change");
        self.report_status();
        Ok(())
    }

    /// Route one map event delivery.
    pub async fn handle_event(&mut self, event: MapEvent) -> Result<(), LifecycleError> {
        match event.kind {
            MapEventKind::MoveEnd if Some(event.listener) == self.move_listener => {
                self.report_status();
            }
            MapEventKind::StyleLoad if event.listener == self.style_listener => {
                self.on_basemap_changed().await?;
            }
            kind => debug!(listener = event.listener.get(), ?kind, "ignoring stale event"),
        }
        Ok(())
    }

    /// Point the label layer at `field`, or hide it.
    pub fn update_labels_layer(&mut self, field: Option<&str>) -> Result<(), LifecycleError> {
        let Some(ids) = self.table_ids() else {
            warn!("no table loaded; labels unchanged");
            return Ok(());
        };
        if !self.host.has_layer(&ids.labels) {
            warn!(layer = %ids.labels, "label layer not on map");
            return Ok(());
        }
        self.host
            .set_layout_property(&ids.labels, "text-field", text_field(field))?;
        self.host
            .set_layout_property(&ids.labels, "visibility", visibility(field.is_some()))?;
        debug!(layer = %ids.labels, field, "label layer updated");
        Ok(())
    }

    /// Label features with `name`. Returns whether the selection was applied.
    pub fn select_field(&mut self, name: &str) -> Result<bool, LifecycleError> {
        if self.state != LifecycleState::Active {
            warn!(field = name, "no table loaded; field selection ignored");
            return Ok(false);
        }
        if !self.fields.contains(name) {
            warn!(field = name, "unknown field");
            return Ok(false);
        }
        self.registry.set_selected_field(Some(name.to_string()));
        self.update_labels_layer(Some(name))?;
        Ok(true)
    }

    pub fn clear_field(&mut self) -> Result<(), LifecycleError> {
        self.registry.set_selected_field(None);
        self.update_labels_layer(None)
    }

    pub fn field_options(&self) -> FieldOptions {
        self.fields.options()
    }

    /// Filter the field picker and show the result.
    pub fn filter_fields(&mut self, search: &str) -> FieldOptions {
        let options = self.fields.filter(search);
        self.ui.show_fields(&options);
        options
    }

    /// Choose a basemap by name. The caller applies the returned style URL;
    /// the `StyleLoad` that follows restores the table layers.
    pub fn switch_basemap(&mut self, name: &str) -> Result<BasemapSwitch, LifecycleError> {
        let basemap =
            find_basemap(name).ok_or_else(|| LifecycleError::UnknownBasemap(name.to_string()))?;
        if basemap == self.basemap {
            return Ok(BasemapSwitch::Unchanged);
        }
        info!(from = self.basemap.name, to = basemap.name, "switching basemap");
        self.basemap = basemap;
        Ok(BasemapSwitch::Apply(basemap.style_url))
    }
}
