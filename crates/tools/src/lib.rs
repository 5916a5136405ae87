//! Helpers behind the `tilesdbg` subcommands.

use std::fmt;

use foundation::{TileIndex, to_tile_index};
use gateway::{MetadataGateway, expand_tile_template};
use layers::InMemoryHost;
use viewer::{FieldOptions, LayerLifecycleManager, RecordingUi, StartOutcome};

/// Validate a zoom level given on the command line.
pub fn parse_zoom(zoom: f64) -> anyhow::Result<u8> {
    anyhow::ensure!(
        zoom.is_finite() && (0.0..=24.0).contains(&zoom),
        "zoom must be between 0 and 24, got {zoom}"
    );
    Ok(zoom.floor() as u8)
}

pub fn check_position(lon: f64, lat: f64) -> anyhow::Result<()> {
    anyhow::ensure!((-180.0..=180.0).contains(&lon), "longitude out of range: {lon}");
    anyhow::ensure!((-85.0511..=85.0511).contains(&lat), "latitude out of range: {lat}");
    Ok(())
}

pub fn tile_at(lon: f64, lat: f64, zoom: f64) -> anyhow::Result<TileIndex> {
    check_position(lon, lat)?;
    Ok(to_tile_index(lon, lat, parse_zoom(zoom)?))
}

/// Full MVT URL of the tile under `lon`/`lat`.
pub fn tile_url(gateway: &dyn MetadataGateway, schema: &str, table: &str, tile: TileIndex) -> String {
    expand_tile_template(&gateway.tile_url_template(schema, table), tile)
}

/// Human-readable summary of a probe run.
pub struct ProbeSummary<'a> {
    pub outcome: &'a StartOutcome,
    pub manager: &'a LayerLifecycleManager<InMemoryHost, RecordingUi>,
}

impl fmt::Display for ProbeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            StartOutcome::Rejected { table, reason } => {
                writeln!(f, "{table}: rejected")?;
                writeln!(f, "  reason: {reason}")?;
            }
            StartOutcome::Active(report) => {
                writeln!(f, "{}: active", report.table)?;
                writeln!(
                    f,
                    "  geometry: {} ({})",
                    report.geometry_type.value().map_or("?", String::as_str),
                    report.style.name()
                )?;
                if let Some(reason) = report.geometry_type.reason() {
                    writeln!(f, "  note: {reason}")?;
                }
                writeln!(f, "  source: {}", report.ids.source)?;
                for id in report.ids.layers() {
                    writeln!(f, "  layer: {id}")?;
                }
                match self.manager.field_options() {
                    FieldOptions::Matches(names) => writeln!(f, "  fields: {}", names.join(", "))?,
                    FieldOptions::Empty(message) => writeln!(f, "  fields: ({message})")?,
                }
                if let Some(reason) = report.extent.reason() {
                    writeln!(f, "  extent: {reason}")?;
                } else if let Some(e) = report.extent.value() {
                    writeln!(
                        f,
                        "  extent: {:.4},{:.4},{:.4},{:.4}",
                        e.west, e.south, e.east, e.north
                    )?;
                }
            }
        }
        if let Some(status) = self.manager.ui().status.as_deref() {
            writeln!(f, "  center tile: {status}")?;
        }
        Ok(())
    }
}

pub fn describe_probe(
    outcome: &StartOutcome,
    manager: &LayerLifecycleManager<InMemoryHost, RecordingUi>,
) -> String {
    ProbeSummary { outcome, manager }.to_string()
}

#[cfg(test)]
mod tests {
    use super::{describe_probe, parse_zoom, tile_at, tile_url};
    use foundation::TileIndex;
    use gateway::{FieldInfo, GeometryTypeResponse, SridCheck, StaticGateway, StaticResponses};
    use layers::InMemoryHost;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use viewer::{LayerLifecycleManager, RecordingUi, ViewerConfig};

    #[test]
    fn zoom_is_floored_and_bounded() {
        assert_eq!(parse_zoom(10.9).unwrap(), 10);
        assert!(parse_zoom(-1.0).is_err());
        assert!(parse_zoom(f64::NAN).is_err());
    }

    #[test]
    fn tile_at_rejects_out_of_range_positions() {
        assert_eq!(tile_at(0.0, 0.0, 1.0).unwrap(), TileIndex::new(1, 1, 1));
        assert!(tile_at(200.0, 0.0, 1.0).is_err());
        assert!(tile_at(0.0, 89.0, 1.0).is_err());
    }

    #[test]
    fn url_uses_gateway_template() {
        let gw = StaticGateway::default();
        assert_eq!(
            tile_url(&gw, "public", "cities", TileIndex::new(3, 4, 2)),
            "http://localhost:8000/api/mvt/public/cities/3/4/2.pbf"
        );
    }

    #[tokio::test]
    async fn probe_summary_lists_layers_and_fields() {
        let gateway = Arc::new(StaticGateway::new(StaticResponses {
            geometry_type: Ok(GeometryTypeResponse::new("POINT")),
            fields: Ok(vec![FieldInfo::new("name")]),
            ..StaticResponses::default()
        }));
        let mut manager = LayerLifecycleManager::new(
            InMemoryHost::default(),
            RecordingUi::new(),
            gateway,
            ViewerConfig::default(),
        )
        .unwrap();
        let outcome = manager.start("public", "stops").await.unwrap();
        let text = describe_probe(&outcome, &manager);
        assert!(text.starts_with("public.stops: active\n"));
        assert!(text.contains("  geometry: POINT (Point)\n"));
        assert!(text.contains("  layer: public-stops-labels-layer\n"));
        assert!(text.contains("  fields: name\n"));
        assert!(text.contains("  center tile: /public/stops/2/2/2.pbf\n"));
    }

    #[tokio::test]
    async fn probe_summary_reports_rejection() {
        let gateway = Arc::new(StaticGateway::new(StaticResponses {
            srid: Ok(SridCheck::invalid("SRID 0 is not supported")),
            ..StaticResponses::default()
        }));
        let mut manager = LayerLifecycleManager::new(
            InMemoryHost::default(),
            RecordingUi::new(),
            gateway,
            ViewerConfig::default(),
        )
        .unwrap();
        let outcome = manager.start("public", "raw").await.unwrap();
        assert_eq!(
            describe_probe(&outcome, &manager),
            "public.raw: rejected\n  reason: Cannot load layer: SRID 0 is not supported\n"
        );
    }
}
