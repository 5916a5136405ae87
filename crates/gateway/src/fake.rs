use parking_lot::Mutex;

use crate::error::GatewayError;
use crate::gateway::{BoxFuture, MetadataGateway};
use crate::protocol::{
    ExtentResponse, FieldInfo, GeometryTypeResponse, LayerStateAck, LayerStateReport, SridCheck,
};

/// One exchange recorded by [`StaticGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CheckSrid { schema: String, table: String },
    GeometryType { schema: String, table: String },
    Extent { schema: String, table: String },
    ListFields { schema: String, table: String },
    ReportLayerState(LayerStateReport),
}

/// Canned answers served by [`StaticGateway`]; the same answer for every table.
#[derive(Debug, Clone)]
pub struct StaticResponses {
    pub srid: Result<SridCheck, GatewayError>,
    pub geometry_type: Result<GeometryTypeResponse, GatewayError>,
    pub extent: Result<ExtentResponse, GatewayError>,
    pub fields: Result<Vec<FieldInfo>, GatewayError>,
    pub layer_state: Result<LayerStateAck, GatewayError>,
}

impl Default for StaticResponses {
    fn default() -> Self {
        Self {
            srid: Ok(SridCheck::valid(4326)),
            geometry_type: Ok(GeometryTypeResponse::new("POLYGON")),
            extent: Ok(ExtentResponse::default()),
            fields: Ok(Vec::new()),
            layer_state: Ok(LayerStateAck::new("Layer state received and logged.")),
        }
    }
}

/// In-memory `MetadataGateway` that answers from `StaticResponses` and records
/// every call in order.
#[derive(Debug)]
pub struct StaticGateway {
    tile_base: String,
    responses: Mutex<StaticResponses>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl Default for StaticGateway {
    fn default() -> Self {
        Self::new(StaticResponses::default())
    }
}

impl StaticGateway {
    pub fn new(responses: StaticResponses) -> Self {
        Self {
            tile_base: "http://localhost:8000".to_string(),
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the canned answers, e.g. between a `start` and a basemap swap.
    pub fn update(&self, f: impl FnOnce(&mut StaticResponses)) {
        f(&mut self.responses.lock());
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn reports(&self) -> Vec<LayerStateReport> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::ReportLayerState(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }
}

impl MetadataGateway for StaticGateway {
    fn check_srid<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<SridCheck, GatewayError>> {
        self.record(GatewayCall::CheckSrid {
            schema: schema.to_string(),
            table: table.to_string(),
        });
        let answer = self.responses.lock().srid.clone();
        Box::pin(async move { answer })
    }

    fn geometry_type<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<GeometryTypeResponse, GatewayError>> {
        self.record(GatewayCall::GeometryType {
            schema: schema.to_string(),
            table: table.to_string(),
        });
        let answer = self.responses.lock().geometry_type.clone();
        Box::pin(async move { answer })
    }

    fn extent<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<ExtentResponse, GatewayError>> {
        self.record(GatewayCall::Extent {
            schema: schema.to_string(),
            table: table.to_string(),
        });
        let answer = self.responses.lock().extent.clone();
        Box::pin(async move { answer })
    }

    fn list_fields<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FieldInfo>, GatewayError>> {
        self.record(GatewayCall::ListFields {
            schema: schema.to_string(),
            table: table.to_string(),
        });
        let answer = self.responses.lock().fields.clone();
        Box::pin(async move { answer })
    }

    fn report_layer_state(
        &self,
        report: LayerStateReport,
    ) -> BoxFuture<'_, Result<LayerStateAck, GatewayError>> {
        self.record(GatewayCall::ReportLayerState(report));
        let answer = self.responses.lock().layer_state.clone();
        Box::pin(async move { answer })
    }

    fn tile_url_template(&self, schema: &str, table: &str) -> String {
        format!(
            "{}/api/mvt/{schema}/{table}/{{z}}/{{x}}/{{y}}.pbf",
            self.tile_base
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{GatewayCall, StaticGateway};
    use crate::error::GatewayError;
    use crate::gateway::MetadataGateway;
    use crate::protocol::{LayerStateReport, SridCheck};
    use foundation::TileIndex;

    #[tokio::test]
    async fn records_calls_in_order() {
        let gw = StaticGateway::default();
        gw.check_srid("s", "t").await.unwrap();
        gw.list_fields("s", "t").await.unwrap();
        assert_eq!(
            gw.calls(),
            vec![
                GatewayCall::CheckSrid {
                    schema: "s".into(),
                    table: "t".into()
                },
                GatewayCall::ListFields {
                    schema: "s".into(),
                    table: "t".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn update_swaps_answers() {
        let gw = StaticGateway::default();
        gw.update(|r| r.srid = Ok(SridCheck::invalid("E")));
        assert!(!gw.check_srid("s", "t").await.unwrap().valid);

        gw.update(|r| r.srid = Err(GatewayError::Transport("down".into())));
        assert!(gw.check_srid("s", "t").await.is_err());
    }

    #[tokio::test]
    async fn reports_are_filtered() {
        let gw = StaticGateway::default();
        gw.geometry_type("s", "t").await.unwrap();
        let report = LayerStateReport::new("s", "t", TileIndex::new(1, 1, 1));
        gw.report_layer_state(report.clone()).await.unwrap();
        assert_eq!(gw.reports(), vec![report]);
        gw.clear_calls();
        assert!(gw.calls().is_empty());
    }
}
