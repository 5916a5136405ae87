use std::future::Future;
use std::pin::Pin;

use crate::error::GatewayError;
use crate::protocol::{
    ExtentResponse, FieldInfo, GeometryTypeResponse, LayerStateAck, LayerStateReport, SridCheck,
};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend lookups the layer lifecycle depends on.
///
/// Methods return boxed futures for dyn-compatibility, so the viewer can hold
/// an `Arc<dyn MetadataGateway>` and swap in a fake for tests.
pub trait MetadataGateway: Send + Sync {
    fn check_srid<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<SridCheck, GatewayError>>;

    fn geometry_type<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<GeometryTypeResponse, GatewayError>>;

    fn extent<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<ExtentResponse, GatewayError>>;

    /// Field list, already normalized from either body shape.
    fn list_fields<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FieldInfo>, GatewayError>>;

    fn report_layer_state(
        &self,
        report: LayerStateReport,
    ) -> BoxFuture<'_, Result<LayerStateAck, GatewayError>>;

    /// Vector tile URL template for a table, with literal `{z}/{x}/{y}` placeholders.
    fn tile_url_template(&self, schema: &str, table: &str) -> String;
}
