use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::gateway::{BoxFuture, MetadataGateway};
use crate::protocol::{
    ExtentResponse, FieldInfo, FieldsBody, GeometryTypeResponse, LayerStateAck, LayerStateReport,
    SridCheck,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// `MetadataGateway` talking JSON over HTTP to the tiles backend.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    api_base: Url,
    tile_base: Url,
}

impl HttpGateway {
    pub fn new(api_base: &str) -> Result<Self, GatewayError> {
        Self::with_client(reqwest::Client::new(), api_base, None)
    }

    /// Client with a per-request timeout; an elapsed timeout surfaces as
    /// `GatewayError::Transport`.
    pub fn with_timeout(
        api_base: &str,
        tile_base: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(http, api_base, tile_base)
    }

    /// `tile_base` defaults to `api_base`; tiles may be served from another origin.
    pub fn with_client(
        http: reqwest::Client,
        api_base: &str,
        tile_base: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let api_base = parse_base(api_base)?;
        let tile_base = match tile_base {
            Some(base) => parse_base(base)?,
            None => api_base.clone(),
        };
        Ok(Self {
            http,
            api_base,
            tile_base,
        })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        api_url(&self.api_base, segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let resp = self.http.get(url).send().await?;
        decode_response(resp).await
    }
}

fn parse_base(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw).map_err(|e| GatewayError::Url(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(GatewayError::Url(format!("{url}: not a base url")));
    }
    Ok(url)
}

/// `base` + `/api/` + each segment, percent-encoded.
fn api_url(base: &Url, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| GatewayError::Url(format!("{base}: not a base url")))?;
        path.pop_if_empty().push("api").extend(segments);
    }
    Ok(url)
}

async fn decode_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl MetadataGateway for HttpGateway {
    fn check_srid<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<SridCheck, GatewayError>> {
        Box::pin(async move { self.get_json(&["check-srid", schema, table]).await })
    }

    fn geometry_type<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<GeometryTypeResponse, GatewayError>> {
        Box::pin(async move { self.get_json(&["geometry-type", schema, table]).await })
    }

    fn extent<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<ExtentResponse, GatewayError>> {
        Box::pin(async move { self.get_json(&["extent", schema, table]).await })
    }

    fn list_fields<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FieldInfo>, GatewayError>> {
        Box::pin(async move {
            let body: FieldsBody = self.get_json(&["fields", schema, table]).await?;
            Ok(body.into_fields())
        })
    }

    fn report_layer_state(
        &self,
        report: LayerStateReport,
    ) -> BoxFuture<'_, Result<LayerStateAck, GatewayError>> {
        Box::pin(async move {
            let url = self.endpoint(&["layer-state"])?;
            debug!(%url, tile = %report.tile, "POST");
            let resp = self.http.post(url).json(&report).send().await?;
            decode_response(resp).await
        })
    }

    fn tile_url_template(&self, schema: &str, table: &str) -> String {
        // Placeholders are appended after encoding so the braces stay literal.
        match api_url(&self.tile_base, &["mvt", schema, table]) {
            Ok(url) => format!("{url}/{{z}}/{{x}}/{{y}}.pbf"),
            Err(err) => {
                warn!(error = %err, "tile base cannot carry a path");
                format!(
                    "{}/api/mvt/{schema}/{table}/{{z}}/{{x}}/{{y}}.pbf",
                    self.tile_base.as_str().trim_end_matches('/')
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HttpGateway;
    use crate::error::GatewayError;
    use crate::gateway::MetadataGateway;
    use crate::protocol::{FieldInfo, LayerStateReport, SridCheck};
    use axum::Json;
    use axum::Router;
    use axum::extract::Path as AxumPath;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use foundation::{Extent, TileIndex};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    async fn check_srid(AxumPath((_schema, table)): AxumPath<(String, String)>) -> Response {
        match table.as_str() {
            "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "SRID check failed: db down")
                .into_response(),
            "nosrid" => Json(json!({"valid": false, "error": "Invalid SRID (0)."})).into_response(),
            _ => Json(json!({"valid": true, "srid": 4326})).into_response(),
        }
    }

    async fn fields(AxumPath((_schema, table)): AxumPath<(String, String)>) -> Response {
        if table == "bare" {
            Json(json!([{"name": "a"}, {"name": "b"}])).into_response()
        } else {
            Json(json!({"fields": [{"name": "population"}, {"name": "name"}]})).into_response()
        }
    }

    async fn layer_state(Json(body): Json<Value>) -> Response {
        Json(json!({
            "schema": body["schema_name"],
            "table": body["table"],
            "tile": {"z": body["z"], "x": body["x"], "y": body["y"]},
            "message": "Layer state received and logged."
        }))
        .into_response()
    }

    async fn spawn_api() -> String {
        let app = Router::new()
            .route("/api/check-srid/:schema/:table", get(check_srid))
            .route(
                "/api/geometry-type/:schema/:table",
                get(|| async { Json(json!({"geometryType": "MULTIPOLYGON"})) }),
            )
            .route(
                "/api/extent/:schema/:table",
                get(|| async {
                    Json(json!({"bounds": {"west": -10.0, "south": 40.0, "east": 10.0, "north": 60.0}}))
                }),
            )
            .route("/api/fields/:schema/:table", get(fields))
            .route("/api/layer-state", post(layer_state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn reads_all_lookups() {
        let base = spawn_api().await;
        let gw = HttpGateway::new(&base).unwrap();

        assert_eq!(
            gw.check_srid("public", "cities").await.unwrap(),
            SridCheck::valid(4326)
        );
        assert_eq!(
            gw.geometry_type("public", "cities")
                .await
                .unwrap()
                .geometry_type
                .as_deref(),
            Some("MULTIPOLYGON")
        );
        let extent = gw.extent("public", "cities").await.unwrap();
        assert_eq!(
            extent.bounds.and_then(|b| b.to_extent()),
            Some(Extent::new(-10.0, 40.0, 10.0, 60.0))
        );
        assert_eq!(
            gw.list_fields("public", "cities").await.unwrap(),
            vec![FieldInfo::new("population"), FieldInfo::new("name")]
        );
        assert_eq!(
            gw.list_fields("public", "bare").await.unwrap(),
            vec![FieldInfo::new("a"), FieldInfo::new("b")]
        );
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let base = spawn_api().await;
        let gw = HttpGateway::new(&base).unwrap();
        let err = gw.check_srid("public", "broken").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 500,
                body: "SRID check failed: db down".to_string()
            }
        );
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn invalid_srid_is_a_successful_answer() {
        let base = spawn_api().await;
        let gw = HttpGateway::new(&base).unwrap();
        let check = gw.check_srid("public", "nosrid").await.unwrap();
        assert!(!check.valid);
        assert_eq!(check.error.as_deref(), Some("Invalid SRID (0)."));
    }

    #[tokio::test]
    async fn posts_layer_state() {
        let base = spawn_api().await;
        let gw = HttpGateway::new(&base).unwrap();
        let ack = gw
            .report_layer_state(LayerStateReport::new(
                "public",
                "cities",
                TileIndex::new(5, 16, 10),
            ))
            .await
            .unwrap();
        assert_eq!(ack.message, "Layer state received and logged.");
        assert_eq!(ack.tile.map(|t| (t.z, t.x, t.y)), Some((5, 16, 10)));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Bind and drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gw = HttpGateway::new(&format!("http://{addr}")).unwrap();
        let err = gw.geometry_type("public", "cities").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)), "{err:?}");
    }

    #[test]
    fn endpoint_escapes_segments() {
        let gw = HttpGateway::new("http://localhost:8000/").unwrap();
        let url = gw.endpoint(&["extent", "my schema", "t/1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/extent/my%20schema/t%2F1"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let gw = HttpGateway::new("http://example.com/tiles/").unwrap();
        let url = gw.endpoint(&["fields", "public", "cities"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/tiles/api/fields/public/cities");
    }

    #[test]
    fn tile_template_keeps_placeholders() {
        let gw = HttpGateway::new("http://localhost:8000").unwrap();
        assert_eq!(
            gw.tile_url_template("public", "cities"),
            "http://localhost:8000/api/mvt/public/cities/{z}/{x}/{y}.pbf"
        );

        let split = HttpGateway::with_client(
            reqwest::Client::new(),
            "http://localhost:8000",
            Some("https://tiles.example.com/"),
        )
        .unwrap();
        assert_eq!(
            split.tile_url_template("s", "t"),
            "https://tiles.example.com/api/mvt/s/t/{z}/{x}/{y}.pbf"
        );
    }

    #[test]
    fn tile_template_escapes_table_names() {
        let gw = HttpGateway::new("http://localhost:8000").unwrap();
        let template = gw.tile_url_template("my schema", "t/1");
        assert_eq!(
            template,
            "http://localhost:8000/api/mvt/my%20schema/t%2F1/{z}/{x}/{y}.pbf"
        );
        assert_eq!(
            gw.endpoint(&["mvt", "my schema", "t/1"]).unwrap().as_str(),
            template.trim_end_matches("/{z}/{x}/{y}.pbf")
        );
    }

    #[test]
    fn rejects_invalid_tile_base() {
        assert!(matches!(
            HttpGateway::with_client(reqwest::Client::new(), "http://localhost:8000", Some("nope")),
            Err(GatewayError::Url(_))
        ));
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(matches!(
            HttpGateway::new("mailto:someone@example.com"),
            Err(GatewayError::Url(_))
        ));
        assert!(matches!(HttpGateway::new("not a url"), Err(GatewayError::Url(_))));
    }
}
