//! Per-lookup outcome of a table load.
//!
//! Each metadata lookup is folded into a [`Resolution`] so the lifecycle
//! branches on an explicit tag instead of on implicit fallbacks:
//!
//! | lookup        | `Ok`            | `Degraded`                  | `Failed`            |
//! |---------------|-----------------|-----------------------------|---------------------|
//! | SRID          | valid SRID      | never                       | blocks the load     |
//! | geometry type | reported type   | `Polygon` substituted       | never               |
//! | fields        | reported fields | empty list substituted      | never               |
//! | extent        | numeric bounds  | never                       | viewport fit skipped|

use foundation::Extent;
use gateway::{ExtentResponse, FieldInfo, GatewayError, GeometryTypeResponse, SridCheck};
use layers::TableRef;

/// Geometry type assumed when the backend cannot tell us.
pub const DEFAULT_GEOMETRY_TYPE: &str = "Polygon";

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Ok(T),
    /// A safe substitute; the reason says what went wrong.
    Degraded(T, String),
    Failed(String),
}

impl<T> Resolution<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Resolution::Ok(v) | Resolution::Degraded(v, _) => Some(v),
            Resolution::Failed(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Resolution::Ok(v) | Resolution::Degraded(v, _) => Some(v),
            Resolution::Failed(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Resolution::Ok(_) => None,
            Resolution::Degraded(_, reason) | Resolution::Failed(reason) => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Degraded(..))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Resolution::Failed(_))
    }
}

/// What the server said, for user-facing messages: the body for status
/// failures, the error itself otherwise.
fn server_detail(err: &GatewayError) -> String {
    match err {
        GatewayError::Status { body, .. } => body.clone(),
        other => other.to_string(),
    }
}

pub fn resolve_srid(
    table: &TableRef,
    result: Result<SridCheck, GatewayError>,
) -> Resolution<SridCheck> {
    match result {
        Ok(check) if check.valid => Resolution::Ok(check),
        Ok(check) => Resolution::Failed(format!(
            "Cannot load layer: {}",
            check.error.as_deref().unwrap_or("invalid SRID")
        )),
        Err(err) => Resolution::Failed(format!(
            "Failed to check SRID for {table}. Server responded: {}",
            server_detail(&err)
        )),
    }
}

pub fn resolve_geometry_type(
    table: &TableRef,
    result: Result<GeometryTypeResponse, GatewayError>,
) -> Resolution<String> {
    match result {
        Ok(GeometryTypeResponse {
            geometry_type: Some(t),
        }) if !t.trim().is_empty() => Resolution::Ok(t),
        Ok(_) => Resolution::Degraded(
            DEFAULT_GEOMETRY_TYPE.to_string(),
            format!("No geometry type found for {table}. Defaulting to {DEFAULT_GEOMETRY_TYPE}."),
        ),
        Err(err) => Resolution::Degraded(
            DEFAULT_GEOMETRY_TYPE.to_string(),
            format!("Failed to get geometry type for {table}: {err}"),
        ),
    }
}

pub fn resolve_fields(
    table: &TableRef,
    result: Result<Vec<FieldInfo>, GatewayError>,
) -> Resolution<Vec<FieldInfo>> {
    match result {
        Ok(fields) => Resolution::Ok(fields),
        Err(err) => Resolution::Degraded(
            Vec::new(),
            format!("Failed to fetch fields for {table}: {err}"),
        ),
    }
}

pub fn resolve_extent(
    table: &TableRef,
    result: Result<ExtentResponse, GatewayError>,
) -> Resolution<Extent> {
    match result {
        Ok(resp) => match resp.bounds.as_ref().and_then(|b| b.to_extent()) {
            Some(extent) => Resolution::Ok(extent),
            None => Resolution::Failed(format!(
                "Failed to zoom to extent: Invalid boundary data for {table}."
            )),
        },
        Err(err) => Resolution::Failed(format!(
            "Failed to fetch table extent for {table}. Server responded: {}",
            server_detail(&err)
        )),
    }
}
