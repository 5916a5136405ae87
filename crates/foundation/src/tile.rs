use serde::{Deserialize, Serialize};

/// Slippy-map tile address in the ZXY scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileIndex {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// `z/x/y`, as it appears in tile URLs.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Tile containing a WGS84 point at `zoom` (standard Web Mercator tiling).
///
/// Latitudes at the poles make the tangent diverge; the result there is not
/// meaningful. Float-to-integer casts saturate, so out-of-range inputs clamp to
/// the integer bounds instead of panicking.
pub fn to_tile_index(longitude: f64, latitude: f64, zoom: u8) -> TileIndex {
    let lat_rad = latitude.to_radians();
    let n = 2f64.powi(zoom as i32);
    let x = ((longitude + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n)
        .floor();
    TileIndex::new(zoom, x as u32, y as u32)
}
