/// A selectable background style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Basemap {
    pub name: &'static str,
    /// Short label shown on the picker.
    pub label: &'static str,
    pub style_url: &'static str,
}

pub const BASEMAPS: [Basemap; 5] = [
    Basemap {
        name: "Streets",
        label: "Road",
        style_url: "mapbox://styles/mapbox/streets-v12",
    },
    Basemap {
        name: "Satellite",
        label: "Sat",
        style_url: "mapbox://styles/mapbox/satellite-streets-v12",
    },
    Basemap {
        name: "Light",
        label: "Light",
        style_url: "mapbox://styles/mapbox/light-v11",
    },
    Basemap {
        name: "Dark",
        label: "Dark",
        style_url: "mapbox://styles/mapbox/dark-v11",
    },
    Basemap {
        name: "Outdoors",
        label: "Outdoors",
        style_url: "mapbox://styles/mapbox/outdoors-v12",
    },
];

pub fn default_basemap() -> &'static Basemap {
    &BASEMAPS[0]
}

/// Case-insensitive lookup by name.
pub fn find_basemap(name: &str) -> Option<&'static Basemap> {
    BASEMAPS.iter().find(|b| b.name.eq_ignore_ascii_case(name.trim()))
}

/// Result of asking for a basemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasemapSwitch {
    /// Already showing it; nothing to do.
    Unchanged,
    /// Apply this style URL to the map; a style-load event follows.
    Apply(&'static str),
}
