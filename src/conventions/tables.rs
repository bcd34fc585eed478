//! Compiled-in NPCP naming, attribute and unit tables

/// Source spellings that map onto a canonical name
pub const NAME_TABLE: &[(&str, &str)] = &[
    ("tmax", "tasmax"),
    ("mx2t", "tasmax"),
    ("tmin", "tasmin"),
    ("mn2t", "tasmin"),
    ("precip", "pr"),
    ("tp", "pr"),
    ("latitude", "lat"),
    ("longitude", "lon"),
    ("wind", "wsp"),
    ("sfcWind", "wsp"),
    ("solar_exposure_day", "rsds"),
];

/// CMOR-style attribute sets. Data variables leave `units` to the live field.
pub const ATTRIBUTE_SETS: &[(&str, &[(&str, &str)])] = &[
    (
        "tasmax",
        &[
            ("long_name", "Daily Maximum Near-Surface Air Temperature"),
            ("standard_name", "air_temperature"),
        ],
    ),
    (
        "tasmin",
        &[
            ("long_name", "Daily Minimum Near-Surface Air Temperature"),
            ("standard_name", "air_temperature"),
        ],
    ),
    (
        "pr",
        &[
            ("long_name", "Precipitation"),
            ("standard_name", "precipitation_flux"),
        ],
    ),
    (
        "rsds",
        &[
            ("long_name", "Surface Downwelling Shortwave Radiation"),
            ("standard_name", "surface_downwelling_shortwave_flux_in_air"),
        ],
    ),
    (
        "wsp",
        &[
            ("long_name", "Daily Average 10m Wind Speed"),
            ("standard_name", "wind_speed"),
        ],
    ),
    (
        "lat",
        &[
            ("long_name", "latitude"),
            ("standard_name", "latitude"),
            ("axis", "Y"),
            ("units", "degrees_north"),
            ("bounds", "lat_bnds"),
        ],
    ),
    (
        "lon",
        &[
            ("long_name", "longitude"),
            ("standard_name", "longitude"),
            ("axis", "X"),
            ("units", "degrees_east"),
            ("bounds", "lon_bnds"),
        ],
    ),
];

/// Required output units per canonical variable
pub const TARGET_UNITS: &[(&str, &str)] = &[
    ("tasmax", "degC"),
    ("tasmin", "degC"),
    ("pr", "mm d-1"),
    ("wsp", "m s-1"),
    ("rsds", "W m-2"),
];
