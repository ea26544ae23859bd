//! Coordinate reference systems and authority code resolution.
//!
//! Layers carry a resolved [`Crs`] once listed. When a source layer declares
//! none, the fallback [`FALLBACK_CRS_CODE`] is resolved through a
//! [`CrsResolver`]; [`EpsgRegistry`] is the built-in resolver and knows the
//! codes commonly found in GeoPackages.

use std::fmt;

use crate::error::UnknownAuthorityError;

/// Authority code substituted when a layer declares no CRS (WGS84 lon/lat).
pub const FALLBACK_CRS_CODE: &str = "EPSG:4326";

/// A resolved coordinate reference system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    /// Defining authority, e.g. `EPSG`.
    pub authority: String,
    /// Authority specific identifier.
    pub code: i32,
    /// Human readable name.
    pub name: String,
    /// WKT definition when one is known.
    pub definition: Option<String>,
}

impl Crs {
    /// Creates a CRS from its parts.
    #[must_use]
    pub fn new(
        authority: impl Into<String>,
        code: i32,
        name: impl Into<String>,
        definition: Option<String>,
    ) -> Self {
        Self {
            authority: authority.into(),
            code,
            name: name.into(),
            definition,
        }
    }

    /// Returns the `AUTHORITY:CODE` form, e.g. `EPSG:4326`.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.authority, self.code)
    }

    /// Returns `true` for geographic (lon/lat) systems known to the registry.
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        self.authority.eq_ignore_ascii_case("EPSG")
            && KNOWN_EPSG
                .iter()
                .any(|(code, _, geographic)| *code == self.code && *geographic)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier(), self.name)
    }
}

/// Resolves `AUTHORITY:CODE` strings into [`Crs`] values.
pub trait CrsResolver: Send + Sync {
    /// Resolve an authority code such as `EPSG:4326`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAuthorityError`] when the code is malformed or unknown.
    fn resolve(&self, authority_code: &str) -> Result<Crs, UnknownAuthorityError>;
}

// (code, name, geographic)
const KNOWN_EPSG: &[(i32, &str, bool)] = &[
    (4326, "WGS 84", true),
    (4258, "ETRS89", true),
    (4269, "NAD83", true),
    (4283, "GDA94", true),
    (4674, "SIRGAS 2000", true),
    (3857, "WGS 84 / Pseudo-Mercator", false),
    (3395, "WGS 84 / World Mercator", false),
    (3035, "ETRS89-extended / LAEA Europe", false),
    (27700, "OSGB36 / British National Grid", false),
    (2154, "RGF93 v1 / Lambert-93", false),
    (25832, "ETRS89 / UTM zone 32N", false),
    (25833, "ETRS89 / UTM zone 33N", false),
    (32632, "WGS 84 / UTM zone 32N", false),
    (32633, "WGS 84 / UTM zone 33N", false),
];

/// Built-in EPSG resolver backed by a static table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsgRegistry;

impl EpsgRegistry {
    /// Creates the registry.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CrsResolver for EpsgRegistry {
    fn resolve(&self, authority_code: &str) -> Result<Crs, UnknownAuthorityError> {
        let (authority, code) = split_authority_code(authority_code);
        let unknown = || UnknownAuthorityError {
            authority: authority.to_string(),
            code: code.to_string(),
        };

        if !authority.eq_ignore_ascii_case("EPSG") {
            return Err(unknown());
        }
        let numeric: i32 = code.trim().parse().map_err(|_| unknown())?;

        KNOWN_EPSG
            .iter()
            .find(|(known, _, _)| *known == numeric)
            .map(|(known, name, _)| Crs::new("EPSG", *known, *name, None))
            .ok_or_else(unknown)
    }
}

/// Splits `EPSG:4326` into (`EPSG`, `4326`). A bare number is taken as EPSG.
fn split_authority_code(value: &str) -> (&str, &str) {
    match value.split_once(':') {
        Some((authority, code)) => (authority.trim(), code.trim()),
        None => ("EPSG", value.trim()),
    }
}
