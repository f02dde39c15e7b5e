//! Country reference table and continent classification
//!
//! One authoritative table maps each supported country to its ISO 3166-1
//! alpha-2 code, its continent, and the name of its detailed map asset on
//! the geodata CDN. Keeping everything in a single table avoids the drift
//! that separate name/continent/asset dictionaries would allow.

/// The seven continents, in fixed palette order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Continent {
    Africa,
    Antarctica,
    Asia,
    Europe,
    NorthAmerica,
    Oceania,
    SouthAmerica,
}

impl Continent {
    /// Two-letter continent code.
    pub fn code(&self) -> &'static str {
        match self {
            Continent::Africa => "AF",
            Continent::Antarctica => "AN",
            Continent::Asia => "AS",
            Continent::Europe => "EU",
            Continent::NorthAmerica => "NA",
            Continent::Oceania => "OC",
            Continent::SouthAmerica => "SA",
        }
    }

    /// Position in the generated color palette.
    /// The order AF, AN, AS, EU, NA, OC, SA is fixed; continent colors
    /// must stay stable across runs.
    pub fn palette_index(&self) -> usize {
        match self {
            Continent::Africa => 0,
            Continent::Antarctica => 1,
            Continent::Asia => 2,
            Continent::Europe => 3,
            Continent::NorthAmerica => 4,
            Continent::Oceania => 5,
            Continent::SouthAmerica => 6,
        }
    }

    pub fn from_code(code: &str) -> Option<Continent> {
        match code {
            "AF" => Some(Continent::Africa),
            "AN" => Some(Continent::Antarctica),
            "AS" => Some(Continent::Asia),
            "EU" => Some(Continent::Europe),
            "NA" => Some(Continent::NorthAmerica),
            "OC" => Some(Continent::Oceania),
            "SA" => Some(Continent::SouthAmerica),
            _ => None,
        }
    }

    pub fn all() -> &'static [Continent] {
        &[
            Continent::Africa,
            Continent::Antarctica,
            Continent::Asia,
            Continent::Europe,
            Continent::NorthAmerica,
            Continent::Oceania,
            Continent::SouthAmerica,
        ]
    }
}

/// One row of the country table.
#[derive(Clone, Copy, Debug)]
pub struct CountryInfo {
    /// ISO 3166-1 alpha-2 code, also the polygon id in the world geometry
    pub code: &'static str,
    /// Display name as it appears in the sentiment CSV
    pub name: &'static str,
    pub continent: Continent,
    /// File stem of the detailed country map on the geodata CDN
    pub map_asset: &'static str,
}

/// Countries with detailed drill-down maps.
/// Russia is classified as Europe here to match the upstream geodata set.
pub const COUNTRIES: &[CountryInfo] = &[
    CountryInfo { code: "US", name: "United States", continent: Continent::NorthAmerica, map_asset: "usaLow" },
    CountryInfo { code: "GB", name: "United Kingdom", continent: Continent::Europe, map_asset: "ukLow" },
    CountryInfo { code: "CA", name: "Canada", continent: Continent::NorthAmerica, map_asset: "canadaLow" },
    CountryInfo { code: "AU", name: "Australia", continent: Continent::Oceania, map_asset: "australiaLow" },
    CountryInfo { code: "DE", name: "Germany", continent: Continent::Europe, map_asset: "germanyLow" },
    CountryInfo { code: "FR", name: "France", continent: Continent::Europe, map_asset: "franceLow" },
    CountryInfo { code: "JP", name: "Japan", continent: Continent::Asia, map_asset: "japanLow" },
    CountryInfo { code: "CN", name: "China", continent: Continent::Asia, map_asset: "chinaLow" },
    CountryInfo { code: "IN", name: "India", continent: Continent::Asia, map_asset: "indiaLow" },
    CountryInfo { code: "BR", name: "Brazil", continent: Continent::SouthAmerica, map_asset: "brazilLow" },
    CountryInfo { code: "MX", name: "Mexico", continent: Continent::NorthAmerica, map_asset: "mexicoLow" },
    CountryInfo { code: "RU", name: "Russia", continent: Continent::Europe, map_asset: "russiaLow" },
    CountryInfo { code: "IT", name: "Italy", continent: Continent::Europe, map_asset: "italyLow" },
    CountryInfo { code: "ES", name: "Spain", continent: Continent::Europe, map_asset: "spainLow" },
    CountryInfo { code: "KR", name: "South Korea", continent: Continent::Asia, map_asset: "southKoreaLow" },
    CountryInfo { code: "NL", name: "Netherlands", continent: Continent::Europe, map_asset: "netherlandsLow" },
    CountryInfo { code: "SA", name: "Saudi Arabia", continent: Continent::Asia, map_asset: "saudiArabiaLow" },
    CountryInfo { code: "ZA", name: "South Africa", continent: Continent::Africa, map_asset: "southAfricaLow" },
    CountryInfo { code: "TR", name: "Turkey", continent: Continent::Asia, map_asset: "turkeyLow" },
];

/// Look up a country by its CSV display name.
pub fn by_name(name: &str) -> Option<&'static CountryInfo> {
    COUNTRIES.iter().find(|c| c.name == name)
}

/// Look up a country by its ISO code.
pub fn by_code(code: &str) -> Option<&'static CountryInfo> {
    COUNTRIES.iter().find(|c| c.code == code)
}
