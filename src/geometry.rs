//! Polygon layer model and map projection
//!
//! Parses GeoJSON feature collections into renderable polygon layers and
//! provides the Mercator projection used for all screen mapping. Each
//! feature keeps its id (ISO code for world features) and display name for
//! hit testing and tooltips.

use geo::{BoundingRect, Contains, Geometry, MultiPolygon, Point, Rect};
use geojson::{feature::Id, GeoJson};

/// Latitude bound of the square Web-Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.05113;

/// Project lon/lat degrees into Mercator plane coordinates.
/// x is in radians, y is the Mercator ordinate; both are finite because
/// latitude is clamped to the projection bound.
pub fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = lon.to_radians();
    let y = lat.to_radians().tan().asinh();
    (x, y)
}

/// Inverse of [`mercator`]: plane coordinates back to lon/lat degrees.
pub fn inverse_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = x.to_degrees();
    let lat = y.sinh().atan().to_degrees();
    (lon, lat)
}

/// One region of a layer: id, display name, boundary geometry in lon/lat.
#[derive(Clone, Debug)]
pub struct MapShape {
    pub id: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl MapShape {
    /// Whether the given lon/lat point falls inside this shape.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }

    /// Lon/lat bounding rectangle.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Bounding box in Mercator plane coordinates: (min_x, min_y, max_x, max_y).
    pub fn projected_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let rect = self.bounds()?;
        let (min_x, min_y) = mercator(rect.min().x, rect.min().y);
        let (max_x, max_y) = mercator(rect.max().x, rect.max().y);
        Some((min_x, min_y, max_x, max_y))
    }
}

/// A renderable collection of region shapes.
#[derive(Clone, Debug, Default)]
pub struct PolygonLayer {
    pub shapes: Vec<MapShape>,
}

#[derive(Debug)]
pub enum GeometryError {
    Json(String),
    NoFeatures,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Json(e) => write!(f, "GeoJSON error: {}", e),
            GeometryError::NoFeatures => write!(f, "no polygon features in document"),
        }
    }
}

impl std::error::Error for GeometryError {}

impl PolygonLayer {
    /// Parse a GeoJSON document into a layer, skipping excluded ids.
    ///
    /// Non-polygon features are ignored. The feature id is taken from the
    /// GeoJSON `id` member, falling back to an `id` property; the display
    /// name comes from the `name` property.
    pub fn parse(text: &str, exclude: &[&str]) -> Result<PolygonLayer, GeometryError> {
        let geojson: GeoJson =
            serde_json::from_str(text).map_err(|e| GeometryError::Json(e.to_string()))?;

        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => return Err(GeometryError::NoFeatures),
        };

        let mut shapes = Vec::new();

        for feature in features {
            let id = match &feature.id {
                Some(Id::String(s)) => s.clone(),
                Some(Id::Number(n)) => n.to_string(),
                None => feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.get("id").and_then(|v| v.as_str()))
                    .unwrap_or("")
                    .to_string(),
            };

            if exclude.contains(&id.as_str()) {
                continue;
            }

            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name").and_then(|v| v.as_str()))
                .unwrap_or(&id)
                .to_string();

            let Some(gj_geometry) = feature.geometry else {
                continue;
            };

            let geom: Geometry<f64> = gj_geometry
                .value
                .try_into()
                .map_err(|e: geojson::Error| GeometryError::Json(e.to_string()))?;

            let geometry = match geom {
                Geometry::Polygon(p) => MultiPolygon(vec![p]),
                Geometry::MultiPolygon(mp) => mp,
                _ => continue,
            };

            shapes.push(MapShape { id, name, geometry });
        }

        if shapes.is_empty() {
            return Err(GeometryError::NoFeatures);
        }

        Ok(PolygonLayer { shapes })
    }

    pub fn get(&self, id: &str) -> Option<&MapShape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Topmost shape containing the lon/lat point.
    pub fn hit_test(&self, lon: f64, lat: f64) -> Option<&MapShape> {
        self.shapes.iter().find(|s| s.contains(lon, lat))
    }

    /// Union of all shape bounds in Mercator plane coordinates.
    pub fn projected_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut acc: Option<(f64, f64, f64, f64)> = None;
        for shape in &self.shapes {
            if let Some((min_x, min_y, max_x, max_y)) = shape.projected_bounds() {
                acc = Some(match acc {
                    None => (min_x, min_y, max_x, max_y),
                    Some((ax, ay, bx, by)) => {
                        (ax.min(min_x), ay.min(min_y), bx.max(max_x), by.max(max_y))
                    }
                });
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_feature(id: &str, name: &str, x: f64, y: f64, size: f64) -> String {
        format!(
            r#"{{"type":"Feature","id":"{}","properties":{{"name":"{}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x},{y}],[{x2},{y}],[{x2},{y2}],[{x},{y2}],[{x},{y}]]]}}}}"#,
            id,
            name,
            x = x,
            y = y,
            x2 = x + size,
            y2 = y + size,
        )
    }

    fn two_square_collection() -> String {
        format!(
            r#"{{"type":"FeatureCollection","features":[{},{}]}}"#,
            square_feature("DE", "Germany", 6.0, 47.0, 9.0),
            square_feature("AQ", "Antarctica", -60.0, -85.0, 40.0),
        )
    }

    #[test]
    fn test_parse_collects_polygon_features() {
        let layer = PolygonLayer::parse(&two_square_collection(), &[]).unwrap();
        assert_eq!(layer.shapes.len(), 2);
        assert_eq!(layer.shapes[0].id, "DE");
        assert_eq!(layer.shapes[0].name, "Germany");
    }

    #[test]
    fn test_exclusion_removes_antarctica() {
        let layer = PolygonLayer::parse(&two_square_collection(), &["AQ"]).unwrap();
        assert_eq!(layer.shapes.len(), 1);
        assert!(layer.get("AQ").is_none());
        assert!(layer.get("DE").is_some());
    }

    #[test]
    fn test_hit_test_finds_containing_shape() {
        let layer = PolygonLayer::parse(&two_square_collection(), &[]).unwrap();
        let hit = layer.hit_test(10.0, 51.0).expect("point inside Germany square");
        assert_eq!(hit.id, "DE");
        assert!(layer.hit_test(0.0, 0.0).is_none());
    }

    #[test]
    fn test_garbage_input_is_a_parse_error() {
        assert!(matches!(
            PolygonLayer::parse("not geojson", &[]),
            Err(GeometryError::Json(_))
        ));
    }

    #[test]
    fn test_geometry_only_document_has_no_features() {
        let doc = r#"{"type":"Point","coordinates":[0.0,0.0]}"#;
        assert!(matches!(
            PolygonLayer::parse(doc, &[]),
            Err(GeometryError::NoFeatures)
        ));
    }

    #[test]
    fn test_mercator_fixed_points() {
        let (x, y) = mercator(0.0, 0.0);
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);

        // Clamped poles land on the square-world bound (|y| == pi)
        let (_, y_top) = mercator(0.0, 90.0);
        assert!((y_top - std::f64::consts::PI).abs() < 1e-3);

        let (x_degrees, _) = mercator(180.0, 0.0);
        assert!((x_degrees - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_mercator_round_trips() {
        for (lon, lat) in [(0.0, 0.0), (13.4, 52.5), (-74.0, 40.7), (151.2, -33.9)] {
            let (x, y) = mercator(lon, lat);
            let (lon2, lat2) = inverse_mercator(x, y);
            assert!((lon - lon2).abs() < 1e-9);
            assert!((lat - lat2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mercator_is_monotonic_in_latitude() {
        let mut last = f64::NEG_INFINITY;
        for lat in [-80.0, -45.0, 0.0, 30.0, 60.0, 84.0] {
            let (_, y) = mercator(0.0, lat);
            assert!(y > last);
            last = y;
        }
    }

    #[test]
    fn test_projected_bounds_cover_all_shapes() {
        let layer = PolygonLayer::parse(&two_square_collection(), &[]).unwrap();
        let (min_x, min_y, max_x, max_y) = layer.projected_bounds().unwrap();
        let (de_x, de_y) = mercator(10.0, 51.0);
        assert!(min_x < de_x && de_x < max_x);
        assert!(min_y < de_y && de_y < max_y);
    }
}
