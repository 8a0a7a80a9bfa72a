//! Coordinate transforms and the authority that finds them.

use std::f64::consts::PI;
use std::fmt::Debug;
use std::sync::Arc;

use featurecrs_model::geo_types::{Coord, Geometry};
use featurecrs_model::{try_map_coords, Crs, TransformError};

/// A pure mapping of coordinates from one reference system to another.
///
/// # Object Safety
///
/// This trait is object-safe: transforms are shared as
/// `Arc<dyn CoordinateTransform>`.
pub trait CoordinateTransform: Debug + Send + Sync {
    /// Transform a single coordinate.
    fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, TransformError>;

    /// The transform going the other way, if this one is invertible.
    fn inverse(&self) -> Option<Arc<dyn CoordinateTransform>> {
        None
    }
}

/// Finds transforms between reference systems.
pub trait CrsAuthority {
    /// Find the transform from `source` to `target`.
    ///
    /// `lenient` asks the authority to accept approximate paths where it
    /// distinguishes them.
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
        lenient: bool,
    ) -> Result<Arc<dyn CoordinateTransform>, TransformError>;
}

impl<T: CrsAuthority + ?Sized> CrsAuthority for &T {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
        lenient: bool,
    ) -> Result<Arc<dyn CoordinateTransform>, TransformError> {
        (**self).find_transform(source, target, lenient)
    }
}

impl<T: CrsAuthority + ?Sized> CrsAuthority for Arc<T> {
    fn find_transform(
        &self,
        source: &Crs,
        target: &Crs,
        lenient: bool,
    ) -> Result<Arc<dyn CoordinateTransform>, TransformError> {
        self.as_ref().find_transform(source, target, lenient)
    }
}

/// Apply `transform` to every coordinate of `geometry`.
///
/// Either the whole geometry transforms, or the first coordinate error is
/// returned; a partially transformed geometry is never produced. Results
/// that are not finite are reported as `TransformError::NonFinite`.
pub fn transform_geometry(
    transform: &dyn CoordinateTransform,
    geometry: &Geometry<f64>,
) -> Result<Geometry<f64>, TransformError> {
    try_map_coords(geometry, &mut |coord: Coord<f64>| {
        let out = transform.transform(coord)?;
        if out.x.is_finite() && out.y.is_finite() {
            Ok(out)
        } else {
            Err(TransformError::NonFinite {
                x: coord.x,
                y: coord.y,
            })
        }
    })
}

/// Leaves coordinates as they are.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl CoordinateTransform for Identity {
    fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, TransformError> {
        Ok(coord)
    }

    fn inverse(&self) -> Option<Arc<dyn CoordinateTransform>> {
        Some(Arc::new(Identity))
    }
}

/// Axis-aligned scale followed by an offset: `x' = x * sx + dx`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Affine2D {
    pub fn new(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    pub fn translation(offset_x: f64, offset_y: f64) -> Self {
        Self::new(1.0, 1.0, offset_x, offset_y)
    }
}

impl CoordinateTransform for Affine2D {
    fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, TransformError> {
        Ok(Coord {
            x: coord.x * self.scale_x + self.offset_x,
            y: coord.y * self.scale_y + self.offset_y,
        })
    }

    fn inverse(&self) -> Option<Arc<dyn CoordinateTransform>> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }
        Some(Arc::new(Affine2D {
            scale_x: 1.0 / self.scale_x,
            scale_y: 1.0 / self.scale_y,
            offset_x: -self.offset_x / self.scale_x,
            offset_y: -self.offset_y / self.scale_y,
        }))
    }
}

/// Spherical Web Mercator radius (metres).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of Web Mercator, where the projected map is square.
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Identifier of geographic longitude/latitude in degrees.
pub const EPSG_4326: &str = "EPSG:4326";

/// Identifier of spherical Web Mercator in metres.
pub const EPSG_3857: &str = "EPSG:3857";

/// Spherical Web Mercator projection between longitude/latitude degrees
/// (x = longitude, y = latitude) and projected metres.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebMercator {
    /// Degrees to metres.
    Forward,
    /// Metres to degrees.
    Inverse,
}

impl CoordinateTransform for WebMercator {
    fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, TransformError> {
        match self {
            WebMercator::Forward => {
                let (lon, lat) = (coord.x, coord.y);
                if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&lat) {
                    return Err(TransformError::OutOfDomain {
                        x: lon,
                        y: lat,
                        reason: format!("latitude must be within ±{MAX_LATITUDE}"),
                    });
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(TransformError::OutOfDomain {
                        x: lon,
                        y: lat,
                        reason: "longitude must be within ±180".to_string(),
                    });
                }
                let lat_rad = lat.to_radians();
                Ok(Coord {
                    x: EARTH_RADIUS * lon.to_radians(),
                    y: EARTH_RADIUS * (PI / 4.0 + lat_rad / 2.0).tan().ln(),
                })
            }
            WebMercator::Inverse => {
                let (x, y) = (coord.x, coord.y);
                Ok(Coord {
                    x: (x / EARTH_RADIUS).to_degrees(),
                    y: (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
                })
            }
        }
    }

    fn inverse(&self) -> Option<Arc<dyn CoordinateTransform>> {
        Some(Arc::new(match self {
            WebMercator::Forward => WebMercator::Inverse,
            WebMercator::Inverse => WebMercator::Forward,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use featurecrs_model::geo_types::{coord, line_string, point, MultiPoint};

    fn close(a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> bool {
        (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance
    }

    #[test]
    fn affine_inverse_round_trips() {
        let affine = Affine2D::new(2.0, 0.5, 100.0, -20.0);
        let inverse = affine.inverse().unwrap();
        let c = coord! { x: 3.25, y: -7.5 };
        let back = inverse.transform(affine.transform(c).unwrap()).unwrap();
        assert!(close(back, c, 1e-12));
    }

    #[test]
    fn degenerate_affine_has_no_inverse() {
        assert!(Affine2D::new(0.0, 1.0, 0.0, 0.0).inverse().is_none());
    }

    #[test]
    fn web_mercator_known_values() {
        let origin = WebMercator::Forward
            .transform(coord! { x: 0.0, y: 0.0 })
            .unwrap();
        assert!(close(origin, coord! { x: 0.0, y: 0.0 }, 1e-9));

        let east = WebMercator::Forward
            .transform(coord! { x: 180.0, y: 0.0 })
            .unwrap();
        assert!((east.x - 20_037_508.342789244).abs() < 1e-6);

        // London
        let london = WebMercator::Forward
            .transform(coord! { x: -0.1278, y: 51.5074 })
            .unwrap();
        assert!((london.x - -14_226.63).abs() < 0.1);
        assert!((london.y - 6_711_542.47).abs() < 1.0);
    }

    #[test]
    fn web_mercator_round_trip_has_no_drift() {
        let c = coord! { x: -74.0060, y: 40.7128 };
        let forward = WebMercator::Forward.transform(c).unwrap();
        let back = WebMercator::Forward
            .inverse()
            .unwrap()
            .transform(forward)
            .unwrap();
        assert!(close(back, c, 1e-9));
    }

    #[test]
    fn web_mercator_rejects_polar_latitudes() {
        let err = WebMercator::Forward
            .transform(coord! { x: 10.0, y: 89.0 })
            .unwrap_err();
        assert!(matches!(err, TransformError::OutOfDomain { .. }));
    }

    #[test]
    fn transform_geometry_covers_every_part() {
        let shift = Affine2D::translation(1.0, 1.0);
        let multi = Geometry::MultiPoint(MultiPoint(vec![
            point!(x: 0.0, y: 0.0),
            point!(x: 5.0, y: 5.0),
        ]));
        let moved = transform_geometry(&shift, &multi).unwrap();
        assert_eq!(
            moved,
            Geometry::MultiPoint(MultiPoint(vec![
                point!(x: 1.0, y: 1.0),
                point!(x: 6.0, y: 6.0),
            ]))
        );
    }

    #[test]
    fn transform_geometry_fails_whole_geometry() {
        let line = Geometry::LineString(line_string![(x: 0.0, y: 10.0), (x: 0.0, y: 88.0)]);
        let err = transform_geometry(&WebMercator::Forward, &line).unwrap_err();
        assert!(matches!(err, TransformError::OutOfDomain { y, .. } if y == 88.0));
    }

    #[derive(Debug)]
    struct Blowup;

    impl CoordinateTransform for Blowup {
        fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, TransformError> {
            Ok(coord! { x: coord.x / 0.0, y: coord.y })
        }
    }

    #[test]
    fn non_finite_results_are_errors() {
        let p = Geometry::Point(point!(x: 1.0, y: 2.0));
        assert_eq!(
            transform_geometry(&Blowup, &p).unwrap_err(),
            TransformError::NonFinite { x: 1.0, y: 2.0 }
        );
    }
}
