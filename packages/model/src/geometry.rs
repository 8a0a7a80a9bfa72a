//! Geometry values and whole-geometry coordinate mapping.
//!
//! Geometries are `geo-types` geometries tagged with the reference system
//! their coordinates are expressed in.

use geo_types::{
    Coord, Geometry, GeometryCollection, Line, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon, Rect, Triangle,
};

use crate::Crs;

/// A geometry plus the reference system its numbers are expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryValue {
    geometry: Geometry<f64>,
    crs: Option<Crs>,
}

impl GeometryValue {
    pub fn new(geometry: impl Into<Geometry<f64>>, crs: Option<Crs>) -> Self {
        Self {
            geometry: geometry.into(),
            crs,
        }
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Relabel the reference system without touching coordinates.
    pub fn set_crs(&mut self, crs: Option<Crs>) {
        self.crs = crs;
    }

    /// Replace the coordinates and reference system together.
    pub fn replace(&mut self, geometry: Geometry<f64>, crs: Option<Crs>) {
        self.geometry = geometry;
        self.crs = crs;
    }
}

/// Map every coordinate of `geometry` through `f`, producing a new geometry.
///
/// Multi-part geometries and collections are walked recursively. The input
/// is never modified: either every coordinate maps and a complete new
/// geometry is returned, or the first error is returned and nothing changes.
pub fn try_map_coords<E, F>(geometry: &Geometry<f64>, f: &mut F) -> Result<Geometry<f64>, E>
where
    F: FnMut(Coord<f64>) -> Result<Coord<f64>, E>,
{
    Ok(match geometry {
        Geometry::Point(p) => Geometry::Point(Point(f(p.0)?)),
        Geometry::Line(l) => Geometry::Line(Line::new(f(l.start)?, f(l.end)?)),
        Geometry::LineString(ls) => Geometry::LineString(map_line_string(ls, f)?),
        Geometry::Polygon(p) => Geometry::Polygon(map_polygon(p, f)?),
        Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint(
            mp.0.iter()
                .map(|p| f(p.0).map(Point))
                .collect::<Result<_, E>>()?,
        )),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.0
                .iter()
                .map(|ls| map_line_string(ls, f))
                .collect::<Result<_, E>>()?,
        )),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
            mp.0.iter()
                .map(|p| map_polygon(p, f))
                .collect::<Result<_, E>>()?,
        )),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.iter()
                .map(|g| try_map_coords(g, f))
                .collect::<Result<_, E>>()?,
        )),
        Geometry::Rect(r) => Geometry::Rect(Rect::new(f(r.min())?, f(r.max())?)),
        Geometry::Triangle(t) => Geometry::Triangle(Triangle::new(f(t.0)?, f(t.1)?, f(t.2)?)),
    })
}

fn map_line_string<E, F>(ls: &LineString<f64>, f: &mut F) -> Result<LineString<f64>, E>
where
    F: FnMut(Coord<f64>) -> Result<Coord<f64>, E>,
{
    ls.0.iter()
        .map(|c| f(*c))
        .collect::<Result<Vec<_>, E>>()
        .map(LineString)
}

fn map_polygon<E, F>(p: &Polygon<f64>, f: &mut F) -> Result<Polygon<f64>, E>
where
    F: FnMut(Coord<f64>) -> Result<Coord<f64>, E>,
{
    let exterior = map_line_string(p.exterior(), f)?;
    let interiors = p
        .interiors()
        .iter()
        .map(|ring| map_line_string(ring, f))
        .collect::<Result<Vec<_>, E>>()?;
    Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, line_string, point, polygon};

    fn shift(c: Coord<f64>) -> Result<Coord<f64>, String> {
        Ok(coord! { x: c.x + 10.0, y: c.y * 2.0 })
    }

    #[test]
    fn maps_every_coordinate_of_a_polygon_with_holes() {
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 0.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)]],
        );
        let mapped = try_map_coords(&Geometry::Polygon(poly), &mut shift).unwrap();
        let Geometry::Polygon(mapped) = mapped else {
            panic!("expected polygon");
        };
        assert_eq!(mapped.exterior().0[2], coord! { x: 14.0, y: 8.0 });
        assert_eq!(mapped.interiors()[0].0[1], coord! { x: 12.0, y: 2.0 });
    }

    #[test]
    fn recurses_into_nested_collections() {
        let inner = GeometryCollection(vec![Geometry::Point(point!(x: 1.0, y: 1.0))]);
        let outer = Geometry::GeometryCollection(GeometryCollection(vec![
            Geometry::GeometryCollection(inner),
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 3.0)]),
        ]));

        let mapped = try_map_coords(&outer, &mut shift).unwrap();
        let expected = Geometry::GeometryCollection(GeometryCollection(vec![
            Geometry::GeometryCollection(GeometryCollection(vec![Geometry::Point(
                point!(x: 11.0, y: 2.0),
            )])),
            Geometry::LineString(line_string![(x: 10.0, y: 0.0), (x: 11.0, y: 6.0)]),
        ]));
        assert_eq!(mapped, expected);
    }

    #[test]
    fn first_failure_aborts_the_whole_geometry() {
        let ls = Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 99.0),
            (x: 2.0, y: 0.0),
        ]);
        let mut calls = 0;
        let result = try_map_coords(&ls, &mut |c: Coord<f64>| {
            calls += 1;
            if c.y > 90.0 {
                Err(format!("bad latitude {}", c.y))
            } else {
                Ok(c)
            }
        });
        assert_eq!(result.unwrap_err(), "bad latitude 99");
        assert_eq!(calls, 2);
    }

    #[test]
    fn relabel_keeps_coordinates() {
        let mut value = GeometryValue::new(point!(x: 3.0, y: 4.0), None);
        value.set_crs(Some(Crs::new("EPSG:4326")));
        assert_eq!(value.crs(), Some(&Crs::new("EPSG:4326")));
        assert_eq!(value.geometry(), &Geometry::Point(point!(x: 3.0, y: 4.0)));
    }
}
