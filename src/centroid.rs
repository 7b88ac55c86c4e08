use anyhow::{anyhow, bail, Context, Result};
use geo::{Centroid, Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use crate::types::CentroidResult;

/// Geographic CRS for all input/output coordinates (EPSG:4326).
const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Planar meters CRS used for centroid math (EPSG:3857, spherical mercator).
const WEB_MERCATOR: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs";

fn geographic() -> Result<Proj> {
    Proj::from_proj_string(WGS84).context("failed to build EPSG:4326 projection")
}

fn planar() -> Result<Proj> {
    Proj::from_proj_string(WEB_MERCATOR).context("failed to build EPSG:3857 projection")
}

/// Reproject a shape from lon/lat degrees to mercator meters.
/// Coords go in as radians and come out as meters.
fn to_planar(shape: &MultiPolygon<f64>, from: &Proj, to: &Proj) -> Result<MultiPolygon<f64>> {
    shape.try_map_coords(|coord| {
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(from, to, &mut point).map_err(|e| anyhow!("CRS transform failed: {e}"))?;
        Ok(Coord { x: point.0, y: point.1 })
    })
}

/// Reproject a single mercator point back to lon/lat degrees.
fn to_geographic(x: f64, y: f64, from: &Proj, to: &Proj) -> Result<(f64, f64)> {
    let mut point = (x, y, 0.0);
    transform(from, to, &mut point).map_err(|e| anyhow!("CRS transform failed: {e}"))?;
    Ok((point.0.to_degrees(), point.1.to_degrees()))
}

/// Compute the camera placement point for a collection: reproject each
/// geometry to the planar CRS, take its centroid there, average the
/// centroids arithmetically, and reproject the mean back to WGS84.
///
/// This is a mean of per-geometry centroids, not an area-weighted centroid
/// of the union; small and large regions pull the camera equally (preserved
/// behavior, see DESIGN.md). Geometries that cannot be reprojected, or that
/// have no centroid, are excluded and counted. Fails only when the input is
/// empty or every geometry was excluded.
pub fn view_centroid<'a, I>(geometries: I) -> Result<CentroidResult>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    let geog = geographic()?;
    let merc = planar()?;

    let (mut sum_x, mut sum_y) = (0.0, 0.0);
    let (mut used, mut skipped) = (0usize, 0usize);

    for shape in geometries {
        match to_planar(shape, &geog, &merc).ok().and_then(|planar| planar.centroid()) {
            Some(point) => {
                sum_x += point.x();
                sum_y += point.y();
                used += 1;
            }
            None => skipped += 1,
        }
    }

    if used == 0 {
        if skipped == 0 {
            bail!("cannot compute a centroid for an empty collection");
        }
        bail!("no geometry could be reprojected; centroid is undefined ({skipped} skipped)");
    }

    let mean_x = sum_x / used as f64;
    let mean_y = sum_y / used as f64;
    let (longitude, latitude) = to_geographic(mean_x, mean_y, &merc, &geog)?;

    Ok(CentroidResult { latitude, longitude, skipped })
}

#[cfg(test)]
mod tests {
    use geo::{Coord, LineString, MultiPolygon, Polygon};

    use super::{geographic, planar, to_geographic, to_planar, view_centroid};

    /// Small square centered on (lon, lat), side 0.02 degrees.
    fn square_at(lon: f64, lat: f64) -> MultiPolygon<f64> {
        let d = 0.01;
        let ring = LineString(vec![
            Coord { x: lon - d, y: lat - d },
            Coord { x: lon + d, y: lat - d },
            Coord { x: lon + d, y: lat + d },
            Coord { x: lon - d, y: lat + d },
            Coord { x: lon - d, y: lat - d },
        ]);
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    #[test]
    fn planar_round_trip_recovers_the_point() {
        let geog = geographic().unwrap();
        let merc = planar().unwrap();

        for &(lon, lat) in &[(-96.5, 38.0), (0.0, 0.0), (13.4, -33.9), (179.0, 62.0)] {
            let shape = to_planar(&square_at(lon, lat), &geog, &merc).unwrap();
            let planar_center = geo::Centroid::centroid(&shape).unwrap();
            let (lon2, lat2) = to_geographic(planar_center.x(), planar_center.y(), &merc, &geog).unwrap();
            assert!((lon - lon2).abs() < 1e-4, "lon {lon} -> {lon2}");
            assert!((lat - lat2).abs() < 1e-4, "lat {lat} -> {lat2}");
        }
    }

    #[test]
    fn centroid_of_symmetric_pair_is_their_midpoint() {
        let shapes = [square_at(-10.0, 40.0), square_at(10.0, 40.0)];
        let result = view_centroid(shapes.iter()).unwrap();
        assert_eq!(result.skipped, 0);
        assert!(result.longitude.abs() < 1e-4, "longitude {}", result.longitude);
        assert!((result.latitude - 40.0).abs() < 1e-3, "latitude {}", result.latitude);
    }

    #[test]
    fn empty_collection_is_an_error() {
        assert!(view_centroid(std::iter::empty::<&MultiPolygon<f64>>()).is_err());
    }

    #[test]
    fn empty_geometries_are_skipped_not_fatal() {
        let shapes = [MultiPolygon::<f64>(vec![]), square_at(5.0, 5.0)];
        let result = view_centroid(shapes.iter()).unwrap();
        assert_eq!(result.skipped, 1);
        assert!((result.longitude - 5.0).abs() < 1e-3);
    }

    #[test]
    fn all_degenerate_geometries_are_fatal() {
        let shapes = [MultiPolygon::<f64>(vec![]), MultiPolygon::<f64>(vec![])];
        assert!(view_centroid(shapes.iter()).is_err());
    }
}
