use geo::{MultiPolygon, Simplify};

/// Reduce vertex count with Douglas-Peucker at a fixed tolerance, in the
/// geometry's coordinate units. Each polygon is simplified independently, so
/// shared boundaries between adjacent regions may diverge (documented
/// limitation). A non-positive tolerance is a no-op.
///
/// Returns the simplified geometry and whether the original had to be kept:
/// a result with no usable exterior ring never silently replaces real
/// geometry, the caller records a warning instead.
pub fn simplify_geometry(geometry: &MultiPolygon<f64>, tolerance: f64) -> (MultiPolygon<f64>, bool) {
    if tolerance <= 0.0 {
        return (geometry.clone(), false);
    }

    let simplified = geometry.simplify(&tolerance);
    if is_degenerate(&simplified) {
        return (geometry.clone(), true);
    }
    (simplified, false)
}

/// No polygon carries a closed exterior ring (4+ coordinates).
fn is_degenerate(geometry: &MultiPolygon<f64>) -> bool {
    geometry.0.iter().all(|polygon| polygon.exterior().0.len() < 4)
}
