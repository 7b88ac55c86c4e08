use anyhow::{anyhow, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

use crate::types::{EnrichedRecord, GeometryRecord};

/// Parse a GeoJSON FeatureCollection into geometry records.
///
/// Polygon geometries are promoted to single-member MultiPolygons. Features
/// with missing, non-areal, or empty geometry are skipped and counted; a
/// body that is not a FeatureCollection at all is a fatal parse error.
/// Returns the records (in input order) and the skip count.
pub fn read_feature_collection(bytes: &[u8]) -> Result<(Vec<GeometryRecord>, usize)> {
    let value: Value = serde_json::from_slice(bytes).context("failed to parse GeoJSON bytes")?;
    let features = value["features"]
        .as_array()
        .ok_or_else(|| anyhow!("expected a FeatureCollection with a features array"))?;

    let mut records = Vec::with_capacity(features.len());
    let mut skipped = 0;

    for (id, feature) in features.iter().enumerate() {
        let Some(geometry) = parse_geometry(&feature["geometry"]) else {
            skipped += 1;
            continue;
        };
        if geometry.0.is_empty() {
            skipped += 1;
            continue;
        }
        let properties = feature["properties"].as_object().cloned().unwrap_or_default();
        records.push(GeometryRecord { id, geometry, properties });
    }

    Ok((records, skipped))
}

fn parse_geometry(geometry: &Value) -> Option<MultiPolygon<f64>> {
    let coords = geometry["coordinates"].as_array()?;
    match geometry["type"].as_str()? {
        "Polygon" => parse_polygon_coords(coords).ok().map(|p| MultiPolygon(vec![p])),
        "MultiPolygon" => parse_multipolygon_coords(coords).ok(),
        _ => None,
    }
}

/// Parse GeoJSON Polygon coordinates: [exterior, interior, interior, ...]
/// where each ring is [[x, y], [x, y], ...].
fn parse_polygon_coords(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut iter = rings.iter();
    let exterior = iter
        .next()
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("invalid Polygon: missing exterior ring"))?;
    let exterior = parse_ring_coords(exterior)?;

    let mut interiors = Vec::new();
    for ring in iter {
        let ring = ring
            .as_array()
            .ok_or_else(|| anyhow!("invalid Polygon: interior ring is not an array"))?;
        interiors.push(parse_ring_coords(ring)?);
    }

    Ok(Polygon::new(exterior, interiors))
}

fn parse_multipolygon_coords(coords: &[Value]) -> Result<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    for polygon in coords {
        let rings = polygon
            .as_array()
            .ok_or_else(|| anyhow!("invalid MultiPolygon: polygon is not an array"))?;
        polygons.push(parse_polygon_coords(rings)?);
    }
    Ok(MultiPolygon(polygons))
}

/// Parse a ring (exterior or interior) from GeoJSON coordinates.
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = Vec::with_capacity(coords.len());

    for coord_pair in coords {
        let coord_array = coord_pair
            .as_array()
            .ok_or_else(|| anyhow!("invalid coordinate: expected [x, y]"))?;
        if coord_array.len() < 2 {
            return Err(anyhow!("invalid coordinate: expected [x, y]"));
        }
        let x = coord_array[0]
            .as_f64()
            .ok_or_else(|| anyhow!("invalid coordinate: x must be a number"))?;
        let y = coord_array[1]
            .as_f64()
            .ok_or_else(|| anyhow!("invalid coordinate: y must be a number"))?;
        points.push(Coord { x, y });
    }

    // Ensure ring is closed (first point == last point)
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }

    Ok(LineString(points))
}

/// Serialize enriched records to a GeoJSON FeatureCollection isomorphic to
/// the input: original properties, joined fields, and a `fill_color`
/// 4-element integer array when a color was attached.
pub fn write_feature_collection(records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    let features: Vec<Value> = records.iter().map(feature_json).collect();
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    serde_json::to_vec(&collection).context("failed to serialize GeoJSON to bytes")
}

fn feature_json(record: &EnrichedRecord) -> Value {
    let mut properties = record.properties.clone();
    for (name, value) in &record.fields {
        properties.insert(name.clone(), value.to_json());
    }
    if let Some(color) = record.fill_color {
        properties.insert("fill_color".to_string(), json!(color.0));
    }

    json!({
        "type": "Feature",
        "geometry": geometry_json(&record.geometry),
        "properties": properties,
    })
}

fn geometry_json(shape: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Value> = shape
        .0
        .iter()
        .map(|polygon| {
            let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
            rings.push(ring_coords(polygon.exterior()));
            rings.extend(polygon.interiors().iter().map(ring_coords));
            json!(rings)
        })
        .collect();

    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}

fn ring_coords(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{read_feature_collection, write_feature_collection};
    use crate::types::{ColorQuad, EnrichedRecord, FieldValue};

    fn collection() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]
                    },
                    "properties": { "ST_LEAID": "37-A-0021" }
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 3.0], [2.0, 2.0]]]
                        ]
                    },
                    "properties": { "ST_LEAID": "42-B-0001" }
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": { "ST_LEAID": "broken" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [1.0, 1.0] },
                    "properties": {}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn parses_areal_features_and_counts_the_rest() {
        let (records, skipped) = read_feature_collection(&collection()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(records[0].properties["ST_LEAID"], json!("37-A-0021"));
        // Polygon promoted to a single-member MultiPolygon, ring closed on read.
        assert_eq!(records[0].geometry.0.len(), 1);
        let exterior = records[0].geometry.0[0].exterior();
        assert_eq!(exterior.0.len(), 5);
        assert_eq!(exterior.0.first(), exterior.0.last());
    }

    #[test]
    fn non_collection_body_is_fatal() {
        assert!(read_feature_collection(b"{\"type\": \"Feature\"}").is_err());
        assert!(read_feature_collection(b"not json").is_err());
    }

    #[test]
    fn writes_joined_fields_and_fill_color() {
        let (records, _) = read_feature_collection(&collection()).unwrap();
        let enriched = EnrichedRecord {
            id: records[0].id,
            geometry: records[0].geometry.clone(),
            properties: records[0].properties.clone(),
            key: Some(37),
            matched: true,
            fields: vec![("attrition_sum".to_string(), FieldValue::Int(120))],
            fill_color: Some(ColorQuad([128, 0, 0, 140])),
        };

        let bytes = write_feature_collection(&[enriched]).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        let props = &value["features"][0]["properties"];
        assert_eq!(props["ST_LEAID"], json!("37-A-0021"));
        assert_eq!(props["attrition_sum"], json!(120));
        assert_eq!(props["fill_color"], json!([128, 0, 0, 140]));
        assert_eq!(value["features"][0]["geometry"]["type"], json!("MultiPolygon"));
    }

    #[test]
    fn round_trip_preserves_geometry() {
        let (records, _) = read_feature_collection(&collection()).unwrap();
        let enriched: Vec<EnrichedRecord> = records
            .iter()
            .map(|r| EnrichedRecord {
                id: r.id,
                geometry: r.geometry.clone(),
                properties: r.properties.clone(),
                key: None,
                matched: false,
                fields: Vec::new(),
                fill_color: None,
            })
            .collect();
        let bytes = write_feature_collection(&enriched).unwrap();
        let (reparsed, skipped) = read_feature_collection(&bytes).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(reparsed.len(), records.len());
        assert_eq!(reparsed[0].geometry, records[0].geometry);
        assert_eq!(reparsed[1].geometry, records[1].geometry);
    }
}
