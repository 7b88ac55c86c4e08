use anyhow::{bail, Context, Result};

use crate::centroid::view_centroid;
use crate::color::{attach_colors, ColorScheme};
use crate::io::{read_feature_collection, read_lookup_table, write_feature_collection};
use crate::join::join;
use crate::schema::FieldSchema;
use crate::simplify::simplify_geometry;
use crate::types::{CentroidResult, EnrichedRecord, RunReport};

/// End-to-end enrichment: parse both inputs, optionally simplify, join,
/// colorize, and compute the view centroid. All configuration is validated
/// once here, never per record.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Geometry-side property holding the composite identifier.
    key_field: String,
    /// Tabular-side column holding the raw key.
    key_column: String,
    schema: FieldSchema,
    /// Schema field that drives the fill-color ramp.
    attribute: String,
    scheme: ColorScheme,
    simplify_tolerance: Option<f64>,
}

/// Everything a run produces. Re-running identical inputs yields identical
/// output; no state survives between runs.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<EnrichedRecord>,
    pub centroid: CentroidResult,
    pub report: RunReport,
}

impl Pipeline {
    pub fn new(
        key_field: impl Into<String>,
        key_column: impl Into<String>,
        schema: FieldSchema,
        attribute: impl Into<String>,
        scheme: ColorScheme,
    ) -> Result<Self> {
        let key_field = key_field.into();
        let key_column = key_column.into();
        let attribute = attribute.into();

        if key_field.is_empty() {
            bail!("key field name cannot be empty");
        }
        if key_column.is_empty() {
            bail!("key column name cannot be empty");
        }
        if !schema.contains(&attribute) {
            bail!("attribute '{attribute}' is not declared in the field schema");
        }

        Ok(Self { key_field, key_column, schema, attribute, scheme, simplify_tolerance: None })
    }

    /// Enable vertex reduction before the join, tolerance in degrees.
    pub fn with_simplify(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = Some(tolerance);
        self
    }

    /// Run the pipeline over already-loaded input buffers.
    ///
    /// Per-record problems are tallied in the report; only whole-collection
    /// degeneracy (unparseable body, no usable geometry, no computable
    /// centroid) is fatal.
    pub fn run(&self, geojson: &[u8], table: &[u8]) -> Result<RunOutput> {
        let mut report = RunReport::default();

        let (mut geometries, skipped) = read_feature_collection(geojson)?;
        report.features_skipped = skipped;
        if geometries.is_empty() {
            bail!("no usable geometry records in the input collection");
        }

        if let Some(tolerance) = self.simplify_tolerance {
            for record in &mut geometries {
                let (simplified, fell_back) = simplify_geometry(&record.geometry, tolerance);
                if fell_back {
                    report.simplify_fallbacks += 1;
                    report.warnings.push(format!(
                        "feature {}: simplification collapsed all rings, original geometry kept",
                        record.id
                    ));
                }
                record.geometry = simplified;
            }
        }

        let (lookup, dropped) = read_lookup_table(table, &self.key_column)?;
        report.rows_dropped = dropped;

        let (records, misses) = join(&geometries, &lookup, &self.schema, &self.key_field);
        report.join_misses = misses;

        let records = attach_colors(records, &self.attribute, self.scheme);

        let centroid = view_centroid(records.iter().map(|r| &r.geometry))
            .context("view centroid computation failed")?;
        report.projection_skips = centroid.skipped;

        Ok(RunOutput { records, centroid, report })
    }

    /// Run and serialize the enriched collection back to GeoJSON bytes.
    pub fn run_to_geojson(
        &self,
        geojson: &[u8],
        table: &[u8],
    ) -> Result<(Vec<u8>, CentroidResult, RunReport)> {
        let output = self.run(geojson, table)?;
        let bytes = write_feature_collection(&output.records)?;
        Ok((bytes, output.centroid, output.report))
    }
}
