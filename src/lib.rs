#![doc = "Choromerge public API"]
mod centroid;
mod color;
mod io;
mod join;
mod key;
mod pipeline;
mod schema;
mod simplify;
mod types;

#[doc(inline)]
pub use types::{
    CentroidResult, ColorQuad, EnrichedRecord, FieldValue, GeometryRecord, LookupTable,
    RunReport, TabularRow,
};

#[doc(inline)]
pub use schema::{FieldSchema, FieldSpec};

#[doc(inline)]
pub use key::{extract_key, strict_key};

#[doc(inline)]
pub use join::join;

#[doc(inline)]
pub use color::{attach_colors, colorize, ColorScheme};

#[doc(inline)]
pub use simplify::simplify_geometry;

#[doc(inline)]
pub use centroid::view_centroid;

#[doc(inline)]
pub use io::{read_feature_collection, read_lookup_table, write_feature_collection};

#[doc(inline)]
pub use pipeline::{Pipeline, RunOutput};
