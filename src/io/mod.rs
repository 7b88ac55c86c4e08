mod csv;
mod geojson;

pub use csv::read_lookup_table;
pub use geojson::{read_feature_collection, write_feature_collection};
