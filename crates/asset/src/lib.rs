//! Asset ingestion: Wavefront OBJ/MTL parsing and geometry post-processing.
//! Produces renderer-ready flat attribute buffers; GPU upload lives elsewhere.

use thiserror::Error;

mod lex;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod tangent;

pub use mesh::{Diagnostic, Extents, Geometry, GeometryData, ParsedModel};
pub use mtl::{Material, MaterialLibrary, MtlParser, parse_mtl_str};
pub use obj::{ObjParser, ParseOptions, load_obj_from_path, parse_obj_str};
pub use tangent::generate_tangents;

/// Strict-mode parse failure. Lenient parsing never produces this:
/// malformed numbers degrade to NaN and bad indices fall back to the
/// zero sentinel instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed numeric token '{token}' on line {line}")]
    MalformedNumber { line: usize, token: String },
}
