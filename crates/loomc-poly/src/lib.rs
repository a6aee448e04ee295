//! loomc-poly — Polynomial Index Algebra (§4.1): symbolic sum/product
//! polynomials for computing table sizes and flat-buffer offsets without
//! materializing a loop over every index.

pub mod error;
pub mod offset;
pub mod structure;

pub use error::{PolyError, PolyResult};
pub use offset::{compute_offset, elem_count_poly, OffsetEmitter};
pub use structure::{depends_on, split, IndexBinder, IndexStructure};
