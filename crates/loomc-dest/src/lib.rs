//! Destination synthesis (§4.2): `makeDest` turns a logical type into a
//! `Dest` tree plus the list of pointers it needs allocated, and `ops`
//! provides the three operations (`indexDest`, `loadDest`, `copyAtom`)
//! that `loomc-lower` drives the result through.

pub mod builder;
pub mod error;
pub mod make_dest;
pub mod ops;

pub use builder::DestBuilder;
pub use error::{DestError, DestSynthResult};
pub use make_dest::{make_dest, DestResult};
pub use ops::{copy_atom, index_dest, load_dest, project_dest, substitute_dest};
