//! Loop lowering with destination passing (§4.3) and the scoped-emission
//! builder (§4.6) that drives it.

pub mod builder;
pub mod dest_assignment;
pub mod error;
pub mod lower;

pub use builder::Builder;
pub use dest_assignment::{unpack_rws_dest, DestAssignment};
pub use error::{LowerError, LowerResult};
pub use lower::lower_fully_sequential;
