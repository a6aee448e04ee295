//! Vectorization (§4.4): stability inference over a `Seq` loop body plus
//! the strip-mining rewrite that turns a whole-multiple-of-`width` loop into
//! vector operations. Refusal is not an error (§4.4.3, §7 kind 3); only a
//! genuine write conflict through a uniform pointer is.

pub mod error;
pub mod stability;
pub mod vectorize;

pub use error::{VectorizeError, VectorizeResult};
pub use stability::{Stability, StabilityEnv};
pub use vectorize::{vectorize_seq, Outcome};
