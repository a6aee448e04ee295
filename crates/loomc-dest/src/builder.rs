//! The injection point between destination synthesis and whatever is
//! assembling the surrounding block. `DestBuilder` extends `loomc-poly`'s
//! `OffsetEmitter` with the two extra things `makeDest` needs: fresh names
//! and a way to resolve a user type constructor to its representation type
//! (desugaring `TypeCon`/record/variant types is out of scope for this
//! crate's own concern — it just needs the answer).

use loomc_ir::{BaseType, Type, TypeDefId};
use loomc_poly::OffsetEmitter;
use loomc_util::{Name, NameColor};

use crate::error::DestError;

pub trait DestBuilder: OffsetEmitter {
    fn fresh_name(&mut self, color: NameColor, hint: &str) -> Name;

    /// The product/sum representation type backing a named type
    /// constructor. Destination synthesis wraps the result in `Newtype`
    /// once it has recursed into this. `Err(DestError::UnresolvedTypeCon)`
    /// means an earlier pass failed to register `id` before destination
    /// synthesis ran over it.
    fn resolve_type_con(&self, id: TypeDefId) -> Result<Type, DestError>;

    #[allow(unused_variables)]
    fn note_pointer_alloc(&mut self, name: Name, base_ty: BaseType) {}
}
