//! Blocks and decls (§3.5). A block is `Block annotation decls result`;
//! decls form a [`Nest`] since a later decl's type/effect annotation may
//! reference an earlier one's binder.

use crate::atom::Atom;
use crate::expr::Expr;
use crate::types::Type;
use loomc_util::{Name, Nest};

/// `None` when there are no decls (the block is just `result`); `Some` pairs
/// the block's result type with its effect row once at least one decl binds
/// something that may have effects.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockAnnotation {
    pub result_ty: Type,
    pub effects: Vec<loomc_util::Symbol>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub binder: Name,
    pub ty: Type,
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub annotation: Option<BlockAnnotation>,
    pub decls: Vec<Decl>,
    pub result: Atom,
}

impl Block {
    pub fn atom(result: Atom) -> Self {
        Block { annotation: None, decls: Vec::new(), result }
    }

    pub fn is_trivial(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn push_decl(&mut self, decl: Decl) {
        self.decls.push(decl);
    }
}

/// `DestBlock = Abs (destBinder:RefTy ansTy) SimpBlock` (§4.3.1): a block
/// whose first binder is the result destination, produced by
/// `lowerFullySequential`.
#[derive(Clone, Debug, PartialEq)]
pub struct DestBlock {
    pub dest_binder: Name,
    pub ans_ty: Type,
    pub body: Block,
}

/// A telescope of decls for contexts (destination pointer allocation lists,
/// builder-internal scratch) that want the `Nest` shape rather than a plain
/// `Vec<Decl>`; `Block::decls` itself stays a `Vec` since random-access
/// slicing during lowering is more common there than telescope semantics.
pub type DeclNest = Nest<Decl>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_block_has_no_decls() {
        let b = Block::atom(Atom::unit());
        assert!(b.is_trivial());
    }
}
