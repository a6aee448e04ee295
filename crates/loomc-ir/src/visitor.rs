//! Generic traversal (design notes: replace "one traversal function per
//! node, dispatched by a type-class mirror of the AST" with a visitor —
//! one method per constructor, plus a default "recurse then rebuild" body).
//!
//! `loomc-lower` and `loomc-vectorize` each rewrite only a shallow,
//! fixed-shape slice of a `Block` (a `for`'s own body, a `Seq`'s own decl
//! list) and hand-roll that recursion directly rather than going through
//! this trait; `Visitor` is here for a pass that needs to rewrite nodes
//! nested arbitrarily deep inside unrelated structure, which none of this
//! crate's current passes do.

use crate::atom::Atom;
use crate::block::{Block, Decl};
use crate::expr::{Alt, Expr, Handle, HandleClause, Hof};

pub trait Visitor: Sized {
    fn visit_block(&mut self, block: &Block) -> Block {
        walk_block(self, block)
    }

    fn visit_decl(&mut self, decl: &Decl) -> Decl {
        walk_decl(self, decl)
    }

    fn visit_expr(&mut self, expr: &Expr) -> Expr {
        walk_expr(self, expr)
    }

    fn visit_atom(&mut self, atom: &Atom) -> Atom {
        atom.clone()
    }
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) -> Block {
    Block {
        annotation: block.annotation.clone(),
        decls: block.decls.iter().map(|d| v.visit_decl(d)).collect(),
        result: v.visit_atom(&block.result),
    }
}

pub fn walk_decl<V: Visitor>(v: &mut V, decl: &Decl) -> Decl {
    Decl { binder: decl.binder, ty: decl.ty.clone(), expr: v.visit_expr(&decl.expr) }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) -> Expr {
    match expr {
        Expr::App(f, args) => {
            Expr::App(Box::new(v.visit_atom(f)), args.iter().map(|a| v.visit_atom(a)).collect())
        }
        Expr::TabApp(f, arg) => Expr::TabApp(Box::new(v.visit_atom(f)), Box::new(v.visit_atom(arg))),
        Expr::Case { scrutinee, alts, result_ty } => Expr::Case {
            scrutinee: Box::new(v.visit_atom(scrutinee)),
            alts: alts
                .iter()
                .map(|alt| Alt { binder: alt.binder, payload_ty: alt.payload_ty.clone(), body: v.visit_block(&alt.body) })
                .collect(),
            result_ty: result_ty.clone(),
        },
        Expr::Atom(a) => Expr::Atom(v.visit_atom(a)),
        Expr::Op(op) => Expr::Op(op.clone()),
        Expr::Hof(hof) => Expr::Hof(walk_hof(v, hof)),
        Expr::Handle(h) => Expr::Handle(Box::new(Handle {
            handled: Box::new(v.visit_expr(&h.handled)),
            clauses: h
                .clauses
                .iter()
                .map(|c| HandleClause { op_name: c.op_name, resume_binder: c.resume_binder, body: v.visit_block(&c.body) })
                .collect(),
        })),
        Expr::TabCon(ty, elems) => {
            Expr::TabCon(ty.clone(), elems.iter().map(|a| v.visit_atom(a)).collect())
        }
        Expr::AllocDest(ty, mode) => Expr::AllocDest(ty.clone(), *mode),
        Expr::Freeze(a) => Expr::Freeze(Box::new(v.visit_atom(a))),
    }
}

fn walk_hof<V: Visitor>(v: &mut V, hof: &Hof) -> Hof {
    match hof {
        Hof::For { binder, ix_ty, body } => {
            Hof::For { binder: *binder, ix_ty: ix_ty.clone(), body: Box::new(v.visit_block(body)) }
        }
        Hof::Seq { dir, ix_ty, index_binder, carry_binder, carry, body } => Hof::Seq {
            dir: *dir,
            ix_ty: ix_ty.clone(),
            index_binder: *index_binder,
            carry_binder: *carry_binder,
            carry: Box::new(v.visit_atom(carry)),
            body: Box::new(v.visit_block(body)),
        },
        Hof::While(body) => Hof::While(Box::new(v.visit_block(body))),
        Hof::RunReader { init, handler_binder, ref_binder, body } => Hof::RunReader {
            init: Box::new(v.visit_atom(init)),
            handler_binder: *handler_binder,
            ref_binder: *ref_binder,
            body: Box::new(v.visit_block(body)),
        },
        Hof::RunWriter { handler_binder, ref_binder, body } => Hof::RunWriter {
            handler_binder: *handler_binder,
            ref_binder: *ref_binder,
            body: Box::new(v.visit_block(body)),
        },
        Hof::RunState { init, handler_binder, ref_binder, body } => Hof::RunState {
            init: Box::new(v.visit_atom(init)),
            handler_binder: *handler_binder,
            ref_binder: *ref_binder,
            body: Box::new(v.visit_block(body)),
        },
        Hof::RunIo(body) => Hof::RunIo(Box::new(v.visit_block(body))),
        Hof::RunInit(body) => Hof::RunInit(Box::new(v.visit_block(body))),
        Hof::RememberDest { dest, body } => {
            Hof::RememberDest { dest: dest.clone(), body: Box::new(v.visit_block(body)) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Lit;

    struct CountAtoms(usize);
    impl Visitor for CountAtoms {
        fn visit_atom(&mut self, atom: &Atom) -> Atom {
            self.0 += 1;
            atom.clone()
        }
    }

    #[test]
    fn default_visitor_is_structure_preserving() {
        struct Identity;
        impl Visitor for Identity {}
        let block = Block::atom(Atom::Con(Lit::Int(7)));
        let mut id = Identity;
        assert_eq!(id.visit_block(&block), block);
    }

    #[test]
    fn visit_block_counts_result_atom() {
        let block = Block::atom(Atom::Con(Lit::Unit));
        let mut counter = CountAtoms(0);
        counter.visit_block(&block);
        assert_eq!(counter.0, 1);
    }
}
