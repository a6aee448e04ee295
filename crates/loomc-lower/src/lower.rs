//! Loop lowering with destination passing (§4.3): rewrites every `for` and
//! `TabCon` in a block to write directly into a provided (or freshly
//! allocated) [`Dest`], eliminating the intermediate buffer a naive
//! "compute a table, then copy it" lowering would need.

use crate::builder::Builder;
use crate::dest_assignment::{unpack_rws_dest, DestAssignment};
use crate::error::LowerResult;
use loomc_dest::{copy_atom, index_dest, make_dest};
use loomc_ir::{AllocMode, Atom, Block, Decl, Dest, DestBlock, Expr, Hof, IxType, Lit, Op, Projection, ProjDest, SeqDir, Type};
use loomc_poly::IndexStructure;
use loomc_util::{Name, NameColor};
use std::collections::HashSet;

/// `lowerFullySequential`'s top-level contract (§4.3.1): synthesize the
/// answer destination for `ans_ty`, then lower `block` to write into it.
/// Returns the `DestBlock` together with the pointer binders that must be
/// allocated to realize the answer — `Abs (destBinder:RefTy ansTy) …`
/// names the destination abstractly, while the concrete pointers backing it
/// are this function's second return value (`destBinder` itself carries no
/// allocation; it is the caller-visible handle for the structure `pointers`
/// realizes).
pub fn lower_fully_sequential(
    builder: &mut Builder,
    ans_ty: &Type,
    block: &Block,
) -> LowerResult<(DestBlock, Vec<loomc_ir::PointerBinder>)> {
    tracing::debug!(?ans_ty, "synthesizing top-level answer destination");
    let dest_binder = builder.fresh_binder(NameColor::Dest, "dest");
    let made = make_dest(builder, ans_ty, AllocMode::Unmanaged, &IndexStructure::empty(), &HashSet::new())?;
    tracing::debug!(pointer_count = made.pointers.len(), "top-level destination synthesized");
    let (decls, ()) = scoped(builder, |b| lower_block_into_dest(b, block, &made.dest, &DestAssignment::default()))?;
    let body = Block { annotation: None, decls, result: Atom::unit() };
    Ok((DestBlock { dest_binder, ans_ty: ans_ty.clone(), body }, made.pointers))
}

/// Runs `f` in a fresh scope/decl frame, always popping the frame (even on
/// error) before propagating `f`'s result — the fallible counterpart to
/// `Builder::build_scoped`.
fn scoped<T>(b: &mut Builder, f: impl FnOnce(&mut Builder) -> LowerResult<T>) -> LowerResult<(Vec<Decl>, T)> {
    b.enter_scope();
    let result = f(b);
    let decls = b.exit_scope();
    Ok((decls, result?))
}

/// Lowers every decl of `block` into the ambient builder frame, routing
/// writes either through `assignment` (§4.3.4) or, for the trailing result,
/// directly into `dest`.
fn lower_block_into_dest(builder: &mut Builder, block: &Block, dest: &Dest, assignment: &DestAssignment) -> LowerResult<()> {
    for decl in &block.decls {
        match assignment.get(&decl.binder) {
            Some(proj_dest) => lower_decl_with_dest(builder, decl, proj_dest)?,
            None => lower_decl_no_dest(builder, decl)?,
        }
    }
    let already_routed = matches!(&block.result, Atom::Var(n) if assignment.contains_key(n));
    if !already_routed {
        builder.emit_decl(
            NameColor::Dest,
            "_",
            Type::Unit,
            Expr::Op(copy_atom(dest.clone(), block.result.clone())),
        );
    }
    Ok(())
}

fn lower_decl_with_dest(builder: &mut Builder, decl: &Decl, proj_dest: &ProjDest) -> LowerResult<()> {
    let dest = proj_dest.dest().clone();
    match &decl.expr {
        Expr::Hof(Hof::For { binder, ix_ty, body }) => {
            let result = lower_for(builder, *binder, ix_ty, body, dest)?;
            builder.emit_named_decl(decl.binder, decl.ty.clone(), Expr::atom(result));
        }
        Expr::TabCon(ty, elems) => {
            let result = lower_tabcon(builder, ty, elems, dest)?;
            builder.emit_named_decl(decl.binder, decl.ty.clone(), Expr::atom(result));
        }
        Expr::Hof(Hof::RunWriter { handler_binder, ref_binder, body }) => {
            lower_rws_with_dest(builder, decl, *handler_binder, *ref_binder, None, body, proj_dest)?;
        }
        Expr::Hof(Hof::RunState { init, handler_binder, ref_binder, body }) => {
            lower_rws_with_dest(builder, decl, *handler_binder, *ref_binder, Some((**init).clone()), body, proj_dest)?;
        }
        other => {
            builder.emit_named_decl(decl.binder, decl.ty.clone(), other.clone());
            builder.emit_decl(
                NameColor::Dest,
                "_",
                Type::Unit,
                Expr::Op(copy_atom(dest, Atom::Var(decl.binder))),
            );
        }
    }
    Ok(())
}

fn lower_decl_no_dest(builder: &mut Builder, decl: &Decl) -> LowerResult<()> {
    match &decl.expr {
        Expr::Hof(Hof::For { binder, ix_ty, body }) => {
            let made = make_dest(builder, &decl.ty, AllocMode::Managed, &IndexStructure::empty(), &HashSet::new())?;
            let result = lower_for(builder, *binder, ix_ty, body, made.dest)?;
            builder.emit_named_decl(decl.binder, decl.ty.clone(), Expr::atom(result));
        }
        Expr::TabCon(ty, elems) => {
            let made = make_dest(builder, ty, AllocMode::Managed, &IndexStructure::empty(), &HashSet::new())?;
            let result = lower_tabcon(builder, ty, elems, made.dest)?;
            builder.emit_named_decl(decl.binder, decl.ty.clone(), Expr::atom(result));
        }
        other => builder.emit_named_decl(decl.binder, decl.ty.clone(), other.clone()),
    }
    Ok(())
}

/// `for` lowering (§4.3.3). `index_binder` is the loop variable exactly as
/// it appeared in the source `for`; the synthesized `Seq`'s carry binder is
/// fresh since nothing upstream ever names it.
fn lower_for(builder: &mut Builder, index_binder: Name, ix_ty: &IxType, body: &Block, dest: Dest) -> LowerResult<Atom> {
    tracing::trace!(?ix_ty, "lowering for into a dest-passing Seq");
    let result_ty = body.annotation.as_ref().map(|a| a.result_ty.clone());
    let is_singleton = result_ty.as_ref().map(|t| t.is_singleton()).unwrap_or(false);
    let carry_binder = builder.fresh_binder(NameColor::Dest, "destProd");

    let (decls, ()) = scoped(builder, |b| {
        if is_singleton {
            lower_block_no_dest_for_effect(b, body)?;
        } else {
            let local_dest = index_dest(&dest, &Atom::Var(index_binder))?;
            lower_block_into_dest(b, body, &local_dest, &DestAssignment::default())?;
        }
        Ok(())
    })?;
    let loop_body = Block { annotation: None, decls, result: Atom::Var(carry_binder) };

    let carry = Atom::BoxedRef(Box::new(loomc_ir::AbsPtrs {
        pointers: loomc_util::Nest::default(),
        inner: Box::new(dest.clone()),
    }));
    let seq_name = builder.emit_decl(
        NameColor::Dest,
        "seq",
        Type::RefTy(Box::new(result_ty.clone().unwrap_or(Type::Unit))),
        Expr::Hof(Hof::Seq {
            dir: SeqDir::Fwd,
            ix_ty: ix_ty.clone(),
            index_binder,
            carry_binder,
            carry: Box::new(carry),
            body: Box::new(loop_body),
        }),
    );
    Ok(freeze_projection(builder, seq_name, result_ty.unwrap_or(Type::Unit)))
}

fn freeze_projection(builder: &mut Builder, seq_name: Name, ty: Type) -> Atom {
    let proj = Atom::Project(vec![Projection::TupleField(0)], seq_name);
    let freeze_name = builder.emit_decl(NameColor::Dest, "ans", ty, Expr::Freeze(Box::new(proj)));
    Atom::Var(freeze_name)
}

/// A `for` whose result type is a singleton runs purely for effect (§4.3.3):
/// no dest is threaded through the body at all.
fn lower_block_no_dest_for_effect(builder: &mut Builder, body: &Block) -> LowerResult<()> {
    for decl in &body.decls {
        lower_decl_no_dest(builder, decl)?;
    }
    Ok(())
}

/// `TabCon` lowering (§4.3.6): place each literal element into its
/// per-index slot of a freshly synthesized (or provided) destination.
fn lower_tabcon(builder: &mut Builder, ty: &Type, elems: &[Atom], dest: Dest) -> LowerResult<Atom> {
    for (i, elem) in elems.iter().enumerate() {
        let ordinal = Atom::Con(Lit::Int(i as i64));
        let elem_dest = index_dest(&dest, &ordinal)?;
        builder.emit_decl(NameColor::Dest, "_", Type::Unit, Expr::Op(copy_atom(elem_dest, elem.clone())));
    }
    Ok(freeze_boxed(builder, ty.clone(), dest))
}

fn freeze_boxed(builder: &mut Builder, ty: Type, dest: Dest) -> Atom {
    let boxed = Atom::BoxedRef(Box::new(loomc_ir::AbsPtrs { pointers: loomc_util::Nest::default(), inner: Box::new(dest) }));
    let name = builder.emit_decl(NameColor::Dest, "ans", ty, Expr::Freeze(Box::new(boxed)));
    Atom::Var(name)
}

/// RWS lowering (§4.3.5): decide the accumulator split via `unpack_rws_dest`,
/// bind the handler/ref binders the same way Imp translation later degenerates
/// them (§4.5: handler binder to `unit`, ref binder to the destination), then
/// lower the handler body as an ordinary no-dest sequence before routing its
/// trailing result into the answer destination.
fn lower_rws_with_dest(
    builder: &mut Builder,
    decl: &Decl,
    handler_binder: Name,
    ref_binder: Name,
    _state_init: Option<Atom>,
    body: &Block,
    proj_dest: &ProjDest,
) -> LowerResult<()> {
    let decomposed = unpack_rws_dest(proj_dest);
    let (answer_dest, state_dest) = match decomposed {
        Some((a, s)) => (a, s),
        None => (None, Some(proj_dest.dest().clone())),
    };
    let state_dest = match state_dest {
        Some(d) => d,
        None => make_dest(builder, &decl.ty, AllocMode::Managed, &IndexStructure::empty(), &HashSet::new())?.dest,
    };

    builder.emit_named_decl(handler_binder, Type::Unit, Expr::atom(Atom::unit()));
    let ref_atom = Atom::BoxedRef(Box::new(loomc_ir::AbsPtrs {
        pointers: loomc_util::Nest::default(),
        inner: Box::new(state_dest.clone()),
    }));
    builder.emit_named_decl(ref_binder, Type::Unit, Expr::atom(ref_atom));

    for inner_decl in &body.decls {
        lower_decl_no_dest(builder, inner_decl)?;
    }

    if let Some(answer) = answer_dest {
        builder.emit_decl(
            NameColor::Dest,
            "_",
            Type::Unit,
            Expr::Op(copy_atom(answer, body.result.clone())),
        );
        builder.emit_named_decl(decl.binder, decl.ty.clone(), Expr::atom(Atom::unit()));
    } else {
        builder.emit_named_decl(decl.binder, decl.ty.clone(), Expr::atom(body.result.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::{BaseType, BlockAnnotation, BinOp};
    use loomc_util::Symbol;

    fn fin(n: i64) -> IxType {
        IxType::Fin(Box::new(Atom::Con(Lit::Int(n))))
    }

    /// S1: `for i:(Fin 4). let x = table[i] in x + x` lowers to one
    /// `AllocDest`-free `Seq` writing straight into the synthesized dest.
    #[test]
    fn simple_tensor_double_produces_a_single_seq_and_no_intermediate_alloc() {
        let mut b = Builder::new();
        let i = b.fresh_binder(NameColor::Dest, "i");
        let table = b.fresh_binder(NameColor::Atom, "table");
        let x = b.fresh_binder(NameColor::Atom, "x");
        let inner_body = Block {
            annotation: Some(BlockAnnotation { result_ty: Type::Base(BaseType::Float32), effects: Vec::new() }),
            decls: vec![Decl {
                binder: x,
                ty: Type::Base(BaseType::Float32),
                expr: Expr::Op(Op::IndexRef(Box::new(Atom::Var(table)), Box::new(Atom::Var(i)))),
            }],
            result: Atom::Var(x),
        };
        let for_decl_binder = b.fresh_binder(NameColor::Atom, "r");
        let outer_block = Block {
            annotation: Some(BlockAnnotation { result_ty: Type::TabTy(fin(4), Box::new(Type::Base(BaseType::Float32))), effects: Vec::new() }),
            decls: vec![Decl {
                binder: for_decl_binder,
                ty: Type::TabTy(fin(4), Box::new(Type::Base(BaseType::Float32))),
                expr: Expr::Hof(Hof::For { binder: i, ix_ty: fin(4), body: Box::new(inner_body) }),
            }],
            result: Atom::Var(for_decl_binder),
        };
        let ans_ty = Type::TabTy(fin(4), Box::new(Type::Base(BaseType::Float32)));
        let (dest_block, pointers) = lower_fully_sequential(&mut b, &ans_ty, &outer_block).unwrap();
        assert_eq!(pointers.len(), 1);
        let has_seq = dest_block.body.decls.iter().any(|d| matches!(d.expr, Expr::Hof(Hof::Seq { .. })));
        assert!(has_seq);
        let has_alloc_dest = dest_block.body.decls.iter().any(|d| matches!(d.expr, Expr::AllocDest(..)));
        assert!(!has_alloc_dest, "no intermediate buffer should be allocated");
        let _ = BinOp::FAdd;
        let _ = Symbol::intern("unused");
    }

    /// S2: nested `for`s over the same pointer thread through `IndexRef`
    /// rather than allocating a scratch buffer for the inner loop.
    #[test]
    fn nested_for_threads_the_same_destination() {
        let mut b = Builder::new();
        let i = b.fresh_binder(NameColor::Dest, "i");
        let j = b.fresh_binder(NameColor::Dest, "j");
        let call_result = b.fresh_binder(NameColor::Atom, "call");
        let inner_inner = Block {
            annotation: Some(BlockAnnotation { result_ty: Type::Base(BaseType::Int32), effects: Vec::new() }),
            decls: vec![Decl {
                binder: call_result,
                ty: Type::Base(BaseType::Int32),
                expr: Expr::App(Box::new(Atom::Var(i)), vec![Atom::Var(j)]),
            }],
            result: Atom::Var(call_result),
        };
        let inner_for_binder = b.fresh_binder(NameColor::Atom, "row");
        let inner_block = Block {
            annotation: Some(BlockAnnotation {
                result_ty: Type::TabTy(fin(20), Box::new(Type::Base(BaseType::Int32))),
                effects: Vec::new(),
            }),
            decls: vec![Decl {
                binder: inner_for_binder,
                ty: Type::TabTy(fin(20), Box::new(Type::Base(BaseType::Int32))),
                expr: Expr::Hof(Hof::For { binder: j, ix_ty: fin(20), body: Box::new(inner_inner) }),
            }],
            result: Atom::Var(inner_for_binder),
        };
        let ans_ty = Type::TabTy(fin(10), Box::new(Type::TabTy(fin(20), Box::new(Type::Base(BaseType::Int32)))));
        let outer_for_binder = b.fresh_binder(NameColor::Atom, "grid");
        let outer_block = Block {
            annotation: Some(BlockAnnotation { result_ty: ans_ty.clone(), effects: Vec::new() }),
            decls: vec![Decl {
                binder: outer_for_binder,
                ty: ans_ty.clone(),
                expr: Expr::Hof(Hof::For { binder: i, ix_ty: fin(10), body: Box::new(inner_block) }),
            }],
            result: Atom::Var(outer_for_binder),
        };
        let (_dest_block, pointers) = lower_fully_sequential(&mut b, &ans_ty, &outer_block).unwrap();
        assert_eq!(pointers.len(), 1, "one pointer of product size, not a per-row scratch buffer");
        assert_eq!(pointers[0].size.as_ref().map(|a| match a {
            Atom::Con(Lit::Int(n)) => *n,
            _ => panic!("expected literal size"),
        }), Some(200));
    }
}
