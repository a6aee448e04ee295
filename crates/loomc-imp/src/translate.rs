//! Imp Translation (§4.5): walks a fully dest-passed `SimpToImp` block and
//! lowers it into an [`ImpBlock`] of scalar/pointer instructions. Grounded on
//! `faxc-lir::lower`'s `LirLowerer` (one struct threading register/label
//! counters through a recursive MIR-to-LIR walk) — here the "registers" are
//! `Name`s minted by [`ImpBuilder`] and the "basic blocks" are `ImpBlock`s
//! nested directly rather than linked by jump targets, since this IR has no
//! control-flow graph to begin with.
//!
//! Everything `loomc-lower` already special-cases (`Hof::For`, `TabCon`,
//! `RunWriter`, `RunState`) has been rewritten away before this pass ever
//! runs; anything that still reaches here unrewritten (`Expr::App`,
//! `Expr::TabApp`, a surviving `Expr::Handle`, `Hof::For` itself) fails
//! loudly through [`ImpError::NotImplemented`], matching §4.5's own
//! "failure mode" contract.

use std::collections::HashSet;

use loomc_dest::{make_dest, DestResult};
use loomc_ir::{AllocMode, Alt, Atom, BaseType, Block, ConDest, Decl, Dest, DestBlock, Expr, Hof, Lit, Op, Projection, Type};
use loomc_poly::{IndexStructure, OffsetEmitter};
use loomc_util::Name;

use crate::error::{ImpError, ImpResult};
use crate::imp::{AddressSpace, Backend, CallingConvention, Device, IBinder, IFunType, IType, ImpBlock, ImpFunction, ImpInstr, ImpPrimOp};
use crate::imp_builder::ImpBuilder;
use crate::recon::Recon;
use crate::switch::{emit_switch, SwitchArm};

/// The `Backend × Device × AllocMode` input that `chooseAddrSpace`
/// (§6.1/§4.5) closes over for the whole function being translated.
#[derive(Clone, Copy, Debug)]
pub struct ImpCtx {
    pub backend: Backend,
    pub main_device: Device,
    pub current_device: Device,
}

/// `BaseType` leaves are the only types `Op`'s scalar arithmetic ever
/// produces; a compound `Type` reaching here is always routed through a
/// `Dest` instead (§4.2), never through this conversion.
fn imp_scalar_type(ty: &Type) -> ImpResult<IType> {
    match ty {
        Type::Base(b) => Ok(IType::Scalar(*b)),
        Type::Nat => Ok(IType::Scalar(BaseType::Int64)),
        Type::Fin(_) => Ok(IType::Scalar(BaseType::Int32)),
        Type::Unit => Ok(IType::Scalar(BaseType::Word8)),
        // `make_dest` treats `RefTy` as transparent too (it recurses straight
        // into the pointee); a decl typed `RefTy _` names the same scalar its
        // pointee does, not a distinct Imp-level pointer shape.
        Type::RefTy(inner) => imp_scalar_type(inner),
        other => Err(ImpError::NotImplemented { what: format!("scalar Imp type for compound type {other:?}") }),
    }
}

fn alloc_mode_of(p: &loomc_ir::PointerBinder) -> AllocMode {
    p.alloc_mode
}

/// Runs `f` in a fresh scope/decl frame, always popping the frame (even on
/// error) before propagating `f`'s result — the fallible counterpart to
/// `ImpBuilder::build_scoped`.
fn scoped<T>(b: &mut ImpBuilder, f: impl FnOnce(&mut ImpBuilder) -> ImpResult<T>) -> ImpResult<(Vec<crate::imp::ImpDecl>, T)> {
    b.enter_frame();
    let result = f(b);
    let decls = b.exit_frame();
    Ok((decls, result?))
}

fn translate_block_scoped(b: &mut ImpBuilder, ctx: &ImpCtx, block: &Block) -> ImpResult<ImpBlock> {
    let (decls, result) = scoped(b, |b| {
        translate_decls(b, ctx, &block.decls)?;
        translate_atom(&block.result)
    })?;
    Ok(ImpBlock { decls, results: vec![result] })
}

fn translate_decls(b: &mut ImpBuilder, ctx: &ImpCtx, decls: &[Decl]) -> ImpResult<()> {
    for decl in decls {
        translate_decl(b, ctx, decl)?;
    }
    Ok(())
}

/// Atoms flow through translation unchanged: `ImpInstr`'s operands are
/// plain `loomc_ir::Atom`s (see `crate::imp`'s module doc), so the only
/// atoms this pass must actively reject are ones whose further reduction
/// would itself require dest decomposition this pass doesn't attempt
/// (tracked the same way as `Op::Load`'s best-effort limits below).
fn translate_atom(atom: &Atom) -> ImpResult<Atom> {
    match atom {
        Atom::Lam(_) | Atom::TabLam(_) | Atom::Pi(_) | Atom::TabPi(_) => {
            Err(ImpError::NotImplemented { what: format!("first-class function value surviving to Imp: {atom:?}") })
        }
        other => Ok(other.clone()),
    }
}

fn translate_decl(b: &mut ImpBuilder, ctx: &ImpCtx, decl: &Decl) -> ImpResult<()> {
    match &decl.expr {
        Expr::Atom(a) => {
            let v = translate_atom(a)?;
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(v));
            Ok(())
        }
        Expr::Op(op) => translate_op(b, ctx, decl, op),
        Expr::Hof(hof) => translate_hof(b, ctx, decl, hof),
        Expr::Case { scrutinee, alts, result_ty } => translate_case(b, ctx, decl, scrutinee, alts, result_ty),
        Expr::Freeze(a) => {
            let v = translate_atom(a)?;
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(v));
            Ok(())
        }
        Expr::AllocDest(ty, mode) => translate_alloc_dest(b, ctx, decl, ty, *mode),
        Expr::App(..) => Err(ImpError::NotImplemented { what: "Expr::App surviving to Imp translation".into() }),
        Expr::TabApp(..) => Err(ImpError::NotImplemented { what: "Expr::TabApp surviving to Imp translation".into() }),
        Expr::TabCon(..) => Err(ImpError::NotImplemented { what: "Expr::TabCon surviving to Imp translation".into() }),
        Expr::Handle(..) => Err(ImpError::NotImplemented { what: "Expr::Handle surviving to Imp translation".into() }),
    }
}

fn translate_op(b: &mut ImpBuilder, ctx: &ImpCtx, decl: &Decl, op: &Op) -> ImpResult<()> {
    let ty = imp_scalar_type(&decl.ty)?;
    match op {
        Op::BinOp(o, a, c) => {
            let a = translate_atom(a)?;
            let c = translate_atom(c)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::IPrimOp(ImpPrimOp::BinOp(*o, a, c)));
            Ok(())
        }
        Op::UnOp(o, a) => {
            let a = translate_atom(a)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::IPrimOp(ImpPrimOp::UnOp(*o, a)));
            Ok(())
        }
        Op::CastOp(target_ty, a) => {
            let a = translate_atom(a)?;
            let target = imp_scalar_type(target_ty)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::ICastOp(target, a));
            Ok(())
        }
        Op::IxMethod(m, ix_ty, args) => {
            let args = args.iter().map(translate_atom).collect::<ImpResult<Vec<_>>>()?;
            b.emit(
                vec![IBinder { name: decl.binder, ty }],
                ImpInstr::IPrimOp(ImpPrimOp::IxMethod(*m, ix_ty.clone(), args)),
            );
            Ok(())
        }
        Op::ThrowError(err_ty) => {
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::IThrowError(err_ty.clone()));
            Ok(())
        }
        Op::Place(dest, val) => {
            let val = translate_atom(val)?;
            emit_place(b, ctx, dest, &val)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(Atom::unit()));
            Ok(())
        }
        Op::Load(dest) => {
            let v = emit_load(b, ctx, dest)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(v));
            Ok(())
        }
        Op::VectorBroadcast(a, width) => {
            let a = translate_atom(a)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::IVectorBroadcast(a, *width));
            Ok(())
        }
        Op::VectorIota(width) => {
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::IVectorIota(*width));
            Ok(())
        }
        Op::VectorSubref(base, offset, width) => {
            let base = translate_atom(base)?;
            let offset = translate_atom(offset)?;
            let elem_ty = match &ty {
                IType::Vector(_, base_ty) => *base_ty,
                IType::Scalar(base_ty) => *base_ty,
                _ => return Err(ImpError::DestShapeMismatch { detail: "VectorSubref result is not a scalar/vector base type".into() }),
            };
            let addr = ptr_at(b, base, &offset, elem_ty);
            b.emit(
                vec![IBinder { name: decl.binder, ty: IType::ptr(AddressSpace::Heap(ctx.main_device), IType::Vector(*width, elem_ty)) }],
                ImpInstr::Atom(addr),
            );
            Ok(())
        }
        Op::VectorPlace(ptr, val) => {
            let ptr = translate_atom(ptr)?;
            let val = translate_atom(val)?;
            b.emit(vec![], ImpInstr::Store { ptr: ptr.clone(), val });
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(Atom::unit()));
            Ok(())
        }
        Op::VectorLoad(ptr) => {
            let ptr = translate_atom(ptr)?;
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Load { ptr });
            Ok(())
        }
        Op::IndexRef(table, idx) => translate_index_ref(b, ctx, decl, table, idx, ty),
    }
}

/// Best-effort `IndexRef` support (§9's `decomposeDest` open question):
/// only a table surfaced as a `BoxedRef` (the one atom-position form that
/// still carries its own pointer/offset structure this deep) is handled;
/// anything else is the case destination synthesis should already have
/// turned into a `Place`/`Load` pair further upstream.
fn translate_index_ref(b: &mut ImpBuilder, _ctx: &ImpCtx, decl: &Decl, table: &Atom, idx: &Atom, ty: IType) -> ImpResult<()> {
    match table {
        Atom::BoxedRef(abs) => match abs.inner.as_ref() {
            Dest::TabRef { binder, body, .. } => {
                let idx = translate_atom(idx)?;
                let specialized = loomc_dest::substitute_dest(body, *binder, &idx);
                let v = emit_load_dest(b, &specialized)?;
                b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(v));
                Ok(())
            }
            other => Err(ImpError::NotImplemented { what: format!("IndexRef into a non-table boxed destination {other:?}") }),
        },
        other => Err(ImpError::NotImplemented { what: format!("IndexRef on a non-boxed table atom {other:?}") }),
    }
}

/// `ptr + offset * sizeof(elem_ty)`, the one address computation every
/// `BaseTypeRef` read/write and `VectorSubref` reduces to.
fn ptr_at(b: &mut ImpBuilder, ptr: Atom, offset: &Atom, elem_ty: BaseType) -> Atom {
    let elem_size = b.lit_u32(elem_ty.size_bytes() as u32);
    let byte_offset = b.mul(offset.clone(), elem_size);
    b.add(ptr, byte_offset)
}

/// `Op::Place`'s Imp realization: walk `dest`, emitting one `Store` per
/// `BaseTypeRef` leaf. Composite shapes beyond a bare pointer or a
/// `Newtype` wrapper are left as `NotImplemented` — the same best-effort
/// boundary documented on `emit_load`.
fn emit_place(b: &mut ImpBuilder, _ctx: &ImpCtx, dest: &Dest, val: &Atom) -> ImpResult<()> {
    match dest {
        Dest::BaseTypeRef { ptr, offset } => {
            let elem_ty = base_ty_of_ptr(b, *ptr)?;
            let addr = ptr_at(b, Atom::Var(*ptr), offset, elem_ty);
            b.emit(vec![], ImpInstr::Store { ptr: addr, val: val.clone() });
            Ok(())
        }
        Dest::Con(ConDest::Newtype(_, inner)) => emit_place(b, _ctx, inner, val),
        other => Err(ImpError::DestShapeMismatch { detail: format!("best-effort Place does not decompose {other:?}") }),
    }
}

fn emit_load(b: &mut ImpBuilder, _ctx: &ImpCtx, dest: &Dest) -> ImpResult<Atom> {
    emit_load_dest(b, dest)
}

fn emit_load_dest(b: &mut ImpBuilder, dest: &Dest) -> ImpResult<Atom> {
    match dest {
        Dest::BaseTypeRef { ptr, offset } => {
            let elem_ty = base_ty_of_ptr(b, *ptr)?;
            let addr = ptr_at(b, Atom::Var(*ptr), offset, elem_ty);
            Ok(b.load(addr))
        }
        Dest::Con(ConDest::Newtype(_, inner)) => emit_load_dest(b, inner),
        other => Err(ImpError::DestShapeMismatch { detail: format!("best-effort Load does not decompose {other:?}") }),
    }
}

/// Recovers the leaf element width a `BaseTypeRef` pointer was allocated
/// for. `ptr_at` needs the real width — not a guess — to compute the
/// right stride; a miss here means `ptr` reached Imp translation without
/// going through `make_dest`'s allocation path, which is a bug upstream.
fn base_ty_of_ptr(b: &ImpBuilder, ptr: Name) -> ImpResult<BaseType> {
    b.base_ty_of(ptr).ok_or_else(|| ImpError::DestShapeMismatch {
        detail: format!("pointer {ptr:?} has no recorded base type (never went through make_dest's allocation path)"),
    })
}

fn translate_alloc_dest(b: &mut ImpBuilder, ctx: &ImpCtx, decl: &Decl, ty: &Type, mode: AllocMode) -> ImpResult<()> {
    let DestResult { dest, pointers } = make_dest(b, ty, mode, &IndexStructure::empty(), &HashSet::new())?;
    emit_allocs(b, ctx, &pointers);
    let _ = dest; // the dest tree itself is recovered by the caller from `pointers`' names, not from `decl.binder`
    let imp_ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
    b.emit(vec![IBinder { name: decl.binder, ty: imp_ty }], ImpInstr::Atom(Atom::unit()));
    Ok(())
}

fn emit_allocs(b: &mut ImpBuilder, ctx: &ImpCtx, pointers: &[loomc_ir::PointerBinder]) {
    for p in pointers {
        let space = crate::addrspace::choose_addr_space(alloc_mode_of(p), ctx.main_device, ctx.current_device, p.base_ty, p.size.as_ref());
        let ty = b.pointer_layout(space, p.base_ty);
        b.emit(
            vec![IBinder { name: p.name, ty: ty.clone() }],
            ImpInstr::Alloc { space, ty: IType::Scalar(p.base_ty), size: p.size.clone().unwrap_or_else(Atom::unit) },
        );
    }
}

fn translate_hof(b: &mut ImpBuilder, ctx: &ImpCtx, decl: &Decl, hof: &Hof) -> ImpResult<()> {
    match hof {
        Hof::Seq { dir, ix_ty, index_binder, carry_binder, carry, body } => {
            let carry_atom = translate_atom(carry)?;
            let base_ty = match imp_scalar_type(&decl.ty)? {
                IType::Scalar(b) => b,
                _ => return Err(ImpError::NotImplemented { what: "Seq over a non-scalar carry".into() }),
            };
            let scratch = b.alloc_scalar(base_ty);
            b.store(scratch.clone(), carry_atom);
            let size = b.size(ix_ty);
            let loop_body = translate_seq_body(b, ctx, *index_binder, *carry_binder, &scratch, body)?;
            b.emit(vec![], ImpInstr::IFor { dir: *dir, size, binder: *index_binder, body: Box::new(loop_body) });
            let result = b.load(scratch);
            b.emit(vec![IBinder { name: decl.binder, ty: IType::Scalar(base_ty) }], ImpInstr::Atom(result));
            Ok(())
        }
        Hof::While(body) => {
            let inner = translate_block_scoped(b, ctx, body)?;
            b.emit(vec![], ImpInstr::IWhile(Box::new(inner)));
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(Atom::unit()));
            Ok(())
        }
        Hof::RunReader { init, handler_binder, ref_binder, body } => {
            let init = translate_atom(init)?;
            b.emit(vec![IBinder { name: *handler_binder, ty: IType::Scalar(BaseType::Word8) }], ImpInstr::Atom(Atom::unit()));
            b.emit(vec![IBinder { name: *ref_binder, ty: IType::Scalar(BaseType::Int64) }], ImpInstr::Atom(init));
            translate_decls(b, ctx, &body.decls)?;
            let result = translate_atom(&body.result)?;
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(result));
            Ok(())
        }
        Hof::RunIo(body) => {
            translate_decls(b, ctx, &body.decls)?;
            let result = translate_atom(&body.result)?;
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(result));
            Ok(())
        }
        Hof::RunInit(body) => {
            translate_decls(b, ctx, &body.decls)?;
            let result = translate_atom(&body.result)?;
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(result));
            Ok(())
        }
        Hof::RememberDest { dest, body } => {
            translate_decls(b, ctx, &body.decls)?;
            let result = translate_atom(&body.result)?;
            emit_place(b, ctx, dest, &result)?;
            let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
            b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(result));
            Ok(())
        }
        Hof::For { .. } => Err(ImpError::NotImplemented { what: "functional Hof::For surviving to Imp translation (loop lowering should have rewritten it to Seq)".into() }),
        Hof::RunWriter { .. } => Err(ImpError::NotImplemented { what: "Hof::RunWriter surviving to Imp translation".into() }),
        Hof::RunState { .. } => Err(ImpError::NotImplemented { what: "Hof::RunState surviving to Imp translation".into() }),
    }
}

/// `Seq`'s body, made imperative: `carry_binder` is bound by loading the
/// scratch accumulator at the top of each iteration, and the block's
/// result atom is stored back at the bottom, rather than threaded as a
/// functional fold the way `loomc-lower`'s `Builder::sum_over_fin` does it.
fn translate_seq_body(
    b: &mut ImpBuilder,
    ctx: &ImpCtx,
    index_binder: Name,
    carry_binder: Name,
    scratch: &Atom,
    body: &Block,
) -> ImpResult<ImpBlock> {
    let _ = index_binder;
    let (decls, result) = scoped(b, |b| {
        let carry_ty = IType::Scalar(BaseType::Int64);
        let loaded = b.load(scratch.clone());
        b.emit(vec![IBinder { name: carry_binder, ty: carry_ty }], ImpInstr::Atom(loaded));
        translate_decls(b, ctx, &body.decls)?;
        let result = translate_atom(&body.result)?;
        b.store(scratch.clone(), result);
        Ok(())
    })?;
    let _ = result;
    Ok(ImpBlock { decls, results: vec![] })
}

/// `Case`'s Imp realization (§4.5's `emitSwitch`): synthesize a scratch
/// join destination via `make_dest`, translate each arm into a `Store` to
/// it, fold the guarded arms into nested `ICond`s with the last arm as the
/// unconditional default (every other tag has already been excluded by
/// the guards before it), then load the join destination back out.
fn translate_case(
    b: &mut ImpBuilder,
    ctx: &ImpCtx,
    decl: &Decl,
    scrutinee: &Atom,
    alts: &[Alt],
    result_ty: &Type,
) -> ImpResult<()> {
    let scrutinee_name = match scrutinee {
        Atom::Var(n) => *n,
        other => return Err(ImpError::NotImplemented { what: format!("Case over a non-variable scrutinee {other:?}") }),
    };
    if alts.is_empty() {
        return Err(ImpError::NotImplemented { what: "Case with no alternatives".into() });
    }
    let DestResult { dest: join_dest, pointers } = make_dest(b, result_ty, AllocMode::Managed, &IndexStructure::empty(), &HashSet::new())?;
    emit_allocs(b, ctx, &pointers);

    let tag = Atom::Project(vec![Projection::SumTag], scrutinee_name);
    let mut arms = Vec::with_capacity(alts.len());
    for (i, alt) in alts.iter().enumerate() {
        let payload = Atom::Project(vec![Projection::SumPayload(i as u32)], scrutinee_name);
        let (decls, ()) = scoped(b, |b| {
            b.emit(vec![IBinder { name: alt.binder, ty: imp_scalar_type(&alt.payload_ty).unwrap_or(IType::Scalar(BaseType::Word8)) }], ImpInstr::Atom(payload.clone()));
            translate_decls(b, ctx, &alt.body.decls)?;
            let v = translate_atom(&alt.body.result)?;
            emit_place(b, ctx, &join_dest, &v)
        })?;
        let guard = b.emit_one(
            IType::Scalar(BaseType::Bool),
            "tag_eq",
            ImpInstr::IPrimOp(ImpPrimOp::BinOp(loomc_ir::BinOp::ICmpEq, tag.clone(), Atom::Con(Lit::Int(i as i64)))),
        );
        arms.push(SwitchArm { guard, body: ImpBlock { decls, results: vec![] } });
    }
    // The last alt's tag has already been excluded by every guard before
    // it, so its translated body becomes the unconditional default and its
    // own guard is dropped.
    let default = arms.pop().expect("alts is non-empty").body;
    let switch_block = emit_switch(arms, default);
    for d in switch_block.decls {
        b.emit(d.binders, d.instr);
    }

    let result = emit_load_dest(b, &join_dest)?;
    let ty = imp_scalar_type(&decl.ty).unwrap_or(IType::Scalar(BaseType::Word8));
    b.emit(vec![IBinder { name: decl.binder, ty }], ImpInstr::Atom(result));
    Ok(())
}

/// Top-level entry point: `DestBlock -> (ImpFunction, Recon)` (§6.4). The
/// function takes no explicit parameters beyond what `params` names —
/// callers (driver/export layer) are responsible for threading in whatever
/// the calling convention demands before `body` runs.
pub fn translate_function(
    ctx: &ImpCtx,
    cc: CallingConvention,
    params: loomc_util::Nest<IBinder>,
    dest_block: &DestBlock,
) -> ImpResult<(ImpFunction, Recon)> {
    let mut b = ImpBuilder::new();
    let result_ty = imp_scalar_type(&dest_block.ans_ty)?;
    let (decls, result) = scoped(&mut b, |b| {
        translate_decls(b, ctx, &dest_block.body.decls)?;
        translate_atom(&dest_block.body.result)
    })?;
    let body = ImpBlock { decls, results: vec![result.clone()] };
    let dest_binder = IBinder { name: dest_block.dest_binder, ty: IType::ptr(AddressSpace::Heap(ctx.main_device), result_ty.clone()) };
    let recon = Recon::trivial(IBinder { name: dest_block.dest_binder, ty: result_ty.clone() });
    let mut full_params = params;
    full_params.push(dest_binder);
    let arg_types: Vec<IType> = full_params.iter().map(|p| p.ty.clone()).collect();
    let ty = IFunType { calling_convention: cc, arg_types, result_types: vec![result_ty] };
    Ok((ImpFunction { ty, params: full_params, body }, recon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_dest::DestBuilder;
    use loomc_ir::{Alt, BinOp};
    use loomc_util::{NameColor, ScopeStack, Symbol};

    fn ctx() -> ImpCtx {
        ImpCtx { backend: Backend::Llvm, main_device: Device::Cpu, current_device: Device::Cpu }
    }

    fn name(scope: &mut ScopeStack, hint: &str) -> Name {
        scope.push(NameColor::Atom, Symbol::intern(hint))
    }

    #[test]
    fn bin_op_lowers_to_one_primop_instr() {
        let mut scope = ScopeStack::new();
        let out = name(&mut scope, "r");
        let decl = Decl {
            binder: out,
            ty: Type::Base(BaseType::Int32),
            expr: Expr::Op(Op::BinOp(BinOp::IAdd, Box::new(Atom::Con(Lit::Int(1))), Box::new(Atom::Con(Lit::Int(2))))),
        };
        let mut b = ImpBuilder::new();
        let block = b.build_scoped(|b| {
            translate_decl(b, &ctx(), &decl).unwrap();
            vec![]
        });
        assert_eq!(block.decls.len(), 1);
        assert!(matches!(block.decls[0].instr, ImpInstr::IPrimOp(ImpPrimOp::BinOp(BinOp::IAdd, _, _))));
    }

    #[test]
    fn place_then_load_round_trips_through_the_same_pointer() {
        let mut scope = ScopeStack::new();
        let ptr = name(&mut scope, "p");
        let place_out = name(&mut scope, "placed");
        let load_out = name(&mut scope, "loaded");
        let dest = Dest::BaseTypeRef { ptr, offset: Atom::unit() };
        let place_decl = Decl {
            binder: place_out,
            ty: Type::Unit,
            expr: Expr::Op(Op::Place(Box::new(dest.clone()), Box::new(Atom::Con(Lit::Int(42))))),
        };
        let load_decl = Decl { binder: load_out, ty: Type::Base(BaseType::Int32), expr: Expr::Op(Op::Load(Box::new(dest))) };
        let mut b = ImpBuilder::new();
        b.note_pointer_alloc(ptr, BaseType::Int32);
        let block = b.build_scoped(|b| {
            translate_decl(b, &ctx(), &place_decl).unwrap();
            translate_decl(b, &ctx(), &load_decl).unwrap();
            vec![]
        });
        assert!(block.decls.iter().any(|d| matches!(d.instr, ImpInstr::Store { .. })));
        assert!(block.decls.iter().any(|d| matches!(d.instr, ImpInstr::Load { .. })));
    }

    #[test]
    fn place_then_load_uses_the_pointer_s_own_element_width_not_a_fixed_one() {
        let mut scope = ScopeStack::new();
        let ptr = name(&mut scope, "p");
        let place_out = name(&mut scope, "placed");
        let dest = Dest::BaseTypeRef { ptr, offset: Atom::Con(Lit::Int(3)) };
        let place_decl = Decl {
            binder: place_out,
            ty: Type::Unit,
            expr: Expr::Op(Op::Place(Box::new(dest), Box::new(Atom::Con(Lit::Int(1))))),
        };
        let mut b = ImpBuilder::new();
        b.note_pointer_alloc(ptr, BaseType::Float32);
        let block = b.build_scoped(|b| {
            translate_decl(b, &ctx(), &place_decl).unwrap();
            vec![]
        });
        let mul = block.decls.iter().find_map(|d| match &d.instr {
            ImpInstr::IPrimOp(ImpPrimOp::BinOp(BinOp::IMul, _, Atom::Con(Lit::Int(n)))) => Some(*n),
            _ => None,
        });
        assert_eq!(mul, Some(BaseType::Float32.size_bytes() as i64));
    }

    #[test]
    fn case_with_two_alts_folds_into_one_icond() {
        let mut scope = ScopeStack::new();
        let scrutinee = name(&mut scope, "s");
        let out = name(&mut scope, "r");
        let alt0_binder = name(&mut scope, "a0");
        let alt1_binder = name(&mut scope, "a1");
        let alts = vec![
            Alt { binder: alt0_binder, payload_ty: Type::Base(BaseType::Int32), body: Block::atom(Atom::Var(alt0_binder)) },
            Alt { binder: alt1_binder, payload_ty: Type::Base(BaseType::Int32), body: Block::atom(Atom::Var(alt1_binder)) },
        ];
        let decl = Decl {
            binder: out,
            ty: Type::Base(BaseType::Int32),
            expr: Expr::Case { scrutinee: Box::new(Atom::Var(scrutinee)), alts, result_ty: Box::new(Type::Base(BaseType::Int32)) },
        };
        let mut b = ImpBuilder::new();
        let block = b.build_scoped(|b| {
            translate_decl(b, &ctx(), &decl).unwrap();
            vec![]
        });
        assert!(block.decls.iter().any(|d| matches!(d.instr, ImpInstr::ICond { .. })));
    }

    #[test]
    fn app_surviving_to_imp_translation_fails_loudly() {
        let mut scope = ScopeStack::new();
        let out = name(&mut scope, "r");
        let decl = Decl { binder: out, ty: Type::Base(BaseType::Int32), expr: Expr::App(Box::new(Atom::unit()), vec![]) };
        let mut b = ImpBuilder::new();
        let result = b.build_scoped(|b| {
            assert!(translate_decl(b, &ctx(), &decl).is_err());
            vec![]
        });
        let _ = result;
    }
}
