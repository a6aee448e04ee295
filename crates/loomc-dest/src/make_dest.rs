//! `makeDest` (§4.2): given a type and an allocation mode, construct a
//! destination for it together with the pointer binders whose allocations
//! realize it.

use crate::builder::DestBuilder;
use crate::error::DestSynthResult;
use loomc_ir::{AllocMode, Atom, ConDest, Dest, PointerBinder, Type};
use loomc_poly::{compute_offset, depends_on, elem_count_poly, IndexStructure};
use loomc_util::NameColor;
use std::collections::HashSet;
use loomc_util::Name;

/// Result of synthesizing a destination: the dest tree plus the flat list
/// of pointer binders whose `Alloc`s realize its `BaseTypeRef` leaves
/// (§4.2: "together with the list of pointer binders"). Pointers owned by a
/// nested `Boxed` destination are *not* included here — see `Dest::Boxed`'s
/// doc comment — since their allocation is deferred until the boxed
/// destination's dependent sizes are known.
pub struct DestResult {
    pub dest: Dest,
    pub pointers: Vec<PointerBinder>,
}

fn index_atoms(idxs: &IndexStructure) -> Vec<Atom> {
    idxs.binders.iter().map(|b| Atom::Var(b.name)).collect()
}

/// Recursive descent on `ty`, carrying the accumulated index structure
/// (`idxs`, extended every time we cross a `TabTy`) and the set of names
/// whose runtime value some annotation may already depend on.
pub fn make_dest<B: DestBuilder>(
    builder: &mut B,
    ty: &Type,
    mode: AllocMode,
    idxs: &IndexStructure,
    dependent_vars: &HashSet<Name>,
) -> DestSynthResult<DestResult> {
    match ty {
        Type::Nat | Type::Base(_) => make_base_dest(builder, base_type_of(ty), mode, idxs),

        Type::Fin(_) => make_base_dest(builder, loomc_ir::BaseType::Int32, mode, idxs),

        Type::Unit => Ok(DestResult {
            dest: Dest::Con(ConDest::ProdCon(Vec::new())),
            pointers: Vec::new(),
        }),

        Type::TabTy(ix_ty, body) => {
            if depends_on(ix_ty, dependent_vars) {
                make_boxed_fallback(builder, ty, dependent_vars)
            } else {
                let name = builder.fresh_name(NameColor::Dest, "i");
                let mut extended = idxs.clone();
                extended.push(name, ix_ty.clone());
                let inner = make_dest(builder, body, mode, &extended, dependent_vars)?;
                Ok(DestResult {
                    dest: Dest::TabRef { binder: name, ix_ty: ix_ty.clone(), body: Box::new(inner.dest) },
                    pointers: inner.pointers,
                })
            }
        }

        Type::ProdType(fields) => {
            let mut pointers = Vec::new();
            let mut dests = Vec::new();
            for field in fields {
                let r = make_dest(builder, field, mode, idxs, dependent_vars)?;
                dests.push(r.dest);
                pointers.extend(r.pointers);
            }
            Ok(DestResult { dest: Dest::Con(ConDest::ProdCon(dests)), pointers })
        }

        Type::SumType(cases) => {
            // All payload destinations are pre-allocated (§4.2): Imp does
            // not branch allocations.
            let tag = builder.fresh_name(NameColor::Dest, "tag");
            let mut pointers = vec![PointerBinder {
                name: tag,
                base_ty: loomc_ir::BaseType::Word8,
                alloc_mode: mode,
                size: if idxs.is_empty() { None } else { Some(elem_count_poly(builder, idxs)) },
            }];
            let mut dests = Vec::new();
            for case in cases {
                let r = make_dest(builder, case, mode, idxs, dependent_vars)?;
                dests.push(r.dest);
                pointers.extend(r.pointers);
            }
            Ok(DestResult {
                dest: Dest::Con(ConDest::SumAsProd(Box::new(loomc_ir::SumDest { tag_ptr: tag, cases: dests }))),
                pointers,
            })
        }

        Type::DepPairTy { left_binder, left_ty, right_ty } => {
            let left = make_dest(builder, left_ty, mode, idxs, dependent_vars)?;
            let mut right_dependent = dependent_vars.clone();
            right_dependent.insert(*left_binder);
            let right = make_dest(builder, right_ty, mode, idxs, &right_dependent)?;
            let mut pointers = left.pointers;
            pointers.extend(right.pointers);
            Ok(DestResult {
                dest: Dest::DepPair {
                    left: Box::new(left.dest),
                    right_binder: *left_binder,
                    right: Box::new(right.dest),
                    pair_ty: Box::new(ty.clone()),
                },
                pointers,
            })
        }

        Type::TypeCon(id, _args) => {
            let repr = builder.resolve_type_con(*id)?;
            let inner = make_dest(builder, &repr, mode, idxs, dependent_vars)?;
            Ok(DestResult { dest: Dest::Con(ConDest::Newtype(*id, Box::new(inner.dest))), pointers: inner.pointers })
        }

        Type::RefTy(inner) => make_dest(builder, inner, mode, idxs, dependent_vars),

        Type::Newtype(id, inner) => {
            let r = make_dest(builder, inner, mode, idxs, dependent_vars)?;
            Ok(DestResult { dest: Dest::Con(ConDest::Newtype(*id, Box::new(r.dest))), pointers: r.pointers })
        }
    }
}

fn base_type_of(ty: &Type) -> loomc_ir::BaseType {
    match ty {
        Type::Base(b) => *b,
        Type::Nat => loomc_ir::BaseType::Int64,
        _ => unreachable!("base_type_of called on non-base type {ty:?}"),
    }
}

fn make_base_dest<B: DestBuilder>(
    builder: &mut B,
    base_ty: loomc_ir::BaseType,
    mode: AllocMode,
    idxs: &IndexStructure,
) -> DestSynthResult<DestResult> {
    let size = if idxs.is_empty() { None } else { Some(elem_count_poly(builder, idxs)) };
    let ptr = builder.fresh_name(NameColor::Dest, "ptr");
    builder.note_pointer_alloc(ptr, base_ty);
    let offset = compute_offset(builder, idxs, &index_atoms(idxs))?;
    Ok(DestResult {
        dest: Dest::BaseTypeRef { ptr, offset },
        pointers: vec![PointerBinder { name: ptr, base_ty, alloc_mode: mode, size }],
    })
}

/// `TabTy` whose index type depends on a prior dynamic value: build a
/// local dest ignoring the outer `idxs` context, then wrap its pointers in
/// an `AbsPtrs` so allocation can be deferred until the dependent sizes are
/// known at runtime (§4.2).
fn make_boxed_fallback<B: DestBuilder>(
    builder: &mut B,
    ty: &Type,
    dependent_vars: &HashSet<Name>,
) -> DestSynthResult<DestResult> {
    let local = make_dest(builder, ty, AllocMode::Managed, &IndexStructure::empty(), dependent_vars)?;
    let pointers: loomc_util::Nest<PointerBinder> = local.pointers.into_iter().collect();
    Ok(DestResult {
        dest: Dest::Boxed(Box::new(loomc_ir::AbsPtrs { pointers, inner: Box::new(local.dest) })),
        pointers: Vec::new(),
    })
}
