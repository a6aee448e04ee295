//! Vectorization (§4.4): rewrite a `Seq dir (Fin n) …` loop whose body is
//! free of effects beyond `RunInit` into an outer `Seq` of `n / width`
//! iterations whose body performs width-`width` vector operations — the
//! standard strip-mining transform, grounded on the teacher's fixpoint-style
//! dataflow passes (`faxc-mir/src/analysis/dataflow.rs`) but specialized to
//! a single forward scan since loop bodies here are straight-line decl lists
//! rather than a CFG needing iteration to a fixpoint.

use crate::error::{VectorizeError, VectorizeResult};
use crate::stability::{arith_result, lookup, Stability, StabilityEnv};
use loomc_ir::{Atom, BinOp, Block, Decl, Dest, Expr, Hof, IxType, Lit, Op, Type};
use loomc_util::{NameColor, ScopeStack, Symbol};

/// Either the rewritten loop, or a refusal — per §4.4.3, refusal is not an
/// error: the caller keeps the original `Seq` verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Vectorized(Hof),
    Refused { reason: String },
}

/// `vectorize_seq`'s top-level contract. `width` is the target vector
/// width in lanes (e.g. 4, 8); `scope` mints fresh binders for the
/// `ensureVarying` broadcast/iota decls this pass may need to insert.
pub fn vectorize_seq(scope: &mut ScopeStack, hof: &Hof, width: u32) -> VectorizeResult<Outcome> {
    let Hof::Seq { dir, ix_ty, index_binder, carry_binder, carry, body } = hof else {
        return Ok(Outcome::Refused { reason: "not a Seq".to_string() });
    };
    let IxType::Fin(n) = ix_ty else {
        return Ok(Outcome::Refused { reason: "index type is not Fin".to_string() });
    };
    let Atom::Con(Lit::Int(n)) = n.as_ref() else {
        return Ok(Outcome::Refused { reason: "loop bound is not a literal integer".to_string() });
    };
    let n = *n as u32;
    if width == 0 || n % width != 0 {
        return Ok(Outcome::Refused { reason: format!("bound {n} is not a multiple of width {width}") });
    }
    if has_disallowed_effect(body) {
        return Ok(Outcome::Refused { reason: "body has an effect beyond RunInit".to_string() });
    }

    tracing::debug!(n, width, "attempting vectorization of Seq");

    let outer_index_binder = scope.push(NameColor::Dest, Symbol::intern("co"));
    let mut env = StabilityEnv::default();
    env.insert(outer_index_binder, Stability::Contiguous);
    env.insert(*carry_binder, Stability::Varying);

    let mut new_decls = Vec::new();
    // The chunk base: lane 0 of chunk `co` is the original element index
    // `co * width`. Reusing `index_binder`'s own name keeps every existing
    // reference inside `body` pointing at the right value without a
    // substitution pass.
    new_decls.push(Decl {
        binder: *index_binder,
        ty: Type::Nat,
        expr: Expr::Op(Op::BinOp(BinOp::IMul, Box::new(Atom::Var(outer_index_binder)), Box::new(Atom::Con(Lit::Int(width as i64))))),
    });
    env.insert(*index_binder, Stability::Contiguous);

    for decl in &body.decls {
        match vectorize_decl(scope, decl, &mut env, width)? {
            Some(mut decls) => new_decls.append(&mut decls),
            None => {
                return Ok(Outcome::Refused {
                    reason: format!("op bound to {:?} is not in the vectorization whitelist", decl.binder),
                })
            }
        }
    }

    let vectorized = Hof::Seq {
        dir: *dir,
        ix_ty: IxType::Fin(Box::new(Atom::Con(Lit::Int((n / width) as i64)))),
        index_binder: outer_index_binder,
        carry_binder: *carry_binder,
        carry: carry.clone(),
        body: Box::new(Block { annotation: body.annotation.clone(), decls: new_decls, result: body.result.clone() }),
    };
    tracing::debug!("vectorization succeeded");
    Ok(Outcome::Vectorized(vectorized))
}

/// A vectorizable body may only carry the initialization effect (`RunInit`);
/// any other `Hof` or a `Handle` disqualifies the whole loop (§4.4.3).
fn has_disallowed_effect(block: &Block) -> bool {
    block.decls.iter().any(|d| match &d.expr {
        Expr::Hof(Hof::RunInit(_)) => false,
        Expr::Hof(_) => true,
        Expr::Handle(_) => true,
        _ => false,
    })
}

/// Vectorizes one decl in place, possibly emitting extra `ensureVarying`
/// decls ahead of it. `None` means the op is not in the §4.4.2 whitelist
/// (refusal, not an error); `Err` means a genuine write conflict.
fn vectorize_decl(scope: &mut ScopeStack, decl: &Decl, env: &mut StabilityEnv, width: u32) -> VectorizeResult<Option<Vec<Decl>>> {
    match &decl.expr {
        Expr::Op(Op::IndexRef(table, index)) => {
            let table_st = lookup(env, table);
            let index_st = lookup(env, index);
            if table_st.is_uniform() && index_st.is_contiguous() {
                // `IndexRef` already yields the loaded element (not a bare
                // reference) in this IR, so the vector form is a
                // `VectorSubref` (the wide pointer, `Contiguous`) followed by
                // a `VectorLoad` (the `width` loaded values, `Varying`).
                let vec_ptr_name = scope.push(NameColor::Dest, Symbol::intern("vptr"));
                env.insert(decl.binder, Stability::Varying);
                Ok(Some(vec![
                    Decl {
                        binder: vec_ptr_name,
                        ty: Type::Nat,
                        expr: Expr::Op(Op::VectorSubref(table.clone(), index.clone(), width)),
                    },
                    Decl { binder: decl.binder, ty: decl.ty.clone(), expr: Expr::Op(Op::VectorLoad(Box::new(Atom::Var(vec_ptr_name)))) },
                ]))
            } else {
                Ok(None)
            }
        }

        Expr::Op(Op::Place(dest, value)) => {
            let Dest::BaseTypeRef { ptr, offset } = dest.as_ref() else { return Ok(None) };
            let offset_st = lookup(env, offset);
            let value_st = lookup(env, value);
            match (&offset_st, &value_st) {
                (Stability::Uniform, Stability::Uniform) => Ok(Some(vec![decl.clone()])),
                (Stability::Contiguous, Stability::Varying | Stability::Contiguous) => {
                    let mut extra = Vec::new();
                    let wide_value = ensure_varying(scope, value, &value_st, width, &mut extra);
                    let vec_ptr_name = scope.push(NameColor::Dest, Symbol::intern("vptr"));
                    extra.push(Decl {
                        binder: vec_ptr_name,
                        ty: Type::Nat,
                        expr: Expr::Op(Op::VectorSubref(Box::new(Atom::Var(*ptr)), Box::new(offset.clone()), width)),
                    });
                    extra.push(Decl {
                        binder: decl.binder,
                        ty: Type::Unit,
                        expr: Expr::Op(Op::VectorPlace(Box::new(Atom::Var(vec_ptr_name)), Box::new(wide_value))),
                    });
                    Ok(Some(extra))
                }
                (Stability::Uniform, _) => Err(VectorizeError::WriteConflict { binder: format!("{:?}", decl.binder) }),
                _ => Ok(None),
            }
        }

        Expr::Op(Op::Load(dest)) => {
            let Dest::BaseTypeRef { ptr, offset } = dest.as_ref() else { return Ok(None) };
            let offset_st = lookup(env, offset);
            if offset_st.is_contiguous() {
                let vec_ptr_name = scope.push(NameColor::Dest, Symbol::intern("vptr"));
                env.insert(decl.binder, Stability::Varying);
                Ok(Some(vec![
                    Decl {
                        binder: vec_ptr_name,
                        ty: Type::Nat,
                        expr: Expr::Op(Op::VectorSubref(Box::new(Atom::Var(*ptr)), Box::new(offset.clone()), width)),
                    },
                    Decl { binder: decl.binder, ty: decl.ty.clone(), expr: Expr::Op(Op::VectorLoad(Box::new(Atom::Var(vec_ptr_name)))) },
                ]))
            } else if offset_st.is_uniform() {
                env.insert(decl.binder, Stability::Uniform);
                Ok(Some(vec![decl.clone()]))
            } else {
                Ok(None)
            }
        }

        Expr::Op(Op::UnOp(_, a)) => {
            let st = arith_result(&[lookup(env, a)]);
            env.insert(decl.binder, st);
            Ok(Some(vec![decl.clone()]))
        }

        Expr::Op(Op::BinOp(_, a, b)) => {
            let st = arith_result(&[lookup(env, a), lookup(env, b)]);
            env.insert(decl.binder, st);
            Ok(Some(vec![decl.clone()]))
        }

        Expr::Op(Op::CastOp(_, a)) => {
            // Preserves stability; a varying operand keeps the cast varying.
            let st = lookup(env, a);
            env.insert(decl.binder, st);
            Ok(Some(vec![decl.clone()]))
        }

        Expr::Atom(a) => {
            let st = lookup(env, a);
            env.insert(decl.binder, st);
            Ok(Some(vec![decl.clone()]))
        }

        Expr::Hof(Hof::RunInit(_)) => {
            env.insert(decl.binder, Stability::Varying);
            Ok(Some(vec![decl.clone()]))
        }

        _ => Ok(None),
    }
}

/// `ensureVarying` (§4.4.2): convert a value to varying by broadcasting
/// (uniform) or by `broadcast + iota` (contiguous). Emits its helper decls
/// into `extra` rather than returning them separately, so callers can splice
/// them in ahead of the decl that consumes the result.
fn ensure_varying(scope: &mut ScopeStack, atom: &Atom, st: &Stability, width: u32, extra: &mut Vec<Decl>) -> Atom {
    match st {
        Stability::Varying => atom.clone(),
        Stability::Uniform => {
            let name = scope.push(NameColor::Dest, Symbol::intern("vbcast"));
            extra.push(Decl { binder: name, ty: Type::Nat, expr: Expr::Op(Op::VectorBroadcast(Box::new(atom.clone()), width)) });
            Atom::Var(name)
        }
        Stability::Contiguous => {
            let iota_name = scope.push(NameColor::Dest, Symbol::intern("iota"));
            extra.push(Decl { binder: iota_name, ty: Type::Nat, expr: Expr::Op(Op::VectorIota(width)) });
            let bcast_name = scope.push(NameColor::Dest, Symbol::intern("vbcast"));
            extra.push(Decl { binder: bcast_name, ty: Type::Nat, expr: Expr::Op(Op::VectorBroadcast(Box::new(atom.clone()), width)) });
            let sum_name = scope.push(NameColor::Dest, Symbol::intern("vidx"));
            extra.push(Decl {
                binder: sum_name,
                ty: Type::Nat,
                expr: Expr::Op(Op::BinOp(BinOp::IAdd, Box::new(Atom::Var(bcast_name)), Box::new(Atom::Var(iota_name)))),
            });
            Atom::Var(sum_name)
        }
        Stability::Prod(_) => atom.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::BaseType;

    fn fin(n: i64) -> IxType {
        IxType::Fin(Box::new(Atom::Con(Lit::Int(n))))
    }

    /// A `Seq` over `Fin 8` doubling each element via `table[i] + table[i]`
    /// vectorizes at width 4 into two chunks.
    #[test]
    fn doubling_loop_vectorizes_at_width_four() {
        let mut scope = ScopeStack::new();
        let index_binder = scope.push(NameColor::Dest, Symbol::intern("i"));
        let carry_binder = scope.push(NameColor::Dest, Symbol::intern("destProd"));
        let table = scope.push(NameColor::Atom, Symbol::intern("table"));
        let elem = scope.push(NameColor::Atom, Symbol::intern("x"));
        let doubled = scope.push(NameColor::Atom, Symbol::intern("y"));
        let body = Block {
            annotation: None,
            decls: vec![
                Decl {
                    binder: elem,
                    ty: Type::Base(BaseType::Float32),
                    expr: Expr::Op(Op::IndexRef(Box::new(Atom::Var(table)), Box::new(Atom::Var(index_binder)))),
                },
                Decl {
                    binder: doubled,
                    ty: Type::Base(BaseType::Float32),
                    expr: Expr::Op(Op::BinOp(BinOp::FAdd, Box::new(Atom::Var(elem)), Box::new(Atom::Var(elem)))),
                },
            ],
            result: Atom::Var(carry_binder),
        };
        let seq = Hof::Seq {
            dir: loomc_ir::SeqDir::Fwd,
            ix_ty: fin(8),
            index_binder,
            carry_binder,
            carry: Box::new(Atom::unit()),
            body: Box::new(body),
        };

        let outcome = vectorize_seq(&mut scope, &seq, 4).expect("no write conflict");
        match outcome {
            Outcome::Vectorized(Hof::Seq { ix_ty, body, .. }) => {
                assert_eq!(ix_ty, fin(2));
                let has_subref = body.decls.iter().any(|d| matches!(d.expr, Expr::Op(Op::VectorSubref(..))));
                assert!(has_subref, "IndexRef over a contiguous index should become VectorSubref");
            }
            other => panic!("expected vectorized Seq, got {other:?}"),
        }
    }

    /// A bound that is not a multiple of the width refuses rather than
    /// erroring.
    #[test]
    fn non_multiple_bound_refuses() {
        let mut scope = ScopeStack::new();
        let index_binder = scope.push(NameColor::Dest, Symbol::intern("i"));
        let carry_binder = scope.push(NameColor::Dest, Symbol::intern("destProd"));
        let seq = Hof::Seq {
            dir: loomc_ir::SeqDir::Fwd,
            ix_ty: fin(7),
            index_binder,
            carry_binder,
            carry: Box::new(Atom::unit()),
            body: Box::new(Block::atom(Atom::Var(carry_binder))),
        };
        let outcome = vectorize_seq(&mut scope, &seq, 4).unwrap();
        assert!(matches!(outcome, Outcome::Refused { .. }));
    }

    /// A loop body nesting another `for`-derived effect (here a `RunIo`)
    /// refuses per §4.4.3's effect whitelist.
    #[test]
    fn body_with_a_non_init_effect_refuses() {
        let mut scope = ScopeStack::new();
        let index_binder = scope.push(NameColor::Dest, Symbol::intern("i"));
        let carry_binder = scope.push(NameColor::Dest, Symbol::intern("destProd"));
        let io_result = scope.push(NameColor::Atom, Symbol::intern("r"));
        let body = Block {
            annotation: None,
            decls: vec![Decl { binder: io_result, ty: Type::Unit, expr: Expr::Hof(Hof::RunIo(Box::new(Block::atom(Atom::unit())))) }],
            result: Atom::Var(carry_binder),
        };
        let seq = Hof::Seq {
            dir: loomc_ir::SeqDir::Fwd,
            ix_ty: fin(4),
            index_binder,
            carry_binder,
            carry: Box::new(Atom::unit()),
            body: Box::new(body),
        };
        let outcome = vectorize_seq(&mut scope, &seq, 4).unwrap();
        assert!(matches!(outcome, Outcome::Refused { .. }));
    }

    /// Placing a varying value through a uniform pointer is a hard write
    /// conflict, not a refusal.
    #[test]
    fn write_conflict_through_a_uniform_pointer_is_a_hard_error() {
        let mut scope = ScopeStack::new();
        let index_binder = scope.push(NameColor::Dest, Symbol::intern("i"));
        let carry_binder = scope.push(NameColor::Dest, Symbol::intern("destProd"));
        let ptr = scope.push(NameColor::Dest, Symbol::intern("p"));
        let varying_src = scope.push(NameColor::Atom, Symbol::intern("v"));
        let placed = scope.push(NameColor::Dest, Symbol::intern("_"));
        let body = Block {
            annotation: None,
            decls: vec![
                Decl {
                    binder: varying_src,
                    ty: Type::Base(BaseType::Float32),
                    expr: Expr::Op(Op::IndexRef(Box::new(Atom::Var(ptr)), Box::new(Atom::Var(index_binder)))),
                },
                Decl {
                    binder: placed,
                    ty: Type::Unit,
                    expr: Expr::Op(Op::Place(
                        Box::new(Dest::BaseTypeRef { ptr, offset: Atom::unit() }),
                        Box::new(Atom::Var(varying_src)),
                    )),
                },
            ],
            result: Atom::Var(carry_binder),
        };
        let seq = Hof::Seq {
            dir: loomc_ir::SeqDir::Fwd,
            ix_ty: fin(4),
            index_binder,
            carry_binder,
            carry: Box::new(Atom::unit()),
            body: Box::new(body),
        };
        let err = vectorize_seq(&mut scope, &seq, 4).unwrap_err();
        assert!(matches!(err, VectorizeError::WriteConflict { .. }));
    }
}
