//! Built-in compilation units for the CLI and the golden end-to-end tests
//! (§8 S1–S6). This core takes an already-typed, already-simplified block
//! as input (§1 Non-goals: no parser), so rather than reading source text
//! the driver ships the scenarios themselves, built directly against
//! `loomc_ir`'s constructors — the same way `loomc-lower`'s and
//! `loomc-vectorize`'s own unit tests build their fixtures.

use loomc_ir::{Atom, BaseType, Block, BlockAnnotation, Decl, Expr, Hof, IxType, Lit, Op, Type};
use loomc_util::{NameColor, ScopeStack};

fn fin(n: i64) -> IxType {
    IxType::Fin(Box::new(Atom::Con(Lit::Int(n))))
}

/// S1: `for i:(Fin 4). let x = table[i] in x + x`.
pub fn s1(scope: &mut ScopeStack) -> (Type, Block) {
    let i = scope.push(NameColor::Dest, loomc_util::Symbol::intern("i"));
    let table = scope.push(NameColor::Atom, loomc_util::Symbol::intern("table"));
    let x = scope.push(NameColor::Atom, loomc_util::Symbol::intern("x"));
    let inner_body = Block {
        annotation: Some(BlockAnnotation { result_ty: Type::Base(BaseType::Float32), effects: Vec::new() }),
        decls: vec![Decl {
            binder: x,
            ty: Type::Base(BaseType::Float32),
            expr: Expr::Op(Op::IndexRef(Box::new(Atom::Var(table)), Box::new(Atom::Var(i)))),
        }],
        result: Atom::Var(x),
    };
    let for_binder = scope.push(NameColor::Atom, loomc_util::Symbol::intern("r"));
    let ans_ty = Type::TabTy(fin(4), Box::new(Type::Base(BaseType::Float32)));
    let outer_block = Block {
        annotation: Some(BlockAnnotation { result_ty: ans_ty.clone(), effects: Vec::new() }),
        decls: vec![Decl {
            binder: for_binder,
            ty: ans_ty.clone(),
            expr: Expr::Hof(Hof::For { binder: i, ix_ty: fin(4), body: Box::new(inner_body) }),
        }],
        result: Atom::Var(for_binder),
    };
    (ans_ty, outer_block)
}

/// S2: `for i:(Fin 10). for j:(Fin 20). f i j` — nested `for`s sharing one
/// destination rather than allocating a per-row scratch buffer.
pub fn s2(scope: &mut ScopeStack) -> (Type, Block) {
    let i = scope.push(NameColor::Dest, loomc_util::Symbol::intern("i"));
    let j = scope.push(NameColor::Dest, loomc_util::Symbol::intern("j"));
    let f = scope.push(NameColor::Atom, loomc_util::Symbol::intern("f"));
    let call_result = scope.push(NameColor::Atom, loomc_util::Symbol::intern("call"));
    let inner_inner = Block {
        annotation: Some(BlockAnnotation { result_ty: Type::Base(BaseType::Int32), effects: Vec::new() }),
        decls: vec![Decl {
            binder: call_result,
            ty: Type::Base(BaseType::Int32),
            expr: Expr::App(Box::new(Atom::Var(f)), vec![Atom::Var(i), Atom::Var(j)]),
        }],
        result: Atom::Var(call_result),
    };
    let inner_for_binder = scope.push(NameColor::Atom, loomc_util::Symbol::intern("row"));
    let inner_block = Block {
        annotation: Some(BlockAnnotation { result_ty: Type::TabTy(fin(20), Box::new(Type::Base(BaseType::Int32))), effects: Vec::new() }),
        decls: vec![Decl {
            binder: inner_for_binder,
            ty: Type::TabTy(fin(20), Box::new(Type::Base(BaseType::Int32))),
            expr: Expr::Hof(Hof::For { binder: j, ix_ty: fin(20), body: Box::new(inner_inner) }),
        }],
        result: Atom::Var(inner_for_binder),
    };
    let ans_ty = Type::TabTy(fin(10), Box::new(Type::TabTy(fin(20), Box::new(Type::Base(BaseType::Int32)))));
    let outer_for_binder = scope.push(NameColor::Atom, loomc_util::Symbol::intern("grid"));
    let outer_block = Block {
        annotation: Some(BlockAnnotation { result_ty: ans_ty.clone(), effects: Vec::new() }),
        decls: vec![Decl {
            binder: outer_for_binder,
            ty: ans_ty.clone(),
            expr: Expr::Hof(Hof::For { binder: i, ix_ty: fin(10), body: Box::new(inner_block) }),
        }],
        result: Atom::Var(outer_for_binder),
    };
    (ans_ty, outer_block)
}

/// S3: `for i:(Fin 4). (i, fin-table[i])` — each element of the result
/// table is itself a dep-pair, so the per-element destination splits into
/// a left leaf (the index) and a right leaf (the payload) rather than one
/// flat `BaseTypeRef`.
pub fn s3(scope: &mut ScopeStack) -> (Type, Block) {
    let i = scope.push(NameColor::Dest, loomc_util::Symbol::intern("i"));
    let table = scope.push(NameColor::Atom, loomc_util::Symbol::intern("fin_table"));
    let elem = scope.push(NameColor::Atom, loomc_util::Symbol::intern("elem"));
    let pair = scope.push(NameColor::Atom, loomc_util::Symbol::intern("pair"));

    let pair_ty = Type::DepPairTy { left_binder: i, left_ty: Box::new(Type::Fin(Box::new(Atom::Con(Lit::Int(4))))), right_ty: Box::new(Type::Base(BaseType::Float32)) };
    let inner_body = Block {
        annotation: Some(BlockAnnotation { result_ty: pair_ty.clone(), effects: Vec::new() }),
        decls: vec![
            Decl {
                binder: elem,
                ty: Type::Base(BaseType::Float32),
                expr: Expr::Op(Op::IndexRef(Box::new(Atom::Var(table)), Box::new(Atom::Var(i)))),
            },
            Decl {
                binder: pair,
                ty: pair_ty.clone(),
                expr: Expr::Atom(Atom::DepPair { left: Box::new(Atom::Var(i)), right: Box::new(Atom::Var(elem)), pair_ty: Box::new(pair_ty.clone()) }),
            },
        ],
        result: Atom::Var(pair),
    };
    let for_binder = scope.push(NameColor::Atom, loomc_util::Symbol::intern("r"));
    let ans_ty = Type::TabTy(fin(4), Box::new(pair_ty));
    let outer_block = Block {
        annotation: Some(BlockAnnotation { result_ty: ans_ty.clone(), effects: Vec::new() }),
        decls: vec![Decl {
            binder: for_binder,
            ty: ans_ty.clone(),
            expr: Expr::Hof(Hof::For { binder: i, ix_ty: fin(4), body: Box::new(inner_body) }),
        }],
        result: Atom::Var(for_binder),
    };
    (ans_ty, outer_block)
}

/// S4: `Seq Fwd (IxFin 16) d (λ(i,d). table[i] + table[i])` — a
/// width-4-vectorizable doubling loop, built directly as a `Hof::Seq`
/// (loop lowering has already run by the time vectorization sees this
/// shape, so this scenario starts one stage later than S1/S2).
pub fn s4(scope: &mut ScopeStack) -> Hof {
    let index_binder = scope.push(NameColor::Dest, loomc_util::Symbol::intern("i"));
    let carry_binder = scope.push(NameColor::Dest, loomc_util::Symbol::intern("destProd"));
    let table = scope.push(NameColor::Atom, loomc_util::Symbol::intern("table"));
    let elem = scope.push(NameColor::Atom, loomc_util::Symbol::intern("x"));
    let doubled = scope.push(NameColor::Atom, loomc_util::Symbol::intern("y"));
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
                expr: Expr::Op(Op::BinOp(loomc_ir::BinOp::FAdd, Box::new(Atom::Var(elem)), Box::new(Atom::Var(elem)))),
            },
        ],
        result: Atom::Var(carry_binder),
    };
    Hof::Seq {
        dir: loomc_ir::SeqDir::Fwd,
        ix_ty: fin(16),
        index_binder,
        carry_binder,
        carry: Box::new(Atom::unit()),
        body: Box::new(body),
    }
}
