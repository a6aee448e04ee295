//! Scoped emission for Imp translation (§4.5/§4.6), mirroring
//! `loomc-lower::Builder`'s exact shape (a [`ScopeStack`] plus a stack of
//! decl buffers) but emitting [`ImpDecl`]/[`ImpInstr`] instead of `Decl`/
//! `Expr`. Implementing `loomc_poly::OffsetEmitter` and
//! `loomc_dest::DestBuilder` here lets Imp translation reuse `make_dest`
//! directly — e.g. to synthesize a scratch join-point destination for
//! `emitSwitch` — rather than re-deriving destination synthesis at this
//! lower level.
//!
//! Unlike the dest-passing builder, this one is imperative: `sum_over_fin`'s
//! dependent-suffix fallback cannot fold into a pure `Hof::Seq` carry here
//! (Imp has no such construct), so it allocates a scratch scalar on the
//! stack and threads the accumulation through `Load`/`Store` inside an
//! `IFor`.

use loomc_dest::{DestBuilder, DestError};
use loomc_ir::{Atom, BaseType, BinOp, IxMethod, IxType, Lit, SeqDir, Type, TypeDefId};
use loomc_poly::OffsetEmitter;
use loomc_util::{FxHashMap, LazyMap, Name, NameColor, ScopeStack, Symbol};

use crate::imp::{AddressSpace, IBinder, IType, ImpBlock, ImpDecl, ImpInstr, ImpPrimOp};

pub struct ImpBuilder {
    scope: ScopeStack,
    frames: Vec<Vec<ImpDecl>>,
    /// Mirrors `loomc-lower::Builder`'s `type_registry`: `resolveTypeCon`
    /// needs the high-level representation type, not an Imp-level one, since
    /// `make_dest` itself still operates on `loomc_ir::Type`.
    type_registry: FxHashMap<TypeDefId, Type>,
    /// `(AddressSpace, BaseType) -> IType` pointer-layout memoization (§5,
    /// §9 design note): every pointer allocation for the same leaf base
    /// type and address space produces an identical `IType::PtrType`, and
    /// a compilation unit with many table-of-scalar destinations allocates
    /// the same pair repeatedly.
    pointer_layout_cache: LazyMap<(AddressSpace, BaseType), IType>,
    /// Recovers the leaf base type a `BaseTypeRef` pointer was allocated
    /// for, populated by `note_pointer_alloc` at the moment `make_dest`
    /// mints the pointer. `translate::ptr_at` needs this to compute the
    /// right element stride; without it every address is a guess.
    pointer_base_types: FxHashMap<Name, BaseType>,
}

impl Default for ImpBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpBuilder {
    pub fn new() -> Self {
        ImpBuilder {
            scope: ScopeStack::new(),
            frames: vec![Vec::new()],
            type_registry: FxHashMap::default(),
            pointer_layout_cache: LazyMap::new(),
            pointer_base_types: FxHashMap::default(),
        }
    }

    /// The base type `ptr` was allocated for, as recorded by
    /// `note_pointer_alloc`. `None` means `ptr` never went through
    /// destination synthesis (a bug in the caller, not a recoverable case).
    pub fn base_ty_of(&self, ptr: Name) -> Option<BaseType> {
        self.pointer_base_types.get(&ptr).copied()
    }

    /// Looks up (or computes and caches) the `IType` for a pointer into
    /// `base_ty` living in `space`.
    pub fn pointer_layout(&self, space: AddressSpace, base_ty: BaseType) -> IType {
        self.pointer_layout_cache.get_or_insert_with((space, base_ty), || IType::ptr(space, IType::Scalar(base_ty)))
    }

    pub fn register_type_con(&mut self, id: TypeDefId, repr: Type) {
        self.type_registry.insert(id, repr);
    }

    /// Appends a decl binding zero or more `IBinder`s to one instruction.
    pub fn emit(&mut self, binders: Vec<IBinder>, instr: ImpInstr) {
        self.frames.last_mut().expect("imp builder frame stack is never empty").push(ImpDecl { binders, instr });
    }

    /// The common case: one fresh scalar binder bound to one instruction.
    pub fn emit_one(&mut self, ty: IType, hint: &str, instr: ImpInstr) -> Atom {
        let name = self.scope.push(NameColor::Imp, Symbol::intern(hint));
        self.emit(vec![IBinder { name, ty }], instr);
        Atom::Var(name)
    }

    pub fn fresh_binder(&mut self, hint: &str) -> Name {
        self.scope.push(NameColor::Imp, Symbol::intern(hint))
    }

    pub fn is_in_scope(&self, name: Name) -> bool {
        self.scope.is_in_scope(name)
    }

    pub fn build_scoped(&mut self, f: impl FnOnce(&mut Self) -> Vec<Atom>) -> ImpBlock {
        self.scope.enter();
        self.frames.push(Vec::new());
        let results = f(self);
        let decls = self.frames.pop().expect("pushed frame above");
        self.scope.exit();
        ImpBlock { decls, results }
    }

    /// Split form of `build_scoped` for callers (`crate::translate`) whose
    /// closure is fallible: the frame is always popped via `exit_frame`
    /// before the `Result` is inspected, so a mid-block translation error
    /// never leaves a stray frame on the stack.
    pub fn enter_frame(&mut self) {
        self.scope.enter();
        self.frames.push(Vec::new());
    }

    pub fn exit_frame(&mut self) -> Vec<ImpDecl> {
        let decls = self.frames.pop().expect("pushed frame above");
        self.scope.exit();
        decls
    }

    /// Stack-allocates one scalar of `base_ty` and returns the pointer atom.
    /// Used only for this builder's own bookkeeping (the `sum_over_fin`
    /// scratch accumulator) — dest-synthesized pointers are recorded via
    /// `note_pointer_alloc` instead, since `translate::ptr_at` needs to
    /// recover their base type later.
    pub fn alloc_scalar(&mut self, base_ty: BaseType) -> Atom {
        let ty = IType::ptr(AddressSpace::Stack, IType::Scalar(base_ty));
        self.emit_one(
            ty.clone(),
            "scratch",
            ImpInstr::Alloc { space: AddressSpace::Stack, ty, size: Atom::unit() },
        )
    }

    pub fn load(&mut self, ptr: Atom) -> Atom {
        self.emit_one(IType::Scalar(BaseType::Int64), "ld", ImpInstr::Load { ptr })
    }

    pub fn store(&mut self, ptr: Atom, val: Atom) {
        self.emit(vec![], ImpInstr::Store { ptr, val });
    }
}

impl OffsetEmitter for ImpBuilder {
    fn lit_u32(&mut self, n: u32) -> Atom {
        Atom::Con(Lit::Int(n as i64))
    }

    fn mul(&mut self, a: Atom, b: Atom) -> Atom {
        self.emit_one(
            IType::Scalar(BaseType::Int64),
            "off",
            ImpInstr::IPrimOp(ImpPrimOp::BinOp(BinOp::IMul, a, b)),
        )
    }

    fn add(&mut self, a: Atom, b: Atom) -> Atom {
        self.emit_one(
            IType::Scalar(BaseType::Int64),
            "off",
            ImpInstr::IPrimOp(ImpPrimOp::BinOp(BinOp::IAdd, a, b)),
        )
    }

    fn ordinal(&mut self, ix_ty: &IxType, value: &Atom) -> Atom {
        self.emit_one(
            IType::Scalar(BaseType::Int32),
            "ord",
            ImpInstr::IPrimOp(ImpPrimOp::IxMethod(IxMethod::Ordinal, Box::new(ix_ty.clone()), vec![value.clone()])),
        )
    }

    fn size(&mut self, ix_ty: &IxType) -> Atom {
        self.emit_one(
            IType::Scalar(BaseType::Int32),
            "size",
            ImpInstr::IPrimOp(ImpPrimOp::IxMethod(IxMethod::Size, Box::new(ix_ty.clone()), vec![])),
        )
    }

    /// Imperative dependent-suffix fallback: a scratch scalar accumulator,
    /// zeroed before an `IFor` that loads, folds in `body`'s contribution,
    /// and stores back each iteration.
    fn sum_over_fin(&mut self, n: Atom, body: &mut dyn FnMut(&mut Self, Atom) -> Atom) -> Atom {
        let acc_ptr = self.alloc_scalar(BaseType::Int64);
        self.store(acc_ptr.clone(), Atom::Con(Lit::Int(0)));
        let index_binder = self.fresh_binder("k");
        let loop_body = self.build_scoped(|b| {
            let contribution = body(b, Atom::Var(index_binder));
            let current = b.load(acc_ptr.clone());
            let updated = b.add(current, contribution);
            b.store(acc_ptr.clone(), updated);
            vec![]
        });
        self.emit(vec![], ImpInstr::IFor { dir: SeqDir::Fwd, size: n, binder: index_binder, body: Box::new(loop_body) });
        self.load(acc_ptr)
    }
}

impl DestBuilder for ImpBuilder {
    fn fresh_name(&mut self, color: NameColor, hint: &str) -> Name {
        self.scope.push(color, Symbol::intern(hint))
    }

    fn resolve_type_con(&self, id: TypeDefId) -> Result<Type, DestError> {
        self.type_registry.get(&id).cloned().ok_or(DestError::UnresolvedTypeCon(id))
    }

    fn note_pointer_alloc(&mut self, name: Name, base_ty: BaseType) {
        self.pointer_base_types.insert(name, base_ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_scoped_captures_every_decl_emitted_inside_the_closure() {
        let mut b = ImpBuilder::new();
        let block = b.build_scoped(|b| {
            let x = b.emit_one(IType::Scalar(BaseType::Int32), "x", ImpInstr::Atom(Atom::Con(Lit::Int(1))));
            vec![x]
        });
        assert_eq!(block.decls.len(), 1);
        assert_eq!(block.results.len(), 1);
    }

    #[test]
    fn decls_emitted_in_an_outer_frame_are_not_visible_to_an_inner_one() {
        let mut b = ImpBuilder::new();
        let outer_block = b.build_scoped(|b| {
            let outer = b.emit_one(IType::Scalar(BaseType::Int32), "outer", ImpInstr::Atom(Atom::Con(Lit::Int(1))));
            let inner_block = b.build_scoped(|_| vec![]);
            assert!(inner_block.decls.is_empty());
            vec![outer]
        });
        assert_eq!(outer_block.decls.len(), 1);
    }

    #[test]
    fn offset_emitter_mul_emits_a_primop_decl_rather_than_folding_constants() {
        let mut b = ImpBuilder::new();
        let block = b.build_scoped(|b| {
            let r = b.mul(Atom::Con(Lit::Int(2)), Atom::Con(Lit::Int(3)));
            vec![r]
        });
        assert_eq!(block.decls.len(), 1);
        assert!(matches!(
            block.decls[0].instr,
            ImpInstr::IPrimOp(ImpPrimOp::BinOp(BinOp::IMul, _, _))
        ));
    }

    #[test]
    fn sum_over_fin_allocates_a_scratch_and_loops_imperatively() {
        let mut b = ImpBuilder::new();
        let block = b.build_scoped(|b| {
            let r = b.sum_over_fin(Atom::Con(Lit::Int(3)), &mut |b, k| b.mul(k, Atom::Con(Lit::Int(2))));
            vec![r]
        });
        // alloc, store(0), IFor, final load => at least 4 decls in the outer frame
        assert!(block.decls.len() >= 4);
        assert!(block.decls.iter().any(|d| matches!(d.instr, ImpInstr::IFor { .. })));
    }
}
