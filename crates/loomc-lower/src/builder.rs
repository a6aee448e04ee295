//! Scoped emission (§4.6). A builder extends the ambient [`ScopeStack`] with
//! a stack of decl buffers: `build_scoped` pushes a fresh buffer and scope
//! frame, runs a closure that emits into it via `emit_decl`, and pops both
//! back into a sealed [`Block`]. Grounded on the teacher's `faxc-mir`
//! `Builder` (one mutable struct threading a current emission target through
//! a recursive lowering pass), adapted from a CFG of basic blocks to nested
//! direct-style blocks since this IR has no control-flow graph.

use loomc_dest::{DestBuilder, DestError};
use loomc_ir::{Atom, BaseType, BinOp, Block, BlockAnnotation, Decl, Expr, IxMethod, IxType, Lit, Op, Type, TypeDefId};
use loomc_poly::OffsetEmitter;
use loomc_util::{FxHashMap, Name, NameColor, ScopeStack, Symbol};

pub struct Builder {
    scope: ScopeStack,
    frames: Vec<Vec<Decl>>,
    /// Representation types backing each `TypeCon` — desugaring
    /// class/record/variant definitions into this table happens upstream;
    /// `resolve_type_con` just looks it up (§4.2's `TC (TypeCon …)` case).
    type_registry: FxHashMap<TypeDefId, Type>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder { scope: ScopeStack::new(), frames: vec![Vec::new()], type_registry: FxHashMap::default() }
    }

    pub fn register_type_con(&mut self, id: TypeDefId, repr: Type) {
        self.type_registry.insert(id, repr);
    }

    /// B2 depends on every emission being reachable from the eventual
    /// result; callers build bottom-up so this always holds by construction
    /// rather than needing a post-hoc reachability pass.
    pub fn emit_decl(&mut self, color: NameColor, hint: &str, ty: Type, expr: Expr) -> Name {
        let name = self.scope.push(color, Symbol::intern(hint));
        self.frames.last_mut().expect("builder frame stack is never empty").push(Decl { binder: name, ty, expr });
        name
    }

    /// Appends a decl under a binder that already exists (reused from the
    /// block being rewritten) rather than minting a fresh one — lowering is
    /// a same-scope rewrite, so most decls keep their original binder.
    pub fn emit_named_decl(&mut self, binder: Name, ty: Type, expr: Expr) {
        self.frames.last_mut().expect("builder frame stack is never empty").push(Decl { binder, ty, expr });
    }

    /// `withFreshBinder`: allocate a binder without emitting a decl for it —
    /// used for loop/handler binders whose value comes from the construct
    /// itself (`Seq`'s index, `RunState`'s ref) rather than from a decl RHS.
    pub fn fresh_binder(&mut self, color: NameColor, hint: &str) -> Name {
        self.scope.push(color, Symbol::intern(hint))
    }

    pub fn is_in_scope(&self, name: Name) -> bool {
        self.scope.is_in_scope(name)
    }

    /// Exposes the builder's own `ScopeStack` to a caller that needs to mint
    /// more names into the same scope a finished `DestBlock` was built in —
    /// e.g. a post-hoc rewrite pass over that block's decls. Minting names
    /// from a disconnected `ScopeStack` instead would risk a silent
    /// `Name` collision once the rewrite is spliced back in, since
    /// `ScopeId`s are only unique within one `ScopeStack`.
    pub fn scope_mut(&mut self) -> &mut ScopeStack {
        &mut self.scope
    }

    /// `buildScoped`: run `f` in a fresh emission frame, fold its decls into
    /// an unsealed `Block` (no `BlockAnnotation`).
    pub fn build_scoped(&mut self, f: impl FnOnce(&mut Self) -> Atom) -> Block {
        self.scope.enter();
        self.frames.push(Vec::new());
        let result = f(self);
        let decls = self.frames.pop().expect("pushed frame above");
        self.scope.exit();
        Block { annotation: None, decls, result }
    }

    /// Split form of `build_scoped` for callers whose closure is fallible:
    /// the frame is always popped (and scope exited) before the caller
    /// inspects the result, so a mid-block lowering error never leaves a
    /// stray frame on the stack.
    pub fn enter_scope(&mut self) {
        self.scope.enter();
        self.frames.push(Vec::new());
    }

    pub fn exit_scope(&mut self) -> Vec<Decl> {
        let decls = self.frames.pop().expect("pushed frame above");
        self.scope.exit();
        decls
    }

    /// `buildBlock`: like `build_scoped`, but seals the result into a
    /// `BlockAnnotation` carrying the block's static result type.
    pub fn build_block(&mut self, result_ty: Type, f: impl FnOnce(&mut Self) -> Atom) -> Block {
        let mut block = self.build_scoped(f);
        block.annotation = Some(BlockAnnotation { result_ty, effects: Vec::new() });
        block
    }
}

impl OffsetEmitter for Builder {
    fn lit_u32(&mut self, n: u32) -> Atom {
        Atom::Con(Lit::Int(n as i64))
    }

    fn mul(&mut self, a: Atom, b: Atom) -> Atom {
        let name = self.emit_decl(
            NameColor::Dest,
            "off",
            Type::Base(BaseType::Int64),
            Expr::Op(Op::BinOp(BinOp::IMul, Box::new(a), Box::new(b))),
        );
        Atom::Var(name)
    }

    fn add(&mut self, a: Atom, b: Atom) -> Atom {
        let name = self.emit_decl(
            NameColor::Dest,
            "off",
            Type::Base(BaseType::Int64),
            Expr::Op(Op::BinOp(BinOp::IAdd, Box::new(a), Box::new(b))),
        );
        Atom::Var(name)
    }

    fn ordinal(&mut self, ix_ty: &IxType, value: &Atom) -> Atom {
        let name = self.emit_decl(
            NameColor::Dest,
            "ord",
            Type::Nat,
            Expr::Op(Op::IxMethod(IxMethod::Ordinal, Box::new(ix_ty.clone()), vec![value.clone()])),
        );
        Atom::Var(name)
    }

    fn size(&mut self, ix_ty: &IxType) -> Atom {
        let name = self.emit_decl(
            NameColor::Dest,
            "size",
            Type::Nat,
            Expr::Op(Op::IxMethod(IxMethod::Size, Box::new(ix_ty.clone()), vec![])),
        );
        Atom::Var(name)
    }

    /// The dependent-suffix fallback (documented in `loomc-poly`): rather
    /// than deriving a closed-form polynomial, emit an actual `Seq` fold
    /// over `0..n` accumulating `body`'s result with `IAdd`.
    fn sum_over_fin(&mut self, n: Atom, body: &mut dyn FnMut(&mut Self, Atom) -> Atom) -> Atom {
        let ix_ty = IxType::Fin(Box::new(n));
        let index_binder = self.fresh_binder(NameColor::Imp, "k");
        let carry_binder = self.fresh_binder(NameColor::Dest, "acc");
        let loop_body = self.build_scoped(|b| {
            let contribution = body(b, Atom::Var(index_binder));
            b.add(Atom::Var(carry_binder), contribution)
        });
        let seq_name = self.emit_decl(
            NameColor::Dest,
            "sum",
            Type::Nat,
            Expr::Hof(loomc_ir::Hof::Seq {
                dir: loomc_ir::SeqDir::Fwd,
                ix_ty,
                index_binder,
                carry_binder,
                carry: Box::new(Atom::Con(Lit::Int(0))),
                body: Box::new(loop_body),
            }),
        );
        Atom::Var(seq_name)
    }
}

impl DestBuilder for Builder {
    fn fresh_name(&mut self, color: NameColor, hint: &str) -> Name {
        self.fresh_binder(color, hint)
    }

    fn resolve_type_con(&self, id: TypeDefId) -> Result<Type, DestError> {
        self.type_registry.get(&id).cloned().ok_or(DestError::UnresolvedTypeCon(id))
    }

    fn note_pointer_alloc(&mut self, _name: Name, _base_ty: BaseType) {}
}
