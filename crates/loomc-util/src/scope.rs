//! Name & scope kernel (§3.1): de Bruijn-plus-name binders, tagged with a
//! "color" namespace so that, e.g., an atom-level binder and an Imp-level
//! binder can never be confused even if both happen to carry the scope
//! index `3`.
//!
//! Invariants enforced here (checked by [`ScopeStack::push`] and
//! [`ScopeStack::resolve`], not merely documented):
//! - **I1**: no two binders live in the same scope with the same
//!   `(color, hint)` pair.
//! - **I2**: every [`Name`] resolved against a [`ScopeStack`] must name a
//!   binder still on the stack (free variables are rejected, not silently
//!   treated as global).
//! - **I3** (substitution preserves alpha-equivalence) is a property of the
//!   lowering/vectorization passes that use this module, not of the module
//!   itself; see the property tests in `loomc-lower`.

use crate::symbol::Symbol;
use std::fmt;

/// Namespace discriminant for a [`Name`]. Two binders with the same index
/// but different colors never compare equal — this is what lets, e.g., an
/// atom binder shadow nothing in the Imp pointer namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NameColor {
    /// Ordinary value-level atom binder (`for i. ...`, `let x = ...`).
    Atom,
    /// Type-level binder (`Fin n`, dependent pair index variable).
    Type,
    /// Destination binder introduced by destination synthesis.
    Dest,
    /// Imp-level pointer or scalar variable.
    Imp,
    /// Specialization-dictionary binder (never resolved by this crate;
    /// carried through so IR built elsewhere round-trips).
    SpecDict,
}

/// A unique identity for one binding occurrence, scoped by [`NameColor`].
/// `scope` is a generation counter handed out by [`ScopeStack::push`]; it is
/// *not* a depth, so names remain valid identities even as the stack is
/// popped and pushed around them (unlike raw de Bruijn indices).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    color: NameColor,
    scope: ScopeId,
    hint: Symbol,
}

impl Name {
    pub fn color(&self) -> NameColor {
        self.color
    }

    pub fn hint(&self) -> Symbol {
        self.hint
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:?}@{}", self.hint, self.color, self.scope.0)
    }
}

/// Opaque generation counter minted by [`ScopeStack::push`]. Two binders
/// pushed at different times never share a `ScopeId`, even if the stack
/// depth happens to coincide, so a stale [`Name`] captured before a pop is
/// never mistaken for one pushed after.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u32);

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

/// A single bound variable, as it appears in a binder position (`for i. ..`,
/// a destination's pointer binder, an Imp `IFor` loop variable).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binder {
    pub name: Name,
}

impl Binder {
    pub fn hint(&self) -> Symbol {
        self.name.hint()
    }
}

/// A telescope of items where each may depend on the ones before it — used
/// both for plain [`Binder`] sequences and, by downstream crates, for
/// sequences of richer binder-carrying items (decl lists, destination
/// pointer lists). Generic over the item type `T` rather than fixed to
/// `Binder` so `loomc-ir`'s `Decl` and `loomc-ir`'s `PointerBinder` can
/// reuse the same telescope shape instead of redefining it.
#[derive(Clone, Debug, PartialEq)]
pub struct Nest<T = Binder> {
    items: Vec<T>,
}

impl<T> Nest<T> {
    pub fn empty() -> Self {
        Nest { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T> Default for Nest<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> FromIterator<T> for Nest<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Nest { items: iter.into_iter().collect() }
    }
}

impl Nest<Binder> {
    pub fn binders(&self) -> &[Binder] {
        &self.items
    }
}

/// A telescope of items known *not* to depend on one another — the common
/// case for a `ProdCon`'s field binders or a `TabRef`'s parallel element
/// destinations. Distinguished from [`Nest`] at the type level so passes
/// that assume independence (and may, e.g., process fields in any order or
/// in parallel) get a compile-time signal when that assumption would be
/// violated.
#[derive(Clone, Debug)]
pub struct NonDepNest<T = Binder> {
    items: Vec<T>,
}

impl<T> NonDepNest<T> {
    pub fn empty() -> Self {
        NonDepNest { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for NonDepNest<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl NonDepNest<Binder> {
    pub fn binders(&self) -> &[Binder] {
        &self.items
    }
}

/// Tracks which binders are currently in scope, for deshadowing checks and
/// free-variable resolution (I1/I2). One stack per color namespace is
/// reasonable; this type holds all colors together since most passes need
/// to answer "is this name in scope at all" regardless of color.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Vec<Name>>,
    next_scope: u32,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { frames: vec![Vec::new()], next_scope: 0 }
    }

    /// Opens a new lexical frame (entering a `for`, a `case` arm, a block).
    pub fn enter(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Closes the innermost lexical frame.
    pub fn exit(&mut self) {
        self.frames.pop();
        assert!(!self.frames.is_empty(), "exit() popped the root scope");
    }

    /// Binds `hint` under `color` in the current frame, returning the fresh
    /// [`Name`]. Panics on an I1 violation (duplicate `(color, hint)` in the
    /// same frame) — this is a compiler-internal invariant, never triggered
    /// by user input at this layer since deshadowing already ran upstream.
    pub fn push(&mut self, color: NameColor, hint: Symbol) -> Name {
        let frame = self.frames.last_mut().expect("no open scope frame");
        assert!(
            !frame.iter().any(|n| n.color == color && n.hint == hint),
            "duplicate binder {hint:?} of color {color:?} in the same scope (I1)"
        );
        let scope = ScopeId(self.next_scope);
        self.next_scope += 1;
        let name = Name { color, scope, hint };
        frame.push(name);
        name
    }

    /// I2: is `name` visible from the current position (bound by some
    /// still-open frame)? Used to validate that lowered blocks reference
    /// only names bound in an enclosing scope.
    pub fn is_in_scope(&self, name: Name) -> bool {
        self.frames.iter().any(|frame| frame.contains(&name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
