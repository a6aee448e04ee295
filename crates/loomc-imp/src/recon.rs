//! `Recon` (GLOSSARY, §6.2, supplemented feature: the spec names
//! `AtomRecon` but leaves its shape to the implementer). Describes how to
//! reassemble a high-level SimpToImp atom from an `ImpFunction`'s flat
//! scalar return values — a nest of scalar binders plus an atom template
//! referencing them, mirroring how `loomc_ir::dest::AbsPtrs` already pairs
//! a pointer-binder nest with a templated inner destination.

use loomc_ir::Atom;
use loomc_util::Nest;

use crate::imp::IBinder;

#[derive(Clone, Debug, PartialEq)]
pub struct Recon {
    /// The `ImpFunction`'s flat scalar results, in return order.
    pub scalar_binders: Nest<IBinder>,
    /// The high-IR atom to hand back to the caller, built out of
    /// `scalar_binders`' names (and, for a product/sum result, `DataTypeApp`/
    /// `DepPair` wrapping them).
    pub template: Atom,
}

impl Recon {
    /// The common case: one scalar result reconstructs directly as itself.
    pub fn trivial(binder: IBinder) -> Self {
        let template = Atom::Var(binder.name);
        let mut scalar_binders = Nest::empty();
        scalar_binders.push(binder);
        Recon { scalar_binders, template }
    }

    pub fn arity(&self) -> usize {
        self.scalar_binders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::{AddressSpace, Device, IType};
    use loomc_ir::BaseType;
    use loomc_util::{NameColor, ScopeStack, Symbol};

    #[test]
    fn trivial_recon_has_arity_one_and_templates_the_binder_itself() {
        let mut scope = ScopeStack::new();
        let name = scope.push(NameColor::Imp, Symbol::intern("r0"));
        let binder = IBinder { name, ty: IType::ptr(AddressSpace::Heap(Device::Cpu), IType::Scalar(BaseType::Float32)) };
        let recon = Recon::trivial(binder.clone());
        assert_eq!(recon.arity(), 1);
        assert_eq!(recon.template, Atom::Var(name));
    }
}
