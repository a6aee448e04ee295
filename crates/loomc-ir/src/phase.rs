//! Phase tagging for the two syntactically-shared IRs (§3.2). Rather than a
//! phantom type parameter threaded through every node (the GADT-style
//! encoding the source material uses), each phase-sensitive node carries a
//! plain runtime [`Phase`] discriminant and a `validate` routine that is run
//! in debug assertions at the injection points between passes. This is the
//! "sum type with a runtime discriminant" resolution from the design notes.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Post-inference, post-simplification: `for`, table lambdas, effect
    /// rows, lambdas with arrows, dictionaries are all legal.
    Core,
    /// Same grammar as `Core`; kept distinct so a future simplifier pass can
    /// narrow what's legal without a new type.
    Simp,
    /// Post-lowering: `for` has been replaced by `Seq`; `AllocDest`,
    /// `Place`, `Freeze`, `RememberDest`, boxed references and atomic Imp
    /// variables become legal, and `for`/`TabCon` are no longer produced
    /// (though see [`Phase::allows_for`] — a few transitional decls may
    /// still carry one mid-lowering).
    SimpToImp,
}

impl Phase {
    pub fn allows_for(self) -> bool {
        matches!(self, Phase::Core | Phase::Simp)
    }

    pub fn allows_dest_ops(self) -> bool {
        matches!(self, Phase::SimpToImp)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Core => "core",
            Phase::Simp => "simp",
            Phase::SimpToImp => "simp-to-imp",
        };
        write!(f, "{s}")
    }
}

/// A value that is only meaningful in certain phases validates itself
/// against the phase it claims to inhabit. Callers at pass boundaries
/// (Core→Simp, Simp→SimpToImp) call this under `debug_assert!` so a
/// release build pays nothing for the check.
pub trait PhaseChecked {
    fn is_legal_in(&self, phase: Phase) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_and_simp_allow_for() {
        assert!(Phase::Core.allows_for());
        assert!(Phase::Simp.allows_for());
        assert!(!Phase::SimpToImp.allows_for());
    }

    #[test]
    fn only_simp_to_imp_allows_dest_ops() {
        assert!(Phase::SimpToImp.allows_dest_ops());
        assert!(!Phase::Core.allows_dest_ops());
    }
}
