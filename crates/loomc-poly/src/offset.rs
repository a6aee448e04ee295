//! `computeOffset` and `elemCountPoly` (§4.1). Both are pure with respect to
//! the index structure but need to *emit* decls for the arithmetic they
//! describe — a multiplication, an `ordinal` call, occasionally a runtime
//! summation loop for a dependent suffix. Rather than coupling this crate
//! to the full builder (`loomc-lower`), callers inject an [`OffsetEmitter`]
//! that knows how to turn each algebraic step into IR.

use crate::error::{PolyError, PolyResult};
use crate::structure::{split, IndexBinder, IndexStructure};
use loomc_ir::{Atom, IxType};

/// The primitive operations the algebra needs from whatever builder is
/// assembling the surrounding block. Each method both emits whatever decls
/// are necessary and returns the atom naming the result — mirroring how the
/// real builder's `emitDecl` works (§4.6).
pub trait OffsetEmitter {
    fn lit_u32(&mut self, n: u32) -> Atom;
    fn mul(&mut self, a: Atom, b: Atom) -> Atom;
    fn add(&mut self, a: Atom, b: Atom) -> Atom;
    /// `ordinal(ix_ty, value)` — the dense 0-based position of `value`
    /// within `ix_ty`.
    fn ordinal(&mut self, ix_ty: &IxType, value: &Atom) -> Atom;
    /// `size(ix_ty)` — the element count of `ix_ty` itself (not a nested
    /// table), possibly a runtime value for a dynamically-sized `Fin`.
    fn size(&mut self, ix_ty: &IxType) -> Atom;
    /// Runtime summation fallback for a dependent suffix: `Σ_{k=0}^{n-1}
    /// body(k)`. The real implementation lowers this to a `Seq`/`IFor`
    /// accumulating into a scalar; a closed-form polynomial evaluator could
    /// replace this later without changing the algebra's contract.
    fn sum_over_fin(&mut self, n: Atom, body: &mut dyn FnMut(&mut Self, Atom) -> Atom) -> Atom
    where
        Self: Sized;
}

/// `elemCountPoly`: the number of elements described by `structure`.
/// Edge case: an empty structure has exactly one "element" (the unit
/// index), matching `computeOffset`'s empty-structure-offset-0 edge case
/// one level up (a size of a trivial index is 1, not 0).
pub fn elem_count_poly<E: OffsetEmitter>(emitter: &mut E, structure: &IndexStructure) -> Atom {
    let (prefix, suffix) = split(structure);
    let prefix_product = product_of_sizes(emitter, prefix);
    if suffix.is_empty() {
        return prefix_product;
    }
    let first = &suffix[0];
    let rest = IndexStructure { binders: suffix[1..].to_vec() };
    let n = emitter.size(&first.ix_ty);
    let suffix_count = emitter.sum_over_fin(n, &mut |emitter, _i| elem_count_poly(emitter, &rest));
    emitter.mul(prefix_product, suffix_count)
}

fn product_of_sizes<E: OffsetEmitter>(emitter: &mut E, dims: &[IndexBinder]) -> Atom {
    let mut acc = emitter.lit_u32(1);
    for b in dims {
        let sz = emitter.size(&b.ix_ty);
        acc = emitter.mul(acc, sz);
    }
    acc
}

/// `computeOffset(indexStructure, indices)` (§4.1 contract). `indices` must
/// have one atom per binder in `structure`, in order.
///
/// Implements the non-dependent case directly via a right-to-left stride
/// fold, which is what gives optimization O1 for free: the fold only ever
/// multiplies by `size(dims[k])` for `k >= 1`, so `size(dims[0])` — "the
/// first prefix size, which is never used" — is never computed. A
/// dependent suffix (if `structure` has one) is reduced to the same fold
/// plus a runtime-summed stride contributed by `elem_count_poly`.
pub fn compute_offset<E: OffsetEmitter>(
    emitter: &mut E,
    structure: &IndexStructure,
    indices: &[Atom],
) -> PolyResult<Atom> {
    if structure.binders.len() != indices.len() {
        return Err(PolyError::ArityMismatch { binders: structure.binders.len(), indices: indices.len() });
    }
    if structure.is_empty() {
        return Ok(emitter.lit_u32(0));
    }
    let (prefix, suffix) = split(structure);
    let prefix_indices = &indices[..prefix.len()];
    let suffix_indices = &indices[prefix.len()..];

    let suffix_contribution = if suffix.is_empty() {
        None
    } else {
        let rest = IndexStructure { binders: suffix[1..].to_vec() };
        let inner_offset = compute_offset(emitter, &rest, &suffix_indices[1..])?;
        // Offset within one "row" of the dependent dimension, plus the
        // number of elements consumed by all prior rows (one
        // `elem_count_poly(rest)` per row before this one's ordinal).
        let first = &suffix[0];
        let first_ordinal = emitter.ordinal(&first.ix_ty, &suffix_indices[0]);
        let rows_before = emitter.sum_over_fin(first_ordinal, &mut |emitter, _k| elem_count_poly(emitter, &rest));
        Some(emitter.add(rows_before, inner_offset))
    };

    // Right-to-left stride fold over the non-dependent prefix (O1: never
    // computes size(prefix[0])).
    let mut stride = emitter.lit_u32(1);
    let mut acc = emitter.lit_u32(0);
    for k in (0..prefix.len()).rev() {
        let ord = emitter.ordinal(&prefix[k].ix_ty, &prefix_indices[k]);
        let term = emitter.mul(ord, stride.clone());
        acc = emitter.add(acc, term);
        if k != 0 {
            let sz = emitter.size(&prefix[k].ix_ty);
            stride = emitter.mul(stride, sz);
        }
    }

    Ok(match suffix_contribution {
        Some(contribution) => {
            // The dependent suffix occupies the innermost (fastest-varying)
            // position: the prefix's offset must be scaled by the total
            // element count of one full suffix traversal.
            let suffix_total = elem_count_poly(emitter, &IndexStructure { binders: suffix.to_vec() });
            let scaled_prefix = emitter.mul(acc, suffix_total);
            emitter.add(scaled_prefix, contribution)
        }
        None => acc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomc_ir::Lit;

    /// A trivial emitter that evaluates everything eagerly against literal
    /// `u32`s instead of building IR — enough to exercise the algebra's
    /// arithmetic without a real builder.
    struct EvalEmitter;

    fn as_u32(a: &Atom) -> u32 {
        match a {
            Atom::Con(Lit::Int(n)) => *n as u32,
            _ => panic!("EvalEmitter only handles literal atoms"),
        }
    }

    impl OffsetEmitter for EvalEmitter {
        fn lit_u32(&mut self, n: u32) -> Atom {
            Atom::Con(Lit::Int(n as i64))
        }
        fn mul(&mut self, a: Atom, b: Atom) -> Atom {
            self.lit_u32(as_u32(&a) * as_u32(&b))
        }
        fn add(&mut self, a: Atom, b: Atom) -> Atom {
            self.lit_u32(as_u32(&a) + as_u32(&b))
        }
        fn ordinal(&mut self, _ix_ty: &IxType, value: &Atom) -> Atom {
            value.clone()
        }
        fn size(&mut self, ix_ty: &IxType) -> Atom {
            match ix_ty {
                IxType::Fin(n) => (**n).clone(),
                IxType::Dict { .. } => panic!("EvalEmitter only handles Fin"),
            }
        }
        fn sum_over_fin(&mut self, n: Atom, body: &mut dyn FnMut(&mut Self, Atom) -> Atom) -> Atom {
            let n = as_u32(&n);
            let mut total = 0u32;
            for k in 0..n {
                let k_lit = self.lit_u32(k);
                total += as_u32(&body(self, k_lit));
            }
            self.lit_u32(total)
        }
    }

    fn fin(n: u32) -> IxType {
        IxType::Fin(Box::new(Atom::Con(Lit::Int(n as i64))))
    }

    fn idx(n: u32) -> Atom {
        Atom::Con(Lit::Int(n as i64))
    }

    fn structure(dims: &[u32], names: &mut loomc_util::ScopeStack) -> IndexStructure {
        let mut s = IndexStructure::empty();
        for (i, &d) in dims.iter().enumerate() {
            let name = names.push(loomc_util::NameColor::Atom, loomc_util::Symbol::intern(&format!("i{i}")));
            s.push(name, fin(d));
        }
        s
    }

    #[test]
    fn empty_structure_offsets_to_zero() {
        let mut e = EvalEmitter;
        let s = IndexStructure::empty();
        let offset = compute_offset(&mut e, &s, &[]).unwrap();
        assert_eq!(as_u32(&offset), 0);
    }

    #[test]
    fn single_dimension_offset_is_just_the_ordinal() {
        let mut e = EvalEmitter;
        let mut stack = loomc_util::ScopeStack::new();
        let s = structure(&[7], &mut stack);
        let offset = compute_offset(&mut e, &s, &[idx(4)]).unwrap();
        assert_eq!(as_u32(&offset), 4);
    }

    /// S6: dims [3, 5, 7], indices [2, 1, 4] => offset 2*35 + 1*7 + 4 = 81.
    #[test]
    fn scenario_s6_offset_literal_example() {
        let mut e = EvalEmitter;
        let mut stack = loomc_util::ScopeStack::new();
        let s = structure(&[3, 5, 7], &mut stack);
        let offset = compute_offset(&mut e, &s, &[idx(2), idx(1), idx(4)]).unwrap();
        assert_eq!(as_u32(&offset), 81);
    }

    #[test]
    fn mismatched_index_count_errs_instead_of_panicking() {
        let mut e = EvalEmitter;
        let mut stack = loomc_util::ScopeStack::new();
        let s = structure(&[3, 5], &mut stack);
        let err = compute_offset(&mut e, &s, &[idx(1)]).unwrap_err();
        assert_eq!(err, PolyError::ArityMismatch { binders: 2, indices: 1 });
    }

    /// P4: for non-dependent dims [d0..dk-1] and indices [i0..ik-1],
    /// computeOffset = i0*prod(d[1..]) + i1*prod(d[2..]) + ... + i[k-1].
    #[quickcheck_macros::quickcheck]
    fn prop_p4_offset_round_trip(dims: Vec<u8>, seed: u8) -> quickcheck::TestResult {
        let dims: Vec<u32> = dims.into_iter().map(|d| (d as u32) % 6 + 1).take(4).collect();
        if dims.is_empty() {
            return quickcheck::TestResult::discard();
        }
        let indices: Vec<u32> = dims.iter().enumerate().map(|(k, &d)| (seed as u32 + k as u32) % d).collect();
        let mut stack = loomc_util::ScopeStack::new();
        let s = structure(&dims, &mut stack);
        let atoms: Vec<Atom> = indices.iter().map(|&i| idx(i)).collect();
        let mut e = EvalEmitter;
        let got = as_u32(&compute_offset(&mut e, &s, &atoms).unwrap());

        let mut expected = 0u32;
        for k in 0..dims.len() {
            let stride: u32 = dims[k + 1..].iter().product();
            expected += indices[k] * stride;
        }
        quickcheck::TestResult::from_bool(got == expected)
    }
}
