//! `chooseAddrSpace` (§4.5): decide a pointer's address space from its
//! `AllocMode`, the current device, and its size-block.
//!
//! The literal-ness test is deliberate (§9 open question: "`chooseAddrSpace`'s
//! syntactic 256-byte threshold"): only a syntactic integer constant can be
//! proven small at translation time, so a dependent size always heap-
//! allocates even when it would turn out small at runtime. Decided here as
//! written rather than loosened to a runtime check, since Imp translation
//! has no notion of a runtime branch on allocation strategy (§4.5 never
//! emits an `ICond` around an `Alloc`).

use loomc_ir::{AllocMode, Atom, BaseType, Lit};

use crate::imp::{AddressSpace, Device};

/// §4.5: "size ≤ 256 (syntactic integer literal)".
pub const STACK_THRESHOLD_BYTES: u64 = 256;

/// `sizeBlock`'s resolved byte count, when it is knowable without running
/// the program: `None` for an allocation a dependent size, an overflowing
/// literal count, or anything else that isn't a plain `Lit::Int`.
fn literal_size_bytes(base_ty: BaseType, count: Option<&Atom>) -> Option<u64> {
    match count {
        None => Some(base_ty.size_bytes() as u64),
        Some(Atom::Con(Lit::Int(n))) if *n >= 0 => {
            (base_ty.size_bytes() as u64).checked_mul(*n as u64)
        }
        Some(_) => None,
    }
}

pub fn choose_addr_space(
    alloc_mode: AllocMode,
    main_device: Device,
    current_device: Device,
    base_ty: BaseType,
    count: Option<&Atom>,
) -> AddressSpace {
    match alloc_mode {
        AllocMode::Unmanaged => AddressSpace::Heap(main_device),
        AllocMode::Managed => match literal_size_bytes(base_ty, count) {
            Some(bytes) if current_device == main_device && bytes <= STACK_THRESHOLD_BYTES => {
                AddressSpace::Stack
            }
            _ => AddressSpace::Heap(main_device),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmanaged_always_heap_allocates_on_the_main_device() {
        let space = choose_addr_space(AllocMode::Unmanaged, Device::Cpu, Device::Cpu, BaseType::Int32, None);
        assert_eq!(space, AddressSpace::Heap(Device::Cpu));
    }

    #[test]
    fn managed_small_literal_same_device_goes_to_the_stack() {
        let count = Atom::Con(Lit::Int(10));
        let space = choose_addr_space(AllocMode::Managed, Device::Cpu, Device::Cpu, BaseType::Int32, Some(&count));
        assert_eq!(space, AddressSpace::Stack);
    }

    #[test]
    fn managed_literal_over_the_threshold_heap_allocates() {
        let count = Atom::Con(Lit::Int(1000));
        let space = choose_addr_space(AllocMode::Managed, Device::Cpu, Device::Cpu, BaseType::Int32, Some(&count));
        assert_eq!(space, AddressSpace::Heap(Device::Cpu));
    }

    #[test]
    fn managed_dependent_size_heap_allocates_even_if_it_would_be_small() {
        let space = choose_addr_space(AllocMode::Managed, Device::Cpu, Device::Cpu, BaseType::Int32, Some(&Atom::unit()));
        assert_eq!(space, AddressSpace::Heap(Device::Cpu));
    }

    #[test]
    fn managed_cross_device_always_heap_allocates() {
        let space = choose_addr_space(AllocMode::Managed, Device::Cpu, Device::Gpu(0), BaseType::Int32, None);
        assert_eq!(space, AddressSpace::Heap(Device::Cpu));
    }
}
