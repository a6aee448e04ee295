//! Export conventions (§6.4): how a finished `ImpFunction`'s flat argument/
//! result list is packed for an outside caller, distinct from the internal
//! `CallingConvention` (§6.3) used between Imp functions. Grounded on
//! `faxc-lir::calling_convention::SystemVAbi` (one struct classifying each
//! argument and producing the register/stack assignment for it) —
//! `unpack_args`/`unpack_results` play the same role here, minus any actual
//! register allocation.

use loomc_ir::Atom;

use crate::imp::IType;

/// One formal's declared shape at the export boundary, after the calling
/// convention has committed to how (not yet where) it arrives.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportArg {
    pub ty: IType,
}

/// §6.4: the two named conventions. `FlatExportCC` treats arguments and
/// results as flat parallel lists; `XLAExportCC` treats them as pointer
/// arrays that must be dereferenced per declared type, with the
/// single-output special case the spec calls out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportCC {
    FlatExportCC,
    XLAExportCC,
}

/// An argument atom paired with how it was reached from the export
/// boundary's raw input — a register/list slot for `FlatExportCC`, or a
/// dereferenced array element for `XLAExportCC`.
#[derive(Clone, Debug, PartialEq)]
pub enum UnpackedArg {
    Direct(Atom),
    FromPointerArray { array: Atom, index: u32, ty: IType },
}

pub fn export_convention(is_xla: bool) -> ExportCC {
    if is_xla {
        ExportCC::XLAExportCC
    } else {
        ExportCC::FlatExportCC
    }
}

/// `FlatExportCC`'s unpack step: arity known at export time, so each
/// formal maps 1:1 onto the raw argument list in order.
pub fn unpack_flat(raw_args: &[Atom]) -> Vec<UnpackedArg> {
    raw_args.iter().cloned().map(UnpackedArg::Direct).collect()
}

/// `XLAExportCC`'s unpack step: `inputs` is one pointer array; each formal
/// is read out by dereferencing `inputs[i]` and casting to its declared
/// `IType`.
pub fn unpack_xla(inputs: Atom, formals: &[ExportArg]) -> Vec<UnpackedArg> {
    formals
        .iter()
        .enumerate()
        .map(|(i, f)| UnpackedArg::FromPointerArray { array: inputs.clone(), index: i as u32, ty: f.ty.clone() })
        .collect()
}

/// `XLAExportCC`'s single-output special case: `outputs` points directly
/// at the buffer rather than at a one-element pointer array.
pub fn xla_output_target(outputs: Atom, result_count: usize) -> UnpackedArg {
    if result_count <= 1 {
        UnpackedArg::Direct(outputs)
    } else {
        UnpackedArg::FromPointerArray { array: outputs, index: 0, ty: IType::Scalar(loomc_ir::BaseType::Int64) }
    }
}
