//! Imp IR on the wire (§6.3): the flat, scalar/pointer target of Imp
//! translation. Grounded on the teacher's `faxc-lir::lir` module (a
//! `Function`/`Instruction`/`Operand`/`Address` family per physical
//! backend), generalized here to one portable instruction set shared
//! across backends — this crate never reaches a concrete machine ISA
//! (register allocation, encoding) since `IType::Vector`/`ICond` only
//! become `switch`/SIMD at codegen time, outside this crate's scope.
//!
//! Operands are plain `loomc_ir::Atom`s rather than a separate operand type:
//! `Atom::Con`/`Atom::ImpAtomVar` already exist exactly to carry a literal or
//! a committed machine location once a pass reaches this phase.

use loomc_ir::{Atom, BinOp, IxMethod, IxType, SeqDir, Type, UnOp};
use loomc_util::{Name, Symbol};

/// Where a pointer allocation lives. `chooseAddrSpace` (`crate::addrspace`)
/// is the only thing that produces one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    Stack,
    Heap(Device),
}

/// The code-generation target device (part of §6.1's `Backend × Device ×
/// AllocMode` input tuple).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Gpu(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Llvm,
    Cuda,
}

/// §6.3: `Scalar baseType | Vector [n] baseType | PtrType (AddressSpace, IType)`.
#[derive(Clone, Debug, PartialEq)]
pub enum IType {
    Scalar(loomc_ir::BaseType),
    Vector(u32, loomc_ir::BaseType),
    PtrType(AddressSpace, Box<IType>),
}

impl IType {
    pub fn ptr(space: AddressSpace, pointee: IType) -> Self {
        IType::PtrType(space, Box::new(pointee))
    }
}

/// `(name, IType)` — one Imp-level binder.
#[derive(Clone, Debug, PartialEq)]
pub struct IBinder {
    pub name: Name,
    pub ty: IType,
}

/// §6.3's named calling conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    CInternalFun,
    CEntryFun,
    FfiFun,
    CudaKernelLaunch,
}

/// `IPrimOp`'s primitive payload: the arithmetic/index-algebra subset of
/// `loomc_ir::Op` that is still meaningful once every value is a flat
/// scalar or pointer (`IndexRef`/`Place`/`Load` have already been resolved
/// into `Load`/`Store` by the time a decl reaches this shape).
#[derive(Clone, Debug, PartialEq)]
pub enum ImpPrimOp {
    BinOp(BinOp, Atom, Atom),
    UnOp(UnOp, Atom),
    IxMethod(IxMethod, Box<IxType>, Vec<Atom>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImpInstr {
    Alloc { space: AddressSpace, ty: IType, size: Atom },
    /// Not named in §4.5's instruction table, which lists only the
    /// instructions novel to this phase — but `destToAtom`'s effect-handler
    /// reads and every non-vector `IndexRef` need a scalar read back out of
    /// a pointer, so a plain load is carried alongside `Store`.
    Load { ptr: Atom },
    Store { ptr: Atom, val: Atom },
    Free { ptr: Atom },
    IPrimOp(ImpPrimOp),
    ICastOp(IType, Atom),
    IBitcastOp(IType, Atom),
    IFor { dir: SeqDir, size: Atom, binder: Name, body: Box<ImpBlock> },
    IWhile(Box<ImpBlock>),
    ICond { cond: Atom, then_branch: Box<ImpBlock>, else_branch: Box<ImpBlock> },
    ICall { func: Symbol, args: Vec<Atom>, cc: CallingConvention },
    IThrowError(Type),
    IVectorBroadcast(Atom, u32),
    IVectorIota(u32),
    MemCopy { dst: Atom, src: Atom, len: Atom },
    /// A value already in atom form needing no instruction of its own
    /// (e.g. the degenerate `UnitVal` an effect handler binder is bound to).
    Atom(Atom),
}

/// Binds zero or more `IBinder`s (`Atom`-producing instructions with no
/// interesting result bind zero, as `Store`/`Free` do) to one `ImpInstr`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpDecl {
    pub binders: Vec<IBinder>,
    pub instr: ImpInstr,
}

/// A list of decls plus a list of scalar return expressions (§6.3).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ImpBlock {
    pub decls: Vec<ImpDecl>,
    pub results: Vec<Atom>,
}

impl ImpBlock {
    pub fn empty() -> Self {
        ImpBlock::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IFunType {
    pub calling_convention: CallingConvention,
    pub arg_types: Vec<IType>,
    pub result_types: Vec<IType>,
}

/// `ImpFunction = (IFunType, Abs(Nest IBinder, ImpBlock))` (§6.3).
#[derive(Clone, Debug, PartialEq)]
pub struct ImpFunction {
    pub ty: IFunType,
    pub params: loomc_util::Nest<IBinder>,
    pub body: ImpBlock,
}
