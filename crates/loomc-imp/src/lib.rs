//! loomc-imp — Imp Translation (§4.5), the Imp IR wire format (§6.3), and
//! export/calling conventions (§6.4): the last IR layer before a concrete
//! backend, turning a fully dest-passed block into flat scalar/pointer
//! instructions. Grounded throughout on `faxc-lir` (§DESIGN.md).

pub mod addrspace;
pub mod error;
pub mod export;
pub mod imp;
pub mod imp_builder;
pub mod recon;
pub mod switch;
pub mod translate;

pub use addrspace::{choose_addr_space, STACK_THRESHOLD_BYTES};
pub use error::{ImpError, ImpResult};
pub use export::{export_convention, ExportCC};
pub use imp::{
    AddressSpace, Backend, CallingConvention, Device, IBinder, IFunType, IType, ImpBlock, ImpDecl, ImpFunction, ImpInstr,
    ImpPrimOp,
};
pub use imp_builder::ImpBuilder;
pub use recon::Recon;
pub use switch::{emit_switch, SwitchArm};
pub use translate::{translate_function, ImpCtx};
