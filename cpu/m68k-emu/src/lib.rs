//! Motorola 68000-family instruction execution engine.
//!
//! The CPU state lives in [`M68k`]. The host owns it and drives it by calling [`M68k::step`]
//! with a [`BusInterface`] implementation that backs the 24-bit address space.

#[cfg(any(test, feature = "memorybus"))]
pub mod bus;
mod config;
mod core;
mod disassemble;
mod num;
pub mod traits;

pub use crate::config::{AlignmentPolicy, CpuModel, EngineConfig, ParseModelError};
#[cfg(feature = "bincode")]
pub use crate::core::SaveStateError;
pub use crate::core::{M68k, StopSignal, vectors};
pub use crate::disassemble::Disassembly;
pub use traits::BusInterface;
