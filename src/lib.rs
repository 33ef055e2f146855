//! # trivm
//!
//! A balanced ternary virtual machine and its two-pass assembler.
//!
//! Values are 9-trit words in [-9841, +9841]. Memory is one flat space of
//! 3^9 words addressed by those same values, and programs are assembled
//! into a memory image that the [`Vm`] steps one instruction at a time.
//! Hosts stop the machine by no longer calling [`Vm::step`].
//!
//! ```
//! use trivm::{assemble, Register, Vm};
//!
//! let asm = assemble("MOV r0, oooooooo+\nADD r0, oooooooo+").unwrap();
//! let mut vm = Vm::with_image(&asm.image);
//! vm.step().unwrap();
//! vm.step().unwrap();
//! assert_eq!(vm.register(Register::R0).to_i32(), 2);
//! ```

pub mod ternary;
pub mod cpu;
pub mod asm;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use ternary::{Trit, Word, CodecError, AluOp, AluError};
pub use cpu::{
    Vm, VmState, VmError, Memory, MemoryError, Register, Registers, Instruction, Opcode,
    DecodeError, EncodeError,
};
pub use asm::{
    assemble, disassemble, disassemble_at, Assembly, AssemblerError, DebugInfo, ImageFile,
    ImageError, load_image, save_image,
};
