//! The ternary virtual machine.
//!
//! - 19683 nine-trit memory cells, addressed -9841..=9841
//! - 9 general registers plus PC, comparison flag and carry trit
//! - 22-opcode register machine with three addressing modes

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Register, Registers};
pub use decode::{
    Instruction, Opcode, AddrMode, Direction, Source, DecodeError, EncodeError, encode, decode,
};
pub use execute::{Vm, VmError, VmState};
