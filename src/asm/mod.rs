//! Assembler, disassembler and program image files.
//!
//! This module provides:
//! - A two-pass assembler (source text → memory image + debug info)
//! - A disassembler (words → assembler text)
//! - The `.tim` text image format

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, Assembly, AssemblerError, DebugInfo, Operand, Statement};
pub use disasm::{disassemble, disassemble_at, format_instruction};
pub use image::{ImageFile, ImageError, load_image, save_image};
