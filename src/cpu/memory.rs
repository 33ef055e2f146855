//! Flat word-addressed memory.
//!
//! One cell per word value: 3^9 = 19683 cells, addressed by a signed
//! integer in [-9841, +9841]. Every in-range address is valid and all cells
//! start at zero. Hosts reserve regions (pointer state, palette, tile grid)
//! purely by convention; memory does not know about them.

use std::fmt;

use crate::ternary::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of memory cells.
pub const MEMORY_SIZE: usize = Word::COUNT as usize;

/// Anything that can name a memory cell: a word, or an integer that has
/// not been range-checked yet.
pub trait Address: Copy {
    /// Convert to an index into the cell array.
    fn cell_index(self) -> Result<usize, MemoryError>;
}

impl Address for Word {
    #[inline]
    fn cell_index(self) -> Result<usize, MemoryError> {
        Ok((self.to_i32() + Word::MAX) as usize)
    }
}

impl Address for i32 {
    #[inline]
    fn cell_index(self) -> Result<usize, MemoryError> {
        if !(Word::MIN..=Word::MAX).contains(&self) {
            return Err(MemoryError::AddressOutOfRange(self));
        }
        Ok((self + Word::MAX) as usize)
    }
}

/// Ternary memory: 19683 nine-trit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Every cell holds the zero word.
    pub fn new() -> Self {
        Self {
            cells: vec![Word::zero(); MEMORY_SIZE],
        }
    }

    /// Load the word at `addr`.
    pub fn load<A: Address>(&self, addr: A) -> Result<Word, MemoryError> {
        Ok(self.cells[addr.cell_index()?])
    }

    /// Store `value` at `addr`.
    pub fn store<A: Address>(&mut self, value: Word, addr: A) -> Result<(), MemoryError> {
        let cell = &mut self.cells[addr.cell_index()?];
        *cell = value;
        Ok(())
    }

    /// Read a cell by word address. Word addresses are always in range.
    #[inline]
    pub fn read(&self, addr: Word) -> Word {
        self.cells[(addr.to_i32() + Word::MAX) as usize]
    }

    /// Write a cell by word address.
    #[inline]
    pub fn write(&mut self, addr: Word, value: Word) {
        self.cells[(addr.to_i32() + Word::MAX) as usize] = value;
    }

    /// Zero every cell.
    pub fn clear(&mut self) {
        self.cells.fill(Word::zero());
    }

    /// Copy a program into memory starting at `start`.
    pub fn load_program(&mut self, start: i32, program: &[Word]) -> Result<(), MemoryError> {
        let first = start.cell_index()?;
        let available = MEMORY_SIZE - first;
        let size = program.len();
        if size > available {
            return Err(MemoryError::ProgramTooLarge { size, available });
        }

        self.cells[first..first + size].copy_from_slice(program);
        Ok(())
    }

    /// The `len` words starting at `start`, for hosts reading a reserved
    /// region. The region may not run past the top of memory.
    pub fn region(&self, start: i32, len: usize) -> Result<&[Word], MemoryError> {
        let first = start.cell_index()?;
        let end = first
            .checked_add(len)
            .filter(|end| *end <= MEMORY_SIZE)
            .ok_or_else(|| {
                let past = i32::try_from(len).map_or(i32::MAX, |len| start.saturating_add(len));
                MemoryError::AddressOutOfRange(past)
            })?;
        Ok(&self.cells[first..end])
    }

    /// All non-zero cells as (address, value), in address order.
    pub fn non_zero(&self) -> impl Iterator<Item = (i32, Word)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                (!cell.is_zero()).then(|| (index as i32 - Word::MAX, *cell))
            })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.debug_struct("Memory")
            .field("cells", &MEMORY_SIZE)
            .field("used", &self.non_zero().count())
            .finish()
    }
}

/// Failures of range-checked memory access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// An integer address outside [-9841, +9841].
    #[error("memory address {0} out of range (-9841 to +9841)")]
    AddressOutOfRange(i32),

    /// A program that would run past the top of memory.
    #[error("program of {size} words does not fit in the {available} cells left")]
    ProgramTooLarge { size: usize, available: usize },
}
