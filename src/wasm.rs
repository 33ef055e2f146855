//! WebAssembly bindings.
//!
//! JavaScript-friendly wrappers around the VM and assembler. Hosts render
//! from and write input into reserved memory regions with `read_region`
//! and `store`, and pace execution by calling `step` or `run` themselves.

use wasm_bindgen::prelude::*;
use js_sys::Int16Array;
use crate::{assemble, DebugInfo, Memory, Register, Vm, Word};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly VM wrapper.
#[wasm_bindgen]
pub struct WasmVm {
    vm: Vm,
    /// Assembled image, kept for `reset`.
    image: Memory,
    debug: DebugInfo,
}

#[wasm_bindgen]
impl WasmVm {
    /// Create a new VM instance with empty memory.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            vm: Vm::new(),
            image: Memory::new(),
            debug: DebugInfo::default(),
        }
    }

    /// Assemble `source` and load it. Returns the number of words emitted.
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let assembly = assemble(source).map_err(js_err)?;

        self.vm.load_image(&assembly.image);
        self.image = assembly.image;
        self.debug = assembly.debug;

        Ok(self.debug.len)
    }

    /// Step one instruction. Returns the disassembled instruction.
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.vm.step().map_err(js_err)?;
        Ok(instr.to_string())
    }

    /// Step up to `max_steps` instructions. Returns the number executed.
    pub fn run(&mut self, max_steps: u32) -> Result<u32, JsError> {
        let steps = self.vm.run(max_steps as u64).map_err(js_err)?;
        Ok(steps as u32)
    }

    /// Restart the loaded program from address 0.
    pub fn reset(&mut self) {
        self.vm.load_image(&self.image);
    }

    /// Read the memory cell at `address`.
    pub fn load(&self, address: i32) -> Result<i32, JsError> {
        Ok(self.vm.mem.load(address).map_err(js_err)?.to_i32())
    }

    /// Write `value` to the memory cell at `address`.
    pub fn store(&mut self, address: i32, value: i32) -> Result<(), JsError> {
        let word = Word::from_i32(value).map_err(js_err)?;
        self.vm.mem.store(word, address).map_err(js_err)
    }

    /// Copy `len` cells starting at `start` as integers.
    pub fn read_region(&self, start: i32, len: usize) -> Result<Int16Array, JsError> {
        let cells = self.vm.mem.region(start, len).map_err(js_err)?;
        let values: Vec<i16> = cells.iter().map(|w| w.to_i32() as i16).collect();
        Ok(Int16Array::from(&values[..]))
    }

    /// Read a register by assembler name (`r0`..`r6`, `ra`, `sp`).
    pub fn register(&self, name: &str) -> Result<i32, JsError> {
        let reg: Register = name
            .parse()
            .map_err(|_| JsError::new(&format!("unknown register '{}'", name)))?;
        Ok(self.vm.register(reg).to_i32())
    }

    /// Get program counter.
    pub fn pc(&self) -> i32 {
        self.vm.pc().to_i32()
    }

    /// Instructions executed since the last load or reset.
    pub fn cycles(&self) -> u64 {
        self.vm.cycles
    }

    /// Whether a decode error stopped the machine.
    pub fn is_faulted(&self) -> bool {
        self.vm.is_faulted()
    }

    /// Debug info of the last assembly (labels, instruction map) as JSON.
    pub fn debug_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.debug).map_err(js_err)
    }
}

impl Default for WasmVm {
    fn default() -> Self {
        Self::new()
    }
}
