//! The virtual machine: one fetch, decode and execute per [`Vm::step`].

use crate::cpu::decode::{self, DecodeError, Direction, Instruction, Opcode, Source};
use crate::cpu::registers::Register;
use crate::cpu::{Memory, MemoryError, Registers};
use crate::ternary::{alu, arith, AluOp, Trit, Word};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the machine can still step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// Executing normally.
    Running,
    /// A decode error stopped the machine; only `reset` recovers it.
    Faulted,
}

/// The ternary virtual machine.
///
/// The machine never halts on its own. Hosts drive it with [`Vm::step`]
/// and decide when to stop.
#[derive(Clone, Deserialize, Serialize)]
pub struct Vm {
    /// Register file.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    pub state: VmState,
    /// Instructions executed since the last reset.
    pub cycles: u64,
    last_instr: Option<Instruction>,
}

impl Vm {
    /// Create a VM with zeroed memory and registers.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: VmState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Create a VM running the given memory image.
    pub fn with_image(image: &Memory) -> Self {
        let mut vm = Self::new();
        vm.load_image(image);
        vm
    }

    /// Reset registers, memory and state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = VmState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Replace memory with `image` and restart from address 0.
    pub fn load_image(&mut self, image: &Memory) {
        self.reset();
        self.mem = image.clone();
    }

    /// Reset, then copy `program` into memory at address 0.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        self.reset();
        self.mem.load_program(0, program)
    }

    /// Fetch, decode and execute the instruction at PC.
    ///
    /// Returns the instruction that was executed. A word that does not
    /// decode faults the machine; every later call returns
    /// [`VmError::Faulted`] until [`Vm::reset`].
    pub fn step(&mut self) -> Result<Instruction, VmError> {
        if self.state == VmState::Faulted {
            return Err(VmError::Faulted);
        }

        // Fetch
        let pc = self.regs.pc;
        let raw = self.mem.read(pc);
        let next = self.mem.read(Word::wrapping_from_i32(pc.to_i32() + 1));

        // Decode
        let instr = match decode::decode(raw, Some(next)) {
            Ok(instr) => instr,
            Err(e) => {
                tracing::error!(pc = pc.to_i32(), word = %raw, "decode fault: {}", e);
                self.state = VmState::Faulted;
                return Err(VmError::Decode(e));
            }
        };

        // Advance PC past the whole instruction before jumps override it
        self.regs.advance_pc(instr.words() as i32);

        tracing::trace!(pc = pc.to_i32(), %instr, "step");

        // Execute
        self.execute(instr);

        self.cycles += 1;
        self.last_instr.replace(instr);

        Ok(instr)
    }

    /// Step at most `max_steps` times.
    ///
    /// Returns the number of instructions executed. Stops early only on a
    /// fault.
    pub fn run(&mut self, max_steps: u64) -> Result<u64, VmError> {
        let mut executed = 0;
        while executed < max_steps {
            self.step()?;
            executed += 1;
        }
        Ok(executed)
    }

    fn execute(&mut self, instr: Instruction) {
        let x = instr.x;
        let operand = self.operand(instr.source);

        match instr.opcode {
            Opcode::Nop => {}

            Opcode::Mov => self.regs.set(x, operand),

            Opcode::Cmp => {
                let ordering = arith::compare(&self.regs.get(x), &operand);
                self.regs.set_flag(ordering);
            }

            Opcode::Lod => match instr.direction {
                Direction::Load => {
                    let value = self.mem.read(operand);
                    self.regs.set(x, value);
                }
                Direction::Store => self.mem.write(operand, self.regs.get(x)),
            },

            Opcode::Jmp => self.regs.jump(operand),

            Opcode::Beq => self.branch_if(Trit::O, operand),
            Opcode::Bgt => self.branch_if(Trit::P, operand),
            Opcode::Blt => self.branch_if(Trit::N, operand),

            Opcode::Jal => {
                // PC already points past the JAL
                self.regs.set(Register::Ra, self.regs.pc);
                self.regs.jump(operand);
            }

            Opcode::Add => {
                self.regs.carry = self.alu(x, AluOp::Add, &operand);
            }
            Opcode::Addc => {
                self.regs.carry = self.alu(x, AluOp::AddWithCarry, &operand);
            }
            Opcode::Mul => {
                self.alu(x, AluOp::Multiply, &operand);
            }
            Opcode::Div => {
                self.alu(x, AluOp::Divide, &operand);
            }
            Opcode::Mod => {
                self.alu(x, AluOp::Modulo, &operand);
            }
            Opcode::Neg => {
                self.alu(x, AluOp::Negate, &operand);
            }
            Opcode::Min => {
                self.alu(x, AluOp::Min, &operand);
            }
            Opcode::Max => {
                self.alu(x, AluOp::Max, &operand);
            }
            Opcode::Xor => {
                self.alu(x, AluOp::Xor, &operand);
            }
            Opcode::Con => {
                self.alu(x, AluOp::Consensus, &operand);
            }
            Opcode::Any => {
                self.alu(x, AluOp::Any, &operand);
            }
            Opcode::Rsh => {
                self.alu(x, AluOp::RotateShift, &operand);
            }
            Opcode::Ush => {
                self.alu(x, AluOp::UnsignedShift, &operand);
            }
        }
    }

    /// `x := op(x, operand)`, returning the carry out.
    fn alu(&mut self, x: Register, op: AluOp, operand: &Word) -> Trit {
        let mut acc = self.regs.get(x);
        let carry = alu::apply(op, &mut acc, operand, self.regs.carry);
        self.regs.set(x, acc);
        carry
    }

    /// Resolve the second operand to a value.
    fn operand(&self, source: Source) -> Word {
        match source {
            Source::Register(reg) => self.regs.get(reg),
            Source::Short(value) => Word::wrapping_from_i32(value as i32),
            Source::Word(word) => word,
        }
    }

    fn branch_if(&mut self, flag: Trit, target: Word) {
        if self.regs.flag == flag {
            self.regs.jump(target);
        }
    }

    /// Read a general register.
    pub fn register(&self, reg: Register) -> Word {
        self.regs.get(reg)
    }

    /// The program counter.
    pub fn pc(&self) -> Word {
        self.regs.pc
    }

    /// The instruction most recently executed, if any.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Whether a decode error stopped the machine.
    pub fn is_faulted(&self) -> bool {
        self.state == VmState::Faulted
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, out: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        out.debug_struct("Vm")
            .field("pc", &self.regs.pc)
            .field("registers", &self.regs)
            .field("state", &self.state)
            .field("steps", &self.cycles)
            .finish()
    }
}

/// Reasons a step did not execute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("machine is faulted; reset it before stepping again")]
    Faulted,

    #[error("cannot decode instruction: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::encode;

    fn make_program(instructions: &[Instruction]) -> Vec<Word> {
        let mut words = Vec::new();
        for instr in instructions {
            let (first, second) = encode(instr).unwrap();
            words.push(first);
            words.extend(second);
        }
        words
    }

    fn w(value: i32) -> Word {
        Word::from_i32(value).unwrap()
    }

    fn vm_with(instructions: &[Instruction]) -> Vm {
        let mut vm = Vm::new();
        vm.load_program(&make_program(instructions)).unwrap();
        vm
    }

    #[test]
    fn test_zeroed_memory_executes_nops() {
        let mut vm = Vm::new();
        let executed = vm.run(5).unwrap();

        assert_eq!(executed, 5);
        assert_eq!(vm.pc().to_i32(), 5);
        assert_eq!(vm.last_instruction(), Some(Instruction::nop()));
    }

    #[test]
    fn test_mov_add_short_immediates() {
        // MOV r0, oooooooo+ ; ADD r0, oooooooo+
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R0, Source::Short(1)),
            Instruction::new(Opcode::Add, Register::R0, Source::Short(1)),
        ]);

        vm.step().unwrap();
        vm.step().unwrap();

        assert_eq!(vm.register(Register::R0).to_i32(), 2);
        assert_eq!(vm.pc().to_i32(), 2);
    }

    #[test]
    fn test_add_wraps_and_sets_carry() {
        let big = Word::parse("+oooooooo").unwrap();
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R0, Source::Word(big)),
            Instruction::new(Opcode::Add, Register::R0, Source::Word(big)),
        ]);

        vm.run(2).unwrap();

        assert_eq!(vm.register(Register::R0).to_i32(), -6561);
        assert_eq!(vm.regs.carry, Trit::P);
        assert_eq!(vm.pc().to_i32(), 4);
    }

    #[test]
    fn test_addc_consumes_carry() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R1, Source::Word(w(Word::MAX))),
            Instruction::new(Opcode::Add, Register::R1, Source::Short(1)),
            Instruction::new(Opcode::Addc, Register::R2, Source::Short(0)),
        ]);

        vm.run(3).unwrap();

        assert_eq!(vm.register(Register::R1).to_i32(), Word::MIN);
        assert_eq!(vm.register(Register::R2).to_i32(), 1);
        assert_eq!(vm.regs.carry, Trit::O);
    }

    #[test]
    fn test_cmp_and_branches() {
        // 0: CMP r0, 3       (0 < 3)
        // 1: BEQ 10          (not taken)
        // 2: BLT 20          (taken)
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Cmp, Register::R0, Source::Short(3)),
            Instruction::branch(Opcode::Beq, Source::Word(w(10))),
            Instruction::branch(Opcode::Blt, Source::Word(w(20))),
        ]);

        vm.step().unwrap();
        assert_eq!(vm.regs.flag, Trit::N);

        vm.step().unwrap();
        assert_eq!(vm.pc().to_i32(), 3);

        vm.step().unwrap();
        assert_eq!(vm.pc().to_i32(), 20);
    }

    #[test]
    fn test_beq_taken_on_equal() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R3, Source::Short(-2)),
            Instruction::new(Opcode::Cmp, Register::R3, Source::Short(-2)),
            Instruction::branch(Opcode::Beq, Source::Short(-4)),
            Instruction::branch(Opcode::Bgt, Source::Short(4)),
        ]);

        vm.run(3).unwrap();
        assert_eq!(vm.regs.flag, Trit::O);
        assert_eq!(vm.pc().to_i32(), -4);
    }

    #[test]
    fn test_cmp_does_not_wrap() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R0, Source::Word(w(Word::MAX))),
            Instruction::new(Opcode::Cmp, Register::R0, Source::Word(w(Word::MIN))),
        ]);

        vm.run(2).unwrap();
        assert_eq!(vm.regs.flag, Trit::P);
    }

    #[test]
    fn test_jal_links_return_address() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R0, Source::Short(1)),
            Instruction::branch(Opcode::Jal, Source::Word(w(100))),
        ]);

        vm.run(2).unwrap();

        assert_eq!(vm.register(Register::Ra).to_i32(), 3);
        assert_eq!(vm.pc().to_i32(), 100);
    }

    #[test]
    fn test_jmp_through_register() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R4, Source::Word(w(-77))),
            Instruction::branch(Opcode::Jmp, Source::Register(Register::R4)),
        ]);

        vm.run(2).unwrap();
        assert_eq!(vm.pc().to_i32(), -77);
    }

    #[test]
    fn test_load_and_store() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Lod, Register::R1, Source::Word(w(500))),
            Instruction::new(Opcode::Add, Register::R1, Source::Short(1)),
            Instruction::store(Register::R1, Source::Word(w(-500))),
        ]);
        vm.mem.store(w(41), 500).unwrap();

        vm.run(3).unwrap();

        assert_eq!(vm.register(Register::R1).to_i32(), 42);
        assert_eq!(vm.mem.load(-500).unwrap().to_i32(), 42);
        assert_eq!(vm.mem.load(500).unwrap().to_i32(), 41);
    }

    #[test]
    fn test_alu_instructions() {
        let mut vm = vm_with(&[
            Instruction::new(Opcode::Mov, Register::R0, Source::Short(-4)),
            Instruction::new(Opcode::Mul, Register::R0, Source::Short(3)),
            Instruction::new(Opcode::Div, Register::R0, Source::Short(0)),
            Instruction::new(Opcode::Mov, Register::R1, Source::Short(4)),
            Instruction::new(Opcode::Neg, Register::R2, Source::Register(Register::R1)),
            Instruction::new(Opcode::Mod, Register::R0, Source::Register(Register::R2)),
        ]);

        vm.run(3).unwrap();
        // division by zero leaves the accumulator alone
        assert_eq!(vm.register(Register::R0).to_i32(), -12);

        vm.run(3).unwrap();
        assert_eq!(vm.register(Register::R2).to_i32(), -4);
        assert_eq!(vm.register(Register::R0).to_i32(), 0);
    }

    #[test]
    fn test_every_alu_opcode_matches_the_alu() {
        let start = w(-40);
        let operand = w(3);

        for opcode in Opcode::ALL {
            let Some(op) = opcode.alu_op() else {
                continue;
            };
            let mut vm = vm_with(&[
                Instruction::new(Opcode::Mov, Register::R1, Source::Word(start)),
                Instruction::new(opcode, Register::R1, Source::Short(3)),
            ]);
            vm.run(2).unwrap();

            let mut expected = start;
            alu::apply(op, &mut expected, &operand, Trit::O);
            assert_eq!(vm.register(Register::R1), expected, "{:?}", opcode);
        }
    }

    #[test]
    fn test_pc_wraps_at_top_of_memory() {
        let mut vm = Vm::new();
        vm.regs.pc = w(Word::MAX);
        vm.step().unwrap();
        assert_eq!(vm.pc().to_i32(), Word::MIN);
    }

    #[test]
    fn test_decode_fault_is_sticky() {
        let mut vm = Vm::new();
        // reserved opcode -12
        vm.mem.store(Word::parse("--ooooooo").unwrap(), 0).unwrap();

        assert!(matches!(vm.step(), Err(VmError::Decode(DecodeError::InvalidOpcode(-12)))));
        assert!(vm.is_faulted());
        assert_eq!(vm.step(), Err(VmError::Faulted));
        assert_eq!(vm.run(10), Err(VmError::Faulted));
        assert_eq!(vm.cycles, 0);

        vm.reset();
        assert!(!vm.is_faulted());
        assert!(vm.step().is_ok());
    }
}
