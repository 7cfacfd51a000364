//! Control unit.
//!
//! Implements the fetch-decode-execute cycle and every instruction as a
//! fixed sequence of bus transfers. Nothing here assigns one register to
//! another directly: values go out on a bus and come back in from it.
//!
//! Routing constraints the micro-routines work around:
//! - PC sees only the external bus, so `PC += 1` goes PC → IR → ULA → IR → PC.
//! - IR is the only bridge between the external bus and internal bus B.
//! - The general-purpose registers reach the ULA only over internal bus A.
//! - Incrementing PC overwrites IR and the ULA's right slot, never the left.

use crate::config::{ConfigError, MachineConfig};
use crate::cpu::bus::{BusId, Word};
use crate::cpu::datapath::{BusSnapshot, Datapath};
use crate::cpu::decode::{Opcode, OPCODE_COUNT};
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{Flag, Register, RegisterError, FLAGS, IR, PC};
use crate::cpu::trace::{NoTrace, TraceEvent, TraceObserver};
use crate::cpu::ula::Slot;
use serde::{Serialize, Deserialize};
use thiserror::Error;

const EXT: BusId = BusId::External;
const BUS_A: BusId = BusId::InternalA;
const BUS_B: BusId = BusId::InternalB;

use crate::cpu::datapath::Endpoint::{Register as Reg, Selected, Ula};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has decoded a word with no micro-routine.
    Halted,
    /// CPU hit a fatal fault.
    Error,
}

/// Result of one fetch-decode-execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The instruction ran to completion.
    Executed(Opcode),
    /// The fetched word was not an opcode; the CPU is now halted.
    Halted(Word),
}

#[derive(Debug, Clone, Copy)]
enum AluOp {
    Add,
    Sub,
    Mul,
}

type MicroRoutine = fn(&mut Cpu) -> Result<(), MicroFault>;

/// Micro-routines indexed by opcode.
const DISPATCH: [MicroRoutine; OPCODE_COUNT] = [
    Cpu::add_reg_reg,
    Cpu::add_mem_reg,
    Cpu::add_reg_mem,
    Cpu::sub_reg_reg,
    Cpu::sub_mem_reg,
    Cpu::sub_reg_mem,
    Cpu::imul_mem_reg,
    Cpu::imul_reg_mem,
    Cpu::imul_reg_reg,
    Cpu::move_mem_reg,
    Cpu::move_reg_mem,
    Cpu::move_reg_reg,
    Cpu::move_imm_reg,
    Cpu::inc_reg,
    Cpu::inc_mem,
    Cpu::jmp,
    Cpu::jn,
    Cpu::jz,
    Cpu::jnz,
    Cpu::jeq,
    Cpu::jgt,
    Cpu::jlw,
    Cpu::ldi,
    Cpu::read,
    Cpu::store,
    Cpu::add_imm_mem,
    Cpu::sub_imm_mem,
];

/// The machine: datapath plus control unit state.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Buses, registers, ULA and memory.
    pub dp: Datapath,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed.
    pub cycles: u64,
    config: MachineConfig,
    last_opcode: Option<Opcode>,
}

impl Cpu {
    /// Create a CPU with the default 256-cell layout.
    pub fn new() -> Self {
        Self::build(MachineConfig::default())
    }

    /// Create a CPU with a custom layout.
    pub fn with_config(config: MachineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MachineConfig) -> Self {
        Self {
            dp: Datapath::new(config.memory_size),
            state: CpuState::Running,
            cycles: 0,
            config,
            last_opcode: None,
        }
    }

    /// Machine configuration.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.dp.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_opcode = None;
    }

    /// Load a program image at address 0, one cell at a time over the
    /// external bus. The image must end before the reserved area.
    pub fn load_program(&mut self, image: &[Word]) -> Result<(), MemoryError> {
        let available = self.config.reserved_start.min(self.dp.memory.size());
        if image.len() > available {
            return Err(MemoryError::ProgramTooLarge { size: image.len(), available });
        }

        for (addr, &word) in image.iter().enumerate() {
            self.dp.write_cell(addr as Word, word)?;
        }

        tracing::debug!(cells = image.len(), "program loaded");
        Ok(())
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        self.step_with(&mut NoTrace)
    }

    /// Execute a single instruction, reporting to `tracer`.
    pub fn step_with(&mut self, tracer: &mut dyn TraceObserver) -> Result<Step, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let pc = self.pc();
        match self.cycle(pc, tracer) {
            Ok(step) => Ok(step),
            Err((opcode, fault)) => {
                self.state = CpuState::Error;
                tracing::debug!(pc, ?opcode, cycle = self.cycles, %fault, "fault");
                Err(CpuError::Fault { pc, opcode, cycle: self.cycles, fault })
            }
        }
    }

    /// Run until halt or error, honouring the configured cycle limit.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let limit = self.config.max_cycles;
        self.run_with(&mut NoTrace, limit)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        self.run_with(&mut NoTrace, Some(max_cycles))
    }

    /// Run until halt, error or `limit` instructions, reporting to `tracer`.
    pub fn run_with(&mut self, tracer: &mut dyn TraceObserver, limit: Option<u64>) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            if let Some(max) = limit {
                if self.cycles - start_cycles >= max {
                    tracing::warn!(limit = max, pc = self.pc(), "cycle limit reached");
                    break;
                }
            }
            self.step_with(tracer)?;
        }

        Ok(self.cycles - start_cycles)
    }

    // ==================== Cycle ====================

    fn cycle(&mut self, pc: Word, tracer: &mut dyn TraceObserver) -> Result<Step, (Option<Word>, MicroFault)> {
        self.fetch().map_err(|f| (None, f))?;
        if tracer.enabled() {
            tracer.on_fetch(pc, self.ir());
        }

        let word = self.decode().map_err(|f| (None, f))?;
        let opcode = Opcode::decode(word);
        if tracer.enabled() {
            tracer.before_execute(&self.trace_event(pc, word, opcode));
        }

        let Some(op) = opcode else {
            self.state = CpuState::Halted;
            tracing::info!(pc, word, cycles = self.cycles, "halted");
            if tracer.enabled() {
                tracer.after_execute(&self.trace_event(pc, word, None));
            }
            return Ok(Step::Halted(word));
        };

        tracing::debug!(pc, opcode = %op, cycle = self.cycles, "execute");
        DISPATCH[op.index()](self).map_err(|f| (Some(word), f))?;

        self.cycles += 1;
        self.last_opcode = Some(op);
        if tracer.enabled() {
            tracer.after_execute(&self.trace_event(pc, word, opcode));
        }
        Ok(Step::Executed(op))
    }

    /// IR := mem[PC]
    fn fetch(&mut self) -> Result<(), MicroFault> {
        self.dp.drive(Reg(PC), EXT)?;
        self.dp.memory_read()?;
        self.dp.latch(Reg(IR), EXT)?;
        Ok(())
    }

    /// Opcode word, via IR's internal bus.
    fn decode(&mut self) -> Result<Word, MicroFault> {
        self.dp.drive(Reg(IR), BUS_B)?;
        Ok(self.dp.buses.get(BUS_B))
    }

    fn trace_event(&self, pc: Word, word: Word, opcode: Option<Opcode>) -> TraceEvent {
        let operands = match (opcode, usize::try_from(pc)) {
            (Some(op), Ok(base)) => (1..=op.operand_count())
                .filter_map(|i| self.dp.memory.peek(base + i).ok())
                .collect(),
            _ => Vec::new(),
        };

        TraceEvent {
            cycle: self.cycles,
            pc,
            registers: self.dp.registers.snapshot(),
            buses: self.dp.bus_snapshot(),
            opcode: word,
            mnemonic: opcode.map(Opcode::mnemonic),
            operands,
        }
    }

    // ==================== Micro-operations ====================

    /// PC := PC + 1, routed PC → IR → ULA → IR → PC.
    fn increment_pc(&mut self) -> Result<(), MicroFault> {
        self.dp.transfer(Reg(PC), Reg(IR), EXT)?;
        self.dp.transfer(Reg(IR), Ula(Slot::Right), BUS_B)?;
        self.dp.ula.inc();
        self.dp.transfer(Ula(Slot::Right), Reg(IR), BUS_B)?;
        self.dp.transfer(Reg(IR), Reg(PC), EXT)?;
        Ok(())
    }

    /// External bus := mem[PC]
    fn fetch_operand(&mut self) -> Result<(), MicroFault> {
        self.dp.drive(Reg(PC), EXT)?;
        self.dp.memory_read()?;
        Ok(())
    }

    /// Advance to the next operand and put it on the external bus.
    fn next_operand(&mut self) -> Result<(), MicroFault> {
        self.increment_pc()?;
        self.fetch_operand()
    }

    /// Advance to the next operand and select the register it names.
    fn select_next_operand(&mut self) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.dp.select_from_external();
        self.dp.selected()?;
        Ok(())
    }

    /// External bus → IR → internal bus B → ULA slot.
    fn stage_external(&mut self, slot: Slot) -> Result<(), MicroFault> {
        self.dp.latch(Reg(IR), EXT)?;
        self.dp.transfer(Reg(IR), Ula(slot), BUS_B)?;
        Ok(())
    }

    /// ULA slot → internal bus B → IR → external bus.
    fn unstage_to_external(&mut self, slot: Slot) -> Result<(), MicroFault> {
        self.dp.transfer(Ula(slot), Reg(IR), BUS_B)?;
        self.dp.drive(Reg(IR), EXT)?;
        Ok(())
    }

    fn spill_address(&self) -> Result<Word, MicroFault> {
        let cell = self.config.spill_cell();
        Word::try_from(cell).map_err(|_| {
            MicroFault::Memory(MemoryError::AddressOutOfRange {
                addr: i64::try_from(cell).unwrap_or(i64::MAX),
                size: self.dp.memory.size(),
            })
        })
    }

    /// Park the selected register id in the reserved area.
    fn spill_selection(&mut self) -> Result<(), MicroFault> {
        let cell = self.spill_address()?;
        let id = self.dp.select.get();
        self.dp.write_cell(cell, id)?;
        Ok(())
    }

    /// Select the register id parked by `spill_selection`.
    fn restore_selection(&mut self) -> Result<(), MicroFault> {
        let cell = self.spill_address()?;
        self.dp.read_cell(cell)?;
        self.dp.select_from_external();
        Ok(())
    }

    /// Reject a program write address on the external bus that points into
    /// the reserved area.
    fn check_write_address(&self) -> Result<(), MicroFault> {
        let addr = self.dp.buses.get(EXT);
        if let Ok(addr) = usize::try_from(addr) {
            if addr >= self.config.reserved_start && addr < self.dp.memory.size() {
                return Err(MemoryError::ReservedArea { addr }.into());
            }
        }
        Ok(())
    }

    fn operate(&mut self, op: AluOp) -> Result<(), MicroFault> {
        match op {
            AluOp::Add => self.dp.ula.add(),
            AluOp::Sub => self.dp.ula.sub(),
            AluOp::Mul => self.multiply()?,
        }
        Ok(())
    }

    /// Right := Left * Right, by repeated addition.
    ///
    /// The smaller magnitude is the loop count. A negative count accumulates
    /// the absolute product and then subtracts it from zero.
    ///
    /// One instruction can loop up to 2^31 times (`i32::MIN * i32::MIN`);
    /// cycle limits count instructions, so they cannot cut this short.
    fn multiply(&mut self) -> Result<(), MicroFault> {
        self.dp.drive(Ula(Slot::Left), BUS_A)?;
        self.dp.drive(Ula(Slot::Right), BUS_B)?;
        let left = self.dp.buses.get(BUS_A);
        let right = self.dp.buses.get(BUS_B);

        let (multiplicand, multiplier) = if right.unsigned_abs() <= left.unsigned_abs() {
            (left, right)
        } else {
            (right, left)
        };
        tracing::trace!(multiplicand, multiplier, "multiply");

        self.dp.buses.put(BUS_A, multiplicand);
        self.dp.latch(Ula(Slot::Left), BUS_A)?;
        self.dp.buses.put(BUS_B, 0);
        self.dp.latch(Ula(Slot::Right), BUS_B)?;

        for _ in 0..multiplier.unsigned_abs() {
            self.dp.ula.add();
        }

        if multiplier < 0 {
            self.dp.buses.put(BUS_A, 0);
            self.dp.latch(Ula(Slot::Left), BUS_A)?;
            self.dp.ula.sub();
        }
        Ok(())
    }

    /// Set FLAGS from the result on internal bus A.
    ///
    /// Zero and nonzero are both kept even though exactly one is always set;
    /// `jz` and `jnz` each test their own bit.
    fn set_status_flags(&mut self) -> Result<(), MicroFault> {
        let result = self.dp.buses.get(BUS_A);
        let flags = self.dp.registers.get_mut(FLAGS)?;

        for flag in [Flag::Zero, Flag::Negative, Flag::NonZero] {
            flags.set_bit(flag.bit(), false)?;
        }
        if result == 0 {
            flags.set_bit(Flag::Zero.bit(), true)?;
        }
        if result < 0 {
            flags.set_bit(Flag::Negative.bit(), true)?;
        }
        if result != 0 {
            flags.set_bit(Flag::NonZero.bit(), true)?;
        }
        Ok(())
    }

    /// ULA result → internal bus A → flags and the selected register.
    fn write_result_to_selected(&mut self) -> Result<(), MicroFault> {
        self.dp.drive(Ula(Slot::Right), BUS_A)?;
        self.set_status_flags()?;
        self.dp.latch(Selected, BUS_A)?;
        Ok(())
    }

    fn flag_set(&self, flag: Flag) -> Result<bool, MicroFault> {
        Ok(self.dp.registers.get(FLAGS)?.bit(flag.bit())?)
    }

    // ==================== Arithmetic ====================

    /// `a b`: a := a op b
    fn reg_reg(&mut self, op: AluOp) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.dp.transfer(Selected, Ula(Slot::Left), BUS_A)?;
        self.spill_selection()?;

        self.select_next_operand()?;
        self.dp.transfer(Selected, Ula(Slot::Right), BUS_A)?;

        self.operate(op)?;
        self.restore_selection()?;
        self.write_result_to_selected()?;
        self.increment_pc()
    }

    /// `m b`: b := mem[m] op b
    fn mem_reg(&mut self, op: AluOp) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.dp.memory_read()?;
        self.stage_external(Slot::Left)?;

        self.select_next_operand()?;
        self.dp.transfer(Selected, Ula(Slot::Right), BUS_A)?;

        self.operate(op)?;
        self.write_result_to_selected()?;
        self.increment_pc()
    }

    /// `a m`: mem[m] := a op mem[m]
    fn reg_mem(&mut self, op: AluOp) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.dp.transfer(Selected, Ula(Slot::Left), BUS_A)?;

        self.next_operand()?;
        self.combine_into_memory(op)
    }

    /// `i m`: mem[m] := i op mem[m]
    fn imm_mem(&mut self, op: AluOp) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.stage_external(Slot::Left)?;

        self.next_operand()?;
        self.combine_into_memory(op)
    }

    /// With Left staged and an address on the external bus:
    /// mem[addr] := Left op mem[addr]
    fn combine_into_memory(&mut self, op: AluOp) -> Result<(), MicroFault> {
        self.check_write_address()?;
        self.dp.memory_store()?;
        self.dp.memory_read()?;
        self.stage_external(Slot::Right)?;

        self.operate(op)?;
        self.dp.drive(Ula(Slot::Right), BUS_A)?;
        self.set_status_flags()?;

        self.unstage_to_external(Slot::Right)?;
        self.dp.memory_store()?;
        self.increment_pc()
    }

    fn add_reg_reg(&mut self) -> Result<(), MicroFault> {
        self.reg_reg(AluOp::Add)
    }

    fn add_mem_reg(&mut self) -> Result<(), MicroFault> {
        self.mem_reg(AluOp::Add)
    }

    fn add_reg_mem(&mut self) -> Result<(), MicroFault> {
        self.reg_mem(AluOp::Add)
    }

    fn add_imm_mem(&mut self) -> Result<(), MicroFault> {
        self.imm_mem(AluOp::Add)
    }

    fn sub_reg_reg(&mut self) -> Result<(), MicroFault> {
        self.reg_reg(AluOp::Sub)
    }

    fn sub_mem_reg(&mut self) -> Result<(), MicroFault> {
        self.mem_reg(AluOp::Sub)
    }

    fn sub_reg_mem(&mut self) -> Result<(), MicroFault> {
        self.reg_mem(AluOp::Sub)
    }

    fn sub_imm_mem(&mut self) -> Result<(), MicroFault> {
        self.imm_mem(AluOp::Sub)
    }

    fn imul_reg_reg(&mut self) -> Result<(), MicroFault> {
        self.reg_reg(AluOp::Mul)
    }

    fn imul_mem_reg(&mut self) -> Result<(), MicroFault> {
        self.mem_reg(AluOp::Mul)
    }

    fn imul_reg_mem(&mut self) -> Result<(), MicroFault> {
        self.reg_mem(AluOp::Mul)
    }

    /// `r`: r := r + 1
    fn inc_reg(&mut self) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.dp.transfer(Selected, Ula(Slot::Right), BUS_A)?;
        self.dp.ula.inc();
        self.write_result_to_selected()?;
        self.increment_pc()
    }

    /// `m`: mem[m] := mem[m] + 1
    fn inc_mem(&mut self) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.check_write_address()?;
        self.dp.memory_store()?;
        self.dp.memory_read()?;
        self.stage_external(Slot::Right)?;

        self.dp.ula.inc();
        self.dp.drive(Ula(Slot::Right), BUS_A)?;
        self.set_status_flags()?;

        self.unstage_to_external(Slot::Right)?;
        self.dp.memory_store()?;
        self.increment_pc()
    }

    // ==================== Data Transfer ====================

    /// `s d`: d := s
    fn move_reg_reg(&mut self) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.dp.drive(Selected, BUS_A)?;
        self.select_next_operand()?;
        self.dp.latch(Selected, BUS_A)?;
        self.increment_pc()
    }

    /// `m r`: r := mem[m]
    fn move_mem_reg(&mut self) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.dp.memory_read()?;
        self.stage_external(Slot::Left)?;

        self.select_next_operand()?;
        self.unstage_to_external(Slot::Left)?;
        self.dp.latch(Selected, EXT)?;
        self.increment_pc()
    }

    /// `r m`: mem[m] := r
    fn move_reg_mem(&mut self) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.next_operand()?;
        self.check_write_address()?;
        self.dp.memory_store()?;
        self.dp.drive(Selected, EXT)?;
        self.dp.memory_store()?;
        self.increment_pc()
    }

    /// `i r`: r := i
    fn move_imm_reg(&mut self) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.stage_external(Slot::Left)?;

        self.select_next_operand()?;
        self.unstage_to_external(Slot::Left)?;
        self.dp.latch(Selected, EXT)?;
        self.increment_pc()
    }

    /// `r i`: r := i
    fn ldi(&mut self) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.next_operand()?;
        self.dp.latch(Selected, EXT)?;
        self.increment_pc()
    }

    /// `m r`: r := mem[m]
    fn read(&mut self) -> Result<(), MicroFault> {
        self.move_mem_reg()
    }

    /// `r m`: mem[m] := r
    fn store(&mut self) -> Result<(), MicroFault> {
        self.move_reg_mem()
    }

    // ==================== Control Flow ====================

    /// `t`: PC := t
    fn jmp(&mut self) -> Result<(), MicroFault> {
        self.next_operand()?;
        self.dp.latch(Reg(PC), EXT)?;
        Ok(())
    }

    /// `t`: PC := t if the flag is set, else skip the operand.
    fn jump_if(&mut self, flag: Flag) -> Result<(), MicroFault> {
        self.increment_pc()?;
        if self.flag_set(flag)? {
            self.fetch_operand()?;
            self.dp.latch(Reg(PC), EXT)?;
            Ok(())
        } else {
            self.increment_pc()
        }
    }

    fn jn(&mut self) -> Result<(), MicroFault> {
        self.jump_if(Flag::Negative)
    }

    fn jz(&mut self) -> Result<(), MicroFault> {
        self.jump_if(Flag::Zero)
    }

    fn jnz(&mut self) -> Result<(), MicroFault> {
        self.jump_if(Flag::NonZero)
    }

    /// `a b t`: PC := t if `taken(a, b)`, else skip the target.
    ///
    /// `a` waits on internal bus A while the routine walks to the target
    /// operand; `b` is brought to internal bus B through IR.
    fn compare_and_jump(&mut self, taken: fn(Word, Word) -> bool) -> Result<(), MicroFault> {
        self.select_next_operand()?;
        self.dp.drive(Selected, BUS_A)?;

        self.select_next_operand()?;
        self.increment_pc()?;
        self.dp.drive(Selected, EXT)?;
        self.dp.latch(Reg(IR), EXT)?;
        self.dp.drive(Reg(IR), BUS_B)?;

        let a = self.dp.buses.get(BUS_A);
        let b = self.dp.buses.get(BUS_B);
        if taken(a, b) {
            self.fetch_operand()?;
            self.dp.latch(Reg(PC), EXT)?;
            Ok(())
        } else {
            self.increment_pc()
        }
    }

    fn jeq(&mut self) -> Result<(), MicroFault> {
        self.compare_and_jump(|a, b| a == b)
    }

    fn jgt(&mut self) -> Result<(), MicroFault> {
        self.compare_and_jump(|a, b| b > a)
    }

    fn jlw(&mut self) -> Result<(), MicroFault> {
        self.compare_and_jump(|a, b| b < a)
    }

    // ==================== Inspection ====================

    /// Program counter.
    pub fn pc(&self) -> Word {
        self.dp.registers.get(PC).map_or(0, Register::value)
    }

    /// Instruction register.
    pub fn ir(&self) -> Word {
        self.dp.registers.get(IR).map_or(0, Register::value)
    }

    /// Value of a register by id.
    pub fn register(&self, id: usize) -> Result<Word, RegisterError> {
        self.dp.registers.get(id).map(Register::value)
    }

    /// Value of a register by name.
    pub fn register_by_name(&self, name: &str) -> Option<Word> {
        let id = self.dp.registers.find(name)?;
        self.register(id).ok()
    }

    /// One condition bit.
    pub fn flag(&self, flag: Flag) -> bool {
        self.flag_set(flag).unwrap_or(false)
    }

    /// Main memory.
    pub fn memory(&self) -> &Memory {
        &self.dp.memory
    }

    /// Current bus values.
    pub fn buses(&self) -> BusSnapshot {
        self.dp.bus_snapshot()
    }

    /// Get the last executed instruction.
    pub fn last_opcode(&self) -> Option<Opcode> {
        self.last_opcode
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("registers", &self.dp.registers.snapshot())
            .finish()
    }
}

/// A fault raised inside a micro-routine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicroFault {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("fault at pc {pc} (opcode {opcode:?}, cycle {cycle}): {fault}")]
    Fault {
        pc: Word,
        opcode: Option<Word>,
        cycle: u64,
        #[source]
        fault: MicroFault,
    },
}
