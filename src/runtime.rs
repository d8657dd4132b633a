use std::io::Write;

use crate::error::RunError;
use crate::loader::Program;
use crate::opcode::Opcode;
use crate::output;
use crate::state::{Flags, Memory, Registers};

/// Complete machine state for one run.
pub struct Cpu {
    /// Code and stack
    mem: Memory,
    /// R0-R7, R7 is SP
    reg: Registers,
    /// Set by `CMP`
    flags: Flags,
    /// Program counter
    pc: u8,
    /// Instructions executed since `run` started
    steps: u64,
    max_steps: Option<u64>,
    trace: bool,
}

/// What the loop does after an instruction completes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Halt,
}

impl Cpu {
    pub fn new(program: &Program) -> Cpu {
        let mut mem = Memory::new();
        mem.load(program.bytes());
        Cpu {
            mem,
            reg: Registers::new(),
            flags: Flags::NONE,
            pc: 0,
            steps: 0,
            max_steps: None,
            trace: false,
        }
    }

    /// Print each instruction to stderr before it runs.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Give up with [`RunError::StepLimit`] after `limit` instructions.
    pub fn set_max_steps(&mut self, limit: Option<u64>) {
        self.max_steps = limit;
    }

    /// Run from address 0 until `HALT` or a fatal error.
    ///
    /// `PRN` and `PRA` write to `out`.
    pub fn run(&mut self, out: &mut impl Write) -> Result<(), RunError> {
        self.pc = 0;
        self.steps = 0;
        loop {
            if let Some(limit) = self.max_steps {
                if self.steps >= limit {
                    return Err(RunError::StepLimit { limit });
                }
            }
            if self.step(out)? == Flow::Halt {
                out.flush()?;
                return Ok(());
            }
        }
    }

    /// Fetch, decode and execute the instruction at PC.
    pub fn step(&mut self, out: &mut impl Write) -> Result<Flow, RunError> {
        let pc = self.pc;
        if self.trace {
            output::trace(self);
        }

        let byte = self.mem_read(pc as usize)?;
        let op = Opcode::try_from(byte).map_err(|opcode| RunError::UnknownOpcode { opcode, pc })?;
        let mut operands = [0u8; 2];
        for (i, operand) in operands
            .iter_mut()
            .take(op.operand_count() as usize)
            .enumerate()
        {
            *operand = self.mem_read(pc as usize + 1 + i)?;
        }

        self.steps += 1;
        if self.execute(op, operands, out)? == Flow::Halt {
            return Ok(Flow::Halt);
        }
        if !op.sets_pc() {
            self.advance(op)?;
        }
        Ok(Flow::Continue)
    }

    fn execute(&mut self, op: Opcode, [a, b]: [u8; 2], out: &mut impl Write) -> Result<Flow, RunError> {
        match op {
            Opcode::Halt => return Ok(Flow::Halt),
            Opcode::Nop => (),
            Opcode::Ldi => *self.reg_mut(a)? = b,
            Opcode::Ld => {
                let addr = self.reg(b)?;
                let val = self.mem_read(addr as usize)?;
                *self.reg_mut(a)? = val;
            }
            Opcode::St => {
                let addr = self.reg(a)?;
                let val = self.reg(b)?;
                self.mem_write(addr as usize, val)?;
            }
            Opcode::Prn => writeln!(out, "{}", self.reg(a)?)?,
            Opcode::Pra => write!(out, "{}", self.reg(a)? as char)?,
            Opcode::Push => {
                let val = self.reg(a)?;
                self.push_val(val)?;
            }
            Opcode::Pop => {
                let val = self.mem_read(self.reg.sp() as usize)?;
                *self.reg_mut(a)? = val;
                // SP is read again, so `POP R7` increments the popped value
                let next = self
                    .reg
                    .sp()
                    .checked_add(1)
                    .ok_or(RunError::StackUnderflow { pc: self.pc })?;
                self.reg.set_sp(next);
            }
            Opcode::Call => {
                // Check register before touching the stack
                self.reg(a)?;
                let ret = self.next_addr(op)?;
                self.push_val(ret)?;
                // Target is read after the push, so `CALL R7` lands on the return slot
                self.pc = self.reg(a)?;
            }
            Opcode::Ret => self.pc = self.pop_val()?,
            Opcode::Jmp => self.jump_if(op, true, a)?,
            Opcode::Jeq => self.jump_if(op, self.flags == Flags::EQUAL, a)?,
            Opcode::Jne => self.jump_if(op, self.flags != Flags::EQUAL, a)?,
            Opcode::Jgt => self.jump_if(op, self.flags == Flags::GREATER, a)?,
            Opcode::Jlt => self.jump_if(op, self.flags == Flags::LESS, a)?,
            Opcode::Jge => {
                let cond = self.flags.intersects(Flags::GREATER | Flags::EQUAL);
                self.jump_if(op, cond, a)?
            }
            Opcode::Jle => {
                let cond = self.flags.intersects(Flags::LESS | Flags::EQUAL);
                self.jump_if(op, cond, a)?
            }
            Opcode::Alu(alu) => self.alu(alu, a, b)?,
        }
        Ok(Flow::Continue)
    }

    /// Jump to the address in `reg`, or fall through past this instruction.
    fn jump_if(&mut self, op: Opcode, cond: bool, reg: u8) -> Result<(), RunError> {
        let target = self.reg(reg)?;
        if cond {
            self.pc = target;
            Ok(())
        } else {
            self.advance(op)
        }
    }

    fn advance(&mut self, op: Opcode) -> Result<(), RunError> {
        self.pc = self.next_addr(op)?;
        Ok(())
    }

    /// Address of the instruction following `op` at PC.
    fn next_addr(&self, op: Opcode) -> Result<u8, RunError> {
        let address = self.pc as usize + op.width() as usize;
        u8::try_from(address).map_err(|_| RunError::AddressOutOfRange {
            address,
            pc: self.pc,
        })
    }

    fn push_val(&mut self, val: u8) -> Result<(), RunError> {
        // Decrement stack
        let sp = self
            .reg
            .sp()
            .checked_sub(1)
            .ok_or(RunError::StackOverflow { pc: self.pc })?;
        self.reg.set_sp(sp);
        // Save onto stack
        self.mem_write(sp as usize, val)
    }

    fn pop_val(&mut self) -> Result<u8, RunError> {
        let sp = self.reg.sp();
        let next = sp
            .checked_add(1)
            .ok_or(RunError::StackUnderflow { pc: self.pc })?;
        let val = self.mem_read(sp as usize)?;
        self.reg.set_sp(next);
        Ok(val)
    }

    pub(crate) fn reg(&self, index: u8) -> Result<u8, RunError> {
        self.reg
            .get(index)
            .ok_or(RunError::InvalidRegister { index, pc: self.pc })
    }

    pub(crate) fn reg_mut(&mut self, index: u8) -> Result<&mut u8, RunError> {
        let pc = self.pc;
        self.reg
            .get_mut(index)
            .ok_or(RunError::InvalidRegister { index, pc })
    }

    fn mem_read(&self, address: usize) -> Result<u8, RunError> {
        self.mem
            .read(address)
            .ok_or(RunError::AddressOutOfRange { address, pc: self.pc })
    }

    fn mem_write(&mut self, address: usize, val: u8) -> Result<(), RunError> {
        if self.mem.write(address, val) {
            Ok(())
        } else {
            Err(RunError::AddressOutOfRange { address, pc: self.pc })
        }
    }

    pub(crate) fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}
