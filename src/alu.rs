use std::cmp::Ordering;

use crate::error::RunError;
use crate::opcode::AluOp;
use crate::runtime::Cpu;
use crate::state::Flags;

/// What an ALU operation writes back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// New value for the left-hand register.
    Value(u8),
    /// New flags; registers are left alone.
    Flags(Flags),
}

/// Compute `op` over two register values.
///
/// All results wrap to 8 bits. Returns `None` when dividing by zero.
pub fn evaluate(op: AluOp, a: u8, b: u8) -> Option<Outcome> {
    let value = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Div => a.checked_div(b)?,
        AluOp::Mod => a.checked_rem(b)?,
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Not => !a,
        // Shifting every bit out leaves nothing
        AluOp::Shl => a.checked_shl(b as u32).unwrap_or(0),
        AluOp::Shr => a.checked_shr(b as u32).unwrap_or(0),
        AluOp::Cmp => {
            let flags = match a.cmp(&b) {
                Ordering::Equal => Flags::EQUAL,
                Ordering::Greater => Flags::GREATER,
                Ordering::Less => Flags::LESS,
            };
            return Some(Outcome::Flags(flags));
        }
    };
    Some(Outcome::Value(value))
}

impl Cpu {
    /// Run an ALU operation on registers `ra` and `rb`, storing into `ra` (or flags, for `CMP`).
    pub(crate) fn alu(&mut self, op: AluOp, ra: u8, rb: u8) -> Result<(), RunError> {
        let a = self.reg(ra)?;
        // `NOT` ignores its second operand, so it must not fault on it either
        let b = if op == AluOp::Not { 0 } else { self.reg(rb)? };

        match evaluate(op, a, b) {
            Some(Outcome::Value(value)) => *self.reg_mut(ra)? = value,
            Some(Outcome::Flags(flags)) => self.set_flags(flags),
            None => return Err(RunError::DivisionByZero { pc: self.pc() }),
        }
        Ok(())
    }
}
