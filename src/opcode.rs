use std::fmt;

/// Operations routed through the ALU. Always take two register operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Cmp,
    And,
    Not,
    Or,
    Xor,
    Shl,
    Shr,
}

/// Every instruction the machine understands.
///
/// Decoding happens once per cycle, after which dispatch is a single `match`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Nop,
    Halt,
    Ret,
    Push,
    Pop,
    Prn,
    Pra,
    Call,
    Jmp,
    Jeq,
    Jne,
    Jgt,
    Jlt,
    Jle,
    Jge,
    Ldi,
    Ld,
    St,
    Alu(AluOp),
}

impl Opcode {
    /// Raw byte as stored in memory.
    pub const fn byte(self) -> u8 {
        match self {
            Self::Nop => 0b0000_0000,
            Self::Halt => 0b0000_0001,
            Self::Ret => 0b0001_0001,
            Self::Push => 0b0100_0101,
            Self::Pop => 0b0100_0110,
            Self::Prn => 0b0100_0111,
            Self::Pra => 0b0100_1000,
            Self::Call => 0b0101_0000,
            Self::Jmp => 0b0101_0100,
            Self::Jeq => 0b0101_0101,
            Self::Jne => 0b0101_0110,
            Self::Jgt => 0b0101_0111,
            Self::Jlt => 0b0101_1000,
            Self::Jle => 0b0101_1001,
            Self::Jge => 0b0101_1010,
            Self::Ldi => 0b1000_0010,
            Self::Ld => 0b1000_0011,
            Self::St => 0b1000_0100,
            Self::Alu(op) => match op {
                AluOp::Add => 0b1010_0000,
                AluOp::Sub => 0b1010_0001,
                AluOp::Mul => 0b1010_0010,
                AluOp::Div => 0b1010_0011,
                AluOp::Mod => 0b1010_0100,
                AluOp::Cmp => 0b1010_0111,
                AluOp::And => 0b1010_1000,
                AluOp::Not => 0b1010_1001,
                AluOp::Or => 0b1010_1010,
                AluOp::Xor => 0b1010_1011,
                AluOp::Shl => 0b1010_1100,
                AluOp::Shr => 0b1010_1101,
            },
        }
    }

    /// Number of operand bytes following the opcode, taken from bits 6-7.
    pub const fn operand_count(self) -> u8 {
        operand_count(self.byte())
    }

    /// Whether the handler positions PC itself (bit 4).
    pub const fn sets_pc(self) -> bool {
        sets_pc(self.byte())
    }

    /// Distance from this opcode to the next one in memory.
    pub const fn width(self) -> u8 {
        self.operand_count() + 1
    }

    pub const fn is_alu(self) -> bool {
        matches!(self, Self::Alu(_))
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Halt => "HALT",
            Self::Ret => "RET",
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Prn => "PRN",
            Self::Pra => "PRA",
            Self::Call => "CALL",
            Self::Jmp => "JMP",
            Self::Jeq => "JEQ",
            Self::Jne => "JNE",
            Self::Jgt => "JGT",
            Self::Jlt => "JLT",
            Self::Jle => "JLE",
            Self::Jge => "JGE",
            Self::Ldi => "LDI",
            Self::Ld => "LD",
            Self::St => "ST",
            Self::Alu(op) => match op {
                AluOp::Add => "ADD",
                AluOp::Sub => "SUB",
                AluOp::Mul => "MUL",
                AluOp::Div => "DIV",
                AluOp::Mod => "MOD",
                AluOp::Cmp => "CMP",
                AluOp::And => "AND",
                AluOp::Not => "NOT",
                AluOp::Or => "OR",
                AluOp::Xor => "XOR",
                AluOp::Shl => "SHL",
                AluOp::Shr => "SHR",
            },
        }
    }

    /// All opcodes, general instructions first.
    pub const ALL: [Opcode; 30] = [
        Self::Nop,
        Self::Halt,
        Self::Ret,
        Self::Push,
        Self::Pop,
        Self::Prn,
        Self::Pra,
        Self::Call,
        Self::Jmp,
        Self::Jeq,
        Self::Jne,
        Self::Jgt,
        Self::Jlt,
        Self::Jle,
        Self::Jge,
        Self::Ldi,
        Self::Ld,
        Self::St,
        Self::Alu(AluOp::Add),
        Self::Alu(AluOp::Sub),
        Self::Alu(AluOp::Mul),
        Self::Alu(AluOp::Div),
        Self::Alu(AluOp::Mod),
        Self::Alu(AluOp::Cmp),
        Self::Alu(AluOp::And),
        Self::Alu(AluOp::Not),
        Self::Alu(AluOp::Or),
        Self::Alu(AluOp::Xor),
        Self::Alu(AluOp::Shl),
        Self::Alu(AluOp::Shr),
    ];
}

/// Operand count of any byte, whether or not it is a valid opcode.
pub const fn operand_count(byte: u8) -> u8 {
    (byte >> 6) & 0b11
}

pub const fn sets_pc(byte: u8) -> bool {
    (byte >> 4) & 1 == 1
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.byte() == byte)
            .ok_or(byte)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_opcode() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.byte()), Ok(op), "{op}");
        }
        assert_eq!(Opcode::try_from(0xFF), Err(0xFF));
        assert_eq!(Opcode::try_from(0b1010_0101), Err(0b1010_0101));
    }

    #[test]
    fn bytes_are_unique() {
        for (i, a) in Opcode::ALL.iter().enumerate() {
            for b in &Opcode::ALL[i + 1..] {
                assert_ne!(a.byte(), b.byte(), "{a} and {b} share a byte");
            }
        }
    }

    #[test]
    fn operand_counts() {
        #[rustfmt::skip]
        let cases = [
            (Opcode::Halt, 0), (Opcode::Nop, 0), (Opcode::Ret, 0),
            (Opcode::Prn, 1), (Opcode::Push, 1), (Opcode::Pop, 1),
            (Opcode::Call, 1), (Opcode::Jmp, 1), (Opcode::Jeq, 1), (Opcode::Jne, 1),
            (Opcode::Ldi, 2), (Opcode::Alu(AluOp::Mul), 2), (Opcode::Alu(AluOp::Not), 2),
        ];
        for (op, count) in cases {
            assert_eq!(op.operand_count(), count, "{op}");
        }
    }

    #[test]
    fn self_positioning() {
        for op in Opcode::ALL {
            let expected = matches!(
                op,
                Opcode::Call
                    | Opcode::Ret
                    | Opcode::Jmp
                    | Opcode::Jeq
                    | Opcode::Jne
                    | Opcode::Jgt
                    | Opcode::Jlt
                    | Opcode::Jle
                    | Opcode::Jge
            );
            assert_eq!(op.sets_pc(), expected, "{op}");
        }
    }

    #[test]
    fn alu_bit_matches_category() {
        for op in Opcode::ALL {
            assert_eq!(op.byte() & 0b0010_0000 != 0, op.is_alu(), "{op}");
            if op.is_alu() {
                assert_eq!(op.operand_count(), 2, "{op}");
            }
        }
    }
}
