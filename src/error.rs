use std::{error::Error, fmt, io};

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

/// Fatal condition raised while executing a program.
///
/// None of these are recoverable: the run stops at the instruction that raised it.
#[derive(Debug)]
pub enum RunError {
    /// Byte at PC is not an instruction.
    UnknownOpcode { opcode: u8, pc: u8 },
    /// `DIV` or `MOD` with a zero right-hand register.
    DivisionByZero { pc: u8 },
    /// An address was computed past the end of memory.
    AddressOutOfRange { address: usize, pc: u8 },
    /// An operand named a register that does not exist.
    InvalidRegister { index: u8, pc: u8 },
    /// Push with SP already at address 0.
    StackOverflow { pc: u8 },
    /// Pop with SP already at the last address.
    StackUnderflow { pc: u8 },
    /// Step limit reached before `HALT`.
    StepLimit { limit: u64 },
    /// Output sink refused a write.
    Output(io::Error),
}

impl RunError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOpcode { .. } => "run::unknown_opcode",
            Self::DivisionByZero { .. } => "run::division_by_zero",
            Self::AddressOutOfRange { .. } => "run::address_out_of_range",
            Self::InvalidRegister { .. } => "run::invalid_register",
            Self::StackOverflow { .. } => "run::stack_overflow",
            Self::StackUnderflow { .. } => "run::stack_underflow",
            Self::StepLimit { .. } => "run::step_limit",
            Self::Output(_) => "run::output",
        }
    }

    fn help(&self) -> &'static str {
        match self {
            Self::UnknownOpcode { .. } => "execution may have run past the end of the program; is it missing a HALT?",
            Self::DivisionByZero { .. } => "check the right-hand register before dividing",
            Self::AddressOutOfRange { .. } => "memory spans addresses 0 to 255",
            Self::InvalidRegister { .. } => "registers are numbered 0 to 7",
            Self::StackOverflow { .. } => "the stack grew into address 0; check for runaway recursion",
            Self::StackUnderflow { .. } => "every POP and RET needs a matching PUSH or CALL",
            Self::StepLimit { .. } => "raise the limit with --max-steps or LS8_MAX_STEPS",
            Self::Output(_) => "make sure standard output is still open",
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { opcode, pc } => {
                write!(f, "Unknown instruction: {opcode} (0b{opcode:08b}) at 0x{pc:02X}")
            }
            Self::DivisionByZero { pc } => write!(f, "Division by zero at 0x{pc:02X}"),
            Self::AddressOutOfRange { address, pc } => {
                write!(f, "Address 0x{address:X} is out of range at 0x{pc:02X}")
            }
            Self::InvalidRegister { index, pc } => {
                write!(f, "Invalid register R{index} at 0x{pc:02X}")
            }
            Self::StackOverflow { pc } => write!(f, "Stack overflow at 0x{pc:02X}"),
            Self::StackUnderflow { pc } => write!(f, "Stack underflow at 0x{pc:02X}"),
            Self::StepLimit { limit } => {
                write!(f, "Program did not halt within {limit} instructions")
            }
            Self::Output(e) => write!(f, "Failed to write output: {e}"),
        }
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        Self::Output(e)
    }
}

pub fn run_failed(e: RunError) -> Report {
    miette!(
        severity = Severity::Error,
        code = e.code(),
        help = e.help(),
        "{e}",
    )
}

// Loader errors

pub fn load_bad_literal(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_literal",
        help = "each instruction line holds one binary byte, like 10000010",
        labels = vec![LabeledSpan::at(span.as_range(), "not an 8-bit binary literal")],
        "Encountered an invalid literal.",
    )
    .with_source_code(src.to_owned())
}

pub fn load_too_long(span: Span, src: &str, len: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_long",
        help = "programs share 256 bytes of memory with the stack",
        labels = vec![LabeledSpan::at(span.as_range(), "byte 256 is here")],
        "Program is {len} bytes long and cannot fit in memory.",
    )
    .with_source_code(src.to_owned())
}

pub fn load_raw_too_long(len: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_long",
        help = "programs share 256 bytes of memory with the stack",
        "Image is {len} bytes long and cannot fit in memory.",
    )
}

// Configuration errors

pub fn env_bad_value(name: &str, value: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "config::bad_env",
        help = "set it to a whole number of instructions, or unset it",
        "Environment variable {name} has invalid value `{value}`.",
    )
}
