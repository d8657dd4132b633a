use std::fmt::Write as _;

use miette::Result;

use crate::error;
use crate::opcode::Opcode;
use crate::span::Span;
use crate::state::MEMORY_SIZE;

/// Program image, placed in memory from address 0.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    /// Parse program text: one 8-bit binary literal per line, `#` starts a comment.
    pub fn parse(src: &str) -> Result<Program> {
        let mut bytes = Vec::new();

        for line in src.lines() {
            // Strip comment and surrounding whitespace
            let literal = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            }
            .trim();
            if literal.is_empty() {
                continue;
            }

            let span = Span::within(src, literal);
            let byte = parse_binary(literal).ok_or_else(|| error::load_bad_literal(span, src))?;
            if bytes.len() == MEMORY_SIZE {
                let len = bytes.len() + count_remaining(src, span);
                return Err(error::load_too_long(span, src, len));
            }
            bytes.push(byte);
        }

        Ok(Program { bytes })
    }

    /// Raw binary image, one byte per memory cell.
    pub fn from_raw(raw: &[u8]) -> Result<Program> {
        if raw.len() > MEMORY_SIZE {
            return Err(error::load_raw_too_long(raw.len()));
        }
        Ok(Program {
            bytes: raw.to_vec(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Walk the image as instructions, from address 0.
    ///
    /// Bytes that do not decode are yielded as `Err` and skipped one at a time.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            bytes: &self.bytes,
            addr: 0,
        }
    }

    /// Render back to program text, annotating each instruction with its mnemonic.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for instr in self.instructions() {
            let (head, tail) = instr.raw.split_at(1);
            match instr.opcode {
                Ok(op) => {
                    let _ = writeln!(out, "{:08b} # {}", head[0], instr.display_with(op));
                }
                Err(_) => {
                    let _ = writeln!(out, "{:08b}", head[0]);
                }
            }
            for byte in tail {
                let _ = writeln!(out, "{byte:08b}");
            }
        }
        out
    }
}

/// An instruction at a known address, as stored in a [`Program`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction<'a> {
    pub addr: usize,
    /// Undecodable bytes carry their value.
    pub opcode: Result<Opcode, u8>,
    /// Opcode byte followed by whatever operands fit in the image.
    pub raw: &'a [u8],
}

impl Instruction<'_> {
    fn display_with(&self, op: Opcode) -> String {
        let mut text = op.mnemonic().to_string();
        for (i, operand) in self.raw[1..].iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            // LDI takes an immediate as its second operand
            if op == Opcode::Ldi && i == 1 {
                let _ = write!(text, "{sep}{operand}");
            } else {
                let _ = write!(text, "{sep}R{operand}");
            }
        }
        text
    }
}

impl std::fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.opcode {
            Ok(op) => write!(f, "{}", self.display_with(op)),
            Err(byte) => write!(f, ".byte 0b{byte:08b}"),
        }
    }
}

pub struct Instructions<'a> {
    bytes: &'a [u8],
    addr: usize,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = *self.bytes.get(self.addr)?;
        let opcode = Opcode::try_from(byte);
        let width = match opcode {
            Ok(op) => op.width() as usize,
            Err(_) => 1,
        };
        let end = (self.addr + width).min(self.bytes.len());
        let instr = Instruction {
            addr: self.addr,
            opcode,
            raw: &self.bytes[self.addr..end],
        };
        self.addr = end;
        Some(instr)
    }
}

/// 1 to 8 characters of `0` and `1`.
fn parse_binary(literal: &str) -> Option<u8> {
    if literal.is_empty() || literal.len() > 8 || !literal.chars().all(|c| matches!(c, '0' | '1'))
    {
        return None;
    }
    u8::from_str_radix(literal, 2).ok()
}

/// Non-empty literal lines from `span` to the end of the source.
fn count_remaining(src: &str, span: Span) -> usize {
    src[span.as_range().start..]
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|literal| !literal.is_empty())
        .count()
}
