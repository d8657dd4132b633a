use std::cell::RefCell;
use std::fmt::Write as _;

use colored::Colorize;

use crate::runtime::Cpu;

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Strip color from trace lines. May be called multiple times.
pub fn set_minimal(new_value: bool) -> bool {
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

/// Print machine state at PC to stderr, before the instruction there runs.
///
/// `TRACE: PC | OP A B | FL | R0 .. R7`, all in hex.
pub fn trace(cpu: &Cpu) {
    eprintln!("{}", trace_line(cpu));
}

fn trace_line(cpu: &Cpu) -> String {
    let pc = cpu.pc();
    // Peek past the end of memory as zeroes
    let peek = |offset: usize| cpu.memory().read(pc as usize + offset).unwrap_or(0);

    let mut line = format!(
        "TRACE: {:02X} | {:02X} {:02X} {:02X} | {:02X} |",
        pc,
        peek(0),
        peek(1),
        peek(2),
        cpu.flags().bits(),
    );
    for reg in cpu.registers().iter() {
        let _ = write!(line, " {reg:02X}");
    }

    if is_minimal() {
        line
    } else {
        line.as_str().dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Program;

    #[test]
    fn trace_format() {
        set_minimal(true);
        let program = Program::from_raw(&[0x82, 0, 8, 0x01]).unwrap();
        let mut cpu = Cpu::new(&program);
        assert_eq!(
            trace_line(&cpu),
            "TRACE: 00 | 82 00 08 | 00 | 00 00 00 00 00 00 00 F4"
        );

        cpu.step(&mut Vec::<u8>::new()).unwrap();
        assert_eq!(
            trace_line(&cpu),
            "TRACE: 03 | 01 00 00 | 00 | 08 00 00 00 00 00 00 F4"
        );
    }
}
