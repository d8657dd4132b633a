use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use ls8::{Cpu, Program};

/// ls8 runs programs for the LS-8, a tiny 8-bit register machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.ls8` or binary `.bin` file and print its output
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        /// Print machine state before every instruction (also `LS8_TRACE=1`)
        #[arg(short, long)]
        trace: bool,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Stop with an error after this many instructions (also `LS8_MAX_STEPS`)
        #[arg(long, value_name = "COUNT")]
        max_steps: Option<u64>,
    },
    /// Check a `.ls8` file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Create binary `.bin` image from a `.ls8` file
    Compile {
        /// `.ls8` file to compile
        name: PathBuf,
        /// Destination to output .bin file
        dest: Option<PathBuf>,
    },
    /// List the instructions in a program
    Disasm {
        /// `.ls8` or `.bin` file to list
        name: PathBuf,
    },
}

fn main() -> Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;
    ls8::env::init()?;

    match args.command {
        Some(Command::Run {
            name,
            trace,
            minimal,
            max_steps,
        }) => run(&name, trace, minimal, max_steps),
        Some(Command::Check { name }) => {
            file_message(Green, "Checking", &name);
            let program = load(&name)?;
            message(
                Green,
                "Success",
                &format!("no errors found! ({} bytes)", program.len()),
            );
            Ok(())
        }
        Some(Command::Compile { name, dest }) => {
            file_message(Green, "Assembling", &name);
            let program = load(&name)?;
            let out_file_name = match dest {
                Some(dest) => dest,
                None => name.with_extension("bin"),
            };
            fs::write(&out_file_name, program.bytes()).into_diagnostic()?;

            message(Green, "Finished", "emit binary");
            file_message(Green, "Saved", &out_file_name);
            Ok(())
        }
        Some(Command::Disasm { name }) => {
            let program = load(&name)?;
            let mut stdout = io::stdout().lock();
            for instr in program.instructions() {
                let raw: Vec<String> = instr.raw.iter().map(|b| format!("{b:02X}")).collect();
                writeln!(stdout, "{:02X}: {:<8}  {}", instr.addr, raw.join(" "), instr)
                    .into_diagnostic()?;
            }
            Ok(())
        }
        None => match args.path {
            Some(path) => run(&path, false, false, None),
            None => {
                println!("\n~ ls8 v{VERSION} ~");
                println!("{SHORT_INFO}");
                Ok(())
            }
        },
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if ls8::output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

fn run(name: &Path, trace: bool, minimal: bool, max_steps: Option<u64>) -> Result<()> {
    ls8::output::set_minimal(minimal);

    file_message(MsgColor::Green, "Loading", name);
    let program = load(name)?;

    let mut cpu = Cpu::new(&program);
    cpu.set_trace(trace || ls8::env::is_trace_enabled());
    cpu.set_max_steps(max_steps.or_else(ls8::env::max_steps));

    message(MsgColor::Green, "Running", "loaded program");
    let mut stdout = io::stdout().lock();
    if let Err(e) = cpu.run(&mut stdout) {
        // Keep output printed before the failure
        if let Err(flush) = stdout.flush() {
            eprintln!("failed to flush output: {flush}");
        }
        message(
            MsgColor::Red,
            "Failed",
            &format!("after {} instructions", cpu.steps()),
        );
        return Err(ls8::run_failed(e));
    }

    message(MsgColor::Cyan, "Halted", &format!("after {} instructions", cpu.steps()));
    Ok(())
}

/// Binary image for `.bin`, program text for anything else.
fn load(name: &Path) -> Result<Program> {
    match name.extension().and_then(|ext| ext.to_str()) {
        Some("bin") => {
            let raw = fs::read(name).into_diagnostic()?;
            Program::from_raw(&raw)
        }
        _ => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            Program::parse(&contents)
        }
    }
}

const SHORT_INFO: &str = r"
Welcome to ls8, an emulator for the LS-8 8-bit register machine.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
