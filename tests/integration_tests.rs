use assert_cmd::Command;
use predicates::str::{contains, diff, is_empty};

fn ls8() -> Command {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.env_remove("LS8_TRACE").env_remove("LS8_MAX_STEPS");
    cmd
}

fn run_minimal(file: &str) -> assert_cmd::assert::Assert {
    ls8()
        .arg("run")
        .arg(format!("tests/files/{file}"))
        .arg("--minimal")
        .assert()
}

#[test]
fn runs_without_arguments() {
    ls8().assert().success();
}

#[test]
fn runs_print8() {
    run_minimal("print8.ls8")
        .success()
        .stdout(diff("8\n"))
        .stderr(is_empty());
}

#[test]
fn runs_mult() {
    run_minimal("mult.ls8").success().stdout(diff("72\n"));
}

#[test]
fn runs_subroutines() {
    run_minimal("call.ls8")
        .success()
        .stdout(diff("20\n30\n36\n60\n"));
}

#[test]
fn runs_stack() {
    run_minimal("stack.ls8").success().stdout(diff("2\n4\n1\n"));
}

#[test]
fn jeq_skips_print() {
    run_minimal("jeq.ls8").success().stdout(is_empty());
}

#[test]
fn prints_ascii() {
    run_minimal("hello.ls8").success().stdout(diff("Hi\n"));
}

#[test]
fn runs_path_shorthand() {
    ls8()
        .arg("tests/files/mult.ls8")
        .assert()
        .success()
        .stdout(diff("72\n"))
        .stderr(contains("Halted"));
}

#[test]
fn unknown_opcode_fails() {
    run_minimal("unknown.ls8")
        .code(1)
        .stdout(is_empty())
        .stderr(contains("Unknown instruction: 255"));
}

#[test]
fn division_by_zero_fails() {
    run_minimal("divzero.ls8")
        .code(1)
        .stdout(is_empty())
        .stderr(contains("Division by zero"));
}

#[test]
fn step_limit_stops_loop() {
    ls8()
        .args(["run", "tests/files/loop.ls8", "--minimal", "--max-steps", "100"])
        .assert()
        .code(1)
        .stderr(contains("did not halt within 100 instructions"));

    ls8()
        .args(["run", "tests/files/loop.ls8", "--minimal"])
        .env("LS8_MAX_STEPS", "50")
        .assert()
        .code(1)
        .stderr(contains("did not halt within 50 instructions"));
}

#[test]
fn bad_step_limit_variable_fails() {
    ls8()
        .args(["run", "tests/files/print8.ls8", "--minimal"])
        .env("LS8_MAX_STEPS", "abc")
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("LS8_MAX_STEPS"))
        .stderr(contains("abc"));
}

#[test]
fn reports_failure_status() {
    ls8()
        .args(["run", "tests/files/divzero.ls8"])
        .assert()
        .code(1)
        .stderr(contains("Failed"))
        .stderr(contains("Division by zero"));
}

#[test]
fn traces_instructions() {
    ls8()
        .args(["run", "tests/files/print8.ls8", "--minimal", "--trace"])
        .assert()
        .success()
        .stdout(diff("8\n"))
        .stderr(contains("TRACE: 00 | 82 00 08 | 00 | 00 00 00 00 00 00 00 F4"))
        .stderr(contains("TRACE: 03 | 47 00 01 | 00 | 08 00 00 00 00 00 00 F4"));

    ls8()
        .args(["run", "tests/files/print8.ls8", "--minimal"])
        .env("LS8_TRACE", "1")
        .assert()
        .success()
        .stderr(contains("TRACE: 05 | 01"));
}

#[test]
fn checks_programs() {
    ls8()
        .args(["check", "tests/files/call.ls8"])
        .assert()
        .success()
        .stderr(contains("30 bytes"));

    ls8()
        .args(["check", "tests/files/bad_literal.ls8"])
        .assert()
        .code(1)
        .stderr(contains("invalid literal"));
}

#[test]
fn disassembles() {
    ls8()
        .args(["disasm", "tests/files/mult.ls8"])
        .assert()
        .success()
        .stdout(contains("00: 82 00 08  LDI R0, 8"))
        .stdout(contains("06: A2 00 01  MUL R0, R1"))
        .stdout(contains("0B: 01        HALT"));
}

#[test]
fn compiles_and_runs_binary() {
    let dest = std::env::temp_dir().join(format!("ls8-mult-{}.bin", std::process::id()));

    ls8()
        .arg("compile")
        .arg("tests/files/mult.ls8")
        .arg(&dest)
        .assert()
        .success();
    let bytes = std::fs::read(&dest).unwrap();
    assert_eq!(bytes, [0x82, 0, 8, 0x82, 1, 9, 0xA2, 0, 1, 0x47, 0, 0x01]);

    ls8()
        .arg("run")
        .arg(&dest)
        .arg("--minimal")
        .assert()
        .success()
        .stdout(diff("72\n"));

    let _ = std::fs::remove_file(&dest);
}
