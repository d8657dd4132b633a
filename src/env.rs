use std::cell::OnceCell;

use miette::Result;

use crate::error::env_bad_value;

const TRACE_VAR: &str = "LS8_TRACE";
const MAX_STEPS_VAR: &str = "LS8_MAX_STEPS";

/// Settings taken from `LS8_*` variables.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
struct Env {
    trace: bool,
    max_steps: Option<u64>,
}

impl Env {
    /// Build settings from a variable lookup, rejecting values that do not parse.
    fn read(lookup: impl Fn(&str) -> Option<String>) -> Result<Env> {
        let trace = lookup(TRACE_VAR).is_some_and(|v| v == "1");
        let max_steps = match lookup(MAX_STEPS_VAR) {
            None => None,
            Some(v) => match v.trim().parse() {
                Ok(limit) => Some(limit),
                Err(_) => return Err(env_bad_value(MAX_STEPS_VAR, &v)),
            },
        };
        Ok(Env { trace, max_steps })
    }
}

thread_local! {
    /// Written once by `init`
    static ENV: OnceCell<Env> = const { OnceCell::new() };
}

/// Read `LS8_*` variables from the process environment.
///
/// Getters return defaults until this has run. Later calls keep the first result.
pub fn init() -> Result<()> {
    let env = Env::read(|name| std::env::var(name).ok())?;
    ENV.with(|cell| {
        let _ = cell.set(env);
    });
    Ok(())
}

fn current() -> Env {
    ENV.with(|cell| cell.get().copied().unwrap_or_default())
}

/// `LS8_TRACE=1`
pub fn is_trace_enabled() -> bool {
    current().trace
}

/// `LS8_MAX_STEPS=<n>`
pub fn max_steps() -> Option<u64> {
    current().max_steps
}
