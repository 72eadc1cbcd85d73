//! Checks every `increment` tier against the expected output.
//!
//! Prints the host capabilities and the dispatched selection, then runs each
//! tier the host supports on `[2, 3, 4, 5]` and compares with `[3, 4, 5, 6]`.
//! Exits non-zero if any result differs.

use std::process::ExitCode;
use tierdispatch::kernels::increment::{increment_fallback, TOLERANCE};
use tierdispatch::kernels::{
    increment_kernel, increment_registry, selected_tiers, IncrementFn, INCREMENT,
};
use tierdispatch::{dispatch::dispatch_config, host_capabilities};

const INITIAL: [f32; 4] = [2.0, 3.0, 4.0, 5.0];
const EXPECTED: [f32; 4] = [3.0, 4.0, 5.0, 6.0];

/// Run `kernel` once and report whether it produced [`EXPECTED`].
fn check(label: &str, kernel: IncrementFn) -> bool {
    let mut four = INITIAL;
    kernel(&mut four);
    println!("Using {label}.");

    match TOLERANCE.first_mismatch(&EXPECTED, &four) {
        None => true,
        Some(i) => {
            println!(
                "Increment function failed, got {:.6} expected {:.6}.",
                four[i], EXPECTED[i]
            );
            false
        }
    }
}

fn main() -> ExitCode {
    let host = host_capabilities();
    println!("Host capabilities: {host}");
    println!("Effective capabilities: {}", dispatch_config().apply(host));

    let mut ok = true;

    let selected = increment_kernel();
    println!("Dispatched {INCREMENT} to {}.", selected.label());
    ok &= check(selected.label(), selected.kernel());

    let registry = match increment_registry() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("Failed to build the kernel registry: {err}");
            return ExitCode::FAILURE;
        }
    };
    let entries = match registry.entries_for(INCREMENT) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for entry in entries {
        match entry.extension() {
            Some(ext) if !host.contains(ext) => {
                println!("Skipping {}: not available.", entry.label());
            }
            _ => ok &= check(entry.label(), entry.kernel()),
        }
    }

    ok &= check("reference", increment_fallback);

    for selection in selected_tiers() {
        println!("{selection}");
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
