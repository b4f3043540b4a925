//! Validate health certificates against business-rule documents.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use cert_rules::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};

/// Default host that talks to the real terminal and process.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args())
}
