#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_harness::{Operation, check_equivalence};

fuzz_target!(|ops: Vec<Operation>| {
    if let Err(divergence) = check_equivalence(&ops) {
        panic!("{divergence}");
    }
});
