#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    snapdiff_fuzz::fuzz_diff(data);
});
