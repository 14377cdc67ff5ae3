//! Fuzz target for portal send response decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mx_core::transport::wire::parse_portal;

fuzz_target!(|data: &[u8]| {
    let _ = parse_portal(data);
});
