#![no_main]

use bacwire_core::{DecodeOptions, Npdu};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = Npdu::decode_with_diagnostics(data, DecodeOptions::default());
    let _ = Npdu::decode_with_diagnostics(data, DecodeOptions::strict());
});
