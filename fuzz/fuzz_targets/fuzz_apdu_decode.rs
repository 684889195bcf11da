#![no_main]

use bacwire_core::Apdu;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(apdu) = Apdu::from_bytes(data) {
        let _ = apdu.to_bytes();
    }
});
