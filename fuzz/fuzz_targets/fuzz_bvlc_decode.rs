#![no_main]

use bacwire_datalink::Bvlc;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Bvlc::from_bytes(data) {
        // Anything that decodes must encode again.
        let _ = frame.to_bytes();
    }
});
