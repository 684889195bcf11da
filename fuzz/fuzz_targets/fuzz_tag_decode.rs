#![no_main]

use bacwire_core::encoding::{reader::Reader, tag::Tag, writer::Writer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut r = Reader::new(data);
    while let Ok(tag) = Tag::decode(&mut r) {
        let mut w = Writer::new();
        if tag.encode(&mut w).is_ok() {
            assert_eq!(w.position_bits(), tag.bit_length());
        }
    }
});
