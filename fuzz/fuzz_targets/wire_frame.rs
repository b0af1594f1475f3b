#![no_main]

use facecast_wire::{decode_bytes, encode};
use libfuzzer_sys::fuzz_target;

// Any datagram either decodes to a finite snapshot that survives a
// re-encode, or is rejected.
fuzz_target!(|data: &[u8]| {
    if let Ok(snapshot) = decode_bytes(data) {
        assert!(snapshot.first_non_finite().is_none());
        let frame = encode(&snapshot).expect("decoded snapshot must encode");
        assert_eq!(frame.decode().expect("re-encoded frame must decode"), snapshot);
    }
});
