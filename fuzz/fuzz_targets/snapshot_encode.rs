#![no_main]

use arbitrary::Arbitrary;
use facecast_core::{Channel, TrackingSnapshot};
use facecast_wire::encode;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    values: [f32; 21],
}

fuzz_target!(|input: Input| {
    let mut snapshot = TrackingSnapshot::zeroed();
    for (channel, value) in Channel::ALL.iter().zip(input.values) {
        snapshot.set(*channel, value);
    }

    match encode(&snapshot) {
        Ok(frame) => {
            let decoded = frame.decode().expect("encoded frame must decode");
            for channel in Channel::ALL {
                assert_eq!(
                    decoded.get(channel).to_bits(),
                    snapshot.get(channel).to_bits(),
                    "{}",
                    channel
                );
            }
        }
        Err(_) => assert!(snapshot.first_non_finite().is_some()),
    }
});
