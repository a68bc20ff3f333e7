//! Random operation sequences must behave the same on the mailbox service and
//! on the reference model, and no mailbox may outgrow the retention window.

#![no_main]

use std::num::NonZeroUsize;

use libfuzzer_sys::fuzz_target;
use pairbox_harness::{ModelWorld, Operation, ParticipantIndex, RealWorld, model::PARTICIPANTS};

fuzz_target!(|input: (u64, u8, Vec<Operation>)| {
    let (seed, retention, operations) = input;
    let retention = NonZeroUsize::new(usize::from(retention % 12) + 1).unwrap();

    let mut model = ModelWorld::new(retention);
    let mut real = RealWorld::new(seed, retention);

    for op in operations.iter().take(256) {
        assert_eq!(real.apply(op), model.apply(op), "diverged on {op:?}");
    }

    let participants = PARTICIPANTS as ParticipantIndex;
    for owner in 0..participants {
        for counterpart in 0..participants {
            assert!(real.mailbox_len(owner, counterpart) <= retention.get());
        }
    }
});
