//! Arbitrary stored text must never panic the message decoder.
//!
//! Blobs that frame correctly must re-encode to the same bytes, and opening
//! them under an unrelated key must fail cleanly.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pairbox_crypto::{SealedMessage, decrypt_message, derive_conversation_key};

fuzz_target!(|data: &[u8]| {
    if let Ok(sealed) = SealedMessage::from_bytes(data) {
        assert_eq!(sealed.to_bytes(), data);

        let key = derive_conversation_key("fuzz-a", "fuzz-b");
        assert!(decrypt_message(&key, &sealed).is_err());
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(sealed) = SealedMessage::parse(text) {
            assert_eq!(SealedMessage::parse(&sealed.encode()), Ok(sealed));
        }
    }
});
