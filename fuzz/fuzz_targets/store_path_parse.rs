//! Path parsing either rejects input or yields segments that rebuild the
//! same path.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pairbox_core::StorePath;

fuzz_target!(|text: &str| {
    let Ok(path) = StorePath::parse(text) else {
        return;
    };

    assert!(path.segments().iter().all(|s| !s.is_empty() && !s.contains('/')));

    let rebuilt = StorePath::from_segments(path.segments().to_vec()).unwrap();
    assert_eq!(rebuilt, path);
    assert_eq!(StorePath::parse(&path.to_string()).unwrap(), path);
});
