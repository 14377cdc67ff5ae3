//! Fuzz target for `Action` parsing from the `a,b,c` text form.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mx_common::Action;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(action) = text.parse::<Action>() {
        // Display output must parse back to the same action.
        let again: Action = action.to_string().parse().unwrap();
        assert_eq!(action, again);
    }
});
