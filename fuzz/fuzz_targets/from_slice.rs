#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate tdns;

use tdns::types::Message;

fuzz_target!(|data: &[u8]| {
    #[allow(unused_must_use)]
    {
        Message::from_slice(data);
    }
});
