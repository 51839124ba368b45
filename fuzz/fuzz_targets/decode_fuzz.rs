//! Decode fuzz target: arbitrary text as a TC string against the bundled definitions.
//! Decoding must not panic; anything that decodes must also re-encode.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let codec = tcfbits::Codec::tcf();
    if let Ok(consent) = codec.decode(s) {
        let _ = codec.encode(&consent);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
