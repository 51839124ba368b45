//! Benchmark: base64 envelope alone, full decode, and decode+encode round trip for TC strings
//! with bitfield vendors, range vendors and additional segments.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tcfbits::bits::encode_int_to_bits;
use tcfbits::{decode_fields, decode_from_base64, encode_fields, Codec, Definitions};

const STRINGS: &[&str] = &[
    "BOEFEAyOEFEAyAHABDENAI4AAAB9vABAASA",
    "CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA",
    "CPXuQIAPXuQIAAfKABENB-CgACAAAAAAAAYgF5wAQF5gAAAA",
    "CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA.IAFKBA.cAAAAAAAAUg",
];

/// Core bits with a 2000-vendor consent bitfield, the common shape of production strings.
fn large_bitfield_core() -> String {
    let header = decode_from_base64(STRINGS[1]).unwrap_or_default();
    let mut bits = header[..213].to_string();
    bits.push_str(&encode_int_to_bits(2000, Some(16)));
    bits.push('0');
    bits.extend((0..2000).map(|i| if i % 3 == 0 { '1' } else { '0' }));
    bits.push_str(&encode_int_to_bits(0, Some(16)));
    bits.push('0');
    bits.push_str(&encode_int_to_bits(0, Some(12)));
    bits
}

fn bench_codec(c: &mut Criterion) {
    let codec = Codec::tcf();

    c.bench_function("base64_only", |b| {
        b.iter(|| {
            for s in STRINGS {
                for part in s.split('.') {
                    black_box(decode_from_base64(black_box(part)).ok());
                }
            }
        })
    });

    c.bench_function("decode", |b| {
        b.iter(|| {
            for s in STRINGS {
                black_box(codec.decode(black_box(s)).ok());
            }
        })
    });

    let decoded: Vec<_> = STRINGS.iter().filter_map(|s| codec.decode(s).ok()).collect();
    c.bench_function("decode_encode", |b| {
        b.iter(|| {
            for s in STRINGS {
                if let Ok(consent) = codec.decode(black_box(s)) {
                    black_box(codec.encode(&consent).ok());
                }
            }
        })
    });

    c.bench_function("encode", |b| {
        b.iter(|| {
            for consent in &decoded {
                black_box(codec.encode(consent).ok());
            }
        })
    });

    let bits = large_bitfield_core();
    let schema = Definitions::tcf().by_version(2).map(|s| s.fields.clone()).unwrap_or_default();
    c.bench_function("walk_2000_vendor_bitfield", |b| {
        b.iter(|| {
            let (record, end) = decode_fields(black_box(&bits), &schema, 0);
            black_box(encode_fields(&record, &schema));
            end
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
