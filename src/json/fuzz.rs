//! Grammar-driven random JSON generator (component E).
//!
//! Emits syntactically valid JSON by walking the same grammar
//! [`super::state::JsonParser`] parses, so a generated document is by
//! construction something the parser must accept. Used for differential
//! round-trip testing against `serde_json` rather than a hand-picked corpus
//! of fixtures.

use rand::Rng;

const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz_";
const STRING_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";

/// Generates one random JSON object document (the grammar's root production)
/// with at most `max_depth` levels of nested object/array values.
pub fn generate_object<R: Rng + ?Sized>(rng: &mut R, max_depth: u32) -> Vec<u8> {
    let mut out = Vec::new();
    write_object(rng, max_depth, &mut out);
    out
}

fn write_object<R: Rng + ?Sized>(rng: &mut R, depth: u32, out: &mut Vec<u8>) {
    out.push(b'{');
    let nmembers = rng.random_range(0..5);
    for i in 0..nmembers {
        if i > 0 {
            out.push(b',');
        }
        write_string(rng, KEY_ALPHABET, rng.random_range(0..8), out);
        out.push(b':');
        write_value(rng, depth, out);
    }
    out.push(b'}');
}

fn write_array<R: Rng + ?Sized>(rng: &mut R, depth: u32, out: &mut Vec<u8>) {
    out.push(b'[');
    let nelems = rng.random_range(0..5);
    for i in 0..nelems {
        if i > 0 {
            out.push(b',');
        }
        write_value(rng, depth, out);
    }
    out.push(b']');
}

fn write_value<R: Rng + ?Sized>(rng: &mut R, depth: u32, out: &mut Vec<u8>) {
    let choices: u32 = if depth == 0 { 4 } else { 6 };
    match rng.random_range(0..choices) {
        0 => write_string(rng, STRING_ALPHABET, rng.random_range(0..12), out),
        1 => write_number(rng, out),
        2 => out.extend_from_slice(b"true"),
        3 if rng.random_bool(0.5) => out.extend_from_slice(b"false"),
        3 => out.extend_from_slice(b"null"),
        4 => write_object(rng, depth - 1, out),
        _ => write_array(rng, depth - 1, out),
    }
}

fn write_string<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize, out: &mut Vec<u8>) {
    out.push(b'"');
    for _ in 0..len {
        out.push(alphabet[rng.random_range(0..alphabet.len())]);
    }
    out.push(b'"');
}

fn write_number<R: Rng + ?Sized>(rng: &mut R, out: &mut Vec<u8>) {
    if rng.random_bool(0.2) {
        out.push(b'-');
    }
    if rng.random_bool(0.1) {
        out.push(b'0');
    } else {
        out.push(b'1' + rng.random_range(0..9) as u8);
        for _ in 0..rng.random_range(0..4) {
            out.push(b'0' + rng.random_range(0..10) as u8);
        }
    }
    if rng.random_bool(0.3) {
        out.push(b'.');
        out.push(b'0' + rng.random_range(0..10) as u8);
        for _ in 0..rng.random_range(0..3) {
            out.push(b'0' + rng.random_range(0..10) as u8);
        }
    }
    if rng.random_bool(0.2) {
        out.push(if rng.random_bool(0.5) { b'e' } else { b'E' });
        if rng.random_bool(0.5) {
            out.push(if rng.random_bool(0.5) { b'+' } else { b'-' });
        }
        out.push(b'0' + rng.random_range(1..10) as u8);
    }
}
