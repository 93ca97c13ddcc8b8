//! Compile-time DER encoding of object identifiers.
//!
//! `encode_oid!(1.2.840.113549.1.1.11)` expands to the content octets of the identifier as a
//! byte array literal, without the tag and length header.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use proc_macro::TokenStream;

/// Append one arc in base-128, most significant group first.
fn push_arc(enc: &mut Vec<u8>, arc: &BigUint) {
    if arc.is_zero() {
        enc.push(0);
        return;
    }
    let mut groups = Vec::new();
    let mut v = arc.clone();
    while !v.is_zero() {
        let low = (&v % 128u32).to_u8().unwrap_or(0);
        groups.push(low);
        v = v >> 7usize;
    }
    let last = groups.len() - 1;
    for (i, g) in groups.iter().rev().enumerate() {
        enc.push(if i == last { *g } else { g | 0x80 });
    }
}

fn encode_components(arcs: &[BigUint]) -> Result<Vec<u8>, String> {
    if arcs.len() < 2 {
        return Err("an object identifier needs at least two arcs".to_owned());
    }
    let first = arcs[0].to_u8().filter(|v| *v <= 2);
    let first = first.ok_or_else(|| "first arc must be 0, 1 or 2".to_owned())?;
    if first < 2 && arcs[1] >= BigUint::from(40u8) {
        return Err("second arc must be below 40".to_owned());
    }
    let mut enc = Vec::new();
    push_arc(&mut enc, &(BigUint::from(first) * 40u32 + &arcs[1]));
    for arc in &arcs[2..] {
        push_arc(&mut enc, arc);
    }
    Ok(enc)
}

fn parse_arcs(s: &str) -> Result<Vec<BigUint>, String> {
    s.split('.')
        .map(|segment| segment.trim())
        .map(|segment| {
            segment
                .parse::<BigUint>()
                .map_err(|_| format!("invalid arc `{}`", segment))
        })
        .collect()
}

#[proc_macro]
pub fn encode_oid(input: TokenStream) -> TokenStream {
    let s = input.to_string();
    let out = match parse_arcs(&s).and_then(|arcs| encode_components(&arcs)) {
        Ok(enc) => {
            let bytes: Vec<String> = enc.iter().map(|b| format!("0x{:02x}", b)).collect();
            format!("[{}]", bytes.join(", "))
        }
        Err(e) => format!("compile_error!(\"encode_oid: {}\")", e),
    };
    out.parse().unwrap_or_else(|_| TokenStream::new())
}
