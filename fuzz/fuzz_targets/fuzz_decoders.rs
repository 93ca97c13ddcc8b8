#![no_main]
use libfuzzer_sys::fuzz_target;
use tlvbuf::asn1::*;
use tlvbuf::DecodeConfig;

fuzz_target!(|data: &[u8]| {
    let _ = get_asn_length(data);
    let _ = get_asn_length_with(data, true);
    let _ = get_asn_sequence_with(data, &DecodeConfig::default().with_indefinite(true));
    let _ = get_asn_set(data);
    let _ = get_asn_integer(data);
    let _ = get_asn_enumerated(data);
    let _ = get_asn_oid(data);
    let _ = get_asn_algorithm_identifier(data);
    let _ = der_tag_span(data, 0);
});
