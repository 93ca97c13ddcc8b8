#![no_main]
use libfuzzer_sys::fuzz_target;
use tlvbuf::ParseBuf;

// walk the input as nested TLVs, descending into constructed values
fn walk(pb: &mut ParseBuf<'_, '_>, depth: usize) {
    while pb.can_read(2) {
        let constructed = pb.remaining()[0] & 0x20 != 0;
        match pb.try_read_tag_sub(0) {
            Some(mut sub) => {
                if constructed && depth < 16 {
                    walk(&mut sub, depth + 1);
                } else {
                    let _ = sub.read_integer();
                }
                let _ = sub.finish();
            }
            None => {
                pb.skip_tag(0);
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut pb = ParseBuf::from_static_bytes(data);
    walk(&mut pb, 0);
});
