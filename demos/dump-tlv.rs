use std::env;
use std::io;
use tlvbuf::asn1::{Tag, CONSTRUCTED};
use tlvbuf::ParseBuf;

fn dump(pb: &mut ParseBuf<'_, '_>, indent: usize) {
    while !pb.is_empty() && pb.is_ok() {
        let tag = pb.remaining()[0];
        let mut sub = pb.read_tag_sub(tag);
        if !sub.is_ok() {
            println!("{:indent$}<malformed TLV at tag 0x{:02x}>", "", tag, indent = indent);
            sub.cancel();
            return;
        }
        if tag & 0x1f == Tag::Oid.byte() && tag & 0xc0 == 0 {
            println!("{:indent$}OID {:x?}", "", sub.remaining(), indent = indent);
        } else if tag & CONSTRUCTED != 0 {
            println!("{:indent$}[0x{:02x}] {} bytes", "", tag, sub.len(), indent = indent);
            dump(&mut sub, indent + 2);
        } else {
            println!("{:indent$}0x{:02x}: {:x?}", "", tag, sub.remaining(), indent = indent);
        }
        let _ = sub.finish();
    }
}

pub fn main() -> io::Result<()> {
    for file_name in env::args().skip(1) {
        let data = std::fs::read(&file_name)?;
        let mut pb = ParseBuf::from_static_bytes(&data);
        dump(&mut pb, 0);
        if !pb.is_ok() {
            println!("WARNING: {}: could not parse the whole file", file_name);
        }
    }
    Ok(())
}
