use rusticata_macros::newtype_enum;

/// Constructed bit of an identifier octet
pub const CONSTRUCTED: u8 = 0x20;

/// Universal tag numbers (low-tag-number form, as a single identifier octet)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub u8);

newtype_enum! {
impl debug Tag {
    EndOfContent = 0x0,
    Boolean = 0x1,
    Integer = 0x2,
    BitString = 0x3,
    OctetString = 0x4,
    Null = 0x05,
    Oid = 0x06,
    Enumerated = 0xa,
    Utf8String = 0xc,

    Sequence = 0x10,
    Set = 0x11,
    PrintableString = 0x13,
    Ia5String = 0x16,
    UtcTime = 0x17,
    GeneralizedTime = 0x18,
}
}

impl Tag {
    /// Identifier octet of the primitive encoding
    #[inline]
    pub const fn byte(self) -> u8 {
        self.0
    }

    /// Identifier octet of the constructed encoding
    #[inline]
    pub const fn constructed(self) -> u8 {
        self.0 | CONSTRUCTED
    }
}

/// Identifier octet of a SEQUENCE
pub const SEQUENCE: u8 = Tag::Sequence.constructed();
/// Identifier octet of a SET
pub const SET: u8 = Tag::Set.constructed();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_bytes() {
        assert_eq!(SEQUENCE, 0x30);
        assert_eq!(SET, 0x31);
        assert_eq!(Tag::Integer.byte(), 0x02);
        assert_eq!(format!("{:?}", Tag::Oid), "Oid");
    }
}
