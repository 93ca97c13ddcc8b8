//! Object identifier resolution
//!
//! Identifiers are not kept as arcs: decoders resolve the content octets to a numeric
//! [`OidId`]. The first candidate is the sum of the content octets. When the database holds a
//! different identifier under that number, the candidate is moved by [`OID_COLLISION`] until
//! either the stored octets match, or an unused number is reached. In the latter case, the
//! identifier is unknown, and [`OID_NOT_FOUND`] is set in the result.
//!
//! ```rust
//! use tlvbuf::oid::{resolve, KnownOids, OidId};
//!
//! // 1.2.840.113549.1.1.11
//! let sha256_rsa = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
//! assert_eq!(resolve(&sha256_rsa, &KnownOids), OidId::Sha256RsaSig);
//! ```
#[cfg(feature = "oid-database")]
use tlvbuf_oid_macro::encode_oid;
use rusticata_macros::newtype_enum;

/// Offset between candidates sharing the same octet sum
pub const OID_COLLISION: u32 = 1000;

/// Flag set in the identifier of an OID absent from the database
pub const OID_NOT_FOUND: u32 = 0x8000;

/// Numeric identifier of an object identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OidId(pub u32);

newtype_enum! {
impl debug OidId {
    Sha1Alg = 88,
    Sha224Alg = 417,
    Sha256Alg = 414,
    Sha384Alg = 415,
    Sha512Alg = 416,
    Md2Alg = 646,
    Md5Alg = 649,

    RsaKeyAlg = 645,
    Md2RsaSig = 1646,
    Md5RsaSig = 648,
    Sha1RsaSig = 1649,
    IdMgf1 = 652,
    RsassaPss = 654,
    Sha256RsaSig = 655,
    Sha384RsaSig = 656,
    Sha512RsaSig = 657,

    DsaKeyAlg = 515,
    Sha1DsaSig = 517,
    EcdsaKeyAlg = 518,
    Sha1EcdsaSig = 520,
    Sha224EcdsaSig = 523,
    Sha256EcdsaSig = 524,
    Sha384EcdsaSig = 525,
    Sha512EcdsaSig = 526,

    DesEde3Cbc = 1652,
    Aes128Cbc = 1414,
    Aes128Wrap = 1417,
    Aes128Gcm = 418,
    Aes192Cbc = 434,
    Aes192Wrap = 437,
    Aes192Gcm = 438,
    Aes256Cbc = 454,
    Aes256Wrap = 457,
    Aes256Gcm = 458,
    AesCmac = 613,
    AesCbcCmac128 = 149,
    AesCbcCmac192 = 150,
    AesCbcCmac256 = 151,
    AuthEnc256Sum = 687,

    PkcsPbkdf2 = 660,
    PkcsPbes2 = 661,
    PbeSha128Rc4 = 1657,
    PbeSha40Rc4 = 658,
    PbeSha3Des3 = 659,
    PbeSha2Des3 = 1660,
    PbeSha128Rc2 = 1661,
    PbeSha40Rc2 = 662,

    Pkcs12BagTypeKey = 667,
    Pkcs12BagTypeShroud = 668,
    Pkcs12BagTypeCert = 669,
    Pkcs12BagTypeCrl = 670,
    Pkcs12BagTypeSecret = 671,
    Pkcs12BagTypeSafe = 672,
    Pkcs9CertTypeX509 = 675,
    Pkcs9CertTypeSdsi = 676,

    Pkcs7Data = 651,
    Pkcs7SignedData = 2652,
    Pkcs7EnvelopedData = 653,
    Pkcs7SignedEnvelopedData = 1654,
    Pkcs7DigestedData = 1655,
    Pkcs7EncryptedData = 1656,

    Ocsp = 116,
    BasicOcspResponse = 117,
}
}

impl OidId {
    /// False if the identifier was not found in the database
    #[inline]
    pub const fn is_found(self) -> bool {
        self.0 & OID_NOT_FOUND == 0
    }

    /// The identifier without the not-found flag
    #[inline]
    pub const fn value(self) -> u32 {
        self.0 & !OID_NOT_FOUND
    }
}

/// First candidate identifier of some content octets: the sum of the octets
pub fn fingerprint(raw: &[u8]) -> u32 {
    raw.iter().fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
}

/// Mapping from identifiers to the content octets registered under them
pub trait OidDatabase {
    fn lookup(&self, id: OidId) -> Option<&[u8]>;
}

/// Resolve content octets against a database, probing past fingerprint collisions
pub fn resolve(raw: &[u8], db: &dyn OidDatabase) -> OidId {
    let mut candidate = fingerprint(raw);
    loop {
        match db.lookup(OidId(candidate)) {
            None => break,
            Some(known) if known == raw => return OidId(candidate),
            Some(_) => match candidate.checked_add(OID_COLLISION) {
                Some(next) => candidate = next,
                None => break,
            },
        }
    }
    OidId(fingerprint(raw) | OID_NOT_FOUND)
}

#[cfg(feature = "oid-database")]
struct KnownOid {
    id: OidId,
    der: &'static [u8],
}

#[cfg(feature = "oid-database")]
static KNOWN_OIDS: &[KnownOid] = &[
    KnownOid { id: OidId::Sha1Alg, der: &encode_oid!(1.3.14.3.2.26) },
    KnownOid { id: OidId::Sha224Alg, der: &encode_oid!(2.16.840.1.101.3.4.2.4) },
    KnownOid { id: OidId::Sha256Alg, der: &encode_oid!(2.16.840.1.101.3.4.2.1) },
    KnownOid { id: OidId::Sha384Alg, der: &encode_oid!(2.16.840.1.101.3.4.2.2) },
    KnownOid { id: OidId::Sha512Alg, der: &encode_oid!(2.16.840.1.101.3.4.2.3) },
    KnownOid { id: OidId::Md2Alg, der: &encode_oid!(1.2.840.113549.2.2) },
    KnownOid { id: OidId::Md5Alg, der: &encode_oid!(1.2.840.113549.2.5) },
    KnownOid { id: OidId::RsaKeyAlg, der: &encode_oid!(1.2.840.113549.1.1.1) },
    KnownOid { id: OidId::Md2RsaSig, der: &encode_oid!(1.2.840.113549.1.1.2) },
    KnownOid { id: OidId::Md5RsaSig, der: &encode_oid!(1.2.840.113549.1.1.4) },
    KnownOid { id: OidId::Sha1RsaSig, der: &encode_oid!(1.2.840.113549.1.1.5) },
    KnownOid { id: OidId::IdMgf1, der: &encode_oid!(1.2.840.113549.1.1.8) },
    KnownOid { id: OidId::RsassaPss, der: &encode_oid!(1.2.840.113549.1.1.10) },
    KnownOid { id: OidId::Sha256RsaSig, der: &encode_oid!(1.2.840.113549.1.1.11) },
    KnownOid { id: OidId::Sha384RsaSig, der: &encode_oid!(1.2.840.113549.1.1.12) },
    KnownOid { id: OidId::Sha512RsaSig, der: &encode_oid!(1.2.840.113549.1.1.13) },
    KnownOid { id: OidId::DsaKeyAlg, der: &encode_oid!(1.2.840.10040.4.1) },
    KnownOid { id: OidId::Sha1DsaSig, der: &encode_oid!(1.2.840.10040.4.3) },
    KnownOid { id: OidId::EcdsaKeyAlg, der: &encode_oid!(1.2.840.10045.2.1) },
    KnownOid { id: OidId::Sha1EcdsaSig, der: &encode_oid!(1.2.840.10045.4.1) },
    KnownOid { id: OidId::Sha224EcdsaSig, der: &encode_oid!(1.2.840.10045.4.3.1) },
    KnownOid { id: OidId::Sha256EcdsaSig, der: &encode_oid!(1.2.840.10045.4.3.2) },
    KnownOid { id: OidId::Sha384EcdsaSig, der: &encode_oid!(1.2.840.10045.4.3.3) },
    KnownOid { id: OidId::Sha512EcdsaSig, der: &encode_oid!(1.2.840.10045.4.3.4) },
    KnownOid { id: OidId::DesEde3Cbc, der: &encode_oid!(1.2.840.113549.3.7) },
    KnownOid { id: OidId::Aes128Cbc, der: &encode_oid!(2.16.840.1.101.3.4.1.2) },
    KnownOid { id: OidId::Aes128Wrap, der: &encode_oid!(2.16.840.1.101.3.4.1.5) },
    KnownOid { id: OidId::Aes128Gcm, der: &encode_oid!(2.16.840.1.101.3.4.1.6) },
    KnownOid { id: OidId::Aes192Cbc, der: &encode_oid!(2.16.840.1.101.3.4.1.22) },
    KnownOid { id: OidId::Aes192Wrap, der: &encode_oid!(2.16.840.1.101.3.4.1.25) },
    KnownOid { id: OidId::Aes192Gcm, der: &encode_oid!(2.16.840.1.101.3.4.1.26) },
    KnownOid { id: OidId::Aes256Cbc, der: &encode_oid!(2.16.840.1.101.3.4.1.42) },
    KnownOid { id: OidId::Aes256Wrap, der: &encode_oid!(2.16.840.1.101.3.4.1.45) },
    KnownOid { id: OidId::Aes256Gcm, der: &encode_oid!(2.16.840.1.101.3.4.1.46) },
    KnownOid { id: OidId::AesCmac, der: &encode_oid!(2.16.840.1.101.3.4.1.200) },
    // id-CA-ECDH-AES-CBC-CMAC-*
    KnownOid { id: OidId::AesCbcCmac128, der: &encode_oid!(0.4.0.127.0.7.2.2.3.2.2) },
    KnownOid { id: OidId::AesCbcCmac192, der: &encode_oid!(0.4.0.127.0.7.2.2.3.2.3) },
    KnownOid { id: OidId::AesCbcCmac256, der: &encode_oid!(0.4.0.127.0.7.2.2.3.2.4) },
    // id-alg-authEnc-256
    KnownOid { id: OidId::AuthEnc256Sum, der: &encode_oid!(1.2.840.113549.1.9.16.3.16) },
    KnownOid { id: OidId::PkcsPbkdf2, der: &encode_oid!(1.2.840.113549.1.5.12) },
    KnownOid { id: OidId::PkcsPbes2, der: &encode_oid!(1.2.840.113549.1.5.13) },
    KnownOid { id: OidId::PbeSha128Rc4, der: &encode_oid!(1.2.840.113549.1.12.1.1) },
    KnownOid { id: OidId::PbeSha40Rc4, der: &encode_oid!(1.2.840.113549.1.12.1.2) },
    KnownOid { id: OidId::PbeSha3Des3, der: &encode_oid!(1.2.840.113549.1.12.1.3) },
    KnownOid { id: OidId::PbeSha2Des3, der: &encode_oid!(1.2.840.113549.1.12.1.4) },
    KnownOid { id: OidId::PbeSha128Rc2, der: &encode_oid!(1.2.840.113549.1.12.1.5) },
    KnownOid { id: OidId::PbeSha40Rc2, der: &encode_oid!(1.2.840.113549.1.12.1.6) },
    KnownOid { id: OidId::Pkcs12BagTypeKey, der: &encode_oid!(1.2.840.113549.1.12.10.1.1) },
    KnownOid { id: OidId::Pkcs12BagTypeShroud, der: &encode_oid!(1.2.840.113549.1.12.10.1.2) },
    KnownOid { id: OidId::Pkcs12BagTypeCert, der: &encode_oid!(1.2.840.113549.1.12.10.1.3) },
    KnownOid { id: OidId::Pkcs12BagTypeCrl, der: &encode_oid!(1.2.840.113549.1.12.10.1.4) },
    KnownOid { id: OidId::Pkcs12BagTypeSecret, der: &encode_oid!(1.2.840.113549.1.12.10.1.5) },
    KnownOid { id: OidId::Pkcs12BagTypeSafe, der: &encode_oid!(1.2.840.113549.1.12.10.1.6) },
    KnownOid { id: OidId::Pkcs9CertTypeX509, der: &encode_oid!(1.2.840.113549.1.9.22.1) },
    KnownOid { id: OidId::Pkcs9CertTypeSdsi, der: &encode_oid!(1.2.840.113549.1.9.22.2) },
    KnownOid { id: OidId::Pkcs7Data, der: &encode_oid!(1.2.840.113549.1.7.1) },
    KnownOid { id: OidId::Pkcs7SignedData, der: &encode_oid!(1.2.840.113549.1.7.2) },
    KnownOid { id: OidId::Pkcs7EnvelopedData, der: &encode_oid!(1.2.840.113549.1.7.3) },
    KnownOid { id: OidId::Pkcs7SignedEnvelopedData, der: &encode_oid!(1.2.840.113549.1.7.4) },
    KnownOid { id: OidId::Pkcs7DigestedData, der: &encode_oid!(1.2.840.113549.1.7.5) },
    KnownOid { id: OidId::Pkcs7EncryptedData, der: &encode_oid!(1.2.840.113549.1.7.6) },
    KnownOid { id: OidId::Ocsp, der: &encode_oid!(1.3.6.1.5.5.7.48.1) },
    KnownOid { id: OidId::BasicOcspResponse, der: &encode_oid!(1.3.6.1.5.5.7.48.1.1) },
];

/// The built-in table of algorithm and content-type identifiers
#[cfg(feature = "oid-database")]
#[derive(Debug, Default, Clone, Copy)]
pub struct KnownOids;

#[cfg(feature = "oid-database")]
impl OidDatabase for KnownOids {
    fn lookup(&self, id: OidId) -> Option<&[u8]> {
        KNOWN_OIDS.iter().find(|k| k.id == id).map(|k| k.der)
    }
}

/// The database used by the decoders when none is given
#[cfg(feature = "oid-database")]
pub fn default_database() -> Option<&'static dyn OidDatabase> {
    Some(&KnownOids)
}

/// The database used by the decoders when none is given
#[cfg(not(feature = "oid-database"))]
pub fn default_database() -> Option<&'static dyn OidDatabase> {
    None
}

#[cfg(all(test, feature = "oid-database"))]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_oids_resolve_to_themselves() {
        for k in KNOWN_OIDS {
            assert_eq!(resolve(k.der, &KnownOids), k.id, "{:?}", k.der);
        }
    }

    #[test]
    fn test_collision_chains() {
        // every entry is reached from its fingerprint through occupied slots only
        for k in KNOWN_OIDS {
            let fp = fingerprint(k.der);
            assert_eq!((k.id.0 - fp) % OID_COLLISION, 0, "{:?}", k.id);
            let mut id = fp;
            while id < k.id.0 {
                assert!(KnownOids.lookup(OidId(id)).is_some(), "{:?}", k.id);
                id += OID_COLLISION;
            }
        }
    }

    #[test]
    fn test_collisions() {
        // md2 and md2WithRSAEncryption have the same octet sum
        let md2 = hex!("2a 86 48 86 f7 0d 02 02");
        let md2_rsa = hex!("2a 86 48 86 f7 0d 01 01 02");
        assert_eq!(fingerprint(&md2), fingerprint(&md2_rsa));
        assert_eq!(resolve(&md2, &KnownOids), OidId::Md2Alg);
        assert_eq!(resolve(&md2_rsa, &KnownOids), OidId::Md2RsaSig);
        // third in its chain
        let signed_data = hex!("2a 86 48 86 f7 0d 01 07 02");
        assert_eq!(resolve(&signed_data, &KnownOids), OidId::Pkcs7SignedData);
    }

    #[test]
    fn test_unknown_oid() {
        // 1.2.3.4
        let raw = hex!("2a 03 04");
        let id = resolve(&raw, &KnownOids);
        assert!(!id.is_found());
        assert_eq!(id.value(), 0x2a + 3 + 4);
        assert_eq!(id.0, 49 | OID_NOT_FOUND);
        // same sum as a known identifier, other octets
        let raw = hex!("2b 0e 03 02 19 01");
        assert_eq!(fingerprint(&raw), 88);
        assert_eq!(resolve(&raw, &KnownOids), OidId(88 | OID_NOT_FOUND));
    }

    #[test]
    fn test_mac_and_auth_enc() {
        let cmac_256 = hex!("04 00 7f 00 07 02 02 03 02 04");
        assert_eq!(resolve(&cmac_256, &KnownOids), OidId::AesCbcCmac256);
        let auth_enc = hex!("2a 86 48 86 f7 0d 01 09 10 03 10");
        assert_eq!(resolve(&auth_enc, &KnownOids), OidId::AuthEnc256Sum);
        let aes_cmac = hex!("60 86 48 01 65 03 04 01 81 48");
        assert_eq!(resolve(&aes_cmac, &KnownOids), OidId::AesCmac);
    }

    #[test]
    fn test_debug_names() {
        assert_eq!(format!("{:?}", OidId::Sha256RsaSig), "Sha256RsaSig");
    }
}
