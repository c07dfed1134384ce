//! TON account addresses.
//!
//! Two textual forms are accepted:
//! - raw: `<workchain>:<64 hex chars>`, e.g. `0:e4d9...6f76`
//! - user-friendly: 48 base64 or base64url characters encoding
//!   `flags | workchain | hash | crc16`, e.g. `EQDk2VTv...`

use crate::error::{AuthError, Result};
use base64::prelude::*;
use std::fmt;
use std::str::FromStr;

const FRIENDLY_LEN: usize = 48;
const FRIENDLY_BYTES: usize = 36;

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TESTNET: u8 = 0x80;

/// An account identity: workchain id plus the 32-byte account hash
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub workchain: i32,
    pub hash: [u8; 32],
}

impl Address {
    pub fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parse either the raw or the user-friendly form
    ///
    /// Input is taken exactly as given; surrounding whitespace is malformed.
    ///
    /// # Example
    /// ```rust
    /// use ton_proof_jwt::Address;
    ///
    /// let raw = format!("0:{}", "ab".repeat(32));
    /// let address = Address::parse(&raw).unwrap();
    /// assert_eq!(address.workchain, 0);
    ///
    /// let friendly = address.to_friendly(true, false);
    /// assert_eq!(Address::parse(&friendly).unwrap(), address);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains(':') {
            Self::parse_raw(input)
        } else {
            Self::parse_friendly(input)
        }
    }

    fn parse_raw(input: &str) -> Result<Self> {
        let (workchain, hash_hex) = input
            .split_once(':')
            .ok_or_else(|| malformed("missing workchain separator"))?;

        let workchain = workchain
            .parse::<i32>()
            .map_err(|_| malformed("workchain is not an integer"))?;

        if hash_hex.len() != 64 {
            return Err(malformed("account hash must be 64 hex characters"));
        }
        let mut hash = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash)
            .map_err(|_| malformed("account hash is not hex"))?;

        Ok(Self { workchain, hash })
    }

    fn parse_friendly(input: &str) -> Result<Self> {
        if input.len() != FRIENDLY_LEN {
            return Err(malformed("user-friendly address must be 48 characters"));
        }

        let bytes = BASE64_URL_SAFE
            .decode(input)
            .or_else(|_| BASE64_STANDARD.decode(input))
            .map_err(|_| malformed("user-friendly address is not base64"))?;
        if bytes.len() != FRIENDLY_BYTES {
            return Err(malformed("user-friendly address must decode to 36 bytes"));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16(&bytes[..34]) != expected {
            return Err(malformed("address checksum mismatch"));
        }

        let tag = bytes[0] & !FLAG_TESTNET;
        if tag != FLAG_BOUNCEABLE && tag != FLAG_NON_BOUNCEABLE {
            return Err(malformed("unknown address flags"));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);

        Ok(Self {
            workchain: bytes[1] as i8 as i32,
            hash,
        })
    }

    /// Render the user-friendly, URL-safe form
    ///
    /// Only workchains that fit in a signed byte have a user-friendly form;
    /// other values are truncated to their low byte.
    pub fn to_friendly(&self, bounceable: bool, testnet: bool) -> String {
        let mut flags = if bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if testnet {
            flags |= FLAG_TESTNET;
        }

        let mut bytes = Vec::with_capacity(FRIENDLY_BYTES);
        bytes.push(flags);
        bytes.push(self.workchain as i8 as u8);
        bytes.extend_from_slice(&self.hash);
        let crc = crc16(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());

        BASE64_URL_SAFE.encode(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for Address {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn malformed(msg: &str) -> AuthError {
    AuthError::MalformedInput(format!("invalid address: {msg}"))
}

/// CRC-16/XMODEM (poly 0x1021, init 0)
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Address {
        let mut hash = [0u8; 32];
        for (i, b) in hash.iter_mut().enumerate() {
            *b = i as u8 * 7;
        }
        Address::new(0, hash)
    }

    #[test]
    fn test_crc16_xmodem_check_value() {
        assert_eq!(crc16(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_parse_raw() {
        let raw = format!("-1:{}", "0f".repeat(32));
        let address = Address::parse(&raw).unwrap();
        assert_eq!(address.workchain, -1);
        assert_eq!(address.hash, [0x0f; 32]);
        assert_eq!(address.to_string(), raw);
    }

    #[test]
    fn test_raw_rejects_short_hash() {
        let raw = format!("0:{}", "0f".repeat(31));
        assert!(matches!(
            Address::parse(&raw),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_raw_rejects_non_hex() {
        let raw = format!("0:{}", "zz".repeat(32));
        assert!(Address::parse(&raw).is_err());
    }

    #[test]
    fn test_friendly_forms_parse_to_same_address() {
        let address = sample();
        for (bounceable, testnet) in [(true, false), (false, false), (true, true)] {
            let friendly = address.to_friendly(bounceable, testnet);
            assert_eq!(friendly.len(), 48);
            assert_eq!(Address::parse(&friendly).unwrap(), address);
        }
    }

    #[test]
    fn test_bounceable_mainnet_prefix() {
        // flags 0x11 + workchain 0x00 always encode as "EQ"
        assert!(sample().to_friendly(true, false).starts_with("EQ"));
        assert!(sample().to_friendly(false, false).starts_with("UQ"));
    }

    #[test]
    fn test_standard_alphabet_accepted() {
        let address = sample();
        let standard = address
            .to_friendly(true, false)
            .replace('-', "+")
            .replace('_', "/");
        assert_eq!(Address::parse(&standard).unwrap(), address);
    }

    #[test]
    fn test_friendly_rejects_bad_checksum() {
        let friendly = sample().to_friendly(true, false);
        let mut bytes = BASE64_URL_SAFE.decode(&friendly).unwrap();
        bytes[35] ^= 0x01;
        let tampered = BASE64_URL_SAFE.encode(bytes);
        assert!(matches!(
            Address::parse(&tampered),
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_friendly_rejects_tampered_hash() {
        let friendly = sample().to_friendly(true, false);
        let mut bytes = BASE64_URL_SAFE.decode(&friendly).unwrap();
        bytes[10] ^= 0xff;
        let tampered = BASE64_URL_SAFE.encode(bytes);
        assert!(Address::parse(&tampered).is_err());
    }

    #[test]
    fn test_friendly_rejects_wrong_length() {
        let friendly = sample().to_friendly(true, false);
        assert!(Address::parse(&friendly[..44]).is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_masterchain_friendly_roundtrip_keeps_sign() {
        let address = Address::new(-1, [0x42; 32]);
        let parsed = Address::parse(&address.to_friendly(true, false)).unwrap();
        assert_eq!(parsed.workchain, -1);
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        let raw = sample().to_string();
        let friendly = sample().to_friendly(true, false);
        for input in [
            format!(" {raw}"),
            format!("{raw}\n"),
            format!("{friendly} "),
            format!("\t{friendly}"),
        ] {
            assert!(
                matches!(Address::parse(&input), Err(AuthError::MalformedInput(_))),
                "{input:?}"
            );
        }
    }
}
