//! Classical text ciphers applied in front of the Morse encoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cw::{morse_to_text, text_to_morse};
use crate::error::{Error, Result};

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shift used when the caller asks for a shift cipher without an amount
pub const DEFAULT_SHIFT: i32 = 3;

/// Largest shift offered to users; anything is accepted and reduced mod 26
pub const MAX_SHIFT: i32 = 25;

/// Which cipher produced a stored result, without its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CipherKind {
    #[default]
    None,
    Shift,
    Reverse,
    Substitution,
    Combined,
}

impl CipherKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CipherKind::None => "none",
            CipherKind::Shift => "shift",
            CipherKind::Reverse => "reverse",
            CipherKind::Substitution => "substitution",
            CipherKind::Combined => "combined",
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CipherKind::None),
            "shift" | "caesar" => Ok(CipherKind::Shift),
            "reverse" => Ok(CipherKind::Reverse),
            "substitution" | "custom" => Ok(CipherKind::Substitution),
            "combined" => Ok(CipherKind::Combined),
            other => Err(format!("unknown cipher '{}'", other)),
        }
    }
}

/// A cipher together with its key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cipher {
    #[default]
    None,
    Shift(i32),
    Reverse,
    Substitution(String),
    /// Shift, then reverse
    Combined(i32),
}

impl Cipher {
    /// Rebuild a cipher from its stored tag and key.
    ///
    /// Shift amounts that are missing or do not parse fall back to
    /// [`DEFAULT_SHIFT`]; a missing substitution key becomes an empty key,
    /// which leaves text unchanged.
    pub fn from_parts(kind: CipherKind, key: Option<&str>) -> Self {
        let shift = || {
            key.and_then(|k| k.trim().parse::<i32>().ok())
                .unwrap_or(DEFAULT_SHIFT)
        };
        match kind {
            CipherKind::None => Cipher::None,
            CipherKind::Shift => Cipher::Shift(shift()),
            CipherKind::Reverse => Cipher::Reverse,
            CipherKind::Substitution => Cipher::Substitution(key.unwrap_or_default().to_string()),
            CipherKind::Combined => Cipher::Combined(shift()),
        }
    }

    pub fn kind(&self) -> CipherKind {
        match self {
            Cipher::None => CipherKind::None,
            Cipher::Shift(_) => CipherKind::Shift,
            Cipher::Reverse => CipherKind::Reverse,
            Cipher::Substitution(_) => CipherKind::Substitution,
            Cipher::Combined(_) => CipherKind::Combined,
        }
    }

    /// Key in the form stored next to history records
    pub fn key(&self) -> Option<String> {
        match self {
            Cipher::Shift(n) | Cipher::Combined(n) => Some(n.to_string()),
            Cipher::Substitution(key) => Some(key.clone()),
            Cipher::None | Cipher::Reverse => None,
        }
    }

    pub fn encrypt(&self, text: &str) -> String {
        match self {
            Cipher::None => text.to_string(),
            Cipher::Shift(n) => shift_encrypt(text, *n),
            Cipher::Reverse => reverse_encrypt(text),
            Cipher::Substitution(key) => substitution_encrypt(text, key),
            Cipher::Combined(n) => combined_encrypt(text, *n),
        }
    }

    pub fn decrypt(&self, text: &str) -> String {
        match self {
            Cipher::None => text.to_string(),
            Cipher::Shift(n) => shift_decrypt(text, *n),
            Cipher::Reverse => reverse_decrypt(text),
            Cipher::Substitution(key) => substitution_decrypt(text, key),
            Cipher::Combined(n) => combined_decrypt(text, *n),
        }
    }
}

fn rotate(c: char, shift: i32) -> char {
    let base = if c.is_ascii_uppercase() {
        b'A'
    } else if c.is_ascii_lowercase() {
        b'a'
    } else {
        return c;
    };
    let offset = (c as u8 - base) as i32;
    let rotated = (offset + shift).rem_euclid(26) as u8;
    (base + rotated) as char
}

/// Rotate ASCII letters within their case; everything else passes through
pub fn shift_encrypt(text: &str, shift: i32) -> String {
    let shift = shift.rem_euclid(26);
    text.chars().map(|c| rotate(c, shift)).collect()
}

pub fn shift_decrypt(text: &str, shift: i32) -> String {
    shift_encrypt(text, -shift.rem_euclid(26))
}

pub fn reverse_encrypt(text: &str) -> String {
    text.chars().rev().collect()
}

pub fn reverse_decrypt(text: &str) -> String {
    reverse_encrypt(text)
}

/// Uppercased key truncated to the alphabet length, or `None` when too short
fn normalized_key(key: &str) -> Option<Vec<char>> {
    if key.chars().count() < ALPHABET.len() {
        return None;
    }
    Some(key.chars().flat_map(char::to_uppercase).take(ALPHABET.len()).collect())
}

/// Reject shifts outside `0..=MAX_SHIFT`.
///
/// The shift functions accept any amount; this is for user input.
pub fn validate_shift(shift: i32) -> Result<()> {
    if !(0..=MAX_SHIFT).contains(&shift) {
        return Err(Error::InvalidShift { shift });
    }
    Ok(())
}

/// Report a key that the substitution functions would silently ignore
pub fn validate_substitution_key(key: &str) -> Result<()> {
    let len = key.chars().count();
    if len < ALPHABET.len() {
        return Err(Error::InvalidKey { len });
    }
    Ok(())
}

/// Replace each letter with the key letter at the same alphabet position
///
/// A key shorter than 26 characters leaves the text unchanged.
pub fn substitution_encrypt(text: &str, key: &str) -> String {
    let Some(key) = normalized_key(key) else {
        return text.to_string();
    };

    text.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                key[(c as u8 - b'A') as usize]
            } else if c.is_ascii_lowercase() {
                let mapped = key[(c as u8 - b'a') as usize];
                mapped.to_lowercase().next().unwrap_or(mapped)
            } else {
                c
            }
        })
        .collect()
}

/// Inverse of [`substitution_encrypt`]
///
/// Letters that do not appear in the key pass through unchanged.
pub fn substitution_decrypt(text: &str, key: &str) -> String {
    let Some(key) = normalized_key(key) else {
        return text.to_string();
    };

    text.chars()
        .map(|c| {
            let upper = c.to_ascii_uppercase();
            let position = if c.is_ascii_alphabetic() {
                key.iter().position(|&k| k == upper)
            } else {
                None
            };
            match position {
                Some(i) if c.is_ascii_lowercase() => ALPHABET[i].to_ascii_lowercase() as char,
                Some(i) => ALPHABET[i] as char,
                None => c,
            }
        })
        .collect()
}

pub fn combined_encrypt(text: &str, shift: i32) -> String {
    reverse_encrypt(&shift_encrypt(text, shift))
}

pub fn combined_decrypt(text: &str, shift: i32) -> String {
    shift_decrypt(&reverse_decrypt(text), shift)
}

/// Apply the cipher, then translate to Morse
pub fn encrypt_and_encode(text: &str, cipher: &Cipher) -> String {
    text_to_morse(&cipher.encrypt(text))
}

/// Translate from Morse, then undo the cipher
pub fn decode_and_decrypt(code: &str, cipher: &Cipher) -> String {
    cipher.decrypt(&morse_to_text(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "QWERTYUIOPASDFGHJKLZXCVBNM";

    #[test]
    fn test_shift_basic() {
        assert_eq!(shift_encrypt("ABC", 3), "DEF");
        assert_eq!(shift_decrypt("DEF", 3), "ABC");
        assert_eq!(shift_encrypt("xyz", 3), "abc");
        assert_eq!(shift_encrypt("Hello, World!", 13), "Uryyb, Jbeyq!");
    }

    #[test]
    fn test_shift_normalizes_amount() {
        assert_eq!(shift_encrypt("ABC", 29), "DEF");
        assert_eq!(shift_encrypt("ABC", -1), "ZAB");
        assert_eq!(shift_encrypt("ABC", 26), "ABC");
        assert_eq!(shift_encrypt("ABC", i32::MIN), shift_encrypt("ABC", i32::MIN.rem_euclid(26)));
    }

    #[test]
    fn test_shift_round_trip_all_amounts() {
        let text = "TheQuickBrownFoxJumpsOverTheLazyDog";
        for s in 0..=25 {
            assert_eq!(shift_decrypt(&shift_encrypt(text, s), s), text, "shift {}", s);
        }
        assert_eq!(shift_decrypt(&shift_encrypt(text, -40), -40), text);
    }

    #[test]
    fn test_shift_leaves_non_ascii_alone() {
        assert_eq!(shift_encrypt("Été 42", 1), "Éué 42");
    }

    #[test]
    fn test_reverse_is_self_inverse() {
        assert_eq!(reverse_encrypt("HELLO"), "OLLEH");
        for text in ["", "a", "MORSE CODE", "añb"] {
            assert_eq!(reverse_decrypt(&reverse_encrypt(text)), text);
        }
    }

    #[test]
    fn test_substitution() {
        assert_eq!(substitution_encrypt("ABC xyz!", KEY), "QWE bnm!");
        assert_eq!(substitution_decrypt("QWE bnm!", KEY), "ABC xyz!");
        // Lowercase keys behave like uppercase ones
        let lower = KEY.to_lowercase();
        assert_eq!(substitution_encrypt("HELLO", &lower), substitution_encrypt("HELLO", KEY));
    }

    #[test]
    fn test_short_key_is_a_no_op() {
        assert_eq!(substitution_encrypt("HELLO", "ABC"), "HELLO");
        assert_eq!(substitution_decrypt("HELLO", ""), "HELLO");
        assert!(matches!(
            validate_substitution_key("ABC"),
            Err(Error::InvalidKey { len: 3 })
        ));
        assert!(validate_substitution_key(KEY).is_ok());
    }

    #[test]
    fn test_validate_shift_range() {
        assert!(validate_shift(0).is_ok());
        assert!(validate_shift(MAX_SHIFT).is_ok());
        assert!(matches!(validate_shift(26), Err(Error::InvalidShift { shift: 26 })));
        assert!(matches!(validate_shift(-1), Err(Error::InvalidShift { shift: -1 })));
    }

    #[test]
    fn test_long_key_is_truncated() {
        let long = format!("{}EXTRA", KEY);
        assert_eq!(substitution_encrypt("AZ", &long), "QM");
    }

    #[test]
    fn test_combined() {
        assert_eq!(combined_encrypt("ABC", 1), "DCB");
        assert_eq!(combined_decrypt(&combined_encrypt("HELLO", 5), 5), "HELLO");
    }

    #[test]
    fn test_encrypt_and_encode() {
        assert_eq!(encrypt_and_encode("SOS", &Cipher::None), "... --- ...");
        // ABC shifted by 3 is DEF
        assert_eq!(encrypt_and_encode("abc", &Cipher::Shift(3)), "-.. . ..-.");
        assert_eq!(encrypt_and_encode("AB", &Cipher::Reverse), "-... .-");
    }

    #[test]
    fn test_decode_and_decrypt_inverts_each_cipher() {
        let ciphers = [
            Cipher::None,
            Cipher::Shift(7),
            Cipher::Reverse,
            Cipher::Substitution(KEY.to_string()),
            Cipher::Combined(11),
        ];
        for cipher in &ciphers {
            let code = encrypt_and_encode("MEET AT NOON", cipher);
            assert_eq!(decode_and_decrypt(&code, cipher), "MEET AT NOON", "{:?}", cipher);
        }
    }

    #[test]
    fn test_cipher_parts_round_trip() {
        let cipher = Cipher::Combined(9);
        let rebuilt = Cipher::from_parts(cipher.kind(), cipher.key().as_deref());
        assert_eq!(rebuilt, cipher);
        assert_eq!(Cipher::from_parts(CipherKind::Shift, None), Cipher::Shift(DEFAULT_SHIFT));
        assert_eq!(Cipher::from_parts(CipherKind::Shift, Some("x")), Cipher::Shift(DEFAULT_SHIFT));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("caesar".parse::<CipherKind>(), Ok(CipherKind::Shift));
        assert_eq!("Reverse".parse::<CipherKind>(), Ok(CipherKind::Reverse));
        assert!("rot47".parse::<CipherKind>().is_err());
        assert_eq!(CipherKind::Substitution.to_string(), "substitution");
    }
}
