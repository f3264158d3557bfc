use std::collections::HashMap;
use std::sync::OnceLock;

/// Code emitted for the space character.
pub const WORD_SEPARATOR: &str = "/";

/// Morse code lookup table
const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
    (' ', WORD_SEPARATOR),
];

/// Forward and reverse views of the Morse table.
///
/// Built once on first use and shared read-only afterwards.
pub struct Alphabet {
    to_code: HashMap<char, &'static str>,
    to_char: HashMap<&'static str, char>,
}

impl Alphabet {
    fn build() -> Self {
        let to_code: HashMap<char, &'static str> = MORSE_TABLE.iter().copied().collect();
        let to_char: HashMap<&'static str, char> =
            MORSE_TABLE.iter().map(|&(c, code)| (code, c)).collect();
        Self { to_code, to_char }
    }

    /// Code for an already-uppercased character.
    pub fn code(&self, c: char) -> Option<&'static str> {
        self.to_code.get(&c).copied()
    }

    /// Character for a single code token.
    pub fn char_for(&self, code: &str) -> Option<char> {
        self.to_char.get(code).copied()
    }

    /// Every (character, code) pair in table order, space included.
    pub fn entries(&self) -> impl Iterator<Item = (char, &'static str)> {
        MORSE_TABLE.iter().copied()
    }

    pub fn len(&self) -> usize {
        MORSE_TABLE.len()
    }

    pub fn is_empty(&self) -> bool {
        MORSE_TABLE.is_empty()
    }
}

/// The process-wide alphabet.
pub fn alphabet() -> &'static Alphabet {
    static ALPHABET: OnceLock<Alphabet> = OnceLock::new();
    ALPHABET.get_or_init(Alphabet::build)
}
