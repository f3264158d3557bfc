use super::alphabet::alphabet;

/// Convert text to Morse code
///
/// Characters outside the alphabet are dropped. Codes are joined with a
/// single space and a space in the input becomes `/`.
pub fn text_to_morse(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let table = alphabet();
    text.to_uppercase()
        .chars()
        .filter_map(|c| table.code(c))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert Morse code to text
///
/// Tokens that do not match any code are dropped.
pub fn morse_to_text(code: &str) -> String {
    if code.trim().is_empty() {
        return String::new();
    }

    let table = alphabet();
    code.trim()
        .split(' ')
        .filter(|token| !token.is_empty())
        .filter_map(|token| table.char_for(token))
        .collect()
}

/// True for blank input or input made only of `.`, `-`, `/` and spaces.
pub fn is_valid_morse(code: &str) -> bool {
    if code.trim().is_empty() {
        return true;
    }
    code.chars().all(|c| matches!(c, '.' | '-' | '/' | ' '))
}

/// Morse code for a single character, case-insensitive
pub fn char_to_morse(c: char) -> Option<&'static str> {
    // Only the ASCII letters have lowercase forms in the table
    alphabet().code(c.to_ascii_uppercase())
}

/// Character for a single code token
pub fn morse_to_char(code: &str) -> Option<char> {
    alphabet().char_for(code)
}

/// Split Morse code into its per-character tokens
pub fn split_morse_into_chars(code: &str) -> Vec<&str> {
    code.trim().split(' ').filter(|token| !token.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sos() {
        assert_eq!(text_to_morse("SOS"), "... --- ...");
        assert_eq!(text_to_morse("sos"), "... --- ...");
    }

    #[test]
    fn test_decode_sos() {
        assert_eq!(morse_to_text("... --- ..."), "SOS");
        assert_eq!(morse_to_text("  ... --- ...  "), "SOS");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(text_to_morse(""), "");
        assert_eq!(text_to_morse("   "), "");
        assert_eq!(morse_to_text(""), "");
        assert_eq!(morse_to_text(" \t "), "");
    }

    #[test]
    fn test_words_use_separator() {
        assert_eq!(text_to_morse("HI YOU"), ".... .. / -.-- --- ..-");
        assert_eq!(morse_to_text(".... .. / -.-- --- ..-"), "HI YOU");
    }

    #[test]
    fn test_unmapped_characters_are_dropped() {
        assert_eq!(text_to_morse("A#B"), ".- -...");
        assert_eq!(text_to_morse("~~~"), "");
        assert_eq!(morse_to_text(".- ........ -..."), "AB");
    }

    #[test]
    fn test_double_spaces_are_ignored_when_decoding() {
        assert_eq!(morse_to_text(".-  -..."), "AB");
    }

    #[test]
    fn test_round_trip_whole_alphabet() {
        for (c, _) in alphabet().entries() {
            if c == ' ' {
                continue;
            }
            let encoded = text_to_morse(&c.to_string());
            assert_eq!(morse_to_text(&encoded), c.to_uppercase().to_string(), "char {:?}", c);
        }
        for c in 'a'..='z' {
            let encoded = text_to_morse(&c.to_string());
            assert_eq!(morse_to_text(&encoded), c.to_ascii_uppercase().to_string());
        }
    }

    #[test]
    fn test_is_valid_morse() {
        assert!(is_valid_morse("... --- ..."));
        assert!(is_valid_morse(".- / -..."));
        assert!(is_valid_morse(""));
        assert!(is_valid_morse("   "));
        assert!(!is_valid_morse("SOS"));
        assert!(!is_valid_morse("..x"));
    }

    #[test]
    fn test_single_lookups() {
        assert_eq!(char_to_morse('e'), Some("."));
        assert_eq!(char_to_morse('E'), Some("."));
        assert_eq!(char_to_morse('?'), Some("..--.."));
        assert_eq!(char_to_morse('#'), None);
        assert_eq!(morse_to_char("-.-.--"), Some('!'));
        assert_eq!(morse_to_char("......."), None);
    }

    #[test]
    fn test_split_into_chars() {
        assert_eq!(split_morse_into_chars(" ... ---  ... "), vec!["...", "---", "..."]);
        assert!(split_morse_into_chars("   ").is_empty());
    }
}
