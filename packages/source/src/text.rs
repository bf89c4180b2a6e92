//! Text cleanup for name, team and position cells.
//!
//! Pages served as UTF-8 but decoded as Latin-1 or Windows-1252 somewhere
//! upstream turn `é` into `Ã©` and `ć` into `Ä‡`. [`repair_mojibake`]
//! reverses that by re-encoding each char to its single-byte code point
//! and decoding the bytes as UTF-8 again. Each run of single-byte chars is
//! repaired on its own and only the byte sequences that form valid UTF-8
//! are replaced, so a correctly decoded `č` or `é` elsewhere in the same
//! cell survives.

use std::borrow::Cow;

/// Passes applied at most, for text that was mis-decoded more than once.
const MAX_REPAIR_PASSES: usize = 2;

/// Windows-1252 bytes `0x80..=0x9F` that decode to chars outside Latin-1.
const CP1252_HIGH: &[(char, u8)] = &[
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// Byte a char would have been decoded from under Windows-1252 (with
/// Latin-1 fallback for the undefined slots).
fn single_byte(c: char) -> Option<u8> {
    u8::try_from(u32::from(c)).ok().or_else(|| {
        CP1252_HIGH
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, b)| *b)
    })
}

fn repair_once(s: &str) -> Option<String> {
    if s.is_ascii() {
        return None;
    }

    let mut out = String::with_capacity(s.len());
    let mut run_chars = Vec::new();
    let mut run_bytes = Vec::new();

    for c in s.chars() {
        if let Some(b) = single_byte(c) {
            run_chars.push(c);
            run_bytes.push(b);
        } else {
            repair_run(&run_chars, &run_bytes, &mut out);
            run_chars.clear();
            run_bytes.clear();
            out.push(c);
        }
    }
    repair_run(&run_chars, &run_bytes, &mut out);

    (out != s).then_some(out)
}

/// Appends `chars` to `out`, replacing each stretch whose bytes decode as
/// UTF-8. `bytes[i]` is the single-byte form of `chars[i]`.
fn repair_run(chars: &[char], bytes: &[u8], out: &mut String) {
    let mut offset = 0;
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
        offset += chunk.valid().len();

        let invalid = chunk.invalid().len();
        out.extend(&chars[offset..offset + invalid]);
        offset += invalid;
    }
}

/// Undoes UTF-8 → Latin-1/Windows-1252 mis-decoding.
///
/// Returns the input unchanged when it is ASCII, already correct, or not
/// explainable as mojibake.
#[must_use]
pub fn repair_mojibake(s: &str) -> Cow<'_, str> {
    let mut current = Cow::Borrowed(s);
    for _ in 0..MAX_REPAIR_PASSES {
        match repair_once(&current) {
            Some(fixed) => current = Cow::Owned(fixed),
            None => break,
        }
    }
    current
}

/// Repairs, then trims. Blank text becomes `None`.
#[must_use]
pub fn clean_text(raw: &str) -> Option<String> {
    let repaired = repair_mojibake(raw);
    let trimmed = repaired.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_latin1_mojibake() {
        assert_eq!(repair_mojibake("JosÃ© Smith"), "José Smith");
        assert_eq!(
            repair_mojibake("Luka Don\u{c4}\u{8d}i\u{c4}\u{87}"),
            "Luka Dončić"
        );
    }

    #[test]
    fn repairs_windows_1252_mojibake() {
        assert_eq!(repair_mojibake("Nikola JokiÄ‡"), "Nikola Jokić");
        assert_eq!(repair_mojibake("Bogdan BogdanoviÄ‡"), "Bogdan Bogdanović");
    }

    #[test]
    fn repairs_mojibake_next_to_correct_text() {
        assert_eq!(repair_mojibake("JosÃ© Dončić"), "José Dončić");
        assert_eq!(repair_mojibake("JosÃ© Smith–Jones"), "José Smith–Jones");
        assert_eq!(repair_mojibake("Jokić JosÃ©"), "Jokić José");
    }

    #[test]
    fn repairs_double_encoding() {
        assert_eq!(repair_mojibake("JosÃƒÂ©"), "José");
    }

    #[test]
    fn leaves_correct_text_alone() {
        for s in [
            "José Smith",
            "Nikola Jokić",
            "Luka Dončić",
            "LeBron James",
            "Smith–Jones",
            "",
        ] {
            assert!(matches!(repair_mojibake(s), Cow::Borrowed(_)), "{s}");
        }
    }

    #[test]
    fn clean_text_trims_and_blanks() {
        assert_eq!(clean_text("  JosÃ© Smith \n").as_deref(), Some("José Smith"));
        assert_eq!(clean_text(" \u{a0} "), None);
        assert_eq!(clean_text("TOT").as_deref(), Some("TOT"));
    }
}
