/// Alphabetical name comparison for tie-breaks.
///
/// Case-insensitive and accent-aware in the way a person reading the board
/// expects: "émile" sorts with the e's rather than after "zoe". Names are
/// compared on their accent-folded form first, and only when those are equal
/// on the plain lowercase form, so the order stays total.
use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Precomputed sort key for one name. Build once, compare many times.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NameKey {
    folded: String,
    lower: String,
}

impl NameKey {
    pub fn new(name: &str) -> Self {
        let lower = name.to_lowercase();
        let folded = lower
            .nfd()
            .filter(|&c| !is_combining_mark(c))
            .flat_map(expand)
            .collect();
        NameKey { folded, lower }
    }
}

/// Compare two display names alphabetically, ignoring case.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    NameKey::new(a).cmp(&NameKey::new(b))
}

/// Letters that carry no combining mark under NFD but still read as a base letter.
fn expand(c: char) -> Folded {
    let base = match c {
        'ß' => return Folded::Two('s', 's'),
        'æ' => return Folded::Two('a', 'e'),
        'œ' => return Folded::Two('o', 'e'),
        'ĳ' => return Folded::Two('i', 'j'),
        'ø' => 'o',
        'đ' | 'ð' => 'd',
        'ħ' => 'h',
        'ı' => 'i',
        'ł' | 'ŀ' => 'l',
        'ŧ' => 't',
        other => other,
    };
    Folded::One(base)
}

/// Up to two folded chars, iterable without allocating.
enum Folded {
    One(char),
    Two(char, char),
    Done,
}

impl Iterator for Folded {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        match std::mem::replace(self, Folded::Done) {
            Folded::One(c) => Some(c),
            Folded::Two(a, b) => {
                *self = Folded::One(b);
                Some(a)
            }
            Folded::Done => None,
        }
    }
}
