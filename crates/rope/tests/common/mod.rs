#![allow(dead_code)]

use std::env;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rope::{LineBreak, LineBreakKind, Rope};

#[track_caller]
pub fn rng() -> StdRng {
    let seed = seed();
    println!("SEED: {seed:?}");
    StdRng::seed_from_u64(seed)
}

#[track_caller]
fn seed() -> u64 {
    match env::var("SEED") {
        Ok(seed) => seed.parse().expect("couldn't parse $SEED"),
        Err(env::VarError::NotPresent) => rand::random(),
        Err(env::VarError::NotUnicode(seed)) => {
            panic!("$SEED contained invalid unicode: {seed:?}")
        }
    }
}

/// Mixed scripts with LF, CRLF, bare CR and the rarer break code points.
pub const MIXED: &str = "Ḽơᶉëᶆ ȋṕšᶙṁ\nḍỡḽǭᵳ ʂǐť ӓṁệẗ,\r\n ĉṓɲṩḙċťᶒțûɾ\rấɖḯƥĭ\u{2028}ṩčįɳġ \
                         ḝłįʈ\u{85}ꞔ 日本語のテキスト\u{c}end\r\n";

const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'x', 'y', 'z', ' ', 'é', 'ß', '日', '本', '🦀', '\n', '\r', '\u{b}',
    '\u{85}', '\u{2029}',
];

pub fn random_chars(rng: &mut impl Rng, len: usize) -> Vec<char> {
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
        .collect()
}

/// Builds a rope out of many small appends and inserts so that it has a
/// deep, irregular shape, returning the matching flat model alongside it.
pub fn random_rope(rng: &mut impl Rng, pieces: usize) -> (Rope, Vec<char>) {
    let mut rope = Rope::new();
    let mut model = Vec::new();
    for _ in 0..pieces {
        let piece_len = rng.random_range(1..12);
        let piece = random_chars(rng, piece_len);
        if rng.random_bool(0.5) {
            rope.append(piece.clone());
            model.extend_from_slice(&piece);
        } else {
            let at = rng.random_range(0..=model.len());
            rope.insert(at, piece.clone()).unwrap();
            model.splice(at..at, piece);
        }
    }
    (rope, model)
}

/// Straightforward line-break scan used as the reference.
pub fn expected_breaks(chars: &[char]) -> Vec<LineBreak> {
    let mut breaks = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let kind = match chars[i] {
            '\r' if chars.get(i + 1) == Some(&'\n') => {
                breaks.push(LineBreak::new(i + 1, LineBreakKind::CrLf));
                i += 2;
                continue;
            }
            '\r' => Some(LineBreakKind::Cr),
            '\n' => Some(LineBreakKind::Lf),
            '\u{b}' => Some(LineBreakKind::Vt),
            '\u{c}' => Some(LineBreakKind::Ff),
            '\u{85}' => Some(LineBreakKind::Nel),
            '\u{2028}' => Some(LineBreakKind::Ls),
            '\u{2029}' => Some(LineBreakKind::Ps),
            _ => None,
        };
        if let Some(kind) = kind {
            breaks.push(LineBreak::new(i, kind));
        }
        i += 1;
    }
    breaks
}
