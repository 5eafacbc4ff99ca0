//! Line-break classification and the offset index built on top of it.

/// The code points (and the CR+LF pair) that end a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineBreakKind {
    /// U+000A LINE FEED
    Lf,
    /// U+000B LINE TABULATION
    Vt,
    /// U+000C FORM FEED
    Ff,
    /// U+000D CARRIAGE RETURN not followed by a line feed
    Cr,
    /// U+000D U+000A, reported once at the line feed
    CrLf,
    /// U+0085 NEXT LINE
    Nel,
    /// U+2028 LINE SEPARATOR
    Ls,
    /// U+2029 PARAGRAPH SEPARATOR
    Ps,
}

impl LineBreakKind {
    pub fn classify(c: char) -> Option<Self> {
        match c {
            '\n' => Some(Self::Lf),
            '\u{000B}' => Some(Self::Vt),
            '\u{000C}' => Some(Self::Ff),
            '\r' => Some(Self::Cr),
            '\u{0085}' => Some(Self::Nel),
            '\u{2028}' => Some(Self::Ls),
            '\u{2029}' => Some(Self::Ps),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineBreak {
    /// Code-point offset of the break character (the LF for CR+LF).
    pub offset: usize,
    pub kind: LineBreakKind,
}

impl LineBreak {
    pub fn new(offset: usize, kind: LineBreakKind) -> Self {
        Self { offset, kind }
    }

    pub(crate) fn shifted(self, by: usize) -> Self {
        Self::new(self.offset + by, self.kind)
    }
}

/// Scans one fragment, collapsing the CR+LF pairs that lie inside it.
pub(crate) fn scan(fragment: &[char]) -> Vec<LineBreak> {
    let mut breaks = Vec::new();
    for (offset, &c) in fragment.iter().enumerate() {
        let Some(kind) = LineBreakKind::classify(c) else {
            continue;
        };
        let kind = match kind {
            LineBreakKind::Cr if fragment.get(offset + 1) == Some(&'\n') => continue,
            LineBreakKind::Lf if offset > 0 && fragment[offset - 1] == '\r' => LineBreakKind::CrLf,
            kind => kind,
        };
        breaks.push(LineBreak::new(offset, kind));
    }
    breaks
}

/// Absolute line-break offsets accumulated fragment by fragment.
///
/// A fragment ending in a bare CR leaves a pending flag behind; when the next
/// fragment starts with LF the two are merged into a single [`LineBreakKind::CrLf`]
/// entry at the LF, so the index never needs a second pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBreakIndex {
    breaks: Vec<LineBreak>,
    covered: usize,
    pending_cr: bool,
}

impl LineBreakIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the breaks of a fragment of `fragment_len` code points that
    /// directly follows everything indexed so far. `fragment_breaks` are
    /// relative to the fragment start.
    pub fn extend(&mut self, fragment_len: usize, fragment_breaks: &[LineBreak]) {
        if fragment_len == 0 {
            debug_assert!(fragment_breaks.is_empty());
            return;
        }

        let mut rest = fragment_breaks;
        if self.pending_cr {
            if let Some((first, tail)) = fragment_breaks.split_first() {
                if first.offset == 0 && first.kind == LineBreakKind::Lf {
                    let cr = self.breaks.pop();
                    debug_assert_eq!(cr.map(|b| b.kind), Some(LineBreakKind::Cr));
                    self.breaks
                        .push(LineBreak::new(self.covered, LineBreakKind::CrLf));
                    rest = tail;
                }
            }
        }

        let covered = self.covered;
        self.breaks.extend(rest.iter().map(|b| b.shifted(covered)));
        self.pending_cr = fragment_breaks
            .last()
            .is_some_and(|b| b.kind == LineBreakKind::Cr && b.offset + 1 == fragment_len);
        self.covered += fragment_len;
    }

    /// Scans `chars` and appends its breaks.
    pub fn extend_from_chars(&mut self, chars: &[char]) {
        self.extend(chars.len(), &scan(chars));
    }

    /// Number of code points indexed so far.
    pub fn covered_len(&self) -> usize {
        self.covered
    }

    pub fn ends_with_bare_cr(&self) -> bool {
        self.pending_cr
    }

    pub fn breaks(&self) -> &[LineBreak] {
        &self.breaks
    }

    pub fn into_breaks(self) -> Vec<LineBreak> {
        self.breaks
    }
}
