//! Glyph matching for lookups: lookup flags and the backtrack, input and lookahead matchers
//! used by contextual and ligature substitutions.

use std::cmp;
use std::sync::Arc;

use bitflags::bitflags;

use crate::buffer::GlyphBuffer;
use crate::gdef::{GlyphClass, GlyphClassProvider};
use crate::layout::{ClassDef, Coverage};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        const USE_MARK_FILTERING_SET = 0x0010;
        const MARK_ATTACHMENT_TYPE = 0xFF00;
    }
}

impl LookupFlag {
    /// Mark attachment class to restrict marks to, 0 for none.
    pub fn mark_attachment_type(self) -> u16 {
        (self & LookupFlag::MARK_ATTACHMENT_TYPE).bits() >> 8
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IgnoreMarks {
    NoIgnoreMarks,
    IgnoreAllMarks,
    /// Ignore marks other than those with this mark attachment class.
    IgnoreMarksExcept(u16),
    /// Ignore marks that are not in this mark glyph set.
    IgnoreMarksNotInSet(u16),
}

/// Which glyphs a lookup processes and which it steps over, derived from its flags.
#[derive(Debug, Copy, Clone)]
pub struct MatchType {
    ignore_bases: bool,
    ignore_ligatures: bool,
    ignore_marks: IgnoreMarks,
}

impl MatchType {
    pub fn from_lookup_flag(lookup_flag: LookupFlag, mark_filtering_set: Option<u16>) -> MatchType {
        // IGNORE_MARKS takes precedence over the finer grained mark filters.
        let ignore_marks = if lookup_flag.contains(LookupFlag::IGNORE_MARKS) {
            IgnoreMarks::IgnoreAllMarks
        } else if let Some(set_index) = mark_filtering_set
            .filter(|_| lookup_flag.contains(LookupFlag::USE_MARK_FILTERING_SET))
        {
            IgnoreMarks::IgnoreMarksNotInSet(set_index)
        } else if lookup_flag.mark_attachment_type() != 0 {
            IgnoreMarks::IgnoreMarksExcept(lookup_flag.mark_attachment_type())
        } else {
            IgnoreMarks::NoIgnoreMarks
        };
        MatchType {
            ignore_bases: lookup_flag.contains(LookupFlag::IGNORE_BASE_GLYPHS),
            ignore_ligatures: lookup_flag.contains(LookupFlag::IGNORE_LIGATURES),
            ignore_marks,
        }
    }

    /// Whether the lookup processes `glyph`, or ignores it because of its class.
    pub fn match_glyph<C: GlyphClassProvider + ?Sized>(self, classes: &C, glyph: u16) -> bool {
        if !self.ignore_bases
            && !self.ignore_ligatures
            && self.ignore_marks == IgnoreMarks::NoIgnoreMarks
        {
            // fast path that doesn't require checking glyph_class
            return true;
        }
        match classes.glyph_class(glyph) {
            GlyphClass::Base => !self.ignore_bases,
            GlyphClass::Ligature => !self.ignore_ligatures,
            GlyphClass::Mark => !self.mark_is_ignored(classes, glyph),
            GlyphClass::Unclassified | GlyphClass::Component => true,
        }
    }

    /// Whether `glyph` is a mark that is stepped over while matching a sequence.
    pub fn skip_mark<C: GlyphClassProvider + ?Sized>(self, classes: &C, glyph: u16) -> bool {
        self.ignore_marks != IgnoreMarks::NoIgnoreMarks
            && classes.glyph_class(glyph) == GlyphClass::Mark
            && self.mark_is_ignored(classes, glyph)
    }

    fn mark_is_ignored<C: GlyphClassProvider + ?Sized>(self, classes: &C, glyph: u16) -> bool {
        match self.ignore_marks {
            IgnoreMarks::NoIgnoreMarks => false,
            IgnoreMarks::IgnoreAllMarks => true,
            IgnoreMarks::IgnoreMarksExcept(keep_class) => {
                classes.mark_attach_class(glyph) != keep_class
            }
            IgnoreMarks::IgnoreMarksNotInSet(set_index) => {
                !classes.mark_set_contains(set_index, glyph)
            }
        }
    }
}

/// The glyphs a rule expects at each position of a sequence.
pub enum GlyphTable<'a> {
    Empty,
    ById(&'a [u16]),
    ByClassDef(&'a ClassDef, &'a [u16]),
    ByCoverage(&'a [Arc<Coverage>]),
}

impl<'a> GlyphTable<'a> {
    pub fn len(&self) -> usize {
        match self {
            GlyphTable::Empty => 0,
            GlyphTable::ById(arr) => arr.len(),
            GlyphTable::ByClassDef(_, arr) => arr.len(),
            GlyphTable::ByCoverage(vec) => vec.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `glyph` is acceptable at `index` of the sequence.
    pub fn matches(&self, index: usize, glyph: u16) -> bool {
        match self {
            GlyphTable::Empty => false,
            GlyphTable::ById(arr) => arr.get(index) == Some(&glyph),
            GlyphTable::ByClassDef(classdef, arr) => {
                arr.get(index) == Some(&classdef.glyph_class_value(glyph))
            }
            GlyphTable::ByCoverage(vec) => vec
                .get(index)
                .is_some_and(|coverage| coverage.glyph_coverage_value(glyph).is_some()),
        }
    }
}

/// The sequences a contextual rule matches around the glyph at the cursor.
///
/// The input table excludes the first input glyph, which the subtable checks itself.
pub struct MatchContext<'a> {
    pub backtrack_table: GlyphTable<'a>,
    pub input_table: GlyphTable<'a>,
    pub lookahead_table: GlyphTable<'a>,
}

/// Match the rest of an input sequence following the glyph at the cursor.
///
/// Matching is confined to the `context_length` glyphs starting at the cursor. Ignored marks
/// between the matched glyphs are stepped over. Returns the number of glyphs spanned by the
/// match, including the glyph at the cursor and any marks stepped over.
pub fn match_input<B, C>(
    buffer: &B,
    classes: &C,
    match_type: MatchType,
    input_table: &GlyphTable<'_>,
    context_length: usize,
) -> Option<usize>
where
    B: GlyphBuffer + ?Sized,
    C: GlyphClassProvider + ?Sized,
{
    let pos = buffer.position();
    let count = input_table.len() + 1;
    let end = cmp::min(buffer.len(), pos.saturating_add(context_length));
    if pos + count > end {
        return None;
    }
    let mut j = pos + 1;
    for i in 1..count {
        let glyph = loop {
            let glyph = buffer.glyph(j)?.glyph_index;
            if !match_type.skip_mark(classes, glyph) {
                break glyph;
            }
            if j + count - i == end {
                return None;
            }
            j += 1;
        };
        if !input_table.matches(i - 1, glyph) {
            return None;
        }
        j += 1;
    }
    Some(j - pos)
}

/// Match a backtrack sequence against the processed glyphs before the cursor, nearest first.
pub fn match_backtrack<B, C>(
    buffer: &B,
    classes: &C,
    match_type: MatchType,
    backtrack_table: &GlyphTable<'_>,
) -> bool
where
    B: GlyphBuffer + ?Sized,
    C: GlyphClassProvider + ?Sized,
{
    let count = backtrack_table.len();
    let mut j = buffer.backtrack_len();
    if j < count {
        return false;
    }
    // `j` counts the glyphs not yet examined; the next candidate is at `j - 1`.
    for i in 0..count {
        let glyph = loop {
            if j < count - i {
                return false;
            }
            let glyph = match buffer.backtrack_glyph(j - 1) {
                Some(glyph) => glyph.glyph_index,
                None => return false,
            };
            if !match_type.skip_mark(classes, glyph) {
                break glyph;
            }
            j -= 1;
        };
        if !backtrack_table.matches(i, glyph) {
            return false;
        }
        j -= 1;
    }
    true
}

/// Match a lookahead sequence starting `offset` glyphs after the cursor.
///
/// Like the input, the lookahead must fit within the `context_length` glyphs from the cursor.
pub fn match_lookahead<B, C>(
    buffer: &B,
    classes: &C,
    match_type: MatchType,
    lookahead_table: &GlyphTable<'_>,
    offset: usize,
    context_length: usize,
) -> bool
where
    B: GlyphBuffer + ?Sized,
    C: GlyphClassProvider + ?Sized,
{
    let pos = buffer.position();
    let count = lookahead_table.len();
    let end = cmp::min(buffer.len(), pos.saturating_add(context_length));
    if pos + offset + count > end {
        return false;
    }
    let mut j = pos + offset;
    for i in 0..count {
        let glyph = loop {
            let glyph = match buffer.glyph(j) {
                Some(glyph) => glyph.glyph_index,
                None => return false,
            };
            if !match_type.skip_mark(classes, glyph) {
                break glyph;
            }
            if j + count - i == end {
                return false;
            }
            j += 1;
        };
        if !lookahead_table.matches(i, glyph) {
            return false;
        }
        j += 1;
    }
    true
}
