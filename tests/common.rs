// Builders for font table test data.
//
// Also included in the crate's unit tests by src/tests.rs.

use std::convert::TryFrom;

#[derive(Clone, Copy)]
enum OffsetSize {
    Offset16,
    Offset32,
}

/// Writes big-endian table data.
///
/// Offsets to child tables are written as placeholders. `into_bytes` appends the children after
/// the table, in the order they were added, and fills in the offsets relative to the start of
/// the table.
#[derive(Default)]
pub struct TableBuilder {
    data: Vec<u8>,
    children: Vec<(usize, OffsetSize, Vec<u8>)>,
}

impl TableBuilder {
    pub fn new() -> TableBuilder {
        TableBuilder::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u16s(&mut self, values: &[u16]) -> &mut Self {
        for &value in values {
            self.u16(value);
        }
        self
    }

    /// Write a zero to be filled in later with `patch16`, returning its position.
    pub fn placeholder16(&mut self) -> usize {
        let pos = self.data.len();
        self.u16(0);
        pos
    }

    pub fn patch16(&mut self, pos: usize, value: u16) {
        self.data[pos..pos + 2].copy_from_slice(&value.to_be_bytes());
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn offset16(&mut self, child: Vec<u8>) -> &mut Self {
        let pos = self.placeholder16();
        self.children.push((pos, OffsetSize::Offset16, child));
        self
    }

    pub fn offset32(&mut self, child: Vec<u8>) -> &mut Self {
        let pos = self.data.len();
        self.u32(0);
        self.children.push((pos, OffsetSize::Offset32, child));
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut data = self.data;
        for (pos, size, child) in self.children {
            let offset = data.len();
            match size {
                OffsetSize::Offset16 => {
                    let offset = u16::try_from(offset).expect("offset16 overflow");
                    data[pos..pos + 2].copy_from_slice(&offset.to_be_bytes());
                }
                OffsetSize::Offset32 => {
                    let offset = u32::try_from(offset).expect("offset32 overflow");
                    data[pos..pos + 4].copy_from_slice(&offset.to_be_bytes());
                }
            }
            data.extend_from_slice(&child);
        }
        data
    }
}

fn count(len: usize) -> u16 {
    u16::try_from(len).expect("count overflow")
}

/// Coverage format 1 for the sorted `glyphs`.
pub fn coverage(glyphs: &[u16]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(1).u16(count(glyphs.len())).u16s(glyphs);
    t.into_bytes()
}

/// Coverage format 2 for inclusive glyph ranges.
pub fn coverage_ranges(ranges: &[(u16, u16)]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(2).u16(count(ranges.len()));
    let mut start_coverage_index = 0u16;
    for &(start, end) in ranges {
        t.u16(start).u16(end).u16(start_coverage_index);
        start_coverage_index = start_coverage_index.wrapping_add(end.wrapping_sub(start) + 1);
    }
    t.into_bytes()
}

/// ClassDef format 2 for inclusive `(start, end, class)` ranges.
pub fn class_def_format2(ranges: &[(u16, u16, u16)]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(2).u16(count(ranges.len()));
    for &(start, end, class) in ranges {
        t.u16(start).u16(end).u16(class);
    }
    t.into_bytes()
}

/// GSUB 1.0 header and lookup list. The script and feature lists are empty.
pub fn gsub(lookups: Vec<Vec<u8>>) -> Vec<u8> {
    let mut lookup_list = TableBuilder::new();
    lookup_list.u16(count(lookups.len()));
    for lookup in lookups {
        lookup_list.offset16(lookup);
    }

    let mut t = TableBuilder::new();
    t.u16(1).u16(0).u16(0).u16(0);
    t.offset16(lookup_list.into_bytes());
    t.into_bytes()
}

pub fn lookup(lookup_type: u16, lookup_flag: u16, subtables: Vec<Vec<u8>>) -> Vec<u8> {
    lookup_with_mark_filtering_set(lookup_type, lookup_flag, None, subtables)
}

pub fn lookup_with_mark_filtering_set(
    lookup_type: u16,
    lookup_flag: u16,
    mark_filtering_set: Option<u16>,
    subtables: Vec<Vec<u8>>,
) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(lookup_type).u16(lookup_flag).u16(count(subtables.len()));
    for subtable in subtables {
        t.offset16(subtable);
    }
    if let Some(mark_filtering_set) = mark_filtering_set {
        t.u16(mark_filtering_set);
    }
    t.into_bytes()
}

pub fn single_subst_format1(glyphs: &[u16], delta: i16) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(1).offset16(coverage(glyphs)).i16(delta);
    t.into_bytes()
}

/// Single substitution format 2 for `(glyph, substitute)` pairs sorted by glyph.
pub fn single_subst_format2(mapping: &[(u16, u16)]) -> Vec<u8> {
    let glyphs: Vec<u16> = mapping.iter().map(|&(glyph, _)| glyph).collect();
    let mut t = TableBuilder::new();
    t.u16(2).offset16(coverage(&glyphs)).u16(count(mapping.len()));
    for &(_, substitute) in mapping {
        t.u16(substitute);
    }
    t.into_bytes()
}

fn glyph_sequence(glyphs: &[u16]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(count(glyphs.len())).u16s(glyphs);
    t.into_bytes()
}

/// Multiple substitution for `(glyph, sequence)` pairs sorted by glyph.
pub fn multiple_subst(mapping: &[(u16, &[u16])]) -> Vec<u8> {
    sequence_subst(mapping)
}

/// Alternate substitution for `(glyph, alternates)` pairs sorted by glyph.
pub fn alternate_subst(mapping: &[(u16, &[u16])]) -> Vec<u8> {
    sequence_subst(mapping)
}

fn sequence_subst(mapping: &[(u16, &[u16])]) -> Vec<u8> {
    let glyphs: Vec<u16> = mapping.iter().map(|&(glyph, _)| glyph).collect();
    let mut t = TableBuilder::new();
    t.u16(1).offset16(coverage(&glyphs)).u16(count(mapping.len()));
    for &(_, sequence) in mapping {
        t.offset16(glyph_sequence(sequence));
    }
    t.into_bytes()
}

/// Ligature substitution for `(first glyph, [(ligature, remaining components)])` sorted by the
/// first glyph.
pub fn ligature_subst(ligature_sets: &[(u16, &[(u16, &[u16])])]) -> Vec<u8> {
    let glyphs: Vec<u16> = ligature_sets.iter().map(|&(glyph, _)| glyph).collect();
    let mut t = TableBuilder::new();
    t.u16(1)
        .offset16(coverage(&glyphs))
        .u16(count(ligature_sets.len()));
    for &(_, ligatures) in ligature_sets {
        let mut set = TableBuilder::new();
        set.u16(count(ligatures.len()));
        for &(ligature_glyph, components) in ligatures {
            let mut ligature = TableBuilder::new();
            ligature
                .u16(ligature_glyph)
                .u16(count(components.len() + 1))
                .u16s(components);
            set.offset16(ligature.into_bytes());
        }
        t.offset16(set.into_bytes());
    }
    t.into_bytes()
}

fn lookup_records(t: &mut TableBuilder, records: &[(u16, u16)]) {
    for &(sequence_index, lookup_index) in records {
        t.u16(sequence_index).u16(lookup_index);
    }
}

/// Context substitution format 1 for `(first glyph, [(remaining input, lookup records)])`
/// sorted by the first glyph.
pub fn context_format1(rule_sets: &[(u16, &[(&[u16], &[(u16, u16)])])]) -> Vec<u8> {
    let glyphs: Vec<u16> = rule_sets.iter().map(|&(glyph, _)| glyph).collect();
    let mut t = TableBuilder::new();
    t.u16(1)
        .offset16(coverage(&glyphs))
        .u16(count(rule_sets.len()));
    for &(_, rules) in rule_sets {
        let mut set = TableBuilder::new();
        set.u16(count(rules.len()));
        for &(input, records) in rules {
            let mut rule = TableBuilder::new();
            rule.u16(count(input.len() + 1))
                .u16(count(records.len()))
                .u16s(input);
            lookup_records(&mut rule, records);
            set.offset16(rule.into_bytes());
        }
        t.offset16(set.into_bytes());
    }
    t.into_bytes()
}

/// Context substitution format 3, each input position covering the given glyphs.
pub fn context_format3(input: &[&[u16]], records: &[(u16, u16)]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(3).u16(count(input.len())).u16(count(records.len()));
    for glyphs in input {
        t.offset16(coverage(glyphs));
    }
    lookup_records(&mut t, records);
    t.into_bytes()
}

/// Chaining context substitution format 3. The backtrack is ordered nearest glyph first.
pub fn chain_context_format3(
    backtrack: &[&[u16]],
    input: &[&[u16]],
    lookahead: &[&[u16]],
    records: &[(u16, u16)],
) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(3);
    for sequence in [backtrack, input, lookahead] {
        t.u16(count(sequence.len()));
        for glyphs in sequence {
            t.offset16(coverage(glyphs));
        }
    }
    t.u16(count(records.len()));
    lookup_records(&mut t, records);
    t.into_bytes()
}

/// Chaining context substitution format 2 with a single rule set for input class 1, holding
/// the rules `(backtrack classes, remaining input classes, lookahead classes, lookup records)`.
pub fn chain_context_format2(
    coverage_glyphs: &[u16],
    backtrack_classdef: Vec<u8>,
    input_classdef: Vec<u8>,
    lookahead_classdef: Vec<u8>,
    rules: &[(&[u16], &[u16], &[u16], &[(u16, u16)])],
) -> Vec<u8> {
    let mut set = TableBuilder::new();
    set.u16(count(rules.len()));
    for &(backtrack, input, lookahead, records) in rules {
        let mut rule = TableBuilder::new();
        rule.u16(count(backtrack.len())).u16s(backtrack);
        rule.u16(count(input.len() + 1)).u16s(input);
        rule.u16(count(lookahead.len())).u16s(lookahead);
        rule.u16(count(records.len()));
        lookup_records(&mut rule, records);
        set.offset16(rule.into_bytes());
    }

    let mut t = TableBuilder::new();
    t.u16(2).offset16(coverage(coverage_glyphs));
    t.offset16(backtrack_classdef);
    t.offset16(input_classdef);
    t.offset16(lookahead_classdef);
    t.u16(2); // class 0 has no rules
    t.u16(0);
    t.offset16(set.into_bytes());
    t.into_bytes()
}

/// Reverse chaining single substitution. `coverage_glyphs` and `substitutes` pair up by index.
pub fn reverse_chain_single(
    coverage_glyphs: &[u16],
    backtrack: &[&[u16]],
    lookahead: &[&[u16]],
    substitutes: &[u16],
) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(1).offset16(coverage(coverage_glyphs));
    for sequence in [backtrack, lookahead] {
        t.u16(count(sequence.len()));
        for glyphs in sequence {
            t.offset16(coverage(glyphs));
        }
    }
    t.u16(count(substitutes.len())).u16s(substitutes);
    t.into_bytes()
}

/// Extension substitution wrapping `subtable`, or with a zero offset if `None`.
pub fn extension(extension_lookup_type: u16, subtable: Option<Vec<u8>>) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(1).u16(extension_lookup_type);
    match subtable {
        Some(subtable) => t.offset32(subtable),
        None => t.u32(0),
    };
    t.into_bytes()
}
