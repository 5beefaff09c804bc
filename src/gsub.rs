//! Glyph substitution (`gsub`) implementation.
//!
//! > The Glyph Substitution (GSUB) table provides data for substition of glyphs for appropriate
//! > rendering of scripts, such as cursively-connecting forms in Arabic script, or for advanced
//! > typographic effects, such as ligatures.
//!
//! — <https://learn.microsoft.com/en-us/typography/opentype/spec/gsub>
//!
//! A lookup is applied to a whole buffer with `apply_string`. Forward lookups make a pass from
//! the first glyph to the last, writing to the buffer's output sequence. Reverse chaining lookups
//! substitute in place from the last glyph to the first.

use std::cmp;
use std::convert::TryFrom;

use crate::buffer::GlyphBuffer;
use crate::context::{match_backtrack, match_input, match_lookahead, MatchContext, MatchType};
use crate::gdef::{GlyphClass, GlyphClassProvider};
use crate::layout::{
    chain_context_lookup_info, context_lookup_info, ChainContextLookup, ContextLookup, GsubTable,
    Ligature, LigatureSubst, LookupList, MultipleSubst, ReverseChainSingleSubst,
    SequenceLookupRecord, SubstLookup, SubstSubtable,
};
use crate::sanitize::Sanitized;

/// Default number of levels of nested lookups that contextual lookups may apply below the lookup
/// applied to the buffer.
pub const MAX_NESTING_LEVEL: usize = 8;

/// A context length that does not constrain matching. Used at the top level, where a lookup may
/// match as far as the end of the buffer.
pub const UNBOUNDED_CONTEXT: usize = usize::MAX;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Maximum depth of lookups applied by contextual lookups, counting the lookup applied to
    /// the buffer. With a limit of 1 contextual lookups do not apply nested lookups at all.
    pub nesting_limit: usize,
    /// Index of the glyph to choose from an alternate set, the first if `None`.
    pub alternate: Option<usize>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            nesting_limit: MAX_NESTING_LEVEL + 1,
            alternate: None,
        }
    }
}

/// Apply the lookup at `lookup_index` to every glyph in `buffer` that shares a bit with `mask`.
///
/// Returns whether any substitution was made. An empty buffer or a missing lookup leaves the
/// buffer untouched.
pub fn apply_string<B, C>(
    lookup_list: &LookupList,
    lookup_index: usize,
    classes: &mut C,
    buffer: &mut B,
    mask: u32,
    options: ApplyOptions,
) -> bool
where
    B: GlyphBuffer + ?Sized,
    C: GlyphClassProvider + ?Sized,
{
    let lookup = match lookup_list.lookup(lookup_index) {
        Some(lookup) => lookup,
        None => return false,
    };
    if buffer.is_empty() {
        return false;
    }
    let nesting_left = options.nesting_limit.saturating_sub(1);
    let mut applier = SubstApplier {
        lookup_list,
        buffer,
        classes,
        options,
    };
    applier.apply_string(lookup, mask, nesting_left)
}

/// Apply the lookup at `lookup_index` once, at the cursor of `buffer`.
///
/// Matching is confined to `context_length` glyphs from the cursor. `nesting_left` is the number
/// of further levels of lookups that contextual substitutions may apply. On success the cursor is
/// left after the glyphs that were consumed. Lookups other than reverse chaining substitutions
/// write to the output sequence, which must be active.
pub fn apply_once<B, C>(
    lookup_list: &LookupList,
    lookup_index: usize,
    classes: &mut C,
    buffer: &mut B,
    context_length: usize,
    nesting_left: usize,
    options: ApplyOptions,
) -> bool
where
    B: GlyphBuffer + ?Sized,
    C: GlyphClassProvider + ?Sized,
{
    let lookup = match lookup_list.lookup(lookup_index) {
        Some(lookup) => lookup,
        None => return false,
    };
    let mut applier = SubstApplier {
        lookup_list,
        buffer,
        classes,
        options,
    };
    applier.apply_once(lookup, context_length, nesting_left)
}

impl GsubTable {
    pub fn apply_string<B, C>(
        &self,
        lookup_index: usize,
        classes: &mut C,
        buffer: &mut B,
        mask: u32,
        options: ApplyOptions,
    ) -> bool
    where
        B: GlyphBuffer + ?Sized,
        C: GlyphClassProvider + ?Sized,
    {
        self.opt_lookup_list.as_ref().is_some_and(|lookup_list| {
            apply_string(lookup_list, lookup_index, classes, buffer, mask, options)
        })
    }

    pub fn would_apply(&self, lookup_index: usize, glyphs: &[u16]) -> bool {
        self.lookup(lookup_index)
            .is_some_and(|lookup| lookup.would_apply(glyphs))
    }
}

/// A table that failed validation never substitutes anything.
impl Sanitized<GsubTable> {
    pub fn apply_string<B, C>(
        &self,
        lookup_index: usize,
        classes: &mut C,
        buffer: &mut B,
        mask: u32,
        options: ApplyOptions,
    ) -> bool
    where
        B: GlyphBuffer + ?Sized,
        C: GlyphClassProvider + ?Sized,
    {
        self.get().is_some_and(|gsub| {
            gsub.apply_string(lookup_index, classes, buffer, mask, options)
        })
    }

    pub fn would_apply(&self, lookup_index: usize, glyphs: &[u16]) -> bool {
        self.get()
            .is_some_and(|gsub| gsub.would_apply(lookup_index, glyphs))
    }
}

impl SubstLookup {
    /// Whether this lookup would substitute the sequence `glyphs` if it were the whole input.
    ///
    /// The glyphs are compared exactly: lookup flags and the backtrack and lookahead of chaining
    /// rules are not considered.
    pub fn would_apply(&self, glyphs: &[u16]) -> bool {
        self.is_applicable()
            && self
                .subtables
                .iter()
                .any(|subtable| subtable.would_apply(glyphs))
    }
}

impl SubstSubtable {
    fn would_apply(&self, glyphs: &[u16]) -> bool {
        let (&first, rest) = match glyphs.split_first() {
            Some(split) => split,
            None => return false,
        };
        match self {
            SubstSubtable::Single(single) => rest.is_empty() && single.apply_glyph(first).is_some(),
            SubstSubtable::Multiple(multiple) => {
                rest.is_empty()
                    && multiple
                        .apply_glyph(first)
                        .is_some_and(|sequence| !sequence.substitute_glyphs.is_empty())
            }
            SubstSubtable::Alternate(alternate) => {
                rest.is_empty()
                    && alternate
                        .apply_glyph(first)
                        .is_some_and(|alternate_set| !alternate_set.alternate_glyphs.is_empty())
            }
            SubstSubtable::Ligature(ligature_subst) => {
                ligature_subst.apply_glyph(first).is_some_and(|ligatureset| {
                    ligatureset
                        .ligatures
                        .iter()
                        .any(|ligature| ligature.component_glyphs.as_slice() == rest)
                })
            }
            SubstSubtable::Context(context_lookup) => {
                context_lookup_info(context_lookup, first, |match_context| {
                    would_match_input(match_context, rest)
                })
                .is_some()
            }
            SubstSubtable::ChainContext(chain_context_lookup) => {
                chain_context_lookup_info(chain_context_lookup, first, |match_context| {
                    would_match_input(match_context, rest)
                })
                .is_some()
            }
            SubstSubtable::Extension(extension) => extension
                .subtable
                .as_ref()
                .is_some_and(|subtable| subtable.would_apply(glyphs)),
            SubstSubtable::ReverseChainSingle(reverse) => {
                rest.is_empty() && reverse.apply_glyph(first).is_some()
            }
        }
    }
}

fn would_match_input(match_context: &MatchContext<'_>, glyphs: &[u16]) -> Option<()> {
    let input_table = &match_context.input_table;
    let matched = input_table.len() == glyphs.len()
        && glyphs
            .iter()
            .enumerate()
            .all(|(i, &glyph)| input_table.matches(i, glyph));
    matched.then_some(())
}

/// State shared by the lookups applied while processing a buffer, including nested lookups.
struct SubstApplier<'a, 'b, B: ?Sized, C: ?Sized> {
    lookup_list: &'a LookupList,
    buffer: &'b mut B,
    classes: &'b mut C,
    options: ApplyOptions,
}

impl<'a, 'b, B, C> SubstApplier<'a, 'b, B, C>
where
    B: GlyphBuffer + ?Sized,
    C: GlyphClassProvider + ?Sized,
{
    fn apply_string(&mut self, lookup: &'a SubstLookup, mask: u32, nesting_left: usize) -> bool {
        let mut applied = false;
        if !lookup.is_reverse() {
            self.buffer.clear_output();
            self.buffer.set_position(0);
            while self.buffer.position() < self.buffer.len() {
                if self.glyph_has_mask(mask)
                    && self.apply_once(lookup, UNBOUNDED_CONTEXT, nesting_left)
                {
                    applied = true;
                } else {
                    self.buffer.next_glyph();
                }
            }
            if applied {
                self.buffer.swap_buffers();
            } else {
                self.buffer.discard_output();
            }
        } else {
            self.buffer.discard_output();
            for position in (0..self.buffer.len()).rev() {
                self.buffer.set_position(position);
                if self.glyph_has_mask(mask)
                    && self.apply_once(lookup, UNBOUNDED_CONTEXT, nesting_left)
                {
                    applied = true;
                }
            }
            self.buffer.set_position(0);
        }
        applied
    }

    fn glyph_has_mask(&self, mask: u32) -> bool {
        self.buffer
            .current_glyph()
            .is_some_and(|glyph| glyph.mask & mask != 0)
    }

    fn apply_once(
        &mut self,
        lookup: &'a SubstLookup,
        context_length: usize,
        nesting_left: usize,
    ) -> bool {
        if !lookup.is_applicable() {
            return false;
        }
        let glyph = match self.buffer.current_glyph() {
            Some(glyph) => glyph.glyph_index,
            None => return false,
        };
        let match_type = MatchType::from_lookup_flag(lookup.lookup_flag, lookup.mark_filtering_set);
        if !match_type.match_glyph(&*self.classes, glyph) {
            return false;
        }
        lookup.subtables.iter().any(|subtable| {
            self.apply_subtable(subtable, match_type, glyph, context_length, nesting_left)
        })
    }

    /// Apply the lookup at `lookup_index` on behalf of a contextual rule.
    fn apply_nested(
        &mut self,
        lookup_index: usize,
        context_length: usize,
        nesting_left: usize,
    ) -> bool {
        if nesting_left == 0 || context_length < 1 {
            return false;
        }
        match self.lookup_list.lookup(lookup_index) {
            Some(lookup) => self.apply_once(lookup, context_length, nesting_left - 1),
            None => false,
        }
    }

    fn apply_subtable(
        &mut self,
        subtable: &'a SubstSubtable,
        match_type: MatchType,
        glyph: u16,
        context_length: usize,
        nesting_left: usize,
    ) -> bool {
        match subtable {
            SubstSubtable::Single(single) => match single.apply_glyph(glyph) {
                Some(output_glyph) => {
                    let class = self.classes.glyph_class(glyph);
                    self.set_synthetic_class(&[output_glyph], class);
                    self.buffer.replace_glyph(output_glyph);
                    true
                }
                None => false,
            },
            SubstSubtable::Multiple(multiple) => self.apply_multiple(multiple, glyph),
            SubstSubtable::Alternate(alternate) => {
                let alternate_index = self.options.alternate.unwrap_or(0);
                let output_glyph = alternate.apply_glyph(glyph).and_then(|alternate_set| {
                    alternate_set.alternate_glyphs.get(alternate_index).copied()
                });
                match output_glyph {
                    Some(output_glyph) => {
                        let class = self.classes.glyph_class(glyph);
                        self.set_synthetic_class(&[output_glyph], class);
                        self.buffer.replace_glyph(output_glyph);
                        true
                    }
                    None => false,
                }
            }
            SubstSubtable::Ligature(ligature_subst) => {
                self.apply_ligature(ligature_subst, match_type, glyph, context_length)
            }
            SubstSubtable::Context(context_lookup) => self.apply_context(
                context_lookup,
                match_type,
                glyph,
                context_length,
                nesting_left,
            ),
            SubstSubtable::ChainContext(chain_context_lookup) => self.apply_chain_context(
                chain_context_lookup,
                match_type,
                glyph,
                context_length,
                nesting_left,
            ),
            SubstSubtable::Extension(extension) => match extension.subtable.as_deref() {
                Some(subtable) => {
                    self.apply_subtable(subtable, match_type, glyph, context_length, nesting_left)
                }
                None => false,
            },
            SubstSubtable::ReverseChainSingle(reverse) => {
                self.apply_reverse_chain_single(reverse, match_type, glyph, context_length)
            }
        }
    }

    fn set_synthetic_class(&mut self, glyphs: &[u16], class: GlyphClass) {
        if self.classes.has_synthetic_classes() {
            for &glyph in glyphs {
                self.classes.set_glyph_class(glyph, class);
            }
        }
    }

    fn apply_multiple(&mut self, multiple: &'a MultipleSubst, glyph: u16) -> bool {
        let substitute_glyphs = match multiple.apply_glyph(glyph) {
            Some(sequence) if !sequence.substitute_glyphs.is_empty() => {
                &sequence.substitute_glyphs
            }
            _ => return false,
        };
        let class = match self.classes.glyph_class(glyph) {
            GlyphClass::Ligature => GlyphClass::Base,
            class => class,
        };
        self.set_synthetic_class(substitute_glyphs, class);
        self.buffer.output_glyphs(1, substitute_glyphs, None, None);
        true
    }

    fn apply_ligature(
        &mut self,
        ligature_subst: &'a LigatureSubst,
        match_type: MatchType,
        glyph: u16,
        context_length: usize,
    ) -> bool {
        let ligatureset = match ligature_subst.apply_glyph(glyph) {
            Some(ligatureset) => ligatureset,
            None => return false,
        };
        let first_is_mark = self.classes.glyph_class(glyph) == GlyphClass::Mark;
        // The first ligature that matches is used, so longer ligatures must precede the shorter
        // ligatures they start with.
        for ligature in &ligatureset.ligatures {
            if let Some((matched_len, is_mark)) =
                self.match_ligature(ligature, match_type, context_length, first_is_mark)
            {
                self.output_ligature(ligature, match_type, matched_len, is_mark);
                return true;
            }
        }
        false
    }

    /// Match the components of `ligature` after the cursor, stepping over ignored marks.
    ///
    /// Returns the number of glyphs spanned by the match and whether all components are marks.
    fn match_ligature(
        &self,
        ligature: &Ligature,
        match_type: MatchType,
        context_length: usize,
        mut is_mark: bool,
    ) -> Option<(usize, bool)> {
        let pos = self.buffer.position();
        let end = cmp::min(self.buffer.len(), pos.saturating_add(context_length));
        let count = ligature.component_glyphs.len() + 1;
        if pos + count > end {
            return None;
        }
        let mut j = pos + 1;
        for (i, &component) in (1..).zip(ligature.component_glyphs.iter()) {
            let glyph = loop {
                let glyph = self.buffer.glyph(j)?.glyph_index;
                if !match_type.skip_mark(&*self.classes, glyph) {
                    break glyph;
                }
                if j + count - i == end {
                    return None;
                }
                j += 1;
            };
            if self.classes.glyph_class(glyph) != GlyphClass::Mark {
                is_mark = false;
            }
            if glyph != component {
                return None;
            }
            j += 1;
        }
        Some((j - pos, is_mark))
    }

    fn output_ligature(
        &mut self,
        ligature: &Ligature,
        match_type: MatchType,
        matched_len: usize,
        is_mark: bool,
    ) {
        let count = ligature.component_glyphs.len() + 1;
        let ligature_glyph = ligature.ligature_glyph;
        let class = if is_mark {
            GlyphClass::Mark
        } else {
            GlyphClass::Ligature
        };
        self.set_synthetic_class(&[ligature_glyph], class);

        if matched_len == count {
            // Nothing was stepped over. A glyph that starts an existing ligature keeps its id.
            let liga_id = match self.buffer.current_glyph() {
                Some(first) if first.liga_id != 0 && first.liga_component_pos == 0 => None,
                _ => Some(self.buffer.allocate_lig_id()),
            };
            self.buffer
                .output_glyphs(count, &[ligature_glyph], Some(0), liga_id);
        } else {
            // Marks between the components stay in the buffer after the ligature, tagged with
            // the component they followed.
            let liga_id = self.buffer.allocate_lig_id();
            self.buffer
                .output_glyphs(1, &[ligature_glyph], None, Some(liga_id));
            for component_pos in 1..count {
                let liga_component_pos = u16::try_from(component_pos).unwrap_or(u16::MAX);
                while let Some(glyph) = self.buffer.current_glyph().map(|g| g.glyph_index) {
                    if !match_type.skip_mark(&*self.classes, glyph) {
                        break;
                    }
                    self.buffer.output_glyphs(
                        1,
                        &[glyph],
                        Some(liga_component_pos),
                        Some(liga_id),
                    );
                }
                self.buffer.skip_glyph();
            }
        }
    }

    fn apply_context(
        &mut self,
        context_lookup: &'a ContextLookup,
        match_type: MatchType,
        glyph: u16,
        context_length: usize,
        nesting_left: usize,
    ) -> bool {
        let buffer = &*self.buffer;
        let classes = &*self.classes;
        let found = context_lookup_info(context_lookup, glyph, |match_context| {
            let input_table = &match_context.input_table;
            match_input(buffer, classes, match_type, input_table, context_length)
                .map(|_| input_table.len() + 1)
        });
        match found {
            Some((lookup_records, input_count)) => self.apply_lookup_records(
                lookup_records,
                match_type,
                input_count,
                context_length,
                nesting_left,
            ),
            None => false,
        }
    }

    fn apply_chain_context(
        &mut self,
        chain_context_lookup: &'a ChainContextLookup,
        match_type: MatchType,
        glyph: u16,
        context_length: usize,
        nesting_left: usize,
    ) -> bool {
        let buffer = &*self.buffer;
        let classes = &*self.classes;
        let found = chain_context_lookup_info(chain_context_lookup, glyph, |match_context| {
            let input_count = match_context.input_table.len() + 1;
            let lookahead_count = match_context.lookahead_table.len();
            // Quick rejection before looking at any glyphs.
            if buffer.backtrack_len() < match_context.backtrack_table.len()
                || buffer.position() + input_count + lookahead_count > buffer.len()
                || input_count + lookahead_count > context_length
            {
                return None;
            }
            if !match_backtrack(buffer, classes, match_type, &match_context.backtrack_table) {
                return None;
            }
            let input_len = match_input(
                buffer,
                classes,
                match_type,
                &match_context.input_table,
                context_length,
            )?;
            match_lookahead(
                buffer,
                classes,
                match_type,
                &match_context.lookahead_table,
                input_len,
                context_length,
            )
            .then_some(input_count)
        });
        match found {
            Some((lookup_records, input_count)) => self.apply_lookup_records(
                lookup_records,
                match_type,
                input_count,
                context_length,
                nesting_left,
            ),
            None => false,
        }
    }

    /// Walk the matched input sequence, applying each lookup record at its sequence index.
    ///
    /// Glyphs without a record, and those a record's lookup does not substitute, are copied to
    /// the output. Ignored marks are copied over without counting towards the sequence index.
    fn apply_lookup_records(
        &mut self,
        lookup_records: &[SequenceLookupRecord],
        match_type: MatchType,
        input_count: usize,
        context_length: usize,
        nesting_left: usize,
    ) -> bool {
        let start = self.buffer.position();
        let end = cmp::min(self.buffer.len(), start.saturating_add(context_length));
        if start + input_count > end {
            return false;
        }
        let mut records = lookup_records.iter().peekable();
        let mut i = 0;
        while i < input_count {
            let glyph = match self.buffer.current_glyph() {
                Some(glyph) => glyph.glyph_index,
                None => break,
            };
            if match_type.skip_mark(&*self.classes, glyph) {
                // A nested lookup has changed what follows; the remaining glyphs are processed
                // as usual by the caller.
                if self.buffer.position() + input_count - i == end {
                    break;
                }
                self.buffer.next_glyph();
                continue;
            }

            // Records are applied in order; one whose index has been passed can't apply.
            while records
                .next_if(|&&(sequence_index, _)| usize::from(sequence_index) < i)
                .is_some()
            {}
            if let Some(&(_, lookup_index)) =
                records.next_if(|&&(sequence_index, _)| usize::from(sequence_index) == i)
            {
                let old_pos = self.buffer.position();
                let applied =
                    self.apply_nested(usize::from(lookup_index), end - old_pos, nesting_left);
                let new_pos = self.buffer.position();
                i += new_pos.saturating_sub(old_pos);
                if new_pos >= end {
                    break;
                }
                if applied && new_pos > old_pos {
                    continue;
                }
            }
            self.buffer.next_glyph();
            i += 1;
        }
        true
    }

    /// Reverse chaining substitutions replace the glyph at the cursor in place and only apply
    /// from the top level, never nested.
    fn apply_reverse_chain_single(
        &mut self,
        reverse: &'a ReverseChainSingleSubst,
        match_type: MatchType,
        glyph: u16,
        context_length: usize,
    ) -> bool {
        if context_length != UNBOUNDED_CONTEXT {
            return false;
        }
        let output_glyph = match reverse.apply_glyph(glyph) {
            Some(output_glyph) => output_glyph,
            None => return false,
        };
        let match_context = reverse.match_context();
        let buffer = &*self.buffer;
        let classes = &*self.classes;
        if !match_backtrack(buffer, classes, match_type, &match_context.backtrack_table)
            || !match_lookahead(
                buffer,
                classes,
                match_type,
                &match_context.lookahead_table,
                1,
                UNBOUNDED_CONTEXT,
            )
        {
            return false;
        }
        let position = self.buffer.position();
        match self.buffer.glyph_mut(position) {
            Some(glyph) => {
                glyph.glyph_index = output_glyph;
                true
            }
            None => false,
        }
    }
}
