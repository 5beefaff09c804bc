//! The glyph buffer that substitutions are applied to.
//!
//! Forward lookups read from an input sequence and write to an output sequence, which replaces
//! the input once a pass over the buffer is complete. Reverse lookups substitute in place.

use std::mem;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawGlyph {
    pub glyph_index: u16,
    /// Feature mask. A lookup only applies to glyphs that share a bit with its mask.
    pub mask: u32,
    pub cluster: u32,
    /// Index of the ligature component this glyph belongs to, 0 if none.
    pub liga_component_pos: u16,
    /// Identifier of the ligature this glyph is part of, 0 if none.
    pub liga_id: u16,
}

impl RawGlyph {
    pub fn new(glyph_index: u16, cluster: u32) -> RawGlyph {
        RawGlyph {
            glyph_index,
            mask: !0,
            cluster,
            liga_component_pos: 0,
            liga_id: 0,
        }
    }
}

/// Operations the substitution engine performs on a glyph buffer.
///
/// The buffer has a cursor into the input sequence. Glyphs before the cursor have been processed
/// and are the context for backtrack matching: the output sequence while output is active,
/// otherwise the input itself.
pub trait GlyphBuffer {
    /// Number of glyphs in the input sequence.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self) -> usize;

    fn set_position(&mut self, position: usize);

    fn glyph(&self, index: usize) -> Option<&RawGlyph>;

    fn glyph_mut(&mut self, index: usize) -> Option<&mut RawGlyph>;

    fn current_glyph(&self) -> Option<&RawGlyph> {
        self.glyph(self.position())
    }

    /// Number of processed glyphs available for backtrack matching.
    fn backtrack_len(&self) -> usize;

    /// A processed glyph, indexed from the start of the sequence.
    fn backtrack_glyph(&self, index: usize) -> Option<&RawGlyph>;

    /// Begin writing to an empty output sequence.
    fn clear_output(&mut self);

    /// Replace the input with the output and move the cursor to the start.
    fn swap_buffers(&mut self);

    /// Drop the output, leaving the input as it is.
    fn discard_output(&mut self);

    /// Copy the current glyph to the output and advance.
    fn next_glyph(&mut self);

    /// Advance without output.
    fn skip_glyph(&mut self);

    /// Output the current glyph with its index replaced and advance. Without active output the
    /// glyph is replaced in place.
    fn replace_glyph(&mut self, glyph_index: u16);

    /// Consume `consumed` input glyphs, outputting a copy of the current glyph for each of
    /// `glyph_indices`. The ligature component position and id of the copies are set when given.
    fn output_glyphs(
        &mut self,
        consumed: usize,
        glyph_indices: &[u16],
        liga_component_pos: Option<u16>,
        liga_id: Option<u16>,
    );

    /// A new ligature id, never 0.
    fn allocate_lig_id(&mut self) -> u16;
}

/// A `GlyphBuffer` backed by two vectors.
#[derive(Debug, Clone)]
pub struct Buffer {
    info: Vec<RawGlyph>,
    out: Vec<RawGlyph>,
    idx: usize,
    have_output: bool,
    next_lig_id: u16,
}

impl Buffer {
    pub fn new(glyphs: Vec<RawGlyph>) -> Buffer {
        Buffer {
            info: glyphs,
            out: Vec::new(),
            idx: 0,
            have_output: false,
            next_lig_id: 0,
        }
    }

    /// A buffer with one glyph per cluster.
    pub fn from_glyph_indices(glyph_indices: &[u16]) -> Buffer {
        let glyphs = glyph_indices
            .iter()
            .zip(0..)
            .map(|(&glyph_index, cluster)| RawGlyph::new(glyph_index, cluster))
            .collect();
        Buffer::new(glyphs)
    }

    pub fn glyphs(&self) -> &[RawGlyph] {
        &self.info
    }

    pub fn glyph_indices(&self) -> Vec<u16> {
        self.info.iter().map(|glyph| glyph.glyph_index).collect()
    }

    pub fn into_glyphs(self) -> Vec<RawGlyph> {
        self.info
    }
}

impl GlyphBuffer for Buffer {
    fn len(&self) -> usize {
        self.info.len()
    }

    fn position(&self) -> usize {
        self.idx
    }

    fn set_position(&mut self, position: usize) {
        self.idx = position;
    }

    fn glyph(&self, index: usize) -> Option<&RawGlyph> {
        self.info.get(index)
    }

    fn glyph_mut(&mut self, index: usize) -> Option<&mut RawGlyph> {
        self.info.get_mut(index)
    }

    fn backtrack_len(&self) -> usize {
        if self.have_output {
            self.out.len()
        } else {
            self.idx
        }
    }

    fn backtrack_glyph(&self, index: usize) -> Option<&RawGlyph> {
        if self.have_output {
            self.out.get(index)
        } else if index < self.idx {
            self.info.get(index)
        } else {
            None
        }
    }

    fn clear_output(&mut self) {
        self.out.clear();
        self.have_output = true;
    }

    fn swap_buffers(&mut self) {
        if self.have_output {
            mem::swap(&mut self.info, &mut self.out);
        }
        self.discard_output();
    }

    fn discard_output(&mut self) {
        self.out.clear();
        self.have_output = false;
        self.idx = 0;
    }

    fn next_glyph(&mut self) {
        if let Some(glyph) = self.info.get(self.idx) {
            if self.have_output {
                self.out.push(*glyph);
            }
            self.idx += 1;
        }
    }

    fn skip_glyph(&mut self) {
        if self.idx < self.info.len() {
            self.idx += 1;
        }
    }

    fn replace_glyph(&mut self, glyph_index: u16) {
        if self.have_output {
            self.output_glyphs(1, &[glyph_index], None, None);
        } else if let Some(glyph) = self.info.get_mut(self.idx) {
            glyph.glyph_index = glyph_index;
            self.idx += 1;
        }
    }

    fn output_glyphs(
        &mut self,
        consumed: usize,
        glyph_indices: &[u16],
        liga_component_pos: Option<u16>,
        liga_id: Option<u16>,
    ) {
        let template = match self.info.get(self.idx) {
            Some(glyph) => *glyph,
            None => return,
        };
        self.out.extend(glyph_indices.iter().map(|&glyph_index| {
            let mut glyph = template;
            glyph.glyph_index = glyph_index;
            if let Some(liga_component_pos) = liga_component_pos {
                glyph.liga_component_pos = liga_component_pos;
            }
            if let Some(liga_id) = liga_id {
                glyph.liga_id = liga_id;
            }
            glyph
        }));
        self.idx = self.idx.saturating_add(consumed).min(self.info.len());
    }

    fn allocate_lig_id(&mut self) -> u16 {
        self.next_lig_id = self.next_lig_id.wrapping_add(1);
        if self.next_lig_id == 0 {
            self.next_lig_id = 1;
        }
        self.next_lig_id
    }
}
