//! Glyph classification from the `GDEF` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gdef>

use rustc_hash::FxHashMap;

use crate::layout::GDEFTable;
use crate::sanitize::Sanitized;

pub const GLYPH_CLASS_NONE: u16 = 0;
pub const GLYPH_CLASS_BASE: u16 = 1;
pub const GLYPH_CLASS_LIGATURE: u16 = 2;
pub const GLYPH_CLASS_MARK: u16 = 3;
pub const GLYPH_CLASS_COMPONENT: u16 = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GlyphClass {
    #[default]
    Unclassified,
    Base,
    Ligature,
    Mark,
    Component,
}

impl GlyphClass {
    pub fn from_class_value(class_value: u16) -> GlyphClass {
        match class_value {
            GLYPH_CLASS_BASE => GlyphClass::Base,
            GLYPH_CLASS_LIGATURE => GlyphClass::Ligature,
            GLYPH_CLASS_MARK => GlyphClass::Mark,
            GLYPH_CLASS_COMPONENT => GlyphClass::Component,
            _ => GlyphClass::Unclassified,
        }
    }
}

/// Source of the glyph properties consulted while matching lookups.
pub trait GlyphClassProvider {
    fn glyph_class(&self, glyph: u16) -> GlyphClass;

    /// The mark attachment class of `glyph`, 0 if it has none.
    fn mark_attach_class(&self, glyph: u16) -> u16;

    /// Whether `glyph` is in the mark glyph set with the given index.
    fn mark_set_contains(&self, set_index: u16, glyph: u16) -> bool;

    /// Whether classes are synthesized as substitutions are made, rather than read from a font.
    ///
    /// When true, substitutions record the class of each glyph they produce with
    /// `set_glyph_class`.
    fn has_synthetic_classes(&self) -> bool {
        false
    }

    fn set_glyph_class(&mut self, _glyph: u16, _class: GlyphClass) {}
}

impl GlyphClassProvider for GDEFTable {
    fn glyph_class(&self, glyph: u16) -> GlyphClass {
        self.opt_glyph_classdef
            .as_ref()
            .map_or(GlyphClass::Unclassified, |glyph_classdef| {
                GlyphClass::from_class_value(glyph_classdef.glyph_class_value(glyph))
            })
    }

    fn mark_attach_class(&self, glyph: u16) -> u16 {
        self.opt_mark_attach_classdef
            .as_ref()
            .map_or(GLYPH_CLASS_NONE, |mark_attach_classdef| {
                mark_attach_classdef.glyph_class_value(glyph)
            })
    }

    fn mark_set_contains(&self, set_index: u16, glyph: u16) -> bool {
        self.opt_mark_glyph_sets
            .as_ref()
            .and_then(|mark_glyph_sets| mark_glyph_sets.get(usize::from(set_index)))
            .is_some_and(|mark_set| mark_set.glyph_coverage_value(glyph).is_some())
    }
}

/// A table that failed validation classifies nothing.
impl GlyphClassProvider for Sanitized<GDEFTable> {
    fn glyph_class(&self, glyph: u16) -> GlyphClass {
        self.get()
            .map_or(GlyphClass::Unclassified, |gdef| gdef.glyph_class(glyph))
    }

    fn mark_attach_class(&self, glyph: u16) -> u16 {
        self.get()
            .map_or(GLYPH_CLASS_NONE, |gdef| gdef.mark_attach_class(glyph))
    }

    fn mark_set_contains(&self, set_index: u16, glyph: u16) -> bool {
        self.get()
            .is_some_and(|gdef| gdef.mark_set_contains(set_index, glyph))
    }
}

/// Glyph classes for fonts without a `GDEF` table.
///
/// Classes are assigned up front by the caller and then maintained as substitutions produce new
/// glyphs. Mark attachment classes and mark glyph sets are not available.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGlyphClasses {
    classes: FxHashMap<u16, GlyphClass>,
}

impl SyntheticGlyphClasses {
    pub fn new() -> SyntheticGlyphClasses {
        SyntheticGlyphClasses::default()
    }

    pub fn with_class(mut self, glyph: u16, class: GlyphClass) -> SyntheticGlyphClasses {
        self.set_glyph_class(glyph, class);
        self
    }
}

impl GlyphClassProvider for SyntheticGlyphClasses {
    fn glyph_class(&self, glyph: u16) -> GlyphClass {
        self.classes.get(&glyph).copied().unwrap_or_default()
    }

    fn mark_attach_class(&self, _glyph: u16) -> u16 {
        GLYPH_CLASS_NONE
    }

    fn mark_set_contains(&self, _set_index: u16, _glyph: u16) -> bool {
        false
    }

    fn has_synthetic_classes(&self) -> bool {
        true
    }

    fn set_glyph_class(&mut self, glyph: u16, class: GlyphClass) {
        self.classes.insert(glyph, class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::builder::{class_def_format2, TableBuilder};

    #[test]
    fn gdef_classes() {
        let mut t = TableBuilder::new();
        t.u16(1).u16(0);
        t.offset16(class_def_format2(&[(1, 2, 1), (3, 3, 2), (4, 5, 3)]));
        t.u16(0).u16(0);
        t.offset16(class_def_format2(&[(5, 5, 7)]));
        let data = t.into_bytes();
        let gdef = ReadScope::new(&data).read::<GDEFTable>().unwrap();

        assert_eq!(gdef.glyph_class(1), GlyphClass::Base);
        assert_eq!(gdef.glyph_class(3), GlyphClass::Ligature);
        assert_eq!(gdef.glyph_class(4), GlyphClass::Mark);
        assert_eq!(gdef.glyph_class(9), GlyphClass::Unclassified);
        assert_eq!(gdef.mark_attach_class(5), 7);
        assert_eq!(gdef.mark_attach_class(4), 0);
        assert!(!gdef.mark_set_contains(0, 4));
        assert!(!gdef.has_synthetic_classes());
    }

    #[test]
    fn corrupt_gdef_classifies_nothing() {
        let gdef = crate::sanitize::sanitize::<GDEFTable>("GDEF", &[0, 1, 0]);
        assert!(!gdef.is_usable());
        assert_eq!(gdef.glyph_class(1), GlyphClass::Unclassified);
    }

    #[test]
    fn synthetic_classes() {
        let mut classes = SyntheticGlyphClasses::new().with_class(7, GlyphClass::Mark);
        assert!(classes.has_synthetic_classes());
        assert_eq!(classes.glyph_class(7), GlyphClass::Mark);
        assert_eq!(classes.glyph_class(8), GlyphClass::Unclassified);
        classes.set_glyph_class(8, GlyphClass::Ligature);
        assert_eq!(classes.glyph_class(8), GlyphClass::Ligature);
    }
}
