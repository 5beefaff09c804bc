//! `GSUB` and `GDEF` font table parsing.
//!
//! Parsing a table reads and validates every structure reachable from it: lookups, their
//! subtables and the coverage and class definition tables those refer to. The parsed form is
//! immutable, shares repeated coverage and class tables through `Arc`, and can be used from
//! several threads at once.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gsub>

use std::cell::RefCell;
use std::convert::TryFrom;
use std::sync::Arc;

use log::debug;
use tinyvec::TinyVec;

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCache, ReadCtxt, ReadFrom, ReadScope,
};
use crate::binary::{U16Be, U32Be};
use crate::context::{GlyphTable, LookupFlag, MatchContext};
use crate::error::ParseError;
use crate::search;
use crate::size;

pub struct GDEFTable {
    pub opt_glyph_classdef: Option<ClassDef>,
    pub opt_mark_attach_classdef: Option<ClassDef>,
    pub opt_mark_glyph_sets: Option<Vec<Coverage>>,
}

pub struct GsubTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub opt_lookup_list: Option<LookupList>,
}

pub struct LookupList {
    lookups: Vec<SubstLookup>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubstLookupType {
    SingleSubst,
    MultipleSubst,
    AlternateSubst,
    LigatureSubst,
    ContextSubst,
    ChainContextSubst,
    ExtensionSubst,
    ReverseChainSingleSubst,
}

/// A GSUB lookup: subtables of one type applied with a common set of flags.
pub struct SubstLookup {
    /// `None` if the lookup type is not one defined for GSUB. Such a lookup never applies.
    pub lookup_type: Option<SubstLookupType>,
    pub lookup_flag: LookupFlag,
    pub mark_filtering_set: Option<u16>,
    pub subtables: Vec<SubstSubtable>,
    reverse: bool,
    applicable: bool,
}

pub enum SubstSubtable {
    Single(SingleSubst),
    Multiple(MultipleSubst),
    Alternate(AlternateSubst),
    Ligature(LigatureSubst),
    Context(ContextLookup),
    ChainContext(ChainContextLookup),
    Extension(ExtensionSubst),
    ReverseChainSingle(ReverseChainSingleSubst),
}

/// GSUB Lookup Type 7: a subtable of another type stored at a 32-bit offset.
pub struct ExtensionSubst {
    /// `None` if the wrapped lookup type is unknown.
    pub extension_lookup_type: Option<SubstLookupType>,
    /// The wrapped subtable. `None` for a zero offset, an unknown lookup type or a subtable in an
    /// unsupported format.
    pub subtable: Option<Box<SubstSubtable>>,
}

/// Caches shared between the subtables of one table while it is being parsed.
pub struct ParseCache {
    coverages: RefCell<ReadCache<Coverage>>,
    classdefs: RefCell<ReadCache<ClassDef>>,
}

impl ParseCache {
    pub fn new() -> ParseCache {
        ParseCache {
            coverages: RefCell::new(ReadCache::new()),
            classdefs: RefCell::new(ReadCache::new()),
        }
    }

    fn coverage(&self, scope: ReadScope<'_>) -> Result<Arc<Coverage>, ParseError> {
        scope.read_cache::<Coverage>(&mut self.coverages.borrow_mut())
    }

    fn classdef(&self, scope: ReadScope<'_>) -> Result<Arc<ClassDef>, ParseError> {
        scope.read_cache::<ClassDef>(&mut self.classdefs.borrow_mut())
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        ParseCache::new()
    }
}

impl ReadBinary for GDEFTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let table = ctxt.scope();

        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let glyph_classdef_offset = usize::from(ctxt.read_u16be()?);
        let _attach_list_offset = ctxt.read_u16be()?;
        let _lig_caret_list_offset = ctxt.read_u16be()?;
        // MarkAttachClassDef was added to GDEF in OpenType 1.2 without changing the version, so
        // it is always read.
        let mark_attach_classdef_offset = usize::from(ctxt.read_u16be()?);
        let mut gdef_header_size = 6 * size::U16;
        let mark_glyph_sets_offset = if minor_version >= 2 {
            gdef_header_size += size::U16;
            usize::from(ctxt.read_u16be()?)
        } else {
            0
        };

        let opt_glyph_classdef = if glyph_classdef_offset < gdef_header_size {
            None
        } else {
            Some(table.offset(glyph_classdef_offset).read::<ClassDef>()?)
        };
        let opt_mark_attach_classdef = if mark_attach_classdef_offset < gdef_header_size {
            None
        } else {
            Some(
                table
                    .offset(mark_attach_classdef_offset)
                    .read::<ClassDef>()?,
            )
        };
        let opt_mark_glyph_sets = if mark_glyph_sets_offset < gdef_header_size {
            None
        } else {
            Some(read_mark_glyph_sets(table.offset(mark_glyph_sets_offset))?)
        };

        Ok(GDEFTable {
            opt_glyph_classdef,
            opt_mark_attach_classdef,
            opt_mark_glyph_sets,
        })
    }
}

fn read_mark_glyph_sets(scope: ReadScope<'_>) -> Result<Vec<Coverage>, ParseError> {
    let mut ctxt = scope.ctxt();
    let format = ctxt.read_u16be()?;
    ctxt.check_version(format == 1)?;
    let mark_glyph_set_count = usize::from(ctxt.read_u16be()?);
    let coverage_offsets = ctxt.read_array::<U32Be>(mark_glyph_set_count)?;
    coverage_offsets
        .iter()
        .map(|offset| {
            let offset = usize::try_from(offset)?;
            scope.offset(offset).read::<Coverage>()
        })
        .collect()
}

impl ReadBinary for GsubTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let table = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let _script_list_offset = ctxt.read_u16be()?;
        let _feature_list_offset = ctxt.read_u16be()?;
        let lookup_list_offset = usize::from(ctxt.read_u16be()?);
        let opt_lookup_list = if lookup_list_offset == 0 {
            None
        } else {
            let cache = ParseCache::new();
            Some(
                table
                    .offset(lookup_list_offset)
                    .read_dep::<LookupList>(&cache)?,
            )
        };
        Ok(GsubTable {
            major_version,
            minor_version,
            opt_lookup_list,
        })
    }
}

impl GsubTable {
    pub fn lookup(&self, lookup_index: usize) -> Option<&SubstLookup> {
        self.opt_lookup_list.as_ref()?.lookup(lookup_index)
    }
}

impl ReadBinaryDep for LookupList {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let lookup_count = usize::from(ctxt.read_u16be()?);
        let lookup_offsets = ctxt.read_array::<U16Be>(lookup_count)?;
        let lookups = read_objects_dep::<SubstLookup>(&scope, lookup_offsets, cache)?;
        Ok(LookupList { lookups })
    }
}

impl LookupList {
    pub fn new(lookups: Vec<SubstLookup>) -> LookupList {
        LookupList { lookups }
    }

    pub fn lookup(&self, lookup_index: usize) -> Option<&SubstLookup> {
        self.lookups.get(lookup_index)
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl SubstLookupType {
    pub fn from_u16(lookup_type: u16) -> Option<SubstLookupType> {
        match lookup_type {
            1 => Some(SubstLookupType::SingleSubst),
            2 => Some(SubstLookupType::MultipleSubst),
            3 => Some(SubstLookupType::AlternateSubst),
            4 => Some(SubstLookupType::LigatureSubst),
            5 => Some(SubstLookupType::ContextSubst),
            6 => Some(SubstLookupType::ChainContextSubst),
            7 => Some(SubstLookupType::ExtensionSubst),
            8 => Some(SubstLookupType::ReverseChainSingleSubst),
            _ => None,
        }
    }

    /// Whether a subtable of this type in the given format can be read.
    fn supports_format(self, format: u16) -> bool {
        match self {
            SubstLookupType::SingleSubst => matches!(format, 1 | 2),
            SubstLookupType::ContextSubst | SubstLookupType::ChainContextSubst => {
                matches!(format, 1..=3)
            }
            SubstLookupType::MultipleSubst
            | SubstLookupType::AlternateSubst
            | SubstLookupType::LigatureSubst
            | SubstLookupType::ExtensionSubst
            | SubstLookupType::ReverseChainSingleSubst => format == 1,
        }
    }
}

impl ReadBinaryDep for SubstLookup {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let lookup_type = ctxt.read_u16be()?;
        let lookup_flag = LookupFlag::from_bits_retain(ctxt.read_u16be()?);
        let subtable_count = usize::from(ctxt.read_u16be()?);
        let subtable_offsets = ctxt.read_array::<U16Be>(subtable_count)?;
        let mark_filtering_set = if lookup_flag.contains(LookupFlag::USE_MARK_FILTERING_SET) {
            Some(ctxt.read_u16be()?)
        } else {
            None
        };

        let lookup_type = SubstLookupType::from_u16(lookup_type).or_else(|| {
            debug!("ignoring lookup with unknown type {}", lookup_type);
            None
        });
        let mut subtables = Vec::with_capacity(subtable_offsets.len());
        if let Some(lookup_type) = lookup_type {
            for subtable_offset in &subtable_offsets {
                let subtable = scope.offset(usize::from(subtable_offset));
                if let Some(subtable) = read_subst_subtable(subtable, lookup_type, cache)? {
                    subtables.push(subtable);
                }
            }
        }
        Ok(SubstLookup::new(
            lookup_type,
            lookup_flag,
            mark_filtering_set,
            subtables,
        ))
    }
}

impl SubstLookup {
    pub fn new(
        lookup_type: Option<SubstLookupType>,
        lookup_flag: LookupFlag,
        mark_filtering_set: Option<u16>,
        subtables: Vec<SubstSubtable>,
    ) -> SubstLookup {
        let reverse = match lookup_type {
            Some(SubstLookupType::ExtensionSubst) => subtables
                .first()
                .is_some_and(SubstSubtable::is_reverse),
            Some(lookup_type) => lookup_type == SubstLookupType::ReverseChainSingleSubst,
            None => false,
        };
        let applicable = match lookup_type {
            Some(SubstLookupType::ExtensionSubst) => {
                let mut inner_types = subtables.iter().filter_map(|subtable| match subtable {
                    SubstSubtable::Extension(extension) => Some(extension.extension_lookup_type),
                    _ => None,
                });
                let consistent = match inner_types.next() {
                    Some(first) => inner_types.all(|lookup_type| lookup_type == first),
                    None => true,
                };
                if !consistent {
                    debug!("disabling extension lookup with mixed subtable types");
                }
                consistent
            }
            Some(_) => true,
            None => false,
        };
        SubstLookup {
            lookup_type,
            lookup_flag,
            mark_filtering_set,
            subtables,
            reverse,
            applicable,
        }
    }

    /// Whether this lookup is applied from the end of the buffer to the start, resolving
    /// extension subtables to the type they wrap.
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Whether this lookup can apply at all: its type is known and, for extension lookups, all
    /// of its subtables wrap the same type.
    pub fn is_applicable(&self) -> bool {
        self.applicable
    }
}

impl SubstSubtable {
    pub fn is_reverse(&self) -> bool {
        match self {
            SubstSubtable::ReverseChainSingle(_) => true,
            SubstSubtable::Extension(extension) => {
                extension.extension_lookup_type == Some(SubstLookupType::ReverseChainSingleSubst)
            }
            _ => false,
        }
    }
}

/// Read a subtable of the given type.
///
/// Returns `Ok(None)` for a format that is not supported, which is skipped rather than treated
/// as an error so that future formats do not invalidate the whole table.
fn read_subst_subtable(
    scope: ReadScope<'_>,
    lookup_type: SubstLookupType,
    cache: &ParseCache,
) -> Result<Option<SubstSubtable>, ParseError> {
    let format = scope.read::<U16Be>()?;
    if !lookup_type.supports_format(format) {
        debug!(
            "skipping {:?} subtable with unsupported format {}",
            lookup_type, format
        );
        return Ok(None);
    }
    let subtable = match lookup_type {
        SubstLookupType::SingleSubst => SubstSubtable::Single(scope.read_dep::<SingleSubst>(cache)?),
        SubstLookupType::MultipleSubst => {
            SubstSubtable::Multiple(scope.read_dep::<MultipleSubst>(cache)?)
        }
        SubstLookupType::AlternateSubst => {
            SubstSubtable::Alternate(scope.read_dep::<AlternateSubst>(cache)?)
        }
        SubstLookupType::LigatureSubst => {
            SubstSubtable::Ligature(scope.read_dep::<LigatureSubst>(cache)?)
        }
        SubstLookupType::ContextSubst => {
            SubstSubtable::Context(scope.read_dep::<ContextLookup>(cache)?)
        }
        SubstLookupType::ChainContextSubst => {
            SubstSubtable::ChainContext(scope.read_dep::<ChainContextLookup>(cache)?)
        }
        SubstLookupType::ExtensionSubst => SubstSubtable::Extension(read_extension(scope, cache)?),
        SubstLookupType::ReverseChainSingleSubst => {
            SubstSubtable::ReverseChainSingle(scope.read_dep::<ReverseChainSingleSubst>(cache)?)
        }
    };
    Ok(Some(subtable))
}

fn read_extension(scope: ReadScope<'_>, cache: &ParseCache) -> Result<ExtensionSubst, ParseError> {
    let mut ctxt = scope.ctxt();
    let _subst_format = ctxt.read_u16be()?;
    let extension_lookup_type = ctxt.read_u16be()?;
    let extension_offset = usize::try_from(ctxt.read_u32be()?)?;
    let opt_lookup_type = SubstLookupType::from_u16(extension_lookup_type);
    let subtable = match opt_lookup_type {
        // An extension may not wrap another extension.
        Some(SubstLookupType::ExtensionSubst) => return Err(ParseError::BadVersion),
        Some(_) if extension_offset == 0 => None,
        Some(lookup_type) => {
            read_subst_subtable(scope.offset(extension_offset), lookup_type, cache)?.map(Box::new)
        }
        None => {
            // Kept so the lookup sees the type when checking its subtables agree.
            debug!(
                "ignoring extension subtable of unknown type {}",
                extension_lookup_type
            );
            None
        }
    };
    Ok(ExtensionSubst {
        extension_lookup_type: opt_lookup_type,
        subtable,
    })
}

pub enum SingleSubst {
    Format1 {
        coverage: Arc<Coverage>,
        delta_glyph_index: i16,
    },
    Format2 {
        coverage: Arc<Coverage>,
        substitute_glyph_array: Vec<u16>,
    },
}

impl ReadBinaryDep for SingleSubst {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let subtable = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let coverage = cache.coverage(subtable.offset(coverage_offset))?;
                let delta_glyph_index = ctxt.read_i16be()?;
                Ok(SingleSubst::Format1 {
                    coverage,
                    delta_glyph_index,
                })
            }
            2 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let coverage = cache.coverage(subtable.offset(coverage_offset))?;
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let substitute_glyph_array = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
                Ok(SingleSubst::Format2 {
                    coverage,
                    substitute_glyph_array,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl SingleSubst {
    pub fn apply_glyph(&self, glyph: u16) -> Option<u16> {
        match *self {
            SingleSubst::Format1 {
                ref coverage,
                delta_glyph_index,
            } => {
                coverage.glyph_coverage_value(glyph)?;
                // Addition of deltaGlyphID is modulo 65536.
                Some(glyph.wrapping_add_signed(delta_glyph_index))
            }
            SingleSubst::Format2 {
                ref coverage,
                ref substitute_glyph_array,
            } => {
                let coverage_index = coverage.glyph_coverage_value(glyph)?;
                substitute_glyph_array
                    .get(usize::from(coverage_index))
                    .copied()
            }
        }
    }
}

pub struct MultipleSubst {
    coverage: Arc<Coverage>,
    sequences: Vec<SequenceTable>,
}

pub struct SequenceTable {
    pub substitute_glyphs: Vec<u16>,
}

impl ReadBinaryDep for MultipleSubst {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                let sequence_count = usize::from(ctxt.read_u16be()?);
                let sequence_offsets = ctxt.read_array::<U16Be>(sequence_count)?;
                let sequences = read_objects::<SequenceTable>(&scope, sequence_offsets)?;
                Ok(MultipleSubst {
                    coverage,
                    sequences,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl MultipleSubst {
    pub fn apply_glyph(&self, glyph: u16) -> Option<&SequenceTable> {
        let coverage_index = self.coverage.glyph_coverage_value(glyph)?;
        self.sequences.get(usize::from(coverage_index))
    }
}

impl ReadBinary for SequenceTable {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let glyph_count = usize::from(ctxt.read_u16be()?);
        // An empty sequence is not allowed, but is left to fail to match rather than rejecting
        // the whole table.
        let substitute_glyphs = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
        Ok(SequenceTable { substitute_glyphs })
    }
}

pub struct AlternateSubst {
    coverage: Arc<Coverage>,
    alternatesets: Vec<AlternateSet>,
}

pub struct AlternateSet {
    pub alternate_glyphs: Vec<u16>,
}

impl ReadBinaryDep for AlternateSubst {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                let alternateset_count = usize::from(ctxt.read_u16be()?);
                let alternateset_offsets = ctxt.read_array::<U16Be>(alternateset_count)?;
                let alternatesets = read_objects::<AlternateSet>(&scope, alternateset_offsets)?;
                Ok(AlternateSubst {
                    coverage,
                    alternatesets,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl AlternateSubst {
    pub fn apply_glyph(&self, glyph: u16) -> Option<&AlternateSet> {
        let coverage_index = self.coverage.glyph_coverage_value(glyph)?;
        self.alternatesets.get(usize::from(coverage_index))
    }
}

impl ReadBinary for AlternateSet {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let glyph_count = usize::from(ctxt.read_u16be()?);
        let alternate_glyphs = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
        Ok(AlternateSet { alternate_glyphs })
    }
}

pub struct LigatureSubst {
    coverage: Arc<Coverage>,
    ligaturesets: Vec<LigatureSet>,
}

pub struct LigatureSet {
    pub ligatures: Vec<Ligature>,
}

pub struct Ligature {
    pub ligature_glyph: u16,
    /// Components after the first, which is the glyph covered by the subtable.
    pub component_glyphs: TinyVec<[u16; 4]>,
}

impl ReadBinaryDep for LigatureSubst {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                let ligatureset_count = usize::from(ctxt.read_u16be()?);
                let ligatureset_offsets = ctxt.read_array::<U16Be>(ligatureset_count)?;
                let ligaturesets = read_objects::<LigatureSet>(&scope, ligatureset_offsets)?;
                Ok(LigatureSubst {
                    coverage,
                    ligaturesets,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl LigatureSubst {
    pub fn apply_glyph(&self, glyph: u16) -> Option<&LigatureSet> {
        let coverage_index = self.coverage.glyph_coverage_value(glyph)?;
        self.ligaturesets.get(usize::from(coverage_index))
    }
}

impl ReadBinary for LigatureSet {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let ligature_count = usize::from(ctxt.read_u16be()?);
        let ligature_offsets = ctxt.read_array::<U16Be>(ligature_count)?;
        let ligatures = read_objects::<Ligature>(&scope, ligature_offsets)?;
        Ok(LigatureSet { ligatures })
    }
}

impl ReadBinary for Ligature {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let ligature_glyph = ctxt.read_u16be()?;
        // The count includes the first component. A count of zero is read as a ligature of the
        // first component alone.
        let component_count = usize::from(ctxt.read_u16be()?);
        let component_glyphs = ctxt
            .read_array::<U16Be>(component_count.saturating_sub(1))?
            .iter()
            .collect();
        Ok(Ligature {
            ligature_glyph,
            component_glyphs,
        })
    }
}

/// A (sequence index, lookup list index) pair from a contextual subtable.
pub type SequenceLookupRecord = (u16, u16);

pub enum ContextLookup {
    Format1 {
        coverage: Arc<Coverage>,
        subrulesets: Vec<Option<SubRuleSet>>,
    },
    Format2 {
        coverage: Arc<Coverage>,
        classdef: Arc<ClassDef>,
        subclasssets: Vec<Option<SubClassSet>>,
    },
    Format3 {
        coverages: Vec<Arc<Coverage>>,
        lookup_records: Vec<SequenceLookupRecord>,
    },
}

pub struct SubRuleSet {
    subrules: Vec<SubRule>,
}

pub struct SubRule {
    /// The input after the first glyph. `None` if the rule has no input at all and never matches.
    input_sequence: Option<Vec<u16>>,
    lookup_records: Vec<SequenceLookupRecord>,
}

pub struct SubClassSet {
    subclassrules: Vec<SubClassRule>,
}

pub struct SubClassRule {
    input_sequence: Option<Vec<u16>>,
    lookup_records: Vec<SequenceLookupRecord>,
}

pub enum ChainContextLookup {
    Format1 {
        coverage: Arc<Coverage>,
        chainsubrulesets: Vec<Option<ChainSubRuleSet>>,
    },
    Format2 {
        coverage: Arc<Coverage>,
        backtrack_classdef: Arc<ClassDef>,
        input_classdef: Arc<ClassDef>,
        lookahead_classdef: Arc<ClassDef>,
        chainsubclasssets: Vec<Option<ChainSubClassSet>>,
    },
    Format3 {
        backtrack_coverages: Vec<Arc<Coverage>>,
        input_coverages: Vec<Arc<Coverage>>,
        lookahead_coverages: Vec<Arc<Coverage>>,
        lookup_records: Vec<SequenceLookupRecord>,
    },
}

pub struct ChainSubRuleSet {
    chainsubrules: Vec<ChainSubRule>,
}

pub struct ChainSubRule {
    backtrack_sequence: Vec<u16>,
    input_sequence: Option<Vec<u16>>,
    lookahead_sequence: Vec<u16>,
    lookup_records: Vec<SequenceLookupRecord>,
}

pub struct ChainSubClassSet {
    chainsubclassrules: Vec<ChainSubClassRule>,
}

pub struct ChainSubClassRule {
    backtrack_sequence: Vec<u16>,
    input_sequence: Option<Vec<u16>>,
    lookahead_sequence: Vec<u16>,
    lookup_records: Vec<SequenceLookupRecord>,
}

impl ReadBinaryDep for ContextLookup {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let subruleset_count = usize::from(ctxt.read_u16be()?);
                let subruleset_offsets = ctxt.read_array::<U16Be>(subruleset_count)?;
                let subrulesets = read_objects_nullable::<SubRuleSet>(&scope, subruleset_offsets)?;
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                Ok(ContextLookup::Format1 {
                    coverage,
                    subrulesets,
                })
            }
            2 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let classdef_offset = usize::from(ctxt.read_u16be()?);
                let subclassset_count = usize::from(ctxt.read_u16be()?);
                let subclassset_offsets = ctxt.read_array::<U16Be>(subclassset_count)?;
                let subclasssets =
                    read_objects_nullable::<SubClassSet>(&scope, subclassset_offsets)?;
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                let classdef = cache.classdef(scope.offset(classdef_offset))?;
                Ok(ContextLookup::Format2 {
                    coverage,
                    classdef,
                    subclasssets,
                })
            }
            3 => {
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let lookup_count = usize::from(ctxt.read_u16be()?);
                let coverage_offsets = ctxt.read_array::<U16Be>(glyph_count)?;
                let coverages = read_coverages(&scope, cache, coverage_offsets)?;
                let lookup_records = ctxt.read_array::<(U16Be, U16Be)>(lookup_count)?.to_vec();
                Ok(ContextLookup::Format3 {
                    coverages,
                    lookup_records,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadBinary for SubRuleSet {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let subrule_count = usize::from(ctxt.read_u16be()?);
        let subrule_offsets = ctxt.read_array::<U16Be>(subrule_count)?;
        let subrules = read_objects::<SubRule>(&scope, subrule_offsets)?;
        Ok(SubRuleSet { subrules })
    }
}

impl ReadBinary for SubRule {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let glyph_count = usize::from(ctxt.read_u16be()?);
        let lookup_count = usize::from(ctxt.read_u16be()?);
        let input_sequence = read_input_sequence(ctxt, glyph_count)?;
        let lookup_records = ctxt.read_array::<(U16Be, U16Be)>(lookup_count)?.to_vec();
        Ok(SubRule {
            input_sequence,
            lookup_records,
        })
    }
}

impl ReadBinary for SubClassSet {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let subclassrule_count = usize::from(ctxt.read_u16be()?);
        let subclassrule_offsets = ctxt.read_array::<U16Be>(subclassrule_count)?;
        let subclassrules = read_objects::<SubClassRule>(&scope, subclassrule_offsets)?;
        Ok(SubClassSet { subclassrules })
    }
}

impl ReadBinary for SubClassRule {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let glyph_count = usize::from(ctxt.read_u16be()?);
        let lookup_count = usize::from(ctxt.read_u16be()?);
        let input_sequence = read_input_sequence(ctxt, glyph_count)?;
        let lookup_records = ctxt.read_array::<(U16Be, U16Be)>(lookup_count)?.to_vec();
        Ok(SubClassRule {
            input_sequence,
            lookup_records,
        })
    }
}

impl ReadBinaryDep for ChainContextLookup {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let chainsubruleset_count = usize::from(ctxt.read_u16be()?);
                let chainsubruleset_offsets = ctxt.read_array::<U16Be>(chainsubruleset_count)?;
                let chainsubrulesets =
                    read_objects_nullable::<ChainSubRuleSet>(&scope, chainsubruleset_offsets)?;
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                Ok(ChainContextLookup::Format1 {
                    coverage,
                    chainsubrulesets,
                })
            }
            2 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let backtrack_classdef_offset = usize::from(ctxt.read_u16be()?);
                let input_classdef_offset = usize::from(ctxt.read_u16be()?);
                let lookahead_classdef_offset = usize::from(ctxt.read_u16be()?);
                let chainsubclassset_count = usize::from(ctxt.read_u16be()?);
                let chainsubclassset_offsets = ctxt.read_array::<U16Be>(chainsubclassset_count)?;
                let chainsubclasssets =
                    read_objects_nullable::<ChainSubClassSet>(&scope, chainsubclassset_offsets)?;
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                let backtrack_classdef = cache.classdef(scope.offset(backtrack_classdef_offset))?;
                let input_classdef = cache.classdef(scope.offset(input_classdef_offset))?;
                let lookahead_classdef = cache.classdef(scope.offset(lookahead_classdef_offset))?;
                Ok(ChainContextLookup::Format2 {
                    coverage,
                    backtrack_classdef,
                    input_classdef,
                    lookahead_classdef,
                    chainsubclasssets,
                })
            }
            3 => {
                let backtrack_count = usize::from(ctxt.read_u16be()?);
                let backtrack_coverage_offsets = ctxt.read_array::<U16Be>(backtrack_count)?;
                let input_count = usize::from(ctxt.read_u16be()?);
                let input_coverage_offsets = ctxt.read_array::<U16Be>(input_count)?;
                let lookahead_count = usize::from(ctxt.read_u16be()?);
                let lookahead_coverage_offsets = ctxt.read_array::<U16Be>(lookahead_count)?;
                let lookup_count = usize::from(ctxt.read_u16be()?);
                let lookup_records = ctxt.read_array::<(U16Be, U16Be)>(lookup_count)?.to_vec();
                let backtrack_coverages =
                    read_coverages(&scope, cache, backtrack_coverage_offsets)?;
                let input_coverages = read_coverages(&scope, cache, input_coverage_offsets)?;
                let lookahead_coverages =
                    read_coverages(&scope, cache, lookahead_coverage_offsets)?;
                Ok(ChainContextLookup::Format3 {
                    backtrack_coverages,
                    input_coverages,
                    lookahead_coverages,
                    lookup_records,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadBinary for ChainSubRuleSet {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let chainsubrule_count = usize::from(ctxt.read_u16be()?);
        let chainsubrule_offsets = ctxt.read_array::<U16Be>(chainsubrule_count)?;
        let chainsubrules = read_objects::<ChainSubRule>(&scope, chainsubrule_offsets)?;
        Ok(ChainSubRuleSet { chainsubrules })
    }
}

impl ReadBinary for ChainSubRule {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let (backtrack_sequence, input_sequence, lookahead_sequence, lookup_records) =
            read_chain_rule(ctxt)?;
        Ok(ChainSubRule {
            backtrack_sequence,
            input_sequence,
            lookahead_sequence,
            lookup_records,
        })
    }
}

impl ReadBinary for ChainSubClassSet {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let chainsubclassrule_count = usize::from(ctxt.read_u16be()?);
        let chainsubclassrule_offsets = ctxt.read_array::<U16Be>(chainsubclassrule_count)?;
        let chainsubclassrules =
            read_objects::<ChainSubClassRule>(&scope, chainsubclassrule_offsets)?;
        Ok(ChainSubClassSet { chainsubclassrules })
    }
}

impl ReadBinary for ChainSubClassRule {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let (backtrack_sequence, input_sequence, lookahead_sequence, lookup_records) =
            read_chain_rule(ctxt)?;
        Ok(ChainSubClassRule {
            backtrack_sequence,
            input_sequence,
            lookahead_sequence,
            lookup_records,
        })
    }
}

type ChainRule = (
    Vec<u16>,
    Option<Vec<u16>>,
    Vec<u16>,
    Vec<SequenceLookupRecord>,
);

// Glyph and class based chain rules share a layout, differing only in what the values mean.
fn read_chain_rule(ctxt: &mut ReadCtxt<'_>) -> Result<ChainRule, ParseError> {
    let backtrack_count = usize::from(ctxt.read_u16be()?);
    let backtrack_sequence = ctxt.read_array::<U16Be>(backtrack_count)?.to_vec();
    let input_count = usize::from(ctxt.read_u16be()?);
    let input_sequence = read_input_sequence(ctxt, input_count)?;
    let lookahead_count = usize::from(ctxt.read_u16be()?);
    let lookahead_sequence = ctxt.read_array::<U16Be>(lookahead_count)?.to_vec();
    let lookup_count = usize::from(ctxt.read_u16be()?);
    let lookup_records = ctxt.read_array::<(U16Be, U16Be)>(lookup_count)?.to_vec();
    Ok((
        backtrack_sequence,
        input_sequence,
        lookahead_sequence,
        lookup_records,
    ))
}

/// Read the input of a rule after its first glyph, which is implied by the coverage or class.
///
/// An input count of zero is a rule that can never match rather than a malformed table.
fn read_input_sequence(
    ctxt: &mut ReadCtxt<'_>,
    input_count: usize,
) -> Result<Option<Vec<u16>>, ParseError> {
    match input_count.checked_sub(1) {
        Some(count) => Ok(Some(ctxt.read_array::<U16Be>(count)?.to_vec())),
        None => Ok(None),
    }
}

/// GSUB Lookup Type 8: a single substitution applied from the end of the buffer to the start.
pub struct ReverseChainSingleSubst {
    /// Coverage table for the single input glyph
    pub coverage: Arc<Coverage>,
    /// Backtrack sequence coverages, ordered by distance from the input glyph
    pub backtrack_coverages: Vec<Arc<Coverage>>,
    /// Lookahead sequence coverages, ordered by glyph sequence
    pub lookahead_coverages: Vec<Arc<Coverage>>,
    /// Substitute glyphs, ordered by coverage index
    pub substitute_glyphs: Vec<u16>,
}

impl ReadBinaryDep for ReverseChainSingleSubst {
    type HostType<'a> = Self;
    type Args<'a> = &'a ParseCache;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, cache: Self::Args<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        match ctxt.read_u16be()? {
            1 => {
                let coverage_offset = usize::from(ctxt.read_u16be()?);
                let backtrack_count = usize::from(ctxt.read_u16be()?);
                let backtrack_coverage_offsets = ctxt.read_array::<U16Be>(backtrack_count)?;
                let lookahead_count = usize::from(ctxt.read_u16be()?);
                let lookahead_coverage_offsets = ctxt.read_array::<U16Be>(lookahead_count)?;
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let substitute_glyphs = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
                let coverage = cache.coverage(scope.offset(coverage_offset))?;
                let backtrack_coverages =
                    read_coverages(&scope, cache, backtrack_coverage_offsets)?;
                let lookahead_coverages =
                    read_coverages(&scope, cache, lookahead_coverage_offsets)?;
                Ok(ReverseChainSingleSubst {
                    coverage,
                    backtrack_coverages,
                    lookahead_coverages,
                    substitute_glyphs,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReverseChainSingleSubst {
    /// The substitute for `glyph` if it is covered. The surrounding context is not checked.
    pub fn apply_glyph(&self, glyph: u16) -> Option<u16> {
        let coverage_index = self.coverage.glyph_coverage_value(glyph)?;
        self.substitute_glyphs
            .get(usize::from(coverage_index))
            .copied()
    }

    pub fn match_context(&self) -> MatchContext<'_> {
        MatchContext {
            backtrack_table: GlyphTable::ByCoverage(&self.backtrack_coverages),
            input_table: GlyphTable::Empty,
            lookahead_table: GlyphTable::ByCoverage(&self.lookahead_coverages),
        }
    }
}

/// Find the first rule of a contextual subtable that matches at `glyph`.
///
/// `f` is called with each candidate rule's context in order and returns the extent of the
/// match, if any. The lookup records of the first rule that matches are returned along with it.
pub fn context_lookup_info<'a, M>(
    context_lookup: &'a ContextLookup,
    glyph: u16,
    mut f: impl FnMut(&MatchContext<'a>) -> Option<M>,
) -> Option<(&'a [SequenceLookupRecord], M)> {
    match context_lookup {
        ContextLookup::Format1 {
            coverage,
            subrulesets,
        } => {
            let coverage_index = coverage.glyph_coverage_value(glyph)?;
            let subruleset = subrulesets.get(usize::from(coverage_index))?.as_ref()?;
            subruleset.subrules.iter().find_map(|subrule| {
                let match_context = MatchContext {
                    backtrack_table: GlyphTable::Empty,
                    input_table: GlyphTable::ById(subrule.input_sequence.as_deref()?),
                    lookahead_table: GlyphTable::Empty,
                };
                f(&match_context).map(|m| (subrule.lookup_records.as_slice(), m))
            })
        }
        ContextLookup::Format2 {
            coverage,
            classdef,
            subclasssets,
        } => {
            coverage.glyph_coverage_value(glyph)?;
            let class_value = usize::from(classdef.glyph_class_value(glyph));
            let subclassset = subclasssets.get(class_value)?.as_ref()?;
            subclassset.subclassrules.iter().find_map(|subclassrule| {
                let match_context = MatchContext {
                    backtrack_table: GlyphTable::Empty,
                    input_table: GlyphTable::ByClassDef(
                        classdef,
                        subclassrule.input_sequence.as_deref()?,
                    ),
                    lookahead_table: GlyphTable::Empty,
                };
                f(&match_context).map(|m| (subclassrule.lookup_records.as_slice(), m))
            })
        }
        ContextLookup::Format3 {
            coverages,
            lookup_records,
        } => {
            let (first, rest) = coverages.split_first()?;
            first.glyph_coverage_value(glyph)?;
            let match_context = MatchContext {
                backtrack_table: GlyphTable::Empty,
                input_table: GlyphTable::ByCoverage(rest),
                lookahead_table: GlyphTable::Empty,
            };
            f(&match_context).map(|m| (lookup_records.as_slice(), m))
        }
    }
}

/// Find the first rule of a chaining contextual subtable that matches at `glyph`.
///
/// See `context_lookup_info`.
pub fn chain_context_lookup_info<'a, M>(
    chain_context_lookup: &'a ChainContextLookup,
    glyph: u16,
    mut f: impl FnMut(&MatchContext<'a>) -> Option<M>,
) -> Option<(&'a [SequenceLookupRecord], M)> {
    match chain_context_lookup {
        ChainContextLookup::Format1 {
            coverage,
            chainsubrulesets,
        } => {
            let coverage_index = coverage.glyph_coverage_value(glyph)?;
            let chainsubruleset = chainsubrulesets.get(usize::from(coverage_index))?.as_ref()?;
            chainsubruleset.chainsubrules.iter().find_map(|chainsubrule| {
                let match_context = MatchContext {
                    backtrack_table: GlyphTable::ById(&chainsubrule.backtrack_sequence),
                    input_table: GlyphTable::ById(chainsubrule.input_sequence.as_deref()?),
                    lookahead_table: GlyphTable::ById(&chainsubrule.lookahead_sequence),
                };
                f(&match_context).map(|m| (chainsubrule.lookup_records.as_slice(), m))
            })
        }
        ChainContextLookup::Format2 {
            coverage,
            backtrack_classdef,
            input_classdef,
            lookahead_classdef,
            chainsubclasssets,
        } => {
            coverage.glyph_coverage_value(glyph)?;
            let class_value = usize::from(input_classdef.glyph_class_value(glyph));
            let chainsubclassset = chainsubclasssets.get(class_value)?.as_ref()?;
            chainsubclassset
                .chainsubclassrules
                .iter()
                .find_map(|chainsubclassrule| {
                    let match_context = MatchContext {
                        backtrack_table: GlyphTable::ByClassDef(
                            backtrack_classdef,
                            &chainsubclassrule.backtrack_sequence,
                        ),
                        input_table: GlyphTable::ByClassDef(
                            input_classdef,
                            chainsubclassrule.input_sequence.as_deref()?,
                        ),
                        lookahead_table: GlyphTable::ByClassDef(
                            lookahead_classdef,
                            &chainsubclassrule.lookahead_sequence,
                        ),
                    };
                    f(&match_context).map(|m| (chainsubclassrule.lookup_records.as_slice(), m))
                })
        }
        ChainContextLookup::Format3 {
            backtrack_coverages,
            input_coverages,
            lookahead_coverages,
            lookup_records,
        } => {
            let (first, rest) = input_coverages.split_first()?;
            first.glyph_coverage_value(glyph)?;
            let match_context = MatchContext {
                backtrack_table: GlyphTable::ByCoverage(backtrack_coverages),
                input_table: GlyphTable::ByCoverage(rest),
                lookahead_table: GlyphTable::ByCoverage(lookahead_coverages),
            };
            f(&match_context).map(|m| (lookup_records.as_slice(), m))
        }
    }
}

fn read_objects<'a, T: ReadBinary<HostType<'a> = T>>(
    scope: &ReadScope<'a>,
    offsets: ReadArray<'a, U16Be>,
) -> Result<Vec<T>, ParseError> {
    offsets
        .iter()
        .map(|offset| scope.offset(usize::from(offset)).read::<T>())
        .collect()
}

fn read_objects_dep<'a, T: ReadBinaryDep<HostType<'a> = T>>(
    scope: &ReadScope<'a>,
    offsets: ReadArray<'a, U16Be>,
    args: T::Args<'a>,
) -> Result<Vec<T>, ParseError> {
    offsets
        .iter()
        .map(|offset| scope.offset(usize::from(offset)).read_dep::<T>(args))
        .collect()
}

fn read_objects_nullable<'a, T: ReadBinary<HostType<'a> = T>>(
    scope: &ReadScope<'a>,
    offsets: ReadArray<'a, U16Be>,
) -> Result<Vec<Option<T>>, ParseError> {
    offsets
        .iter()
        .map(|offset| match offset {
            0 => Ok(None),
            offset => scope.offset(usize::from(offset)).read::<T>().map(Some),
        })
        .collect()
}

fn read_coverages<'a>(
    scope: &ReadScope<'a>,
    cache: &ParseCache,
    offsets: ReadArray<'a, U16Be>,
) -> Result<Vec<Arc<Coverage>>, ParseError> {
    offsets
        .iter()
        .map(|coverage_offset| cache.coverage(scope.offset(usize::from(coverage_offset))))
        .collect()
}

pub enum Coverage {
    Format1 {
        glyph_array: Vec<u16>,
    },
    Format2 {
        coverage_range_array: Vec<CoverageRangeRecord>,
    },
}

#[derive(Debug, Copy, Clone)]
pub struct CoverageRangeRecord {
    start_glyph: u16,
    end_glyph: u16,
    start_coverage_index: u16,
}

impl ReadFrom for CoverageRangeRecord {
    type ReadType = (U16Be, U16Be, U16Be);
    fn read_from((start_glyph, end_glyph, start_coverage_index): (u16, u16, u16)) -> Self {
        CoverageRangeRecord {
            start_glyph,
            end_glyph,
            start_coverage_index,
        }
    }
}

impl ReadBinary for Coverage {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        match ctxt.read_u16be()? {
            1 => {
                let glyph_count = usize::from(ctxt.read_u16be()?);
                // The glyph indices must be in numerical order for binary searching of the list.
                // https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-format-1
                let glyph_array = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
                Ok(Coverage::Format1 { glyph_array })
            }
            2 => {
                let coverage_range_count = usize::from(ctxt.read_u16be()?);
                let coverage_range_array = ctxt
                    .read_array::<CoverageRangeRecord>(coverage_range_count)?
                    .to_vec();
                for coverage_range_record in &coverage_range_array {
                    ctxt.check(
                        coverage_range_record.start_glyph <= coverage_range_record.end_glyph,
                    )?
                }
                Ok(Coverage::Format2 {
                    coverage_range_array,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl Coverage {
    pub fn glyph_coverage_value(&self, glyph: u16) -> Option<u16> {
        match *self {
            Coverage::Format1 { ref glyph_array } => {
                let index = glyph_array.binary_search(&glyph).ok()?;
                u16::try_from(index).ok()
            }
            Coverage::Format2 {
                ref coverage_range_array,
            } => {
                let index = search::find_range(coverage_range_array.len(), glyph, |index| {
                    let range = &coverage_range_array[index];
                    (range.start_glyph, range.end_glyph)
                })?;
                let range = &coverage_range_array[index];
                range
                    .start_coverage_index
                    .checked_add(glyph - range.start_glyph)
            }
        }
    }

    /// Convenience method to count the total number of glyphs covered
    pub fn glyph_count(&self) -> usize {
        match self {
            Coverage::Format1 { glyph_array } => glyph_array.len(),
            Coverage::Format2 {
                coverage_range_array,
            } => coverage_range_array
                .iter()
                .map(|range| usize::from(range.end_glyph - range.start_glyph) + 1)
                .sum(),
        }
    }
}

pub enum ClassDef {
    Format1 {
        start_glyph: u16,
        class_value_array: Vec<u16>,
    },
    Format2 {
        class_range_array: Vec<ClassRangeRecord>,
    },
}

#[derive(Debug, Copy, Clone)]
pub struct ClassRangeRecord {
    start_glyph: u16,
    end_glyph: u16,
    class_value: u16,
}

impl ReadFrom for ClassRangeRecord {
    type ReadType = (U16Be, U16Be, U16Be);
    fn read_from((start_glyph, end_glyph, class_value): (u16, u16, u16)) -> Self {
        ClassRangeRecord {
            start_glyph,
            end_glyph,
            class_value,
        }
    }
}

impl ReadBinary for ClassDef {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        match ctxt.read_u16be()? {
            1 => {
                let start_glyph = ctxt.read_u16be()?;
                let glyph_count = usize::from(ctxt.read_u16be()?);
                let class_value_array = ctxt.read_array::<U16Be>(glyph_count)?.to_vec();
                Ok(ClassDef::Format1 {
                    start_glyph,
                    class_value_array,
                })
            }
            2 => {
                let class_range_count = usize::from(ctxt.read_u16be()?);
                let class_range_array = ctxt
                    .read_array::<ClassRangeRecord>(class_range_count)
                    // Some fonts (Mangal for one) specify a class_range_count that exceeds the
                    // number of records that fit in the table. Fall back to the records that are
                    // actually present.
                    .or_else(|_| ctxt.read_array_upto_hack::<ClassRangeRecord>(class_range_count))?
                    .to_vec();
                Ok(ClassDef::Format2 { class_range_array })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ClassDef {
    /// The class of `glyph`. Glyphs that are not assigned a class are in class 0.
    pub fn glyph_class_value(&self, glyph: u16) -> u16 {
        match *self {
            ClassDef::Format1 {
                start_glyph,
                ref class_value_array,
            } => glyph
                .checked_sub(start_glyph)
                .and_then(|index| class_value_array.get(usize::from(index)))
                .copied()
                .unwrap_or(0),
            ClassDef::Format2 {
                ref class_range_array,
            } => search::find_range(class_range_array.len(), glyph, |index| {
                let range = &class_range_array[index];
                (range.start_glyph, range.end_glyph)
            })
            .map_or(0, |index| class_range_array[index].class_value),
        }
    }
}
