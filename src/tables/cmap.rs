//! Parsing and lookup of the `cmap` (character to glyph index mapping) table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap>

use std::cmp;
use std::convert::TryFrom;

use itertools::Itertools;
use log::debug;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be, U8};
use crate::error::ParseError;
use crate::sanitize::Sanitized;
use crate::search;
use crate::size;

/// Size of the fixed part of a format 4 subtable, up to the first segment array.
const FORMAT4_HEADER_SIZE: usize = 7 * size::U16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
    pub const CUSTOM: PlatformId = PlatformId(4);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);

    pub const MACINTOSH_APPLE_ROMAN: EncodingId = EncodingId(0);
    pub const MACINTOSH_UNICODE_UCS4: EncodingId = EncodingId(4);
}

/// The character set a cmap subtable is indexed by.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Encoding {
    Unicode,
    Symbol,
    AppleRoman,
}

/// A validated `cmap` table.
///
/// Every subtable referenced by an encoding record is parsed when the table is read, so a
/// structurally invalid subtable makes the whole table fail to read.
pub struct Cmap<'a> {
    pub scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
    subtables: Vec<CmapSubtable<'a>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

pub enum CmapSubtable<'a> {
    Format0 {
        language: u16,
        glyph_id_array: ReadArray<'a, U8>,
    },
    Format4 {
        language: u16,
        end_codes: ReadArray<'a, U16Be>,
        start_codes: ReadArray<'a, U16Be>,
        id_deltas: ReadArray<'a, I16Be>,
        id_range_offsets: ReadArray<'a, U16Be>,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format6 {
        language: u16,
        first_code: u16,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format10 {
        language: u32,
        start_char_code: u32,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format12 {
        language: u32,
        groups: SequentialMapGroups<'a>,
    },
    Format13 {
        language: u32,
        groups: SequentialMapGroups<'a>,
    },
    /// A subtable in a format that is not supported. It never maps anything.
    Unsupported { format: u16 },
}

/// Range groups of a format 12 or 13 subtable.
pub struct SequentialMapGroups<'a> {
    groups: ReadArray<'a, SequentialMapGroup>,
    sorted: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl ReadBinary for Cmap<'_> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Cmap<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;
        let subtables = encoding_records
            .iter()
            .map(|record| {
                let offset = usize::try_from(record.offset)?;
                scope.offset(offset).read::<CmapSubtable<'_>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Cmap {
            scope,
            encoding_records,
            subtables,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);
    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);
    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl ReadBinary for CmapSubtable<'_> {
    type HostType<'a> = CmapSubtable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<CmapSubtable<'a>, ParseError> {
        let subtable = ctxt.scope();
        let subtable_format = ctxt.read_u16be()?;
        match subtable_format {
            0 => {
                let length = usize::from(ctxt.read_u16be()?);
                ctxt.check(length >= 3 * size::U16 + 256)?;
                let language = ctxt.read_u16be()?;
                let glyph_id_array = ctxt.read_array::<U8>(256)?;
                Ok(CmapSubtable::Format0 {
                    language,
                    glyph_id_array,
                })
            }
            4 => read_format4(subtable),
            6 => {
                let _length = ctxt.read_u16be()?;
                let language = ctxt.read_u16be()?;
                let first_code = ctxt.read_u16be()?;
                let entry_count = usize::from(ctxt.read_u16be()?);
                let glyph_id_array = ctxt.read_array::<U16Be>(entry_count)?;
                Ok(CmapSubtable::Format6 {
                    language,
                    first_code,
                    glyph_id_array,
                })
            }
            10 => {
                let _reserved = ctxt.read_u16be()?;
                let _length = ctxt.read_u32be()?;
                let language = ctxt.read_u32be()?;
                let start_char_code = ctxt.read_u32be()?;
                let num_chars = usize::try_from(ctxt.read_u32be()?)?;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_chars)?;
                Ok(CmapSubtable::Format10 {
                    language,
                    start_char_code,
                    glyph_id_array,
                })
            }
            12 | 13 => {
                let _reserved = ctxt.read_u16be()?;
                let _length = ctxt.read_u32be()?;
                let language = ctxt.read_u32be()?;
                let num_groups = usize::try_from(ctxt.read_u32be()?)?;
                let groups = SequentialMapGroups::new(
                    ctxt.read_array::<SequentialMapGroup>(num_groups)?,
                );
                if subtable_format == 12 {
                    Ok(CmapSubtable::Format12 { language, groups })
                } else {
                    Ok(CmapSubtable::Format13 { language, groups })
                }
            }
            format => {
                debug!("unsupported cmap subtable format {}", format);
                Ok(CmapSubtable::Unsupported { format })
            }
        }
    }
}

/// Read a format 4 subtable, confined to the bytes its `length` field claims.
fn read_format4(subtable: ReadScope<'_>) -> Result<CmapSubtable<'_>, ParseError> {
    let mut ctxt = subtable.ctxt();
    let _format = ctxt.read_u16be()?;
    let length = usize::from(ctxt.read_u16be()?);
    // Some fonts overstate the length of the last subtable in the table. Truncate it to the end of
    // the data rather than rejecting the font.
    let length = cmp::min(length, subtable.data().len());
    let mut ctxt = subtable.offset_length(0, length)?.ctxt();
    let _format = ctxt.read_u16be()?;
    let _length = ctxt.read_u16be()?;
    let language = ctxt.read_u16be()?;
    let seg_count_x2 = usize::from(ctxt.read_u16be()?);
    let seg_count = seg_count_x2 / 2;
    // Header, four parallel segment arrays, and the reserved pad.
    let fixed_size = seg_count_x2
        .checked_mul(4)
        .and_then(|arrays| arrays.checked_add(FORMAT4_HEADER_SIZE + size::U16))
        .ok_or(ParseError::LimitExceeded)?;
    ctxt.check(fixed_size <= length)?;
    let _search_range = ctxt.read_u16be()?;
    let _entry_selector = ctxt.read_u16be()?;
    let _range_shift = ctxt.read_u16be()?;
    let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
    let _reserved_pad = ctxt.read_u16be()?;
    let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
    let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
    let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
    let num_indices = (length - fixed_size) / size::U16;
    let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;
    Ok(CmapSubtable::Format4 {
        language,
        end_codes,
        start_codes,
        id_deltas,
        id_range_offsets,
        glyph_id_array,
    })
}

impl<'a> SequentialMapGroups<'a> {
    fn new(groups: ReadArray<'a, SequentialMapGroup>) -> Self {
        let sorted = groups
            .iter()
            .tuple_windows()
            .all(|(prev, next)| prev.end_char_code < next.start_char_code);
        if !sorted {
            debug!("cmap groups are not sorted, falling back to linear search");
        }
        SequentialMapGroups { groups, sorted }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find the group containing `ch`.
    pub fn find(&self, ch: u32) -> Option<SequentialMapGroup> {
        if self.sorted {
            let index = search::find_range(self.groups.len(), ch, |index| {
                self.groups
                    .get_item(index)
                    .map_or((1, 0), |group| (group.start_char_code, group.end_char_code))
            })?;
            self.groups.get_item(index)
        } else {
            self.groups
                .iter()
                .find(|group| group.start_char_code <= ch && ch <= group.end_char_code)
        }
    }
}

impl<'a> Cmap<'a> {
    pub fn encoding_records(&self) -> &ReadArray<'a, EncodingRecord> {
        &self.encoding_records
    }

    /// Find the first encoding record for the given `platform_id`
    pub fn find_subtable_for_platform(&self, platform_id: PlatformId) -> Option<EncodingRecord> {
        self.encoding_records
            .iter()
            .find(|record| record.platform_id == platform_id.0)
    }

    /// Find the encoding record for the given `platform_id` and `encoding_id`.
    ///
    /// Encoding records are sorted by platform then encoding, which allows a binary search.
    pub fn find_encoding_record(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        let index = self.find_record_index(platform_id, encoding_id)?;
        self.encoding_records.get_item(index)
    }

    /// Find the subtable for the given `platform_id` and `encoding_id`.
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<&CmapSubtable<'a>> {
        let index = self.find_record_index(platform_id, encoding_id)?;
        self.subtables.get(index)
    }

    /// The subtable that an encoding record of this table refers to.
    pub fn subtable(&self, record: &EncodingRecord) -> Option<&CmapSubtable<'a>> {
        self.encoding_records
            .iter()
            .position(|candidate| candidate == *record)
            .and_then(|index| self.subtables.get(index))
    }

    fn find_record_index(&self, platform_id: PlatformId, encoding_id: EncodingId) -> Option<usize> {
        self.encoding_records
            .binary_search_by(|record| {
                (record.platform_id, record.encoding_id).cmp(&(platform_id.0, encoding_id.0))
            })
            .ok()
    }

    /// Map `ch` through the best available Unicode subtable.
    pub fn map_char(&self, ch: char) -> Option<u16> {
        let (_encoding, record) = find_good_cmap_subtable(self)?;
        self.subtable(&record)?.map_glyph(u32::from(ch))
    }
}

impl<'a> Sanitized<Cmap<'a>> {
    /// Find a subtable of a validated table. A corrupt table has no subtables.
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<&CmapSubtable<'a>> {
        self.get()?.find_subtable(platform_id, encoding_id)
    }

    /// Map `ch` through a validated table. A corrupt table maps nothing.
    pub fn map_char(&self, ch: char) -> Option<u16> {
        self.get()?.map_char(ch)
    }
}

/// Pick the most suitable subtable for mapping characters, in order of preference.
pub fn find_good_cmap_subtable(cmap: &Cmap<'_>) -> Option<(Encoding, EncodingRecord)> {
    // MS UNICODE, UCS-4 (32 bit)
    if let Some(encoding_record) =
        cmap.find_encoding_record(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4)
    {
        return Some((Encoding::Unicode, encoding_record));
    }

    // MS UNICODE, UCS-2 (16 bit)
    if let Some(encoding_record) =
        cmap.find_encoding_record(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
    {
        return Some((Encoding::Unicode, encoding_record));
    }

    // Apple UNICODE, UCS-4 (32 bit)
    if let Some(encoding_record) =
        cmap.find_encoding_record(PlatformId::UNICODE, EncodingId::MACINTOSH_UNICODE_UCS4)
    {
        return Some((Encoding::Unicode, encoding_record));
    }

    // Any UNICODE table
    if let Some(encoding_record) = cmap.find_subtable_for_platform(PlatformId::UNICODE) {
        return Some((Encoding::Unicode, encoding_record));
    }

    // MS Symbol
    if let Some(encoding_record) =
        cmap.find_encoding_record(PlatformId::WINDOWS, EncodingId::WINDOWS_SYMBOL)
    {
        return Some((Encoding::Symbol, encoding_record));
    }

    // Apple Roman
    cmap.find_encoding_record(PlatformId::MACINTOSH, EncodingId::MACINTOSH_APPLE_ROMAN)
        .map(|encoding_record| (Encoding::AppleRoman, encoding_record))
}

impl<'a> CmapSubtable<'a> {
    pub fn format(&self) -> u16 {
        match self {
            CmapSubtable::Format0 { .. } => 0,
            CmapSubtable::Format4 { .. } => 4,
            CmapSubtable::Format6 { .. } => 6,
            CmapSubtable::Format10 { .. } => 10,
            CmapSubtable::Format12 { .. } => 12,
            CmapSubtable::Format13 { .. } => 13,
            CmapSubtable::Unsupported { format } => *format,
        }
    }

    /// Map a character code to a glyph index.
    ///
    /// Returns `None` when the subtable has no mapping for `ch`, including when the subtable's
    /// format is not supported.
    pub fn map_glyph(&self, ch: u32) -> Option<u16> {
        match *self {
            CmapSubtable::Format0 {
                ref glyph_id_array,
                ..
            } => {
                let index = usize::try_from(ch).ok()?;
                let glyph_id = glyph_id_array.get_item(index)?;
                non_zero(u16::from(glyph_id))
            }
            CmapSubtable::Format4 {
                ref end_codes,
                ref start_codes,
                ref id_deltas,
                ref id_range_offsets,
                ref glyph_id_array,
                ..
            } => {
                let ch = u16::try_from(ch).ok()?;
                let seg_count = end_codes.len();
                let segment = search::find_range(seg_count, ch, |i| {
                    match (start_codes.get_item(i), end_codes.get_item(i)) {
                        (Some(start_code), Some(end_code)) => (start_code, end_code),
                        _ => (1, 0),
                    }
                })?;
                let start_code = start_codes.get_item(segment)?;
                let id_delta = id_deltas.get_item(segment)?;
                let id_range_offset = id_range_offsets.get_item(segment)?;
                if id_range_offset == 0 {
                    // The idDelta arithmetic is modulo 65536.
                    Some(ch.wrapping_add_signed(id_delta))
                } else {
                    // The offset is relative to this segment's idRangeOffset entry, so convert it
                    // into an index into the glyph id array that follows the segment arrays.
                    let index = (usize::from(id_range_offset) / 2)
                        .checked_add(usize::from(ch - start_code))?
                        .checked_add(segment)?
                        .checked_sub(seg_count)?;
                    let glyph_id = non_zero(glyph_id_array.get_item(index)?)?;
                    Some(glyph_id.wrapping_add_signed(id_delta))
                }
            }
            CmapSubtable::Format6 {
                first_code,
                ref glyph_id_array,
                ..
            } => trimmed_lookup(glyph_id_array, u32::from(first_code), ch),
            CmapSubtable::Format10 {
                start_char_code,
                ref glyph_id_array,
                ..
            } => trimmed_lookup(glyph_id_array, start_char_code, ch),
            CmapSubtable::Format12 { ref groups, .. } => {
                let group = groups.find(ch)?;
                let glyph_id = group
                    .start_glyph_id
                    .checked_add(ch - group.start_char_code)?;
                u16::try_from(glyph_id).ok()
            }
            CmapSubtable::Format13 { ref groups, .. } => {
                let group = groups.find(ch)?;
                u16::try_from(group.start_glyph_id).ok()
            }
            CmapSubtable::Unsupported { .. } => None,
        }
    }
}

/// Lookup in a trimmed array (formats 6 and 10) that starts at `first_code`.
fn trimmed_lookup(glyph_id_array: &ReadArray<'_, U16Be>, first_code: u32, ch: u32) -> Option<u16> {
    let index = usize::try_from(ch.checked_sub(first_code)?).ok()?;
    non_zero(glyph_id_array.get_item(index)?)
}

/// Glyph 0 in a glyph id array means there is no mapping.
fn non_zero(glyph_id: u16) -> Option<u16> {
    (glyph_id != 0).then_some(glyph_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::builder::TableBuilder;

    /// Format 4 subtable with the segments:
    ///
    /// * 'A'..='C' by delta to 10..=12
    /// * 0x100..=0x103 through the glyph id array, 0x102 having no glyph
    /// * 0xFFFF sentinel
    fn format4_subtable() -> Vec<u8> {
        let seg_count = 3u16;
        let mut t = TableBuilder::new();
        t.u16(4); // format
        let length = t.placeholder16(); // length
        t.u16(0); // language
        t.u16(seg_count * 2); // segCountX2
        t.u16(4).u16(1).u16(2); // searchRange, entrySelector, rangeShift
        t.u16(0x43).u16(0x103).u16(0xFFFF); // endCode
        t.u16(0); // reservedPad
        t.u16(0x41).u16(0x100).u16(0xFFFF); // startCode
        t.i16(10 - 0x41).i16(5).i16(1); // idDelta
        // idRangeOffset: segment 1 points to glyphIdArray[0], which is 2 entries after its own
        // idRangeOffset entry (the last segment's entry sits between them).
        t.u16(0).u16(4).u16(0);
        t.u16(20).u16(21).u16(0).u16(23); // glyphIdArray
        let len = t.len() as u16;
        t.patch16(length, len);
        t.into_bytes()
    }

    fn read_subtable(data: &[u8]) -> CmapSubtable<'_> {
        ReadScope::new(data).read::<CmapSubtable<'_>>().unwrap()
    }

    #[test]
    fn test_format4_golden_values() {
        let data = format4_subtable();
        let subtable = read_subtable(&data);
        assert_eq!(subtable.format(), 4);
        assert_eq!(subtable.map_glyph(0x41), Some(10));
        assert_eq!(subtable.map_glyph(0x42), Some(11));
        assert_eq!(subtable.map_glyph(0x43), Some(12));
        assert_eq!(subtable.map_glyph(0x100), Some(25));
        assert_eq!(subtable.map_glyph(0x101), Some(26));
        // Zero entry means no glyph, it is not mapped through idDelta
        assert_eq!(subtable.map_glyph(0x102), None);
        assert_eq!(subtable.map_glyph(0x103), Some(28));
        // sentinel segment: 0xFFFF + 1 wraps to 0
        assert_eq!(subtable.map_glyph(0xFFFF), Some(0));
    }

    #[test]
    fn test_format4_outside_segments() {
        let data = format4_subtable();
        let subtable = read_subtable(&data);
        for ch in [0, 0x40, 0x44, 0xFF, 0x104, 0xFFFE, 0x10000, 0x10FFFF] {
            assert_eq!(subtable.map_glyph(ch), None, "ch = {:#x}", ch);
        }
    }

    #[test]
    fn test_format4_range_offset_out_of_bounds() {
        let mut data = format4_subtable();
        // Point segment 1 past the end of the glyph id array
        let id_range_offsets = 14 + 3 * 2 * 3 + 2;
        data[id_range_offsets + 2..id_range_offsets + 4].copy_from_slice(&100u16.to_be_bytes());
        let subtable = read_subtable(&data);
        assert_eq!(subtable.map_glyph(0x100), None);
        assert_eq!(subtable.map_glyph(0x41), Some(10));
    }

    #[test]
    fn test_format4_seg_count_exceeds_length() {
        let mut data = format4_subtable();
        // segCountX2 of 0x1000 needs far more than the declared length
        data[6..8].copy_from_slice(&0x1000u16.to_be_bytes());
        data.extend(std::iter::repeat(0).take(0x4000));
        match ReadScope::new(&data).read::<CmapSubtable<'_>>() {
            Err(ParseError::BadValue) => {}
            Err(err) => panic!("expected ParseError::BadValue got {:?}", err),
            Ok(_) => panic!("expected error got success"),
        }
    }

    #[test]
    fn test_format4_overstated_length_is_truncated() {
        let mut data = format4_subtable();
        data[2..4].copy_from_slice(&0xFFF0u16.to_be_bytes());
        let subtable = read_subtable(&data);
        assert_eq!(subtable.map_glyph(0x42), Some(11));
        assert_eq!(subtable.map_glyph(0x103), Some(28));
    }

    #[test]
    fn test_format6() {
        let mut t = TableBuilder::new();
        t.u16(6).u16(16).u16(0); // format, length, language
        t.u16(0x20).u16(3); // firstCode, entryCount
        t.u16(7).u16(0).u16(9);
        let data = t.into_bytes();
        let subtable = read_subtable(&data);
        assert_eq!(subtable.map_glyph(0x1F), None);
        assert_eq!(subtable.map_glyph(0x20), Some(7));
        assert_eq!(subtable.map_glyph(0x21), None);
        assert_eq!(subtable.map_glyph(0x22), Some(9));
        assert_eq!(subtable.map_glyph(0x23), None);
    }

    #[test]
    fn test_format6_entry_count_past_end() {
        let mut t = TableBuilder::new();
        t.u16(6).u16(16).u16(0).u16(0x20).u16(200);
        t.u16(7);
        let data = t.into_bytes();
        assert!(ReadScope::new(&data).read::<CmapSubtable<'_>>().is_err());
    }

    #[test]
    fn test_format10() {
        let mut t = TableBuilder::new();
        t.u16(10).u16(0).u32(24).u32(0); // format, reserved, length, language
        t.u32(0x1F600).u32(2); // startCharCode, numChars
        t.u16(100).u16(101);
        let data = t.into_bytes();
        let subtable = read_subtable(&data);
        assert_eq!(subtable.map_glyph(0x1F5FF), None);
        assert_eq!(subtable.map_glyph(0x1F600), Some(100));
        assert_eq!(subtable.map_glyph(0x1F601), Some(101));
        assert_eq!(subtable.map_glyph(0x1F602), None);
    }

    #[test]
    fn test_unsupported_format() {
        let data = [0, 14, 0, 0, 0, 10, 0, 0, 0, 0];
        let subtable = read_subtable(&data);
        assert_eq!(subtable.format(), 14);
        assert_eq!(subtable.map_glyph(0x41), None);
    }

    fn cmap_table(records: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
        let mut t = TableBuilder::new();
        t.u16(0).u16(records.len() as u16);
        for (platform_id, encoding_id, subtable) in records {
            t.u16(*platform_id).u16(*encoding_id);
            t.offset32(subtable.clone());
        }
        t.into_bytes()
    }

    #[test]
    fn test_find_subtable() {
        let data = cmap_table(&[
            (0, 3, format4_subtable()),
            (1, 0, vec![0, 14, 0, 0, 0, 10, 0, 0, 0, 0]),
            (3, 1, format4_subtable()),
        ]);
        let cmap = ReadScope::new(&data).read::<Cmap<'_>>().unwrap();
        assert!(cmap
            .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            .is_some());
        assert_eq!(
            cmap.find_subtable(PlatformId::MACINTOSH, EncodingId::MACINTOSH_APPLE_ROMAN)
                .map(CmapSubtable::format),
            Some(14)
        );
        assert!(cmap
            .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4)
            .is_none());
        assert!(cmap
            .find_subtable(PlatformId::CUSTOM, EncodingId(0))
            .is_none());

        let (encoding, record) = find_good_cmap_subtable(&cmap).unwrap();
        assert_eq!(encoding, Encoding::Unicode);
        assert_eq!((record.platform_id, record.encoding_id), (3, 1));
        assert_eq!(cmap.map_char('B'), Some(11));
    }

    #[test]
    fn test_corrupt_subtable_makes_table_unusable() {
        let mut bad = format4_subtable();
        bad.truncate(10);
        let data = cmap_table(&[(3, 1, bad)]);
        let cmap = crate::sanitize::sanitize::<Cmap<'_>>("cmap", &data);
        assert!(!cmap.is_usable());
        assert!(cmap
            .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            .is_none());
        assert_eq!(cmap.map_char('A'), None);
    }
}
