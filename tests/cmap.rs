#[allow(dead_code)]
mod common;

use glyphsub::sanitize::sanitize;
use glyphsub::tables::cmap::{
    find_good_cmap_subtable, Cmap, CmapSubtable, Encoding, EncodingId, PlatformId,
};

use crate::common::TableBuilder;

fn cmap_table(records: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(0).u16(records.len() as u16);
    for (platform_id, encoding_id, subtable) in records {
        t.u16(*platform_id).u16(*encoding_id);
        t.offset32(subtable.clone());
    }
    t.into_bytes()
}

fn format0_subtable() -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(0).u16(262).u16(0);
    for ch in 0..=255u8 {
        t.u8(if ch == b'A' { 36 } else { 0 });
    }
    t.into_bytes()
}

fn format12_subtable(groups: &[(u32, u32, u32)]) -> Vec<u8> {
    range_groups_subtable(12, groups)
}

fn range_groups_subtable(format: u16, groups: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut t = TableBuilder::new();
    t.u16(format).u16(0);
    t.u32(16 + 12 * groups.len() as u32).u32(0);
    t.u32(groups.len() as u32);
    for &(start, end, start_glyph) in groups {
        t.u32(start).u32(end).u32(start_glyph);
    }
    t.into_bytes()
}

fn format4_subtable() -> Vec<u8> {
    // Single segment 'a'..='z' mapped by delta to 1..=26, then the 0xFFFF sentinel.
    let mut t = TableBuilder::new();
    t.u16(4);
    let length = t.placeholder16();
    t.u16(0).u16(4).u16(4).u16(1).u16(0);
    t.u16(0x7A).u16(0xFFFF);
    t.u16(0);
    t.u16(0x61).u16(0xFFFF);
    t.i16(1 - 0x61).i16(1);
    t.u16(0).u16(0);
    let len = t.len() as u16;
    t.patch16(length, len);
    t.into_bytes()
}

#[test]
fn prefers_full_unicode_subtable() {
    let data = cmap_table(&[
        (1, 0, format0_subtable()),
        (3, 1, format4_subtable()),
        (3, 10, format12_subtable(&[(0x61, 0x7A, 101), (0x1F600, 0x1F602, 500)])),
    ]);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    assert!(cmap.is_usable());

    let (encoding, record) = find_good_cmap_subtable(cmap.get().unwrap()).unwrap();
    assert_eq!(encoding, Encoding::Unicode);
    assert_eq!((record.platform_id, record.encoding_id), (3, 10));

    assert_eq!(cmap.map_char('a'), Some(101));
    assert_eq!(cmap.map_char('\u{1F601}'), Some(501));
    assert_eq!(cmap.map_char('\u{1F603}'), None);

    let bmp = cmap
        .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
        .unwrap();
    assert_eq!(bmp.format(), 4);
    assert_eq!(bmp.map_glyph(u32::from('a')), Some(1));
    assert_eq!(bmp.map_glyph(u32::from('z')), Some(26));
    assert_eq!(bmp.map_glyph(u32::from('A')), None);
    // Characters outside the BMP can't be in a format 4 subtable.
    assert_eq!(bmp.map_glyph(0x10061), None);

    let roman = cmap
        .find_subtable(PlatformId::MACINTOSH, EncodingId::MACINTOSH_APPLE_ROMAN)
        .unwrap();
    assert_eq!(roman.map_glyph(u32::from('A')), Some(36));
    assert_eq!(roman.map_glyph(u32::from('B')), None);
    assert_eq!(roman.map_glyph(0x100), None);
}

#[test]
fn falls_back_to_apple_roman() {
    let data = cmap_table(&[(1, 0, format0_subtable())]);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    let (encoding, _record) = find_good_cmap_subtable(cmap.get().unwrap()).unwrap();
    assert_eq!(encoding, Encoding::AppleRoman);
    assert_eq!(cmap.map_char('A'), Some(36));
}

#[test]
fn unsorted_groups_are_searched() {
    let data = cmap_table(&[(
        3,
        10,
        format12_subtable(&[(0x100, 0x1FF, 300), (0x10, 0x1F, 20)]),
    )]);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    assert_eq!(cmap.map_char('\u{15}'), Some(25));
    assert_eq!(cmap.map_char('\u{101}'), Some(301));
    assert_eq!(cmap.map_char('\u{50}'), None);
}

#[test]
fn glyph_id_overflow_is_unmapped() {
    let data = cmap_table(&[(3, 10, format12_subtable(&[(0x20, 0x30, 0xFFFF)]))]);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    assert_eq!(cmap.map_char('\u{20}'), Some(0xFFFF));
    assert_eq!(cmap.map_char('\u{21}'), None);
}

#[test]
fn corrupt_table_maps_nothing() {
    let mut data = cmap_table(&[
        (3, 1, format4_subtable()),
        (3, 10, format12_subtable(&[(0x61, 0x7A, 101)])),
    ]);
    // Cut off the last group of the format 12 subtable.
    data.truncate(data.len() - 4);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    assert!(!cmap.is_usable());
    assert_eq!(cmap.map_char('a'), None);
    assert!(cmap
        .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
        .is_none());
}

#[test]
fn unsupported_subtable_is_not_an_error() {
    let data = cmap_table(&[(0, 5, vec![0, 14, 0, 0, 0, 10, 0, 0, 0, 0])]);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    assert!(cmap.is_usable());
    let subtable: &CmapSubtable<'_> = cmap
        .find_subtable(PlatformId::UNICODE, EncodingId(5))
        .unwrap();
    assert_eq!(subtable.format(), 14);
    assert_eq!(cmap.map_char('a'), None);
}

#[test]
fn range_group_boundaries() {
    let groups = [(0x100, 0x1FF, 7), (0x300, 0x300, 9)];
    let data = cmap_table(&[
        (0, 6, range_groups_subtable(13, &groups)),
        (3, 10, range_groups_subtable(12, &groups)),
    ]);
    let cmap = sanitize::<Cmap<'_>>("cmap", &data);
    assert!(cmap.is_usable());
    let chars = [0xFF, 0x100, 0x101, 0x1FE, 0x1FF, 0x200, 0x300, 0x301];

    let linear = cmap
        .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4)
        .unwrap();
    assert_eq!(linear.format(), 12);
    let glyphs: Vec<_> = chars.iter().map(|&ch| linear.map_glyph(ch)).collect();
    assert_eq!(
        glyphs,
        vec![None, Some(7), Some(8), Some(261), Some(262), None, Some(9), None]
    );

    let constant = cmap
        .find_subtable(PlatformId::UNICODE, EncodingId(6))
        .unwrap();
    assert_eq!(constant.format(), 13);
    let glyphs: Vec<_> = chars.iter().map(|&ch| constant.map_glyph(ch)).collect();
    assert_eq!(
        glyphs,
        vec![None, Some(7), Some(7), Some(7), Some(7), None, Some(9), None]
    );
}
