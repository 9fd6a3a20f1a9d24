use gloc::{
    binio, container, merge_tsv, parse_map, parse_tsv, render_report, write_map, write_tsv,
    MapRow, StructuralMap, Tsv, TsvRecord,
};
use gloc::container::InnerBlock;
use proptest::prelude::*;

// Scenario 1: minimal container, one raw block.
#[test]
fn minimal_container_roundtrips() {
    let blocks = vec![InnerBlock::new(vec![0xDE, 0xAD, 0xBE, 0xEF])];
    let packed = container::pack(&blocks, None).unwrap();
    let unpacked = container::unpack(&packed, None).unwrap();
    assert_eq!(unpacked, blocks);
}

// Scenario 2: three raw blocks of sizes 10, 20, 30.
#[test]
fn multi_block_container_preserves_sizes_and_order() {
    let blocks = vec![
        InnerBlock::new(vec![1u8; 10]),
        InnerBlock::new(vec![2u8; 20]),
        InnerBlock::new(vec![3u8; 30]),
    ];
    let packed = container::pack(&blocks, None).unwrap();
    let unpacked = container::unpack(&packed, None).unwrap();
    let sizes: Vec<usize> = unpacked.iter().map(|b| b.data.len()).collect();
    assert_eq!(sizes, vec![10, 20, 30]);
}

// Block ordering: a container with >= 11 blocks must not sort lexically.
#[test]
fn eleven_block_container_preserves_numeric_order() {
    let blocks: Vec<InnerBlock> = (0..11).map(|i| InnerBlock::new(vec![i as u8; 3])).collect();
    let dir = tempfile::tempdir().unwrap();
    for (i, b) in blocks.iter().enumerate() {
        std::fs::write(dir.path().join(format!("strings_{i}.dat")), &b.data).unwrap();
    }
    let packed = container::pack_from_dir(dir.path(), None).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let count = container::unpack_to_dir(&packed, out_dir.path(), "strings", None).unwrap();
    assert_eq!(count, 11);
    for i in 0..11 {
        let got = std::fs::read(out_dir.path().join(format!("strings_{i}.dat"))).unwrap();
        assert_eq!(got, vec![i as u8; 3]);
    }
}

fn text_block_fixture() -> gloc::TextBlock {
    gloc::TextBlock {
        all_blocks: 2,
        work_blocks: 2,
        records: vec![
            gloc::TextRecord {
                id: [0x01; 8],
                text: "Line1\nLine2".to_string(),
                code: 0x11,
            },
            gloc::TextRecord {
                id: [0x02; 8],
                text: "".to_string(),
                code: 0x22,
            },
        ],
    }
}

// Scenario 4: newline preservation through the disk byte layer.
#[test]
fn text_block_roundtrip_preserves_real_newlines() {
    use gloc::textblock;

    let block = text_block_fixture();
    let bytes = textblock::serialize(&block).unwrap();
    assert!(bytes.windows(1).any(|w| w == [0x0A])); // real LF on disk
    let reparsed = textblock::parse(&bytes).unwrap();
    assert_eq!(reparsed, block);
}

// End-to-end identity: extract then re-pack without editing the TSV.
#[test]
fn end_to_end_identity_under_empty_translation() {
    use gloc::textblock;

    let text_block = text_block_fixture();
    let text_bytes = textblock::serialize(&text_block).unwrap();
    let opaque_block = vec![0xAB, 0xCD, 0xEF];

    let blocks = vec![InnerBlock::new(text_bytes.clone()), InnerBlock::new(opaque_block.clone())];
    let container_bytes = container::pack(&blocks, None).unwrap();

    let dat_dir = tempfile::tempdir().unwrap();
    let count = container::unpack_to_dir(&container_bytes, dat_dir.path(), "strings", None).unwrap();
    assert_eq!(count, 2);

    // Build TSV + map exactly as the extract pipeline would, then pack straight
    // back without editing any text.
    let mut tsv_records = Vec::new();
    let mut map_rows = Vec::new();
    for (block_index, rec) in text_block.records.iter().enumerate() {
        let id_hex = binio::id_to_hex(&rec.id);
        tsv_records.push(TsvRecord {
            id: id_hex.clone(),
            text: rec.text.clone(),
        });
        map_rows.push(MapRow {
            file: "strings_0.dat".to_string(),
            all_blocks: text_block.all_blocks,
            work_blocks: text_block.work_blocks,
            block: block_index as u32,
            unknown: rec.code,
            id: id_hex,
        });
    }
    let tsv = Tsv {
        records: tsv_records,
        trailing_newline: true,
        crlf: false,
    };
    let map = StructuralMap { rows: map_rows };

    // Rebuild the text block dat file from (unedited) TSV + map.
    let text_by_id: std::collections::HashMap<&str, &str> =
        tsv.records.iter().map(|r| (r.id.as_str(), r.text.as_str())).collect();
    let rows = map.rows_for_file_sorted("strings_0.dat");
    let rebuilt_records: Vec<gloc::TextRecord> = rows
        .iter()
        .map(|row| gloc::TextRecord {
            id: binio::id_from_hex(&row.id).unwrap(),
            text: text_by_id.get(row.id.as_str()).copied().unwrap_or("").to_string(),
            code: row.unknown,
        })
        .collect();
    let rebuilt = gloc::TextBlock {
        all_blocks: rows.first().map(|r| r.all_blocks).unwrap_or(0),
        work_blocks: rows.first().map(|r| r.work_blocks).unwrap_or(0),
        records: rebuilt_records,
    };
    let rebuilt_bytes = textblock::serialize(&rebuilt).unwrap();
    std::fs::write(dat_dir.path().join("strings_0.dat"), &rebuilt_bytes).unwrap();

    let repacked = container::pack_from_dir(dat_dir.path(), None).unwrap();
    let reunpacked = container::unpack(&repacked, None).unwrap();

    assert_eq!(reunpacked[0].data, text_bytes);
    assert_eq!(reunpacked[1].data, opaque_block);
}

// Descriptor anchoring: corrupting one record must not affect its neighbors.
#[test]
fn descriptor_corruption_isolates_failure_to_one_record() {
    use gloc::textblock::{self, text_layout, TextRecord};

    let block = gloc::TextBlock {
        all_blocks: 3,
        work_blocks: 3,
        records: vec![
            TextRecord {
                id: [1; 8],
                text: "first".into(),
                code: 1,
            },
            TextRecord {
                id: [2; 8],
                text: "second".into(),
                code: 2,
            },
            TextRecord {
                id: [3; 8],
                text: "third".into(),
                code: 3,
            },
        ],
    };
    let mut bytes = textblock::serialize(&block).unwrap();
    let (descriptor_table_start, _) = text_layout(3);
    let corrupt_len_offset = descriptor_table_start + 16 * 1 + 12; // record index 1's length field
    bytes[corrupt_len_offset..corrupt_len_offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());

    match textblock::parse(&bytes) {
        Err(gloc::Error::DescriptorOutOfRange { record_index: 1 }) => {}
        other => panic!("expected failure isolated to record 1, got {other:?}"),
    }
}

// Illegal characters are rejected before any bytes are written.
#[test]
fn illegal_tab_is_rejected_before_serialization() {
    use gloc::textblock::{self, TextRecord};

    let block = gloc::TextBlock {
        all_blocks: 1,
        work_blocks: 1,
        records: vec![TextRecord {
            id: [9; 8],
            text: "bad\ttext".into(),
            code: 0,
        }],
    };
    match textblock::serialize(&block) {
        Err(gloc::Error::IllegalCharacter { .. }) => {}
        other => panic!("expected IllegalCharacter, got {other:?}"),
    }
}

// Padding rule from spec: all_blocks=3, codes AA BB CC.
#[test]
fn padding_rule_exact_bytes() {
    use gloc::textblock::{self, TextRecord};

    let block = gloc::TextBlock {
        all_blocks: 3,
        work_blocks: 3,
        records: vec![
            TextRecord {
                id: [0; 8],
                text: "".into(),
                code: 0xAA,
            },
            TextRecord {
                id: [0; 8],
                text: "".into(),
                code: 0xBB,
            },
            TextRecord {
                id: [0; 8],
                text: "".into(),
                code: 0xCC,
            },
        ],
    };
    let bytes = textblock::serialize(&block).unwrap();
    let padding = &bytes[24 + 3..24 + 3 + 17];
    let expected = [
        0xFF, 0xAA, 0xBB, 0xCC, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80,
        0x80, 0x80,
    ];
    assert_eq!(padding, expected);
}

// Scenario 5 & 6, plus the general merge invariants.
#[test]
fn merge_preserve_and_new_strings() {
    let old = Tsv {
        records: vec![
            TsvRecord { id: "a".into(), text: "alpha".into() },
            TsvRecord { id: "b".into(), text: "beta".into() },
        ],
        trailing_newline: true,
        crlf: false,
    };
    let new = Tsv {
        records: vec![
            TsvRecord { id: "b".into(), text: "x".into() },
            TsvRecord { id: "c".into(), text: "y".into() },
        ],
        trailing_newline: true,
        crlf: false,
    };
    let outcome = merge_tsv(&old, &new);
    assert_eq!(
        outcome.merged,
        vec![
            TsvRecord { id: "b".into(), text: "beta".into() },
            TsvRecord { id: "c".into(), text: "y".into() },
        ]
    );
    assert_eq!(outcome.stats.preserved, 1);
    assert_eq!(outcome.stats.new_strings, 1);
    assert_eq!(outcome.stats.removed, 1);

    let report = render_report(&outcome, &new, &old);
    assert!(report.contains("preserved=1"));
}

#[test]
fn merge_empty_old_translation_is_not_preserved() {
    let old = Tsv {
        records: vec![TsvRecord { id: "b".into(), text: "".into() }],
        trailing_newline: true,
        crlf: false,
    };
    let new = Tsv {
        records: vec![TsvRecord { id: "b".into(), text: "orig".into() }],
        trailing_newline: true,
        crlf: false,
    };
    let outcome = merge_tsv(&old, &new);
    assert_eq!(outcome.merged[0].text, "orig");
    assert_eq!(outcome.stats.preserved, 0);
    assert_eq!(outcome.stats.new_strings, 1);
}

#[test]
fn tsv_and_map_sidecar_roundtrip_through_text() {
    let tsv_text = "ID\tOriginalText\n0123456789abcdef\tHello\\nWorld\n";
    let tsv = parse_tsv(tsv_text).unwrap();
    assert_eq!(write_tsv(&tsv), tsv_text);

    let map_text = "File\tAllBlocks\tWorkBlocks\tBlock\tUnknown\tID\nstrings_0.dat\t1\t1\t0\t7\t0123456789abcdef\n";
    let map = parse_map(map_text).unwrap();
    assert_eq!(write_map(&map), map_text);
}

proptest! {
    #[test]
    fn container_roundtrip_arbitrary_blocks(blocks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..200), 1..8)) {
        let inner: Vec<InnerBlock> = blocks.into_iter().map(InnerBlock::new).collect();
        let packed = container::pack(&inner, None).unwrap();
        let unpacked = container::unpack(&packed, None).unwrap();
        prop_assert_eq!(unpacked, inner);
    }

    #[test]
    fn text_block_roundtrip_arbitrary_ascii_records(
        texts in proptest::collection::vec("[a-zA-Z0-9 ]{0,40}", 0..10)
    ) {
        use gloc::textblock::{self, TextRecord};

        let records: Vec<TextRecord> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| TextRecord {
                id: [(i as u8).wrapping_add(1); 8],
                text,
                code: i as u8,
            })
            .collect();
        let n = records.len() as u32;
        let block = gloc::TextBlock {
            all_blocks: n,
            work_blocks: n,
            records,
        };
        let bytes = textblock::serialize(&block).unwrap();
        let reparsed = textblock::parse(&bytes).unwrap();
        prop_assert_eq!(reparsed, block);
    }
}
