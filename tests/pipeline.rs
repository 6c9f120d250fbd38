mod common;

use std::sync::Arc;

use cbxs_extract::{
    ExtractError, ExtractOptions, LocalFileReader, MemoryReader, NullReporter, ReadAt,
    RecordSizeMode, ResourceType, StreamExtractor, decompress,
};
use common::{chunk, end, end_record, literals, record, snapshot};

/// Logical file with three records and an end record.
fn world_file() -> Vec<u8> {
    let mut data = record(9, 1001, b"shape bytes");
    data.extend(record(20, 2002, b"audio bank bytes"));
    data.extend(record(3, 3003, b"??"));
    data.extend(end_record());
    data
}

fn extractor<R: ReadAt>(reader: R, options: ExtractOptions) -> StreamExtractor<R> {
    StreamExtractor::new(Arc::new(reader), options, Arc::new(NullReporter))
}

#[tokio::test]
async fn chunk_and_end_marker_form_one_file() {
    let p1 = literals(b"first half, ");
    let p2 = [0x06, 0x01, b'a', b'b', 0xFC];
    let mut archive = chunk(&p1);
    archive.extend(end(&p2));

    // Plain bytes, not an interleaved file.
    let options = ExtractOptions {
        demux: false,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let summary = extractor(MemoryReader::new(archive), options)
        .extract_to_dir(dir.path())
        .await
        .unwrap();
    assert_eq!(summary.files, 1);

    let mut expected = decompress(&p1).unwrap();
    expected.extend(decompress(&p2).unwrap());
    assert_eq!(expected, b"first half, ababab");

    let files = snapshot(dir.path());
    assert_eq!(files["BAM_0.bin"], expected);
    assert!(!files.contains_key("BAM_1.bin"));
}

#[tokio::test]
async fn extracts_raw_files_and_resources() {
    let dir = tempfile::tempdir().unwrap();
    let summary = extractor(MemoryReader::new(simple_archive()), ExtractOptions::default())
        .extract_to_dir(dir.path())
        .await
        .unwrap();

    assert_eq!(summary.files, 1);
    assert_eq!(summary.resources, 3);
    assert_eq!(summary.skipped, 0);

    let files = snapshot(dir.path());
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        [
            "BAM_0.bin",
            "BAM_0_uninterleaved/1001_9.shape",
            "BAM_0_uninterleaved/2002_20.bnk",
            "BAM_0_uninterleaved/3003_3.bin",
        ]
    );
    assert_eq!(files["BAM_0.bin"], world_file());
    assert_eq!(files["BAM_0_uninterleaved/1001_9.shape"], b"shape bytes");
    assert_eq!(files["BAM_0_uninterleaved/2002_20.bnk"], b"audio bank bytes");
    assert_eq!(files["BAM_0_uninterleaved/3003_3.bin"], b"??");
}

/// `world_file()` split over three chunks.
fn simple_archive() -> Vec<u8> {
    let world = world_file();
    let (a, rest) = world.split_at(10);
    let (b, c) = rest.split_at(17);

    let mut out = chunk(&literals(a));
    out.extend(chunk(&literals(b)));
    out.extend(end(&literals(c)));
    out
}

#[tokio::test]
async fn lists_files_in_stream_order() {
    let mut archive = simple_archive();
    let second_offset = archive.len() as u64;
    let mut lightmap = record(10, 42, b"ababab");
    lightmap.truncate(8);
    archive.extend(chunk(&literals(&lightmap)));
    archive.extend(end(&[0x06, 0x01, b'a', b'b', 0xFC]));

    let listing = extractor(MemoryReader::new(archive), ExtractOptions::default())
        .list()
        .await
        .unwrap();

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].chunks, 3);
    assert_eq!(listing[0].size, world_file().len());
    let ids: Vec<u32> = listing[0].resources.iter().map(|r| r.resource_id).collect();
    assert_eq!(ids, [1001, 2002, 3003]);

    let second = &listing[1];
    assert_eq!(second.index, 1);
    assert_eq!(second.offset, second_offset);
    assert_eq!(second.file_name, "BAM_1.bin");
    assert_eq!(second.resources.len(), 1);
    assert_eq!(second.resources[0].resource_type, ResourceType::Lightmap);
    assert_eq!(second.resources[0].size, 6);
    assert_eq!(second.resources[0].file_name, "42_10.shape");
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    for dir in [first.path(), second.path()] {
        extractor(MemoryReader::new(simple_archive()), ExtractOptions::default())
            .extract_to_dir(dir)
            .await
            .unwrap();
    }

    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

/// File 0 decodes, file 1 has a corrupt chunk, file 2 decodes.
fn archive_with_bad_file() -> Vec<u8> {
    let interleaved = |id: u32, payload: &[u8]| {
        let mut data = record(9, id, payload);
        data.extend(end_record());
        literals(&data)
    };

    let mut archive = end(&interleaved(1, b"one"));
    archive.extend(chunk(&[0x00, 0x40, 0xFC]));
    archive.extend(end(&literals(b"unreachable")));
    archive.extend(end(&interleaved(3, b"three")));
    archive
}

#[tokio::test]
async fn fails_fast_but_keeps_earlier_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = extractor(MemoryReader::new(archive_with_bad_file()), ExtractOptions::default())
        .extract_to_dir(dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Codec { file: 1, .. }));

    let files = snapshot(dir.path());
    assert!(files.contains_key("BAM_0.bin"));
    assert!(files.contains_key("BAM_0_uninterleaved/1_9.shape"));
    assert!(!files.keys().any(|k| k.starts_with("BAM_1") || k.starts_with("BAM_2")));
}

#[tokio::test]
async fn keep_going_skips_the_broken_file() {
    let options = ExtractOptions {
        keep_going: true,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let summary = extractor(MemoryReader::new(archive_with_bad_file()), options)
        .extract_to_dir(dir.path())
        .await
        .unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.skipped, 1);

    let files = snapshot(dir.path());
    assert_eq!(files["BAM_0_uninterleaved/1_9.shape"], b"one");
    assert_eq!(files["BAM_2_uninterleaved/3_9.shape"], b"three");
    assert!(!files.contains_key("BAM_1.bin"));
}

#[tokio::test]
async fn whole_record_sizes() {
    // Declared sizes include the 8-byte header.
    let mut data = Vec::new();
    for (tag, id, payload) in [(9u8, 7u32, &b"abc"[..]), (20, 8, &b"defgh"[..])] {
        data.push(tag);
        data.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes()[..3]);
        data.extend_from_slice(&id.to_le_bytes());
        data.extend_from_slice(payload);
    }
    data.extend(end_record());
    let archive = end(&literals(&data));

    let options = ExtractOptions {
        record_size: RecordSizeMode::Record,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    extractor(MemoryReader::new(archive.clone()), options)
        .extract_to_dir(dir.path())
        .await
        .unwrap();

    let files = snapshot(dir.path());
    assert_eq!(files["BAM_0_uninterleaved/7_9.shape"], b"abc");
    assert_eq!(files["BAM_0_uninterleaved/8_20.bnk"], b"defgh");

    // The payload-only reading of the same file runs past the end.
    let err = extractor(MemoryReader::new(archive), ExtractOptions::default())
        .extract_to_dir(tempfile::tempdir().unwrap().path())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::TruncatedRecord { .. }));
}

#[tokio::test]
async fn raw_only_writes_no_resources() {
    let options = ExtractOptions {
        prefix: "WORLD_".to_string(),
        demux: false,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    extractor(MemoryReader::new(simple_archive()), options)
        .extract_to_dir(dir.path())
        .await
        .unwrap();

    let files = snapshot(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(files["WORLD_0.bin"], world_file());
}

#[tokio::test]
async fn reads_archives_from_disk() {
    let src = tempfile::tempdir().unwrap();
    let path = src.path().join("bam.xsb");
    let mut bytes = simple_archive();
    bytes.extend([0u8; 32]);
    std::fs::write(&path, bytes).unwrap();

    let out = tempfile::tempdir().unwrap();
    let summary = extractor(
        LocalFileReader::new(&path).unwrap(),
        ExtractOptions::default(),
    )
    .extract_to_dir(out.path())
    .await
    .unwrap();

    assert_eq!(summary.files, 1);
    assert_eq!(summary.resources, 3);
}

#[tokio::test]
async fn record_errors_name_their_file() {
    let mut broken = record(9, 5, b"fine");
    broken.extend(&record(20, 6, b"0123456789")[..12]);

    let mut archive = end(&literals(&world_file()));
    archive.extend(end(&literals(&broken)));

    let err = extractor(MemoryReader::new(archive.clone()), ExtractOptions::default())
        .extract_to_dir(tempfile::tempdir().unwrap().path())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractError::TruncatedRecord {
            file: 1,
            offset: 12,
            declared: 10,
            available: 4,
        }
    ));
    assert_eq!(err.file(), Some(1));

    let options = ExtractOptions {
        keep_going: true,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let summary = extractor(MemoryReader::new(archive), options)
        .extract_to_dir(dir.path())
        .await
        .unwrap();
    assert_eq!((summary.files, summary.skipped), (2, 1));

    let files = snapshot(dir.path());
    assert_eq!(files["BAM_1.bin"], broken);
    assert_eq!(files["BAM_1_uninterleaved/5_9.shape"], b"fine");
}
