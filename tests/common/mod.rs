#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

/// Encode `data` as a literal-only RefPack stream.
pub fn literals(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = data;
    while rest.len() >= 4 {
        let n = (rest.len() - rest.len() % 4).min(112);
        out.push(0xE0 | ((n - 4) >> 2) as u8);
        out.extend_from_slice(&rest[..n]);
        rest = &rest[n..];
    }
    out.push(0xFC | rest.len() as u8);
    out.extend_from_slice(rest);
    out
}

pub fn chunk(payload: &[u8]) -> Vec<u8> {
    frame(b"CBXS", payload)
}

pub fn end(payload: &[u8]) -> Vec<u8> {
    frame(b"CEND", payload)
}

fn frame(magic: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = magic.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Interleaved record with a payload-only size.
pub fn record(tag: u8, id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn end_record() -> Vec<u8> {
    record(22, 0, b"")
}

/// Every file under `dir`, keyed by its relative path.
pub fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                let key = rel.to_string_lossy().replace('\\', "/");
                out.insert(key, std::fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}
