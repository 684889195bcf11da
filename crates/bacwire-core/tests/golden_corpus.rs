use bacwire_core::{DecodeOptions, Npdu};
use std::fs;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("workspace root should be resolvable")
}

fn parse_hex_fixture(path: &Path) -> Vec<u8> {
    let content = fs::read_to_string(path).expect("fixture must be readable");
    let mut out = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for token in trimmed.split_whitespace() {
            let byte = u8::from_str_radix(token, 16)
                .unwrap_or_else(|_| panic!("invalid hex token '{token}' in {}", path.display()));
            out.push(byte);
        }
    }
    out
}

fn fixtures() -> Vec<PathBuf> {
    let fixture_dir = workspace_root().join("fixtures/golden");
    let mut fixture_files = fs::read_dir(&fixture_dir)
        .expect("fixtures directory should exist")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "hex"))
        .collect::<Vec<_>>();
    fixture_files.sort();
    assert!(
        !fixture_files.is_empty(),
        "expected at least one corpus fixture in {}",
        fixture_dir.display()
    );
    fixture_files
}

#[test]
fn golden_corpus_fixtures_decode_cleanly_and_reencode_byte_for_byte() {
    for fixture in fixtures() {
        let bytes = parse_hex_fixture(&fixture);
        let decoded = Npdu::decode_with_diagnostics(&bytes, DecodeOptions::strict())
            .unwrap_or_else(|e| panic!("fixture {} failed NPDU decode: {e}", fixture.display()));
        assert!(
            decoded.is_clean(),
            "fixture {} produced diagnostics {:?}",
            fixture.display(),
            decoded.diagnostics
        );

        let npdu = decoded.value;
        assert_eq!(
            npdu.bit_length(),
            8 * bytes.len() as u64,
            "fixture {} length accounting",
            fixture.display()
        );
        let reencoded = npdu
            .to_bytes()
            .unwrap_or_else(|e| panic!("fixture {} failed to re-encode: {e}", fixture.display()));
        assert_eq!(reencoded, bytes, "fixture {} round trip", fixture.display());
    }
}

#[test]
fn golden_corpus_truncations_never_panic() {
    for fixture in fixtures() {
        let bytes = parse_hex_fixture(&fixture);
        for cut in 0..bytes.len() {
            let result = Npdu::from_bytes(&bytes[..cut]);
            if cut < 2 {
                assert!(result.unwrap_err().is_underflow());
            }
        }
    }
}
