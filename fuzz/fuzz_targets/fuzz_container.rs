#![no_main]

use std::io::Write;

use aesc::{decrypt_file, error::CryptoCoreError, DecryptOptions};
use libfuzzer_sys::fuzz_target;

// Feeds arbitrary bytes in as a candidate container file and runs them
// through `decrypt_file`. The container format (§3/§7 of the header contract)
// must reject anything malformed with one of the named `CryptoCoreError`
// variants -- never panic, and never produce an output file unless the MAC
// genuinely verifies (which, for fuzz-generated input under a fixed
// password, should not happen).
fuzz_target!(|data: &[u8]| {
    let dir = tempfile::tempdir().expect("tempdir");
    let input_path = dir.path().join("candidate.aesc");
    let output_path = dir.path().join("out");

    {
        let mut f = std::fs::File::create(&input_path).expect("create candidate file");
        f.write_all(data).expect("write candidate file");
    }

    match decrypt_file(&input_path, &output_path, b"fuzz-password", &DecryptOptions::default(), None) {
        Ok(path) => {
            // A MAC match on fuzz input is astronomically unlikely, but if it
            // ever happens the promoted file must actually exist.
            assert!(path.exists());
        }
        Err(
            CryptoCoreError::InvalidSignature { .. }
            | CryptoCoreError::InvalidHeader { .. }
            | CryptoCoreError::UnsupportedKeyLength { .. }
            | CryptoCoreError::FileSize { .. }
            | CryptoCoreError::IntegrityFailure { .. },
        ) => {
            assert!(!output_path.exists());
        }
        Err(_) => {}
    }
});
