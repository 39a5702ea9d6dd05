//! End-to-end container scenarios (spec §8 "End-to-end scenarios").

use std::fs;

use aesc::container::KeyLength;
use aesc::{decrypt_file, encrypt_file, CryptoCoreError, DecryptOptions, EncryptOptions};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tempfile::tempdir;

fn rng(seed: u64) -> ChaCha20Rng { ChaCha20Rng::seed_from_u64(seed) }

fn enc_opts(key_length: KeyLength) -> EncryptOptions {
    EncryptOptions { key_length, ..EncryptOptions::default() }
}

fn dec_opts() -> DecryptOptions {
    DecryptOptions::default()
}

#[test]
fn container_size_matches_header_plus_mac_plus_plaintext() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("small.bin");
    fs::write(&input_path, vec![0x11u8; 64]).unwrap();

    let encrypted_path = dir.path().join("small.aesc");
    encrypt_file(&input_path, &encrypted_path, b"TestPass1", &enc_opts(KeyLength::Aes128), &mut rng(1), None).unwrap();

    let metadata = fs::metadata(&encrypted_path).unwrap();
    assert_eq!(metadata.len(), 64 + 56 + 64);

    let recovered = decrypt_file(&encrypted_path, dir.path().join("out.bin"), b"TestPass1", &dec_opts(), None).unwrap();
    assert_eq!(fs::read(recovered).unwrap(), vec![0x11u8; 64]);
}

#[test]
fn repeated_encryptions_use_fresh_salt_and_nonce_but_all_decrypt() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("repeat.bin");
    let data = b"the same plaintext, over and over".to_vec();
    fs::write(&input_path, &data).unwrap();

    let mut ciphertexts = Vec::new();
    for i in 0..3 {
        let encrypted_path = dir.path().join(format!("repeat_{i}.aesc"));
        encrypt_file(&input_path, &encrypted_path, b"samepassword", &enc_opts(KeyLength::Aes256), &mut rng(i), None)
            .unwrap();
        ciphertexts.push(fs::read(&encrypted_path).unwrap());

        let out_path = dir.path().join(format!("recovered_{i}.bin"));
        let recovered = decrypt_file(&encrypted_path, &out_path, b"samepassword", &dec_opts(), None).unwrap();
        assert_eq!(fs::read(recovered).unwrap(), data);
    }

    // Nonce (header[8..16]) and salt (header[24..40]) must differ across runs,
    // and as a consequence so must the ciphertext bytes that follow.
    assert_ne!(ciphertexts[0][8..16], ciphertexts[1][8..16]);
    assert_ne!(ciphertexts[0][24..40], ciphertexts[1][24..40]);
    assert_ne!(ciphertexts[0][120..], ciphertexts[1][120..]);
}

#[test]
fn single_flipped_ciphertext_byte_in_a_large_file_is_caught() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("large.bin");
    // A few chunks' worth at the default 512 KiB streaming chunk size, not
    // a literal 10 MiB, to keep the test suite fast while still crossing
    // multiple chunk boundaries.
    let data: Vec<u8> = (0..(3 * 512 * 1024 + 777)).map(|i| (i % 256) as u8).collect();
    fs::write(&input_path, &data).unwrap();

    let encrypted_path = dir.path().join("large.aesc");
    encrypt_file(&input_path, &encrypted_path, b"flip-test-pw", &enc_opts(KeyLength::Aes256), &mut rng(7), None)
        .unwrap();

    let mut bytes = fs::read(&encrypted_path).unwrap();
    let ciphertext_start = 56 + 64;
    let flip_at = ciphertext_start + bytes.len() / 2;
    bytes[flip_at] ^= 0x01;
    fs::write(&encrypted_path, &bytes).unwrap();

    let out_path = dir.path().join("out.bin");
    let err = decrypt_file(&encrypted_path, &out_path, b"flip-test-pw", &dec_opts(), None).unwrap_err();
    assert!(matches!(err, CryptoCoreError::IntegrityFailure { .. }));
    assert!(!out_path.exists());
}

#[test]
fn extension_from_input_file_is_restored_on_decrypt() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("report.hwp");
    fs::write(&input_path, b"quarterly figures").unwrap();

    let encrypted_path = dir.path().join("report.aesc");
    encrypt_file(&input_path, &encrypted_path, b"pw", &enc_opts(KeyLength::Aes128), &mut rng(2), None).unwrap();

    let recovered_path =
        decrypt_file(&encrypted_path, dir.path().join("recovered"), b"pw", &dec_opts(), None).unwrap();
    assert_eq!(recovered_path, dir.path().join("recovered.hwp"));
}

#[test]
fn altered_signature_is_rejected_before_any_key_derivation() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("x.bin");
    fs::write(&input_path, b"irrelevant").unwrap();
    let encrypted_path = dir.path().join("x.aesc");
    encrypt_file(&input_path, &encrypted_path, b"pw", &enc_opts(KeyLength::Aes128), &mut rng(3), None).unwrap();

    let mut bytes = fs::read(&encrypted_path).unwrap();
    bytes[3] = b'X'; // "AESC" -> "AESX"
    fs::write(&encrypted_path, &bytes).unwrap();

    let err = decrypt_file(&encrypted_path, dir.path().join("out.bin"), b"pw", &dec_opts(), None).unwrap_err();
    assert!(matches!(err, CryptoCoreError::InvalidSignature { .. }));
}

#[test]
fn one_bit_password_difference_fails_and_leaves_no_scratch_file() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("secret.txt");
    fs::write(&input_path, b"top secret payload").unwrap();

    let encrypted_path = dir.path().join("secret.aesc");
    encrypt_file(&input_path, &encrypted_path, b"correct-password", &enc_opts(KeyLength::Aes256), &mut rng(4), None)
        .unwrap();

    // Flip the low bit of the last character -- a one-bit difference.
    let mut wrong = b"correct-password".to_vec();
    let last = wrong.len() - 1;
    wrong[last] ^= 0x01;

    let out_path = dir.path().join("out.txt");
    let err = decrypt_file(&encrypted_path, &out_path, &wrong, &dec_opts(), None).unwrap_err();
    assert!(matches!(err, CryptoCoreError::IntegrityFailure { .. }));
    assert!(!out_path.exists());

    let leftover: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(leftover.iter().all(|name| name == "secret.txt" || name == "secret.aesc"));
}

#[test]
fn empty_file_round_trips() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("empty.bin");
    fs::write(&input_path, []).unwrap();

    let encrypted_path = dir.path().join("empty.aesc");
    encrypt_file(&input_path, &encrypted_path, b"pw", &enc_opts(KeyLength::Aes192), &mut rng(5), None).unwrap();
    assert_eq!(fs::metadata(&encrypted_path).unwrap().len(), 56 + 64);

    let recovered = decrypt_file(&encrypted_path, dir.path().join("out.bin"), b"pw", &dec_opts(), None).unwrap();
    assert_eq!(fs::read(recovered).unwrap(), Vec::<u8>::new());
}

#[test]
fn progress_callback_reports_monotonic_totals() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("progress.bin");
    let data = vec![0x42u8; 2 * 1024 * 1024 + 99];
    fs::write(&input_path, &data).unwrap();
    let encrypted_path = dir.path().join("progress.aesc");

    let mut seen = Vec::new();
    {
        let mut cb = |done: u64, total: u64| seen.push((done, total));
        encrypt_file(
            &input_path,
            &encrypted_path,
            b"pw",
            &enc_opts(KeyLength::Aes256),
            &mut rng(6),
            Some(&mut cb),
        )
        .unwrap();
    }

    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(seen.last().unwrap().0, data.len() as u64);
    assert!(seen.iter().all(|&(_, total)| total == data.len() as u64));
}

#[test]
fn decrypt_progress_callback_also_reports_monotonic_totals() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("progress2.bin");
    let data = vec![0x24u8; 1_500_000];
    fs::write(&input_path, &data).unwrap();
    let encrypted_path = dir.path().join("progress2.aesc");
    encrypt_file(&input_path, &encrypted_path, b"pw", &enc_opts(KeyLength::Aes128), &mut rng(8), None).unwrap();

    let out_path = dir.path().join("progress2.out");
    let mut seen = Vec::new();
    {
        let mut cb = |done: u64, total: u64| seen.push((done, total));
        decrypt_file(&encrypted_path, &out_path, b"pw", &dec_opts(), Some(&mut cb)).unwrap();
    }

    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(seen.last().unwrap().0, data.len() as u64);
}
