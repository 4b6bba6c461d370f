// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content references — page images are named by the SHA-256 of their bytes.

use sha2::{Digest, Sha256};

use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::ImageRef;

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// The reference an image is stored under.
///
/// Identical photos map to the same reference, so re-uploading a page does
/// not store a second copy.
pub fn content_ref(data: &[u8]) -> ImageRef {
    ImageRef(hex::encode(Sha256::digest(data)))
}

/// Whether a reference has the shape of a content reference.
///
/// References read back from the database are checked with this before they
/// are used as file names.
pub fn is_content_ref(image_ref: &ImageRef) -> bool {
    let name = image_ref.as_str();
    name.len() == DIGEST_HEX_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Check that image bytes still hash to the reference they were stored under.
pub fn check_content(data: &[u8], image_ref: &ImageRef) -> Result<()> {
    let actual = content_ref(data);
    if actual == *image_ref {
        return Ok(());
    }
    Err(LeafcountError::IntegrityMismatch {
        expected: image_ref.to_string(),
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_has_well_known_digest() {
        assert_eq!(
            content_ref(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn same_bytes_same_reference() {
        assert_eq!(content_ref(b"page 12"), content_ref(b"page 12"));
        assert_ne!(content_ref(b"page 12"), content_ref(b"page 13"));
        assert!(is_content_ref(&content_ref(b"page 12")));
    }

    #[test]
    fn rejects_references_that_are_not_digests() {
        assert!(!is_content_ref(&ImageRef(String::new())));
        assert!(!is_content_ref(&ImageRef("ab12".into())));
        assert!(!is_content_ref(&ImageRef("../escape".into())));
        let upper = content_ref(b"x").as_str().to_uppercase();
        assert!(!is_content_ref(&ImageRef(upper)));
    }

    #[test]
    fn altered_bytes_fail_the_check() {
        let stored = content_ref(b"original photo");
        assert!(check_content(b"original photo", &stored).is_ok());

        match check_content(b"edited photo", &stored) {
            Err(LeafcountError::IntegrityMismatch { expected, actual }) => {
                assert_eq!(expected, stored.as_str());
                assert_eq!(actual, content_ref(b"edited photo").as_str());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
