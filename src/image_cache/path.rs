//! Deterministic key → relative file path derivation

use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::errors::{CacheError, CacheResult};

/// Hex digits of the key digest appended to rewritten file names
const KEY_DIGEST_LEN: usize = 8;

// Control characters, NUL included, are replaced as well
const ILLEGAL_CHARS: [char; 8] = ['\\', ':', '*', '?', '"', '<', '>', '|'];

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Collapse identical repeated trailing extensions (`abc.jpg.jpg` → `abc.jpg`)
fn collapse_extensions(name: &str) -> String {
    let mut current = name;
    while let Some((stem, ext)) = current.rsplit_once('.') {
        let Some((_, prev_ext)) = stem.rsplit_once('.') else {
            break;
        };
        if ext.is_empty() || !prev_ext.eq_ignore_ascii_case(ext) {
            break;
        }
        current = stem;
    }
    current.to_string()
}

/// `name` with `-<digest>` inserted before its extension
fn with_key_digest(name: &str, key: &str) -> String {
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    let digest = &digest[..KEY_DIGEST_LEN];
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{digest}.{ext}"),
        _ => format!("{name}-{digest}"),
    }
}

/// Relative path under the cache directory for `key`
///
/// Empty, `.` and `..` segments are dropped, so a key can never escape the
/// cache directory. When that or character replacement rewrites the key, a
/// digest of the raw key is added to the file name so two keys never share
/// a file.
pub fn derive_relative_path(key: &str) -> CacheResult<PathBuf> {
    let mut segments: Vec<String> = key
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(sanitize_segment)
        .collect();

    let rewritten = segments.join("/") != key;
    let Some(last) = segments.last_mut() else {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
        });
    };
    *last = collapse_extensions(last);
    if rewritten {
        *last = with_key_digest(last, key);
    }

    Ok(segments.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(key: &str) -> String {
        derive_relative_path(key)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/")
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(derive("abc.jpg"), "abc.jpg");
        assert_eq!(derive("pets/7/profile.png"), "pets/7/profile.png");
    }

    fn digest(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))[..KEY_DIGEST_LEN].to_string()
    }

    #[test]
    fn test_traversal_segments_dropped() {
        let escaped = derive("../../etc/passwd");
        assert_eq!(escaped, format!("etc/passwd-{}", digest("../../etc/passwd")));
        assert_eq!(derive("/a//./b.jpg"), format!("a/b-{}.jpg", digest("/a//./b.jpg")));
    }

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(derive("a:b*c?.jpg"), format!("a_b_c_-{}.jpg", digest("a:b*c?.jpg")));
        assert_eq!(derive("x\\y|z.png"), format!("x_y_z-{}.png", digest("x\\y|z.png")));
    }

    #[test]
    fn test_rewritten_keys_do_not_collide() {
        let pairs = [
            ("a:b.jpg", "a_b.jpg"),
            ("../x.jpg", "x.jpg"),
            ("pets//7.jpg", "pets/7.jpg"),
            (" cat.jpg", "cat.jpg"),
            ("a:b.jpg", "a|b.jpg"),
        ];
        for (left, right) in pairs {
            assert_ne!(derive(left), derive(right), "{left} vs {right}");
        }
        assert_eq!(derive("a_b.jpg"), "a_b.jpg");
        assert_eq!(derive("a:b.jpg.jpg"), format!("a_b-{}.jpg", digest("a:b.jpg.jpg")));
    }

    #[test]
    fn test_repeated_extensions_collapse() {
        assert_eq!(derive("abc.jpg.jpg"), "abc.jpg");
        assert_eq!(derive("abc.jpg.jpg.jpg"), "abc.jpg");
        assert_eq!(derive("a.JPG.jpg"), "a.JPG");
        assert_eq!(derive("a.backup.png"), "a.backup.png");
    }

    #[test]
    fn test_empty_key_rejected() {
        for key in ["", "/", "./..", " / "] {
            assert!(matches!(
                derive_relative_path(key),
                Err(CacheError::InvalidKey { .. })
            ));
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(
            derive_relative_path("pets/7/abc.jpg").unwrap(),
            derive_relative_path("pets/7/abc.jpg").unwrap()
        );
    }
}
