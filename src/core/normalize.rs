//! Archive path normalization.
//!
//! Archive paths are untrusted. [`normalize`] maps any raw path to a
//! [`MountPath`] that is safe to materialize inside the sandbox:
//!
//! - split on `/`, dropping empty and `.` segments
//! - characters outside `[A-Za-z0-9._-]` become `_`
//! - a leading run of dots, or any run of two or more dots, becomes `_`
//! - a trailing single dot becomes `_`
//! - the result is lower-cased
//!
//! Distinct raw paths may normalize to the same mount path; callers accept
//! the collision (last writer wins in the mount tree).

use unicode_normalization::UnicodeNormalization;

use crate::models::MountPath;

/// Placeholder used when a raw path has no usable segment at all.
const EMPTY_PATH: &str = "_";

/// Normalize a raw archive path. Total: always returns a valid path.
pub fn normalize(raw: &str) -> MountPath {
    // Compose first so NFD names (macOS archives) map like their NFC twins.
    let composed: String = raw.nfc().collect();

    let segments: Vec<String> = composed
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(clean_segment)
        .collect();

    if segments.is_empty() {
        return MountPath::from_normalized(EMPTY_PATH.to_string());
    }
    MountPath::from_normalized(segments.join("/"))
}

/// Check whether a raw path names the archive root itself (`./`, `/`, ``).
pub fn is_root_like(raw: &str) -> bool {
    raw.split('/').all(|s| s.is_empty() || s == ".")
}

fn clean_segment(segment: &str) -> String {
    let replaced: Vec<u8> = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c as u8
            } else {
                b'_'
            }
        })
        .collect();

    let mut out = String::with_capacity(replaced.len());
    let mut i = 0;
    while i < replaced.len() {
        if replaced[i] == b'.' {
            let start = i;
            while i < replaced.len() && replaced[i] == b'.' {
                i += 1;
            }
            if start == 0 || i - start >= 2 {
                out.push('_');
            } else {
                out.push('.');
            }
        } else {
            out.push(replaced[i] as char);
            i += 1;
        }
    }

    if out.ends_with('.') {
        out.pop();
        out.push('_');
    }

    out.make_ascii_lowercase();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize(raw).to_string()
    }

    #[test]
    fn test_plain_paths_preserved() {
        assert_eq!(norm("src/index.js"), "src/index.js");
        assert_eq!(norm("package.json"), "package.json");
        assert_eq!(norm("a-b_c/d.e.f"), "a-b_c/d.e.f");
    }

    #[test]
    fn test_directory_structure_kept() {
        // Segments are joined with '/', never flattened with '_'.
        assert_eq!(norm("deep/nested/dir/file.txt"), "deep/nested/dir/file.txt");
        assert_eq!(normalize("deep/nested/dir/file.txt").depth(), 4);
    }

    #[test]
    fn test_lowercase() {
        assert_eq!(norm("Src/README.md"), "src/readme.md");
    }

    #[test]
    fn test_unsafe_characters_replaced() {
        assert_eq!(norm("my project/a b.js"), "my_project/a_b.js");
        assert_eq!(norm("a\\b:c*?.txt"), "a_b_c__.txt");
        assert_eq!(norm("naïve.txt"), "na_ve.txt");
    }

    #[test]
    fn test_nfc_and_nfd_agree() {
        assert_eq!(norm("caf\u{e9}.txt"), norm("cafe\u{301}.txt"));
    }

    #[test]
    fn test_dot_runs() {
        assert_eq!(norm(".env"), "_env");
        assert_eq!(norm("...hidden"), "_hidden");
        assert_eq!(norm("a..b"), "a_b");
        assert_eq!(norm("a...b.c"), "a_b.c");
        assert_eq!(norm("name."), "name_");
        assert_eq!(norm("name.."), "name_");
    }

    #[test]
    fn test_traversal_neutralized() {
        assert_eq!(norm("../../etc/passwd"), "_/_/etc/passwd");
        assert_eq!(norm("a/../b"), "a/_/b");
        assert_eq!(norm("./src/./a.js"), "src/a.js");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(norm(""), "_");
        assert_eq!(norm("///"), "_");
        assert_eq!(norm("//a//b/"), "a/b");
    }

    #[test]
    fn test_root_like() {
        assert!(is_root_like("./"));
        assert!(is_root_like("/"));
        assert!(is_root_like(""));
        assert!(!is_root_like("./src"));
    }

    #[test]
    fn test_never_yields_dot_or_empty_segments() {
        let samples = [
            "..", "../", "/..", "a/..", "....", ". .", "..\\..", "a/./../b/.",
            ".../...", "x/.y/..z/z..", "\u{0}/\u{7f}", "~/.ssh/id_rsa", " ", "..a..",
        ];
        for raw in samples {
            let path = normalize(raw);
            for segment in path.segments() {
                assert!(!segment.is_empty(), "empty segment for {raw:?}");
                assert_ne!(segment, ".", "dot segment for {raw:?}");
                assert_ne!(segment, "..", "dot-dot segment for {raw:?}");
            }
        }
    }

    #[test]
    fn test_deterministic() {
        for raw in ["A/B c/..d", "x", "../y"] {
            assert_eq!(normalize(raw), normalize(raw));
        }
    }
}
