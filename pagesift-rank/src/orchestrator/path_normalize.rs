//! Path normalisation for ranked results.
//!
//! Source paths arrive with whatever separators the extraction host used.
//! Results always carry `/` as the only separator so that the same file
//! renders identically regardless of origin.

/// Normalise a source path for display.
///
/// 1. Backslashes become `/`.
/// 2. Runs of separators collapse to one, except a leading `//` (UNC share)
///    which is kept as a pair.
/// 3. A trailing separator is removed unless the path is the root.
///
/// # Examples
///
/// ```
/// use pagesift_rank::orchestrator::path_normalize::normalize_path;
///
/// assert_eq!(normalize_path(r"C:\docs\\reports\q1.pdf"), "C:/docs/reports/q1.pdf");
/// assert_eq!(normalize_path(r"\\server\share\a.pdf"), "//server/share/a.pdf");
/// ```
pub fn normalize_path(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let unc = unified.starts_with("//") && !unified.starts_with("///");

    let mut out = String::with_capacity(unified.len());
    if unc {
        out.push('/');
    }
    let mut previous_was_separator = false;
    for ch in unified.chars() {
        if ch == '/' {
            if previous_was_separator {
                continue;
            }
            previous_was_separator = true;
        } else {
            previous_was_separator = false;
        }
        out.push(ch);
    }

    let root_len = if unc { 2 } else { 1 };
    if out.len() > root_len && out.ends_with('/') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(normalize_path(r"docs\a\b.pdf"), "docs/a/b.pdf");
    }

    #[test]
    fn mixed_separators_are_unified() {
        assert_eq!(normalize_path(r"C:\docs/reports\q1.pdf"), "C:/docs/reports/q1.pdf");
    }

    #[test]
    fn separator_runs_collapse() {
        assert_eq!(normalize_path("docs//a///b.pdf"), "docs/a/b.pdf");
        assert_eq!(normalize_path(r"docs\\a\/b.pdf"), "docs/a/b.pdf");
    }

    #[test]
    fn unc_prefix_is_preserved() {
        assert_eq!(normalize_path(r"\\server\share\file.pdf"), "//server/share/file.pdf");
        assert_eq!(normalize_path("//server//share"), "//server/share");
    }

    #[test]
    fn triple_leading_separator_collapses() {
        assert_eq!(normalize_path("///var/data"), "/var/data");
    }

    #[test]
    fn trailing_separator_removed() {
        assert_eq!(normalize_path("docs/reports/"), "docs/reports");
        assert_eq!(normalize_path(r"docs\reports\\"), "docs/reports");
    }

    #[test]
    fn root_is_kept() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(r"\"), "/");
    }

    #[test]
    fn already_normal_path_unchanged() {
        assert_eq!(normalize_path("/home/user/a.pdf"), "/home/user/a.pdf");
    }

    #[test]
    fn equivalent_paths_compare_equal() {
        let a = normalize_path(r"archive\2024\report.pdf");
        let b = normalize_path("archive//2024/report.pdf/");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_path_stays_empty() {
        assert_eq!(normalize_path("  "), "");
    }
}
