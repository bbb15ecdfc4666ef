use std::io::Write as _;
use std::path::Path;

/// Formats an optional f64 to 4 decimal places, or a dash placeholder if None or non-finite.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.4}"),
        _ => "—".to_owned(),
    }
}

/// Escapes the characters HTML treats as markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, so the final name only ever points at a complete file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or any write or rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(0.123_456)), "0.1235");
        assert_eq!(fmt_opt(Some(f64::NAN)), "—");
        assert_eq!(fmt_opt(None), "—");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"a\" & 'b'</b>"), "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp_files() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("report.json");

        write_atomic(&path, b"first")?;
        write_atomic(&path, b"second")?;

        assert_eq!(std::fs::read_to_string(&path)?, "second");
        let entries = std::fs::read_dir(path.parent().unwrap_or(dir.path()))?.count();
        assert_eq!(entries, 1, "only the final file should remain");
        Ok(())
    }
}
