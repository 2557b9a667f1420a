//! Rewriting of original class sources
//!
//! The original class is stored next to its proxy under one cache entry. To
//! let both coexist, the original class is renamed with
//! [`ORIGINAL_CLASSNAME_SUFFIX`] and loses the `final` modifiers that would
//! prevent the proxy from extending it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;
use weft_model::{BuildError, ORIGINAL_CLASSNAME_SUFFIX};

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*<\?php[ \t]*\n?").expect("valid open tag pattern"));

static CLASS_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)((?:(?:abstract|final|readonly)\s+)*)(interface|class)\s+([a-zA-Z0-9_]+)")
        .expect("valid class declaration pattern")
});

static FINAL_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^([ \t]*)((public|protected)\s+)?final\s+(public|protected)?(\s+)?(function\s+([a-zA-Z_\x{7f}-\x{ff}][a-zA-Z0-9_\x{7f}-\x{ff}]*\s*\())",
    )
    .expect("valid final method pattern")
});

static CLOSE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?>\s*\z").expect("valid close tag pattern"));

/// Build the cache entry for a class: renamed original source, banner and
/// proxy code, followed by a comment naming the original file
pub fn rewrite_original_source(
    source: &str,
    path: &Path,
    proxy_code: &str,
    banner: &str,
) -> Result<String, BuildError> {
    let code = OPEN_TAG.replace(source, "");
    let code = rename_original_class(&code, path)?;
    let code = strip_final_from_overridden_methods(&code, proxy_code);
    let code = CLOSE_TAG.replace(&code, "");

    Ok(format!(
        "{code}{banner}{proxy_code}\n# PathAndFilename: {}",
        path.display()
    ))
}

/// Append the original suffix to the first class or interface declaration
///
/// The declared name must equal the file name without extension. A `final`
/// modifier on the class is dropped.
pub fn rename_original_class(source: &str, path: &Path) -> Result<String, BuildError> {
    let captures = CLASS_DECLARATION
        .captures(source)
        .ok_or_else(|| BuildError::MissingClassDeclaration {
            path: path.to_path_buf(),
        })?;

    let declared = &captures[4];
    let expected = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if declared != expected {
        return Err(BuildError::class_name_mismatch(declared, expected, path));
    }

    let modifiers: String = captures[2]
        .split_whitespace()
        .filter(|modifier| *modifier != "final")
        .map(|modifier| format!("{modifier} "))
        .collect();
    let replacement = format!(
        "{}{modifiers}{} {declared}{ORIGINAL_CLASSNAME_SUFFIX}",
        &captures[1], &captures[3]
    );

    let Some(whole) = captures.get(0) else {
        return Ok(source.to_string());
    };
    let mut renamed = String::with_capacity(source.len() + ORIGINAL_CLASSNAME_SUFFIX.len());
    renamed.push_str(&source[..whole.start()]);
    renamed.push_str(&replacement);
    renamed.push_str(&source[whole.end()..]);
    Ok(renamed)
}

/// Comment out `final` on methods the proxy overrides
///
/// A method counts as overridden when its signature line, up to the opening
/// parenthesis, occurs verbatim in the proxy code. This is a textual
/// heuristic: differently formatted signatures are not recognized.
#[must_use]
pub fn strip_final_from_overridden_methods(source: &str, proxy_code: &str) -> String {
    FINAL_METHOD
        .replace_all(source, |captures: &Captures<'_>| {
            if !proxy_code.contains(&captures[0]) {
                return captures[0].to_string();
            }
            format!(
                "{}{}/*final*/ {}{}{}",
                &captures[1],
                captures.get(2).map_or("", |m| m.as_str()),
                captures.get(4).map_or("", |m| m.as_str()),
                captures.get(5).map_or("", |m| m.as_str()),
                &captures[6]
            )
        })
        .into_owned()
}
