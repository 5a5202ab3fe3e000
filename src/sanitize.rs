//! Allow-list HTML filtering for user-supplied text.
//!
//! This is a pattern filter, not an HTML parser. It removes script blocks,
//! drops every tag whose name is not allowed while keeping the text between
//! tags, and strips double-quoted `on*="..."` attributes. Nested or malformed
//! markup gets no special treatment and single-quoted or unquoted handlers
//! pass through untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Tags permitted in insult text.
pub const INSULT_TAGS: &[&str] = &["b", "i", "u"];
/// Tags permitted in announcement bodies.
pub const ANNOUNCEMENT_TAGS: &[&str] = &["b", "i", "u", "ul", "li"];

static SCRIPT_BLOCK: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?i)<script[\s\S]*?>[\s\S]*?</script>"));
static TAG: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"<\s*/?\s*([A-Za-z0-9]*)[^>]*>"));
static EVENT_HANDLER: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r#"(?i)on\w+="[^"]*""#));

/// Filter `html` down to the tags named in `allowed`.
///
/// Tag names compare case-insensitively. The function never fails; if a
/// pattern is unavailable every angle bracket is removed instead, so no
/// markup survives.
///
/// # Examples
///
/// ```
/// use snippy::sanitize::{INSULT_TAGS, sanitize};
///
/// let cleaned = sanitize(
///     r#"<b>ok</b><script>alert(1)</script><div onclick="x()">y</div>"#,
///     INSULT_TAGS,
/// );
/// assert_eq!(cleaned, "<b>ok</b>y");
/// ```
#[must_use]
pub fn sanitize(html: &str, allowed: &[&str]) -> String {
    let (Ok(script), Ok(tag), Ok(handler)) = (&*SCRIPT_BLOCK, &*TAG, &*EVENT_HANDLER) else {
        return html.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    };
    let without_scripts = script.replace_all(html, "");
    let without_tags = tag.replace_all(&without_scripts, |caps: &Captures<'_>| {
        let name = caps.get(1).map_or("", |m| m.as_str());
        if allowed.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            caps.get(0).map_or_else(String::new, |m| m.as_str().to_owned())
        } else {
            String::new()
        }
    });
    handler.replace_all(&without_tags, "").into_owned()
}

/// Sanitize insult text with [`INSULT_TAGS`].
#[must_use]
pub fn sanitize_insult(text: &str) -> String { sanitize(text, INSULT_TAGS) }

/// Sanitize an announcement body with [`ANNOUNCEMENT_TAGS`].
#[must_use]
pub fn sanitize_announcement(body: &str) -> String { sanitize(body, ANNOUNCEMENT_TAGS) }
