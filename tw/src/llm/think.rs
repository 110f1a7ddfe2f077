//! Removal of `<think>` reasoning spans from model replies

const OPEN: &str = "<think>";
const CLOSE: &str = "</think>";

/// Strip every `<think>...</think>` span and trim the result
///
/// A closing tag with no opening tag before it drops everything up to and
/// including the tag (some chat templates inject the opening tag themselves).
/// An opening tag that is never closed drops the rest of the reply.
pub fn strip_think_blocks(text: &str) -> String {
    let mut rest = text;

    if let Some(end) = rest.find(CLOSE)
        && !rest[..end].contains(OPEN)
    {
        rest = &rest[end + CLOSE.len()..];
    }

    let mut out = String::with_capacity(rest.len());
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        match rest[start..].find(CLOSE) {
            Some(end) => rest = &rest[start + end + CLOSE.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}
