//! Normalisation of raw generator output before parsing.

/// Normalise raw generated text.
///
/// Converts `\r\n` and lone `\r` to `\n`, trims trailing whitespace from
/// every line, and trims the whole text. Total on any input, idempotent.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let joined = unified
        .trim()
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    joined.trim().to_string()
}
