//! Minimal CSV line tokenizer.
//!
//! Splits a single line on commas, except commas between a pair of double
//! quotes. Quote characters toggle the quoted state and are dropped from
//! the output. Known limitations, kept on purpose so that results match
//! what users already get from persona analysis:
//!
//! - An escaped quote (`""`) inside a quoted field is not supported; it
//!   toggles the state twice and both characters disappear.
//! - An unbalanced quote is not an error. The end of the line closes the
//!   last field regardless of the quoted state.

/// Parse one CSV line into trimmed field values.
///
/// An empty line yields a single empty field; a line of `N` commas yields
/// `N + 1` empty fields.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
