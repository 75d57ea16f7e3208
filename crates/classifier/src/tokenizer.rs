/// Splits text on runs of whitespace. Leading and trailing whitespace never
/// produce empty tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
