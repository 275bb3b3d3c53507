use tiktoken_rs::cl100k_base;

/// Approximate output-token counter used when the upstream doesn't report
/// its own usage before a stream terminates. Upstream-reported counts
/// always win over this estimate (see SPEC_FULL.md §4.C).
pub fn approximate_token_count(text: &str) -> u32 {
    match cl100k_base() {
        Ok(bpe) => bpe.encode_with_special_tokens(text).len() as u32,
        Err(_) => (text.split_whitespace().count() as u32).max(if text.is_empty() { 0 } else { 1 }),
    }
}
