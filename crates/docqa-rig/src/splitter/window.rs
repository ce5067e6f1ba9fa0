//! Fixed character windows.

/// Splits `text` into windows of at most `size` characters.
///
/// Returns `(char_offset, slice)` pairs. Consecutive windows share exactly
/// `overlap` characters and the last window ends at the end of the text.
/// Callers guarantee `overlap < size`.
pub fn windows(text: &str, size: usize, overlap: usize) -> Vec<(usize, &str)> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;
    if len == 0 || size == 0 {
        return Vec::new();
    }

    let step = size.saturating_sub(overlap).max(1);
    let mut spans = Vec::with_capacity(len.div_ceil(step));
    let mut start = 0;

    loop {
        let end = (start + size).min(len);
        spans.push((start, &text[bounds[start]..bounds[end]]));
        if end == len {
            break;
        }
        start += step;
    }

    spans
}
