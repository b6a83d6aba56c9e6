use std::iter;

use unicode_segmentation::UnicodeSegmentation;

const VARIATION_SELECTOR: char = '\u{FE0F}';
const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Returns every emoji in `text`, once per occurrence.
///
/// Text is split into extended grapheme clusters, so flags and ZWJ sequences come back as a
/// single emoji.  A cluster the catalogue does not know is split on U+200D instead, and each
/// part yields the longest emoji it starts with, dropping trailing marks.
/// ```rust
/// use tally_posts::text::find_emojis;
///
/// let found: Vec<_> = find_emojis("🔥 great 🔥🎉").collect();
/// assert_eq!(found, vec!["🔥", "🔥", "🎉"]);
/// ```
pub fn find_emojis(text: &str) -> impl Iterator<Item=&str> {
    text.graphemes(true).flat_map(cluster_emojis)
}

// The whole cluster when it is an emoji, otherwise whatever its joined parts start with
fn cluster_emojis(grapheme: &str) -> impl Iterator<Item=&str> {
    let whole = is_emoji(grapheme);
    let parts = if whole || grapheme.is_ascii() {
        None
    } else {
        Some(grapheme.split(ZERO_WIDTH_JOINER).filter_map(leading_emoji))
    };
    iter::once(grapheme).filter(move |_| whole).chain(parts.into_iter().flatten())
}

fn leading_emoji(part: &str) -> Option<&str> {
    part.char_indices().rev()
        .map(|(i, c)| &part[..i + c.len_utf8()])
        .find(|prefix| is_emoji(prefix))
}

/// Returns true if the grapheme is a known emoji, with or without a trailing U+FE0F
pub fn is_emoji(grapheme: &str) -> bool {
    // Digits, '#' and '*' are only emoji as part of a keycap sequence
    if grapheme.is_ascii() {
        return false;
    }
    if emojis::get(grapheme).is_some() {
        return true;
    }
    grapheme.contains(VARIATION_SELECTOR) && {
        let bare: String = grapheme.chars().filter(|c| *c != VARIATION_SELECTOR).collect();
        emojis::get(&bare).is_some()
    }
}
