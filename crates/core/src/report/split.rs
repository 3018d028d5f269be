/// Discord allows 2000 characters per message; the rest is headroom for part headers.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1950;

/// Splits `content` into chunks of at most `max` characters, packing whole lines greedily.
/// A line longer than `max` is cut into `max`-sized pieces and its tail keeps filling the
/// current chunk. When no line had to be cut, joining the chunks with `\n` gives back
/// `content`.
pub fn split_message(content: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if content.chars().count() <= max {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    // (text, length in chars)
    let mut current: Option<(String, usize)> = None;

    for line in content.split('\n') {
        let line_len = line.chars().count();

        if let Some((mut text, len)) = current.take() {
            if len + 1 + line_len <= max {
                text.push('\n');
                text.push_str(line);
                current = Some((text, len + 1 + line_len));
                continue;
            }
            chunks.push(text);
        }

        if line_len <= max {
            current = Some((line.to_string(), line_len));
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut pieces = chars.chunks(max).map(|c| c.iter().collect::<String>()).peekable();
        while let Some(piece) = pieces.next() {
            if pieces.peek().is_some() {
                chunks.push(piece);
            } else {
                let len = piece.chars().count();
                current = Some((piece, len));
            }
        }
    }

    if let Some((text, _)) = current {
        chunks.push(text);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bounded(chunks: &[String], max: usize) {
        for c in chunks {
            assert!(c.chars().count() <= max, "chunk of {} chars", c.chars().count());
        }
    }

    #[test]
    fn short_content_is_one_chunk() {
        assert_eq!(split_message("hello\nworld", 1950), vec!["hello\nworld".to_string()]);
        assert_eq!(split_message("", 10), vec!["".to_string()]);
    }

    #[test]
    fn packs_lines_greedily() {
        let content = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = split_message(content, 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc\ndddd"]);
        assert_eq!(chunks.join("\n"), content);
    }

    #[test]
    fn rejoins_exactly_without_oversized_lines() {
        let mut lines = Vec::new();
        for i in 0..400 {
            lines.push(format!("line {i} {}", "é".repeat(i % 37)));
            if i % 11 == 0 {
                lines.push(String::new());
            }
        }
        let content = lines.join("\n");
        for max in [50, 64, 100, 1950] {
            let chunks = split_message(&content, max);
            assert_bounded(&chunks, max);
            assert_eq!(chunks.join("\n"), content, "max={max}");
        }
    }

    #[test]
    fn force_splits_oversized_lines() {
        let long = "x".repeat(25);
        let content = format!("head\n{long}\ntail");
        let chunks = split_message(&content, 10);
        assert_bounded(&chunks, 10);
        assert_eq!(
            chunks,
            vec!["head", "xxxxxxxxxx", "xxxxxxxxxx", "xxxxx\ntail"]
        );
        assert_eq!(chunks.concat().replace('\n', ""), content.replace('\n', ""));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let content = "📊📊📊\n📊📊📊";
        assert_eq!(split_message(content, 7).len(), 1);
        assert_eq!(split_message(content, 6).len(), 2);
    }
}
