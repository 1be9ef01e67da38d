use std::{sync::OnceLock, time::Duration};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::types::Segment;

/// Normalize caller text before it reaches the model tokenizer
///
/// Unwraps text that was JSON-encoded twice by the caller, applies NFKC
/// (smart quotes become straight quotes), drops control characters and
/// collapses runs of whitespace.
pub fn sanitize(text: &str) -> String {
    let trimmed = text.trim();
    let unwrapped = (trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"'))
        .then(|| serde_json::from_str::<String>(trimmed).ok())
        .flatten();

    let normalized: String = unwrapped
        .as_deref()
        .unwrap_or(text)
        .nfkc()
        .filter(|c| !is_stripped_control(*c))
        .collect();

    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Control characters removed outright; tab, newline and carriage return
/// survive as whitespace
const fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}')
}

/// Split text on `[pause:N]` markers, `N` being seconds
///
/// Blank text between markers is dropped, so the result may contain only
/// pauses.
pub fn split_pauses(text: &str) -> Vec<Segment> {
    fn marker() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\[pause:(\d+(?:\.\d+)?)\]").expect("must be valid regex"))
    }

    let mut segments = Vec::new();
    let mut last_end = 0;

    for captures in marker().captures_iter(text) {
        let (Some(whole), Some(seconds)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        push_speech(&mut segments, &text[last_end..whole.start()]);

        let seconds = seconds.as_str().parse::<f64>().unwrap_or_default();
        segments.push(Segment::Pause(
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX),
        ));

        last_end = whole.end();
    }

    push_speech(&mut segments, &text[last_end..]);

    segments
}

fn push_speech(segments: &mut Vec<Segment>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        segments.push(Segment::Speech(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(sanitize("  Hello,\n\n  world!\t "), "Hello, world!");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(sanitize("Hel\u{0}lo\u{7f} the\u{1b}re"), "Hello there");
    }

    #[test]
    fn normalizes_compatibility_characters() {
        assert_eq!(sanitize("ﬁne ＡＢＣ"), "fine ABC");
    }

    #[test]
    fn unwraps_double_encoded_json() {
        assert_eq!(sanitize(r#""Hello, \"world\"""#), r#"Hello, "world""#);
        assert_eq!(sanitize(r#"  "Line one\nLine two"  "#), "Line one Line two");
    }

    #[test]
    fn keeps_quotes_that_are_not_json() {
        assert_eq!(sanitize(r#""a" and "b""#), r#""a" and "b""#);
        assert_eq!(sanitize("\""), "\"");
    }

    #[test]
    fn blank_input_sanitizes_to_empty() {
        assert_eq!(sanitize(" \n\t\u{0} "), "");
    }

    #[test]
    fn text_without_markers_is_one_segment() {
        assert_eq!(
            split_pauses("Hello there."),
            vec![Segment::Speech("Hello there.".to_string())]
        );
    }

    #[test]
    fn splits_on_markers() {
        assert_eq!(
            split_pauses("Intro. [pause:1.5] Main part.[pause:2]Outro."),
            vec![
                Segment::Speech("Intro.".to_string()),
                Segment::Pause(Duration::from_millis(1500)),
                Segment::Speech("Main part.".to_string()),
                Segment::Pause(Duration::from_secs(2)),
                Segment::Speech("Outro.".to_string()),
            ]
        );
    }

    #[test]
    fn leading_and_consecutive_markers() {
        assert_eq!(
            split_pauses("[pause:1] [pause:0.25] Hi"),
            vec![
                Segment::Pause(Duration::from_secs(1)),
                Segment::Pause(Duration::from_millis(250)),
                Segment::Speech("Hi".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_markers_are_spoken() {
        assert_eq!(
            split_pauses("Wait [pause:abc] here"),
            vec![Segment::Speech("Wait [pause:abc] here".to_string())]
        );
    }

    #[test]
    fn markers_only() {
        assert_eq!(split_pauses("[pause:3]"), vec![Segment::Pause(Duration::from_secs(3))]);
    }
}
