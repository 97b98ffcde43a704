//! Pattern document parser.
//!
//! The document is markdown-like text. Each pattern starts with a
//! `## Pattern:` header line; everything before the first header is ignored.
//!
//! ```text
//! ## Pattern: Rejection Spiral
//! - **Triggers:** worthless, nobody likes me
//! - **Frequency:** 12 times
//! - **Sources:** Journal/2024-03.md, Session Log.md
//! - **Effective Reframe:**
//! > You have three close friends who messaged you this week.
//! ```

use crate::events::{MatchObserver, SkipReason};
use crate::types::Pattern;

/// Header that opens a pattern block.
pub const PATTERN_HEADER: &str = "## Pattern:";

const FIELD_PREFIX: &str = "- **";
const TRIGGERS_FIELD: &str = "- **Triggers:**";
const FREQUENCY_FIELD: &str = "- **Frequency:**";
const SOURCES_FIELD: &str = "- **Sources:**";
const REFRAME_FIELD: &str = "- **Effective Reframe:**";

/// Parse a pattern document into patterns, in document order.
///
/// Blocks without a name or without triggers are reported to `observer`
/// and left out; they never stop the remaining blocks from parsing.
pub fn parse_patterns(content: &str, observer: &dyn MatchObserver) -> Vec<Pattern> {
    split_blocks(content)
        .into_iter()
        .enumerate()
        .filter_map(|(index, block)| match parse_block(&block) {
            Ok(pattern) => Some(pattern),
            Err((name, reason)) => {
                observer.on_pattern_skipped(index, &name, reason);
                None
            }
        })
        .collect()
}

/// Split the document into blocks. The first line of each block is the
/// remainder of its header line.
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix(PATTERN_HEADER) {
            blocks.push(vec![rest]);
        } else if let Some(current) = blocks.last_mut() {
            current.push(line);
        }
    }

    blocks
}

enum ScanState {
    SeekingField,
    AccumulatingReframe(Vec<String>),
}

fn parse_block(lines: &[&str]) -> Result<Pattern, (String, SkipReason)> {
    let name = lines.first().map(|l| l.trim()).unwrap_or_default().to_string();

    let mut triggers: Vec<String> = Vec::new();
    let mut frequency = None;
    let mut sources: Vec<String> = Vec::new();
    let mut effective_reframe = String::new();
    let mut state = ScanState::SeekingField;

    for line in lines.iter().skip(1) {
        if line.starts_with(FIELD_PREFIX) {
            if let ScanState::AccumulatingReframe(buffer) =
                std::mem::replace(&mut state, ScanState::SeekingField)
            {
                effective_reframe = join_reframe(&buffer);
            }
        } else if let ScanState::AccumulatingReframe(buffer) = &mut state {
            buffer.push(strip_quote_marker(line).to_string());
            continue;
        }

        if let Some(rest) = line.strip_prefix(TRIGGERS_FIELD) {
            triggers = split_list(rest).map(|t| t.to_lowercase()).collect();
        } else if let Some(rest) = line.strip_prefix(FREQUENCY_FIELD) {
            frequency = first_number(rest);
        } else if let Some(rest) = line.strip_prefix(SOURCES_FIELD) {
            sources = split_list(rest).map(str::to_string).collect();
        } else if line.starts_with(REFRAME_FIELD) {
            state = ScanState::AccumulatingReframe(Vec::new());
        }
    }

    if let ScanState::AccumulatingReframe(buffer) = state {
        effective_reframe = join_reframe(&buffer);
    }

    if name.is_empty() {
        return Err((name, SkipReason::MissingName));
    }
    if triggers.is_empty() {
        return Err((name, SkipReason::NoTriggers));
    }

    Ok(Pattern {
        name,
        triggers,
        frequency,
        effective_reframe,
        sources,
    })
}

fn join_reframe(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}

/// Comma-separated values, trimmed, blanks dropped.
fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// First run of ASCII digits in `text`.
fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Strip a leading `>` (after optional whitespace) and one following
/// whitespace character. Lines without a marker are returned unchanged.
fn strip_quote_marker(line: &str) -> &str {
    match line.trim_start().strip_prefix('>') {
        Some(rest) => {
            let mut chars = rest.chars();
            match chars.next() {
                Some(c) if c.is_whitespace() => chars.as_str(),
                _ => rest,
            }
        }
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MatchEvent, NoopObserver, RecordingObserver};

    const DOCUMENT: &str = "# Clarity Patterns

Notes about how this file works.

## Pattern: Rejection Spiral
- **Triggers:** worthless, Nobody Likes Me
- **Frequency:** seen 12 times
- **Sources:** Journal/2024-03.md, Health/Session Log.md
- **Effective Reframe:**
> You have three close friends
> who messaged you this week.

## Pattern: Work Catastrophe
- **Triggers:** fired, incompetent
- **Effective Reframe:**
> Your last review said \"exceeds expectations\".
- **Sources:** Work/Reviews.md
";

    fn parse(content: &str) -> Vec<Pattern> {
        parse_patterns(content, &NoopObserver)
    }

    #[test]
    fn test_parses_all_fields() {
        let patterns = parse(DOCUMENT);
        assert_eq!(patterns.len(), 2);

        let first = &patterns[0];
        assert_eq!(first.name, "Rejection Spiral");
        assert_eq!(first.triggers, vec!["worthless", "nobody likes me"]);
        assert_eq!(first.frequency, Some(12));
        assert_eq!(
            first.sources,
            vec!["Journal/2024-03.md", "Health/Session Log.md"]
        );
        assert_eq!(
            first.effective_reframe,
            "You have three close friends\nwho messaged you this week."
        );
    }

    #[test]
    fn test_field_after_reframe_closes_region() {
        let patterns = parse(DOCUMENT);
        let second = &patterns[1];
        assert_eq!(second.name, "Work Catastrophe");
        assert_eq!(
            second.effective_reframe,
            "Your last review said \"exceeds expectations\"."
        );
        assert_eq!(second.sources, vec!["Work/Reviews.md"]);
        assert_eq!(second.frequency, None);
    }

    #[test]
    fn test_parsed_pattern_equals_built_pattern() {
        let expected = Pattern::new("Rejection Spiral", ["Worthless", "nobody likes me"])
            .with_frequency(12)
            .with_sources(["Journal/2024-03.md", "Health/Session Log.md"])
            .with_reframe("You have three close friends\nwho messaged you this week.");

        assert_eq!(parse(DOCUMENT)[0], expected);
    }

    #[test]
    fn test_preamble_only_document() {
        assert!(parse("# Just a heading\n\nNo patterns yet.").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_header_must_start_line() {
        let doc = "Intro mentioning ## Pattern: Not Real\n- **Triggers:** nope";
        assert!(parse(doc).is_empty());
    }

    #[test]
    fn test_block_without_triggers_is_skipped_and_reported() {
        let doc = "## Pattern: No Triggers Here
- **Frequency:** 3
## Pattern: Kept
- **Triggers:** alone
";
        let observer = RecordingObserver::new();
        let patterns = parse_patterns(doc, &observer);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "Kept");
        assert_eq!(
            observer.events(),
            vec![MatchEvent::PatternSkipped {
                block_index: 0,
                name: "No Triggers Here".to_string(),
                reason: SkipReason::NoTriggers,
            }]
        );
    }

    #[test]
    fn test_blank_triggers_field_means_no_triggers() {
        let doc = "## Pattern: Blank\n- **Triggers:**\n## Pattern: Commas\n- **Triggers:** , ,  ";
        let observer = RecordingObserver::new();
        assert!(parse_patterns(doc, &observer).is_empty());
        assert_eq!(observer.events().len(), 2);
    }

    #[test]
    fn test_blank_name_is_skipped() {
        let doc = "## Pattern:   \n- **Triggers:** worthless";
        let observer = RecordingObserver::new();
        assert!(parse_patterns(doc, &observer).is_empty());
        assert!(matches!(
            observer.events()[0],
            MatchEvent::PatternSkipped {
                reason: SkipReason::MissingName,
                ..
            }
        ));
    }

    #[test]
    fn test_reframe_keeps_blank_lines_and_unquoted_text() {
        let doc = "## Pattern: P
- **Triggers:** t
- **Effective Reframe:**
> First paragraph.
>
> Second paragraph.
Plain line.
";
        let patterns = parse(doc);
        assert_eq!(
            patterns[0].effective_reframe,
            "First paragraph.\n\nSecond paragraph.\nPlain line."
        );
    }

    #[test]
    fn test_last_reframe_region_wins() {
        let doc = "## Pattern: P
- **Triggers:** t
- **Effective Reframe:**
> old
- **Effective Reframe:**
> new
";
        assert_eq!(parse(doc)[0].effective_reframe, "new");
    }

    #[test]
    fn test_reframe_missing_is_empty() {
        let doc = "## Pattern: P\n- **Triggers:** t";
        assert_eq!(parse(doc)[0].effective_reframe, "");
    }

    #[test]
    fn test_later_trigger_line_replaces_earlier() {
        let doc = "## Pattern: P\n- **Triggers:** a, b\n- **Triggers:** c";
        assert_eq!(parse(doc)[0].triggers, vec!["c"]);
    }

    #[test]
    fn test_handles_crlf_line_endings() {
        let doc = "## Pattern: Windows\r\n- **Triggers:** crlf\r\n- **Frequency:** 4\r\n";
        let patterns = parse(doc);
        assert_eq!(patterns[0].name, "Windows");
        assert_eq!(patterns[0].triggers, vec!["crlf"]);
        assert_eq!(patterns[0].frequency, Some(4));
    }

    #[test]
    fn test_parsing_is_idempotent() {
        assert_eq!(parse(DOCUMENT), parse(DOCUMENT));
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number(" about 7 times, maybe 9"), Some(7));
        assert_eq!(first_number(" often"), None);
        assert_eq!(first_number(" 99999999999"), None);
    }

    #[test]
    fn test_strip_quote_marker() {
        assert_eq!(strip_quote_marker("> quoted"), "quoted");
        assert_eq!(strip_quote_marker("   >  two spaces"), " two spaces");
        assert_eq!(strip_quote_marker(">tight"), "tight");
        assert_eq!(strip_quote_marker("  indented"), "  indented");
    }
}
