//! Line rules of the built-in engine.

use crate::engine::RuleDetails;
use crate::issue::Severity;

pub(crate) const DEFAULT_MAX_LINE_LENGTH: usize = 120;

/// Property holding the line length threshold.
pub(crate) const MAX_LINE_LENGTH_PROPERTY: &str = "text.maxLineLength";

/// A rule of the built-in engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rule {
    LineLength,
    TrailingWhitespace,
    TabCharacter,
    TodoComment,
}

/// A match of a rule on one line. Columns are character offsets.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Finding {
    pub start_column: usize,
    pub end_column: usize,
    pub message: String,
}

pub(crate) const ALL_RULES: [Rule; 4] = [
    Rule::LineLength,
    Rule::TrailingWhitespace,
    Rule::TabCharacter,
    Rule::TodoComment,
];

impl Rule {
    pub fn key(&self) -> &'static str {
        match self {
            Rule::LineLength => "text:LineLength",
            Rule::TrailingWhitespace => "text:TrailingWhitespace",
            Rule::TabCharacter => "text:TabCharacter",
            Rule::TodoComment => "text:TodoComment",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::LineLength => "Lines should not be too long",
            Rule::TrailingWhitespace => "Lines should not end with whitespace",
            Rule::TabCharacter => "Tabulation characters should not be used",
            Rule::TodoComment => "Track uses of TODO and FIXME markers",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Rule::LineLength => Severity::Major,
            Rule::TrailingWhitespace => Severity::Minor,
            Rule::TabCharacter | Rule::TodoComment => Severity::Info,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Rule::LineLength => {
                "<p>Long lines are hard to read. Lines longer than the configured \
                 <code>text.maxLineLength</code> (120 by default) are reported.</p>"
            }
            Rule::TrailingWhitespace => {
                "<p>Trailing whitespace adds noise to diffs and is never meaningful.</p>"
            }
            Rule::TabCharacter => {
                "<p>Tab width differs between editors; indent with spaces.</p>"
            }
            Rule::TodoComment => {
                "<p><code>TODO</code> and <code>FIXME</code> markers flag work that \
                 was left unfinished.</p>"
            }
        }
    }

    pub fn from_key(key: &str) -> Option<Rule> {
        ALL_RULES.into_iter().find(|rule| rule.key() == key)
    }

    pub fn details(&self) -> RuleDetails {
        RuleDetails {
            key: self.key().to_string(),
            name: self.name().to_string(),
            html_description: self.description().to_string(),
            language: "text".to_string(),
            severity: self.severity().name().to_string(),
        }
    }

    /// Check one line, without its terminator.
    pub fn check(&self, line: &str, max_line_length: usize) -> Option<Finding> {
        match self {
            Rule::LineLength => {
                let length = line.chars().count();
                (length > max_line_length).then(|| Finding {
                    start_column: 0,
                    end_column: length,
                    message: format!(
                        "Split this {} characters long line (which is greater than {} authorized).",
                        length, max_line_length
                    ),
                })
            }
            Rule::TrailingWhitespace => {
                let trimmed = line.trim_end();
                (trimmed.len() < line.len()).then(|| Finding {
                    start_column: trimmed.chars().count(),
                    end_column: line.chars().count(),
                    message: "Remove the useless trailing whitespaces at the end of this line."
                        .to_string(),
                })
            }
            Rule::TabCharacter => line.chars().position(|c| c == '\t').map(|column| Finding {
                start_column: column,
                end_column: column + 1,
                message: "Replace all tab characters in this line by sequences of white-spaces."
                    .to_string(),
            }),
            Rule::TodoComment => ["TODO", "FIXME"]
                .into_iter()
                .filter_map(|marker| line.find(marker).map(|at| (at, marker)))
                .min_by_key(|(at, _)| *at)
                .map(|(at, marker)| {
                    let column = line[..at].chars().count();
                    Finding {
                        start_column: column,
                        end_column: column + marker.len(),
                        message: format!("Complete the task associated to this \"{}\" comment.", marker),
                    }
                }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        assert!(Rule::LineLength.check("short", 10).is_none());
        let finding = Rule::LineLength.check("0123456789ab", 10).unwrap();
        assert_eq!(finding.start_column, 0);
        assert_eq!(finding.end_column, 12);
        assert!(finding.message.contains("12 characters"));
    }

    #[test]
    fn test_line_length_counts_characters() {
        // Four characters, eight bytes
        assert!(Rule::LineLength.check("\u{e9}\u{e9}\u{e9}\u{e9}", 4).is_none());
    }

    #[test]
    fn test_trailing_whitespace() {
        assert!(Rule::TrailingWhitespace.check("clean", 120).is_none());
        let finding = Rule::TrailingWhitespace.check("let x;  ", 120).unwrap();
        assert_eq!((finding.start_column, finding.end_column), (6, 8));
    }

    #[test]
    fn test_tab_character() {
        let finding = Rule::TabCharacter.check("a\tb\t", 120).unwrap();
        assert_eq!((finding.start_column, finding.end_column), (1, 2));
    }

    #[test]
    fn test_todo_picks_first_marker() {
        let finding = Rule::TodoComment
            .check("// FIXME later, TODO now", 120)
            .unwrap();
        assert_eq!(finding.start_column, 3);
        assert_eq!(finding.end_column, 8);
        assert!(finding.message.contains("FIXME"));
        assert!(Rule::TodoComment.check("nothing here", 120).is_none());
    }

    #[test]
    fn test_rule_lookup() {
        assert_eq!(Rule::from_key("text:TabCharacter"), Some(Rule::TabCharacter));
        assert_eq!(Rule::from_key("java:S100"), None);
        let details = Rule::LineLength.details();
        assert_eq!(details.severity, "MAJOR");
        assert_eq!(details.language, "text");
    }
}
