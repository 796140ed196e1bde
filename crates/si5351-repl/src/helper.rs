//! Line editor helper: command completion and argument hints

use crate::command::COMMANDS;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

/// Completes command words and hints at their arguments
#[derive(Helper, Default)]
pub struct MenuHelper;

impl Completer for MenuHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let prefix = &line[..pos];
        // Only the first word is completed
        if prefix.trim_start().contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let start = prefix.len() - prefix.trim_start().len();
        let word = prefix.trim_start().to_lowercase();
        let completions = COMMANDS
            .iter()
            .filter(|(name, _, _)| name.starts_with(&word))
            .map(|(name, _, _)| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();

        Ok((start, completions))
    }
}

impl Hinter for MenuHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let word = line.trim().to_lowercase();
        COMMANDS
            .iter()
            .find(|(name, args, _)| *name == word && !args.is_empty())
            .map(|(_, args, _)| {
                let pad = if line.ends_with(' ') { "" } else { " " };
                format!("{}{}", pad, args)
            })
    }
}

impl Highlighter for MenuHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for MenuHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::DefaultHistory;

    fn complete(line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = MenuHelper.complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|p| p.replacement).collect())
    }

    #[test]
    fn test_complete_first_word() {
        assert_eq!(complete("st"), (0, vec!["status".to_string()]));
        assert_eq!(complete("o"), (0, vec!["on".to_string(), "off".to_string()]));
        assert_eq!(complete("  pl"), (2, vec!["plan".to_string()]));
    }

    #[test]
    fn test_no_completion_for_arguments() {
        assert!(complete("set 0").1.is_empty());
    }

    #[test]
    fn test_hint_shows_arguments() {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        assert_eq!(
            MenuHelper.hint("set", 3, &ctx),
            Some(" <clk> <freq>".to_string())
        );
        assert_eq!(MenuHelper.hint("status", 6, &ctx), None);
        assert_eq!(MenuHelper.hint("set 0", 5, &ctx), None);
    }
}
