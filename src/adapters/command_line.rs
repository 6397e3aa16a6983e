use std::collections::BTreeMap;

use serde::Serialize;

use crate::ports::{CommandView, FlagValue};

/// Command-line arguments split into flags and positional words.
///
/// Recognized forms: `--name=value`, `--name` (true), `--no-name` (false),
/// `-abc` (each letter true) and a bare `--` after which everything is a word.
/// A later flag overrides an earlier one of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    flags: BTreeMap<String, FlagValue>,
    words: Vec<String>,
}

impl ParsedCommand {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            if arg == "--" {
                command.words.extend(args.by_ref());
                break;
            }

            if let Some(long) = arg.strip_prefix("--") {
                command.long_flag(long);
            } else if let Some(short) = arg.strip_prefix('-')
                && !short.is_empty()
            {
                for letter in short.chars() {
                    command
                        .flags
                        .insert(letter.to_string(), FlagValue::Switch(true));
                }
            } else {
                command.words.push(arg);
            }
        }

        command
    }

    fn long_flag(&mut self, flag: &str) {
        if let Some((name, value)) = flag.split_once('=') {
            self.flags
                .insert(name.to_string(), FlagValue::Text(value.to_string()));
        } else if let Some(name) = flag.strip_prefix("no-") {
            self.flags.insert(name.to_string(), FlagValue::Switch(false));
        } else {
            self.flags.insert(flag.to_string(), FlagValue::Switch(true));
        }
    }
}

impl CommandView for ParsedCommand {
    fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }

    fn words(&self) -> &[String] {
        &self.words
    }
}
