// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tokenizer for `Name='value' Other="value" bare` parameter strings.

use crate::error::{ReflectError, ReflectResult};

/// One `name=value` pair (or bare positional value) out of a parameter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParam {
    /// The name before `=`, or `None` for a positional value.
    pub name: Option<String>,
    /// The value, with surrounding quotes removed.
    pub value: String,
}

/// Iterates over the parameters of a string such as
/// `Name='Bob' Count="3" Visible=true`.
///
/// Values may be single-quoted, double-quoted or bare (ending at the next
/// whitespace). Inside quotes `\\` and a backslash before the opening quote
/// character are unescaped; any other backslash is kept as written. A token
/// without `=` is a positional value.
pub struct ParamsParser<'a> {
    input: &'a str,
    rest: &'a str,
}

impl<'a> ParamsParser<'a> {
    /// Creates a parser over `input`.
    pub fn new(input: &'a str) -> Self {
        Self { input, rest: input }
    }

    /// Parses the whole input, failing on the first malformed token.
    pub fn parse_all(input: &'a str) -> ReflectResult<Vec<ParsedParam>> {
        Self::new(input).collect()
    }

    fn malformed(&self, reason: &str) -> ReflectError {
        ReflectError::MalformedParams {
            input: self.input.to_owned(),
            reason: reason.to_owned(),
        }
    }

    /// Reads a value at the start of `self.rest`, quoted or bare.
    fn read_value(&mut self) -> ReflectResult<String> {
        let rest: &'a str = self.rest;
        match rest.chars().next() {
            Some(quote @ ('\'' | '"')) => {
                let body = &rest[1..];
                let mut value = String::new();
                let mut chars = body.char_indices();
                while let Some((i, c)) = chars.next() {
                    if c == quote {
                        self.rest = &body[i + 1..];
                        return Ok(value);
                    }
                    if c == '\\' {
                        // Only `\\` and an escaped quote are unescaped.
                        match chars.clone().next() {
                            Some((_, next)) if next == '\\' || next == quote => {
                                chars.next();
                                value.push(next);
                                continue;
                            }
                            _ => {}
                        }
                    }
                    value.push(c);
                }
                Err(self.malformed("unterminated quote"))
            }
            _ => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                self.rest = &rest[end..];
                Ok(rest[..end].to_owned())
            }
        }
    }
}

impl<'a> Iterator for ParamsParser<'a> {
    type Item = ReflectResult<ParsedParam>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest: &'a str = self.rest;
        let rest = rest.trim_start();
        self.rest = rest;
        if rest.is_empty() {
            return None;
        }

        let starts_quoted = rest.starts_with(['\'', '"']);
        let name_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let has_name = !starts_quoted && rest[name_end..].starts_with('=');

        let result = if has_name {
            let name = rest[..name_end].to_owned();
            if name.is_empty() {
                let err = self.malformed("missing name before '='");
                self.rest = "";
                return Some(Err(err));
            }
            self.rest = &rest[name_end + 1..];
            self.read_value().map(|value| ParsedParam {
                name: Some(name),
                value,
            })
        } else {
            self.read_value()
                .map(|value| ParsedParam { name: None, value })
        };

        if result.is_err() {
            // Stop after the first error.
            self.rest = "";
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, value: &str) -> ParsedParam {
        ParsedParam {
            name: Some(name.to_owned()),
            value: value.to_owned(),
        }
    }

    #[test]
    fn parses_quoted_and_bare_values() {
        let params =
            ParamsParser::parse_all(r#"Name='Bob the Builder' Count="3" Visible=true"#).unwrap();
        assert_eq!(
            params,
            vec![
                named("Name", "Bob the Builder"),
                named("Count", "3"),
                named("Visible", "true"),
            ]
        );
    }

    #[test]
    fn positional_values_have_no_name() {
        let params = ParamsParser::parse_all("12 'two words'").unwrap();
        assert_eq!(params[0].name, None);
        assert_eq!(params[0].value, "12");
        assert_eq!(params[1].value, "two words");
    }

    #[test]
    fn empty_quoted_value_is_allowed() {
        let params = ParamsParser::parse_all("Label=''").unwrap();
        assert_eq!(params, vec![named("Label", "")]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let mut parser = ParamsParser::new("A='oops B=1");
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }

    #[test]
    fn escaped_quotes_and_backslashes_are_unescaped() {
        let params =
            ParamsParser::parse_all(r#"Text="it's \"quoted\"" Path='C:\dir\\' Other='a\'b'"#)
                .unwrap();
        assert_eq!(
            params,
            vec![
                named("Text", r#"it's "quoted""#),
                named("Path", r"C:\dir\"),
                named("Other", "a'b"),
            ]
        );
    }

    #[test]
    fn escaped_closing_quote_does_not_terminate() {
        let mut parser = ParamsParser::new(r#"A="open\""#);
        assert!(parser.next().unwrap().is_err());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(ParamsParser::parse_all("   ").unwrap().is_empty());
    }
}
