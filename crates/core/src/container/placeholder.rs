use std::sync::OnceLock;

use regex::Regex;

/// Sigil marking a string argument as a service reference (`@director`)
pub const SERVICE_SIGIL: char = '@';

/// Piece of an interpolated string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Parameter(&'a str),
}

/// Classification of a raw string argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentToken<'a> {
    /// Plain text, passed through unchanged
    Literal,
    /// `@id`: resolve the service with this id
    Service(&'a str),
    /// Exactly `%name%`: the parameter's native value
    Parameter(&'a str),
    /// Text mixed with `%name%` placeholders, rendered to a string
    Interpolated(Vec<Segment<'a>>),
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%([^%\s]+)%").expect("placeholder pattern is valid"))
}

/// Classify a raw string argument
pub fn parse_argument(raw: &str) -> ArgumentToken<'_> {
    if raw.len() >= 2 && raw.starts_with(SERVICE_SIGIL) {
        return ArgumentToken::Service(&raw[SERVICE_SIGIL.len_utf8()..]);
    }

    let mut segments = Vec::new();
    let mut last = 0;
    for captures in placeholder_pattern().captures_iter(raw) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(&raw[last..whole.start()]));
        }
        segments.push(Segment::Parameter(name.as_str()));
        last = whole.end();
    }

    if segments.is_empty() {
        return ArgumentToken::Literal;
    }
    if last < raw.len() {
        segments.push(Segment::Text(&raw[last..]));
    }

    if let [Segment::Parameter(name)] = segments[..] {
        return ArgumentToken::Parameter(name);
    }
    ArgumentToken::Interpolated(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(parse_argument("James"), ArgumentToken::Literal);
        assert_eq!(parse_argument(""), ArgumentToken::Literal);
        assert_eq!(parse_argument("@"), ArgumentToken::Literal);
        assert_eq!(parse_argument("100%"), ArgumentToken::Literal);
        assert_eq!(parse_argument("% spaced %"), ArgumentToken::Literal);
    }

    #[test]
    fn test_service_reference() {
        assert_eq!(parse_argument("@director"), ArgumentToken::Service("director"));
    }

    #[test]
    fn test_exact_parameter() {
        assert_eq!(parse_argument("%foo%"), ArgumentToken::Parameter("foo"));
        assert_eq!(parse_argument("%director.age%"), ArgumentToken::Parameter("director.age"));
    }

    #[test]
    fn test_interpolated() {
        assert_eq!(
            parse_argument("%foo% Bob"),
            ArgumentToken::Interpolated(vec![Segment::Parameter("foo"), Segment::Text(" Bob")])
        );
        assert_eq!(
            parse_argument("a%x%b%y%"),
            ArgumentToken::Interpolated(vec![
                Segment::Text("a"),
                Segment::Parameter("x"),
                Segment::Text("b"),
                Segment::Parameter("y"),
            ])
        );
    }
}
