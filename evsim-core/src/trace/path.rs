/*!
Trace paths

A trace path is a sequence of `/` separated elements, for example
`/nodes/3/$Ipv4/rx`. Each element is a name, the `*` wildcard or a list
of alternatives between parentheses: `(tx|rx)`.
*/

use logos::{Lexer, Logos};

/// the first element of `path`, without its leading `/`
///
/// ```
/// # use evsim_core::trace::path;
/// assert_eq!(path::element("/nodes/3/rx"), "nodes");
/// assert_eq!(path::element("/rx"), "rx");
/// ```
pub fn element(path: &str) -> &str {
    let rest = path.strip_prefix('/').unwrap_or(path);
    match rest.find('/') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// what follows the first element of `path`, with its leading `/`, or
/// the empty string
///
/// ```
/// # use evsim_core::trace::path;
/// assert_eq!(path::subpath("/nodes/3/rx"), "/3/rx");
/// assert_eq!(path::subpath("/rx"), "");
/// ```
pub fn subpath(path: &str) -> &str {
    let rest = path.strip_prefix('/').unwrap_or(path);
    match rest.find('/') {
        Some(end) => &rest[end..],
        None => "",
    }
}

/// One element of a trace path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement<'a> {
    /// `*`: every item
    Wildcard,
    /// `(a|b|...)`: the first item named after each alternative
    Alternatives(Vec<&'a str>),
    /// the first item with this name
    Name(&'a str),
}

impl<'a> PathElement<'a> {
    /// anything that is neither `*` nor a well formed list of
    /// alternatives is a name
    pub fn parse(element: &'a str) -> Self {
        if element == "*" {
            return Self::Wildcard;
        }
        match parse_alternatives(element) {
            Some(names) => Self::Alternatives(names),
            None => Self::Name(element),
        }
    }
}

fn parse_alternatives(element: &str) -> Option<Vec<&str>> {
    let mut lex: Lexer<'_, Token> = Lexer::new(element);

    if lex.next()? != Ok(Token::Open) {
        return None;
    }

    let mut names = Vec::new();
    loop {
        if lex.next()? != Ok(Token::Name) {
            return None;
        }
        names.push(lex.slice());

        match lex.next()? {
            Ok(Token::Pipe) => continue,
            Ok(Token::Close) => break,
            _ => return None,
        }
    }

    // nothing may follow the closing parenthesis
    lex.next().is_none().then_some(names)
}

#[derive(Logos, Debug, PartialEq)]
enum Token {
    #[token("(")]
    Open,
    #[token(")")]
    Close,
    #[token("|")]
    Pipe,
    #[regex(r"[^()|]+")]
    Name,
}
