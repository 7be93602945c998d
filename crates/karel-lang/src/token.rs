use karel_core::{Pos, Span};

/// A whitespace-delimited word of source text with its span.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// Reserved words of the source language.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Keyword {
    Define,
    End,
    Step,
    Left,
    PickUp,
    Place,
    Stop,
    Repeat,
    Times,
    If,
    Then,
    Else,
    While,
    Do,
    Not,
    Wall,
    Flag,
    Home,
    North,
    West,
    South,
    East,
}

/// Classify a word as a keyword, case-insensitively.
pub fn keyword(text: &str) -> Option<Keyword> {
    const TABLE: &[(&str, Keyword)] = &[
        ("define", Keyword::Define),
        ("end", Keyword::End),
        ("step", Keyword::Step),
        ("left", Keyword::Left),
        ("pickup", Keyword::PickUp),
        ("place", Keyword::Place),
        ("stop", Keyword::Stop),
        ("repeat", Keyword::Repeat),
        ("times", Keyword::Times),
        ("if", Keyword::If),
        ("then", Keyword::Then),
        ("else", Keyword::Else),
        ("while", Keyword::While),
        ("do", Keyword::Do),
        ("not", Keyword::Not),
        ("wall", Keyword::Wall),
        ("flag", Keyword::Flag),
        ("home", Keyword::Home),
        ("north", Keyword::North),
        ("west", Keyword::West),
        ("south", Keyword::South),
        ("east", Keyword::East),
    ];
    TABLE
        .iter()
        .find(|(name, _)| text.eq_ignore_ascii_case(name))
        .map(|&(_, kw)| kw)
}

/// True for words usable as procedure names.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Split source into tokens, skipping whitespace and `#` line comments.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c == b'#' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'#' {
                i += 1;
            }
            tokens.push(Token {
                text: &source[start..i],
                span: Span::new(Pos::new(start as u32), Pos::new(i as u32)),
            });
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<&str> {
        tokenize(source).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(texts("define main\n  step\nend"), vec!["define", "main", "step", "end"]);
    }

    #[test]
    fn empty_source() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(texts("step # go forward\nleft"), vec!["step", "left"]);
        assert_eq!(texts("# a full-line comment\n"), Vec::<&str>::new());
        assert_eq!(texts("step# tight comment\nleft"), vec!["step", "left"]);
    }

    #[test]
    fn spans_index_into_source() {
        let source = "define  main";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 2);
        let span = tokens[1].span;
        assert_eq!(&source[span.start().offset() as usize..span.end().offset() as usize], "main");
    }

    #[test]
    fn keywords_case_insensitive() {
        assert_eq!(keyword("define"), Some(Keyword::Define));
        assert_eq!(keyword("DEFINE"), Some(Keyword::Define));
        assert_eq!(keyword("Repeat"), Some(Keyword::Repeat));
        assert_eq!(keyword("pickup"), Some(Keyword::PickUp));
        assert_eq!(keyword("turn"), None);
    }

    #[test]
    fn identifier_shape() {
        assert!(is_identifier("main"));
        assert!(is_identifier("turn-around"));
        assert!(is_identifier("_aux2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("-dash"));
        assert!(!is_identifier(""));
    }
}
