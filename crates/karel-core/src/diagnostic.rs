use crate::span::Span;

/// Stable identifiers for compiler diagnostics.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorCode {
    /// Word not recognized as a keyword, number, or identifier.
    UnknownWord,
    /// Token out of place for the current construct.
    UnexpectedToken,
    /// Statement outside a procedure definition.
    TopLevelStatement,
    /// `end` with no open construct.
    UnmatchedEnd,
    /// A definition or control construct left open at end of input.
    UnclosedConstruct,
    /// Procedure defined more than once.
    DuplicateDefinition,
    /// Call to a procedure that is never defined.
    UndefinedProcedure,
    /// Repeat count outside 1..=65535.
    RepeatCountRange,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::UnknownWord => "E001",
            ErrorCode::UnexpectedToken => "E002",
            ErrorCode::TopLevelStatement => "E003",
            ErrorCode::UnmatchedEnd => "E004",
            ErrorCode::UnclosedConstruct => "E005",
            ErrorCode::DuplicateDefinition => "E006",
            ErrorCode::UndefinedProcedure => "E007",
            ErrorCode::RepeatCountRange => "E008",
        };
        write!(f, "{}", code)
    }
}

/// A compiler error with location and message.
///
/// Every diagnostic rejects the compile; the compiler collects them and keeps
/// going so one pass can report several.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    code: ErrorCode,
    span: Span,
    message: String,
}

impl Diagnostic {
    pub fn error(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            span,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render against the source the diagnostic was produced from.
    pub fn render(&self, source: &str) -> String {
        let (line, col) = self.span.line_col(source);
        format!("{}:{}: error[{}]: {}", line, col, self.code, self.message)
    }
}
