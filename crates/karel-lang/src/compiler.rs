use smallvec::SmallVec;

use karel_core::{Cond, Diagnostic, ErrorCode, Op, Span, SymbolTable, make_head};

use crate::output::OutputBuffer;
use crate::token::{Keyword, Token, is_identifier, keyword, tokenize};

/// A compiled program ready for the interpreter.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    /// The bytecode image. Offset 0 holds the reserved RETN halt target.
    pub code: Vec<u8>,
    /// Procedure name → entry offset.
    pub symbols: SymbolTable,
}

/// Compile Karel source text.
///
/// Compilation keeps going past errors where it can; any error fails the
/// compile and the collected diagnostics are returned instead.
pub fn compile(source: &str) -> Result<CompiledProgram, Vec<Diagnostic>> {
    Compiler::new(source).compile()
}

/// Open nesting constructs tracked during the single pass.
enum ConstructKind {
    Define,
    /// `if` awaiting its end (or else) target patch.
    If { end_patch: usize },
    /// `else` awaiting its end target patch.
    Else { end_patch: usize },
    /// `while` remembering its condition head and awaiting the exit patch.
    While { head: usize, exit_patch: usize },
    /// `repeat` remembering the loop top; the REPEAT instruction is emitted
    /// at the matching `end`, below the body, pointing back up.
    Repeat { loop_top: usize, count: u16 },
}

struct Construct {
    kind: ConstructKind,
    open_span: Span,
}

/// A call site awaiting a not-yet-defined procedure.
struct Fixup {
    patch: usize,
    name: String,
    span: Span,
}

struct Compiler<'a> {
    tokens: Vec<Token<'a>>,
    index: usize,
    output: OutputBuffer,
    constructs: SmallVec<[Construct; 8]>,
    symbols: SymbolTable,
    fixups: Vec<Fixup>,
    errors: Vec<Diagnostic>,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            tokens: tokenize(source),
            index: 0,
            output: OutputBuffer::new(),
            constructs: SmallVec::new(),
            symbols: SymbolTable::new(),
            fixups: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn compile(mut self) -> Result<CompiledProgram, Vec<Diagnostic>> {
        // Offset 0 is the synthetic halt target the interrupt mechanism
        // fetches from; it must decode as RETN.
        self.output.emit(make_head(Op::Retn, Cond::None, false));

        while let Some(token) = self.next() {
            self.compile_token(token);
        }

        while let Some(construct) = self.constructs.pop() {
            self.errors.push(Diagnostic::error(
                ErrorCode::UnclosedConstruct,
                construct.open_span,
                "construct is never closed with 'end'",
            ));
        }

        self.resolve_fixups();

        if self.errors.is_empty() {
            Ok(CompiledProgram {
                code: self.output.finish(),
                symbols: self.symbols,
            })
        } else {
            Err(self.errors)
        }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.index).copied();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.errors.push(Diagnostic::error(code, span, message));
    }

    fn in_definition(&self) -> bool {
        !self.constructs.is_empty()
    }

    fn require_definition(&mut self, token: Token<'a>) -> bool {
        if self.in_definition() {
            true
        } else {
            self.error(
                ErrorCode::TopLevelStatement,
                token.span,
                format!("'{}' is only allowed inside a definition", token.text),
            );
            false
        }
    }

    fn compile_token(&mut self, token: Token<'a>) {
        match keyword(token.text) {
            Some(Keyword::Define) => self.begin_define(token),
            Some(Keyword::End) => self.end_construct(token),
            Some(Keyword::Step) => self.emit_primitive(Op::Step, token),
            Some(Keyword::Left) => self.emit_primitive(Op::Left, token),
            Some(Keyword::PickUp) => self.emit_primitive(Op::PickUp, token),
            Some(Keyword::Place) => self.emit_primitive(Op::Place, token),
            Some(Keyword::Stop) => self.emit_primitive(Op::Stop, token),
            Some(Keyword::Repeat) => self.begin_repeat(token),
            Some(Keyword::If) => self.begin_if(token),
            Some(Keyword::Else) => self.begin_else(token),
            Some(Keyword::While) => self.begin_while(token),
            Some(_) => self.error(
                ErrorCode::UnexpectedToken,
                token.span,
                format!("'{}' is out of place here", token.text),
            ),
            None => {
                if token.text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    self.error(
                        ErrorCode::UnexpectedToken,
                        token.span,
                        "a count is only allowed after 'repeat'",
                    );
                } else if is_identifier(token.text) {
                    self.emit_call(token);
                } else {
                    self.error(
                        ErrorCode::UnknownWord,
                        token.span,
                        format!("unknown word '{}'", token.text),
                    );
                }
            }
        }
    }

    fn begin_define(&mut self, token: Token<'a>) {
        if self.in_definition() {
            self.error(
                ErrorCode::UnexpectedToken,
                token.span,
                "definitions cannot nest",
            );
            return;
        }

        let name = match self.next() {
            Some(name) if keyword(name.text).is_none() && is_identifier(name.text) => name,
            Some(name) => {
                self.error(
                    ErrorCode::UnexpectedToken,
                    name.span,
                    format!("'{}' cannot be used as a procedure name", name.text),
                );
                return;
            }
            None => {
                self.error(
                    ErrorCode::UnexpectedToken,
                    token.span,
                    "'define' needs a procedure name",
                );
                return;
            }
        };

        if self.symbols.lookup(name.text).is_some() {
            self.error(
                ErrorCode::DuplicateDefinition,
                name.span,
                format!("procedure '{}' is already defined", name.text),
            );
        } else {
            self.symbols.insert(name.text, self.output.len() as u32);
        }

        self.constructs.push(Construct {
            kind: ConstructKind::Define,
            open_span: token.span,
        });
    }

    fn emit_primitive(&mut self, op: Op, token: Token<'a>) {
        if self.require_definition(token) {
            self.output.emit(make_head(op, Cond::None, false));
        }
    }

    fn emit_call(&mut self, token: Token<'a>) {
        if !self.require_definition(token) {
            return;
        }
        self.output.emit(make_head(Op::BranchLinked, Cond::None, false));
        match self.symbols.lookup(token.text) {
            Some(entry) => self.output.emit_u32(entry),
            None => {
                let patch = self.output.reserve(4);
                self.fixups.push(Fixup {
                    patch,
                    name: token.text.to_owned(),
                    span: token.span,
                });
            }
        }
    }

    fn begin_repeat(&mut self, token: Token<'a>) {
        if !self.require_definition(token) {
            return;
        }

        let count = match self.next() {
            Some(count_token) => match count_token.text.parse::<u32>() {
                Ok(n) if (1..=u16::MAX as u32).contains(&n) => n as u16,
                Ok(n) => {
                    self.error(
                        ErrorCode::RepeatCountRange,
                        count_token.span,
                        format!("repeat count {} is outside 1..={}", n, u16::MAX),
                    );
                    1
                }
                Err(_) => {
                    self.error(
                        ErrorCode::UnexpectedToken,
                        count_token.span,
                        format!("expected a repeat count, found '{}'", count_token.text),
                    );
                    1
                }
            },
            None => {
                self.error(
                    ErrorCode::UnexpectedToken,
                    token.span,
                    "'repeat' needs a count",
                );
                return;
            }
        };

        self.expect_keyword(Keyword::Times, "times", token.span);

        self.constructs.push(Construct {
            kind: ConstructKind::Repeat {
                loop_top: self.output.len(),
                count,
            },
            open_span: token.span,
        });
    }

    fn begin_if(&mut self, token: Token<'a>) {
        if !self.require_definition(token) {
            return;
        }
        let Some((cond, invert)) = self.parse_condition(token.span) else {
            return;
        };
        self.expect_keyword(Keyword::Then, "then", token.span);

        // Branch over the then-block when the source condition is false.
        self.output.emit(make_head(Op::Branch, cond, !invert));
        let end_patch = self.output.reserve(4);
        self.constructs.push(Construct {
            kind: ConstructKind::If { end_patch },
            open_span: token.span,
        });
    }

    fn begin_else(&mut self, token: Token<'a>) {
        match self.constructs.pop() {
            Some(Construct {
                kind: ConstructKind::If { end_patch },
                open_span,
            }) => {
                // Close the then-block with a jump over the else-block, then
                // point the if-branch at the else body.
                self.output.emit(make_head(Op::Branch, Cond::None, false));
                let else_end_patch = self.output.reserve(4);
                self.output.patch_u32(end_patch, self.output.len() as u32);
                self.constructs.push(Construct {
                    kind: ConstructKind::Else {
                        end_patch: else_end_patch,
                    },
                    open_span,
                });
            }
            other => {
                if let Some(construct) = other {
                    self.constructs.push(construct);
                }
                self.error(
                    ErrorCode::UnexpectedToken,
                    token.span,
                    "'else' without a matching 'if'",
                );
            }
        }
    }

    fn begin_while(&mut self, token: Token<'a>) {
        if !self.require_definition(token) {
            return;
        }
        let head = self.output.len();
        let Some((cond, invert)) = self.parse_condition(token.span) else {
            return;
        };
        self.expect_keyword(Keyword::Do, "do", token.span);

        // Exit the loop when the source condition is false.
        self.output.emit(make_head(Op::Branch, cond, !invert));
        let exit_patch = self.output.reserve(4);
        self.constructs.push(Construct {
            kind: ConstructKind::While { head, exit_patch },
            open_span: token.span,
        });
    }

    fn end_construct(&mut self, token: Token<'a>) {
        let Some(construct) = self.constructs.pop() else {
            self.error(
                ErrorCode::UnmatchedEnd,
                token.span,
                "'end' without an open construct",
            );
            return;
        };

        match construct.kind {
            ConstructKind::Define => {
                self.output.emit(make_head(Op::Retn, Cond::None, false));
            }
            ConstructKind::If { end_patch } | ConstructKind::Else { end_patch } => {
                self.output.patch_u32(end_patch, self.output.len() as u32);
            }
            ConstructKind::While { head, exit_patch } => {
                self.output.emit(make_head(Op::Branch, Cond::None, false));
                self.output.emit_u32(head as u32);
                self.output.patch_u32(exit_patch, self.output.len() as u32);
            }
            ConstructKind::Repeat { loop_top, count } => {
                self.output.emit(make_head(Op::Repeat, Cond::None, false));
                self.output.emit_u32(loop_top as u32);
                self.output.emit_u16(count);
            }
        }
    }

    /// Parse `[not]* <condition-word>`. Each `not` toggles the invert flag.
    fn parse_condition(&mut self, opener: Span) -> Option<(Cond, bool)> {
        let mut invert = false;
        loop {
            let Some(token) = self.next() else {
                self.error(ErrorCode::UnexpectedToken, opener, "expected a condition");
                return None;
            };
            let cond = match keyword(token.text) {
                Some(Keyword::Not) => {
                    invert = !invert;
                    continue;
                }
                Some(Keyword::Wall) => Cond::IsWall,
                Some(Keyword::Flag) => Cond::IsFlag,
                Some(Keyword::Home) => Cond::IsHome,
                Some(Keyword::North) => Cond::IsNorth,
                Some(Keyword::West) => Cond::IsWest,
                Some(Keyword::South) => Cond::IsSouth,
                Some(Keyword::East) => Cond::IsEast,
                _ => {
                    self.error(
                        ErrorCode::UnexpectedToken,
                        token.span,
                        format!("expected a condition, found '{}'", token.text),
                    );
                    return None;
                }
            };
            return Some((cond, invert));
        }
    }

    fn expect_keyword(&mut self, expected: Keyword, name: &str, opener: Span) {
        match self.next() {
            Some(token) if keyword(token.text) == Some(expected) => {}
            Some(token) => self.error(
                ErrorCode::UnexpectedToken,
                token.span,
                format!("expected '{}', found '{}'", name, token.text),
            ),
            None => self.error(
                ErrorCode::UnexpectedToken,
                opener,
                format!("expected '{}'", name),
            ),
        }
    }

    /// Patch call sites that referenced procedures defined later.
    fn resolve_fixups(&mut self) {
        let fixups = std::mem::take(&mut self.fixups);
        for fixup in fixups {
            match self.symbols.lookup(&fixup.name) {
                Some(entry) => self.output.patch_u32(fixup.patch, entry),
                None => self.error(
                    ErrorCode::UndefinedProcedure,
                    fixup.span,
                    format!("procedure '{}' is never defined", fixup.name),
                ),
            }
        }
    }
}
