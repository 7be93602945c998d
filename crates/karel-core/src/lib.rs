//! Core types for the Karel virtual machine.
//!
//! This crate provides foundational types used throughout the compiler and
//! runtime:
//! - Opcode and condition-code encoding for the single instruction head byte
//! - Operand readers for the fixed-length instruction formats
//! - Status codes shared between the interpreter, the facade, and hosts
//! - The symbol table mapping procedure names to bytecode entry points
//! - Source spans and compiler diagnostics

pub mod diagnostic;
pub mod op;
pub mod span;
pub mod status;
pub mod symbols;

// Re-export commonly used types at crate root
pub use diagnostic::{Diagnostic, ErrorCode};
pub use op::{Cond, Head, Op, decode_head, make_head, read_branch_target, read_repeat};
pub use span::{Pos, Span};
pub use status::Status;
pub use symbols::SymbolTable;
