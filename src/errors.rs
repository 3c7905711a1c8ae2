use thiserror::Error;

/// Errors that can occur during assembly or VM execution.
#[derive(Debug, Error)]
pub enum VmError {
    /// Unrecognized instruction mnemonic during assembly.
    #[error("line {line}: unrecognized command '{name}'")]
    UnknownMnemonic { line: usize, name: String },
    /// Label defined more than once.
    #[error("line {line}: label '{label}' is declared more than once")]
    DuplicateLabel { line: usize, label: String },
    /// Label declaration with no name (a bare `:`).
    #[error("line {line}: label declaration cannot be empty")]
    EmptyLabel { line: usize },
    /// Labels referenced by jumps but never declared.
    #[error("unresolved labels: {labels:?}")]
    UnresolvedLabels { labels: Vec<String> },
    /// Integer literal outside the 30-bit payload range.
    #[error("line {line}: max absolute int value is 1073741823, got '{literal}'")]
    IntegerOverflow { line: usize, literal: String },
    /// The reserved register R0 appeared in source.
    #[error("line {line}: R0 is not a valid register")]
    ZeroRegister { line: usize },
    /// Operand token with no command to attach it to, or one operand too many.
    #[error("line {line}: unexpected operand '{token}'")]
    UnexpectedOperand { line: usize, token: String },
    /// Integer literal where the command requires a register.
    #[error("line {line}: command was expecting a register as its parameter")]
    RegisterExpected { line: usize },
    /// Integer or register where a jump command requires a label.
    #[error("line {line}: a valid label was expected")]
    LabelExpected { line: usize },
    /// Command flushed with only part of its operands supplied.
    #[error("line {line}: {mnemonic} was expecting {expected} parameters, received {received}")]
    ArityMismatch {
        line: usize,
        mnemonic: &'static str,
        expected: usize,
        received: usize,
    },
    /// Block comment still open at end of input.
    #[error("line {line}: block comment is never terminated")]
    UnterminatedComment { line: usize },
    /// Register digit outside 1..=9 handed to the word codec.
    #[error("R{register} is not a valid register")]
    BadRegister { register: u32 },
    /// Register cell index out of bounds at runtime.
    #[error("register index {index} out of bounds")]
    InvalidRegisterIndex { index: u32 },
    /// Integer too large to re-encode into a tagged word.
    #[error("integer {value} does not fit in a tagged word")]
    IntOutOfRange { value: i64 },
    /// Unknown opcode payload encountered in the word stream.
    #[error("invalid opcode {opcode} at word {ip}")]
    InvalidOpcode { opcode: u32, ip: usize },
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Operand stack grew past its fixed capacity.
    #[error("stack overflow: capacity {capacity} exceeded")]
    StackOverflow { capacity: usize },
    /// File or stream I/O failure.
    #[error("{path}: {reason}")]
    IoError { path: String, reason: String },
    /// Binary file whose size is not a whole number of words.
    #[error("binary size {len} is not a multiple of 4")]
    MalformedBinary { len: usize },
    /// Source file without the expected `.palsm` extension.
    #[error("{path}: missing .palsm extension")]
    WrongExtension { path: String },
}
