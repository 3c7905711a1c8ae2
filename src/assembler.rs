//! Assembly language lexer and word-stream encoder.
//!
//! Converts human-readable assembly source into an executable word stream
//! in a single pass. Forward label references are emitted as placeholders
//! and overwritten once the label is declared, so no second pass is needed.
//!
//! # Syntax
//!
//! ```text
//! MOV R1 7        // line comment
//! loop: PUSH R1   /* block comment,
//!                    may span lines */
//! PUSH 1 ADD
//! JMP loop
//! ```
//!
//! - Mnemonics are uppercase (e.g., `PUSH`, `JMPF`)
//! - Registers are `R1`..`R9` (`R0` is reserved and rejected)
//! - Integer literals are decimal, optionally negative, |n| <= 2³⁰−1
//! - A label declaration is an identifier immediately followed by `:`
//! - Jump operands are label names
//! - Whitespace only separates tokens; instructions may span lines
//!
//! Each instruction is emitted as its operand words in source order
//! followed by the opcode word. Operands may also be supplied at runtime
//! from the stack, in which case the instruction is written bare
//! (`PUSH 2 PUSH 3 ADD`). A trailing HALT word is always appended.

use crate::errors::VmError;
use crate::isa::Opcode;
use crate::program::Program;
use crate::word::{INT_MAX_ABS, Word};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const LABEL_SUFFIX: char = ':';

/// File extension for assembly sources.
pub const SOURCE_EXTENSION: &str = "palsm";

/// Lexer state. The cursor advances one byte per step except at
/// `CommitToken`, which consumes no input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Skipping whitespace between tokens.
    Scan,
    /// Inside a `//` comment, waiting for the end of the line.
    LineComment,
    /// Inside a `/* */` comment, waiting for the closing marker.
    BlockComment,
    /// Accumulating a token byte by byte.
    BuildToken,
    /// A complete token is ready to classify.
    CommitToken,
    /// Input exhausted.
    End,
}

/// Instruction whose operands are still being collected.
struct Pending {
    opcode: Opcode,
    params: Vec<Word>,
}

/// Single-pass assembler state: the emitted words, the symbol table and
/// the backpatch list for labels referenced before their declaration.
struct Assembler {
    out: Vec<Word>,
    labels: HashMap<String, usize>,
    backpatches: HashMap<String, Vec<usize>>,
    pending: Option<Pending>,
    line: usize,
}

/// Assembles a source string into an executable program.
///
/// The returned word stream always ends with a HALT opcode word, whether
/// or not the source spelled one out.
pub fn assemble_source(source: &str) -> Result<Program, VmError> {
    Assembler::new().run(source.as_bytes())
}

/// Assembles a `.palsm` file.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Program, VmError> {
    let path = path.as_ref();
    if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
        return Err(VmError::WrongExtension {
            path: path.display().to_string(),
        });
    }
    let source = fs::read_to_string(path).map_err(|e| VmError::IoError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    assemble_source(&source)
}

/// How a token reads as an integer literal.
enum IntToken {
    /// In-range literal.
    Value(i32),
    /// Looks numeric but exceeds the 30-bit bound.
    Overflow,
    /// Not an integer at all.
    NotAnInt,
}

/// Classifies a token as an integer literal: an optional `-` followed by
/// decimal digits.
fn classify_int(token: &str) -> IntToken {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return IntToken::NotAnInt;
    }
    match token.parse::<i64>() {
        Ok(n) if n.unsigned_abs() <= INT_MAX_ABS as u64 => IntToken::Value(n as i32),
        _ => IntToken::Overflow,
    }
}

/// Matches a register token `R1`..`R9` (and the rejected `R0`), returning
/// the digit. Anything else, including `R10`, is not a register token.
fn classify_register(token: &str) -> Option<u32> {
    let bytes = token.as_bytes();
    if bytes.len() == 2 && bytes[0] == b'R' && bytes[1].is_ascii_digit() {
        Some((bytes[1] - b'0') as u32)
    } else {
        None
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

impl Assembler {
    fn new() -> Assembler {
        Assembler {
            out: Vec::new(),
            labels: HashMap::new(),
            backpatches: HashMap::new(),
            pending: None,
            line: 1,
        }
    }

    /// Drives the lexer state machine over the source bytes.
    fn run(mut self, data: &[u8]) -> Result<Program, VmError> {
        let mut state = State::Scan;
        let mut token: Vec<u8> = Vec::new();
        let mut comment_line = 0;
        let mut i = 0usize;

        while state != State::End {
            match state {
                State::Scan => match data.get(i) {
                    None => state = State::End,
                    Some(&b) if is_whitespace(b) => {
                        if b == b'\n' {
                            self.line += 1;
                        }
                        i += 1;
                    }
                    Some(&b'/') if data.get(i + 1) == Some(&b'/') => {
                        i += 2;
                        state = State::LineComment;
                    }
                    Some(&b'/') if data.get(i + 1) == Some(&b'*') => {
                        comment_line = self.line;
                        i += 2;
                        state = State::BlockComment;
                    }
                    Some(&b) => {
                        token.push(b);
                        i += 1;
                        state = State::BuildToken;
                    }
                },
                State::LineComment => match data.get(i) {
                    None => state = State::End,
                    Some(&b'\n') => {
                        self.line += 1;
                        i += 1;
                        state = State::Scan;
                    }
                    Some(_) => i += 1,
                },
                State::BlockComment => match data.get(i) {
                    None => {
                        return Err(VmError::UnterminatedComment { line: comment_line });
                    }
                    Some(&b'*') if data.get(i + 1) == Some(&b'/') => {
                        i += 2;
                        state = State::Scan;
                    }
                    Some(&b) => {
                        if b == b'\n' {
                            self.line += 1;
                        }
                        i += 1;
                    }
                },
                State::BuildToken => match data.get(i) {
                    None => state = State::CommitToken,
                    // The terminating whitespace is left for Scan so
                    // newlines are counted exactly once.
                    Some(&b) if is_whitespace(b) => state = State::CommitToken,
                    Some(&b':') => {
                        token.push(b':');
                        i += 1;
                        state = State::CommitToken;
                    }
                    Some(&b) => {
                        token.push(b);
                        i += 1;
                    }
                },
                State::CommitToken => {
                    let text = String::from_utf8_lossy(&token).into_owned();
                    self.commit(&text)?;
                    token.clear();
                    state = State::Scan;
                }
                State::End => {}
            }
        }

        self.flush()?;
        self.verify_backpatches()?;
        self.out.push(Word::opcode(Opcode::Halt));
        Ok(Program::new(self.out))
    }

    /// Classifies a committed token, in order: label declaration, integer
    /// literal, register, label reference (first operand of a jump),
    /// mnemonic.
    fn commit(&mut self, token: &str) -> Result<(), VmError> {
        if let Some(name) = token.strip_suffix(LABEL_SUFFIX) {
            self.flush()?;
            return self.declare_label(name);
        }

        match classify_int(token) {
            IntToken::Value(value) => return self.push_int_param(token, value),
            IntToken::Overflow => {
                return Err(VmError::IntegerOverflow {
                    line: self.line,
                    literal: token.to_string(),
                });
            }
            IntToken::NotAnInt => {}
        }

        if let Some(digit) = classify_register(token) {
            return self.push_register_param(token, digit);
        }

        if let Some(pending) = &self.pending
            && pending.opcode.operand_rule().wants_label()
            && pending.params.is_empty()
        {
            return self.push_label_param(token);
        }

        let Some(opcode) = Opcode::from_mnemonic(token) else {
            return Err(VmError::UnknownMnemonic {
                line: self.line,
                name: token.to_string(),
            });
        };
        self.flush()?;
        self.pending = Some(Pending {
            opcode,
            params: Vec::with_capacity(opcode.arity()),
        });
        Ok(())
    }

    /// Registers a label at the current emission index and resolves any
    /// references that were waiting on it.
    fn declare_label(&mut self, name: &str) -> Result<(), VmError> {
        if name.is_empty() {
            return Err(VmError::EmptyLabel { line: self.line });
        }
        if self.labels.contains_key(name) {
            return Err(VmError::DuplicateLabel {
                line: self.line,
                label: name.to_string(),
            });
        }
        let index = self.out.len();
        self.labels.insert(name.to_string(), index);

        if let Some(slots) = self.backpatches.remove(name) {
            for slot in slots {
                self.out[slot] = Word::from_raw(index as u32);
            }
        }
        Ok(())
    }

    fn push_int_param(&mut self, token: &str, value: i32) -> Result<(), VmError> {
        let line = self.line;
        let Some(pending) = self.pending.as_mut() else {
            return Err(VmError::UnexpectedOperand {
                line,
                token: token.to_string(),
            });
        };
        if pending.params.len() == pending.opcode.arity() {
            return Err(VmError::UnexpectedOperand {
                line,
                token: token.to_string(),
            });
        }
        let rule = pending.opcode.operand_rule();
        if !rule.allows_int(pending.params.len()) {
            return Err(if rule.wants_label() {
                VmError::LabelExpected { line }
            } else {
                VmError::RegisterExpected { line }
            });
        }
        pending.params.push(Word::int(value)?);
        Ok(())
    }

    fn push_register_param(&mut self, token: &str, digit: u32) -> Result<(), VmError> {
        let line = self.line;
        if digit == 0 {
            return Err(VmError::ZeroRegister { line });
        }
        let Some(pending) = self.pending.as_mut() else {
            return Err(VmError::UnexpectedOperand {
                line,
                token: token.to_string(),
            });
        };
        if !pending.opcode.operand_rule().allows_register() {
            return Err(VmError::LabelExpected { line });
        }
        if pending.params.len() == pending.opcode.arity() {
            return Err(VmError::UnexpectedOperand {
                line,
                token: token.to_string(),
            });
        }
        pending.params.push(Word::register(digit)?);
        Ok(())
    }

    /// Records a label reference: resolved labels are written directly,
    /// unknown ones get a zero placeholder and a backpatch entry for the
    /// word-stream slot this operand will occupy.
    fn push_label_param(&mut self, name: &str) -> Result<(), VmError> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(());
        };
        let slot = self.out.len() + pending.params.len();
        let word = match self.labels.get(name) {
            Some(&index) => Word::from_raw(index as u32),
            None => {
                self.backpatches
                    .entry(name.to_string())
                    .or_default()
                    .push(slot);
                Word::ZERO
            }
        };
        pending.params.push(word);
        Ok(())
    }

    /// Commits the pending instruction: operand words in source order,
    /// then the opcode word. Operands either all come inline or all from
    /// the runtime stack; a partial inline list is an arity error.
    fn flush(&mut self) -> Result<(), VmError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        if !pending.params.is_empty() && pending.params.len() != pending.opcode.arity() {
            return Err(VmError::ArityMismatch {
                line: self.line,
                mnemonic: pending.opcode.mnemonic(),
                expected: pending.opcode.arity(),
                received: pending.params.len(),
            });
        }
        self.out.extend(pending.params);
        self.out.push(Word::opcode(pending.opcode));
        Ok(())
    }

    fn verify_backpatches(&mut self) -> Result<(), VmError> {
        if self.backpatches.is_empty() {
            return Ok(());
        }
        let mut labels: Vec<String> = self.backpatches.keys().cloned().collect();
        labels.sort();
        Err(VmError::UnresolvedLabels { labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Tag;

    fn words_of(source: &str) -> Vec<u32> {
        assemble_source(source)
            .unwrap()
            .words()
            .iter()
            .map(|w| w.raw())
            .collect()
    }

    const OP: u32 = 0x4000_0000;
    const REG: u32 = 0xC000_0000;

    #[test]
    fn empty_source_is_just_halt() {
        assert_eq!(words_of(""), vec![OP]);
    }

    #[test]
    fn whitespace_only_source() {
        assert_eq!(words_of(" \t\r\n  \x0b\x0c"), vec![OP]);
    }

    #[test]
    fn inline_operands() {
        // params first, opcode last, HALT appended
        assert_eq!(words_of("ADD 3 4"), vec![3, 4, OP | 2, OP]);
    }

    #[test]
    fn stack_style_operands() {
        assert_eq!(
            words_of("PUSH 2 PUSH 3 ADD"),
            vec![2, OP | 8, 3, OP | 8, OP | 2, OP]
        );
    }

    #[test]
    fn negative_literal() {
        let words = assemble_source("PUSH -5").unwrap();
        assert_eq!(words.words()[0].tag(), Tag::IntNeg);
        assert_eq!(words.words()[0].as_int(), -5);
    }

    #[test]
    fn explicit_halt_still_gets_terminator() {
        assert_eq!(words_of("HALT"), vec![OP, OP]);
    }

    #[test]
    fn line_comment() {
        assert_eq!(words_of("PEEK // ignored PUSH 1\nHALT"), vec![OP | 1, OP, OP]);
    }

    #[test]
    fn line_comment_at_eof_without_newline() {
        assert_eq!(words_of("PEEK // trailing"), vec![OP | 1, OP]);
    }

    #[test]
    fn block_comment_spans_lines() {
        assert_eq!(
            words_of("PUSH /* one\ntwo\nthree */ 7"),
            vec![7, OP | 8, OP]
        );
    }

    #[test]
    fn unterminated_block_comment() {
        let err = assemble_source("PEEK\n/* never closed\nPEEK").unwrap_err();
        assert!(matches!(err, VmError::UnterminatedComment { line: 2 }));
    }

    #[test]
    fn int_boundaries() {
        assert_eq!(words_of("PUSH 1073741823")[0], 0x3FFF_FFFF);
        let neg = assemble_source("PUSH -1073741823").unwrap();
        assert_eq!(neg.words()[0].as_int(), -1_073_741_823);

        assert!(matches!(
            assemble_source("PUSH 1073741824").unwrap_err(),
            VmError::IntegerOverflow { line: 1, ref literal } if literal == "1073741824"
        ));
        assert!(matches!(
            assemble_source("PUSH -1073741824").unwrap_err(),
            VmError::IntegerOverflow { .. }
        ));
        // too large for any machine integer still reads as numeric
        assert!(matches!(
            assemble_source("PUSH 99999999999999999999").unwrap_err(),
            VmError::IntegerOverflow { .. }
        ));
    }

    #[test]
    fn register_operands() {
        assert_eq!(words_of("POP R1"), vec![REG, OP | 9, OP]);
        // R9 is the last register, cell 8
        assert_eq!(words_of("POP R9"), vec![REG | 8, OP | 9, OP]);
    }

    #[test]
    fn register_zero_rejected() {
        let err = assemble_source("POP R0").unwrap_err();
        assert!(matches!(err, VmError::ZeroRegister { line: 1 }));
    }

    #[test]
    fn register_ten_is_unknown_mnemonic() {
        let err = assemble_source("POP R10").unwrap_err();
        assert!(matches!(
            err,
            VmError::UnknownMnemonic { line: 1, ref name } if name == "R10"
        ));
    }

    #[test]
    fn pop_requires_register() {
        let err = assemble_source("POP 5").unwrap_err();
        assert!(matches!(err, VmError::RegisterExpected { line: 1 }));
    }

    #[test]
    fn mov_destination_must_be_register() {
        let err = assemble_source("MOV 1 2").unwrap_err();
        assert!(matches!(err, VmError::RegisterExpected { line: 1 }));

        // source operand is unrestricted
        assert_eq!(words_of("MOV R1 7"), vec![REG, 7, OP | 10, OP]);
        assert_eq!(words_of("MOV R1 R2"), vec![REG, REG | 1, OP | 10, OP]);
    }

    #[test]
    fn jumps_require_labels() {
        assert!(matches!(
            assemble_source("JMP 3").unwrap_err(),
            VmError::LabelExpected { line: 1 }
        ));
        assert!(matches!(
            assemble_source("JMP R1").unwrap_err(),
            VmError::LabelExpected { line: 1 }
        ));
        assert!(matches!(
            assemble_source("JMPF 3").unwrap_err(),
            VmError::LabelExpected { line: 1 }
        ));
        assert!(matches!(
            assemble_source("JMPF R1").unwrap_err(),
            VmError::LabelExpected { line: 1 }
        ));
    }

    #[test]
    fn backward_label_reference() {
        // "start" is index 0; JMP's operand resolves immediately
        assert_eq!(words_of("start: PEEK JMP start"), vec![OP | 1, 0, OP | 17, OP]);
    }

    #[test]
    fn forward_label_reference_is_backpatched() {
        // end: lands after PEEK, at index 5
        let words = words_of("JMPF end PUSH 42 PEEK end: HALT");
        assert_eq!(
            words,
            vec![5, OP | 18, 42, OP | 8, OP | 1, OP, OP]
        );
    }

    #[test]
    fn forward_reference_from_two_jumps() {
        let words = words_of("JMP out JMPF out out: HALT");
        assert_eq!(words, vec![4, OP | 17, 4, OP | 18, OP, OP]);
    }

    #[test]
    fn label_declaration_flushes_pending_instruction() {
        // PUSH is committed before "end" is assigned an index
        assert_eq!(words_of("PUSH 1 end: JMP end"), vec![1, OP | 8, 2, OP | 17, OP]);
    }

    #[test]
    fn duplicate_label() {
        let err = assemble_source("dup: PEEK\ndup: HALT").unwrap_err();
        assert!(matches!(
            err,
            VmError::DuplicateLabel { line: 2, ref label } if label == "dup"
        ));
    }

    #[test]
    fn empty_label() {
        let err = assemble_source(": HALT").unwrap_err();
        assert!(matches!(err, VmError::EmptyLabel { line: 1 }));
    }

    #[test]
    fn unresolved_labels_are_all_reported() {
        let err = assemble_source("JMP alpha JMPF beta").unwrap_err();
        match err {
            VmError::UnresolvedLabels { labels } => {
                assert_eq!(labels, vec!["alpha".to_string(), "beta".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn arity_mismatch_on_partial_operands() {
        let err = assemble_source("ADD 3 PEEK").unwrap_err();
        assert!(matches!(
            err,
            VmError::ArityMismatch {
                mnemonic: "ADD",
                expected: 2,
                received: 1,
                ..
            }
        ));
    }

    #[test]
    fn arity_mismatch_at_end_of_input() {
        let err = assemble_source("MOV R1").unwrap_err();
        assert!(matches!(
            err,
            VmError::ArityMismatch {
                mnemonic: "MOV",
                expected: 2,
                received: 1,
                ..
            }
        ));
    }

    #[test]
    fn operand_without_command() {
        let err = assemble_source("5 PUSH").unwrap_err();
        assert!(matches!(
            err,
            VmError::UnexpectedOperand { line: 1, ref token } if token == "5"
        ));
    }

    #[test]
    fn operand_past_arity() {
        let err = assemble_source("PUSH 1 2").unwrap_err();
        assert!(matches!(
            err,
            VmError::UnexpectedOperand { line: 1, ref token } if token == "2"
        ));
    }

    #[test]
    fn unknown_mnemonic_reports_line() {
        let err = assemble_source("PEEK\nBOGUS").unwrap_err();
        assert!(matches!(
            err,
            VmError::UnknownMnemonic { line: 2, ref name } if name == "BOGUS"
        ));
    }

    #[test]
    fn lines_counted_through_comments() {
        let err = assemble_source("/* one\ntwo */\nBOGUS").unwrap_err();
        assert!(matches!(err, VmError::UnknownMnemonic { line: 3, .. }));
    }

    #[test]
    fn crlf_counts_one_line() {
        let err = assemble_source("PEEK\r\nBOGUS").unwrap_err();
        assert!(matches!(err, VmError::UnknownMnemonic { line: 2, .. }));
    }

    #[test]
    fn assemble_file_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("prog.palsm");
        std::fs::write(&path, "PUSH 2 PUSH 3 ADD PEEK HALT").unwrap();

        let program = assemble_file(&path).unwrap();
        assert_eq!(program.len(), 8);
    }

    #[test]
    fn assemble_file_requires_extension() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("prog.txt");
        std::fs::write(&path, "HALT").unwrap();

        let err = assemble_file(&path).unwrap_err();
        assert!(matches!(err, VmError::WrongExtension { .. }));
    }

    #[test]
    fn assemble_file_missing() {
        let err = assemble_file("/nonexistent/prog.palsm").unwrap_err();
        assert!(matches!(err, VmError::IoError { .. }));
    }
}
