//! Assembled program representation and binary serialization.
//!
//! A [`Program`] is the flat word stream the assembler emits and the VM
//! executes. On disk it is a headerless sequence of 32-bit big-endian
//! words whose final word is the HALT opcode; the file size is therefore
//! always a multiple of 4.

use crate::errors::VmError;
use crate::word::Word;
use std::fs;
use std::path::Path;

/// Flat sequence of tagged words, terminated by a HALT opcode word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    /// Wraps an already-assembled word stream.
    pub fn new(words: Vec<Word>) -> Program {
        Program { words }
    }

    /// Returns the word stream.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Returns the number of words in the stream.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` when the stream holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Serializes the program as big-endian 32-bit words.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.words.len() * 4);
        for word in &self.words {
            out.extend_from_slice(&word.raw().to_be_bytes());
        }
        out
    }

    /// Deserializes a program from big-endian bytes.
    ///
    /// Returns [`VmError::MalformedBinary`] when the byte count is not a
    /// multiple of 4.
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, VmError> {
        if bytes.len() % 4 != 0 {
            return Err(VmError::MalformedBinary { len: bytes.len() });
        }
        let words = bytes
            .chunks_exact(4)
            .map(|chunk| {
                let raw = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                Word::from_raw(raw)
            })
            .collect();
        Ok(Program { words })
    }

    /// Writes the program to `path`.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), VmError> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()).map_err(|e| VmError::IoError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads a program back from `path`.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Program, VmError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| VmError::IoError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Program::from_bytes(&bytes)
    }
}
