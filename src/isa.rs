//! Instruction Set Architecture (ISA) definitions.
//!
//! Defines the VM's opcode table. The [`for_each_opcode!`](crate::for_each_opcode)
//! macro holds the canonical opcode definitions and invokes a callback macro
//! for code generation, so multiple modules can generate opcode-related code
//! without duplicating the table.
//!
//! This module generates:
//! - The [`Opcode`] enum with payload values
//! - `TryFrom<u32>` for decoding opcode payloads
//! - Per-opcode `mnemonic`, `arity` and [`OperandRule`] accessors
//!
//! # Word Format
//!
//! Every instruction-stream entry is one 32-bit tagged word (see
//! [`word`](crate::word)). An instruction is emitted as its operand words in
//! source order followed by the opcode word, so the VM consumes operands in
//! reverse-Polish order.

use crate::errors::VmError;

/// What kinds of operand tokens a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandRule {
    /// Integer literals and registers are both fine at any position.
    Any,
    /// Every operand must be a register.
    RegisterOnly,
    /// The first operand must be a register; the rest are unrestricted.
    RegisterFirst,
    /// The single operand must be a label name.
    LabelOnly,
}

impl OperandRule {
    /// Returns `true` when an integer literal may fill operand slot `index`.
    pub const fn allows_int(self, index: usize) -> bool {
        match self {
            OperandRule::Any => true,
            OperandRule::RegisterOnly | OperandRule::LabelOnly => false,
            OperandRule::RegisterFirst => index > 0,
        }
    }

    /// Returns `true` when a register may fill any operand slot.
    pub const fn allows_register(self) -> bool {
        !matches!(self, OperandRule::LabelOnly)
    }

    /// Returns `true` when the command's operand is a label reference.
    pub const fn wants_label(self) -> bool {
        matches!(self, OperandRule::LabelOnly)
    }
}

/// Invokes a callback macro with the complete opcode definition list.
///
/// Each entry is `Name = payload, "MNEMONIC" => arity, operand-rule`.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// HALT ; stop execution and print the halt banner
            Halt = 0, "HALT" => 0, Any,
            /// PEEK ; print the top of the stack without consuming it
            Peek = 1, "PEEK" => 0, Any,
            /// ADD a b ; a + b
            Add = 2, "ADD" => 2, Any,
            /// SUB a b ; a - b
            Sub = 3, "SUB" => 2, Any,
            /// MUL a b ; a * b
            Mul = 4, "MUL" => 2, Any,
            /// DIV a b ; a / b (trap on division by zero)
            Div = 5, "DIV" => 2, Any,
            /// AND a b ; flag = (a & b) != 0
            And = 6, "AND" => 2, Any,
            /// OR a b ; flag = (a | b) != 0
            Or = 7, "OR" => 2, Any,
            /// PUSH x ; evaluate one operand and push the result
            Push = 8, "PUSH" => 1, Any,
            /// POP r ; pop a value into register r
            Pop = 9, "POP" => 1, RegisterOnly,
            /// MOV r x ; r = x
            Mov = 10, "MOV" => 2, RegisterFirst,
            /// EQ a b ; flag = (a == b)
            Eq = 11, "EQ" => 2, Any,
            /// NEQ a b ; flag = (a != b)
            Neq = 12, "NEQ" => 2, Any,
            /// GT a b ; flag = (a > b)
            Gt = 13, "GT" => 2, Any,
            /// LT a b ; flag = (a < b)
            Lt = 14, "LT" => 2, Any,
            /// GTE a b ; flag = (a >= b)
            Gte = 15, "GTE" => 2, Any,
            /// LTE a b ; flag = (a <= b)
            Lte = 16, "LTE" => 2, Any,
            /// JMP label ; jump to the label's word-stream index
            Jmp = 17, "JMP" => 1, LabelOnly,
            /// JMPF label ; jump to the label if the flag is set
            Jmpf = 18, "JMPF" => 1, LabelOnly,
        }
    };
}

macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $value:literal, $mnemonic:literal => $arity:literal, $rule:ident
        ),* $(,)?
    ) => {
        /// VM opcode, stored in the payload of an opcode-tagged word.
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $value,
            )*
        }

        impl TryFrom<u32> for Opcode {
            type Error = VmError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Opcode::$name), )*
                    _ => Err(VmError::InvalidOpcode {
                        opcode: value,
                        ip: 0,
                    }),
                }
            }
        }

        impl Opcode {
            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns how many operand words precede this opcode.
            pub const fn arity(&self) -> usize {
                match self {
                    $( Opcode::$name => $arity, )*
                }
            }

            /// Returns the operand-kind rule the assembler enforces.
            pub const fn operand_rule(&self) -> OperandRule {
                match self {
                    $( Opcode::$name => OperandRule::$rule, )*
                }
            }

            /// Looks an opcode up by its assembly mnemonic.
            pub fn from_mnemonic(name: &str) -> Option<Opcode> {
                match name {
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);
