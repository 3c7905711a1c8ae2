use crate::errors::VmError;
use crate::word::REGISTER_COUNT;

/// Register file holding the nine general-purpose cells R1..R9.
///
/// A cell stores a raw signed 32-bit value without a tag; register-tagged
/// words index cells by payload (`Rn` is cell `n − 1`).
pub(super) struct Registers {
    cells: [i32; REGISTER_COUNT as usize],
}

impl Registers {
    pub(super) fn new() -> Registers {
        Registers {
            cells: [0; REGISTER_COUNT as usize],
        }
    }

    /// Returns the value in cell `index`.
    ///
    /// Returns [`VmError::InvalidRegisterIndex`] for indexes past R9; those
    /// can only come from a hand-crafted binary.
    pub(super) fn get(&self, index: u32) -> Result<i32, VmError> {
        self.cells
            .get(index as usize)
            .copied()
            .ok_or(VmError::InvalidRegisterIndex { index })
    }

    /// Stores `value` into cell `index`.
    pub(super) fn set(&mut self, index: u32, value: i32) -> Result<(), VmError> {
        let cell = self
            .cells
            .get_mut(index as usize)
            .ok_or(VmError::InvalidRegisterIndex { index })?;
        *cell = value;
        Ok(())
    }
}
