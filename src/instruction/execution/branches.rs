//! Branch-condition evaluation, kept separate from the cycle engine so the
//! extra-cycle-on-taken/page-cross timing in the microcode layer only has to
//! ask a single yes/no question.

use crate::instruction::Opcode;
use crate::status::ProcessorStatus;

/// Whether the named branch opcode's condition holds against `status`.
///
/// Panics if handed a non-branch opcode; the decode table never produces one
/// here, so this is an internal contract rather than user-facing validation.
pub(crate) fn taken(opcode: Opcode, status: ProcessorStatus) -> bool {
    match opcode {
        Opcode::BCC => !status.carry(),
        Opcode::BCS => status.carry(),
        Opcode::BEQ => status.zero(),
        Opcode::BNE => !status.zero(),
        Opcode::BMI => status.negative(),
        Opcode::BPL => !status.negative(),
        Opcode::BVC => !status.overflow(),
        Opcode::BVS => status.overflow(),
        other => unreachable!("{other:?} is not a branch opcode"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bne_follows_zero_flag() {
        let mut status = ProcessorStatus::new();
        assert!(taken(Opcode::BNE, status));
        status.set_zero(true);
        assert!(!taken(Opcode::BNE, status));
    }

    #[test]
    fn bcs_follows_carry_flag() {
        let mut status = ProcessorStatus::new();
        assert!(!taken(Opcode::BCS, status));
        status.set_carry(true);
        assert!(taken(Opcode::BCS, status));
    }
}
