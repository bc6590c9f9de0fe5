//! Pure register/flag arithmetic shared by the cycle-accurate instruction
//! engine in [`crate::cpu::microcode`].
//!
//! Every function here operates on plain operand bytes and a
//! [`crate::status::ProcessorStatus`]; none of them touch the bus.
//! Addressing and bus timing stay in the microcode layer so these can be
//! unit tested in isolation from cycle sequencing.

pub(crate) mod arithmetic;
pub(crate) mod branches;
pub(crate) mod incr_decr;
pub(crate) mod logical;
pub(crate) mod shifts;
