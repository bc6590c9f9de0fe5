//! ADC, SBC, CMP/CPX/CPY and BIT, as pure accumulator/flag transforms.

use crate::status::ProcessorStatus;

/// Adds `value` and the carry flag into `accumulator`, updating C, V, Z, N.
///
/// Mirrors the real ALU: operands are compared by sign before the add so the
/// overflow flag can be derived without widening past `u8`.
pub(crate) fn adc(status: &mut ProcessorStatus, accumulator: u8, value: u8) -> u8 {
    let same_sign = (accumulator ^ value) & 0x80 == 0;

    let carry_in = status.carry() as u16;
    let wide = accumulator as u16 + value as u16 + carry_in;
    let result = wide as u8;

    status.set_carry(wide > 0xFF);
    status.set_overflow(same_sign && (accumulator ^ result) & 0x80 != 0);
    status.update_zero_negative(result);

    result
}

/// SBC is ADC against the bitwise complement of the operand, a standard
/// 6502 identity: https://forums.nesdev.org/viewtopic.php?t=8703
pub(crate) fn sbc(status: &mut ProcessorStatus, accumulator: u8, value: u8) -> u8 {
    adc(status, accumulator, !value)
}

/// Shared compare semantics for CMP/CPX/CPY: `register - value` without
/// writing the result back, setting C, Z, N from the subtraction.
pub(crate) fn compare(status: &mut ProcessorStatus, register: u8, value: u8) {
    let result = register.wrapping_sub(value);
    status.set_carry(register >= value);
    status.update_zero_negative(result);
}

/// BIT: ANDs `accumulator` with `value` for the zero flag only, and copies
/// bits 7/6 of `value` straight into N/V regardless of the AND result.
pub(crate) fn bit(status: &mut ProcessorStatus, accumulator: u8, value: u8) {
    status.set_zero(accumulator & value == 0);
    status.set_negative(value & 0x80 != 0);
    status.set_overflow(value & 0x40 != 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adc_signed_overflow() {
        let mut status = ProcessorStatus::new();
        let result = adc(&mut status, 0x50, 0x50);
        assert_eq!(result, 0xA0);
        assert!(status.overflow());
        assert!(status.negative());
        assert!(!status.carry());
    }

    #[test]
    fn adc_honors_incoming_carry() {
        let mut status = ProcessorStatus::new();
        status.set_carry(true);
        let result = adc(&mut status, 0x01, 0x01);
        assert_eq!(result, 0x03);
        assert!(!status.carry());
    }

    #[test]
    fn adc_unsigned_carry_out() {
        let mut status = ProcessorStatus::new();
        let result = adc(&mut status, 0xFF, 0x01);
        assert_eq!(result, 0x00);
        assert!(status.carry());
        assert!(status.zero());
        assert!(!status.overflow());
    }

    #[test]
    fn sbc_borrow_clears_carry() {
        let mut status = ProcessorStatus::new();
        status.set_carry(true);
        let result = sbc(&mut status, 0x00, 0x01);
        assert_eq!(result, 0xFF);
        assert!(!status.carry());
    }

    #[test]
    fn compare_sets_carry_when_register_is_larger_or_equal() {
        let mut status = ProcessorStatus::new();
        compare(&mut status, 0x10, 0x10);
        assert!(status.carry());
        assert!(status.zero());
        compare(&mut status, 0x05, 0x10);
        assert!(!status.carry());
    }

    #[test]
    fn bit_copies_top_bits_of_operand_not_result() {
        let mut status = ProcessorStatus::new();
        bit(&mut status, 0x00, 0xC0);
        assert!(status.zero());
        assert!(status.negative());
        assert!(status.overflow());
    }
}
