//! ASL, LSR, ROL, ROR. Each takes the operand byte and returns the shifted
//! result; the carry flag feeds ROL/ROR and is overwritten by the bit shifted
//! out in all four.

use crate::status::ProcessorStatus;

pub(crate) fn asl(status: &mut ProcessorStatus, value: u8) -> u8 {
    let result = value << 1;
    status.set_carry(value & 0x80 != 0);
    status.update_zero_negative(result);
    result
}

pub(crate) fn lsr(status: &mut ProcessorStatus, value: u8) -> u8 {
    let result = value >> 1;
    status.set_carry(value & 0x01 != 0);
    status.update_zero_negative(result);
    result
}

pub(crate) fn rol(status: &mut ProcessorStatus, value: u8) -> u8 {
    let carry_in = status.carry() as u8;
    let result = (value << 1) | carry_in;
    status.set_carry(value & 0x80 != 0);
    status.update_zero_negative(result);
    result
}

pub(crate) fn ror(status: &mut ProcessorStatus, value: u8) -> u8 {
    let carry_in = status.carry() as u8;
    let result = (value >> 1) | (carry_in << 7);
    status.set_carry(value & 0x01 != 0);
    status.update_zero_negative(result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asl_shifts_high_bit_into_carry() {
        let mut status = ProcessorStatus::new();
        assert_eq!(asl(&mut status, 0x81), 0x02);
        assert!(status.carry());
    }

    #[test]
    fn lsr_shifts_low_bit_into_carry() {
        let mut status = ProcessorStatus::new();
        assert_eq!(lsr(&mut status, 0x01), 0x00);
        assert!(status.carry());
        assert!(status.zero());
    }

    #[test]
    fn rol_brings_carry_in_at_the_bottom() {
        let mut status = ProcessorStatus::new();
        status.set_carry(true);
        assert_eq!(rol(&mut status, 0x40), 0x81);
        assert!(!status.carry());
        assert!(status.negative());
    }

    #[test]
    fn ror_brings_carry_in_at_the_top() {
        let mut status = ProcessorStatus::new();
        status.set_carry(true);
        assert_eq!(ror(&mut status, 0x02), 0x81);
        assert!(!status.carry());
        assert!(status.negative());
    }
}
