//! INC/DEC and their register-only siblings INX/INY/DEX/DEY, all of which
//! wrap at the byte boundary and update Z/N from the result.

use crate::status::ProcessorStatus;

pub(crate) fn inc(status: &mut ProcessorStatus, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    status.update_zero_negative(result);
    result
}

pub(crate) fn dec(status: &mut ProcessorStatus, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    status.update_zero_negative(result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inc_wraps_past_255() {
        let mut status = ProcessorStatus::new();
        assert_eq!(inc(&mut status, 0xFF), 0x00);
        assert!(status.zero());
    }

    #[test]
    fn dec_wraps_past_zero() {
        let mut status = ProcessorStatus::new();
        assert_eq!(dec(&mut status, 0x00), 0xFF);
        assert!(status.negative());
    }
}
