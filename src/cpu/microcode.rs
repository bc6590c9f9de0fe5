//! The per-opcode cycle engine.
//!
//! Everything here runs after [`super::Cpu::step_run`] has already fetched
//! the opcode on cycle 0; these functions only ever see
//! `instruction_cycle >= 1` (for `Mode::Run`) or handle the NMI/IRQ
//! sequence directly. Addressing-mode bus sequences are grouped by the
//! operation's *category* (read-and-compute, store, read-modify-write)
//! since the cycle shape within a category is identical across opcodes —
//! only the effect applied to the final operand differs.

use super::{Cpu, Mode};
use crate::bus::Bus;
use crate::error::CoreError;
use crate::instruction::execution::{arithmetic, branches, incr_decr, logical, shifts};
use crate::instruction::{AddressingMode, Opcode};

/// Runs one cycle of the active NMI/IRQ sequence. Shared because the two
/// interrupts differ only in their vector address and in whether they clear
/// `nmi_pending` or `irq_pending` (already done by the caller before the
/// mode switch).
pub(crate) fn step_interrupt<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    match cpu.interrupt_cycle {
        0 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            cpu.interrupt_cycle = 1;
            Ok(())
        }
        1 => {
            let hi = (cpu.pc >> 8) as u8;
            cpu.push(hi)?;
            cpu.interrupt_cycle = 2;
            Ok(())
        }
        2 => {
            let lo = (cpu.pc & 0xFF) as u8;
            cpu.push(lo)?;
            cpu.interrupt_cycle = 3;
            Ok(())
        }
        3 => {
            let mut snapshot = cpu.status;
            snapshot.set_break_flag(false);
            snapshot.set_unused(true);
            cpu.push(snapshot.bits())?;
            cpu.interrupt_cycle = 4;
            Ok(())
        }
        4 => {
            cpu.status.set_interrupt_disable(true);
            cpu.interrupt_cycle = 5;
            Ok(())
        }
        5 => {
            cpu.bus.set_address(cpu.interrupt_vector());
            cpu.adl = cpu.bus.read()?;
            cpu.interrupt_cycle = 6;
            Ok(())
        }
        6 => {
            cpu.bus.set_address(cpu.interrupt_vector().wrapping_add(1));
            cpu.adh = cpu.bus.read()?;
            cpu.pc = u16::from_le_bytes([cpu.adl, cpu.adh]);
            cpu.mode = Mode::Run;
            cpu.interrupt_cycle = 0;
            cpu.instruction_cycle = 0;
            Ok(())
        }
        cycle => Err(cpu.invalid_cycle(cycle)),
    }
}

/// Dispatches the current opcode's next microcycle.
pub(crate) fn step_instruction<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    let entry = cpu
        .decoded
        .expect("instruction_cycle > 0 implies a decoded opcode");

    use Opcode::*;
    match entry.opcode {
        JSR => jsr(cpu),
        RTS => rts(cpu),
        RTI => rti(cpu),
        BRK => brk(cpu),
        PHA | PHP => push_stack(cpu, entry.opcode),
        PLA | PLP => pull_stack(cpu, entry.opcode),
        JMP => jmp(cpu, entry.addressing_mode),
        BCC | BCS | BEQ | BNE | BMI | BPL | BVC | BVS => branch(cpu, entry.opcode),
        ASL | LSR | ROL | ROR if entry.addressing_mode == AddressingMode::Accumulator => {
            accumulator_shift(cpu, entry.opcode)
        }
        ASL | LSR | ROL | ROR | INC | DEC => rmw(cpu, entry.opcode, entry.addressing_mode),
        STA | STX | STY => store(cpu, entry.opcode, entry.addressing_mode),
        LDA | LDX | LDY | AND | ORA | EOR | ADC | SBC | CMP | CPX | CPY | BIT => {
            read_compute(cpu, entry.opcode, entry.addressing_mode)
        }
        _ => implied(cpu, entry.opcode),
    }
}

fn apply_read<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode, value: u8) {
    use Opcode::*;
    match opcode {
        LDA => {
            cpu.a = value;
            cpu.status.update_zero_negative(cpu.a);
        }
        LDX => {
            cpu.x = value;
            cpu.status.update_zero_negative(cpu.x);
        }
        LDY => {
            cpu.y = value;
            cpu.status.update_zero_negative(cpu.y);
        }
        AND => cpu.a = logical::and(&mut cpu.status, cpu.a, value),
        ORA => cpu.a = logical::ora(&mut cpu.status, cpu.a, value),
        EOR => cpu.a = logical::eor(&mut cpu.status, cpu.a, value),
        ADC => cpu.a = arithmetic::adc(&mut cpu.status, cpu.a, value),
        SBC => cpu.a = arithmetic::sbc(&mut cpu.status, cpu.a, value),
        CMP => arithmetic::compare(&mut cpu.status, cpu.a, value),
        CPX => arithmetic::compare(&mut cpu.status, cpu.x, value),
        CPY => arithmetic::compare(&mut cpu.status, cpu.y, value),
        BIT => arithmetic::bit(&mut cpu.status, cpu.a, value),
        other => unreachable!("{other:?} is not a read/compute opcode"),
    }
}

fn register_value<B: Bus>(cpu: &Cpu<B>, opcode: Opcode) -> u8 {
    match opcode {
        Opcode::STA => cpu.a,
        Opcode::STX => cpu.x,
        Opcode::STY => cpu.y,
        other => unreachable!("{other:?} is not a store opcode"),
    }
}

fn apply_rmw<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode, value: u8) -> u8 {
    match opcode {
        Opcode::ASL => shifts::asl(&mut cpu.status, value),
        Opcode::LSR => shifts::lsr(&mut cpu.status, value),
        Opcode::ROL => shifts::rol(&mut cpu.status, value),
        Opcode::ROR => shifts::ror(&mut cpu.status, value),
        Opcode::INC => incr_decr::inc(&mut cpu.status, value),
        Opcode::DEC => incr_decr::dec(&mut cpu.status, value),
        other => unreachable!("{other:?} is not a read-modify-write opcode"),
    }
}

fn accumulator_shift<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode) -> Result<(), CoreError> {
    let operand = cpu.a;
    cpu.a = apply_rmw(cpu, opcode, operand);
    cpu.finish();
    Ok(())
}

fn implied<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode) -> Result<(), CoreError> {
    use Opcode::*;
    match opcode {
        TAX => {
            cpu.x = cpu.a;
            cpu.status.update_zero_negative(cpu.x);
        }
        TAY => {
            cpu.y = cpu.a;
            cpu.status.update_zero_negative(cpu.y);
        }
        TXA => {
            cpu.a = cpu.x;
            cpu.status.update_zero_negative(cpu.a);
        }
        TYA => {
            cpu.a = cpu.y;
            cpu.status.update_zero_negative(cpu.a);
        }
        TSX => {
            cpu.x = cpu.sp;
            cpu.status.update_zero_negative(cpu.x);
        }
        TXS => cpu.sp = cpu.x,
        INX => cpu.x = incr_decr::inc(&mut cpu.status, cpu.x),
        INY => cpu.y = incr_decr::inc(&mut cpu.status, cpu.y),
        DEX => cpu.x = incr_decr::dec(&mut cpu.status, cpu.x),
        DEY => cpu.y = incr_decr::dec(&mut cpu.status, cpu.y),
        CLC => cpu.status.set_carry(false),
        SEC => cpu.status.set_carry(true),
        CLI => cpu.status.set_interrupt_disable(false),
        SEI => cpu.status.set_interrupt_disable(true),
        CLD => cpu.status.set_decimal(false),
        SED => cpu.status.set_decimal(true),
        CLV => cpu.status.set_overflow(false),
        NOP => {}
        other => unreachable!("{other:?} has no implied-mode handler"),
    }
    cpu.finish();
    Ok(())
}

/// LDA/LDX/LDY/AND/ORA/EOR/ADC/SBC/CMP/CPX/CPY/BIT: resolve the operand
/// address for `mode`, read it, and apply the opcode's effect. Page-cross
/// penalties apply only here, never to stores.
fn read_compute<B: Bus>(
    cpu: &mut Cpu<B>,
    opcode: Opcode,
    mode: AddressingMode,
) -> Result<(), CoreError> {
    let cycle = cpu.instruction_cycle;
    match mode {
        AddressingMode::Immediate => {
            cpu.bus.set_address(cpu.pc);
            let value = cpu.bus.read()?;
            cpu.pc = cpu.pc.wrapping_add(1);
            apply_read(cpu, opcode, value);
            cpu.finish();
            Ok(())
        }
        AddressingMode::Zeropage => match cycle {
            1 => fetch_zp_address(cpu),
            2 => {
                let value = read_zp(cpu, cpu.adl)?;
                apply_read(cpu, opcode, value);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::ZeropageXIndexed | AddressingMode::ZeropageYIndexed => match cycle {
            1 => fetch_zp_base(cpu),
            2 => dummy_read_zp_then_index(cpu, mode),
            3 => {
                let value = read_zp(cpu, cpu.adl)?;
                apply_read(cpu, opcode, value);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::Absolute => match cycle {
            1 => fetch_adl(cpu),
            2 => fetch_adh(cpu),
            3 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let value = cpu.bus.read()?;
                apply_read(cpu, opcode, value);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::AbsoluteXIndexed | AddressingMode::AbsoluteYIndexed => match cycle {
            1 => fetch_adl(cpu),
            2 => fetch_adh_and_index(cpu, mode),
            3 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let value = cpu.bus.read()?;
                if cpu.page_crossed {
                    cpu.adh = cpu.adh.wrapping_add(1);
                    cpu.advance();
                } else {
                    apply_read(cpu, opcode, value);
                    cpu.finish();
                }
                Ok(())
            }
            4 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let value = cpu.bus.read()?;
                apply_read(cpu, opcode, value);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::IndirectXIndexed => match cycle {
            1 => fetch_zp_base(cpu),
            2 => dummy_read_zp_then_index(cpu, AddressingMode::ZeropageXIndexed),
            3 => {
                cpu.op_latch = cpu.adl;
                cpu.adl = read_zp(cpu, cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.adh = read_zp(cpu, cpu.op_latch.wrapping_add(1))?;
                cpu.advance();
                Ok(())
            }
            5 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let value = cpu.bus.read()?;
                apply_read(cpu, opcode, value);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::IndirectYIndexed => match cycle {
            1 => {
                cpu.bus.set_address(cpu.pc);
                cpu.op_latch = cpu.bus.read()?;
                cpu.pc = cpu.pc.wrapping_add(1);
                cpu.advance();
                Ok(())
            }
            2 => {
                cpu.adl = read_zp(cpu, cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            3 => {
                cpu.adh = read_zp(cpu, cpu.op_latch.wrapping_add(1))?;
                let widened = cpu.adl as u16 + cpu.y as u16;
                cpu.page_crossed = widened > 0xFF;
                cpu.adl = widened as u8;
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let value = cpu.bus.read()?;
                if cpu.page_crossed {
                    cpu.adh = cpu.adh.wrapping_add(1);
                    cpu.advance();
                } else {
                    apply_read(cpu, opcode, value);
                    cpu.finish();
                }
                Ok(())
            }
            5 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let value = cpu.bus.read()?;
                apply_read(cpu, opcode, value);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        other => unreachable!("{other:?} has no read/compute addressing shape"),
    }
}

/// STA/STX/STY: resolve the address for `mode` and write the named
/// register. Always pays the "fixed" cycle count — real hardware can't skip
/// the dummy read/fixup cycle just because the store's own write doesn't
/// depend on the value read.
fn store<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode, mode: AddressingMode) -> Result<(), CoreError> {
    let cycle = cpu.instruction_cycle;
    match mode {
        AddressingMode::Zeropage => match cycle {
            1 => fetch_zp_address(cpu),
            2 => {
                let value = register_value(cpu, opcode);
                write_zp(cpu, cpu.adl, value)?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::ZeropageXIndexed | AddressingMode::ZeropageYIndexed => match cycle {
            1 => fetch_zp_base(cpu),
            2 => dummy_read_zp_then_index(cpu, mode),
            3 => {
                let value = register_value(cpu, opcode);
                write_zp(cpu, cpu.adl, value)?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::Absolute => match cycle {
            1 => fetch_adl(cpu),
            2 => fetch_adh(cpu),
            3 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(register_value(cpu, opcode))?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::AbsoluteXIndexed | AddressingMode::AbsoluteYIndexed => match cycle {
            1 => fetch_adl(cpu),
            2 => fetch_adh_and_index(cpu, mode),
            3 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let _ = cpu.bus.read()?;
                if cpu.page_crossed {
                    cpu.adh = cpu.adh.wrapping_add(1);
                }
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(register_value(cpu, opcode))?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::IndirectXIndexed => match cycle {
            1 => fetch_zp_base(cpu),
            2 => dummy_read_zp_then_index(cpu, AddressingMode::ZeropageXIndexed),
            3 => {
                cpu.op_latch = cpu.adl;
                cpu.adl = read_zp(cpu, cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.adh = read_zp(cpu, cpu.op_latch.wrapping_add(1))?;
                cpu.advance();
                Ok(())
            }
            5 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(register_value(cpu, opcode))?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::IndirectYIndexed => match cycle {
            1 => {
                cpu.bus.set_address(cpu.pc);
                cpu.op_latch = cpu.bus.read()?;
                cpu.pc = cpu.pc.wrapping_add(1);
                cpu.advance();
                Ok(())
            }
            2 => {
                cpu.adl = read_zp(cpu, cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            3 => {
                cpu.adh = read_zp(cpu, cpu.op_latch.wrapping_add(1))?;
                let widened = cpu.adl as u16 + cpu.y as u16;
                cpu.page_crossed = widened > 0xFF;
                cpu.adl = widened as u8;
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let _ = cpu.bus.read()?;
                if cpu.page_crossed {
                    cpu.adh = cpu.adh.wrapping_add(1);
                }
                cpu.advance();
                Ok(())
            }
            5 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(register_value(cpu, opcode))?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        other => unreachable!("{other:?} has no store addressing shape"),
    }
}

/// ASL/LSR/ROL/ROR/INC/DEC on memory: read, dummy-write the unmodified
/// value back, then write the modified value. The dummy write is the
/// hardware fingerprint of every RMW instruction.
fn rmw<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode, mode: AddressingMode) -> Result<(), CoreError> {
    let cycle = cpu.instruction_cycle;
    match mode {
        AddressingMode::Zeropage => match cycle {
            1 => fetch_zp_address(cpu),
            2 => {
                cpu.op_latch = read_zp(cpu, cpu.adl)?;
                cpu.advance();
                Ok(())
            }
            3 => {
                write_zp(cpu, cpu.adl, cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            4 => {
                let result = apply_rmw(cpu, opcode, cpu.op_latch);
                write_zp(cpu, cpu.adl, result)?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::ZeropageXIndexed => match cycle {
            1 => fetch_zp_base(cpu),
            2 => dummy_read_zp_then_index(cpu, AddressingMode::ZeropageXIndexed),
            3 => {
                cpu.op_latch = read_zp(cpu, cpu.adl)?;
                cpu.advance();
                Ok(())
            }
            4 => {
                write_zp(cpu, cpu.adl, cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            5 => {
                let result = apply_rmw(cpu, opcode, cpu.op_latch);
                write_zp(cpu, cpu.adl, result)?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::Absolute => match cycle {
            1 => fetch_adl(cpu),
            2 => fetch_adh(cpu),
            3 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.op_latch = cpu.bus.read()?;
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            5 => {
                let result = apply_rmw(cpu, opcode, cpu.op_latch);
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(result)?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::AbsoluteXIndexed => match cycle {
            1 => fetch_adl(cpu),
            2 => fetch_adh_and_index(cpu, mode),
            3 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                let _ = cpu.bus.read()?;
                if cpu.page_crossed {
                    cpu.adh = cpu.adh.wrapping_add(1);
                }
                cpu.advance();
                Ok(())
            }
            4 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.op_latch = cpu.bus.read()?;
                cpu.advance();
                Ok(())
            }
            5 => {
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(cpu.op_latch)?;
                cpu.advance();
                Ok(())
            }
            6 => {
                let result = apply_rmw(cpu, opcode, cpu.op_latch);
                cpu.bus.set_address(u16::from_le_bytes([cpu.adl, cpu.adh]));
                cpu.bus.write(result)?;
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        other => unreachable!("{other:?} has no read-modify-write addressing shape"),
    }
}

fn fetch_zp_address<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    cpu.bus.set_address(cpu.pc);
    cpu.adl = cpu.bus.read()?;
    cpu.pc = cpu.pc.wrapping_add(1);
    cpu.advance();
    Ok(())
}

fn fetch_zp_base<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    cpu.bus.set_address(cpu.pc);
    cpu.op_latch = cpu.bus.read()?;
    cpu.pc = cpu.pc.wrapping_add(1);
    cpu.advance();
    Ok(())
}

fn dummy_read_zp_then_index<B: Bus>(
    cpu: &mut Cpu<B>,
    mode: AddressingMode,
) -> Result<(), CoreError> {
    cpu.bus.set_address(cpu.op_latch as u16);
    let _ = cpu.bus.read()?;
    let index = match mode {
        AddressingMode::ZeropageXIndexed => cpu.x,
        AddressingMode::ZeropageYIndexed => cpu.y,
        other => unreachable!("{other:?} is not a zero-page indexed mode"),
    };
    cpu.adl = cpu.op_latch.wrapping_add(index);
    cpu.advance();
    Ok(())
}

fn fetch_adl<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    cpu.bus.set_address(cpu.pc);
    cpu.adl = cpu.bus.read()?;
    cpu.pc = cpu.pc.wrapping_add(1);
    cpu.advance();
    Ok(())
}

fn fetch_adh<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    cpu.bus.set_address(cpu.pc);
    cpu.adh = cpu.bus.read()?;
    cpu.pc = cpu.pc.wrapping_add(1);
    cpu.advance();
    Ok(())
}

fn fetch_adh_and_index<B: Bus>(cpu: &mut Cpu<B>, mode: AddressingMode) -> Result<(), CoreError> {
    cpu.bus.set_address(cpu.pc);
    cpu.adh = cpu.bus.read()?;
    cpu.pc = cpu.pc.wrapping_add(1);
    let index = match mode {
        AddressingMode::AbsoluteXIndexed => cpu.x,
        AddressingMode::AbsoluteYIndexed => cpu.y,
        other => unreachable!("{other:?} is not an absolute indexed mode"),
    };
    let widened = cpu.adl as u16 + index as u16;
    cpu.page_crossed = widened > 0xFF;
    cpu.adl = widened as u8;
    cpu.advance();
    Ok(())
}

fn read_zp<B: Bus>(cpu: &mut Cpu<B>, address: u8) -> Result<u8, CoreError> {
    cpu.bus.set_address(address as u16);
    cpu.bus.read()
}

fn write_zp<B: Bus>(cpu: &mut Cpu<B>, address: u8, value: u8) -> Result<(), CoreError> {
    cpu.bus.set_address(address as u16);
    cpu.bus.write(value)
}

fn jmp<B: Bus>(cpu: &mut Cpu<B>, mode: AddressingMode) -> Result<(), CoreError> {
    let cycle = cpu.instruction_cycle;
    match mode {
        AddressingMode::Absolute => match cycle {
            1 => fetch_adl(cpu),
            2 => {
                cpu.bus.set_address(cpu.pc);
                cpu.adh = cpu.bus.read()?;
                cpu.pc = u16::from_le_bytes([cpu.adl, cpu.adh]);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        AddressingMode::Indirect => match cycle {
            1 => {
                cpu.bus.set_address(cpu.pc);
                cpu.op_latch = cpu.bus.read()?;
                cpu.pc = cpu.pc.wrapping_add(1);
                cpu.advance();
                Ok(())
            }
            2 => {
                cpu.bus.set_address(cpu.pc);
                cpu.adh = cpu.bus.read()?;
                cpu.pc = cpu.pc.wrapping_add(1);
                cpu.advance();
                Ok(())
            }
            3 => {
                cpu.bus
                    .set_address(u16::from_le_bytes([cpu.op_latch, cpu.adh]));
                cpu.adl = cpu.bus.read()?;
                cpu.advance();
                Ok(())
            }
            4 => {
                // The page-boundary bug: the high byte is fetched from
                // `(pointer & 0xFF00) | (pointer_low + 1)`, never carrying
                // into the pointer's high byte.
                let high_fetch_low = cpu.op_latch.wrapping_add(1);
                cpu.bus
                    .set_address(u16::from_le_bytes([high_fetch_low, cpu.adh]));
                let target_high = cpu.bus.read()?;
                cpu.pc = u16::from_le_bytes([cpu.adl, target_high]);
                cpu.finish();
                Ok(())
            }
            c => Err(cpu.invalid_cycle(c)),
        },
        other => unreachable!("{other:?} is not a JMP addressing mode"),
    }
}

fn jsr<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            cpu.op_latch = cpu.bus.read()?;
            cpu.pc = cpu.pc.wrapping_add(1);
            cpu.advance();
            Ok(())
        }
        2 => {
            // Internal dummy cycle: real hardware peeks the stack here.
            cpu.bus.set_address(0x0100 | cpu.sp as u16);
            let _ = cpu.bus.read()?;
            cpu.advance();
            Ok(())
        }
        3 => {
            let hi = (cpu.pc >> 8) as u8;
            cpu.push(hi)?;
            cpu.advance();
            Ok(())
        }
        4 => {
            let lo = (cpu.pc & 0xFF) as u8;
            cpu.push(lo)?;
            cpu.advance();
            Ok(())
        }
        5 => {
            cpu.bus.set_address(cpu.pc);
            cpu.adh = cpu.bus.read()?;
            cpu.pc = u16::from_le_bytes([cpu.op_latch, cpu.adh]);
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}

fn rts<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            cpu.advance();
            Ok(())
        }
        2 => {
            let _ = cpu.peek_stack()?;
            cpu.advance();
            Ok(())
        }
        3 => {
            cpu.op_latch = cpu.bump_and_pull()?;
            cpu.advance();
            Ok(())
        }
        4 => {
            cpu.adh = cpu.bump_and_pull()?;
            cpu.advance();
            Ok(())
        }
        5 => {
            let returned = u16::from_le_bytes([cpu.op_latch, cpu.adh]);
            cpu.pc = returned.wrapping_add(1);
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}

fn rti<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            cpu.advance();
            Ok(())
        }
        2 => {
            let _ = cpu.peek_stack()?;
            cpu.advance();
            Ok(())
        }
        3 => {
            let pulled = cpu.bump_and_pull()?;
            cpu.status.set_bits(pulled);
            cpu.status.set_break_flag(false);
            cpu.advance();
            Ok(())
        }
        4 => {
            cpu.op_latch = cpu.bump_and_pull()?;
            cpu.advance();
            Ok(())
        }
        5 => {
            cpu.adh = cpu.bump_and_pull()?;
            cpu.pc = u16::from_le_bytes([cpu.op_latch, cpu.adh]);
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}

fn brk<B: Bus>(cpu: &mut Cpu<B>) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            cpu.pc = cpu.pc.wrapping_add(1);
            cpu.advance();
            Ok(())
        }
        2 => {
            let hi = (cpu.pc >> 8) as u8;
            cpu.push(hi)?;
            cpu.advance();
            Ok(())
        }
        3 => {
            let lo = (cpu.pc & 0xFF) as u8;
            cpu.push(lo)?;
            cpu.advance();
            Ok(())
        }
        4 => {
            let mut snapshot = cpu.status;
            snapshot.set_break_flag(true);
            snapshot.set_unused(true);
            cpu.push(snapshot.bits())?;
            cpu.advance();
            Ok(())
        }
        5 => {
            cpu.status.set_interrupt_disable(true);
            cpu.bus.set_address(crate::IRQ_BRK_VECTOR_ADDRESS);
            cpu.adl = cpu.bus.read()?;
            cpu.advance();
            Ok(())
        }
        6 => {
            cpu.bus
                .set_address(crate::IRQ_BRK_VECTOR_ADDRESS.wrapping_add(1));
            cpu.adh = cpu.bus.read()?;
            cpu.pc = u16::from_le_bytes([cpu.adl, cpu.adh]);
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}

fn push_stack<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            cpu.advance();
            Ok(())
        }
        2 => {
            let value = match opcode {
                Opcode::PHA => cpu.a,
                Opcode::PHP => {
                    let mut snapshot = cpu.status;
                    snapshot.set_break_flag(true);
                    snapshot.set_unused(true);
                    snapshot.bits()
                }
                other => unreachable!("{other:?} is not a push opcode"),
            };
            cpu.push(value)?;
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}

fn pull_stack<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            cpu.advance();
            Ok(())
        }
        2 => {
            let _ = cpu.peek_stack()?;
            cpu.advance();
            Ok(())
        }
        3 => {
            let value = cpu.bump_and_pull()?;
            match opcode {
                Opcode::PLA => {
                    cpu.a = value;
                    cpu.status.update_zero_negative(cpu.a);
                }
                Opcode::PLP => {
                    cpu.status.set_bits(value);
                    cpu.status.set_break_flag(false);
                }
                other => unreachable!("{other:?} is not a pull opcode"),
            }
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}

fn branch<B: Bus>(cpu: &mut Cpu<B>, opcode: Opcode) -> Result<(), CoreError> {
    match cpu.instruction_cycle {
        1 => {
            cpu.bus.set_address(cpu.pc);
            let offset = cpu.bus.read()? as i8;
            cpu.pc = cpu.pc.wrapping_add(1);
            if !branches::taken(opcode, cpu.status) {
                cpu.finish();
                return Ok(());
            }
            let target = cpu.pc.wrapping_add(offset as i16 as u16);
            cpu.page_crossed = (cpu.pc & 0xFF00) != (target & 0xFF00);
            cpu.adl = (target & 0xFF) as u8;
            cpu.adh = (target >> 8) as u8;
            cpu.advance();
            Ok(())
        }
        2 => {
            cpu.bus.set_address(cpu.pc);
            let _ = cpu.bus.read()?;
            let target = u16::from_le_bytes([cpu.adl, cpu.adh]);
            if cpu.page_crossed {
                cpu.advance();
            } else {
                cpu.pc = target;
                cpu.finish();
            }
            Ok(())
        }
        3 => {
            let target = u16::from_le_bytes([cpu.adl, cpu.adh]);
            cpu.bus.set_address(target);
            let _ = cpu.bus.read()?;
            cpu.pc = target;
            cpu.finish();
            Ok(())
        }
        c => Err(cpu.invalid_cycle(c)),
    }
}
