use anyhow::{Context, bail};
use mos6502_core::bus::FlatMemoryBus;
use mos6502_core::disassemble::{disassemble_instruction, disassemble_range};
use mos6502_core::{Mos6502, Mos6502System};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub file: PathBuf,
    pub load_address: u16,
    pub start_pc: Option<u16>,
    pub success_pc: Option<u16>,
    pub max_instructions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Trapped { pc: u16, instructions: u64 },
    InstructionLimit,
}

pub fn run_image(config: &RunConfig) -> anyhow::Result<()> {
    let image =
        fs::read(&config.file).with_context(|| format!("reading '{}'", config.file.display()))?;
    if usize::from(config.load_address) + image.len() > 0x10000 {
        bail!(
            "{}-byte image does not fit in memory when loaded at {:04X}",
            image.len(),
            config.load_address
        );
    }

    let mut bus = FlatMemoryBus::new();
    bus.load(config.load_address, &image);

    let mut system = Mos6502::new().connect_bus(bus);
    system.reset();
    system.step_instruction()?;

    if let Some(start_pc) = config.start_pc {
        let mut registers = system.cpu().registers().clone();
        registers.pc = start_pc;
        system.cpu_mut().set_registers(registers);
    }

    log::info!("Running '{}' from {:04X}", config.file.display(), system.cpu().pc());

    match run_until_trap(&mut system, config.max_instructions)? {
        Outcome::Trapped { pc, instructions } => {
            log::info!(
                "Trapped at {pc:04X} after {instructions} instructions, {} cycles",
                system.cpu().total_cycles()
            );

            match config.success_pc {
                Some(success_pc) if success_pc != pc => {
                    for line in disassemble_range(system.bus_mut(), pc.saturating_sub(16), pc) {
                        log::error!("  {line}");
                    }

                    let registers = system.cpu().registers();
                    bail!(
                        "trapped at {pc:04X}, expected {success_pc:04X} (A={:02X} X={:02X} Y={:02X} P={:02X} SP={:02X})",
                        registers.accumulator,
                        registers.x,
                        registers.y,
                        registers.status.to_byte(),
                        registers.sp
                    );
                }
                _ => Ok(()),
            }
        }
        Outcome::InstructionLimit => {
            bail!("no trap after {} instructions", config.max_instructions)
        }
    }
}

// A trap is any instruction that leaves PC where it was, e.g. JMP * or a branch to itself
fn run_until_trap(
    system: &mut Mos6502System<FlatMemoryBus>,
    max_instructions: u64,
) -> anyhow::Result<Outcome> {
    for instructions in 1..=max_instructions {
        let pc = system.cpu().pc();
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", disassemble_instruction(system.bus_mut(), pc));
        }

        system.step_instruction()?;

        if system.cpu().pc() == pc {
            return Ok(Outcome::Trapped { pc, instructions });
        }
    }

    Ok(Outcome::InstructionLimit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_at(origin: u16, program: &[u8]) -> Mos6502System<FlatMemoryBus> {
        let mut bus = FlatMemoryBus::new();
        bus.set_reset_vector(origin);
        bus.load(origin, program);

        let mut system = Mos6502::new().connect_bus(bus);
        system.reset();
        system.step_instruction().unwrap();
        system
    }

    #[test]
    fn stops_on_jump_to_self() {
        // LDA #$01; ADC #$01; JMP *
        let mut system = system_at(0x0400, &[0xA9, 0x01, 0x69, 0x01, 0x4C, 0x04, 0x04]);

        let outcome = run_until_trap(&mut system, 100).unwrap();

        assert_eq!(outcome, Outcome::Trapped { pc: 0x0404, instructions: 3 });
        assert_eq!(system.cpu().registers().accumulator, 0x02);
    }

    #[test]
    fn stops_on_branch_to_self() {
        // BEQ * with Z clear falls through to BNE *
        let mut system = system_at(0x0400, &[0xF0, 0xFE, 0xD0, 0xFE]);

        let outcome = run_until_trap(&mut system, 100).unwrap();

        assert_eq!(outcome, Outcome::Trapped { pc: 0x0402, instructions: 2 });
    }

    #[test]
    fn gives_up_at_instruction_limit() {
        // INX; JMP $0400
        let mut system = system_at(0x0400, &[0xE8, 0x4C, 0x00, 0x04]);

        let outcome = run_until_trap(&mut system, 10).unwrap();

        assert_eq!(outcome, Outcome::InstructionLimit);
        assert_eq!(system.cpu().registers().x, 5);
    }
}
