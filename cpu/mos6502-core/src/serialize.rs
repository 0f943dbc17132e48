use crate::Mos6502;
use bincode::config::{Fixint, LittleEndian};
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use std::io;
use std::io::{BufReader, BufWriter, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("error saving state: {source}")]
    Serialization {
        #[from]
        source: EncodeError,
    },
    #[error("error loading state: {source}")]
    Deserialization {
        #[from]
        source: DecodeError,
    },
    #[error("I/O error flushing state: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

const BINCODE_CONFIG: bincode::config::Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_little_endian().with_fixed_int_encoding();

/// Write the CPU followed by the bus. An instruction in flight is saved along with its remaining
/// cycles.
pub fn save_state<B, W>(cpu: &Mos6502, bus: &B, writer: W) -> Result<(), SaveStateError>
where
    B: Encode,
    W: io::Write,
{
    let mut writer = BufWriter::new(writer);

    bincode::encode_into_std_write(cpu, &mut writer, BINCODE_CONFIG)?;
    bincode::encode_into_std_write(bus, &mut writer, BINCODE_CONFIG)?;
    writer.flush()?;

    Ok(())
}

pub fn load_state<B, R>(reader: R) -> Result<(Mos6502, B), SaveStateError>
where
    B: Decode<()>,
    R: io::Read,
{
    let mut reader = BufReader::new(reader);

    let cpu = bincode::decode_from_std_read(&mut reader, BINCODE_CONFIG)?;
    let bus = bincode::decode_from_std_read(&mut reader, BINCODE_CONFIG)?;

    Ok((cpu, bus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatMemoryBus;

    #[test]
    fn restores_cpu_mid_instruction() {
        let mut bus = FlatMemoryBus::new();
        bus.set_reset_vector(0x0400);
        bus.load(0x0400, &[0xA9, 0x42, 0x8D, 0x00, 0x02]);

        let mut system = Mos6502::new().connect_bus(bus);
        system.reset();
        system.step_instruction().unwrap();
        system.clock_tick().unwrap();
        system.clock_tick().unwrap();
        assert!(system.cpu().is_mid_instruction());

        let mut saved = Vec::new();
        save_state(system.cpu(), system.bus(), &mut saved).unwrap();

        let (cpu, bus): (Mos6502, FlatMemoryBus) = load_state(saved.as_slice()).unwrap();
        assert_eq!(cpu.registers(), system.cpu().registers());
        assert_eq!(cpu.clock_cycles_remaining(), system.cpu().clock_cycles_remaining());
        assert_eq!(cpu.current_opcode(), Some(0xA9));
        assert_eq!(&bus, system.bus());

        // Both copies finish the in-flight instruction and run the store identically
        let mut restored = cpu.connect_bus(bus);
        let running_ticks = system.step_instruction().unwrap();
        let restored_ticks = restored.step_instruction().unwrap();
        assert_eq!(running_ticks, restored_ticks);

        system.step_instruction().unwrap();
        restored.step_instruction().unwrap();
        assert_eq!(restored.bus().as_slice()[0x0200], 0x42);
        assert_eq!(restored.cpu().total_cycles(), system.cpu().total_cycles());
    }

    #[test]
    fn truncated_state_is_an_error() {
        let mut saved = Vec::new();
        save_state(&Mos6502::new(), &FlatMemoryBus::new(), &mut saved).unwrap();
        saved.truncate(saved.len() / 2);

        let result: Result<(Mos6502, FlatMemoryBus), _> = load_state(saved.as_slice());
        assert!(matches!(result, Err(SaveStateError::Deserialization { .. })));
    }
}
