//! Runs single-instruction test vectors in the format of
//! <https://github.com/TomHarte/ProcessorTests>

use anyhow::{Context, anyhow};
use clap::Parser;
use env_logger::Env;
use flate2::read::GzDecoder;
use m68k_emu::bus::InMemoryBus;
use m68k_emu::traits::BusInterface;
use m68k_emu::{AlignmentPolicy, CpuModel, EngineConfig, M68k, StopSignal};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
struct Args {
    /// Test files (.json or .json.gz)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// CPU model to run the tests against
    #[arg(long, default_value_t = CpuModel::M68000)]
    model: CpuModel,

    /// Bytes the recorded final PC runs ahead of the next instruction, for vectors captured
    /// from a core with a prefetch queue
    #[arg(long, default_value_t = 4)]
    prefetch_offset: u32,

    /// Print the disassembly and register diff of every failing test
    #[arg(long, default_value_t)]
    verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct State {
    d0: u32,
    d1: u32,
    d2: u32,
    d3: u32,
    d4: u32,
    d5: u32,
    d6: u32,
    d7: u32,
    a0: u32,
    a1: u32,
    a2: u32,
    a3: u32,
    a4: u32,
    a5: u32,
    a6: u32,
    usp: u32,
    ssp: u32,
    sr: u16,
    pc: u32,
    prefetch: [u16; 2],
    ram: Vec<(u32, u8)>,
}

macro_rules! diff_fields {
    ($actual:expr, $expected:expr, [$($field:ident),*]) => {
        $(
            if $actual.$field != $expected.$field {
                log::info!(
                    "  {}: actual={:08X}, expected={:08X}",
                    stringify!($field),
                    $actual.$field,
                    $expected.$field
                );
            }
        )*
    }
}

impl State {
    fn capture(cpu: &M68k, bus: &mut InMemoryBus, expected: &State, prefetch_offset: u32) -> Self {
        let [d0, d1, d2, d3, d4, d5, d6, d7] = cpu.data_registers();
        let [a0, a1, a2, a3, a4, a5, a6] = cpu.address_registers();

        let ram =
            expected.ram.iter().map(|&(address, _)| (address, bus.read_byte(address))).collect();

        Self {
            d0,
            d1,
            d2,
            d3,
            d4,
            d5,
            d6,
            d7,
            a0,
            a1,
            a2,
            a3,
            a4,
            a5,
            a6,
            usp: cpu.user_stack_pointer(),
            ssp: cpu.supervisor_stack_pointer(),
            sr: cpu.status_register(),
            pc: cpu.pc_address().wrapping_add(prefetch_offset),
            prefetch: expected.prefetch,
            ram,
        }
    }

    fn diff(&self, expected: &Self) {
        diff_fields!(
            self,
            expected,
            [d0, d1, d2, d3, d4, d5, d6, d7, a0, a1, a2, a3, a4, a5, a6, usp, ssp, sr, pc]
        );

        for (&(address, actual), &(_, expected)) in self.ram.iter().zip(&expected.ram) {
            if actual != expected {
                log::info!("  {address:08X}: actual={actual:02X}, expected={expected:02X}");
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TestDescription {
    name: String,
    initial: State,
    #[serde(rename = "final")]
    final_state: State,
}

#[derive(Debug, Default)]
struct Summary {
    total: usize,
    failures: usize,
    unmapped: usize,
}

fn load_tests(path: &Path) -> anyhow::Result<Vec<TestDescription>> {
    let file = BufReader::new(
        File::open(path).with_context(|| format!("opening {}", path.display()))?,
    );

    let file_ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
    let reader: Box<dyn Read> = match file_ext {
        "json" => Box::new(file),
        "gz" => Box::new(GzDecoder::new(file)),
        _ => return Err(anyhow!("unsupported file extension: '{file_ext}'")),
    };

    serde_json::from_reader(reader).with_context(|| format!("parsing {}", path.display()))
}

fn init_test_state(config: EngineConfig, state: &State, bus: &mut InMemoryBus) -> M68k {
    let mut cpu = M68k::new(config);

    cpu.set_data_registers([
        state.d0, state.d1, state.d2, state.d3, state.d4, state.d5, state.d6, state.d7,
    ]);
    cpu.set_address_registers([
        state.a0, state.a1, state.a2, state.a3, state.a4, state.a5, state.a6,
    ]);
    // SR first so the stack pointers land in the right banks
    cpu.set_status_register(state.sr);
    cpu.set_user_stack_pointer(state.usp);
    cpu.set_supervisor_stack_pointer(state.ssp);
    cpu.set_pc_address(state.pc);

    bus.write_word(state.pc, state.prefetch[0]);
    bus.write_word(state.pc.wrapping_add(2), state.prefetch[1]);

    for &(address, value) in &state.ram {
        bus.write_byte(address, value);
    }

    cpu
}

fn run_file(path: &Path, args: &Args) -> anyhow::Result<Summary> {
    let tests = load_tests(path)?;
    log::info!("Loaded {} tests from {}", tests.len(), path.display());

    let config = EngineConfig::default()
        .with_model(args.model)
        .with_alignment(AlignmentPolicy::AddressError);

    let mut bus = InMemoryBus::new();
    let mut summary = Summary { total: tests.len(), ..Summary::default() };

    for test in &tests {
        let mut cpu = init_test_state(config, &test.initial, &mut bus);
        cpu.step(&mut bus);

        if let Some(StopSignal::UnmappedOpcode { .. }) = cpu.take_stop_signal() {
            summary.unmapped += 1;
        }

        let state = State::capture(&cpu, &mut bus, &test.final_state, args.prefetch_offset);
        if state != test.final_state {
            summary.failures += 1;

            if args.verbose {
                let disassembly = cpu.disassemble(&mut bus, test.initial.pc);
                log::info!("Failed test '{}': {disassembly}", test.name);
                state.diff(&test.final_state);
            }
        }
    }

    log::info!(
        "{} failed out of {} tests in {} ({} unmapped opcodes)",
        summary.failures,
        summary.total,
        path.display(),
        summary.unmapped
    );

    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Running tests against the {}", args.model);

    let mut total = 0;
    let mut failures = 0;
    for path in &args.files {
        let summary = run_file(path, &args)?;
        total += summary.total;
        failures += summary.failures;
    }

    if args.files.len() > 1 {
        log::info!("{failures} failed out of {total} tests across {} files", args.files.len());
    }

    Ok(())
}
