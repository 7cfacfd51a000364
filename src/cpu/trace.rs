//! Execution trace hook.
//!
//! Observers see read-only snapshots around every decode/execute step. They
//! cannot change machine state.

use crate::cpu::bus::Word;
use crate::cpu::datapath::BusSnapshot;
use serde::Serialize;
use std::io::Write;

/// Snapshot handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Instructions executed so far.
    pub cycle: u64,
    /// Address of the instruction.
    pub pc: Word,
    /// Register name/value pairs, in id order.
    pub registers: Vec<(String, Word)>,
    pub buses: BusSnapshot,
    /// Raw opcode word.
    pub opcode: Word,
    /// Mnemonic, or `None` for the halt word.
    pub mnemonic: Option<&'static str>,
    /// Operand cells following the opcode.
    pub operands: Vec<Word>,
}

/// Receives trace events during a run.
pub trait TraceObserver {
    /// Whether events should be built at all.
    fn enabled(&self) -> bool {
        true
    }

    /// After fetch, with the PC and the word loaded into IR.
    fn on_fetch(&mut self, _pc: Word, _ir: Word) {}

    /// After decode, before the micro-routine runs.
    fn before_execute(&mut self, _event: &TraceEvent) {}

    /// After the micro-routine has finished.
    fn after_execute(&mut self, _event: &TraceEvent) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl TraceObserver for NoTrace {
    fn enabled(&self) -> bool {
        false
    }
}

/// When a recorded event was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TracePhase {
    Before,
    After,
}

/// Observer that keeps every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    pub fetches: Vec<(Word, Word)>,
    pub events: Vec<(TracePhase, TraceEvent)>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceObserver for RecordingTracer {
    fn on_fetch(&mut self, pc: Word, ir: Word) {
        self.fetches.push((pc, ir));
    }

    fn before_execute(&mut self, event: &TraceEvent) {
        self.events.push((TracePhase::Before, event.clone()));
    }

    fn after_execute(&mut self, event: &TraceEvent) {
        self.events.push((TracePhase::After, event.clone()));
    }
}

/// Remembers whether a trace writer has failed; the first failure is logged.
#[derive(Debug, Default)]
struct WriteStatus {
    failed: bool,
}

impl WriteStatus {
    fn check(&mut self, result: std::io::Result<()>) {
        if let Err(e) = result {
            if !self.failed {
                tracing::warn!(error = %e, "trace output failed; further trace output is dropped");
            }
            self.failed = true;
        }
    }
}

/// Human-readable trace, one block per phase.
#[derive(Debug)]
pub struct ConsoleTracer<W: Write> {
    out: W,
    status: WriteStatus,
}

impl<W: Write> ConsoleTracer<W> {
    pub fn new(out: W) -> Self {
        Self { out, status: WriteStatus::default() }
    }

    /// Whether any trace write has failed.
    pub fn failed(&self) -> bool {
        self.status.failed
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_registers(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        for (name, value) in &event.registers {
            writeln!(self.out, "{}: {}", name, value)?;
        }
        Ok(())
    }

    fn write_before(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        writeln!(self.out, "---------- BEFORE decode/execute (cycle {}) ----------", event.cycle)?;
        self.write_registers(event)?;
        let name = event.mnemonic.unwrap_or("END");
        if event.operands.is_empty() {
            writeln!(self.out, "Instruction: {}", name)
        } else {
            let operands: Vec<String> = event.operands.iter().map(|v| v.to_string()).collect();
            writeln!(self.out, "Instruction: {} {}", name, operands.join(" "))
        }
    }

    fn write_after(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        writeln!(self.out, "---------- AFTER decode/execute ----------")?;
        writeln!(self.out, "Internal Bus A: {}", event.buses.internal_a)?;
        writeln!(self.out, "Internal Bus B: {}", event.buses.internal_b)?;
        writeln!(self.out, "External Bus: {}", event.buses.external)?;
        self.write_registers(event)
    }
}

impl<W: Write> TraceObserver for ConsoleTracer<W> {
    fn enabled(&self) -> bool {
        !self.status.failed
    }

    fn on_fetch(&mut self, pc: Word, ir: Word) {
        let result = writeln!(self.out, "------- Fetch -------\nPC: {}\nIR: {}", pc, ir);
        self.status.check(result);
    }

    fn before_execute(&mut self, event: &TraceEvent) {
        let result = self.write_before(event);
        self.status.check(result);
    }

    fn after_execute(&mut self, event: &TraceEvent) {
        let result = self.write_after(event);
        self.status.check(result);
    }
}

/// One JSON object per event.
#[derive(Debug)]
pub struct JsonTracer<W: Write> {
    out: W,
    status: WriteStatus,
}

impl<W: Write> JsonTracer<W> {
    pub fn new(out: W) -> Self {
        Self { out, status: WriteStatus::default() }
    }

    /// Whether any trace write has failed.
    pub fn failed(&self) -> bool {
        self.status.failed
    }

    fn emit(&mut self, phase: TracePhase, event: &TraceEvent) {
        #[derive(Serialize)]
        struct Line<'a> {
            phase: TracePhase,
            #[serde(flatten)]
            event: &'a TraceEvent,
        }
        let result = serde_json::to_string(&Line { phase, event })
            .map_err(std::io::Error::from)
            .and_then(|json| writeln!(self.out, "{}", json));
        self.status.check(result);
    }
}

impl<W: Write> TraceObserver for JsonTracer<W> {
    fn enabled(&self) -> bool {
        !self.status.failed
    }

    fn before_execute(&mut self, event: &TraceEvent) {
        self.emit(TracePhase::Before, event);
    }

    fn after_execute(&mut self, event: &TraceEvent) {
        self.emit(TracePhase::After, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> TraceEvent {
        TraceEvent {
            cycle: 2,
            pc: 4,
            registers: vec![("RPG0".into(), 5), ("PC".into(), 4)],
            buses: BusSnapshot { external: 1, internal_a: 2, internal_b: 3, select: 0 },
            opcode: 22,
            mnemonic: Some("ldi"),
            operands: vec![0, 5],
        }
    }

    #[test]
    fn test_console_format() {
        let mut tracer = ConsoleTracer::new(Vec::new());
        tracer.before_execute(&event());
        tracer.after_execute(&event());

        let text = String::from_utf8(tracer.into_inner()).unwrap();
        assert!(text.contains("Instruction: ldi 0 5"));
        assert!(text.contains("RPG0: 5"));
        assert!(text.contains("Internal Bus B: 3"));
    }

    #[test]
    fn test_console_halt_word() {
        let mut tracer = ConsoleTracer::new(Vec::new());
        let mut halt = event();
        halt.mnemonic = None;
        halt.operands.clear();
        tracer.before_execute(&halt);

        let text = String::from_utf8(tracer.into_inner()).unwrap();
        assert!(text.contains("Instruction: END"));
    }

    #[test]
    fn test_json_lines() {
        let mut buf = Vec::new();
        {
            let mut tracer = JsonTracer::new(&mut buf);
            tracer.before_execute(&event());
        }
        let line = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["phase"], "Before");
        assert_eq!(value["mnemonic"], "ldi");
        assert_eq!(value["buses"]["internal_a"], 2);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_disables_tracer() {
        let mut console = ConsoleTracer::new(BrokenPipe);
        assert!(console.enabled());
        console.before_execute(&event());
        assert!(console.failed());
        assert!(!console.enabled());

        let mut json = JsonTracer::new(BrokenPipe);
        json.after_execute(&event());
        assert!(json.failed());
        assert!(!json.enabled());
    }

    #[test]
    fn test_no_trace_is_disabled() {
        assert!(!NoTrace.enabled());
        assert!(RecordingTracer::new().enabled());
    }
}
