//! Synthetic process table for the `ps` command.
//!
//! Nothing here inspects real processes. The table is a fiction: fixed
//! process names with baseline CPU/MEM figures that drift with what the
//! session has been doing, jittered by the injected RNG.

use rand::Rng;

/// One printed row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: &'static str,
    pub cpu: f64,
    pub mem: f64,
}

/// Session facts the table reacts to.
#[derive(Debug, Clone, Default)]
pub struct PsInputs<'a> {
    pub last_command: Option<&'a str>,
    pub whoami_repeats: usize,
    pub awareness: f64,
    pub minimal: bool,
    pub sudo: bool,
    pub god: bool,
    pub unstable: bool,
}

struct Baseline {
    pid: u32,
    name: &'static str,
    cpu: f64,
    mem: f64,
}

const BASELINES: [Baseline; 5] = [
    Baseline { pid: 1, name: "consciousness.core", cpu: 12.0, mem: 18.0 },
    Baseline { pid: 7, name: "observer.thread", cpu: 4.0, mem: 6.0 },
    Baseline { pid: 23, name: "memory.daemon", cpu: 6.0, mem: 22.0 },
    Baseline { pid: 88, name: "dream.compiler", cpu: 2.0, mem: 9.0 },
    Baseline { pid: 141, name: "doubt.gc", cpu: 1.0, mem: 3.0 },
];

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 99.9)
}

/// Build the table for the current session snapshot.
pub fn process_table(inputs: &PsInputs, rng: &mut impl Rng) -> Vec<ProcessRow> {
    let jitter_scale = if inputs.unstable { 2.0 } else { 1.0 };

    BASELINES
        .iter()
        .map(|base| {
            let mut cpu = base.cpu;
            let mut mem = base.mem;

            // the core heats up with awareness
            if base.name == "consciousness.core" {
                cpu += inputs.awareness * 0.3;
            }
            // staring at yourself keeps the observer busy
            if base.name == "observer.thread" {
                cpu += inputs.whoami_repeats as f64 * 2.0;
            }
            if base.name == "memory.daemon"
                && matches!(inputs.last_command, Some("memory") | Some("history"))
            {
                cpu += 8.0;
                mem += 10.0;
            }
            if base.name == "dream.compiler" && inputs.god {
                cpu += 15.0;
            }
            if inputs.sudo {
                mem += 4.0;
            }

            cpu += rng.gen_range(-1.5..1.5) * jitter_scale;
            mem += rng.gen_range(-1.0..1.0) * jitter_scale;

            if inputs.minimal {
                cpu /= 2.0;
                mem /= 2.0;
            }

            ProcessRow {
                pid: base.pid,
                name: base.name,
                cpu: clamp(cpu),
                mem: clamp(mem),
            }
        })
        .collect()
}

/// Format the rows the way the terminal prints them.
pub fn render_table(rows: &[ProcessRow]) -> Vec<String> {
    let mut lines = vec![format!("{:>5}  {:<20} {:>5} {:>5}", "PID", "NAME", "CPU%", "MEM%")];
    for row in rows {
        lines.push(format!(
            "{:>5}  {:<20} {:>5.1} {:>5.1}",
            row.pid, row.name, row.cpu, row.mem
        ));
    }
    lines
}
