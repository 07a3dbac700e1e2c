//! Hardware-free scenario simulator
//!
//! Drives the pure controller state machine through scripted doorway
//! passages and prints the resulting occupancy counts and climate
//! emissions. Useful for verifying threshold behavior without sensors
//! or an IR blaster attached.

use clap::Parser;
use roomctl::domain::types::ClimateAction;
use roomctl::services::controller::{ControllerState, TickOutput};
use roomctl::services::sequencer::SETTLE;
use std::time::Instant;

/// Scenario replay against the occupancy/climate state machines
#[derive(Parser, Debug)]
#[command(name = "roomctl-sim", version, about)]
struct Args {
    /// Number of people entering the room
    #[arg(long, default_value_t = 16)]
    entries: u32,

    /// Number of exit passages afterwards (may exceed entries to exercise
    /// the empty-room no-op)
    #[arg(long, default_value_t = 18)]
    exits: u32,
}

/// Drive one complete passage: clear the doorway past the settle pause,
/// trigger the leading sensor, then the trailing one.
fn passage(state: &mut ControllerState, now: &mut Instant, entering: bool) -> TickOutput {
    *now += SETTLE * 2;
    state.advance(false, false, *now);
    if entering {
        state.advance(true, false, *now);
    } else {
        state.advance(false, true, *now);
    }
    state.advance(true, true, *now)
}

fn report(out: &TickOutput) {
    let direction = out.event.map(|e| e.as_str()).unwrap_or("none");
    if out.count_changed {
        println!("{:>5}: people={}", direction, out.people);
    } else {
        println!("{:>5}: ignored, people={}", direction, out.people);
    }
    for action in &out.actions {
        match action {
            ClimateAction::SendIr(command) => {
                println!("       ir {} (0x{:08X})", command, command.code());
            }
            ClimateAction::TemperatureChanged(temperature) => {
                println!("       temperature -> {}", temperature);
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut state = ControllerState::new();
    let mut now = Instant::now();

    println!("simulating {} entries, then {} exits", args.entries, args.exits);

    for _ in 0..args.entries {
        let out = passage(&mut state, &mut now, true);
        report(&out);
    }

    for _ in 0..args.exits {
        let out = passage(&mut state, &mut now, false);
        report(&out);
    }

    println!(
        "final: people={} target_temperature={}",
        state.people(),
        state.target_temperature()
    );
}
