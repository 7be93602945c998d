//! The interpreter dispatch loop.
//!
//! [`run`] executes bytecode against a world until normal termination (root
//! RETN), a primitive-level error, a host short-circuit, or a STOP opcode.
//! Exactly one terminal status is published to the control channel per run;
//! the world is left as it was at entry to a failing instruction.

use karel_core::{Cond, Head, Op, Status, decode_head, read_branch_target, read_repeat};

use crate::control::Control;
use crate::grid::{MAX_FLAGS, WALL};
use crate::machine::{Machine, RepeatFrame};
use crate::robot::Direction;
use crate::world::World;

/// Execute the image starting at `entry_pc`, publishing the terminal status.
pub fn run(world: &mut World, image: &[u8], entry_pc: u32, control: &Control) -> Status {
    // The interrupt mechanism unwinds through the synthetic RETN at offset 0.
    debug_assert!(
        image.first().and_then(|&b| decode_head(b)).map(|h| h.op) == Some(Op::Retn),
        "offset 0 must hold RETN"
    );

    let mut machine = Machine::new(entry_pc);
    let status = dispatch_loop(world, image, &mut machine, control);
    control.publish(status);
    status
}

fn dispatch_loop(world: &mut World, image: &[u8], m: &mut Machine, control: &Control) -> Status {
    loop {
        // A short-circuit zeroes the mask, so the fetch reads offset 0's RETN
        // and the current activation unwinds; at most one more instruction
        // dispatches after the host's store becomes visible.
        let fetch = m.pc * control.mask();
        let head = match decode_head(image[fetch]) {
            Some(head) => head,
            None => {
                tracing::error!(pc = fetch, byte = image[fetch], "invalid opcode byte");
                return Status::UnknownError;
            }
        };

        match head.op {
            Op::Step => match world.robot.preview_step() {
                Some((x, y)) if world.grid.get(x, y) != WALL => {
                    world.robot.move_to(x, y);
                    m.pc = fetch + 1;
                }
                _ => return Status::StepOutOfBounds,
            },

            Op::Left => {
                world.robot.turn_left();
                m.pc = fetch + 1;
            }

            Op::PickUp => {
                let flags = world.grid.get(world.robot.x, world.robot.y);
                if flags == 0 {
                    return Status::PickupZeroFlags;
                }
                world.grid.set(world.robot.x, world.robot.y, flags - 1);
                m.pc = fetch + 1;
            }

            Op::Place => {
                let flags = world.grid.get(world.robot.x, world.robot.y);
                if flags == MAX_FLAGS {
                    return Status::PlaceMaxFlags;
                }
                world.grid.set(world.robot.x, world.robot.y, flags + 1);
                m.pc = fetch + 1;
            }

            Op::Branch => {
                if eval_cond(head, world) {
                    m.pc = read_branch_target(image, fetch) as usize;
                } else {
                    m.pc = fetch + Op::Branch.len();
                }
            }

            Op::BranchLinked => {
                // The reference language only emits unconditional calls, but
                // the head layout admits a condition; honoring it keeps the
                // opcode forward-compatible.
                if eval_cond(head, world) {
                    let return_pc = (fetch + Op::BranchLinked.len()) as u32;
                    if let Err(e) = m.push_call(return_pc) {
                        tracing::error!("call stack: {}", e);
                        return Status::UnknownError;
                    }
                    m.pc = read_branch_target(image, fetch) as usize;
                } else {
                    m.pc = fetch + Op::BranchLinked.len();
                }
            }

            Op::Retn => match m.pop_call() {
                Some(return_pc) => m.pc = return_pc as usize,
                None => return Status::Success,
            },

            Op::Stop => return Status::StopEncountered,

            Op::Repeat => {
                let (loop_top, count) = read_repeat(image, fetch);
                let first_visit = m
                    .cur_repeat
                    .as_ref()
                    .is_none_or(|frame| frame.origin as usize != fetch);
                if first_visit {
                    let frame = RepeatFrame {
                        origin: fetch as u32,
                        remaining: count,
                    };
                    if let Err(e) = m.begin_repeat(frame) {
                        tracing::error!("repeat stack: {}", e);
                        return Status::UnknownError;
                    }
                }
                match m.cur_repeat.as_mut() {
                    // The body sits above this instruction and has already run
                    // once on arrival; `remaining` counts that pass. A count
                    // of 0 in a malformed image ends the loop immediately.
                    Some(frame) if frame.remaining > 1 => {
                        frame.remaining -= 1;
                        m.pc = loop_top as usize;
                    }
                    _ => {
                        m.end_repeat();
                        m.pc = fetch + Op::Repeat.len();
                    }
                }
            }
        }
    }
}

/// Evaluate the head's condition against the world; the result is
/// `raw XOR invert`.
fn eval_cond(head: Head, world: &World) -> bool {
    let raw = match head.cond {
        Cond::None => true,
        Cond::IsWall => match world.robot.preview_step() {
            None => true,
            Some((x, y)) => world.grid.get(x, y) == WALL,
        },
        Cond::IsFlag => {
            let value = world.grid.get(world.robot.x, world.robot.y);
            value != 0 && value != WALL
        }
        Cond::IsHome => world.robot.is_home(),
        Cond::IsNorth => world.robot.dir == Direction::North,
        Cond::IsWest => world.robot.dir == Direction::West,
        Cond::IsSouth => world.robot.dir == Direction::South,
        Cond::IsEast => world.robot.dir == Direction::East,
    };
    raw ^ head.invert
}
