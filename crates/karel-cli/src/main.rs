//! Karel command-line host.
//!
//! Loads a Karel source file and a TOML world file, runs a procedure through
//! the session facade, and prints the terminal status and the resulting
//! world.

mod world_file;

use std::path::PathBuf;
use std::process;

use karel_session::{GRID_SIDE, Session, SessionError, Status, WALL_IMPORT};
use world_file::WorldFile;

struct Args {
    program: PathBuf,
    world: PathBuf,
    symbol: String,
    quiet: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            print_usage();
            process::exit(2);
        }
    };

    match run(&args) {
        Ok(Status::Success) => {}
        Ok(_) => process::exit(1),
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
    }
}

fn parse_args() -> Result<Args, String> {
    let mut program = None;
    let mut world = None;
    let mut symbol = "main".to_owned();
    let mut quiet = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--world" => {
                world = Some(PathBuf::from(
                    args.next().ok_or("--world needs a file argument")?,
                ));
            }
            "--run" => {
                symbol = args.next().ok_or("--run needs a symbol argument")?;
            }
            "--quiet" => quiet = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown option '{}'", other));
            }
            _ if program.is_none() => program = Some(PathBuf::from(arg.as_str())),
            _ => return Err(format!("unexpected argument '{}'", arg)),
        }
    }

    Ok(Args {
        program: program.ok_or("missing program file")?,
        world: world.ok_or("missing --world file")?,
        symbol,
        quiet,
    })
}

fn print_usage() {
    eprintln!("Usage: karel <program.kl> --world <world.toml> [--run <symbol>] [--quiet]");
}

fn run(args: &Args) -> Result<Status, String> {
    let source = std::fs::read_to_string(&args.program)
        .map_err(|e| format!("failed to read {}: {}", args.program.display(), e))?;

    let session = Session::new();
    match session.load_source(&source) {
        Ok(()) => {}
        Err(SessionError::Compilation(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("{}:{}", args.program.display(), diagnostic.render(&source));
            }
            return Err("compilation failed".to_owned());
        }
        Err(other) => return Err(other.to_string()),
    }

    let (cells, robot) = WorldFile::load(&args.world)
        .and_then(|file| file.to_import())
        .map_err(|e| e.to_string())?;
    session
        .load_world(&cells, &robot)
        .map_err(|e| e.to_string())?;

    let status = session
        .run_symbol(&args.symbol)
        .map_err(|e| e.to_string())?;

    if !args.quiet {
        println!("{}", status);
        let mut out = vec![0u8; (GRID_SIDE * GRID_SIDE) as usize];
        session.read_world(&mut out).map_err(|e| e.to_string())?;
        let robot = session.robot().map_err(|e| e.to_string())?;
        print!("{}", render_world(&out, &robot));
    }

    Ok(status)
}

/// ASCII rendering, top row first; the robot overlays its cell as `^<v>`.
fn render_world(cells: &[u8], robot: &[u32; 5]) -> String {
    let [rx, ry, dir, _, _] = *robot;
    let mut text = String::new();
    for row in 0..GRID_SIDE {
        let y = GRID_SIDE - 1 - row;
        for x in 0..GRID_SIDE {
            let c = if (x, y) == (rx, ry) {
                match dir {
                    0 => '^',
                    1 => '<',
                    2 => 'v',
                    _ => '>',
                }
            } else {
                match cells[(x + y * GRID_SIDE) as usize] {
                    0 => '.',
                    WALL_IMPORT => '#',
                    n => (b'0' + n) as char,
                }
            };
            text.push(c);
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_marks_robot_walls_and_flags() {
        let mut cells = vec![0u8; (GRID_SIDE * GRID_SIDE) as usize];
        cells[(3 + 4 * GRID_SIDE) as usize] = WALL_IMPORT;
        cells[(6 + 4 * GRID_SIDE) as usize] = 7;

        let text = render_world(&cells, &[5, 5, 0, 5, 5]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), GRID_SIDE as usize);

        // y = 5 renders on line GRID_SIDE - 1 - 5 from the top.
        let robot_line = lines[(GRID_SIDE - 6) as usize];
        assert_eq!(robot_line.as_bytes()[5], b'^');

        let wall_line = lines[(GRID_SIDE - 5) as usize];
        assert_eq!(wall_line.as_bytes()[3], b'#');
        assert_eq!(wall_line.as_bytes()[6], b'7');
    }
}
