//! Line-oriented command interface to an [`Environment`].

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::{BufRead, Write},
    path::Path,
};

use color_eyre::eyre::{self, bail, OptionExt};
use itertools::Itertools;
use orbcalc::{bodies::Body, kepler::builder::EntryBuilder};
use tracing::{debug, error};

use crate::environment::Environment;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgType {
    String,
    Number,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::String => write!(f, "[string]"),
            ArgType::Number => write!(f, "[number]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    String(String),
    Number(f64),
}

impl Argument {
    pub fn arg_type(&self) -> ArgType {
        match self {
            Argument::String(_) => ArgType::String,
            Argument::Number(_) => ArgType::Number,
        }
    }
}

fn number(args: &[Argument], i: usize) -> eyre::Result<f64> {
    match args.get(i).ok_or_eyre("missing argument")? {
        Argument::Number(n) => Ok(*n),
        Argument::String(_) => bail!("argument {} is supposed to be a number", i + 1),
    }
}

fn string(args: &[Argument], i: usize) -> eyre::Result<&str> {
    match args.get(i).ok_or_eyre("missing argument")? {
        Argument::String(s) => Ok(s),
        Argument::Number(_) => bail!("argument {} is supposed to be a string", i + 1),
    }
}

type Handler = fn(&mut Environment, &[Argument]) -> eyre::Result<String>;

pub struct Command {
    pub name: &'static str,
    pub args: &'static [ArgType],
    pub help: &'static str,
    handler: Handler,
}

impl Command {
    pub fn usage(&self) -> String {
        std::iter::once(self.name.to_owned())
            .chain(self.args.iter().map(ToString::to_string))
            .join(" ")
    }

    fn accepts(&self, args: &[Argument]) -> bool {
        self.args.len() == args.len()
            && self
                .args
                .iter()
                .zip(args)
                .all(|(ty, arg)| *ty == arg.arg_type())
    }
}

/// A tokenized input line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    pub command: String,
    pub args: Vec<Argument>,
    pub help: bool,
    pub exit: bool,
}

fn looks_numeric(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

/// Split a line into command words and arguments. Double-quoted tokens
/// are strings and tokens that parse as numbers are numbers; the other
/// words make up the command name.
pub fn parse_line(input: &str) -> Line {
    let mut line = Line::default();
    let mut words = Vec::new();
    for token in input.split_whitespace() {
        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            line.args
                .push(Argument::String(token[1..token.len() - 1].to_owned()));
        } else if let Some(n) = looks_numeric(token)
            .then(|| token.parse::<f64>().ok())
            .flatten()
        {
            line.args.push(Argument::Number(n));
        } else if words.is_empty() && token == "help" {
            line.help = true;
        } else if words.is_empty() && token == "exit" {
            line.exit = true;
            break;
        } else {
            words.push(token);
        }
    }
    line.command = words.join(" ");
    line
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Console<'a, R, W> {
    env: &'a mut Environment,
    input: R,
    output: W,
    commands: BTreeMap<&'static str, Command>,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(env: &'a mut Environment, input: R, output: W) -> Self {
        let mut console = Self {
            env,
            input,
            output,
            commands: BTreeMap::new(),
        };
        console.register_defaults();
        console
    }

    fn emplace(
        &mut self,
        name: &'static str,
        args: &'static [ArgType],
        help: &'static str,
        handler: Handler,
    ) {
        self.commands.insert(
            name,
            Command {
                name,
                args,
                help,
                handler,
            },
        );
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Read and execute commands until `exit` or the end of the input.
    pub fn run(&mut self) -> eyre::Result<()> {
        writeln!(self.output, "Enter command \"help\" for help\n")?;
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.input.read_line(&mut buf)? == 0 {
                return Ok(());
            }
            let line = buf.trim().to_owned();
            if self.execute(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Execute a single line, writing the response to the output.
    pub fn execute(&mut self, input: &str) -> eyre::Result<Flow> {
        let line = parse_line(input);
        debug!(?line, "parsed command");

        if line.exit {
            writeln!(self.output, "Exiting orbit calculator")?;
            return Ok(Flow::Exit);
        }
        if line.command.is_empty() && !line.help {
            return Ok(Flow::Continue);
        }

        if line.help {
            self.help(&line.command)?;
        } else if let Some(command) = self.commands.get(line.command.as_str()) {
            if command.accepts(&line.args) {
                match (command.handler)(self.env, &line.args) {
                    Ok(response) => writeln!(self.output, "{response}")?,
                    Err(e) => {
                        error!("{}: {:#}", command.name, e);
                        writeln!(self.output, "Error: {e}")?;
                    }
                }
            } else {
                writeln!(self.output, "Usage: {}", command.usage())?;
            }
        } else {
            writeln!(self.output, "Command \"{}\" not found", line.command)?;
            writeln!(self.output, "Do \"help\" for a list of commands")?;
        }
        writeln!(self.output)?;
        Ok(Flow::Continue)
    }

    fn help(&mut self, name: &str) -> eyre::Result<()> {
        if !name.is_empty() {
            if let Some(command) = self.commands.get(name) {
                writeln!(self.output, "Usage: {}", command.usage())?;
                writeln!(self.output, "Description: {}", command.help)?;
                return Ok(());
            }
            writeln!(self.output, "The command \"{name}\" is not recognized.")?;
        }
        writeln!(
            self.output,
            "Do \"help\" and any of the following commands for more information:"
        )?;
        for name in self.commands.keys() {
            writeln!(self.output, "  {name}")?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn register_defaults(&mut self) {
        use ArgType::Number;

        self.emplace(
            "set mu",
            &[Number],
            "Set the gravitational parameter of the central body (km^3/s^2)",
            |env, args| {
                env.central_body_mut()
                    .set_gravitational_parameter(number(args, 0)?)?;
                Ok("Gravitational parameter set".to_owned())
            },
        );
        self.emplace(
            "set j",
            &[Number, Number],
            "Set the Jeffery constant of order n (km^(n+3)/s^2); J2 must be set before J3",
            |env, args| {
                let n = number(args, 0)?;
                if n.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&n) {
                    bail!("the order must be a whole number, got {n}");
                }
                #[allow(clippy::cast_sign_loss)]
                let n = n as u32;
                env.central_body_mut()
                    .set_jeffery_constant(n, number(args, 1)?)?;
                Ok(format!("J{n} set"))
            },
        );
        self.emplace(
            "earth",
            &[],
            "Use Earth, with J2 and J3, as the central body",
            |env, _| {
                env.set_central_body(Body::earth());
                Ok("Central body set to Earth".to_owned())
            },
        );
        self.emplace(
            "show body",
            &[],
            "Show the central body",
            |env, _| {
                let body = env.central_body();
                let mut out = format!("mu: {} km^3/s^2", body.gravitational_parameter());
                for (n, j) in body.harmonics().iter() {
                    out += &format!("\nJ{n}: {j} km^{}/s^2", n + 3);
                }
                Ok(out)
            },
        );

        macro_rules! builder_setter {
            ($name:literal, $setter:ident, $help:literal) => {
                self.emplace($name, &[Number], $help, |env, args| {
                    env.builder_mut().$setter(number(args, 0)?);
                    Ok(format!("{} set", $name.trim_start_matches("set ")))
                });
            };
        }
        builder_setter!("set x", set_x, "Set the x-coordinate of the position (km)");
        builder_setter!("set y", set_y, "Set the y-coordinate of the position (km)");
        builder_setter!("set z", set_z, "Set the z-coordinate of the position (km)");
        builder_setter!("set vx", set_vx, "Set the x-coordinate of the velocity (km/s)");
        builder_setter!("set vy", set_vy, "Set the y-coordinate of the velocity (km/s)");
        builder_setter!("set vz", set_vz, "Set the z-coordinate of the velocity (km/s)");
        builder_setter!(
            "set lan",
            set_longitude_ascending_node,
            "Set the longitude of the ascending node (degrees)"
        );
        builder_setter!(
            "set argpe",
            set_argument_periapsis,
            "Set the argument of periapsis (degrees)"
        );
        builder_setter!("set ta", set_true_anomaly, "Set the true anomaly (degrees)");

        macro_rules! checked_builder_setter {
            ($name:literal, $setter:ident, $help:literal) => {
                self.emplace($name, &[Number], $help, |env, args| {
                    env.builder_mut().$setter(number(args, 0)?)?;
                    Ok(format!("{} set", $name.trim_start_matches("set ")))
                });
            };
        }
        checked_builder_setter!("set a", set_semi_major_axis, "Set the semi-major axis (km)");
        checked_builder_setter!("set e", set_eccentricity, "Set the eccentricity, in [0, 1)");
        checked_builder_setter!("set i", set_inclination, "Set the inclination (degrees), in [0, 180]");
        checked_builder_setter!("set t", set_time, "Set the reference time of the initial conditions (s)");

        self.emplace(
            "show builder",
            &[],
            "Show the initial conditions being assembled",
            |env, _| Ok(env.builder().to_string()),
        );
        self.emplace(
            "epoch",
            &[],
            "Use the assembled initial conditions as the start of the trajectory",
            |env, _| {
                let mut builder = env.builder().clone();
                builder.set_reference_body(env.central_body().clone());
                let entry = builder.build()?;
                env.trajectory_mut().set_initial_entry(entry);
                Ok(format!("Initial conditions set:\n{entry:#}"))
            },
        );
        self.emplace(
            "elements",
            &[],
            "Load the orbital elements of the trajectory epoch into the builder",
            |env, _| {
                let epoch = *env
                    .trajectory()
                    .epoch()
                    .ok_or_eyre("no initial conditions have been set")?;
                let builder = EntryBuilder::from_entry(&epoch, env.central_body().clone())?;
                env.set_builder(builder);
                Ok(env.builder().to_string())
            },
        );

        self.emplace(
            "set timestep",
            &[Number],
            "Set the propagation time step (s)",
            |env, args| {
                env.set_time_step(number(args, 0)?)?;
                Ok("Time step set".to_owned())
            },
        );
        self.emplace(
            "set finaltime",
            &[Number],
            "Set the time the propagation stops at (s)",
            |env, args| {
                env.set_final_time(number(args, 0)?)?;
                Ok("Final time set".to_owned())
            },
        );
        self.emplace(
            "propagate",
            &[],
            "Propagate the trajectory from its initial conditions",
            |env, _| {
                let code = env.propagate();
                Ok(format!(
                    "Propagation finished with code {}: {code}",
                    u8::from(code)
                ))
            },
        );
        self.emplace(
            "show trajectory",
            &[],
            "Print the trajectory, one `t x y z vx vy vz` line per entry",
            |env, _| {
                let mut out = Vec::new();
                env.trajectory().write_delimited(&mut out)?;
                Ok(String::from_utf8(out)?.trim_end().to_owned())
            },
        );
        self.emplace(
            "when",
            &[Number],
            "Show the trajectory entry closest to the given time (s)",
            |env, args| Ok(format!("{:#}", env.trajectory().when(number(args, 0)?)?)),
        );
        self.emplace(
            "dump",
            &[ArgType::String],
            "Write the trajectory to a tab separated file",
            |env, args| {
                let path = Path::new(string(args, 0)?);
                let mut out = Vec::new();
                env.trajectory().write_delimited(&mut out)?;
                fs::write(path, out)?;
                Ok(format!(
                    "Wrote {} entries to {}",
                    env.trajectory().len(),
                    path.display()
                ))
            },
        );
        self.emplace(
            "save",
            &[ArgType::String],
            "Save the central body, trajectory and time settings",
            |env, args| {
                let path = Path::new(string(args, 0)?);
                env.save_session(path)?;
                Ok(format!("Session saved to {}", path.display()))
            },
        );
        self.emplace(
            "load",
            &[ArgType::String],
            "Load a session written by \"save\"",
            |env, args| {
                let path = Path::new(string(args, 0)?);
                env.load_session(path)?;
                Ok(format!("Session loaded from {}", path.display()))
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn session(env: &mut Environment, input: &str) -> String {
        let mut out = Vec::new();
        Console::new(env, Cursor::new(input.to_owned()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn tokenizing() {
        let line = parse_line("  set j 2 1.5e10 ");
        assert_eq!(line.command, "set j");
        assert_eq!(
            line.args,
            vec![Argument::Number(2.0), Argument::Number(1.5e10)]
        );

        let line = parse_line("set x -7000");
        assert_eq!(line.args, vec![Argument::Number(-7000.0)]);

        let line = parse_line("dump \"out.tsv\"");
        assert_eq!(line.command, "dump");
        assert_eq!(line.args, vec![Argument::String("out.tsv".to_owned())]);

        let line = parse_line("help set mu");
        assert!(line.help);
        assert_eq!(line.command, "set mu");

        assert!(parse_line("exit").exit);
        assert!(!parse_line("set exit").exit);
    }

    #[test]
    fn usage_strings() {
        let mut env = Environment::default();
        let console = Console::new(&mut env, Cursor::new(""), Vec::new());
        let set_j = console.commands().find(|c| c.name == "set j").unwrap();
        assert_eq!(set_j.usage(), "set j [number] [number]");
    }

    #[test]
    fn wrong_arguments_print_usage() {
        let mut env = Environment::default();
        let out = session(&mut env, "set mu\nset mu \"x\"\nfrobnicate\n");
        assert!(out.contains("Usage: set mu [number]"));
        assert!(out.contains("Command \"frobnicate\" not found"));
        assert_eq!(env.central_body().gravitational_parameter(), 0.0);
    }

    #[test]
    fn errors_are_reported_not_fatal() {
        let mut env = Environment::default();
        let out = session(&mut env, "set mu -1\nset j 3 1\nset e 1.5\nset j 2.5 1\nset mu 5\n");
        assert!(out.contains("Error: the gravitational parameter cannot be negative"));
        assert!(out.contains("Error: Jeffery constant J3 cannot be set before J2"));
        assert!(out.contains("Error: eccentricity must be >= 0 and < 1"));
        assert!(out.contains("Error: the order must be a whole number"));
        assert_eq!(env.central_body().gravitational_parameter(), 5.0);
    }

    #[test]
    fn nan_arguments_are_rejected() {
        let mut env = Environment::default();
        let out = session(&mut env, "set timestep +nan\nset a -nan\nset mu -nan\nset t +NaN\n");
        assert!(out.contains("Error: time step must be greater than 0"));
        assert!(out.contains("Error: semi-major axis must be greater than 0"));
        assert!(out.contains("Error: the gravitational parameter cannot be negative"));
        assert!(out.contains("Error: reference time must be greater than or equal to 0"));
        assert_eq!(env.time_step(), None);
        assert_eq!(env.builder().time(), None);
    }

    #[test]
    fn help_lists_commands() {
        let mut env = Environment::default();
        let out = session(&mut env, "help\nhelp propagate\nhelp nothing\n");
        assert!(out.contains("  set timestep\n"));
        assert!(out.contains("Description: Propagate the trajectory"));
        assert!(out.contains("The command \"nothing\" is not recognized."));
    }

    #[test]
    fn full_run() {
        let mut env = Environment::default();
        let out = session(
            &mut env,
            "set mu 398600\n\
             set x 7000\nset y 0\nset z 0\nset vx 0\nset vy 7.5\nset vz 0\nset t 0\n\
             epoch\nset timestep 10\nset finaltime 6000\npropagate\n\
             when 5990\nexit\nset mu 1\n",
        );
        assert!(out.contains("Propagation finished with code 0: succeeded"));
        assert!(out.contains("t: 5990 s"));
        assert!(out.trim_end().ends_with("Exiting orbit calculator"));
        assert_eq!(env.trajectory().len(), 600);
        assert_eq!(env.central_body().gravitational_parameter(), 398_600.0);
    }

    #[test]
    fn keplerian_epoch_and_elements() {
        let mut env = Environment::default();
        let out = session(
            &mut env,
            "set mu 398600\nset a 8000\nset e 0.1\nset i 30\nset lan 40\nset argpe 60\n\
             set ta 75\nset t 0\nepoch\nelements\n",
        );
        assert!(out.contains("Initial conditions set:"));
        assert!(out.contains("Longitude of Ascending Node: "));
        let builder = env.builder();
        assert!(builder.is_valid());
        assert_eq!(env.trajectory().len(), 1);
    }

    #[test]
    fn edit_elements_of_the_epoch() {
        let mut env = Environment::default();
        let out = session(
            &mut env,
            "set mu 398600\nset x 7000\nset y 0\nset z 0\nset vx 0\nset vy 7.5\nset vz 0\n\
             set t 0\nepoch\nelements\nset x 7100\nepoch\n",
        );
        assert!(!out.contains("Error"));
        let epoch = env.trajectory().epoch().unwrap();
        assert_eq!(epoch.x(), 7100.0);
        assert_eq!(epoch.vy(), 7.5);
    }

    #[test]
    fn propagate_without_body() {
        let mut env = Environment::default();
        let out = session(&mut env, "propagate\n");
        assert!(out.contains("code 2: central body undefined"));
    }

    #[test]
    fn incomplete_epoch() {
        let mut env = Environment::default();
        let out = session(&mut env, "set x 1\nepoch\n");
        assert!(out.contains("Error: not enough parameters have been set (missing: y, z, vx, vy, vz, t)"));
        assert!(env.trajectory().is_empty());
    }
}
