//! Console system.
//!
//! Provides:
//! - Console variables (cvars) with typed values
//! - Command registration and execution
//! - Command history
//! - Input parsing
//!
//! The editor registers its render toggles (`r_show_grid`, ...) here and
//! routes every typed line through [`Console::exec`] once its own commands
//! have had a look at it.
//!
//! # Usage
//! ```ignore
//! let mut console = Console::new();
//! console.register_cvar("r_show_grid", CvarValue::Bool(true), "Draw the ground grid", CvarFlags::ARCHIVE);
//! console.exec("r_show_grid 0")?;
//! assert!(!console.cvar_bool("r_show_grid"));
//! ```

use std::collections::{BTreeMap, VecDeque};

use anyhow::{bail, Context};

/// Console variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl CvarValue {
    /// Parses typed input: int, then float, then bool, else a string.
    pub fn parse(text: &str) -> Self {
        if let Ok(v) = text.parse::<i64>() {
            CvarValue::Int(v)
        } else if let Ok(v) = text.parse::<f64>() {
            CvarValue::Float(v)
        } else if text.eq_ignore_ascii_case("true") {
            CvarValue::Bool(true)
        } else if text.eq_ignore_ascii_case("false") {
            CvarValue::Bool(false)
        } else {
            CvarValue::String(text.trim_matches('"').to_string())
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CvarValue::Int(v) => Some(*v),
            CvarValue::Float(v) => Some(*v as i64),
            CvarValue::Bool(v) => Some(i64::from(*v)),
            CvarValue::String(s) => s.parse().ok(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CvarValue::Float(v) => Some(*v),
            CvarValue::Int(v) => Some(*v as f64),
            CvarValue::String(s) => s.parse().ok(),
            CvarValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        }
    }
}

impl std::fmt::Display for CvarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CvarValue::Int(v) => write!(f, "{}", v),
            CvarValue::Float(v) => write!(f, "{}", v),
            CvarValue::String(v) => write!(f, "\"{}\"", v),
            CvarValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Console variable metadata.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
    pub flags: CvarFlags,
}

bitflags::bitflags! {
    /// Cvar flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CvarFlags: u32 {
        const NONE = 0;
        const ARCHIVE = 1 << 0;     // Mirrors an EngineConfig field
        const READ_ONLY = 1 << 1;   // Rejected by `set`
        const DEBUG_DRAW = 1 << 2;  // Only affects debug overlays
    }
}

/// Cvars by name; iteration is alphabetical.
pub type CvarMap = BTreeMap<String, Cvar>;

/// Command handler function type.
pub type CommandHandler =
    Box<dyn Fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// What a command handler may touch while it runs.
pub struct ConsoleContext<'a> {
    pub output: Vec<String>,
    pub cvars: &'a mut CvarMap,
    /// Registered command names, alphabetical.
    pub commands: Vec<&'a str>,
}

impl ConsoleContext<'_> {
    pub fn print(&mut self, msg: impl Into<String>) {
        self.output.push(msg.into());
    }

    pub fn get_cvar(&self, name: &str) -> Option<&CvarValue> {
        self.cvars.get(name).map(|c| &c.value)
    }

    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        write_cvar(self.cvars, name, value)
    }
}

fn write_cvar(cvars: &mut CvarMap, name: &str, value: CvarValue) -> anyhow::Result<()> {
    let Some(cvar) = cvars.get_mut(name) else {
        bail!("unknown cvar: {}", name);
    };
    if cvar.flags.contains(CvarFlags::READ_ONLY) {
        bail!("cvar {} is read-only", name);
    }
    cvar.value = value;
    Ok(())
}

/// Editor console: typed cvars, named commands and a bounded history.
pub struct Console {
    cvars: CvarMap,
    commands: BTreeMap<String, CommandHandler>,
    history: VecDeque<String>,
    max_history: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        let mut console = Self {
            cvars: CvarMap::new(),
            commands: BTreeMap::new(),
            history: VecDeque::new(),
            max_history: 100,
        };
        console.register_builtin_commands();
        console
    }

    fn register_builtin_commands(&mut self) {
        self.register_command("echo", |args, ctx| {
            ctx.print(args.join(" "));
            Ok(())
        });

        // help [cvar]
        self.register_command("help", |args, ctx| {
            let line = match args.first() {
                None => format!("Available commands: {}", ctx.commands.join(", ")),
                Some(name) => match ctx.cvars.get(*name) {
                    Some(cvar) => format!("{}: {}", name, cvar.description),
                    None => format!("No help for '{}'", name),
                },
            };
            ctx.print(line);
            Ok(())
        });

        self.register_command("cvarlist", |_args, ctx| {
            let lines: Vec<String> = ctx
                .cvars
                .iter()
                .map(|(name, cvar)| format!("  {} = {} (default: {})", name, cvar.value, cvar.default))
                .collect();
            ctx.output.extend(lines);
            Ok(())
        });

        // set <cvar> <value...>
        self.register_command("set", |args, ctx| {
            let [name, rest @ ..] = args else {
                bail!("usage: set <cvar> <value>");
            };
            if rest.is_empty() {
                bail!("usage: set <cvar> <value>");
            }
            let value = CvarValue::parse(&rest.join(" "));
            let line = format!("{} = {}", name, value);
            ctx.set_cvar(name, value)?;
            ctx.print(line);
            Ok(())
        });
    }

    /// Registers a console variable, replacing any previous one.
    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str, flags: CvarFlags) {
        self.cvars.insert(
            name.to_string(),
            Cvar {
                value: default.clone(),
                default,
                description: description.to_string(),
                flags,
            },
        );
    }

    pub fn register_command<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&[&str], &mut ConsoleContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.insert(name.to_string(), Box::new(handler));
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Executes a console command line.
    ///
    /// A bare cvar name prints it; a cvar name followed by a value sets it.
    /// Unknown commands produce an output line, not an error.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Vec::new());
        }

        self.history.push_back(line.to_string());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }

        let tokens = parse_command_line(line);
        let Some((name, rest)) = tokens.split_first() else {
            return Ok(Vec::new());
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        if let Some(handler) = self.commands.get(name.as_str()) {
            let mut ctx = ConsoleContext {
                output: Vec::new(),
                cvars: &mut self.cvars,
                commands: self.commands.keys().map(String::as_str).collect(),
            };
            handler(&args, &mut ctx).with_context(|| format!("command '{}'", name))?;
            return Ok(ctx.output);
        }

        let Some(cvar) = self.cvars.get(name.as_str()) else {
            return Ok(vec![format!("Unknown command: {}", name)]);
        };
        if args.is_empty() {
            return Ok(vec![format!("{} = {} (default: {})", name, cvar.value, cvar.default)]);
        }
        let value = CvarValue::parse(&args.join(" "));
        let out = format!("{} = {}", name, value);
        self.set_cvar(name, value)?;
        Ok(vec![out])
    }

    pub fn get_cvar(&self, name: &str) -> Option<CvarValue> {
        self.cvars.get(name).map(|c| c.value.clone())
    }

    /// Reads a cvar as a bool; unknown cvars are false.
    pub fn cvar_bool(&self, name: &str) -> bool {
        self.cvars.get(name).is_some_and(|c| c.value.as_bool())
    }

    /// Reads a cvar as a float, falling back to `default`.
    pub fn cvar_float(&self, name: &str, default: f64) -> f64 {
        self.cvars
            .get(name)
            .and_then(|c| c.value.as_float())
            .unwrap_or(default)
    }

    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        write_cvar(&mut self.cvars, name, value)
    }

    /// Executed lines, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> + '_ {
        self.history.iter().map(String::as_str)
    }
}

/// Parses a command line into tokens, respecting quotes.
pub fn parse_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console_with_toggles() -> Console {
        let mut console = Console::new();
        console.register_cvar("r_show_grid", CvarValue::Bool(true), "Draw the ground grid", CvarFlags::ARCHIVE);
        console.register_cvar("host_timescale", CvarValue::Float(1.0), "Time multiplier", CvarFlags::NONE);
        console.register_cvar("version", CvarValue::String("0.1".into()), "Build", CvarFlags::READ_ONLY);
        console
    }

    #[test]
    fn cvar_set_by_name() {
        let mut console = console_with_toggles();
        assert!(console.cvar_bool("r_show_grid"));

        console.exec("r_show_grid 0").unwrap();
        assert!(!console.cvar_bool("r_show_grid"));

        console.exec("set host_timescale 0.5").unwrap();
        assert_eq!(console.cvar_float("host_timescale", 1.0), 0.5);

        let out = console.exec("host_timescale").unwrap();
        assert_eq!(out, vec!["host_timescale = 0.5 (default: 1)"]);
    }

    #[test]
    fn read_only_cvar_rejects_writes() {
        let mut console = console_with_toggles();
        assert!(console.exec("set version 2").is_err());
        assert_eq!(console.get_cvar("version"), Some(CvarValue::String("0.1".into())));
    }

    #[test]
    fn set_reports_only_applied_writes() {
        let mut console = console_with_toggles();
        let handler = &console.commands["set"];

        let mut ctx = ConsoleContext {
            output: Vec::new(),
            cvars: &mut console.cvars,
            commands: Vec::new(),
        };
        assert!(handler(&["version", "2"], &mut ctx).is_err());
        assert!(handler(&["missing", "1"], &mut ctx).is_err());
        assert!(ctx.output.is_empty());

        handler(&["host_timescale", "0.25"], &mut ctx).unwrap();
        assert_eq!(ctx.output, vec!["host_timescale = 0.25"]);
        assert_eq!(ctx.get_cvar("host_timescale"), Some(&CvarValue::Float(0.25)));
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut console = Console::new();
        let out = console.exec("frobnicate now").unwrap();
        assert_eq!(out, vec!["Unknown command: frobnicate"]);
        assert_eq!(console.history().collect::<Vec<_>>(), vec!["frobnicate now"]);
    }

    #[test]
    fn help_lists_commands_and_cvars() {
        let mut console = console_with_toggles();
        let out = console.exec("help").unwrap();
        assert_eq!(out, vec!["Available commands: cvarlist, echo, help, set"]);
        let out = console.exec("help r_show_grid").unwrap();
        assert_eq!(out, vec!["r_show_grid: Draw the ground grid"]);
    }

    #[test]
    fn parse_quoted_args() {
        let tokens = parse_command_line(r#"anim play "walk cycle.anim" now"#);
        assert_eq!(tokens, vec!["anim", "play", "walk cycle.anim", "now"]);
    }
}
