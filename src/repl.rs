//! Interactive Command Loop
//!
//! Parses one-line commands into a `Command` value and executes them
//! against the current session. Parsing is pure and separately testable;
//! execution owns the only `Session` and rebuilds it on `init`.
//!
//! # Commands
//!
//! ```text
//! init memory <size> [strategy]   build a fresh session
//! set cache <level> <policy>      e.g. set cache L1 lru
//! set alloc <strategy>            switch list strategies at runtime
//! malloc <size>                   allocate, invalidating cached lines
//! free <id>                       release an allocation
//! access <address>                probe the cache chain
//! dump | stats | stats_cache      reports
//! exit                            leave the loop
//! ```

use std::str::FromStr;

use tracing::warn;

use crate::allocator::Strategy;
use crate::cache::ReplacementPolicy;
use crate::config::SessionConfig;
use crate::error::Error;
use crate::session::Session;

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build a fresh session; the strategy name is validated at execution
    /// so a bad name can fall back instead of failing
    Init { size: u64, strategy: Option<String> },
    /// Set a cache level's replacement policy
    SetPolicy { level: String, policy: String },
    /// Switch the allocation strategy
    SetStrategy { name: String },
    /// Allocate memory
    Malloc { size: u64 },
    /// Free an allocation
    Free { id: u64 },
    /// Probe the cache chain
    Access { address: u64 },
    /// Print the memory layout
    Dump,
    /// Print allocator statistics
    Stats,
    /// Print cache statistics
    CacheStats,
    /// Leave the loop
    Exit,
}

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line; the error is the
    /// message to show the user.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };

        let command = match head {
            "init" => {
                if words.next() != Some("memory") {
                    return Err("Usage: init memory <size> [strategy]".to_string());
                }
                let size = parse_number(words.next(), "init memory <size> [strategy]")?;
                let strategy = words.next().map(str::to_string);
                Command::Init { size, strategy }
            }
            "set" => match words.next() {
                Some("cache") => {
                    let (Some(level), Some(policy)) = (words.next(), words.next()) else {
                        return Err("Usage: set cache <level> <policy>".to_string());
                    };
                    Command::SetPolicy {
                        level: level.to_string(),
                        policy: policy.to_string(),
                    }
                }
                Some("alloc") => {
                    let Some(name) = words.next() else {
                        return Err("Usage: set alloc <strategy>".to_string());
                    };
                    Command::SetStrategy {
                        name: name.to_string(),
                    }
                }
                _ => {
                    return Err(
                        "Usage: set cache <level> <policy> | set alloc <strategy>".to_string()
                    )
                }
            },
            "malloc" => Command::Malloc {
                size: parse_number(words.next(), "malloc <size>")?,
            },
            "free" => Command::Free {
                id: parse_number(words.next(), "free <id>")?,
            },
            "access" => Command::Access {
                address: parse_number(words.next(), "access <address>")?,
            },
            "dump" => Command::Dump,
            "stats" => Command::Stats,
            "stats_cache" => Command::CacheStats,
            "exit" => Command::Exit,
            _ => return Err("Unknown command".to_string()),
        };
        Ok(Some(command))
    }
}

fn parse_number(word: Option<&str>, usage: &str) -> Result<u64, String> {
    word.ok_or_else(|| format!("Usage: {usage}"))?
        .parse()
        .map_err(|_| format!("Usage: {usage}"))
}

/// What the loop should do with a handled line
#[derive(Debug, PartialEq, Eq)]
pub enum Response {
    /// Print this and keep going
    Message(String),
    /// Nothing to print
    Silent,
    /// Leave the loop
    Quit,
}

/// The interactive driver: owns the session between commands
#[derive(Debug, Default)]
pub struct Repl {
    session: Option<Session>,
}

impl Repl {
    /// A driver with no session; every command but `init` reports an
    /// uninitialized system
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver around an existing session (e.g. built from a config file)
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Parse and execute one input line
    pub fn handle_line(&mut self, line: &str) -> Response {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Response::Silent,
            Err(message) => Response::Message(message),
        }
    }

    fn execute(&mut self, command: Command) -> Response {
        match command {
            Command::Exit => Response::Quit,
            Command::Init { size, strategy } => self.init(size, strategy.as_deref()),
            command => self.execute_on_session(command),
        }
    }

    /// Every command other than `init` and `exit` needs a live session
    fn execute_on_session(&mut self, command: Command) -> Response {
        let Some(session) = self.session.as_mut() else {
            return Response::Message("System not initialized".to_string());
        };

        let message = match command {
            Command::SetPolicy { level, policy } => set_policy(session, &level, &policy),
            Command::SetStrategy { name } => set_strategy(session, &name),
            Command::Malloc { size } => match session.malloc(size) {
                Ok(id) => format!("Allocation block id = {id}"),
                Err(Error::InvalidSize { .. }) => "Size must be positive".to_string(),
                Err(_) => "Allocation failed".to_string(),
            },
            Command::Free { id } => match session.free(id) {
                Ok(()) => format!("Block {id} freed and merged"),
                Err(_) => "Invalid block id".to_string(),
            },
            Command::Access { address } => {
                if session.access(address).is_hit() {
                    "Cache hit".to_string()
                } else {
                    "Cache miss".to_string()
                }
            }
            Command::Dump => session.layout().to_string(),
            Command::Stats => session.memory_stats().to_string(),
            Command::CacheStats => session.cache_stats().to_string(),
            Command::Init { .. } | Command::Exit => unreachable!("handled by execute"),
        };
        Response::Message(message)
    }

    /// Build a fresh session, replacing any existing one. A bad strategy
    /// name, or buddy over a non-power-of-two space, falls back to
    /// first-fit with a warning instead of failing.
    fn init(&mut self, size: u64, strategy: Option<&str>) -> Response {
        if size == 0 {
            return Response::Message("Size must be positive".to_string());
        }

        let mut lines = vec![format!("Memory initialized with size {size}")];
        let strategy = match strategy {
            None => Strategy::default(),
            Some(name) => match Strategy::from_str(name) {
                Ok(Strategy::Buddy) if !size.is_power_of_two() => {
                    warn!(size, "buddy fallback: memory size is not a power of two");
                    lines.push(
                        "Unable to set buddy: memory size must be a power of two, using first_fit"
                            .to_string(),
                    );
                    Strategy::FirstFit
                }
                Ok(strategy) => strategy,
                Err(_) => {
                    warn!(name, "unknown allocation strategy, falling back to first_fit");
                    lines.push("Invalid allocation type, using first_fit".to_string());
                    Strategy::FirstFit
                }
            },
        };

        match Session::new(&SessionConfig::new(size, strategy)) {
            Ok(session) => {
                self.session = Some(session);
                Response::Message(lines.join("\n"))
            }
            // The default hierarchy needs the memory to outsize the caches.
            Err(e) => Response::Message(format!("Initialization failed: {e}")),
        }
    }
}

fn set_policy(session: &mut Session, level: &str, policy: &str) -> String {
    let Some(index) = parse_level(level) else {
        return "Invalid cache level".to_string();
    };
    let Ok(policy) = ReplacementPolicy::from_str(policy) else {
        return "Invalid cache policy".to_string();
    };
    match session.set_policy(index, policy) {
        Ok(()) => format!("Cache policy for {level} set to {policy}"),
        Err(_) => "Invalid cache level".to_string(),
    }
}

fn set_strategy(session: &mut Session, name: &str) -> String {
    let Ok(strategy) = Strategy::from_str(name) else {
        return "Invalid allocation type".to_string();
    };
    if strategy == Strategy::Buddy {
        return "Buddy allocator can only be set at init".to_string();
    }
    match session.set_strategy(strategy) {
        Ok(()) => format!("Allocator set to {strategy}"),
        Err(e) => e.to_string(),
    }
}

/// `L1` -> 0, `L2` -> 1, and so on
fn parse_level(level: &str) -> Option<usize> {
    let number: usize = level.strip_prefix('L')?.parse().ok()?;
    number.checked_sub(1)
}

// =============================================================================
// Tests
// =============================================================================
