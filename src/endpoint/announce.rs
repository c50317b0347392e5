//! Startup announcement telling the caller how to point its environment at the broker.

// self
use crate::_prelude::*;

/// Environment variable holding the token URL.
pub const ENDPOINT_VAR: &str = "MSI_ENDPOINT";
/// Environment variable holding the shared secret.
pub const SECRET_VAR: &str = "MSI_SECRET";

/// Shell syntax used for the printed assignments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Shell {
	/// Windows `cmd.exe`: `set NAME=value`.
	#[default]
	Cmd,
	/// PowerShell: `$env:NAME = "value"`.
	#[value(name = "powershell")]
	PowerShell,
	/// POSIX shells: `export NAME='value'`.
	Posix,
}
impl Shell {
	fn assignment(self, name: &str, value: &str) -> String {
		match self {
			Shell::Cmd => format!("set {name}={value}"),
			Shell::PowerShell => format!("$env:{name} = \"{value}\""),
			Shell::Posix => format!("export {name}='{value}'"),
		}
	}
}
impl Display for Shell {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Shell::Cmd => "cmd",
			Shell::PowerShell => "powershell",
			Shell::Posix => "posix",
		})
	}
}

/// The two environment assignments printed once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
	/// Shell the lines are rendered for.
	pub shell: Shell,
	/// Full token URL including the bound port.
	pub endpoint: String,
	/// Shared secret callers must send in the `secret` header.
	pub secret: String,
}
impl Display for Announcement {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		writeln!(f, "{}", self.shell.assignment(ENDPOINT_VAR, &self.endpoint))?;
		write!(f, "{}", self.shell.assignment(SECRET_VAR, &self.secret))
	}
}
