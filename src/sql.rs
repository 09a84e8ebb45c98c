use std::process::Command;

use camino::Utf8Path;

pub const DEFAULT_PSQL: &str = "psql";

/// Builds invocations of the SQL client used to apply script files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SqlClient {
    pub psql: String,
    pub database: String,
}

impl SqlClient {
    pub fn new(psql: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            psql: psql.into(),
            database: database.into(),
        }
    }

    /// Argument vector that runs `file` quietly and aborts on the first SQL error.
    pub fn argv(&self, file: &Utf8Path) -> Vec<String> {
        vec![
            self.psql.clone(),
            "-v".to_owned(),
            "ON_ERROR_STOP=1".to_owned(),
            "-q".to_owned(),
            "-d".to_owned(),
            self.database.clone(),
            "-f".to_owned(),
            file.to_string(),
        ]
    }

    pub fn command(&self, file: &Utf8Path) -> Command {
        let argv = self.argv(file);
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        command
    }
}

/// Render an argv for display, quoting arguments that contain whitespace.
pub fn format_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.chars().any(|c| c.is_whitespace()) {
                let escaped = arg.replace('"', "\\\"");
                format!("\"{}\"", escaped)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_runs_file_against_database() {
        let client = SqlClient::new("psql", "sales");
        let argv = client.argv(Utf8Path::new("R1/SQL.files/001.sql"));
        assert_eq!(
            argv,
            [
                "psql",
                "-v",
                "ON_ERROR_STOP=1",
                "-q",
                "-d",
                "sales",
                "-f",
                "R1/SQL.files/001.sql"
            ]
        );
    }

    #[test]
    fn command_uses_configured_binary() {
        let client = SqlClient::new("/opt/pg/bin/psql", "orders");
        let command = client.command(Utf8Path::new("a.sql"));
        assert_eq!(command.get_program(), "/opt/pg/bin/psql");
        let args: Vec<_> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["-v", "ON_ERROR_STOP=1", "-q", "-d", "orders", "-f", "a.sql"]);
    }

    #[test]
    fn format_command_quotes_whitespace() {
        let argv = vec!["psql".to_owned(), "-f".to_owned(), "my file.sql".to_owned()];
        assert_eq!(format_command(&argv), "psql -f \"my file.sql\"");
    }
}
