use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8PathBuf;

use crate::cli::{Cli, Command, ConfigCommand, PathArgs, SqlArgs};
use crate::config::{self, DbtConfig, LoadedConfig};
use crate::hierarchy;
use crate::layout::Identifiers;
use crate::sql::{SqlClient, format_command};

pub fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = CliContext::try_from(&cli)?;

    match cli.command {
        Command::Config { command } => handle_config(&ctx, command).map(|()| ExitCode::SUCCESS),
        other => {
            let state = AppState::new(ctx)?;
            handle_with_state(&state, other)
        }
    }
}

fn handle_with_state(state: &AppState, command: Command) -> Result<ExitCode> {
    match command {
        Command::Check => {
            if handle_check(state)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Init => handle_init(state).map(|()| ExitCode::SUCCESS),
        Command::Path(args) => handle_path(state, &args).map(|()| ExitCode::SUCCESS),
        Command::Sql(args) => handle_sql(state, &args).map(|()| ExitCode::SUCCESS),
        Command::Config { .. } => unreachable!("config commands handled earlier"),
    }
}

fn handle_check(state: &AppState) -> Result<bool> {
    let (database, schema) = state.database_and_schema()?;
    let base = state.base_dir();
    tracing::debug!("checking layout under {} for {}.{}", base, database, schema);

    if hierarchy::check_dirs(&base, database, schema) {
        println!("ok: layout for {}.{} is complete under {}", database, schema, base);
        Ok(true)
    } else {
        println!("missing: layout for {}.{} is incomplete under {}", database, schema, base);
        println!("Run `dbt init` to create the missing directories.");
        Ok(false)
    }
}

fn handle_init(state: &AppState) -> Result<()> {
    let (database, schema) = state.database_and_schema()?;
    let base = state.base_dir();

    hierarchy::make_missing_dirs(&base, database, schema)
        .with_context(|| format!("creating layout for {}.{} under {}", database, schema, base))?;
    tracing::info!("layout for {}.{} is ready under {}", database, schema, base);
    Ok(())
}

fn handle_path(state: &AppState, args: &PathArgs) -> Result<()> {
    let ids = Identifiers {
        database: state.config.database.as_deref(),
        schema: state.config.schema.as_deref(),
        release: args.release.as_deref(),
    };
    let path = args.location.resolve(&state.base_dir(), ids)?;
    println!("{}", path);
    Ok(())
}

fn handle_sql(state: &AppState, args: &SqlArgs) -> Result<()> {
    let file = utf8(args.file.clone(), "SQL file path")?;
    let database = state
        .config
        .database
        .as_deref()
        .ok_or_else(|| anyhow!("no database selected; pass --database or set `database` in config"))?;

    let client = SqlClient::new(state.config.psql(), database);
    let render = format_command(&client.argv(&file));
    println!("{}", render);
    if args.dry_run {
        println!("    (dry-run) skipped");
        return Ok(());
    }

    let status = client
        .command(&file)
        .status()
        .with_context(|| format!("executing `{}`", render))?;
    if status.success() {
        Ok(())
    } else {
        bail!("command `{}` failed with exit code {:?}", render, status.code())
    }
}

fn handle_config(ctx: &CliContext, command: Option<ConfigCommand>) -> Result<()> {
    match command {
        None | Some(ConfigCommand::Show) => {
            let loaded = ctx.load_config()?;
            if loaded.files.is_empty() {
                println!("No config files found; using defaults.");
            }
            for file in &loaded.files {
                println!("Config file: {} ({})", file.path, file.source.as_str());
            }
            print!("{}", config::format_summary(&loaded.config));
            Ok(())
        }
        Some(ConfigCommand::Path) => {
            for file in ctx.candidate_files()? {
                let marker = if file.path.exists() { "" } else { " [absent]" };
                println!("{}: {}{}", file.source.as_str(), file.path, marker);
            }
            Ok(())
        }
        Some(ConfigCommand::Generate { path, force }) => {
            let target = match path {
                Some(path) => utf8(path, "config generate path")?,
                None => ctx.writable_config_path()?,
            };
            config::write_example_config(&target, force)?;
            if force {
                println!("Overwrote config at {}", target);
            } else {
                println!("Wrote example config to {}", target);
            }
            Ok(())
        }
        Some(ConfigCommand::SetBaseDir { dir }) => {
            let target = ctx.writable_config_path()?;
            config::set_base_dir(&target, &dir)?;
            println!("Base directory set to `{}` in {}", dir, target);
            Ok(())
        }
    }
}

fn utf8(path: PathBuf, what: &str) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|_| anyhow!("{} must be valid UTF-8", what))
}

/// Values taken straight from the command line.
#[derive(Clone, Debug)]
struct CliContext {
    file: Option<Utf8PathBuf>,
    overrides: DbtConfig,
}

impl TryFrom<&Cli> for CliContext {
    type Error = anyhow::Error;

    fn try_from(cli: &Cli) -> Result<Self> {
        let file = cli
            .file
            .clone()
            .map(|path| utf8(path, "config path"))
            .transpose()?;
        let base_dir = cli
            .base_dir
            .clone()
            .map(|path| utf8(path, "base directory").map(String::from))
            .transpose()?;
        Ok(Self {
            file,
            overrides: DbtConfig {
                base_dir,
                psql: cli.psql.clone(),
                database: cli.database.clone(),
                schema: cli.schema.clone(),
            },
        })
    }
}

impl CliContext {
    fn candidate_files(&self) -> Result<Vec<config::ConfigFile>> {
        config::candidate_files(self.file.as_deref())
    }

    /// Layered file config with command-line flags applied last.
    fn load_config(&self) -> Result<LoadedConfig> {
        self.load_config_from(&self.candidate_files()?)
    }

    fn load_config_from(&self, files: &[config::ConfigFile]) -> Result<LoadedConfig> {
        let mut loaded = config::load_layered(files)?;
        loaded.config.merge(self.overrides.clone());
        Ok(loaded)
    }

    /// The file that config edits go to: `--file` if given, else the personal config.
    fn writable_config_path(&self) -> Result<Utf8PathBuf> {
        match &self.file {
            Some(path) => Ok(path.clone()),
            None => config::personal_config_path(),
        }
    }
}

struct AppState {
    config: DbtConfig,
}

impl AppState {
    fn new(ctx: CliContext) -> Result<Self> {
        let loaded = ctx.load_config()?;
        Ok(Self {
            config: loaded.config,
        })
    }

    fn base_dir(&self) -> Utf8PathBuf {
        self.config.base_dir()
    }

    fn database_and_schema(&self) -> Result<(&str, &str)> {
        let database = self
            .config
            .database
            .as_deref()
            .ok_or_else(|| anyhow!("no database selected; pass --database or set `database` in config"))?;
        let schema = self
            .config
            .schema
            .as_deref()
            .ok_or_else(|| anyhow!("no schema selected; pass --schema or set `schema` in config"))?;
        Ok((database, schema))
    }
}
