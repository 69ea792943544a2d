//! CLI route: single route table and run context. Dispatches to the lake and presentation.

use crate::auth::{self, Identity};
use crate::cli::help::command_name;
use crate::cli::parse::{Cli, Commands};
use crate::cli::presentation::{format_branches, format_pools};
use crate::commit::{Action, DataObject, Payload, RecordFormat, RecordWriter};
use crate::commitish::{Commitish, Target};
use crate::concurrency::CancelToken;
use crate::config::{ConfigLoader, LakelogConfig};
use crate::error::{HeadError, LakeError, StorageError};
use crate::head::{Head, HeadFile, HeadStore, MemoryHead};
use crate::lake::Lake;
use crate::types::{CommitId, IdGenerator, ObjectId, MAIN_BRANCH};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Per-invocation options that sit outside the configuration file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Lake directory, overriding `lake.path`.
    pub lake: Option<PathBuf>,
    /// HEAD override (`--use`).
    pub use_ref: Option<String>,
    pub quiet: bool,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
    /// Colorize text output.
    pub color: bool,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            lake: cli.lake.clone(),
            use_ref: cli.use_ref.clone(),
            quiet: cli.quiet,
            token: cli.token.clone(),
            timeout: cli.timeout.map(Duration::from_secs),
            color: false,
        }
    }
}

/// Runtime context for CLI execution: workspace, resolved paths and options.
///
/// The lake is opened by each command that needs it, never up front, so
/// argument errors are reported without touching storage.
pub struct RunContext {
    workspace_root: PathBuf,
    config: LakelogConfig,
    lake_path: PathBuf,
    head_path: PathBuf,
    options: RunOptions,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        options: RunOptions,
    ) -> Result<Self, LakeError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        let lake_path = match &options.lake {
            Some(path) => path.clone(),
            None => config.lake_path(&workspace_root),
        };
        let head_path = config.head_path(&workspace_root);

        Ok(Self {
            workspace_root,
            config,
            lake_path,
            head_path,
            options,
        })
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    pub fn lake_path(&self) -> &PathBuf {
        &self.lake_path
    }

    pub fn head_file(&self) -> HeadFile {
        HeadFile::new(self.head_path.clone())
    }

    /// HEAD for this invocation: the `--use` override if given, else the HEAD file.
    fn head(&self) -> Result<Box<dyn HeadStore>, LakeError> {
        let Some(reference) = &self.options.use_ref else {
            return Ok(Box::new(self.head_file()));
        };
        let commitish = Commitish::parse(reference)?;
        let pool = if commitish.pool.is_empty() {
            match self.head_file().read() {
                Ok(head) => head.pool,
                Err(HeadError::Unset) => return Err(LakeError::NoDefaultPool),
                Err(e) => return Err(e.into()),
            }
        } else {
            commitish.pool
        };
        let branch = if commitish.branch.is_empty() {
            MAIN_BRANCH.to_string()
        } else {
            commitish.branch
        };
        Ok(Box::new(MemoryHead::new(Some(Head::new(pool, branch)))))
    }

    fn cancel_token(&self) -> CancelToken {
        match self.options.timeout {
            Some(timeout) => CancelToken::with_timeout(timeout),
            None => CancelToken::new(),
        }
    }

    fn authenticate(&self) -> Result<Identity, LakeError> {
        let identity = auth::from_config(&self.config.auth)
            .authenticate(self.options.token.as_deref())?;
        debug!(tenant = %identity.tenant_id, user = %identity.user_id, "authenticated");
        Ok(identity)
    }

    fn open_lake(&self) -> Result<(Lake, Identity), LakeError> {
        let identity = self.authenticate()?;
        let lake = Lake::open_with(&self.lake_path, &self.cancel_token())?;
        Ok((lake, identity))
    }

    fn say(&self, out: &mut dyn Write, line: &str) -> Result<(), LakeError> {
        if !self.options.quiet {
            writeln!(out, "{}", line).map_err(StorageError::from)?;
        }
        Ok(())
    }

    /// Execute a CLI command via the single route table, writing to `out`.
    pub fn execute(&self, command: &Commands, out: &mut dyn Write) -> Result<(), LakeError> {
        debug!(command = command_name(command), "executing command");
        match command {
            Commands::Init => self.handle_init(out),
            Commands::Create { name } => self.handle_create(name, out),
            Commands::Ls { format } => self.handle_ls(format, out),
            Commands::Branch { name, from, format } => {
                self.handle_branch(name.as_deref(), from.as_deref(), format, out)
            }
            Commands::Use { refs } => self.handle_use(refs, out),
            Commands::Commit {
                message,
                user,
                add,
                delete,
                meta,
            } => self.handle_commit(message, user.as_deref(), add, delete, meta, out),
            Commands::Log {
                refs,
                stop,
                format,
                limit,
            } => self.handle_log(refs, stop.as_deref(), format, *limit, out),
        }
    }

    fn handle_init(&self, out: &mut dyn Write) -> Result<(), LakeError> {
        self.authenticate()?;
        let lake = Lake::init(&self.lake_path)?;
        self.say(out, &format!("Lake at {}", lake.root().display()))
    }

    fn handle_create(&self, name: &str, out: &mut dyn Write) -> Result<(), LakeError> {
        let (lake, _) = self.open_lake()?;
        let pool = lake.create_pool(name)?;
        self.say(out, &format!("pool created: {} {}", pool.name, pool.id))
    }

    fn handle_ls(&self, format: &str, out: &mut dyn Write) -> Result<(), LakeError> {
        let (lake, _) = self.open_lake()?;
        let listing = format_pools(&lake.pools()?, format)?;
        writeln!(out, "{}", listing).map_err(StorageError::from)?;
        Ok(())
    }

    fn handle_branch(
        &self,
        name: Option<&str>,
        from: Option<&str>,
        format: &str,
        out: &mut dyn Write,
    ) -> Result<(), LakeError> {
        let (lake, _) = self.open_lake()?;
        let head = self.head()?;
        let resolver = lake.resolver(&*head);

        let Some(name) = name else {
            // Listing: branches of the HEAD pool.
            let current = match head.read() {
                Ok(current) => current,
                Err(HeadError::Unset) => return Err(LakeError::NoDefaultPool),
                Err(e) => return Err(e.into()),
            };
            let pool = lake.pool_id(&current.pool)?;
            let branches = lake.registry().branches(&pool)?;
            let listing = format_branches(&branches, Some(&current.branch), format)?;
            writeln!(out, "{}", listing).map_err(StorageError::from)?;
            return Ok(());
        };

        let start = match from {
            Some(reference) => resolver.resolve_str(reference)?,
            None => resolver.resolve_head()?,
        };
        let branch = lake
            .registry()
            .create_branch(&start.pool_id, name, start.commit)?;
        self.say(
            out,
            &format!(
                "branch created: {} at {} on pool \"{}\"",
                branch.name, branch.commit, start.commitish.pool
            ),
        )
    }

    fn handle_use(&self, refs: &[String], out: &mut dyn Write) -> Result<(), LakeError> {
        if refs.len() > 1 {
            return Err(LakeError::TooManyArguments);
        }

        let head = self.head()?;
        let Some(reference) = refs.first() else {
            let current = head.read()?;
            writeln!(out, "HEAD at {}", current).map_err(StorageError::from)?;
            writeln!(out, "Lake at {}", self.lake_path.display()).map_err(StorageError::from)?;
            return Ok(());
        };

        let (lake, _) = self.open_lake()?;
        let resolved = lake.resolver(&*head).resolve_str(reference)?;
        let new_head = resolved.head();
        self.head_file().write(&new_head)?;
        info!(head = %new_head, "switched HEAD");
        self.say(
            out,
            &format!(
                "Switched to branch \"{}\" on pool \"{}\"",
                new_head.branch, new_head.pool
            ),
        )
    }

    fn handle_commit(
        &self,
        message: &str,
        user: Option<&str>,
        add: &[String],
        delete: &[String],
        meta: &[String],
        out: &mut dyn Write,
    ) -> Result<(), LakeError> {
        let payload_actions = parse_actions(add, delete, meta)?;
        let (lake, identity) = self.open_lake()?;
        let head = self.head()?;
        let resolved = lake.resolver(&*head).resolve_head()?;
        let branch = match &resolved.target {
            Target::Branch(name) => name.clone(),
            Target::Commit(id) => return Err(LakeError::DetachedHead(id.to_string())),
        };

        let author = user.map(str::to_string).unwrap_or(identity.user_id);
        let mut payload = Payload::new(author, message);
        payload.actions = payload_actions;

        let id = lake.commit(&resolved.pool_id, &branch, payload, &self.cancel_token())?;
        self.say(out, &format!("{} committed to {}@{}", id, resolved.commitish.pool, branch))
    }

    fn handle_log(
        &self,
        refs: &[String],
        stop: Option<&str>,
        format: &str,
        limit: Option<usize>,
        out: &mut dyn Write,
    ) -> Result<(), LakeError> {
        if refs.len() > 1 {
            return Err(LakeError::TooManyArguments);
        }
        let format: RecordFormat = format
            .parse()
            .map_err(|reason: String| LakeError::invalid_argument(format, reason))?;

        let (lake, _) = self.open_lake()?;
        let head = self.head()?;
        let resolved = lake.resolver(&*head).resolve_args(refs)?;
        let stop = match stop {
            Some(reference) => lake.commit_object(&resolved.pool_id, reference)?.id,
            None => CommitId::NIL,
        };

        let reader = lake.log(&resolved.pool_id, &resolved.target, stop, self.cancel_token())?;
        let mut writer =
            RecordWriter::new(out, format).with_color(self.options.color && format == RecordFormat::Text);
        for record in reader.take(limit.unwrap_or(usize::MAX)) {
            writer.write(&record?).map_err(StorageError::from)?;
        }
        writer.flush().map_err(StorageError::from)?;
        Ok(())
    }
}

/// Build commit actions from `--add SIZE:COUNT`, `--delete ID` and `--meta KEY=VALUE`.
fn parse_actions(add: &[String], delete: &[String], meta: &[String]) -> Result<Vec<Action>, LakeError> {
    let ids = IdGenerator::new();
    let mut actions = Vec::with_capacity(add.len() + delete.len() + meta.len());

    for entry in add {
        let (size, count) = entry
            .split_once(':')
            .and_then(|(size, count)| Some((size.parse::<u64>().ok()?, count.parse::<u64>().ok()?)))
            .ok_or_else(|| LakeError::invalid_argument(entry, "--add expects SIZE:COUNT"))?;
        actions.push(Action::Add {
            object: DataObject {
                id: ids.object_id(),
                size,
                count,
            },
        });
    }
    for id in delete {
        let object = ObjectId::parse(id)
            .ok_or_else(|| LakeError::invalid_argument(id, "--delete expects an object id"))?;
        actions.push(Action::Delete { object });
    }
    for pair in meta {
        let (key, value) = pair
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| LakeError::invalid_argument(pair, "--meta expects KEY=VALUE"))?;
        actions.push(Action::Meta {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(actions)
}
