//! Command dispatch

use std::io;
use std::rc::Rc;
use std::sync::Arc;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::render::render_text;
use crate::application::services::{ProcessService, RootFilter};
use crate::application::{NotificationLevel, ProcessTree, TreeDriver};
use crate::cli::args::{Cli, Commands, ConfigCommands, StatusArg, TypeArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{
    ChildrenCache, ExpansionRegistry, ExpansionSet, NewProcess, NodeId, ProcessId, ProcessNode,
};
use crate::infrastructure::{
    HttpProcessBackend, InMemoryBackend, InfraError, ProcessBackend,
};
use crate::util::path::expand_path;

/// Settings and backend shared by the catalog commands.
struct Context {
    settings: Settings,
    backend: Arc<dyn ProcessBackend>,
    color: bool,
}

impl Context {
    fn new(cli: &Cli, settings: Settings) -> CliResult<Self> {
        let backend: Arc<dyn ProcessBackend> = match &cli.fixture {
            Some(path) => Arc::new(InMemoryBackend::load_fixture(&expand_path(path))?),
            None => Arc::new(HttpProcessBackend::from_settings(&settings)?),
        };
        let color = settings.tree.color && !cli.no_color;
        Ok(Self {
            settings,
            backend,
            color,
        })
    }

    fn service(&self) -> ProcessService {
        ProcessService::new(Arc::clone(&self.backend))
    }

    fn driver(&self) -> TreeDriver {
        TreeDriver::new(Arc::clone(&self.backend))
    }
}

pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        settings.api_url = url.trim_end_matches('/').to_string();
    }
    if cli.no_color {
        colored::control::set_override(false);
    }
    debug!("settings: {:?}", settings);

    match &cli.command {
        Commands::Tree {
            department,
            search,
            expand,
            all,
            depth,
            select,
        } => {
            let ctx = Context::new(cli, settings)?;
            let filter = RootFilter {
                department: department.clone().or_else(|| ctx.settings.department.clone()),
                search: search.clone(),
            };
            let depth = all.then(|| depth.unwrap_or(ctx.settings.tree.expand_depth));
            cmd_tree(&ctx, &filter, expand, depth, select.as_deref()).await
        }
        Commands::Children { parent } => {
            let ctx = Context::new(cli, settings)?;
            cmd_children(&ctx, &ProcessId::new(parent.as_str())).await
        }
        Commands::Reorder { parent, children } => {
            let ctx = Context::new(cli, settings)?;
            let order = children.iter().map(|c| ProcessId::new(c.as_str())).collect();
            cmd_reorder(&ctx, &ProcessId::new(parent.as_str()), order).await
        }
        Commands::Create {
            parent,
            name,
            description,
            process_type,
            status,
            department,
        } => {
            let ctx = Context::new(cli, settings)?;
            let draft = new_process(name, description, *process_type, *status, department);
            cmd_create(&ctx, &ProcessId::new(parent.as_str()), draft).await
        }
        Commands::Config { command } => cmd_config(cli, &settings, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "procat", &mut io::stdout());
            Ok(())
        }
    }
}

fn new_process(
    name: &str,
    description: &Option<String>,
    process_type: TypeArg,
    status: StatusArg,
    department: &Option<String>,
) -> NewProcess {
    NewProcess {
        name: name.to_string(),
        description: description.clone(),
        process_type: process_type.into(),
        status: status.into(),
        department_id: department.clone().unwrap_or_default(),
        parent_id: None,
    }
}

/// Tree with a single root, loaded from the backend and opened.
async fn open_single(
    ctx: &Context,
    driver: &mut TreeDriver,
    tree: &mut ProcessTree,
) -> CliResult<NodeId> {
    let root = tree
        .roots()
        .first()
        .copied()
        .ok_or_else(|| CliError::Usage("no process to show".into()))?;
    if !tree.is_expanded(root) {
        tree.toggle_expand(root)?;
    }
    driver.run_until_idle(tree).await;
    debug!("opened {:?} against {}", root, ctx.settings.api_url);
    Ok(root)
}

/// Print notifications; returns the first error message.
fn report(driver: &mut TreeDriver) -> Option<String> {
    let mut rejected = None;
    for n in driver.take_notifications() {
        output::notification(&n);
        if n.level == NotificationLevel::Error && rejected.is_none() {
            rejected = Some(n.detail.clone().unwrap_or(n.message.clone()));
        }
    }
    rejected
}

#[instrument(level = "debug", skip(ctx, expand))]
async fn cmd_tree(
    ctx: &Context,
    filter: &RootFilter,
    expand: &[String],
    depth: Option<usize>,
    select: Option<&str>,
) -> CliResult<()> {
    let roots = ctx.service().list_roots(filter).await?;
    if roots.is_empty() {
        output::warning("no processes found");
        return Ok(());
    }

    let registry = ExpansionSet::shared();
    for id in expand {
        registry.expand(&ProcessId::new(id.as_str()));
    }
    let mut tree = ProcessTree::new(roots, Rc::clone(&registry), ChildrenCache::shared());
    let mut driver = ctx.driver();
    driver.run_until_idle(&mut tree).await;

    if let Some(depth) = depth {
        while tree.expand_to_depth(depth) > 0 {
            driver.run_until_idle(&mut tree).await;
        }
    }

    if let Some(id) = select {
        let id = ProcessId::new(id);
        match tree.find(&id) {
            Some(node) => {
                let selection = tree.select(node)?;
                driver.run_until_idle(&mut tree).await;
                print_process(&selection.process);
            }
            None => output::warning(&format!("{} is not visible in the tree", id)),
        }
    }

    print!("{}", render_text(&tree, ctx.color));
    report(&mut driver);
    Ok(())
}

async fn cmd_children(ctx: &Context, parent: &ProcessId) -> CliResult<()> {
    let children = ctx.service().children(parent).await?;
    if children.is_empty() {
        output::info(&crate::application::render::EMPTY_LABEL);
        return Ok(());
    }
    for child in &children {
        output::info(&format!(
            "{}\t{}\t{}\t{}",
            child.id,
            child.name,
            child.process_type.label(),
            child.status.label()
        ));
    }
    Ok(())
}

#[instrument(level = "debug", skip(ctx))]
async fn cmd_reorder(ctx: &Context, parent: &ProcessId, order: Vec<ProcessId>) -> CliResult<()> {
    let process = ctx.service().process(parent).await?;
    let mut tree = ProcessTree::standalone(vec![process]);
    let mut driver = ctx.driver();
    let root = open_single(ctx, &mut driver, &mut tree).await?;

    if tree.displayed_children(root) == order {
        output::info(&"order unchanged");
        return Ok(());
    }
    tree.reorder(root, order)?;
    tree.drag_end(root)?;
    driver.run_until_idle(&mut tree).await;

    let rejected = report(&mut driver);
    print!("{}", render_text(&tree, ctx.color));
    match rejected {
        Some(message) => Err(CliError::Rejected(message)),
        None => Ok(()),
    }
}

#[instrument(level = "debug", skip(ctx, draft), fields(name = %draft.name))]
async fn cmd_create(ctx: &Context, parent: &ProcessId, draft: NewProcess) -> CliResult<()> {
    let service = ctx.service();
    let process = service.process(parent).await?;

    let registry = ExpansionSet::shared();
    let cache = ChildrenCache::shared();
    let mut tree = ProcessTree::new(vec![process], Rc::clone(&registry), Rc::clone(&cache))
        .with_add_subprocess(true);
    let mut driver = ctx.driver();
    let root = tree
        .roots()
        .first()
        .copied()
        .ok_or_else(|| CliError::Usage("no process to show".into()))?;

    // The add affordance names the parent the new process goes under.
    tree.request_add_subprocess(root)?;
    driver.dispatch(&mut tree);
    let Some(target) = driver.take_add_requests().into_iter().next() else {
        return Err(CliError::Usage("subprocess creation not offered".into()));
    };

    let created = service
        .create_subprocess(&target.id, draft, registry.as_ref(), &cache)
        .await?;
    tree.sync();
    driver.run_until_idle(&mut tree).await;

    output::action("Created", &format!("{} ({})", created.name, created.id));
    print!("{}", render_text(&tree, ctx.color));
    report(&mut driver);
    Ok(())
}

fn print_process(process: &ProcessNode) {
    output::header(&process.name);
    output::detail(&format!("id: {}", process.id));
    output::detail(&format!("type: {}", process.process_type.label()));
    output::detail(&format!("status: {}", process.status.label()));
    if !process.department_id.is_empty() {
        output::detail(&format!("department: {}", process.department_id));
    }
    if let Some(description) = &process.description {
        output::detail(description);
    }
}

fn cmd_config(cli: &Cli, settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("wrote {}", path.display()));
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not found)" };
                    output::action("global", &format!("{}{}", path.display(), state));
                }
                None => output::warning("cannot determine config directory"),
            }
            if let Some(path) = &cli.config {
                output::action("explicit", &expand_path(path).display());
            }
            Ok(())
        }
    }
}
