//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ObjectGraph, RecipeBuilder};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Process {
            data_dir,
            output,
            git_dir,
        }) => cmd_process(data_dir, output.as_deref(), git_dir.as_deref()),
        Some(Commands::Recipe { data_dir, id }) => cmd_recipe(data_dir, id),
        Some(Commands::Tree { data_dir, id }) => cmd_tree(data_dir, id),
        Some(Commands::TechTree {
            data_dir,
            id,
            depth,
        }) => cmd_tech_tree(data_dir, id, *depth),
        Some(Commands::Info { data_dir }) => cmd_info(data_dir),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `crafttree --help`".to_string(),
        )),
    }
}

fn container(data_dir: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(data_dir))?;
    Ok(ServiceContainer::new(settings))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| InfraError::Serialize {
        context: "render document".to_string(),
        source: e,
    })?;
    output::info(&json);
    Ok(())
}

#[instrument]
fn cmd_process(data_dir: &Path, out: Option<&Path>, git_dir: Option<&Path>) -> CliResult<()> {
    let services = container(data_dir)?;
    let settings = &services.settings;
    let mut graph = services.loader().load(data_dir)?;

    let git_dir = git_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.git_dir_for(data_dir));
    if services.fs.exists(&git_dir.join(".git")) {
        let changelog = services.changelog();
        let log = changelog.fetch(&git_dir)?;
        changelog.populate(&git_dir, &log, &mut graph)?;
        changelog.report_missing(&graph, settings.versions.suppress_missing_report);
    } else {
        info!("No git checkout at {}, skipping versions", git_dir.display());
    }

    let out = out.map_or_else(|| settings.output_dir.clone(), Path::to_path_buf);
    let summary = services.exporter().export(&graph, &out)?;

    output::success(&format!(
        "Exported {} objects to {}",
        summary.objects,
        out.display()
    ));
    output::detail(&format!("{} recipes", summary.recipes));
    if summary.recipe_cycles > 0 {
        output::warning(&format!(
            "{} recipes omitted because of cycles",
            summary.recipe_cycles
        ));
    }
    Ok(())
}

#[instrument]
fn cmd_recipe(data_dir: &Path, id: &str) -> CliResult<()> {
    let services = container(data_dir)?;
    let graph = services.loader().load(data_dir)?;
    let object = graph.require(id)?;

    let recipe = RecipeBuilder::with_options(&graph, services.settings.recipe_options()).build(object)?;
    if !recipe.has_data() {
        output::warning(&format!("{} has no recipe", describe(&graph, id)));
    }
    print_json(&recipe.json_data())
}

#[instrument]
fn cmd_tree(data_dir: &Path, id: &str) -> CliResult<()> {
    let services = container(data_dir)?;
    let graph = services.loader().load(data_dir)?;
    let object = graph.require(id)?;

    let recipe = RecipeBuilder::with_options(&graph, services.settings.recipe_options()).build(object)?;
    output::info(&recipe.to_tree_string());
    Ok(())
}

#[instrument]
fn cmd_tech_tree(data_dir: &Path, id: &str, depth: Option<u32>) -> CliResult<()> {
    let services = container(data_dir)?;
    let graph = services.loader().load(data_dir)?;
    let object = graph.require(id)?;

    let depth = depth.unwrap_or(services.settings.recipe.tech_tree_depth);
    debug!("depth: {}", depth);
    print_json(&graph.tech_tree_node(object, depth))
}

#[instrument]
fn cmd_info(data_dir: &Path) -> CliResult<()> {
    let services = container(data_dir)?;
    let graph = services.loader().load(data_dir)?;

    let natural = graph.objects().filter(|(_, o)| o.is_natural()).count();
    let craftable = graph
        .objects()
        .filter(|(r, o)| !o.is_natural() && graph.primary_transition(*r).is_some())
        .count();
    let unreachable = graph
        .objects()
        .filter(|(_, o)| !o.depth.has_value())
        .count();

    output::header(&format!("Content: {}", data_dir.display()));
    output::action("Objects", &graph.object_count());
    output::action("Transitions", &graph.transition_count());
    output::action("Natural", &natural);
    output::action("Craftable", &craftable);
    output::action("Unreachable", &unreachable);
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { data_dir } => {
            let settings = Settings::load(data_dir.as_deref())?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path { data_dir } => {
            let global = global_config_path()
                .map(|p| path_status(&p))
                .unwrap_or_else(|| "(no config directory)".to_string());
            output::action("Global", &global);
            if let Some(dir) = data_dir {
                output::action("Local", &path_status(&local_config_path(dir)));
            }
            Ok(())
        }
        ConfigCommands::Init { global, data_dir } => {
            let path = match (*global, data_dir) {
                (true, _) => global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?,
                (false, Some(dir)) => local_config_path(dir),
                (false, None) => {
                    return Err(CliError::InvalidArgs(
                        "data_dir is required without --global".to_string(),
                    ))
                }
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("Created {}", path.display()));
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
    }
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn describe(graph: &ObjectGraph, id: &str) -> String {
    graph
        .lookup(id)
        .and_then(|o| graph.object(o).name.clone())
        .map_or_else(|| id.to_string(), |name| format!("{} ({})", name, id))
}

fn path_status(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
