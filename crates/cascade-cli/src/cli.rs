//! cascade CLI - Command-line interface for cascading job configuration
//!
//! Usage:
//!   cascade init --defaults defaults.yaml
//!   cascade create child --parent parent
//!   cascade set child logRotator '{days: 2}'
//!   cascade get child logRotator
//!   cascade reset child logRotator

use cascade_core::{
    CascadingConfigResolver, EffectiveValue, PropertyDefaults, ResolverOptions, Value,
    ValueSource,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// cascade - Cascading configuration for CI jobs
#[derive(Parser)]
#[command(name = "cascade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snapshot file holding the job tree (YAML, or JSON by extension)
    #[arg(short, long, global = true, default_value = "cascade.yaml")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty store
    Init {
        /// Property defaults file (YAML or JSON)
        #[arg(short, long)]
        defaults: Option<PathBuf>,

        /// Drop overrides that equal the inherited value
        #[arg(long)]
        collapse_redundant_overrides: bool,

        /// Overwrite an existing store
        #[arg(long)]
        force: bool,
    },

    /// Define a job, optionally cascading from another
    Create {
        name: String,

        /// Cascading parent job
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Change or clear the cascading parent of a job
    SetParent {
        name: String,

        /// New parent; omit to make the job a root
        parent: Option<String>,
    },

    /// Override a property on a job
    Set {
        name: String,

        key: String,

        /// Value in YAML syntax (e.g. 2, true, '{days: 2}')
        value: String,
    },

    /// Reset an overridden property back to its inherited value
    Reset { name: String, key: String },

    /// Print the effective value of a property
    Get {
        name: String,

        key: String,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print every effective property of a job
    Show {
        name: String,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the cascading hierarchy
    Tree,

    /// Rename a job; children follow
    Rename { old: String, new: String },

    /// Remove a job; its children become roots
    Remove { name: String },
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let store = cli.store;

    match cli.command {
        Commands::Init {
            defaults,
            collapse_redundant_overrides,
            force,
        } => cmd_init(&store, defaults, collapse_redundant_overrides, force),

        Commands::Create { name, parent } => mutate(&store, |jobs| {
            jobs.create_node(&name, parent.as_deref())?;
            Ok(format!("Created '{}'", name))
        }),

        Commands::SetParent { name, parent } => mutate(&store, |jobs| {
            jobs.set_parent(&name, parent.as_deref())?;
            Ok(match &parent {
                Some(p) => format!("'{}' now cascades from '{}'", name, p),
                None => format!("'{}' is now a root", name),
            })
        }),

        Commands::Set { name, key, value } => mutate(&store, |jobs| {
            let value = Value::parse(&value)?;
            jobs.set_override(&name, &key, value)?;
            let state = if jobs.is_locally_overridden(&name, &key)? {
                "overridden"
            } else {
                "inherited (equal to parent)"
            };
            Ok(format!("'{}' on '{}' is {}", key, name, state))
        }),

        Commands::Reset { name, key } => mutate(&store, |jobs| {
            let previous = jobs.reset_override(&name, &key)?;
            let now = jobs.resolve(&name, &key)?;
            Ok(format!(
                "Reset '{}' on '{}' (was {}, now {})",
                key, name, previous, now
            ))
        }),

        Commands::Get { name, key, format } => cmd_get(&store, &name, &key, &format),

        Commands::Show { name, format } => cmd_show(&store, &name, &format),

        Commands::Tree => cmd_tree(&store),

        Commands::Rename { old, new } => mutate(&store, |jobs| {
            jobs.rename_node(&old, &new)?;
            Ok(format!("Renamed '{}' to '{}'", old, new))
        }),

        Commands::Remove { name } => mutate(&store, |jobs| {
            let children = jobs
                .children(&name)?
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>();
            jobs.remove_node(&name)?;
            let mut message = format!("Removed '{}'", name);
            if !children.is_empty() {
                message.push_str(&format!(" (detached: {})", children.join(", ")));
            }
            Ok(message)
        }),
    }
}

fn load_store(path: &Path) -> Result<CascadingConfigResolver, String> {
    log::debug!("Loading store {}", path.display());
    CascadingConfigResolver::load(path)
        .map_err(|e| format!("Failed to load {}: {}", path.display(), e))
}

/// Load the store, apply one operation, write it back
///
/// A rejected operation exits with 1 and leaves the file untouched.
fn mutate(
    store: &Path,
    op: impl FnOnce(&mut CascadingConfigResolver) -> cascade_core::Result<String>,
) -> ExitCode {
    let mut jobs = match load_store(store) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let message = match op(&mut jobs) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(1);
        }
    };

    if let Err(e) = jobs.save(store) {
        eprintln!("{}: {}", "Error writing store".red(), e);
        return ExitCode::from(2);
    }

    println!("{} {}", "✓".green(), message);
    ExitCode::SUCCESS
}

fn cmd_init(
    store: &Path,
    defaults: Option<PathBuf>,
    collapse_redundant_overrides: bool,
    force: bool,
) -> ExitCode {
    if store.exists() && !force {
        eprintln!(
            "{} {} already exists (use --force to overwrite)",
            "✗".red(),
            store.display()
        );
        return ExitCode::from(1);
    }

    let defaults = match defaults {
        Some(path) => match PropertyDefaults::from_file(&path) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("{}", format!("Failed to load {}: {}", path.display(), e).red());
                return ExitCode::from(2);
            }
        },
        None => PropertyDefaults::new(),
    };
    let options = ResolverOptions {
        collapse_redundant_overrides,
    };

    let jobs = CascadingConfigResolver::with_config(defaults, options);
    if let Err(e) = jobs.save(store) {
        eprintln!("{}: {}", "Error writing store".red(), e);
        return ExitCode::from(2);
    }

    eprintln!("{} Wrote {}", "✓".green(), store.display());
    ExitCode::SUCCESS
}

fn cmd_get(store: &Path, name: &str, key: &str, format: &str) -> ExitCode {
    let jobs = match load_store(store) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let effective = match jobs.resolve(name, key) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(1);
        }
    };

    match format {
        "json" => match serde_json::to_string_pretty(&effective) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::from(2);
            }
        },
        "yaml" => match serde_yaml::to_string(&effective) {
            Ok(s) => print!("{}", s),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::from(2);
            }
        },
        _ => println!("{}", effective),
    }
    ExitCode::SUCCESS
}

fn cmd_show(store: &Path, name: &str, format: &str) -> ExitCode {
    let jobs = match load_store(store) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let all = match jobs.resolve_all(name) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(1);
        }
    };

    match format {
        "json" => match serde_json::to_string_pretty(&all) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::from(2);
            }
        },
        "yaml" => match serde_yaml::to_string(&all) {
            Ok(s) => print!("{}", s),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::from(2);
            }
        },
        _ => {
            for (key, effective) in &all {
                match describe(&jobs, name, key, effective) {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        eprintln!("{} {}", "✗".red(), e);
                        return ExitCode::from(1);
                    }
                }
            }
        }
    }
    ExitCode::SUCCESS
}

/// One text line of `show` output: value, origin and the reset link for
/// local overrides
fn describe(
    jobs: &CascadingConfigResolver,
    name: &str,
    key: &str,
    effective: &EffectiveValue,
) -> cascade_core::Result<String> {
    let line = match &effective.source {
        ValueSource::Local => format!("{} = {} {}", key.bold(), effective, "(overridden)".yellow()),
        ValueSource::Inherited { from } => format!(
            "{} = {} {}",
            key.bold(),
            effective,
            format!("(from {})", from).dimmed()
        ),
        ValueSource::Default => format!("{} = {} {}", key.bold(), effective, "(default)".dimmed()),
        ValueSource::Unset => format!("{} = {}", key.bold(), effective),
    };

    Ok(match jobs.reset_link(name, key)? {
        Some(link) => format!("{} reset: {}", line, link),
        None => line,
    })
}

fn cmd_tree(store: &Path) -> ExitCode {
    let jobs = match load_store(store) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let mut lines = Vec::new();
    for root in jobs.nodes().filter(|n| match n.parent() {
        Some(p) => !jobs.contains(p),
        None => true,
    }) {
        if let Err(e) = render_tree(&jobs, root.name(), 0, &mut lines) {
            eprintln!("{} {}", "✗".red(), e);
            return ExitCode::from(1);
        }
    }

    for line in lines {
        println!("{}", line);
    }
    ExitCode::SUCCESS
}

fn render_tree(
    jobs: &CascadingConfigResolver,
    name: &str,
    depth: usize,
    lines: &mut Vec<String>,
) -> cascade_core::Result<()> {
    let overrides = jobs.overridden_properties(name)?;
    let mut line = format!("{}{}", "  ".repeat(depth), name);
    if !overrides.is_empty() {
        line.push_str(&format!(" [{}]", overrides.join(", ")).yellow().to_string());
    }
    lines.push(line);

    for child in jobs.children(name)? {
        render_tree(jobs, child, depth + 1, lines)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn jobs() -> CascadingConfigResolver {
        let defaults = PropertyDefaults::new().with("logRotator", "off");
        let mut jobs = CascadingConfigResolver::with_config(defaults, ResolverOptions::default());
        jobs.create_node("parent", None).unwrap();
        jobs.create_node("child", Some("parent")).unwrap();
        jobs.create_node("child2", Some("child")).unwrap();
        jobs.set_override("child", "scm", "git").unwrap();
        jobs
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_describe_marks_local_override_with_reset_link() {
        colored::control::set_override(false);
        let jobs = jobs();
        let eff = jobs.resolve("child", "scm").unwrap();

        assert_eq!(
            describe(&jobs, "child", "scm", &eff).unwrap(),
            "scm = git (overridden) reset: /job/child/resetProjectProperty?propertyName=scm"
        );
    }

    #[test]
    fn test_describe_follows_renamed_job_link() {
        colored::control::set_override(false);
        let mut jobs = jobs();
        jobs.rename_node("child", "build").unwrap();
        let eff = jobs.resolve("build", "scm").unwrap();

        let line = describe(&jobs, "build", "scm", &eff).unwrap();
        assert_eq!(
            jobs.reset_link("build", "scm").unwrap().as_deref(),
            line.strip_prefix("scm = git (overridden) reset: ")
        );
        assert!(describe(&jobs, "ghost", "scm", &eff).is_err());
    }

    #[test]
    fn test_describe_inherited_and_default() {
        colored::control::set_override(false);
        let jobs = jobs();

        assert_eq!(
            describe(&jobs, "child2", "scm", &jobs.resolve("child2", "scm").unwrap()).unwrap(),
            "scm = git (from child)"
        );
        assert_eq!(
            describe(&jobs, "child2", "logRotator", &jobs.resolve("child2", "logRotator").unwrap())
                .unwrap(),
            "logRotator = off (default)"
        );
        assert_eq!(
            describe(&jobs, "child2", "quietPeriod", &jobs.resolve("child2", "quietPeriod").unwrap())
                .unwrap(),
            "quietPeriod = <unset>"
        );
    }

    #[test]
    fn test_render_tree() {
        colored::control::set_override(false);
        let jobs = jobs();
        let mut lines = Vec::new();
        render_tree(&jobs, "parent", 0, &mut lines).unwrap();

        assert_eq!(lines, vec!["parent", "  child [scm]", "    child2"]);
    }

    #[test]
    fn test_mutate_leaves_store_untouched_on_rejection() {
        let path =
            std::env::temp_dir().join(format!("cascade-cli-test-{}.yaml", std::process::id()));
        jobs().save(&path).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        mutate(&path, |jobs| {
            jobs.set_parent("parent", Some("child2"))?;
            Ok(String::new())
        });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        mutate(&path, |jobs| {
            jobs.reset_override("child", "scm")?;
            Ok(String::new())
        });
        let reloaded = CascadingConfigResolver::load(&path).unwrap();
        assert!(!reloaded.is_locally_overridden("child", "scm").unwrap());

        std::fs::remove_file(&path).unwrap();
    }
}
