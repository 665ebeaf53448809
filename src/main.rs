use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use stow::areas::refs::Head;
use stow::areas::repository::Repository;
use stow::artifacts::log::HistoryEntry;
use stow::artifacts::merge::MergeOutcome;
use stow::config::Config;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STOW_LOG";

#[derive(Parser)]
#[command(
    name = "stow",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A minimal content-addressed version control system",
    long_about = "stow records snapshots of files as commits, keeps branches pointing at them \
    and merges divergent branches with a three-way comparison of file digests.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command records the current content of files in the index. \
        Directories are expanded to the files beneath them."
    )]
    Add {
        #[arg(index = 1, required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the staged files as a new commit on top of HEAD."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "log",
        about = "Show commit history",
        long_about = "This command walks first parents from HEAD, or from the given revision, back to the root commit."
    )]
    Log {
        #[arg(long, help = "Show one commit per line")]
        oneline: bool,
        #[arg(index = 1, help = "Branch name or commit digest to start from")]
        revision: Option<String>,
    },
    #[command(
        name = "branch",
        about = "Create, list, or delete branches",
        subcommand_required = true
    )]
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },
    #[command(
        name = "checkout",
        about = "Switch to a branch or commit",
        long_about = "This command moves HEAD and writes the files of the target commit into the working directory. \
        A digest detaches HEAD."
    )]
    Checkout {
        #[arg(index = 1, help = "Branch name or commit digest")]
        target: String,
    },
    #[command(
        name = "merge",
        about = "Merge a branch into the current one",
        long_about = "This command fast-forwards when possible, otherwise creates a merge commit. \
        Conflicting paths are reported and nothing is written."
    )]
    Merge {
        #[arg(index = 1, help = "The branch to merge")]
        branch: String,
        #[arg(short, long, help = "Message for the merge commit")]
        message: Option<String>,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the content of an object in the repository. \
        It requires the digest of the object to be specified."
    )]
    CatFile {
        #[arg(short = 'p', long, help = "The object digest to print")]
        digest: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object store",
        long_about = "This command hashes a file and can write it to the object store. \
        It requires the path to the file to be specified."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object store")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "ls-files",
        about = "List staged files or the files of a commit",
        long_about = "This command prints `<digest> <path>` for every staged file, \
        or for every file of the given commit."
    )]
    LsFiles {
        #[arg(long, help = "Revision whose files are listed instead of the index")]
        commit: Option<String>,
    },
}

#[derive(Subcommand)]
enum BranchAction {
    #[command(name = "create", about = "Create a new branch")]
    Create {
        #[arg(index = 1, help = "The branch name")]
        name: String,
        #[arg(index = 2, help = "Revision to start from, HEAD by default")]
        start: Option<String>,
    },
    #[command(name = "list", about = "List branches")]
    List,
    #[command(name = "delete", about = "Delete a branch")]
    Delete {
        #[arg(index = 1, help = "The branch name")]
        name: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_repository(config: Config) -> Result<Repository> {
    let pwd = std::env::current_dir().context("unable to read the current directory")?;

    Ok(Repository::open(&pwd, config)?)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load_from_env().context("invalid configuration")?;

    if let Commands::Init { path } = &cli.command {
        let path = match path {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("unable to read the current directory")?,
        };
        let repository = Repository::new(&path, config)?;
        repository.init().await?;

        println!(
            "Initialized empty stow repository in {}",
            repository.repository_path().display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let repository = open_repository(config)?;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Add { paths } => {
            repository.stage_paths(&paths).await?;
        }
        Commands::Commit { message } => {
            let oid = repository.commit(&message).await?;
            let commit = repository.database().parse_object_as_commit(&oid)?;
            let head_label = match repository.current_branch()? {
                Some(branch) => branch.to_string(),
                None => "detached HEAD".to_string(),
            };
            let root_label = if commit.parents().is_empty() {
                " (root-commit)"
            } else {
                ""
            };

            println!(
                "[{head_label}{root_label} {}] {}",
                oid.to_short_oid(),
                commit.short_message()
            );
        }
        Commands::Log { oneline, revision } => {
            let history = match revision {
                Some(revision) => repository.view_history_from(&revision)?,
                None => repository.view_history()?,
            };
            print_history(&history, oneline);
        }
        Commands::Branch { action } => run_branch(&repository, action)?,
        Commands::Checkout { target } => match repository.checkout(&target).await? {
            Head::Symbolic(branch) => println!("Switched to branch '{branch}'"),
            Head::Detached(oid) => println!("HEAD is now at {}", oid.to_short_oid()),
        },
        Commands::Merge { branch, message } => {
            return print_merge(repository.merge(&branch, message.as_deref())?);
        }
        Commands::CatFile { digest } => {
            let blob = repository.cat_file(&digest)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(blob.content())?;
            stdout.flush()?;
        }
        Commands::HashObject { write, file } => {
            println!("{}", repository.hash_object(&file, write)?);
        }
        Commands::LsFiles { commit } => {
            let entries = match commit {
                Some(revision) => repository.list_commit_files(&revision)?,
                None => repository.staged_entries().await?,
            };
            for entry in entries {
                println!("{} {}", entry.oid(), entry.as_str());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn run_branch(repository: &Repository, action: BranchAction) -> Result<()> {
    match action {
        BranchAction::Create { name, start } => {
            repository.create_branch(&name, start.as_deref())?;
        }
        BranchAction::List => {
            let current = repository.current_branch()?;
            for branch in repository.list_branches()? {
                if current.as_ref() == Some(&branch) {
                    println!("* {}", branch.to_string().green());
                } else {
                    println!("  {branch}");
                }
            }
        }
        BranchAction::Delete { name } => {
            let oid = repository.delete_branch(&name)?;
            println!("Deleted branch {name} (was {}).", oid.to_short_oid());
        }
    }

    Ok(())
}

fn print_history(history: &[HistoryEntry], oneline: bool) {
    for (position, entry) in history.iter().enumerate() {
        if oneline {
            println!(
                "{} {}",
                entry.oid.to_short_oid().yellow(),
                entry.short_message()
            );
            continue;
        }

        if position > 0 {
            println!();
        }
        println!("{}", format!("commit {}", entry.oid).yellow());
        if entry.is_merge() {
            let parents = entry
                .parents
                .iter()
                .map(|parent| parent.to_short_oid())
                .collect::<Vec<_>>()
                .join(" ");
            println!("Merge: {parents}");
        }
        println!("Date:   {}", entry.timestamp.readable());
        println!();
        for line in entry.message.lines() {
            println!("    {line}");
        }
    }
}

fn print_merge(outcome: MergeOutcome) -> Result<ExitCode> {
    match outcome {
        MergeOutcome::AlreadyUpToDate => println!("Already up to date."),
        MergeOutcome::FastForward(oid) => println!("Fast-forward to {}", oid.to_short_oid()),
        MergeOutcome::Merged(oid) => {
            println!("Merge made by the 'three-way' strategy: {}", oid.to_short_oid())
        }
        MergeOutcome::Conflicted(paths) => {
            for path in paths {
                println!("CONFLICT (content): {}", path.display());
            }
            println!("Automatic merge failed; nothing was committed.");
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
