mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::project_io::{self, ProjectError};
use crate::io::recovery;
use crate::io::store::{FallbackStore, FileStore, atomic_write};
use crate::io::watcher::DocumentWatcher;
use crate::model::project::Project;
use crate::model::task::Task;
use crate::ops::self_check::{self, SelfCheckError};
use crate::ops::session::Session;
use crate::ops::views::{self, View};
use crate::parse::tokens::iso_date;

type ProjectSession = Session<FallbackStore<FileStore, FileStore>>;

/// Options shared by every command
struct Context {
    json: bool,
    project_dir: Option<PathBuf>,
    /// Fixed by `--now`; otherwise the wall clock is read on each use
    fixed_now: Option<NaiveDateTime>,
}

impl Context {
    fn now(&self) -> NaiveDateTime {
        self.fixed_now.unwrap_or_else(|| Local::now().naive_local())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let project_dir = match cli.project_dir {
        Some(ref dir) => Some(
            std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        ),
        None => None,
    };
    let ctx = Context {
        json: cli.json,
        project_dir,
        fixed_now: cli.now.as_deref().map(parse_now).transpose()?,
    };

    match cli.command {
        // Init is handled in main.rs before project discovery
        Commands::Init(args) => cmd_init(args, cli.project_dir.as_deref()),

        // Read commands
        Commands::List(args) => cmd_list(args, &ctx),
        Commands::Views => cmd_views(&ctx),
        Commands::Check => cmd_check(&ctx),
        Commands::Export(args) => cmd_export(args, &ctx),
        Commands::Watch(args) => cmd_watch(args, &ctx),
        Commands::Recovery(args) => cmd_recovery(args, &ctx),

        // Write commands
        Commands::Toggle(args) => cmd_toggle(args, &ctx),
        Commands::Import(args) => cmd_import(args, &ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse `--now`: a date (taken at midnight) or a date and time
fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("invalid --now '{}': use YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS", s))
}

/// Parse `--before`: RFC 3339, or a date taken as midnight UTC
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{}': use YYYY-MM-DD or RFC 3339", s))
}

fn load_project_ctx(ctx: &Context) -> Result<Project, ProjectError> {
    let start = match ctx.project_dir {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir().map_err(ProjectError::IoError)?,
    };
    let root = project_io::discover_project(&start)?;
    project_io::load_project(&root)
}

/// Open the project's document as a hydrated session with one derivation applied
fn open_session(project: &Project, ctx: &Context) -> ProjectSession {
    let mut session =
        Session::new(project_io::open_store(project)).with_recovery_dir(&project.flowmark_dir);
    session.hydrate();
    session.refresh(ctx.now());
    session
}

fn parse_view(arg: Option<&str>) -> View {
    match arg {
        Some(s) => s.parse().unwrap_or(View::All),
        None => View::All,
    }
}

/// Tasks for `view` in listing order. Falls back to All (with a warning)
/// when the view has no tab for this document.
fn collect_view_tasks<'a>(
    session: &'a ProjectSession,
    view: View,
    today: &str,
    document_order: bool,
) -> (View, Vec<&'a Task>) {
    let doc = session.document();
    let tabs = views::tabs(doc, session.text().trim().is_empty(), today);
    let resolved = views::resolve_view(view.clone(), &tabs);
    if resolved != view {
        eprintln!("warning: no '{}' view in this document; listing all", view);
    }
    let mut tasks = views::filter_tasks(doc, &resolved, today);
    if !document_order {
        views::sort_for_display(&mut tasks);
    }
    (resolved, tasks)
}

fn print_task_list(
    view: &View,
    tasks: &[&Task],
    today: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let out = TaskListJson {
            view: view.key(),
            today: today.to_string(),
            tasks: tasks.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if tasks.is_empty() {
        println!("No tasks.");
    } else {
        let with_sections = !matches!(view, View::Section(_) | View::Inbox);
        for line in format_task_listing(tasks, with_sections) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let session = open_session(&project, ctx);
    let today = iso_date(ctx.now().date());

    let view = parse_view(args.view.as_deref());
    let (view, mut tasks) = collect_view_tasks(&session, view, &today, args.document_order);
    if let Some(ref tag) = args.tag {
        tasks.retain(|t| t.has_tag(tag));
    }
    print_task_list(&view, &tasks, &today, ctx.json)
}

fn cmd_views(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let session = open_session(&project, ctx);
    let today = iso_date(ctx.now().date());
    let doc = session.document();
    let tabs = views::tabs(doc, session.text().trim().is_empty(), &today);

    if ctx.json {
        let out = ViewsJson {
            sections: &doc.sections,
            headings: &doc.headings,
            tabs: &tabs,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for tab in &tabs {
            println!("{}", format_tab(tab));
        }
    }
    Ok(())
}

fn cmd_check(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    report_check(self_check::run_self_check(), ctx.json)
}

/// Print the self-check outcome. A failure is printed as JSON first when
/// asked for, then returned so `main` sets the exit code.
fn report_check(
    result: Result<(), SelfCheckError>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let out = CheckJson {
            ok: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    result?;
    if !json {
        println!("✓ parser self-check passed");
    }
    Ok(())
}

fn cmd_export(args: ExportArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let session = open_session(&project, ctx);
    atomic_write(std::path::Path::new(&args.file), session.text().as_bytes())
        .map_err(|e| format!("could not write {}: {}", args.file, e))?;
    println!(
        "exported {} tasks to {}",
        session.document().tasks.len(),
        args.file
    );
    Ok(())
}

fn cmd_watch(args: WatchArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let mut session = open_session(&project, ctx);
    let view = parse_view(args.view.as_deref());
    let quiet = Duration::from_millis(project.config.timing.parse_debounce_ms);

    let show = |session: &ProjectSession| -> Result<(), Box<dyn std::error::Error>> {
        let today = iso_date(ctx.now().date());
        let (resolved, tasks) = collect_view_tasks(session, view.clone(), &today, false);
        if ctx.json {
            let out = TaskListJson {
                view: resolved.key(),
                today,
                tasks,
            };
            println!("{}", serde_json::to_string(&out)?);
        } else {
            print_task_list(&resolved, &tasks, &today, false)?;
            println!();
        }
        Ok(())
    };

    show(&session)?;
    let watcher = DocumentWatcher::start(&project.document_path())?;
    eprintln!("watching {} (Ctrl-C to stop)", project.document_path().display());

    while watcher.wait_settled(quiet) {
        if !session.reload() {
            continue;
        }
        let applied = session.refresh(ctx.now());
        if let Some(id) = applied.newly_completed
            && let Some(task) = session.document().find_task(&id)
            && !ctx.json
        {
            println!("✓ done: {}", task.title);
        }
        show(&session)?;
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let dir = &project.flowmark_dir;

    match args.command {
        Some(RecoveryCommand::Path) => {
            println!("{}", recovery::recovery_log_path(dir).display());
        }
        Some(RecoveryCommand::Prune(prune)) => {
            let before = prune.before.as_deref().map(parse_timestamp).transpose()?;
            let removed = recovery::prune_recovery(dir, before, prune.all)?;
            println!("pruned {} recovery entries", removed);
        }
        None => {
            let entries = recovery::read_recovery_entries(dir, Some(args.limit));
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No recovery entries.");
            } else {
                for entry in &entries {
                    print!("{}", entry.render());
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_toggle(args: ToggleArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let mut session = open_session(&project, ctx);

    let (task_id, patch) = match (args.id, args.line) {
        (_, Some(line)) => (None, session.toggle_line(line)?),
        (Some(prefix), None) => {
            let task = session
                .document()
                .find_task_by_prefix(&prefix)
                .cloned()
                .ok_or_else(|| format!("no unique task matches id '{}'", prefix))?;
            let patch = session.toggle(&task)?;
            (Some(task.id), patch)
        }
        (None, None) => return Err("give a task id or --line".into()),
    };
    session.save()?;
    let applied = session.refresh(ctx.now());

    let completed = patch.new_text.starts_with("- [x]");
    if ctx.json {
        let out = ToggleJson {
            id: task_id.as_deref(),
            completed,
            patch: &patch,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}: {}", patch.line_number, patch.new_text);
        if let Some(id) = applied.newly_completed
            && let Some(task) = session.document().find_task(&id)
        {
            println!("✓ done: {}", task.title);
        }
    }
    Ok(())
}

fn cmd_import(args: ImportArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_ctx(ctx)?;
    let mut session = open_session(&project, ctx);

    let markdown = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    session.set_text(markdown);
    session.save()?;
    session.refresh(ctx.now());

    println!(
        "imported {} tasks in {} sections",
        session.document().tasks.len(),
        session.document().sections.len()
    );
    Ok(())
}
