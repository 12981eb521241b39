use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Utc;

use crate::cli::{Cli, Commands, ConfigCommands, ExportFormat, RotateDirection, Target, absolute};
use crate::config::AnnotationConfig;
use crate::consts::DEFAULT_REFERENCE_DELIMITER;
use crate::core::{
    AnnotationSchema, CheckState, Moved, ReferenceResolver, Session, check_compatibility,
    find_images, missing_references, shuffle,
};
use crate::error::{AppError, ConfigError, SessionError, StoreError};
use crate::output::{
    StatusInfo, output_file_detail_json, output_files_json, output_session_csv,
    output_status_json, output_summary_json, print_file_detail, print_file_table,
    print_status_table, print_summary_table, summarize,
};
use crate::settings::Settings;
use crate::store::{
    BackupManager, BackupSchedule, load_session, save_session, write_pretty, write_text,
};

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a AnnotationConfig,
    /// File the active config was read from
    pub(crate) config_path: &'a Path,
}

impl CommandContext<'_> {
    fn schema(&self) -> AnnotationSchema {
        AnnotationSchema::from_config(self.config)
    }

    fn backups(&self) -> BackupManager {
        BackupManager::new(self.config.backup_dir(), self.config.max_backups)
    }

    fn session_path(&self) -> Result<&Path, AppError> {
        self.cli.session.as_deref().ok_or(AppError::NoSession)
    }
}

/// A session together with the file it lives in
struct OpenSession {
    path: PathBuf,
    session: Session,
}

fn open_session(ctx: &CommandContext<'_>, settings: &Settings) -> Result<OpenSession, AppError> {
    let path = ctx.session_path()?.to_path_buf();
    let record = load_session(&path)?;
    let schema = ctx.schema();
    let problems = check_compatibility(&record, &schema);
    if !problems.is_empty() {
        return Err(SessionError::Incompatible(problems).into());
    }
    let mut session = Session::from_record(record, schema)?;
    if settings.json_path.as_deref() == Some(path.as_path()) {
        session.restore_position(settings.last_file.as_deref(), settings.last_index);
    }
    tracing::debug!(
        "Opened {} ({} images, at {})",
        path.display(),
        session.len(),
        session.current_index()
    );
    Ok(OpenSession { path, session })
}

/// Back up `session` when the configured interval has passed. A failed
/// backup is logged and does not fail the command.
fn backup_if_due(ctx: &CommandContext<'_>, session: &Session) {
    let manager = ctx.backups();
    let schedule = BackupSchedule::every_minutes(ctx.config.backup_interval);
    let result = manager.last_backup_time().and_then(|last| {
        if schedule.is_due(last, SystemTime::now()) {
            manager.backup(&session.to_record(), Utc::now()).map(Some)
        } else {
            tracing::debug!(
                "Next backup not due yet (interval {}s)",
                schedule.interval().as_secs()
            );
            Ok(None)
        }
    });
    if let Err(e) = result {
        tracing::warn!("Automatic backup failed: {e}");
    }
}

/// Write the session, remember where the user is and run a scheduled backup
fn persist(
    ctx: &CommandContext<'_>,
    settings: &mut Settings,
    open: &OpenSession,
) -> Result<(), AppError> {
    save_session(&open.path, &open.session.to_record())?;
    settings.remember_session(open.path.clone());
    settings.config_path = Some(ctx.config_path.to_path_buf());
    if let Some(file) = open.session.current() {
        settings.remember_position(&file.filename, open.session.current_index());
    }
    settings.save()?;
    backup_if_due(ctx, &open.session);
    Ok(())
}

/// An exact filename wins over a position, so images named only by digits
/// stay reachable
fn resolve_target(session: &Session, input: &str) -> Target {
    if session.index_of(input).is_some() {
        Target::File(input.to_string())
    } else {
        Target::parse(input)
    }
}

fn target_index(session: &Session, input: &str) -> Result<usize, SessionError> {
    if session.is_empty() {
        return Err(SessionError::Empty);
    }
    match resolve_target(session, input) {
        Target::Index(index) if index < session.len() => Ok(index),
        Target::Index(index) => Err(SessionError::IndexOutOfRange {
            index,
            len: session.len(),
        }),
        Target::File(name) => session
            .index_of(&name)
            .ok_or(SessionError::UnknownFile { name }),
    }
}

fn print_file(ctx: &CommandContext<'_>, session: &Session, index: usize) {
    let resolver = ReferenceResolver::new(&session.reference_directory, &session.reference_delimiter);
    let Some(file) = session.files().get(index) else {
        return;
    };
    let reference = resolver.resolve(&file.filename);
    let exists = reference.is_file();
    if ctx.cli.json {
        println!(
            "{}",
            output_file_detail_json(session, index, &reference, exists)
        );
    } else {
        print_file_detail(session, index, &reference, exists, ctx.cli.use_color());
    }
}

/// Report where a navigation step landed
fn print_moved(ctx: &CommandContext<'_>, session: &Session, moved: Moved) {
    if ctx.cli.json {
        return print_file(ctx, session, moved.to);
    }
    if moved.all_rated {
        println!("All images have been rated.");
    }
    if let Some(file) = session.current() {
        println!("▶ {} ({}/{})", file.filename, moved.to + 1, session.len());
    }
}

struct InitArgs<'a> {
    images: Option<&'a Path>,
    reference: Option<&'a Path>,
    delimiter: Option<&'a str>,
    output: &'a Path,
    shuffle_seed: Option<u64>,
    force: bool,
}

fn handle_init(
    ctx: &CommandContext<'_>,
    settings: &mut Settings,
    args: InitArgs<'_>,
) -> Result<(), AppError> {
    let output = absolute(args.output.to_path_buf());
    if output.exists() && !args.force {
        return Err(AppError::AlreadyExists { path: output });
    }

    let images = args
        .images
        .map(Path::to_path_buf)
        .or_else(|| settings.image_path.clone())
        .map(absolute)
        .ok_or(AppError::MissingDirectory { flag: "images" })?;
    let reference = args
        .reference
        .map(Path::to_path_buf)
        .or_else(|| settings.reference_path.clone())
        .map(absolute)
        .ok_or(AppError::MissingDirectory { flag: "reference" })?;
    let delimiter = args
        .delimiter
        .map(str::to_string)
        .or_else(|| settings.reference_delimiter.clone())
        .unwrap_or_else(|| DEFAULT_REFERENCE_DELIMITER.to_string());
    for dir in [&images, &reference] {
        if !dir.is_dir() {
            return Err(AppError::NotADirectory { path: dir.clone() });
        }
    }

    let mut files = find_images(&images);
    if files.is_empty() {
        return Err(SessionError::Empty.into());
    }
    if let Some(seed) = args.shuffle_seed {
        shuffle(&mut files, seed);
    }
    tracing::info!("Found {} images in {}", files.len(), images.display());

    let resolver = ReferenceResolver::new(&reference, &delimiter);
    let missing = missing_references(&resolver, files.iter().map(String::as_str));
    if !missing.is_empty() {
        tracing::warn!(
            "{} of {} images have no reference image ({} of {} unique names)",
            missing.files.len(),
            files.len(),
            missing.unique_missing,
            missing.unique_expected
        );
        for file in &missing.files {
            tracing::debug!("No reference for {file}: expected {}", resolver.resolve(file).display());
        }
    }

    let session = Session::new(
        images.clone(),
        reference.clone(),
        delimiter.clone(),
        files,
        ctx.schema(),
    );
    let open = OpenSession {
        path: output,
        session,
    };
    settings.image_path = Some(images);
    settings.reference_path = Some(reference);
    settings.reference_delimiter = Some(delimiter);
    persist(ctx, settings, &open)?;

    if ctx.cli.json {
        println!("{}", output_status_json(&status_info(ctx, &open)?));
    } else {
        println!(
            "Created session {} with {} images.",
            open.path.display(),
            open.session.len()
        );
    }
    Ok(())
}

fn status_info(ctx: &CommandContext<'_>, open: &OpenSession) -> Result<StatusInfo, AppError> {
    let session = &open.session;
    Ok(StatusInfo {
        task: ctx.config.task.clone(),
        session_path: Some(open.path.clone()),
        image_directory: session.image_directory.clone(),
        reference_directory: session.reference_directory.clone(),
        progress: session.progress(),
        current: session
            .current()
            .map(|f| (session.current_index(), f.filename.clone())),
        backups: ctx.backups().list()?.len(),
    })
}

fn handle_status(ctx: &CommandContext<'_>, settings: &Settings) -> Result<(), AppError> {
    let open = open_session(ctx, settings)?;
    let info = status_info(ctx, &open)?;
    if ctx.cli.json {
        println!("{}", output_status_json(&info));
    } else {
        print_status_table(&info, ctx.cli.use_color());
    }
    Ok(())
}

fn handle_list(ctx: &CommandContext<'_>, settings: &Settings, pending: bool) -> Result<(), AppError> {
    let open = open_session(ctx, settings)?;
    if ctx.cli.json {
        println!("{}", output_files_json(&open.session, pending));
    } else {
        print_file_table(&open.session, pending, ctx.cli.use_color());
    }
    Ok(())
}

fn handle_show(
    ctx: &CommandContext<'_>,
    settings: &Settings,
    target: Option<&str>,
) -> Result<(), AppError> {
    let open = open_session(ctx, settings)?;
    let session = &open.session;
    if session.is_empty() {
        return Err(SessionError::Empty.into());
    }
    let index = match target {
        Some(target) => target_index(session, target)?,
        None => session.current_index(),
    };
    print_file(ctx, session, index);
    Ok(())
}

enum Step<'a> {
    Next { failed: bool },
    Prev,
    Goto(&'a str),
}

fn handle_navigation(
    ctx: &CommandContext<'_>,
    settings: &mut Settings,
    step: Step<'_>,
) -> Result<(), AppError> {
    let mut open = open_session(ctx, settings)?;
    let moved = match step {
        Step::Next { failed } => open.session.next(failed)?,
        Step::Prev => open.session.previous()?,
        Step::Goto(target) => match resolve_target(&open.session, target) {
            Target::Index(index) => open.session.go_to(index)?,
            Target::File(name) => open.session.go_to_file(&name)?,
        },
    };
    persist(ctx, settings, &open)?;
    print_moved(ctx, &open.session, moved);
    Ok(())
}

/// A change to the current image
enum Edit<'a> {
    Check { finding: &'a str, state: &'a str },
    /// `None` clears the rating
    Rate {
        category: &'a str,
        label: Option<&'a str>,
    },
    Note(&'a str),
    Rotate(RotateDirection),
}

fn handle_edit(
    ctx: &CommandContext<'_>,
    settings: &mut Settings,
    edit: Edit<'_>,
) -> Result<(), AppError> {
    let mut open = open_session(ctx, settings)?;
    let session = &mut open.session;
    let message = match edit {
        Edit::Check { finding, state } => {
            let state = CheckState::parse(state).ok_or_else(|| AppError::InvalidCheckState {
                input: state.to_string(),
            })?;
            session.set_checkbox(finding, state)?;
            format!("{finding}: {state}")
        }
        Edit::Rate {
            category,
            label: None,
        } => {
            session.clear_rating(category)?;
            format!("{category}: cleared")
        }
        Edit::Rate {
            category,
            label: Some(label),
        } => {
            session.set_rating(category, label)?;
            format!("{category}: {}", label.trim())
        }
        Edit::Note(text) => {
            session.set_notes(text)?;
            "Notes updated".to_string()
        }
        Edit::Rotate(direction) => {
            let degrees = session.rotate(direction.into())?;
            format!("Rotation: {degrees}°")
        }
    };
    persist(ctx, settings, &open)?;

    if ctx.cli.json {
        print_file(ctx, &open.session, open.session.current_index());
    } else if let Some(file) = open.session.current() {
        println!("{} · {message}", file.filename);
    }
    Ok(())
}

fn handle_save(
    ctx: &CommandContext<'_>,
    settings: &mut Settings,
    save_as: Option<&Path>,
) -> Result<(), AppError> {
    let mut open = open_session(ctx, settings)?;
    if let Some(path) = save_as {
        open.path = absolute(path.to_path_buf());
    }
    persist(ctx, settings, &open)?;
    if ctx.cli.json {
        println!("{}", serde_json::json!({ "saved": open.path }));
    } else {
        println!("Saved session to {}", open.path.display());
    }
    Ok(())
}

fn handle_export(
    ctx: &CommandContext<'_>,
    settings: &Settings,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), AppError> {
    let open = open_session(ctx, settings)?;
    match (format, output) {
        (ExportFormat::Json, Some(path)) => write_pretty(path, &open.session.to_record())?,
        (ExportFormat::Json, None) => {
            let json = serde_json::to_string_pretty(&open.session.to_record())
                .map_err(StoreError::from)?;
            println!("{json}");
        }
        (ExportFormat::Csv, Some(path)) => {
            write_text(path, &output_session_csv(&open.session))?;
        }
        (ExportFormat::Csv, None) => print!("{}", output_session_csv(&open.session)),
    }
    if let Some(path) = output {
        tracing::info!("Exported {} images to {}", open.session.len(), path.display());
    }
    Ok(())
}

fn handle_backup(ctx: &CommandContext<'_>, settings: &Settings) -> Result<(), AppError> {
    let open = open_session(ctx, settings)?;
    let outcome = ctx.backups().backup(&open.session.to_record(), Utc::now())?;
    if ctx.cli.json {
        let value = serde_json::json!({
            "path": outcome.path,
            "removed": outcome.removed,
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        println!("Backed up to {}", outcome.path.display());
        if !outcome.removed.is_empty() {
            println!("Removed {} old backup(s)", outcome.removed.len());
        }
    }
    Ok(())
}

/// Report every incompatibility at once instead of failing on the first
fn handle_validate(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let path = ctx.session_path()?;
    let record = load_session(path)?;
    let problems = check_compatibility(&record, &ctx.schema());

    if ctx.cli.json {
        let value = serde_json::json!({
            "session": path,
            "config": ctx.config_path,
            "compatible": problems.is_empty(),
            "problems": problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    }
    if !problems.is_empty() {
        return Err(SessionError::Incompatible(problems).into());
    }
    if !ctx.cli.json {
        println!(
            "{} is compatible with {} ({} images).",
            path.display(),
            ctx.config_path.display(),
            record.files.len()
        );
    }
    Ok(())
}

fn handle_summary(ctx: &CommandContext<'_>, settings: &Settings) -> Result<(), AppError> {
    let open = open_session(ctx, settings)?;
    let summary = summarize(&open.session);
    if ctx.cli.json {
        println!("{}", output_summary_json(&summary));
    } else {
        print_summary_table(&summary, ctx.cli.use_color());
    }
    Ok(())
}

/// Write a default config. Runs before any config is loaded.
pub(crate) fn handle_config_init(output: Option<&Path>, force: bool) -> Result<(), AppError> {
    let path = output
        .map(|p| absolute(p.to_path_buf()))
        .unwrap_or_else(AnnotationConfig::default_path);
    if path.exists() && !force {
        return Err(AppError::AlreadyExists { path });
    }
    AnnotationConfig::default().write(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn handle_config_show(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    if ctx.cli.json {
        let value = serde_json::json!({
            "path": ctx.config_path,
            "config": ctx.config,
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        let yaml = serde_yaml::to_string(ctx.config).map_err(ConfigError::from)?;
        println!("# {}", ctx.config_path.display());
        print!("{yaml}");
    }
    Ok(())
}

pub(crate) fn handle_command(ctx: &CommandContext<'_>, settings: &mut Settings) -> Result<(), AppError> {
    let Some(command) = &ctx.cli.command else {
        return handle_status(ctx, settings);
    };
    match command {
        Commands::Init {
            images,
            reference,
            delimiter,
            output,
            no_shuffle,
            seed,
            force,
        } => handle_init(
            ctx,
            settings,
            InitArgs {
                images: images.as_deref(),
                reference: reference.as_deref(),
                delimiter: delimiter.as_deref(),
                output,
                shuffle_seed: (!no_shuffle).then_some(*seed),
                force: *force,
            },
        ),
        Commands::Status => handle_status(ctx, settings),
        Commands::List { pending } => handle_list(ctx, settings, *pending),
        Commands::Show { target } => handle_show(ctx, settings, target.as_deref()),
        Commands::Next { failed } => {
            handle_navigation(ctx, settings, Step::Next { failed: *failed })
        }
        Commands::Prev => handle_navigation(ctx, settings, Step::Prev),
        Commands::Goto { target } => handle_navigation(ctx, settings, Step::Goto(target)),
        Commands::Check { finding, state } => {
            handle_edit(ctx, settings, Edit::Check { finding, state })
        }
        Commands::Rate {
            category,
            label,
            clear,
        } => handle_edit(
            ctx,
            settings,
            Edit::Rate {
                category,
                label: label.as_deref().filter(|_| !*clear),
            },
        ),
        Commands::Note { text } => handle_edit(ctx, settings, Edit::Note(text)),
        Commands::Rotate { direction } => {
            handle_edit(ctx, settings, Edit::Rotate(*direction))
        }
        Commands::Save { save_as } => handle_save(ctx, settings, save_as.as_deref()),
        Commands::Export { format, output } => {
            handle_export(ctx, settings, *format, output.as_deref())
        }
        Commands::Backup => handle_backup(ctx, settings),
        Commands::Validate => handle_validate(ctx),
        Commands::Summary => handle_summary(ctx, settings),
        Commands::Config { command } => match command {
            ConfigCommands::Init { output, force } => handle_config_init(output.as_deref(), *force),
            ConfigCommands::Show => handle_config_show(ctx),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(names: &[&str]) -> Session {
        Session::new(
            PathBuf::from("img"),
            PathBuf::from("ref"),
            String::new(),
            names.iter().map(|s| s.to_string()).collect(),
            AnnotationSchema::default(),
        )
    }

    #[test]
    fn targets_match_filenames_before_positions() {
        let s = session(&["3", "a.png", "b.png"]);
        assert_eq!(resolve_target(&s, "3"), Target::File("3".to_string()));
        assert_eq!(resolve_target(&s, "2"), Target::Index(1));
        assert_eq!(target_index(&s, "3").unwrap(), 0);
        assert_eq!(target_index(&s, "2").unwrap(), 1);
        assert_eq!(target_index(&s, "b.png").unwrap(), 2);
        assert!(matches!(
            target_index(&s, "4"),
            Err(SessionError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            target_index(&s, "c.png"),
            Err(SessionError::UnknownFile { .. })
        ));
    }

    #[test]
    fn targets_on_empty_session() {
        assert!(matches!(
            target_index(&session(&[]), "1"),
            Err(SessionError::Empty)
        ));
    }
}
