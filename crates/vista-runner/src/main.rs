//! Vista runner - main entry point.
//!
//! Loads settings and a candidate dataset, builds the demo screens and
//! prints what a renderer would draw.

mod cli;
mod demo;
mod logging;
mod render;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;

use vista_core::config::SortOrder;
use vista_core::EngineSettings;
use vista_engine::{
    ActionDispatcher, ActionOutcome, Board, DetailScreen, DialogBus, DropOutcome, ListParams, ListScreen,
    LogNavigator, QueryBinder, QueryState, SettleOutcome,
};

use cli::{Cli, Command};
use demo::Candidate;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("vista error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    let settings = match &cli.settings {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::load_default().unwrap_or_else(|e| {
            tracing::warn!("Failed to load settings: {}, using defaults", e);
            EngineSettings::default()
        }),
    };

    let candidates = demo::load_candidates(cli.data.as_deref())?;
    let source = Arc::new(demo::source(candidates));
    let binder = Arc::new(QueryBinder::from_settings(source, &settings));
    let dispatcher = Arc::new(ActionDispatcher::new(binder.clone(), DialogBus::new(), Arc::new(LogNavigator)));

    match cli.command {
        Command::List {
            status,
            search,
            hot,
            sort,
            desc,
            page,
        } => {
            let config = demo::list_config(settings.query.page_size)?;
            let screen = ListScreen::new(Arc::new(config), dispatcher);
            if let Some(status) = status {
                screen.set_filter("status", status);
            }
            if let Some(search) = search {
                screen.set_filter("search", search);
            }
            if hot {
                screen.set_filter("is_on_hotlist", true);
            }
            if let Some(sort) = sort {
                let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
                screen.set_sort(sort, order);
            }
            screen.set_page(page);
            list(&screen).await
        }
        Command::Show { id, section } => {
            let screen = DetailScreen::new(Arc::new(demo::detail_config()?), id, dispatcher);
            if let Some(section) = section {
                if !screen.sections().set_section(&section) {
                    bail!("unknown section '{}'", section);
                }
            }
            show(&screen).await
        }
        Command::Action { action, id } => {
            let screen = DetailScreen::new(Arc::new(demo::detail_config()?), id, dispatcher);
            screen.load().await.context("loading candidate")?;
            match screen.run_action(&action).await {
                ActionOutcome::Navigated { path } => println!("Navigated to {}", path),
                ActionOutcome::Mutated { key, result } => println!("Ran {}: {}", key, result),
                ActionOutcome::DialogRequested { namespace, delivery } => match screen.dialogs().current() {
                    Some(request) => println!("Opened dialog '{}' for {}", request.dialog_id, request.entity_id),
                    None => println!("Dialog request on '{}' was {:?}", namespace, delivery),
                },
                ActionOutcome::Hidden => bail!("action '{}' is not available", action),
                ActionOutcome::Failed(error) => bail!("action '{}' failed: {}", action, error),
            }
            Ok(())
        }
        Command::Board { move_id, to } => board(binder, &settings, move_id, to).await,
    }
}

async fn list(screen: &ListScreen<Candidate>) -> Result<()> {
    let config = screen.config();
    println!("{}", config.title);
    if let Some(description) = &config.description {
        println!("{}", description);
    }

    match screen.stats().await {
        Ok(stats) => {
            let cards: Vec<String> = stats.iter().map(|(label, value)| format!("{}: {}", label, value)).collect();
            println!("{}\n", cards.join(" | "));
        }
        Err(e) => tracing::warn!("Stats unavailable: {}", e),
    }

    screen.refresh().await;
    match screen.state() {
        QueryState::Pending => println!("Loading..."),
        QueryState::Error(error) => bail!(error),
        QueryState::Data(page) => {
            if let Some((title, description)) = screen.empty_state() {
                println!("{}\n{}", title, description);
                return Ok(());
            }
            println!("{}", render::list_rows(&screen.rows()));
            println!(
                "\nShowing {}-{} of {}{}",
                page.offset + 1,
                page.offset + page.len(),
                page.total,
                if page.has_more { " (more)" } else { "" }
            );
        }
    }
    Ok(())
}

async fn show(screen: &DetailScreen<Candidate>) -> Result<()> {
    screen.load().await.context("loading candidate")?;

    let Some(header) = screen.header() else {
        bail!("candidate '{}' did not load", screen.entity_id());
    };
    let crumbs: Vec<&str> = screen.config().breadcrumbs.iter().map(|b| b.label.as_str()).collect();
    println!("{} / {}\n", crumbs.join(" / "), header.title);
    println!("{}\n", render::header(&header));

    if let Some((steps, completed)) = screen.journey() {
        println!("{}\n", render::journey(&steps, completed));
    }

    let current = screen.sections().current();
    for section in screen.sections().sections() {
        let marker = if section.id == current { "*" } else { " " };
        match screen.section_count(&section.id) {
            Some(count) => println!("{} {} ({})", marker, section.label, count),
            None => println!("{} {}", marker, section.label),
        }
    }

    let related = screen.related();
    for name in related.failed() {
        println!("! {} failed to load", name);
    }

    println!("\n{}", render::actions(&screen.quick_actions(), &screen.menu()));
    Ok(())
}

async fn board(
    binder: Arc<QueryBinder>,
    settings: &EngineSettings,
    move_id: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let query = binder.list::<Candidate>(demo::LIST_QUERY);
    query.fetch(ListParams::new()).await;
    let records = match query.state() {
        QueryState::Data(page) => page.items,
        QueryState::Error(error) => bail!(error),
        QueryState::Pending => Vec::new(),
    };

    let mut board = Board::new(demo::board_mapping()?, binder, demo::STATUS_MUTATION)
        .with_settings(settings)
        .invalidating(&[demo::LIST_QUERY]);
    board.replace_records(records);

    if let (Some(id), Some(column)) = (move_id, to) {
        if !board.begin_drag(&id) {
            bail!("no card '{}' on the board", id);
        }
        if !board.drag_over(&column) {
            board.drag_cancel();
            bail!("no column '{}'", column);
        }
        match board.drag_end() {
            DropOutcome::Commit(commit) => {
                let request = tokio::spawn(commit.run());
                let result = request.await.context("commit task")?;
                match board.settle_commit(result) {
                    SettleOutcome::Committed { record_id, status } => println!("Moved {} to {}\n", record_id, status),
                    SettleOutcome::Reverted { record_id, error, .. } => {
                        println!("Move of {} failed: {}\n", record_id, error)
                    }
                    SettleOutcome::Superseded { .. } => {}
                }
            }
            DropOutcome::Unchanged { record_id } => println!("{} is already in {}\n", record_id, column),
            DropOutcome::Idle | DropOutcome::Click { .. } => {}
        }
    }

    for view in board.columns() {
        let cards: Vec<String> = view.records.iter().map(|c| c.full_name()).collect();
        println!("{} ({}): {}", view.column.title, view.records.len(), cards.join(", "));
    }
    Ok(())
}
