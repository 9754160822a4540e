pub mod render;

use std::{io::IsTerminal, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use render::{render_calendar, render_today, TodayView};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    storage::local_store::FileStore,
    sync::{memory::OfflineMirror, rest::RestMirror, RemoteMirror},
    tracker::Tracker,
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, LOG_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "consistency", version, long_about = None)]
#[command(about = "Track daily habits and see them on a monthly heatmap", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "CONSISTENCY_REMOTE_URL",
        help = "Base url of the remote mirror, e.g. https://<project>.firebaseio.com"
    )]
    remote: Option<String>,
    #[arg(
        long = "remote-timeout",
        global = true,
        default_value_t = 10,
        help = "Seconds to wait for a single remote request"
    )]
    remote_timeout: u64,
    #[arg(long, global = true, help = "Disable colors")]
    plain: bool,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
    #[arg(long = "log-filter", global = true)]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show today's tasks and progress")]
    Today,
    #[command(about = "Add a task")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Name of the task")]
        name: Vec<String>,
    },
    #[command(about = "Delete a task by id")]
    Remove { id: String },
    #[command(about = "Mark a task as done for today, or undo it")]
    Toggle { id: String },
    #[command(about = "Show or change the title")]
    Title {
        #[arg(num_args = 0.., help = "New title. A blank title resets it to the default")]
        title: Vec<String>,
    },
    #[command(about = "Display the monthly heatmap")]
    Calendar {
        #[arg(long, default_value_t = 0, help = "Go back this many months")]
        back: u32,
        #[arg(long, default_value_t = 0, help = "Go forward this many months")]
        forward: u32,
    },
    #[command(about = "Print the id this installation syncs under")]
    Whoami,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = args
        .log_filter
        .or(if args.log { Some(LevelFilter::TRACE) } else { None });
    enable_logging(LOG_PREFIX, &app_dir.join("logs"), logging_level, args.log)?;

    let store = Arc::new(FileStore::new(app_dir.join("store"))?);
    let mirror: Arc<dyn RemoteMirror> = match args.remote.as_deref() {
        Some(url) => Arc::new(RestMirror::new(
            url,
            Duration::from_secs(args.remote_timeout),
        )?),
        None => Arc::new(OfflineMirror),
    };

    let (mut tracker, _refreshes) = Tracker::start(store, mirror, Arc::new(DefaultClock))?;
    let colored = !args.plain && std::io::stdout().is_terminal();

    // Remote wins on load, so bring local state up to date before acting on it.
    tracker.refresh_from_remote();
    tracker.flush().await;

    let result = run_command(&mut tracker, args.commands, colored);

    tracker.flush().await;
    tracker.shutdown().await?;
    result
}

fn run_command(tracker: &mut Tracker, command: Commands, colored: bool) -> Result<()> {
    match command {
        Commands::Today => print_today(tracker, colored),
        Commands::Add { name } => {
            match tracker.add_task(&name.join(" "))? {
                Some(task) => println!("Added {} ({})\n", task.name, task.id),
                None => println!("Task name is empty, nothing added\n"),
            }
            print_today(tracker, colored)
        }
        Commands::Remove { id } => {
            tracker.remove_task(&id)?;
            print_today(tracker, colored)
        }
        Commands::Toggle { id } => {
            if !tracker.registry().list()?.iter().any(|task| task.id == id) {
                info!("Toggling {id} which is not a known task");
            }
            tracker.toggle_task(&id)?;
            print_today(tracker, colored)
        }
        Commands::Title { title } => {
            if title.is_empty() {
                println!("{}", tracker.local_title()?);
            } else {
                println!("{}", tracker.set_title(&title.join(" "))?);
            }
            Ok(())
        }
        Commands::Calendar { back, forward } => {
            for _ in 0..back {
                tracker.prev_month();
            }
            for _ in 0..forward {
                tracker.next_month();
            }
            print!("{}", render_calendar(&tracker.month_grid()?, colored)?);
            Ok(())
        }
        Commands::Whoami => {
            println!("{}", tracker.user_id());
            Ok(())
        }
    }
}

fn print_today(tracker: &Tracker, colored: bool) -> Result<()> {
    let title = tracker.local_title()?;
    let tasks = tracker.registry().list()?;
    let record = tracker.today_record()?;
    let progress = tracker.today_progress()?;
    let view = TodayView {
        title: &title,
        today: tracker.today(),
        tasks: &tasks,
        record: &record,
        progress,
    };
    print!("{}", render_today(&view, colored)?);
    Ok(())
}
