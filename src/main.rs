use command_core::command::commands::{ActionCommand, InsertTextCommand, SetTitleCommand};
use command_core::messaging::channels::drain_notifications;
use command_core::config::LoggingConfig;
use command_core::{AsyncTaskQueue, CommandHistory, CoreConfig, Document, logging};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

fn load_config() -> CoreConfig {
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        return CoreConfig::default();
    };

    match CoreConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("{} ({:?}), using defaults", e, path);
            CoreConfig::default()
        }
    }
}

fn run_history_demo(config: &CoreConfig) {
    let mut history = CommandHistory::from_config(&config.history);
    let mut doc = Document::new("Untitled");

    let steps: Vec<Box<dyn command_core::UndoableCommand<Document>>> = vec![
        Box::new(ActionCommand::new("Action 1")),
        Box::new(ActionCommand::new("Action 2")),
        Box::new(SetTitleCommand::new("Notes")),
        Box::new(InsertTextCommand::new(0, "hello")),
    ];
    if let Err(e) = history.execute_batch(steps, &mut doc) {
        error!("{}", e);
        return;
    }

    for _ in 0..3 {
        match history.undo(&mut doc) {
            Ok(outcome) => info!(?outcome, "undo"),
            Err(e) => error!("{}", e),
        }
    }
    match history.redo(&mut doc) {
        Ok(outcome) => info!(?outcome, "redo"),
        Err(e) => error!("{}", e),
    }

    info!(
        title = %doc.title,
        text = %doc.text,
        undo = history.undo_count(),
        redo = history.redo_count(),
        "history demo finished"
    );
    for entry in &doc.journal {
        println!("  {}", entry);
    }
}

async fn run_queue_demo(config: &CoreConfig) {
    let (queue, mut notifications) = AsyncTaskQueue::from_config(&config.queue);

    queue.add_fn("Task 1", || async {
        println!("Task 1 start");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        println!("Task 1 end");
        Ok(())
    });
    queue.add_fn("Task 2", || async {
        println!("Task 2 start");
        tokio::time::sleep(Duration::from_millis(500)).await;
        println!("Task 2 end");
        Ok(())
    });

    queue.wait_idle().await;

    match serde_json::to_string(&queue.stats()) {
        Ok(stats) => info!(queue = queue.name(), %stats, "queue demo finished"),
        Err(e) => error!("Failed to serialize queue stats: {}", e),
    }
    for notification in drain_notifications(&mut notifications) {
        println!("  {:?}: {}", notification.level, notification.message);
    }
}

#[tokio::main]
async fn main() {
    // Start on the default filter so loading the config is logged too
    let log = logging::init(&LoggingConfig::default());
    let config = load_config();
    if let Some(log) = &log {
        log.apply(&config.logging);
    }

    println!("=== command_core demo ===\n");

    println!("--- Command history ---");
    run_history_demo(&config);

    println!("\n--- Async task queue ---");
    run_queue_demo(&config).await;
}
