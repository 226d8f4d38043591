//! Terminal review loop

use anyhow::Result;
use app_core::{
    AppState, ContentSize, ControllerEvent, FinalizationOutcome, GestureEvent,
};
use app_fs::{format_file_size, MediaFilter};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

/// Nominal viewport the zoom state is computed against
const VIEWPORT: (f32, f32) = (1280.0, 720.0);
const FRAME: Duration = Duration::from_millis(16);

const HELP: &str = "\
Commands:
  n, next          show next item
  p, prev          show previous item
  d, delete        swipe current item away (marks it for deletion)
  x, now           delete current item right away
  u, undo          bring back the last swiped item
  c, commit        delete every marked item
  f, fav           favorite current item
  z, zoom          toggle zoom on current item
  i, info          show details of current item
  s, shuffle       load a new random batch
  filter <type>    all, images, gifs or videos
  stats            deletion statistics
  q, quit          commit marks and exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Delete,
    DeleteNow,
    Undo,
    Commit,
    Favorite,
    Zoom,
    Info,
    Shuffle,
    Filter(MediaFilter),
    Stats,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or("").to_ascii_lowercase();

    let command = match head.as_str() {
        "" | "n" | "next" => Command::Next,
        "p" | "prev" => Command::Prev,
        "d" | "delete" => Command::Delete,
        "x" | "now" => Command::DeleteNow,
        "u" | "undo" => Command::Undo,
        "c" | "commit" => Command::Commit,
        "f" | "fav" | "favorite" => Command::Favorite,
        "z" | "zoom" => Command::Zoom,
        "i" | "info" => Command::Info,
        "s" | "shuffle" | "more" => Command::Shuffle,
        "filter" => {
            let kind = words.next().ok_or("filter needs a type")?;
            Command::Filter(kind.parse()?)
        }
        "stats" => Command::Stats,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(command)
}

struct App {
    state: AppState,
    events: broadcast::Receiver<ControllerEvent>,
    input: Lines<BufReader<Stdin>>,
}

/// Run the review loop until the user quits or stdin closes
pub async fn run(state: AppState) -> Result<()> {
    let events = state.controller.events();
    let mut app = App {
        state,
        events,
        input: BufReader::new(tokio::io::stdin()).lines(),
    };

    app.state.viewer.on_viewport_resized(VIEWPORT.0, VIEWPORT.1);
    app.state.controller.load_media().await;
    app.drain_events();
    app.refresh().await;

    println!("{}", HELP);
    app.show();

    while let Some(line) = app.input.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        if command == Command::Quit {
            if !app.state.controller.pending().is_empty() {
                app.commit().await?;
            }
            break;
        }
        app.handle(command).await?;
        app.drain_events();
        app.show();
    }

    app.state.shutdown();
    tracing::info!("PhotoReviewer exiting");
    Ok(())
}

impl App {
    async fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Next => {
                if self.state.cursor.at_end() {
                    self.shuffle().await;
                } else {
                    self.state.cursor.next();
                    self.refresh().await;
                }
            }
            Command::Prev => {
                self.state.cursor.prev();
                self.refresh().await;
            }
            Command::Delete => {
                if let Some(item) = self.state.current().cloned() {
                    let position = self.state.cursor.index();
                    self.state.controller.mark_for_deletion(item.clone(), position);
                    self.state.controller.remove_from_list(&item);
                    self.state.resources.evict(&item);
                    self.refresh().await;
                }
            }
            Command::DeleteNow => {
                if let Some(item) = self.state.current().cloned() {
                    self.state.resources.evict(&item);
                    let outcome = self.state.controller.delete_current(item).await;
                    self.report(outcome).await?;
                    self.refresh().await;
                }
            }
            Command::Undo => {
                if self.state.controller.undo_last_mark().is_none() {
                    if self.state.controller.is_finalizing() {
                        println!("Deletion in progress, nothing to undo");
                    } else {
                        println!("Nothing to undo");
                    }
                }
                self.drain_events();
                self.refresh().await;
            }
            Command::Commit => self.commit().await?,
            Command::Favorite => {
                if let Some(item) = self.state.current().cloned() {
                    if self.state.controller.favorite(&item).await {
                        println!("Added {} to favorites", item.name());
                    } else {
                        println!("{} is already a favorite", item.name());
                    }
                }
            }
            Command::Zoom => self.toggle_zoom(),
            Command::Info => self.info().await,
            Command::Shuffle => self.shuffle().await,
            Command::Filter(filter) => {
                self.state.controller.set_filter(filter).await;
                self.state.cursor.first();
                self.refresh().await;
            }
            Command::Stats => {
                let info = self.state.controller.show_settings().await;
                println!(
                    "Deleted {} items, {} freed",
                    info.deleted_count,
                    format_file_size(info.deleted_size.max(0) as u64)
                );
                self.state.controller.on_settings_shown();
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
        Ok(())
    }

    async fn shuffle(&mut self) {
        let filter = self.state.controller.filter();
        self.state.controller.randomize(filter).await;
        self.state.cursor.first();
        self.refresh().await;
    }

    async fn commit(&mut self) -> Result<()> {
        let outcome = self.state.controller.request_finalization().await;
        self.report(outcome).await?;
        self.drain_events();
        self.refresh().await;
        Ok(())
    }

    async fn report(&mut self, outcome: FinalizationOutcome) -> Result<()> {
        let outcome = match outcome {
            FinalizationOutcome::RequiresConfirmation(handle) => {
                let approved = if self.state.config.deletion.confirm {
                    self.confirm(&format!("Move {} item(s) to the trash?", handle.len())).await?
                } else {
                    true
                };
                self.state.controller.resolve_confirmation(handle, approved).await
            }
            other => other,
        };

        match outcome {
            FinalizationOutcome::Completed(stats) => println!(
                "Deleted {} item(s), {} freed",
                stats.count,
                format_file_size(stats.bytes)
            ),
            FinalizationOutcome::NothingPending => println!("Nothing marked for deletion"),
            FinalizationOutcome::AlreadyInFlight => println!("A deletion is still in progress"),
            FinalizationOutcome::Failed => println!("Deletion did not go through"),
            FinalizationOutcome::RequiresConfirmation(_) => {}
        }
        Ok(())
    }

    async fn confirm(&mut self, question: &str) -> Result<bool> {
        println!("{} [y/n]", question);
        let answer = self.input.next_line().await?.unwrap_or_default();
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn toggle_zoom(&mut self) {
        let viewer = &mut self.state.viewer;
        viewer.on_gesture(GestureEvent::TouchDown);
        viewer.on_gesture(GestureEvent::DoubleTap {
            x: VIEWPORT.0 / 2.0,
            y: VIEWPORT.1 / 2.0,
        });

        let mut now = Instant::now();
        while viewer.on_frame(now) {
            now += FRAME;
        }
        viewer.on_gesture(GestureEvent::TouchUp);

        match viewer.transform() {
            Some(t) => println!(
                "Zoom {:.2}x (scale {:.3}, offset {:.0},{:.0})",
                viewer.relative_scale(),
                t.scale,
                t.translate_x,
                t.translate_y
            ),
            None => println!("Nothing to zoom"),
        }
    }

    async fn info(&mut self) {
        let Some(item) = self.state.current().cloned() else {
            return;
        };

        let resources = self.state.resources.clone();
        let loaded = tokio::task::spawn_blocking(move || resources.load_details(&item)).await;
        match loaded {
            Ok(Ok(details)) => {
                let lines = details.lines();
                if lines.is_empty() {
                    println!("No details available");
                }
                for line in lines {
                    println!("  {}", line);
                }
            }
            Ok(Err(e)) => println!("{}", e.user_message()),
            Err(e) => tracing::error!(error = %e, "Detail task failed"),
        }
    }

    /// Follow the controller's list and load the new current item into the viewer
    async fn refresh(&mut self) {
        self.state.sync_cursor();

        let size = match self.state.current().cloned() {
            Some(item) => self.state.content_size(&item).await,
            None => None,
        };
        self.state
            .viewer
            .set_content(size.and_then(|(w, h)| ContentSize::new(w as f32, h as f32)));
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(ControllerEvent::Restore { item, position }) => {
                    self.state.sync_cursor();
                    self.state.cursor.set_index(position);
                    println!("Restored {}", item.name());
                }
                Ok(ControllerEvent::ConfirmationRequired(handle)) => {
                    tracing::debug!(request = handle.id(), "Confirmation requested");
                }
                Ok(ControllerEvent::LoadFailed(msg)) => println!("{}", msg),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Dropped controller events");
                }
                Err(_) => break,
            }
        }
    }

    fn show(&self) {
        let cursor = &self.state.cursor;
        let marked = self.state.controller.pending().len();

        match cursor.current() {
            Some(item) => println!(
                "[{}/{}] {} ({}){}",
                cursor.index() + 1,
                cursor.len(),
                item.name(),
                item.mime(),
                if marked > 0 { format!(", {} marked", marked) } else { String::new() }
            ),
            None if cursor.is_empty() => println!("No media for filter '{}'", self.state.controller.filter()),
            None => println!("End of batch. 'next' loads another batch, 'commit' deletes marked items."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command(""), Ok(Command::Next));
        assert_eq!(parse_command("  D "), Ok(Command::Delete));
        assert_eq!(parse_command("filter gifs"), Ok(Command::Filter(MediaFilter::Gifs)));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("filter").is_err());
        assert!(parse_command("filter raw").is_err());
        assert!(parse_command("launch").unwrap_err().contains("launch"));
    }
}
