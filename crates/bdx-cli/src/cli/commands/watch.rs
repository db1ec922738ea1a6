//! Live auction watcher.
//!
//! Mounts a view on one auction and renders its events as text lines until
//! the auction closes or the user interrupts.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use bdx_client::{ApiClient, Config};
use bdx_engine::{AuctionView, EventSink, ViewOptions};
use bdx_types::{AuctionSnapshot, ViewEvent};

pub async fn run(client: Arc<ApiClient>, item_id: i64, config: &Config) -> Result<()> {
    let options = ViewOptions::from_config(config);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink: EventSink = Box::new(move |event| {
        let _ = tx.send(event);
    });
    let view = AuctionView::mount(client, item_id, &options, sink);

    let mut renderer = Renderer::default();
    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(event) = maybe else { break };
                if renderer.render(&event) {
                    break; // auction closed
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    view.unmount();
    Ok(())
}

/// Prints snapshot lines only when something visible changed; countdown
/// ticks print every time.
#[derive(Default)]
struct Renderer {
    last: Option<(String, Option<i64>, u32, bool)>,
}

impl Renderer {
    fn render(&mut self, event: &ViewEvent) -> bool {
        match event {
            ViewEvent::SnapshotApplied { snapshot } => {
                let state = Self::visible_state(snapshot);
                if self.last.as_ref() != Some(&state) {
                    Self::print_snapshot(snapshot);
                    self.last = Some(state);
                }
                false
            }
            ViewEvent::Countdown { phase, remaining } => {
                println!("  {phase} {remaining}s");
                false
            }
            ViewEvent::AuctionClosed { winner } => {
                match winner {
                    Some(w) => println!(
                        "Auction closed. Winner: user {} at {:.2}",
                        w.winner_user_id, w.amount
                    ),
                    None => println!("Auction closed with no bids."),
                }
                true
            }
            ViewEvent::ReadFailed { message } => {
                println!("  (read failed: {message})");
                false
            }
            ViewEvent::ActionFailed { message } => {
                println!("  (action failed: {message})");
                false
            }
        }
    }

    fn visible_state(snapshot: &AuctionSnapshot) -> (String, Option<i64>, u32, bool) {
        (
            snapshot.status.to_string(),
            snapshot.current_bid.map(|b| b.user_id),
            snapshot.players,
            snapshot.joined,
        )
    }

    fn print_snapshot(snapshot: &AuctionSnapshot) {
        let bid = snapshot
            .current_bid
            .map_or_else(|| "none".to_string(), |b| {
                format!("{:.2} (user {})", b.amount, b.user_id)
            });
        println!(
            "[{}] {}: status {}, bid {}, players {}{}",
            snapshot.id,
            snapshot.title,
            snapshot.status,
            bid,
            snapshot.players,
            if snapshot.joined { ", joined" } else { "" }
        );
    }
}
