//! Item command handlers.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use bdx_client::ApiClient;
use bdx_types::{AuctionSnapshot, BidRequest, NewItem};

fn print_snapshot_line(item: &AuctionSnapshot) {
    let bid = item
        .current_bid
        .map_or_else(|| "-".to_string(), |b| format!("{:.2}", b.amount));
    println!(
        "{:>6}  {:<12}  base {:>8.2}  bid {:>8}  players {:>3}  {}",
        item.id, item.status, item.base_price, bid, item.players, item.title
    );
}

pub async fn list(client: &ApiClient) -> Result<()> {
    let items = client.list_items().await.context("list items")?;
    if items.is_empty() {
        println!("No items found.");
    } else {
        for item in &items {
            print_snapshot_line(item);
        }
    }
    Ok(())
}

pub async fn active(client: &ApiClient) -> Result<()> {
    match client.active_item().await.context("fetch active item")? {
        Some(item) => print_snapshot_line(&item),
        None => println!("No active auction."),
    }
    Ok(())
}

pub async fn create(
    client: &ApiClient,
    title: &str,
    description: &str,
    base_price: f64,
    close_at: &str,
) -> Result<()> {
    let close_at: DateTime<Utc> = close_at
        .parse()
        .with_context(|| format!("parse close time '{close_at}' as RFC 3339"))?;
    let created = client
        .create_item(&NewItem {
            title: title.to_string(),
            description: description.to_string(),
            base_price,
            close_at,
        })
        .await
        .context("create item")?;
    println!("Created item {} ({})", created.id, created.title);
    Ok(())
}

pub async fn join(client: &ApiClient, item_id: i64) -> Result<()> {
    client.join(item_id).await.context("join auction")?;
    println!("Joined auction {item_id}");
    Ok(())
}

pub async fn leave(client: &ApiClient, item_id: i64) -> Result<()> {
    client.leave(item_id).await.context("leave auction")?;
    println!("Left auction {item_id}");
    Ok(())
}

pub async fn bid(
    client: &ApiClient,
    item_id: i64,
    amount: f64,
    max_budget: Option<f64>,
    step: Option<f64>,
) -> Result<()> {
    client
        .bid(
            item_id,
            &BidRequest {
                amount,
                max_budget,
                bid_increment: step,
            },
        )
        .await
        .context("place bid")?;
    println!("Bid {amount:.2} placed on auction {item_id}");
    Ok(())
}

pub async fn close(client: &ApiClient, item_id: i64) -> Result<()> {
    let winner = client.close(item_id).await.context("close auction")?;
    println!(
        "Auction {item_id} closed. Winner: user {} at {:.2}",
        winner.winner_user_id, winner.amount
    );
    Ok(())
}
