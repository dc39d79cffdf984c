//! Notification commands.

use super::rows::{rows, NotificationRow};
use crate::app_system::MarketSystem;
use crate::error::AppResult;
use crate::output::{self, OutputFormat};
use crate::views::notifications as view;

pub async fn notifications(system: &mut MarketSystem, format: OutputFormat) -> AppResult<()> {
    let inbox = view::open_inbox(system).await?;
    output::print_list(&rows::<_, NotificationRow>(&inbox.notifications), format);
    if inbox.failed > 0 {
        output::print_warning(&format!("{} notification(s) could not be marked read", inbox.failed));
    }
    Ok(())
}

pub async fn unread(watch: bool, system: &MarketSystem) -> AppResult<()> {
    if !watch {
        println!("{}", view::unread_count(system).await?);
        return Ok(());
    }

    let (subscription, mut badge) = view::watch_unread(system)?;
    loop {
        tokio::select! {
            changed = badge.changed() => {
                if changed.is_err() {
                    break;
                }
                let count = *badge.borrow_and_update();
                if let Some(count) = count {
                    println!("{count} unread");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    subscription.cancel().await;
    Ok(())
}
