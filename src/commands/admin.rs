//! Administrator commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use super::rows::{rows, OfferRow, OrderRow};
use crate::analytics::{Dashboard, TimeRange};
use crate::app_system::MarketSystem;
use crate::domain::{OfferStatus, OrderStatus, RecipientKind};
use crate::error::AppResult;
use crate::output::{self, money, OutputFormat};
use crate::views::admin::{self as view, Acceptance, BoardView, OrderBoard};

/// Arguments for admin commands
#[derive(Debug, Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Accepted,
    Rejected,
    All,
}

impl StatusFilter {
    fn status(self) -> Option<OfferStatus> {
        match self {
            StatusFilter::Pending => Some(OfferStatus::Pending),
            StatusFilter::Accepted => Some(OfferStatus::Accepted),
            StatusFilter::Rejected => Some(OfferStatus::Rejected),
            StatusFilter::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Audience {
    Client,
    Maalem,
}

/// Admin subcommands
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Offers waiting for a decision
    Offers {
        #[arg(long, value_enum, default_value = "pending")]
        status: StatusFilter,
    },
    /// Accept an offer and create its order
    Accept {
        offer: u64,
        #[arg(long)]
        delivery_fee: f64,
        /// Delivery address (defaults to the buyer's)
        #[arg(long)]
        address: Option<String>,
    },
    /// Reject an offer
    Reject { offer: u64 },
    /// Send a notification to a client or maalem
    Notify {
        #[arg(value_enum)]
        audience: Audience,
        id: u64,
        message: String,
    },
    /// Order dashboard with sales figures
    Orders {
        /// Refresh periodically until interrupted
        #[arg(long)]
        watch: bool,
        #[arg(long, default_value = "all")]
        range: TimeRange,
    },
    /// Change an order's status
    SetStatus { order: u64, status: OrderStatus },
}

#[derive(Debug, Serialize, Tabled)]
struct FigureRow {
    name: String,
    value: String,
}

#[derive(Serialize)]
struct BoardJson<'a> {
    summary: &'a Dashboard,
    orders: Vec<OrderRow>,
}

pub async fn execute(args: &AdminArgs, system: &mut MarketSystem, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        AdminCommand::Offers { status } => {
            let offers = view::offers(system, status.status()).await?;
            output::print_list(&rows::<_, OfferRow>(&offers), format);
        }
        AdminCommand::Accept { offer, delivery_fee, address } => {
            let acceptance = Acceptance {
                offer_id: *offer,
                delivery_fee: *delivery_fee,
                delivery_address: address.clone(),
            };
            let order = view::accept_offer(system, acceptance).await?;
            output::print_success(&format!(
                "Offer {offer} accepted; order {} created, client pays {}",
                order.id.map(|id| id.to_string()).unwrap_or_else(|| "(no id)".to_string()),
                money(order.final_paid)
            ));
        }
        AdminCommand::Reject { offer } => {
            view::reject_offer(system, *offer).await?;
            output::print_success(&format!("Offer {offer} rejected"));
        }
        AdminCommand::Notify { audience, id, message } => {
            let kind = match audience {
                Audience::Client => RecipientKind::Client,
                Audience::Maalem => RecipientKind::Maalem,
            };
            view::notify(system, kind, *id, message).await?;
        }
        AdminCommand::Orders { watch, range } => {
            let board = OrderBoard::open(system, *range)?;
            if *watch {
                watch_board(&board, system, format).await?;
            } else {
                render_board(&board.load().await?, format);
            }
            board.close().await;
        }
        AdminCommand::SetStatus { order, status } => {
            let board = OrderBoard::open(system, TimeRange::All)?;
            let updated = board.set_status(*order, *status).await?;
            output::print_success(&format!("Order {order} is now {}", updated.status));
        }
    }
    Ok(())
}

async fn watch_board(board: &OrderBoard, system: &MarketSystem, format: OutputFormat) -> AppResult<()> {
    let period = system.config.dashboard_poll;
    let (subscription, mut views) = board.watch(period);
    info!(period_secs = period.as_secs(), "Watching orders; Ctrl-C to stop");
    loop {
        tokio::select! {
            view = views.recv() => match view {
                Some(view) => render_board(&view, format),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    subscription.cancel().await;
    Ok(())
}

fn render_board(view: &BoardView, format: OutputFormat) {
    let orders: Vec<OrderRow> = rows(&view.orders);
    if format == OutputFormat::Json {
        output::print_item(&BoardJson { summary: &view.summary, orders }, format);
        return;
    }

    let s = &view.summary;
    output::print_heading(&format!("Dashboard ({})", s.range), format);
    let figures = vec![
        figure("Orders", s.order_count.to_string()),
        figure("Revenue", money(s.total_revenue)),
        figure("Platform profit", money(s.platform_profit)),
        figure("Delivery fees", money(s.delivery_fees)),
        figure("Average order", money(s.average_order_value)),
        figure("Average margin", money(s.average_platform_margin)),
        figure("Offer conversion", format!("{:.1}%", s.conversion_rate)),
        figure("Return rate", format!("{:.1}%", s.return_rate)),
        figure("Avg delivery", format!("{:.1} h", s.average_delivery_hours)),
        figure("Active maalems", s.active_maalems.to_string()),
        figure("Clients", s.clients.to_string()),
        figure(
            "Offers",
            format!(
                "{} total: {} pending / {} accepted / {} rejected",
                s.offers.total(),
                s.offers.pending, s.offers.accepted, s.offers.rejected
            ),
        ),
    ];
    output::print_list(&figures, format);

    let statuses: Vec<FigureRow> = s
        .statuses
        .iter()
        .map(|st| figure(st.status.label(), st.count.to_string()))
        .collect();
    output::print_heading("By status", format);
    output::print_list(&statuses, format);

    let categories: Vec<FigureRow> = s
        .categories
        .iter()
        .map(|c| figure(&c.category, format!("{} ({} offers)", money(c.revenue), c.accepted_offers)))
        .collect();
    output::print_heading("By category", format);
    output::print_list(&categories, format);

    let artisans: Vec<FigureRow> = s
        .artisans
        .iter()
        .map(|a| figure(&a.name, format!("{} in {} orders, {:.0}% efficiency", money(a.sales), a.orders, a.efficiency)))
        .collect();
    output::print_heading("Artisans", format);
    output::print_list(&artisans, format);

    let clients: Vec<FigureRow> = s
        .top_clients
        .iter()
        .map(|c| figure(&c.name, c.orders.to_string()))
        .collect();
    output::print_heading("Top clients", format);
    output::print_list(&clients, format);

    output::print_heading("Orders", format);
    output::print_list(&orders, format);
}

fn figure(name: impl Into<String>, value: String) -> FigureRow {
    FigureRow { name: name.into(), value }
}
