use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rust_decimal::Decimal;
use splitqr::dashboard::accounts::AccountManager;
use splitqr::dashboard::generator::{QrGenerator, DEFAULT_QR_SIZE};
use splitqr::dashboard::overview::OverviewStats;
use splitqr::dashboard::payments::{PaymentFilter, PaymentMonitor, TimeWindow};
use splitqr::dashboard::tester::QrValidator;
use splitqr::dashboard::{Command, Dashboard, DashboardState, RefreshOutcome, View};
use splitqr::gateway::Gateway;
use splitqr::model::config::{bootstrap_env, DashboardConfig};
use splitqr::model::{AccountStatus, NewItem, Overview, PaymentStatus, QrFormat};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio_util::sync::CancellationToken;

/// Front-of-house dashboard for SplitQR tables, accounts and payments
#[derive(Parser, Debug)]
#[command(name = "splitqr-dashboard")]
#[command(about = "client cli used by restaurant staffs to manage QR bill splitting", version, long_about = None
)]
struct Cli {
    #[arg(long, help = "Backend base url, overrides SPLITQR_API_URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// headline numbers
    Overview,
    /// tables with their open accounts
    Tables {
        #[arg(long, help = "Table number substring")]
        search: Option<String>,
    },
    /// open an account for a table
    #[command(arg_required_else_help = true)]
    Open { table_id: u32 },
    /// QR operations of an account
    #[command(arg_required_else_help = true)]
    Qr(QrArgs),
    /// list accounts
    Accounts {
        #[arg(long, value_name = "open|partial|paid")]
        status: Option<AccountStatus>,
        #[arg(long, help = "Table number or QR id substring")]
        search: Option<String>,
    },
    /// operate on the open account of a table
    #[command(arg_required_else_help = true)]
    Account(AccountArgs),
    /// payment monitor
    Payments {
        #[arg(long, default_value = "all", value_name = "all|today|week|month")]
        window: TimeWindow,
        #[arg(long, value_name = "completed|pending|failed")]
        status: Option<PaymentStatus>,
        #[arg(long, help = "Customer name, table number or transaction id")]
        search: Option<String>,
        #[arg(long, help = "Payment id to show in detail")]
        details: Option<u64>,
    },
    /// validate a QR id
    #[command(arg_required_else_help = true)]
    Check { qr_id: String },
    /// keep a view on screen, refreshing on the poll interval;
    /// type `r` to retry, a view name to switch, `q` to quit
    Watch {
        #[arg(default_value = "overview")]
        view: View,
        #[arg(long, help = "Poll interval in seconds, overrides SPLITQR_POLL_SECS")]
        interval: Option<u64>,
    },
}

#[derive(Debug, Args)]
struct QrArgs {
    #[arg(help = "Account id", value_parser = clap::value_parser!(u64).range(1..))]
    account_id: u64,
    #[command(subcommand)]
    command: QrCmds,
}

#[derive(Debug, Subcommand)]
enum QrCmds {
    /// print the payment url behind the QR
    Url,
    /// issue a new QR id, invalidating printed codes
    Regenerate,
    /// save the QR image as <account_id>.<format>
    Download {
        #[arg(long, default_value = "png")]
        format: QrFormat,
        #[arg(long, default_value_t = DEFAULT_QR_SIZE)]
        size: u32,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct AccountArgs {
    table_id: u32,
    #[command(subcommand)]
    command: AccountCmds,
}

#[derive(Debug, Subcommand)]
enum AccountCmds {
    Show,
    #[command(arg_required_else_help = true)]
    AddItem {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long, help = "Unit price, e.g. 24.90")]
        price: Decimal,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    Close,
}

/// Presentation components kept alive across refreshes of `watch`.
struct Views {
    generator: QrGenerator<Gateway>,
    accounts: AccountManager<Gateway>,
    payments: PaymentMonitor,
    tester: QrValidator<Gateway>,
}

impl Views {
    fn new(gateway: &Arc<Gateway>) -> Self {
        Self {
            generator: QrGenerator::new(gateway.clone()),
            accounts: AccountManager::new(gateway.clone()),
            payments: PaymentMonitor::default(),
            tester: QrValidator::new(gateway.clone()),
        }
    }

    fn render(&mut self, state: &DashboardState) -> String {
        let mut out = format!("[{}] {}\n", state.view, state.status_line());
        let Some(snapshot) = &state.snapshot else {
            return out;
        };
        out += &match state.view {
            View::Overview => OverviewStats::from(snapshot).render(),
            View::Generator => {
                self.generator.sync(snapshot);
                self.generator.render(snapshot)
            }
            View::Accounts => self.accounts.render(snapshot),
            View::Payments => self.payments.render(&snapshot.payments),
            View::Tester => self.tester.render(),
        };
        out
    }
}

async fn snapshot(dashboard: &Dashboard<Gateway>) -> anyhow::Result<Overview> {
    match dashboard.refresh().await {
        RefreshOutcome::Failed => Err(anyhow!(
            "failed to load overview, {}",
            dashboard.state().error.unwrap_or_default()
        )),
        _ => dashboard
            .state()
            .snapshot
            .ok_or_else(|| anyhow!("overview not loaded")),
    }
}

async fn watch(dashboard: Arc<Dashboard<Gateway>>, view: View, interval: Duration) -> anyhow::Result<()> {
    let mut views = Views::new(dashboard.gateway());
    let mut rx = dashboard.subscribe();
    dashboard.select_view(view);

    let cancel_token = CancellationToken::new();
    let tracker = dashboard.start_polling(interval, cancel_token.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                if state.loading {
                    continue;
                }
                print!("\x1b[2J\x1b[H{}", views.render(&state));
                std::io::stdout().flush().ok();
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => {
                        if !dashboard.dispatch(command).await {
                            break;
                        }
                    }
                    Err(e) => warn!("{}", e),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("failed to read stdin, {}", e);
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c, stopping");
                break;
            }
        }
    }
    cancel_token.cancel();
    tracker.wait().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let (_, dotenv_err) = bootstrap_env();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));
    if let Some(e) = dotenv_err {
        warn!("failed to load envs from .env.dev, {}", e);
    }

    let args = Cli::parse();
    let mut config = DashboardConfig::from_env()?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    let gateway = Arc::new(Gateway::new(&config.api_url).context("failed to create gateway")?);
    let dashboard = Arc::new(Dashboard::new(gateway.clone()));

    match args.command {
        Commands::Overview => {
            let overview = snapshot(&dashboard).await?;
            print!("{}", OverviewStats::from(&overview).render());
        }
        Commands::Tables { search } => {
            let overview = snapshot(&dashboard).await?;
            let mut generator = QrGenerator::new(gateway);
            generator.search = search.unwrap_or_default();
            generator.sync(&overview);
            print!("{}", generator.render(&overview));
        }
        Commands::Open { table_id } => {
            println!("opening account for table={}", table_id);
            let mut generator = QrGenerator::new(gateway);
            match generator.open_account(table_id, dashboard.as_ref()).await {
                Some(account) => println!(
                    "table {} is bound to account id = {}, QR {}",
                    account.table_number, account.id, account.qr_id
                ),
                None => print_notice(generator.notice()),
            }
        }
        Commands::Qr(QrArgs { account_id, command }) => {
            let mut generator = QrGenerator::new(gateway);
            match command {
                QrCmds::Url => {
                    if let Some(link) = generator.show_link(account_id).await {
                        println!("{}", link.url);
                    }
                }
                QrCmds::Regenerate => {
                    generator.regenerate(account_id, dashboard.as_ref()).await;
                }
                QrCmds::Download { format, size, out } => {
                    generator.download(account_id, format, size, &out).await;
                }
            }
            print_notice(generator.notice());
        }
        Commands::Accounts { status, search } => {
            let overview = snapshot(&dashboard).await?;
            let mut manager = AccountManager::new(gateway);
            manager.filter.status = status;
            manager.filter.search = search.unwrap_or_default();
            print!("{}", manager.render(&overview));
        }
        Commands::Account(AccountArgs { table_id, command }) => {
            let mut manager = AccountManager::new(gateway);
            manager.select(table_id).await;
            let Some(account_id) = manager.selected().map(|d| d.account.id) else {
                print_notice(manager.notice());
                return Ok(());
            };
            match command {
                AccountCmds::Show => {}
                AccountCmds::AddItem {
                    name,
                    category,
                    price,
                    quantity,
                } => {
                    manager.open_item_modal();
                    if let Some(draft) = manager.draft_mut() {
                        *draft = NewItem {
                            name,
                            category,
                            unit_price: price,
                            quantity,
                        };
                    }
                    manager.submit_item(dashboard.as_ref()).await;
                }
                AccountCmds::Close => {
                    manager.close_account(account_id, dashboard.as_ref()).await;
                }
            }
            if dashboard.state().snapshot.is_none() {
                dashboard.refresh().await;
            }
            let overview = dashboard.state().snapshot.unwrap_or_default();
            manager.filter.table_id = Some(table_id);
            print!("{}", manager.render(&overview));
        }
        Commands::Payments {
            window,
            status,
            search,
            details,
        } => {
            let overview = snapshot(&dashboard).await?;
            let mut monitor = PaymentMonitor::new(PaymentFilter {
                window,
                status,
                search: search.unwrap_or_default(),
            });
            if let Some(id) = details {
                monitor.open_details(id);
            }
            print!("{}", monitor.render(&overview.payments));
        }
        Commands::Check { qr_id } => {
            let mut validator = QrValidator::new(gateway);
            validator.input = qr_id;
            validator.validate().await;
            print!("{}", validator.render());
        }
        Commands::Watch { view, interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval);
            if interval.is_zero() {
                return Err(anyhow!("interval must be positive"));
            }
            watch(dashboard, view, interval).await?;
        }
    };
    Ok(())
}

fn print_notice(notice: Option<&splitqr::dashboard::notice::Notice>) {
    if let Some(notice) = notice {
        println!("{notice}");
    }
}
