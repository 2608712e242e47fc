use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::commands::reports::total_revenue;
use crate::commands::Repository;
use crate::config::AppConfig;
use crate::models::{
    ConcernStatus, LineItem, NewConcern, NewInventoryItem, NewQuotation, NewSale, PaymentMethod,
    QuotationStatus,
};
use crate::storage::{SqliteStorage, StorageArea};
use crate::store::Store;

#[derive(Debug, Parser)]
#[command(name = "eps-admin", about = "Print shop admin records", long_about = None)]
pub(crate) struct Cli {
    /// Settings file; `eps-admin.toml` when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the settings file
    #[arg(long, global = true, env = "EPS_DATABASE_PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand)]
    Inventory(InventoryCommand),
    #[command(subcommand)]
    Quote(QuoteCommand),
    #[command(subcommand)]
    Concern(ConcernCommand),
    #[command(subcommand)]
    Sale(SaleCommand),
    /// Alert center: pending quotes, open concerns, low stock
    Notifications(NotificationArgs),
    /// Headline counters
    Dashboard,
    Login(LoginArgs),
    Logout,
    /// Show the logged-in admin
    Whoami,
    /// Reprint the alert center whenever records change
    Watch(WatchArgs),
}

#[derive(Debug, Subcommand)]
enum InventoryCommand {
    List {
        /// Filter by name or category
        #[arg(long)]
        search: Option<String>,
    },
    Add(AddItemArgs),
    LowStock,
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
struct AddItemArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    quantity: Option<i64>,
    #[arg(long)]
    unit_price: Option<f64>,
    /// Low stock alert threshold
    #[arg(long)]
    threshold: Option<i64>,
}

#[derive(Debug, Subcommand)]
enum QuoteCommand {
    List {
        /// Filter by customer name or email
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<QuotationStatus>,
    },
    /// Public quote request
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        service: String,
    },
    Status {
        id: String,
        #[arg(value_enum)]
        status: QuotationStatus,
    },
    Read {
        id: String,
    },
    /// Record a sale from the quotation and approve it
    Convert {
        id: String,
        #[arg(long, value_enum, default_value = "cash")]
        payment: PaymentMethod,
    },
}

#[derive(Debug, Subcommand)]
enum ConcernCommand {
    List {
        /// Filter by customer name or subject
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ConcernStatus>,
    },
    /// Public concern form
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "Order Issue")]
        subject: String,
        #[arg(long)]
        message: String,
    },
    Status {
        id: String,
        #[arg(value_enum)]
        status: ConcernStatus,
    },
    Read {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum SaleCommand {
    List {
        /// Filter by customer name or sale id
        #[arg(long)]
        search: Option<String>,
    },
    Record {
        #[arg(long, default_value = "")]
        customer: String,
        /// Line item as NAME:QUANTITY:PRICE, repeatable
        #[arg(long = "item", value_parser = parse_line_item, required = true)]
        items: Vec<LineItem>,
        #[arg(long, value_enum, default_value = "cash")]
        payment: PaymentMethod,
    },
}

#[derive(Debug, Args)]
struct NotificationArgs {
    #[arg(long)]
    mark_all_read: bool,
    /// Mark the record behind a notification id read
    #[arg(long)]
    open: Option<String>,
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
}

#[derive(Debug, Args)]
struct WatchArgs {
    /// Stop after this many refreshes
    #[arg(long)]
    count: Option<usize>,
}

fn parse_line_item(raw: &str) -> Result<LineItem, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected NAME:QUANTITY:PRICE, got {raw:?}"));
    };

    let quantity: i64 = quantity
        .parse()
        .map_err(|error| format!("invalid quantity {quantity:?}: {error}"))?;
    let price: f64 = price
        .parse()
        .map_err(|error| format!("invalid price {price:?}: {error}"))?;

    Ok(LineItem::named(name, quantity, price))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|error| format!("failed to encode output: {error}"))?;
    println!("{out}");
    Ok(())
}

fn found(ok: bool, what: &str, id: &str) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(format!("{what} {id} not found"))
    }
}

impl Cli {
    pub(crate) fn run(self) -> Result<(), String> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(),
        }
        .map_err(|error| format!("failed to load settings: {error}"))?;

        if let Some(database) = self.database {
            config.database_path = database;
        }

        let storage = SqliteStorage::open(&config.database_path)
            .map_err(|error| format!("failed to open {}: {error}", config.database_path.display()))?;
        let store = Arc::new(Store::open(StorageArea::new(storage), config.store_options()));
        let repo = Repository::from_config(store, &config);

        match self.command {
            Commands::Inventory(command) => inventory(&repo, command),
            Commands::Quote(command) => quote(&repo, command),
            Commands::Concern(command) => concern(&repo, command),
            Commands::Sale(command) => sale(&repo, command),
            Commands::Notifications(args) => notifications(&repo, args),
            Commands::Dashboard => print_json(&repo.dashboard_stats()),
            Commands::Login(args) => {
                if repo.login(&args.username, &args.password) {
                    println!("logged in as {}", args.username);
                    Ok(())
                } else {
                    Err("Invalid username or password".to_string())
                }
            }
            Commands::Logout => {
                repo.logout();
                Ok(())
            }
            Commands::Whoami => {
                println!("{}", repo.current_admin().unwrap_or_else(|| "Admin User".to_string()));
                Ok(())
            }
            Commands::Watch(args) => watch(&repo, args),
        }
    }
}

fn inventory(repo: &Repository, command: InventoryCommand) -> Result<(), String> {
    match command {
        InventoryCommand::List { search } => match search {
            Some(term) => print_json(&repo.search_inventory(&term)),
            None => print_json(&repo.inventory()),
        },
        InventoryCommand::Add(args) => {
            let item = repo
                .create_inventory_item(NewInventoryItem {
                    name: args.name,
                    category: args.category,
                    quantity: args.quantity,
                    unit_price: args.unit_price,
                    threshold: args.threshold,
                })
                .ok_or("name and category are required")?;
            print_json(&item)
        }
        InventoryCommand::LowStock => print_json(&repo.low_stock()),
        InventoryCommand::Delete { id } => found(repo.delete_inventory_item(&id), "inventory item", &id),
    }
}

fn quote(repo: &Repository, command: QuoteCommand) -> Result<(), String> {
    match command {
        QuoteCommand::List { search: None, status: None } => print_json(&repo.quotations()),
        QuoteCommand::List { search, status } => {
            print_json(&repo.search_quotations(search.as_deref().unwrap_or_default(), status))
        }
        QuoteCommand::Submit { name, email, service } => {
            let quotation = repo
                .submit_quotation(NewQuotation {
                    customer_name: name,
                    customer_email: email,
                    service,
                })
                .ok_or("name, email and service are required")?;
            print_json(&quotation)
        }
        QuoteCommand::Status { id, status } => found(repo.update_quotation_status(&id, status), "quotation", &id),
        QuoteCommand::Read { id } => found(repo.mark_quotation_read(&id), "quotation", &id),
        QuoteCommand::Convert { id, payment } => {
            let sale = repo
                .convert_quotation_to_sale(&id, payment)
                .ok_or_else(|| format!("quotation {id} not found or rejected"))?;
            print_json(&sale)
        }
    }
}

fn concern(repo: &Repository, command: ConcernCommand) -> Result<(), String> {
    match command {
        ConcernCommand::List { search: None, status: None } => print_json(&repo.concerns()),
        ConcernCommand::List { search, status } => {
            print_json(&repo.search_concerns(search.as_deref().unwrap_or_default(), status))
        }
        ConcernCommand::Submit {
            name,
            email,
            subject,
            message,
        } => {
            let concern = repo
                .submit_concern(NewConcern {
                    customer_name: name,
                    email,
                    subject,
                    message,
                })
                .ok_or("name, email and message are required")?;
            print_json(&concern)
        }
        ConcernCommand::Status { id, status } => found(repo.update_concern_status(&id, status), "concern", &id),
        ConcernCommand::Read { id } => found(repo.mark_concern_read(&id), "concern", &id),
    }
}

fn sale(repo: &Repository, command: SaleCommand) -> Result<(), String> {
    match command {
        SaleCommand::List { search } => {
            let sales = match search {
                Some(term) => repo.search_sales(&term),
                None => repo.sales(),
            };
            print_json(&sales)?;
            println!("total revenue: {:.2}", total_revenue(&sales));
            Ok(())
        }
        SaleCommand::Record {
            customer,
            items,
            payment,
        } => {
            let (sale, reconciliation) = repo
                .create_sale(NewSale {
                    customer_name: customer,
                    items,
                    payment_method: payment,
                })
                .ok_or("a sale needs at least one item")?;
            print_json(&sale)?;
            print_json(&reconciliation)
        }
    }
}

fn notifications(repo: &Repository, args: NotificationArgs) -> Result<(), String> {
    if let Some(id) = &args.open {
        found(repo.open_notification(id), "notification", id)?;
    }
    if args.mark_all_read {
        repo.mark_all_notifications_read();
    }

    println!("unread: {}", repo.unread_count());
    print_json(&repo.notifications())
}

fn watch(repo: &Repository, args: WatchArgs) -> Result<(), String> {
    let mut listener = repo.store().listen();
    let mut refreshes = 0;

    print_json(&repo.notifications())?;
    while args.count.map_or(true, |limit| refreshes < limit) {
        let refresh = listener.wait();
        tracing::debug!(?refresh, "refreshing notifications");
        print_json(&repo.notifications())?;
        refreshes += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_parses_names_with_colons() {
        let item = parse_line_item("Sticker: Vinyl:3:12.5").unwrap();
        assert_eq!(item.item_name, "Sticker: Vinyl");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.price, 12.5);
    }

    #[test]
    fn malformed_line_item_is_rejected() {
        assert!(parse_line_item("Glossy Paper A4").is_err());
        assert!(parse_line_item("Glossy Paper A4:many:1").is_err());
    }

    #[test]
    fn login_password_must_be_given_on_the_command_line() {
        use clap::CommandFactory;

        let command = Cli::command();
        let login = command.find_subcommand("login").unwrap();
        let password = login.get_arguments().find(|arg| arg.get_id() == "password").unwrap();
        assert_eq!(password.get_env(), None);

        assert!(Cli::try_parse_from(["eps-admin", "login", "--username", "Admin@gmail.com"]).is_err());
    }

    #[test]
    fn list_filters_parse() {
        let cli = Cli::try_parse_from(["eps-admin", "quote", "list", "--search", "john", "--status", "pending"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Quote(QuoteCommand::List {
                search: Some(ref term),
                status: Some(QuotationStatus::Pending),
            }) if term == "john"
        ));

        let cli = Cli::try_parse_from(["eps-admin", "concern", "list", "--status", "in-progress"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Concern(ConcernCommand::List {
                search: None,
                status: Some(ConcernStatus::InProgress),
            })
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
