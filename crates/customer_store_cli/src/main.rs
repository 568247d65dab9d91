//! Command-line entry point for the customer store.
//!
//! Runs the audit demo or single store operations against a SQLite file
//! (or an in-memory database when `--db` is omitted).

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use customer_store_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory, Customer,
    CustomerProbe, CustomerService, SqliteCustomerRepository,
};
use log::info;
use rusqlite::Connection;
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "customer_store")]
#[command(version, about = "Customer store with audit stamping", long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    CUSTOMER_STORE_DB          SQLite database file (default: in-memory)
    CUSTOMER_STORE_LOG_LEVEL   trace|debug|info|warn|error
    CUSTOMER_STORE_LOG_DIR     Absolute directory for rolling log files
"#)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Config {
    /// SQLite database file; omitted means a throwaway in-memory store
    #[arg(long, global = true, env = "CUSTOMER_STORE_DB")]
    db: Option<PathBuf>,

    /// Log level used when logging is enabled
    #[arg(long, global = true, env = "CUSTOMER_STORE_LOG_LEVEL", requires = "log_dir")]
    log_level: Option<String>,

    /// Absolute log directory; logging stays off when unset
    #[arg(long, global = true, env = "CUSTOMER_STORE_LOG_DIR")]
    log_dir: Option<String>,

    /// Print records as JSON instead of the one-line form
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk through create, update, query and delete with two auditors
    Demo,
    /// List every customer
    List,
    /// Insert a new customer
    Add {
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        /// Acting user stamped as creator
        #[arg(long)]
        auditor: Option<String>,
    },
    /// Update an existing customer
    Update {
        id: Uuid,
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        /// Acting user stamped as last modifier
        #[arg(long)]
        auditor: Option<String>,
    },
    /// Query by example; omitted fields match anything
    Find {
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        #[arg(long)]
        created_by: Option<String>,
        #[arg(long)]
        modified_by: Option<String>,
    },
    /// List customers never updated since creation
    Unmodified,
    /// Delete one customer
    Delete { id: Uuid },
    /// Delete every customer
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.config.log_dir.as_deref() {
        let level = cli
            .config
            .log_level
            .as_deref()
            .unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir).map_err(|err| anyhow!(err))?;
    }
    info!(
        "event=cli_start module=cli status=ok version={} persistent={}",
        core_version(),
        cli.config.db.is_some()
    );

    let conn = open_connection(&cli.config)?;
    let repo = SqliteCustomerRepository::try_new(&conn).context("database is not ready")?;
    let mut service = CustomerService::new(repo);
    let mut out = Printer::new(cli.config.json, io::stdout().lock());

    match cli.command {
        Command::Demo => run_demo(&mut service, &mut out)?,
        Command::List => out.all(&service.find_all()?)?,
        Command::Add {
            first,
            last,
            auditor,
        } => {
            if let Some(auditor) = auditor {
                service.set_current_auditor(auditor);
            }
            out.one(&service.save(&Customer::new(first, last))?)?;
        }
        Command::Update {
            id,
            first,
            last,
            auditor,
        } => {
            let mut customer = service
                .find_by_id(id)?
                .with_context(|| format!("customer {id} does not exist"))?;
            if let Some(first) = first {
                customer.first_name = first;
            }
            if let Some(last) = last {
                customer.last_name = last;
            }
            if let Some(auditor) = auditor {
                service.set_current_auditor(auditor);
            }
            out.one(&service.save(&customer)?)?;
        }
        Command::Find {
            first,
            last,
            created_by,
            modified_by,
        } => {
            let probe = CustomerProbe {
                first_name: first,
                last_name: last,
                created_by,
                last_modified_by: modified_by,
                ..CustomerProbe::default()
            };
            out.all(&service.find_all_by_example(&probe)?)?;
        }
        Command::Unmodified => out.all(&service.find_unmodified_customers()?)?,
        Command::Delete { id } => {
            service.delete(id)?;
            out.line(&format!("Deleted customer {id}"))?;
        }
        Command::Clear => {
            let removed = service.delete_all()?;
            out.line(&format!("Deleted {removed} customer(s)"))?;
        }
    }

    Ok(())
}

fn open_connection(config: &Config) -> Result<Connection> {
    match &config.db {
        Some(path) => {
            open_db(path).with_context(|| format!("failed to open database `{}`", path.display()))
        }
        None => open_db_in_memory().context("failed to open in-memory database"),
    }
}

fn run_demo(
    service: &mut CustomerService<SqliteCustomerRepository<'_>>,
    out: &mut Printer<impl Write>,
) -> Result<()> {
    service.set_current_auditor("Peter");

    let alice = service.save(&Customer::new("Alice", "Smith"))?;
    out.section(&format!(
        "Created a new Customer with auditor as {}",
        auditor_label(service)
    ))?;
    out.one(&alice)?;

    let mut bob = service.save(&Customer::new("Bob", "Smith"))?;
    out.section(&format!(
        "Created another new Customer with auditor as {}",
        auditor_label(service)
    ))?;
    out.one(&bob)?;

    service.set_current_auditor("Jhon");
    bob.first_name = "Bob Modified".to_string();
    let bob = service.save(&bob)?;
    out.section(&format!(
        "Updated a Customer with auditor as {}",
        auditor_label(service)
    ))?;
    out.one(&bob)?;

    out.section("Customers found with find_all():")?;
    out.all(&service.find_all()?)?;

    out.section("Customers found with find_by_first_name('Alice'):")?;
    out.all(&service.find_by_first_name("Alice")?)?;

    out.section("Customers found with find_by_last_name('Smith'):")?;
    out.all(&service.find_by_last_name("Smith")?)?;

    out.section("Customers not modified since creation:")?;
    out.all(&service.find_unmodified_customers()?)?;

    service.delete_all()?;
    out.line("\nDeleted all the customers")
}

fn auditor_label(service: &CustomerService<SqliteCustomerRepository<'_>>) -> String {
    service
        .current_auditor()
        .unwrap_or_else(|| "<none>".to_string())
}

struct Printer<W: Write> {
    json: bool,
    out: W,
}

impl<W: Write> Printer<W> {
    fn new(json: bool, out: W) -> Self {
        Self { json, out }
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn section(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "\n{title}")?;
        writeln!(self.out, "{}", "-".repeat(title.len()))?;
        Ok(())
    }

    fn one(&mut self, customer: &Customer) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string(customer)?)?;
        } else {
            writeln!(self.out, "{customer}")?;
        }
        Ok(())
    }

    fn all(&mut self, customers: &[Customer]) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(customers)?)?;
            return Ok(());
        }
        customers.iter().try_for_each(|customer| self.one(customer))
    }
}

#[cfg(test)]
mod tests {
    use super::{run_demo, Cli, Command, Printer};
    use clap::Parser;
    use customer_store_core::{open_db_in_memory, CustomerService, SqliteCustomerRepository};

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["customer_store", "list", "--json", "--db", "/tmp/c.db"])
            .unwrap();
        assert!(cli.config.json);
        assert_eq!(
            cli.config.db.as_deref(),
            Some(std::path::Path::new("/tmp/c.db"))
        );
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn add_requires_both_names() {
        assert!(Cli::try_parse_from(["customer_store", "add", "--first", "Dave"]).is_err());

        let cli = Cli::try_parse_from([
            "customer_store",
            "add",
            "--first",
            "Dave",
            "--last",
            "Matthews",
            "--auditor",
            "Peter",
        ])
        .unwrap();
        match cli.command {
            Command::Add {
                first,
                last,
                auditor,
            } => {
                assert_eq!(first, "Dave");
                assert_eq!(last, "Matthews");
                assert_eq!(auditor.as_deref(), Some("Peter"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["customer_store", "update", "not-a-uuid"]).is_err());
    }

    #[test]
    fn log_level_requires_log_dir() {
        assert!(Cli::try_parse_from(["customer_store", "list", "--log-level", "debug"]).is_err());

        let cli = Cli::try_parse_from([
            "customer_store",
            "list",
            "--log-level",
            "debug",
            "--log-dir",
            "/tmp/customer-logs",
        ])
        .unwrap();
        assert_eq!(cli.config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn demo_prints_each_step_in_order_and_empties_the_store() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
        let mut service = CustomerService::new(repo);
        let mut out = Printer::new(false, Vec::new());

        run_demo(&mut service, &mut out).unwrap();

        assert_eq!(service.count().unwrap(), 0);
        assert_eq!(service.current_auditor().as_deref(), Some("Jhon"));

        let printed = String::from_utf8(out.out).unwrap();
        let steps = [
            "Created a new Customer with auditor as Peter",
            "Created another new Customer with auditor as Peter",
            "Updated a Customer with auditor as Jhon",
            "firstName='Bob Modified'",
            "Customers found with find_all():",
            "Customers found with find_by_first_name('Alice'):",
            "Customers found with find_by_last_name('Smith'):",
            "Customers not modified since creation:",
            "Deleted all the customers",
        ];
        let mut cursor = 0;
        for step in steps {
            let found = printed[cursor..]
                .find(step)
                .unwrap_or_else(|| panic!("missing `{step}` after offset {cursor}"));
            cursor += found + step.len();
        }
        assert!(printed.contains("createdBy=Peter, "));
        assert!(printed.contains("lastModifiedBy=Jhon, "));
    }

    #[test]
    fn demo_json_output_is_parseable() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
        let mut service = CustomerService::new(repo);
        let mut out = Printer::new(true, Vec::new());

        run_demo(&mut service, &mut out).unwrap();

        let printed = String::from_utf8(out.out).unwrap();
        let first_record = printed
            .lines()
            .find(|line| line.starts_with('{'))
            .expect("demo should print a JSON record");
        let value: serde_json::Value = serde_json::from_str(first_record).unwrap();
        assert_eq!(value["firstName"], "Alice");
        assert_eq!(value["createdBy"], "Peter");
        assert_eq!(value["version"], 0);
    }
}
