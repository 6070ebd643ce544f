use sqlentity::core::db::schema;
use sqlentity::{load_config, Connection, ConnectionConfig, Entity, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: sqlentity <database|config.toml|config.json> [table]";

fn main() {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.len() > 2 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    if let Err(e) = run(&args[0], args.get(1).map(String::as_str)) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(target: &str, table: Option<&str>) -> Result<()> {
    let config = if target.ends_with(".toml") || target.ends_with(".json") {
        load_config(target)?
    } else {
        ConnectionConfig {
            create: false,
            ..ConnectionConfig::new(target)
        }
    };

    let connection = Connection::new(&config)?;
    info!("Connected to {}", config.database);

    match table {
        None => {
            for name in schema::list_tables(&connection)? {
                println!("{}", name);
            }
        }
        Some(name) => {
            let entity = Entity::new(name, &connection)?;
            println!("{}", entity);
            println!("{} row(s)", entity.len()?);
            println!("{}", entity.get_table()?);
        }
    }

    connection.close()
}
