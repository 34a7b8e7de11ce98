use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oakpubsub::config::Config;
use oakpubsub::pubsub::{
    self, ops, Attributes, OutboundMessage, PullOptions, PubsubService, SubscriptionOptions,
};
use oakpubsub::GcpClient;
use serde_json::Value;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line administration for Google Cloud Pub/Sub
#[derive(Parser, Debug)]
#[command(name = "oakpubsub", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a topic unless it already exists
    EnsureTopic { name: String },

    /// Create a subscription unless it already exists
    EnsureSubscription {
        topic: String,
        id: String,
        /// Acknowledgement deadline in seconds
        #[arg(long)]
        ack_deadline: Option<u32>,
    },

    /// Publish one message; DATA is parsed as JSON, falling back to a plain string
    Publish {
        topic: String,
        data: String,
        /// Message attribute as key=value (repeatable)
        #[arg(short, long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Pull one batch of messages and print them as JSON lines
    Pull {
        topic: String,
        subscription: String,
        #[arg(long, default_value_t = pubsub::types::DEFAULT_MAX_MESSAGES)]
        max: u32,
        /// Acknowledge the pulled messages
        #[arg(long)]
        ack: bool,
    },

    /// List all topics
    ListTopics {
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// List all subscriptions
    ListSubscriptions {
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Delete topics whose short name matches a regular expression
    DeleteTopics {
        pattern: String,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Delete subscriptions whose short name matches a regular expression
    DeleteSubscriptions {
        pattern: String,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_attribute(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("oakpubsub started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("oakpubsub").join("oakpubsub.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".oakpubsub").join("oakpubsub.log");
    }
    PathBuf::from("oakpubsub.log")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        },
    };

    if let Err(err) = run(args).await {
        match err.downcast_ref::<oakpubsub::Error>() {
            Some(api_err) => eprintln!("Error: {}", api_err.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        tracing::error!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();
    let options = config.client_options(args.project.clone());

    let client = GcpClient::new(options)
        .await
        .context("Failed to initialize Pub/Sub client")?;

    tracing::info!("Using project: {}", client.project_id());

    match args.command {
        Command::EnsureTopic { name } => {
            let topic = pubsub::ensure_topic(&client, &name).await?;
            print_json(&topic)?;
        },
        Command::EnsureSubscription {
            topic,
            id,
            ack_deadline,
        } => {
            let topic = ops::get_topic(&client, &topic);
            let mut options = SubscriptionOptions::default();
            options.ack_deadline_seconds = ack_deadline;
            let subscription = pubsub::ensure_subscription(&client, &topic, &id, options).await?;
            print_json(&subscription)?;
        },
        Command::Publish {
            topic,
            data,
            attributes,
        } => {
            let topic = ops::get_topic(&client, &topic);
            let payload = serde_json::from_str(&data).unwrap_or(Value::String(data));
            let attributes = if attributes.is_empty() {
                None
            } else {
                Some(attributes.into_iter().collect::<Attributes>())
            };
            let message = OutboundMessage {
                data: payload,
                attributes,
            };
            let ids = ops::publish(&client, &topic, &[message]).await?;
            print_json(&ids)?;
        },
        Command::Pull {
            topic,
            subscription,
            max,
            ack,
        } => {
            let topic = ops::get_topic(&client, &topic);
            let options = SubscriptionOptions::default().with_auto_ack(ack);
            let subscription = ops::get_subscription(&client, &topic, &subscription, options);
            let pull_options = PullOptions {
                max_messages: max,
                return_immediately: true,
            };
            for message in ops::pull(&client, &subscription, &pull_options).await? {
                print_json(&message)?;
            }
        },
        Command::ListTopics { page_size } => {
            let page_size = page_size.unwrap_or_else(|| config.effective_page_size());
            pubsub::for_each_topic_page(&client, page_size, |topics| async move {
                for topic in topics {
                    println!("{}", topic.name());
                }
                Ok(())
            })
            .await?;
        },
        Command::ListSubscriptions { page_size } => {
            let page_size = page_size.unwrap_or_else(|| config.effective_page_size());
            pubsub::for_each_subscription_page(&client, page_size, |subscriptions| async move {
                for subscription in subscriptions {
                    println!("{}\t{}", subscription.name(), subscription.topic().name());
                }
                Ok(())
            })
            .await?;
        },
        Command::DeleteTopics {
            pattern,
            page_size,
            concurrency,
        } => {
            let page_size = page_size.unwrap_or_else(|| config.effective_page_size());
            let concurrency = concurrency.unwrap_or_else(|| config.effective_concurrency());
            let summary =
                pubsub::delete_topics_matching(&client, &pattern, page_size, concurrency)?.await?;
            eprintln!("Scanned {} topic(s) in {} page(s)", summary.items, summary.pages);
        },
        Command::DeleteSubscriptions {
            pattern,
            page_size,
            concurrency,
        } => {
            let page_size = page_size.unwrap_or_else(|| config.effective_page_size());
            let concurrency = concurrency.unwrap_or_else(|| config.effective_concurrency());
            let summary =
                pubsub::delete_subscriptions_matching(&client, &pattern, page_size, concurrency)?
                    .await?;
            eprintln!(
                "Scanned {} subscription(s) in {} page(s)",
                summary.items, summary.pages
            );
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            parse_attribute("env=prod"),
            Ok(("env".to_string(), "prod".to_string()))
        );
        assert_eq!(
            parse_attribute("query=a=b"),
            Ok(("query".to_string(), "a=b".to_string()))
        );
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=x").is_err());
    }

    #[test]
    fn test_cli_parses_delete_topics() {
        let args = Args::try_parse_from([
            "oakpubsub",
            "--project",
            "my-project",
            "delete-topics",
            "^tmp-",
            "--concurrency",
            "3",
        ])
        .unwrap();
        assert_eq!(args.project.as_deref(), Some("my-project"));
        match args.command {
            Command::DeleteTopics {
                pattern,
                concurrency,
                page_size,
            } => {
                assert_eq!(pattern, "^tmp-");
                assert_eq!(concurrency, Some(3));
                assert_eq!(page_size, None);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
