use bytes::Bytes;
use clap::{Parser, Subcommand};
use ringdb::client::{db_client::DbClient, Client};
use ringdb::cluster::node::NodeAddress;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Parser)]
#[command(name = "ringdb-client")]
#[command(about = "ringdb-client tcp client", long_about = None)]
struct Cli {
    /// any node (or coordinator) of the cluster
    #[arg(long, default_value = "127.0.0.1:7001")]
    addr: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Ping,
    Get {
        #[arg(short, long)]
        key: String,
    },
    Set {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        value: String,
    },
    Delete {
        #[arg(short, long)]
        key: String,
    },
    RingState {
        #[arg(long)]
        include_ranges: bool,
    },
    AddNode {
        #[arg(long)]
        node: String,
    },
    RemoveNode {
        #[arg(long)]
        node: String,
    },
    ReplaceTopology {
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<String>,
    },
}

async fn print_json<T: Serialize>(response: &T) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(serde_json::to_string_pretty(response)?.as_bytes())
        .await?;
    stdout.write_all(b"\n").await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut client = DbClient::new(args.addr);
    client.connect().await?;

    match args.command {
        Commands::Ping => print_json(&client.ping().await?).await?,
        Commands::Get { key } => {
            print_json(&client.get(Bytes::from(key), false).await?).await?
        }
        Commands::Set { key, value } => {
            print_json(
                &client
                    .set(Bytes::from(key), Bytes::from(value), false)
                    .await?,
            )
            .await?
        }
        Commands::Delete { key } => {
            print_json(&client.delete(Bytes::from(key), false).await?).await?
        }
        Commands::RingState { include_ranges } => {
            print_json(&client.ring_state(include_ranges).await?).await?
        }
        Commands::AddNode { node } => {
            print_json(&client.add_node(NodeAddress::from(node)).await?).await?
        }
        Commands::RemoveNode { node } => {
            print_json(&client.remove_node(NodeAddress::from(node)).await?).await?
        }
        Commands::ReplaceTopology { nodes } => {
            let nodes = nodes.into_iter().map(NodeAddress::from).collect();
            print_json(&client.replace_topology(nodes).await?).await?
        }
    }

    Ok(())
}
