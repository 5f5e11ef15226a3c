use blog_client::{BlogClientGrpc, Post};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(about = "Command line client for the blog gRPC service")]
struct Cli {
    #[clap(
        short,
        long,
        env = "BLOG_SERVER",
        default_value = "http://127.0.0.1:50051"
    )]
    server: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Create {
        #[clap(long)]
        author_id: String,
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
    },
    Read {
        id: String,
    },
    Update {
        id: String,
        #[clap(long)]
        author_id: String,
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
    },
    Delete {
        id: String,
    },
    List,
    /// Walks a post through create, read, update and delete.
    Demo {
        /// Defaults to a random author id.
        #[clap(long)]
        author_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let args = Cli::parse();
    let mut client = BlogClientGrpc::connect(&args.server).await?;

    match args.command {
        Command::Create {
            author_id,
            title,
            content,
        } => {
            let post = client.create_post(author_id, title, content).await?;
            println!("Post created! ID: {}", post.id);
        }
        Command::Read { id } => {
            let post = client.read_post(id).await?;
            println!("{}", post);
        }
        Command::Update {
            id,
            author_id,
            title,
            content,
        } => {
            client
                .update_post(Post {
                    id: id.clone(),
                    author_id,
                    title,
                    content,
                })
                .await?;
            println!("Post updated: {}", id);
        }
        Command::Delete { id } => {
            let post = client.delete_post(id).await?;
            println!("Post deleted: {}", post);
        }
        Command::List => {
            let posts = client.list_posts().await?;
            println!("Posts ({})", posts.len());
            for post in posts {
                println!("- [{}] {} (by {})", post.id, post.title, post.author_id);
            }
        }
        Command::Demo { author_id } => {
            let author_id = author_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            run_demo(&mut client, author_id).await?;
        }
    }

    Ok(())
}

async fn run_demo(client: &mut BlogClientGrpc, author_id: String) -> anyhow::Result<()> {
    let created = client
        .create_post(
            author_id,
            "My first Blog".to_string(),
            "test content".to_string(),
        )
        .await?;
    println!("Created: {}", created);

    let read = client.read_post(created.id.clone()).await?;
    println!("Read back: {}", read);

    match client.read_post("nonexistent".to_string()).await {
        Err(e) if e.is_not_found() => println!("Read of unknown id: {}", e),
        other => anyhow::bail!("expected not found for unknown id, got {:?}", other),
    }

    let bogus = Post {
        id: "bogus".to_string(),
        ..read.clone()
    };
    match client.update_post(bogus).await {
        Err(e) if e.is_not_found() => println!("Update of unknown id: {}", e),
        other => anyhow::bail!("expected not found for unknown id, got {:?}", other),
    }

    client
        .update_post(Post {
            content: "Updated content".to_string(),
            ..read
        })
        .await?;
    info!(post_id = %created.id, "post updated");
    println!("Updated: {}", client.read_post(created.id.clone()).await?);

    let deleted = client.delete_post(created.id.clone()).await?;
    println!("Deleted: {}", deleted);

    match client.read_post(created.id).await {
        Err(e) if e.is_not_found() => println!("Read after delete: {}", e),
        other => anyhow::bail!("expected not found after delete, got {:?}", other),
    }

    Ok(())
}
