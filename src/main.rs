use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use docqa_client::errors::best_effort;
use docqa_client::view::TailFollower;
use docqa_client::{
    ChatController, ClientConfig, DocumentQaClient, Exchange, StagedFile, UploadController,
};

type Input = Lines<BufReader<Stdin>>;
type Uploads = UploadController<DocumentQaClient, DocumentQaClient>;
type Chat = ChatController<DocumentQaClient>;

/// Terminal client for the document question-answering service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Files to stage on start.
    files: Vec<PathBuf>,

    /// Service base URL (overrides DOCQA_API_BASE_URL).
    #[arg(long)]
    api_base: Option<String>,

    /// Skip the startup health probe.
    #[arg(long)]
    skip_health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.api_base.map(ClientConfig::new).unwrap_or_else(ClientConfig::from_env);
    info!("Using document service at {}", config.api_base);
    let client = DocumentQaClient::new(config);

    if !args.skip_health {
        probe_health(&client).await;
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // ── Upload screen ─────────────────────────────────────────────────────────
    let uploads = UploadController::mount(client.clone(), client.clone()).await;
    for path in &args.files {
        stage_path(&uploads, path).await;
    }
    if !run_upload_screen(&uploads, &mut input).await? {
        return Ok(());
    }
    drop(uploads);

    if let Some(count) = best_effort("document_count", client.document_count()).await {
        info!(chunks = count, "Document context ready");
    }

    // ── Chat screen ───────────────────────────────────────────────────────────
    let chat = ChatController::new(client);
    run_chat_screen(&chat, &mut input).await
}

async fn probe_health(client: &DocumentQaClient) {
    match best_effort("health_check", client.health()).await {
        Some(health) if health.is_ready() => info!("Document service is {}", health.status),
        Some(health) => warn!(components = ?health.components, "Document service is degraded"),
        None => warn!("Document service did not answer the health check"),
    }
}

async fn stage_path(uploads: &Uploads, path: &Path) {
    match StagedFile::load(path).await {
        Ok(file) => uploads.stage_files([file]),
        Err(e) => println!("Cannot read {}: {e}", path.display()),
    }
}

/// Returns `true` once every file is uploaded and the chat screen should open.
async fn run_upload_screen(uploads: &Uploads, input: &mut Input) -> anyhow::Result<bool> {
    println!("Commands: add <path>..., rm <index>, list, process, quit");
    print_staged(uploads);

    while let Some(line) = input.next_line().await? {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("add") => {
                for path in words {
                    stage_path(uploads, Path::new(path)).await;
                }
                print_staged(uploads);
            }
            Some("rm") => {
                match words.next().and_then(|w| w.parse::<usize>().ok()) {
                    Some(index) => {
                        uploads.unstage_file(index);
                    }
                    None => println!("Usage: rm <index>"),
                }
                print_staged(uploads);
            }
            Some("list") => print_staged(uploads),
            Some("process") => {
                println!("Processing...");
                match uploads.submit_batch().await {
                    Ok(outcome) if outcome.should_navigate() => return Ok(true),
                    Ok(_) => {}
                    Err(_) => {
                        if let Some(error) = uploads.error() {
                            println!("{error}");
                        }
                    }
                }
            }
            Some("quit") => return Ok(false),
            Some(other) => println!("Unknown command: {other}"),
            None => {}
        }
    }
    Ok(false)
}

fn print_staged(uploads: &Uploads) {
    let snapshot = uploads.snapshot();
    if snapshot.files.is_empty() {
        println!("No Documents. Start by uploading a document first");
        return;
    }
    println!("Uploaded Files ({})", snapshot.files.len());
    for (index, file) in snapshot.files.iter().enumerate() {
        println!("  [{index}] {} ({} KB)", file.name(), file.size_kib());
    }
}

async fn run_chat_screen(chat: &Chat, input: &mut Input) -> anyhow::Result<()> {
    println!("What can I help you with? (/quit to exit)");
    let mut follower = TailFollower::new();

    while let Some(line) = input.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }
        chat.set_input(line);

        let show_question = async {
            // Let the submission append the question first.
            tokio::task::yield_now().await;
            render_tail(chat, &mut follower);
        };
        let (exchange, ()) = tokio::join!(chat.submit_input(), show_question);
        if exchange == Exchange::Ignored {
            continue;
        }
        render_tail(chat, &mut follower);
    }
    Ok(())
}

fn render_tail(chat: &Chat, follower: &mut TailFollower) {
    let update = follower.advance(&chat.snapshot());
    for message in &update.appended {
        if message.is_user() {
            println!("> {}", message.content);
        } else {
            println!("{}\n", message.content);
        }
    }
    if update.show_pending {
        println!("...");
    }
}
