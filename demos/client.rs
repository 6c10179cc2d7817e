use argh::FromArgs;
use pictor::{ClientConfig, DescribeSession, OllamaClient};
use std::{path::PathBuf, time::Duration};

#[derive(FromArgs)]
/// Pictor client for describing images with a local Ollama server
struct ClientArgs {
    /// the Ollama server to talk to (defaults to $OLLAMA_HOST or localhost:11434)
    #[argh(option, short = 'e', default = "ClientConfig::from_env().endpoint")]
    endpoint: String,

    /// the model to use
    #[argh(option, short = 'm', default = "pictor::DEFAULT_MODEL.to_string()")]
    model: String,

    /// give up after this many seconds (waits forever by default)
    #[argh(option, short = 't')]
    timeout: Option<u64>,

    /// command to execute: "describe" or "models"
    #[argh(subcommand)]
    command: ClientCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum ClientCommands {
    Describe(DescribeCommand),
    Models(ModelsCommand),
}

#[derive(FromArgs)]
/// Describe an image
#[argh(subcommand, name = "describe")]
struct DescribeCommand {
    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,
}

#[derive(FromArgs)]
/// List the models installed on the server
#[argh(subcommand, name = "models")]
struct ModelsCommand {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ClientArgs = argh::from_env();

    let mut config = ClientConfig::default()
        .with_endpoint(args.endpoint)
        .with_model(args.model);
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = OllamaClient::new(config)?;

    match args.command {
        ClientCommands::Describe(describe_command) => {
            match client.has_model().await {
                Ok(false) => log::warn!(
                    "Model {} is not installed, try: ollama pull {}",
                    client.config().model,
                    client.config().model
                ),
                Ok(true) => {}
                Err(e) => log::debug!("Model check failed: {e}"),
            }

            let session = DescribeSession::new(client);
            let outcome = match session.load_path(&describe_command.image_path) {
                Ok(()) => session.describe().await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(description) => println!("{description}"),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
        ClientCommands::Models(_) => match client.list_models().await {
            Ok(models) => {
                for model in models {
                    println!("{model}");
                }
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
