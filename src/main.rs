use std::io;
use std::process::ExitCode;

use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use trx_gate::Submission;
use trx_gate::config::Config;
use trx_gate::jsonl::{read_submissions, write_responses};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let directory = config.load_directory()?;
    info!(partners = directory.len(), "partner directory loaded");
    let pipeline = config.build_pipeline(directory);

    let submissions = read_submissions(&config.input)?;
    let (tx_sender, tx_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in submissions {
            let submission = match result {
                Ok(submission) => submission,
                // an unreadable or undecodable line still gets an answer
                Err(e) => match e.line() {
                    Some(line) => {
                        warn!(line, error = %e, "request could not be decoded");
                        Submission {
                            line,
                            request: None,
                        }
                    }
                    None => {
                        warn!("{e}");
                        break;
                    }
                },
            };
            if tx_sender.send(submission).await.is_err() {
                break;
            }
        }
    });

    let responses = pipeline.run(ReceiverStream::new(tx_receiver)).await;

    write_responses(&responses, io::stdout().lock())?;
    Ok(())
}
