use clap::Parser;
use log::{debug, error};
use std::path::PathBuf;
use std::process::ExitCode;

use xlate::{Provider, Settings, StaticSettings, TranslationRequest, Translator};

/// Translate text or recognise an image through an AI vendor
#[derive(Debug, Parser)]
#[command(name = "xlate", version)]
struct Cli
{   /// Settings JSON file; XLATE_* environment variables are applied on top
    #[arg(long, short)]
    settings: Option<PathBuf>
  , /// Vendor to use (openai, gemini, zhipu, deepseek, minimax)
    #[arg(long, short)]
    provider: Option<Provider>
  , /// Target language
    #[arg(long, short, default_value = "English")]
    target: String
  , /// Source language, detected when omitted
    #[arg(long)]
    source: Option<String>
  , /// Image to recognise instead of text
    #[arg(long)]
    image: Option<PathBuf>
  , /// Ask reasoning-capable models to think first
    #[arg(long)]
    reasoning: bool
  , /// Text to translate
    text: Vec<String>
}

fn load_settings(cli: &Cli) -> xlate::Result<Settings>
{   let settings = match &cli.settings
    {   Some(path) => Settings::from_file(path)?
      , None => Settings::default()
    };
    let mut settings = settings.apply_env();
    if let Some(provider) = cli.provider
    {   settings.text_provider = provider;
        settings.image_provider = provider;
    }
    if cli.reasoning
    {   settings.enable_reasoning = true;
    }
    Ok(settings)
}

fn build_request(cli: &Cli) -> xlate::Result<TranslationRequest>
{   let request = match &cli.image
    {   Some(path) => TranslationRequest::image(std::fs::read(path)?, cli.target.clone())
      , None => {
          let text = cli.text.join(" ");
          if text.trim().is_empty()
          {   return Err(xlate::Error::InvalidConfiguration(
                "nothing to translate".to_string()
              ));
          }
          TranslationRequest::text(text, cli.target.clone())
        }
    };
    Ok(match &cli.source
    {   Some(source) => request.with_source(source.clone())
      , None => request
    })
}

async fn run(cli: Cli) -> xlate::Result<String>
{   let settings = load_settings(&cli)?;
    debug!("Using {} for text requests", settings.text_provider);
    let request = build_request(&cli)?;
    let record = Translator::new(StaticSettings(settings))
      .translate(request)
      .await?;
    Ok(record.output)
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("warn")
    ).init();

    match run(Cli::parse()).await
    {   Ok(output) => {
          println!("{}", output);
          ExitCode::SUCCESS
        }
      , Err(e) => {
          error!("{:?}", e.kind());
          eprintln!("{}", e);
          ExitCode::FAILURE
        }
    }
}
