//! Terminal driver for the cooking coach. Prints session events as they
//! arrive and maps a few stdin commands onto controller operations.

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use client_core::{CoachConfig, CoachEvent, SessionController};
use shared::domain::Phase;

#[derive(Parser, Debug)]
#[command(name = "coach", about = "Interactive cooking coach client")]
struct Args {
    /// Base URL of the coach backend.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server_url: String,

    /// TTS voice name.
    #[arg(long, default_value = "nova")]
    voice: String,

    /// Dish name or recipe URL to start with immediately.
    food: Option<String>,
}

fn print_event(event: &CoachEvent) {
    match event {
        CoachEvent::PhaseChanged(phase) => match phase {
            Phase::Prompt => println!("== what are we cooking? =="),
            Phase::Loading => println!("== preparing your recipe =="),
            Phase::Allergens => {
                println!("== allergen review: `avoid <name>` to toggle, `confirm` to continue ==")
            }
            Phase::Coaching => println!("== let's cook =="),
        },
        CoachEvent::LoadingStatus(msg) => println!("   {msg}"),
        CoachEvent::GenerationFailed(reason) => println!("!! {reason}"),
        CoachEvent::AllergensDetected(list) => println!("heads up, this may contain: {list:?}"),
        CoachEvent::StepChanged { index, label } => println!("step {}: {label}", index + 1),
        CoachEvent::StepCheckUpdated(check) => {
            let verdict = if check.completed { "done" } else { "not yet" };
            println!("   [camera] {verdict}: {}", check.state.explanation);
        }
        CoachEvent::StepCompleted { index } => {
            println!("   [camera] step {} looks complete, moving on shortly", index + 1)
        }
        CoachEvent::RecipeFinished => println!("== all done, enjoy! =="),
        CoachEvent::Speech(text) => println!("remy: {text}"),
        CoachEvent::StepDetailsLoaded { details, .. } => println!("   how: {details}"),
        CoachEvent::SafetyLoaded { caution, tip, .. } => {
            match tip {
                Some(tip) => println!("   caution: {caution} ({tip})"),
                None => println!("   caution: {caution}"),
            }
        }
        CoachEvent::StepImageLoaded { url, .. } => println!("   goal image: {url}"),
        CoachEvent::SessionReset => println!("session ended"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let config = CoachConfig {
        base_url: args.server_url,
        voice: args.voice,
        ..CoachConfig::default()
    };
    let controller = SessionController::new(config);

    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Some(food) = &args.food {
        if let Err(err) = controller.start_cooking(food).await {
            eprintln!("{err}");
        }
    } else {
        println!("type a dish name or recipe URL to begin");
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "quit" => break,
            "next" => {
                if !controller.advance_step().await? {
                    println!("nothing to advance right now");
                }
            }
            "end" => controller.end_recipe().await,
            "confirm" => {
                if let Err(err) = controller.confirm_allergens().await {
                    eprintln!("{err}");
                }
            }
            other => {
                if let Some(name) = other.strip_prefix("avoid ") {
                    controller.toggle_allergen(name.trim()).await;
                    let snap = controller.snapshot().await;
                    println!("avoiding: {:?}", snap.selected_allergens);
                } else if let Err(err) = controller.start_cooking(other).await {
                    eprintln!("{err}");
                }
            }
        }
    }

    controller.end_recipe().await;
    Ok(())
}
