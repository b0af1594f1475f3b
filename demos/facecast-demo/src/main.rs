//! FaceCast Demo Application
//!
//! Runs one node for a fixed time:
//! - `facecast-demo sender [config.json] [seconds]`: synthetic face, broadcast
//!   and a local console rig
//! - `facecast-demo receiver [config.json] [seconds]`: console rig driven by
//!   whatever arrives on the port
//!
//! The active avatar advances every 5 seconds and wear flips every 3.

mod console;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use facecast_core::Quat;
use facecast_pose::Transform;
use facecast_runtime::{
    init_from_config, AvatarRig, AvatarRoster, Node, NodeConfig, NodeMode,
};
use facecast_test::SyntheticFace;

use console::ConsoleRig;

const SWITCH_EVERY: u64 = 5;
const WEAR_EVERY: u64 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mode: Option<NodeMode> = args.next().map(|m| m.parse()).transpose()?;
    let config_path = args.next().filter(|p| p != "-").map(PathBuf::from);
    let run_for = Duration::from_secs(args.next().and_then(|s| s.parse().ok()).unwrap_or(20));

    let mut config = NodeConfig::load(config_path.as_deref())?;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    init_from_config(&config)?;

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           FaceCast Demo - Face Tracking Broadcast          ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!("Mode:     {}", config.mode);
    match config.mode {
        NodeMode::Sender => println!("Target:   {}", config.broadcast_target()),
        NodeMode::Receiver => println!("Listen:   {}", config.bind_target()),
    }
    println!("Avatars:  {}", config.rigs.join(", "));
    println!("Duration: {}s", run_for.as_secs());
    println!();

    let registry = config.load_registry()?;
    let roster = AvatarRoster::from_registry(&registry, &config.rigs, |profile| {
        AvatarRig::new(
            Transform::default(),
            vec![Transform::default(); 4],
            ConsoleRig::new(&profile.id),
        )
        .with_eyes(Transform::default(), Transform::default())
    })?;

    let mut node = Node::start(config.clone(), roster).await?;
    let mut face = SyntheticFace::new(rand::random());
    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let start = Instant::now();
    let mut last_switch = 0;
    let mut last_wear = 0;
    let mut ticks = 0u64;

    while start.elapsed() < run_for {
        interval.tick().await;
        let t = start.elapsed();
        ticks += 1;

        if node.mode() == NodeMode::Sender {
            if let Err(e) = node.capture(&face.sample(t.as_secs_f32())) {
                tracing::warn!("capture failed: {}", e);
            }
        }

        let frame = node.tick();

        let secs = t.as_secs();
        if secs >= last_wear + WEAR_EVERY {
            last_wear = secs;
            if let Some(wearing) = node.toggle_wear() {
                println!(">> wear {}", if wearing { "on" } else { "off" });
            }
        }
        if secs >= last_switch + SWITCH_EVERY {
            last_switch = secs;
            if node.switch_avatar(true).is_some() {
                if let Some(avatar) = node.roster().active() {
                    println!(">> switched to {}", avatar.profile().display_name);
                }
            }
        }

        if ticks % 30 == 0 {
            match (frame, node.roster().active()) {
                (Some(frame), Some(avatar)) => {
                    let head = avatar
                        .joint(0)
                        .map(|j| Quat::IDENTITY.angle_to(&j.rotation).to_degrees())
                        .unwrap_or_default();
                    println!(
                        "{}  head {:>5.1}°  eyes ({:>5.1}, {:>5.1})",
                        avatar.face().render(),
                        head,
                        frame.eyes.left.x,
                        frame.eyes.left.y,
                    );
                }
                _ => println!("waiting for tracking data..."),
            }
        }
    }

    let stats = node.shutdown().await;
    println!();
    println!("Ticks:    {} ({} without data)", stats.ticks, stats.skipped_ticks);
    println!("Captures: {}", stats.captures);
    if let Some(receive) = stats.receive {
        println!(
            "Received: {} datagrams, {} applied, {} dropped",
            receive.datagrams, receive.published, receive.dropped
        );
    }

    Ok(())
}
