//! Renders a WAV file through a saved graph, offline.
//!
//! This is the host application in miniature: it supplies the hardware
//! channel counts and the media player at prepare time, then drives the
//! engine block by block - exactly what a live audio callback would do,
//! minus the deadline.

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use escena_core::{AudioBuffer, AudioGraphEngine, media};
use escena_registry::builtin_registry;
use escena_session::{GraphSerializer, WorkspaceManager};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};

use crate::media::WavMediaSource;
use crate::wav::{linear_to_db, peak, read_wav_stereo, rms, write_wav_stereo};

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file (the "microphone" feed)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Graph snapshot file to load
    #[arg(short, long, conflicts_with = "workspaces")]
    graph: Option<PathBuf>,

    /// Workspace state file to load (renders the active slot)
    #[arg(short, long)]
    workspaces: Option<PathBuf>,

    /// WAV file fed to the playback node
    #[arg(short, long)]
    playback: Option<PathBuf>,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    println!("Reading {}...", args.input.display());
    let (left_in, right_in, sample_rate) = read_wav_stereo(&args.input)?;
    let frames = left_in.len();
    println!(
        "  {} frames, {} Hz, {:.2}s",
        frames,
        sample_rate,
        frames as f32 / sample_rate as f32
    );

    let media = match &args.playback {
        Some(path) => {
            let (l, r, _) = read_wav_stereo(path)?;
            let source: escena_core::SharedMediaSource =
                Arc::new(Mutex::new(WavMediaSource::new(l, r)));
            source
        }
        None => media::silence(),
    };

    let block = args.block_size.max(1);
    let mut engine = AudioGraphEngine::new(builtin_registry());
    engine.prepare(sample_rate as f32, block, 2, 2, media);
    tracing::info!(sample_rate, block, "engine prepared for offline render");

    if let Some(path) = &args.graph {
        if !GraphSerializer::load_from_file(&mut engine, path) {
            bail!("could not load graph from {}", path.display());
        }
    } else if let Some(path) = &args.workspaces {
        let mut manager = WorkspaceManager::new();
        if !manager.load_from_file(&mut engine, path) {
            bail!("could not load workspaces from {}", path.display());
        }
        println!(
            "Rendering workspace {} (\"{}\")",
            manager.active_workspace(),
            manager.name(manager.active_workspace()).unwrap_or("?")
        );
    } else {
        bail!("no graph specified: use --graph or --workspaces (try `escena demo` first)");
    }

    // Run the post-prepare silence countdown out before streaming.
    let mut io = AudioBuffer::new(2, block);
    for _ in 0..escena_core::ZOMBIE_FLUSH_BLOCKS {
        engine.process_block(&mut io, &[]);
    }

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut left_out = vec![0.0f32; frames];
    let mut right_out = vec![0.0f32; frames];

    for start in (0..frames).step_by(block) {
        let end = (start + block).min(frames);
        let len = end - start;

        io.clear();
        io.channel_mut(0)[..len].copy_from_slice(&left_in[start..end]);
        io.channel_mut(1)[..len].copy_from_slice(&right_in[start..end]);

        engine.process_block(&mut io, &[]);

        left_out[start..end].copy_from_slice(&io.channel(0)[..len]);
        right_out[start..end].copy_from_slice(&io.channel(1)[..len]);
        pb.set_position(end as u64);
    }
    pb.finish_with_message("done");

    write_wav_stereo(&args.output, &left_out, &right_out, sample_rate)?;

    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&left_in)),
        linear_to_db(peak(&left_in))
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&left_out)),
        linear_to_db(peak(&left_out))
    );
    println!("Wrote {}", args.output.display());
    Ok(())
}
