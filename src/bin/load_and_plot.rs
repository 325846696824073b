use anyhow::Result;
use clap::Parser;
use erpkit::{cli::CommonArgs, load_and_plot_with, Preview};

#[derive(Parser)]
#[command(name = "load_and_plot", about = "Load a raw recording and preview its first EEG channels")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging();

    let cfg = args.common.analysis_config()?;
    let mut renderer = args.common.renderer()?;
    let preview = Preview {
        n_channels: cfg.preview_channels,
        duration: cfg.preview_duration,
        ..Preview::default()
    };
    let (raw, picks) = load_and_plot_with(
        args.common.raw.as_deref(),
        &args.common.data_config(),
        preview,
        renderer.as_mut(),
    )?;

    let names: Vec<&str> = picks.iter().map(|&i| raw.channels[i].name.as_str()).collect();
    println!("Loaded {} ch × {} samples @ {} Hz", raw.n_chan(), raw.n_times(), raw.sfreq);
    println!("Plotted first {} EEG channels: {}", picks.len(), names.join(", "));
    Ok(())
}
