use anyhow::Result;
use clap::Parser;
use erpkit::{cli::CommonArgs, filter_raw, find_events, reject_epochs};
use erpkit::fiff::read_raw_fif;

#[derive(Parser)]
#[command(name = "preprocess", about = "Band-pass filter a raw recording and epoch it with rejection")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Highpass edge in Hz (overrides the config)
    #[arg(long)]
    l_freq: Option<f64>,

    /// Lowpass edge in Hz (overrides the config)
    #[arg(long)]
    h_freq: Option<f64>,

    /// Peak-to-peak EEG rejection threshold in volts (overrides the config)
    #[arg(long)]
    reject: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging();

    let mut cfg = args.common.analysis_config()?;
    cfg.l_freq = args.l_freq.unwrap_or(cfg.l_freq);
    cfg.h_freq = args.h_freq.unwrap_or(cfg.h_freq);
    cfg.reject_threshold = args.reject.unwrap_or(cfg.reject_threshold);

    let path = match &args.common.raw {
        Some(p) => p.clone(),
        None => args.common.data_config().sample_raw_path()?,
    };
    let raw = read_raw_fif(&path)?;
    let events = find_events(&raw, &cfg.stim_channel)?;
    let filtered = filter_raw(&raw, cfg.l_freq, cfg.h_freq)?;
    let epochs = reject_epochs(
        &filtered,
        &events,
        cfg.event_id.as_ref(),
        cfg.tmin,
        cfg.tmax,
        cfg.reject_threshold,
    )?;

    println!("Filtered raw and created {} epochs after rejection.", epochs.len());
    Ok(())
}
