use anyhow::{bail, Result};
use clap::Parser;
use erpkit::{cli::CommonArgs, compute_evoked, export_peak_to_csv, filter_raw, find_events, reject_epochs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "erp", about = "Average one condition and export its ERP peak to CSV")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Condition tag to average (overrides the config)
    #[arg(long)]
    condition: Option<String>,

    /// Channel searched for the peak (overrides the config)
    #[arg(long)]
    channel: Option<String>,

    /// Output CSV (overrides the config)
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging();

    let mut cfg = args.common.analysis_config()?;
    if let Some(c) = args.condition {
        cfg.condition = c;
    }
    if let Some(c) = args.channel {
        cfg.peak_channel = c;
    }
    if let Some(p) = args.csv {
        cfg.erp_csv = p;
    }

    let mut renderer = args.common.renderer()?;
    let (raw, _picks) = erpkit::load_and_plot(
        args.common.raw.as_deref(),
        &args.common.data_config(),
        renderer.as_mut(),
    )?;
    let events = find_events(&raw, &cfg.stim_channel)?;
    if events.is_empty() {
        bail!("no events on {}", cfg.stim_channel);
    }
    let filtered = filter_raw(&raw, cfg.l_freq, cfg.h_freq)?;
    let epochs = reject_epochs(
        &filtered,
        &events,
        cfg.event_id.as_ref(),
        cfg.tmin,
        cfg.tmax,
        cfg.reject_threshold,
    )?;

    let evoked = compute_evoked(&epochs, &cfg.condition)?;
    let row = export_peak_to_csv(
        &evoked,
        cfg.peak_channel.as_str(),
        cfg.peak_tmin,
        cfg.peak_tmax,
        &cfg.erp_csv,
    )?;

    println!(
        "Condition {} ({} trials): peak {:.2} µV at {:.3} s on {}",
        cfg.condition, evoked.nave, row.amplitude_uv, row.latency_s, row.channel
    );
    println!("Written → {}", cfg.erp_csv.display());
    Ok(())
}
