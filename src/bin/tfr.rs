use anyhow::{bail, Result};
use clap::Parser;
use erpkit::{cli::CommonArgs, compute_tfr, export_band_power, filter_raw, find_events, plot_tfr, reject_epochs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tfr", about = "Morlet time-frequency power of the first EEG channel")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Also export mean band power to this CSV (default path from the config)
    #[arg(long)]
    band_csv: Option<Option<PathBuf>>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging();

    let cfg = args.common.analysis_config()?;
    let mut renderer = args.common.renderer()?;

    let (raw, picks) = erpkit::load_and_plot(
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

    let power = compute_tfr(&epochs, &picks[..1], cfg.freqs.as_deref(), cfg.n_cycles.as_deref())?;
    plot_tfr(&power, cfg.plot_tmin, cfg.plot_tmax, cfg.plot_fmin, cfg.plot_fmax, renderer.as_mut())?;

    if let Some(path) = args.band_csv {
        let path = path.unwrap_or_else(|| cfg.tfr_csv.clone());
        let rows = export_band_power(&power, cfg.band, cfg.band_tmin, cfg.band_tmax, &path)?;
        for (ch, p) in &rows {
            println!("{ch}: {:e} mean {}-{} Hz power", p, cfg.band.0, cfg.band.1);
        }
    }

    println!("TFR script ran successfully.");
    Ok(())
}
