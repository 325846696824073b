//! Plot rendering.
//!
//! Analysis code hands fully prepared views to a [`Renderer`]; it never
//! draws itself. [`NullRenderer`] only logs what would be drawn,
//! [`PngRenderer`] rasterises each view to a PNG file.
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::Array2;

/// Channel traces over a time span.
#[derive(Debug, Clone)]
pub struct RawView {
    pub title:    String,
    pub channels: Vec<String>,
    /// Seconds from the first stored sample.
    pub times:    Vec<f64>,
    /// `[n_channels, n_times]`.
    pub data:     Array2<f64>,
}

/// One channel's time-frequency map.
#[derive(Debug, Clone)]
pub struct TfrImage {
    pub channel: String,
    pub freqs:   Vec<f64>,
    pub times:   Vec<f64>,
    /// `[n_freqs, n_times]`.
    pub values:  Array2<f64>,
    /// How `values` were scaled, e.g. `"logratio"`.
    pub mode:    &'static str,
}

pub trait Renderer {
    fn plot_raw(&mut self, view: &RawView) -> Result<()>;
    fn plot_tfr(&mut self, image: &TfrImage) -> Result<()>;
}

/// Logs each plot request and draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn plot_raw(&mut self, view: &RawView) -> Result<()> {
        let span = match (view.times.first(), view.times.last()) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        };
        log::info!("{}: {} channel(s), {span:.2} s", view.title, view.channels.len());
        Ok(())
    }

    fn plot_tfr(&mut self, image: &TfrImage) -> Result<()> {
        let (nf, nt) = image.values.dim();
        log::info!("tfr {} ({}): {nf} freqs × {nt} samples", image.channel, image.mode);
        Ok(())
    }
}

/// Writes numbered PNG files into a directory.
#[derive(Debug)]
pub struct PngRenderer {
    out_dir: PathBuf,
    width:   u32,
    height:  u32,
    written: Vec<PathBuf>,
}

impl PngRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("create plot directory {}", out_dir.display()))?;
        Ok(Self { out_dir, width: 1000, height: 600, written: Vec::new() })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn next_path(&self, stem: &str) -> PathBuf {
        let slug: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        self.out_dir.join(format!("{:02}_{slug}.png", self.written.len()))
    }

    fn save(&mut self, img: &RgbImage, stem: &str) -> Result<()> {
        let path = self.next_path(stem);
        img.save(&path).with_context(|| format!("write {}", path.display()))?;
        log::info!("plot saved to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

impl Renderer for PngRenderer {
    fn plot_raw(&mut self, view: &RawView) -> Result<()> {
        let (n_ch, n_t) = view.data.dim();
        if n_ch == 0 || n_t == 0 {
            bail!("nothing to plot in {:?}", view.title);
        }
        let (w, h) = (self.width, self.height);
        let mut img: RgbImage = ImageBuffer::from_pixel(w, h, Rgb([255, 255, 255]));
        let band = h as f64 / n_ch as f64;

        for (ch, row) in view.data.outer_iter().enumerate() {
            let (lo, hi) = row.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let range = if hi > lo { hi - lo } else { 1.0 };
            let top = ch as f64 * band;
            let to_y = |v: f64| {
                let y = top + band * (0.9 - 0.8 * (v - lo) / range);
                (y as u32).min(h - 1)
            };
            // One vertical min-max stroke per pixel column.
            for x in 0..w {
                let t0 = x as usize * n_t / w as usize;
                let t1 = ((x as usize + 1) * n_t / w as usize).max(t0 + 1).min(n_t);
                let seg = row.slice(ndarray::s![t0..t1]);
                let (smin, smax) = seg.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| (a.min(v), b.max(v)));
                let (ya, yb) = (to_y(smax), to_y(smin));
                for y in ya..=yb {
                    img.put_pixel(x, y, Rgb([20, 20, 20]));
                }
            }
        }
        let title = view.title.clone();
        self.save(&img, &title)
    }

    fn plot_tfr(&mut self, image: &TfrImage) -> Result<()> {
        let (nf, nt) = image.values.dim();
        if nf == 0 || nt == 0 {
            bail!("empty time-frequency map for {}", image.channel);
        }
        // Symmetric limits so zero change sits mid-scale.
        let vmax = image.values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let vmax = if vmax > 0.0 { vmax } else { 1.0 };

        let (w, h) = (self.width, self.height);
        let mut img: RgbImage = ImageBuffer::new(w, h);
        for y in 0..h {
            // low frequencies at the bottom
            let fi = ((h - 1 - y) as usize * nf / h as usize).min(nf - 1);
            for x in 0..w {
                let ti = (x as usize * nt / w as usize).min(nt - 1);
                let v = image.values[[fi, ti]];
                img.put_pixel(x, y, viridis((v / vmax + 1.0) / 2.0));
            }
        }
        self.save(&img, &format!("tfr_{}", image.channel))
    }
}

/// Viridis-like ramp for `v` in `[0, 1]`.
fn viridis(v: f64) -> Rgb<u8> {
    let v = v.clamp(0.0, 1.0);
    let r = 68.0 + v * (253.0 - 68.0);
    let g = 1.0 + v * (231.0 - 1.0);
    let b = 84.0 + v * (37.0 - 84.0) + (1.0 - v) * v * 150.0;
    Rgb([r as u8, g as u8, b.clamp(0.0, 255.0) as u8])
}

/// Renderer for the given plot directory, or a logging one without it.
pub fn renderer_for(plot_dir: Option<&Path>) -> Result<Box<dyn Renderer>> {
    Ok(match plot_dir {
        Some(dir) => Box::new(PngRenderer::new(dir)?),
        None => Box::new(NullRenderer),
    })
}
