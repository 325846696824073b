//! Native reader for `.fif` raw recordings (Neuromag / MNE format).
//!
//! ```no_run
//! use erpkit::fiff::read_raw_fif;
//!
//! let rec = read_raw_fif("sample_audvis_raw.fif").unwrap();
//! println!("{} channels @ {} Hz", rec.n_chan(), rec.sfreq);
//! ```
pub mod constants;
pub mod info;
pub mod raw;
pub mod tag;
pub mod tree;

pub use info::{read_meas_info, ChannelInfo, MeasInfo};
pub use raw::{open_raw, read_raw_fif, BufferRecord, RawFif};
pub use tag::{TagHeader, TagRead};
pub use tree::{load_directory, scan_directory, Node};
