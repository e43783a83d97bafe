use anyhow::{Context, Result};
use cell_model_common::{DensityHistogram, Snapshot, Vec2};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serialized snapshot formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Bincode,
    MessagePack,
}

impl OutputFormat {
    /// Parses the `output.format` setting, falling back to JSON for unknown values.
    pub fn from_config(format: Option<&str>) -> Self {
        match format.unwrap_or("json") {
            "json" => OutputFormat::Json,
            "bincode" => OutputFormat::Bincode,
            "messagepack" => OutputFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                OutputFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes all snapshots to `<base>_snapshots.<ext>` and returns the file name.
pub fn save_snapshots(base_filename: &str, snapshots: &[Snapshot], format: OutputFormat) -> Result<String> {
    let filename = format!("{}_snapshots.{}", base_filename, format.extension());
    let file = File::create(&filename)
        .with_context(|| format!("Error creating snapshot file '{}'", filename))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .with_context(|| format!("Error serializing snapshots to JSON in '{}'", filename))?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .with_context(|| format!("Error serializing snapshots to bincode in '{}'", filename))?,
        OutputFormat::MessagePack => rmp_serde::encode::write(&mut writer, snapshots)
            .with_context(|| format!("Error serializing snapshots to MessagePack in '{}'", filename))?,
    }
    writer.flush()?;
    info!("All snapshots saved to {} ({:?} format)", filename, format);
    Ok(filename)
}

/// Writes positions as an `x,y` CSV file.
pub fn save_positions_csv<P: AsRef<Path>>(path: P, positions: &[Vec2]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["x", "y"])?;
    for p in positions {
        writer.write_record([format!("{:.6}", p.x), format!("{:.6}", p.y)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes replica-averaged histogram values as `frame,ix,iy,value` rows.
pub fn save_histogram_csv<P: AsRef<Path>>(path: P, hist: &DensityHistogram) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record(["frame", "ix", "iy", "value"])?;
    for frame in 0..hist.n_frames() {
        for iy in 0..hist.bins[1] as usize {
            for ix in 0..hist.bins[0] as usize {
                writer.write_record([
                    frame.to_string(),
                    ix.to_string(),
                    iy.to_string(),
                    format!("{:.6}", hist.mean(frame, ix, iy)),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes any serializable record as a bincode cache file.
pub fn save_cache<P: AsRef<Path>, T: Serialize>(path: P, record: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Error creating cache file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, record)
        .with_context(|| format!("Error serializing cache to '{}'", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn load_cache<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Error opening cache file '{}'", path.display()))?;
    bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("Error reading cache file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("cell-model-{}-{}", std::process::id(), name))
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        assert_eq!(OutputFormat::from_config(None), OutputFormat::Json);
        assert_eq!(OutputFormat::from_config(Some("bincode")), OutputFormat::Bincode);
        assert_eq!(OutputFormat::from_config(Some("yaml")), OutputFormat::Json);
    }

    #[test]
    fn histogram_cache_reloads() {
        let mut hist = DensityHistogram::new([2, 3], 2);
        hist.replicas = 1;
        hist.accumulate(1, &[Vec2::new(0.7, 0.9)]);

        let path = scratch_path("hist.bin");
        save_cache(&path, &hist).unwrap();
        let loaded: DensityHistogram = load_cache(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, hist);
    }

    #[test]
    fn positions_csv_has_header_and_rows() {
        let path = scratch_path("positions.csv");
        save_positions_csv(&path, &[Vec2::new(0.25, 0.5), Vec2::new(0.125, 0.75)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["x,y", "0.250000,0.500000", "0.125000,0.750000"]);
    }

    #[test]
    fn missing_cache_is_an_error() {
        assert!(load_cache::<_, DensityHistogram>(scratch_path("does-not-exist.bin")).is_err());
    }
}
