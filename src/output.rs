use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use csv::Writer;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};

use crate::errors::Result;
use crate::fourier_descriptor::ShapeDescriptor;
use crate::spectral_analysis::Spectrum;

/// Structured per-frame record: `{volumes: [...], radii_from_images: [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumesRadii {
    pub volumes: Vec<f64>,
    pub radii_from_images: Vec<f64>,
}

impl VolumesRadii {
    /// Build the record, rounding every value to two decimals
    pub fn rounded(volumes: &[f64], radii: &[f64]) -> Self {
        Self {
            volumes: volumes.iter().map(|&v| round2(v)).collect(),
            radii_from_images: radii.iter().map(|&r| round2(r)).collect(),
        }
    }
}

/// One line of the acoustic summary table
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticSummaryRow {
    pub label: String,
    pub events_used: usize,
    pub events_skipped: usize,
    pub dominant_frequency_hz: f64,
    pub mean_event_frequency_hz: f64,
    /// Empty when the dominant frequency is outside the model range
    pub acoustic_radius_mm: Option<f64>,
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-space indented JSON with `"key":value` pairs
struct TightPrettyFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for TightPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b":")
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write volumes as a delimited list, one `%.2f` value per line
pub fn write_volumes_txt<P: AsRef<Path>>(volumes: &[f64], output_dir: P) -> Result<PathBuf> {
    let output_path = output_dir.as_ref().join("volumes.txt");
    ensure_parent(&output_path)?;

    let mut file = fs::File::create(&output_path)?;
    for volume in volumes {
        writeln!(file, "{:.2}", volume)?;
    }

    Ok(output_path)
}

/// Write `volumes_radii.json`
pub fn write_volumes_json<P: AsRef<Path>>(
    volumes: &[f64],
    radii: &[f64],
    output_dir: P,
) -> Result<PathBuf> {
    let output_path = output_dir.as_ref().join("volumes_radii.json");
    ensure_parent(&output_path)?;

    let record = VolumesRadii::rounded(volumes, radii);
    let mut writer = BufWriter::new(fs::File::create(&output_path)?);
    let mut serializer = Serializer::with_formatter(
        &mut writer,
        TightPrettyFormatter(PrettyFormatter::with_indent(b"  ")),
    );
    record.serialize(&mut serializer)?;
    writer.flush()?;

    Ok(output_path)
}

/// Write one row per frame with its descriptor harmonics
pub fn write_descriptor_csv<P: AsRef<Path>>(
    rows: &[(String, ShapeDescriptor)],
    output_dir: P,
) -> Result<PathBuf> {
    let output_path = output_dir.as_ref().join("descriptors.csv");
    ensure_parent(&output_path)?;

    let mut writer = Writer::from_path(&output_path)?;

    if let Some((_, first)) = rows.first() {
        let mut header = vec!["Frame".to_string()];
        header.extend((first.start_harmonic()..=first.end_harmonic()).map(|k| format!("H{}", k)));
        writer.write_record(&header)?;
    }

    for (frame, descriptor) in rows {
        let mut record = vec![frame.clone()];
        record.extend(descriptor.values().iter().map(|v| format!("{:.6}", v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(output_path)
}

/// Write the non-negative half of an averaged spectrum as `<label>_spectrum.csv`
pub fn write_spectrum_csv<P: AsRef<Path>>(
    spectrum: &Spectrum,
    output_dir: P,
    label: &str,
) -> Result<PathBuf> {
    let output_path = output_dir.as_ref().join(format!("{}_spectrum.csv", label));
    ensure_parent(&output_path)?;

    let mut writer = Writer::from_path(&output_path)?;
    writer.write_record(["Frequency_Hz", "Magnitude"])?;

    for (frequency, magnitude) in spectrum.non_negative_bins() {
        writer.write_record(&[format!("{:.3}", frequency), format!("{:.6}", magnitude)])?;
    }

    writer.flush()?;
    Ok(output_path)
}

/// Write the per-run acoustic summary table
pub fn write_acoustic_summary_csv<P: AsRef<Path>>(
    rows: &[AcousticSummaryRow],
    output_dir: P,
) -> Result<PathBuf> {
    let output_path = output_dir.as_ref().join("acoustic_summary.csv");
    ensure_parent(&output_path)?;

    let mut writer = Writer::from_path(&output_path)?;
    writer.write_record([
        "Label",
        "Events_Used",
        "Events_Skipped",
        "Dominant_Frequency_Hz",
        "Mean_Event_Frequency_Hz",
        "Acoustic_Radius_mm",
    ])?;

    for row in rows {
        writer.write_record(&[
            row.label.clone(),
            row.events_used.to_string(),
            row.events_skipped.to_string(),
            format!("{:.3}", row.dominant_frequency_hz),
            format!("{:.3}", row.mean_event_frequency_hz),
            row.acoustic_radius_mm
                .map(|radius| format!("{:.4}", radius))
                .unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(output_path)
}
