use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use admproc::{
    CapacitanceModel, DopingProfile, ExtractedCurve, Grid, MeasurementSession, Metadata,
    Selection, Source,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

/// Extract C–V, C–T or C–f curves from an admittance measurement file.
///
/// Give two of --freq, --volt and --temp; the curve runs along the third.
#[derive(Debug, Parser)]
#[command(name = "admproc", version, about)]
struct Args {
    /// Admittance file to read.
    file: PathBuf,

    /// Frequency in Hz (nearest column is used).
    #[arg(short, long)]
    freq: Option<f64>,

    /// Bias voltage in V (nearest grid voltage is used).
    #[arg(short, long, allow_negative_numbers = true)]
    volt: Option<f64>,

    /// Temperature in K (nearest temperature block is used).
    #[arg(short, long)]
    temp: Option<f64>,

    /// Capacitance model: parallel (cp) or series (cs).
    #[arg(short, long, default_value = "parallel")]
    model: CapacitanceModel,

    /// Print the doping profile of the C–V curve instead of the curve.
    #[arg(long)]
    doping: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Print header metadata and grid shape, then exit.
    #[arg(long)]
    info: bool,
}

#[derive(Serialize)]
struct FileInfo<'a> {
    metadata: Metadata,
    frequencies: &'a [f64],
    grid: Grid,
}

#[derive(Serialize)]
struct CurveOutput<'a> {
    model: CapacitanceModel,
    #[serde(flatten)]
    curve: &'a ExtractedCurve,
    model_capacitance: Vec<f64>,
    dissipation: Vec<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut session = MeasurementSession::open(Source::Path(&args.file))
        .with_context(|| format!("reading {}", args.file.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.info {
        let info = FileInfo {
            metadata: session.metadata(),
            frequencies: session.frequencies(),
            grid: session.grid().context("inferring measurement grid")?,
        };
        serde_json::to_writer_pretty(&mut out, &info).context("writing file info")?;
        writeln!(out)?;
        return Ok(());
    }

    let selection = Selection {
        frequency: args.freq,
        voltage: args.volt,
        temperature: args.temp,
    };

    if args.doping {
        let profile = session
            .doping_profile(selection)
            .context("computing doping profile")?;
        write_doping(&mut out, &profile, args.format)
    } else {
        let curve = session.extract(selection).context("extracting curve")?;
        write_curve(&mut out, curve, args.model, args.format)
    }
}

fn write_curve<W: Write>(
    out: &mut W,
    curve: &ExtractedCurve,
    model: CapacitanceModel,
    format: Format,
) -> Result<()> {
    let output = CurveOutput {
        model,
        curve,
        model_capacitance: curve.capacitance(model),
        dissipation: curve.dissipation(),
    };

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, &output).context("writing JSON")?;
            writeln!(out)?;
        }
        Format::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record([
                curve.slice.axis_name(),
                "capacitance",
                "conductance",
                "dissipation",
            ])?;
            let rows = curve
                .sweep_axis()
                .iter()
                .zip(&output.model_capacitance)
                .zip(&curve.conductance)
                .zip(&output.dissipation);
            for (((x, c), g), d) in rows {
                wtr.serialize((x, c, g, d)).context("writing CSV row")?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

fn write_doping<W: Write>(out: &mut W, profile: &DopingProfile, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, profile).context("writing JSON")?;
            writeln!(out)?;
        }
        Format::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            wtr.write_record(["width_nm", "concentration_cm3"])?;
            for (w, n) in profile.width.iter().zip(&profile.concentration) {
                wtr.serialize((w, n)).context("writing CSV row")?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
