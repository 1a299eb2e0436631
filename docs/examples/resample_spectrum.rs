// Spectrum resampling through the two-phase stage protocol.
// A batch of two spectra sampled on a log-spaced frequency grid is resampled
// onto a linear grid. Prints JSON:
//   {"xp":[...], "fp":[[...],[...]], "x":[...], "y":[[...],[...]], "bins":[...]}
// Negotiation and compute events go to stderr at DEBUG level.

use interp_extern::buffer::{Interval, Region, View, ViewMut};
use interp_extern::stage::{
    ExternStage, IndexLocator, InterpInputs, InterpSettings, LocateInputs, LocateSettings,
    PiecewiseInterp,
};
use tracing::Level;

fn fmt_arr(v: &[f64]) -> String {
    let inner: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", inner.join(","))
}

fn fmt_rows(v: &[f64], width: usize) -> String {
    let rows: Vec<String> = v.chunks(width).map(fmt_arr).collect();
    format!("[{}]", rows.join(","))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    // 16-bin log-spaced source grid from 20 Hz to 20 kHz
    const N_FFT: i32 = 16;
    const ROWS: i32 = 2;
    const COLS: i32 = 48;
    let xp: Vec<f64> = (0..N_FFT)
        .map(|i| 20.0 * 1000f64.powf(i as f64 / (N_FFT - 1) as f64))
        .collect();

    let interp = PiecewiseInterp::new(InterpSettings::new(N_FFT))?;
    let output = Region::new([Interval::new(0, COLS), Interval::new(0, ROWS)]);

    // Phase 1: ask the stage what it needs to produce this tile
    let bounds = interp.negotiate(&output);

    // Phase 2: allocate to the negotiated shapes and fill
    let mut fp = vec![0.0_f64; bounds.fp.len()];
    for (k, v) in fp.iter_mut().enumerate() {
        let (i, row) = (k % N_FFT as usize, k / N_FFT as usize);
        let f = xp[i];
        // Row 0: pink rolloff, row 1: peak at 1 kHz
        *v = match row {
            0 => -10.0 * f.log10(),
            _ => -6.0 * (f / 1000.0).log2().abs(),
        };
    }
    // Linear grid from 0 Hz to 24 kHz: both ends fall outside the table
    let x: Vec<f64> = (0..COLS)
        .map(|i| 24_000.0 * i as f64 / (COLS - 1) as f64)
        .collect();
    let queries: Vec<f64> = (0..ROWS).flat_map(|_| x.iter().copied()).collect();

    let mut y = vec![0.0_f64; output.len()];
    let report = interp.compute(
        InterpInputs {
            queries: View::dense(&queries, bounds.queries)?,
            xp: View::dense(&xp, bounds.xp)?,
            fp: View::dense(&fp, bounds.fp)?,
        },
        ViewMut::dense(&mut y, output)?,
    )?;
    tracing::info!(
        elements = report.elements,
        clamped_low = report.clamped_low,
        clamped_high = report.clamped_high,
        "resampled"
    );

    // Source bin feeding each output column
    let locator = IndexLocator::new(LocateSettings::new(N_FFT))?;
    let row = Region::new([Interval::new(0, COLS), Interval::new(0, 1)]);
    let lb = locator.negotiate(&row);
    let mut bins = vec![0_i32; row.len()];
    locator.compute(
        LocateInputs {
            queries: View::dense(&x, lb.queries)?,
            table: View::dense(&xp, lb.table)?,
        },
        ViewMut::dense(&mut bins, row)?,
    )?;
    let bins: Vec<f64> = bins.iter().map(|&b| b as f64).collect();

    println!(
        "{{\"xp\":{},\"fp\":{},\"x\":{},\"y\":{},\"bins\":{}}}",
        fmt_arr(&xp),
        fmt_rows(&fp, N_FFT as usize),
        fmt_arr(&x),
        fmt_rows(&y, COLS as usize),
        fmt_arr(&bins)
    );
    Ok(())
}
