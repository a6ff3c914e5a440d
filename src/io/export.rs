//! CSV export for sweeps, calculation snapshots and waveforms.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::scr::{CalculationResult, LineResult};
use crate::sweep::{SweepRow, Waveforms};

/// Column header for δ-sweep export. Kept stable for existing consumers.
pub const SWEEP_HEADER: &str = "delta_deg,P_MW,I_A,dV_pct";

/// Column header for waveform export.
pub const WAVEFORM_HEADER: &str = "t_s,v_pcc_V,v_inv_V,i_A";

/// Writes sweep rows as CSV to any writer.
///
/// Values are written at full precision so the file round-trips exactly.
///
/// # Arguments
///
/// * `rows` - Sweep rows in δ order
/// * `writer` - Destination for the CSV bytes
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sweep_csv(rows: &[SweepRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SWEEP_HEADER.split(','))?;
    for r in rows {
        wtr.write_record(&[
            r.delta_deg.to_string(),
            r.p_mw.to_string(),
            r.i_a.to_string(),
            r.dv_pct.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports sweep rows to a CSV file at `path`.
///
/// # Arguments
///
/// * `rows` - Sweep rows in δ order
/// * `path` - Output file path (created or truncated)
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sweep_csv(rows: &[SweepRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_sweep_csv(rows, io::BufWriter::new(file))
}

/// Writes the available snapshots as CSV, one row each.
///
/// Rows carry a `type` column (`scr` or `line`). Columns are the sorted
/// union of all row keys; keys a row lacks are left blank.
///
/// # Arguments
///
/// * `result` - Latest SCR calculation, if any
/// * `line` - Latest target-SCR line solve, if any
/// * `writer` - Destination for the CSV bytes
///
/// # Errors
///
/// Returns `io::ErrorKind::InvalidInput` when there is nothing to export,
/// or an `io::Error` if writing fails.
pub fn write_results_csv(
    result: Option<&CalculationResult>,
    line: Option<&LineResult>,
    writer: impl Write,
) -> io::Result<()> {
    let mut rows: Vec<BTreeMap<&'static str, String>> = Vec::new();
    if let Some(r) = result {
        rows.push(BTreeMap::from([
            ("type", "scr".to_string()),
            ("V_LL", r.v_ll.to_string()),
            ("S_n", r.s_n.to_string()),
            ("f", r.f.to_string()),
            ("R_line", r.r_line.to_string()),
            ("L_line", r.l_line.to_string()),
            ("R_tr", r.r_tr.to_string()),
            ("L_tr", r.l_tr.to_string()),
            ("Zth", r.zth.to_string()),
            ("S_sc", r.s_sc.to_string()),
            ("SCR", r.scr.to_string()),
            ("I_ratio", r.i_ratio.to_string()),
        ]));
    }
    if let Some(l) = line {
        rows.push(BTreeMap::from([
            ("type", "line".to_string()),
            ("R_line", l.r_line.to_string()),
            ("L_line", l.l_line.to_string()),
            ("Zth", l.zth.to_string()),
            ("S_sc", l.s_sc.to_string()),
            ("SCR", l.scr.to_string()),
        ]));
    }
    if rows.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no results to export",
        ));
    }

    let keys: BTreeSet<&str> = rows.iter().flat_map(|row| row.keys().copied()).collect();
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(&keys)?;
    for row in &rows {
        wtr.write_record(
            keys.iter()
                .map(|k| row.get(k).map(String::as_str).unwrap_or("")),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports the available snapshots to a CSV file at `path`.
///
/// # Arguments
///
/// * `result` - Latest SCR calculation, if any
/// * `line` - Latest target-SCR line solve, if any
/// * `path` - Output file path (created or truncated)
///
/// # Errors
///
/// See [`write_results_csv`]; also fails if the file cannot be created.
pub fn export_results_csv(
    result: Option<&CalculationResult>,
    line: Option<&LineResult>,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_results_csv(result, line, io::BufWriter::new(file))
}

/// Writes waveform samples as CSV to any writer.
///
/// # Arguments
///
/// * `waves` - Co-indexed time, voltage and current samples
/// * `writer` - Destination for the CSV bytes
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_waveform_csv(waves: &Waveforms, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(WAVEFORM_HEADER.split(','))?;
    for s in waves.samples() {
        wtr.write_record(&[
            format!("{:.9}", s.t),
            format!("{:.4}", s.v_pcc),
            format!("{:.4}", s.v_inv),
            format!("{:.4}", s.i),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports waveform samples to a CSV file at `path`.
///
/// # Arguments
///
/// * `waves` - Co-indexed time, voltage and current samples
/// * `path` - Output file path (created or truncated)
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_waveform_csv(waves: &Waveforms, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_waveform_csv(waves, io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rl, System};
    use crate::scr::{compute_scr, solve_line_for_target_scr};
    use crate::sweep::{sweep, waveforms};

    fn reference_rows() -> Vec<SweepRow> {
        let sys = System::new(380.0, 250_000.0, 60.0);
        sweep(&sys, 0.0, sys.omega() * 7.5e-5, 60.0, 0.5).expect("valid sweep")
    }

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn sweep_header_matches_contract() {
        let mut buf = Vec::new();
        write_sweep_csv(&reference_rows(), &mut buf).expect("write to memory");
        let text = to_string(buf);
        assert_eq!(text.lines().next(), Some("delta_deg,P_MW,I_A,dV_pct"));
        // header + 121 rows
        assert_eq!(text.lines().count(), 122);
    }

    #[test]
    fn sweep_values_parse_back_exactly() {
        let rows = reference_rows();
        let mut buf = Vec::new();
        write_sweep_csv(&rows, &mut buf).expect("write to memory");

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        for (record, row) in rdr.records().zip(&rows) {
            let record = record.expect("row should parse");
            let p: f64 = record[1].parse().expect("P_MW parses as f64");
            assert_eq!(p, row.p_mw);
        }
    }

    #[test]
    fn results_columns_are_sorted_union() {
        let sys = System::new(380.0, 250_000.0, 60.0);
        let res = compute_scr(&sys, Rl::new(0.0, 7.5e-5), Rl::default()).expect("valid");
        let line = solve_line_for_target_scr(&sys, 3.0, 0.0, Rl::default()).expect("feasible");

        let mut buf = Vec::new();
        write_results_csv(Some(&res), Some(&line), &mut buf).expect("write to memory");
        let text = to_string(buf);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("I_ratio,L_line,L_tr,R_line,R_tr,SCR,S_n,S_sc,V_LL,Zth,f,type")
        );
        let scr_row = lines.next().unwrap_or("");
        assert!(scr_row.ends_with(",scr"));
        let line_row = lines.next().unwrap_or("");
        assert!(line_row.starts_with(','), "line rows have no I_ratio");
        assert!(line_row.ends_with(",,line"), "line rows have no f");
    }

    #[test]
    fn results_export_requires_a_snapshot() {
        let mut buf = Vec::new();
        let err = write_results_csv(None, None, &mut buf).expect_err("nothing to export");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn sweep_export_to_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sweep.csv");
        export_sweep_csv(&reference_rows(), &path).expect("export");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.starts_with(SWEEP_HEADER));
    }

    #[test]
    fn waveform_rows_match_sample_count() {
        let sys = System::new(380.0, 250_000.0, 60.0);
        let w = waveforms(&sys, 10.0, 0.1, 0.0, 1, 20).expect("within sample cap");
        let mut buf = Vec::new();
        write_waveform_csv(&w, &mut buf).expect("write to memory");
        let text = to_string(buf);
        assert_eq!(text.lines().next(), Some(WAVEFORM_HEADER));
        assert_eq!(text.lines().count(), 21);
    }
}
